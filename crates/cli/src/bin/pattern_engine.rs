use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    pattern_cli::main_entry().await
}
