use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use pattern_engine::{run_pattern_detection, EngineConfig, JsonInsightStore, JsonSignalRepository};
use std::io;
use std::path::PathBuf;

mod generator;
mod report;

pub use generator::HttpTextGenerator;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "pattern-engine")]
#[command(about = "Detect cross-domain patterns among tracked signals", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one pattern detection batch over JSON files
    Run(RunArgs),

    /// Print the effective engine configuration as TOML
    Config(ConfigArgs),

    /// Print the JSON Schema the text generator must answer with
    Schema,
}

#[derive(Args)]
struct RunArgs {
    /// JSON array of signal records
    #[arg(long)]
    signals: PathBuf,

    /// JSON file holding stored insights (created if missing)
    #[arg(long)]
    insights: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(flatten)]
    generator: GeneratorArgs,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ConfigArgs {
    /// TOML file with engine settings; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum number of signals fetched per run
    #[arg(long)]
    max_signals: Option<usize>,

    /// Lower similarity bound (exclusive)
    #[arg(long)]
    similarity_lower: Option<f64>,

    /// Upper similarity bound (exclusive)
    #[arg(long)]
    similarity_upper: Option<f64>,

    #[arg(long)]
    min_cluster_size: Option<usize>,

    #[arg(long)]
    max_cluster_size: Option<usize>,

    /// Maximum clusters sent to the generator per run
    #[arg(long)]
    max_insights: Option<usize>,

    /// Jaccard overlap above which an insight is a duplicate
    #[arg(long)]
    dedup_threshold: Option<f64>,

    /// Per-cluster generator timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Expected embedding length (0 infers it from the first signal)
    #[arg(long)]
    embedding_dimension: Option<usize>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => EngineConfig::default(),
        };

        if let Some(value) = self.max_signals {
            config.max_signals = value;
        }
        if let Some(value) = self.similarity_lower {
            config.similarity_lower = value;
        }
        if let Some(value) = self.similarity_upper {
            config.similarity_upper = value;
        }
        if let Some(value) = self.min_cluster_size {
            config.min_cluster_size = value;
        }
        if let Some(value) = self.max_cluster_size {
            config.max_cluster_size = value;
        }
        if let Some(value) = self.max_insights {
            config.max_insights_per_run = value;
        }
        if let Some(value) = self.dedup_threshold {
            config.dedup_threshold = value;
        }
        if let Some(value) = self.timeout_secs {
            config.synthesis_timeout_secs = value;
        }
        if let Some(value) = self.embedding_dimension {
            config.embedding_dimension = value;
        }

        config.validate().context("Invalid engine configuration")?;
        Ok(config)
    }
}

#[derive(Args)]
struct GeneratorArgs {
    /// Chat-completions endpoint of the text generator
    #[arg(long, env = "PATTERN_LLM_URL", default_value = generator::DEFAULT_ENDPOINT)]
    llm_url: String,

    #[arg(long, env = "PATTERN_LLM_MODEL", default_value = generator::DEFAULT_MODEL)]
    llm_model: String,

    /// Bearer token for the generator endpoint
    #[arg(long, env = "PATTERN_LLM_API_KEY", hide_env_values = true)]
    llm_api_key: Option<String>,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers
    if let Commands::Run(args) = &cli.command {
        if args.json {
            cli.quiet = true;
        }
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Run(args) => run(args).await?,
        Commands::Config(args) => print_config(&args)?,
        Commands::Schema => print_schema()?,
    }

    Ok(())
}

async fn run(args: RunArgs) -> Result<()> {
    let config = args.config.resolve()?;
    let generator = HttpTextGenerator::new(
        args.generator.llm_url,
        args.generator.llm_model,
        args.generator.llm_api_key,
        config.synthesis_timeout(),
    )?;
    let repository = JsonSignalRepository::new(&args.signals);
    let store = JsonInsightStore::new(&args.insights);

    log::debug!(
        "Using generator at {} with signals from {}",
        generator.endpoint(),
        repository.path().display()
    );

    let summary = run_pattern_detection(&repository, &store, &generator, &config)
        .await
        .with_context(|| format!("Pattern detection failed for {}", args.signals.display()))?;

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&summary)?)?;
    } else {
        print_stdout(&report::render_summary(&summary))?;
    }
    Ok(())
}

fn print_config(args: &ConfigArgs) -> Result<()> {
    let config = args.resolve()?;
    print_stdout(config.to_toml_string()?.trim_end())
}

fn print_schema() -> Result<()> {
    let schema = pattern_protocol::insight_draft_schema().context("Failed to render schema")?;
    print_stdout(&serde_json::to_string_pretty(&schema)?)
}
