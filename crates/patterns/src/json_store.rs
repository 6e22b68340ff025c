//! File-backed collaborators for running the engine without a database.

use crate::ports::{InsightStore, PortError, SignalRepository};
use async_trait::async_trait;
use pattern_protocol::{Embedding, Insight, Signal};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Signal row as exported from the signal store. Embeddings are either a
/// numeric array or the same array encoded as a JSON string.
#[derive(Debug, Deserialize)]
struct SignalRecord {
    id: String,
    name: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    domain_tag: Option<String>,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    horizon: Option<String>,
    #[serde(default)]
    embedding: Option<RawEmbedding>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEmbedding {
    Values(Vec<f32>),
    Encoded(String),
}

impl SignalRecord {
    fn into_signal(self) -> Option<Signal> {
        let domain_tag = self.domain_tag?;
        let embedding = match self.embedding? {
            RawEmbedding::Values(values) => values,
            RawEmbedding::Encoded(text) => match serde_json::from_str::<Vec<f32>>(&text) {
                Ok(values) => values,
                Err(err) => {
                    log::warn!("Skipping signal {}: unreadable embedding ({err})", self.id);
                    return None;
                }
            },
        };
        Some(Signal {
            id: self.id,
            name: self.name,
            summary: self.summary.unwrap_or_default(),
            domain_tag,
            stage: self.stage,
            horizon: self.horizon,
            embedding: Embedding::new(embedding),
        })
    }
}

/// Reads signals from a JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonSignalRepository {
    path: PathBuf,
}

impl JsonSignalRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SignalRepository for JsonSignalRepository {
    async fn fetch_active_with_embeddings(&self, max_n: usize) -> Result<Vec<Signal>, PortError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let records: Vec<SignalRecord> = serde_json::from_slice(&bytes)?;
        let total = records.len();
        let signals: Vec<Signal> = records
            .into_iter()
            .filter_map(SignalRecord::into_signal)
            .take(max_n)
            .collect();
        log::debug!(
            "Loaded {} of {total} signal records from {}",
            signals.len(),
            self.path.display()
        );
        Ok(signals)
    }
}

/// Keeps insights in a single JSON file.
///
/// Writes go through a temporary file and a rename so readers never observe a
/// partial file. A missing file is an empty store.
#[derive(Debug)]
pub struct JsonInsightStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonInsightStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored insight, active or retired.
    pub async fn load_all(&self) -> Result<Vec<Insight>, PortError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_all(&self, insights: &[Insight]) -> Result<(), PortError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(insights)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl InsightStore for JsonInsightStore {
    async fn fetch_active_related_id_sets(&self) -> Result<Vec<BTreeSet<String>>, PortError> {
        let insights = self.load_all().await?;
        Ok(insights
            .iter()
            .filter(|insight| insight.is_active())
            .map(Insight::related_id_set)
            .collect())
    }

    async fn persist(&self, insight: &Insight) -> Result<(), PortError> {
        let _guard = self.write_lock.lock().await;
        let mut insights = self.load_all().await?;
        insights.push(insight.clone());
        self.write_all(&insights).await?;
        log::debug!("Stored insight '{}' in {}", insight.title, self.path.display());
        Ok(())
    }
}
