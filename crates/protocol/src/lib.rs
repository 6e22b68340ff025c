//! # Pattern Protocol
//!
//! Data shared by every stage of the cross-domain pattern detection pipeline.
//!
//! ```text
//! Signal[] ──> CrossDomainLink[] ──> Cluster[] ──> Insight[] ──> RunSummary
//! ```
//!
//! Signals and insights are owned by external stores; the engine only holds
//! working copies for the duration of one run.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub mod run;

pub use run::{RunReason, RunStatus, RunSummary, Stage, StageError};

/// Upper bound on insight titles, counted in characters.
pub const INSIGHT_TITLE_MAX_CHARS: usize = 100;

/// Semantic embedding of a signal.
///
/// The dimensionality contract is enforced at ingestion by the engine; this
/// type only carries the values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    #[must_use]
    pub const fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// A tracked grant/trend opportunity that is eligible for pattern detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    /// Strategic domain the signal belongs to
    pub domain_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon: Option<String>,
    pub embedding: Embedding,
}

/// Pair of signals from different domains whose similarity fell inside the
/// configured band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossDomainLink {
    pub signal_a_id: String,
    pub signal_b_id: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    #[default]
    Medium,
    Low,
}

impl Urgency {
    /// Parse a generator-supplied urgency; unknown values yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightStatus {
    #[default]
    Active,
    Retired,
}

/// Synthesized description of why a cross-domain cluster matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub summary: String,
    pub opportunity: String,
    /// Always within `[0.0, 1.0]`
    pub confidence: f32,
    pub affected_domains: Vec<String>,
    pub urgency: Urgency,
    pub related_signal_ids: Vec<String>,
    #[serde(default)]
    pub status: InsightStatus,
}

impl Insight {
    #[must_use]
    pub fn related_id_set(&self) -> BTreeSet<String> {
        self.related_signal_ids.iter().cloned().collect()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == InsightStatus::Active
    }
}

/// Reply contract for the text generator.
///
/// Only used to publish the expected JSON shape; replies are parsed leniently
/// by the synthesizer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InsightDraft {
    /// Short headline, at most 100 characters
    pub title: String,
    pub summary: String,
    /// What a municipality could do about the convergence
    pub opportunity: String,
    /// Between 0.0 and 1.0
    pub confidence: f32,
    pub affected_domains: Vec<String>,
    pub urgency: Urgency,
}

/// JSON Schema of [`InsightDraft`], sent along with every synthesis request.
pub fn insight_draft_schema() -> serde_json::Result<serde_json::Value> {
    let schema = schemars::schema_for!(InsightDraft);
    serde_json::to_value(&schema)
}
