use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Skipped,
}

/// Machine-readable explanation attached to early exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunReason {
    InsufficientCards,
    NoCrossDomainLinks,
}

impl RunReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientCards => "insufficient_cards",
            Self::NoCrossDomainLinks => "no_cross_domain_links",
        }
    }
}

/// Pipeline stage an isolated failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingest,
    Synthesize,
    Deduplicate,
    Persist,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Synthesize => "synthesize",
            Self::Deduplicate => "deduplicate",
            Self::Persist => "persist",
        }
    }
}

/// Per-item failure that was contained instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
    pub stage: Stage,
    pub item_id: String,
    pub message: String,
}

impl StageError {
    pub fn new(stage: Stage, item_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage,
            item_id: item_id.into(),
            message: message.into(),
        }
    }
}

/// Outcome of one batch run, returned to the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<RunReason>,

    /// Eligible signals that entered link detection
    pub cards_analyzed: usize,
    pub cross_domain_links: usize,
    pub clusters_found: usize,
    pub insights_generated: usize,
    pub insights_stored: usize,

    /// Candidates rejected for overlapping an existing or earlier insight
    #[serde(default)]
    pub duplicates_rejected: usize,
    #[serde(default)]
    pub persist_failures: usize,

    pub duration_seconds: f64,

    #[serde(default)]
    pub errors: Vec<StageError>,
}

impl RunSummary {
    #[must_use]
    pub fn completed() -> Self {
        Self {
            status: RunStatus::Completed,
            reason: None,
            cards_analyzed: 0,
            cross_domain_links: 0,
            clusters_found: 0,
            insights_generated: 0,
            insights_stored: 0,
            duplicates_rejected: 0,
            persist_failures: 0,
            duration_seconds: 0.0,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn skipped(reason: RunReason) -> Self {
        Self {
            status: RunStatus::Skipped,
            reason: Some(reason),
            ..Self::completed()
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: RunReason) -> Self {
        self.reason = Some(reason);
        self
    }

    pub fn record(&mut self, error: StageError) {
        self.errors.push(error);
    }
}
