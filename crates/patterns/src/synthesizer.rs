use crate::config::EngineConfig;
use crate::error::Result;
use crate::ports::{PortError, SynthesisRequest, TextGenerator};
use crate::text::{truncate_chars, truncate_with_ellipsis};
use pattern_graph::Cluster;
use pattern_protocol::{
    insight_draft_schema, Insight, InsightStatus, Stage, StageError, Urgency,
    INSIGHT_TITLE_MAX_CHARS,
};
use serde_json::Value;
use std::fmt::Write as _;
use std::time::Duration;
use thiserror::Error;

/// Used when the generator omits confidence or sends something unusable.
const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Why a single cluster produced no insight.
#[derive(Error, Debug)]
pub enum SynthesisFailure {
    #[error("text generator timed out after {0:?}")]
    Timeout(Duration),

    #[error("text generator failed: {0}")]
    Generator(#[from] PortError),

    #[error("malformed JSON reply: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("reply is not a JSON object")]
    NotAnObject,

    #[error("reply has no title")]
    MissingTitle,
}

#[derive(Debug, Default)]
pub struct SynthesisOutcome {
    /// Insights in cluster rank order
    pub insights: Vec<Insight>,
    pub errors: Vec<StageError>,
}

/// Turns ranked clusters into insights through a [`TextGenerator`].
pub struct InsightSynthesizer<'a> {
    generator: &'a dyn TextGenerator,
    timeout: Duration,
    summary_chars: usize,
    response_schema: Value,
}

impl<'a> InsightSynthesizer<'a> {
    pub fn new(generator: &'a dyn TextGenerator, config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            generator,
            timeout: config.synthesis_timeout(),
            summary_chars: config.summary_chars,
            response_schema: insight_draft_schema()?,
        })
    }

    /// Synthesize the first `limit` clusters. A failing cluster is recorded
    /// and skipped; it never stops the rest.
    pub async fn synthesize_all(&self, clusters: &[Cluster], limit: usize) -> SynthesisOutcome {
        let mut outcome = SynthesisOutcome::default();
        for cluster in clusters.iter().take(limit) {
            match self.synthesize(cluster).await {
                Ok(insight) => {
                    log::debug!("Synthesized '{}' from [{}]", insight.title, cluster.key());
                    outcome.insights.push(insight);
                }
                Err(err) => {
                    log::warn!("Skipping cluster [{}]: {err}", cluster.key());
                    outcome
                        .errors
                        .push(StageError::new(Stage::Synthesize, cluster.key(), err.to_string()));
                }
            }
        }
        log::info!(
            "Synthesized {} insights from {} clusters",
            outcome.insights.len(),
            clusters.len().min(limit)
        );
        outcome
    }

    pub async fn synthesize(&self, cluster: &Cluster) -> std::result::Result<Insight, SynthesisFailure> {
        let request = SynthesisRequest {
            description: describe_cluster(cluster, self.summary_chars),
            affected_domains: cluster.domains.iter().cloned().collect(),
            response_schema: self.response_schema.clone(),
        };

        let raw = tokio::time::timeout(self.timeout, self.generator.synthesize(&request))
            .await
            .map_err(|_| SynthesisFailure::Timeout(self.timeout))??;

        parse_insight_reply(&raw, cluster)
    }
}

/// Human-readable description of a cluster for the text generator.
#[must_use]
pub fn describe_cluster(cluster: &Cluster, summary_chars: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Cluster of {} signals across {} domains (average similarity {:.2}):",
        cluster.len(),
        cluster.domains.len(),
        cluster.avg_similarity
    );

    for (idx, signal) in cluster.members.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}. {}", idx + 1, signal.name);
        let _ = writeln!(out, "   Domain: {}", signal.domain_tag);
        let _ = writeln!(
            out,
            "   Horizon: {}",
            signal.horizon.as_deref().unwrap_or("unknown")
        );
        if let Some(stage) = signal.stage.as_deref() {
            let _ = writeln!(out, "   Stage: {stage}");
        }
        let summary = signal.summary.trim();
        if !summary.is_empty() {
            let _ = writeln!(
                out,
                "   Summary: {}",
                truncate_with_ellipsis(summary, summary_chars)
            );
        }
    }

    let domains: Vec<&str> = cluster.domains.iter().map(String::as_str).collect();
    let _ = write!(out, "\nAffected domains: {}", domains.join(", "));
    out
}

/// Validate a generator reply and build the insight for `cluster`.
///
/// Related signal IDs always come from the cluster, never from the reply.
pub fn parse_insight_reply(
    raw: &str,
    cluster: &Cluster,
) -> std::result::Result<Insight, SynthesisFailure> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))?;
    let Value::Object(fields) = value else {
        return Err(SynthesisFailure::NotAnObject);
    };

    let title = fields
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(SynthesisFailure::MissingTitle)?;
    let (title, truncated) = truncate_chars(title, INSIGHT_TITLE_MAX_CHARS);
    if truncated {
        log::debug!("Truncated overlong insight title for [{}]", cluster.key());
    }

    let confidence = fields
        .get("confidence")
        .and_then(number_like)
        .filter(|c| c.is_finite())
        .map_or(DEFAULT_CONFIDENCE, |c| c.clamp(0.0, 1.0) as f32);

    let urgency = fields
        .get("urgency")
        .and_then(Value::as_str)
        .and_then(Urgency::parse)
        .unwrap_or_default();

    let mut affected_domains: Vec<String> = fields
        .get("affected_domains")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if affected_domains.is_empty() {
        affected_domains = cluster.domains.iter().cloned().collect();
    }

    Ok(Insight {
        title: title.to_string(),
        summary: text_field(&fields, "summary"),
        opportunity: text_field(&fields, "opportunity"),
        confidence,
        affected_domains,
        urgency,
        related_signal_ids: cluster.member_ids(),
        status: InsightStatus::Active,
    })
}

fn text_field(fields: &serde_json::Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accept replies wrapped in a Markdown code fence, on one line or several.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_end();
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // Info string (```json) ends at the first newline, space or brace
    rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        .trim()
}
