use pattern_protocol::{RunStatus, RunSummary};
use std::fmt::Write as _;

/// Plain-text rendering of a run summary for terminals.
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let status = match summary.status {
        RunStatus::Completed => "completed",
        RunStatus::Skipped => "skipped",
    };
    match summary.reason {
        Some(reason) => {
            let _ = writeln!(out, "Pattern detection {status} ({})", reason.as_str());
        }
        None => {
            let _ = writeln!(out, "Pattern detection {status}");
        }
    }

    let rows = [
        ("signals analyzed", summary.cards_analyzed),
        ("cross-domain links", summary.cross_domain_links),
        ("clusters", summary.clusters_found),
        ("insights generated", summary.insights_generated),
        ("duplicates rejected", summary.duplicates_rejected),
        ("insights stored", summary.insights_stored),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "  {label:<20} {value}");
    }
    if summary.persist_failures > 0 {
        let _ = writeln!(out, "  {:<20} {}", "persist failures", summary.persist_failures);
    }
    let _ = writeln!(out, "  {:<20} {:.3}s", "duration", summary.duration_seconds);

    if !summary.errors.is_empty() {
        let _ = writeln!(out, "\nIsolated failures:");
        for error in &summary.errors {
            let _ = writeln!(
                out,
                "  [{}] {}: {}",
                error.stage.as_str(),
                error.item_id,
                error.message
            );
        }
    }
    out.trim_end().to_string()
}
