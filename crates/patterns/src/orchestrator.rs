use crate::config::EngineConfig;
use crate::dedup::Deduplicator;
use crate::error::{EngineError, Result};
use crate::ports::{InsightStore, SignalRepository, TextGenerator};
use crate::synthesizer::InsightSynthesizer;
use pattern_graph::ClusterBuilder;
use pattern_protocol::{RunReason, RunSummary, Signal, Stage, StageError};
use pattern_vector_store::{validate_embedding, LinkDetector};
use std::time::Instant;

/// Run one pattern detection batch.
///
/// Only a failed signal fetch is returned as an error; every other failure is
/// contained and reported in `RunSummary::errors`. Callers must not run two
/// batches against the same store concurrently.
pub async fn run_pattern_detection(
    repository: &dyn SignalRepository,
    store: &dyn InsightStore,
    generator: &dyn TextGenerator,
    config: &EngineConfig,
) -> Result<RunSummary> {
    config.validate()?;
    let started = Instant::now();

    log::info!("Pattern detection run started (max_signals={})", config.max_signals);

    // 1. fetch
    let mut fetched = repository
        .fetch_active_with_embeddings(config.max_signals)
        .await
        .map_err(EngineError::Fetch)?;
    fetched.truncate(config.max_signals);

    let mut summary = RunSummary::completed();
    let signals = ingest(fetched, config.embedding_dimension, &mut summary);
    summary.cards_analyzed = signals.len();

    if signals.len() < config.min_cluster_size {
        log::info!(
            "Skipping run: {} eligible signals (need {})",
            signals.len(),
            config.min_cluster_size
        );
        let mut skipped = RunSummary::skipped(RunReason::InsufficientCards);
        skipped.cards_analyzed = summary.cards_analyzed;
        skipped.errors = summary.errors;
        return Ok(finish(skipped, started));
    }

    // 2. detect links
    let links = LinkDetector::new(config.similarity_band()?).detect(&signals)?;
    summary.cross_domain_links = links.len();
    if links.is_empty() {
        log::info!("No cross-domain links among {} signals", signals.len());
        return Ok(finish(
            summary.with_reason(RunReason::NoCrossDomainLinks),
            started,
        ));
    }

    // 3. build clusters
    let clusters = ClusterBuilder::new(config.cluster_bounds()?).build(&links, &signals);
    summary.clusters_found = clusters.len();
    if clusters.is_empty() {
        return Ok(finish(summary, started));
    }

    // 4. synthesize
    let synthesizer = InsightSynthesizer::new(generator, config)?;
    let synthesized = synthesizer
        .synthesize_all(&clusters, config.max_insights_per_run)
        .await;
    summary.insights_generated = synthesized.insights.len();
    summary.errors.extend(synthesized.errors);

    // 5. deduplicate
    let existing = match store.fetch_active_related_id_sets().await {
        Ok(sets) => sets,
        Err(err) => {
            log::warn!("Could not load active insights for dedup: {err}");
            summary.record(StageError::new(
                Stage::Deduplicate,
                "active_insights",
                err.to_string(),
            ));
            Vec::new()
        }
    };
    let deduped = Deduplicator::new(config.dedup_threshold, existing).filter(synthesized.insights);
    summary.duplicates_rejected = deduped.rejected.len();

    // 6. persist
    for insight in &deduped.accepted {
        match store.persist(insight).await {
            Ok(()) => summary.insights_stored += 1,
            Err(err) => {
                log::warn!("Failed to persist insight '{}': {err}", insight.title);
                summary.persist_failures += 1;
                summary.record(StageError::new(
                    Stage::Persist,
                    insight.related_signal_ids.join(","),
                    err.to_string(),
                ));
            }
        }
    }

    let summary = finish(summary, started);
    log::info!(
        "Pattern detection complete: {} signals, {} links, {} clusters, {} generated, {} stored in {:.2}s",
        summary.cards_analyzed,
        summary.cross_domain_links,
        summary.clusters_found,
        summary.insights_generated,
        summary.insights_stored,
        summary.duration_seconds
    );
    Ok(summary)
}

/// Drop signals whose embeddings break the dimensionality contract.
///
/// With `dimension == 0` the first signal with a non-empty embedding sets the
/// expected length for the run.
fn ingest(fetched: Vec<Signal>, dimension: usize, summary: &mut RunSummary) -> Vec<Signal> {
    let expected = if dimension > 0 {
        dimension
    } else {
        fetched
            .iter()
            .map(|s| s.embedding.dimension())
            .find(|&d| d > 0)
            .unwrap_or_default()
    };

    let mut eligible = Vec::with_capacity(fetched.len());
    for signal in fetched {
        if signal.domain_tag.trim().is_empty() {
            summary.record(StageError::new(Stage::Ingest, &signal.id, "missing domain tag"));
            continue;
        }
        if let Err(err) = validate_embedding(&signal.embedding, expected) {
            log::warn!("Rejecting signal {} from this run: {err}", signal.id);
            summary.record(StageError::new(Stage::Ingest, &signal.id, err.to_string()));
            continue;
        }
        eligible.push(signal);
    }
    eligible
}

fn finish(mut summary: RunSummary, started: Instant) -> RunSummary {
    summary.duration_seconds = (started.elapsed().as_secs_f64() * 1000.0).round() / 1000.0;
    summary
}
