//! Telemetry Aggregator: builds the immutable [`TelemetrySnapshot`] for a run.

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use recgen_core::{
    normalize_domain, CompetitorSummary, MetricTrends, SubjectRecord, TelemetrySnapshot,
};
use recgen_db::{StoreError, TelemetryStore};

use crate::settings::PipelineSettings;

/// Fetch everything the pipeline reads for `subject_id` over the window
/// ending at `now`, plus the preceding window of equal length for trends.
///
/// Competitor metrics are fetched at most `aggregation_batch_size` at a time.
///
/// # Errors
///
/// Returns the first [`StoreError`] from any read; nothing is partially kept.
pub async fn aggregate_telemetry(
    store: &dyn TelemetryStore,
    subject_id: i64,
    now: DateTime<Utc>,
    settings: &PipelineSettings,
) -> Result<(SubjectRecord, TelemetrySnapshot), StoreError> {
    let subject = store.fetch_subject(subject_id).await?;

    let window = Duration::days(i64::from(settings.window_days.max(1)));
    let window_start = now - window;
    let previous_start = window_start - window;

    let (current, previous, competitors, sources, qualitative) = tokio::try_join!(
        store.fetch_metrics(subject_id, window_start, now),
        store.fetch_metrics(subject_id, previous_start, window_start),
        store.fetch_competitors(subject_id),
        store.fetch_top_sources(subject_id, window_start, now, settings.top_sources),
        store.fetch_qualitative(subject_id),
    )?;

    let competitor_count = competitors.len();
    let summaries: Vec<Result<CompetitorSummary, StoreError>> = stream::iter(competitors)
        .map(|competitor| async move {
            let metrics = store
                .fetch_metrics(competitor.id, window_start, now)
                .await?;
            Ok::<_, StoreError>(CompetitorSummary {
                name: competitor.name,
                domain: competitor.domain,
                metrics,
            })
        })
        .buffered(settings.aggregation_batch_size.max(1))
        .collect()
        .await;
    let competitors = summaries.into_iter().collect::<Result<Vec<_>, _>>()?;

    let sources = sources
        .into_iter()
        .filter_map(|mut source| {
            source.domain = normalize_domain(&source.domain);
            (!source.domain.is_empty()).then_some(source)
        })
        .collect::<Vec<_>>();

    let snapshot = TelemetrySnapshot {
        subject_id,
        window_start,
        window_end: now,
        metrics: current,
        trends: MetricTrends::between(&current, &previous),
        sources,
        competitors,
        qualitative,
    };

    tracing::info!(
        subject_id,
        citations = snapshot.metrics.total_citations,
        visibility = snapshot.metrics.visibility,
        sources = snapshot.sources.len(),
        competitors = competitor_count,
        "telemetry aggregated"
    );

    Ok((subject, snapshot))
}
