//! In-process [`TelemetryStore`] for tests and dry runs.
//!
//! Aggregation follows the Postgres queries: metric averages and citation
//! sums over `[start, end)`, sources grouped by domain and ordered by impact.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recgen_core::{
    CandidateStatus, CompetitorRecord, NewGeneration, QualitativeContext, ScalarMetrics,
    SourceMetric, SubjectRecord,
};
use uuid::Uuid;

use crate::rows::{
    estimate_impact_score, GenerationRow, PersistedGeneration, RecommendationRow,
    StoredGeneration,
};
use crate::store::TelemetryStore;
use crate::StoreError;

#[derive(Debug, Clone)]
struct SourceObservation {
    subject_id: i64,
    observed_at: DateTime<Utc>,
    metric: SourceMetric,
    has_score: bool,
}

#[derive(Debug, Default)]
struct State {
    subjects: BTreeMap<i64, SubjectRecord>,
    competitors: BTreeMap<i64, Vec<i64>>,
    metrics: Vec<(i64, DateTime<Utc>, ScalarMetrics)>,
    sources: Vec<SourceObservation>,
    qualitative: BTreeMap<i64, QualitativeContext>,
    generations: Vec<GenerationRow>,
    recommendations: Vec<RecommendationRow>,
    fail_reads: bool,
    fail_writes: bool,
}

#[derive(Debug, Default)]
pub struct MemoryTelemetryStore {
    state: Mutex<State>,
}

impl MemoryTelemetryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means a test panicked mid-update; the data is still usable.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn add_subject(&self, subject: SubjectRecord) {
        self.lock().subjects.insert(subject.id, subject);
    }

    /// Registers `competitor` as a competitor of `subject_id`. The competitor
    /// is also stored as a subject so its metrics can be recorded.
    pub fn add_competitor(&self, subject_id: i64, competitor: SubjectRecord) {
        let mut state = self.lock();
        state
            .competitors
            .entry(subject_id)
            .or_default()
            .push(competitor.id);
        state.subjects.insert(competitor.id, competitor);
    }

    pub fn record_metrics(
        &self,
        entity_id: i64,
        observed_at: DateTime<Utc>,
        metrics: ScalarMetrics,
    ) {
        self.lock().metrics.push((entity_id, observed_at, metrics));
    }

    /// Records a source observation. A `None` impact score is left for
    /// [`TelemetryStore::refresh_source_scores`] to backfill.
    pub fn record_source(
        &self,
        subject_id: i64,
        observed_at: DateTime<Utc>,
        metric: SourceMetric,
        impact_known: bool,
    ) {
        self.lock().sources.push(SourceObservation {
            subject_id,
            observed_at,
            metric,
            has_score: impact_known,
        });
    }

    pub fn set_qualitative(&self, subject_id: i64, context: QualitativeContext) {
        self.lock().qualitative.insert(subject_id, context);
    }

    /// Makes every read fail with [`StoreError::Unavailable`].
    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Makes every write fail with [`StoreError::Unavailable`].
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// All generations written so far, oldest first.
    #[must_use]
    pub fn generations(&self) -> Vec<GenerationRow> {
        self.lock().generations.clone()
    }

    /// All recommendation rows written so far.
    #[must_use]
    pub fn recommendations(&self) -> Vec<RecommendationRow> {
        self.lock().recommendations.clone()
    }
}

fn check_reads(state: &State) -> Result<(), StoreError> {
    if state.fail_reads {
        return Err(StoreError::Unavailable("reads disabled".to_string()));
    }
    Ok(())
}

fn check_writes(state: &State) -> Result<(), StoreError> {
    if state.fail_writes {
        return Err(StoreError::Unavailable("writes disabled".to_string()));
    }
    Ok(())
}

fn in_window(at: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    at >= start && at < end
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[async_trait]
impl TelemetryStore for MemoryTelemetryStore {
    async fn fetch_subject(&self, subject_id: i64) -> Result<SubjectRecord, StoreError> {
        let state = self.lock();
        check_reads(&state)?;
        state
            .subjects
            .get(&subject_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "subject",
                id: subject_id,
            })
    }

    async fn fetch_metrics(
        &self,
        entity_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ScalarMetrics, StoreError> {
        let state = self.lock();
        check_reads(&state)?;
        let rows: Vec<&ScalarMetrics> = state
            .metrics
            .iter()
            .filter(|(id, at, _)| *id == entity_id && in_window(*at, start, end))
            .map(|(_, _, m)| m)
            .collect();

        let collect = |f: fn(&ScalarMetrics) -> f64| rows.iter().map(|m| f(m)).collect::<Vec<_>>();
        Ok(ScalarMetrics {
            visibility: mean(&collect(|m| m.visibility)),
            share_of_voice: mean(&collect(|m| m.share_of_voice)),
            sentiment: mean(&collect(|m| m.sentiment)),
            total_citations: rows.iter().map(|m| m.total_citations).sum(),
        })
    }

    async fn fetch_competitors(
        &self,
        subject_id: i64,
    ) -> Result<Vec<CompetitorRecord>, StoreError> {
        let state = self.lock();
        check_reads(&state)?;
        let mut competitors: Vec<CompetitorRecord> = state
            .competitors
            .get(&subject_id)
            .into_iter()
            .flatten()
            .filter_map(|id| state.subjects.get(id))
            .map(|s| CompetitorRecord {
                id: s.id,
                name: s.name.clone(),
                domain: s.domain.clone(),
            })
            .collect();
        competitors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(competitors)
    }

    async fn fetch_top_sources(
        &self,
        subject_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<SourceMetric>, StoreError> {
        let state = self.lock();
        check_reads(&state)?;

        let mut grouped: BTreeMap<&str, Vec<&SourceObservation>> = BTreeMap::new();
        for obs in state
            .sources
            .iter()
            .filter(|o| o.subject_id == subject_id && in_window(o.observed_at, start, end))
        {
            grouped.entry(obs.metric.domain.as_str()).or_default().push(obs);
        }

        let mut sources: Vec<SourceMetric> = grouped
            .into_iter()
            .map(|(domain, group)| {
                let field = |f: fn(&SourceMetric) -> f64| {
                    group.iter().map(|o| f(&o.metric)).collect::<Vec<_>>()
                };
                let scored: Vec<f64> = group
                    .iter()
                    .filter(|o| o.has_score)
                    .map(|o| o.metric.impact_score)
                    .collect();
                SourceMetric {
                    domain: domain.to_string(),
                    mention_rate: mean(&field(|m| m.mention_rate)),
                    share_of_voice: mean(&field(|m| m.share_of_voice)),
                    sentiment: mean(&field(|m| m.sentiment)),
                    citation_count: group.iter().map(|o| o.metric.citation_count).sum(),
                    impact_score: mean(&scored),
                    visibility: mean(&field(|m| m.visibility)),
                }
            })
            .collect();

        sources.sort_by(|a, b| {
            b.impact_score
                .total_cmp(&a.impact_score)
                .then(b.citation_count.cmp(&a.citation_count))
                .then(a.domain.cmp(&b.domain))
        });
        sources.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(sources)
    }

    async fn fetch_qualitative(
        &self,
        subject_id: i64,
    ) -> Result<Option<QualitativeContext>, StoreError> {
        let state = self.lock();
        check_reads(&state)?;
        Ok(state.qualitative.get(&subject_id).cloned())
    }

    async fn insert_generation(
        &self,
        generation: &NewGeneration<'_>,
    ) -> Result<PersistedGeneration, StoreError> {
        let mut state = self.lock();
        check_writes(&state)?;

        for row in &mut state.generations {
            if row.subject_id == generation.subject_id && row.status == "active" {
                row.status = "superseded".to_string();
            }
        }

        let generation_id = i64::try_from(state.generations.len()).unwrap_or(i64::MAX) + 1;
        let public_id = Uuid::new_v4();
        let provenance = generation.provenance;
        state.generations.push(GenerationRow {
            id: generation_id,
            public_id,
            subject_id: generation.subject_id,
            maturity: generation.maturity.as_str().to_string(),
            strategy: provenance.strategy.as_str().to_string(),
            backend_tier: provenance.tier.map(|t| i32::try_from(t).unwrap_or(i32::MAX)),
            backend_name: provenance.backend.clone(),
            prompt_digest: provenance.prompt_digest.clone(),
            status: "active".to_string(),
            created_at: Utc::now(),
        });

        let mut candidate_ids = Vec::with_capacity(generation.candidates.len());
        for (position, candidate) in generation.candidates.iter().enumerate() {
            let id = i64::try_from(state.recommendations.len()).unwrap_or(i64::MAX) + 1;
            state.recommendations.push(RecommendationRow {
                id,
                generation_id,
                position: i32::try_from(position).unwrap_or(i32::MAX),
                action: candidate.action.clone(),
                citation_source: candidate.citation_source.clone(),
                focus: candidate.focus.as_str().to_string(),
                priority: candidate.priority.as_str().to_string(),
                effort: candidate.effort.as_str().to_string(),
                kpi: candidate.kpi.clone(),
                reason: candidate.reason.clone(),
                explanation: candidate.explanation.clone(),
                expected_impact: candidate.expected_impact.clone(),
                timeline: candidate.timeline.clone(),
                confidence: i16::from(candidate.confidence),
                content: candidate.content.clone(),
                impact_score: candidate.metrics.map(|m| m.impact_score),
                calculated_score: candidate.calculated_score,
                strategic_role: candidate.strategic_role.map(|r| r.as_str().to_string()),
                status: CandidateStatus::New.as_str().to_string(),
            });
            candidate_ids.push(id);
        }

        Ok(PersistedGeneration {
            generation_id,
            public_id,
            candidate_ids,
        })
    }

    async fn fetch_generation(&self, generation_id: i64) -> Result<StoredGeneration, StoreError> {
        let state = self.lock();
        check_reads(&state)?;
        let generation = state
            .generations
            .iter()
            .find(|g| g.id == generation_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "generation",
                id: generation_id,
            })?;
        let mut recommendations: Vec<RecommendationRow> = state
            .recommendations
            .iter()
            .filter(|r| r.generation_id == generation_id)
            .cloned()
            .collect();
        recommendations.sort_by_key(|r| r.position);
        Ok(StoredGeneration {
            generation,
            recommendations,
        })
    }

    async fn update_candidate_status(
        &self,
        candidate_id: i64,
        status: CandidateStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        check_writes(&state)?;
        let row = state
            .recommendations
            .iter_mut()
            .find(|r| r.id == candidate_id)
            .ok_or(StoreError::NotFound {
                entity: "candidate",
                id: candidate_id,
            })?;
        row.status = status.as_str().to_string();
        Ok(())
    }

    async fn refresh_source_scores(&self, subject_id: i64) -> Result<u64, StoreError> {
        let mut state = self.lock();
        check_writes(&state)?;
        let mut touched = 0;
        for obs in state
            .sources
            .iter_mut()
            .filter(|o| o.subject_id == subject_id && !o.has_score)
        {
            obs.metric.impact_score = estimate_impact_score(
                obs.metric.mention_rate,
                obs.metric.share_of_voice,
                obs.metric.citation_count,
            );
            obs.has_score = true;
            touched += 1;
        }
        Ok(touched)
    }
}
