//! Recommendation pipeline orchestration.

use std::sync::Arc;

use chrono::Utc;
use recgen_core::{Candidate, GenerationStrategy, Maturity, Provenance};
use recgen_db::TelemetryStore;
use recgen_llm::{BackendRegistry, RequestWeight};
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::aggregate_telemetry;
use crate::error::FailureKind;
use crate::exclusion::build_exclusion_list;
use crate::filter::RemovedCandidate;
use crate::generate::{generate_direct, generate_from_templates, GenerationOutcome};
use crate::maturity::classify_maturity;
use crate::persist::{persist_generation, PersistError};
use crate::prompt::direct_request;
use crate::quality::apply_quality_gate;
use crate::rank::rank;
use crate::safety::SafetyFilter;
use crate::settings::PipelineSettings;
use crate::stages::{attach_source_metrics, dedupe_by_action};
use crate::templates::TemplateCatalog;

/// What one call to [`RecommendationPipeline::generate_recommendations`] produced.
///
/// Failed runs carry `success: false`, a [`FailureKind`] and a message, and
/// never a generation id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    pub generation_id: Option<i64>,
    pub public_id: Option<Uuid>,
    pub maturity: Option<Maturity>,
    pub candidates: Vec<Candidate>,
    pub message: Option<String>,
    pub failure: Option<FailureKind>,
    pub provenance: Option<Provenance>,
    /// Every candidate a gate removed, with its reasons.
    pub removed: Vec<RemovedCandidate>,
}

impl GenerationResult {
    fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            generation_id: None,
            public_id: None,
            maturity: None,
            candidates: Vec::new(),
            message: Some(message.into()),
            failure: Some(kind),
            provenance: None,
            removed: Vec::new(),
        }
    }
}

/// Aggregate, generate, filter, rank and persist recommendations for one
/// subject at a time. Runs share no mutable state.
pub struct RecommendationPipeline {
    store: Arc<dyn TelemetryStore>,
    registry: BackendRegistry,
    templates: TemplateCatalog,
    settings: PipelineSettings,
}

impl RecommendationPipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn TelemetryStore>,
        registry: BackendRegistry,
        templates: TemplateCatalog,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            registry,
            templates,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run the whole pipeline for `subject_id`.
    ///
    /// 1. Aggregate telemetry into a snapshot.
    /// 2. Classify maturity.
    /// 3. Generate candidates: templates for `cold_start`, the backend chain otherwise.
    /// 4. Drop duplicates, then apply the safety filter.
    /// 5. Attach source metrics and apply the quality gate.
    /// 6. Rank, cap at `max_recommendations`, and persist.
    ///
    /// Never returns an error: every failure is reported in the result.
    #[allow(clippy::too_many_lines)]
    pub async fn generate_recommendations(&self, subject_id: i64) -> GenerationResult {
        let (subject, snapshot) =
            match aggregate_telemetry(self.store.as_ref(), subject_id, Utc::now(), &self.settings)
                .await
            {
                Ok(parts) => parts,
                Err(e) if e.is_not_found() => {
                    tracing::warn!(subject_id, "subject not found");
                    return GenerationResult::failed(
                        FailureKind::SubjectNotFound,
                        format!("subject {subject_id} not found"),
                    );
                }
                Err(e) => {
                    tracing::error!(subject_id, error = %e, "telemetry aggregation failed");
                    return GenerationResult::failed(
                        FailureKind::UpstreamUnavailable,
                        format!("telemetry store unavailable: {e}"),
                    );
                }
            };

        let maturity = classify_maturity(&snapshot);
        tracing::info!(subject_id, maturity = maturity.as_str(), "subject classified");

        let exclusions = build_exclusion_list(
            snapshot
                .competitors
                .iter()
                .map(|c| (c.name.as_str(), c.domain.as_deref())),
            &subject.name,
            subject.domain.as_deref(),
        );
        let safety = SafetyFilter::new(exclusions, self.settings.allow_competitor_mentions);
        let chain = self
            .registry
            .chain_for(subject.preferred_backend.as_deref(), self.settings.timeouts);

        let generated = match maturity {
            Maturity::ColdStart => {
                generate_from_templates(&chain, &self.templates, &safety, &subject, &snapshot)
                    .await
            }
            Maturity::LowData | Maturity::Normal => {
                let (items, weight) = if maturity == Maturity::LowData {
                    (self.settings.low_data_items(), RequestWeight::Light)
                } else {
                    (self.settings.max_recommendations, RequestWeight::Heavy)
                };
                let request = direct_request(&subject, &snapshot, items, weight);
                match generate_direct(&chain, &request).await {
                    GenerationOutcome::Produced(generated) => generated,
                    GenerationOutcome::NoOutput { failures } => {
                        tracing::error!(
                            subject_id,
                            tiers = failures.len(),
                            "every backend tier failed"
                        );
                        let mut result = GenerationResult::failed(
                            FailureKind::NoOutput,
                            "no output: every generation backend failed or timed out",
                        );
                        result.maturity = Some(maturity);
                        return result;
                    }
                    GenerationOutcome::NoRecoverable { provenance } => {
                        let mut result = GenerationResult::failed(
                            FailureKind::NoRecoverableCandidates,
                            "backend output contained no recoverable recommendations",
                        );
                        result.maturity = Some(maturity);
                        result.provenance = Some(provenance);
                        return result;
                    }
                }
            }
        };
        let provenance = generated.provenance;

        let safety = if provenance.strategy == GenerationStrategy::Direct {
            safety.with_known_sources(snapshot.sources.iter().map(|s| s.domain.as_str()))
        } else {
            safety
        };

        let generated_count = generated.candidates.len();
        let candidates = dedupe_by_action(generated.candidates);
        let duplicates = generated_count - candidates.len();
        let (mut candidates, mut removed) = safety.apply(candidates).into_report("safety");
        attach_source_metrics(&mut candidates, &snapshot);
        let (candidates, quality_removed) = apply_quality_gate(candidates).into_report("quality");
        removed.extend(quality_removed);

        if candidates.is_empty() {
            return exhausted(maturity, provenance, duplicates, removed);
        }

        let mut ranked = rank(candidates, &snapshot.trends);
        ranked.truncate(self.settings.max_recommendations.max(1));

        match persist_generation(
            self.store.as_ref(),
            &safety,
            subject_id,
            maturity,
            &provenance,
            ranked,
        )
        .await
        {
            Ok(persisted) => {
                removed.extend(persisted.removed);
                self.spawn_source_backfill(subject_id);
                GenerationResult {
                    success: true,
                    generation_id: Some(persisted.generation_id),
                    public_id: Some(persisted.public_id),
                    maturity: Some(maturity),
                    candidates: persisted.candidates,
                    message: None,
                    failure: None,
                    provenance: Some(provenance),
                    removed,
                }
            }
            Err(PersistError::Exhausted { removed: late }) => {
                removed.extend(late);
                exhausted(maturity, provenance, duplicates, removed)
            }
            Err(PersistError::Store(e)) => {
                tracing::error!(subject_id, error = %e, "failed to persist generation");
                let mut result = GenerationResult::failed(
                    FailureKind::PersistenceFailed,
                    format!("failed to persist generation: {e}"),
                );
                result.maturity = Some(maturity);
                result.provenance = Some(provenance);
                result.removed = removed;
                result
            }
        }
    }

    /// Backfill source scores off the request path. Errors are logged only.
    fn spawn_source_backfill(&self, subject_id: i64) {
        if !self.settings.backfill_source_scores {
            return;
        }
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            match store.refresh_source_scores(subject_id).await {
                Ok(updated) => {
                    tracing::debug!(subject_id, updated, "source scores refreshed");
                }
                Err(e) => {
                    tracing::warn!(subject_id, error = %e, "source score backfill failed");
                }
            }
        });
    }
}

/// `removed` holds one entry per unique candidate a gate rejected;
/// `duplicates` counts the repeats dropped before the gates ran.
fn exhausted(
    maturity: Maturity,
    provenance: Provenance,
    duplicates: usize,
    removed: Vec<RemovedCandidate>,
) -> GenerationResult {
    let generated = duplicates + removed.len();
    tracing::warn!(
        maturity = maturity.as_str(),
        generated,
        duplicates,
        "every candidate was removed by the safety and quality gates"
    );
    let message = if duplicates == 0 {
        format!("all {generated} candidates were removed by the safety and quality gates")
    } else {
        format!(
            "all {generated} candidates were removed: {duplicates} as duplicates, {} by the \
             safety and quality gates",
            removed.len()
        )
    };
    let mut result = GenerationResult::failed(FailureKind::FilteringExhausted, message);
    result.maturity = Some(maturity);
    result.provenance = Some(provenance);
    result.removed = removed;
    result
}
