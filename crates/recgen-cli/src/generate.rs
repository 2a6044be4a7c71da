//! `generate` command: one pipeline run for one subject.

use std::sync::Arc;

use recgen_core::{AppConfig, StrategicRole};
use recgen_db::{PgTelemetryStore, TelemetryStore};
use recgen_llm::{BackendError, BackendRegistry, ChatCompletionsBackend};
use recgen_pipeline::{GenerationResult, PipelineSettings, RecommendationPipeline, TemplateCatalog};
use sqlx::PgPool;

/// Register the configured chat-completions backends: `default` first,
/// then `fallback`.
///
/// # Errors
///
/// Returns [`BackendError::Http`] if an HTTP client cannot be built.
pub(crate) fn build_registry(config: &AppConfig) -> Result<BackendRegistry, BackendError> {
    let transport_timeout = config
        .llm_light_timeout_secs
        .max(config.llm_heavy_timeout_secs);
    let api_key = config.llm_api_key.as_deref();

    let mut registry = BackendRegistry::new();
    registry.register_default(Arc::new(ChatCompletionsBackend::new(
        "default",
        &config.llm_base_url,
        &config.llm_default_model,
        api_key,
        transport_timeout,
    )?));
    registry.register_default(Arc::new(ChatCompletionsBackend::new(
        "fallback",
        &config.llm_fallback_base_url,
        &config.llm_fallback_model,
        api_key,
        transport_timeout,
    )?));
    Ok(registry)
}

/// Run the pipeline for `subject_id` and print the result.
///
/// Returns whether the run succeeded.
///
/// # Errors
///
/// Returns an error if the backends or template catalog cannot be set up,
/// or the result cannot be rendered. Pipeline failures are printed, not returned.
pub(crate) async fn run_generate(
    config: &AppConfig,
    pool: PgPool,
    subject_id: i64,
    json: bool,
) -> anyhow::Result<bool> {
    let store = Arc::new(PgTelemetryStore::new(pool));
    let registry = build_registry(config)?;
    tracing::info!(tiers = ?registry.default_order(), "backends registered");

    // The process exits right after the run, so the backfill runs inline.
    let settings = PipelineSettings {
        backfill_source_scores: false,
        ..PipelineSettings::from_app_config(config)
    };
    let pipeline = RecommendationPipeline::new(
        Arc::clone(&store) as Arc<dyn TelemetryStore>,
        registry,
        TemplateCatalog::embedded()?,
        settings,
    );

    let result = pipeline.generate_recommendations(subject_id).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(subject_id, &result);
    }

    if result.success {
        match store.refresh_source_scores(subject_id).await {
            Ok(updated) => tracing::debug!(subject_id, updated, "source scores refreshed"),
            Err(e) => tracing::warn!(subject_id, error = %e, "source score backfill failed"),
        }
    }

    Ok(result.success)
}

fn print_result(subject_id: i64, result: &GenerationResult) {
    let maturity = result
        .maturity
        .map_or_else(|| "unknown".to_string(), |m| m.to_string());

    if result.success {
        let strategy = result
            .provenance
            .as_ref()
            .map_or("unknown", |p| p.strategy.as_str());
        let backend = result
            .provenance
            .as_ref()
            .and_then(|p| p.backend.as_deref())
            .unwrap_or("none");
        println!(
            "generation {} for subject {subject_id}: {maturity}, strategy {strategy}, backend {backend}",
            result.generation_id.unwrap_or_default()
        );
        println!("{:<8}{:<8}{:<16}{:<22}ACTION", "ID", "SCORE", "ROLE", "SOURCE");
        for c in &result.candidates {
            println!(
                "{:<8}{:<8.3}{:<16}{:<22}{}",
                c.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                c.calculated_score.unwrap_or_default(),
                c.strategic_role.map_or("-", StrategicRole::as_str),
                c.citation_source,
                c.action
            );
        }
    } else {
        let kind = result
            .failure
            .map_or_else(|| "unknown".to_string(), |k| k.to_string());
        println!(
            "generation failed for subject {subject_id} ({maturity}): {kind}: {}",
            result.message.as_deref().unwrap_or("no details")
        );
    }

    for removed in &result.removed {
        println!(
            "removed [{}] {} ({}): {}",
            removed.stage,
            removed.action,
            removed.citation_source,
            removed.reasons.join("; ")
        );
    }
}
