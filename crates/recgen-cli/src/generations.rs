//! Read and workflow commands over persisted generations.

use recgen_core::CandidateStatus;
use recgen_db::{PgTelemetryStore, StoreError, TelemetryStore};
use sqlx::PgPool;

/// Print a generation header and its recommendations in rank order.
///
/// # Errors
///
/// Returns an error if the generation does not exist or the query fails.
pub(crate) async fn run_show(pool: PgPool, generation_id: i64) -> anyhow::Result<()> {
    let store = PgTelemetryStore::new(pool);
    let stored = match store.fetch_generation(generation_id).await {
        Ok(stored) => stored,
        Err(StoreError::NotFound { .. }) => {
            anyhow::bail!("generation {generation_id} not found")
        }
        Err(e) => return Err(e.into()),
    };

    let g = &stored.generation;
    println!(
        "generation {} ({}) subject {} | {} | {} | {} | created {}",
        g.id,
        g.public_id,
        g.subject_id,
        g.maturity,
        g.strategy,
        g.status,
        g.created_at.format("%Y-%m-%d %H:%M")
    );
    if let Some(name) = &g.backend_name {
        println!(
            "backend {name} (tier {})",
            g.backend_tier.map_or_else(|| "-".to_string(), |t| t.to_string())
        );
    }

    if stored.recommendations.is_empty() {
        println!("no recommendations stored");
        return Ok(());
    }

    println!(
        "{:<6}{:<8}{:<8}{:<14}{:<22}ACTION",
        "#", "ID", "SCORE", "STATUS", "SOURCE"
    );
    for rec in &stored.recommendations {
        println!(
            "{:<6}{:<8}{:<8.3}{:<14}{:<22}{}",
            rec.position + 1,
            rec.id,
            rec.calculated_score.unwrap_or_default(),
            rec.status,
            rec.citation_source,
            rec.action
        );
    }

    Ok(())
}

/// Set the workflow status of one recommendation.
///
/// # Errors
///
/// Returns an error if the recommendation does not exist or the update fails.
pub(crate) async fn run_set_status(
    pool: PgPool,
    candidate_id: i64,
    status: CandidateStatus,
) -> anyhow::Result<()> {
    let store = PgTelemetryStore::new(pool);
    match store.update_candidate_status(candidate_id, status).await {
        Ok(()) => {
            tracing::info!(candidate_id, status = status.as_str(), "candidate status updated");
            println!("recommendation {candidate_id} is now {}", status.as_str());
            Ok(())
        }
        Err(StoreError::NotFound { .. }) => {
            anyhow::bail!("recommendation {candidate_id} not found")
        }
        Err(e) => Err(e.into()),
    }
}
