//! Maturity classification from aggregated telemetry.

use recgen_core::{Maturity, TelemetrySnapshot};

pub const COLD_START_MIN_CITATIONS: i64 = 50;
pub const COLD_START_MIN_SOURCE_DOMAINS: usize = 5;
pub const COLD_START_MIN_VISIBILITY: f64 = 5.0;
pub const COLD_START_MIN_SHARE_OF_VOICE: f64 = 5.0;
pub const LOW_DATA_MIN_CITATIONS: i64 = 100;
pub const LOW_DATA_MIN_VISIBILITY: f64 = 15.0;

/// Label how much reliable signal a snapshot carries.
///
/// `cold_start` when any of citations, distinct source domains, visibility
/// or share of voice is under its floor; otherwise `low_data` when
/// citations or visibility are under the second floor; otherwise `normal`.
#[must_use]
pub fn classify_maturity(snapshot: &TelemetrySnapshot) -> Maturity {
    let citations = snapshot.metrics.total_citations;
    let visibility = snapshot.metrics.visibility;

    if citations < COLD_START_MIN_CITATIONS
        || snapshot.unique_source_domains() < COLD_START_MIN_SOURCE_DOMAINS
        || visibility < COLD_START_MIN_VISIBILITY
        || snapshot.metrics.share_of_voice < COLD_START_MIN_SHARE_OF_VOICE
    {
        return Maturity::ColdStart;
    }

    if citations < LOW_DATA_MIN_CITATIONS || visibility < LOW_DATA_MIN_VISIBILITY {
        return Maturity::LowData;
    }

    Maturity::Normal
}
