//! Aggregated telemetry for one subject over a rolling window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Absolute percent change below which a trend is considered flat.
pub const STABLE_THRESHOLD_PERCENT: f64 = 2.0;

/// The brand (or entity) recommendations are generated for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub id: i64,
    pub name: String,
    pub domain: Option<String>,
    /// Industry vertical, used to size the cold-start template set.
    pub vertical: Option<String>,
    /// Name of a registered generation backend to try before the defaults.
    pub preferred_backend: Option<String>,
}

/// A tracked competitor of a subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorRecord {
    pub id: i64,
    pub name: String,
    pub domain: Option<String>,
}

/// Scalar metrics for one entity over one window.
///
/// `visibility`, `share_of_voice` and `sentiment` are on a 0–100 scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarMetrics {
    pub visibility: f64,
    pub share_of_voice: f64,
    pub sentiment: f64,
    pub total_citations: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Up => write!(f, "up"),
            TrendDirection::Down => write!(f, "down"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

/// Period-over-period change of a single metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub current: f64,
    pub previous: f64,
    pub change_percent: f64,
    pub direction: TrendDirection,
}

impl Trend {
    /// Compute the trend between two window values.
    ///
    /// A zero previous value yields 0% when the current value is also zero
    /// and +100% otherwise.
    #[must_use]
    pub fn between(current: f64, previous: f64) -> Self {
        let change_percent = if previous.abs() < f64::EPSILON {
            if current.abs() < f64::EPSILON {
                0.0
            } else {
                100.0
            }
        } else {
            (current - previous) / previous.abs() * 100.0
        };

        let direction = if change_percent.abs() < STABLE_THRESHOLD_PERCENT {
            TrendDirection::Stable
        } else if change_percent > 0.0 {
            TrendDirection::Up
        } else {
            TrendDirection::Down
        };

        Self {
            current,
            previous,
            change_percent,
            direction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricTrends {
    pub visibility: Trend,
    pub share_of_voice: Trend,
    pub sentiment: Trend,
}

impl MetricTrends {
    #[must_use]
    pub fn between(current: &ScalarMetrics, previous: &ScalarMetrics) -> Self {
        Self {
            visibility: Trend::between(current.visibility, previous.visibility),
            share_of_voice: Trend::between(current.share_of_voice, previous.share_of_voice),
            sentiment: Trend::between(current.sentiment, previous.sentiment),
        }
    }
}

/// Aggregate for one citation source domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetric {
    pub domain: String,
    pub mention_rate: f64,
    pub share_of_voice: f64,
    pub sentiment: f64,
    pub citation_count: i64,
    /// Composite impact on a 0–10 scale.
    pub impact_score: f64,
    pub visibility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorSummary {
    pub name: String,
    pub domain: Option<String>,
    pub metrics: ScalarMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordFrequency {
    pub keyword: String,
    pub frequency: i64,
}

/// Optional narrative context cached alongside the numeric telemetry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitativeContext {
    pub keywords: Vec<KeywordFrequency>,
    pub narrative: Option<String>,
    pub quotes: Vec<String>,
}

/// Everything the pipeline knows about a subject for one window.
///
/// Built once per generation request and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub subject_id: i64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub metrics: ScalarMetrics,
    pub trends: MetricTrends,
    /// Ordered by impact, highest first.
    pub sources: Vec<SourceMetric>,
    pub competitors: Vec<CompetitorSummary>,
    pub qualitative: Option<QualitativeContext>,
}

impl TelemetrySnapshot {
    /// Number of distinct source domains in the snapshot.
    #[must_use]
    pub fn unique_source_domains(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        self.sources
            .iter()
            .filter(|s| seen.insert(crate::normalize_domain(&s.domain)))
            .count()
    }

    /// Looks up a source by domain, comparing normalized forms.
    #[must_use]
    pub fn source_for(&self, domain: &str) -> Option<&SourceMetric> {
        let wanted = crate::normalize_domain(domain);
        if wanted.is_empty() {
            return None;
        }
        self.sources
            .iter()
            .find(|s| crate::normalize_domain(&s.domain) == wanted)
    }
}
