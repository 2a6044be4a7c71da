//! The recommendation record that flows through the pipeline.

use serde::{Deserialize, Serialize};

use crate::telemetry::SourceMetric;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusDimension {
    Visibility,
    ShareOfVoice,
    Sentiment,
}

impl FocusDimension {
    /// Parse the loose spellings generative backends produce.
    #[must_use]
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "visibility" | "vis" => Some(Self::Visibility),
            "shareofvoice" | "sov" | "share" => Some(Self::ShareOfVoice),
            "sentiment" | "sent" => Some(Self::Sentiment),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visibility => "visibility",
            Self::ShareOfVoice => "share_of_voice",
            Self::Sentiment => "sentiment",
        }
    }
}

impl std::fmt::Display for FocusDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    #[must_use]
    pub fn parse_loose(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" | "h" | "critical" | "urgent" => Some(Self::High),
            "medium" | "med" | "m" | "moderate" => Some(Self::Medium),
            "low" | "l" => Some(Self::Low),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    #[must_use]
    pub fn parse_loose(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" | "l" | "easy" => Some(Self::Low),
            "medium" | "med" | "m" | "moderate" => Some(Self::Medium),
            "high" | "h" | "hard" => Some(Self::High),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Tag assigned after ranking to describe how a recommendation fits the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategicRole {
    Defensive,
    QuickWin,
    StrategicBet,
}

impl StrategicRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Defensive => "defensive",
            Self::QuickWin => "quick_win",
            Self::StrategicBet => "strategic_bet",
        }
    }
}

/// Workflow status of a persisted recommendation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    #[default]
    New,
    InProgress,
    Done,
    Dismissed,
}

impl CandidateStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Dismissed => "dismissed",
        }
    }
}

impl std::str::FromStr for CandidateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "dismissed" => Ok(Self::Dismissed),
            other => Err(format!("unknown candidate status '{other}'")),
        }
    }
}

/// Source metrics copied onto a candidate once its citation source is matched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttachedMetrics {
    pub impact_score: f64,
    pub mention_rate: f64,
    pub share_of_voice: f64,
    pub sentiment: f64,
    pub visibility: f64,
    pub citation_count: i64,
}

impl From<&SourceMetric> for AttachedMetrics {
    fn from(source: &SourceMetric) -> Self {
        Self {
            impact_score: source.impact_score,
            mention_rate: source.mention_rate,
            share_of_voice: source.share_of_voice,
            sentiment: source.sentiment,
            visibility: source.visibility,
            citation_count: source.citation_count,
        }
    }
}

/// An in-flight recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Durable identifier, set only after persistence.
    pub id: Option<i64>,
    pub action: String,
    pub citation_source: String,
    pub focus: FocusDimension,
    pub priority: Priority,
    pub effort: Effort,
    pub kpi: String,
    pub reason: String,
    pub explanation: String,
    pub expected_impact: String,
    pub timeline: String,
    /// 0–100.
    pub confidence: u8,
    /// Long-form draft content, when the backend produced one.
    pub content: Option<String>,
    pub metrics: Option<AttachedMetrics>,
    pub calculated_score: Option<f64>,
    pub strategic_role: Option<StrategicRole>,
}

impl Candidate {
    /// A candidate with the required text fields and neutral defaults elsewhere.
    #[must_use]
    pub fn new(action: impl Into<String>, citation_source: impl Into<String>) -> Self {
        Self {
            id: None,
            action: action.into(),
            citation_source: citation_source.into(),
            focus: FocusDimension::Visibility,
            priority: Priority::Medium,
            effort: Effort::Medium,
            kpi: String::new(),
            reason: String::new(),
            explanation: String::new(),
            expected_impact: String::new(),
            timeline: String::new(),
            confidence: 50,
            content: None,
            metrics: None,
            calculated_score: None,
            strategic_role: None,
        }
    }

    /// Free-text fields used for rationale and comparison framing.
    #[must_use]
    pub fn rationale_fields(&self) -> [(&'static str, &str); 3] {
        [
            ("reason", self.reason.as_str()),
            ("explanation", self.explanation.as_str()),
            ("expected_impact", self.expected_impact.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_parses_loose_spellings() {
        assert_eq!(
            FocusDimension::parse_loose("Share of Voice"),
            Some(FocusDimension::ShareOfVoice)
        );
        assert_eq!(
            FocusDimension::parse_loose("share_of_voice"),
            Some(FocusDimension::ShareOfVoice)
        );
        assert_eq!(FocusDimension::parse_loose("SOV"), Some(FocusDimension::ShareOfVoice));
        assert_eq!(
            FocusDimension::parse_loose("visibility"),
            Some(FocusDimension::Visibility)
        );
        assert_eq!(FocusDimension::parse_loose("reach"), None);
    }

    #[test]
    fn priority_and_effort_are_case_insensitive() {
        assert_eq!(Priority::parse_loose(" HIGH "), Some(Priority::High));
        assert_eq!(Effort::parse_loose("low"), Some(Effort::Low));
        assert_eq!(Effort::parse_loose("extreme"), None);
    }

    #[test]
    fn candidate_status_round_trips_through_str() {
        for status in [
            CandidateStatus::New,
            CandidateStatus::InProgress,
            CandidateStatus::Done,
            CandidateStatus::Dismissed,
        ] {
            assert_eq!(status.as_str().parse::<CandidateStatus>(), Ok(status));
        }
        assert!("archived".parse::<CandidateStatus>().is_err());
    }

    #[test]
    fn candidate_serializes_camel_case() {
        let c = Candidate::new("Publish a comparison guide", "example.com");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["citationSource"], "example.com");
        assert_eq!(json["focus"], "visibility");
    }
}
