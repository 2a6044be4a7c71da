//! Ranking Engine: a reproducible composite score per candidate.

use recgen_core::{
    Candidate, Effort, FocusDimension, MetricTrends, StrategicRole, Trend, TrendDirection,
};

const IMPACT_WEIGHT: f64 = 0.4;
const CONFIDENCE_WEIGHT: f64 = 0.3;
const EFFORT_WEIGHT: f64 = 0.2;
const URGENCY_WEIGHT: f64 = 0.1;

/// Declines at or below this magnitude carry no urgency.
const URGENCY_MIN_CHANGE_PERCENT: f64 = 5.0;
/// Change magnitude at which urgency saturates.
const URGENCY_FULL_CHANGE_PERCENT: f64 = 30.0;

const QUICK_WIN_MIN_IMPACT: f64 = 0.5;
const STRATEGIC_BET_MIN_IMPACT: f64 = 0.7;

#[must_use]
pub fn effort_penalty(effort: Effort) -> f64 {
    match effort {
        Effort::Low => 0.1,
        Effort::Medium => 0.5,
        Effort::High => 1.0,
    }
}

fn trend_for(trends: &MetricTrends, focus: FocusDimension) -> &Trend {
    match focus {
        FocusDimension::Visibility => &trends.visibility,
        FocusDimension::ShareOfVoice => &trends.share_of_voice,
        FocusDimension::Sentiment => &trends.sentiment,
    }
}

/// Urgency in `[0, 1]` from the trend of the candidate's focus dimension.
/// Only declines steeper than 5% count.
#[must_use]
pub fn trend_urgency(trends: &MetricTrends, focus: FocusDimension) -> f64 {
    let trend = trend_for(trends, focus);
    let magnitude = trend.change_percent.abs();
    if trend.direction == TrendDirection::Down && magnitude > URGENCY_MIN_CHANGE_PERCENT {
        (magnitude / URGENCY_FULL_CHANGE_PERCENT).min(1.0)
    } else {
        0.0
    }
}

/// Impact normalized to `[0, 1]`; zero when no source metrics are attached.
#[must_use]
pub fn normalized_impact(candidate: &Candidate) -> f64 {
    candidate
        .metrics
        .map_or(0.0, |m| (m.impact_score / 10.0).clamp(0.0, 1.0))
}

#[must_use]
pub fn score_candidate(candidate: &Candidate, trends: &MetricTrends) -> f64 {
    let impact = normalized_impact(candidate);
    let confidence = f64::from(candidate.confidence.min(100)) / 100.0;
    IMPACT_WEIGHT * impact + CONFIDENCE_WEIGHT * confidence
        - EFFORT_WEIGHT * effort_penalty(candidate.effort)
        + URGENCY_WEIGHT * trend_urgency(trends, candidate.focus)
}

fn strategic_role(candidate: &Candidate, trends: &MetricTrends) -> Option<StrategicRole> {
    let impact = normalized_impact(candidate);
    if trend_urgency(trends, candidate.focus) > 0.0 {
        Some(StrategicRole::Defensive)
    } else if candidate.effort == Effort::Low && impact >= QUICK_WIN_MIN_IMPACT {
        Some(StrategicRole::QuickWin)
    } else if candidate.effort == Effort::High && impact >= STRATEGIC_BET_MIN_IMPACT {
        Some(StrategicRole::StrategicBet)
    } else {
        None
    }
}

/// Score, tag and sort candidates by descending score.
///
/// The sort is stable: equal scores keep generation order.
#[must_use]
pub fn rank(mut candidates: Vec<Candidate>, trends: &MetricTrends) -> Vec<Candidate> {
    for candidate in &mut candidates {
        candidate.calculated_score = Some(score_candidate(candidate, trends));
        candidate.strategic_role = strategic_role(candidate, trends);
    }
    candidates.sort_by(|a, b| {
        let a = a.calculated_score.unwrap_or(f64::MIN);
        let b = b.calculated_score.unwrap_or(f64::MIN);
        b.total_cmp(&a)
    });
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{candidate, source};
    use recgen_core::{AttachedMetrics, ScalarMetrics};

    fn flat() -> MetricTrends {
        let m = ScalarMetrics::default();
        MetricTrends::between(&m, &m)
    }

    fn declining_visibility(change_percent: f64) -> MetricTrends {
        let mut t = flat();
        t.visibility = Trend {
            current: 100.0 + change_percent,
            previous: 100.0,
            change_percent,
            direction: TrendDirection::Down,
        };
        t
    }

    fn with_impact(action: &str, impact: f64, effort: Effort, confidence: u8) -> Candidate {
        let mut c = candidate(action, "g2.com");
        c.metrics = Some(AttachedMetrics::from(&source("g2.com", impact, 10)));
        c.effort = effort;
        c.confidence = confidence;
        c
    }

    #[test]
    fn score_follows_the_weighted_formula() {
        let c = with_impact("Publish a buyer's guide", 8.0, Effort::Low, 90);
        let expected = 0.4 * 0.8 + 0.3 * 0.9 - 0.2 * 0.1;
        assert!((score_candidate(&c, &flat()) - expected).abs() < 1e-12);
    }

    #[test]
    fn impact_is_capped_and_missing_metrics_count_as_zero() {
        let high = with_impact("Publish a buyer's guide", 25.0, Effort::Medium, 0);
        assert!((normalized_impact(&high) - 1.0).abs() < f64::EPSILON);

        let bare = candidate("Publish a buyer's guide", "g2.com");
        assert!(normalized_impact(&bare).abs() < f64::EPSILON);
    }

    #[test]
    fn urgency_only_for_declines_past_five_percent() {
        let urgency = |change: f64, focus| trend_urgency(&declining_visibility(change), focus);
        assert!(urgency(-5.0, FocusDimension::Visibility).abs() < f64::EPSILON);
        assert!((urgency(-15.0, FocusDimension::Visibility) - 0.5).abs() < 1e-12);
        assert!((urgency(-60.0, FocusDimension::Visibility) - 1.0).abs() < 1e-12);
        // Other dimensions are flat.
        assert!(urgency(-60.0, FocusDimension::Sentiment).abs() < f64::EPSILON);

        let mut rising = declining_visibility(20.0);
        rising.visibility.direction = TrendDirection::Up;
        assert!(trend_urgency(&rising, FocusDimension::Visibility).abs() < f64::EPSILON);
    }

    #[test]
    fn ranking_is_descending_and_stable_on_ties() {
        let input = vec![
            with_impact("Tie A first", 5.0, Effort::Medium, 60),
            with_impact("Best overall", 9.0, Effort::Low, 95),
            with_impact("Tie B second", 5.0, Effort::Medium, 60),
            with_impact("Worst overall", 1.0, Effort::High, 10),
            with_impact("Tie C third", 5.0, Effort::Medium, 60),
        ];

        let actions = |ranked: Vec<Candidate>| -> Vec<String> {
            ranked.into_iter().map(|c| c.action).collect()
        };
        let first = actions(rank(input.clone(), &flat()));
        assert_eq!(
            first,
            ["Best overall", "Tie A first", "Tie B second", "Tie C third", "Worst overall"]
        );

        for _ in 0..5 {
            assert_eq!(actions(rank(input.clone(), &flat())), first);
        }
    }

    #[test]
    fn strategic_roles_are_assigned() {
        let ranked = rank(
            vec![
                with_impact("Quick win on reviews", 6.0, Effort::Low, 50),
                with_impact("Big bet on research", 8.0, Effort::High, 50),
                with_impact("Middle of the road", 6.0, Effort::Medium, 50),
            ],
            &flat(),
        );
        let role = |action: &str| {
            ranked
                .iter()
                .find(|c| c.action == action)
                .and_then(|c| c.strategic_role)
        };
        assert_eq!(role("Quick win on reviews"), Some(StrategicRole::QuickWin));
        assert_eq!(role("Big bet on research"), Some(StrategicRole::StrategicBet));
        assert_eq!(role("Middle of the road"), None);

        let defensive = rank(
            vec![with_impact("Quick win on reviews", 6.0, Effort::Low, 50)],
            &declining_visibility(-12.0),
        );
        assert_eq!(defensive[0].strategic_role, Some(StrategicRole::Defensive));
        assert!(defensive[0].calculated_score.is_some());
    }
}
