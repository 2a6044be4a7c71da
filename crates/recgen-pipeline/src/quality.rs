//! Quality Gate: deterministic structural and content checks.

use std::sync::LazyLock;

use recgen_core::Candidate;
use regex::Regex;

use crate::filter::FilterOutcome;

pub const MIN_ACTION_CHARS: usize = 12;
pub const MIN_LONG_FORM_CHARS: usize = 800;
/// A long-form draft is rejected once this many required sections are missing.
pub const MAX_MISSING_SECTIONS: usize = 2;

/// Section markers expected in long-form drafts, matched case-insensitively
/// against heading lines.
pub const REQUIRED_SECTIONS: [&str; 4] = ["summary", "context", "action plan", "measurement"];

static PLACEHOLDER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\[[A-Za-z][A-Za-z0-9 _/.-]*\]",
        r"\{[A-Za-z_][A-Za-z0-9_]*\}",
        r"(?i)\bTBD\b",
        r"<[A-Za-z][A-Za-z0-9 _-]*>",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityIssue {
    EmptyAction,
    EmptySource,
    ActionTooShort { chars: usize },
    Placeholder { field: &'static str, marker: String },
    LongFormTooShort { chars: usize },
    MissingSections(Vec<&'static str>),
}

impl std::fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityIssue::EmptyAction => f.write_str("action is empty"),
            QualityIssue::EmptySource => f.write_str("citation source is empty"),
            QualityIssue::ActionTooShort { chars } => write!(
                f,
                "action has {chars} characters, minimum is {MIN_ACTION_CHARS}"
            ),
            QualityIssue::Placeholder { field, marker } => {
                write!(f, "{field} contains placeholder '{marker}'")
            }
            QualityIssue::LongFormTooShort { chars } => write!(
                f,
                "long-form content has {chars} characters, minimum is {MIN_LONG_FORM_CHARS}"
            ),
            QualityIssue::MissingSections(missing) => {
                write!(f, "long-form content is missing sections: {}", missing.join(", "))
            }
        }
    }
}

fn find_placeholder(text: &str) -> Option<String> {
    PLACEHOLDER_PATTERNS
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().to_string())
}

fn missing_sections(content: &str) -> Vec<&'static str> {
    let headings: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().to_lowercase())
        .collect();

    REQUIRED_SECTIONS
        .into_iter()
        .filter(|section| !headings.iter().any(|h| h.contains(section)))
        .collect()
}

/// Every quality issue found on `candidate`; empty means it passes.
#[must_use]
pub fn quality_issues(candidate: &Candidate) -> Vec<QualityIssue> {
    let mut issues = Vec::new();

    let action = candidate.action.trim();
    if action.is_empty() {
        issues.push(QualityIssue::EmptyAction);
    } else {
        let chars = action.chars().count();
        if chars < MIN_ACTION_CHARS {
            issues.push(QualityIssue::ActionTooShort { chars });
        }
    }
    if candidate.citation_source.trim().is_empty() {
        issues.push(QualityIssue::EmptySource);
    }

    let texts = std::iter::once(("action", candidate.action.as_str()))
        .chain(candidate.rationale_fields());
    for (field, text) in texts {
        if let Some(marker) = find_placeholder(text) {
            issues.push(QualityIssue::Placeholder { field, marker });
        }
    }

    if let Some(content) = candidate.content.as_deref().filter(|c| !c.trim().is_empty()) {
        let chars = content.trim().chars().count();
        if chars < MIN_LONG_FORM_CHARS {
            issues.push(QualityIssue::LongFormTooShort { chars });
        }
        let missing = missing_sections(content);
        if missing.len() >= MAX_MISSING_SECTIONS {
            issues.push(QualityIssue::MissingSections(missing));
        }
    }

    issues
}

/// Split candidates into passing and removed, preserving order.
#[must_use]
pub fn apply_quality_gate(candidates: Vec<Candidate>) -> FilterOutcome<QualityIssue> {
    FilterOutcome::partition("quality", candidates, quality_issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::candidate;

    fn long_form(sections: &[&str]) -> String {
        let mut out = String::new();
        for s in sections {
            out.push_str(&format!("## {s}\n"));
            out.push_str(&"Grounded detail about the citation source. ".repeat(8));
            out.push('\n');
        }
        out
    }

    #[test]
    fn well_formed_candidate_passes() {
        assert!(quality_issues(&candidate("Publish a buyer's guide on g2", "g2.com")).is_empty());
    }

    #[test]
    fn empty_fields_each_disqualify() {
        let issues = quality_issues(&candidate("", ""));
        assert!(issues.contains(&QualityIssue::EmptyAction));
        assert!(issues.contains(&QualityIssue::EmptySource));
    }

    #[test]
    fn short_action_is_rejected() {
        let issues = quality_issues(&candidate("Do SEO", "g2.com"));
        assert_eq!(issues, vec![QualityIssue::ActionTooShort { chars: 6 }]);
    }

    #[test]
    fn placeholders_are_detected_per_field() {
        let mut c = candidate("Pitch [Brand Name] to editors", "g2.com");
        c.reason = "Timeline TBD".to_string();
        c.explanation = "Mention <competitor> in the intro".to_string();
        c.expected_impact = "Lift for {brand}".to_string();

        let fields: Vec<&str> = quality_issues(&c)
            .into_iter()
            .filter_map(|i| match i {
                QualityIssue::Placeholder { field, .. } => Some(field),
                _ => None,
            })
            .collect();
        assert_eq!(fields, ["action", "reason", "explanation", "expected_impact"]);
    }

    #[test]
    fn bracketed_tokens_in_prose_are_flagged_but_parentheses_are_not() {
        let mut c = candidate("Publish a guide (2026 edition) on g2", "g2.com");
        c.reason = "Scores rose 5% [approx.] last month".to_string();
        assert_eq!(quality_issues(&c).len(), 1);
    }

    #[test]
    fn long_form_needs_length_and_sections() {
        let mut c = candidate("Publish a category explainer", "g2.com");
        c.content = Some(long_form(&["Summary", "Context", "Action Plan", "Measurement"]));
        assert!(quality_issues(&c).is_empty());

        // One missing section is tolerated.
        c.content = Some(long_form(&["Summary", "Context", "Action plan", "Appendix"]));
        assert!(quality_issues(&c).is_empty());

        c.content = Some(long_form(&["Summary", "Context", "Notes", "Appendix"]));
        assert_eq!(
            quality_issues(&c),
            vec![QualityIssue::MissingSections(vec!["action plan", "measurement"])]
        );

        c.content = Some("# Summary\nshort".to_string());
        let issues = quality_issues(&c);
        assert!(matches!(issues[0], QualityIssue::LongFormTooShort { .. }));
        assert!(matches!(issues[1], QualityIssue::MissingSections(_)));
    }

    #[test]
    fn gate_records_all_reasons() {
        let outcome = apply_quality_gate(vec![
            candidate("Publish a buyer's guide on g2", "g2.com"),
            candidate("", ""),
        ]);
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.removed[0].reasons.len(), 2);
    }
}
