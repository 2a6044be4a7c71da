//! Safety Filter: keeps competitor entities out of recommendation targets.

use std::collections::HashSet;

use recgen_core::{normalize_domain, Candidate};

use crate::exclusion::{ExclusionList, ExclusionMatch};
use crate::filter::FilterOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyViolation {
    /// The citation source is a competitor domain or name.
    ExcludedSource(ExclusionMatch),
    /// The citation source is not one of the snapshot's sources.
    UnknownSource(String),
    /// A free-text field names a competitor while mentions are disallowed.
    CompetitorMention {
        field: &'static str,
        matched: ExclusionMatch,
    },
}

impl std::fmt::Display for SafetyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafetyViolation::ExcludedSource(m) => write!(f, "citation source is a {m}"),
            SafetyViolation::UnknownSource(s) => {
                write!(f, "citation source '{s}' is not a tracked source")
            }
            SafetyViolation::CompetitorMention { field, matched } => {
                write!(f, "{field} mentions {matched}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SafetyFilter {
    exclusions: ExclusionList,
    known_sources: Option<HashSet<String>>,
    allow_competitor_mentions: bool,
}

impl SafetyFilter {
    #[must_use]
    pub fn new(exclusions: ExclusionList, allow_competitor_mentions: bool) -> Self {
        Self {
            exclusions,
            known_sources: None,
            allow_competitor_mentions,
        }
    }

    /// Restrict citation sources to `domains` (compared normalized).
    #[must_use]
    pub fn with_known_sources<'a, I>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.known_sources = Some(
            domains
                .into_iter()
                .map(normalize_domain)
                .filter(|d| !d.is_empty())
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn exclusions(&self) -> &ExclusionList {
        &self.exclusions
    }

    /// Every rule the candidate breaks; empty means safe.
    #[must_use]
    pub fn violations(&self, candidate: &Candidate) -> Vec<SafetyViolation> {
        let mut violations = Vec::new();

        if let Some(matched) = self.exclusions.match_source(&candidate.citation_source) {
            violations.push(SafetyViolation::ExcludedSource(matched));
        } else if let Some(known) = &self.known_sources {
            if !known.contains(&normalize_domain(&candidate.citation_source)) {
                violations.push(SafetyViolation::UnknownSource(
                    candidate.citation_source.clone(),
                ));
            }
        }

        if !self.allow_competitor_mentions {
            let texts = std::iter::once(("action", candidate.action.as_str()))
                .chain(candidate.rationale_fields());
            for (field, text) in texts {
                if let Some(matched) = self.exclusions.match_text(text) {
                    violations.push(SafetyViolation::CompetitorMention { field, matched });
                }
            }
        }

        violations
    }

    /// Split candidates into safe and removed, preserving order.
    #[must_use]
    pub fn apply(&self, candidates: Vec<Candidate>) -> FilterOutcome<SafetyViolation> {
        FilterOutcome::partition("safety", candidates, |c| self.violations(c))
    }
}
