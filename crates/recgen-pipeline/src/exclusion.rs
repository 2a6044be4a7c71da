//! Competitor exclusion list with a whitelist for the subject itself.
//!
//! Every check normalizes its input first, consults the subject whitelist,
//! and only then looks at competitor domains and names.

use std::collections::BTreeSet;

use recgen_core::{domain_stem, name_variations, normalize_domain, normalize_name};

/// Shortest name or stem that takes part in substring matching.
const MIN_FUZZY_LEN: usize = 3;

/// Why a value matched the exclusion list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionMatch {
    Domain(String),
    Name(String),
}

impl std::fmt::Display for ExclusionMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionMatch::Domain(d) => write!(f, "competitor domain {d}"),
            ExclusionMatch::Name(n) => write!(f, "competitor name {n}"),
        }
    }
}

/// Normalized competitor identifiers for one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    pub names: BTreeSet<String>,
    pub domains: BTreeSet<String>,
    pub name_variations: BTreeSet<String>,
    pub whitelist_domains: BTreeSet<String>,
    pub whitelist_names: BTreeSet<String>,
}

fn compact(s: &str) -> String {
    s.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Build the exclusion list from `(name, domain)` competitor pairs.
///
/// The subject's own normalized domain and name variants form the whitelist;
/// competitor entries equal to a whitelist entry are not registered at all.
pub fn build_exclusion_list<'a, I>(
    competitors: I,
    subject_name: &str,
    subject_domain: Option<&str>,
) -> ExclusionList
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut list = ExclusionList::default();

    if let Some(domain) = subject_domain.map(normalize_domain).filter(|d| !d.is_empty()) {
        let stem = domain_stem(&domain);
        list.whitelist_domains.insert(domain);
        if !stem.is_empty() {
            list.whitelist_names.insert(compact(&stem));
        }
    }
    for variant in name_variations(subject_name) {
        list.whitelist_names.insert(compact(&variant));
    }

    for (name, domain) in competitors {
        if let Some(domain) = domain.map(normalize_domain).filter(|d| !d.is_empty()) {
            if !list.whitelist_domains.contains(&domain) {
                list.domains.insert(domain);
            }
        }

        let normalized = normalize_name(name);
        if normalized.is_empty() || list.whitelist_names.contains(&compact(&normalized)) {
            continue;
        }
        for variant in name_variations(name) {
            list.name_variations.insert(variant);
        }
        list.names.insert(normalized);
    }

    list
}

impl ExclusionList {
    fn is_whitelisted(&self, domain: &str, stem_compact: &str) -> bool {
        self.whitelist_domains
            .iter()
            .any(|w| domain == w || domain.ends_with(&format!(".{w}")))
            || self.whitelist_names.contains(stem_compact)
    }

    /// Compact forms of all names and variations eligible for fuzzy matching.
    fn fuzzy_names(&self) -> impl Iterator<Item = (String, &String)> {
        self.names
            .iter()
            .chain(self.name_variations.iter())
            .map(|n| (compact(n), n))
            .filter(|(c, _)| c.chars().count() >= MIN_FUZZY_LEN)
    }

    /// Match a citation source (domain or URL) against the list.
    ///
    /// Returns `None` for whitelisted values even if they also match a
    /// competitor entry.
    #[must_use]
    pub fn match_source(&self, source: &str) -> Option<ExclusionMatch> {
        let domain = normalize_domain(source);
        if domain.is_empty() {
            return None;
        }
        let stem = compact(&domain_stem(&domain));

        if self.is_whitelisted(&domain, &stem) {
            return None;
        }

        if let Some(hit) = self
            .domains
            .iter()
            .find(|d| domain == **d || domain.ends_with(&format!(".{d}")))
        {
            return Some(ExclusionMatch::Domain(hit.clone()));
        }

        let stem_fuzzy = stem.chars().count() >= MIN_FUZZY_LEN;
        self.fuzzy_names()
            .find(|(name, _)| stem.contains(name.as_str()) || (stem_fuzzy && name.contains(&stem)))
            .map(|(_, original)| ExclusionMatch::Name(original.clone()))
    }

    /// Find a competitor named as a whole word (or word run) inside free text.
    #[must_use]
    pub fn match_text(&self, text: &str) -> Option<ExclusionMatch> {
        let normalized = format!(" {} ", normalize_name_text(text));
        self.names
            .iter()
            .chain(self.name_variations.iter())
            .filter(|n| !self.whitelist_names.contains(&compact(n)))
            .map(|n| (n.replace('-', " "), n))
            .find(|(words, _)| {
                words.chars().count() >= MIN_FUZZY_LEN && normalized.contains(&format!(" {words} "))
            })
            .map(|(_, original)| ExclusionMatch::Name(original.clone()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.domains.is_empty()
    }
}

/// Lowercase text with punctuation turned into single spaces. Unlike
/// [`normalize_name`], legal suffixes are kept.
fn normalize_name_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
