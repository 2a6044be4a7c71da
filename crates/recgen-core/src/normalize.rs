//! Normalization of domains and entity names for set membership checks.

/// Trailing words dropped from entity names before comparison.
const LEGAL_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "corp",
    "corporation",
    "co",
    "company",
    "llc",
    "llp",
    "ltd",
    "limited",
    "plc",
    "gmbh",
    "ag",
    "sa",
    "bv",
    "pty",
];

/// Normalize a domain or URL to its bare lowercase host.
///
/// Strips the scheme, a leading `www.`, credentials, port, path, query and
/// fragment. Returns an empty string for blank input.
#[must_use]
pub fn normalize_domain(raw: &str) -> String {
    let mut s = raw.trim().to_lowercase();

    if let Some(idx) = s.find("://") {
        s = s[idx + 3..].to_string();
    }

    let end = s.find(['/', '?', '#']).unwrap_or(s.len());
    s.truncate(end);

    if let Some(idx) = s.rfind('@') {
        s = s[idx + 1..].to_string();
    }
    if let Some(idx) = s.find(':') {
        s.truncate(idx);
    }

    let s = s.trim_end_matches('.');
    s.strip_prefix("www.").unwrap_or(s).to_string()
}

/// Normalize an entity name: lowercase, punctuation removed, legal suffixes
/// dropped, whitespace collapsed.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    while words.len() > 1 && words.last().is_some_and(|w| LEGAL_SUFFIXES.contains(w)) {
        words.pop();
    }
    words.join(" ")
}

/// Separator variants of a name: spaced, hyphenated and concatenated.
///
/// The input is normalized first; single-word names yield one variant.
#[must_use]
pub fn name_variations(raw: &str) -> Vec<String> {
    let normalized = normalize_name(raw);
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut variants = vec![
        normalized.clone(),
        normalized.replace(' ', "-"),
        normalized.replace(' ', ""),
    ];
    variants.dedup();
    variants
}

/// The registrable label of a domain, e.g. `acme` for `blog.acme.co.uk`.
///
/// Uses a heuristic for two-part public suffixes instead of a suffix list.
#[must_use]
pub fn domain_stem(domain: &str) -> String {
    let normalized = normalize_domain(domain);
    let labels: Vec<&str> = normalized.split('.').filter(|l| !l.is_empty()).collect();
    match labels.len() {
        0 => String::new(),
        1 => labels[0].to_string(),
        n => {
            let second_level = labels[n - 2];
            let two_part_suffix = labels[n - 1].len() == 2
                && matches!(second_level, "co" | "com" | "org" | "net" | "ac" | "gov");
            if two_part_suffix && n >= 3 {
                labels[n - 3].to_string()
            } else {
                second_level.to_string()
            }
        }
    }
}
