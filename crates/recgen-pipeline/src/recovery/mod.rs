//! Structured Recovery Parser.
//!
//! Generative output is expected to be a JSON array of recommendation
//! records, or an object wrapping one, but often arrives fenced, truncated or
//! with stray punctuation. [`recover_records`] runs a fixed cascade of repair
//! strategies and accepts the first that yields at least one record-shaped
//! object.

mod record;
mod salvage;
mod strategies;

use serde_json::{Map, Value};
use thiserror::Error;

pub use record::{candidate_from_record, recover_candidates, ACTION_KEYS, SOURCE_KEYS};
pub use salvage::salvage_elements;
pub use strategies::{
    balance_brackets, direct_parse, parse_delimited, repair_structure, strip_fences_and_parse,
};

/// A JSON object recovered from generative output.
pub type Record = Map<String, Value>;

/// Keys that may wrap the record array inside an object, in lookup order.
const WRAPPER_KEYS: [&str; 5] = ["recommendations", "items", "results", "data", "candidates"];

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("input is empty")]
    Empty,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no array or object delimiters found")]
    NoDelimiters,

    #[error("parsed JSON holds no record-shaped objects")]
    NoRecords,

    #[error("no element could be salvaged")]
    NothingSalvaged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    Direct,
    StripFences,
    Delimited,
    StructuralRepair,
    BalanceBrackets,
    Salvage,
}

impl RecoveryStrategy {
    /// Cascade order.
    pub const ALL: [RecoveryStrategy; 6] = [
        RecoveryStrategy::Direct,
        RecoveryStrategy::StripFences,
        RecoveryStrategy::Delimited,
        RecoveryStrategy::StructuralRepair,
        RecoveryStrategy::BalanceBrackets,
        RecoveryStrategy::Salvage,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::StripFences => "strip_fences",
            Self::Delimited => "delimited",
            Self::StructuralRepair => "structural_repair",
            Self::BalanceBrackets => "balance_brackets",
            Self::Salvage => "salvage",
        }
    }

    /// Run this strategy alone.
    ///
    /// # Errors
    ///
    /// Returns a [`RecoveryError`] when the strategy yields no records.
    pub fn run(self, text: &str) -> Result<Vec<Record>, RecoveryError> {
        match self {
            Self::Direct => direct_parse(text),
            Self::StripFences => strip_fences_and_parse(text),
            Self::Delimited => parse_delimited(text),
            Self::StructuralRepair => repair_structure(text),
            Self::BalanceBrackets => balance_brackets(text),
            Self::Salvage => salvage_elements(text),
        }
    }
}

impl std::fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub records: Vec<Record>,
    pub strategy: RecoveryStrategy,
}

/// Run the repair cascade. `None` means no strategy recovered a record.
#[must_use]
pub fn recover_records(text: &str) -> Option<Recovered> {
    if text.trim().is_empty() {
        tracing::debug!("recovery input is empty");
        return None;
    }

    for strategy in RecoveryStrategy::ALL {
        match strategy.run(text) {
            Ok(records) => {
                if strategy != RecoveryStrategy::Direct {
                    tracing::info!(
                        strategy = strategy.as_str(),
                        records = records.len(),
                        "recovered records after repair"
                    );
                }
                return Some(Recovered { records, strategy });
            }
            Err(e) => {
                tracing::debug!(
                    strategy = strategy.as_str(),
                    error = %e,
                    "recovery strategy failed"
                );
            }
        }
    }

    tracing::warn!(chars = text.len(), "no recoverable candidates in backend output");
    None
}

/// `true` when `record` carries both an action-like and a source-like string field.
#[must_use]
pub fn is_record_shaped(record: &Record) -> bool {
    let has_string = |keys: &[&str]| {
        keys.iter()
            .any(|k| record.get(*k).is_some_and(Value::is_string))
    };
    has_string(&ACTION_KEYS) && has_string(&SOURCE_KEYS)
}

/// Extract record-shaped objects from a parsed value: an array of records,
/// an object wrapping such an array, or a single record.
///
/// Non-record elements of an array are dropped.
///
/// # Errors
///
/// Returns [`RecoveryError::NoRecords`] when nothing record-shaped is found.
pub fn records_from_value(value: Value) -> Result<Vec<Record>, RecoveryError> {
    let records: Vec<Record> = match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(obj) if is_record_shaped(&obj) => Some(obj),
                _ => None,
            })
            .collect(),
        Value::Object(obj) if is_record_shaped(&obj) => vec![obj],
        Value::Object(mut obj) => {
            let key = WRAPPER_KEYS
                .iter()
                .find(|k| obj.get(**k).is_some_and(Value::is_array))
                .map(|k| (*k).to_string())
                .or_else(|| {
                    obj.iter()
                        .find(|(_, v)| v.is_array())
                        .map(|(k, _)| k.clone())
                });
            match key.and_then(|k| obj.remove(&k)) {
                Some(inner @ Value::Array(_)) => return records_from_value(inner),
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    };

    if records.is_empty() {
        Err(RecoveryError::NoRecords)
    } else {
        Ok(records)
    }
}

pub(crate) fn parse_records(text: &str) -> Result<Vec<Record>, RecoveryError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(RecoveryError::Empty);
    }
    let value: Value = serde_json::from_str(text)?;
    records_from_value(value)
}
