//! # Record Extraction
//!
//! Line-level matching predicates. Extractors are stateless and shared
//! read-only across workers behind an `Arc`.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;

use crate::error::EngineError;

/// A single matching line, reduced to what the aggregation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: Option<DateTime<Utc>>,
}

/// Turns one line of text into zero or one record.
///
/// Implementations must be pure: no interior mutability, no I/O. A line that
/// fails to parse is treated the same as a line that does not match.
pub trait RecordExtractor: Send + Sync {
    fn extract(&self, line: &str) -> Option<LogRecord>;
}

/// Matches structured (JSON-per-line) logs on string equality of one field.
///
/// The `timestamp` field, when present and RFC 3339, is carried along for
/// first/last-seen tracking; a matching entry without one still counts.
pub struct JsonFieldMatcher {
    field: String,
    value: String,
}

impl JsonFieldMatcher {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl RecordExtractor for JsonFieldMatcher {
    fn extract(&self, line: &str) -> Option<LogRecord> {
        let entry: Value = serde_json::from_str(line).ok()?;
        match entry.get(&self.field) {
            Some(Value::String(v)) if *v == self.value => {}
            _ => return None,
        }
        let timestamp = entry
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc));
        Some(LogRecord { timestamp })
    }
}

/// Matches plain-text logs against a regular expression.
pub struct PatternMatcher {
    pattern: Regex,
}

impl PatternMatcher {
    pub fn new(pattern: &str) -> Result<Self, EngineError> {
        let pattern = Regex::new(pattern)
            .map_err(|err| EngineError::InvalidConfiguration(format!("bad pattern: {err}")))?;
        Ok(Self { pattern })
    }
}

impl RecordExtractor for PatternMatcher {
    fn extract(&self, line: &str) -> Option<LogRecord> {
        if self.pattern.is_match(line) {
            Some(LogRecord { timestamp: None })
        } else {
            None
        }
    }
}
