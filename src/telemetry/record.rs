//! Telemetry Record - named integer fields of one generation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::BEST_FIELD;
use crate::{Error, Result};

/// Telemetry Record holds the fields decoded from one telemetry line.
///
/// The field set is open-ended. Fields are kept sorted by name so that
/// iteration and serialization are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    fields: BTreeMap<String, i64>,
}

impl TelemetryRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value for the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: i64) {
        self.fields.insert(key.into(), value);
    }

    /// Get a field value by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<i64> {
        self.fields.get(key).copied()
    }

    /// Get the `best` field.
    #[must_use]
    pub fn best(&self) -> Option<i64> {
        self.get(BEST_FIELD)
    }

    /// Get a field that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] tagged with `line_number` if the field
    /// is absent.
    pub fn require(&self, key: &str, line_number: usize) -> Result<i64> {
        self.get(key).ok_or_else(|| Error::MissingField {
            field: key.to_string(),
            line_number,
        })
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, i64)> for TelemetryRecord {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
