//! Positional hyperparameter schema of run filenames

use crate::{Error, Result};

/// Expected type of one filename token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-negative integer count
    Count,
    /// Finite floating-point probability in `[0, 1]`
    Probability,
}

/// One positional field of the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name, matching the optimizer's argument name
    pub name: &'static str,
    /// Expected token type
    pub kind: FieldKind,
}

/// Filename schema of genetic-algorithm runs, in optimizer argument order.
pub const GENETIC_SCHEMA: [FieldSpec; 6] = [
    FieldSpec {
        name: "n_generation",
        kind: FieldKind::Count,
    },
    FieldSpec {
        name: "n_population",
        kind: FieldKind::Count,
    },
    FieldSpec {
        name: "n_elite",
        kind: FieldKind::Count,
    },
    FieldSpec {
        name: "n_select",
        kind: FieldKind::Count,
    },
    FieldSpec {
        name: "n_crossover",
        kind: FieldKind::Count,
    },
    FieldSpec {
        name: "p_mutation",
        kind: FieldKind::Probability,
    },
];

pub(super) fn field_names() -> Vec<&'static str> {
    GENETIC_SCHEMA.iter().map(|f| f.name).collect()
}

impl FieldSpec {
    pub(super) fn parse_count(&self, token: &str) -> Result<u64> {
        debug_assert_eq!(self.kind, FieldKind::Count);
        token
            .parse::<u64>()
            .map_err(|e| self.mismatch(token, &e.to_string()))
    }

    pub(super) fn parse_probability(&self, token: &str) -> Result<f64> {
        debug_assert_eq!(self.kind, FieldKind::Probability);
        let value = token
            .parse::<f64>()
            .map_err(|e| self.mismatch(token, &e.to_string()))?;
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(self.mismatch(token, "not a probability in [0, 1]"));
        }
        Ok(value)
    }

    fn mismatch(&self, token: &str, reason: &str) -> Error {
        Error::SchemaMismatch(format!(
            "field {} expects {:?}, got {token:?}: {reason}",
            self.name, self.kind
        ))
    }
}
