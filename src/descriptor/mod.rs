//! Run descriptors - hyperparameters encoded in a run's filename
//!
//! A run file is named after the arguments the optimizer was launched with:
//!
//! ```text
//! 100000_100_19_20_40_0.5.txt
//! │      │   │  │  │  └─ p_mutation
//! │      │   │  │  └──── n_crossover
//! │      │   │  └─────── n_select
//! │      │   └────────── n_elite
//! │      └────────────── n_population
//! └───────────────────── n_generation
//! ```
//!
//! The filename is the only metadata channel, so decoding validates arity
//! and per-field types up front and hands out a typed [`RunDescriptor`].
//!
//! ```rust
//! use runlog_digest::descriptor::RunDescriptor;
//!
//! let descriptor = RunDescriptor::decode("short/100000_100_19_20_40_0.5.txt")?;
//! assert_eq!(descriptor.n_elite, 19);
//! assert_eq!(descriptor.label(), "100000_100_19_20_40_0.5");
//! # Ok::<(), runlog_digest::Error>(())
//! ```

mod schema;

pub use schema::{FieldKind, FieldSpec, GENETIC_SCHEMA};

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Separator between tokens of a run filename
pub const TOKEN_SEPARATOR: char = '_';

/// Hyperparameters of one genetic-algorithm run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunDescriptor {
    /// Number of generations
    pub n_generation: u64,
    /// Population size
    pub n_population: u64,
    /// Individuals carried over unchanged each generation
    pub n_elite: u64,
    /// Individuals selected as parents
    pub n_select: u64,
    /// Crossover operations per generation
    pub n_crossover: u64,
    /// Mutation probability
    pub p_mutation: f64,
}

impl RunDescriptor {
    /// Decode a descriptor from a run filename.
    ///
    /// Any directory prefix and the final extension are stripped before the
    /// stem is split on `_`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] if the token count differs from
    /// [`GENETIC_SCHEMA`] or a token does not parse as its field's kind.
    pub fn decode(file_name: impl AsRef<Path>) -> Result<Self> {
        let path = file_name.as_ref();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                Error::SchemaMismatch(format!("no usable file stem in {}", path.display()))
            })?;

        Self::from_label(stem)
    }

    /// Decode a descriptor from an extension-less label such as
    /// `100000_100_19_20_40_0.5`.
    ///
    /// # Errors
    ///
    /// Same as [`RunDescriptor::decode`].
    pub fn from_label(label: &str) -> Result<Self> {
        let tokens: Vec<&str> = label.split(TOKEN_SEPARATOR).collect();
        if tokens.len() != GENETIC_SCHEMA.len() {
            return Err(Error::SchemaMismatch(format!(
                "expected {} tokens ({}), found {} in {label:?}",
                GENETIC_SCHEMA.len(),
                schema::field_names().join(", "),
                tokens.len()
            )));
        }

        Ok(Self {
            n_generation: GENETIC_SCHEMA[0].parse_count(tokens[0])?,
            n_population: GENETIC_SCHEMA[1].parse_count(tokens[1])?,
            n_elite: GENETIC_SCHEMA[2].parse_count(tokens[2])?,
            n_select: GENETIC_SCHEMA[3].parse_count(tokens[3])?,
            n_crossover: GENETIC_SCHEMA[4].parse_count(tokens[4])?,
            p_mutation: GENETIC_SCHEMA[5].parse_probability(tokens[5])?,
        })
    }

    /// Check that the descriptor's label decodes back, so that logs named
    /// after it can be read later.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] for an out-of-range probability.
    pub fn validate(&self) -> Result<()> {
        Self::from_label(&self.label()).map(|_| ())
    }

    /// Set `n_crossover` to `(n_population - n_select) / 2`, the default the
    /// sweep scripts use.
    #[must_use]
    pub const fn with_default_crossover(mut self) -> Self {
        self.n_crossover = self.n_population.saturating_sub(self.n_select) / 2;
        self
    }

    /// Field values as strings, in schema order.
    #[must_use]
    pub fn tokens(&self) -> [String; 6] {
        [
            self.n_generation.to_string(),
            self.n_population.to_string(),
            self.n_elite.to_string(),
            self.n_select.to_string(),
            self.n_crossover.to_string(),
            self.p_mutation.to_string(),
        ]
    }

    /// Encode back to the `_`-joined filename stem.
    #[must_use]
    pub fn label(&self) -> String {
        self.tokens().join("_")
    }

    /// Filename for a run log with the given extension.
    #[must_use]
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{extension}", self.label())
    }

    /// Positional command-line arguments for the optimizer.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        self.tokens().into()
    }

    /// Space-separated argument string, as used for run record keys.
    #[must_use]
    pub fn args_string(&self) -> String {
        self.tokens().join(" ")
    }
}

impl fmt::Display for RunDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl std::str::FromStr for RunDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_label(s)
    }
}
