//! Pipeline configuration
//!
//! Loaded from a TOML file; every key is optional and falls back to the
//! layout the sweep scripts produce (`output/` for raw logs, `short/` for
//! digests, `plot.png` for the chart).
//!
//! ```toml
//! raw_dir = "output"
//! runs_dir = "short"
//! extension = "txt"
//! chart_output = "plot.png"
//! failure_policy = "skip-and-report"
//!
//! [chart]
//! y_max = 3000.0
//! width = 1280
//! height = 760
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chart::ChartSettings;
use crate::pipeline::FailurePolicy;
use crate::{Error, Result};

/// Settings shared by the digest, comparison and export steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding raw optimizer logs
    pub raw_dir: PathBuf,
    /// Directory holding digested run logs
    pub runs_dir: PathBuf,
    /// Extension of run files, without the dot
    pub extension: String,
    /// Chart image path, overwritten on every comparison
    pub chart_output: PathBuf,
    /// Handling of broken runs
    pub failure_policy: FailurePolicy,
    /// Chart rendering settings
    pub chart: ChartSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("output"),
            runs_dir: PathBuf::from("short"),
            extension: "txt".to_string(),
            chart_output: PathBuf::from("plot.png"),
            failure_policy: FailurePolicy::default(),
            chart: ChartSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputNotFound`] if the file is missing and
    /// [`Error::Config`] if it is not valid TOML or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::from_open(e, path))?;
        let config = Self::from_toml(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded pipeline config");
        Ok(config)
    }

    /// Parse and validate TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on invalid TOML or invalid values.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(Error::Config(format!(
                "extension must be non-empty and given without a dot, got {:?}",
                self.extension
            )));
        }
        if !(self.chart.y_max.is_finite() && self.chart.y_max > 0.0) {
            return Err(Error::Config(format!(
                "chart.y_max must be a positive number, got {}",
                self.chart.y_max
            )));
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(Error::Config("chart dimensions must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Set the digested runs directory.
    #[must_use]
    pub fn runs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.runs_dir = dir.into();
        self
    }

    /// Set the raw log directory.
    #[must_use]
    pub fn raw_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.raw_dir = dir.into();
        self
    }

    /// Set the chart output path.
    #[must_use]
    pub fn chart_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.chart_output = path.into();
        self
    }

    /// Set the broken-run policy.
    #[must_use]
    pub const fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the upper y-limit of the chart.
    #[must_use]
    pub const fn y_max(mut self, y_max: f64) -> Self {
        self.chart.y_max = y_max;
        self
    }
}
