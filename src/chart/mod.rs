//! Comparison chart builder
//!
//! Series are accumulated on an explicit builder value and rendered once:
//!
//! ```rust,no_run
//! use runlog_digest::chart::{ChartSettings, ComparisonChart};
//! use runlog_digest::trajectory::Trajectory;
//!
//! let mut chart = ComparisonChart::new(ChartSettings::default());
//! chart.add_series("100000_100_19_20_40_0.5.txt", Trajectory::new(vec![500, 120, 90]));
//! chart.add_series("100000_100_10_20_40_0.5.txt", Trajectory::new(vec![480, 200, 95]));
//! chart.render("plot.png")?;
//! # Ok::<(), runlog_digest::Error>(())
//! ```
//!
//! Building is independent of the rendering backend; only
//! [`ComparisonChart::render`] touches plotters.

mod render;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::trajectory::Trajectory;
use crate::Result;

/// Default upper y-limit; early generations above it are clipped.
pub const DEFAULT_Y_MAX: f64 = 3000.0;

/// Rendering settings for the comparison chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Fixed upper bound of the logarithmic y-axis
    pub y_max: f64,
    /// Optional caption drawn above the plot
    pub caption: Option<String>,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 760,
            y_max: DEFAULT_Y_MAX,
            caption: None,
        }
    }
}

/// One labeled trajectory on the chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    /// Legend entry
    pub label: String,
    /// Values plotted against generation index
    pub trajectory: Trajectory,
}

/// Builder for a multi-run, log-scale convergence chart.
#[derive(Debug, Clone)]
pub struct ComparisonChart {
    settings: ChartSettings,
    series: Vec<Series>,
}

impl ComparisonChart {
    /// Create an empty chart.
    #[must_use]
    pub const fn new(settings: ChartSettings) -> Self {
        Self {
            settings,
            series: Vec::new(),
        }
    }

    /// Register one series. Series keep insertion order.
    pub fn add_series(&mut self, label: impl Into<String>, trajectory: Trajectory) -> &mut Self {
        self.series.push(Series {
            label: label.into(),
            trajectory,
        });
        self
    }

    /// Registered series.
    #[must_use]
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    /// Number of registered series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Check if no series was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Rendering settings.
    #[must_use]
    pub const fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    /// Longest trajectory length, i.e. the extent of the x-axis.
    #[must_use]
    pub fn max_generations(&self) -> usize {
        self.series
            .iter()
            .map(|s| s.trajectory.len())
            .max()
            .unwrap_or(0)
    }

    /// Y-axis range `(low, high)`: low is the smallest positive value in any
    /// series (clamped below `y_max`), high is `y_max`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn y_range(&self) -> (f64, f64) {
        let y_max = self.settings.y_max;
        let min_pos = self
            .series
            .iter()
            .flat_map(|s| s.trajectory.values().iter().copied())
            .filter(|&v| v > 0)
            .min()
            .map_or(1.0, |v| v as f64);

        let low = if min_pos < y_max { min_pos } else { y_max / 10.0 };
        (low, y_max)
    }

    /// Draw every series and write the image to `path`, overwriting it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Render`] if the backend fails, or
    /// [`crate::Error::Io`] if the output directory cannot be created.
    pub fn render(&self, path: impl AsRef<Path>) -> Result<()> {
        render::draw_png(self, path.as_ref())
    }
}
