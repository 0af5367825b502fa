//! Trajectory aggregation - best objective value per generation
//!
//! A run's data is all-or-nothing: one malformed line or one line without a
//! `best` field fails the whole run. A filtered log with no telemetry lines
//! yields an empty trajectory.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::digest::retain_telemetry_lines;
use crate::telemetry::{parse_record, BEST_FIELD};
use crate::{Error, Result};

/// Ordered sequence of `best` values, one per telemetry line.
///
/// The index of a value is its 0-based generation index. Values are kept in
/// log order; monotonicity is not enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trajectory {
    bests: Vec<i64>,
}

/// Headline numbers of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySummary {
    /// Number of generations recorded
    pub generations: usize,
    /// First recorded best
    pub first: i64,
    /// Last recorded best
    pub last: i64,
    /// Lowest best seen anywhere in the run
    pub min: i64,
    /// `last / first`, or `None` when `first` is zero
    pub improvement_ratio: Option<f64>,
}

impl Trajectory {
    /// Create a trajectory from raw values.
    #[must_use]
    pub fn new(bests: Vec<i64>) -> Self {
        Self { bests }
    }

    /// Aggregate the `best` field of every line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for a malformed line or
    /// [`Error::MissingField`] for a line without `best`.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut bests = Vec::new();
        for (index, line) in lines.into_iter().enumerate() {
            let record = parse_record(line.as_ref())?;
            bests.push(record.require(BEST_FIELD, index + 1)?);
        }
        Ok(Self { bests })
    }

    /// Read a filtered log and aggregate its `best` values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputNotFound`] if `path` does not exist, plus the
    /// errors of [`Trajectory::from_reader`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::from_open(e, path))?;
        let trajectory = Self::from_reader(BufReader::new(file))?;

        debug!(path = %path.display(), generations = trajectory.len(), "loaded trajectory");
        Ok(trajectory)
    }

    /// Aggregate a filtered log read line by line from `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for a line that is not valid UTF-8, plus the
    /// errors of [`Trajectory::from_lines`].
    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = std::str::from_utf8(&buf)
                .map_err(|e| Error::parse(&String::from_utf8_lossy(&buf), e.to_string()))?;
            lines.push(line.to_string());
        }
        Self::from_lines(lines)
    }

    /// Filter a raw (undigested) log in memory, then aggregate it.
    ///
    /// # Errors
    ///
    /// Same as [`Trajectory::load`].
    pub fn from_raw_log(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path).map_err(|e| Error::from_open(e, path))?;

        let mut retained = Vec::with_capacity(raw.len());
        retain_telemetry_lines(raw.as_slice(), &mut retained)?;
        Self::from_reader(retained.as_slice())
    }

    /// Best values in generation order.
    #[must_use]
    pub fn values(&self) -> &[i64] {
        &self.bests
    }

    /// Number of generations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bests.len()
    }

    /// Check if no generation was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bests.is_empty()
    }

    /// `(generation, best)` pairs for plotting.
    #[allow(clippy::cast_precision_loss)]
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bests
            .iter()
            .enumerate()
            .map(|(generation, &best)| (generation as f64, best as f64))
    }

    /// True if no generation is worse than the one before it.
    #[must_use]
    pub fn is_non_increasing(&self) -> bool {
        self.bests.windows(2).all(|w| w[1] <= w[0])
    }

    /// Headline numbers, or `None` for an empty trajectory.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self) -> Option<TrajectorySummary> {
        let first = *self.bests.first()?;
        let last = *self.bests.last()?;
        let min = self.bests.iter().copied().min()?;
        Some(TrajectorySummary {
            generations: self.bests.len(),
            first,
            last,
            min,
            improvement_ratio: (first != 0).then(|| last as f64 / first as f64),
        })
    }
}

impl From<Vec<i64>> for Trajectory {
    fn from(bests: Vec<i64>) -> Self {
        Self::new(bests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lines_preserves_order() {
        let t = Trajectory::from_lines(["@best=500|gen=0", "@best=120|gen=1", "@gen=2|best=130"])
            .unwrap();
        assert_eq!(t.values(), &[500, 120, 130]);
        assert!(!t.is_non_increasing());
    }

    #[test]
    fn test_missing_best_fails_whole_run() {
        let err = Trajectory::from_lines(["@best=500|gen=0", "@gen=1"]).unwrap_err();
        match err {
            Error::MissingField { field, line_number } => {
                assert_eq!(field, "best");
                assert_eq!(line_number, 2);
            }
            other => panic!("expected missing field, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_is_empty_trajectory() {
        let t = Trajectory::from_lines(Vec::<String>::new()).unwrap();
        assert!(t.is_empty());
        assert!(t.summary().is_none());
    }

    #[test]
    fn test_blank_line_is_parse_error() {
        let err = Trajectory::from_lines(["@best=1", ""]).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_points_use_generation_index() {
        let t = Trajectory::new(vec![30, 20, 10]);
        let points: Vec<_> = t.points().collect();
        assert_eq!(points, vec![(0.0, 30.0), (1.0, 20.0), (2.0, 10.0)]);
    }

    #[test]
    fn test_summary() {
        let s = Trajectory::new(vec![500, 90, 120]).summary().unwrap();
        assert_eq!(s.generations, 3);
        assert_eq!(s.first, 500);
        assert_eq!(s.last, 120);
        assert_eq!(s.min, 90);
        assert!((s.improvement_ratio.unwrap() - 0.24).abs() < 1e-12);

        let zero = Trajectory::new(vec![0, 0]).summary().unwrap();
        assert!(zero.improvement_ratio.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Trajectory::load(dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, Error::InputNotFound { .. }));
    }

    #[test]
    fn test_load_and_raw_agree() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw.txt");
        let short = dir.path().join("short.txt");
        fs::write(&raw, "noise line\n@best=500|gen=0\nnoise\n@best=120|gen=1\n# time=3\n")
            .unwrap();
        crate::digest::digest_file(&raw, &short).unwrap();

        let from_digest = Trajectory::load(&short).unwrap();
        let from_raw = Trajectory::from_raw_log(&raw).unwrap();
        assert_eq!(from_digest.values(), &[500, 120]);
        assert_eq!(from_digest, from_raw);
    }

    #[test]
    fn test_load_crlf_digest() {
        let dir = tempfile::tempdir().unwrap();
        let short = dir.path().join("short.txt");
        fs::write(&short, "@best=7|gen=0\r\n@best=5|gen=1\r\n").unwrap();
        assert_eq!(Trajectory::load(&short).unwrap().values(), &[7, 5]);
    }

    #[test]
    fn test_non_utf8_line_is_parse_error_from_both_entry_points() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw.txt");
        let short = dir.path().join("short.txt");
        fs::write(&raw, b"noise\n@best=5|gen=\xff\n").unwrap();
        fs::write(&short, b"@best=5|gen=\xff\n").unwrap();

        let err = Trajectory::load(&short).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "{err:?}");
        let err = Trajectory::from_raw_log(&raw).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "{err:?}");
    }
}
