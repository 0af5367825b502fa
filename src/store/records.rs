//! JSON run records

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::descriptor::RunDescriptor;
use crate::trajectory::Trajectory;
use crate::{Error, Result};

/// Trajectories keyed by the space-separated optimizer argument string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunRecords {
    records: BTreeMap<String, Trajectory>,
}

impl RunRecords {
    /// Create an empty record set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load records from `path`, or start empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the file exists but is not a valid
    /// record set.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(Error::Io(e)),
        };
        serde_json::from_str(&text)
            .map_err(|e| Error::Storage(format!("invalid run records {}: {e}", path.display())))
    }

    /// Insert or replace the trajectory of a run.
    pub fn insert(&mut self, descriptor: &RunDescriptor, trajectory: Trajectory) {
        self.records.insert(descriptor.args_string(), trajectory);
    }

    /// Trajectory recorded for a run.
    #[must_use]
    pub fn get(&self, descriptor: &RunDescriptor) -> Option<&Trajectory> {
        self.records.get(&descriptor.args_string())
    }

    /// Number of runs recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no run is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the record set to `path` as JSON, overwriting it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Json`] on failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        debug!(path = %path.display(), runs = self.len(), "saved run records");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(n_elite: u64) -> RunDescriptor {
        RunDescriptor {
            n_generation: 100_000,
            n_population: 100,
            n_elite,
            n_select: 20,
            n_crossover: 40,
            p_mutation: 0.5,
        }
    }

    #[test]
    fn test_json_shape() {
        let mut records = RunRecords::new();
        records.insert(&descriptor(19), Trajectory::new(vec![500, 120]));
        let json = serde_json::to_string(&records).unwrap();
        assert_eq!(json, r#"{"100000 100 19 20 40 0.5":[500,120]}"#);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let mut records = RunRecords::load_or_default(&path).unwrap();
        assert!(records.is_empty());
        records.insert(&descriptor(10), Trajectory::new(vec![3, 2]));
        records.insert(&descriptor(10), Trajectory::new(vec![3, 1]));
        records.save(&path).unwrap();

        let reloaded = RunRecords::load_or_default(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(&descriptor(10)).unwrap().values(), &[3, 1]);
    }

    #[test]
    fn test_load_invalid_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, "{\"a\": \"not a trajectory\"}").unwrap();
        assert!(matches!(
            RunRecords::load_or_default(&path),
            Err(Error::Storage(_))
        ));
    }
}
