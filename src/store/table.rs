//! Columnar trajectory export (Arrow/Parquet)
//!
//! Long format, one row per generation of every run:
//!
//! | run (Utf8) | generation (UInt64) | best (Int64) |
//! |------------|---------------------|--------------|
//! | `100000_100_19_20_40_0.5` | 0 | 500 |

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, Int64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use tracing::info;

use crate::pipeline::RunData;
use crate::trajectory::Trajectory;
use crate::{Error, Result};

/// Arrow schema of the trajectory table.
#[must_use]
pub fn trajectory_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("run", DataType::Utf8, false),
        Field::new("generation", DataType::UInt64, false),
        Field::new("best", DataType::Int64, false),
    ]))
}

/// Flatten runs into one record batch, runs in the given order.
///
/// # Errors
///
/// Returns [`Error::Arrow`] if the batch cannot be assembled.
pub fn trajectories_to_batch(runs: &[RunData]) -> Result<RecordBatch> {
    let rows: usize = runs.iter().map(|r| r.trajectory.len()).sum();
    let mut labels = Vec::with_capacity(rows);
    let mut generations = Vec::with_capacity(rows);
    let mut bests = Vec::with_capacity(rows);

    for run in runs {
        let label = run.descriptor.label();
        for (generation, &best) in (0u64..).zip(run.trajectory.values()) {
            labels.push(label.clone());
            generations.push(generation);
            bests.push(best);
        }
    }

    Ok(RecordBatch::try_new(
        trajectory_schema(),
        vec![
            Arc::new(StringArray::from(labels)),
            Arc::new(UInt64Array::from(generations)),
            Arc::new(Int64Array::from(bests)),
        ],
    )?)
}

/// Write runs to a Parquet file, overwriting it.
///
/// # Errors
///
/// Returns [`Error::Storage`] on Parquet failure.
pub fn write_parquet(runs: &[RunData], path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let batch = trajectories_to_batch(runs)?;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .map_err(|e| Error::Storage(format!("Failed to create Parquet writer: {e}")))?;
    writer
        .write(&batch)
        .map_err(|e| Error::Storage(format!("Failed to write record batch: {e}")))?;
    writer
        .close()
        .map_err(|e| Error::Storage(format!("Failed to finish Parquet file: {e}")))?;

    info!(
        path = %path.display(),
        rows = batch.num_rows(),
        runs = runs.len(),
        "exported trajectories"
    );
    Ok(batch.num_rows())
}

/// Read a trajectory table back as `(run label, trajectory)` pairs, in
/// first-appearance order.
///
/// Rows of one run must be contiguous and in generation order, as
/// [`write_parquet`] produces them.
///
/// # Errors
///
/// Returns [`Error::InputNotFound`] for a missing file and
/// [`Error::Storage`] for an unreadable or mis-shaped table.
pub fn read_parquet(path: impl AsRef<Path>) -> Result<Vec<(String, Trajectory)>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::from_open(e, path))?;

    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::Storage(format!("Failed to parse Parquet file: {e}")))?
        .build()
        .map_err(|e| Error::Storage(format!("Failed to create Parquet reader: {e}")))?;

    let mut runs: Vec<(String, Vec<i64>)> = Vec::new();
    for batch in reader {
        let batch =
            batch.map_err(|e| Error::Storage(format!("Failed to read record batch: {e}")))?;
        let labels = column::<StringArray>(&batch, "run")?;
        let bests = column::<Int64Array>(&batch, "best")?;

        for row in 0..batch.num_rows() {
            let label = labels.value(row);
            let best = bests.value(row);
            let continues_run = runs.last().is_some_and(|(current, _)| current == label);
            if !continues_run {
                runs.push((label.to_string(), Vec::new()));
            }
            if let Some((_, values)) = runs.last_mut() {
                values.push(best);
            }
        }
    }

    Ok(runs
        .into_iter()
        .map(|(label, values)| (label, Trajectory::new(values)))
        .collect())
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| Error::Storage(format!("missing or mistyped column '{name}'")))
}
