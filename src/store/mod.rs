//! Persistence of aggregated runs
//!
//! Two formats:
//! - **Run records** (JSON): one object keyed by the optimizer argument
//!   string, mapping to the run's trajectory. Handy for quick diffs.
//! - **Trajectory table** (Parquet): long-format columnar export of a whole
//!   comparison, one row per `(run, generation)`.

mod records;
mod table;

pub use records::RunRecords;
pub use table::{read_parquet, trajectories_to_batch, trajectory_schema, write_parquet};
