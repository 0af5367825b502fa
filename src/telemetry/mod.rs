//! Telemetry line format and record parser
//!
//! The optimizer annotates one line per generation with a marker character
//! followed by `|`-separated `key=value` integer fields:
//!
//! ```text
//! @best=137|gen=42
//! ```
//!
//! Everything else on stdout is noise.
//!
//! ## Usage
//!
//! ```rust
//! use runlog_digest::telemetry::{is_telemetry, parse_record};
//!
//! let line = "@best=137|gen=42";
//! assert!(is_telemetry(line));
//!
//! let record = parse_record(line)?;
//! assert_eq!(record.best(), Some(137));
//! assert_eq!(record.get("gen"), Some(42));
//! # Ok::<(), runlog_digest::Error>(())
//! ```

mod record;

pub use record::TelemetryRecord;

use crate::{Error, Result};

/// Leading character of every telemetry line
pub const MARKER: char = '@';

/// Separator between `key=value` segments
pub const FIELD_SEPARATOR: char = '|';

/// Separator between a key and its value
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Field holding the best objective value of a generation
pub const BEST_FIELD: &str = "best";

/// Returns true if `line` is a telemetry line.
#[must_use]
pub fn is_telemetry(line: &str) -> bool {
    line.starts_with(MARKER)
}

/// Byte-level variant of [`is_telemetry`] for undecoded input.
#[must_use]
pub fn is_telemetry_bytes(line: &[u8]) -> bool {
    line.first() == Some(&(MARKER as u8))
}

/// Parse one telemetry line into a [`TelemetryRecord`].
///
/// The trailing line terminator, if any, is ignored. Keys are trimmed;
/// values are trimmed and parsed as base-10 integers.
///
/// # Errors
///
/// Returns [`Error::Parse`] if:
/// - the line does not start with [`MARKER`]
/// - a segment has no `=`
/// - a value is not a valid integer
pub fn parse_record(line: &str) -> Result<TelemetryRecord> {
    let body = line
        .strip_prefix(MARKER)
        .ok_or_else(|| Error::parse(line, format!("line does not start with '{MARKER}'")))?;
    let body = body.trim_end_matches(['\r', '\n']);

    let mut record = TelemetryRecord::new();
    for segment in body.split(FIELD_SEPARATOR) {
        let (key, value) = segment
            .split_once(KEY_VALUE_SEPARATOR)
            .ok_or_else(|| Error::parse(line, format!("segment {segment:?} has no '='")))?;

        let value = value.trim().parse::<i64>().map_err(|e| {
            Error::parse(line, format!("value {value:?} for key {:?}: {e}", key.trim()))
        })?;

        record.insert(key.trim(), value);
    }

    Ok(record)
}
