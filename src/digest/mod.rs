//! Log filter / digest
//!
//! Compacts a raw optimizer log down to its telemetry lines. Noise lines are
//! dropped without a trace; this is the intended behavior, not an error.
//!
//! Retained lines are copied byte-for-byte, line terminators included, so a
//! digest is always a subsequence of its source.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::telemetry::is_telemetry_bytes;
use crate::{Error, Result};

/// Line counts from one digest pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestStats {
    /// Lines read from the source
    pub lines_read: usize,
    /// Telemetry lines written to the destination
    pub lines_retained: usize,
}

impl DigestStats {
    /// Lines that were dropped as noise.
    #[must_use]
    pub const fn lines_dropped(&self) -> usize {
        self.lines_read - self.lines_retained
    }
}

/// One file produced by [`digest_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestedRun {
    /// Raw log that was read
    pub source: PathBuf,
    /// Digest that was written
    pub destination: PathBuf,
    /// Line counts
    pub stats: DigestStats,
}

/// Copy only the telemetry lines of `reader` to `writer`, in order.
///
/// # Errors
///
/// Returns [`Error::Io`] if reading or writing fails.
pub fn retain_telemetry_lines<R: BufRead, W: Write>(
    mut reader: R,
    mut writer: W,
) -> Result<DigestStats> {
    let mut stats = DigestStats::default();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        stats.lines_read += 1;
        if is_telemetry_bytes(&line) {
            writer.write_all(&line)?;
            stats.lines_retained += 1;
        }
    }

    writer.flush()?;
    Ok(stats)
}

/// Digest `source` into `destination`, creating or overwriting it.
///
/// The destination's parent directory is created if needed.
///
/// # Errors
///
/// Returns [`Error::InputNotFound`] if `source` does not exist,
/// [`Error::SameFile`] if `destination` resolves to `source`, or
/// [`Error::Io`] on any other IO failure.
pub fn digest_file(source: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<DigestStats> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    let input = File::open(source).map_err(|e| Error::from_open(e, source))?;
    // Creating the destination would truncate the source before it is read
    if is_same_file(source, destination) {
        return Err(Error::SameFile {
            path: source.to_path_buf(),
        });
    }
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let output = File::create(destination)?;

    let stats = retain_telemetry_lines(BufReader::new(input), BufWriter::new(output))?;
    debug!(
        source = %source.display(),
        destination = %destination.display(),
        read = stats.lines_read,
        retained = stats.lines_retained,
        "digested run log"
    );
    Ok(stats)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// List the regular files in `dir` with the given extension, sorted by path.
///
/// # Errors
///
/// Returns [`Error::InputNotFound`] if `dir` does not exist.
pub fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::from_open(e, dir))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Digest every `*.<extension>` file of `input_dir` into `output_dir`,
/// keeping file names.
///
/// # Errors
///
/// Returns the first error encountered; files already written stay on disk.
/// Digesting a directory into itself fails with [`Error::SameFile`] before
/// anything is written.
pub fn digest_dir(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    extension: &str,
) -> Result<Vec<DigestedRun>> {
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref();

    let mut digested = Vec::new();
    for source in files_with_extension(input_dir, extension)? {
        let Some(name) = source.file_name() else {
            continue;
        };
        let destination = output_dir.join(name);
        let stats = digest_file(&source, &destination)?;
        digested.push(DigestedRun {
            source,
            destination,
            stats,
        });
    }

    info!(
        input = %input_dir.display(),
        output = %output_dir.display(),
        files = digested.len(),
        "digest complete"
    );
    Ok(digested)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retain(input: &str) -> (String, DigestStats) {
        let mut out = Vec::new();
        let stats = retain_telemetry_lines(input.as_bytes(), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[test]
    fn test_retain_drops_noise() {
        let (out, stats) = retain("noise line\n@best=500|gen=0\nnoise\n@best=120|gen=1\n");
        assert_eq!(out, "@best=500|gen=0\n@best=120|gen=1\n");
        assert_eq!(stats.lines_read, 4);
        assert_eq!(stats.lines_retained, 2);
        assert_eq!(stats.lines_dropped(), 2);
    }

    #[test]
    fn test_retain_is_byte_exact() {
        let (out, _) = retain("@best=1 |gen=0\r\nx\n@best=2|gen=1");
        assert_eq!(out, "@best=1 |gen=0\r\n@best=2|gen=1");
    }

    #[test]
    fn test_retain_empty_input() {
        let (out, stats) = retain("");
        assert!(out.is_empty());
        assert_eq!(stats, DigestStats::default());
    }

    #[test]
    fn test_retain_keeps_malformed_telemetry() {
        // Filtering only looks at the marker; parsing happens later
        let (out, _) = retain("@best=abc\n");
        assert_eq!(out, "@best=abc\n");
    }

    #[test]
    fn test_retain_non_utf8_noise() {
        let input: &[u8] = b"\xff\xfe garbage\n@best=3\n";
        let mut out = Vec::new();
        let stats = retain_telemetry_lines(input, &mut out).unwrap();
        assert_eq!(out, b"@best=3\n");
        assert_eq!(stats.lines_retained, 1);
    }

    #[test]
    fn test_digest_file_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = digest_file(dir.path().join("absent.txt"), dir.path().join("out.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::InputNotFound { .. }));
        assert!(!dir.path().join("out.txt").exists());
    }

    #[test]
    fn test_digest_file_overwrites_destination() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("run.txt");
        let destination = dir.path().join("short").join("run.txt");
        fs::write(&source, "GeneticParams\n@best=9|gen=0\n").unwrap();
        fs::create_dir_all(destination.parent().unwrap()).unwrap();
        fs::write(&destination, "stale content that is longer\n").unwrap();

        digest_file(&source, &destination).unwrap();
        assert_eq!(fs::read_to_string(&destination).unwrap(), "@best=9|gen=0\n");
    }

    #[test]
    fn test_digest_file_onto_itself_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.txt");
        let content = "noise\n@best=500|gen=0\n@best=120|gen=1\n";
        fs::write(&path, content).unwrap();

        let err = digest_file(&path, &path).unwrap_err();
        assert!(matches!(err, Error::SameFile { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), content);

        // Same file reached through a different spelling
        let aliased = dir.path().join(".").join("run.txt");
        let err = digest_file(&path, &aliased).unwrap_err();
        assert!(matches!(err, Error::SameFile { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_digest_dir_onto_itself_keeps_sources() {
        let dir = tempfile::tempdir().unwrap();
        let content = "noise\n@best=500|gen=0\n@best=120|gen=1\n";
        fs::write(dir.path().join("a.txt"), content).unwrap();
        fs::write(dir.path().join("b.txt"), content).unwrap();

        let err = digest_dir(dir.path(), dir.path(), "txt").unwrap_err();
        assert!(matches!(err, Error::SameFile { .. }));
        for name in ["a.txt", "b.txt"] {
            assert_eq!(fs::read_to_string(dir.path().join(name)).unwrap(), content);
        }
    }
}
