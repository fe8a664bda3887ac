//! Append-only CSV sink for learning-curve snapshots.
//!
//! Opened once per run before the first example is processed. An existing
//! file is appended to, never truncated; each run writes its own header line
//! ahead of its first snapshot. Every line is flushed as soon as it is
//! written and the file is closed when the sink is dropped.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::common::error::{EvalError, EvalResult};

use super::domain::LearningCurve;

/// Append-only writer of learning-curve lines.
pub struct ResultSink {
    path: PathBuf,
    writer: BufWriter<File>,
    header_written: bool,
}

impl ResultSink {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> EvalResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| EvalError::io(&path, e))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            header_written: false,
        })
    }

    /// Write the newest entry of `curve`, preceded by the header on first use.
    pub fn append_latest(&mut self, curve: &LearningCurve) -> EvalResult<()> {
        let Some(line) = curve
            .num_entries()
            .checked_sub(1)
            .and_then(|last| curve.entry_to_string(last))
        else {
            return Ok(());
        };
        if !self.header_written {
            writeln!(self.writer, "{}", curve.header_to_string())
                .map_err(|e| EvalError::io(&self.path, e))?;
            self.header_written = true;
        }
        writeln!(self.writer, "{line}").map_err(|e| EvalError::io(&self.path, e))?;
        self.writer.flush().map_err(|e| EvalError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::domain::{Snapshot, INSTANCES, TP};
    use tempfile::tempdir;

    fn curve_with(values: &[(f64, f64)]) -> LearningCurve {
        let mut curve = LearningCurve::new(INSTANCES);
        for &(i, tp) in values {
            let mut snap = Snapshot::new();
            snap.push(INSTANCES, i);
            snap.push(TP, tp);
            curve.insert_entry(snap);
        }
        curve
    }

    #[test]
    fn writes_header_once_then_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("curve.csv");
        let mut sink = ResultSink::open(&path).unwrap();

        let mut curve = curve_with(&[(10.0, 3.0)]);
        sink.append_latest(&curve).unwrap();
        let mut snap = Snapshot::new();
        snap.push(INSTANCES, 20.0);
        snap.push(TP, 7.0);
        curve.insert_entry(snap);
        sink.append_latest(&curve).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "learning evaluation instances,TP\n10,3\n20,7\n");
    }

    #[test]
    fn appends_to_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("curve.csv");
        std::fs::write(&path, "previous run\n").unwrap();

        let mut sink = ResultSink::open(&path).unwrap();
        sink.append_latest(&curve_with(&[(5.0, 1.0)])).unwrap();
        drop(sink);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("previous run\n"));
        assert!(content.ends_with("5,1\n"));
    }

    #[test]
    fn empty_curve_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("curve.csv");
        let mut sink = ResultSink::open(&path).unwrap();
        sink.append_latest(&LearningCurve::new(INSTANCES)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn unopenable_path_is_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("curve.csv");
        assert!(matches!(ResultSink::open(&path), Err(EvalError::Io { .. })));
    }
}
