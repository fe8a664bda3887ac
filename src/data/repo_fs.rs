//! CSV file stream with lazy, line-at-a-time reads.
//!
//! Every column except the label column is parsed as `f64`; the label column
//! holds an integer class index in `[0, N)`. One record is prefetched so that
//! `has_more_instances` can answer without consuming input; a malformed
//! record surfaces as a stream error on the `next_instance` call that would
//! have returned it.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::common::error::{EvalError, EvalResult};

use super::domain::{Example, ExampleStream, StreamHeader};

/// Comma-separated file read one record ahead.
pub struct CsvFileStream {
    path: PathBuf,
    header: StreamHeader,
    has_header_row: bool,
    class_column: Option<usize>,
    reader: BufReader<File>,
    line_no: usize,
    file_len: u64,
    consumed: u64,
    data_bytes: u64,
    data_lines: u64,
    pending: Option<EvalResult<Example>>,
}

impl CsvFileStream {
    /// Open `path`, read the header row if present, and prefetch the first record.
    pub fn open(
        path: impl AsRef<Path>,
        num_classes: usize,
        has_header_row: bool,
        class_column: Option<usize>,
    ) -> EvalResult<Self> {
        let path = path.as_ref().to_path_buf();
        let (reader, file_len) = Self::open_reader(&path)?;
        let relation = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stream".to_string());

        let mut stream = Self {
            header: StreamHeader::new(relation, Vec::new(), num_classes),
            path,
            has_header_row,
            class_column,
            reader,
            line_no: 0,
            file_len,
            consumed: 0,
            data_bytes: 0,
            data_lines: 0,
            pending: None,
        };
        stream.read_schema()?;
        stream.advance();
        debug!(
            module = "data",
            event = "csv_open",
            path = %stream.path.display(),
            attributes = stream.header.num_attributes(),
            "opened csv stream"
        );
        Ok(stream)
    }

    fn open_reader(path: &Path) -> EvalResult<(BufReader<File>, u64)> {
        let file = File::open(path).map_err(|e| EvalError::io(path, e))?;
        let len = file.metadata().map_err(|e| EvalError::io(path, e))?.len();
        Ok((BufReader::new(file), len))
    }

    /// Next non-empty line with its byte length, or `None` at end of file.
    fn read_raw_line(&mut self) -> EvalResult<Option<(String, u64)>> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(|e| EvalError::stream(format!("{}: {e}", self.path.display())))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            self.consumed += read as u64;
            if !line.trim().is_empty() {
                return Ok(Some((line.trim().to_string(), read as u64)));
            }
        }
    }

    fn read_schema(&mut self) -> EvalResult<()> {
        if !self.has_header_row {
            return Ok(());
        }
        let (line, _) = self.read_raw_line()?.ok_or_else(|| {
            EvalError::stream(format!("{}: missing header row", self.path.display()))
        })?;
        let columns: Vec<String> = line.split(',').map(|c| c.trim().to_string()).collect();
        if columns.len() < 2 {
            return Err(EvalError::stream("csv header needs at least one feature and a label"));
        }
        let class_col = self.class_column.unwrap_or(columns.len() - 1);
        if class_col >= columns.len() {
            return Err(EvalError::invalid(format!(
                "class column {class_col} outside {} columns",
                columns.len()
            )));
        }
        self.class_column = Some(class_col);
        self.header.attribute_names = columns
            .into_iter()
            .enumerate()
            .filter(|(i, _)| *i != class_col)
            .map(|(_, name)| name)
            .collect();
        Ok(())
    }

    fn advance(&mut self) {
        self.pending = match self.read_raw_line() {
            Ok(Some((line, bytes))) => {
                self.data_bytes += bytes;
                self.data_lines += 1;
                Some(self.parse_record(&line))
            }
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        };
    }

    fn parse_record(&mut self, line: &str) -> EvalResult<Example> {
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        if self.header.attribute_names.is_empty() {
            // Headerless file: the first record fixes the schema.
            let width = cells.len().saturating_sub(1);
            self.header.attribute_names = (1..=width).map(|i| format!("att{i}")).collect();
        }
        let expected = self.header.num_attributes() + 1;
        if cells.len() != expected {
            return Err(EvalError::stream(format!(
                "line {}: expected {expected} columns, found {}",
                self.line_no,
                cells.len()
            )));
        }

        let class_col = self.class_column.unwrap_or(expected - 1);
        let mut features = Vec::with_capacity(expected - 1);
        let mut class = None;
        for (i, cell) in cells.iter().enumerate() {
            if i == class_col {
                let label: usize = cell.parse().map_err(|_| {
                    EvalError::stream(format!("line {}: bad class label '{cell}'", self.line_no))
                })?;
                if label >= self.header.num_classes {
                    return Err(EvalError::stream(format!(
                        "line {}: class {label} outside [0, {})",
                        self.line_no, self.header.num_classes
                    )));
                }
                class = Some(label);
            } else {
                let value: f64 = cell.parse().map_err(|_| {
                    EvalError::stream(format!("line {}: bad number '{cell}'", self.line_no))
                })?;
                features.push(value);
            }
        }
        class
            .map(|c| Example::new(features, c))
            .ok_or_else(|| EvalError::stream(format!("line {}: missing class", self.line_no)))
    }
}

impl ExampleStream for CsvFileStream {
    fn header(&self) -> &StreamHeader {
        &self.header
    }

    fn has_more_instances(&mut self) -> bool {
        self.pending.is_some()
    }

    fn next_instance(&mut self) -> EvalResult<Example> {
        let current = self
            .pending
            .take()
            .unwrap_or_else(|| Err(EvalError::stream("csv stream exhausted")));
        if current.is_ok() {
            self.advance();
        }
        current
    }

    /// Byte-based estimate: unread bytes over the mean record length so far.
    fn estimated_remaining_instances(&self) -> Option<u64> {
        if self.data_lines == 0 || self.data_bytes == 0 {
            return None;
        }
        let avg = self.data_bytes as f64 / self.data_lines as f64;
        let unread = self.file_len.saturating_sub(self.consumed) as f64;
        let prefetched = u64::from(self.pending.is_some());
        Some((unread / avg).round() as u64 + prefetched)
    }

    fn restart(&mut self) -> EvalResult<()> {
        let (reader, file_len) = Self::open_reader(&self.path)?;
        self.reader = reader;
        self.file_len = file_len;
        self.line_no = 0;
        self.consumed = 0;
        self.data_bytes = 0;
        self.data_lines = 0;
        if self.has_header_row {
            self.read_raw_line()?;
        }
        self.advance();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_header_and_records() {
        let file = csv("x,y,label\n1.0,2.5,1\n\n3,4,0\n");
        let mut stream = CsvFileStream::open(file.path(), 2, true, None).unwrap();
        assert_eq!(stream.header().attribute_names, vec!["x", "y"]);
        assert!(stream.has_more_instances());

        let first = stream.next_instance().unwrap();
        assert_eq!(first.features(), &[1.0, 2.5]);
        assert_eq!(first.class(), 1);
        let second = stream.next_instance().unwrap();
        assert_eq!(second.class(), 0);
        assert!(!stream.has_more_instances());
        assert_eq!(stream.estimated_remaining_instances(), Some(0));
    }

    #[test]
    fn label_column_can_be_first() {
        let file = csv("label,a\n2,0.5\n");
        let mut stream = CsvFileStream::open(file.path(), 3, true, Some(0)).unwrap();
        assert_eq!(stream.header().attribute_names, vec!["a"]);
        let ex = stream.next_instance().unwrap();
        assert_eq!(ex.class(), 2);
        assert_eq!(ex.features(), &[0.5]);
    }

    #[test]
    fn headerless_file_generates_names() {
        let file = csv("0.1,0.2,0\n0.3,0.4,1\n");
        let mut stream = CsvFileStream::open(file.path(), 2, false, None).unwrap();
        assert_eq!(stream.header().attribute_names, vec!["att1", "att2"]);
        assert_eq!(stream.next_instance().unwrap().class(), 0);
        assert_eq!(stream.next_instance().unwrap().class(), 1);
    }

    #[test]
    fn out_of_range_label_is_stream_error() {
        let file = csv("a,label\n1,0\n1,5\n");
        let mut stream = CsvFileStream::open(file.path(), 2, true, None).unwrap();
        assert!(stream.next_instance().is_ok());
        assert!(stream.has_more_instances());
        assert!(matches!(stream.next_instance(), Err(EvalError::Stream(_))));
    }

    #[test]
    fn estimate_tracks_progress() {
        let body: String = (0..100).map(|i| format!("{}.0,{}\n", i % 10, i % 2)).collect();
        let file = csv(&format!("a,label\n{body}"));
        let mut stream = CsvFileStream::open(file.path(), 2, true, None).unwrap();
        for _ in 0..50 {
            stream.next_instance().unwrap();
        }
        let estimate = stream.estimated_remaining_instances().unwrap();
        assert!((45..=55).contains(&estimate), "estimate {estimate}");
    }

    #[test]
    fn restart_rewinds() {
        let file = csv("a,label\n1,1\n2,0\n");
        let mut stream = CsvFileStream::open(file.path(), 2, true, None).unwrap();
        stream.next_instance().unwrap();
        stream.next_instance().unwrap();
        stream.restart().unwrap();
        assert_eq!(stream.next_instance().unwrap().features(), &[1.0]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CsvFileStream::open("/definitely/not/here.csv", 2, true, None)
            .err()
            .unwrap();
        assert!(matches!(err, EvalError::Io { .. }));
    }
}
