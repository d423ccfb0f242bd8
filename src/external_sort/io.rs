use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::external_sort::error::{SortError, SortResult};
use crate::external_sort::record::{CompareMode, ParsedLine, Record};

/// Sequential line reader that parses each non-blank line into a [`Record`]
/// and remembers where it is for error reporting.
///
/// Lines must be UTF-8; invalid bytes surface as [`SortError::Io`].
#[derive(Debug)]
pub struct LineReader {
    reader: BufReader<File>,
    path: PathBuf,
    file_index: Option<usize>,
    mode: CompareMode,
    line: String,
    line_number: u64,
    records_read: u64,
}

impl LineReader {
    pub fn open(
        path: &Path,
        file_index: Option<usize>,
        mode: CompareMode,
        buffer_size: usize,
    ) -> SortResult<Self> {
        let file = File::open(path).map_err(|e| SortError::io(path, file_index, 0, e))?;
        Ok(Self {
            reader: BufReader::with_capacity(buffer_size, file),
            path: path.to_path_buf(),
            file_index,
            mode,
            line: String::new(),
            line_number: 0,
            records_read: 0,
        })
    }

    pub fn next_record(&mut self) -> SortResult<Option<Record>> {
        loop {
            self.line.clear();
            let bytes = self.reader.read_line(&mut self.line).map_err(|e| {
                SortError::io(&self.path, self.file_index, self.records_read, e)
            })?;
            if bytes == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            match Record::parse(&self.line, self.mode, self.file_index.unwrap_or(0)) {
                ParsedLine::Blank => continue,
                ParsedLine::Record(record) => {
                    self.records_read += 1;
                    return Ok(Some(record));
                }
                ParsedLine::Malformed => {
                    return Err(SortError::MalformedRecord {
                        path: self.path.clone(),
                        line_number: self.line_number,
                        value: self.line.trim_end_matches(['\n', '\r']).to_string(),
                    });
                }
            }
        }
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }
}

/// Buffered line writer that keeps the last record it wrote.
pub struct RunWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    file_index: Option<usize>,
    records_written: u64,
    tail: Option<Record>,
}

impl RunWriter {
    /// Creates (or truncates) `path`.
    pub fn create(path: &Path, file_index: Option<usize>, buffer_size: usize) -> SortResult<Self> {
        let file = File::create(path).map_err(|e| SortError::io(path, file_index, 0, e))?;
        Ok(Self {
            writer: BufWriter::with_capacity(buffer_size, file),
            path: path.to_path_buf(),
            file_index,
            records_written: 0,
            tail: None,
        })
    }

    pub fn write(&mut self, record: Record) -> SortResult<()> {
        writeln!(self.writer, "{}", record.value).map_err(|e| {
            SortError::io(&self.path, self.file_index, self.records_written, e)
        })?;
        self.records_written += 1;
        self.tail = Some(record);
        Ok(())
    }

    pub fn tail(&self) -> Option<&Record> {
        self.tail.as_ref()
    }

    pub fn finish(mut self) -> SortResult<u64> {
        self.writer.flush().map_err(|e| {
            SortError::io(&self.path, self.file_index, self.records_written, e)
        })?;
        Ok(self.records_written)
    }
}
