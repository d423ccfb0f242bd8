use std::path::Path;

use crate::external_sort::error::SortResult;
use crate::external_sort::io::LineReader;
use crate::external_sort::record::{CompareMode, Record};

/// What a read against one working file produced.
#[derive(Debug)]
pub enum ReadOutcome {
    Record(Record),
    /// A dummy run was consumed; the file contributes nothing to this pass.
    DummyRun,
    /// The next value belongs to the following run and has been cached.
    EndOfRun,
    EndOfFile,
}

/// Read cursor over one working file that infers run boundaries from order
/// violations.
///
/// Runs are stored back to back without markers. A value smaller than the
/// previous one from the same file is the head of the next run: it is kept
/// aside, the cursor blocks for the rest of the pass and hands the value out
/// again when the next run is started.
#[derive(Debug)]
pub struct RunCursor {
    lines: LineReader,
    detect_boundaries: bool,
    last: Option<Record>,
    pending: Option<Record>,
    blocked: bool,
    exhausted: bool,
}

impl RunCursor {
    pub fn open(
        path: &Path,
        file_index: usize,
        mode: CompareMode,
        buffer_size: usize,
    ) -> SortResult<Self> {
        Ok(Self {
            lines: LineReader::open(path, Some(file_index), mode, buffer_size)?,
            detect_boundaries: true,
            last: None,
            pending: None,
            blocked: false,
            exhausted: false,
        })
    }

    /// Treats the whole file as a single run, for inputs that are already
    /// fully sorted.
    pub fn without_boundaries(mut self) -> Self {
        self.detect_boundaries = false;
        self
    }

    /// Starts the next run: hands out the cached head if there is one,
    /// otherwise the next physical value.
    pub fn begin_run(&mut self) -> SortResult<ReadOutcome> {
        self.blocked = false;
        if let Some(head) = self.pending.take() {
            self.last = Some(head.clone());
            return Ok(ReadOutcome::Record(head));
        }
        if self.exhausted {
            return Ok(ReadOutcome::EndOfFile);
        }

        match self.lines.next_record()? {
            Some(record) => {
                self.last = Some(record.clone());
                Ok(ReadOutcome::Record(record))
            }
            None => {
                self.exhausted = true;
                Ok(ReadOutcome::EndOfFile)
            }
        }
    }

    /// Next value of the current run.
    pub fn next_in_run(&mut self) -> SortResult<ReadOutcome> {
        if self.blocked {
            return Ok(ReadOutcome::EndOfRun);
        }
        if self.exhausted {
            return Ok(ReadOutcome::EndOfFile);
        }

        let record = match self.lines.next_record()? {
            Some(record) => record,
            None => {
                self.exhausted = true;
                return Ok(ReadOutcome::EndOfFile);
            }
        };

        if self.detect_boundaries {
            if let Some(last) = &self.last {
                if record.cmp_value(last).is_lt() {
                    self.pending = Some(record);
                    self.blocked = true;
                    return Ok(ReadOutcome::EndOfRun);
                }
            }
        }

        self.last = Some(record.clone());
        Ok(ReadOutcome::Record(record))
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.pending.is_none()
    }
}
