use std::path::{Path, PathBuf};

use crate::external_sort::error::{SortError, SortResult};
use crate::external_sort::reader::{ReadOutcome, RunCursor};
use crate::external_sort::record::CompareMode;

/// Everything the sort tracks about one working file.
///
/// Between levels `runs + dummy_runs == target` holds for every file that is
/// not the current sink.
#[derive(Debug)]
pub struct WorkingFile {
    pub index: usize,
    pub path: PathBuf,
    /// Run count this file must hold at the current level.
    pub target: u64,
    /// Physical runs the bookkeeping believes are still unread.
    pub runs: u64,
    /// Runs credited to the file without being stored in it.
    pub dummy_runs: u64,
    /// Records written to the file and not yet merged out of it.
    pub records: u64,
    cursor: Option<RunCursor>,
}

impl WorkingFile {
    pub fn new(index: usize, path: PathBuf) -> Self {
        Self {
            index,
            path,
            target: 0,
            runs: 0,
            dummy_runs: 0,
            records: 0,
            cursor: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open_reader(&mut self, mode: CompareMode, buffer_size: usize) -> SortResult<()> {
        self.cursor = Some(RunCursor::open(&self.path, self.index, mode, buffer_size)?);
        Ok(())
    }

    pub fn open_single_run_reader(&mut self, mode: CompareMode, buffer_size: usize) -> SortResult<()> {
        let cursor = RunCursor::open(&self.path, self.index, mode, buffer_size)?;
        self.cursor = Some(cursor.without_boundaries());
        Ok(())
    }

    pub fn close_reader(&mut self) {
        self.cursor = None;
    }

    /// Starts this file's contribution to a merge pass. A dummy credit is
    /// spent before any physical run is touched.
    pub fn begin_run(&mut self) -> SortResult<ReadOutcome> {
        if self.dummy_runs > 0 {
            self.dummy_runs -= 1;
            return Ok(ReadOutcome::DummyRun);
        }

        let cursor = match self.cursor.as_mut() {
            Some(cursor) => cursor,
            None => return Ok(ReadOutcome::EndOfFile),
        };
        let outcome = cursor.begin_run()?;
        // Adjacent runs may have merged physically, so a run can come up empty,
        // but the bookkeeping must always cover every run started.
        self.runs = self.runs.checked_sub(1).ok_or(SortError::RunAccounting {
            file_index: self.index,
            records: self.records,
        })?;
        Ok(outcome)
    }

    pub fn next_in_run(&mut self) -> SortResult<ReadOutcome> {
        match self.cursor.as_mut() {
            Some(cursor) => cursor.next_in_run(),
            None => Ok(ReadOutcome::EndOfFile),
        }
    }

    pub fn has_pending_run(&self) -> bool {
        self.cursor.as_ref().map_or(false, |cursor| cursor.has_pending())
    }

    pub fn total_runs(&self) -> u64 {
        self.runs + self.dummy_runs
    }

    pub fn is_balanced(&self) -> bool {
        self.total_runs() == self.target
    }
}
