use tracing::{debug, info};

use crate::external_sort::distribution::DistributionLevel;
use crate::external_sort::distributor::Distribution;
use crate::external_sort::error::{SortError, SortResult};
use crate::external_sort::io::RunWriter;
use crate::external_sort::merger::{KWayMerger, MergeReport};
use crate::external_sort::record::CompareMode;
use crate::external_sort::working_file::WorkingFile;

/// Summary of one completed merge level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelReport {
    pub level: usize,
    pub sink: usize,
    pub passes: u64,
    pub dummy_flow: u64,
    pub records_written: u64,
}

/// Per-sort merge state: the current level, which working file is the sink
/// and every file's run bookkeeping.
///
/// Level slot `j` lives in working file `(sink + 1 + j) % (F + 1)`, so slot 0
/// is always the file the previous level merged into.
pub struct LevelScheduler {
    level: DistributionLevel,
    files: Vec<WorkingFile>,
    sink: usize,
    level_number: usize,
    passes: u64,
    dummy_flow: u64,
    mode: CompareMode,
    io_buffer_size: usize,
}

impl LevelScheduler {
    pub fn new(distribution: Distribution, mode: CompareMode, io_buffer_size: usize) -> Self {
        let sink = distribution.level.file_count();
        Self {
            level: distribution.level,
            files: distribution.files,
            sink,
            level_number: 0,
            passes: 0,
            dummy_flow: 0,
            mode,
            io_buffer_size,
        }
    }

    /// Opens readers on the distributed files and prepares the first level.
    pub fn start(&mut self) -> SortResult<()> {
        if self.is_complete() {
            return self.verify_terminal();
        }
        for index in 0..self.files.len() {
            if index != self.sink {
                self.files[index].open_reader(self.mode, self.io_buffer_size)?;
            }
        }
        self.enter_level()
    }

    pub fn is_complete(&self) -> bool {
        self.level.is_terminal()
    }

    pub fn runs_remaining_this_level(&self) -> u64 {
        self.level.total_runs()
    }

    pub fn current_sink(&self) -> usize {
        self.sink
    }

    pub fn dummy_credit_for(&self, file: usize) -> u64 {
        self.files[file].dummy_runs
    }

    /// Merge passes the current level needs.
    pub fn passes_this_level(&self) -> u64 {
        self.passes
    }

    pub fn level_number(&self) -> usize {
        self.level_number
    }

    pub fn files(&self) -> &[WorkingFile] {
        &self.files
    }

    /// Working file holding level slot `slot`.
    pub fn file_at(&self, slot: usize) -> usize {
        (self.sink + 1 + slot) % self.files.len()
    }

    /// The file holding the single remaining run once the sort is complete.
    pub fn result_file(&self) -> usize {
        self.file_at(0)
    }

    /// Merges the current level into the sink and advances to the next one.
    pub fn run_level(&mut self, merger: &mut KWayMerger) -> SortResult<LevelReport> {
        let sink = self.sink;
        let mut writer = RunWriter::create(
            self.files[sink].path(),
            Some(sink),
            self.io_buffer_size,
        )?;

        let MergeReport {
            passes,
            records_written,
            ..
        } = merger.merge_passes(&mut self.files, Some(sink), &mut writer, self.passes)?;

        self.files[sink].records += writer.finish()?;
        self.files[sink].runs += passes;

        let report = LevelReport {
            level: self.level_number,
            sink,
            passes,
            dummy_flow: self.dummy_flow,
            records_written,
        };
        info!(
            "Level {}: merged {} passes ({} dummy runs flowed through) into file {}, {} records",
            report.level, report.passes, report.dummy_flow, report.sink, report.records_written
        );

        self.advance_level()?;
        Ok(report)
    }

    /// Steps the level back by the inverse recurrence, rotates the sink and
    /// prepares the next level. Called once the current level's passes have
    /// been merged into the sink.
    pub fn advance_level(&mut self) -> SortResult<()> {
        self.level.shrink();
        let previous_sink = self.sink;
        self.sink = if self.sink == 0 {
            self.files.len() - 1
        } else {
            self.sink - 1
        };

        let drained = &mut self.files[self.sink];
        drained.close_reader();
        if drained.records > 0 {
            return Err(SortError::RunAccounting {
                file_index: drained.index,
                records: drained.records,
            });
        }

        if self.is_complete() {
            return self.verify_terminal();
        }

        self.files[previous_sink].open_reader(self.mode, self.io_buffer_size)?;
        self.enter_level()
    }

    fn enter_level(&mut self) -> SortResult<()> {
        self.level_number += 1;

        for slot in 0..self.level.file_count() {
            let index = self.file_at(slot);
            self.files[index].target = self.level.target(slot);
            debug_assert!(
                self.files[index].is_balanced(),
                "file {} holds {} runs against a target of {}",
                index,
                self.files[index].total_runs(),
                self.files[index].target
            );
        }
        self.files[self.sink].target = 0;

        // Dummy runs every source holds merge into a dummy run on the sink
        // without touching any data.
        let sink = self.sink;
        let flow = self
            .files
            .iter()
            .filter(|file| file.index != sink)
            .map(|file| file.dummy_runs)
            .min()
            .unwrap_or(0);
        for file in self.files.iter_mut() {
            if file.index != sink {
                file.dummy_runs -= flow;
            }
        }
        self.files[sink].dummy_runs += flow;

        self.dummy_flow = flow;
        self.passes = self.level.min_nonzero().unwrap_or(0) - flow;

        debug!(
            "Entering level {} with targets {:?}, sink {}, {} passes",
            self.level_number,
            self.level.slots(),
            self.sink,
            self.passes
        );
        Ok(())
    }

    fn verify_terminal(&mut self) -> SortResult<()> {
        let result = self.result_file();
        for file in self.files.iter_mut() {
            file.close_reader();
            if file.index != result && file.records > 0 {
                return Err(SortError::RunAccounting {
                    file_index: file.index,
                    records: file.records,
                });
            }
        }
        Ok(())
    }
}
