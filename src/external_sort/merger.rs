use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};
use tracing::info;

use crate::external_sort::constants::PROGRESS_CHECK_INTERVAL_RECORDS;
use crate::external_sort::error::{SortError, SortResult};
use crate::external_sort::io::RunWriter;
use crate::external_sort::reader::ReadOutcome;
use crate::external_sort::record::Record;
use crate::external_sort::working_file::WorkingFile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub passes: u64,
    pub records_written: u64,
    /// Passes to which no source contributed a record.
    pub empty_passes: u64,
}

/// Heap-driven k-way merge over one run from each source file per pass.
///
/// The heap holds at most one record per source. Equal values leave in
/// ascending source file order (see [`Record`]'s `Ord`).
pub struct KWayMerger {
    heap: BinaryHeap<Reverse<Record>>,
    progress_interval: Duration,
}

impl KWayMerger {
    pub fn new(file_count: usize, progress_interval_seconds: u64) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(file_count + 1),
            progress_interval: Duration::from_secs(progress_interval_seconds),
        }
    }

    /// Runs exactly `passes` merge passes from every file except `sink` into
    /// `writer`. Each pass takes one run (or one dummy credit) from every
    /// source and ends when the heap runs dry.
    ///
    /// The writer is left open; the caller owns the file lifecycle.
    pub fn merge_passes(
        &mut self,
        files: &mut [WorkingFile],
        sink: Option<usize>,
        writer: &mut RunWriter,
        passes: u64,
    ) -> SortResult<MergeReport> {
        let mut report = MergeReport::default();
        let mut last_progress_time = Instant::now();

        while report.passes < passes {
            self.heap.clear();
            for file in files.iter_mut() {
                if Some(file.index) == sink {
                    continue;
                }
                if let ReadOutcome::Record(record) = file.begin_run()? {
                    self.heap.push(Reverse(record));
                }
            }

            if self.heap.is_empty() {
                report.empty_passes += 1;
            }

            while let Some(Reverse(record)) = self.heap.pop() {
                let source = record.source_file;
                writer.write(record)?;
                report.records_written += 1;

                let file = &mut files[source];
                file.records = file.records.checked_sub(1).ok_or(SortError::RunAccounting {
                    file_index: source,
                    records: 1,
                })?;
                if let ReadOutcome::Record(next) = file.next_in_run()? {
                    self.heap.push(Reverse(next));
                }

                if report.records_written % PROGRESS_CHECK_INTERVAL_RECORDS == 0
                    && last_progress_time.elapsed() >= self.progress_interval
                {
                    info!(
                        "Merge progress: pass {}/{}, {} records written",
                        report.passes + 1,
                        passes,
                        report.records_written
                    );
                    last_progress_time = Instant::now();
                }
            }

            report.passes += 1;
        }

        Ok(report)
    }

    /// Merges files that each hold exactly one sorted run (boundary detection
    /// off, no dummy credits) in a single pass.
    pub fn merge_sorted_files(
        &mut self,
        files: &mut [WorkingFile],
        writer: &mut RunWriter,
    ) -> SortResult<MergeReport> {
        self.merge_passes(files, None, writer, 1)
    }
}
