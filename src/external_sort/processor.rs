use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::constants::{BYTES_PER_KB, BYTES_PER_MB};
use crate::external_sort::chunk::{ChunkFile, ChunkProcessor};
use crate::external_sort::config::{ExternalSortConfig, SortStrategy};
use crate::external_sort::constants::*;
use crate::external_sort::distributor::RunDistributor;
use crate::external_sort::error::{SortError, SortResult};
use crate::external_sort::io::RunWriter;
use crate::external_sort::merger::KWayMerger;
use crate::external_sort::scheduler::{LevelReport, LevelScheduler};
use crate::external_sort::working_file::WorkingFile;
use crate::external_sort::ExternalSortStats;

type LevelObserver = Box<dyn Fn(&LevelReport) + Send + Sync>;

/// Drives one sort from input file to output file with the configured
/// strategy.
///
/// Every run gets its own fresh directory under the working directory, so
/// working files never share a name with the input or output file. The
/// directory and everything in it is removed on every exit path.
pub struct ExternalSortProcessor {
    config: ExternalSortConfig,
    shutdown_flag: Arc<AtomicBool>,
    level_observer: Option<LevelObserver>,
}

impl ExternalSortProcessor {
    pub fn new(config: ExternalSortConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            level_observer: None,
        })
    }

    pub fn with_shutdown_signal(mut self, shutdown_flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = shutdown_flag;
        self
    }

    /// Called after each merge level, before the shutdown flag is checked.
    pub fn on_level_complete<F>(mut self, observer: F) -> Self
    where
        F: Fn(&LevelReport) + Send + Sync + 'static,
    {
        self.level_observer = Some(Box::new(observer));
        self
    }

    pub fn process(&self, input_file: &Path, output_file: &Path) -> SortResult<ExternalSortStats> {
        let start_time = Instant::now();

        if same_file(input_file, output_file) {
            return Err(SortError::InvalidConfig {
                message: format!(
                    "output file {} must differ from the input file",
                    output_file.display()
                ),
            });
        }

        let input_bytes = std::fs::metadata(input_file)
            .map_err(|e| SortError::io(input_file, None, 0, e))?
            .len();
        let working_directory = self.config.working_directory(output_file);
        std::fs::create_dir_all(&working_directory)
            .map_err(|e| SortError::io(&working_directory, None, 0, e))?;
        let run_directory = tempfile::Builder::new()
            .prefix(RUN_DIRECTORY_PREFIX)
            .tempdir_in(&working_directory)
            .map_err(|e| SortError::io(&working_directory, None, 0, e))?;

        info!(
            "Sorting {} ({:.1} MB) with the {:?} strategy in {:?} mode",
            input_file.display(),
            input_bytes as f64 / BYTES_PER_MB as f64,
            self.config.strategy,
            self.config.compare_mode
        );
        debug!("Working files go to {}", run_directory.path().display());

        let sorted = match self.config.strategy {
            SortStrategy::Polyphase => {
                self.sort_polyphase(input_file, output_file, run_directory.path(), input_bytes)
            }
            SortStrategy::Baseline => {
                self.sort_baseline(input_file, output_file, run_directory.path(), input_bytes)
            }
        };

        let run_path = run_directory.path().to_path_buf();
        if let Err(e) = run_directory.close() {
            warn!("Failed to remove working directory {}: {}", run_path.display(), e);
        }

        let mut stats = sorted?;
        stats.processing_time_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Sorted {} records into {} in {} ms",
            stats.total_records,
            output_file.display(),
            stats.processing_time_ms
        );
        Ok(stats)
    }

    fn sort_polyphase(
        &self,
        input_file: &Path,
        output_file: &Path,
        run_directory: &Path,
        input_bytes: u64,
    ) -> SortResult<ExternalSortStats> {
        let file_count = self.config.resolve_file_count(input_bytes);
        let mode = self.config.compare_mode;
        let io_buffer_size = self.config.io_buffer_size_bytes();
        debug!("Using {} auxiliary files plus one sink", file_count);

        let distribution_start = Instant::now();
        let distribution = RunDistributor::new(file_count, mode, io_buffer_size)
            .distribute(input_file, working_file_paths(run_directory, file_count))?;

        let mut stats = ExternalSortStats {
            strategy: SortStrategy::Polyphase,
            file_count,
            total_records: distribution.records,
            runs_distributed: distribution.runs,
            dummy_runs: distribution.dummy_runs,
            distribution_time_ms: distribution_start.elapsed().as_millis() as u64,
            ..Default::default()
        };

        self.check_shutdown(1)?;

        let merge_start = Instant::now();
        let mut scheduler = LevelScheduler::new(distribution, mode, io_buffer_size);
        scheduler.start()?;

        let mut merger = KWayMerger::new(file_count, self.config.progress_interval_seconds);
        while !scheduler.is_complete() {
            let report = scheduler.run_level(&mut merger)?;
            stats.merge_levels += 1;
            stats.merge_passes += report.passes;
            if let Some(observer) = &self.level_observer {
                observer(&report);
            }

            if !scheduler.is_complete() {
                self.check_shutdown(scheduler.level_number())?;
            }
        }
        stats.merge_time_ms = merge_start.elapsed().as_millis() as u64;

        let result = &scheduler.files()[scheduler.result_file()];
        if result.records != stats.total_records {
            return Err(SortError::RecordCountMismatch {
                expected: stats.total_records,
                actual: result.records,
            });
        }

        move_to_output(result.path(), output_file)?;
        Ok(stats)
    }

    fn sort_baseline(
        &self,
        input_file: &Path,
        output_file: &Path,
        run_directory: &Path,
        input_bytes: u64,
    ) -> SortResult<ExternalSortStats> {
        let chunk_processor = ChunkProcessor::new(
            self.config.chunk_size_bytes(input_bytes),
            self.config.io_buffer_size_bytes(),
            run_directory.to_path_buf(),
            self.config.compare_mode,
        );
        debug!(
            "Expecting about {} chunks",
            chunk_processor.estimate_chunk_count(input_bytes)
        );

        let split_start = Instant::now();
        let (chunks, records) = chunk_processor.process_file_to_chunks(input_file)?;
        let mut stats = ExternalSortStats {
            strategy: SortStrategy::Baseline,
            file_count: chunks.len(),
            total_records: records,
            runs_distributed: chunks.len() as u64,
            chunks_created: chunks.len(),
            distribution_time_ms: split_start.elapsed().as_millis() as u64,
            ..Default::default()
        };

        let merge_start = Instant::now();
        let merged_file = run_directory.join(BASELINE_MERGE_FILE_NAME);
        let merged = self.merge_chunks(&chunks, records, &merged_file);
        chunk_processor.cleanup_all_chunks(&chunks);
        merged?;
        move_to_output(&merged_file, output_file)?;

        stats.merge_levels = 1;
        stats.merge_passes = 1;
        stats.merge_time_ms = merge_start.elapsed().as_millis() as u64;
        Ok(stats)
    }

    fn merge_chunks(&self, chunks: &[ChunkFile], expected: u64, merged_file: &Path) -> SortResult<()> {
        self.check_shutdown(1)?;

        let mode = self.config.compare_mode;
        let io_buffer_size = self.config.io_buffer_size_bytes();
        let mut files = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            let mut file = WorkingFile::new(index, chunk.path.clone());
            file.records = chunk.record_count;
            file.runs = 1;
            file.open_single_run_reader(mode, io_buffer_size)?;
            files.push(file);
        }

        let mut writer = RunWriter::create(merged_file, None, OUTPUT_BUFFER_SIZE_KB * BYTES_PER_KB)?;
        KWayMerger::new(files.len(), self.config.progress_interval_seconds)
            .merge_sorted_files(&mut files, &mut writer)?;
        let written = writer.finish()?;

        if written != expected {
            return Err(SortError::RecordCountMismatch {
                expected,
                actual: written,
            });
        }
        Ok(())
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown_flag.load(Ordering::Relaxed)
    }

    fn check_shutdown(&self, level: usize) -> SortResult<()> {
        if self.shutdown_requested() {
            warn!("Shutdown requested, stopping before merge level {}", level);
            return Err(SortError::Cancelled { level });
        }
        Ok(())
    }
}

/// `working_file_1.pmss` through `working_file_<F+1>.pmss`.
pub fn working_file_paths(directory: &Path, file_count: usize) -> Vec<PathBuf> {
    (1..=file_count + 1)
        .map(|n| {
            directory.join(format!(
                "{}{}{}",
                WORKING_FILE_PREFIX, n, WORKING_FILE_EXTENSION
            ))
        })
        .collect()
}

/// True when both paths name the same existing file, however they are spelled.
fn same_file(input_file: &Path, output_file: &Path) -> bool {
    if input_file == output_file {
        return true;
    }
    match (input_file.canonicalize(), output_file.canonicalize()) {
        (Ok(input), Ok(output)) => input == output,
        _ => false,
    }
}

/// Renames the finished working file onto the output, copying when the two
/// live on different file systems.
fn move_to_output(result: &Path, output_file: &Path) -> SortResult<()> {
    if let Err(e) = std::fs::rename(result, output_file) {
        debug!(
            "Rename of {} failed ({}), copying to {}",
            result.display(),
            e,
            output_file.display()
        );
        std::fs::copy(result, output_file).map_err(|e| SortError::io(output_file, None, 0, e))?;
        std::fs::remove_file(result).map_err(|e| SortError::io(result, None, 0, e))?;
    }
    Ok(())
}
