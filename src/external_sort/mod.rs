pub mod chunk;
pub mod config;
pub mod constants;
pub mod distribution;
pub mod distributor;
pub mod error;
pub mod io;
pub mod merger;
pub mod processor;
pub mod reader;
pub mod record;
pub mod scheduler;
pub mod working_file;


pub use config::{ExternalSortConfig, SortStrategy};
pub use distribution::DistributionLevel;
pub use error::{SortError, SortResult};
pub use processor::ExternalSortProcessor;
pub use record::{CompareMode, Record};
pub use scheduler::LevelReport;

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExternalSortStats {
    pub strategy: SortStrategy,
    /// Auxiliary files for polyphase, chunk files for baseline.
    pub file_count: usize,
    pub total_records: u64,
    pub runs_distributed: u64,
    pub dummy_runs: u64,
    pub merge_levels: usize,
    pub merge_passes: u64,
    pub chunks_created: usize,
    pub distribution_time_ms: u64,
    pub merge_time_ms: u64,
    pub processing_time_ms: u64,
}

/// Sorts `input_file` into `output_file` on the blocking thread pool.
pub async fn sort_file(
    input_file: &Path,
    output_file: &Path,
    config: ExternalSortConfig,
) -> Result<ExternalSortStats> {
    sort_file_with_shutdown(
        input_file,
        output_file,
        config,
        Arc::new(AtomicBool::new(false)),
    )
    .await
}

pub async fn sort_file_with_shutdown(
    input_file: &Path,
    output_file: &Path,
    config: ExternalSortConfig,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<ExternalSortStats> {
    let processor = ExternalSortProcessor::new(config)?.with_shutdown_signal(shutdown_flag);
    let input: PathBuf = input_file.to_path_buf();
    let output: PathBuf = output_file.to_path_buf();

    let stats = tokio::task::spawn_blocking(move || processor.process(&input, &output)).await??;
    Ok(stats)
}
