use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{BYTES_PER_KB, BYTES_PER_MB};
use crate::external_sort::constants::*;
use crate::external_sort::record::CompareMode;

/// Which external sort to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortStrategy {
    /// Natural runs distributed over F working files and merged polyphase.
    Polyphase,
    /// Fixed-size chunks sorted in memory, then one k-way merge.
    Baseline,
}

impl Default for SortStrategy {
    fn default() -> Self {
        SortStrategy::Polyphase
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalSortConfig {
    /// Number of auxiliary working files. Picked from the input size when unset.
    pub file_count: Option<usize>,
    pub compare_mode: CompareMode,
    pub strategy: SortStrategy,
    /// Where working files go. Defaults to the output file's directory.
    pub temp_directory: Option<PathBuf>,
    pub io_buffer_size_kb: usize,
    /// Baseline chunk size. Picked from the input size when unset.
    pub chunk_size_mb: Option<usize>,
    pub memory_usage_percent: f64,
    pub progress_interval_seconds: u64,
    pub verbose: bool,
}

impl Default for ExternalSortConfig {
    fn default() -> Self {
        Self {
            file_count: None,
            compare_mode: CompareMode::Lexicographic,
            strategy: SortStrategy::Polyphase,
            temp_directory: None,
            io_buffer_size_kb: DEFAULT_IO_BUFFER_SIZE_KB,
            chunk_size_mb: None,
            memory_usage_percent: DEFAULT_MEMORY_USAGE_PERCENT,
            progress_interval_seconds: DEFAULT_PROGRESS_INTERVAL_SECONDS,
            verbose: false,
        }
    }
}

impl ExternalSortConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(file_count) = self.file_count {
            if !(MIN_FILE_COUNT..=MAX_FILE_COUNT).contains(&file_count) {
                return Err(anyhow::anyhow!(
                    "File count must be between {} and {}",
                    MIN_FILE_COUNT,
                    MAX_FILE_COUNT
                ));
            }
        }

        if self.io_buffer_size_kb < MIN_IO_BUFFER_SIZE_KB
            || self.io_buffer_size_kb > MAX_IO_BUFFER_SIZE_KB
        {
            return Err(anyhow::anyhow!(
                "I/O buffer size must be between {} and {} KB",
                MIN_IO_BUFFER_SIZE_KB,
                MAX_IO_BUFFER_SIZE_KB
            ));
        }

        if let Some(chunk_size_mb) = self.chunk_size_mb {
            if chunk_size_mb < MIN_CHUNK_SIZE_MB || chunk_size_mb > MAX_CHUNK_SIZE_MB {
                return Err(anyhow::anyhow!(
                    "Chunk size must be between {} and {} MB",
                    MIN_CHUNK_SIZE_MB,
                    MAX_CHUNK_SIZE_MB
                ));
            }
        }

        if self.memory_usage_percent < MIN_MEMORY_USAGE_PERCENT
            || self.memory_usage_percent > MAX_MEMORY_USAGE_PERCENT
        {
            return Err(anyhow::anyhow!(
                "Memory usage percent must be between {} and {}",
                MIN_MEMORY_USAGE_PERCENT,
                MAX_MEMORY_USAGE_PERCENT
            ));
        }

        Ok(())
    }

    /// Auxiliary file count for an input of `input_bytes`.
    pub fn resolve_file_count(&self, input_bytes: u64) -> usize {
        if let Some(file_count) = self.file_count {
            return file_count;
        }

        let input_mb = input_bytes / BYTES_PER_MB as u64;
        if input_mb < SMALL_INPUT_LIMIT_MB {
            SMALL_INPUT_FILE_COUNT
        } else if input_mb <= MEDIUM_INPUT_LIMIT_MB {
            MEDIUM_INPUT_FILE_COUNT
        } else {
            LARGE_INPUT_FILE_COUNT
        }
    }

    /// Baseline chunk size in MB for an input of `input_bytes`, never above
    /// the memory limit.
    pub fn resolve_chunk_size_mb(&self, input_bytes: u64) -> usize {
        let chunk_mb = self.chunk_size_mb.unwrap_or_else(|| {
            let input_mb = input_bytes / BYTES_PER_MB as u64;
            if input_mb > MEDIUM_INPUT_LIMIT_MB {
                LARGE_INPUT_CHUNK_MB
            } else if input_mb > SMALL_INPUT_LIMIT_MB {
                MEDIUM_INPUT_CHUNK_MB
            } else {
                SMALL_INPUT_CHUNK_MB
            }
        });

        let limit_mb = self.memory_limit_bytes() / BYTES_PER_MB;
        if limit_mb > 0 {
            chunk_mb.min(limit_mb)
        } else {
            chunk_mb
        }
    }

    pub fn chunk_size_bytes(&self, input_bytes: u64) -> usize {
        self.resolve_chunk_size_mb(input_bytes) * BYTES_PER_MB
    }

    pub fn memory_limit_bytes(&self) -> usize {
        use sysinfo::System;
        let mut system = System::new();
        system.refresh_memory();

        let available_memory = system.available_memory() as f64;
        (available_memory * self.memory_usage_percent / 100.0) as usize
    }

    pub fn io_buffer_size_bytes(&self) -> usize {
        self.io_buffer_size_kb * BYTES_PER_KB
    }

    /// Working directory for an output file: the configured one, else the
    /// output's own directory.
    pub fn working_directory(&self, output_file: &Path) -> PathBuf {
        match &self.temp_directory {
            Some(dir) => dir.clone(),
            None => output_file
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}
