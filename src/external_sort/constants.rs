pub const DEFAULT_IO_BUFFER_SIZE_KB: usize = 64;
pub const DEFAULT_MEMORY_USAGE_PERCENT: f64 = 60.0;
pub const DEFAULT_PROGRESS_INTERVAL_SECONDS: u64 = 10;

pub const MIN_FILE_COUNT: usize = 2;
pub const MAX_FILE_COUNT: usize = 512;
pub const MIN_IO_BUFFER_SIZE_KB: usize = 4;
pub const MAX_IO_BUFFER_SIZE_KB: usize = 64 * 1024;
pub const MIN_MEMORY_USAGE_PERCENT: f64 = 10.0;
pub const MAX_MEMORY_USAGE_PERCENT: f64 = 90.0;
pub const MIN_CHUNK_SIZE_MB: usize = 1;
pub const MAX_CHUNK_SIZE_MB: usize = 4096;

// Working file count picked from the input size.
pub const SMALL_INPUT_LIMIT_MB: u64 = 10;
pub const MEDIUM_INPUT_LIMIT_MB: u64 = 100;
pub const SMALL_INPUT_FILE_COUNT: usize = 2;
pub const MEDIUM_INPUT_FILE_COUNT: usize = 24;
pub const LARGE_INPUT_FILE_COUNT: usize = 50;

// Baseline chunk sizes picked from the input size.
pub const SMALL_INPUT_CHUNK_MB: usize = 1;
pub const MEDIUM_INPUT_CHUNK_MB: usize = 10;
pub const LARGE_INPUT_CHUNK_MB: usize = 100;

pub const WORKING_FILE_PREFIX: &str = "working_file_";
pub const WORKING_FILE_EXTENSION: &str = ".pmss";
pub const CHUNK_FILE_PREFIX: &str = "chunk_";
pub const CHUNK_FILE_EXTENSION: &str = ".run";
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "sorted.txt";
pub const RUN_DIRECTORY_PREFIX: &str = "polyphase_sort_";
pub const BASELINE_MERGE_FILE_NAME: &str = "merged.run";

pub const OUTPUT_BUFFER_SIZE_KB: usize = 512;
pub const PROGRESS_CHECK_INTERVAL_RECORDS: u64 = 4096;
pub const ESTIMATED_RECORD_OVERHEAD_BYTES: usize = 48;
