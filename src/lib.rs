// External sort engine: polyphase merge plus the chunked baseline
pub mod external_sort;

// Unit constants shared by the engine and the CLI
pub mod constants;

pub mod utils;

// Re-export main types for convenience
pub use external_sort::{
    sort_file, CompareMode, ExternalSortConfig, ExternalSortProcessor, ExternalSortStats,
    SortError, SortStrategy,
};
