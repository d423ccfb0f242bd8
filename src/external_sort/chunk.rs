use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::external_sort::constants::*;
use crate::external_sort::error::{SortError, SortResult};
use crate::external_sort::io::{LineReader, RunWriter};
use crate::external_sort::record::{CompareMode, Record};

#[derive(Debug, Clone)]
pub struct ChunkFile {
    pub chunk_id: usize,
    pub path: PathBuf,
    pub record_count: u64,
}

/// Splits an input file into size-bounded chunks and sorts each one in
/// memory, producing one fully sorted run per chunk file.
pub struct ChunkProcessor {
    chunk_size_bytes: usize,
    io_buffer_size: usize,
    temp_directory: PathBuf,
    mode: CompareMode,
}

impl ChunkProcessor {
    pub fn new(
        chunk_size_bytes: usize,
        io_buffer_size: usize,
        temp_directory: PathBuf,
        mode: CompareMode,
    ) -> Self {
        Self {
            chunk_size_bytes,
            io_buffer_size,
            temp_directory,
            mode,
        }
    }

    /// Returns the chunk files and the number of records read. Chunks already
    /// written are removed again when the split fails part way.
    pub fn process_file_to_chunks(&self, file_path: &Path) -> SortResult<(Vec<ChunkFile>, u64)> {
        let mut chunks = Vec::new();
        match self.split_into_chunks(file_path, &mut chunks) {
            Ok(records) => {
                debug!(
                    "Split {} into {} sorted chunks ({} records)",
                    file_path.display(),
                    chunks.len(),
                    records
                );
                Ok((chunks, records))
            }
            Err(e) => {
                self.cleanup_all_chunks(&chunks);
                Err(e)
            }
        }
    }

    fn split_into_chunks(&self, file_path: &Path, chunks: &mut Vec<ChunkFile>) -> SortResult<u64> {
        let mut reader = LineReader::open(file_path, None, self.mode, self.io_buffer_size)?;
        let mut current_chunk = Vec::new();
        let mut current_size = 0;

        while let Some(record) = reader.next_record()? {
            let record_size = record.estimated_size();
            if current_size + record_size > self.chunk_size_bytes && !current_chunk.is_empty() {
                let chunk =
                    self.sort_and_write_chunk(chunks.len(), std::mem::take(&mut current_chunk))?;
                chunks.push(chunk);
                current_size = 0;
            }
            current_size += record_size;
            current_chunk.push(record);
        }

        if !current_chunk.is_empty() {
            let chunk = self.sort_and_write_chunk(chunks.len(), current_chunk)?;
            chunks.push(chunk);
        }

        Ok(reader.records_read())
    }

    pub fn sort_and_write_chunk(
        &self,
        chunk_id: usize,
        mut records: Vec<Record>,
    ) -> SortResult<ChunkFile> {
        records.par_sort_by(|a, b| a.cmp_value(b));

        let chunk_file = self.temp_directory.join(format!(
            "{}{}{}",
            CHUNK_FILE_PREFIX, chunk_id, CHUNK_FILE_EXTENSION
        ));

        let written = RunWriter::create(&chunk_file, Some(chunk_id), self.io_buffer_size)
            .and_then(|mut writer| {
                for record in records {
                    writer.write(record)?;
                }
                writer.finish()
            });

        match written {
            Ok(record_count) => Ok(ChunkFile {
                chunk_id,
                path: chunk_file,
                record_count,
            }),
            Err(e) => {
                if chunk_file.exists() {
                    if let Err(cleanup) = std::fs::remove_file(&chunk_file) {
                        warn!("Failed to remove partial chunk {}: {}", chunk_id, cleanup);
                    }
                }
                Err(e)
            }
        }
    }

    pub fn cleanup_chunk(&self, chunk: &ChunkFile) -> SortResult<()> {
        if chunk.path.exists() {
            std::fs::remove_file(&chunk.path)
                .map_err(|e| SortError::io(&chunk.path, Some(chunk.chunk_id), 0, e))?;
        }
        Ok(())
    }

    pub fn cleanup_all_chunks(&self, chunks: &[ChunkFile]) {
        for chunk in chunks {
            if let Err(e) = self.cleanup_chunk(chunk) {
                warn!("Failed to clean up chunk {}: {}", chunk.chunk_id, e);
            }
        }
    }

    pub fn estimate_chunk_count(&self, file_size: u64) -> usize {
        if file_size == 0 {
            return 1;
        }

        let file_size_usize = file_size.min(usize::MAX as u64) as usize;
        let estimated_chunks =
            file_size_usize.saturating_add(self.chunk_size_bytes - 1) / self.chunk_size_bytes;
        estimated_chunks.max(1)
    }
}
