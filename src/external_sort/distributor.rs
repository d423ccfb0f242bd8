use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::external_sort::distribution::DistributionLevel;
use crate::external_sort::error::SortResult;
use crate::external_sort::io::{LineReader, RunWriter};
use crate::external_sort::record::{CompareMode, Record};
use crate::external_sort::working_file::WorkingFile;

/// Result of the distribution phase: populated working files plus the level
/// their run counts were filled against.
#[derive(Debug)]
pub struct Distribution {
    pub level: DistributionLevel,
    pub files: Vec<WorkingFile>,
    pub records: u64,
    pub runs: u64,
    pub joined_runs: u64,
    pub dummy_runs: u64,
}

/// Scans the input once and spreads its natural ascending runs over the
/// auxiliary files following a growing Fibonacci-style target table.
pub struct RunDistributor {
    file_count: usize,
    mode: CompareMode,
    io_buffer_size: usize,
}

impl RunDistributor {
    pub fn new(file_count: usize, mode: CompareMode, io_buffer_size: usize) -> Self {
        Self {
            file_count,
            mode,
            io_buffer_size,
        }
    }

    /// `paths` names all `file_count + 1` working files; the last one is the
    /// first merge sink and is only created empty here.
    pub fn distribute(&self, input: &Path, paths: Vec<PathBuf>) -> SortResult<Distribution> {
        debug_assert_eq!(paths.len(), self.file_count + 1);

        let mut reader = LineReader::open(input, None, self.mode, self.io_buffer_size)?;
        let mut writers = Vec::with_capacity(paths.len());
        for (index, path) in paths.iter().enumerate() {
            writers.push(RunWriter::create(path, Some(index), self.io_buffer_size)?);
        }

        let mut level = DistributionLevel::initial(self.file_count);
        let mut written = vec![0u64; self.file_count];
        let mut joined_runs = 0u64;
        let mut next = reader.next_record()?;

        while next.is_some() {
            for file in 0..self.file_count {
                while written[file] < level.target(file) {
                    let head = match next.as_ref() {
                        Some(head) => head,
                        None => break,
                    };

                    // A run that continues the file's last run would merge with
                    // it on read-back, so it is not counted as a new one.
                    let joins_tail = writers[file]
                        .tail()
                        .map_or(false, |tail| tail.cmp_value(head).is_le());

                    next = copy_run(&mut reader, next, &mut writers[file])?;
                    if joins_tail {
                        joined_runs += 1;
                    } else {
                        written[file] += 1;
                    }
                }
            }

            if next.is_none() {
                break;
            }
            level.grow();
            debug!("Distribution grew to level {:?}", level.slots());
        }

        let mut files = Vec::with_capacity(paths.len());
        let mut dummy_runs = 0;
        for ((index, path), writer) in paths.into_iter().enumerate().zip(writers) {
            let records = writer.finish()?;
            let mut file = WorkingFile::new(index, path);
            file.target = level.target(index);
            file.records = records;
            if index < self.file_count {
                file.runs = written[index];
                file.dummy_runs = file.target - written[index];
                dummy_runs += file.dummy_runs;
            }
            files.push(file);
        }

        let runs: u64 = written.iter().sum();
        info!(
            "Distributed {} records as {} runs over {} files ({} dummy runs, {} runs joined)",
            reader.records_read(),
            runs,
            self.file_count,
            dummy_runs,
            joined_runs
        );

        Ok(Distribution {
            level,
            files,
            records: reader.records_read(),
            runs,
            joined_runs,
            dummy_runs,
        })
    }
}

/// Writes the ascending run that starts at `head` and returns the first value
/// of the following run, if any.
fn copy_run(
    reader: &mut LineReader,
    head: Option<Record>,
    writer: &mut RunWriter,
) -> SortResult<Option<Record>> {
    let head = match head {
        Some(head) => head,
        None => return Ok(None),
    };
    writer.write(head)?;

    while let Some(record) = reader.next_record()? {
        let ascending = writer
            .tail()
            .map_or(true, |tail| record.cmp_value(tail).is_ge());
        if !ascending {
            return Ok(Some(record));
        }
        writer.write(record)?;
    }
    Ok(None)
}
