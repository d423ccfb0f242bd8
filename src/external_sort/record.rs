use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How two record values compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    Lexicographic,
    Numeric,
}

impl Default for CompareMode {
    fn default() -> Self {
        CompareMode::Lexicographic
    }
}

/// Outcome of turning a line into a record under a comparison mode.
#[derive(Debug, PartialEq, Eq)]
pub enum ParsedLine {
    Blank,
    Record(Record),
    Malformed,
}

/// A single value travelling through the sort, tagged with the working file
/// it was read from.
#[derive(Debug, Clone)]
pub struct Record {
    pub value: String,
    pub numeric: Option<i64>,
    pub source_file: usize,
}

impl Record {
    pub fn new(value: String, numeric: Option<i64>, source_file: usize) -> Self {
        Self {
            value,
            numeric,
            source_file,
        }
    }

    pub fn parse(line: &str, mode: CompareMode, source_file: usize) -> ParsedLine {
        let value = line.trim_end_matches(['\n', '\r']);
        if value.trim().is_empty() {
            return ParsedLine::Blank;
        }

        match mode {
            CompareMode::Lexicographic => {
                ParsedLine::Record(Self::new(value.to_string(), None, source_file))
            }
            CompareMode::Numeric => match value.trim().parse::<i64>() {
                Ok(number) => {
                    ParsedLine::Record(Self::new(value.to_string(), Some(number), source_file))
                }
                Err(_) => ParsedLine::Malformed,
            },
        }
    }

    /// Compares by value only. Numeric records compare by number, anything
    /// else falls back to the raw text.
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (self.numeric, other.numeric) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.value.cmp(&other.value),
        }
    }

    pub fn estimated_size(&self) -> usize {
        self.value.len() + crate::external_sort::constants::ESTIMATED_RECORD_OVERHEAD_BYTES
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Record {}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Value order, then lowest source file first so equal values leave the
/// merge in a reproducible order.
impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_value(other)
            .then_with(|| self.source_file.cmp(&other.source_file))
    }
}
