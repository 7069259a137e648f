//! Append log: in-memory byte log for records added during the current run.
//!
//! Records that do not exist in the backing file live here; the index stores
//! their locations with the append-log region tag. The first byte is a
//! reserved sentinel so offset 0 never denotes real data.

use crate::error::{Error, Result};
use crate::scanner::ObjectSpan;

/// A monotonically growing byte log.
#[derive(Debug)]
pub(crate) struct AppendLog {
    data: Vec<u8>,
}

impl AppendLog {
    /// Creates a log holding only the reserved sentinel byte.
    pub fn new() -> Self {
        Self { data: vec![0] }
    }

    /// Current length in bytes, including the sentinel.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Writes `bytes` to the end of the log, returning their range.
    pub fn append(&mut self, bytes: &[u8]) -> ObjectSpan {
        let start = self.data.len() as u64;
        self.data.extend_from_slice(bytes);
        start..self.data.len() as u64
    }

    /// Slices the log directly; no file I/O. Ranges that touch the sentinel
    /// or run past the end are rejected, never clamped.
    pub fn read(&self, range: ObjectSpan) -> Result<&[u8]> {
        if range.start < 1 || range.end < range.start || range.end > self.len() {
            return Err(Error::OutOfBounds {
                start: range.start,
                end: range.end,
                region: "append log",
            });
        }
        Ok(&self.data[range.start as usize..range.end as usize])
    }
}
