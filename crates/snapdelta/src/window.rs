//! Range buffer: a single-window read-through cache over the backing file.
//!
//! Holds exactly one active window of at most `budget` bytes. A request that
//! falls outside the window triggers one positioned read starting at the
//! requested offset; because the index is built and mostly consumed in file
//! order, sequential access amortizes to O(1) refills. The window is a cache,
//! never the only copy of any byte range.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use tracing::trace;

use crate::error::{Error, Result};
use crate::scanner::ObjectSpan;

/// One mutable window `[start, start + budget)` over the backing file.
#[derive(Debug)]
pub(crate) struct RangeBuffer {
    /// Absolute offset of the first cached byte.
    start: u64,
    /// Absolute offset one past the last cached byte.
    end: u64,
    data: Vec<u8>,
    budget: usize,
    refills: u64,
}

impl RangeBuffer {
    /// Creates an empty buffer; the first read always refills.
    pub fn new(budget: usize) -> Self {
        Self {
            start: 0,
            end: 0,
            data: Vec::new(),
            budget,
            refills: 0,
        }
    }

    /// Number of positioned reads performed so far.
    pub fn refills(&self) -> u64 {
        self.refills
    }

    /// Current window bounds, for state-preservation assertions.
    #[cfg(test)]
    pub fn bounds(&self) -> (u64, u64) {
        (self.start, self.end)
    }

    /// Returns the raw bytes for `[range.start, range.end)`.
    ///
    /// Requests wider than the budget or past `file_len` are rejected before
    /// any window state changes. A request starting inside the window but
    /// ending past it refills like any other miss; serving a shorter slice
    /// than asked for is never an option.
    pub fn read(&mut self, file: &mut File, range: ObjectSpan, file_len: u64) -> Result<&[u8]> {
        let len = range.end.saturating_sub(range.start);
        if len > self.budget as u64 {
            return Err(Error::BudgetExceeded {
                requested: len,
                budget: self.budget as u64,
            });
        }
        if range.end > file_len || range.end < range.start {
            return Err(Error::OutOfBounds {
                start: range.start,
                end: range.end,
                region: "backing file",
            });
        }
        if range.start < self.start || range.start > self.end || range.end > self.end {
            self.refill(file, range.start, file_len)?;
        }
        let lo = usize::try_from(range.start - self.start).expect("window fits in memory");
        Ok(&self.data[lo..lo + len as usize])
    }

    /// One positioned read of up to `budget` bytes starting at `start`.
    fn refill(&mut self, file: &mut File, start: u64, file_len: u64) -> Result<()> {
        let len = usize::try_from((file_len - start).min(self.budget as u64))
            .expect("window fits in memory");
        self.data.resize(len, 0);
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(&mut self.data)?;
        self.start = start;
        self.end = start + len as u64;
        self.refills += 1;
        trace!(start, len, refills = self.refills, "window refill");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn backing(bytes: &[u8]) -> (tempfile::NamedTempFile, File, u64) {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(bytes).unwrap();
        tmp.flush().unwrap();
        let file = tmp.reopen().unwrap();
        (tmp, file, bytes.len() as u64)
    }

    #[test]
    fn reads_within_one_window_share_a_refill() {
        let (_tmp, mut file, len) = backing(b"0123456789abcdef");
        let mut window = RangeBuffer::new(8);
        assert_eq!(window.read(&mut file, 0..4, len).unwrap(), b"0123");
        assert_eq!(window.refills(), 1);
        assert_eq!(window.read(&mut file, 4..8, len).unwrap(), b"4567");
        assert_eq!(window.refills(), 1);
    }

    #[test]
    fn miss_past_window_refills_once() {
        let (_tmp, mut file, len) = backing(b"0123456789abcdef");
        let mut window = RangeBuffer::new(8);
        let _ = window.read(&mut file, 0..4, len).unwrap();
        assert_eq!(window.read(&mut file, 10..14, len).unwrap(), b"abcd");
        assert_eq!(window.refills(), 2);
    }

    #[test]
    fn start_inside_end_outside_refills() {
        // The naive bounds check misses this case; it must refill, not
        // truncate.
        let (_tmp, mut file, len) = backing(b"0123456789abcdef");
        let mut window = RangeBuffer::new(8);
        let _ = window.read(&mut file, 0..2, len).unwrap();
        assert_eq!(window.bounds(), (0, 8));
        assert_eq!(window.read(&mut file, 6..12, len).unwrap(), b"6789ab");
        assert_eq!(window.refills(), 2);
        assert_eq!(window.bounds(), (6, 14));
    }

    #[test]
    fn over_budget_fails_and_preserves_state() {
        let (_tmp, mut file, len) = backing(b"0123456789abcdef");
        let mut window = RangeBuffer::new(8);
        let _ = window.read(&mut file, 0..4, len).unwrap();
        let before = window.bounds();
        let err = window.read(&mut file, 0..9, len).unwrap_err();
        assert!(matches!(
            err,
            Error::BudgetExceeded {
                requested: 9,
                budget: 8
            }
        ));
        assert_eq!(window.bounds(), before);
        assert_eq!(window.refills(), 1);
        // The buffer stays usable afterwards.
        assert_eq!(window.read(&mut file, 0..4, len).unwrap(), b"0123");
    }

    #[test]
    fn read_past_end_of_file_is_rejected() {
        let (_tmp, mut file, len) = backing(b"0123");
        let mut window = RangeBuffer::new(8);
        let err = window.read(&mut file, 2..6, len).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { .. }));
        assert_eq!(window.refills(), 0);
    }

    #[test]
    fn refill_near_end_of_file_is_clamped() {
        let (_tmp, mut file, len) = backing(b"0123456789");
        let mut window = RangeBuffer::new(8);
        assert_eq!(window.read(&mut file, 6..10, len).unwrap(), b"6789");
        assert_eq!(window.bounds(), (6, 10));
    }
}
