//! Index: locates records inside the backing file without loading it.
//!
//! Why this exists
//! - The backing file is an append-oriented JSON-array snapshot that may be
//!   far larger than memory. The index maps a business key to the byte
//!   ranges of every record seen for that key, and materializes a record
//!   only when it is actually read.
//!
//! What it does
//! - [`build`] runs the scanner over the whole file once, registering every
//!   top-level object whose raw text matches the key pattern. Retrieval goes
//!   through the single-window [`RangeBuffer`] for file-resident records and
//!   through the [`AppendLog`] for records added during the current run; the
//!   two address spaces are kept apart by the [`Location`] region tag rather
//!   than by offset sign.
//!
//! Invariants
//! - A key's location list is append-only: discovery order during the scan,
//!   then run order, never reordered or truncated. The last element is the
//!   key's latest known value.
//! - Every location lies entirely inside exactly one region.
//! - Data crossing the index boundary is parsed into owned values; callers
//!   never see aliased buffer slices.
//!
//! [`build`]: SnapshotIndex::build
//! [`RangeBuffer`]: crate::window::RangeBuffer
//! [`AppendLog`]: crate::append::AppendLog

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use bstr::ByteSlice;
use regex::bytes::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::append::AppendLog;
use crate::error::{Error, Result};
use crate::options::IndexOptions;
use crate::scanner::{ObjectScanner, ObjectSpan};
use crate::window::RangeBuffer;

/// Fixed per-entry bookkeeping cost, in bytes, used by the size estimate.
const ENTRY_COST: usize = 96;

/// Where a record's bytes live.
///
/// The two address spaces — backing file and append log — are disjoint; a
/// range never spans both. The original encoded the region in the offset
/// sign; the tag makes it explicit and removes the offset-zero ambiguity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A record found in the backing file during the initial scan.
    File {
        /// First byte of the record.
        start: u64,
        /// One past the last byte.
        end: u64,
    },
    /// A record added to the in-memory append log during this run.
    Appended {
        /// First byte of the record (never 0; that offset is reserved).
        start: u64,
        /// One past the last byte.
        end: u64,
    },
}

/// Index over one backing file plus this run's append log.
///
/// Owns the backing file handle, the read window and the append log as one
/// aggregate; all three are created together by [`open`] and released
/// together by the consuming [`close`], so double-close and use-after-close
/// are rejected by move semantics.
///
/// [`open`]: SnapshotIndex::open
/// [`close`]: SnapshotIndex::close
#[derive(Debug)]
pub struct SnapshotIndex {
    file: File,
    file_len: u64,
    window: RangeBuffer,
    log: AppendLog,
    entries: HashMap<String, Vec<Location>>,
    /// Total number of registered locations across all keys.
    registered: usize,
    anomalies: u64,
    matcher: Regex,
    /// Quoted key-field name; a span lacking it is skipped silently.
    needle: Vec<u8>,
    chunk_size: usize,
}

impl SnapshotIndex {
    /// Opens the backing file and prepares an empty index.
    ///
    /// No scanning happens here; call [`build`] before any retrieval.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or the derived key pattern does
    /// not compile.
    ///
    /// [`build`]: SnapshotIndex::build
    pub fn open(path: impl AsRef<Path>, options: IndexOptions) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let matcher = match options.key_matcher {
            Some(matcher) => matcher,
            None => Regex::new(&format!(
                r#""{}"\s*:\s*"([^"]*)""#,
                regex::escape(&options.key_field)
            ))?,
        };
        Ok(Self {
            file,
            file_len,
            window: RangeBuffer::new(options.buffer_size),
            log: AppendLog::new(),
            entries: HashMap::new(),
            registered: 0,
            anomalies: 0,
            matcher,
            needle: format!("\"{}\"", options.key_field).into_bytes(),
            chunk_size: options.chunk_size,
        })
    }

    /// Scans the whole backing file once, populating the index.
    ///
    /// One blocking batch pass in file order, O(file size); there is no
    /// resume from a partial build. Malformed candidate spans are logged and
    /// skipped; see [`anomalies`].
    ///
    /// # Errors
    ///
    /// Fails on I/O errors only; anything span-local is non-fatal.
    ///
    /// [`anomalies`]: SnapshotIndex::anomalies
    pub fn build(&mut self) -> Result<()> {
        debug!(file_len = self.file_len, "indexing backing file");
        let mut scanner = ObjectScanner::new();
        let mut chunk = vec![0u8; self.chunk_size.max(1)];
        let mut pos = 0u64;
        while pos < self.file_len {
            let take = usize::try_from((self.file_len - pos).min(chunk.len() as u64))
                .expect("chunk fits in memory");
            self.file.seek(SeekFrom::Start(pos))?;
            self.file.read_exact(&mut chunk[..take])?;
            // Collected eagerly: registration reuses the file handle for
            // window reads, which must not interleave with the chunk cursor.
            let spans: Vec<ObjectSpan> = scanner.feed(&chunk[..take]).collect();
            for span in spans {
                self.register(span)?;
            }
            pos += take as u64;
        }
        debug!(
            keys = self.entries.len(),
            entries = self.registered,
            anomalies = self.anomalies,
            "index built"
        );
        Ok(())
    }

    /// Registers one candidate span found by the scanner.
    fn register(&mut self, span: ObjectSpan) -> Result<()> {
        let bytes = match self.window.read(&mut self.file, span.clone(), self.file_len) {
            Ok(bytes) => bytes,
            Err(Error::BudgetExceeded { requested, budget }) => {
                warn!(
                    start = span.start,
                    end = span.end,
                    requested,
                    budget,
                    "candidate span exceeds read budget; skipped"
                );
                self.anomalies += 1;
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        if bytes.find(&self.needle).is_none() {
            // No key field at all (e.g. the trailing sentinel object).
            return Ok(());
        }
        let Some(key) = self
            .matcher
            .captures(bytes)
            .and_then(|caps| caps.get(1))
            .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
        else {
            warn!(
                start = span.start,
                end = span.end,
                "key field present but pattern did not match; span skipped"
            );
            self.anomalies += 1;
            return Ok(());
        };
        self.entries.entry(key).or_default().push(Location::File {
            start: span.start,
            end: span.end,
        });
        self.registered += 1;
        Ok(())
    }

    /// Whether any record is registered under `key`. O(1).
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Resolves and parses every record registered under `key`, oldest
    /// first.
    ///
    /// Parsing is lazy: bytes are fetched through the read window or the
    /// append log only here, and returned as owned values.
    ///
    /// # Errors
    ///
    /// [`Error::BudgetExceeded`] when a record is wider than the window
    /// budget, [`Error::Record`] when stored bytes fail to parse, or an I/O
    /// error from a window refill. A failed read leaves the index usable.
    pub fn get(&mut self, key: &str) -> Result<Option<Vec<Value>>> {
        let Some(locations) = self.entries.get(key) else {
            return Ok(None);
        };
        let mut records = Vec::with_capacity(locations.len());
        for location in locations {
            let bytes = match *location {
                Location::File { start, end } => {
                    self.window.read(&mut self.file, start..end, self.file_len)?
                }
                Location::Appended { start, end } => self.log.read(start..end)?,
            };
            records.push(serde_json::from_slice(bytes)?);
        }
        Ok(Some(records))
    }

    /// Serializes `item` into the append log and registers it under `key`.
    ///
    /// # Errors
    ///
    /// Fails only if `item` cannot be serialized.
    pub fn add(&mut self, key: &str, item: &Value) -> Result<()> {
        let bytes = serde_json::to_vec(item)?;
        let span = self.log.append(&bytes);
        self.entries
            .entry(key.to_string())
            .or_default()
            .push(Location::Appended {
                start: span.start,
                end: span.end,
            });
        self.registered += 1;
        Ok(())
    }

    /// Estimated index memory footprint: registered entries times a fixed
    /// per-entry cost. An estimate, not a measurement.
    #[must_use]
    pub fn size(&self) -> usize {
        self.registered * ENTRY_COST
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of candidate spans skipped during [`build`].
    ///
    /// [`build`]: SnapshotIndex::build
    #[must_use]
    pub fn anomalies(&self) -> u64 {
        self.anomalies
    }

    /// Number of positioned reads the window has performed.
    #[must_use]
    pub fn refills(&self) -> u64 {
        self.window.refills()
    }

    /// Releases the backing file handle, the window and the append log.
    ///
    /// Consuming: a closed index cannot be used again.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature leaves room for a sync step.
    pub fn close(self) -> Result<()> {
        debug!(
            keys = self.entries.len(),
            appended = self.log.len(),
            "closing index"
        );
        drop(self.file);
        Ok(())
    }
}
