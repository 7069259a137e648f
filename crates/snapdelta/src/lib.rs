//! Streaming index and changelog generation over large JSON snapshot files.
//!
//! A snapshot file is one JSON array of records produced by a previous
//! ingestion run, terminated by a sentinel object. [`SnapshotIndex`] scans it
//! once — chunk at a time, without parsing — to map each record's business
//! key to its byte range, then materializes records lazily through a single
//! bounded read window. [`DeltaWriter`] classifies each newly ingested record
//! against the index as added, changed, or unchanged, and emits Add/Change
//! records with structural diffs through a pluggable sink.
//!
//! # Examples
//!
//! ```rust
//! use std::io::Write;
//!
//! use serde_json::json;
//! use snapdelta::{
//!     ChangelogOptions, DeltaWriter, IndexOptions, LatestValueDetector, MemorySink,
//!     SnapshotIndex,
//! };
//!
//! let mut snapshot = tempfile::NamedTempFile::new()?;
//! write!(snapshot, r#"[{{"key":"A","v":1}},{{"done":true}}]"#)?;
//!
//! let index = SnapshotIndex::open(snapshot.path(), IndexOptions::default())?;
//! let mut writer = DeltaWriter::new(
//!     index,
//!     LatestValueDetector,
//!     MemorySink::new(),
//!     ChangelogOptions::default(),
//! );
//! writer.load()?;
//!
//! writer.store("A", json!({"key":"A","v":2}))?; // change
//! writer.store("B", json!({"key":"B","v":1}))?; // add
//! assert_eq!(writer.sink().records().len(), 2);
//! writer.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod append;
mod error;
mod window;

mod changelog;
mod diff;
mod index;
mod options;
mod scanner;
mod sink;

pub use changelog::{ChangeDetector, Classification, Delta, DeltaWriter, LatestValueDetector};
pub use diff::{Patch, PatchOp, Segment, apply, diff};
pub use error::{Error, Result};
pub use index::{Location, SnapshotIndex};
pub use options::{ChangelogOptions, DEFAULT_BUFFER_SIZE, DEFAULT_CHUNK_SIZE, IndexOptions};
pub use scanner::{ObjectScanner, ObjectSpan, SpanIter};
pub use sink::{DeltaSink, JsonLinesSink, MemorySink};
