//! Changelog generator: classifies incoming records against the index.
//!
//! For each incoming item, [`DeltaWriter::store`] decides whether the item is
//! new, changed, or unchanged relative to what the index knows, registers it
//! where required, and emits at most one delta record through the sink. The
//! change decision and the canonical ordering of same-key records belong to
//! the caller via [`ChangeDetector`]; this module supplies only the machinery
//! around them.

use std::cmp::Ordering;

use serde_json::{Value, json};
use tracing::trace;

use crate::diff::{self, Patch};
use crate::error::Result;
use crate::index::SnapshotIndex;
use crate::options::ChangelogOptions;
use crate::sink::DeltaSink;

/// One emitted changelog record.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    /// A key never seen before; carries the new item.
    Add {
        /// The newly ingested item.
        item: Value,
    },
    /// A known key whose value changed; carries the *old* value plus the
    /// patch that transforms it into the new one, so a consumer can replay
    /// history forward.
    Change {
        /// The previous latest value.
        item: Value,
        /// Patch turning `item` into the new value.
        delta: Patch,
    },
}

impl Delta {
    /// Serializes to the wire shape:
    ///
    /// ```json
    /// { "id": <key>, "type": "add",    "item": <object> }
    /// { "id": <key>, "type": "change", "item": <old object>, "delta": <patch> }
    /// ```
    ///
    /// # Errors
    ///
    /// Fails only if the patch cannot be serialized.
    pub fn to_record(&self, id: &str) -> Result<Value> {
        Ok(match self {
            Self::Add { item } => json!({ "id": id, "type": "add", "item": item }),
            Self::Change { item, delta } => json!({
                "id": id,
                "type": "change",
                "item": item,
                "delta": serde_json::to_value(delta)?,
            }),
        })
    }
}

/// How [`DeltaWriter::store`] classified an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Unknown key; an Add record was emitted.
    Added,
    /// Known key, detector reported a change; a Change record was emitted.
    Changed,
    /// Known key, no change; nothing was emitted.
    Unchanged,
}

/// Caller-supplied change policy.
///
/// `changed` sees every record the index holds for the key, ordered, and the
/// incoming item. `compare`, when supplied, imposes a canonical ordering on
/// same-key records before `changed` sees them and before the latest value is
/// chosen; without it, discovery order is used. `diff` may be overridden when
/// the caller wants a different patch shape than the crate's structural diff.
pub trait ChangeDetector {
    /// Whether `incoming` differs from what `existing` already records.
    fn changed(&self, existing: &[Value], incoming: &Value) -> bool;

    /// Optional canonical ordering of same-key records.
    fn compare(&self, _a: &Value, _b: &Value) -> Option<Ordering> {
        None
    }

    /// Patch turning `old` into `new`.
    ///
    /// # Errors
    ///
    /// Surfaced per item as [`Error::Diff`]; other items are unaffected.
    ///
    /// [`Error::Diff`]: crate::Error::Diff
    fn diff(&self, old: &Value, new: &Value) -> Result<Patch> {
        Ok(diff::diff(old, new))
    }
}

/// Detector that reports a change whenever the incoming item differs from
/// the latest recorded value.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatestValueDetector;

impl ChangeDetector for LatestValueDetector {
    fn changed(&self, existing: &[Value], incoming: &Value) -> bool {
        existing.last() != Some(incoming)
    }
}

/// Classifies incoming records and writes Add/Change entries to a sink.
///
/// Takes `&mut self` for every classification, so `has`/`get`/`add` for one
/// key are naturally non-interleaved for a single writer; no internal
/// locking exists, and callers needing cross-thread access must serialize
/// externally.
#[derive(Debug)]
pub struct DeltaWriter<D, S> {
    index: SnapshotIndex,
    detector: D,
    sink: S,
    record_unchanged: bool,
}

impl<D: ChangeDetector, S: DeltaSink> DeltaWriter<D, S> {
    /// Wraps an opened index, a change detector and a sink.
    pub fn new(index: SnapshotIndex, detector: D, sink: S, options: ChangelogOptions) -> Self {
        Self {
            index,
            detector,
            sink,
            record_unchanged: options.record_unchanged,
        }
    }

    /// Builds the index from the backing file. Must complete before any
    /// [`store`] call is meaningful.
    ///
    /// # Errors
    ///
    /// I/O failures from the scan pass.
    ///
    /// [`store`]: DeltaWriter::store
    pub fn load(&mut self) -> Result<()> {
        self.index.build()
    }

    /// Classifies `item` under `key`, records it as needed, and emits at
    /// most one delta record.
    ///
    /// # Errors
    ///
    /// Lookup, diff and sink failures are surfaced per item; the writer
    /// stays usable and retry-or-skip policy is the caller's.
    pub fn store(&mut self, key: &str, item: Value) -> Result<Classification> {
        if !self.index.has(key) {
            return self.record_add(key, item);
        }
        let Some(mut existing) = self.index.get(key)? else {
            return self.record_add(key, item);
        };
        existing.sort_by(|a, b| self.detector.compare(a, b).unwrap_or(Ordering::Equal));

        if !self.detector.changed(&existing, &item) {
            trace!(key, "unchanged");
            if self.record_unchanged {
                self.index.add(key, &item)?;
            }
            return Ok(Classification::Unchanged);
        }
        let Some(previous) = existing.pop() else {
            return self.record_add(key, item);
        };
        let patch = self.detector.diff(&previous, &item)?;
        self.index.add(key, &item)?;
        trace!(key, ops = patch.len(), "changed");
        self.sink.store(
            key,
            &Delta::Change {
                item: previous,
                delta: patch,
            },
        )?;
        Ok(Classification::Changed)
    }

    fn record_add(&mut self, key: &str, item: Value) -> Result<Classification> {
        self.index.add(key, &item)?;
        trace!(key, "added");
        self.sink.store(key, &Delta::Add { item })?;
        Ok(Classification::Added)
    }

    /// Estimated index memory footprint; see [`SnapshotIndex::size`].
    #[must_use]
    pub fn size(&self) -> usize {
        self.index.size()
    }

    /// The underlying index, for lookups beside classification.
    pub fn index_mut(&mut self) -> &mut SnapshotIndex {
        &mut self.index
    }

    /// The sink, for inspection.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Closes the index and then the sink. Consuming; exactly once.
    ///
    /// # Errors
    ///
    /// Surfaces sink flush failures.
    pub fn close(mut self) -> Result<()> {
        self.index.close()?;
        self.sink.close()
    }
}
