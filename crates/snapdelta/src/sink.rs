//! Delta sinks: where classified change records go.

use std::io::Write;

use serde_json::Value;

use crate::changelog::Delta;
use crate::error::Result;

/// Receives delta records keyed by id.
///
/// Implementations should persist records in the order received; the writer
/// emits at most one record per classified item and performs no retries.
pub trait DeltaSink {
    /// Persists one delta record under `id`.
    ///
    /// # Errors
    ///
    /// Implementation-defined; surfaced unchanged through the writer.
    fn store(&mut self, id: &str, delta: &Delta) -> Result<()>;

    /// Flushes and releases the sink. Called once, by the writer's `close`.
    ///
    /// # Errors
    ///
    /// Implementation-defined.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Vec-backed sink for tests and small runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<(String, Delta)>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records received so far, in arrival order.
    #[must_use]
    pub fn records(&self) -> &[(String, Delta)] {
        &self.records
    }
}

impl DeltaSink for MemorySink {
    fn store(&mut self, id: &str, delta: &Delta) -> Result<()> {
        self.records.push((id.to_string(), delta.clone()));
        Ok(())
    }
}

/// Writes one JSON record per line to any [`Write`] target.
///
/// Each line is the wire shape produced by [`Delta::to_record`]:
///
/// ```json
/// { "id": "A", "type": "change", "item": {...}, "delta": [...] }
/// ```
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wraps a write target.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Borrows the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

impl<W: Write> DeltaSink for JsonLinesSink<W> {
    fn store(&mut self, id: &str, delta: &Delta) -> Result<()> {
        let record: Value = delta.to_record(id)?;
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
