use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Failures surfaced by index and changelog operations.
///
/// Scan anomalies during index build are deliberately *not* represented here:
/// they are recovered locally, logged, and counted, and the build continues.
#[derive(Debug, Error)]
pub enum Error {
    /// A single read request was wider than the configured window budget.
    ///
    /// Fatal for that read only; the window state is left untouched.
    #[error("read of {requested} bytes exceeds the window budget of {budget}")]
    BudgetExceeded {
        /// Width of the rejected request in bytes.
        requested: u64,
        /// Configured window budget in bytes.
        budget: u64,
    },

    /// A byte range does not lie inside the region it is tagged with.
    ///
    /// Indicates a corrupt location; reads are rejected rather than clamped.
    #[error("byte range {start}..{end} lies outside the {region} region")]
    OutOfBounds {
        /// Start of the offending range.
        start: u64,
        /// End of the offending range.
        end: u64,
        /// Region the range was resolved against.
        region: &'static str,
    },

    /// Open or read failure on the backing file.
    #[error("backing file i/o failed")]
    Io(#[from] std::io::Error),

    /// The key matcher pattern failed to compile.
    #[error("invalid key matcher")]
    Pattern(#[from] regex::Error),

    /// A stored record failed to serialize or to parse back on retrieval.
    #[error("record (de)serialization failed")]
    Record(#[from] serde_json::Error),

    /// Structural diff computation or application failed for one item pair.
    ///
    /// Surfaced per item; does not abort the run for other items.
    #[error("structural diff failed: {reason}")]
    Diff {
        /// Human-readable cause.
        reason: String,
    },

    /// The delta sink rejected a record.
    #[error("delta sink failure")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}
