/// Configuration for opening a [`SnapshotIndex`].
///
/// # Examples
///
/// ```rust
/// use snapdelta::IndexOptions;
///
/// let options = IndexOptions {
///     key_field: "url".to_string(),
///     buffer_size: 1024 * 1024,
///     ..Default::default()
/// };
/// ```
///
/// [`SnapshotIndex`]: crate::SnapshotIndex
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Name of the field whose literal value keys the index.
    ///
    /// # Default
    ///
    /// `"key"`
    pub key_field: String,

    /// Pattern used to extract the key field's literal value from a candidate
    /// object's raw text, without a full parse. Must contain exactly one
    /// capture group covering the value.
    ///
    /// When `None`, a pattern is derived from [`key_field`]: the quoted field
    /// name, a colon, and a quoted literal whose interior is captured
    /// verbatim (escape sequences are not decoded).
    ///
    /// # Default
    ///
    /// `None`
    ///
    /// [`key_field`]: IndexOptions::key_field
    pub key_matcher: Option<regex::bytes::Regex>,

    /// Read window size in bytes. Any single record retrieval must fit within
    /// this budget or it fails with [`Error::BudgetExceeded`].
    ///
    /// # Default
    ///
    /// 50 MiB
    ///
    /// [`Error::BudgetExceeded`]: crate::Error::BudgetExceeded
    pub buffer_size: usize,

    /// Chunk size for the initial scan pass, in bytes. Larger chunks mean
    /// fewer reads; the scanner itself keeps no per-chunk state beyond a few
    /// words, so this only bounds transient memory during build.
    ///
    /// # Default
    ///
    /// 16 MiB
    pub chunk_size: usize,
}

/// Default read window budget: 50 MiB.
pub const DEFAULT_BUFFER_SIZE: usize = 50 * 1024 * 1024;

/// Default scan chunk size: 16 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024 * 1024;

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            key_field: "key".to_string(),
            key_matcher: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Configuration for a [`DeltaWriter`].
///
/// [`DeltaWriter`]: crate::DeltaWriter
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangelogOptions {
    /// Whether a known, unchanged item still advances its key's latest-value
    /// pointer by being re-registered in the append log.
    ///
    /// With `false`, an unchanged classification leaves the index untouched:
    /// repeated identical stores are no-ops and the latest value stays
    /// whatever the last add or change recorded. With `true`, every store
    /// re-registers the incoming item, so "latest" always reflects the most
    /// recent sighting at the cost of append-log growth.
    ///
    /// # Default
    ///
    /// `false`
    pub record_unchanged: bool,
}
