//! Scanner: chunk-at-a-time classifier for top-level JSON objects.
//!
//! Why this exists
//! - The backing file may be hundreds of megabytes, so index construction
//!   must not parse it. The scanner walks raw bytes once, in fixed-size
//!   chunks, and reports only the byte range of every top-level object it
//!   finds. All state fits in a few words and survives chunk boundaries, so
//!   the caller is free to pick any chunking.
//!
//! What it does
//! - Tracks quoted-string spans so braces inside string literals are never
//!   counted, and tracks brace nesting depth so only *top-level* objects are
//!   reported. Depth starts at −1: the first unquoted `{` brings it to 0 and
//!   anchors a candidate span; the matching `}` returns it to −1 and yields
//!   the half-open range `[start, position + 1)`.
//!
//! Transition table (byte classes × states):
//!
//! | state       | `"`         | `\`        | `{`       | `}`       | other |
//! |-------------|-------------|------------|-----------|-----------|-------|
//! | `Outside`   | → `InString`| —          | depth += 1| depth −= 1| —     |
//! | `InString`  | → `Outside` | → `Escape` | —         | —         | —     |
//! | `Escape`    | → `InString`| → `InString`| → `InString`| → `InString`| → `InString` |
//!
//! The dedicated `Escape` state is what makes runs of consecutive
//! backslashes classify correctly: `\\"` (escaped backslash, then a real
//! closing quote) leaves the string, while `\"` (escaped quote) does not.
//! A single look-behind-one-byte heuristic gets the even-run case wrong.
//!
//! Invariants
//! - Reported spans are invariant under how the input is split into chunks.
//! - Spans never overlap and are reported in file order.
//! - A stray `}` outside any object is ignored rather than driving the depth
//!   below its resting value.

use core::ops::Range;

/// String-tracking state of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextState {
    /// Between string literals; braces are structural.
    Outside,
    /// Inside a quoted string; braces are literal text.
    InString,
    /// Immediately after a backslash inside a string.
    Escape,
}

/// Byte range of one complete top-level JSON object, as absolute file
/// offsets.
pub type ObjectSpan = Range<u64>;

/// Stateful scanner over the raw bytes of a backing file.
///
/// Feed chunks in file order; each [`feed`] returns an iterator over the
/// spans completed within that chunk. State carries across calls, so an
/// object straddling a chunk boundary is reported by the chunk containing
/// its closing brace.
///
/// [`feed`]: ObjectScanner::feed
#[derive(Debug)]
pub struct ObjectScanner {
    /// Signed nesting depth; −1 between top-level objects.
    depth: i32,
    text: TextState,
    /// Absolute offset of the next byte to classify.
    offset: u64,
    /// Start offset of the open candidate span, if any.
    start: Option<u64>,
}

impl Default for ObjectScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectScanner {
    /// Creates a scanner positioned at offset 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            depth: -1,
            text: TextState::Outside,
            offset: 0,
            start: None,
        }
    }

    /// Total number of bytes classified so far.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Classifies the next chunk, yielding every span it completes.
    ///
    /// The iterator advances the scanner as it is consumed; dropping it
    /// mid-chunk leaves the remaining bytes unclassified.
    pub fn feed<'s, 'c>(&'s mut self, chunk: &'c [u8]) -> SpanIter<'s, 'c> {
        SpanIter {
            scanner: self,
            chunk,
            pos: 0,
        }
    }

    /// Classifies one byte, returning a span when it closes a top-level
    /// object.
    fn step(&mut self, byte: u8) -> Option<ObjectSpan> {
        let at = self.offset;
        self.offset += 1;
        match self.text {
            TextState::Escape => {
                self.text = TextState::InString;
                None
            }
            TextState::InString => {
                match byte {
                    b'\\' => self.text = TextState::Escape,
                    b'"' => self.text = TextState::Outside,
                    _ => {}
                }
                None
            }
            TextState::Outside => match byte {
                b'"' => {
                    self.text = TextState::InString;
                    None
                }
                b'{' => {
                    self.depth += 1;
                    if self.depth == 0 {
                        self.start = Some(at);
                    }
                    None
                }
                b'}' => {
                    // Stray closers outside any object are ignored.
                    if self.depth < 0 {
                        return None;
                    }
                    self.depth -= 1;
                    if self.depth == -1 {
                        return self.start.take().map(|start| start..at + 1);
                    }
                    None
                }
                _ => None,
            },
        }
    }
}

/// Iterator over the spans completed within one chunk.
pub struct SpanIter<'s, 'c> {
    scanner: &'s mut ObjectScanner,
    chunk: &'c [u8],
    pos: usize,
}

impl Iterator for SpanIter<'_, '_> {
    type Item = ObjectSpan;

    fn next(&mut self) -> Option<ObjectSpan> {
        while self.pos < self.chunk.len() {
            let byte = self.chunk[self.pos];
            self.pos += 1;
            if let Some(span) = self.scanner.step(byte) {
                return Some(span);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests;
