//! Pattern buffer with tail-search optimization.
//!
//! Only the last N bytes of the buffer are searched for prompt patterns,
//! rather than the entire output. Register dumps and `show switch` tables
//! stay cheap to scan this way.

use std::ops::Range;

use regex::bytes::Regex;

/// Buffer for accumulating shell output and searching it for patterns.
///
/// Data that follows a match stays in the buffer for the next search,
/// so a prompt that arrives in the same chunk as the previous one is
/// never lost.
#[derive(Debug)]
pub struct PatternBuffer {
    /// The accumulated output buffer.
    buffer: Vec<u8>,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let cleaned = strip_ansi_escapes::strip(data);
        self.buffer.extend_from_slice(&cleaned);
    }

    /// Offset where the searched tail begins.
    fn tail_start(&self) -> usize {
        self.buffer.len().saturating_sub(self.search_depth)
    }

    /// Search the tail of the buffer for the pattern.
    ///
    /// The returned range is relative to the start of the whole buffer.
    pub fn search_tail(&self, pattern: &Regex) -> Option<Range<usize>> {
        let start = self.tail_start();
        pattern
            .find(&self.buffer[start..])
            .map(|m| (start + m.start())..(start + m.end()))
    }

    /// Search the tail for whichever pattern matches earliest.
    ///
    /// Ties go to the pattern listed first. Returns the pattern index and
    /// the absolute match range.
    pub fn search_tail_any(&self, patterns: &[&Regex]) -> Option<(usize, Range<usize>)> {
        patterns
            .iter()
            .enumerate()
            .filter_map(|(index, pattern)| self.search_tail(pattern).map(|range| (index, range)))
            .min_by_key(|(index, range)| (range.start, *index))
    }

    /// Split off everything up to the end of `range`.
    ///
    /// Returns `(before, matched)`; bytes after the match are kept.
    pub fn consume_through(&mut self, range: Range<usize>) -> (Vec<u8>, Vec<u8>) {
        let mut consumed: Vec<u8> = self.buffer.drain(..range.end).collect();
        let matched = consumed.split_off(range.start);
        (consumed, matched)
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
