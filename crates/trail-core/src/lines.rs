//! Turns an ordered stream of byte chunks into complete lines.
//!
//! Chunks may end anywhere: mid-line, mid-CRLF, even in the middle of a
//! multi-byte UTF-8 sequence. The splitter buffers the unterminated tail and
//! only yields a line once its `\n` has arrived (or on [`LineSplitter::finish`]
//! at end of stream).
//!
//! ```
//! use trail_core::LineSplitter;
//!
//! let mut splitter = LineSplitter::new();
//! let mut lines = Vec::new();
//! for chunk in ["ab", "c\nde", "f\n"] {
//!     lines.extend(splitter.push(chunk.as_bytes()));
//! }
//! assert_eq!(lines, ["abc", "def"]);
//! ```

use bytes::BytesMut;

/// Incremental newline splitter. One instance per stream; state persists
/// across [`push`](Self::push) calls.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buf: BytesMut,
    /// Length of the prefix of `buf` already searched without finding `\n`.
    scanned: usize,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return a lazy iterator over the lines it completes.
    ///
    /// Lines are yielded in newline order with `\n` (and a preceding `\r`)
    /// stripped. Lines left unconsumed when the iterator is dropped stay
    /// buffered and come out of the next `push`.
    pub fn push(&mut self, chunk: &[u8]) -> Lines<'_> {
        self.buf.extend_from_slice(chunk);
        Lines {
            splitter: self,
            flush: false,
        }
    }

    /// Signal end of stream. Yields any complete lines still buffered, then
    /// the unterminated remainder (if non-empty) as the final line.
    pub fn finish(&mut self) -> Lines<'_> {
        Lines {
            splitter: self,
            flush: true,
        }
    }

    /// Bytes currently withheld (the trailing partial line plus any complete
    /// lines not yet pulled from a [`Lines`] iterator).
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    /// Discard everything buffered. Returns the number of bytes dropped.
    pub fn reset(&mut self) -> usize {
        let dropped = self.buf.len();
        self.buf.clear();
        self.scanned = 0;
        dropped
    }

    fn next_line(&mut self) -> Option<String> {
        match self.buf[self.scanned..].iter().position(|&b| b == b'\n') {
            Some(i) => {
                let end = self.scanned + i;
                let mut line = self.buf.split_to(end + 1);
                line.truncate(end);
                self.scanned = 0;
                Some(decode(&line))
            }
            None => {
                self.scanned = self.buf.len();
                None
            }
        }
    }
}

/// Iterator returned by [`LineSplitter::push`].
#[must_use = "lines are produced lazily; iterate to drain them"]
#[derive(Debug)]
pub struct Lines<'a> {
    splitter: &'a mut LineSplitter,
    /// End of stream: the remainder counts as a line.
    flush: bool,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if let Some(line) = self.splitter.next_line() {
            return Some(line);
        }
        if !self.flush || self.splitter.buf.is_empty() {
            return None;
        }
        self.splitter.scanned = 0;
        let rest = self.splitter.buf.split();
        Some(decode(&rest))
    }
}

fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn feed(splitter: &mut LineSplitter, chunks: &[&[u8]]) -> Vec<String> {
        chunks
            .iter()
            .flat_map(|chunk| splitter.push(chunk).collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn joins_lines_across_chunks() {
        let mut splitter = LineSplitter::new();
        let lines = feed(&mut splitter, &[b"ab", b"c\nde", b"f\n"]);
        assert_eq!(lines, ["abc", "def"]);
        assert_eq!(splitter.pending_len(), 0);
        assert_eq!(splitter.finish().next(), None);
    }

    #[test]
    fn withholds_partial_line_until_newline() {
        let mut splitter = LineSplitter::new();
        assert!(feed(&mut splitter, &[b"{\"a\":"]).is_empty());
        assert_eq!(splitter.pending_len(), 5);
        assert_eq!(feed(&mut splitter, &[b"1}\n"]), ["{\"a\":1}"]);
    }

    #[test]
    fn many_lines_in_one_chunk() {
        let mut splitter = LineSplitter::new();
        assert_eq!(feed(&mut splitter, &[b"a\nb\n\nc\n"]), ["a", "b", "", "c"]);
    }

    #[test]
    fn strips_crlf_even_when_split() {
        let mut splitter = LineSplitter::new();
        assert_eq!(feed(&mut splitter, &[b"one\r", b"\ntwo\r\n"]), ["one", "two"]);
    }

    #[test]
    fn multibyte_sequence_split_across_chunks() {
        let text = "héllo\n".as_bytes();
        let mut splitter = LineSplitter::new();
        let lines = feed(&mut splitter, &[&text[..2], &text[2..]]);
        assert_eq!(lines, ["héllo"]);
    }

    #[test]
    fn finish_flushes_remainder_once() {
        let mut splitter = LineSplitter::new();
        assert_eq!(feed(&mut splitter, &[b"a\ntail"]), ["a"]);
        assert_eq!(splitter.finish().collect::<Vec<_>>(), ["tail"]);
        assert_eq!(splitter.finish().next(), None);
    }

    #[test]
    fn partially_consumed_iterator_loses_nothing() {
        let mut splitter = LineSplitter::new();
        let first = splitter.push(b"a\nb\nc").next();
        assert_eq!(first.as_deref(), Some("a"));
        let rest: Vec<_> = splitter.push(b"\n").collect();
        assert_eq!(rest, ["b", "c"]);
    }

    #[test]
    fn finish_keeps_unpulled_lines_separate() {
        let mut splitter = LineSplitter::new();
        let first = splitter.push(b"a\nb\r\nc").next();
        assert_eq!(first.as_deref(), Some("a"));
        assert_eq!(splitter.finish().collect::<Vec<_>>(), ["b", "c"]);
        assert_eq!(splitter.pending_len(), 0);
    }

    #[test]
    fn reset_discards_partial_line() {
        let mut splitter = LineSplitter::new();
        assert!(feed(&mut splitter, &[b"stale"]).is_empty());
        assert_eq!(splitter.reset(), 5);
        assert_eq!(feed(&mut splitter, &[b"fresh\n"]), ["fresh"]);
    }

    #[test]
    fn invalid_utf8_is_lossy() {
        let mut splitter = LineSplitter::new();
        let lines = feed(&mut splitter, &[b"a\xffb\n"]);
        assert_eq!(lines, ["a\u{fffd}b"]);
    }

    proptest! {
        /// Chunk boundaries never change the line sequence.
        #[test]
        fn prop_chunking_is_transparent(
            text in "[a-z{}\":\n]{0,200}",
            cuts in proptest::collection::vec(0usize..200, 0..12),
        ) {
            let bytes = text.as_bytes();
            let mut cuts: Vec<usize> = cuts.into_iter().map(|c| c.min(bytes.len())).collect();
            cuts.sort_unstable();

            let mut splitter = LineSplitter::new();
            let mut got = Vec::new();
            let mut start = 0;
            for cut in cuts.into_iter().chain(std::iter::once(bytes.len())) {
                got.extend(splitter.push(&bytes[start..cut]));
                start = cut;
            }
            got.extend(splitter.finish());

            let mut expected: Vec<String> = text.split('\n').map(str::to_string).collect();
            if expected.last().is_some_and(|last| last.is_empty()) {
                expected.pop();
            }
            prop_assert_eq!(got, expected);
        }
    }
}
