//! Delimiter-based framing over an accumulating byte buffer.

use bytes::{Buf, Bytes, BytesMut};

use crate::client::StreamError;

/// Splits an arbitrarily fragmented byte stream into delimiter-bound frames.
///
/// Bytes that do not yet form a complete frame stay buffered until the next
/// [`feed`](FrameSplitter::feed) or the final [`flush`](FrameSplitter::flush).
/// Matching is done on raw bytes, so a multi-byte character split across two
/// chunks is reassembled before any frame is cut.
#[derive(Debug)]
pub struct FrameSplitter {
    delimiter: Vec<u8>,
    buffer: BytesMut,
    /// Buffer offset before which no delimiter can start.
    scanned: usize,
}

impl FrameSplitter {
    /// Create a splitter. An empty delimiter is rejected.
    pub fn new(delimiter: &str) -> Result<Self, StreamError> {
        if delimiter.is_empty() {
            return Err(StreamError::Config("delimiter must not be empty".to_string()));
        }
        Ok(Self {
            delimiter: delimiter.as_bytes().to_vec(),
            buffer: BytesMut::new(),
            scanned: 0,
        })
    }

    /// Number of bytes waiting for a delimiter.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Append `chunk` and return every frame it completes, in stream order.
    ///
    /// Frames exclude the delimiter. Empty frames (two adjacent delimiters)
    /// are returned as-is; the decoder skips them.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.find_delimiter() {
            let frame = self.buffer.split_to(pos).freeze();
            self.buffer.advance(self.delimiter.len());
            self.scanned = 0;
            frames.push(frame);
        }
        // A delimiter may still start in the last `len - 1` bytes once more data arrives.
        self.scanned = self
            .buffer
            .len()
            .saturating_sub(self.delimiter.len() - 1);
        frames
    }

    /// Drain the remainder at end of stream.
    ///
    /// Returns it as a final frame unless it is empty or whitespace only.
    pub fn flush(&mut self) -> Option<Bytes> {
        self.scanned = 0;
        let rest = self.buffer.split().freeze();
        if rest.trim_ascii().is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    fn find_delimiter(&self) -> Option<usize> {
        let haystack = self.buffer.get(self.scanned..)?;
        haystack
            .windows(self.delimiter.len())
            .position(|window| window == self.delimiter.as_slice())
            .map(|pos| pos + self.scanned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(splitter: &mut FrameSplitter, chunk: &str) -> Vec<String> {
        splitter
            .feed(chunk.as_bytes())
            .into_iter()
            .map(|f| String::from_utf8(f.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn test_rejects_empty_delimiter() {
        assert!(matches!(
            FrameSplitter::new(""),
            Err(StreamError::Config(_))
        ));
    }

    #[test]
    fn test_multiple_frames_in_one_chunk() {
        let mut splitter = FrameSplitter::new("\n\n").unwrap();
        assert_eq!(
            frames(&mut splitter, "{\"a\":1}\n\n{\"b\":2}\n\n"),
            vec!["{\"a\":1}", "{\"b\":2}"]
        );
        assert_eq!(splitter.buffered(), 0);
        assert!(splitter.flush().is_none());
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut splitter = FrameSplitter::new("\n\n").unwrap();
        assert!(frames(&mut splitter, "{\"a\":1").is_empty());
        assert_eq!(frames(&mut splitter, "}\n\n"), vec!["{\"a\":1}"]);
    }

    #[test]
    fn test_delimiter_split_across_chunks() {
        let mut splitter = FrameSplitter::new("\n\n").unwrap();
        assert!(frames(&mut splitter, "one\n").is_empty());
        assert_eq!(frames(&mut splitter, "\ntwo"), vec!["one"]);
        assert_eq!(splitter.buffered(), 3);

        let mut splitter = FrameSplitter::new("<|>").unwrap();
        assert!(frames(&mut splitter, "a<").is_empty());
        assert!(frames(&mut splitter, "|").is_empty());
        assert_eq!(frames(&mut splitter, ">b<|>"), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_frames_are_kept() {
        let mut splitter = FrameSplitter::new("\n").unwrap();
        assert_eq!(frames(&mut splitter, "a\n\nb\n"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_flush_trailing_remainder() {
        let mut splitter = FrameSplitter::new("\n\n").unwrap();
        assert_eq!(frames(&mut splitter, "{\"a\":1}\n\n{\"b\":2}"), vec!["{\"a\":1}"]);
        assert_eq!(splitter.flush().unwrap(), Bytes::from_static(b"{\"b\":2}"));
        assert!(splitter.flush().is_none());
    }

    #[test]
    fn test_flush_skips_whitespace() {
        let mut splitter = FrameSplitter::new("\n\n").unwrap();
        frames(&mut splitter, "x\n\n \r\n\t");
        assert!(splitter.flush().is_none());
        assert_eq!(splitter.buffered(), 0);
    }

    #[test]
    fn test_multibyte_character_split() {
        let mut splitter = FrameSplitter::new("\n").unwrap();
        let text = "\"héllo\"\n".as_bytes();
        // Split inside the two-byte 'é'.
        assert!(splitter.feed(&text[..3]).is_empty());
        let out = splitter.feed(&text[3..]);
        assert_eq!(out, vec![Bytes::from("\"héllo\"")]);
    }
}
