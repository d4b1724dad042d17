//! Extraction of a single JPEG frame from a motion-JPEG byte stream.
//!
//! Chunk boundaries are arbitrary; they need not line up with frames or even with the two-byte
//! markers.

use std::pin::pin;

use anyhow::Context;
use futures_util::{Stream, StreamExt};

use crate::error::Error;

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// Anything shorter is assumed to be a truncated or empty stream rather than an image.
pub const MIN_FRAME_LEN: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// No start marker seen yet.
    Seeking,
    /// Inside a frame, waiting for its end marker.
    Accumulating,
    /// The end marker has been seen; later chunks are ignored.
    Done,
}

#[derive(Debug)]
pub struct FrameScanner {
    state: State,
    frame: Vec<u8>,
    // Set when the previous chunk, seen while seeking, ended with the first byte of the marker.
    pending_ff: bool,
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScanner {
    pub fn new() -> Self {
        Self {
            state: State::Seeking,
            frame: Vec::new(),
            pending_ff: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The bytes of the frame collected so far.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    pub fn push(&mut self, chunk: &[u8]) -> State {
        match self.state {
            State::Seeking => self.seek(chunk),
            State::Accumulating => {
                // The end marker may straddle the previous chunk but never overlaps the start
                // marker.
                let scan_from = self.frame.len().saturating_sub(1).max(JPEG_SOI.len());
                self.frame.extend_from_slice(chunk);
                self.complete_from(scan_from);
            }
            State::Done => {}
        }
        self.state
    }

    fn seek(&mut self, chunk: &[u8]) {
        if self.pending_ff && chunk.first() == Some(&JPEG_SOI[1]) {
            self.frame.push(JPEG_SOI[0]);
            self.frame.extend_from_slice(chunk);
        } else if let Some(start) = find_marker(chunk, &JPEG_SOI) {
            self.frame.extend_from_slice(&chunk[start..]);
        } else {
            self.pending_ff = chunk.last() == Some(&JPEG_SOI[0]);
            return;
        }
        self.pending_ff = false;
        self.state = State::Accumulating;
        self.complete_from(JPEG_SOI.len());
    }

    fn complete_from(&mut self, scan_from: usize) {
        if let Some(end) = find_marker(&self.frame[scan_from..], &JPEG_EOI) {
            self.frame.truncate(scan_from + end + JPEG_EOI.len());
            self.state = State::Done;
        }
    }

    /// Return the frame if it is plausibly an image.
    ///
    /// A frame cut short by the end of the stream is accepted as long as it is long enough.
    pub fn finish(self) -> anyhow::Result<Vec<u8>> {
        if self.frame.len() < MIN_FRAME_LEN {
            return Err(Error::StreamExtractionFailed(
                "No valid JPEG image found in stream".to_string(),
            )
            .into());
        }
        Ok(self.frame)
    }
}

fn find_marker(buffer: &[u8], marker: &[u8; 2]) -> Option<usize> {
    buffer.windows(2).position(|w| w == marker)
}

/// Read chunks until the first complete JPEG frame has been seen and return that frame.
///
/// No chunk after the one holding the end marker is read.
pub async fn extract_first_frame<S, B, E>(chunks: S) -> anyhow::Result<Vec<u8>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<anyhow::Error>,
{
    let mut chunks = pin!(chunks);
    let mut scanner = FrameScanner::new();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk
            .map_err(Into::<anyhow::Error>::into)
            .context("Failed to read stream")?;
        if scanner.push(chunk.as_ref()) == State::Done {
            break;
        }
    }
    scanner.finish()
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures_util::stream;

    use super::*;

    fn scan(chunks: &[&[u8]]) -> FrameScanner {
        let mut scanner = FrameScanner::new();
        for chunk in chunks {
            scanner.push(chunk);
        }
        scanner
    }

    fn fake_jpeg(payload_len: usize) -> Vec<u8> {
        let mut out = JPEG_SOI.to_vec();
        out.extend(std::iter::repeat(b'a').take(payload_len));
        out.extend_from_slice(&JPEG_EOI);
        out
    }

    fn ok_chunks(chunks: Vec<Vec<u8>>) -> impl Stream<Item = Result<Vec<u8>, Infallible>> {
        stream::iter(chunks.into_iter().map(Ok))
    }

    #[test]
    fn garbage_and_trailing_bytes_are_discarded() {
        let scanner = scan(&[b"garbage", b"\xff\xd8abc", b"def\xff\xd9trailing"]);
        assert_eq!(scanner.state(), State::Done);
        assert_eq!(scanner.frame(), b"\xff\xd8abcdef\xff\xd9");
    }

    #[test]
    fn chunks_after_end_marker_are_ignored() {
        let scanner = scan(&[b"\xff\xd8abc\xff\xd9", b"\xff\xd8more"]);
        assert_eq!(scanner.frame(), b"\xff\xd8abc\xff\xd9");
    }

    #[test]
    fn markers_split_across_chunks_are_found() {
        let scanner = scan(&[b"junk\xff", b"\xd8abc\xff", b"\xd9rest"]);
        assert_eq!(scanner.state(), State::Done);
        assert_eq!(scanner.frame(), b"\xff\xd8abc\xff\xd9");
    }

    #[test]
    fn start_marker_bytes_are_not_an_end_marker() {
        let scanner = scan(&[b"\xff\xd8", b"\xd9abc"]);
        assert_eq!(scanner.state(), State::Accumulating);
    }

    #[test]
    fn garbage_only_never_leaves_seeking() {
        let scanner = scan(&[b"abc", b"\xd8\xff", b"def"]);
        assert_eq!(scanner.state(), State::Seeking);
        assert!(scanner.frame().is_empty());
    }

    #[tokio::test]
    async fn first_frame_is_extracted_from_chunks() {
        let frame = fake_jpeg(200);
        let mut first = b"--myboundary\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        first.extend_from_slice(&frame[..50]);
        let mut last = frame[50..].to_vec();
        last.extend_from_slice(b"\r\n--myboundary\r\n");
        let actual = extract_first_frame(ok_chunks(vec![first, last])).await.unwrap();
        assert_eq!(actual, frame);
    }

    #[tokio::test]
    async fn stream_is_not_read_past_end_marker() {
        let frame = fake_jpeg(120);
        let chunks = stream::iter(vec![Ok(frame.clone()), Err(anyhow::anyhow!("read too far"))]);
        assert_eq!(extract_first_frame(chunks).await.unwrap(), frame);
    }

    #[tokio::test]
    async fn empty_stream_fails() {
        let error = extract_first_frame(ok_chunks(Vec::new())).await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::StreamExtractionFailed(_))
        ));
    }

    #[tokio::test]
    async fn garbage_stream_fails() {
        let error = extract_first_frame(ok_chunks(vec![vec![0; 4096], vec![1; 4096]]))
            .await
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::StreamExtractionFailed(_))
        ));
    }

    #[tokio::test]
    async fn undersized_frame_fails() {
        let error = extract_first_frame(ok_chunks(vec![b"\xff\xd8abcdef\xff\xd9".to_vec()]))
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "No valid JPEG image found in stream");
    }

    #[tokio::test]
    async fn truncated_but_long_frame_is_accepted() {
        let mut frame = JPEG_SOI.to_vec();
        frame.extend(vec![b'b'; 150]);
        let actual = extract_first_frame(ok_chunks(vec![frame.clone()])).await.unwrap();
        assert_eq!(actual, frame);
    }

    #[tokio::test]
    async fn stream_errors_are_propagated() {
        let chunks = stream::iter(vec![
            Ok(b"\xff\xd8".to_vec()),
            Err(anyhow::anyhow!("connection reset")),
        ]);
        let error = extract_first_frame(chunks).await.unwrap_err();
        assert_eq!(format!("{error:#}"), "Failed to read stream: connection reset");
    }
}
