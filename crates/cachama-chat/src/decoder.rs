//! Decoder for the generator's line-oriented `data:` stream.
//!
//! Chunks arrive at arbitrary boundaries, so a line may be split across
//! reads (including in the middle of a UTF-8 sequence). The decoder keeps the
//! unterminated tail as raw bytes and only decodes complete lines.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

// =============================================================================
// StreamFrame
// =============================================================================

/// One decoded line of the wire stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// A text increment.
    Delta(String),
    /// A `data:` line whose payload could not be parsed. Carries no text.
    Malformed,
    /// The `[DONE]` sentinel.
    Done,
}

#[derive(Deserialize)]
struct DeltaPayload {
    response: Option<String>,
}

// =============================================================================
// StreamDecoder
// =============================================================================

/// Incremental frame decoder with a bounded residual buffer.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    done: bool,
    /// Set after an overflow; bytes are dropped until the next newline.
    discarding: bool,
    malformed: usize,
}

impl StreamDecoder {
    /// Maximum unterminated line length (1 MiB).
    pub const MAX_BUFFER_SIZE: usize = 1024 * 1024;

    const DATA_PREFIX: &'static [u8] = b"data:";
    const DONE_SENTINEL: &'static str = "[DONE]";

    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return the frames completed by it.
    ///
    /// Returns nothing once the sentinel has been seen.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        if self.done {
            return frames;
        }

        let mut chunk = chunk;
        if self.discarding {
            match chunk.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.discarding = false;
                    chunk = &chunk[pos + 1..];
                }
                None => return frames,
            }
        }

        self.buffer.extend_from_slice(chunk);

        if let Some(last_newline) = self.buffer.iter().rposition(|&b| b == b'\n') {
            let tail = self.buffer.split_off(last_newline + 1);
            let complete = std::mem::replace(&mut self.buffer, tail);
            for line in complete.split(|&b| b == b'\n') {
                if self.decode_line(line, &mut frames) {
                    break;
                }
            }
        }

        if !self.done && self.buffer.len() > Self::MAX_BUFFER_SIZE {
            warn!(
                buffered = self.buffer.len(),
                "Stream line exceeded {}KB limit, discarding it",
                Self::MAX_BUFFER_SIZE / 1024
            );
            self.buffer.clear();
            self.discarding = true;
            self.malformed += 1;
            frames.push(StreamFrame::Malformed);
        }

        frames
    }

    /// Flush a trailing line that never received its newline.
    pub fn finish(&mut self) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        if self.done || self.discarding {
            self.buffer.clear();
            return frames;
        }
        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line, &mut frames);
        if self.malformed > 0 {
            debug!(malformed = self.malformed, "Stream decoded with malformed frames");
        }
        frames
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Lines discarded so far because their payload did not parse.
    pub fn malformed_count(&self) -> usize {
        self.malformed
    }

    /// Decode one line into `frames`. Returns true when the sentinel ends the
    /// stream.
    fn decode_line(&mut self, line: &[u8], frames: &mut Vec<StreamFrame>) -> bool {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let Some(payload) = line.strip_prefix(Self::DATA_PREFIX) else {
            return false;
        };
        let payload = payload.strip_prefix(b" ").unwrap_or(payload);

        let Ok(payload) = std::str::from_utf8(payload) else {
            self.malformed += 1;
            frames.push(StreamFrame::Malformed);
            return false;
        };
        let payload = payload.trim();

        if payload == Self::DONE_SENTINEL {
            self.done = true;
            self.buffer.clear();
            frames.push(StreamFrame::Done);
            return true;
        }

        match serde_json::from_str::<DeltaPayload>(payload) {
            Ok(DeltaPayload {
                response: Some(text),
            }) => frames.push(StreamFrame::Delta(text)),
            Ok(DeltaPayload { response: None }) => {}
            Err(e) => {
                debug!(error = %e, "Skipping malformed stream frame");
                self.malformed += 1;
                frames.push(StreamFrame::Malformed);
            }
        }
        false
    }
}

// =============================================================================
// decode_stream
// =============================================================================

struct DecodeState<S> {
    input: Pin<Box<S>>,
    decoder: StreamDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn a byte stream into a lazy stream of text increments.
///
/// Increments come out in arrival order. The stream ends at `[DONE]` or at
/// end of input. A transport error is yielded once and ends the stream.
pub fn decode_stream<S, B, E>(input: S) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    let state = DecodeState {
        input: Box::pin(input),
        decoder: StreamDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(text) = state.pending.pop_front() {
                return Some((Ok(text), state));
            }
            if state.finished {
                return None;
            }

            let frames = match state.input.next().await {
                Some(Ok(chunk)) => state.decoder.push(chunk.as_ref()),
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    state.decoder.finish()
                }
            };

            for frame in frames {
                match frame {
                    StreamFrame::Delta(text) if !text.is_empty() => state.pending.push_back(text),
                    StreamFrame::Delta(_) | StreamFrame::Malformed => {}
                    StreamFrame::Done => state.finished = true,
                }
            }
        }
    })
}
