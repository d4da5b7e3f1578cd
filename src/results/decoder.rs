//! Incremental decoder for a streamed JSON array of result records.
//!
//! The body is never buffered whole. Bytes are pulled chunk by chunk; each
//! array element is delimited by a small resumable scanner that tracks
//! nesting and string escapes, and only the complete element is handed to
//! `serde_json`. The first malformed element ends the sequence with a
//! `Decode` error; there is no resynchronization.

use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};

use super::types::MeasurementResult;
use crate::error_handling::AtlasError;

/// A boxed body stream, as produced by `reqwest::Response::bytes_stream`.
pub type ByteStream = BoxStream<'static, Result<Bytes, reqwest::Error>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the opening `[`
    Start,
    /// After `[`, before the first element or `]`
    FirstElement,
    /// After an element, expecting `,` or `]`
    NextElement,
    /// Closed, exhausted or failed
    Done,
}

/// Position inside the element currently being delimited.
#[derive(Debug, Default)]
struct ElementScan {
    /// Bytes of the element examined so far
    offset: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl ElementScan {
    /// Advances over `bytes` (the element from its first byte) and returns
    /// the element length once its end is in view.
    fn advance(&mut self, bytes: &[u8], at_eof: bool) -> Option<usize> {
        let first = *bytes.first()?;
        if !matches!(first, b'{' | b'[' | b'"') {
            // Bare scalar: ends at the next delimiter
            let end = bytes[self.offset..]
                .iter()
                .position(|b| matches!(b, b',' | b']') || b.is_ascii_whitespace());
            return match end {
                Some(end) => Some(self.offset + end),
                None if at_eof => Some(bytes.len()),
                None => {
                    self.offset = bytes.len();
                    None
                }
            };
        }

        while self.offset < bytes.len() {
            let b = bytes[self.offset];
            self.offset += 1;
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' {
                    self.escaped = true;
                } else if b == b'"' {
                    self.in_string = false;
                    if self.depth == 0 {
                        return Some(self.offset);
                    }
                }
                continue;
            }
            match b {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return Some(self.offset);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// Lazily decodes `[record, record, ...]` from a byte stream.
///
/// Records are yielded in input order. Every chunk read is bounded by
/// `read_timeout`; an expired read is a `Network` error. After the first
/// error, or after the closing `]`, the decoder yields nothing more.
pub struct ResultStreamDecoder {
    stream: ByteStream,
    source: String,
    read_timeout: Duration,
    buf: Vec<u8>,
    pos: usize,
    eof: bool,
    state: State,
    records: usize,
}

impl ResultStreamDecoder {
    /// `source` names the stream in errors, usually its URL.
    pub fn new(stream: ByteStream, source: impl Into<String>, read_timeout: Duration) -> Self {
        Self {
            stream,
            source: source.into(),
            read_timeout,
            buf: Vec::new(),
            pos: 0,
            eof: false,
            state: State::Start,
            records: 0,
        }
    }

    /// Decodes the body of an open result response.
    pub fn from_response(response: reqwest::Response, read_timeout: Duration) -> Self {
        let source = response.url().to_string();
        Self::new(response.bytes_stream().boxed(), source, read_timeout)
    }

    /// Records decoded so far.
    pub fn records_decoded(&self) -> usize {
        self.records
    }

    /// Returns the next record, `None` once the array is closed or after an
    /// error has been returned.
    pub async fn next_record(&mut self) -> Option<Result<MeasurementResult, AtlasError>> {
        if self.state == State::Done {
            return None;
        }
        match self.advance().await {
            Ok(Some(record)) => {
                self.records += 1;
                Some(Ok(record))
            }
            Ok(None) => {
                self.state = State::Done;
                None
            }
            Err(e) => {
                self.state = State::Done;
                Some(Err(e))
            }
        }
    }

    /// Turns the decoder into a `Stream` of records.
    pub fn into_stream(self) -> impl Stream<Item = Result<MeasurementResult, AtlasError>> {
        stream::unfold(self, |mut decoder| async move {
            let item = decoder.next_record().await?;
            Some((item, decoder))
        })
    }

    async fn advance(&mut self) -> Result<Option<MeasurementResult>, AtlasError> {
        loop {
            match self.state {
                State::Start => {
                    if self.next_significant_byte().await? != Some(b'[') {
                        return Err(self.framing_error("expected '[' at start of result array"));
                    }
                    self.pos += 1;
                    self.state = State::FirstElement;
                }
                State::FirstElement => match self.next_significant_byte().await? {
                    Some(b']') => {
                        self.pos += 1;
                        return Ok(None);
                    }
                    Some(_) => return self.decode_element().await.map(Some),
                    None => return Err(self.framing_error("result array is not terminated")),
                },
                State::NextElement => match self.next_significant_byte().await? {
                    Some(b']') => {
                        self.pos += 1;
                        return Ok(None);
                    }
                    Some(b',') => {
                        self.pos += 1;
                        match self.next_significant_byte().await? {
                            Some(b']') => {
                                return Err(self.framing_error("trailing ',' in result array"))
                            }
                            Some(_) => return self.decode_element().await.map(Some),
                            None => {
                                return Err(self.framing_error("result array is not terminated"))
                            }
                        }
                    }
                    Some(other) => {
                        return Err(self.framing_error(format!(
                            "expected ',' or ']' after record {}, found {:?}",
                            self.records,
                            char::from(other)
                        )))
                    }
                    None => return Err(self.framing_error("result array is not terminated")),
                },
                State::Done => return Ok(None),
            }
        }
    }

    /// Skips whitespace and peeks the next byte, reading more as needed.
    async fn next_significant_byte(&mut self) -> Result<Option<u8>, AtlasError> {
        loop {
            while let Some(&b) = self.buf.get(self.pos) {
                if !b.is_ascii_whitespace() {
                    return Ok(Some(b));
                }
                self.pos += 1;
            }
            if !self.fill().await? {
                return Ok(None);
            }
        }
    }

    async fn decode_element(&mut self) -> Result<MeasurementResult, AtlasError> {
        let mut scan = ElementScan::default();
        let len = loop {
            if let Some(len) = scan.advance(&self.buf[self.pos..], self.eof) {
                break len;
            }
            if !self.fill().await? {
                return Err(self.framing_error(format!(
                    "stream ended inside record {}",
                    self.records + 1
                )));
            }
        };

        let element = &self.buf[self.pos..self.pos + len];
        let record = serde_json::from_slice(element).map_err(|e| {
            AtlasError::decode(
                format!("record {} of {}", self.records + 1, self.source),
                e,
            )
        })?;
        self.pos += len;
        self.state = State::NextElement;
        Ok(record)
    }

    /// Appends the next chunk to the buffer. Returns `false` at end of stream.
    async fn fill(&mut self) -> Result<bool, AtlasError> {
        if self.eof {
            return Ok(false);
        }
        // Consumed bytes are dropped before growing; offsets are relative to `pos`
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }

        loop {
            let next = tokio::time::timeout(self.read_timeout, self.stream.next())
                .await
                .map_err(|_| AtlasError::deadline(self.source.as_str(), self.read_timeout))?;
            match next {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => {
                    self.buf.extend_from_slice(&chunk);
                    return Ok(true);
                }
                Some(Err(e)) => return Err(AtlasError::transport(self.source.as_str(), e)),
                None => {
                    self.eof = true;
                    return Ok(false);
                }
            }
        }
    }

    fn framing_error(&self, message: impl Into<String>) -> AtlasError {
        AtlasError::decode(format!("result stream {}", self.source), message.into())
    }
}
