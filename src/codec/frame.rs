//! Wire framing for opaque payloads
//!
//! A frame is `[n][n ASCII decimal digits][payload][separator]`, where `n`
//! is a single byte holding the length of the digit string. Empty payloads
//! are never framed.
//!
//! A corrupt header (zero prefix, non-digit length, oversized length) is
//! reported once and the decoder skips through the next separator, so the
//! following frame decodes normally. This relies on payloads being
//! separator-free, which holds for [`EntryCodec`](crate::codec::EntryCodec)
//! output.
//!
//! ```
//! use rust_typed_logger::codec::{Decoder, Encoder, FrameDecoder, FrameEncoder};
//! use std::io::Cursor;
//!
//! let mut wire = Vec::new();
//! let written = FrameEncoder.encode(&mut wire, b"hello").unwrap();
//! assert_eq!(wire, b"\x015hello\n");
//! assert_eq!(written, wire.len());
//!
//! let mut source = Cursor::new(wire);
//! assert_eq!(FrameDecoder::new().decode(&mut source).unwrap(), Some(b"hello".to_vec()));
//! assert_eq!(FrameDecoder::new().decode(&mut source).unwrap(), None);
//! ```

use crate::core::error::{LoggerError, Result};
use std::io::{BufRead, ErrorKind, Read, Write};

/// Byte terminating every frame and every line
pub const FRAME_SEPARATOR: u8 = b'\n';

/// Upper bound on a decoded payload unless configured otherwise
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Writes one marshalled entry to a sink
pub trait Encoder: Send + Sync {
    /// Returns the number of bytes written to `sink`
    fn encode(&self, sink: &mut dyn Write, payload: &[u8]) -> Result<usize>;
}

/// Splits a byte stream back into marshalled entries
pub trait Decoder: Send + Sync {
    /// `Ok(None)` is clean end of stream before any byte of a new unit
    fn decode(&self, source: &mut dyn BufRead) -> Result<Option<Vec<u8>>>;
}

/// Length-prefixed, separator-terminated framing
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameEncoder;

impl Encoder for FrameEncoder {
    fn encode(&self, sink: &mut dyn Write, payload: &[u8]) -> Result<usize> {
        if payload.is_empty() {
            return Ok(0);
        }
        let digits = payload.len().to_string();
        let prefix = u8::try_from(digits.len()).map_err(|_| LoggerError::FrameTooLarge {
            len: payload.len(),
        })?;

        let mut frame = Vec::with_capacity(digits.len() + payload.len() + 2);
        frame.push(prefix);
        frame.extend_from_slice(digits.as_bytes());
        frame.extend_from_slice(payload);
        frame.push(FRAME_SEPARATOR);

        sink.write_all(&frame)
            .map_err(|e| LoggerError::io_operation("writing frame", e))?;
        Ok(frame.len())
    }
}

/// Reader for [`FrameEncoder`] output
#[derive(Debug, Clone, Copy)]
pub struct FrameDecoder {
    max_frame_len: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Reject frames announcing more than `max_frame_len` payload bytes
    #[must_use]
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    fn read_length(&self, source: &mut dyn BufRead, prefix: u8) -> Result<usize> {
        if prefix == 0 {
            return Err(LoggerError::malformed_length("empty length prefix"));
        }
        let digits = read_digits(source, prefix as usize)?;
        self.parse_length(&digits)
    }

    fn parse_length(&self, digits: &[u8]) -> Result<usize> {
        let text = std::str::from_utf8(digits)
            .map_err(|e| LoggerError::malformed_length(e.to_string()))?;
        let len: usize = text
            .parse()
            .map_err(|e| LoggerError::malformed_length(format!("{}: {}", text, e)))?;
        if len > self.max_frame_len {
            return Err(LoggerError::malformed_length(format!(
                "length {} exceeds limit {}",
                len, self.max_frame_len
            )));
        }
        Ok(len)
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameDecoder {
    fn decode(&self, source: &mut dyn BufRead) -> Result<Option<Vec<u8>>> {
        let mut prefix = [0u8; 1];
        if read_full(source, &mut prefix)? == 0 {
            return Ok(None);
        }
        let len = match self.read_length(source, prefix[0]) {
            Ok(len) => len,
            Err(e @ LoggerError::MalformedLength { .. }) => {
                skip_past_separator(source)?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let mut payload = vec![0u8; len];
        expect_full(source, &mut payload, "payload")?;

        let mut separator = [0u8; 1];
        expect_full(source, &mut separator, "separator")?;
        if separator[0] != FRAME_SEPARATOR {
            return Err(LoggerError::SeparatorMismatch {
                expected: FRAME_SEPARATOR,
                actual: separator[0],
            });
        }
        Ok(Some(payload))
    }
}

/// Payload followed by a newline
///
/// Only safe for payloads that never contain the separator, such as the
/// armoured output of [`EntryCodec`](crate::codec::EntryCodec).
#[derive(Debug, Clone, Copy, Default)]
pub struct LineEncoder;

impl Encoder for LineEncoder {
    fn encode(&self, sink: &mut dyn Write, payload: &[u8]) -> Result<usize> {
        if payload.is_empty() {
            return Ok(0);
        }
        let mut line = Vec::with_capacity(payload.len() + 1);
        line.extend_from_slice(payload);
        line.push(FRAME_SEPARATOR);
        sink.write_all(&line)
            .map_err(|e| LoggerError::io_operation("writing line", e))?;
        Ok(line.len())
    }
}

/// Reader for newline-terminated entries
///
/// Blank lines are skipped; trailing bytes without a newline at end of
/// stream are a truncation error.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineDecoder;

impl Decoder for LineDecoder {
    fn decode(&self, source: &mut dyn BufRead) -> Result<Option<Vec<u8>>> {
        loop {
            let mut line = Vec::new();
            let read = source
                .read_until(FRAME_SEPARATOR, &mut line)
                .map_err(|e| LoggerError::io_operation("reading line", e))?;
            if read == 0 {
                return Ok(None);
            }
            if line.last() != Some(&FRAME_SEPARATOR) {
                return Err(LoggerError::TruncatedFrame {
                    stage: "line",
                    expected: line.len() + 1,
                    actual: line.len(),
                });
            }
            line.pop();
            if !line.is_empty() {
                return Ok(Some(line));
            }
        }
    }
}

/// Fill `buf` from `source` across short reads; returns bytes obtained
///
/// Stops early only at end of stream.
fn read_full<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(LoggerError::io_operation("reading frame", e)),
        }
    }
    Ok(filled)
}

/// Consume `count` ASCII digits, leaving the first non-digit unread
fn read_digits(source: &mut dyn BufRead, count: usize) -> Result<Vec<u8>> {
    let mut digits = Vec::with_capacity(count);
    while digits.len() < count {
        let byte = match source.fill_buf() {
            Ok([]) => {
                return Err(LoggerError::TruncatedFrame {
                    stage: "length",
                    expected: count,
                    actual: digits.len(),
                })
            }
            Ok(buf) => buf[0],
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(LoggerError::io_operation("reading frame", e)),
        };
        if !byte.is_ascii_digit() {
            return Err(LoggerError::malformed_length(format!(
                "non-digit byte {:#04x} in length",
                byte
            )));
        }
        digits.push(byte);
        source.consume(1);
    }
    Ok(digits)
}

/// Discard input up to and including the next separator
fn skip_past_separator(source: &mut dyn BufRead) -> Result<()> {
    let mut discarded = Vec::new();
    source
        .read_until(FRAME_SEPARATOR, &mut discarded)
        .map_err(|e| LoggerError::io_operation("resynchronising frames", e))?;
    Ok(())
}

fn expect_full<R: Read + ?Sized>(source: &mut R, buf: &mut [u8], stage: &'static str) -> Result<()> {
    let actual = read_full(source, buf)?;
    if actual < buf.len() {
        return Err(LoggerError::TruncatedFrame {
            stage,
            expected: buf.len(),
            actual,
        });
    }
    Ok(())
}
