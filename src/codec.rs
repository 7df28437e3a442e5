//! Length-prefixed framing for the native messaging stdio protocol.
//!
//! Every frame is a 4-byte unsigned length in native byte order followed by
//! that many bytes of JSON. The same framing is used in both directions.

use std::fmt;
use std::io::{self, Read, Write};

use tracing::{debug, warn};

use crate::error::NmError;

/// Size of the length header that precedes every payload.
pub const HEADER_LEN: usize = 4;

/// Largest payload read per incoming frame unless configured otherwise.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Host → browser limit (1 MiB). Browsers drop larger messages.
pub const MAX_TO_BROWSER: usize = 1_048_576;

/// Byte order of the length header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the running process, fixed at compile time.
    pub const NATIVE: ByteOrder = if cfg!(target_endian = "big") {
        ByteOrder::Big
    } else {
        ByteOrder::Little
    };

    #[inline]
    pub fn decode(self, bytes: [u8; HEADER_LEN]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        }
    }

    #[inline]
    pub fn encode(self, value: u32) -> [u8; HEADER_LEN] {
        match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Little => f.write_str("LittleEndian"),
            ByteOrder::Big => f.write_str("BigEndian"),
        }
    }
}

/// What to do with an incoming frame whose declared length exceeds the buffer size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OversizePolicy {
    /// Drain the whole declared payload and drop the message. Framing stays in sync.
    #[default]
    Skip,
    /// Read only `max_size` bytes and leave the remainder in the stream.
    ///
    /// The leftover bytes are then read as the next header, so every later
    /// frame is misaligned. Kept for compatibility with older hosts.
    Truncate,
}

impl fmt::Display for OversizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OversizePolicy::Skip => f.write_str("skip"),
            OversizePolicy::Truncate => f.write_str("truncate"),
        }
    }
}

/// Result of reading one frame from the input stream.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame {
    /// A payload, possibly truncated under [`OversizePolicy::Truncate`].
    Payload(Vec<u8>),
    /// An oversize frame was drained and dropped.
    Skipped { declared: usize },
    /// The stream closed. This is the normal shutdown signal, not an error.
    Eof,
}

/// Interpret a length header in native byte order.
#[inline]
pub fn decode_length(bytes: [u8; HEADER_LEN]) -> u32 {
    ByteOrder::NATIVE.decode(bytes)
}

/// Encode a payload length as a native byte order header.
#[inline]
pub fn encode_length(len: u32) -> [u8; HEADER_LEN] {
    ByteOrder::NATIVE.encode(len)
}

/// Fill `buf` completely. Returns `Ok(false)` if the stream ends first.
fn fill_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Read a single frame from `reader`.
///
/// End of stream before a full header (or before the declared payload has
/// arrived) yields [`Frame::Eof`]. Any other read failure is returned as
/// [`NmError::Io`].
pub fn read_frame<R: Read>(
    reader: &mut R,
    max_size: usize,
    policy: OversizePolicy,
) -> Result<Frame, NmError> {
    let mut header = [0u8; HEADER_LEN];
    if !fill_or_eof(reader, &mut header)? {
        return Ok(Frame::Eof);
    }

    let declared = decode_length(header) as usize;
    debug!(declared, "message size in bytes");

    let to_read = if declared > max_size {
        warn!(
            declared,
            max_size,
            %policy,
            "message size exceeds buffer size"
        );
        match policy {
            OversizePolicy::Skip => {
                let mut rest = reader.by_ref().take(declared as u64);
                let drained = io::copy(&mut rest, &mut io::sink())?;
                if drained < declared as u64 {
                    warn!(
                        drained,
                        declared, "stream closed while draining oversize message"
                    );
                    return Ok(Frame::Eof);
                }
                return Ok(Frame::Skipped { declared });
            }
            OversizePolicy::Truncate => max_size,
        }
    } else {
        declared
    };

    let mut payload = vec![0u8; to_read];
    if !fill_or_eof(reader, &mut payload)? {
        warn!(declared, "stream closed before the full message arrived");
        return Ok(Frame::Eof);
    }
    Ok(Frame::Payload(payload))
}

/// Build a complete frame: length header followed by `payload`.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, NmError> {
    if payload.len() > MAX_TO_BROWSER {
        return Err(NmError::OutgoingTooLarge {
            len: payload.len(),
            max: MAX_TO_BROWSER,
        });
    }
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&encode_length(payload.len() as u32));
    out.extend_from_slice(payload);
    Ok(out)
}

/// Write one frame and flush. Partial writes surface as [`NmError::Io`] and are not retried.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), NmError> {
    let frame = encode_frame(payload)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}
