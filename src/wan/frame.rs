//! Spill framing for the overflow store (length + crc32c).
//!
//! Each frame is `len: u32 LE, crc32c: u32 LE, record`, where the record is
//! one encoded gateway event. A torn tail (clean EOF inside a header or
//! body) and a checksum mismatch are reported distinctly so the store can
//! truncate a torn tail but quarantine corruption.

use std::io::{ErrorKind, Read, Write};

use crc32c::crc32c;
use thiserror::Error;

use crate::core::ValueSerializer;

use super::codec::{CodecError, decode_event, encode_event, encode_initialized};
use super::event::GatewayEvent;

pub const SPILL_FRAME_HEADER_LEN: usize = 8;
pub const DEFAULT_MAX_SPILL_FRAME_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum SpillFrameError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("spill frame truncated in {part}")]
    Torn { part: &'static str },
    #[error("spill frame length invalid: {reason}")]
    LengthInvalid { reason: String },
    #[error("spill frame too large: max {max_frame_bytes} got {got_bytes}")]
    TooLarge {
        max_frame_bytes: usize,
        got_bytes: usize,
    },
    #[error("spill frame crc mismatch: expected {expected:#010x} got {got:#010x}")]
    CrcMismatch { expected: u32, got: u32 },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub fn encode_spill_frame(record: &[u8], max_frame_bytes: usize) -> Result<Vec<u8>, SpillFrameError> {
    if record.is_empty() {
        return Err(SpillFrameError::LengthInvalid {
            reason: "empty record".to_string(),
        });
    }
    if record.len() > max_frame_bytes {
        return Err(SpillFrameError::TooLarge {
            max_frame_bytes,
            got_bytes: record.len(),
        });
    }
    let length = u32::try_from(record.len()).map_err(|_| SpillFrameError::LengthInvalid {
        reason: "record length exceeds u32".to_string(),
    })?;

    let mut buf = Vec::with_capacity(SPILL_FRAME_HEADER_LEN + record.len());
    buf.extend_from_slice(&length.to_le_bytes());
    buf.extend_from_slice(&crc32c(record).to_le_bytes());
    buf.extend_from_slice(record);
    Ok(buf)
}

/// Appends gateway events to an overflow file.
pub struct SpillWriter<W> {
    writer: W,
    max_frame_bytes: usize,
}

impl<W: Write> SpillWriter<W> {
    pub fn new(writer: W, max_frame_bytes: usize) -> Self {
        Self {
            writer,
            max_frame_bytes,
        }
    }

    /// Initializes the event if needed; returns the bytes written.
    pub fn append(
        &mut self,
        event: &mut GatewayEvent,
        serializer: &dyn ValueSerializer,
    ) -> Result<usize, SpillFrameError> {
        let record = encode_event(event, serializer)?;
        self.write_record(&record)
    }

    /// Appends an event that is already published (and so initialized).
    pub fn append_initialized(&mut self, event: &GatewayEvent) -> Result<usize, SpillFrameError> {
        let record = encode_initialized(event)?;
        self.write_record(&record)
    }

    fn write_record(&mut self, record: &[u8]) -> Result<usize, SpillFrameError> {
        let frame = encode_spill_frame(record, self.max_frame_bytes)?;
        self.writer.write_all(&frame)?;
        Ok(frame.len())
    }

    pub fn flush(&mut self) -> Result<(), SpillFrameError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Reads gateway events back from an overflow file.
pub struct SpillReader<R> {
    reader: R,
    max_frame_bytes: usize,
}

impl<R: Read> SpillReader<R> {
    pub fn new(reader: R, max_frame_bytes: usize) -> Self {
        Self {
            reader,
            max_frame_bytes,
        }
    }

    /// `Ok(None)` at a clean end of file.
    pub fn next_record(&mut self) -> Result<Option<Vec<u8>>, SpillFrameError> {
        let mut header = [0u8; SPILL_FRAME_HEADER_LEN];
        if !self.fill(&mut header, "header", true)? {
            return Ok(None);
        }

        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        if length == 0 {
            return Err(SpillFrameError::LengthInvalid {
                reason: "frame length cannot be zero".to_string(),
            });
        }
        if length > self.max_frame_bytes {
            return Err(SpillFrameError::TooLarge {
                max_frame_bytes: self.max_frame_bytes,
                got_bytes: length,
            });
        }
        let expected = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        let mut body = vec![0u8; length];
        self.fill(&mut body, "body", false)?;

        let got = crc32c(&body);
        if got != expected {
            return Err(SpillFrameError::CrcMismatch { expected, got });
        }
        Ok(Some(body))
    }

    pub fn next_event(&mut self) -> Result<Option<GatewayEvent>, SpillFrameError> {
        match self.next_record()? {
            Some(record) => Ok(Some(decode_event(&record)?)),
            None => Ok(None),
        }
    }

    /// Returns `false` only when `allow_eof` and nothing at all was read.
    fn fill(
        &mut self,
        buf: &mut [u8],
        part: &'static str,
        allow_eof: bool,
    ) -> Result<bool, SpillFrameError> {
        let mut read = 0usize;
        while read < buf.len() {
            match self.reader.read(&mut buf[read..]) {
                Ok(0) if read == 0 && allow_eof => return Ok(false),
                Ok(0) => return Err(SpillFrameError::Torn { part }),
                Ok(n) => read += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(true)
    }
}

impl<R: Read> Iterator for SpillReader<R> {
    type Item = Result<GatewayEvent, SpillFrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}
