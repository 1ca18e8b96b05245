//! RS/LF JSON text sequence framing.
//!
//! Each record on the wire is `0x1E`, one JSON text, `0x0A`. The decoder
//! splits on `0x1E` alone: JSON texts may contain line feeds but never a raw
//! record separator, so a record ends where the next one starts or where the
//! stream ends.

use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use futures::TryStreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    Error,
    Result,
    binding::{BinaryWriter, BodyStream, StructuredWriter, WriterPair},
    format::Format,
};

/// Record separator opening every record.
pub const RS: u8 = 0x1E;

/// Line feed closing every record.
pub const LF: u8 = 0x0A;

/// Minimum record length in bytes.
///
/// Record lengths passed to [`JsonSeqCodec::new`] are clamped to at least
/// this value.
pub const MIN_RECORD_LENGTH: usize = 64;

/// Maximum record length in bytes (16 MiB).
///
/// Record lengths passed to [`JsonSeqCodec::new`] are clamped to at most this
/// value to prevent unbounded buffering.
pub const MAX_RECORD_LENGTH: usize = 16 * 1024 * 1024;

/// Default record length limit (1 MiB).
pub const DEFAULT_RECORD_LENGTH: usize = 1024 * 1024;

pub(crate) fn clamp_record_length(value: usize) -> usize {
    value.clamp(MIN_RECORD_LENGTH, MAX_RECORD_LENGTH)
}

/// `tokio_util` codec for JSON text sequences.
///
/// Decoding yields record payloads with both separators stripped; encoding
/// wraps a payload in them.
///
/// A rejected record is dropped and decoding resumes at the next `0x1E`, so
/// one bad record never hides the records after it.
#[derive(Clone, Debug)]
pub struct JsonSeqCodec {
    max_record_length: usize,
    // Offset already scanned for the next separator.
    next_index: usize,
    // Skipping the tail of an oversized record.
    discarding: bool,
}

impl JsonSeqCodec {
    /// Construct a codec accepting records up to `max_record_length` bytes,
    /// separators included.
    #[must_use]
    pub fn new(max_record_length: usize) -> Self {
        Self {
            max_record_length: clamp_record_length(max_record_length),
            next_index: 0,
            discarding: false,
        }
    }

    /// Return the maximum record length accepted by this codec.
    #[must_use]
    pub fn max_record_length(&self) -> usize { self.max_record_length }

    fn check_length(&self, size: usize) -> Result<()> {
        if size > self.max_record_length {
            return Err(Error::RecordTooLarge {
                size,
                max: self.max_record_length,
            });
        }
        Ok(())
    }
}

impl Default for JsonSeqCodec {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_LENGTH)
    }
}

/// Strip the separators from a complete record.
fn record_payload(record: Bytes) -> Result<Bytes> {
    let framed = record.len() > 2 && record.first() == Some(&RS) && record.last() == Some(&LF);
    if !framed {
        return Err(Error::InvalidRecord(record));
    }
    Ok(record.slice(1..record.len() - 1))
}

impl Decoder for JsonSeqCodec {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        if self.discarding {
            match src.iter().position(|byte| *byte == RS) {
                Some(start) => {
                    src.advance(start);
                    self.discarding = false;
                }
                None => {
                    src.clear();
                    return Ok(None);
                }
            }
        }
        if src.is_empty() {
            return Ok(None);
        }
        // The next record starts at the first separator after offset 0.
        let from = self.next_index.clamp(1, src.len());
        match src[from..].iter().position(|byte| *byte == RS) {
            Some(offset) => {
                let end = from + offset;
                self.next_index = 0;
                let record = src.split_to(end).freeze();
                self.check_length(end)?;
                record_payload(record).map(Some)
            }
            None => {
                if let Err(error) = self.check_length(src.len()) {
                    src.clear();
                    self.next_index = 0;
                    self.discarding = true;
                    return Err(error);
                }
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        if let Some(record) = self.decode(src)? {
            return Ok(Some(record));
        }
        if src.is_empty() {
            return Ok(None);
        }
        self.next_index = 0;
        record_payload(src.split().freeze()).map(Some)
    }
}

impl Encoder<Bytes> for JsonSeqCodec {
    type Error = Error;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<()> {
        if payload.is_empty() || payload.contains(&RS) {
            return Err(Error::InvalidRecord(payload));
        }
        self.check_length(payload.len() + 2)?;
        dst.reserve(payload.len() + 2);
        dst.put_u8(RS);
        dst.extend_from_slice(&payload);
        dst.put_u8(LF);
        Ok(())
    }
}

/// Structured writer emitting one record into `W`.
///
/// Offers no binary path; binary sources reach it materialized by the pump.
pub struct JsonSeqWriter<'w, W: ?Sized> {
    inner: &'w mut W,
}

impl<'w, W: ?Sized> JsonSeqWriter<'w, W> {
    /// Write the next record into `inner`.
    pub fn new(inner: &'w mut W) -> Self { Self { inner } }
}

#[async_trait]
impl<'w, W> StructuredWriter for JsonSeqWriter<'w, W>
where
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    async fn set_structured_event(&mut self, _format: Format, mut event: BodyStream<'_>) -> Result<()> {
        self.inner.write_all(&[RS]).await?;
        while let Some(chunk) = event.try_next().await? {
            if chunk.contains(&RS) {
                return Err(Error::InvalidRecord(chunk));
            }
            self.inner.write_all(&chunk).await?;
        }
        self.inner.write_all(&[LF]).await?;
        Ok(())
    }
}

impl<W> WriterPair for JsonSeqWriter<'_, W>
where
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    fn structured_writer(&mut self) -> Option<&mut dyn StructuredWriter> { Some(self) }

    fn binary_writer(&mut self) -> Option<&mut dyn BinaryWriter> { None }
}
