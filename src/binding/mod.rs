//! Protocol-agnostic binding core.
//!
//! A [`Message`] is one encoded event read from some transport. The pump
//! ([`write`] / [`write_to`]) moves it into a destination's
//! [`StructuredWriter`] or [`BinaryWriter`], optionally through a list of
//! [`Transformer`]s. A [`MultiMessage`] yields a sequence of messages.
//!
//! Payloads move as [`BodyStream`]s so transports can forward bodies without
//! buffering them.

mod buffered;
mod message;
mod multi;
mod pump;
mod transformer;
mod writer;

use std::{io, pin::Pin};

use bytes::{Bytes, BytesMut};
use futures::{Stream, TryStreamExt, stream};

pub use self::{
    buffered::{BinaryMessage, EventBuilder, EventMessage, StructuredMessage},
    message::{Encoding, Message},
    multi::{GenericMultiMessage, MultiMessage, Replay},
    pump::{to_event, write, write_to},
    transformer::{BinarySink, Capabilities, StructuredSink, Transformer},
    writer::{BinaryWriter, StructuredWriter, WriterPair, Writers},
};

/// Streaming message body.
///
/// Each item yields either a chunk of bytes or an I/O error. Errors raised by
/// the framing layers travel wrapped in the `io::Error` and are recovered by
/// the `From<io::Error>` conversion on [`crate::Error`].
pub type BodyStream<'a> = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + 'a>>;

/// Wrap an in-memory payload as a [`BodyStream`].
///
/// An empty payload yields no chunks.
#[must_use]
pub fn body_from_bytes(bytes: impl Into<Bytes>) -> BodyStream<'static> {
    let bytes = bytes.into();
    Box::pin(stream::iter((!bytes.is_empty()).then_some(Ok(bytes))))
}

/// Drain a [`BodyStream`] into one contiguous buffer.
///
/// # Errors
///
/// Returns the first error yielded by the stream.
pub async fn read_body(mut body: BodyStream<'_>) -> io::Result<Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = body.try_next().await? {
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests;
