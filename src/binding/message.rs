//! Source-side message contract.

use async_trait::async_trait;

use super::{BinaryWriter, StructuredWriter};
use crate::{Error, Result};

/// How a message carries its event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Attributes and extensions in protocol fields, payload in the body.
    Binary,
    /// The whole event serialized in one blob.
    Structured,
    /// An in-memory event; both read paths are available.
    Event,
    /// The message does not declare a recognisable encoding.
    Unknown,
}

impl Encoding {
    /// Lower-case label used in logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Binary => "binary",
            Encoding::Structured => "structured",
            Encoding::Event => "event",
            Encoding::Unknown => "unknown",
        }
    }
}

/// Read-only view of one encoded event.
///
/// Only the read path matching [`Message::encoding`] succeeds; the other
/// fails with [`Error::NotStructured`] or [`Error::NotBinary`]. Stream-backed
/// messages can be read once; a second read fails with
/// [`Error::BodyConsumed`]. Call [`Message::finish`] once the message has
/// been pumped so any underlying resource is released.
#[async_trait]
pub trait Message: Send {
    /// Encoding the message is carried in.
    fn encoding(&self) -> Encoding;

    /// Feed the structured form of the event into `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotStructured`] for messages without a structured
    /// form, or any error raised by the writer or the body.
    async fn read_structured(&mut self, writer: &mut dyn StructuredWriter) -> Result<()> {
        let _ = writer;
        Err(Error::NotStructured)
    }

    /// Feed the event field by field into `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotBinary`] for messages without a binary form, or any
    /// error raised by the writer or the body.
    async fn read_binary(&mut self, writer: &mut dyn BinaryWriter) -> Result<()> {
        let _ = writer;
        Err(Error::NotBinary)
    }

    /// Release resources held by the message.
    ///
    /// `error` is the outcome of processing the message, if it failed.
    ///
    /// # Errors
    ///
    /// Returns an error if releasing the underlying resource fails.
    async fn finish(&mut self, error: Option<&Error>) -> Result<()> {
        let _ = error;
        Ok(())
    }
}

#[async_trait]
impl<M: Message + ?Sized> Message for &mut M {
    fn encoding(&self) -> Encoding { (**self).encoding() }

    async fn read_structured(&mut self, writer: &mut dyn StructuredWriter) -> Result<()> {
        (**self).read_structured(writer).await
    }

    async fn read_binary(&mut self, writer: &mut dyn BinaryWriter) -> Result<()> {
        (**self).read_binary(writer).await
    }

    async fn finish(&mut self, error: Option<&Error>) -> Result<()> {
        (**self).finish(error).await
    }
}

#[async_trait]
impl<M: Message + ?Sized> Message for Box<M> {
    fn encoding(&self) -> Encoding { (**self).encoding() }

    async fn read_structured(&mut self, writer: &mut dyn StructuredWriter) -> Result<()> {
        (**self).read_structured(writer).await
    }

    async fn read_binary(&mut self, writer: &mut dyn BinaryWriter) -> Result<()> {
        (**self).read_binary(writer).await
    }

    async fn finish(&mut self, error: Option<&Error>) -> Result<()> {
        (**self).finish(error).await
    }
}
