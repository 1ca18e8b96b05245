//! Destination-side writer contracts.
//!
//! A destination offers a [`StructuredWriter`], a [`BinaryWriter`], or both.
//! [`WriterPair`] lets the pump ask which paths a destination supports before
//! committing to one.

use async_trait::async_trait;

use super::BodyStream;
use crate::{
    Result,
    event::{Attribute, Value},
    format::Format,
};

/// Sink accepting a whole event serialized in a structured format.
#[async_trait]
pub trait StructuredWriter: Send {
    /// Write the serialized event read from `event`, tagged with `format`.
    ///
    /// Called at most once per message.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be read or the sink rejects it.
    async fn set_structured_event(&mut self, format: Format, event: BodyStream<'_>) -> Result<()>;
}

/// Sink accepting an event field by field.
///
/// Calls follow `start → {set_attribute | set_extension}* → set_data? → end`.
/// Every name is set at most once and every field set precedes `set_data`.
#[async_trait]
pub trait BinaryWriter: Send {
    /// Begin writing a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot accept a new message.
    async fn start(&mut self) -> Result<()>;

    /// Set or, with `None`, erase a context attribute.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot represent the value.
    fn set_attribute(&mut self, attribute: Attribute, value: Option<Value>) -> Result<()>;

    /// Set or, with `None`, erase an extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot represent the name or value.
    fn set_extension(&mut self, name: &str, value: Option<Value>) -> Result<()>;

    /// Stream the event payload into the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be read or written.
    async fn set_data(&mut self, data: BodyStream<'_>) -> Result<()>;

    /// Commit the message.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails to finalise the message.
    async fn end(&mut self) -> Result<()>;
}

#[async_trait]
impl<W: StructuredWriter + ?Sized> StructuredWriter for &mut W {
    async fn set_structured_event(&mut self, format: Format, event: BodyStream<'_>) -> Result<()> {
        (**self).set_structured_event(format, event).await
    }
}

#[async_trait]
impl<W: StructuredWriter + ?Sized> StructuredWriter for Box<W> {
    async fn set_structured_event(&mut self, format: Format, event: BodyStream<'_>) -> Result<()> {
        (**self).set_structured_event(format, event).await
    }
}

#[async_trait]
impl<W: BinaryWriter + ?Sized> BinaryWriter for &mut W {
    async fn start(&mut self) -> Result<()> { (**self).start().await }

    fn set_attribute(&mut self, attribute: Attribute, value: Option<Value>) -> Result<()> {
        (**self).set_attribute(attribute, value)
    }

    fn set_extension(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        (**self).set_extension(name, value)
    }

    async fn set_data(&mut self, data: BodyStream<'_>) -> Result<()> {
        (**self).set_data(data).await
    }

    async fn end(&mut self) -> Result<()> { (**self).end().await }
}

#[async_trait]
impl<W: BinaryWriter + ?Sized> BinaryWriter for Box<W> {
    async fn start(&mut self) -> Result<()> { (**self).start().await }

    fn set_attribute(&mut self, attribute: Attribute, value: Option<Value>) -> Result<()> {
        (**self).set_attribute(attribute, value)
    }

    fn set_extension(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        (**self).set_extension(name, value)
    }

    async fn set_data(&mut self, data: BodyStream<'_>) -> Result<()> {
        (**self).set_data(data).await
    }

    async fn end(&mut self) -> Result<()> { (**self).end().await }
}

/// A destination exposing zero, one or both writer paths.
///
/// Implementations that support both paths usually return `Some(self)` from
/// each accessor.
pub trait WriterPair: Send {
    /// The structured path, if this destination offers one.
    fn structured_writer(&mut self) -> Option<&mut dyn StructuredWriter>;

    /// The binary path, if this destination offers one.
    fn binary_writer(&mut self) -> Option<&mut dyn BinaryWriter>;
}

/// Two independent writers presented as one [`WriterPair`].
///
/// Used by [`write`](super::write) to accept its optional writer arguments.
pub struct Writers<'s, 'b> {
    structured: Option<&'s mut dyn StructuredWriter>,
    binary: Option<&'b mut dyn BinaryWriter>,
}

impl<'s, 'b> Writers<'s, 'b> {
    /// Pair up optional structured and binary writers.
    #[must_use]
    pub fn new(
        structured: Option<&'s mut dyn StructuredWriter>,
        binary: Option<&'b mut dyn BinaryWriter>,
    ) -> Self {
        Self { structured, binary }
    }
}

impl WriterPair for Writers<'_, '_> {
    fn structured_writer(&mut self) -> Option<&mut dyn StructuredWriter> {
        let writer = self.structured.as_deref_mut()?;
        Some(writer)
    }

    fn binary_writer(&mut self) -> Option<&mut dyn BinaryWriter> {
        let writer = self.binary.as_deref_mut()?;
        Some(writer)
    }
}
