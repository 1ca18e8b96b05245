//! In-memory messages and writers.
//!
//! These hold their whole payload, so they can be read any number of times
//! and double as capturing destinations in tests and adapters.

use async_trait::async_trait;
use bytes::Bytes;

use super::{
    BinaryWriter,
    BodyStream,
    Encoding,
    Message,
    StructuredWriter,
    WriterPair,
    body_from_bytes,
    read_body,
};
use crate::{
    Result,
    event::{Attribute, Event, Value},
    format::Format,
};

/// Feed `event` field by field into `writer`.
pub(crate) async fn write_event_binary(event: &Event, writer: &mut dyn BinaryWriter) -> Result<()> {
    writer.start().await?;
    for attribute in Attribute::ALL {
        if let Some(value) = event.attribute(attribute) {
            writer.set_attribute(attribute, Some(value))?;
        }
    }
    for (name, value) in &event.extensions {
        writer.set_extension(name, Some(value.clone()))?;
    }
    if let Some(data) = &event.data {
        writer.set_data(body_from_bytes(data.clone())).await?;
    }
    writer.end().await
}

/// A message wrapping an in-memory [`Event`].
///
/// Reports [`Encoding::Event`] and serves both read paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventMessage {
    event: Event,
}

impl EventMessage {
    /// Wrap `event`.
    #[must_use]
    pub fn new(event: Event) -> Self { Self { event } }

    /// Borrow the wrapped event.
    #[must_use]
    pub fn event(&self) -> &Event { &self.event }

    /// Unwrap the event.
    #[must_use]
    pub fn into_event(self) -> Event { self.event }
}

impl From<Event> for EventMessage {
    fn from(event: Event) -> Self { Self::new(event) }
}

#[async_trait]
impl Message for EventMessage {
    fn encoding(&self) -> Encoding { Encoding::Event }

    async fn read_structured(&mut self, writer: &mut dyn StructuredWriter) -> Result<()> {
        let blob = Format::DEFAULT.marshal(&self.event)?;
        writer
            .set_structured_event(Format::DEFAULT, body_from_bytes(blob))
            .await
    }

    async fn read_binary(&mut self, writer: &mut dyn BinaryWriter) -> Result<()> {
        write_event_binary(&self.event, writer).await
    }
}

/// A structured blob held in memory.
///
/// As a message it reports [`Encoding::Structured`]; as a
/// [`StructuredWriter`] it captures whatever is written to it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StructuredMessage {
    format: Format,
    bytes: Bytes,
}

impl StructuredMessage {
    /// Wrap a serialized event tagged with `format`.
    #[must_use]
    pub fn new(format: Format, bytes: impl Into<Bytes>) -> Self {
        Self {
            format,
            bytes: bytes.into(),
        }
    }

    /// Serialize `event` with `format`.
    ///
    /// # Errors
    ///
    /// Returns a format error if the event cannot be serialized.
    pub fn from_event(event: &Event, format: Format) -> Result<Self> {
        Ok(Self::new(format, format.marshal(event)?))
    }

    /// Format of the blob.
    #[must_use]
    pub fn format(&self) -> Format { self.format }

    /// The serialized event.
    #[must_use]
    pub fn bytes(&self) -> &Bytes { &self.bytes }

    /// Unwrap the serialized event.
    #[must_use]
    pub fn into_bytes(self) -> Bytes { self.bytes }
}

#[async_trait]
impl Message for StructuredMessage {
    fn encoding(&self) -> Encoding { Encoding::Structured }

    async fn read_structured(&mut self, writer: &mut dyn StructuredWriter) -> Result<()> {
        writer
            .set_structured_event(self.format, body_from_bytes(self.bytes.clone()))
            .await
    }
}

#[async_trait]
impl StructuredWriter for StructuredMessage {
    async fn set_structured_event(&mut self, format: Format, event: BodyStream<'_>) -> Result<()> {
        self.bytes = read_body(event).await?;
        self.format = format;
        Ok(())
    }
}

impl WriterPair for StructuredMessage {
    fn structured_writer(&mut self) -> Option<&mut dyn StructuredWriter> { Some(self) }

    fn binary_writer(&mut self) -> Option<&mut dyn BinaryWriter> { None }
}

/// Attributes, extensions and payload held in memory.
///
/// As a message it reports [`Encoding::Binary`] and replays the fields in the
/// order they were captured; as a [`BinaryWriter`] it captures them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BinaryMessage {
    attributes: Vec<(Attribute, Value)>,
    extensions: Vec<(String, Value)>,
    data: Option<Bytes>,
}

impl BinaryMessage {
    /// Capture every field of `event`.
    #[must_use]
    pub fn from_event(event: &Event) -> Self {
        Self {
            attributes: Attribute::ALL
                .into_iter()
                .filter_map(|attribute| event.attribute(attribute).map(|value| (attribute, value)))
                .collect(),
            extensions: event
                .extensions
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            data: event.data.clone(),
        }
    }

    /// Captured value of `attribute`.
    #[must_use]
    pub fn attribute(&self, attribute: Attribute) -> Option<&Value> {
        self.attributes
            .iter()
            .find_map(|(key, value)| (*key == attribute).then_some(value))
    }

    /// Captured value of the extension `name`.
    #[must_use]
    pub fn extension(&self, name: &str) -> Option<&Value> {
        self.extensions
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    /// Captured extensions in write order.
    pub fn extensions(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.extensions
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Captured payload.
    #[must_use]
    pub fn data(&self) -> Option<&Bytes> { self.data.as_ref() }
}

#[async_trait]
impl Message for BinaryMessage {
    fn encoding(&self) -> Encoding { Encoding::Binary }

    async fn read_binary(&mut self, writer: &mut dyn BinaryWriter) -> Result<()> {
        writer.start().await?;
        for (attribute, value) in &self.attributes {
            writer.set_attribute(*attribute, Some(value.clone()))?;
        }
        for (name, value) in &self.extensions {
            writer.set_extension(name, Some(value.clone()))?;
        }
        if let Some(data) = &self.data {
            writer.set_data(body_from_bytes(data.clone())).await?;
        }
        writer.end().await
    }
}

#[async_trait]
impl BinaryWriter for BinaryMessage {
    async fn start(&mut self) -> Result<()> {
        *self = Self::default();
        Ok(())
    }

    fn set_attribute(&mut self, attribute: Attribute, value: Option<Value>) -> Result<()> {
        self.attributes.retain(|(key, _)| *key != attribute);
        if let Some(value) = value {
            self.attributes.push((attribute, value));
        }
        Ok(())
    }

    fn set_extension(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        self.extensions.retain(|(key, _)| key != name);
        if let Some(value) = value {
            self.extensions.push((name.to_owned(), value));
        }
        Ok(())
    }

    async fn set_data(&mut self, data: BodyStream<'_>) -> Result<()> {
        let data = read_body(data).await?;
        self.data = (!data.is_empty()).then_some(data);
        Ok(())
    }

    async fn end(&mut self) -> Result<()> { Ok(()) }
}

impl WriterPair for BinaryMessage {
    fn structured_writer(&mut self) -> Option<&mut dyn StructuredWriter> { None }

    fn binary_writer(&mut self) -> Option<&mut dyn BinaryWriter> { Some(self) }
}

/// Destination that materializes whatever it is fed into an [`Event`].
///
/// Accepts both paths; structured bodies are decoded by their format.
#[derive(Debug, Default)]
pub struct EventBuilder {
    event: Event,
}

impl EventBuilder {
    /// The event built so far.
    #[must_use]
    pub fn into_event(self) -> Event { self.event }
}

#[async_trait]
impl StructuredWriter for EventBuilder {
    async fn set_structured_event(&mut self, format: Format, event: BodyStream<'_>) -> Result<()> {
        let blob = read_body(event).await?;
        self.event = format.unmarshal(&blob)?;
        Ok(())
    }
}

#[async_trait]
impl BinaryWriter for EventBuilder {
    async fn start(&mut self) -> Result<()> {
        self.event = Event::default();
        self.event.spec_version.clear();
        Ok(())
    }

    fn set_attribute(&mut self, attribute: Attribute, value: Option<Value>) -> Result<()> {
        self.event.set_attribute(attribute, value);
        Ok(())
    }

    fn set_extension(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        self.event.set_extension(name, value);
        Ok(())
    }

    async fn set_data(&mut self, data: BodyStream<'_>) -> Result<()> {
        let data = read_body(data).await?;
        self.event.data = (!data.is_empty()).then_some(data);
        Ok(())
    }

    async fn end(&mut self) -> Result<()> { Ok(()) }
}

impl WriterPair for EventBuilder {
    fn structured_writer(&mut self) -> Option<&mut dyn StructuredWriter> { Some(self) }

    fn binary_writer(&mut self) -> Option<&mut dyn BinaryWriter> { Some(self) }
}
