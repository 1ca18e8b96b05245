//! A message carried by HTTP header fields and a body.

use async_trait::async_trait;
use http::{HeaderMap, header::CONTENT_TYPE};

use super::headers::{Field, SPEC_VERSION_HEADER, field_for_header};
use crate::{
    Error,
    Result,
    binding::{BinaryWriter, BodyStream, Encoding, Message, StructuredWriter},
    event::Value,
    format::Format,
};

/// One event read from HTTP headers plus a streamed body.
///
/// Used for whole requests and responses as well as for each multipart part.
/// The encoding is structured when `Content-Type` names a known format,
/// binary when `ce-specversion` is present, and unknown otherwise. The body
/// can be read once.
pub struct HttpMessage<'a> {
    headers: HeaderMap,
    body: Option<BodyStream<'a>>,
    format: Option<Format>,
    encoding: Encoding,
}

impl<'a> HttpMessage<'a> {
    /// Wrap `headers` and `body`, detecting the encoding from the headers.
    pub fn new(headers: HeaderMap, body: BodyStream<'a>) -> Self {
        let format = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(Format::lookup);
        let encoding = if format.is_some() {
            Encoding::Structured
        } else if headers.contains_key(SPEC_VERSION_HEADER) {
            Encoding::Binary
        } else {
            Encoding::Unknown
        };
        Self {
            headers,
            body: Some(body),
            format,
            encoding,
        }
    }

    /// Header fields of the message.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    fn take_body(&mut self) -> Result<BodyStream<'a>> { self.body.take().ok_or(Error::BodyConsumed) }
}

#[async_trait]
impl<'a> Message for HttpMessage<'a> {
    fn encoding(&self) -> Encoding { self.encoding }

    async fn read_structured(&mut self, writer: &mut dyn StructuredWriter) -> Result<()> {
        let Some(format) = self.format else {
            return Err(Error::NotStructured);
        };
        let body = self.take_body()?;
        writer.set_structured_event(format, body).await
    }

    async fn read_binary(&mut self, writer: &mut dyn BinaryWriter) -> Result<()> {
        if self.encoding != Encoding::Binary {
            return Err(Error::NotBinary);
        }
        let body = self.take_body()?;
        writer.start().await?;
        for name in self.headers.keys() {
            let Some(field) = field_for_header(name) else {
                continue;
            };
            let Some(value) = self.headers.get(name) else {
                continue;
            };
            let value = value
                .to_str()
                .map_err(|error| Error::invalid_header(name.as_str(), error))?;
            match field {
                Field::Attribute(attribute) => {
                    writer.set_attribute(attribute, Some(Value::from(value)))?;
                }
                Field::Extension(extension) => {
                    writer.set_extension(&extension, Some(Value::from(value)))?;
                }
            }
        }
        writer.set_data(body).await?;
        writer.end().await
    }

    async fn finish(&mut self, _error: Option<&Error>) -> Result<()> {
        self.body = None;
        Ok(())
    }
}
