//! Writing a [`MultiMessage`] as one HTTP request or response.
//!
//! Every element is pumped into a fresh per-element writer and finished with
//! the outcome. The first failure aborts the transfer; whatever was already
//! written stays written.

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use http::{HeaderMap, HeaderValue, Request, StatusCode, header::CONTENT_TYPE};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::{
    JSON_SEQ_CLOUDEVENTS,
    MULTIPART_CLOUDEVENTS,
    headers::{attribute_header, extension_header, header_value},
    jsonseq::JsonSeqWriter,
    multipart::MultipartWriter,
    response::ResponseWriter,
};
use crate::{
    Error,
    Result,
    binding::{
        BinaryWriter,
        BodyStream,
        Message,
        MultiMessage,
        StructuredWriter,
        Transformer,
        WriterPair,
        write_to,
    },
    event::{Attribute, Value},
    format::Format,
    metrics::{self, Direction, Framing},
};

/// Write `multi` as a `multipart/cloudevents` request body.
///
/// Sets `Content-Type` with a fresh boundary and replaces the body.
///
/// # Errors
///
/// Returns the first error raised while reading, pumping or finishing an
/// element.
pub async fn write_multipart_request<M>(
    multi: &mut M,
    request: &mut Request<Bytes>,
    transformers: &mut [&mut dyn Transformer],
) -> Result<()>
where
    M: MultiMessage,
{
    let mut writer = MultipartWriter::new(Vec::new());
    request
        .headers_mut()
        .insert(CONTENT_TYPE, multipart_content_type(writer.boundary())?);
    drain_multipart(multi, &mut writer, transformers).await?;
    writer.close().await?;
    *request.body_mut() = Bytes::from(writer.into_inner());
    Ok(())
}

/// Write `multi` as an `application/cloudevents-stream` request body.
///
/// # Errors
///
/// Returns the first error raised while reading, pumping or finishing an
/// element.
pub async fn write_json_seq_request<M>(
    multi: &mut M,
    request: &mut Request<Bytes>,
    transformers: &mut [&mut dyn Transformer],
) -> Result<()>
where
    M: MultiMessage,
{
    request
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_SEQ_CLOUDEVENTS));
    let mut body = Vec::new();
    drain_json_seq(multi, &mut body, transformers).await?;
    *request.body_mut() = Bytes::from(body);
    Ok(())
}

/// Stream `multi` as a `multipart/cloudevents` response.
///
/// The head is written with `status` before the first body byte.
///
/// # Errors
///
/// Returns the first error raised while writing the head or reading,
/// pumping or finishing an element.
pub async fn write_multipart_response<M, R>(
    multi: &mut M,
    status: StatusCode,
    response: &mut R,
    transformers: &mut [&mut dyn Transformer],
) -> Result<()>
where
    M: MultiMessage,
    R: ResponseWriter + ?Sized,
{
    let mut writer = MultipartWriter::new(response);
    let content_type = multipart_content_type(writer.boundary())?;
    writer.get_mut().headers_mut().insert(CONTENT_TYPE, content_type);
    writer.get_mut().write_head(status).await?;
    let written = drain_multipart(multi, &mut writer, transformers)
        .await
        .inspect_err(|error| log::warn!("multipart response aborted: {error}"))?;
    writer.close().await?;
    debug!(elements = written, "multipart response complete");
    Ok(())
}

/// Stream `multi` as an `application/cloudevents-stream` response.
///
/// # Errors
///
/// Returns the first error raised while writing the head or reading,
/// pumping or finishing an element.
pub async fn write_json_seq_response<M, R>(
    multi: &mut M,
    status: StatusCode,
    response: &mut R,
    transformers: &mut [&mut dyn Transformer],
) -> Result<()>
where
    M: MultiMessage,
    R: ResponseWriter + ?Sized,
{
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_SEQ_CLOUDEVENTS));
    response.write_head(status).await?;
    let written = drain_json_seq(multi, response, transformers)
        .await
        .inspect_err(|error| log::warn!("json-seq response aborted: {error}"))?;
    response.flush().await?;
    debug!(elements = written, "json-seq response complete");
    Ok(())
}

fn multipart_content_type(boundary: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!("{MULTIPART_CLOUDEVENTS}; boundary={boundary}"))
        .map_err(|error| Error::invalid_header(CONTENT_TYPE.as_str(), error))
}

/// Pump one element and finish it with the outcome.
async fn pump_element<E, D>(
    mut message: E,
    destination: &mut D,
    transformers: &mut [&mut dyn Transformer],
) -> Result<()>
where
    E: Message,
    D: WriterPair + ?Sized,
{
    let result = write_to(&mut message, destination, transformers).await;
    let finished = message.finish(result.as_ref().err()).await;
    result?;
    finished
}

async fn drain_multipart<M, W>(
    multi: &mut M,
    writer: &mut MultipartWriter<W>,
    transformers: &mut [&mut dyn Transformer],
) -> Result<usize>
where
    M: MultiMessage,
    W: AsyncWrite + Unpin + Send,
{
    let mut written = 0;
    while let Some(message) = multi.read().await? {
        let mut part = PartWriter::new(writer);
        pump_element(message, &mut part, transformers).await?;
        metrics::inc_elements(Framing::Multipart, Direction::Outbound);
        written += 1;
    }
    Ok(written)
}

async fn drain_json_seq<M, W>(
    multi: &mut M,
    out: &mut W,
    transformers: &mut [&mut dyn Transformer],
) -> Result<usize>
where
    M: MultiMessage,
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    let mut written = 0;
    while let Some(message) = multi.read().await? {
        let mut record = JsonSeqWriter::new(&mut *out);
        pump_element(message, &mut record, transformers).await?;
        metrics::inc_elements(Framing::JsonSeq, Direction::Outbound);
        written += 1;
    }
    Ok(written)
}

/// Writes one event as one MIME part.
///
/// Binary elements become `ce-*` headers plus the payload as the part body;
/// structured elements become a part typed with the format's media type.
struct PartWriter<'w, W> {
    writer: &'w mut MultipartWriter<W>,
    headers: HeaderMap,
    opened: bool,
}

impl<'w, W> PartWriter<'w, W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn new(writer: &'w mut MultipartWriter<W>) -> Self {
        Self {
            writer,
            headers: HeaderMap::new(),
            opened: false,
        }
    }

    async fn open(&mut self) -> Result<()> {
        self.writer.create_part(&self.headers).await?;
        self.opened = true;
        Ok(())
    }

    async fn copy_body(&mut self, mut body: BodyStream<'_>) -> Result<()> {
        while let Some(chunk) = body.try_next().await? {
            self.writer.write_chunk(&chunk).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<'w, W> StructuredWriter for PartWriter<'w, W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn set_structured_event(&mut self, format: Format, event: BodyStream<'_>) -> Result<()> {
        self.headers.clear();
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(format.media_type()));
        self.open().await?;
        self.copy_body(event).await
    }
}

#[async_trait]
impl<'w, W> BinaryWriter for PartWriter<'w, W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn start(&mut self) -> Result<()> {
        self.headers.clear();
        self.opened = false;
        Ok(())
    }

    fn set_attribute(&mut self, attribute: Attribute, value: Option<Value>) -> Result<()> {
        let name = attribute_header(attribute);
        match value {
            Some(value) => {
                let value = header_value(&name, &value)?;
                self.headers.insert(name, value);
            }
            None => {
                self.headers.remove(name);
            }
        }
        Ok(())
    }

    fn set_extension(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        let name = extension_header(name)?;
        match value {
            Some(value) => {
                let value = header_value(&name, &value)?;
                self.headers.insert(name, value);
            }
            None => {
                self.headers.remove(name);
            }
        }
        Ok(())
    }

    async fn set_data(&mut self, data: BodyStream<'_>) -> Result<()> {
        self.open().await?;
        self.copy_body(data).await
    }

    async fn end(&mut self) -> Result<()> {
        if !self.opened {
            self.open().await?;
        }
        Ok(())
    }
}

impl<W> WriterPair for PartWriter<'_, W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn structured_writer(&mut self) -> Option<&mut dyn StructuredWriter> { Some(self) }

    fn binary_writer(&mut self) -> Option<&mut dyn BinaryWriter> { Some(self) }
}
