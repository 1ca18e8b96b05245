//! Reading a batch of events from one HTTP request or response.

use std::io;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use http::{HeaderMap, Request, Response};
use multer::Multipart;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::{debug, warn};

use super::{
    content_type::{BatchFraming, negotiate},
    jsonseq::JsonSeqCodec,
    message::HttpMessage,
    multipart::MultipartError,
};
use crate::{
    Error,
    Result,
    binding::{Message, MultiMessage, StructuredMessage},
    config::ReaderConfig,
    format::Format,
    metrics::{self, Direction, Framing},
};

/// Parts of a `multipart/cloudevents` body, one [`HttpMessage`] per part.
///
/// Each part body streams straight from the underlying reader; unread bytes
/// of a part are skipped when the next part is read.
pub struct MultipartMultiMessage {
    parts: Option<Multipart<'static>>,
    exhausted: bool,
}

impl MultipartMultiMessage {
    /// Read the parts of `body` delimited by `boundary`.
    pub fn new<R>(body: R, boundary: &str, config: &ReaderConfig) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let parts =
            Multipart::with_reader_with_constraints(body, boundary, config.multipart_constraints());
        Self {
            parts: Some(parts),
            exhausted: false,
        }
    }
}

#[async_trait]
impl MultiMessage for MultipartMultiMessage {
    type Message<'a>
        = HttpMessage<'a>
    where
        Self: 'a;

    async fn read<'a>(&'a mut self) -> Result<Option<Self::Message<'a>>> {
        let parts = self.parts.as_mut().ok_or(Error::Finished)?;
        if self.exhausted {
            return Ok(None);
        }
        match parts.next_field().await {
            Ok(Some(part)) => {
                metrics::inc_elements(Framing::Multipart, Direction::Inbound);
                let headers = part.headers().clone();
                let body = part.map_err(|error| io::Error::from(MultipartError::Parse(error)));
                Ok(Some(HttpMessage::new(headers, Box::pin(body))))
            }
            Ok(None) => {
                debug!("multipart batch exhausted");
                self.exhausted = true;
                Ok(None)
            }
            Err(error) => {
                warn!(%error, "rejecting multipart part");
                metrics::inc_rejected(Framing::Multipart);
                Err(error.into())
            }
        }
    }

    async fn finish(&mut self, error: Option<&Error>) -> Result<()> {
        if let Some(error) = error {
            debug!(%error, "multipart batch finished with error");
        }
        self.parts = None;
        Ok(())
    }
}

/// Records of an `application/cloudevents-stream` body, one
/// [`StructuredMessage`] per record.
///
/// A rejected record fails only its own read; later reads carry on with the
/// records after it.
pub struct JsonStreamingMultiMessage<R> {
    frames: Option<FramedRead<R, JsonSeqCodec>>,
    exhausted: bool,
    // `FramedRead` yields one `None` after a decode error.
    resuming: bool,
}

impl<R> JsonStreamingMultiMessage<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Read the records of `body`.
    pub fn new(body: R, config: &ReaderConfig) -> Self {
        Self {
            frames: Some(FramedRead::new(body, JsonSeqCodec::new(config.max_record_length))),
            exhausted: false,
            resuming: false,
        }
    }
}

#[async_trait]
impl<R> MultiMessage for JsonStreamingMultiMessage<R>
where
    R: AsyncRead + Unpin + Send,
{
    type Message<'a>
        = StructuredMessage
    where
        Self: 'a;

    async fn read<'a>(&'a mut self) -> Result<Option<Self::Message<'a>>> {
        let frames = self.frames.as_mut().ok_or(Error::Finished)?;
        if self.exhausted {
            return Ok(None);
        }
        let mut next = frames.next().await;
        if std::mem::take(&mut self.resuming) && next.is_none() {
            next = frames.next().await;
        }
        match next {
            Some(Ok(payload)) => {
                metrics::inc_elements(Framing::JsonSeq, Direction::Inbound);
                Ok(Some(StructuredMessage::new(Format::Json, payload)))
            }
            Some(Err(error)) => {
                warn!(%error, "rejecting json-seq record");
                metrics::inc_rejected(Framing::JsonSeq);
                self.resuming = true;
                Err(error)
            }
            None => {
                debug!("json-seq batch exhausted");
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    async fn finish(&mut self, error: Option<&Error>) -> Result<()> {
        if let Some(error) = error {
            debug!(%error, "json-seq batch finished with error");
        }
        self.frames = None;
        Ok(())
    }
}

/// A batch read from HTTP in whichever framing its `Content-Type` announced.
pub enum IncomingMultiMessage<R> {
    /// `multipart/cloudevents`.
    Multipart(MultipartMultiMessage),
    /// `application/cloudevents-stream`.
    JsonSeq(JsonStreamingMultiMessage<R>),
}

impl<R> IncomingMultiMessage<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Select the framing from `headers` and wrap `body`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEncoding`] or [`Error::MissingBoundary`] as
    /// described on [`multi_message_from_request`]; nothing is read from
    /// `body` in that case.
    pub fn from_parts(headers: &HeaderMap, body: R, config: &ReaderConfig) -> Result<Self> {
        Ok(match negotiate(headers)? {
            BatchFraming::Multipart { boundary } => {
                Self::Multipart(MultipartMultiMessage::new(body, &boundary, config))
            }
            BatchFraming::JsonSeq => Self::JsonSeq(JsonStreamingMultiMessage::new(body, config)),
        })
    }

    /// Framing in use.
    #[must_use]
    pub fn framing(&self) -> Framing {
        match self {
            Self::Multipart(_) => Framing::Multipart,
            Self::JsonSeq(_) => Framing::JsonSeq,
        }
    }
}

#[async_trait]
impl<R> MultiMessage for IncomingMultiMessage<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    type Message<'a>
        = Box<dyn Message + 'a>
    where
        Self: 'a;

    async fn read<'a>(&'a mut self) -> Result<Option<Self::Message<'a>>> {
        Ok(match self {
            Self::Multipart(multi) => multi
                .read()
                .await?
                .map(|message| Box::new(message) as Box<dyn Message + 'a>),
            Self::JsonSeq(multi) => multi
                .read()
                .await?
                .map(|message| Box::new(message) as Box<dyn Message + 'a>),
        })
    }

    async fn finish(&mut self, error: Option<&Error>) -> Result<()> {
        match self {
            Self::Multipart(multi) => multi.finish(error).await,
            Self::JsonSeq(multi) => multi.finish(error).await,
        }
    }
}

/// Read the batch carried by `request` with default limits.
///
/// `multipart/cloudevents` (with a `boundary` parameter) selects MIME
/// multipart; `application/cloudevents-stream` selects a JSON text sequence.
///
/// # Errors
///
/// Returns [`Error::UnknownEncoding`] for any other or missing
/// `Content-Type`, and [`Error::MissingBoundary`] for multipart without a
/// boundary.
pub fn multi_message_from_request<B>(request: Request<B>) -> Result<IncomingMultiMessage<B>>
where
    B: AsyncRead + Unpin + Send + 'static,
{
    multi_message_from_request_with_config(request, &ReaderConfig::default())
}

/// Read the batch carried by `request` with the limits in `config`.
///
/// # Errors
///
/// See [`multi_message_from_request`].
pub fn multi_message_from_request_with_config<B>(
    request: Request<B>,
    config: &ReaderConfig,
) -> Result<IncomingMultiMessage<B>>
where
    B: AsyncRead + Unpin + Send + 'static,
{
    let (parts, body) = request.into_parts();
    IncomingMultiMessage::from_parts(&parts.headers, body, config)
}

/// Read the batch carried by `response` with default limits.
///
/// # Errors
///
/// See [`multi_message_from_request`].
pub fn multi_message_from_response<B>(response: Response<B>) -> Result<IncomingMultiMessage<B>>
where
    B: AsyncRead + Unpin + Send + 'static,
{
    multi_message_from_response_with_config(response, &ReaderConfig::default())
}

/// Read the batch carried by `response` with the limits in `config`.
///
/// # Errors
///
/// See [`multi_message_from_request`].
pub fn multi_message_from_response_with_config<B>(
    response: Response<B>,
    config: &ReaderConfig,
) -> Result<IncomingMultiMessage<B>>
where
    B: AsyncRead + Unpin + Send + 'static,
{
    let (parts, body) = response.into_parts();
    IncomingMultiMessage::from_parts(&parts.headers, body, config)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use http::{HeaderValue, header::CONTENT_TYPE};
    use rstest::rstest;
    use tracing_test::traced_test;

    use super::*;
    use crate::binding::Replay;

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[traced_test]
    #[tokio::test]
    async fn json_seq_end_is_sticky_until_finish() {
        let body = Cursor::new(b"\x1e{}\n".to_vec());
        let mut multi = JsonStreamingMultiMessage::new(body, &ReaderConfig::default());
        assert!(multi.read().await.expect("record").is_some());
        assert!(multi.read().await.expect("end").is_none());
        assert!(multi.read().await.expect("still end").is_none());
        assert!(logs_contain("json-seq batch exhausted"));

        multi.finish(None).await.expect("finish");
        assert_eq!(multi.replay(), Replay::Terminal);
        assert!(matches!(multi.read().await, Err(Error::Finished)));
    }

    #[tokio::test]
    async fn multipart_read_after_finish_fails() {
        let body = Cursor::new(b"--b\r\n\r\n\r\n--b--\r\n".to_vec());
        let mut multi = MultipartMultiMessage::new(body, "b", &ReaderConfig::default());
        multi.finish(None).await.expect("finish");
        assert!(matches!(multi.read().await, Err(Error::Finished)));
    }

    #[tokio::test]
    async fn multipart_part_without_event_headers_is_unknown() {
        let body = Cursor::new(b"--b\r\nx-note: hi\r\n\r\nhello\r\n--b--\r\n".to_vec());
        let mut multi = MultipartMultiMessage::new(body, "b", &ReaderConfig::default());
        let message = multi.read().await.expect("read").expect("part");
        assert_eq!(message.encoding(), crate::binding::Encoding::Unknown);
        drop(message);
        assert!(multi.read().await.expect("end").is_none());
    }

    #[traced_test]
    #[tokio::test]
    async fn json_seq_reading_continues_past_rejected_record() {
        let body = Cursor::new(b"\x1e[1]\n\x1e{\"broken\":1}\x1e[2]\n".to_vec());
        let mut multi = JsonStreamingMultiMessage::new(body, &ReaderConfig::default());
        assert!(multi.read().await.expect("first").is_some());
        assert!(matches!(multi.read().await, Err(Error::InvalidRecord(_))));
        assert!(multi.read().await.expect("after rejection").is_some());
        assert!(multi.read().await.expect("end").is_none());
        assert!(logs_contain("rejecting json-seq record"));
    }

    #[traced_test]
    #[rstest]
    #[case("application/cloudevents-stream", Framing::JsonSeq)]
    #[case("multipart/cloudevents; boundary=x", Framing::Multipart)]
    fn framing_choice_is_logged(#[case] content_type: &'static str, #[case] expected: Framing) {
        let multi = IncomingMultiMessage::from_parts(
            &headers(content_type),
            Cursor::new(Vec::new()),
            &ReaderConfig::default(),
        )
        .expect("framing");
        assert_eq!(multi.framing(), expected);
        assert!(logs_contain("batch framing selected"));
    }
}
