//! Response sinks for the response transports.

use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode, header::CONNECTION};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A response under construction: mutable headers until the head is written,
/// then a byte sink for the body.
#[async_trait]
pub trait ResponseWriter: AsyncWrite + Unpin + Send {
    /// Headers that will be sent with the head.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commit the status line and headers. Must precede any body byte.
    ///
    /// # Errors
    ///
    /// Returns an error if the head was already written or cannot be sent.
    async fn write_head(&mut self, status: StatusCode) -> io::Result<()>;
}

/// Collects a response in memory.
///
/// Writing body bytes before [`ResponseWriter::write_head`] commits an
/// implicit `200 OK`. Header changes after the head is committed are not
/// part of the response.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    headers: HeaderMap,
    head: Option<(StatusCode, HeaderMap)>,
    body: BytesMut,
}

impl BufferedResponse {
    /// An empty response with no head written.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Status committed so far.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> { self.head.as_ref().map(|(status, _)| *status) }

    /// Body bytes written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] { &self.body }

    /// Build the final response.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        let (status, headers) = self.head.unwrap_or((StatusCode::OK, self.headers));
        let mut response = Response::new(self.body.freeze());
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }

    fn commit(&mut self, status: StatusCode) {
        if self.head.is_none() {
            self.head = Some((status, self.headers.clone()));
        }
    }
}

#[async_trait]
impl ResponseWriter for BufferedResponse {
    fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }

    async fn write_head(&mut self, status: StatusCode) -> io::Result<()> {
        if self.head.is_some() {
            return Err(io::Error::other("response head already written"));
        }
        self.commit(status);
        Ok(())
    }
}

impl AsyncWrite for BufferedResponse {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        self.commit(StatusCode::OK);
        self.body.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> { Poll::Ready(Ok(())) }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Streams an HTTP/1.1 response into `W`.
///
/// The body is delimited by closing the connection, so the head always
/// carries `connection: close`. Body writes before the head fail.
pub struct StreamingResponse<W> {
    inner: W,
    headers: HeaderMap,
    head_written: bool,
}

impl<W> StreamingResponse<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Stream a response into `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            headers: HeaderMap::new(),
            head_written: false,
        }
    }

    /// Release the response, returning the underlying sink.
    pub fn into_inner(self) -> W { self.inner }
}

#[async_trait]
impl<W> ResponseWriter for StreamingResponse<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }

    async fn write_head(&mut self, status: StatusCode) -> io::Result<()> {
        if self.head_written {
            return Err(io::Error::other("response head already written"));
        }
        let mut head = BytesMut::new();
        head.put_slice(
            format!(
                "HTTP/1.1 {} {}\r\n",
                status.as_str(),
                status.canonical_reason().unwrap_or_default()
            )
            .as_bytes(),
        );
        for (name, value) in &self.headers {
            head.put_slice(name.as_str().as_bytes());
            head.put_slice(b": ");
            head.put_slice(value.as_bytes());
            head.put_slice(b"\r\n");
        }
        if !self.headers.contains_key(CONNECTION) {
            head.put_slice(b"connection: close\r\n");
        }
        head.put_slice(b"\r\n");
        self.inner.write_all(&head).await?;
        self.head_written = true;
        Ok(())
    }
}

impl<W> AsyncWrite for StreamingResponse<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        if !self.head_written {
            return Poll::Ready(Err(io::Error::other("response head not written")));
        }
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use http::{HeaderValue, header::CONTENT_TYPE};

    use super::*;

    #[tokio::test]
    async fn buffered_head_snapshots_headers() {
        let mut response = BufferedResponse::new();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        response.write_head(StatusCode::ACCEPTED).await.expect("head");
        response
            .headers_mut()
            .insert("x-late", HeaderValue::from_static("ignored"));
        response.write_all(b"body").await.expect("body");

        let response = response.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert!(!response.headers().contains_key("x-late"));
        assert_eq!(response.body(), "body");
    }

    #[tokio::test]
    async fn buffered_body_implies_ok() {
        let mut response = BufferedResponse::new();
        response.write_all(b"x").await.expect("body");
        assert_eq!(response.status(), Some(StatusCode::OK));
        assert!(response.write_head(StatusCode::CREATED).await.is_err());
    }

    #[tokio::test]
    async fn streaming_head_precedes_body() {
        let mut response = StreamingResponse::new(Vec::new());
        assert!(response.write_all(b"early").await.is_err());

        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        response.write_head(StatusCode::OK).await.expect("head");
        response.write_all(b"body").await.expect("body");

        let wire = response.into_inner();
        assert_eq!(
            wire,
            b"HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\nconnection: close\r\n\r\nbody"
        );
    }
}
