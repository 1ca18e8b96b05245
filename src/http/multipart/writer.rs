//! Multipart body writer.

use std::io;

use bytes::{BufMut, BytesMut};
use http::HeaderMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::{MultipartError, random_boundary, validate_boundary};

/// Writes a multipart body into `W`.
///
/// The first part opens with `--boundary`, later parts with
/// `CRLF--boundary`; [`MultipartWriter::close`] emits the closing delimiter.
pub struct MultipartWriter<W> {
    inner: W,
    boundary: String,
    wrote_part: bool,
    closed: bool,
}

impl<W> MultipartWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Write into `inner` using a random boundary.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            boundary: random_boundary(),
            wrote_part: false,
            closed: false,
        }
    }

    /// Write into `inner` using `boundary`.
    ///
    /// # Errors
    ///
    /// Returns [`MultipartError::InvalidBoundary`] if `boundary` breaks the
    /// RFC 2046 character or length rules.
    pub fn with_boundary(inner: W, boundary: impl Into<String>) -> Result<Self, MultipartError> {
        let boundary = boundary.into();
        validate_boundary(&boundary)?;
        Ok(Self {
            inner,
            boundary,
            wrote_part: false,
            closed: false,
        })
    }

    /// Boundary separating the parts.
    #[must_use]
    pub fn boundary(&self) -> &str { &self.boundary }

    /// Mutable access to the underlying sink.
    pub fn get_mut(&mut self) -> &mut W { &mut self.inner }

    /// Open a new part with `headers`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub async fn create_part(&mut self, headers: &HeaderMap) -> io::Result<()> {
        let mut head = BytesMut::new();
        if self.wrote_part {
            head.put_slice(b"\r\n");
        }
        head.put_slice(b"--");
        head.put_slice(self.boundary.as_bytes());
        head.put_slice(b"\r\n");
        for (name, value) in headers {
            head.put_slice(name.as_str().as_bytes());
            head.put_slice(b": ");
            head.put_slice(value.as_bytes());
            head.put_slice(b"\r\n");
        }
        head.put_slice(b"\r\n");
        self.inner.write_all(&head).await?;
        self.wrote_part = true;
        Ok(())
    }

    /// Append `chunk` to the current part body.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> { self.inner.write_all(chunk).await }

    /// Emit the closing delimiter and flush. Later calls do nothing.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub async fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        let closing = format!("\r\n--{}--\r\n", self.boundary);
        self.inner.write_all(closing.as_bytes()).await?;
        self.inner.flush().await?;
        self.closed = true;
        Ok(())
    }

    /// Release the writer, returning the underlying sink.
    pub fn into_inner(self) -> W { self.inner }
}
