//! Canonical error and result types for the crate.
//!
//! This module defines the single public [`Error`] surface shared by the
//! binding core, the framing codecs and the HTTP transports. End of a
//! multi-message sequence is never an error: readers signal it with
//! `Ok(None)`.

use std::io;

use bytes::Bytes;
use http::StatusCode;
use thiserror::Error;

use crate::{format::FormatError, http::multipart::MultipartError};

/// Top-level error type exposed by `ceframe`.
///
/// Variants are returned to the immediate caller unmodified; nothing in the
/// crate retries.
#[derive(Debug, Error)]
pub enum Error {
    /// The message, request or response does not declare a recognisable
    /// encoding.
    #[error("unknown encoding")]
    UnknownEncoding,

    /// The structured read path was requested on a message that is not
    /// structured.
    #[error("message is not in structured encoding")]
    NotStructured,

    /// The binary read path was requested on a message that is not binary.
    #[error("message is not in binary encoding")]
    NotBinary,

    /// A structured message was offered only a binary destination.
    #[error("cannot convert structured message to binary without materializing the event")]
    StructuredToBinary,

    /// The pump was given neither a structured nor a binary writer.
    #[error("no writer supplied for the message")]
    MissingWriter,

    /// A stream-backed message body was read twice.
    #[error("message body has already been consumed")]
    BodyConsumed,

    /// A terminal multi-message was read after `finish`.
    #[error("multi-message has been finished")]
    Finished,

    /// A JSON text sequence record violated the RS/LF framing.
    #[error("invalid record: {:?}", String::from_utf8_lossy(.0))]
    InvalidRecord(Bytes),

    /// A JSON text sequence record exceeded the configured maximum length.
    #[error("record exceeds max length: {size} > {max}")]
    RecordTooLarge {
        /// Bytes buffered for the record so far.
        size: usize,
        /// Maximum allowed record length.
        max: usize,
    },

    /// The `Content-Type` header could not be parsed as a media type.
    #[error("invalid content type: {0}")]
    InvalidContentType(String),

    /// A `multipart/cloudevents` content type carried no boundary parameter.
    #[error("multipart content type is missing the boundary parameter")]
    MissingBoundary,

    /// MIME multipart framing failed.
    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),

    /// An attribute or extension could not be carried in an HTTP header.
    #[error("invalid header {name}: {reason}")]
    InvalidHeader {
        /// Header or field name involved.
        name: String,
        /// Why the header was rejected.
        reason: String,
    },

    /// The structured format failed to encode or decode an event.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// An error in the underlying body (for example, a closed connection).
    #[error("transport error: {0}")]
    Io(#[source] io::Error),
}

impl Error {
    /// Returns true if the error was caused by what the peer sent rather than
    /// by a local failure.
    ///
    /// Server adapters map these to a `4xx` response.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownEncoding
                | Self::InvalidRecord(_)
                | Self::RecordTooLarge { .. }
                | Self::InvalidContentType(_)
                | Self::MissingBoundary
                | Self::Multipart(_)
                | Self::Format(_)
        )
    }

    /// HTTP status a server adapter should answer with for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    pub(crate) fn invalid_header(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Recover crate errors that travelled through an `io::Error`.
///
/// Body streams and codecs only speak `io::Error`; framing failures raised
/// inside them are unwrapped here so callers still see the original variant.
impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        let wraps_crate_error = error
            .get_ref()
            .is_some_and(|inner| inner.is::<Self>() || inner.is::<MultipartError>());
        if !wraps_crate_error {
            return Self::Io(error);
        }
        match error.into_inner() {
            Some(inner) => match inner.downcast::<Self>() {
                Ok(own) => *own,
                Err(inner) => match inner.downcast::<MultipartError>() {
                    Ok(multipart) => Self::Multipart(*multipart),
                    Err(other) => Self::Io(io::Error::other(other)),
                },
            },
            None => Self::Io(io::Error::other("error payload disappeared")),
        }
    }
}

/// Parser errors go through [`MultipartError`] so a failing body read still
/// surfaces as [`Error::Io`].
impl From<multer::Error> for Error {
    fn from(error: multer::Error) -> Self { io::Error::from(MultipartError::Parse(error)).into() }
}

/// Convert a crate error back into an I/O error.
///
/// Codec errors surface through `tokio_util` as `io::Error`; wrapping keeps
/// the original value reachable through [`io::Error::get_ref`].
impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(inner) => inner,
            other => {
                let kind = if other.is_client_error() {
                    io::ErrorKind::InvalidData
                } else {
                    io::ErrorKind::Other
                };
                io::Error::new(kind, other)
            }
        }
    }
}

/// Canonical result alias used by `ceframe` public APIs.
pub type Result<T> = std::result::Result<T, Error>;
