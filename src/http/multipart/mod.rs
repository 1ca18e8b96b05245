//! MIME multipart framing.
//!
//! Incoming bodies are split into parts by [`multer`], which streams each part
//! body without buffering it whole; [`MultipartWriter`] emits parts into any
//! `AsyncWrite`.

mod writer;

use std::io;

use thiserror::Error;

pub use self::writer::MultipartWriter;

/// Default limit on one part body (16 MiB).
pub const DEFAULT_PART_LENGTH: u64 = 16 * 1024 * 1024;

/// Longest boundary RFC 2046 allows.
pub const MAX_BOUNDARY_LENGTH: usize = 70;

/// Errors raised while framing a multipart body.
#[derive(Debug, Error)]
pub enum MultipartError {
    /// The boundary is empty, too long, or uses characters RFC 2046 forbids.
    #[error("invalid boundary: {0:?}")]
    InvalidBoundary(String),

    /// The body could not be split into parts.
    #[error(transparent)]
    Parse(#[from] multer::Error),
}

impl MultipartError {
    /// Returns true if the body ended before the closing delimiter.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        matches!(
            self,
            Self::Parse(
                multer::Error::IncompleteStream
                    | multer::Error::IncompleteFieldData { .. }
                    | multer::Error::IncompleteHeaders { .. }
            )
        )
    }
}

/// Read failures of the underlying body come back as they were; framing
/// failures travel wrapped so [`crate::Error`] can recover them.
impl From<MultipartError> for io::Error {
    fn from(error: MultipartError) -> Self {
        match error {
            MultipartError::Parse(multer::Error::StreamReadFailed(inner)) => {
                match inner.downcast::<io::Error>() {
                    Ok(io) => *io,
                    Err(other) => io::Error::other(other),
                }
            }
            other => {
                let kind = if other.is_truncated() {
                    io::ErrorKind::UnexpectedEof
                } else {
                    io::ErrorKind::InvalidData
                };
                io::Error::new(kind, other)
            }
        }
    }
}

/// Check `boundary` against RFC 2046 `bchars`.
pub(crate) fn validate_boundary(boundary: &str) -> Result<(), MultipartError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || "'()+_,-./:=? ".contains(c);
    let valid = !boundary.is_empty()
        && boundary.len() <= MAX_BOUNDARY_LENGTH
        && boundary.chars().all(allowed)
        && !boundary.ends_with(' ');
    if valid {
        Ok(())
    } else {
        Err(MultipartError::InvalidBoundary(boundary.to_owned()))
    }
}

/// A fresh random boundary.
#[must_use]
pub fn random_boundary() -> String { uuid::Uuid::new_v4().simple().to_string() }

#[cfg(test)]
mod tests;
