//! Reader limits for incoming batches.

use multer::{Constraints, SizeLimit};

use crate::http::{
    jsonseq::{DEFAULT_RECORD_LENGTH, clamp_record_length},
    multipart::DEFAULT_PART_LENGTH,
};

/// Limits applied while framing an incoming batch.
///
/// Record lengths passed to the setter are clamped to the range the codec
/// accepts.
///
/// # Examples
///
/// ```
/// use ceframe::config::ReaderConfig;
///
/// let config = ReaderConfig::default()
///     .max_record_length(64 * 1024)
///     .max_part_length(1024 * 1024)
///     .max_batch_length(8 * 1024 * 1024);
///
/// assert_eq!(config.max_record_length, 64 * 1024);
/// assert_eq!(config.max_batch_length, Some(8 * 1024 * 1024));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Maximum length of one JSON text sequence record, separators included.
    ///
    /// Default: 1 MiB.
    pub max_record_length: usize,

    /// Maximum length of one multipart part body.
    ///
    /// Default: 16 MiB.
    pub max_part_length: u64,

    /// Maximum length of a whole multipart body, part headers included.
    ///
    /// Default: unlimited.
    pub max_batch_length: Option<u64>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_record_length: DEFAULT_RECORD_LENGTH,
            max_part_length: DEFAULT_PART_LENGTH,
            max_batch_length: None,
        }
    }
}

impl ReaderConfig {
    /// Set the maximum JSON text sequence record length.
    #[must_use]
    pub fn max_record_length(mut self, length: usize) -> Self {
        self.max_record_length = clamp_record_length(length);
        self
    }

    /// Set the maximum multipart part body length.
    #[must_use]
    pub fn max_part_length(mut self, length: u64) -> Self {
        self.max_part_length = length;
        self
    }

    /// Set the maximum length of a whole multipart body.
    #[must_use]
    pub fn max_batch_length(mut self, length: u64) -> Self {
        self.max_batch_length = Some(length);
        self
    }

    pub(crate) fn multipart_constraints(&self) -> Constraints {
        let mut limit = SizeLimit::new().per_field(self.max_part_length);
        if let Some(length) = self.max_batch_length {
            limit = limit.whole_stream(length);
        }
        Constraints::new().size_limit(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::jsonseq::{MAX_RECORD_LENGTH, MIN_RECORD_LENGTH};

    #[test]
    fn defaults() {
        let config = ReaderConfig::default();
        assert_eq!(config.max_record_length, 1024 * 1024);
        assert_eq!(config.max_part_length, 16 * 1024 * 1024);
        assert_eq!(config.max_batch_length, None);
    }

    #[test]
    fn record_length_is_clamped() {
        let config = ReaderConfig::default().max_record_length(1);
        assert_eq!(config.max_record_length, MIN_RECORD_LENGTH);

        let config = ReaderConfig::default().max_record_length(usize::MAX);
        assert_eq!(config.max_record_length, MAX_RECORD_LENGTH);
    }

    #[test]
    fn multipart_limits_are_set() {
        let config = ReaderConfig::default().max_part_length(10).max_batch_length(100);
        assert_eq!(config.max_part_length, 10);
        assert_eq!(config.max_batch_length, Some(100));
    }
}
