//! `Content-Type` parsing and batch framing negotiation.

use http::{HeaderMap, header::CONTENT_TYPE};
use tracing::debug;

use super::{JSON_SEQ_CLOUDEVENTS, MULTIPART_CLOUDEVENTS};
use crate::{Error, Result, metrics::Framing};

/// A parsed media type: lower-cased essence plus parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MediaType {
    pub(crate) essence: String,
    params: Vec<(String, String)>,
}

impl MediaType {
    /// Parse `value`, returning `None` when it is not a media type.
    pub(crate) fn parse(value: &str) -> Option<Self> {
        let mut segments = value.split(';');
        let essence = segments.next()?.trim().to_ascii_lowercase();
        let (kind, subtype) = essence.split_once('/')?;
        if kind.is_empty() || subtype.is_empty() || essence.contains(char::is_whitespace) {
            return None;
        }
        let mut params = Vec::new();
        for segment in segments {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (name, raw) = segment.split_once('=')?;
            params.push((name.trim().to_ascii_lowercase(), unquote(raw.trim())));
        }
        Some(Self { essence, params })
    }

    /// Value of the parameter `name` (case-insensitive).
    pub(crate) fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn unquote(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return raw.to_owned();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Batch framing announced by a request or response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum BatchFraming {
    Multipart { boundary: String },
    JsonSeq,
}

impl BatchFraming {
    pub(crate) fn framing(&self) -> Framing {
        match self {
            BatchFraming::Multipart { .. } => Framing::Multipart,
            BatchFraming::JsonSeq => Framing::JsonSeq,
        }
    }
}

/// Choose the batch framing from the `Content-Type` header.
///
/// A `Content-Type` that is absent, unparsable or names another media type
/// yields [`Error::UnknownEncoding`]. Multipart without a `boundary`
/// parameter yields [`Error::MissingBoundary`].
pub(crate) fn negotiate(headers: &HeaderMap) -> Result<BatchFraming> {
    let Some(value) = headers.get(CONTENT_TYPE) else {
        debug!("batch has no content type");
        return Err(Error::UnknownEncoding);
    };
    let value = value
        .to_str()
        .map_err(|_| Error::InvalidContentType(String::from_utf8_lossy(value.as_bytes()).into_owned()))?;
    let Some(media_type) = MediaType::parse(value) else {
        debug!(content_type = value, "unparsable batch content type");
        return Err(Error::UnknownEncoding);
    };
    let framing = match media_type.essence.as_str() {
        MULTIPART_CLOUDEVENTS => {
            let boundary = media_type
                .param("boundary")
                .filter(|boundary| !boundary.is_empty())
                .ok_or(Error::MissingBoundary)?;
            BatchFraming::Multipart {
                boundary: boundary.to_owned(),
            }
        }
        JSON_SEQ_CLOUDEVENTS => BatchFraming::JsonSeq,
        other => {
            debug!(content_type = other, "unsupported batch content type");
            return Err(Error::UnknownEncoding);
        }
    };
    debug!(framing = framing.framing().as_str(), "batch framing selected");
    Ok(framing)
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;
    use rstest::rstest;

    use super::*;

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[rstest]
    #[case("multipart/cloudevents; boundary=abc", "abc")]
    #[case("Multipart/CloudEvents;Boundary=\"a b\\\"c\"", "a b\"c")]
    #[case("multipart/cloudevents; charset=utf-8; boundary=x", "x")]
    fn multipart_boundary_is_extracted(#[case] content_type: &'static str, #[case] boundary: &str) {
        assert_eq!(
            negotiate(&headers(content_type)).expect("multipart"),
            BatchFraming::Multipart {
                boundary: boundary.to_owned()
            }
        );
    }

    #[test]
    fn json_seq_is_selected() {
        assert_eq!(
            negotiate(&headers("application/cloudevents-stream")).expect("json-seq"),
            BatchFraming::JsonSeq
        );
    }

    #[rstest]
    #[case("multipart/cloudevents")]
    #[case("multipart/cloudevents; boundary=")]
    fn multipart_requires_boundary(#[case] content_type: &'static str) {
        assert!(matches!(
            negotiate(&headers(content_type)),
            Err(Error::MissingBoundary)
        ));
    }

    #[rstest]
    #[case("text/plain")]
    #[case("multipart/mixed; boundary=abc")]
    #[case("not a media type")]
    fn other_media_types_are_unknown(#[case] content_type: &'static str) {
        assert!(matches!(
            negotiate(&headers(content_type)),
            Err(Error::UnknownEncoding)
        ));
    }

    #[test]
    fn missing_content_type_is_unknown() {
        assert!(matches!(
            negotiate(&HeaderMap::new()),
            Err(Error::UnknownEncoding)
        ));
    }
}
