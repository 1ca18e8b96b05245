//! Hand-built batch bodies.
//!
//! These are assembled byte by byte rather than with the crate's own
//! writers so readers are checked against independent input.

use ceframe::{Event, format::Format};
use http::{HeaderValue, Request, header::CONTENT_TYPE};

/// A `multipart/cloudevents` body under construction.
///
/// ```rust
/// use ceframe_testing::MultipartBody;
///
/// let body = MultipartBody::new("b").part(&[("ce-specversion", "1.0")], "x").finish();
/// assert!(body.ends_with(b"--b--\r\n"));
/// ```
#[derive(Clone, Debug)]
pub struct MultipartBody {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartBody {
    /// Start a body delimited by `boundary`.
    #[must_use]
    pub fn new(boundary: &str) -> Self {
        Self {
            boundary: boundary.to_owned(),
            bytes: Vec::new(),
        }
    }

    /// Text placed before the first delimiter.
    #[must_use]
    pub fn preamble(mut self, text: &str) -> Self {
        self.bytes.extend_from_slice(text.as_bytes());
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    /// Append a part with `headers` and `body`.
    #[must_use]
    pub fn part(mut self, headers: &[(&str, &str)], body: impl AsRef<[u8]>) -> Self {
        self.bytes
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        for (name, value) in headers {
            self.bytes
                .extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        self.bytes.extend_from_slice(b"\r\n");
        self.bytes.extend_from_slice(body.as_ref());
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    /// Append `event` as a binary-mode part.
    #[must_use]
    pub fn binary_part(self, event: &Event) -> Self {
        let mut headers = vec![
            ("ce-specversion".to_owned(), event.spec_version.clone()),
            ("ce-id".to_owned(), event.id.clone()),
            ("ce-source".to_owned(), event.source.clone()),
            ("ce-type".to_owned(), event.ty.clone()),
        ];
        if let Some(content_type) = &event.data_content_type {
            headers.push(("content-type".to_owned(), content_type.clone()));
        }
        for (name, value) in &event.extensions {
            headers.push((format!("ce-{name}"), value.to_string()));
        }
        let headers: Vec<(&str, &str)> = headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        self.part(&headers, event.data.clone().unwrap_or_default())
    }

    /// Append `event` as a structured JSON part.
    ///
    /// # Panics
    ///
    /// Panics if the event cannot be marshalled.
    #[must_use]
    pub fn structured_part(self, event: &Event) -> Self {
        let body = Format::Json.marshal(event).expect("marshal");
        self.part(&[("content-type", Format::Json.media_type())], body)
    }

    /// Close the body with the final delimiter.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.bytes
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.bytes
    }

    /// Close the body and wrap it in a request announcing the boundary.
    ///
    /// # Panics
    ///
    /// Panics if the boundary is not a valid header value.
    #[must_use]
    pub fn into_request(self) -> Request<std::io::Cursor<Vec<u8>>> {
        let content_type = format!("multipart/cloudevents; boundary={}", self.boundary);
        let mut request = Request::new(std::io::Cursor::new(self.finish()));
        request.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&content_type).expect("boundary"),
        );
        request
    }
}

/// An `application/cloudevents-stream` body holding `events` in order.
///
/// # Panics
///
/// Panics if an event cannot be marshalled.
#[must_use]
pub fn json_seq_body(events: &[Event]) -> Vec<u8> {
    let mut body = Vec::new();
    for event in events {
        body.push(0x1E);
        body.extend(Format::Json.marshal(event).expect("marshal"));
        body.push(b'\n');
    }
    body
}
