//! Structured event formats.
//!
//! A [`Format`] serializes a whole [`Event`] into one opaque blob and back.
//! The blob travels with the format's media type so a receiver can pick the
//! matching decoder.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::value::RawValue;
use thiserror::Error;

use crate::event::{Attribute, Event, Value};

/// Media type of the JSON structured format.
pub const JSON_MEDIA_TYPE: &str = "application/cloudevents+json";

/// Errors raised while encoding or decoding a structured event.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The JSON document could not be parsed or produced.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// A required attribute was absent from the document.
    #[error("missing required attribute `{0}`")]
    MissingAttribute(&'static str),

    /// An extension member held a value that is not a bool, integer or string.
    #[error("extension `{name}` has an unsupported value: {reason}")]
    InvalidExtension {
        /// Member name.
        name: String,
        /// Parser message.
        reason: String,
    },

    /// The payload is not UTF-8 and cannot be embedded as JSON text.
    #[error("binary data cannot be embedded in the JSON format")]
    BinaryData,

    /// The document carried `data_base64`, which this format does not decode.
    #[error("`data_base64` payloads are not supported")]
    UnsupportedDataBase64,
}

/// Structured formats supported by `ceframe`.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// The JSON event format.
    Json,
}

impl Format {
    /// The library default (currently [`Format::Json`]).
    pub const DEFAULT: Format = Format::Json;

    /// Media type announcing this format on the wire.
    #[must_use]
    pub fn media_type(self) -> &'static str {
        match self {
            Format::Json => JSON_MEDIA_TYPE,
        }
    }

    /// Find the format named by a `Content-Type` value.
    ///
    /// Parameters such as `charset` are ignored and the comparison is
    /// case-insensitive.
    #[must_use]
    pub fn lookup(content_type: &str) -> Option<Format> {
        let media_type = content_type.split(';').next().unwrap_or_default().trim();
        media_type
            .eq_ignore_ascii_case(JSON_MEDIA_TYPE)
            .then_some(Format::Json)
    }

    /// Serialize `event` into a structured blob.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::BinaryData`] when the payload cannot be
    /// embedded, or a JSON error if serialization fails.
    pub fn marshal(self, event: &Event) -> Result<Vec<u8>, FormatError> {
        match self {
            Format::Json => {
                let data = json_data(event)?;
                Ok(serde_json::to_vec(&JsonEvent { event, data })?)
            }
        }
    }

    /// Deserialize a structured blob into an event.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] if the blob is not a valid event document.
    pub fn unmarshal(self, bytes: &[u8]) -> Result<Event, FormatError> {
        match self {
            Format::Json => unmarshal_json(bytes),
        }
    }
}

impl Default for Format {
    fn default() -> Self { Format::DEFAULT }
}

/// Returns true when `content_type` denotes JSON data.
///
/// An absent content type implies JSON in the JSON event format.
pub(crate) fn is_json_content_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media_type == "application/json" || media_type == "text/json" || media_type.ends_with("+json")
}

enum JsonData {
    Raw(Box<RawValue>),
    Text(String),
}

fn json_data(event: &Event) -> Result<Option<JsonData>, FormatError> {
    let Some(data) = &event.data else {
        return Ok(None);
    };
    let text = std::str::from_utf8(data).map_err(|_| FormatError::BinaryData)?;
    if is_json_content_type(event.data_content_type.as_deref()) {
        if let Ok(raw) = RawValue::from_string(text.to_owned()) {
            return Ok(Some(JsonData::Raw(raw)));
        }
    }
    Ok(Some(JsonData::Text(text.to_owned())))
}

struct JsonEvent<'a> {
    event: &'a Event,
    data: Option<JsonData>,
}

impl Serialize for JsonEvent<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for attribute in Attribute::ALL {
            if let Some(value) = self.event.attribute(attribute) {
                map.serialize_entry(attribute.name(), &value)?;
            }
        }
        for (name, value) in &self.event.extensions {
            map.serialize_entry(name, value)?;
        }
        match &self.data {
            Some(JsonData::Raw(raw)) => map.serialize_entry("data", raw)?,
            Some(JsonData::Text(text)) => map.serialize_entry("data", text)?,
            None => {}
        }
        map.end()
    }
}

fn unmarshal_json(bytes: &[u8]) -> Result<Event, FormatError> {
    let members: BTreeMap<String, Box<RawValue>> = serde_json::from_slice(bytes)?;
    let mut event = Event::default();
    event.spec_version.clear();
    let mut data = None;

    for (name, raw) in members {
        if raw.get() == "null" {
            continue;
        }
        match name.as_str() {
            "data" => data = Some(raw),
            "data_base64" => return Err(FormatError::UnsupportedDataBase64),
            _ => {
                if let Some(attribute) = Attribute::from_name(&name) {
                    let text: String = serde_json::from_str(raw.get())?;
                    event.set_attribute(attribute, Some(Value::String(text)));
                } else {
                    let value: Value = serde_json::from_str(raw.get()).map_err(|error| {
                        FormatError::InvalidExtension {
                            name: name.clone(),
                            reason: error.to_string(),
                        }
                    })?;
                    event.extensions.insert(name, value);
                }
            }
        }
    }

    if event.spec_version.is_empty() {
        return Err(FormatError::MissingAttribute("specversion"));
    }
    if let Some(raw) = data {
        let payload = if is_json_content_type(event.data_content_type.as_deref()) {
            Bytes::from(raw.get().to_owned())
        } else {
            let text: String = serde_json::from_str(raw.get())?;
            Bytes::from(text)
        };
        event.data = Some(payload);
    }
    Ok(event)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn sample() -> Event {
        Event::new("A234-1234-1234", "/mycontext", "com.example.someevent")
            .with_extension("extavalue", "aaaa")
            .with_extension("count", 3)
    }

    #[test]
    fn json_data_is_embedded_verbatim() {
        let event = sample().with_data("application/json", r#"{"id":0,"message":"hello"}"#);
        let blob = Format::Json.marshal(&event).expect("marshal");
        let text = String::from_utf8(blob.clone()).expect("utf8");
        assert!(text.contains(r#""data":{"id":0,"message":"hello"}"#), "{text}");

        let decoded = Format::Json.unmarshal(&blob).expect("unmarshal");
        assert_eq!(decoded, event);
    }

    #[test]
    fn text_data_travels_as_json_string() {
        let event = sample().with_data("text/plain", "hello\nworld");
        let blob = Format::Json.marshal(&event).expect("marshal");
        let decoded = Format::Json.unmarshal(&blob).expect("unmarshal");
        assert_eq!(decoded.data.as_deref(), Some(&b"hello\nworld"[..]));
    }

    #[test]
    fn binary_data_is_rejected() {
        let event = sample().with_data("application/octet-stream", vec![0xff_u8, 0xfe]);
        let err = Format::Json.marshal(&event).expect_err("non utf-8 data");
        assert!(matches!(err, FormatError::BinaryData));
    }

    #[test]
    fn missing_spec_version_is_rejected() {
        let err = Format::Json
            .unmarshal(br#"{"id":"1","source":"/s","type":"t"}"#)
            .expect_err("specversion is required");
        assert!(matches!(err, FormatError::MissingAttribute("specversion")));
    }

    #[test]
    fn null_members_are_absent() {
        let event = Format::Json
            .unmarshal(br#"{"specversion":"1.0","id":"1","source":"/s","type":"t","subject":null}"#)
            .expect("unmarshal");
        assert_eq!(event.subject, None);
    }

    #[rstest]
    #[case("application/cloudevents+json", Some(Format::Json))]
    #[case("Application/CloudEvents+JSON; charset=utf-8", Some(Format::Json))]
    #[case("application/json", None)]
    fn lookup_by_media_type(#[case] content_type: &str, #[case] expected: Option<Format>) {
        assert_eq!(Format::lookup(content_type), expected);
    }
}
