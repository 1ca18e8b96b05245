//! Mapping between event fields and HTTP header fields.
//!
//! Attribute `x` travels as `ce-x`, except `datacontenttype` which uses
//! `Content-Type`; extension `e` travels as `ce-e`. Values are written in
//! their display form and read back as strings.

use http::{HeaderName, HeaderValue, header::CONTENT_TYPE};

use crate::{
    Error,
    Result,
    event::{Attribute, Value},
};

/// Prefix shared by every event header.
pub const HEADER_PREFIX: &str = "ce-";

/// Header carrying `specversion`; its presence marks a binary message.
pub const SPEC_VERSION_HEADER: HeaderName = HeaderName::from_static("ce-specversion");

/// Header field carrying `attribute`.
#[must_use]
pub fn attribute_header(attribute: Attribute) -> HeaderName {
    match attribute {
        Attribute::SpecVersion => SPEC_VERSION_HEADER,
        Attribute::Id => HeaderName::from_static("ce-id"),
        Attribute::Source => HeaderName::from_static("ce-source"),
        Attribute::Type => HeaderName::from_static("ce-type"),
        Attribute::Subject => HeaderName::from_static("ce-subject"),
        Attribute::Time => HeaderName::from_static("ce-time"),
        Attribute::DataContentType => CONTENT_TYPE,
        Attribute::DataSchema => HeaderName::from_static("ce-dataschema"),
    }
}

/// Header field carrying the extension `name`.
///
/// # Errors
///
/// Returns [`Error::InvalidHeader`] if `name` cannot form a header name.
pub fn extension_header(name: &str) -> Result<HeaderName> {
    let header = format!("{HEADER_PREFIX}{name}");
    HeaderName::from_bytes(header.as_bytes()).map_err(|error| Error::invalid_header(header, error))
}

/// Header value carrying `value`.
///
/// # Errors
///
/// Returns [`Error::InvalidHeader`] if the display form of `value` is not a
/// valid HTTP field value.
pub fn header_value(name: &HeaderName, value: &Value) -> Result<HeaderValue> {
    HeaderValue::from_str(&value.to_string()).map_err(|error| Error::invalid_header(name.as_str(), error))
}

/// Event field a header carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Field {
    /// A context attribute.
    Attribute(Attribute),
    /// An extension, by lower-case name.
    Extension(String),
}

/// Event field carried by `name`, if any.
#[must_use]
pub fn field_for_header(name: &HeaderName) -> Option<Field> {
    if name == CONTENT_TYPE {
        return Some(Field::Attribute(Attribute::DataContentType));
    }
    let suffix = name.as_str().strip_prefix(HEADER_PREFIX)?;
    if suffix.is_empty() {
        return None;
    }
    // `datacontenttype` only travels as Content-Type.
    match Attribute::from_name(suffix) {
        Some(Attribute::DataContentType) => None,
        Some(attribute) => Some(Field::Attribute(attribute)),
        None => Some(Field::Extension(suffix.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn every_attribute_maps_back() {
        for attribute in Attribute::ALL {
            assert_eq!(
                field_for_header(&attribute_header(attribute)),
                Some(Field::Attribute(attribute))
            );
        }
    }

    #[rstest]
    #[case("extavalue")]
    #[case("ExtB")]
    fn extensions_map_to_lower_case_headers(#[case] name: &str) {
        let header = extension_header(name).expect("header");
        assert_eq!(header.as_str(), format!("ce-{}", name.to_ascii_lowercase()));
        assert_eq!(
            field_for_header(&header),
            Some(Field::Extension(name.to_ascii_lowercase()))
        );
    }

    #[test]
    fn non_event_headers_are_ignored() {
        assert_eq!(field_for_header(&HeaderName::from_static("x-request-id")), None);
        assert_eq!(field_for_header(&HeaderName::from_static("ce-")), None);
    }

    #[test]
    fn values_use_display_form() {
        let name = HeaderName::from_static("ce-count");
        assert_eq!(header_value(&name, &Value::Integer(42)).expect("value"), "42");
        assert_eq!(header_value(&name, &Value::Bool(false)).expect("value"), "false");
    }

    #[test]
    fn control_characters_are_rejected() {
        let name = HeaderName::from_static("ce-subject");
        let err = header_value(&name, &Value::from("line\nbreak")).expect_err("newline");
        assert!(matches!(err, Error::InvalidHeader { .. }));
    }
}
