//! Minimal in-memory event model consumed by the binding layer.
//!
//! Only the read/write surface the binding needs lives here: attributes,
//! extensions and the data payload. Validation beyond what the structured
//! format requires is left to the application.

pub mod attribute;
pub mod value;

use std::collections::BTreeMap;

pub use attribute::Attribute;
use bytes::Bytes;
pub use value::Value;

/// `specversion` value written by [`Event::new`].
pub const SPEC_VERSION: &str = "1.0";

/// An event materialized in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// `specversion` attribute.
    pub spec_version: String,
    /// `id` attribute.
    pub id: String,
    /// `source` attribute.
    pub source: String,
    /// `type` attribute.
    pub ty: String,
    /// `subject` attribute.
    pub subject: Option<String>,
    /// `time` attribute in RFC 3339 form.
    pub time: Option<String>,
    /// `datacontenttype` attribute.
    pub data_content_type: Option<String>,
    /// `dataschema` attribute.
    pub data_schema: Option<String>,
    /// Extension attributes keyed by name.
    pub extensions: BTreeMap<String, Value>,
    /// Encoded payload.
    pub data: Option<Bytes>,
}

impl Event {
    /// Create an event with the required attributes set.
    ///
    /// # Examples
    ///
    /// ```
    /// use ceframe::event::Event;
    ///
    /// let event = Event::new("42", "/sensors/7", "com.example.reading");
    /// assert_eq!(event.spec_version, "1.0");
    /// ```
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            spec_version: SPEC_VERSION.to_owned(),
            id: id.into(),
            source: source.into(),
            ty: ty.into(),
            subject: None,
            time: None,
            data_content_type: None,
            data_schema: None,
            extensions: BTreeMap::new(),
            data: None,
        }
    }

    /// Set the payload together with its content type.
    #[must_use]
    pub fn with_data(mut self, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.data_content_type = Some(content_type.into());
        self.data = Some(data.into());
        self
    }

    /// Set an extension, replacing any previous value.
    #[must_use]
    pub fn with_extension(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(name.into(), value.into());
        self
    }

    /// Current value of `attribute`, if set.
    #[must_use]
    pub fn attribute(&self, attribute: Attribute) -> Option<Value> {
        let value = match attribute {
            Attribute::SpecVersion => Some(&self.spec_version),
            Attribute::Id => Some(&self.id),
            Attribute::Source => Some(&self.source),
            Attribute::Type => Some(&self.ty),
            Attribute::Subject => self.subject.as_ref(),
            Attribute::Time => self.time.as_ref(),
            Attribute::DataContentType => self.data_content_type.as_ref(),
            Attribute::DataSchema => self.data_schema.as_ref(),
        };
        value.map(|value| Value::String(value.clone()))
    }

    /// Set or erase `attribute`.
    ///
    /// Values are stored in their string form. Erasing a required attribute
    /// leaves it empty.
    pub fn set_attribute(&mut self, attribute: Attribute, value: Option<Value>) {
        let value = value.map(|value| value.to_string());
        match attribute {
            Attribute::SpecVersion => self.spec_version = value.unwrap_or_default(),
            Attribute::Id => self.id = value.unwrap_or_default(),
            Attribute::Source => self.source = value.unwrap_or_default(),
            Attribute::Type => self.ty = value.unwrap_or_default(),
            Attribute::Subject => self.subject = value,
            Attribute::Time => self.time = value,
            Attribute::DataContentType => self.data_content_type = value,
            Attribute::DataSchema => self.data_schema = value,
        }
    }

    /// Current value of the extension `name`, if set.
    #[must_use]
    pub fn extension(&self, name: &str) -> Option<&Value> { self.extensions.get(name) }

    /// Set or erase the extension `name`.
    pub fn set_extension(&mut self, name: &str, value: Option<Value>) {
        match value {
            Some(value) => {
                self.extensions.insert(name.to_owned(), value);
            }
            None => {
                self.extensions.remove(name);
            }
        }
    }
}

impl Default for Event {
    fn default() -> Self { Self::new(String::new(), String::new(), String::new()) }
}
