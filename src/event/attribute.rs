//! Context attribute names of CloudEvents 1.0.

use std::fmt;

/// A context attribute of an event.
///
/// Extensions are not attributes; they are addressed by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// `specversion`
    SpecVersion,
    /// `id`
    Id,
    /// `source`
    Source,
    /// `type`
    Type,
    /// `subject`
    Subject,
    /// `time`
    Time,
    /// `datacontenttype`
    DataContentType,
    /// `dataschema`
    DataSchema,
}

impl Attribute {
    /// Every attribute in the order they are written to a sink.
    pub const ALL: [Attribute; 8] = [
        Attribute::SpecVersion,
        Attribute::Id,
        Attribute::Source,
        Attribute::Type,
        Attribute::Subject,
        Attribute::Time,
        Attribute::DataContentType,
        Attribute::DataSchema,
    ];

    /// Wire name of the attribute.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Attribute::SpecVersion => "specversion",
            Attribute::Id => "id",
            Attribute::Source => "source",
            Attribute::Type => "type",
            Attribute::Subject => "subject",
            Attribute::Time => "time",
            Attribute::DataContentType => "datacontenttype",
            Attribute::DataSchema => "dataschema",
        }
    }

    /// Look an attribute up by its wire name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Attribute> {
        Attribute::ALL
            .into_iter()
            .find(|attribute| attribute.name().eq_ignore_ascii_case(name))
    }

    /// Returns true for attributes every event must carry.
    #[must_use]
    pub fn is_required(self) -> bool {
        matches!(
            self,
            Attribute::SpecVersion | Attribute::Id | Attribute::Source | Attribute::Type
        )
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}
