//! Extension extraction.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{
    Result,
    binding::{BinarySink, BinaryWriter, BodyStream, Capabilities, Transformer},
    event::{Attribute, Event, Value},
};

/// Records the value of a single extension.
///
/// ```
/// use ceframe::{
///     binding::{BinaryMessage, EventMessage, write},
///     event::{Event, Value},
///     transform::ExtractExtension,
/// };
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let event = Event::new("1", "/src", "t").with_extension("extavalue", "aaaa");
/// let mut extract = ExtractExtension::new("extavalue");
/// let mut sink = BinaryMessage::default();
/// write(&mut EventMessage::new(event), None, Some(&mut sink), &mut [&mut extract]).await?;
/// assert_eq!(extract.value(), Some(&Value::from("aaaa")));
/// # Ok::<(), ceframe::Error>(())
/// # }).unwrap();
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractExtension {
    name: String,
    value: Option<Value>,
}

impl ExtractExtension {
    /// Watch for the extension `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Name being watched.
    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// Last recorded value, if the extension was seen.
    #[must_use]
    pub fn value(&self) -> Option<&Value> { self.value.as_ref() }

    /// Take the recorded value, leaving `None`.
    pub fn take_value(&mut self) -> Option<Value> { self.value.take() }
}

impl Transformer for ExtractExtension {
    fn capabilities(&self) -> Capabilities { Capabilities::NONE.with_binary().with_event() }

    fn decorate_binary<'a>(&'a mut self, writer: BinarySink<'a>) -> BinarySink<'a> {
        Box::new(Recorder {
            inner: writer,
            target: self,
        })
    }

    fn transform_event(&mut self, event: &mut Event) -> Result<()> {
        self.value = event.extension(&self.name).cloned();
        Ok(())
    }
}

/// Records the values of several extensions.
///
/// Names of interest are fixed at construction; any other extension passes
/// through unrecorded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractExtensions {
    values: BTreeMap<String, Option<Value>>,
}

impl ExtractExtensions {
    /// Watch for each name in `names`.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: names.into_iter().map(|name| (name.into(), None)).collect(),
        }
    }

    /// Recorded value of `name`.
    ///
    /// `None` when the name is not watched or was not seen.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> { self.values.get(name)?.as_ref() }

    /// Every watched name with its recorded value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }
}

impl Transformer for ExtractExtensions {
    fn capabilities(&self) -> Capabilities { Capabilities::NONE.with_binary().with_event() }

    fn decorate_binary<'a>(&'a mut self, writer: BinarySink<'a>) -> BinarySink<'a> {
        Box::new(Recorder {
            inner: writer,
            target: self,
        })
    }

    fn transform_event(&mut self, event: &mut Event) -> Result<()> {
        for (name, value) in &mut self.values {
            *value = event.extension(name).cloned();
        }
        Ok(())
    }
}

/// Storage an extraction writer records into.
trait Record: Send {
    fn record(&mut self, name: &str, value: Option<&Value>);
}

impl Record for ExtractExtension {
    fn record(&mut self, name: &str, value: Option<&Value>) {
        if name == self.name {
            self.value = value.cloned();
        }
    }
}

impl Record for ExtractExtensions {
    fn record(&mut self, name: &str, value: Option<&Value>) {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value.cloned();
        }
    }
}

/// Binary writer that records extensions into `target` and forwards every
/// call unchanged.
struct Recorder<'a, T> {
    inner: BinarySink<'a>,
    target: &'a mut T,
}

#[async_trait]
impl<'a, T: Record> BinaryWriter for Recorder<'a, T> {
    async fn start(&mut self) -> Result<()> { self.inner.start().await }

    fn set_attribute(&mut self, attribute: Attribute, value: Option<Value>) -> Result<()> {
        self.inner.set_attribute(attribute, value)
    }

    fn set_extension(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        self.target.record(name, value.as_ref());
        self.inner.set_extension(name, value)
    }

    async fn set_data(&mut self, data: BodyStream<'_>) -> Result<()> { self.inner.set_data(data).await }

    async fn end(&mut self) -> Result<()> { self.inner.end().await }
}
