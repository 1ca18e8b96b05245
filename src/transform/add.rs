//! Extension injection.

use async_trait::async_trait;

use crate::{
    Result,
    binding::{BinarySink, BinaryWriter, BodyStream, Capabilities, Transformer},
    event::{Attribute, Event, Value},
};

/// Sets an extension on every message that does not already carry it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddExtension {
    name: String,
    value: Value,
}

impl AddExtension {
    /// Inject `name` with `value`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Transformer for AddExtension {
    fn capabilities(&self) -> Capabilities { Capabilities::NONE.with_binary().with_event() }

    fn decorate_binary<'a>(&'a mut self, writer: BinarySink<'a>) -> BinarySink<'a> {
        Box::new(Injector {
            inner: writer,
            extension: self,
            done: false,
        })
    }

    fn transform_event(&mut self, event: &mut Event) -> Result<()> {
        if event.extension(&self.name).is_none() {
            event.set_extension(&self.name, Some(self.value.clone()));
        }
        Ok(())
    }
}

/// Forwards every call and adds the extension before the payload or the end
/// of the message, whichever comes first.
struct Injector<'a> {
    inner: BinarySink<'a>,
    extension: &'a AddExtension,
    done: bool,
}

impl Injector<'_> {
    fn inject(&mut self) -> Result<()> {
        if self.done {
            return Ok(());
        }
        self.done = true;
        self.inner
            .set_extension(&self.extension.name, Some(self.extension.value.clone()))
    }
}

#[async_trait]
impl<'a> BinaryWriter for Injector<'a> {
    async fn start(&mut self) -> Result<()> {
        self.done = false;
        self.inner.start().await
    }

    fn set_attribute(&mut self, attribute: Attribute, value: Option<Value>) -> Result<()> {
        self.inner.set_attribute(attribute, value)
    }

    fn set_extension(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        if name == self.extension.name && value.is_some() {
            self.done = true;
        }
        self.inner.set_extension(name, value)
    }

    async fn set_data(&mut self, data: BodyStream<'_>) -> Result<()> {
        self.inject()?;
        self.inner.set_data(data).await
    }

    async fn end(&mut self) -> Result<()> {
        self.inject()?;
        self.inner.end().await
    }
}
