//! Transformer contract.
//!
//! A transformer may wrap the structured writer, wrap the binary writer, or
//! edit a materialized event. Each path is opt-in through
//! [`Capabilities`]; the pump leaves undeclared paths alone.

use super::{BinaryWriter, StructuredWriter};
use crate::{Result, event::Event};

/// Boxed structured writer handed through the decoration chain.
pub type StructuredSink<'a> = Box<dyn StructuredWriter + 'a>;

/// Boxed binary writer handed through the decoration chain.
pub type BinarySink<'a> = Box<dyn BinaryWriter + 'a>;

/// Paths a transformer takes part in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Wraps structured writers.
    pub structured: bool,
    /// Wraps binary writers.
    pub binary: bool,
    /// Edits materialized events.
    pub event: bool,
}

impl Capabilities {
    /// No capability at all.
    pub const NONE: Self = Self {
        structured: false,
        binary: false,
        event: false,
    };

    /// Add the structured capability.
    #[must_use]
    pub const fn with_structured(mut self) -> Self {
        self.structured = true;
        self
    }

    /// Add the binary capability.
    #[must_use]
    pub const fn with_binary(mut self) -> Self {
        self.binary = true;
        self
    }

    /// Add the event capability.
    #[must_use]
    pub const fn with_event(mut self) -> Self {
        self.event = true;
        self
    }
}

/// Hook applied while a message is pumped.
///
/// Decorators receive the next writer in the chain and return the writer the
/// message should be read into. The borrow on `self` lasts as long as the
/// decorated writer, so state recorded while the message flows is visible
/// once the pump returns.
pub trait Transformer: Send {
    /// Paths this transformer takes part in.
    fn capabilities(&self) -> Capabilities;

    /// Wrap a structured writer. Defaults to pass-through.
    fn decorate_structured<'a>(&'a mut self, writer: StructuredSink<'a>) -> StructuredSink<'a> {
        writer
    }

    /// Wrap a binary writer. Defaults to pass-through.
    fn decorate_binary<'a>(&'a mut self, writer: BinarySink<'a>) -> BinarySink<'a> { writer }

    /// Edit a materialized event. Defaults to no-op.
    ///
    /// # Errors
    ///
    /// Returns an error to abort the pump.
    fn transform_event(&mut self, event: &mut Event) -> Result<()> {
        let _ = event;
        Ok(())
    }
}

/// Wrap `writer` with the structured capability of each transformer in order.
///
/// The first transformer in the list ends up outermost and sees calls first.
pub(crate) fn decorate_structured<'a>(
    writer: &'a mut dyn StructuredWriter,
    transformers: &'a mut [&mut dyn Transformer],
) -> StructuredSink<'a> {
    let mut sink: StructuredSink<'a> = Box::new(writer);
    for transformer in transformers.iter_mut().rev() {
        if transformer.capabilities().structured {
            sink = transformer.decorate_structured(sink);
        }
    }
    sink
}

/// Wrap `writer` with the binary capability of each transformer in order.
pub(crate) fn decorate_binary<'a>(
    writer: &'a mut dyn BinaryWriter,
    transformers: &'a mut [&mut dyn Transformer],
) -> BinarySink<'a> {
    let mut sink: BinarySink<'a> = Box::new(writer);
    for transformer in transformers.iter_mut().rev() {
        if transformer.capabilities().binary {
            sink = transformer.decorate_binary(sink);
        }
    }
    sink
}

/// Apply the event capability of each transformer in order.
pub(crate) fn transform_event(
    event: &mut Event,
    transformers: &mut [&mut dyn Transformer],
) -> Result<()> {
    for transformer in transformers.iter_mut() {
        if transformer.capabilities().event {
            transformer.transform_event(event)?;
        }
    }
    Ok(())
}
