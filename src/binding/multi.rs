//! Sequences of messages.

use async_trait::async_trait;

use super::{EventMessage, Message};
use crate::{Error, Result, event::Event};

/// What [`MultiMessage::finish`] does to the sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Replay {
    /// `finish` rewinds; the sequence can be read again from the start.
    Restart,
    /// `finish` releases the source; later reads fail with
    /// [`Error::Finished`].
    Terminal,
}

/// An ordered sequence of messages.
///
/// Each message borrows the sequence, so the next `read` can only start once
/// the previous message has been dropped. `Ok(None)` marks the end of the
/// sequence and is returned again by every later `read` until `finish`.
#[async_trait]
pub trait MultiMessage: Send {
    /// Element type yielded by [`MultiMessage::read`].
    type Message<'a>: Message + 'a
    where
        Self: 'a;

    /// Next message, or `Ok(None)` at the end of the sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the next element cannot be framed, or
    /// [`Error::Finished`] for terminal sequences read after `finish`.
    async fn read<'a>(&'a mut self) -> Result<Option<Self::Message<'a>>>;

    /// Release or rewind the sequence.
    ///
    /// `error` is the outcome of processing the sequence, if it failed.
    ///
    /// # Errors
    ///
    /// Returns an error if releasing the underlying resource fails.
    async fn finish(&mut self, error: Option<&Error>) -> Result<()>;

    /// Whether the sequence can be read again after `finish`.
    fn replay(&self) -> Replay { Replay::Terminal }
}

/// An in-memory, restartable sequence.
///
/// ```
/// use ceframe::{
///     binding::{GenericMultiMessage, MultiMessage},
///     event::Event,
/// };
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let mut batch = GenericMultiMessage::from_events([
///     Event::new("1", "/src", "t"),
///     Event::new("2", "/src", "t"),
/// ]);
/// let mut seen = 0;
/// while batch.read().await?.is_some() {
///     seen += 1;
/// }
/// assert_eq!(seen, 2);
/// # Ok::<(), ceframe::Error>(())
/// # }).unwrap();
/// ```
#[derive(Clone, Debug, Default)]
pub struct GenericMultiMessage<M> {
    messages: Vec<M>,
    index: usize,
}

impl<M> GenericMultiMessage<M> {
    /// Build a sequence over `messages`.
    #[must_use]
    pub fn new(messages: Vec<M>) -> Self { Self { messages, index: 0 } }

    /// Number of messages in the sequence.
    #[must_use]
    pub fn len(&self) -> usize { self.messages.len() }

    /// Returns true if the sequence holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.messages.is_empty() }

    /// Unwrap the messages.
    #[must_use]
    pub fn into_inner(self) -> Vec<M> { self.messages }
}

impl GenericMultiMessage<EventMessage> {
    /// Build a sequence of [`EventMessage`]s.
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        Self::new(events.into_iter().map(EventMessage::new).collect())
    }
}

impl<M> FromIterator<M> for GenericMultiMessage<M> {
    fn from_iter<I: IntoIterator<Item = M>>(iter: I) -> Self { Self::new(iter.into_iter().collect()) }
}

#[async_trait]
impl<M: Message> MultiMessage for GenericMultiMessage<M> {
    type Message<'a>
        = &'a mut M
    where
        Self: 'a;

    async fn read<'a>(&'a mut self) -> Result<Option<Self::Message<'a>>> {
        let message = self.messages.get_mut(self.index);
        if message.is_some() {
            self.index += 1;
        }
        Ok(message)
    }

    async fn finish(&mut self, _error: Option<&Error>) -> Result<()> {
        self.index = 0;
        Ok(())
    }

    fn replay(&self) -> Replay { Replay::Restart }
}
