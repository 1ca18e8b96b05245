//! Helpers for draining a [`MultiMessage`] in tests.

use ceframe::{Error, Event, MultiMessage, binding::to_event};

/// Materialize every element of `multi`, then finish it.
///
/// Stops at the first element that fails to read and finishes the sequence
/// with that error.
///
/// # Errors
///
/// Returns the first read, conversion or finish error.
pub async fn drain_events<M>(multi: &mut M) -> Result<Vec<Event>, Error>
where
    M: MultiMessage,
{
    let mut events = Vec::new();
    let outcome = loop {
        match multi.read().await {
            Ok(Some(mut message)) => match to_event(&mut message, &mut []).await {
                Ok(event) => events.push(event),
                Err(error) => break Err(error),
            },
            Ok(None) => break Ok(()),
            Err(error) => break Err(error),
        }
    };
    multi.finish(outcome.as_ref().err()).await?;
    outcome.map(|()| events)
}

/// Read and materialize the next element of `multi`.
///
/// # Errors
///
/// Returns the read or conversion error of that element.
pub async fn next_event<M>(multi: &mut M) -> Result<Option<Event>, Error>
where
    M: MultiMessage,
{
    match multi.read().await? {
        Some(mut message) => to_event(&mut message, &mut []).await.map(Some),
        None => Ok(None),
    }
}
