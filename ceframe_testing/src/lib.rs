//! Fixtures and helpers for exercising `ceframe` in tests.
//!
//! Events, wire bodies in both batch framings, a drain helper that
//! materializes every element of a [`MultiMessage`](ceframe::MultiMessage),
//! and shared log and metrics capture.
//!
//! ```rust
//! use ceframe::binding::GenericMultiMessage;
//! use ceframe_testing::{drain_events, sample_events};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut batch = GenericMultiMessage::from_events(sample_events(3));
//! let events = drain_events(&mut batch).await.expect("drain");
//! assert_eq!(events.len(), 3);
//! # });
//! ```

pub mod drain;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod wire;

pub use drain::{drain_events, next_event};
pub use events::{full_event, mixed_messages, sample_events};
pub use logging::{LoggerHandle, logger};
pub use metrics::{Recorded, counter_value, recorded};
pub use wire::{MultipartBody, json_seq_body};
