#![doc(html_root_url = "https://docs.rs/ceframe/latest")]
//! Public API for the `ceframe` library.
//!
//! This crate moves events between protocol messages without forcing them
//! through memory: a [`binding::Message`] is pumped into structured or binary
//! writers, optionally through [`binding::Transformer`]s, and batches of
//! messages travel over HTTP as MIME multipart or JSON text sequences.

pub mod binding;
pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod http;
pub mod metrics;
pub mod transform;

pub use binding::{Encoding, Message, MultiMessage, Transformer, write};
pub use config::ReaderConfig;
pub use error::{Error, Result};
pub use event::{Attribute, Event, Value};
pub use format::Format;
