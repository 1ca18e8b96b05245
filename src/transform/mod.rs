//! Ready-made [`Transformer`](crate::binding::Transformer)s.
//!
//! Extraction transformers observe a message as it is pumped and keep the
//! value of named extensions for the caller to inspect afterwards. They are
//! stateful and meant for one pump at a time; reusing one overwrites what it
//! recorded.

mod add;
mod extract;

pub use add::AddExtension;
pub use extract::{ExtractExtension, ExtractExtensions};
