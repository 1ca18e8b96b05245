//! Metric helpers for `ceframe`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature every helper is a no-op.

#[cfg(feature = "metrics")]
use metrics::counter;

use crate::binding::Encoding;

/// Name of the counter tracking messages pumped, by destination encoding.
pub const MESSAGES_WRITTEN: &str = "ceframe_messages_written_total";
/// Name of the counter tracking batch elements framed.
pub const BATCH_ELEMENTS: &str = "ceframe_batch_elements_total";
/// Name of the counter tracking rejected records and parts.
pub const REJECTED_ELEMENTS: &str = "ceframe_rejected_elements_total";

/// Direction of batch processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Elements read from a peer.
    Inbound,
    /// Elements written to a peer.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Batch framing in use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Framing {
    /// MIME `multipart/cloudevents`.
    Multipart,
    /// RS/LF JSON text sequence.
    JsonSeq,
}

impl Framing {
    /// Label used in logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Framing::Multipart => "multipart",
            Framing::JsonSeq => "json-seq",
        }
    }
}

/// Record a pumped message for the encoding it was written in.
pub fn inc_written(encoding: Encoding) {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_WRITTEN, "encoding" => encoding.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = encoding;
}

/// Record a framed batch element.
pub fn inc_elements(framing: Framing, direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(
        BATCH_ELEMENTS,
        "framing" => framing.as_str(),
        "direction" => direction.as_str()
    )
    .increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = (framing, direction);
}

/// Record a rejected record or part.
pub fn inc_rejected(framing: Framing) {
    #[cfg(feature = "metrics")]
    counter!(REJECTED_ELEMENTS, "framing" => framing.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = framing;
}
