//! HTTP protocol binding.
//!
//! Single events map onto header fields and a body through [`HttpMessage`].
//! Batches travel either as `multipart/cloudevents`, one MIME part per
//! event, or as `application/cloudevents-stream`, an RS/LF JSON text
//! sequence of structured events. Readers pick the framing from
//! `Content-Type`; writers set it.

mod content_type;
pub mod headers;
pub mod jsonseq;
mod message;
mod multi_message;
pub mod multipart;
mod response;
mod write_multi;

pub use self::{
    message::HttpMessage,
    multi_message::{
        IncomingMultiMessage,
        JsonStreamingMultiMessage,
        MultipartMultiMessage,
        multi_message_from_request,
        multi_message_from_request_with_config,
        multi_message_from_response,
        multi_message_from_response_with_config,
    },
    response::{BufferedResponse, ResponseWriter, StreamingResponse},
    write_multi::{
        write_json_seq_request,
        write_json_seq_response,
        write_multipart_request,
        write_multipart_response,
    },
};

/// Media type of a multipart batch. Requires a `boundary` parameter.
pub const MULTIPART_CLOUDEVENTS: &str = "multipart/cloudevents";

/// Media type of a JSON text sequence batch.
pub const JSON_SEQ_CLOUDEVENTS: &str = "application/cloudevents-stream";
