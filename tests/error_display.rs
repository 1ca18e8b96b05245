//! Tests for Display implementations and classification of error types.

use bytes::Bytes;
use ceframe::{Error, http::multipart::MultipartError};
use http::StatusCode;
use rstest::rstest;

#[rstest]
#[case(Error::UnknownEncoding, "unknown encoding")]
#[case(Error::MissingWriter, "no writer supplied for the message")]
#[case(Error::BodyConsumed, "message body has already been consumed")]
#[case(
    Error::RecordTooLarge { size: 70, max: 64 },
    "record exceeds max length: 70 > 64"
)]
#[case(
    Error::InvalidRecord(Bytes::from_static(b"{}")),
    "invalid record: \"{}\""
)]
#[case(
    Error::MissingBoundary,
    "multipart content type is missing the boundary parameter"
)]
fn error_messages(#[case] error: Error, #[case] expected: &str) {
    assert_eq!(error.to_string(), expected);
}

#[test]
fn transport_errors_keep_their_message() {
    let error = Error::from(std::io::Error::other("socket closed"));
    assert_eq!(error.to_string(), "transport error: socket closed");
    assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn framing_errors_survive_io_round_trip() {
    let io: std::io::Error = MultipartError::Parse(multer::Error::IncompleteStream).into();
    assert_eq!(io.kind(), std::io::ErrorKind::UnexpectedEof);
    let error = Error::from(io);
    assert!(
        matches!(&error, Error::Multipart(inner) if inner.is_truncated()),
        "{error:?}"
    );
    assert!(error.is_client_error());
    assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);

    let io: std::io::Error = Error::MissingBoundary.into();
    assert!(matches!(Error::from(io), Error::MissingBoundary));
}

#[test]
fn failed_body_reads_are_transport_errors() {
    let source = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
    let error = Error::from(multer::Error::StreamReadFailed(Box::new(source)));
    assert!(matches!(&error, Error::Io(io) if io.kind() == std::io::ErrorKind::ConnectionReset));
    assert!(!error.is_client_error());
}

#[rstest]
#[case(Error::NotStructured)]
#[case(Error::NotBinary)]
#[case(Error::StructuredToBinary)]
#[case(Error::Finished)]
fn local_errors_are_server_side(#[case] error: Error) {
    assert!(!error.is_client_error());
}
