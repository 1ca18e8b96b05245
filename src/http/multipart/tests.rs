//! Unit tests for multipart framing.

use std::io;

use http::{HeaderMap, HeaderValue, header::CONTENT_TYPE};
use multer::Multipart;
use rstest::rstest;

use super::*;

const BOUNDARY: &str = "xyz";

async fn read_parts(wire: &[u8]) -> Result<Vec<(HeaderMap, Vec<u8>)>, multer::Error> {
    let mut multipart = Multipart::with_reader(wire, BOUNDARY);
    let mut parts = Vec::new();
    while let Some(part) = multipart.next_field().await? {
        let headers = part.headers().clone();
        let body = part.bytes().await?;
        parts.push((headers, body.to_vec()));
    }
    Ok(parts)
}

#[tokio::test]
async fn writer_output_reads_back() {
    let mut writer = MultipartWriter::with_boundary(Vec::new(), BOUNDARY).expect("boundary");
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    writer.create_part(&headers).await.expect("part 1");
    writer.write_chunk(b"first\r\nline").await.expect("chunk");
    let mut headers = HeaderMap::new();
    headers.insert("ce-id", HeaderValue::from_static("2"));
    writer.create_part(&headers).await.expect("part 2");
    writer.write_chunk(b"--xy").await.expect("chunk");
    writer.close().await.expect("close");
    let wire = writer.into_inner();
    assert!(wire.starts_with(b"--xyz\r\n"));
    assert!(wire.ends_with(b"\r\n--xyz--\r\n"));

    let parts = read_parts(&wire).await.expect("parts");
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].0[CONTENT_TYPE], "text/plain");
    assert_eq!(parts[0].1, b"first\r\nline");
    assert_eq!(parts[1].0["ce-id"], "2");
    assert_eq!(parts[1].1, b"--xy");
}

#[tokio::test]
async fn empty_batch_closes_cleanly() {
    let mut writer = MultipartWriter::with_boundary(Vec::new(), BOUNDARY).expect("boundary");
    writer.close().await.expect("close");
    writer.close().await.expect("second close is a no-op");
    let wire = writer.into_inner();
    assert_eq!(wire, b"\r\n--xyz--\r\n");
    assert!(read_parts(&wire).await.expect("parts").is_empty());
}

#[test]
fn truncation_maps_to_unexpected_eof() {
    let error = MultipartError::Parse(multer::Error::IncompleteStream);
    assert!(error.is_truncated());
    assert_eq!(io::Error::from(error).kind(), io::ErrorKind::UnexpectedEof);

    let error = MultipartError::InvalidBoundary(String::new());
    assert!(!error.is_truncated());
    assert_eq!(io::Error::from(error).kind(), io::ErrorKind::InvalidData);
}

#[test]
fn body_read_failures_come_back_unwrapped() {
    let source = io::Error::new(io::ErrorKind::ConnectionReset, "peer went away");
    let error = MultipartError::Parse(multer::Error::StreamReadFailed(Box::new(source)));
    let io = io::Error::from(error);
    assert_eq!(io.kind(), io::ErrorKind::ConnectionReset);
    assert_eq!(io.to_string(), "peer went away");
}

#[rstest]
#[case("")]
#[case("has;semicolon")]
#[case("trailing ")]
#[case("b".repeat(MAX_BOUNDARY_LENGTH + 1))]
fn invalid_boundaries_are_refused(#[case] boundary: String) {
    assert!(matches!(
        validate_boundary(&boundary),
        Err(MultipartError::InvalidBoundary(_))
    ));
    assert!(MultipartWriter::with_boundary(Vec::new(), boundary).is_err());
}

#[test]
fn random_boundaries_are_valid_and_distinct() {
    let first = random_boundary();
    let second = random_boundary();
    assert!(validate_boundary(&first).is_ok());
    assert_ne!(first, second);
}
