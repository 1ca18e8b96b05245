//! Tests for batch framing selection from `Content-Type`.

use std::io::Cursor;

use ceframe::{
    Error,
    http::{multi_message_from_request, multi_message_from_response},
    metrics::Framing,
};
use http::{HeaderValue, Request, Response, header::CONTENT_TYPE};
use rstest::rstest;

fn request(content_type: Option<&'static str>) -> Request<Cursor<Vec<u8>>> {
    let mut request = Request::new(Cursor::new(Vec::new()));
    if let Some(content_type) = content_type {
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    request
}

#[rstest]
#[case("multipart/cloudevents; boundary=abc", Framing::Multipart)]
#[case("MULTIPART/CLOUDEVENTS; BOUNDARY=\"quoted\"", Framing::Multipart)]
#[case("application/cloudevents-stream", Framing::JsonSeq)]
#[case("application/cloudevents-stream; charset=utf-8", Framing::JsonSeq)]
fn selects_framing(#[case] content_type: &'static str, #[case] expected: Framing) {
    let multi = multi_message_from_request(request(Some(content_type))).expect("framing");
    assert_eq!(multi.framing(), expected);
}

#[rstest]
#[case(None)]
#[case(Some("application/json"))]
#[case(Some("application/cloudevents+json"))]
#[case(Some("multipart/mixed; boundary=abc"))]
#[case(Some("not a media type"))]
fn other_content_types_are_unknown(#[case] content_type: Option<&'static str>) {
    let err = multi_message_from_request(request(content_type))
        .err()
        .expect("unknown framing");
    assert!(matches!(err, Error::UnknownEncoding), "{err:?}");
}

#[rstest]
#[case("multipart/cloudevents")]
#[case("multipart/cloudevents; boundary=")]
#[case("multipart/cloudevents; charset=utf-8")]
fn multipart_requires_boundary(#[case] content_type: &'static str) {
    let err = multi_message_from_request(request(Some(content_type)))
        .err()
        .expect("missing boundary");
    assert!(matches!(err, Error::MissingBoundary), "{err:?}");
}

#[test]
fn opaque_header_bytes_are_invalid() {
    let mut response = Response::new(Cursor::new(Vec::new()));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_bytes(b"multipart/\xffcloudevents").expect("opaque header"),
    );
    let err = multi_message_from_response(response)
        .err()
        .expect("not visible ASCII");
    assert!(matches!(err, Error::InvalidContentType(_)), "{err:?}");
    assert!(err.is_client_error());
}
