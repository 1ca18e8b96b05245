//! Tests for extension transformers applied through the pump and the HTTP
//! transports.

use std::io::Cursor;

use bytes::Bytes;
use ceframe::{
    Encoding,
    Event,
    Format,
    Value,
    binding::{
        BinaryMessage,
        EventMessage,
        GenericMultiMessage,
        StructuredMessage,
        to_event,
        write,
    },
    http::{multi_message_from_request, write_multipart_request},
    transform::{AddExtension, ExtractExtension, ExtractExtensions},
};
use ceframe_testing::{drain_events, full_event};
use http::Request;
use rstest::rstest;

#[rstest]
#[tokio::test]
async fn extracts_from_binary_messages(full_event: Event) {
    let mut message = BinaryMessage::from_event(&full_event);
    let mut extract = ExtractExtension::new("extavalue");
    let mut sink = BinaryMessage::default();
    let used = write(&mut message, None, Some(&mut sink), &mut [&mut extract])
        .await
        .expect("write");
    assert_eq!(used, Encoding::Binary);
    assert_eq!(extract.value(), Some(&Value::from("aaaa")));
    assert_eq!(sink.extension("extavalue"), Some(&Value::from("aaaa")));
}

#[rstest]
#[tokio::test]
async fn extracts_from_structured_messages_via_event(full_event: Event) {
    let mut message = StructuredMessage::from_event(&full_event, Format::Json).expect("marshal");
    let mut extract = ExtractExtension::new("extavalue");
    to_event(&mut message, &mut [&mut extract])
        .await
        .expect("materialize");
    assert_eq!(extract.value(), Some(&Value::from("aaaa")));
}

#[rstest]
#[tokio::test]
async fn extracts_several_names(full_event: Event) {
    let mut message = EventMessage::new(full_event);
    let mut extract = ExtractExtensions::new(["extavalue", "count", "absent"]);
    let mut sink = BinaryMessage::default();
    write(&mut message, None, Some(&mut sink), &mut [&mut extract])
        .await
        .expect("write");
    assert_eq!(extract.get("extavalue"), Some(&Value::from("aaaa")));
    assert_eq!(extract.get("count"), Some(&Value::Integer(3)));
    assert_eq!(extract.get("absent"), None);
    assert_eq!(extract.iter().count(), 3);
}

#[tokio::test]
async fn added_extension_never_overrides() {
    let mut add = AddExtension::new("region", "eu");

    let mut plain = EventMessage::new(Event::new("1", "/src", "t").with_data("text/plain", "x"));
    let mut sink = BinaryMessage::default();
    write(&mut plain, None, Some(&mut sink), &mut [&mut add])
        .await
        .expect("write");
    assert_eq!(sink.extension("region"), Some(&Value::from("eu")));

    let mut tagged = EventMessage::new(Event::new("2", "/src", "t").with_extension("region", "us"));
    let mut sink = BinaryMessage::default();
    write(&mut tagged, None, Some(&mut sink), &mut [&mut add])
        .await
        .expect("write");
    assert_eq!(sink.extension("region"), Some(&Value::from("us")));
}

#[tokio::test]
async fn transformers_apply_to_every_batch_element() {
    let mut batch = GenericMultiMessage::from_events([
        Event::new("1", "/src", "t"),
        Event::new("2", "/src", "t").with_extension("region", "us"),
    ]);
    let mut add = AddExtension::new("region", "eu");
    let mut request = Request::new(Bytes::new());
    write_multipart_request(&mut batch, &mut request, &mut [&mut add])
        .await
        .expect("write");

    let mut multi = multi_message_from_request(request.map(Cursor::new)).expect("framing");
    let regions: Vec<_> = drain_events(&mut multi)
        .await
        .expect("drain")
        .into_iter()
        .map(|event| event.extension("region").cloned())
        .collect();
    assert_eq!(regions, [Some(Value::from("eu")), Some(Value::from("us"))]);
}
