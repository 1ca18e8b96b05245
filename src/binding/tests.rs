//! Unit tests for pump negotiation and transformer chaining.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rstest::{fixture, rstest};

use super::*;
use crate::{
    Error,
    Result,
    event::{Attribute, Event, Value},
    format::Format,
};

#[fixture]
fn event() -> Event {
    Event::new("A234-1234-1234", "/mycontext", "com.example.someevent")
        .with_extension("extavalue", "aaaa")
        .with_data("application/json", r#"{"hello":"world"}"#)
}

struct UnknownMessage;

#[async_trait]
impl Message for UnknownMessage {
    fn encoding(&self) -> Encoding { Encoding::Unknown }
}

/// Records each `start` under `label`, then forwards.
struct Tag {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

struct TagWriter<'a> {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
    inner: BinarySink<'a>,
}

#[async_trait]
impl<'a> BinaryWriter for TagWriter<'a> {
    async fn start(&mut self) -> Result<()> {
        self.log.lock().expect("log lock").push(self.label);
        self.inner.start().await
    }

    fn set_attribute(&mut self, attribute: Attribute, value: Option<Value>) -> Result<()> {
        self.inner.set_attribute(attribute, value)
    }

    fn set_extension(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        self.inner.set_extension(name, value)
    }

    async fn set_data(&mut self, data: BodyStream<'_>) -> Result<()> { self.inner.set_data(data).await }

    async fn end(&mut self) -> Result<()> { self.inner.end().await }
}

impl Transformer for Tag {
    fn capabilities(&self) -> Capabilities { Capabilities::NONE.with_binary() }

    fn decorate_binary<'a>(&'a mut self, writer: BinarySink<'a>) -> BinarySink<'a> {
        Box::new(TagWriter {
            label: self.label,
            log: Arc::clone(&self.log),
            inner: writer,
        })
    }
}

/// Declares nothing; any decoration call is a bug in the pump.
struct Inert;

impl Transformer for Inert {
    fn capabilities(&self) -> Capabilities { Capabilities::NONE }

    fn decorate_binary<'a>(&'a mut self, _writer: BinarySink<'a>) -> BinarySink<'a> {
        panic!("binary decoration without the binary capability")
    }

    fn decorate_structured<'a>(&'a mut self, _writer: StructuredSink<'a>) -> StructuredSink<'a> {
        panic!("structured decoration without the structured capability")
    }
}

#[rstest]
#[tokio::test]
async fn event_prefers_binary_writer(event: Event) {
    let mut message = EventMessage::new(event.clone());
    let mut structured = StructuredMessage::default();
    let mut binary = BinaryMessage::default();

    let used = write(&mut message, Some(&mut structured), Some(&mut binary), &mut [])
        .await
        .expect("write");

    assert_eq!(used, Encoding::Binary);
    assert_eq!(binary, BinaryMessage::from_event(&event));
    assert!(structured.bytes().is_empty());
}

#[rstest]
#[tokio::test]
async fn event_falls_back_to_structured_writer(event: Event) {
    let mut message = EventMessage::new(event.clone());
    let mut structured = StructuredMessage::default();

    let used = write(&mut message, Some(&mut structured), None, &mut [])
        .await
        .expect("write");

    assert_eq!(used, Encoding::Structured);
    let decoded = Format::Json.unmarshal(structured.bytes()).expect("decode");
    assert_eq!(decoded, event);
}

#[rstest]
#[tokio::test]
async fn structured_message_prefers_structured_writer(event: Event) {
    let mut message = StructuredMessage::from_event(&event, Format::Json).expect("marshal");
    let mut structured = StructuredMessage::default();
    let mut binary = BinaryMessage::default();

    let used = write(&mut message, Some(&mut structured), Some(&mut binary), &mut [])
        .await
        .expect("write");

    assert_eq!(used, Encoding::Structured);
    assert_eq!(structured, message);
    assert_eq!(binary, BinaryMessage::default());
}

#[rstest]
#[tokio::test]
async fn structured_message_cannot_reach_binary_only_writer(event: Event) {
    let mut message = StructuredMessage::from_event(&event, Format::Json).expect("marshal");
    let mut binary = BinaryMessage::default();

    let err = write(&mut message, None, Some(&mut binary), &mut [])
        .await
        .expect_err("structured to binary must fail");

    assert!(matches!(err, Error::StructuredToBinary), "{err:?}");
}

#[rstest]
#[tokio::test]
async fn binary_message_is_materialized_for_structured_only_writer(event: Event) {
    let mut message = BinaryMessage::from_event(&event);
    let mut structured = StructuredMessage::default();

    let used = write(&mut message, Some(&mut structured), None, &mut [])
        .await
        .expect("write");

    assert_eq!(used, Encoding::Structured);
    assert_eq!(structured.format(), Format::Json);
    let decoded = Format::Json.unmarshal(structured.bytes()).expect("decode");
    assert_eq!(decoded, event);
}

#[tokio::test]
async fn unknown_encoding_is_rejected() {
    let mut structured = StructuredMessage::default();
    let err = write(&mut UnknownMessage, Some(&mut structured), None, &mut [])
        .await
        .expect_err("unknown encoding");
    assert!(matches!(err, Error::UnknownEncoding));
}

#[rstest]
#[tokio::test]
async fn missing_writers_are_rejected(event: Event) {
    let err = write(&mut EventMessage::new(event), None, None, &mut [])
        .await
        .expect_err("no writer");
    assert!(matches!(err, Error::MissingWriter));
}

#[rstest]
#[tokio::test]
async fn decorators_apply_in_list_order(event: Event) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut first = Tag {
        label: "first",
        log: Arc::clone(&log),
    };
    let mut second = Tag {
        label: "second",
        log: Arc::clone(&log),
    };
    let mut inert = Inert;
    let mut binary = BinaryMessage::default();

    write(
        &mut EventMessage::new(event),
        None,
        Some(&mut binary),
        &mut [&mut first, &mut inert, &mut second],
    )
    .await
    .expect("write");

    assert_eq!(*log.lock().expect("log lock"), ["first", "second"]);
}

#[rstest]
#[tokio::test]
async fn to_event_decodes_structured_bodies(event: Event) {
    let mut message = StructuredMessage::from_event(&event, Format::Json).expect("marshal");
    let decoded = to_event(&mut message, &mut []).await.expect("to_event");
    assert_eq!(decoded, event);
}

#[rstest]
#[tokio::test]
async fn buffered_messages_can_be_read_twice(event: Event) {
    let mut message = BinaryMessage::from_event(&event);
    let first = to_event(&mut message, &mut []).await.expect("first read");
    let second = to_event(&mut message, &mut []).await.expect("second read");
    assert_eq!(first, second);
}

#[tokio::test]
async fn generic_multi_message_rewinds_on_finish() {
    let mut batch = GenericMultiMessage::from_events([
        Event::new("1", "/src", "t"),
        Event::new("2", "/src", "t"),
    ]);
    assert_eq!(batch.replay(), Replay::Restart);

    let mut ids = Vec::new();
    while let Some(message) = batch.read().await.expect("read") {
        ids.push(message.event().id.clone());
    }
    assert!(batch.read().await.expect("read after end").is_none());

    batch.finish(None).await.expect("finish");
    let again = batch.read().await.expect("read after finish");
    assert_eq!(again.map(|message| message.event().id.clone()), Some("1".to_owned()));
    assert_eq!(ids, ["1", "2"]);
}
