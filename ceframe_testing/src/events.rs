//! Event fixtures.

use ceframe::{
    binding::{BinaryMessage, EventMessage, Message, StructuredMessage},
    event::Event,
    format::Format,
};
use rstest::fixture;

/// An event with every attribute, two extensions and a JSON payload.
#[fixture]
pub fn full_event() -> Event {
    let mut event = Event::new("A234-1234-1234", "/mycontext", "com.example.someevent")
        .with_extension("extavalue", "aaaa")
        .with_extension("count", 3)
        .with_data("application/json", r#"{"id":0,"message":"hello"}"#);
    event.subject = Some("topic".to_owned());
    event.time = Some("2018-04-05T17:31:00Z".to_owned());
    event.data_schema = Some("http://example.com/schema".to_owned());
    event
}

/// `count` distinct events with ids `"0"`, `"1"`, and so on.
#[must_use]
pub fn sample_events(count: usize) -> Vec<Event> {
    (0..count)
        .map(|index| {
            Event::new(index.to_string(), "/sample", "com.example.sample")
                .with_extension("seq", index.to_string())
                .with_data("text/plain", format!("payload {index}"))
        })
        .collect()
}

/// One message per encoding, all carrying events from
/// [`sample_events`]`(3)` in order.
///
/// # Panics
///
/// Panics if the JSON format fails to marshal a sample event.
#[must_use]
pub fn mixed_messages() -> Vec<Box<dyn Message>> {
    let mut events = sample_events(3).into_iter();
    let mut next = || events.next().expect("three sample events");
    let structured = StructuredMessage::from_event(&next(), Format::Json).expect("marshal");
    vec![
        Box::new(structured),
        Box::new(BinaryMessage::from_event(&next())),
        Box::new(EventMessage::new(next())),
    ]
}
