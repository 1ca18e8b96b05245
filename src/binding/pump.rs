//! Moves one message into a destination.

use tracing::debug;

use super::{
    BinaryWriter,
    EventBuilder,
    Encoding,
    Message,
    StructuredWriter,
    WriterPair,
    Writers,
    body_from_bytes,
    transformer::{Transformer, decorate_binary, decorate_structured, transform_event},
};
use crate::{Error, Result, event::Event, format::Format, metrics};

/// Write `message` into whichever of `structured` and `binary` fits.
///
/// Returns the encoding actually used on the destination. See
/// [`write_to`] for the negotiation rules.
///
/// # Errors
///
/// Returns [`Error::UnknownEncoding`] for messages of unknown encoding,
/// [`Error::MissingWriter`] when both writers are absent,
/// [`Error::StructuredToBinary`] when a structured-only message meets a
/// binary-only destination, or the first error raised while reading.
///
/// # Examples
///
/// ```
/// use ceframe::{
///     binding::{BinaryMessage, Encoding, EventMessage, write},
///     event::Event,
/// };
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let mut message = EventMessage::new(Event::new("1", "/src", "com.example"));
/// let mut sink = BinaryMessage::default();
/// let used = write(&mut message, None, Some(&mut sink), &mut []).await?;
/// assert_eq!(used, Encoding::Binary);
/// # Ok::<(), ceframe::Error>(())
/// # }).unwrap();
/// ```
pub async fn write<M>(
    message: &mut M,
    structured: Option<&mut dyn StructuredWriter>,
    binary: Option<&mut dyn BinaryWriter>,
    transformers: &mut [&mut dyn Transformer],
) -> Result<Encoding>
where
    M: Message + ?Sized,
{
    let mut writers = Writers::new(structured, binary);
    write_to(message, &mut writers, transformers).await
}

/// Write `message` into `destination`.
///
/// - Structured messages go to the structured writer. A destination with only
///   a binary writer gets a binary read attempt instead; messages that cannot
///   supply one fail with [`Error::StructuredToBinary`].
/// - Binary messages go to the binary writer. A destination with only a
///   structured writer gets the event materialized, passed through the event
///   transformers, and marshalled with [`Format::Json`].
/// - In-memory events prefer the binary writer.
///
/// Transformers decorate the chosen writer in list order.
///
/// # Errors
///
/// See [`write`].
pub async fn write_to<M, D>(
    message: &mut M,
    destination: &mut D,
    transformers: &mut [&mut dyn Transformer],
) -> Result<Encoding>
where
    M: Message + ?Sized,
    D: WriterPair + ?Sized,
{
    let encoding = message.encoding();
    if encoding == Encoding::Unknown {
        return Err(Error::UnknownEncoding);
    }
    let has_structured = destination.structured_writer().is_some();
    let has_binary = destination.binary_writer().is_some();
    if !has_structured && !has_binary {
        return Err(Error::MissingWriter);
    }

    let used = match encoding {
        Encoding::Structured if has_structured => {
            let writer = destination.structured_writer().ok_or(Error::MissingWriter)?;
            read_structured(message, writer, transformers).await?;
            Encoding::Structured
        }
        Encoding::Structured => {
            let writer = destination.binary_writer().ok_or(Error::MissingWriter)?;
            match read_binary(message, writer, transformers).await {
                Err(Error::NotBinary) => return Err(Error::StructuredToBinary),
                other => other?,
            }
            Encoding::Binary
        }
        Encoding::Binary | Encoding::Event if has_binary => {
            let writer = destination.binary_writer().ok_or(Error::MissingWriter)?;
            read_binary(message, writer, transformers).await?;
            Encoding::Binary
        }
        Encoding::Event => {
            let writer = destination.structured_writer().ok_or(Error::MissingWriter)?;
            read_structured(message, writer, transformers).await?;
            Encoding::Structured
        }
        Encoding::Binary => {
            let event = to_event(message, transformers).await?;
            let blob = Format::Json.marshal(&event)?;
            let writer = destination.structured_writer().ok_or(Error::MissingWriter)?;
            let mut sink = decorate_structured(writer, transformers);
            sink.set_structured_event(Format::Json, body_from_bytes(blob))
                .await?;
            Encoding::Structured
        }
        Encoding::Unknown => return Err(Error::UnknownEncoding),
    };

    debug!(source = encoding.as_str(), written = used.as_str(), "message written");
    metrics::inc_written(used);
    Ok(used)
}

/// Materialize `message` as an in-memory [`Event`].
///
/// Structured bodies are decoded by their format. Every transformer's event
/// capability is applied in list order.
///
/// # Errors
///
/// Returns [`Error::UnknownEncoding`] for messages of unknown encoding, a
/// format error if a structured body does not decode, or the first error
/// raised by a transformer.
pub async fn to_event<M>(message: &mut M, transformers: &mut [&mut dyn Transformer]) -> Result<Event>
where
    M: Message + ?Sized,
{
    let mut builder = EventBuilder::default();
    match message.encoding() {
        Encoding::Unknown => return Err(Error::UnknownEncoding),
        Encoding::Structured => message.read_structured(&mut builder).await?,
        Encoding::Binary | Encoding::Event => message.read_binary(&mut builder).await?,
    }
    let mut event = builder.into_event();
    transform_event(&mut event, transformers)?;
    Ok(event)
}

async fn read_structured<M>(
    message: &mut M,
    writer: &mut dyn StructuredWriter,
    transformers: &mut [&mut dyn Transformer],
) -> Result<()>
where
    M: Message + ?Sized,
{
    let mut sink = decorate_structured(writer, transformers);
    message.read_structured(&mut *sink).await
}

async fn read_binary<M>(
    message: &mut M,
    writer: &mut dyn BinaryWriter,
    transformers: &mut [&mut dyn Transformer],
) -> Result<()>
where
    M: Message + ?Sized,
{
    let mut sink = decorate_binary(writer, transformers);
    message.read_binary(&mut *sink).await
}
