//! Element and timer codecs.
//!
//! A [`Codec`] turns values into length-delimited bytes and back. The runner
//! treats most payloads as opaque and only composes codecs it was handed;
//! the structural codecs here (windowed values, timers, iterables) define the
//! byte layouts that split artifacts and progress payloads are exchanged in.

mod json;
mod registry;
mod standard;
pub mod wire;
mod windowed;

use bytes::Bytes;
use tandem_core::Result;

pub use json::JsonCodec;
pub use registry::CodecRegistry;
pub use standard::{
    BytesCodec, DoubleCodec, InstantCodec, IterableCodec, KvCodec, StringUtf8Codec, UnitCodec,
    VarIntCodec,
};
pub use windowed::{PaneInfoCodec, TimerCodec, WindowCodec, WindowedValueCodec};

/// Encodes and decodes values of one type.
///
/// Implementations are stateless and shareable; composite codecs hold their
/// component codecs behind `Arc`.
pub trait Codec<T>: Send + Sync + 'static {
    fn encode(&self, value: &T, buf: &mut Vec<u8>) -> Result<()>;

    /// Decode one value from the front of `input`, advancing it past the
    /// consumed bytes.
    fn decode(&self, input: &mut &[u8]) -> Result<T>;
}

/// Encode a single value to a frozen byte string.
pub fn encode_to_bytes<T: 'static>(codec: &dyn Codec<T>, value: &T) -> Result<Bytes> {
    let mut buf = Vec::new();
    codec.encode(value, &mut buf)?;
    Ok(Bytes::from(buf))
}

/// Decode a value that must consume the whole input.
pub fn decode_exact<T: 'static>(codec: &dyn Codec<T>, data: &[u8]) -> Result<T> {
    let mut input = data;
    let value = codec.decode(&mut input)?;
    if !input.is_empty() {
        return Err(tandem_core::Error::codec(format!(
            "{} trailing bytes after decoded value",
            input.len()
        )));
    }
    Ok(value)
}
