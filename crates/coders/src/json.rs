//! Serde-backed codec for opaque user payloads.

use crate::wire;
use crate::Codec;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use tandem_core::{Error, Result};

/// Length-prefixed JSON. The default choice for restrictions and watermark
/// states, whose structure the runner never inspects.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn encode(&self, value: &T, buf: &mut Vec<u8>) -> Result<()> {
        let payload =
            serde_json::to_vec(value).map_err(|e| Error::codec(format!("serialize: {e}")))?;
        wire::put_u32(buf, payload.len() as u32);
        buf.extend_from_slice(&payload);
        Ok(())
    }

    fn decode(&self, input: &mut &[u8]) -> Result<T> {
        let len = wire::read_u32(input)? as usize;
        let payload = wire::read_exact(input, len)?;
        serde_json::from_slice(payload).map_err(|e| Error::codec(format!("deserialize: {e}")))
    }
}
