//! Stock codecs for primitives and simple composites.

use crate::wire;
use crate::Codec;
use bytes::Bytes;
use std::sync::Arc;
use tandem_core::{Error, Instant, Result, KV};

/// Zero-byte codec for the unit type; used for unkeyed keys and absent
/// restrictions.
pub struct UnitCodec;

impl Codec<()> for UnitCodec {
    fn encode(&self, _value: &(), _buf: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }

    fn decode(&self, _input: &mut &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Length-prefixed raw bytes.
pub struct BytesCodec;

impl Codec<Bytes> for BytesCodec {
    fn encode(&self, value: &Bytes, buf: &mut Vec<u8>) -> Result<()> {
        wire::put_u32(buf, value.len() as u32);
        buf.extend_from_slice(value);
        Ok(())
    }

    fn decode(&self, input: &mut &[u8]) -> Result<Bytes> {
        let len = wire::read_u32(input)? as usize;
        Ok(Bytes::copy_from_slice(wire::read_exact(input, len)?))
    }
}

/// Length-prefixed UTF-8 string.
pub struct StringUtf8Codec;

impl Codec<String> for StringUtf8Codec {
    fn encode(&self, value: &String, buf: &mut Vec<u8>) -> Result<()> {
        wire::put_u32(buf, value.len() as u32);
        buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn decode(&self, input: &mut &[u8]) -> Result<String> {
        let len = wire::read_u32(input)? as usize;
        let bytes = wire::read_exact(input, len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::codec(format!("invalid UTF-8 string: {e}")))
    }
}

/// IEEE-754 double, big-endian.
pub struct DoubleCodec;

impl Codec<f64> for DoubleCodec {
    fn encode(&self, value: &f64, buf: &mut Vec<u8>) -> Result<()> {
        wire::put_f64(buf, *value);
        Ok(())
    }

    fn decode(&self, input: &mut &[u8]) -> Result<f64> {
        wire::read_f64(input)
    }
}

/// Millisecond instant as a big-endian `i64`.
pub struct InstantCodec;

impl Codec<Instant> for InstantCodec {
    fn encode(&self, value: &Instant, buf: &mut Vec<u8>) -> Result<()> {
        wire::put_i64(buf, value.millis());
        Ok(())
    }

    fn decode(&self, input: &mut &[u8]) -> Result<Instant> {
        Ok(Instant::from_millis(wire::read_i64(input)?))
    }
}

/// Zig-zag LEB128 varint for `i64`.
pub struct VarIntCodec;

impl Codec<i64> for VarIntCodec {
    fn encode(&self, value: &i64, buf: &mut Vec<u8>) -> Result<()> {
        let mut encoded = ((value << 1) ^ (value >> 63)) as u64;
        loop {
            let byte = (encoded & 0x7f) as u8;
            encoded >>= 7;
            if encoded == 0 {
                wire::put_u8(buf, byte);
                return Ok(());
            }
            wire::put_u8(buf, byte | 0x80);
        }
    }

    fn decode(&self, input: &mut &[u8]) -> Result<i64> {
        let mut encoded: u64 = 0;
        for shift in (0..64).step_by(7) {
            let byte = wire::read_u8(input)?;
            encoded |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                let value = ((encoded >> 1) as i64) ^ -((encoded & 1) as i64);
                return Ok(value);
            }
        }
        Err(Error::codec("varint longer than 10 bytes"))
    }
}

/// Count-prefixed sequence of elements.
pub struct IterableCodec<T> {
    element: Arc<dyn Codec<T>>,
}

impl<T> IterableCodec<T> {
    pub fn new(element: Arc<dyn Codec<T>>) -> Self {
        Self { element }
    }
}

impl<T: Send + Sync + 'static> Codec<Vec<T>> for IterableCodec<T> {
    fn encode(&self, value: &Vec<T>, buf: &mut Vec<u8>) -> Result<()> {
        wire::put_i32(buf, value.len() as i32);
        for element in value {
            self.element.encode(element, buf)?;
        }
        Ok(())
    }

    fn decode(&self, input: &mut &[u8]) -> Result<Vec<T>> {
        let count = wire::read_i32(input)?;
        if count < 0 {
            return Err(Error::codec(format!("negative iterable count {count}")));
        }
        let mut elements = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            elements.push(self.element.decode(input)?);
        }
        Ok(elements)
    }
}

/// Key followed by value.
pub struct KvCodec<K, V> {
    key: Arc<dyn Codec<K>>,
    value: Arc<dyn Codec<V>>,
}

impl<K, V> KvCodec<K, V> {
    pub fn new(key: Arc<dyn Codec<K>>, value: Arc<dyn Codec<V>>) -> Self {
        Self { key, value }
    }
}

impl<K, V> Codec<KV<K, V>> for KvCodec<K, V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn encode(&self, value: &KV<K, V>, buf: &mut Vec<u8>) -> Result<()> {
        self.key.encode(&value.key, buf)?;
        self.value.encode(&value.value, buf)
    }

    fn decode(&self, input: &mut &[u8]) -> Result<KV<K, V>> {
        let key = self.key.decode(input)?;
        let value = self.value.decode(input)?;
        Ok(KV::of(key, value))
    }
}
