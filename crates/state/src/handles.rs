//! Typed handles over individual state cells.

use crate::accessor::{StateAccessor, StateOp};
use crate::client::StateKey;
use bytes::Bytes;
use std::sync::Arc;
use tandem_core::Result;
use tandem_coders::Codec;

fn decode_all<T: 'static>(codec: &dyn Codec<T>, contents: &[u8]) -> Result<Vec<T>> {
    let mut input = contents;
    let mut values = Vec::new();
    while !input.is_empty() {
        values.push(codec.decode(&mut input)?);
    }
    Ok(values)
}

/// A single value per key and window. Stored as a bag whose last element
/// wins, so writes are cheap appends until a clear.
pub struct ValueStateHandle<'a, T> {
    accessor: &'a StateAccessor,
    key: StateKey,
    codec: Arc<dyn Codec<T>>,
}

impl<'a, T: 'static> ValueStateHandle<'a, T> {
    pub(crate) fn new(
        accessor: &'a StateAccessor,
        key: StateKey,
        codec: Arc<dyn Codec<T>>,
    ) -> Self {
        Self {
            accessor,
            key,
            codec,
        }
    }

    pub fn read(&self) -> Result<Option<T>> {
        let contents = self.accessor.read_cell(&self.key)?;
        Ok(decode_all(&*self.codec, &contents)?.pop())
    }

    pub fn write(&self, value: &T) -> Result<()> {
        let mut buf = Vec::new();
        self.codec.encode(value, &mut buf)?;
        self.accessor.push_op(self.key.clone(), StateOp::Clear);
        self.accessor
            .push_op(self.key.clone(), StateOp::Append(Bytes::from(buf)));
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.accessor.push_op(self.key.clone(), StateOp::Clear);
        Ok(())
    }
}

/// An append-only list per key and window.
pub struct BagStateHandle<'a, T> {
    accessor: &'a StateAccessor,
    key: StateKey,
    codec: Arc<dyn Codec<T>>,
}

impl<'a, T: 'static> BagStateHandle<'a, T> {
    pub(crate) fn new(
        accessor: &'a StateAccessor,
        key: StateKey,
        codec: Arc<dyn Codec<T>>,
    ) -> Self {
        Self {
            accessor,
            key,
            codec,
        }
    }

    pub fn read(&self) -> Result<Vec<T>> {
        let contents = self.accessor.read_cell(&self.key)?;
        decode_all(&*self.codec, &contents)
    }

    pub fn append(&self, value: &T) -> Result<()> {
        let mut buf = Vec::new();
        self.codec.encode(value, &mut buf)?;
        self.accessor
            .push_op(self.key.clone(), StateOp::Append(Bytes::from(buf)));
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.accessor.push_op(self.key.clone(), StateOp::Clear);
        Ok(())
    }
}
