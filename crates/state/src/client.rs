//! The state-service client contract.

use bytes::Bytes;
use dashmap::DashMap;

/// What a state cell holds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StateKind {
    /// User state declared on the transform.
    BagUserState { state_id: String },
    /// A multimap side-input view of another collection.
    MultimapSideInput { side_input_id: String, map_key: Bytes },
}

/// Fully-qualified address of one state cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub instruction_id: String,
    pub transform_id: String,
    pub kind: StateKind,
    /// Encoded user key; empty for side inputs.
    pub key: Bytes,
    /// Encoded window the cell is scoped to.
    pub window: Bytes,
}

/// Client for the external state service.
///
/// A missing cell reads as empty bytes; `append` concatenates encoded
/// elements onto the cell.
pub trait StateClient: Send + Sync {
    fn get(&self, key: &StateKey) -> anyhow::Result<Bytes>;
    fn append(&self, key: &StateKey, data: Bytes) -> anyhow::Result<()>;
    fn clear(&self, key: &StateKey) -> anyhow::Result<()>;
}

/// Map-backed state client for tests and single-process workers.
#[derive(Default)]
pub struct InMemoryStateClient {
    cells: DashMap<StateKey, Vec<u8>>,
}

impl InMemoryStateClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cell directly, bypassing the accessor. Useful for preparing
    /// side-input contents.
    pub fn put(&self, key: StateKey, data: Bytes) {
        self.cells.insert(key, data.to_vec());
    }
}

impl StateClient for InMemoryStateClient {
    fn get(&self, key: &StateKey) -> anyhow::Result<Bytes> {
        Ok(self
            .cells
            .get(key)
            .map(|cell| Bytes::copy_from_slice(cell.value()))
            .unwrap_or_default())
    }

    fn append(&self, key: &StateKey, data: Bytes) -> anyhow::Result<()> {
        self.cells
            .entry(key.clone())
            .or_default()
            .extend_from_slice(&data);
        Ok(())
    }

    fn clear(&self, key: &StateKey) -> anyhow::Result<()> {
        self.cells.remove(key);
        Ok(())
    }
}
