//! Bundle-scoped facade over the state service.

use crate::client::{StateClient, StateKey, StateKind};
use crate::handles::{BagStateHandle, ValueStateHandle};
use crate::side_input::SideInputSpec;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tandem_coders::{encode_to_bytes, Codec};
use tandem_core::{Error, Result, Window};
use tracing::debug;

/// Supplies the encoded user key of whatever is currently being processed:
/// the key of the current element if it is keyed, else the user key of the
/// firing timer, else `None`.
pub type KeyFn = Box<dyn Fn() -> Option<Bytes> + Send + Sync>;

/// Supplies the window currently being processed.
pub type WindowFn = Box<dyn Fn() -> Option<Window> + Send + Sync>;

pub(crate) enum StateOp {
    Append(Bytes),
    Clear,
}

/// Lives from `start` to `finish` of one bundle. Reads are served through the
/// client with this bundle's uncommitted writes applied on top; writes are
/// buffered and flushed by [`StateAccessor::finalize_state`].
pub struct StateAccessor {
    instruction_id: String,
    transform_id: String,
    client: Arc<dyn StateClient>,
    side_inputs: HashMap<String, SideInputSpec>,
    window_codec: Arc<dyn Codec<Window>>,
    key_fn: KeyFn,
    window_fn: WindowFn,
    side_input_cache: DashMap<(String, Bytes), Arc<dyn Any + Send + Sync>>,
    pending: Mutex<Vec<(StateKey, StateOp)>>,
}

impl StateAccessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instruction_id: String,
        transform_id: String,
        client: Arc<dyn StateClient>,
        side_inputs: HashMap<String, SideInputSpec>,
        window_codec: Arc<dyn Codec<Window>>,
        key_fn: KeyFn,
        window_fn: WindowFn,
    ) -> Self {
        Self {
            instruction_id,
            transform_id,
            client,
            side_inputs,
            window_codec,
            key_fn,
            window_fn,
            side_input_cache: DashMap::new(),
            pending: Mutex::new(Vec::new()),
        }
    }

    fn current_key(&self) -> Result<Bytes> {
        (self.key_fn)().ok_or_else(|| {
            Error::usage("state access requires a keyed current element or a firing timer")
        })
    }

    fn current_window(&self) -> Result<Window> {
        (self.window_fn)()
            .ok_or_else(|| Error::usage("state access outside of an element or timer callback"))
    }

    fn user_state_key(&self, state_id: &str) -> Result<StateKey> {
        let key = self.current_key()?;
        let window = self.current_window()?;
        let window_bytes = encode_to_bytes(&*self.window_codec, &window)?;
        Ok(StateKey {
            instruction_id: self.instruction_id.clone(),
            transform_id: self.transform_id.clone(),
            kind: StateKind::BagUserState {
                state_id: state_id.to_string(),
            },
            key,
            window: window_bytes,
        })
    }

    /// Bind a single-value state cell for the current key and window.
    pub fn bind_value<T: 'static>(
        &self,
        state_id: &str,
        codec: Arc<dyn Codec<T>>,
    ) -> Result<ValueStateHandle<'_, T>> {
        Ok(ValueStateHandle::new(self, self.user_state_key(state_id)?, codec))
    }

    /// Bind a bag state cell for the current key and window.
    pub fn bind_bag<T: 'static>(
        &self,
        state_id: &str,
        codec: Arc<dyn Codec<T>>,
    ) -> Result<BagStateHandle<'_, T>> {
        Ok(BagStateHandle::new(self, self.user_state_key(state_id)?, codec))
    }

    /// Read a side-input view for `window`, materialized once per
    /// (tag, mapped window) and cached for the rest of the bundle.
    pub fn side_input(&self, tag: &str, window: &Window) -> Result<Arc<dyn Any + Send + Sync>> {
        let spec = self
            .side_inputs
            .get(tag)
            .ok_or_else(|| Error::usage(format!("undeclared side input {tag:?}")))?;
        let mapped = (spec.window_mapping_fn)(window);
        let window_bytes = encode_to_bytes(&*spec.window_codec, &mapped)?;
        let cache_key = (tag.to_string(), window_bytes.clone());
        if let Some(view) = self.side_input_cache.get(&cache_key) {
            return Ok(view.value().clone());
        }

        let state_key = StateKey {
            instruction_id: self.instruction_id.clone(),
            transform_id: self.transform_id.clone(),
            kind: StateKind::MultimapSideInput {
                side_input_id: tag.to_string(),
                map_key: Bytes::new(),
            },
            key: Bytes::new(),
            window: window_bytes,
        };
        let raw = self.client.get(&state_key).map_err(Error::Transport)?;
        let view: Arc<dyn Any + Send + Sync> = (spec.view_fn)(raw).map_err(Error::user)?.into();
        self.side_input_cache.insert(cache_key, view.clone());
        Ok(view)
    }

    /// The cell's committed contents with this bundle's pending ops applied.
    pub(crate) fn read_cell(&self, key: &StateKey) -> Result<Vec<u8>> {
        let mut contents = self.client.get(key).map_err(Error::Transport)?.to_vec();
        for (pending_key, op) in self.pending.lock().iter() {
            if pending_key != key {
                continue;
            }
            match op {
                StateOp::Clear => contents.clear(),
                StateOp::Append(data) => contents.extend_from_slice(data),
            }
        }
        Ok(contents)
    }

    pub(crate) fn push_op(&self, key: StateKey, op: StateOp) {
        self.pending.lock().push((key, op));
    }

    /// Flush buffered writes to the state service and drop bundle-local
    /// caches. Called exactly once, at bundle finish.
    pub fn finalize_state(&self) -> Result<()> {
        let ops = std::mem::take(&mut *self.pending.lock());
        let count = ops.len();
        for (key, op) in ops {
            match op {
                StateOp::Append(data) => {
                    self.client.append(&key, data).map_err(Error::Transport)?
                }
                StateOp::Clear => self.client.clear(&key).map_err(Error::Transport)?,
            }
        }
        self.side_input_cache.clear();
        debug!(
            transform_id = %self.transform_id,
            flushed_ops = count,
            "state accessor finalized"
        );
        Ok(())
    }
}
