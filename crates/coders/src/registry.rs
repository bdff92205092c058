//! A registry of named codecs.

use crate::Codec;
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;

/// Maps codec ids from a transform descriptor to codec instances.
///
/// Entries are stored type-erased; `get` recovers the typed codec and returns
/// `None` when the id is unknown or registered at a different type.
#[derive(Default)]
pub struct CodecRegistry {
    entries: DashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: 'static>(&self, id: impl Into<String>, codec: Arc<dyn Codec<T>>) {
        self.entries.insert(id.into(), Arc::new(codec));
    }

    pub fn get<T: 'static>(&self, id: &str) -> Option<Arc<dyn Codec<T>>> {
        self.entries
            .get(id)
            .and_then(|entry| entry.value().downcast_ref::<Arc<dyn Codec<T>>>().cloned())
    }
}
