//! Pipeline options: an opaque configuration bag handed through to user code.

use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct PipelineOptions {
    values: HashMap<String, String>,
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}
