//! Value envelopes flowing through operator edges.

use crate::time::Instant;
use crate::windowing::{PaneInfo, Window};
use serde::{Deserialize, Serialize};

/// A key/value pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KV<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> KV<K, V> {
    pub fn of(key: K, value: V) -> Self {
        Self { key, value }
    }
}

/// An immutable envelope carrying a value, its event timestamp, the windows
/// it belongs to, and its pane.
///
/// The runner explodes the window set per-window during dispatch; a value the
/// user observes inside a callback is always in exactly one window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowedValue<T> {
    pub value: T,
    pub timestamp: Instant,
    pub windows: Vec<Window>,
    pub pane: PaneInfo,
}

impl<T> WindowedValue<T> {
    pub fn new(value: T, timestamp: Instant, windows: Vec<Window>, pane: PaneInfo) -> Self {
        Self {
            value,
            timestamp,
            windows,
            pane,
        }
    }

    /// A value in a single window.
    pub fn of(value: T, timestamp: Instant, window: Window, pane: PaneInfo) -> Self {
        Self::new(value, timestamp, vec![window], pane)
    }

    /// A value in the global window at the minimum timestamp.
    pub fn in_global_window(value: T) -> Self {
        Self::of(value, Instant::MIN, Window::Global, PaneInfo::NO_FIRING)
    }

    /// The same envelope around a different value.
    pub fn with_value<U>(&self, value: U) -> WindowedValue<U> {
        WindowedValue {
            value,
            timestamp: self.timestamp,
            windows: self.windows.clone(),
            pane: self.pane,
        }
    }
}
