//! Windows, panes, and windowing strategies.

use crate::time::{Duration, Instant};
use serde::{Deserialize, Serialize};

/// A half-open event-time interval `[start, end)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntervalWindow {
    pub start: Instant,
    pub end: Instant,
}

impl IntervalWindow {
    pub fn new(start: Instant, end: Instant) -> Self {
        Self { start, end }
    }

    /// The latest timestamp an element in this window may carry.
    pub fn max_timestamp(&self) -> Instant {
        self.end - Duration::from_millis(1)
    }
}

/// A bounded window an element belongs to.
///
/// Windows are totally ordered by their maximum timestamp (ties broken by
/// start), which is all the runner ever needs of them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Window {
    Global,
    Interval(IntervalWindow),
}

impl Window {
    pub fn interval(start: Instant, end: Instant) -> Self {
        Window::Interval(IntervalWindow::new(start, end))
    }

    pub fn max_timestamp(&self) -> Instant {
        match self {
            Window::Global => Instant::END_OF_GLOBAL_WINDOW,
            Window::Interval(w) => w.max_timestamp(),
        }
    }

    fn sort_key(&self) -> (Instant, Instant) {
        let start = match self {
            Window::Global => Instant::MIN,
            Window::Interval(w) => w.start,
        };
        (self.max_timestamp(), start)
    }
}

impl PartialOrd for Window {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Window {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// The instant after which no event-time timer may fire for `window`:
/// the window's maximum timestamp plus the allowed lateness.
pub fn garbage_collection_time(window: &Window, allowed_lateness: Duration) -> Instant {
    window.max_timestamp().saturating_add(allowed_lateness)
}

/// When within the window lifecycle a pane was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaneTiming {
    Early,
    OnTime,
    Late,
    Unknown,
}

/// The trigger-firing identity of an element within its window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaneInfo {
    pub timing: PaneTiming,
    pub index: u32,
    pub is_first: bool,
    pub is_last: bool,
}

impl PaneInfo {
    /// The pane of an element that was never in a triggered window.
    pub const NO_FIRING: PaneInfo = PaneInfo {
        timing: PaneTiming::Unknown,
        index: 0,
        is_first: true,
        is_last: true,
    };

    pub const ON_TIME: PaneInfo = PaneInfo {
        timing: PaneTiming::OnTime,
        index: 0,
        is_first: true,
        is_last: true,
    };
}

impl Default for PaneInfo {
    fn default() -> Self {
        PaneInfo::NO_FIRING
    }
}

/// The slice of a windowing strategy the runner consumes.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowingStrategy {
    pub allowed_lateness: Duration,
}

impl WindowingStrategy {
    pub fn new(allowed_lateness: Duration) -> Self {
        Self { allowed_lateness }
    }
}
