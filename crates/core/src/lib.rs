//! Core types shared across the harness.
//!
//! Everything a bundle runner passes between its components lives here: the
//! millisecond time model, windows and panes, windowed value envelopes, timer
//! records, and the error taxonomy.

mod error;
mod options;
mod time;
mod timer;
mod value;
mod windowing;

pub use error::{Error, Result};
pub use options::PipelineOptions;
pub use time::{Duration, Instant};
pub use timer::{ProcessContinuation, TimeDomain, Timer};
pub use value::{WindowedValue, KV};
pub use windowing::{
    garbage_collection_time, IntervalWindow, PaneInfo, PaneTiming, Window, WindowingStrategy,
};
