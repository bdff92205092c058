//! Timer records and the process-continuation protocol.

use crate::time::{Duration, Instant};
use crate::windowing::{PaneInfo, Window};
use serde::{Deserialize, Serialize};

/// Which clock a timer family fires against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeDomain {
    EventTime,
    ProcessingTime,
    SynchronizedProcessingTime,
}

/// A scheduled timer firing, keyed by the user key of the element that set it.
///
/// `hold_timestamp` participates in the output watermark: downstream progress
/// cannot pass it while the timer is outstanding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timer<K> {
    pub user_key: K,
    pub dynamic_tag: String,
    pub windows: Vec<Window>,
    pub fire_timestamp: Instant,
    pub hold_timestamp: Instant,
    pub pane: PaneInfo,
}

/// What a splittable process callback wants to happen next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessContinuation {
    resume: bool,
    resume_delay: Duration,
}

impl ProcessContinuation {
    /// Processing of the current restriction is complete.
    pub fn stop() -> Self {
        Self {
            resume: false,
            resume_delay: Duration::ZERO,
        }
    }

    /// The callback wants the remainder of the restriction rescheduled.
    pub fn resume() -> Self {
        Self {
            resume: true,
            resume_delay: Duration::ZERO,
        }
    }

    pub fn with_resume_delay(mut self, delay: Duration) -> Self {
        self.resume_delay = delay;
        self
    }

    pub fn should_resume(&self) -> bool {
        self.resume
    }

    pub fn resume_delay(&self) -> Duration {
        self.resume_delay
    }
}
