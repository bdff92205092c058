//! Claim-observing tracker wrapper.

use super::{Progress, RestrictionSplit, RestrictionTracker};
use parking_lot::Mutex;
use std::sync::Arc;

/// Receives the outcome of every claim against a tracker.
///
/// The default observer does nothing; the wrapper exists so higher layers can
/// attach metrics without touching user code paths.
pub trait ClaimObserver<P>: Send + Sync {
    fn on_claimed(&self, position: &P);
    fn on_claim_failed(&self, position: &P);
}

pub struct NoopClaimObserver;

impl<P> ClaimObserver<P> for NoopClaimObserver {
    fn on_claimed(&self, _position: &P) {}
    fn on_claim_failed(&self, _position: &P) {}
}

/// Interposes a [`ClaimObserver`] in front of a user tracker and provides the
/// internal synchronization the split protocol relies on: `try_split` from
/// the control thread and `try_claim` from the process thread may race, and
/// the inner lock serializes them.
pub struct ObservedTracker<T: RestrictionTracker> {
    inner: Mutex<T>,
    observer: Arc<dyn ClaimObserver<T::Position>>,
}

impl<T: RestrictionTracker> ObservedTracker<T> {
    pub fn observe(tracker: T, observer: Arc<dyn ClaimObserver<T::Position>>) -> Self {
        Self {
            inner: Mutex::new(tracker),
            observer,
        }
    }

    pub fn noop(tracker: T) -> Self {
        Self::observe(tracker, Arc::new(NoopClaimObserver))
    }

    pub fn try_claim(&self, position: T::Position) -> bool {
        let claimed = self.inner.lock().try_claim(position.clone());
        if claimed {
            self.observer.on_claimed(&position);
        } else {
            self.observer.on_claim_failed(&position);
        }
        claimed
    }

    pub fn current_restriction(&self) -> T::Restriction {
        self.inner.lock().current_restriction()
    }

    pub fn try_split(&self, fraction_of_remainder: f64) -> Option<RestrictionSplit<T::Restriction>> {
        self.inner.lock().try_split(fraction_of_remainder)
    }

    pub fn check_done(&self) -> anyhow::Result<()> {
        self.inner.lock().check_done()
    }

    pub fn progress(&self) -> Option<Progress> {
        self.inner.lock().progress()
    }
}
