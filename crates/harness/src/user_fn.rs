//! The user-transform facade.
//!
//! A [`UserFn`] is the opaque bundle of callbacks a transform definition
//! provides. The runner invokes only the callbacks its execution mode needs;
//! every callback is defaulted, and the defaults for splittable capabilities
//! fail with a usage error so a mis-declared transform surfaces immediately.

use crate::context::{
    FinishBundleCtx, OnTimerCtx, ProcessCtx, SplitRestrictionCtx, StartBundleCtx,
};
use crate::sdf::{RestrictionTracker, WatermarkEstimator};
use tandem_core::{Error, ProcessContinuation};

fn unsupported(operation: &str) -> anyhow::Error {
    Error::usage(format!("{operation} is not supported by this transform")).into()
}

/// User-defined transform callbacks.
///
/// Implementations are shared across the process thread and the split thread
/// (the split path may compute restriction sizes while an element is in
/// flight), so callbacks take `&self`; any mutable state belongs behind the
/// implementation's own interior mutability.
pub trait UserFn: Send + Sync + 'static {
    /// Main-input element type.
    type In: Clone + Send + Sync + 'static;

    /// Output element type.
    type Out: Clone + Send + Sync + 'static;

    /// User key type; `()` for unkeyed transforms.
    type Key: Clone + Send + Sync + 'static;

    /// Remaining-work description for one element; `()` when not splittable.
    type Restriction: Clone + Send + Sync + 'static;

    /// Watermark-estimator resume state; `()` when not splittable.
    type WatermarkState: Clone + Send + Sync + 'static;

    type Tracker: RestrictionTracker<Restriction = Self::Restriction>;
    type Estimator: WatermarkEstimator<State = Self::WatermarkState>;

    /// Called once when the runner is constructed.
    fn setup(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called at the start of every bundle.
    fn start_bundle(&self, _ctx: &StartBundleCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Process one element in one window.
    fn process_element(&self, _ctx: &ProcessCtx<'_, Self>) -> anyhow::Result<ProcessContinuation>
    where
        Self: Sized,
    {
        Err(unsupported("process_element"))
    }

    /// Called when a timer in `family_id` fires, once per timer window.
    fn on_timer(
        &self,
        _family_id: &str,
        _dynamic_tag: &str,
        _ctx: &OnTimerCtx<'_, Self>,
    ) -> anyhow::Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }

    /// Called at the end of every bundle, after timers have drained.
    fn finish_bundle(&self, _ctx: &FinishBundleCtx<'_, Self>) -> anyhow::Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }

    /// Called when the runner is being discarded.
    fn teardown(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// The user key of an element, for keyed transforms. State and timer
    /// access require this to return `Some`.
    fn element_key(&self, _element: &Self::In) -> Option<Self::Key> {
        None
    }

    /// The whole-element restriction to start splittable processing from.
    fn initial_restriction(&self, _element: &Self::In) -> anyhow::Result<Self::Restriction> {
        Err(unsupported("initial_restriction"))
    }

    /// The estimator state to start splittable processing from.
    fn initial_watermark_estimator_state(
        &self,
        _element: &Self::In,
    ) -> anyhow::Result<Self::WatermarkState> {
        Err(unsupported("initial_watermark_estimator_state"))
    }

    /// Pre-split one restriction into smaller ones via `ctx.output`.
    fn split_restriction(&self, _ctx: &SplitRestrictionCtx<'_, Self>) -> anyhow::Result<()>
    where
        Self: Sized,
    {
        Err(unsupported("split_restriction"))
    }

    /// A fresh tracker over `restriction`.
    fn new_tracker(&self, _restriction: Self::Restriction) -> anyhow::Result<Self::Tracker> {
        Err(unsupported("new_tracker"))
    }

    /// A fresh watermark estimator resumed from `state`.
    fn new_watermark_estimator(
        &self,
        _state: Self::WatermarkState,
    ) -> anyhow::Result<Self::Estimator> {
        Err(unsupported("new_watermark_estimator"))
    }

    /// The amount of work `restriction` represents. The default derives a
    /// transient tracker and uses its remaining-work reading.
    fn restriction_size(
        &self,
        _element: &Self::In,
        restriction: &Self::Restriction,
    ) -> anyhow::Result<f64> {
        let tracker = self.new_tracker(restriction.clone())?;
        tracker
            .progress()
            .map(|progress| progress.remaining)
            .ok_or_else(|| unsupported("restriction_size"))
    }
}
