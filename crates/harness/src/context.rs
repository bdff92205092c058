//! Contexts handed to user callbacks.
//!
//! One struct per callback kind replaces the per-URN argument-provider
//! hierarchy: every context exposes exactly the capabilities its callback
//! has, and anything else fails with a usage error.

use crate::descriptor::TransformDescriptor;
use crate::element::{ElementInput, InputOf};
use crate::receivers::{BundleFinalizers, WindowedReceiver};
use crate::sdf::{ObservedTracker, ThreadsafeWatermarkEstimator};
use crate::timers::{TimerHandler, UserFnTimer};
use crate::user_fn::UserFn;
use std::collections::HashMap;
use std::sync::Arc;
use tandem_core::{
    Error, Instant, PaneInfo, PipelineOptions, Result, TimeDomain, Timer, Window, WindowedValue,
    KV,
};
use tandem_coders::Codec;
use tandem_state::{BagStateHandle, StateAccessor, ValueStateHandle};

/// Construction-time state shared by every context of one runner.
pub(crate) struct RunnerShared<F: UserFn> {
    pub(crate) options: PipelineOptions,
    pub(crate) descriptor: TransformDescriptor<F>,
    pub(crate) user_fn: Arc<F>,
    pub(crate) tagged_consumers: HashMap<String, Vec<Arc<dyn WindowedReceiver<F::Out>>>>,
    pub(crate) artifact_consumers: Vec<Arc<dyn WindowedReceiver<InputOf<F>>>>,
    pub(crate) finalizers: Arc<BundleFinalizers>,
}

impl<F: UserFn> RunnerShared<F> {
    fn main_consumers(&self) -> &[Arc<dyn WindowedReceiver<F::Out>>] {
        self.tagged_consumers
            .get(&self.descriptor.main_output_tag)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn tagged(&self, tag: &str) -> Result<&[Arc<dyn WindowedReceiver<F::Out>>]> {
        self.tagged_consumers
            .get(tag)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::usage(format!("unknown output tag {tag:?}")))
    }
}

/// Fan a value out to a consumer list, wrapping consumer failures as user
/// failures the way all emission does.
pub(crate) fn deliver<T: Clone>(
    consumers: &[Arc<dyn WindowedReceiver<T>>],
    value: WindowedValue<T>,
) -> Result<()> {
    for consumer in consumers {
        consumer.accept(value.clone()).map_err(Error::user)?;
    }
    Ok(())
}

/// Context for `start_bundle`.
pub struct StartBundleCtx<'a> {
    pub(crate) options: &'a PipelineOptions,
    pub(crate) finalizers: &'a BundleFinalizers,
}

impl<'a> StartBundleCtx<'a> {
    pub fn options(&self) -> &PipelineOptions {
        self.options
    }

    /// Register a callback to run after this bundle's results are committed.
    pub fn after_bundle_commit(
        &self,
        callback: Box<dyn FnOnce() -> anyhow::Result<()> + Send>,
    ) {
        self.finalizers.register(callback);
    }
}

/// Context for `process_element`: one element in one window.
pub struct ProcessCtx<'a, F: UserFn> {
    pub(crate) shared: &'a RunnerShared<F>,
    pub(crate) element: &'a WindowedValue<F::In>,
    pub(crate) window: &'a Window,
    pub(crate) restriction: Option<&'a F::Restriction>,
    pub(crate) estimator_state: Option<&'a F::WatermarkState>,
    pub(crate) tracker: Option<&'a Arc<ObservedTracker<F::Tracker>>>,
    pub(crate) estimator: Option<&'a Arc<ThreadsafeWatermarkEstimator<F::Estimator>>>,
    pub(crate) state: &'a StateAccessor,
    pub(crate) timers: &'a HashMap<String, TimerHandler<F::Key>>,
}

impl<'a, F: UserFn> ProcessCtx<'a, F> {
    pub fn element(&self) -> &F::In {
        &self.element.value
    }

    pub fn timestamp(&self) -> Instant {
        self.element.timestamp
    }

    pub fn window(&self) -> &Window {
        self.window
    }

    pub fn pane(&self) -> PaneInfo {
        self.element.pane
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.shared.options
    }

    fn emit(
        &self,
        consumers: &[Arc<dyn WindowedReceiver<F::Out>>],
        value: F::Out,
        timestamp: Instant,
    ) -> Result<()> {
        if let Some(estimator) = self.estimator {
            estimator.observe_timestamp(timestamp);
        }
        deliver(
            consumers,
            WindowedValue::of(value, timestamp, self.window.clone(), self.element.pane),
        )
    }

    /// Emit to the main output at the element's timestamp.
    pub fn output(&self, value: F::Out) -> Result<()> {
        self.emit(self.shared.main_consumers(), value, self.element.timestamp)
    }

    pub fn output_with_timestamp(&self, value: F::Out, timestamp: Instant) -> Result<()> {
        self.emit(self.shared.main_consumers(), value, timestamp)
    }

    pub fn output_tagged(&self, tag: &str, value: F::Out) -> Result<()> {
        self.emit(self.shared.tagged(tag)?, value, self.element.timestamp)
    }

    pub fn output_tagged_with_timestamp(
        &self,
        tag: &str,
        value: F::Out,
        timestamp: Instant,
    ) -> Result<()> {
        self.emit(self.shared.tagged(tag)?, value, timestamp)
    }

    /// Read a side-input view for the current window.
    pub fn side_input<T: Clone + 'static>(&self, tag: &str) -> Result<T> {
        let view = self.state.side_input(tag, self.window)?;
        view.downcast_ref::<T>().cloned().ok_or_else(|| {
            Error::usage(format!("side input {tag:?} does not materialize the requested type"))
        })
    }

    pub fn value_state<T: 'static>(
        &self,
        state_id: &str,
        codec: Arc<dyn Codec<T>>,
    ) -> Result<ValueStateHandle<'_, T>> {
        self.state.bind_value(state_id, codec)
    }

    pub fn bag_state<T: 'static>(
        &self,
        state_id: &str,
        codec: Arc<dyn Codec<T>>,
    ) -> Result<BagStateHandle<'_, T>> {
        self.state.bind_bag(state_id, codec)
    }

    /// A timer in `family`, seeded from the current element. Requires a keyed
    /// element.
    pub fn timer(&self, family: &str) -> Result<UserFnTimer<'_, F::Key>> {
        let key = self
            .shared
            .user_fn
            .element_key(&self.element.value)
            .ok_or_else(|| {
                Error::usage("timer access requires a keyed element; the current element has no key")
            })?;
        let spec = self
            .shared
            .descriptor
            .timer_families
            .get(family)
            .ok_or_else(|| Error::usage(format!("unknown timer family {family:?}")))?;
        let fire_source = match spec.time_domain {
            TimeDomain::EventTime => self.element.timestamp,
            _ => Instant::now(),
        };
        Ok(UserFnTimer::new(
            family.to_string(),
            key,
            String::new(),
            self.window.clone(),
            self.element.timestamp,
            fire_source,
            self.element.pane,
            spec.time_domain,
            self.shared.descriptor.windowing.allowed_lateness,
            self.timers,
        ))
    }

    /// The restriction being processed; splittable modes only.
    pub fn restriction(&self) -> Result<&F::Restriction> {
        self.restriction
            .ok_or_else(|| Error::usage("no restriction outside of splittable processing"))
    }

    pub fn watermark_estimator_state(&self) -> Result<&F::WatermarkState> {
        self.estimator_state
            .ok_or_else(|| Error::usage("no watermark state outside of splittable processing"))
    }

    /// The tracker guarding the current restriction; splittable process
    /// modes only.
    pub fn tracker(&self) -> Result<&Arc<ObservedTracker<F::Tracker>>> {
        self.tracker
            .ok_or_else(|| Error::usage("no restriction tracker outside of splittable processing"))
    }

    pub fn watermark_estimator(
        &self,
    ) -> Result<&Arc<ThreadsafeWatermarkEstimator<F::Estimator>>> {
        self.estimator
            .ok_or_else(|| Error::usage("no watermark estimator outside of splittable processing"))
    }

    pub fn after_bundle_commit(
        &self,
        callback: Box<dyn FnOnce() -> anyhow::Result<()> + Send>,
    ) {
        self.shared.finalizers.register(callback);
    }
}

/// Context for `split_restriction`: emits sub-restrictions of the current
/// element's restriction.
pub struct SplitRestrictionCtx<'a, F: UserFn> {
    pub(crate) shared: &'a RunnerShared<F>,
    pub(crate) element: &'a WindowedValue<F::In>,
    pub(crate) window: &'a Window,
    pub(crate) restriction: &'a F::Restriction,
    pub(crate) estimator_state: &'a F::WatermarkState,
    pub(crate) sized: bool,
}

impl<'a, F: UserFn> SplitRestrictionCtx<'a, F> {
    pub fn element(&self) -> &F::In {
        &self.element.value
    }

    pub fn timestamp(&self) -> Instant {
        self.element.timestamp
    }

    pub fn window(&self) -> &Window {
        self.window
    }

    pub fn restriction(&self) -> &F::Restriction {
        self.restriction
    }

    pub fn watermark_estimator_state(&self) -> &F::WatermarkState {
        self.estimator_state
    }

    /// Emit one sub-restriction. In the sized mode the artifact also carries
    /// the sub-restriction's size, computed through `restriction_size`.
    pub fn output(&self, sub_restriction: F::Restriction) -> Result<()> {
        let pair = KV::of(
            self.element.value.clone(),
            KV::of(sub_restriction.clone(), self.estimator_state.clone()),
        );
        let artifact = if self.sized {
            let size = self
                .shared
                .user_fn
                .restriction_size(&self.element.value, &sub_restriction)
                .map_err(Error::user)?;
            ElementInput::Sized(KV::of(pair, size))
        } else {
            ElementInput::Paired(pair)
        };
        deliver(
            &self.shared.artifact_consumers,
            WindowedValue::of(
                artifact,
                self.element.timestamp,
                self.window.clone(),
                self.element.pane,
            ),
        )
    }
}

/// Context for `on_timer`: one firing timer in one of its windows.
pub struct OnTimerCtx<'a, F: UserFn> {
    pub(crate) shared: &'a RunnerShared<F>,
    pub(crate) timer: &'a Timer<F::Key>,
    pub(crate) window: &'a Window,
    pub(crate) time_domain: TimeDomain,
    pub(crate) state: &'a StateAccessor,
    pub(crate) timers: &'a HashMap<String, TimerHandler<F::Key>>,
}

impl<'a, F: UserFn> OnTimerCtx<'a, F> {
    pub fn user_key(&self) -> &F::Key {
        &self.timer.user_key
    }

    /// The firing timer's hold timestamp; emission defaults to it.
    pub fn timestamp(&self) -> Instant {
        self.timer.hold_timestamp
    }

    pub fn fire_timestamp(&self) -> Instant {
        self.timer.fire_timestamp
    }

    pub fn time_domain(&self) -> TimeDomain {
        self.time_domain
    }

    pub fn window(&self) -> &Window {
        self.window
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.shared.options
    }

    pub fn output(&self, value: F::Out) -> Result<()> {
        deliver(
            self.shared.main_consumers(),
            WindowedValue::of(
                value,
                self.timer.hold_timestamp,
                self.window.clone(),
                self.timer.pane,
            ),
        )
    }

    /// Emit at an explicit timestamp, which must not precede the timer's
    /// hold.
    pub fn output_with_timestamp(&self, value: F::Out, timestamp: Instant) -> Result<()> {
        if timestamp.is_before(self.timer.hold_timestamp) {
            return Err(Error::usage(format!(
                "output time {timestamp:?} cannot precede the firing timer's hold {:?}",
                self.timer.hold_timestamp
            )));
        }
        deliver(
            self.shared.main_consumers(),
            WindowedValue::of(value, timestamp, self.window.clone(), self.timer.pane),
        )
    }

    pub fn output_tagged(&self, tag: &str, value: F::Out) -> Result<()> {
        deliver(
            self.shared.tagged(tag)?,
            WindowedValue::of(
                value,
                self.timer.hold_timestamp,
                self.window.clone(),
                self.timer.pane,
            ),
        )
    }

    pub fn value_state<T: 'static>(
        &self,
        state_id: &str,
        codec: Arc<dyn Codec<T>>,
    ) -> Result<ValueStateHandle<'_, T>> {
        self.state.bind_value(state_id, codec)
    }

    pub fn bag_state<T: 'static>(
        &self,
        state_id: &str,
        codec: Arc<dyn Codec<T>>,
    ) -> Result<BagStateHandle<'_, T>> {
        self.state.bind_bag(state_id, codec)
    }

    /// A timer in `family`, seeded from the firing timer: same key and tag,
    /// hold carried forward.
    pub fn timer(&self, family: &str) -> Result<UserFnTimer<'_, F::Key>> {
        let spec = self
            .shared
            .descriptor
            .timer_families
            .get(family)
            .ok_or_else(|| Error::usage(format!("unknown timer family {family:?}")))?;
        let fire_source = match spec.time_domain {
            TimeDomain::EventTime => self.timer.fire_timestamp,
            _ => Instant::now(),
        };
        Ok(UserFnTimer::new(
            family.to_string(),
            self.timer.user_key.clone(),
            self.timer.dynamic_tag.clone(),
            self.window.clone(),
            self.timer.hold_timestamp,
            fire_source,
            self.timer.pane,
            spec.time_domain,
            self.shared.descriptor.windowing.allowed_lateness,
            self.timers,
        ))
    }
}

/// Context for `finish_bundle`: emission requires an explicit timestamp and
/// window, paned as a non-firing.
pub struct FinishBundleCtx<'a, F: UserFn> {
    pub(crate) shared: &'a RunnerShared<F>,
}

impl<'a, F: UserFn> FinishBundleCtx<'a, F> {
    pub fn options(&self) -> &PipelineOptions {
        &self.shared.options
    }

    pub fn output(&self, value: F::Out, timestamp: Instant, window: &Window) -> Result<()> {
        deliver(
            self.shared.main_consumers(),
            WindowedValue::of(value, timestamp, window.clone(), PaneInfo::NO_FIRING),
        )
    }

    pub fn output_tagged(
        &self,
        tag: &str,
        value: F::Out,
        timestamp: Instant,
        window: &Window,
    ) -> Result<()> {
        deliver(
            self.shared.tagged(tag)?,
            WindowedValue::of(value, timestamp, window.clone(), PaneInfo::NO_FIRING),
        )
    }

    pub fn after_bundle_commit(
        &self,
        callback: Box<dyn FnOnce() -> anyhow::Result<()> + Send>,
    ) {
        self.shared.finalizers.register(callback);
    }
}
