//! The concurrent self-split protocol.
//!
//! [`SplitCoordinator`] owns the split-critical snapshot of the element
//! currently being processed. The process thread publishes a fresh
//! [`ElementScope`] under the split mutex before each `process_element`
//! invocation and clears it on every exit path; the control thread reads the
//! snapshot under the same mutex to answer progress and split requests.

use crate::descriptor::{TransformDescriptor, UrnMode};
use crate::element::{ElementInput, InputOf};
use crate::sdf::{ObservedTracker, Progress, RestrictionSplit, ThreadsafeWatermarkEstimator};
use crate::user_fn::UserFn;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tandem_coders::{encode_to_bytes, Codec, DoubleCodec, IterableCodec};
use tandem_core::{Duration, Error, Instant, Result, WindowedValue, KV};
use tandem_protocol::{
    urns, BundleApplication, DelayedBundleApplication, MonitoringInfo, Timestamp,
};
use tracing::debug;

/// Everything the split thread may observe about the element in flight.
pub(crate) struct ElementScope<F: UserFn> {
    pub(crate) element: WindowedValue<F::In>,
    pub(crate) window: tandem_core::Window,
    #[allow(dead_code)]
    pub(crate) restriction: F::Restriction,
    pub(crate) estimator_state: F::WatermarkState,
    pub(crate) tracker: Arc<ObservedTracker<F::Tracker>>,
    pub(crate) estimator: Arc<ThreadsafeWatermarkEstimator<F::Estimator>>,
}

pub(crate) struct WindowedSplitResult<F: UserFn> {
    pub(crate) primary: WindowedValue<InputOf<F>>,
    pub(crate) residual: WindowedValue<InputOf<F>>,
}

/// Answers progress and split requests for one runner, from any thread.
pub struct SplitCoordinator<F: UserFn> {
    mode: UrnMode,
    user_fn: Arc<F>,
    transform_id: String,
    main_input_id: String,
    output_tags: Vec<String>,
    full_input_codec: Arc<dyn Codec<WindowedValue<InputOf<F>>>>,
    scope: Mutex<Option<ElementScope<F>>>,
}

impl<F: UserFn> SplitCoordinator<F> {
    pub(crate) fn new(descriptor: &TransformDescriptor<F>, user_fn: Arc<F>) -> Self {
        Self {
            mode: descriptor.mode,
            user_fn,
            transform_id: descriptor.transform_id.clone(),
            main_input_id: descriptor.main_input_id.clone(),
            output_tags: descriptor.outputs.keys().cloned().collect(),
            full_input_codec: descriptor.full_input_codec(),
            scope: Mutex::new(None),
        }
    }

    /// Build and publish the per-element scope under the split mutex. The
    /// returned tracker and estimator handles are what the process thread
    /// reads during the callback; it never re-acquires the mutex for them.
    pub(crate) fn publish_with<M>(
        &self,
        make: M,
    ) -> Result<(
        Arc<ObservedTracker<F::Tracker>>,
        Arc<ThreadsafeWatermarkEstimator<F::Estimator>>,
    )>
    where
        M: FnOnce() -> Result<ElementScope<F>>,
    {
        let mut guard = self.scope.lock();
        let scope = make()?;
        let handles = (scope.tracker.clone(), scope.estimator.clone());
        *guard = Some(scope);
        Ok(handles)
    }

    pub(crate) fn clear(&self) {
        *self.scope.lock() = None;
    }

    /// The current tracker's progress reading, when an element is in flight
    /// and its tracker can measure progress.
    pub fn progress(&self) -> Option<Progress> {
        self.scope
            .lock()
            .as_ref()
            .and_then(|scope| scope.tracker.progress())
    }

    /// Completed work as a fraction of the whole, for data-plane progress
    /// probes.
    pub fn progress_fraction(&self) -> f64 {
        self.progress().map(|p| p.fraction()).unwrap_or(0.0)
    }

    /// The two progress metrics reported to the orchestrator, each encoded
    /// as a single-element double iterable.
    pub fn monitoring_infos(&self) -> Result<Vec<MonitoringInfo>> {
        let Some(progress) = self.progress() else {
            return Ok(Vec::new());
        };
        Ok(vec![
            self.progress_metric(urns::WORK_COMPLETED, progress.completed)?,
            self.progress_metric(urns::WORK_REMAINING, progress.remaining)?,
        ])
    }

    fn progress_metric(&self, urn: &str, value: f64) -> Result<MonitoringInfo> {
        let payload =
            encode_to_bytes(&IterableCodec::new(Arc::new(DoubleCodec)), &vec![value])?;
        Ok(MonitoringInfo {
            urn: urn.to_string(),
            r#type: urns::PROGRESS_TYPE.to_string(),
            labels: HashMap::from([(
                urns::TRANSFORM_LABEL.to_string(),
                self.transform_id.clone(),
            )]),
            payload,
        })
    }

    /// Attempt to split the in-flight restriction, keeping
    /// `fraction_of_remainder` of the unprocessed work and handing the rest
    /// back as a delayed residual application.
    ///
    /// Returns `Ok(None)` when nothing is splittable right now: no element
    /// is in flight, or the tracker declined. Callers must treat that as
    /// "nothing available", not failure.
    pub fn try_split(
        &self,
        fraction_of_remainder: f64,
        resume_delay: Duration,
    ) -> Result<Option<(BundleApplication, DelayedBundleApplication)>> {
        let (windowed, watermark) = {
            let guard = self.scope.lock();
            // Between element invocations there is nothing to split.
            let Some(scope) = guard.as_ref() else {
                return Ok(None);
            };
            // Freeze the output watermark before splitting the tracker; the
            // frozen value becomes the lower-bound hold on the residual.
            let (watermark, residual_state) = scope.estimator.watermark_and_state();
            let Some(split) = scope.tracker.try_split(fraction_of_remainder) else {
                return Ok(None);
            };
            (
                self.to_windowed_split(scope, split, residual_state)?,
                watermark,
            )
        };

        let primary_bytes = encode_to_bytes(&*self.full_input_codec, &windowed.primary)?;
        let residual_bytes = encode_to_bytes(&*self.full_input_codec, &windowed.residual)?;

        let primary = BundleApplication {
            transform_id: self.transform_id.clone(),
            input_id: self.main_input_id.clone(),
            element: primary_bytes,
        };
        let mut residual = DelayedBundleApplication {
            application: Some(BundleApplication {
                transform_id: self.transform_id.clone(),
                input_id: self.main_input_id.clone(),
                element: residual_bytes,
            }),
            requested_time_delay: Some(tandem_protocol::Duration::from_millis(
                resume_delay.millis(),
            )),
            output_watermarks: HashMap::new(),
        };
        if watermark != Instant::MIN {
            for tag in &self.output_tags {
                residual
                    .output_watermarks
                    .insert(tag.clone(), Timestamp::from_epoch_millis(watermark.millis()));
            }
        }

        debug!(
            transform_id = %self.transform_id,
            fraction = fraction_of_remainder,
            "restriction split taken"
        );
        Ok(Some((primary, residual)))
    }

    fn to_windowed_split(
        &self,
        scope: &ElementScope<F>,
        split: RestrictionSplit<F::Restriction>,
        residual_state: F::WatermarkState,
    ) -> Result<WindowedSplitResult<F>> {
        let pair = |restriction: F::Restriction, state: F::WatermarkState| {
            KV::of(scope.element.value.clone(), KV::of(restriction, state))
        };
        let (primary_value, residual_value) = match self.mode {
            UrnMode::ProcessElements => (
                ElementInput::Paired(pair(split.primary, scope.estimator_state.clone())),
                ElementInput::Paired(pair(split.residual, residual_state)),
            ),
            UrnMode::ProcessSizedElementsAndRestrictions => {
                let primary_size = self
                    .user_fn
                    .restriction_size(&scope.element.value, &split.primary)
                    .map_err(Error::user)?;
                let residual_size = self
                    .user_fn
                    .restriction_size(&scope.element.value, &split.residual)
                    .map_err(Error::user)?;
                (
                    ElementInput::Sized(KV::of(
                        pair(split.primary, scope.estimator_state.clone()),
                        primary_size,
                    )),
                    ElementInput::Sized(KV::of(pair(split.residual, residual_state), residual_size)),
                )
            }
            mode => {
                return Err(Error::usage(format!(
                    "self-splitting is not supported for {}",
                    mode.urn()
                )))
            }
        };
        let root = |value: InputOf<F>| {
            WindowedValue::of(
                value,
                scope.element.timestamp,
                scope.window.clone(),
                scope.element.pane,
            )
        };
        Ok(WindowedSplitResult {
            primary: root(primary_value),
            residual: root(residual_value),
        })
    }
}
