//! The bundle runner: per-URN dispatch and the bundle lifecycle.

use crate::context::{
    FinishBundleCtx, OnTimerCtx, ProcessCtx, RunnerShared, SplitRestrictionCtx, StartBundleCtx,
};
use crate::descriptor::{TransformDescriptor, UrnMode};
use crate::element::{ElementInput, InputOf};
use crate::receivers::{
    BundleFinalizers, ConsumerRegistry, ProgressCallbackRegistry, SplitListener, WindowedReceiver,
};
use crate::sdf::{ObservedTracker, ThreadsafeWatermarkEstimator};
use crate::split::{ElementScope, SplitCoordinator};
use crate::timers::{TimerClient, TimerEndpoint, TimerHandler};
use crate::user_fn::UserFn;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tandem_coders::encode_to_bytes;
use tandem_core::{
    Error, PipelineOptions, Result, Timer, Window, WindowedValue, KV,
};
use tandem_state::{StateAccessor, StateClient};
use tracing::debug;

/// Handles to the external collaborators a runner is constructed over.
pub struct RunnerHandles<F: UserFn> {
    pub options: PipelineOptions,
    pub state_client: Arc<dyn StateClient>,
    pub timer_client: Arc<dyn TimerClient>,
    /// Supplies the instruction id of the bundle being started.
    pub instruction_id: Arc<dyn Fn() -> String + Send + Sync>,
    /// Consumers of user-emitted outputs, by collection id.
    pub user_outputs: Arc<ConsumerRegistry<F::Out>>,
    /// Consumers of restriction artifacts, by collection id.
    pub artifact_outputs: Arc<ConsumerRegistry<InputOf<F>>>,
    pub progress_callbacks: Arc<ProgressCallbackRegistry>,
    pub split_listener: Arc<dyn SplitListener>,
    pub finalizers: Arc<BundleFinalizers>,
}

/// The element key and window currently visible to the state accessor.
/// Written only by the process thread; read through the accessor's key and
/// window suppliers.
pub(crate) struct ScopeCell {
    key: Mutex<Option<Bytes>>,
    window: Mutex<Option<Window>>,
}

impl ScopeCell {
    fn new() -> Self {
        Self {
            key: Mutex::new(None),
            window: Mutex::new(None),
        }
    }

    fn set_key(&self, key: Bytes) {
        *self.key.lock() = Some(key);
    }

    fn set_window(&self, window: Window) {
        *self.window.lock() = Some(window);
    }

    fn clear(&self) {
        *self.key.lock() = None;
        *self.window.lock() = None;
    }

    fn key(&self) -> Option<Bytes> {
        self.key.lock().clone()
    }

    fn window(&self) -> Option<Window> {
        self.window.lock().clone()
    }
}

/// Executes one transform's user function over the elements and timers of a
/// bundle.
///
/// Lifecycle: [`start`] → any number of [`accept`] / [`on_timer`] deliveries
/// → [`finish`], then eventually [`teardown`]. Dispatch is not re-entrant;
/// a distinct control thread may call into the [`SplitCoordinator`] at any
/// moment.
///
/// [`start`]: BundleRunner::start
/// [`accept`]: BundleRunner::accept
/// [`on_timer`]: BundleRunner::on_timer
/// [`finish`]: BundleRunner::finish
/// [`teardown`]: BundleRunner::teardown
pub struct BundleRunner<F: UserFn> {
    shared: RunnerShared<F>,
    state_client: Arc<dyn StateClient>,
    timer_client: Arc<dyn TimerClient>,
    instruction_id: Arc<dyn Fn() -> String + Send + Sync>,
    split_listener: Arc<dyn SplitListener>,
    coordinator: Option<Arc<SplitCoordinator<F>>>,
    scope_cell: Arc<ScopeCell>,
    state: Option<StateAccessor>,
    timer_handlers: HashMap<String, TimerHandler<F::Key>>,
}

impl<F: UserFn> BundleRunner<F> {
    pub fn new(
        user_fn: F,
        descriptor: TransformDescriptor<F>,
        handles: RunnerHandles<F>,
    ) -> Result<Self> {
        let user_fn = Arc::new(user_fn);
        user_fn.setup().map_err(Error::user)?;

        let mut tagged_consumers = HashMap::new();
        for (tag, collection_id) in &descriptor.outputs {
            tagged_consumers.insert(tag.clone(), handles.user_outputs.resolve(collection_id));
        }
        let artifact_consumers: Vec<Arc<dyn WindowedReceiver<InputOf<F>>>> =
            if descriptor.mode.emits_restriction_artifacts() {
                let main_collection = &descriptor.outputs[&descriptor.main_output_tag];
                handles.artifact_outputs.resolve(main_collection)
            } else {
                Vec::new()
            };

        let coordinator = if descriptor.mode.is_splittable_process() {
            let coordinator = Arc::new(SplitCoordinator::new(&descriptor, user_fn.clone()));
            let for_progress = coordinator.clone();
            handles
                .progress_callbacks
                .register(Arc::new(move || for_progress.monitoring_infos()));
            Some(coordinator)
        } else {
            None
        };

        debug!(
            transform_id = %descriptor.transform_id,
            urn = descriptor.mode.urn(),
            "bundle runner constructed"
        );
        Ok(Self {
            shared: RunnerShared {
                options: handles.options,
                descriptor,
                user_fn,
                tagged_consumers,
                artifact_consumers,
                finalizers: handles.finalizers,
            },
            state_client: handles.state_client,
            timer_client: handles.timer_client,
            instruction_id: handles.instruction_id,
            split_listener: handles.split_listener,
            coordinator,
            scope_cell: Arc::new(ScopeCell::new()),
            state: None,
            timer_handlers: HashMap::new(),
        })
    }

    pub fn mode(&self) -> UrnMode {
        self.shared.descriptor.mode
    }

    /// The split coordinator, present for the two splittable process modes.
    /// The host worker hands it to the progress/split RPC layer.
    pub fn split_coordinator(&self) -> Option<Arc<SplitCoordinator<F>>> {
        self.coordinator.clone()
    }

    /// Begin a bundle: build the state accessor, register timer streams, and
    /// run the user's `start_bundle`.
    pub fn start(&mut self) -> Result<()> {
        let instruction_id = (self.instruction_id)();

        let key_cell = self.scope_cell.clone();
        let window_cell = self.scope_cell.clone();
        self.state = Some(StateAccessor::new(
            instruction_id.clone(),
            self.shared.descriptor.transform_id.clone(),
            self.state_client.clone(),
            self.shared.descriptor.side_inputs.clone(),
            self.shared.descriptor.window_codec.clone(),
            Box::new(move || key_cell.key()),
            Box::new(move || window_cell.window()),
        ));

        self.timer_handlers = HashMap::new();
        for (family, spec) in &self.shared.descriptor.timer_families {
            let sink = self
                .timer_client
                .register(TimerEndpoint {
                    instruction_id: instruction_id.clone(),
                    transform_id: self.shared.descriptor.transform_id.clone(),
                    family: family.clone(),
                })
                .map_err(Error::Transport)?;
            self.timer_handlers.insert(
                family.clone(),
                TimerHandler::new(family.clone(), spec.time_domain, spec.codec.clone(), sink),
            );
        }

        debug!(
            transform_id = %self.shared.descriptor.transform_id,
            instruction_id = %instruction_id,
            "bundle started"
        );
        let ctx = StartBundleCtx {
            options: &self.shared.options,
            finalizers: &self.shared.finalizers,
        };
        self.shared.user_fn.start_bundle(&ctx).map_err(Error::user)
    }

    /// Deliver one main-input element, dispatching on the transform's mode.
    pub fn accept(&mut self, element: WindowedValue<InputOf<F>>) -> Result<()> {
        match self.mode() {
            UrnMode::ParDo => self.process_element_plain(element),
            UrnMode::PairWithRestriction => self.process_element_pair(element),
            UrnMode::SplitRestriction => self.process_element_split(element, false),
            UrnMode::SplitAndSizeRestrictions => self.process_element_split(element, true),
            UrnMode::ProcessElements => self.process_element_restriction(element),
            UrnMode::ProcessSizedElementsAndRestrictions => {
                let WindowedValue {
                    value,
                    timestamp,
                    windows,
                    pane,
                } = element;
                match value {
                    // The trailing size is informational; processing is
                    // identical to the unsized form.
                    ElementInput::Sized(sized) => self.process_element_restriction(
                        WindowedValue::new(ElementInput::Paired(sized.key), timestamp, windows, pane),
                    ),
                    other => Err(Self::shape_mismatch(&other, self.mode())),
                }
            }
        }
    }

    /// Deliver one timer firing for `family_id`.
    pub fn on_timer(&mut self, family_id: &str, timer: Timer<F::Key>) -> Result<()> {
        let time_domain = self
            .shared
            .descriptor
            .timer_families
            .get(family_id)
            .ok_or_else(|| Error::usage(format!("unknown timer family {family_id:?}")))?
            .time_domain;
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| Error::usage("timer delivered outside an active bundle"))?;

        if let Some(codec) = &self.shared.descriptor.key_codec {
            self.scope_cell
                .set_key(encode_to_bytes(&**codec, &timer.user_key)?);
        }
        let mut result = Ok(());
        for window in &timer.windows {
            self.scope_cell.set_window(window.clone());
            let ctx = OnTimerCtx {
                shared: &self.shared,
                timer: &timer,
                window,
                time_domain,
                state,
                timers: &self.timer_handlers,
            };
            if let Err(e) = self
                .shared
                .user_fn
                .on_timer(family_id, &timer.dynamic_tag, &ctx)
            {
                result = Err(Error::user(e));
                break;
            }
        }
        self.scope_cell.clear();
        result
    }

    /// End the bundle: drain and close timer streams, run the user's
    /// `finish_bundle`, and finalize state.
    pub fn finish(&mut self) -> Result<()> {
        for handler in self.timer_handlers.values() {
            handler.await_completion()?;
        }
        for handler in self.timer_handlers.values() {
            handler.close()?;
        }

        let ctx = FinishBundleCtx {
            shared: &self.shared,
        };
        self.shared.user_fn.finish_bundle(&ctx).map_err(Error::user)?;

        if let Some(state) = self.state.take() {
            state.finalize_state()?;
        }
        self.timer_handlers.clear();
        debug!(
            transform_id = %self.shared.descriptor.transform_id,
            "bundle finished"
        );
        Ok(())
    }

    pub fn teardown(&self) -> Result<()> {
        self.shared.user_fn.teardown().map_err(Error::user)
    }

    fn require_state(&self) -> Result<&StateAccessor> {
        self.state
            .as_ref()
            .ok_or_else(|| Error::usage("element delivered outside an active bundle"))
    }

    fn shape_mismatch(found: &InputOf<F>, mode: UrnMode) -> Error {
        Error::codec(format!(
            "{} cannot process {}",
            mode.urn(),
            found.kind()
        ))
    }

    fn expect_bare(element: WindowedValue<InputOf<F>>, mode: UrnMode) -> Result<WindowedValue<F::In>> {
        let WindowedValue {
            value,
            timestamp,
            windows,
            pane,
        } = element;
        match value {
            ElementInput::Bare(value) => Ok(WindowedValue::new(value, timestamp, windows, pane)),
            other => Err(Self::shape_mismatch(&other, mode)),
        }
    }

    fn expect_paired(
        element: WindowedValue<InputOf<F>>,
        mode: UrnMode,
    ) -> Result<(WindowedValue<F::In>, F::Restriction, F::WatermarkState)> {
        let WindowedValue {
            value,
            timestamp,
            windows,
            pane,
        } = element;
        match value {
            ElementInput::Paired(pair) => Ok((
                WindowedValue::new(pair.key, timestamp, windows, pane),
                pair.value.key,
                pair.value.value,
            )),
            other => Err(Self::shape_mismatch(&other, mode)),
        }
    }

    /// Publish the element's key, if the transform is keyed, so state access
    /// during the element's callbacks resolves.
    fn publish_element_key(&self, element: &F::In) -> Result<()> {
        if let (Some(key), Some(codec)) = (
            self.shared.user_fn.element_key(element),
            &self.shared.descriptor.key_codec,
        ) {
            self.scope_cell.set_key(encode_to_bytes(&**codec, &key)?);
        }
        Ok(())
    }

    fn process_element_plain(&mut self, element: WindowedValue<InputOf<F>>) -> Result<()> {
        let element = Self::expect_bare(element, self.mode())?;
        let state = self.require_state()?;
        self.publish_element_key(&element.value)?;

        let mut result = Ok(());
        for window in &element.windows {
            self.scope_cell.set_window(window.clone());
            let ctx = ProcessCtx {
                shared: &self.shared,
                element: &element,
                window,
                restriction: None,
                estimator_state: None,
                tracker: None,
                estimator: None,
                state,
                timers: &self.timer_handlers,
            };
            if let Err(e) = self.shared.user_fn.process_element(&ctx) {
                result = Err(Error::user(e));
                break;
            }
        }
        self.scope_cell.clear();
        result
    }

    fn process_element_pair(&mut self, element: WindowedValue<InputOf<F>>) -> Result<()> {
        let element = Self::expect_bare(element, self.mode())?;
        self.require_state()?;
        self.publish_element_key(&element.value)?;

        let mut result = Ok(());
        for window in &element.windows {
            self.scope_cell.set_window(window.clone());
            let step = self
                .shared
                .user_fn
                .initial_restriction(&element.value)
                .and_then(|restriction| {
                    let estimator_state = self
                        .shared
                        .user_fn
                        .initial_watermark_estimator_state(&element.value)?;
                    Ok((restriction, estimator_state))
                })
                .map_err(Error::user)
                .and_then(|(restriction, estimator_state)| {
                    crate::context::deliver(
                        &self.shared.artifact_consumers,
                        WindowedValue::of(
                            ElementInput::Paired(KV::of(
                                element.value.clone(),
                                KV::of(restriction, estimator_state),
                            )),
                            element.timestamp,
                            window.clone(),
                            element.pane,
                        ),
                    )
                });
            if let Err(e) = step {
                result = Err(e);
                break;
            }
        }
        self.scope_cell.clear();
        result
    }

    fn process_element_split(
        &mut self,
        element: WindowedValue<InputOf<F>>,
        sized: bool,
    ) -> Result<()> {
        let (element, restriction, estimator_state) = Self::expect_paired(element, self.mode())?;
        self.require_state()?;
        self.publish_element_key(&element.value)?;

        let mut result = Ok(());
        for window in &element.windows {
            self.scope_cell.set_window(window.clone());
            let ctx = SplitRestrictionCtx {
                shared: &self.shared,
                element: &element,
                window,
                restriction: &restriction,
                estimator_state: &estimator_state,
                sized,
            };
            if let Err(e) = self.shared.user_fn.split_restriction(&ctx) {
                result = Err(Error::user(e));
                break;
            }
        }
        self.scope_cell.clear();
        result
    }

    fn process_element_restriction(&mut self, element: WindowedValue<InputOf<F>>) -> Result<()> {
        let (element, restriction, estimator_state) = Self::expect_paired(element, self.mode())?;
        let coordinator = self
            .coordinator
            .clone()
            .ok_or_else(|| Error::configuration("splittable process mode without a coordinator"))?;
        let state = self.require_state()?;
        self.publish_element_key(&element.value)?;
        let user_fn = self.shared.user_fn.clone();
        let split_listener = self.split_listener.clone();

        let mut result = Ok(());
        for window in &element.windows {
            self.scope_cell.set_window(window.clone());

            // Snapshot the restriction and build fresh tracker and estimator
            // under the split mutex, so the control thread never observes a
            // half-published scope.
            let published = coordinator.publish_with(|| {
                let tracker = Arc::new(ObservedTracker::noop(
                    user_fn.new_tracker(restriction.clone()).map_err(Error::user)?,
                ));
                let estimator = Arc::new(ThreadsafeWatermarkEstimator::new(
                    user_fn
                        .new_watermark_estimator(estimator_state.clone())
                        .map_err(Error::user)?,
                ));
                Ok(ElementScope {
                    element: element.clone(),
                    window: window.clone(),
                    restriction: restriction.clone(),
                    estimator_state: estimator_state.clone(),
                    tracker,
                    estimator,
                })
            });
            let (tracker, estimator) = match published {
                Ok(handles) => handles,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            };

            // The mutex must not be held while user code runs.
            let ctx = ProcessCtx {
                shared: &self.shared,
                element: &element,
                window,
                restriction: Some(&restriction),
                estimator_state: Some(&estimator_state),
                tracker: Some(&tracker),
                estimator: Some(&estimator),
                state,
                timers: &self.timer_handlers,
            };
            let step = match user_fn.process_element(&ctx) {
                Err(e) => Err(Error::user(e)),
                Ok(continuation) if !continuation.should_resume() => {
                    tracker.check_done().map_err(Error::user)
                }
                Ok(continuation) => {
                    // Self-checkpoint the remainder. A `None` here means the
                    // orchestrator already stole it through an external
                    // split, so the restriction must be done.
                    match coordinator.try_split(0.0, continuation.resume_delay()) {
                        Err(e) => Err(e),
                        Ok(None) => tracker.check_done().map_err(Error::user),
                        Ok(Some((primary, residual))) => {
                            split_listener.split(primary, residual);
                            Ok(())
                        }
                    }
                }
            };
            coordinator.clear();
            if let Err(e) = step {
                result = Err(e);
                break;
            }
        }
        self.scope_cell.clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{OnTimerCtx, ProcessCtx, SplitRestrictionCtx};
    use crate::element::ElementShape;
    use crate::receivers::{CollectingReceiver, CollectingSplitListener, RunnerReceiver};
    use crate::sdf::{
        ManualWatermarkEstimator, NoEstimator, NoTracker, OffsetRange, OffsetRangeTracker,
    };
    use crate::timers::InProcessTimerClient;
    use std::sync::mpsc as std_mpsc;
    use tandem_coders::{
        decode_exact, DoubleCodec, IterableCodec, JsonCodec, StringUtf8Codec, TimerCodec,
        VarIntCodec, WindowCodec, WindowedValueCodec,
    };
    use crate::element::ElementInputCodec;
    use tandem_core::{
        Duration, Instant, PaneInfo, ProcessContinuation, TimeDomain,
    };
    use tandem_protocol::urns;
    use tandem_state::InMemoryStateClient;

    type TimerRx = tokio::sync::mpsc::UnboundedReceiver<(TimerEndpoint, Bytes)>;

    fn test_handles<F: UserFn>(
        user_outputs: Arc<ConsumerRegistry<F::Out>>,
        artifact_outputs: Arc<ConsumerRegistry<InputOf<F>>>,
        split_listener: Arc<CollectingSplitListener>,
        progress_callbacks: Arc<ProgressCallbackRegistry>,
    ) -> (RunnerHandles<F>, TimerRx) {
        let (timer_client, timer_rx) = InProcessTimerClient::new();
        (
            RunnerHandles {
                options: PipelineOptions::new(),
                state_client: Arc::new(InMemoryStateClient::new()),
                timer_client: Arc::new(timer_client),
                instruction_id: Arc::new(|| "instr-1".to_string()),
                user_outputs,
                artifact_outputs,
                progress_callbacks,
                split_listener,
                finalizers: Arc::new(BundleFinalizers::new()),
            },
            timer_rx,
        )
    }

    fn no_artifacts<F: UserFn>() -> Arc<ConsumerRegistry<InputOf<F>>> {
        Arc::new(ConsumerRegistry::new())
    }

    // ------------------------------------------------------------------
    // Plain par-do
    // ------------------------------------------------------------------

    struct DoubleFn;

    impl UserFn for DoubleFn {
        type In = i64;
        type Out = i64;
        type Key = ();
        type Restriction = ();
        type WatermarkState = ();
        type Tracker = NoTracker<()>;
        type Estimator = NoEstimator<()>;

        fn process_element(
            &self,
            ctx: &ProcessCtx<'_, Self>,
        ) -> anyhow::Result<ProcessContinuation> {
            let doubled = *ctx.element() * 2;
            ctx.output(doubled)?;
            Ok(ProcessContinuation::stop())
        }
    }

    fn pardo_descriptor() -> TransformDescriptor<DoubleFn> {
        TransformDescriptor::builder("double")
            .mode(UrnMode::ParDo)
            .main_input("pc-in")
            .output("out", "pc-out")
            .main_output_tag("out")
            .element_codec(Arc::new(VarIntCodec))
            .window_codec(Arc::new(WindowCodec))
            .build()
            .unwrap()
    }

    #[test]
    fn test_plain_pardo_doubles_elements() {
        let outputs = Arc::new(ConsumerRegistry::<i64>::new());
        let collector = Arc::new(CollectingReceiver::<i64>::new());
        outputs.register("pc-out", collector.clone());
        let (handles, _timer_rx) = test_handles::<DoubleFn>(
            outputs,
            no_artifacts::<DoubleFn>(),
            Arc::new(CollectingSplitListener::new()),
            Arc::new(ProgressCallbackRegistry::new()),
        );

        let mut runner = BundleRunner::new(DoubleFn, pardo_descriptor(), handles).unwrap();
        runner.start().unwrap();
        runner
            .accept(WindowedValue::of(
                ElementInput::Bare(42),
                Instant::from_millis(10),
                Window::Global,
                PaneInfo::NO_FIRING,
            ))
            .unwrap();
        runner.finish().unwrap();
        runner.teardown().unwrap();

        let emitted = collector.take();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].value, 84);
        assert_eq!(emitted[0].timestamp, Instant::from_millis(10));
        assert_eq!(emitted[0].windows, vec![Window::Global]);
        assert_eq!(emitted[0].pane, PaneInfo::NO_FIRING);
    }

    #[test]
    fn test_element_outside_bundle_is_rejected() {
        let (handles, _timer_rx) = test_handles::<DoubleFn>(
            Arc::new(ConsumerRegistry::new()),
            no_artifacts::<DoubleFn>(),
            Arc::new(CollectingSplitListener::new()),
            Arc::new(ProgressCallbackRegistry::new()),
        );
        let mut runner = BundleRunner::new(DoubleFn, pardo_descriptor(), handles).unwrap();
        let result = runner.accept(WindowedValue::in_global_window(ElementInput::Bare(1)));
        assert!(matches!(result, Err(Error::Usage(_))));
    }

    struct ExplodingFn;

    impl UserFn for ExplodingFn {
        type In = i64;
        type Out = i64;
        type Key = ();
        type Restriction = ();
        type WatermarkState = ();
        type Tracker = NoTracker<()>;
        type Estimator = NoEstimator<()>;

        fn process_element(
            &self,
            _ctx: &ProcessCtx<'_, Self>,
        ) -> anyhow::Result<ProcessContinuation> {
            Err(anyhow::anyhow!("kaboom"))
        }
    }

    #[test]
    fn test_user_errors_come_back_wrapped_and_do_not_wedge_the_runner() {
        let (handles, _timer_rx) = test_handles::<ExplodingFn>(
            Arc::new(ConsumerRegistry::new()),
            no_artifacts::<ExplodingFn>(),
            Arc::new(CollectingSplitListener::new()),
            Arc::new(ProgressCallbackRegistry::new()),
        );
        let descriptor = TransformDescriptor::builder("exploding")
            .mode(UrnMode::ParDo)
            .main_input("pc-in")
            .output("out", "pc-out")
            .main_output_tag("out")
            .element_codec(Arc::new(VarIntCodec))
            .window_codec(Arc::new(WindowCodec))
            .build()
            .unwrap();
        let mut runner = BundleRunner::new(ExplodingFn, descriptor, handles).unwrap();
        runner.start().unwrap();

        let element = WindowedValue::of(
            ElementInput::Bare(1),
            Instant::from_millis(0),
            Window::Global,
            PaneInfo::NO_FIRING,
        );
        match runner.accept(element.clone()) {
            Err(Error::UserCode(source)) => assert_eq!(source.to_string(), "kaboom"),
            other => panic!("expected UserCode, got {other:?}"),
        }
        // The per-element scope was cleared; the next delivery dispatches
        // normally rather than tripping over stale state.
        assert!(matches!(runner.accept(element), Err(Error::UserCode(_))));
        runner.finish().unwrap();
    }

    // ------------------------------------------------------------------
    // Pair-with-restriction and split-restriction modes
    // ------------------------------------------------------------------

    struct PairFn;

    impl UserFn for PairFn {
        type In = String;
        type Out = String;
        type Key = ();
        type Restriction = String;
        type WatermarkState = String;
        type Tracker = NoTracker<String>;
        type Estimator = NoEstimator<String>;

        fn initial_restriction(&self, _element: &String) -> anyhow::Result<String> {
            Ok("R0".to_string())
        }

        fn initial_watermark_estimator_state(&self, _element: &String) -> anyhow::Result<String> {
            Ok("W0".to_string())
        }
    }

    struct SplitSizeFn;

    impl UserFn for SplitSizeFn {
        type In = String;
        type Out = String;
        type Key = ();
        type Restriction = String;
        type WatermarkState = String;
        type Tracker = NoTracker<String>;
        type Estimator = NoEstimator<String>;

        fn split_restriction(&self, ctx: &SplitRestrictionCtx<'_, Self>) -> anyhow::Result<()> {
            ctx.output("Ra".to_string())?;
            ctx.output("Rb".to_string())?;
            Ok(())
        }

        fn restriction_size(
            &self,
            _element: &String,
            restriction: &String,
        ) -> anyhow::Result<f64> {
            Ok(match restriction.as_str() {
                "Ra" => 3.0,
                "Rb" => 4.0,
                _ => 0.0,
            })
        }
    }

    fn string_sdf_descriptor<F>(
        mode: UrnMode,
        input_id: &str,
        output_id: &str,
    ) -> TransformDescriptor<F>
    where
        F: UserFn<In = String, Restriction = String, WatermarkState = String>,
    {
        TransformDescriptor::builder("sdf")
            .mode(mode)
            .main_input(input_id)
            .output("out", output_id)
            .element_codec(Arc::new(StringUtf8Codec))
            .restriction_codec(Arc::new(JsonCodec::<KV<String, String>>::new()))
            .window_codec(Arc::new(WindowCodec))
            .build()
            .unwrap()
    }

    #[test]
    fn test_pair_with_restriction_emits_paired_artifact() {
        let artifacts = Arc::new(ConsumerRegistry::new());
        let collector: Arc<CollectingReceiver<ElementInput<String, String, String>>> =
            Arc::new(CollectingReceiver::new());
        artifacts.register("pc-pairs", collector.clone());
        let (handles, _timer_rx) = test_handles::<PairFn>(
            Arc::new(ConsumerRegistry::new()),
            artifacts,
            Arc::new(CollectingSplitListener::new()),
            Arc::new(ProgressCallbackRegistry::new()),
        );

        let descriptor =
            string_sdf_descriptor::<PairFn>(UrnMode::PairWithRestriction, "pc-in", "pc-pairs");
        let mut runner = BundleRunner::new(PairFn, descriptor, handles).unwrap();
        runner.start().unwrap();
        runner
            .accept(WindowedValue::of(
                ElementInput::Bare("abc".to_string()),
                Instant::from_millis(10),
                Window::Global,
                PaneInfo::NO_FIRING,
            ))
            .unwrap();
        runner.finish().unwrap();

        let emitted = collector.take();
        assert_eq!(emitted.len(), 1);
        assert_eq!(
            emitted[0].value,
            ElementInput::Paired(KV::of(
                "abc".to_string(),
                KV::of("R0".to_string(), "W0".to_string())
            ))
        );
        assert_eq!(emitted[0].timestamp, Instant::from_millis(10));
    }

    #[test]
    fn test_split_and_size_wraps_outputs_with_sizes() {
        let artifacts = Arc::new(ConsumerRegistry::new());
        let collector: Arc<CollectingReceiver<ElementInput<String, String, String>>> =
            Arc::new(CollectingReceiver::new());
        artifacts.register("pc-sized", collector.clone());
        let (handles, _timer_rx) = test_handles::<SplitSizeFn>(
            Arc::new(ConsumerRegistry::new()),
            artifacts,
            Arc::new(CollectingSplitListener::new()),
            Arc::new(ProgressCallbackRegistry::new()),
        );

        let descriptor = string_sdf_descriptor::<SplitSizeFn>(
            UrnMode::SplitAndSizeRestrictions,
            "pc-pairs",
            "pc-sized",
        );
        let mut runner = BundleRunner::new(SplitSizeFn, descriptor, handles).unwrap();
        runner.start().unwrap();
        runner
            .accept(WindowedValue::of(
                ElementInput::Paired(KV::of(
                    "abc".to_string(),
                    KV::of("R0".to_string(), "W0".to_string()),
                )),
                Instant::from_millis(10),
                Window::Global,
                PaneInfo::NO_FIRING,
            ))
            .unwrap();
        runner.finish().unwrap();

        let emitted = collector.take();
        assert_eq!(emitted.len(), 2);
        assert_eq!(
            emitted[0].value,
            ElementInput::Sized(KV::of(
                KV::of(
                    "abc".to_string(),
                    KV::of("Ra".to_string(), "W0".to_string())
                ),
                3.0
            ))
        );
        assert_eq!(
            emitted[1].value,
            ElementInput::Sized(KV::of(
                KV::of(
                    "abc".to_string(),
                    KV::of("Rb".to_string(), "W0".to_string())
                ),
                4.0
            ))
        );
    }

    #[test]
    fn test_runner_receiver_chains_pair_into_split_and_size() {
        // Downstream: split-and-size over the pairs the upstream produces.
        let downstream_artifacts = Arc::new(ConsumerRegistry::new());
        let sized: Arc<CollectingReceiver<ElementInput<String, String, String>>> =
            Arc::new(CollectingReceiver::new());
        downstream_artifacts.register("pc-sized", sized.clone());
        let (downstream_handles, _rx) = test_handles::<SplitSizeFn>(
            Arc::new(ConsumerRegistry::new()),
            downstream_artifacts,
            Arc::new(CollectingSplitListener::new()),
            Arc::new(ProgressCallbackRegistry::new()),
        );
        let mut downstream = BundleRunner::new(
            SplitSizeFn,
            string_sdf_descriptor::<SplitSizeFn>(
                UrnMode::SplitAndSizeRestrictions,
                "pc-pairs",
                "pc-sized",
            ),
            downstream_handles,
        )
        .unwrap();
        downstream.start().unwrap();
        let downstream = Arc::new(Mutex::new(downstream));

        // Upstream: pair-with-restriction wired straight into the downstream
        // runner.
        let upstream_artifacts = Arc::new(ConsumerRegistry::new());
        upstream_artifacts.register("pc-pairs", Arc::new(RunnerReceiver::new(downstream.clone())));
        let (upstream_handles, _rx) = test_handles::<PairFn>(
            Arc::new(ConsumerRegistry::new()),
            upstream_artifacts,
            Arc::new(CollectingSplitListener::new()),
            Arc::new(ProgressCallbackRegistry::new()),
        );
        let mut upstream = BundleRunner::new(
            PairFn,
            string_sdf_descriptor::<PairFn>(UrnMode::PairWithRestriction, "pc-in", "pc-pairs"),
            upstream_handles,
        )
        .unwrap();
        upstream.start().unwrap();
        upstream
            .accept(WindowedValue::of(
                ElementInput::Bare("abc".to_string()),
                Instant::from_millis(10),
                Window::Global,
                PaneInfo::NO_FIRING,
            ))
            .unwrap();
        upstream.finish().unwrap();
        downstream.lock().finish().unwrap();

        let emitted = sized.take();
        assert_eq!(emitted.len(), 2);
        match (&emitted[0].value, &emitted[1].value) {
            (ElementInput::Sized(first), ElementInput::Sized(second)) => {
                assert_eq!(first.key.value.key, "Ra");
                assert_eq!(first.value, 3.0);
                assert_eq!(second.key.value.key, "Rb");
                assert_eq!(second.value, 4.0);
            }
            other => panic!("expected sized artifacts, got {other:?}"),
        }
    }

    // ------------------------------------------------------------------
    // Splittable processing
    // ------------------------------------------------------------------

    struct CountdownSdf;

    impl UserFn for CountdownSdf {
        type In = String;
        type Out = i64;
        type Key = ();
        type Restriction = OffsetRange;
        type WatermarkState = Instant;
        type Tracker = OffsetRangeTracker;
        type Estimator = ManualWatermarkEstimator;

        fn process_element(
            &self,
            ctx: &ProcessCtx<'_, Self>,
        ) -> anyhow::Result<ProcessContinuation> {
            let range = *ctx.restriction()?;
            let mut offset = range.from;
            while ctx.tracker()?.try_claim(offset) {
                ctx.output(offset)?;
                offset += 1;
            }
            Ok(ProcessContinuation::stop())
        }

        fn new_tracker(&self, restriction: OffsetRange) -> anyhow::Result<OffsetRangeTracker> {
            Ok(OffsetRangeTracker::new(restriction))
        }

        fn new_watermark_estimator(
            &self,
            state: Instant,
        ) -> anyhow::Result<ManualWatermarkEstimator> {
            Ok(ManualWatermarkEstimator::new(state))
        }
    }

    fn offset_sdf_descriptor<F>(mode: UrnMode) -> TransformDescriptor<F>
    where
        F: UserFn<In = String, Restriction = OffsetRange, WatermarkState = Instant>,
    {
        TransformDescriptor::builder("sdf-process")
            .mode(mode)
            .main_input("pc-in")
            .output("out", "pc-out")
            .main_output_tag("out")
            .element_codec(Arc::new(StringUtf8Codec))
            .restriction_codec(Arc::new(JsonCodec::<KV<OffsetRange, Instant>>::new()))
            .window_codec(Arc::new(WindowCodec))
            .build()
            .unwrap()
    }

    #[test]
    fn test_process_elements_runs_restriction_to_completion() {
        let outputs = Arc::new(ConsumerRegistry::<i64>::new());
        let collector = Arc::new(CollectingReceiver::<i64>::new());
        outputs.register("pc-out", collector.clone());
        let splits = Arc::new(CollectingSplitListener::new());
        let (handles, _timer_rx) = test_handles::<CountdownSdf>(
            outputs,
            no_artifacts::<CountdownSdf>(),
            splits.clone(),
            Arc::new(ProgressCallbackRegistry::new()),
        );
        let mut runner = BundleRunner::new(
            CountdownSdf,
            offset_sdf_descriptor::<CountdownSdf>(UrnMode::ProcessElements),
            handles,
        )
        .unwrap();
        let coordinator = runner.split_coordinator().unwrap();
        runner.start().unwrap();

        runner
            .accept(WindowedValue::of(
                ElementInput::Paired(KV::of(
                    "k".to_string(),
                    KV::of(OffsetRange::new(0, 3), Instant::from_millis(0)),
                )),
                Instant::from_millis(10),
                Window::Global,
                PaneInfo::NO_FIRING,
            ))
            .unwrap();
        runner.finish().unwrap();

        let emitted: Vec<i64> = collector.take().into_iter().map(|wv| wv.value).collect();
        assert_eq!(emitted, vec![0, 1, 2]);
        assert!(splits.take().is_empty());
        // Between elements there is nothing to split, and asking repeatedly
        // stays null without mutating anything.
        assert!(coordinator.try_split(0.5, Duration::ZERO).unwrap().is_none());
        assert!(coordinator.try_split(0.0, Duration::ZERO).unwrap().is_none());
        assert!(coordinator.progress().is_none());
    }

    struct BlockingSdf {
        entered: Mutex<std_mpsc::Sender<()>>,
        release: Mutex<std_mpsc::Receiver<()>>,
    }

    impl UserFn for BlockingSdf {
        type In = String;
        type Out = String;
        type Key = ();
        type Restriction = OffsetRange;
        type WatermarkState = Instant;
        type Tracker = OffsetRangeTracker;
        type Estimator = ManualWatermarkEstimator;

        fn process_element(
            &self,
            ctx: &ProcessCtx<'_, Self>,
        ) -> anyhow::Result<ProcessContinuation> {
            assert!(ctx.tracker()?.try_claim(0));
            ctx.watermark_estimator()?
                .with_inner(|estimator| estimator.set_watermark(Instant::from_millis(25)));
            self.entered.lock().send(()).unwrap();
            self.release.lock().recv().unwrap();
            Ok(ProcessContinuation::resume().with_resume_delay(Duration::from_millis(500)))
        }

        fn new_tracker(&self, restriction: OffsetRange) -> anyhow::Result<OffsetRangeTracker> {
            Ok(OffsetRangeTracker::new(restriction))
        }

        fn new_watermark_estimator(
            &self,
            state: Instant,
        ) -> anyhow::Result<ManualWatermarkEstimator> {
            Ok(ManualWatermarkEstimator::new(state))
        }
    }

    #[test]
    fn test_external_split_while_process_element_is_in_flight() {
        let splits = Arc::new(CollectingSplitListener::new());
        let progress = Arc::new(ProgressCallbackRegistry::new());
        let (handles, _timer_rx) = test_handles::<BlockingSdf>(
            Arc::new(ConsumerRegistry::new()),
            no_artifacts::<BlockingSdf>(),
            splits.clone(),
            progress.clone(),
        );
        let (entered_tx, entered_rx) = std_mpsc::channel();
        let (release_tx, release_rx) = std_mpsc::channel();
        let mut runner = BundleRunner::new(
            BlockingSdf {
                entered: Mutex::new(entered_tx),
                release: Mutex::new(release_rx),
            },
            offset_sdf_descriptor::<BlockingSdf>(UrnMode::ProcessElements),
            handles,
        )
        .unwrap();
        let coordinator = runner.split_coordinator().unwrap();
        runner.start().unwrap();

        let worker = std::thread::spawn(move || {
            runner
                .accept(WindowedValue::of(
                    ElementInput::Paired(KV::of(
                        "k".to_string(),
                        KV::of(OffsetRange::new(0, 2), Instant::from_millis(0)),
                    )),
                    Instant::from_millis(10),
                    Window::Global,
                    PaneInfo::NO_FIRING,
                ))
                .unwrap();
            runner
        });
        entered_rx.recv().unwrap();

        // Progress is observable mid-flight: offset 0 claimed of [0, 2).
        let infos = progress.collect().unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].urn, urns::WORK_COMPLETED);
        assert_eq!(infos[1].urn, urns::WORK_REMAINING);
        let payload_codec = IterableCodec::new(Arc::new(DoubleCodec));
        assert_eq!(decode_exact(&payload_codec, &infos[0].payload).unwrap(), vec![1.0]);
        assert_eq!(decode_exact(&payload_codec, &infos[1].payload).unwrap(), vec![1.0]);

        let (primary, residual) = coordinator
            .try_split(0.5, Duration::ZERO)
            .unwrap()
            .expect("an element is in flight");
        release_tx.send(()).unwrap();
        let mut runner = worker.join().unwrap();

        // The residual's output watermark is the value frozen before the
        // tracker split.
        let held = residual.output_watermarks.get("out").unwrap();
        assert_eq!(held.seconds, 0);
        assert_eq!(held.nanos, 25_000_000);
        assert_eq!(
            residual.requested_time_delay,
            Some(tandem_protocol::Duration::from_millis(0))
        );

        // Both roots decode through the full main-input codec and carry the
        // parent window and pane.
        let full_codec = WindowedValueCodec::new(
            Arc::new(ElementInputCodec::new(
                ElementShape::Paired,
                Arc::new(StringUtf8Codec),
                Some(Arc::new(JsonCodec::<KV<OffsetRange, Instant>>::new())),
            )),
            Arc::new(WindowCodec),
        );
        assert_eq!(primary.transform_id, "sdf-process");
        assert_eq!(primary.input_id, "pc-in");
        let primary_root = decode_exact(&full_codec, &primary.element).unwrap();
        assert_eq!(primary_root.timestamp, Instant::from_millis(10));
        assert_eq!(primary_root.windows, vec![Window::Global]);
        assert_eq!(
            primary_root.value,
            ElementInput::Paired(KV::of(
                "k".to_string(),
                KV::of(OffsetRange::new(0, 1), Instant::from_millis(0))
            ))
        );
        let residual_root =
            decode_exact(&full_codec, &residual.application.unwrap().element).unwrap();
        assert_eq!(
            residual_root.value,
            ElementInput::Paired(KV::of(
                "k".to_string(),
                KV::of(OffsetRange::new(1, 2), Instant::from_millis(25))
            ))
        );

        // The user asked to resume, but the external split had already stolen
        // the remainder: the self-checkpoint returned null, check_done
        // passed, and no split reached the listener.
        assert!(splits.take().is_empty());
        // All per-element transient state is cleared after accept returns.
        assert!(coordinator.try_split(0.0, Duration::ZERO).unwrap().is_none());
        runner.finish().unwrap();
    }

    // ------------------------------------------------------------------
    // Timers and state
    // ------------------------------------------------------------------

    struct KeyedTimerFn;

    impl UserFn for KeyedTimerFn {
        type In = KV<String, i64>;
        type Out = String;
        type Key = String;
        type Restriction = ();
        type WatermarkState = ();
        type Tracker = NoTracker<()>;
        type Estimator = NoEstimator<()>;

        fn element_key(&self, element: &KV<String, i64>) -> Option<String> {
            Some(element.key.clone())
        }

        fn process_element(
            &self,
            ctx: &ProcessCtx<'_, Self>,
        ) -> anyhow::Result<ProcessContinuation> {
            ctx.timer("cleanup")?
                .offset(Duration::from_millis(20))
                .set_relative()?;
            Ok(ProcessContinuation::stop())
        }

        fn on_timer(
            &self,
            family_id: &str,
            _dynamic_tag: &str,
            ctx: &OnTimerCtx<'_, Self>,
        ) -> anyhow::Result<()> {
            ctx.output(format!(
                "{family_id}:{}@{}",
                ctx.user_key(),
                ctx.timestamp().millis()
            ))?;
            Ok(())
        }
    }

    fn timer_descriptor() -> TransformDescriptor<KeyedTimerFn> {
        TransformDescriptor::builder("timers")
            .mode(UrnMode::ParDo)
            .main_input("pc-in")
            .output("out", "pc-out")
            .main_output_tag("out")
            .element_codec(Arc::new(JsonCodec::<KV<String, i64>>::new()))
            .window_codec(Arc::new(WindowCodec))
            .key_codec(Arc::new(StringUtf8Codec))
            .timer_family(
                "cleanup",
                TimeDomain::EventTime,
                Arc::new(TimerCodec::new(Arc::new(StringUtf8Codec), Arc::new(WindowCodec))),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_event_time_timer_set_and_fired() {
        let outputs = Arc::new(ConsumerRegistry::<String>::new());
        let collector = Arc::new(CollectingReceiver::<String>::new());
        outputs.register("pc-out", collector.clone());
        let (handles, mut timer_rx) = test_handles::<KeyedTimerFn>(
            outputs,
            no_artifacts::<KeyedTimerFn>(),
            Arc::new(CollectingSplitListener::new()),
            Arc::new(ProgressCallbackRegistry::new()),
        );
        let mut runner = BundleRunner::new(KeyedTimerFn, timer_descriptor(), handles).unwrap();
        runner.start().unwrap();

        let window = Window::interval(Instant::from_millis(0), Instant::from_millis(100));
        runner
            .accept(WindowedValue::of(
                ElementInput::Bare(KV::of("k1".to_string(), 7)),
                Instant::from_millis(10),
                window.clone(),
                PaneInfo::NO_FIRING,
            ))
            .unwrap();

        // The committed timer reached the timer service for the right
        // endpoint, scheduled at fire-source + offset with an event-time
        // output hold.
        let (endpoint, bytes) = timer_rx.try_recv().unwrap();
        assert_eq!(endpoint.family, "cleanup");
        assert_eq!(endpoint.instruction_id, "instr-1");
        let timer_codec = TimerCodec::new(Arc::new(StringUtf8Codec), Arc::new(WindowCodec));
        let committed: Timer<String> = decode_exact(&timer_codec, &bytes).unwrap();
        assert_eq!(committed.user_key, "k1");
        assert_eq!(committed.fire_timestamp, Instant::from_millis(30));
        assert_eq!(committed.hold_timestamp, Instant::from_millis(30));
        assert_eq!(committed.windows, vec![window.clone()]);

        // Fire it back across two windows; on_timer runs once per window at
        // the hold timestamp.
        let second_window =
            Window::interval(Instant::from_millis(100), Instant::from_millis(200));
        let mut firing = committed;
        firing.windows = vec![window.clone(), second_window.clone()];
        runner.on_timer("cleanup", firing).unwrap();
        runner.finish().unwrap();

        let emitted = collector.take();
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].value, "cleanup:k1@30");
        assert_eq!(emitted[0].windows, vec![window]);
        assert_eq!(emitted[1].windows, vec![second_window]);
        assert_eq!(emitted[0].timestamp, Instant::from_millis(30));
    }

    struct RunningTotalFn;

    impl UserFn for RunningTotalFn {
        type In = KV<String, i64>;
        type Out = i64;
        type Key = String;
        type Restriction = ();
        type WatermarkState = ();
        type Tracker = NoTracker<()>;
        type Estimator = NoEstimator<()>;

        fn element_key(&self, element: &KV<String, i64>) -> Option<String> {
            Some(element.key.clone())
        }

        fn process_element(
            &self,
            ctx: &ProcessCtx<'_, Self>,
        ) -> anyhow::Result<ProcessContinuation> {
            let counter = ctx.value_state::<i64>("total", Arc::new(VarIntCodec))?;
            let total = counter.read()?.unwrap_or(0) + ctx.element().value;
            counter.write(&total)?;
            ctx.output(total)?;
            Ok(ProcessContinuation::stop())
        }
    }

    #[test]
    fn test_keyed_state_accumulates_within_a_bundle() {
        let outputs = Arc::new(ConsumerRegistry::<i64>::new());
        let collector = Arc::new(CollectingReceiver::<i64>::new());
        outputs.register("pc-out", collector.clone());
        let (handles, _timer_rx) = test_handles::<RunningTotalFn>(
            outputs,
            no_artifacts::<RunningTotalFn>(),
            Arc::new(CollectingSplitListener::new()),
            Arc::new(ProgressCallbackRegistry::new()),
        );
        let descriptor = TransformDescriptor::builder("totals")
            .mode(UrnMode::ParDo)
            .main_input("pc-in")
            .output("out", "pc-out")
            .main_output_tag("out")
            .element_codec(Arc::new(JsonCodec::<KV<String, i64>>::new()))
            .window_codec(Arc::new(WindowCodec))
            .key_codec(Arc::new(StringUtf8Codec))
            .build()
            .unwrap();
        let mut runner = BundleRunner::new(RunningTotalFn, descriptor, handles).unwrap();
        runner.start().unwrap();

        for value in [5, 7] {
            runner
                .accept(WindowedValue::of(
                    ElementInput::Bare(KV::of("k".to_string(), value)),
                    Instant::from_millis(0),
                    Window::Global,
                    PaneInfo::NO_FIRING,
                ))
                .unwrap();
        }
        runner.finish().unwrap();

        let totals: Vec<i64> = collector.take().into_iter().map(|wv| wv.value).collect();
        assert_eq!(totals, vec![5, 12]);
    }

    // ------------------------------------------------------------------
    // Descriptor validation
    // ------------------------------------------------------------------

    #[test]
    fn test_descriptor_rejects_unknown_urn() {
        let result = TransformDescriptor::<DoubleFn>::builder("t")
            .urn("tandem:transform:mystery:v1")
            .main_input("pc-in")
            .output("out", "pc-out")
            .main_output_tag("out")
            .element_codec(Arc::new(VarIntCodec))
            .window_codec(Arc::new(WindowCodec))
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_descriptor_requires_a_main_input() {
        let result = TransformDescriptor::<DoubleFn>::builder("t")
            .mode(UrnMode::ParDo)
            .output("out", "pc-out")
            .main_output_tag("out")
            .element_codec(Arc::new(VarIntCodec))
            .window_codec(Arc::new(WindowCodec))
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_descriptor_rejects_non_multimap_side_inputs() {
        let mut spec = tandem_state::SideInputSpec::multimap(
            Arc::new(WindowCodec),
            tandem_state::identity_window_mapping(),
            tandem_state::decoded_list_view::<String>(Arc::new(StringUtf8Codec)),
        );
        spec.materialization = "tandem:side_input:iterable:v1".to_string();
        let result = TransformDescriptor::<DoubleFn>::builder("t")
            .mode(UrnMode::ParDo)
            .main_input("pc-in")
            .output("out", "pc-out")
            .main_output_tag("out")
            .side_input("lookup", spec)
            .element_codec(Arc::new(VarIntCodec))
            .window_codec(Arc::new(WindowCodec))
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_descriptor_requires_restriction_codec_for_splittable_urns() {
        let result = TransformDescriptor::<PairFn>::builder("t")
            .mode(UrnMode::PairWithRestriction)
            .main_input("pc-in")
            .output("out", "pc-out")
            .element_codec(Arc::new(StringUtf8Codec))
            .window_codec(Arc::new(WindowCodec))
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
