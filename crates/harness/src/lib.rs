//! Bundle-scoped user-function runner.
//!
//! The host worker constructs a [`BundleRunner`] from a validated
//! [`TransformDescriptor`] plus handles to its external collaborators
//! (data-out consumers, state service, timer service, progress callbacks,
//! split listener). The runner drives the per-URN execution mode over the
//! elements and timers of one bundle, and for splittable transforms exposes
//! a [`SplitCoordinator`] a control thread can ask for progress and
//! mid-bundle splits.

mod context;
mod descriptor;
mod element;
mod receivers;
mod runner;
pub mod sdf;
mod split;
mod timers;
mod user_fn;

pub use context::{
    FinishBundleCtx, OnTimerCtx, ProcessCtx, SplitRestrictionCtx, StartBundleCtx,
};
pub use descriptor::{
    TimerFamilySpec, TransformDescriptor, TransformDescriptorBuilder, UrnMode,
};
pub use element::{ElementInput, ElementInputCodec, ElementShape, InputOf};
pub use receivers::{
    BundleFinalizers, CollectingReceiver, CollectingSplitListener, ConsumerRegistry, FnReceiver,
    ProgressCallbackRegistry, RunnerReceiver, SplitListener, WindowedReceiver,
};
pub use runner::{BundleRunner, RunnerHandles};
pub use split::SplitCoordinator;
pub use timers::{
    InProcessTimerClient, TimerClient, TimerDataSink, TimerEndpoint, TimerHandler, UserFnTimer,
};
pub use user_fn::UserFn;
