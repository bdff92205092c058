//! Output receivers and the registries the host worker wires runners with.

use crate::element::InputOf;
use crate::runner::BundleRunner;
use crate::user_fn::UserFn;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::Arc;
use tandem_core::{Result, WindowedValue};
use tandem_protocol::{BundleApplication, DelayedBundleApplication, MonitoringInfo};

/// A downstream consumer of windowed values.
pub trait WindowedReceiver<T>: Send + Sync {
    fn accept(&self, value: WindowedValue<T>) -> anyhow::Result<()>;
}

/// Adapts a closure into a receiver.
pub struct FnReceiver<T, F> {
    f: F,
    _marker: PhantomData<fn(T)>,
}

impl<T, F> FnReceiver<T, F>
where
    F: Fn(WindowedValue<T>) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<T, F> WindowedReceiver<T> for FnReceiver<T, F>
where
    T: Send + Sync,
    F: Fn(WindowedValue<T>) -> anyhow::Result<()> + Send + Sync,
{
    fn accept(&self, value: WindowedValue<T>) -> anyhow::Result<()> {
        (self.f)(value)
    }
}

/// Buffers everything it receives; the terminal consumer for tests and
/// in-process sinks.
#[derive(Default)]
pub struct CollectingReceiver<T> {
    values: Mutex<Vec<WindowedValue<T>>>,
}

impl<T> CollectingReceiver<T> {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(Vec::new()),
        }
    }

    pub fn take(&self) -> Vec<WindowedValue<T>> {
        std::mem::take(&mut self.values.lock())
    }
}

impl<T: Send + Sync> WindowedReceiver<T> for CollectingReceiver<T> {
    fn accept(&self, value: WindowedValue<T>) -> anyhow::Result<()> {
        self.values.lock().push(value);
        Ok(())
    }
}

/// Per-collection consumer lists, registered by the host worker before a
/// runner is constructed and resolved once at construction.
pub struct ConsumerRegistry<T> {
    consumers: DashMap<String, Vec<Arc<dyn WindowedReceiver<T>>>>,
}

impl<T> Default for ConsumerRegistry<T> {
    fn default() -> Self {
        Self {
            consumers: DashMap::new(),
        }
    }
}

impl<T> ConsumerRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, collection_id: impl Into<String>, consumer: Arc<dyn WindowedReceiver<T>>) {
        self.consumers
            .entry(collection_id.into())
            .or_default()
            .push(consumer);
    }

    pub fn resolve(&self, collection_id: &str) -> Vec<Arc<dyn WindowedReceiver<T>>> {
        self.consumers
            .get(collection_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

/// Receives primary/residual applications produced by a self-split.
pub trait SplitListener: Send + Sync {
    fn split(&self, primary: BundleApplication, residual: DelayedBundleApplication);
}

/// Buffers split results for the host worker to forward.
#[derive(Default)]
pub struct CollectingSplitListener {
    splits: Mutex<Vec<(BundleApplication, DelayedBundleApplication)>>,
}

impl CollectingSplitListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<(BundleApplication, DelayedBundleApplication)> {
        std::mem::take(&mut self.splits.lock())
    }
}

impl SplitListener for CollectingSplitListener {
    fn split(&self, primary: BundleApplication, residual: DelayedBundleApplication) {
        self.splits.lock().push((primary, residual));
    }
}

type ProgressCallback = Arc<dyn Fn() -> Result<Vec<MonitoringInfo>> + Send + Sync>;

/// Callbacks the worker polls when the orchestrator asks for progress.
#[derive(Default)]
pub struct ProgressCallbackRegistry {
    callbacks: Mutex<Vec<ProgressCallback>>,
}

impl ProgressCallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, callback: ProgressCallback) {
        self.callbacks.lock().push(callback);
    }

    /// Collect one reading from every registered callback.
    pub fn collect(&self) -> Result<Vec<MonitoringInfo>> {
        let callbacks = self.callbacks.lock().clone();
        let mut infos = Vec::new();
        for callback in callbacks {
            infos.extend(callback()?);
        }
        Ok(infos)
    }
}

type FinalizerFn = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// Callbacks to run after the bundle's results are committed.
#[derive(Default)]
pub struct BundleFinalizers {
    pending: Mutex<Vec<FinalizerFn>>,
}

impl BundleFinalizers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, callback: FinalizerFn) {
        self.pending.lock().push(callback);
    }

    /// Run and drop every registered callback, surfacing the first failure.
    pub fn finalize(&self) -> anyhow::Result<()> {
        let callbacks = std::mem::take(&mut *self.pending.lock());
        let mut first_error = None;
        for callback in callbacks {
            if let Err(e) = callback() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Adapts a runner into a receiver so one transform's output can feed the
/// next transform's main input in-process.
pub struct RunnerReceiver<F: UserFn> {
    inner: Arc<Mutex<BundleRunner<F>>>,
}

impl<F: UserFn> RunnerReceiver<F> {
    pub fn new(runner: Arc<Mutex<BundleRunner<F>>>) -> Self {
        Self { inner: runner }
    }
}

impl<F: UserFn> Clone for RunnerReceiver<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<F: UserFn> WindowedReceiver<InputOf<F>> for RunnerReceiver<F> {
    fn accept(&self, value: WindowedValue<InputOf<F>>) -> anyhow::Result<()> {
        // Dispatch is not re-entrant; a delivery arriving from inside a
        // delivery is a wiring bug, not something to wait out.
        let mut runner = self
            .inner
            .try_lock()
            .ok_or_else(|| anyhow::anyhow!("re-entrant delivery into a bundle runner"))?;
        runner.accept(value)?;
        Ok(())
    }
}
