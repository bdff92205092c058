//! Timer scheduling: the per-family handler sinks and the `Timer` surface
//! presented to user code.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tandem_coders::{encode_to_bytes, Codec};
use tandem_core::{
    garbage_collection_time, Duration, Error, Instant, PaneInfo, Result, TimeDomain, Timer, Window,
};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Where a timer family's stream lives, from the timer service's point of
/// view.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimerEndpoint {
    pub instruction_id: String,
    pub transform_id: String,
    pub family: String,
}

/// One registered timer stream on the timer service.
pub trait TimerDataSink: Send + Sync {
    /// Hand one encoded timer record to the service.
    fn accept(&self, timer: Bytes) -> anyhow::Result<()>;

    /// Block until every record accepted so far is durably with the service.
    fn await_completion(&self) -> anyhow::Result<()>;

    /// Close the stream; the service will deliver no more firings for it
    /// this bundle.
    fn close(&self) -> anyhow::Result<()>;
}

/// The timer-service client handed to the runner at construction.
pub trait TimerClient: Send + Sync {
    fn register(&self, endpoint: TimerEndpoint) -> anyhow::Result<Arc<dyn TimerDataSink>>;
}

/// Channel-backed timer client for tests and single-process workers.
pub struct InProcessTimerClient {
    tx: mpsc::UnboundedSender<(TimerEndpoint, Bytes)>,
}

impl InProcessTimerClient {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(TimerEndpoint, Bytes)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TimerClient for InProcessTimerClient {
    fn register(&self, endpoint: TimerEndpoint) -> anyhow::Result<Arc<dyn TimerDataSink>> {
        Ok(Arc::new(InProcessTimerSink {
            endpoint,
            tx: self.tx.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

struct InProcessTimerSink {
    endpoint: TimerEndpoint,
    tx: mpsc::UnboundedSender<(TimerEndpoint, Bytes)>,
    closed: AtomicBool,
}

impl TimerDataSink for InProcessTimerSink {
    fn accept(&self, timer: Bytes) -> anyhow::Result<()> {
        if self.closed.load(Ordering::Acquire) {
            anyhow::bail!("timer stream {:?} is closed", self.endpoint.family);
        }
        self.tx
            .send((self.endpoint.clone(), timer))
            .map_err(|_| anyhow::anyhow!("timer service receiver dropped"))
    }

    fn await_completion(&self) -> anyhow::Result<()> {
        // Unbounded sends land synchronously; nothing is in flight.
        Ok(())
    }

    fn close(&self) -> anyhow::Result<()> {
        self.closed.store(true, Ordering::Release);
        debug!(family = %self.endpoint.family, "timer stream closed");
        Ok(())
    }
}

/// Per-family sink accepting scheduled [`Timer`] records. Built at bundle
/// start, immutable afterwards.
pub struct TimerHandler<K> {
    family: String,
    time_domain: TimeDomain,
    codec: Arc<dyn Codec<Timer<K>>>,
    sink: Arc<dyn TimerDataSink>,
}

impl<K: Clone + Send + Sync + 'static> TimerHandler<K> {
    pub(crate) fn new(
        family: String,
        time_domain: TimeDomain,
        codec: Arc<dyn Codec<Timer<K>>>,
        sink: Arc<dyn TimerDataSink>,
    ) -> Self {
        Self {
            family,
            time_domain,
            codec,
            sink,
        }
    }

    pub fn time_domain(&self) -> TimeDomain {
        self.time_domain
    }

    pub fn accept(&self, timer: &Timer<K>) -> Result<()> {
        let bytes = encode_to_bytes(&*self.codec, timer)?;
        self.sink.accept(bytes).map_err(Error::Transport)?;
        trace!(family = %self.family, fire = ?timer.fire_timestamp, "timer scheduled");
        Ok(())
    }

    pub fn await_completion(&self) -> Result<()> {
        self.sink.await_completion().map_err(Error::Transport)
    }

    pub fn close(&self) -> Result<()> {
        self.sink.close().map_err(Error::Transport)
    }
}

/// The fluent timer surface user code configures and commits.
///
/// Construction captures the firing context (key, window, hold timestamp,
/// fire-source timestamp); `offset`, `align`, and `with_output_timestamp`
/// accumulate configuration, and `set` or `set_relative` compute the
/// scheduled time and write the record into the family's handler.
pub struct UserFnTimer<'a, K: Clone> {
    family: String,
    user_key: K,
    dynamic_tag: String,
    window: Window,
    hold_timestamp: Instant,
    fire_source: Instant,
    pane: PaneInfo,
    time_domain: TimeDomain,
    allowed_lateness: Duration,
    handlers: &'a HashMap<String, TimerHandler<K>>,
    output_timestamp: Option<Instant>,
    period: Duration,
    offset: Duration,
}

impl<'a, K: Clone + Send + Sync + 'static> UserFnTimer<'a, K> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        family: String,
        user_key: K,
        dynamic_tag: String,
        window: Window,
        hold_timestamp: Instant,
        fire_source: Instant,
        pane: PaneInfo,
        time_domain: TimeDomain,
        allowed_lateness: Duration,
        handlers: &'a HashMap<String, TimerHandler<K>>,
    ) -> Self {
        Self {
            family,
            user_key,
            dynamic_tag,
            window,
            hold_timestamp,
            fire_source,
            pane,
            time_domain,
            allowed_lateness,
            handlers,
            output_timestamp: None,
            period: Duration::ZERO,
            offset: Duration::ZERO,
        }
    }

    /// Delay relative firing by `offset`.
    pub fn offset(mut self, offset: Duration) -> Self {
        self.offset = offset;
        self
    }

    /// Align relative firing to multiples of `period`.
    pub fn align(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Hold the output watermark at `output_timestamp` instead of the
    /// default derived at commit.
    pub fn with_output_timestamp(mut self, output_timestamp: Instant) -> Self {
        self.output_timestamp = Some(output_timestamp);
        self
    }

    /// Schedule at an absolute event time. Only event-time families may use
    /// absolute times, and the time must not be past the window's GC time.
    pub fn set(self, absolute_time: Instant) -> Result<()> {
        if self.time_domain != TimeDomain::EventTime {
            return Err(Error::usage(
                "absolute timers are only supported in the event-time domain; use set_relative()",
            ));
        }
        let expiry = garbage_collection_time(&self.window, self.allowed_lateness);
        if absolute_time.is_after(expiry) {
            return Err(Error::usage(format!(
                "cannot set event-time timer for {absolute_time:?} past the expiration {expiry:?} \
                 of window {:?}",
                self.window
            )));
        }
        self.commit(absolute_time)
    }

    /// Schedule relative to the firing source: `fire_source + offset`, or the
    /// next `period` boundary when aligned. Event-time targets clamp to the
    /// window's GC time.
    pub fn set_relative(self) -> Result<()> {
        let target = if self.period == Duration::ZERO {
            self.fire_source + self.offset
        } else {
            let since_boundary = (self.fire_source + self.offset)
                .millis()
                .rem_euclid(self.period.millis());
            if since_boundary == 0 {
                self.fire_source
            } else {
                self.fire_source + self.period - Duration::from_millis(since_boundary)
            }
        };
        let target = self.clamp_to_gc(target);
        self.commit(target)
    }

    fn clamp_to_gc(&self, target: Instant) -> Instant {
        if self.time_domain != TimeDomain::EventTime {
            return target;
        }
        let expiry = garbage_collection_time(&self.window, self.allowed_lateness);
        if target.is_after(expiry) {
            expiry
        } else {
            target
        }
    }

    fn commit(self, scheduled: Instant) -> Result<()> {
        if let Some(output) = self.output_timestamp {
            if output.is_before(self.hold_timestamp) {
                return Err(Error::usage(format!(
                    "output timestamp {output:?} must not precede the input element timestamp or \
                     firing timer hold {:?}",
                    self.hold_timestamp
                )));
            }
        }
        let output_timestamp = self.output_timestamp.unwrap_or(match self.time_domain {
            TimeDomain::EventTime => scheduled,
            _ => self.hold_timestamp,
        });

        let expiry = garbage_collection_time(&self.window, self.allowed_lateness);
        if self.time_domain == TimeDomain::EventTime {
            if output_timestamp.is_after(scheduled) {
                return Err(Error::usage(format!(
                    "event-time timer output timestamp {output_timestamp:?} is after its firing \
                     timestamp {scheduled:?}"
                )));
            }
            if scheduled.is_after(expiry) {
                return Err(Error::usage(format!(
                    "event-time timer firing timestamp {scheduled:?} is after the expiration \
                     {expiry:?} of window {:?}",
                    self.window
                )));
            }
        } else if output_timestamp.is_after(expiry) {
            return Err(Error::usage(format!(
                "processing-time timer output timestamp {output_timestamp:?} is after the \
                 expiration {expiry:?} of window {:?}",
                self.window
            )));
        }

        let handler = self.handlers.get(&self.family).ok_or_else(|| {
            Error::usage(format!("unknown timer family {:?}", self.family))
        })?;
        handler.accept(&Timer {
            user_key: self.user_key.clone(),
            dynamic_tag: self.dynamic_tag.clone(),
            windows: vec![self.window.clone()],
            fire_timestamp: scheduled,
            hold_timestamp: output_timestamp,
            pane: self.pane,
        })
    }
}
