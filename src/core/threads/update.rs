//! Interval-or-signal driven update loop.
//!
//! An [`UpdateWorker`] owns one OS thread that repeatedly waits for the next
//! scheduled run and then executes an [`UpdateStep`]. The wait ends early when
//! a forced request arrives on the request channel, or when the worker is
//! interrupted.
//!
//! * Natural tick: `next_run` moves to `now + interval` before the step runs.
//! * Forced tick: the step runs with the request's parameters and `next_run`
//!   is left alone, so the regular cadence is preserved.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{never, select, Receiver};
use log::{debug, error, info, warn};

use super::{StopSignal, WorkerThread};
use crate::error::Result;

/// Shared, runtime-adjustable update interval.
///
/// A new value takes effect the next time `next_run` is computed. Values
/// below [`MIN_INTERVAL`] are raised to it.
#[derive(Clone)]
pub struct IntervalHandle {
    millis: Arc<AtomicU64>,
}

/// Shortest interval a schedule will run at.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

fn clamped_millis(interval: Duration) -> u64 {
    interval.max(MIN_INTERVAL).as_millis() as u64
}

impl IntervalHandle {
    pub fn new(interval: Duration) -> Self {
        if interval < MIN_INTERVAL {
            warn!("Interval {:?} is below {:?}, using the minimum", interval, MIN_INTERVAL);
        }
        Self {
            millis: Arc::new(AtomicU64::new(clamped_millis(interval))),
        }
    }

    pub fn get(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }

    /// Update the interval if it has changed.
    pub fn set(&self, interval: Duration) {
        let millis = clamped_millis(interval);
        if self.millis.swap(millis, Ordering::SeqCst) != millis {
            info!("Updated update interval to: {:?}", Duration::from_millis(millis));
        }
    }
}

impl fmt::Debug for IntervalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntervalHandle").field(&self.get()).finish()
    }
}

/// The work a schedule performs on each tick.
///
/// `update` is driven to completion on a current-thread runtime created for
/// that tick, so it may `.await` freely. Forced ticks receive the request's
/// parameters, natural ticks receive `None`.
#[allow(async_fn_in_trait)]
pub trait UpdateStep: Send + 'static {
    type Params: fmt::Debug + Send + 'static;

    async fn update(&mut self, params: Option<Self::Params>) -> Result<()>;
}

/// A running schedule.
pub struct UpdateWorker {
    thread: WorkerThread,
    interval: IntervalHandle,
}

impl UpdateWorker {
    /// Start the update loop for `step` on a new thread named `name`.
    ///
    /// The first tick runs immediately. Forced requests are read from
    /// `requests`; if all its senders are dropped the worker keeps running on
    /// its interval alone.
    pub fn spawn<S: UpdateStep>(
        name: &str,
        step: S,
        interval: IntervalHandle,
        requests: Receiver<S::Params>,
    ) -> Result<Self> {
        let loop_name = name.to_string();
        let loop_interval = interval.clone();
        let thread = WorkerThread::spawn(name, move |stop| {
            run_loop(&loop_name, step, &loop_interval, requests, &stop)
        })?;

        Ok(Self { thread, interval })
    }

    pub fn name(&self) -> &str {
        self.thread.name()
    }

    pub fn is_alive(&self) -> bool {
        self.thread.is_alive()
    }

    pub fn is_stopping(&self) -> bool {
        self.thread.is_stopping()
    }

    /// Raise the stop flag without waiting for the thread.
    pub fn stop(&self) {
        self.thread.stop_signal().stop();
    }

    pub fn interval(&self) -> &IntervalHandle {
        &self.interval
    }

    /// Stop the loop. No new tick begins once this returns; a tick already in
    /// progress may still finish.
    pub fn interrupt(&mut self, timeout: Option<Duration>) -> bool {
        self.thread.interrupt(timeout)
    }
}

fn run_loop<S: UpdateStep>(
    name: &str,
    mut step: S,
    interval: &IntervalHandle,
    mut requests: Receiver<S::Params>,
    stop: &StopSignal,
) {
    let mut next_run = Instant::now();

    while !stop.is_stopping() {
        let mut forced: Option<S::Params> = None;
        let mut requests_closed = false;

        // Pending requests are polled even when the next run is already due
        let sleep = next_run.saturating_duration_since(Instant::now());
        if !sleep.is_zero() {
            info!("{}: waiting for next update in {:.2} seconds", name, sleep.as_secs_f64());
        }

        select! {
            recv(requests) -> request => match request {
                Ok(params) => {
                    debug!("{}: update triggered by force update, with params: {:?}", name, params);
                    forced = Some(params);
                }
                Err(_) => requests_closed = true,
            },
            recv(stop.waker()) -> _ => {}
            default(sleep) => debug!("{}: update triggered by time interval", name),
        }

        if requests_closed {
            debug!("{}: request channel closed, continuing on interval only", name);
            requests = never();
            continue;
        }

        let natural = forced.is_none();
        let may_run = stop.begin(|| {
            if natural {
                next_run = Instant::now() + interval.get();
            }
        });
        if !may_run {
            break;
        }
        if natural {
            info!("{}: scheduled next update for: {}", name, wall_clock(next_run));
        }

        run_step(name, &mut step, forced);

        if stop.is_stopping() {
            break;
        }

        info!("{}: update finished, next run will be at: {}", name, wall_clock(next_run));
    }

    info!("{} stopped", name);
}

/// Run one tick on a fresh current-thread runtime, containing any failure.
fn run_step<S: UpdateStep>(name: &str, step: &mut S, params: Option<S::Params>) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("{}: failed to create tick runtime: {}", name, e);
            return;
        }
    };

    match catch_unwind(AssertUnwindSafe(|| runtime.block_on(step.update(params)))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("{}: update failed: {}", name, e),
        Err(_) => error!("{}: update panicked", name),
    }
}

fn wall_clock(at: Instant) -> chrono::DateTime<chrono::Local> {
    let remaining = at.saturating_duration_since(Instant::now());
    chrono::Local::now() + chrono::Duration::from_std(remaining).unwrap_or_default()
}
