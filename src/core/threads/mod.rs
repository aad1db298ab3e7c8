//! Background worker threads.
//!
//! [`WorkerThread`] is the minimal start/stop wrapper every schedule runs on.
//! Stopping is cooperative: the worker observes a [`StopSignal`] and exits on
//! its own, the owner only raises the flag and waits.

pub mod data;
pub mod media;
pub mod update;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{info, warn};
use parking_lot::Mutex;

use crate::error::{BridgeError, Result};

pub use data::{DataUpdateStep, UpdateRequest};
pub use media::MediaUpdateStep;
pub use update::{IntervalHandle, UpdateStep, UpdateWorker, MIN_INTERVAL};

struct StopInner {
    stopping: AtomicBool,
    /// Serializes "may a tick begin" checks against `stop()`.
    gate: Mutex<()>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

/// Cooperative stop flag shared between a worker and its owner.
///
/// Once raised it is never cleared.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            inner: Arc::new(StopInner {
                stopping: AtomicBool::new(false),
                gate: Mutex::new(()),
                wake_tx,
                wake_rx,
            }),
        }
    }

    /// Raise the flag and wake a worker blocked on [`StopSignal::waker`].
    pub fn stop(&self) {
        {
            let _gate = self.inner.gate.lock();
            self.inner.stopping.store(true, Ordering::SeqCst);
        }
        // Channel holds one slot; a full slot already wakes the worker.
        let _ = self.inner.wake_tx.try_send(());
    }

    pub fn is_stopping(&self) -> bool {
        self.inner.stopping.load(Ordering::SeqCst)
    }

    /// Returns `true` if work may start, checked atomically against `stop()`.
    ///
    /// Runs `begin` while holding the gate, so once `stop()` has returned no
    /// caller can observe `false` for the flag and proceed.
    pub fn begin<F: FnOnce()>(&self, begin: F) -> bool {
        let _gate = self.inner.gate.lock();
        if self.is_stopping() {
            return false;
        }
        begin();
        true
    }

    /// Channel that becomes ready when the signal is raised.
    pub fn waker(&self) -> &Receiver<()> {
        &self.inner.wake_rx
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Named OS thread with a cooperative stop flag.
pub struct WorkerThread {
    name: String,
    stop: StopSignal,
    handle: Option<JoinHandle<()>>,
    /// Disconnects when the thread body returns (or unwinds).
    done_rx: Receiver<()>,
}

impl WorkerThread {
    /// Spawn `body` on a new named thread, handing it the stop signal.
    pub fn spawn<F>(name: &str, body: F) -> Result<Self>
    where
        F: FnOnce(StopSignal) + Send + 'static,
    {
        let stop = StopSignal::new();
        let (done_tx, done_rx) = bounded::<()>(0);

        let thread_stop = stop.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let _done = done_tx;
                body(thread_stop);
            })
            .map_err(|e| BridgeError::runtime(format!("Failed to spawn {}: {}", name, e)))?;

        Ok(Self {
            name: name.to_string(),
            stop,
            handle: Some(handle),
            done_rx,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_alive(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn is_stopping(&self) -> bool {
        self.stop.is_stopping()
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Raise the stop flag, then wait for the thread to exit.
    ///
    /// With `timeout = None` this blocks until the thread is gone. Returns
    /// `true` when the thread has exited.
    pub fn interrupt(&mut self, timeout: Option<Duration>) -> bool {
        info!("Interrupting {}", self.name);
        self.stop.stop();

        let exited = match timeout {
            None => {
                let _ = self.done_rx.recv();
                true
            }
            Some(timeout) => !matches!(
                self.done_rx.recv_timeout(timeout),
                Err(RecvTimeoutError::Timeout)
            ),
        };

        if !exited {
            warn!("{} did not stop within {:?}", self.name, timeout);
            return false;
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("{} panicked while stopping", self.name);
            }
        }
        true
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        self.stop.stop();
    }
}
