//! Top-level orchestrator.
//!
//! [`DataUpdate`] owns the shared [`ModulesData`], the collection runtime and
//! the two schedules:
//!
//! * `data-update` fans out to every registered module,
//! * `media-update` polls the media session and adapts its own interval.
//!
//! Every result goes through one callback: the matching State field is
//! overwritten, then the user's notification is spawned on the collection
//! runtime with the field name.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{never, unbounded, Receiver, Sender};
use futures_util::future::BoxFuture;
use log::{debug, info};
use parking_lot::Mutex;
use tokio::runtime::Runtime;

use crate::core::config::Settings;
use crate::core::modules::{MediaSession, ModuleCallback, ModuleName, ModuleSet, ModulesUpdate};
use crate::core::state::ModulesData;
use crate::core::threads::media::SharedMediaSession;
use crate::core::threads::{DataUpdateStep, IntervalHandle, MediaUpdateStep, UpdateRequest, UpdateWorker};
use crate::error::{BridgeError, Result};

/// Called once per State field write, with the name of the field.
pub type Notify = Arc<dyn Fn(ModuleName) -> BoxFuture<'static, ()> + Send + Sync>;

const DATA_THREAD: &str = "data-update";
const MEDIA_THREAD: &str = "media-update";

pub struct DataUpdate {
    data: Arc<ModulesData>,
    runtime: Option<Runtime>,
    modules: Arc<ModulesUpdate>,
    callback: ModuleCallback,

    data_interval: IntervalHandle,
    media_interval: IntervalHandle,
    media_idle_interval: Duration,
    media_playing_interval: Duration,

    /// Forced data requests. Outlives any single data worker.
    requests_tx: Sender<UpdateRequest>,
    requests_rx: Receiver<UpdateRequest>,

    media_session: SharedMediaSession,

    data_worker: Mutex<Option<UpdateWorker>>,
    media_worker: Mutex<Option<UpdateWorker>>,
}

impl DataUpdate {
    /// Build the orchestrator. Nothing runs until the first
    /// [`request_update`](Self::request_update) or
    /// [`request_media_update`](Self::request_media_update).
    pub fn new<F, Fut>(settings: &Settings, modules: ModuleSet, notify: F) -> Result<Self>
    where
        F: Fn(ModuleName) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        settings.validate()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(settings.worker_threads.max(1))
            .enable_time()
            .thread_name("collection-worker")
            .build()
            .map_err(|e| BridgeError::runtime(format!("Failed to build collection runtime: {}", e)))?;

        let notify: Notify = Arc::new(move |name| -> BoxFuture<'static, ()> { Box::pin(notify(name)) });
        let data = Arc::new(ModulesData::new());

        let callback: ModuleCallback = {
            let data = data.clone();
            let handle = runtime.handle().clone();
            Arc::new(move |payload| {
                let name = data.apply(payload);
                debug!("Updated state field: {}", name);
                handle.spawn(notify(name));
            })
        };

        let modules = Arc::new(ModulesUpdate::new(
            modules,
            runtime.handle().clone(),
            settings.module_stagger(),
            callback.clone(),
        ));

        let (requests_tx, requests_rx) = unbounded();

        Ok(Self {
            data,
            runtime: Some(runtime),
            modules,
            callback,
            data_interval: IntervalHandle::new(settings.data_interval()),
            media_interval: IntervalHandle::new(settings.media_idle_interval()),
            media_idle_interval: settings.media_idle_interval(),
            media_playing_interval: settings.media_playing_interval(),
            requests_tx,
            requests_rx,
            media_session: Arc::new(Mutex::new(None)),
            data_worker: Mutex::new(None),
            media_worker: Mutex::new(None),
        })
    }

    /// Install the media session backend queried by the media schedule.
    pub fn with_media_session(self, session: Box<dyn MediaSession>) -> Self {
        *self.media_session.lock() = Some(session);
        self
    }

    pub fn data(&self) -> Arc<ModulesData> {
        self.data.clone()
    }

    /// Registered modules, in launch order.
    pub fn module_names(&self) -> Vec<ModuleName> {
        self.modules.module_names()
    }

    /// Modules with a collection task still in flight.
    pub fn running_modules(&self) -> Vec<ModuleName> {
        self.modules.running()
    }

    /// Run a data update.
    ///
    /// Starts the data schedule if it is not running (its first tick updates
    /// every module), otherwise queues a forced tick. `modules` restricts the
    /// forced tick to a subset.
    pub fn request_update(&self, modules: Option<Vec<ModuleName>>) -> Result<()> {
        let mut worker = self.data_worker.lock();

        if !worker.as_ref().map(is_running).unwrap_or(false) {
            info!("Starting data update worker");
            let step = DataUpdateStep::new(self.modules.clone());
            *worker = Some(UpdateWorker::spawn(
                DATA_THREAD,
                step,
                self.data_interval.clone(),
                self.requests_rx.clone(),
            )?);

            if let Some(modules) = modules {
                self.enqueue(UpdateRequest::only(modules))?;
            }
            return Ok(());
        }

        let request = match modules {
            Some(modules) => UpdateRequest::only(modules),
            None => UpdateRequest::all(),
        };
        self.enqueue(request)
    }

    fn enqueue(&self, request: UpdateRequest) -> Result<()> {
        debug!("Queue forced update: {:?}", request);
        self.requests_tx
            .send(request)
            .map_err(|e| BridgeError::runtime(format!("Failed to queue update request: {}", e)))
    }

    /// Start the media schedule. Does nothing if it is already running.
    pub fn request_media_update(&self) -> Result<()> {
        let mut worker = self.media_worker.lock();
        if worker.as_ref().map(is_running).unwrap_or(false) {
            return Ok(());
        }

        info!("Starting media update worker");
        let step = MediaUpdateStep::new(
            self.media_session.clone(),
            self.callback.clone(),
            self.media_interval.clone(),
            self.media_idle_interval,
            self.media_playing_interval,
        );
        *worker = Some(UpdateWorker::spawn(
            MEDIA_THREAD,
            step,
            self.media_interval.clone(),
            never(),
        )?);
        Ok(())
    }

    pub fn set_data_interval(&self, interval: Duration) {
        self.data_interval.set(interval);
    }

    pub fn set_media_interval(&self, interval: Duration) {
        self.media_interval.set(interval);
    }

    pub fn data_interval(&self) -> Duration {
        self.data_interval.get()
    }

    pub fn media_interval(&self) -> Duration {
        self.media_interval.get()
    }

    pub fn is_data_running(&self) -> bool {
        self.data_worker.lock().as_ref().map(is_running).unwrap_or(false)
    }

    pub fn is_media_running(&self) -> bool {
        self.media_worker.lock().as_ref().map(is_running).unwrap_or(false)
    }

    /// Stop the data schedule. Collection tasks already launched keep running.
    ///
    /// Returns `false` if the thread did not exit within `timeout`.
    pub fn interrupt_data(&self, timeout: Option<Duration>) -> bool {
        interrupt(&self.data_worker, timeout)
    }

    pub fn interrupt_media(&self, timeout: Option<Duration>) -> bool {
        interrupt(&self.media_worker, timeout)
    }

    /// Stop both schedules and give in-flight collection up to `timeout` to
    /// finish. Whatever is still running afterwards is abandoned.
    pub fn shutdown(mut self, timeout: Duration) {
        info!("Shutting down data update");
        self.interrupt_data(Some(timeout));
        self.interrupt_media(Some(timeout));

        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(timeout);
        }
        info!("Data update stopped");
    }
}

impl Drop for DataUpdate {
    fn drop(&mut self) {
        for worker in [&self.data_worker, &self.media_worker] {
            if let Some(worker) = worker.lock().as_ref() {
                worker.stop();
            }
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn is_running(worker: &UpdateWorker) -> bool {
    worker.is_alive() && !worker.is_stopping()
}

fn interrupt(worker: &Mutex<Option<UpdateWorker>>, timeout: Option<Duration>) -> bool {
    match worker.lock().as_mut() {
        Some(worker) => worker.interrupt(timeout),
        None => true,
    }
}
