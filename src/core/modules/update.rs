//! Per-tick module fan-out.
//!
//! [`ModulesUpdate::update_data`] collects the sensor snapshot, publishes it,
//! then launches every selected module on the collection runtime's blocking
//! pool, one per stagger interval. It returns once the modules are launched;
//! results arrive later through the [`ModuleCallback`].

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::{CollectSensors, ModuleBinding, ModuleData, ModuleName, ModuleSet, Sensors};

/// Receives every module result. Invoked from collection threads.
pub type ModuleCallback = Arc<dyn Fn(ModuleData) + Send + Sync>;

/// Default pause between two module launches.
pub const DEFAULT_STAGGER: Duration = Duration::from_secs(1);

pub struct ModulesUpdate {
    sensors: Mutex<CollectSensors>,
    modules: Vec<ModuleBinding>,
    /// In-flight collection task per module. Launch decisions are made while
    /// holding this lock, so a module never has two tasks running.
    tasks: Mutex<HashMap<ModuleName, JoinHandle<()>>>,
    handle: Handle,
    stagger: Duration,
    callback: ModuleCallback,
}

impl ModulesUpdate {
    pub fn new(set: ModuleSet, handle: Handle, stagger: Duration, callback: ModuleCallback) -> Self {
        let (sensors, modules) = set.into_parts();
        Self {
            sensors: Mutex::new(sensors),
            modules,
            tasks: Mutex::new(HashMap::new()),
            handle,
            stagger,
            callback,
        }
    }

    /// Registered modules, in launch order.
    pub fn module_names(&self) -> Vec<ModuleName> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn is_running(&self, name: ModuleName) -> bool {
        self.tasks
            .lock()
            .get(&name)
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Modules whose last launched task has not completed yet.
    pub fn running(&self) -> Vec<ModuleName> {
        let tasks = self.tasks.lock();
        self.modules
            .iter()
            .map(|m| m.name())
            .filter(|name| tasks.get(name).map(|t| !t.is_finished()).unwrap_or(false))
            .collect()
    }

    /// Run one data tick.
    ///
    /// `modules` restricts the tick to a subset; `None` or an empty subset
    /// selects every registered module. The sensor snapshot is collected and
    /// published either way.
    pub async fn update_data(&self, modules: Option<&[ModuleName]>) {
        info!("Update data, modules={:?}", modules);

        let sensors = self.update_sensors();

        let selected: Vec<&ModuleBinding> = match modules {
            Some(names) if !names.is_empty() => {
                for name in names {
                    if !self.modules.iter().any(|m| m.name() == *name) {
                        warn!("Skip unregistered module: {}", name);
                    }
                }
                self.modules
                    .iter()
                    .filter(|m| names.contains(&m.name()))
                    .collect()
            }
            _ => self.modules.iter().collect(),
        };

        for binding in selected {
            if !self.launch(binding, sensors.clone()) {
                continue;
            }

            // Stagger the updates to avoid overloading the system
            tokio::time::sleep(self.stagger).await;
        }

        info!("Data update tasks started");
    }

    fn update_sensors(&self) -> Option<Arc<Sensors>> {
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut collect = self.sensors.lock();
            (*collect)()
        }));

        match result {
            Ok(Ok(sensors)) => {
                let snapshot = Arc::new(sensors.clone());
                (self.callback)(ModuleData::Sensors(sensors));
                Some(snapshot)
            }
            Ok(Err(e)) => {
                error!("Failed to update module: {}: {}", ModuleName::Sensors, e);
                None
            }
            Err(_) => {
                error!("Module {} panicked during update", ModuleName::Sensors);
                None
            }
        }
    }

    /// Start `binding` unless its previous task is still running.
    fn launch(&self, binding: &ModuleBinding, sensors: Option<Arc<Sensors>>) -> bool {
        let name = binding.name();
        let mut tasks = self.tasks.lock();

        if tasks.get(&name).map(|task| !task.is_finished()).unwrap_or(false) {
            debug!("Skip already running task {}", name);
            return false;
        }

        let module = binding.clone();
        let callback = self.callback.clone();
        let sensors = if module.uses_sensors() { sensors } else { None };

        let task = self
            .handle
            .spawn_blocking(move || update_module(&module, sensors, &callback));
        tasks.insert(name, task);
        true
    }
}

fn update_module(module: &ModuleBinding, sensors: Option<Arc<Sensors>>, callback: &ModuleCallback) {
    let name = module.name();
    let started = Instant::now();
    debug!("Start update module: {}", name);

    let result = catch_unwind(AssertUnwindSafe(|| {
        module.collect(sensors).map(|data| callback(data))
    }));

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Failed to update module: {}: {}", name, e),
        Err(_) => error!("Module {} panicked during update", name),
    }

    info!(
        "Module updated: {} time={:.3}s",
        name,
        started.elapsed().as_secs_f64()
    );
}
