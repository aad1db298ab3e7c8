//! Telemetry modules.
//!
//! A module is an independently schedulable unit of collection. Each one
//! implements [`ModuleUpdate`]; modules that read the per-tick sensor snapshot
//! also implement [`SensorsConsumer`] and are registered with
//! [`ModuleBinding::with_sensors`].

mod battery;
mod cpu;
mod disks;
mod displays;
mod gpus;
pub mod media;
mod memory;
mod networks;
mod processes;
mod sensors;
mod system;
pub mod types;
pub mod update;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

pub use battery::BatteryUpdate;
pub use cpu::CpuUpdate;
pub use disks::DisksUpdate;
pub use displays::DisplaysUpdate;
pub use gpus::{GpuProvider, GpusUpdate};
pub use media::MediaSession;
pub use memory::MemoryUpdate;
pub use networks::NetworksUpdate;
pub use processes::ProcessesUpdate;
pub use sensors::SensorsUpdate;
pub use system::SystemUpdate;
pub use types::*;
pub use update::{ModuleCallback, ModulesUpdate};

/// Name of a module, and of the State field its results are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleName {
    Battery,
    Cpu,
    Disks,
    Displays,
    Gpus,
    Media,
    Memory,
    Networks,
    Processes,
    Sensors,
    System,
}

impl ModuleName {
    pub const ALL: [ModuleName; 11] = [
        ModuleName::Battery,
        ModuleName::Cpu,
        ModuleName::Disks,
        ModuleName::Displays,
        ModuleName::Gpus,
        ModuleName::Media,
        ModuleName::Memory,
        ModuleName::Networks,
        ModuleName::Processes,
        ModuleName::Sensors,
        ModuleName::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleName::Battery => "battery",
            ModuleName::Cpu => "cpu",
            ModuleName::Disks => "disks",
            ModuleName::Displays => "displays",
            ModuleName::Gpus => "gpus",
            ModuleName::Media => "media",
            ModuleName::Memory => "memory",
            ModuleName::Networks => "networks",
            ModuleName::Processes => "processes",
            ModuleName::Sensors => "sensors",
            ModuleName::System => "system",
        }
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleName {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        ModuleName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == wanted)
            .ok_or_else(|| BridgeError::unknown_module(s))
    }
}

/// A module's result. The variant decides which State field it is written to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "module", content = "data", rename_all = "lowercase")]
pub enum ModuleData {
    Battery(Battery),
    Cpu(Cpu),
    Disks(Disks),
    Displays(Vec<Display>),
    Gpus(Vec<Gpu>),
    Media(Media),
    Memory(Memory),
    Networks(Networks),
    Processes(Vec<Process>),
    Sensors(Sensors),
    System(System),
}

impl ModuleData {
    pub fn name(&self) -> ModuleName {
        match self {
            ModuleData::Battery(_) => ModuleName::Battery,
            ModuleData::Cpu(_) => ModuleName::Cpu,
            ModuleData::Disks(_) => ModuleName::Disks,
            ModuleData::Displays(_) => ModuleName::Displays,
            ModuleData::Gpus(_) => ModuleName::Gpus,
            ModuleData::Media(_) => ModuleName::Media,
            ModuleData::Memory(_) => ModuleName::Memory,
            ModuleData::Networks(_) => ModuleName::Networks,
            ModuleData::Processes(_) => ModuleName::Processes,
            ModuleData::Sensors(_) => ModuleName::Sensors,
            ModuleData::System(_) => ModuleName::System,
        }
    }
}

impl From<Battery> for ModuleData {
    fn from(value: Battery) -> Self {
        ModuleData::Battery(value)
    }
}

impl From<Cpu> for ModuleData {
    fn from(value: Cpu) -> Self {
        ModuleData::Cpu(value)
    }
}

impl From<Disks> for ModuleData {
    fn from(value: Disks) -> Self {
        ModuleData::Disks(value)
    }
}

impl From<Vec<Display>> for ModuleData {
    fn from(value: Vec<Display>) -> Self {
        ModuleData::Displays(value)
    }
}

impl From<Vec<Gpu>> for ModuleData {
    fn from(value: Vec<Gpu>) -> Self {
        ModuleData::Gpus(value)
    }
}

impl From<Media> for ModuleData {
    fn from(value: Media) -> Self {
        ModuleData::Media(value)
    }
}

impl From<Memory> for ModuleData {
    fn from(value: Memory) -> Self {
        ModuleData::Memory(value)
    }
}

impl From<Networks> for ModuleData {
    fn from(value: Networks) -> Self {
        ModuleData::Networks(value)
    }
}

impl From<Vec<Process>> for ModuleData {
    fn from(value: Vec<Process>) -> Self {
        ModuleData::Processes(value)
    }
}

impl From<Sensors> for ModuleData {
    fn from(value: Sensors) -> Self {
        ModuleData::Sensors(value)
    }
}

impl From<System> for ModuleData {
    fn from(value: System) -> Self {
        ModuleData::System(value)
    }
}

/// Collection contract every module implements.
pub trait ModuleUpdate: Send + 'static {
    /// The module (and State field) this collector feeds.
    const NAME: ModuleName;

    type Output: Into<ModuleData>;

    /// Collect a fresh result. Called from a blocking worker thread.
    fn update_all_data(&mut self) -> Result<Self::Output>;
}

/// Implemented by modules that consume the per-tick sensor snapshot.
pub trait SensorsConsumer {
    fn set_sensors(&mut self, sensors: Option<Arc<Sensors>>);
}

type Collect = Box<dyn FnMut(Option<Arc<Sensors>>) -> Result<ModuleData> + Send>;

/// A registered module: its name, its collector, and whether it is handed
/// the sensor snapshot before each run.
#[derive(Clone)]
pub struct ModuleBinding {
    name: ModuleName,
    uses_sensors: bool,
    collect: Arc<Mutex<Collect>>,
}

impl ModuleBinding {
    pub fn new<M: ModuleUpdate>(mut module: M) -> Self {
        let collect: Collect = Box::new(move |_sensors| module.update_all_data().map(Into::<ModuleData>::into));
        Self {
            name: M::NAME,
            uses_sensors: false,
            collect: Arc::new(Mutex::new(collect)),
        }
    }

    pub fn with_sensors<M: ModuleUpdate + SensorsConsumer>(mut module: M) -> Self {
        let collect: Collect = Box::new(move |sensors| {
            module.set_sensors(sensors);
            module.update_all_data().map(Into::<ModuleData>::into)
        });
        Self {
            name: M::NAME,
            uses_sensors: true,
            collect: Arc::new(Mutex::new(collect)),
        }
    }

    pub fn name(&self) -> ModuleName {
        self.name
    }

    pub fn uses_sensors(&self) -> bool {
        self.uses_sensors
    }

    /// Run the collector. `sensors` is only forwarded to sensor consumers.
    pub(crate) fn collect(&self, sensors: Option<Arc<Sensors>>) -> Result<ModuleData> {
        let mut collect = self.collect.lock();
        (*collect)(sensors)
    }
}

impl fmt::Debug for ModuleBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleBinding")
            .field("name", &self.name)
            .field("uses_sensors", &self.uses_sensors)
            .finish()
    }
}

type CollectSensors = Box<dyn FnMut() -> Result<Sensors> + Send>;

/// The sensor collector plus the ordered module registry for the data schedule.
pub struct ModuleSet {
    sensors: CollectSensors,
    modules: Vec<ModuleBinding>,
}

impl ModuleSet {
    pub fn new<S>(mut sensors: S) -> Self
    where
        S: ModuleUpdate<Output = Sensors>,
    {
        Self {
            sensors: Box::new(move || sensors.update_all_data()),
            modules: Vec::new(),
        }
    }

    /// Append a module. Registration order is launch order.
    pub fn register(mut self, binding: ModuleBinding) -> Self {
        self.modules.retain(|existing| existing.name() != binding.name());
        self.modules.push(binding);
        self
    }

    /// The default collectors for this machine.
    pub fn system_defaults() -> Self {
        ModuleSet::new(SensorsUpdate::new())
            .register(ModuleBinding::new(BatteryUpdate::new()))
            .register(ModuleBinding::with_sensors(CpuUpdate::new()))
            .register(ModuleBinding::new(DisksUpdate::new()))
            .register(ModuleBinding::with_sensors(DisplaysUpdate::new()))
            .register(ModuleBinding::new(GpusUpdate::new()))
            .register(ModuleBinding::new(MemoryUpdate::new()))
            .register(ModuleBinding::new(NetworksUpdate::new()))
            .register(ModuleBinding::new(ProcessesUpdate::new()))
            .register(ModuleBinding::new(SystemUpdate::new()))
    }

    pub fn names(&self) -> Vec<ModuleName> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub(crate) fn into_parts(self) -> (CollectSensors, Vec<ModuleBinding>) {
        (self.sensors, self.modules)
    }
}
