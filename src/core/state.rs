//! Shared result aggregate.
//!
//! One field per module, each behind its own lock. Fields are overwritten
//! independently and never read together under a common lock, so a reader may
//! see `cpu` from one tick and `memory` from the next.

use parking_lot::RwLock;
use serde::Serialize;

use crate::core::modules::{
    Battery, Cpu, Disks, Display, Gpu, Media, Memory, ModuleData, ModuleName, Networks, Process,
    Sensors, System,
};

/// Latest result of every module. `None` until the module first succeeds.
#[derive(Debug, Default)]
pub struct ModulesData {
    /// Written only by the battery collection task.
    battery: RwLock<Option<Battery>>,
    /// Written only by the cpu collection task.
    cpu: RwLock<Option<Cpu>>,
    /// Written only by the disks collection task.
    disks: RwLock<Option<Disks>>,
    /// Written only by the displays collection task.
    displays: RwLock<Option<Vec<Display>>>,
    /// Written only by the gpus collection task.
    gpus: RwLock<Option<Vec<Gpu>>>,
    /// Written only by the media schedule's thread.
    media: RwLock<Option<Media>>,
    /// Written only by the memory collection task.
    memory: RwLock<Option<Memory>>,
    /// Written only by the networks collection task.
    networks: RwLock<Option<Networks>>,
    /// Written only by the processes collection task.
    processes: RwLock<Option<Vec<Process>>>,
    /// Written only by the data schedule's thread, before modules launch.
    sensors: RwLock<Option<Sensors>>,
    /// Written only by the system collection task.
    system: RwLock<Option<System>>,
}

impl ModulesData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the field matching `data`'s variant. Returns the field name.
    pub fn apply(&self, data: ModuleData) -> ModuleName {
        let name = data.name();
        match data {
            ModuleData::Battery(v) => *self.battery.write() = Some(v),
            ModuleData::Cpu(v) => *self.cpu.write() = Some(v),
            ModuleData::Disks(v) => *self.disks.write() = Some(v),
            ModuleData::Displays(v) => *self.displays.write() = Some(v),
            ModuleData::Gpus(v) => *self.gpus.write() = Some(v),
            ModuleData::Media(v) => *self.media.write() = Some(v),
            ModuleData::Memory(v) => *self.memory.write() = Some(v),
            ModuleData::Networks(v) => *self.networks.write() = Some(v),
            ModuleData::Processes(v) => *self.processes.write() = Some(v),
            ModuleData::Sensors(v) => *self.sensors.write() = Some(v),
            ModuleData::System(v) => *self.system.write() = Some(v),
        }
        name
    }

    pub fn battery(&self) -> Option<Battery> {
        self.battery.read().clone()
    }

    pub fn cpu(&self) -> Option<Cpu> {
        self.cpu.read().clone()
    }

    pub fn disks(&self) -> Option<Disks> {
        self.disks.read().clone()
    }

    pub fn displays(&self) -> Option<Vec<Display>> {
        self.displays.read().clone()
    }

    pub fn gpus(&self) -> Option<Vec<Gpu>> {
        self.gpus.read().clone()
    }

    pub fn media(&self) -> Option<Media> {
        self.media.read().clone()
    }

    pub fn memory(&self) -> Option<Memory> {
        self.memory.read().clone()
    }

    pub fn networks(&self) -> Option<Networks> {
        self.networks.read().clone()
    }

    pub fn processes(&self) -> Option<Vec<Process>> {
        self.processes.read().clone()
    }

    pub fn sensors(&self) -> Option<Sensors> {
        self.sensors.read().clone()
    }

    pub fn system(&self) -> Option<System> {
        self.system.read().clone()
    }

    /// Field value as JSON, `None` if the field has never been written.
    pub fn get_json(&self, name: ModuleName) -> Option<serde_json::Value> {
        match name {
            ModuleName::Battery => to_json(&*self.battery.read()),
            ModuleName::Cpu => to_json(&*self.cpu.read()),
            ModuleName::Disks => to_json(&*self.disks.read()),
            ModuleName::Displays => to_json(&*self.displays.read()),
            ModuleName::Gpus => to_json(&*self.gpus.read()),
            ModuleName::Media => to_json(&*self.media.read()),
            ModuleName::Memory => to_json(&*self.memory.read()),
            ModuleName::Networks => to_json(&*self.networks.read()),
            ModuleName::Processes => to_json(&*self.processes.read()),
            ModuleName::Sensors => to_json(&*self.sensors.read()),
            ModuleName::System => to_json(&*self.system.read()),
        }
    }

    /// Names of the fields written at least once.
    pub fn populated(&self) -> Vec<ModuleName> {
        ModuleName::ALL
            .iter()
            .copied()
            .filter(|name| self.get_json(*name).is_some())
            .collect()
    }
}

fn to_json<T: Serialize>(value: &Option<T>) -> Option<serde_json::Value> {
    value.as_ref().and_then(|v| serde_json::to_value(v).ok())
}
