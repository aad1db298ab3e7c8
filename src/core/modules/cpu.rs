use std::sync::Arc;

use sysinfo::{CpuRefreshKind, RefreshKind, System};

use super::types::{Cpu, Sensors};
use super::{ModuleName, ModuleUpdate, SensorsConsumer};
use crate::error::Result;

/// Sensor labels that belong to the CPU package.
const CPU_SENSOR_LABELS: [&str; 5] = ["CPU", "PACKAGE", "CORE", "TCTL", "TDIE"];

/// CPU usage and frequencies. Usage figures need two refreshes, so the first
/// result after startup reports zero load.
pub struct CpuUpdate {
    system: System,
    sensors: Option<Arc<Sensors>>,
}

impl CpuUpdate {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing().with_cpu(CpuRefreshKind::everything());
        Self {
            system: System::new_with_specifics(refresh_kind),
            sensors: None,
        }
    }

    fn temperature(&self) -> Option<f32> {
        let sensors = self.sensors.as_ref()?;
        sensors
            .temperatures
            .iter()
            .filter(|reading| {
                let label = reading.label.to_uppercase();
                CPU_SENSOR_LABELS.iter().any(|needle| label.contains(needle))
            })
            .filter_map(|reading| reading.current_celsius)
            .reduce(f32::max)
    }
}

impl Default for CpuUpdate {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorsConsumer for CpuUpdate {
    fn set_sensors(&mut self, sensors: Option<Arc<Sensors>>) {
        self.sensors = sensors;
    }
}

impl ModuleUpdate for CpuUpdate {
    const NAME: ModuleName = ModuleName::Cpu;
    type Output = Cpu;

    fn update_all_data(&mut self) -> Result<Cpu> {
        self.system.refresh_cpu_all();

        let cpus = self.system.cpus();
        let load = System::load_average();

        Ok(Cpu {
            brand: cpus
                .first()
                .map(|c| c.brand().to_string())
                .unwrap_or_default(),
            vendor_id: cpus
                .first()
                .map(|c| c.vendor_id().to_string())
                .unwrap_or_default(),
            count: cpus.len(),
            usage: self.system.global_cpu_usage(),
            per_cpu_usage: cpus.iter().map(|cpu| cpu.cpu_usage()).collect(),
            frequencies_mhz: cpus.iter().map(|cpu| cpu.frequency()).collect(),
            load_average: (load.one, load.five, load.fifteen),
            temperature_celsius: self.temperature(),
        })
    }
}
