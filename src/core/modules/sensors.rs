use sysinfo::Components;

use super::types::{SensorHardware, SensorReading, Sensors, TemperatureReading};
use super::{ModuleName, ModuleUpdate};
use crate::error::Result;

/// Collects temperature sensors and groups them per hardware chip.
pub struct SensorsUpdate {
    components: Components,
}

impl SensorsUpdate {
    pub fn new() -> Self {
        Self {
            components: Components::new_with_refreshed_list(),
        }
    }
}

impl Default for SensorsUpdate {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleUpdate for SensorsUpdate {
    const NAME: ModuleName = ModuleName::Sensors;
    type Output = Sensors;

    fn update_all_data(&mut self) -> Result<Sensors> {
        self.components.refresh(true);

        let temperatures: Vec<TemperatureReading> = self
            .components
            .iter()
            .map(|comp| TemperatureReading {
                label: comp.label().to_string(),
                current_celsius: comp.temperature(),
                max_celsius: comp.max(),
                critical_celsius: comp.critical(),
            })
            .collect();

        Ok(Sensors {
            hardware: group_by_chip(&temperatures),
            temperatures,
        })
    }
}

/// Labels look like "coretemp Package id 0": the first word names the chip.
fn group_by_chip(temperatures: &[TemperatureReading]) -> Vec<SensorHardware> {
    let mut hardware: Vec<SensorHardware> = Vec::new();

    for reading in temperatures {
        let (chip, sensor) = match reading.label.split_once(' ') {
            Some((chip, sensor)) => (chip.to_string(), sensor.to_string()),
            None => (reading.label.clone(), reading.label.clone()),
        };

        let entry = match hardware.iter().position(|hw| hw.name == chip) {
            Some(index) => &mut hardware[index],
            None => {
                hardware.push(SensorHardware {
                    id: format!("/{}/{}", chip.to_lowercase(), hardware.len()),
                    name: chip,
                    kind: "Temperature".to_string(),
                    sensors: Vec::new(),
                });
                let last = hardware.len() - 1;
                &mut hardware[last]
            }
        };

        entry.sensors.push(SensorReading {
            name: sensor,
            kind: "Temperature".to_string(),
            value: reading.current_celsius,
        });
    }

    hardware
}
