use std::sync::Arc;

use log::debug;

use super::types::{Display, Sensors};
use super::{ModuleName, ModuleUpdate, SensorsConsumer};
use crate::error::Result;
use crate::platform::{connected_displays, DisplayConnector};

/// Connected displays. Refresh rate and pixel clock come from the sensor
/// snapshot when a sensor source reports display hardware.
pub struct DisplaysUpdate {
    sensors: Option<Arc<Sensors>>,
}

impl DisplaysUpdate {
    pub fn new() -> Self {
        Self { sensors: None }
    }

    fn sensor_value(&self, display_key: &str, needles: &[&str]) -> Option<f32> {
        let value = self
            .sensors
            .as_ref()?
            .find_value("DISPLAY", display_key, needles);
        if let Some(value) = value {
            debug!("Found display {} {:?} = {}", display_key, needles, value);
        }
        value
    }

    fn build(&self, connectors: Vec<DisplayConnector>) -> Vec<Display> {
        connectors
            .into_iter()
            .enumerate()
            .map(|(index, connector)| {
                let key = index.to_string();
                Display {
                    resolution_horizontal: connector
                        .width
                        .or_else(|| self.sensor_value(&key, &["RESOLUTION", "HORIZONTAL"]).map(|v| v as u32)),
                    resolution_vertical: connector
                        .height
                        .or_else(|| self.sensor_value(&key, &["RESOLUTION", "VERTICAL"]).map(|v| v as u32)),
                    is_primary: index == 0,
                    pixel_clock: self.sensor_value(&key, &["PIXEL", "CLOCK"]),
                    refresh_rate: self.sensor_value(&key, &["REFRESH", "RATE"]),
                    name: connector.name,
                    id: key,
                }
            })
            .collect()
    }
}

impl Default for DisplaysUpdate {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorsConsumer for DisplaysUpdate {
    fn set_sensors(&mut self, sensors: Option<Arc<Sensors>>) {
        self.sensors = sensors;
    }
}

impl ModuleUpdate for DisplaysUpdate {
    const NAME: ModuleName = ModuleName::Displays;
    type Output = Vec<Display>;

    fn update_all_data(&mut self) -> Result<Vec<Display>> {
        let connectors = connected_displays()?;
        Ok(self.build(connectors))
    }
}
