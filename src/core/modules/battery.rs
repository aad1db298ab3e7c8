use battery::units::power::watt;
use battery::units::ratio::percent;
use battery::units::time::second;
use battery::{Manager, State};
use log::debug;

use super::types::{Battery, BatteryState};
use super::{ModuleName, ModuleUpdate};
use crate::error::{BridgeError, Result};

/// Reports the first battery the OS exposes.
///
/// The platform manager is opened on every update; it is not `Send` on every
/// platform.
#[derive(Debug, Default)]
pub struct BatteryUpdate;

impl BatteryUpdate {
    pub fn new() -> Self {
        Self
    }
}

impl ModuleUpdate for BatteryUpdate {
    const NAME: ModuleName = ModuleName::Battery;
    type Output = Battery;

    fn update_all_data(&mut self) -> Result<Battery> {
        let manager = Manager::new()
            .map_err(|e| BridgeError::module_collection(format!("Failed to create battery manager: {}", e)))?;

        let mut batteries = manager
            .batteries()
            .map_err(|e| BridgeError::module_collection(format!("Failed to get batteries: {}", e)))?;

        let battery = match batteries.next() {
            Some(battery) => battery
                .map_err(|e| BridgeError::module_collection(format!("Error reading battery: {}", e)))?,
            None => {
                debug!("No battery found");
                return Ok(Battery::default());
            }
        };

        let state = map_state(battery.state());
        let time_remaining = match battery.state() {
            State::Charging => battery.time_to_full(),
            State::Discharging => battery.time_to_empty(),
            _ => None,
        };

        Ok(Battery {
            is_present: true,
            is_charging: match state {
                BatteryState::Charging => Some(true),
                BatteryState::Discharging | BatteryState::Empty => Some(false),
                _ => None,
            },
            percentage: Some(battery.state_of_charge().get::<percent>()),
            state,
            time_remaining_secs: time_remaining.map(|t| t.get::<second>() as u64),
            energy_rate_watts: Some(battery.energy_rate().get::<watt>()),
        })
    }
}

fn map_state(state: State) -> BatteryState {
    match state {
        State::Charging => BatteryState::Charging,
        State::Discharging => BatteryState::Discharging,
        State::Empty => BatteryState::Empty,
        State::Full => BatteryState::Full,
        _ => BatteryState::Unknown,
    }
}
