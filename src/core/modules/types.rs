use serde::{Deserialize, Serialize};

/// Battery state reported by the OS
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatteryState {
    Charging,
    Discharging,
    Empty,
    Full,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Battery {
    pub is_present: bool,
    pub is_charging: Option<bool>,
    pub percentage: Option<f32>,
    pub state: BatteryState,
    pub time_remaining_secs: Option<u64>,
    pub energy_rate_watts: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cpu {
    pub brand: String,
    pub vendor_id: String,
    pub count: usize,
    pub usage: f32,
    pub per_cpu_usage: Vec<f32>,
    pub frequencies_mhz: Vec<u64>,
    pub load_average: (f64, f64, f64), // 1, 5, 15 min
    pub temperature_celsius: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Disk {
    pub name: String,
    pub mount_point: String,
    pub fs_type: String,
    pub is_removable: bool,
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub usage_percent: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Disks {
    pub devices: Vec<Disk>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Display {
    pub id: String,
    pub name: String,
    pub resolution_horizontal: Option<u32>,
    pub resolution_vertical: Option<u32>,
    pub is_primary: bool,
    pub pixel_clock: Option<f32>,
    pub refresh_rate: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Gpu {
    pub id: String,
    pub vendor: GpuVendor,
    pub name: String,
    pub utilization_percent: u32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub memory_percent: f32,
    pub temperature_celsius: Option<u32>,
    pub fan_speed_percent: Option<u32>,
    pub power_draw_watts: Option<u32>,
    pub power_limit_watts: Option<u32>,
    pub clock_graphics_mhz: Option<u32>,
    pub clock_memory_mhz: Option<u32>,
}

/// Playback status of the current media session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaStatus {
    Closed,
    Opened,
    Changing,
    Stopped,
    Playing,
    Paused,
}

impl MediaStatus {
    pub fn is_playing(&self) -> bool {
        matches!(self, MediaStatus::Playing)
    }
}

/// Media playback info. A heartbeat carries only `updated_at`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Media {
    pub updated_at: f64, // Unix timestamp, fractional seconds
    pub status: Option<MediaStatus>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album_title: Option<String>,
    pub track_number: Option<u32>,
    pub duration_secs: Option<f64>,
    pub position_secs: Option<f64>,
    pub playback_rate: Option<f64>,
    pub shuffle: Option<bool>,
    pub repeat: Option<String>,
    pub media_type: Option<String>,
    pub is_next_enabled: Option<bool>,
    pub is_pause_enabled: Option<bool>,
    pub is_play_enabled: Option<bool>,
    pub is_previous_enabled: Option<bool>,
}

impl Media {
    /// Media payload stamped with the current time and nothing else.
    pub fn heartbeat() -> Self {
        Self {
            updated_at: unix_timestamp(),
            ..Default::default()
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status.map(|s| s.is_playing()).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Memory {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub usage_percent: f32,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,
    pub swap_percent: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkInterface {
    pub name: String,
    pub mac_address: String,
    pub addresses: Vec<String>,
    pub rx_bytes_total: u64,
    pub tx_bytes_total: u64,
    pub rx_bytes_per_sec: u64,
    pub tx_bytes_per_sec: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Networks {
    pub interfaces: Vec<NetworkInterface>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Process {
    pub pid: u32,
    pub parent_pid: Option<u32>,
    pub name: String,
    pub cpu_usage_percent: f32,
    pub memory_bytes: u64,
    pub status: String,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SensorReading {
    pub name: String,
    pub kind: String,
    pub value: Option<f32>,
}

/// A piece of hardware exposing one or more sensors
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SensorHardware {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub sensors: Vec<SensorReading>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TemperatureReading {
    pub label: String,
    pub current_celsius: Option<f32>,
    pub max_celsius: Option<f32>,
    pub critical_celsius: Option<f32>,
}

/// Per-tick sensor snapshot, shared with modules that depend on it
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Sensors {
    pub temperatures: Vec<TemperatureReading>,
    pub hardware: Vec<SensorHardware>,
}

impl Sensors {
    /// Find the first sensor on hardware matching `hardware_kind` (or whose
    /// name contains `hardware_key`) whose name contains every `needle`.
    ///
    /// Matching is case-insensitive.
    pub fn find_value(&self, hardware_kind: &str, hardware_key: &str, needles: &[&str]) -> Option<f32> {
        let kind = hardware_kind.to_uppercase();
        let key = hardware_key.to_uppercase();

        self.hardware
            .iter()
            .filter(|hw| hw.kind.to_uppercase().contains(&kind) || hw.name.to_uppercase().contains(&key))
            .flat_map(|hw| hw.sensors.iter())
            .find(|sensor| {
                let name = sensor.name.to_uppercase();
                needles.iter().all(|needle| name.contains(&needle.to_uppercase()))
            })
            .and_then(|sensor| sensor.value)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct System {
    pub hostname: String,
    pub platform: String,
    pub platform_version: String,
    pub kernel_version: String,
    pub boot_time: u64,
    pub uptime_secs: u64,
    pub users: Vec<String>,
    pub ip_address_4: Option<String>,
    pub mac_address: Option<String>,
    pub uuid: Option<String>,
    pub version: String,
}

pub(crate) fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
