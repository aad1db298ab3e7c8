#[cfg(feature = "nvml")]
use nvml_wrapper::{
    enum_wrappers::device::{Clock, TemperatureSensor},
    Device, Nvml,
};

use crate::core::modules::{Gpu, GpuProvider, GpuVendor};
use crate::error::{BridgeError, Result};

/// NVIDIA GPU provider using NVML, covering every device NVML reports
pub struct NvidiaGpuProvider {
    #[cfg(feature = "nvml")]
    nvml: Nvml,
    device_count: u32,
}

impl NvidiaGpuProvider {
    /// Initialize NVML and count the available devices.
    pub fn new() -> Result<Self> {
        #[cfg(feature = "nvml")]
        {
            let nvml = Nvml::init()
                .map_err(|e| BridgeError::gpu_not_available(format!("Failed to init NVML: {}", e)))?;

            let device_count = nvml
                .device_count()
                .map_err(|e| BridgeError::gpu_not_available(format!("Failed to count GPUs: {}", e)))?;

            if device_count == 0 {
                return Err(BridgeError::gpu_not_available("NVML reports no devices"));
            }

            Ok(Self { nvml, device_count })
        }
        #[cfg(not(feature = "nvml"))]
        {
            Err(BridgeError::gpu_not_available(
                "NVIDIA GPU support not enabled",
            ))
        }
    }

    #[cfg(feature = "nvml")]
    fn get_device(&self, index: u32) -> Result<Device<'_>> {
        self.nvml.device_by_index(index).map_err(|e| {
            BridgeError::module_collection(format!("Failed to get GPU device {}: {}", index, e))
        })
    }

    #[cfg(feature = "nvml")]
    fn collect_device(&self, index: u32) -> Result<Gpu> {
        let device = self.get_device(index)?;

        let name = device
            .name()
            .unwrap_or_else(|_| "Unknown NVIDIA GPU".to_string());

        let utilization = device.utilization_rates().map(|u| u.gpu).unwrap_or(0);

        let memory_info = device.memory_info().map_err(|e| {
            BridgeError::module_collection(format!("Failed to get memory info: {}", e))
        })?;

        let memory_percent = if memory_info.total > 0 {
            (memory_info.used as f32 / memory_info.total as f32) * 100.0
        } else {
            0.0
        };

        Ok(Gpu {
            id: device
                .uuid()
                .unwrap_or_else(|_| format!("nvidia-{}", index)),
            vendor: GpuVendor::Nvidia,
            name,
            utilization_percent: utilization,
            memory_used_bytes: memory_info.used,
            memory_total_bytes: memory_info.total,
            memory_percent,
            temperature_celsius: device.temperature(TemperatureSensor::Gpu).ok(),
            fan_speed_percent: device.fan_speed(0).ok(),
            power_draw_watts: device.power_usage().map(|p| p / 1000).ok(), // mW to W
            power_limit_watts: device.enforced_power_limit().map(|p| p / 1000).ok(),
            clock_graphics_mhz: device.clock_info(Clock::Graphics).ok(),
            clock_memory_mhz: device.clock_info(Clock::Memory).ok(),
        })
    }
}

impl GpuProvider for NvidiaGpuProvider {
    fn vendor(&self) -> GpuVendor {
        GpuVendor::Nvidia
    }

    fn is_available(&self) -> bool {
        #[cfg(feature = "nvml")]
        {
            self.get_device(0).is_ok()
        }
        #[cfg(not(feature = "nvml"))]
        {
            false
        }
    }

    fn collect_metrics(&mut self) -> Result<Vec<Gpu>> {
        #[cfg(feature = "nvml")]
        {
            (0..self.device_count)
                .map(|index| self.collect_device(index))
                .collect()
        }
        #[cfg(not(feature = "nvml"))]
        {
            let _ = self.device_count;
            Err(BridgeError::gpu_not_available(
                "NVIDIA GPU support not enabled",
            ))
        }
    }
}
