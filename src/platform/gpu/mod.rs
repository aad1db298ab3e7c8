//! GPU-specific platform code.
//!
//! Provides GPU metrics collection for different vendors.
//! Supports NVIDIA (via NVML, behind the `nvml` feature).

mod nvidia;

pub use nvidia::NvidiaGpuProvider;

use crate::core::modules::GpuProvider;
use crate::error::{BridgeError, Result};

/// Attempt to get an available GPU provider
///
/// Returns error if no supported GPU is available.
pub fn get_gpu_provider() -> Result<Box<dyn GpuProvider>> {
    if let Ok(provider) = NvidiaGpuProvider::new() {
        return Ok(Box::new(provider));
    }

    Err(BridgeError::gpu_not_available("No supported GPU found"))
}
