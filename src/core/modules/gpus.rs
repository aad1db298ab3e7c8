use log::warn;

use super::types::{Gpu, GpuVendor};
use super::{ModuleName, ModuleUpdate};
use crate::error::Result;
use crate::platform::gpu::get_gpu_provider;

/// Trait for GPU metrics providers
///
/// This trait abstracts GPU monitoring across different vendors (NVIDIA, AMD, Intel).
/// Implementations are provided in the platform layer.
pub trait GpuProvider: Send {
    /// Get the vendor of the GPU
    fn vendor(&self) -> GpuVendor;

    /// Collect current metrics for every device this provider covers
    fn collect_metrics(&mut self) -> Result<Vec<Gpu>>;

    /// Check if the GPU provider is available and functional
    fn is_available(&self) -> bool;
}

/// GPU metrics; an empty list on machines without a supported GPU.
pub struct GpusUpdate {
    provider: Option<Box<dyn GpuProvider>>,
}

impl GpusUpdate {
    pub fn new() -> Self {
        let provider = match get_gpu_provider() {
            Ok(provider) => Some(provider),
            Err(e) => {
                warn!("GPU provider not available: {}", e);
                None
            }
        };
        Self { provider }
    }

    pub fn with_provider(provider: Box<dyn GpuProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }
}

impl Default for GpusUpdate {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleUpdate for GpusUpdate {
    const NAME: ModuleName = ModuleName::Gpus;
    type Output = Vec<Gpu>;

    fn update_all_data(&mut self) -> Result<Vec<Gpu>> {
        match self.provider.as_mut() {
            Some(provider) => provider.collect_metrics(),
            None => Ok(Vec::new()),
        }
    }
}
