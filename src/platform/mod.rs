// Platform-specific code module

pub mod displays;
pub mod gpu;
pub mod host;

pub use displays::{connected_displays, DisplayConnector};
pub use gpu::get_gpu_provider;
pub use host::{machine_id, primary_ipv4};
