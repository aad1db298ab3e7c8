// sysbridge library - public API

// Re-export error types
pub mod error;
pub use error::{BridgeError, Result};

// Module declarations
pub mod core;
pub mod platform;

// Re-export commonly used types
pub use crate::core::config::Settings;
pub use crate::core::data::DataUpdate;
pub use crate::core::modules::{ModuleData, ModuleName, ModuleSet};
pub use crate::core::state::ModulesData;

// Initialize logging
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
