// Core service: schedules, modules and shared state

pub mod config;
pub mod data;
pub mod modules;
pub mod state;
pub mod threads;

// Re-export commonly used items
pub use config::Settings;
pub use data::{DataUpdate, Notify};
pub use modules::{ModuleBinding, ModuleData, ModuleName, ModuleSet, ModulesUpdate};
pub use state::ModulesData;
pub use threads::{IntervalHandle, UpdateRequest, UpdateStep, UpdateWorker};
