use std::io;
use thiserror::Error;

/// Custom error type for sysbridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Module collection failed: {0}")]
    ModuleCollection(String),

    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("GPU not available: {0}")]
    GpuNotAvailable(String),

    #[error("Media session error: {0}")]
    MediaSession(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for sysbridge
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        BridgeError::Config(msg.into())
    }

    /// Create a module collection error
    pub fn module_collection<S: Into<String>>(msg: S) -> Self {
        BridgeError::ModuleCollection(msg.into())
    }

    pub fn unknown_module<S: Into<String>>(name: S) -> Self {
        BridgeError::UnknownModule(name.into())
    }

    pub fn gpu_not_available<S: Into<String>>(msg: S) -> Self {
        BridgeError::GpuNotAvailable(msg.into())
    }

    pub fn media_session<S: Into<String>>(msg: S) -> Self {
        BridgeError::MediaSession(msg.into())
    }

    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        BridgeError::Runtime(msg.into())
    }

    pub fn other<S: Into<String>>(msg: S) -> Self {
        BridgeError::Other(msg.into())
    }
}
