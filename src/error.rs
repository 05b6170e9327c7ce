//! # Error Types
//!
//! Custom error types for Bebop Pilot using `thiserror`.

use thiserror::Error;

/// Main error type for Bebop Pilot
#[derive(Debug, Error)]
pub enum PilotError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Binding table errors (duplicate bindings, unknown actions)
    #[error("Binding error: {0}")]
    Binding(String),

    /// Binding file serialization errors
    #[error("Binding file error: {0}")]
    BindingFormat(#[from] serde_json::Error),

    /// Controller errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No gamepad found on the system
    #[error("No gamepad found")]
    ControllerNotFound,

    /// Calibration step timed out waiting for input
    #[error("Calibration timed out waiting for '{0}'")]
    CalibrationTimeout(String),

    /// The input source closed while calibration was still pending
    #[error("Input source disconnected during calibration")]
    CalibrationDisconnected,

    /// Drone actuator errors
    #[error("Actuator error: {0}")]
    Actuator(String),

    /// Video relay errors
    #[error("Video relay error: {0}")]
    Video(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Bebop Pilot
pub type Result<T> = std::result::Result<T, PilotError>;
