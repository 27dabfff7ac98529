//! Error types for AVD Pilot
//!
//! Errors raised while loading configuration. Device and tool
//! errors live next to the operations that raise them.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for AVD Pilot configuration
#[derive(Error, Debug)]
pub enum PilotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, PilotError>;

impl PilotError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            PilotError::Io(e) => format!("File operation failed: {}", e),
            PilotError::ConfigNotFound(path) => {
                format!("No configuration at {}. Remove --config to use defaults.", path.display())
            }
            _ => self.to_string(),
        }
    }
}
