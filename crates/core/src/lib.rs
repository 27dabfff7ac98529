//! AVD Pilot Core - configuration and shared types
//!
//! Holds the settings every other crate reads: where the Android SDK lives,
//! where the model-serving API listens, and how verbose logging should be.

pub mod config;
pub mod error;

pub use config::{AndroidConfig, AppConfig, ModelConfig};
pub use error::{PilotError, Result};

/// AVD Pilot version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "AVD Pilot";
