//! AVD Pilot - Android emulator automation over JSON-RPC
//!
//! Exposes emulator lifecycle, AVD management, device queries, app launch
//! and gestures as tools that a calling client invokes over stdio. A
//! separate model proxy forwards text generation to a local model server.
//!
//! ## Architecture
//!
//! - `avd-pilot-core`: configuration and shared errors
//! - `avd-pilot-android-toolchain`: SDK detection, tool paths, child environment
//! - `avd-pilot-emulator-bridge`: device orchestration over the Android tools
//! - `avd-pilot-model-proxy`: local model server client
//!
//! This crate is the protocol adapter on top of them.

#![warn(clippy::all)]

pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

pub use avd_pilot_android_toolchain as toolchain;
pub use avd_pilot_core as core;
pub use avd_pilot_emulator_bridge as emulator;
pub use avd_pilot_model_proxy as model;

use avd_pilot_android_toolchain::{EnvironmentConfig, Toolchain};
use avd_pilot_core::AppConfig;
use avd_pilot_emulator_bridge::DeviceBridge;
use avd_pilot_model_proxy::ModelClient;

/// Package version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything a tool call can reach
#[derive(Clone)]
pub struct PilotContext {
    pub bridge: DeviceBridge,
    pub models: ModelClient,
    /// Model used when a call does not name one
    pub default_model: String,
}

impl PilotContext {
    pub fn new(bridge: DeviceBridge, models: ModelClient, default_model: impl Into<String>) -> Self {
        Self {
            bridge,
            models,
            default_model: default_model.into(),
        }
    }

    /// Resolve the toolchain from `config` and wire the real tools
    pub fn from_config(config: &AppConfig) -> Self {
        let toolchain = Toolchain::resolve(EnvironmentConfig::new(
            config.android.sdk_path.clone(),
            config.android.avd_home.clone(),
            config.android.java_home.clone(),
        ));

        Self::new(
            DeviceBridge::system(toolchain),
            ModelClient::new(&config.model.base_url),
            config.model.default_model.clone(),
        )
    }
}
