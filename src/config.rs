//! Application configuration loaded from a TOML file in the user config dir.
//!
//! The file lives at `<config dir>/hapticbox/config.toml` and is created with
//! defaults on first run. A missing or unparsable file never aborts startup;
//! the defaults are used and a warning is logged.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::haptics::force::{WALL_HALF_EXTENT, WALL_STIFFNESS};

/// Which device backend to bind during discovery.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Enumerate connected gamepads; zero devices means haptics stay disabled.
    Auto,
    /// Gamepad backend only.
    Gamepad,
    /// Deterministic simulated device, no hardware required.
    Sim,
    /// Never bind a device; render-only session.
    None,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub wall: WallConfig,
    pub window: WindowConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct DeviceConfig {
    pub backend: BackendKind,
    /// Radius of the physical workspace mapped by the backend, in meters.
    pub workspace_radius: f64,
    pub sim: SimConfig,
}

/// Drive parameters for the simulated device's autonomous motion.
#[derive(Deserialize, Serialize, Clone, Copy, Debug)]
#[serde(default)]
pub struct SimConfig {
    /// Peak excitation force in newtons.
    pub drive_amplitude: f64,
    /// Excitation frequency in hertz.
    pub drive_frequency_hz: f64,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug)]
#[serde(default)]
pub struct WallConfig {
    /// Wall spring stiffness in N/m.
    pub stiffness: f64,
    /// Half-extent of the invisible box on Y and Z, in meters.
    pub half_extent: f64,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub fullscreen: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            wall: WallConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            workspace_radius: 0.04,
            sim: SimConfig::default(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            drive_amplitude: 2.0,
            drive_frequency_hz: 0.25,
        }
    }
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            stiffness: WALL_STIFFNESS,
            half_extent: WALL_HALF_EXTENT,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 600.0,
            fullscreen: false,
        }
    }
}

/// Location of the config file, if a platform config dir exists.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hapticbox").join("config.toml"))
}

/// Writes a default config file if none exists yet.
pub fn ensure_default_config() {
    let Some(path) = config_path() else {
        warn!("no platform config directory, skipping default config");
        return;
    };
    if path.exists() {
        return;
    }
    let default_toml = match toml::to_string_pretty(&AppConfig::default()) {
        Ok(s) => s,
        Err(e) => {
            warn!("could not serialize default config: {}", e);
            return;
        }
    };
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("could not create config directory {:?}: {}", parent, e);
            return;
        }
    }
    match fs::write(&path, default_toml) {
        Ok(()) => info!("wrote default config to {:?}", path),
        Err(e) => warn!("could not write default config {:?}: {}", path, e),
    }
}

/// Loads the config file, falling back to defaults on any failure.
pub fn load() -> AppConfig {
    let Some(path) = config_path() else {
        return AppConfig::default();
    };
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("config file {:?} not readable ({}), using defaults", path, e);
            return AppConfig::default();
        }
    };
    match toml::from_str(&raw) {
        Ok(config) => {
            info!("loaded config from {:?}", path);
            config
        }
        Err(e) => {
            warn!("invalid config file {:?}: {}; using defaults", path, e);
            AppConfig::default()
        }
    }
}
