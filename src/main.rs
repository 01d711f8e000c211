pub mod config;
pub mod device;
pub mod haptics;
pub mod ui;

use std::sync::Arc;

use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::AppConfig;
use crate::device::{DeviceInfo, DeviceSession};
use crate::haptics::{HapticHandle, SharedDisplayState, SimulationFlags, WallSpring};
use crate::ui::HapticboxApp;

fn main() -> Result<()> {
    setup()?;

    config::ensure_default_config();
    let app_config = config::load();

    info!("enumerating haptic devices ({:?} backend)", app_config.device.backend);
    let devices = device::discover(&app_config.device);
    info!("found {} haptic device(s)", devices.len());
    for (index, device) in devices.iter().enumerate() {
        info!("  [{}] {}", index, device.name);
    }

    let session = open_first_device(&app_config, &devices);
    let device_attached = session.is_some();

    let shared = Arc::new(SharedDisplayState::default());
    let flags = Arc::new(SimulationFlags::default());
    let force_law = WallSpring {
        stiffness: app_config.wall.stiffness,
        half_extent: app_config.wall.half_extent,
    };

    let haptic = HapticHandle::spawn(session, force_law, Arc::clone(&shared), flags)
        .map_err(|e| eyre!("failed to start haptic loop: {}", e))?;

    info!("starting render loop");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_title("hapticbox")
        .with_inner_size([app_config.window.width, app_config.window.height])
        .with_fullscreen(app_config.window.fullscreen);

    eframe::run_native(
        "hapticbox",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(HapticboxApp::new(
                cc,
                shared,
                haptic,
                &app_config,
                device_attached,
            )))
        }),
    )
    .map_err(|e| eyre!("render loop failed: {}", e))?;

    // The app's on_exit already ran the shutdown coordinator.
    info!("clean exit");
    Ok(())
}

/// Acquires, opens and initializes the first discovered device. Any failure
/// here disables force feedback for the session; rendering continues.
fn open_first_device(config: &AppConfig, devices: &[DeviceInfo]) -> Option<DeviceSession> {
    if devices.is_empty() {
        warn!("no haptic device connected, continuing without force feedback");
        return None;
    }
    let mut session = match device::acquire(&config.device, 0) {
        Ok(session) => session,
        Err(e) => {
            error!("could not acquire haptic device: {}; continuing without force feedback", e);
            return None;
        }
    };
    if let Err(e) = session.open().and_then(|_| session.initialize()) {
        error!("could not bring up haptic device: {}; continuing without force feedback", e);
        return None;
    }
    let spec = session.spec();
    info!(
        "haptic device ready: {} (max stiffness {} N/m, workspace radius {} m)",
        spec.name, spec.max_stiffness, spec.workspace_radius
    );
    Some(session)
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
