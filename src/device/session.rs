use glam::DVec3;
use tracing::{debug, info};

use super::gamepad::GamepadDevice;
use super::sim::SimulatedDevice;
use super::types::{DeviceError, DeviceInfo, DeviceSample, DeviceSpec};
use crate::config::{BackendKind, DeviceConfig};

/// The narrow contract the haptic loop depends on.
///
/// `sample` must be non-blocking and cheap enough to call at hundreds of Hz;
/// `actuate` is fire-and-forget, no acknowledgement is waited for.
pub trait HapticDevice: Send {
    fn spec(&self) -> &DeviceSpec;
    fn open(&mut self) -> Result<(), DeviceError>;
    fn initialize(&mut self) -> Result<(), DeviceError>;
    fn sample(&mut self) -> Result<DeviceSample, DeviceError>;
    fn actuate(&mut self, force: DVec3) -> Result<(), DeviceError>;
    fn close(&mut self);
}

/// Enumerates devices for the configured backend. No side effects beyond
/// enumeration; returns an empty list when nothing is connected.
pub fn discover(config: &DeviceConfig) -> Vec<DeviceInfo> {
    match config.backend {
        BackendKind::None => Vec::new(),
        BackendKind::Sim => vec![DeviceInfo {
            name: "simulated haptic device".to_string(),
        }],
        BackendKind::Auto | BackendKind::Gamepad => GamepadDevice::enumerate(),
    }
}

/// Binds to the device at `index` in discovery order.
pub fn acquire(config: &DeviceConfig, index: usize) -> Result<DeviceSession, DeviceError> {
    let backend: Box<dyn HapticDevice> = match config.backend {
        BackendKind::None => {
            return Err(DeviceError::NoDevice("device backend disabled".to_string()))
        }
        BackendKind::Sim => {
            if index != 0 {
                return Err(DeviceError::NoDevice(format!(
                    "sim backend exposes one device, index {} out of range",
                    index
                )));
            }
            Box::new(SimulatedDevice::new(config))
        }
        BackendKind::Auto | BackendKind::Gamepad => Box::new(GamepadDevice::acquire(config, index)?),
    };
    info!("acquired haptic device: {}", backend.spec().name);
    Ok(DeviceSession::new(backend))
}

/// Owns one acquired device for the lifetime of the simulation.
///
/// Exactly one `DeviceSession` exists per device; the haptic loop thread owns
/// it while running and hands it back on join, so `close` can only ever happen
/// after the loop has exited.
pub struct DeviceSession {
    backend: Box<dyn HapticDevice>,
    opened: bool,
    closed: bool,
}

impl DeviceSession {
    fn new(backend: Box<dyn HapticDevice>) -> Self {
        Self {
            backend,
            opened: false,
            closed: false,
        }
    }

    pub fn spec(&self) -> &DeviceSpec {
        self.backend.spec()
    }

    /// Establishes the communication channel.
    pub fn open(&mut self) -> Result<(), DeviceError> {
        self.backend.open()?;
        self.opened = true;
        debug!("device channel open: {}", self.backend.spec().name);
        Ok(())
    }

    /// Prepares the device for the first sample/actuate cycle.
    pub fn initialize(&mut self) -> Result<(), DeviceError> {
        self.backend.initialize()
    }

    /// Non-blocking read of position, velocity and switch state.
    pub fn sample(&mut self) -> Result<DeviceSample, DeviceError> {
        debug_assert!(!self.is_closed(), "sample on a closed device session");
        self.backend.sample()
    }

    /// Sends a force command without waiting for an acknowledgement.
    pub fn actuate(&mut self, force: DVec3) -> Result<(), DeviceError> {
        debug_assert!(!self.is_closed(), "actuate on a closed device session");
        self.backend.actuate(force)
    }

    /// Releases the channel. Guarded so a second call is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if self.opened {
            self.backend.close();
        }
        self.closed = true;
        info!("haptic device closed: {}", self.backend.spec().name);
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendKind;

    fn sim_config() -> DeviceConfig {
        DeviceConfig {
            backend: BackendKind::Sim,
            ..DeviceConfig::default()
        }
    }

    #[test]
    fn none_backend_discovers_nothing() {
        let config = DeviceConfig {
            backend: BackendKind::None,
            ..DeviceConfig::default()
        };
        assert!(discover(&config).is_empty());
        assert!(matches!(
            acquire(&config, 0),
            Err(DeviceError::NoDevice(_))
        ));
    }

    #[test]
    fn sim_backend_exposes_exactly_one_device() {
        let config = sim_config();
        assert_eq!(discover(&config).len(), 1);
        assert!(acquire(&config, 0).is_ok());
        assert!(matches!(
            acquire(&config, 1),
            Err(DeviceError::NoDevice(_))
        ));
    }

    #[test]
    fn session_lifecycle_open_sample_close() {
        let mut session = acquire(&sim_config(), 0).unwrap();
        session.open().unwrap();
        session.initialize().unwrap();
        let sample = session.sample().unwrap();
        assert!(sample.position.is_finite());
        session.actuate(glam::DVec3::new(0.0, 1.0, 0.0)).unwrap();
        session.close();
        assert!(session.is_closed());
        // Second close is a guarded no-op.
        session.close();
        assert!(session.is_closed());
    }
}
