//! Gamepad-backed haptic device.
//!
//! Maps the analog sticks into the 3D workspace (right stick Y drives the
//! depth axis, left stick drives Y/Z), finite-differences velocity between
//! samples, and reads the south face button as the user switch. Force output
//! is rendered as rumble: a gamepad cannot reproduce a proportional spring,
//! so the commanded magnitude switches a fixed-strength effect on and off
//! around a small hysteresis band.

use std::time::Instant;

use gilrs::ff::{BaseEffect, BaseEffectType, Effect, EffectBuilder, Replay, Ticks};
use gilrs::{Axis, Button, GamepadId, Gilrs};
use glam::DVec3;
use tracing::{debug, info, warn};

use super::session::HapticDevice;
use super::types::{DeviceError, DeviceInfo, DeviceSample, DeviceSpec};
use crate::config::DeviceConfig;

/// Rumble engages above this commanded force magnitude, in N.
const RUMBLE_ON_THRESHOLD: f64 = 0.5;
/// Rumble disengages below this magnitude; the gap avoids chatter at a wall.
const RUMBLE_OFF_THRESHOLD: f64 = 0.2;

/// Velocity spikes from event-loop hiccups are capped at this sample gap.
const MAX_VELOCITY_DT: f64 = 0.050;

pub struct GamepadDevice {
    gilrs: Gilrs,
    id: GamepadId,
    spec: DeviceSpec,
    rumble: Option<Effect>,
    rumble_on: bool,
    last_position: DVec3,
    last_sample_at: Option<Instant>,
}

impl GamepadDevice {
    /// Lists connected gamepads in gilrs order.
    pub fn enumerate() -> Vec<DeviceInfo> {
        let gilrs = match Gilrs::new() {
            Ok(gilrs) => gilrs,
            Err(e) => {
                warn!("could not initialize gamepad backend: {}", e);
                return Vec::new();
            }
        };
        gilrs
            .gamepads()
            .map(|(_, gamepad)| DeviceInfo {
                name: gamepad.name().to_string(),
            })
            .collect()
    }

    /// Binds to the gamepad at `index` in enumeration order.
    pub fn acquire(config: &DeviceConfig, index: usize) -> Result<Self, DeviceError> {
        let gilrs = Gilrs::new().map_err(|e| DeviceError::Backend(e.to_string()))?;
        let connected: Vec<GamepadId> = gilrs.gamepads().map(|(id, _)| id).collect();
        let id = *connected.get(index).ok_or_else(|| {
            DeviceError::NoDevice(format!(
                "gamepad index {} out of range ({} connected)",
                index,
                connected.len()
            ))
        })?;
        let name = gilrs.gamepad(id).name().to_string();
        info!("selected gamepad: {} ({:?})", name, id);

        let spec = DeviceSpec {
            name,
            // Modest numbers for a consumer gamepad: the wall spring saturates
            // the rumble long before these limits matter.
            max_stiffness: 1000.0,
            max_force: 10.0,
            workspace_radius: config.workspace_radius,
        };

        Ok(Self {
            gilrs,
            id,
            spec,
            rumble: None,
            rumble_on: false,
            last_position: DVec3::ZERO,
            last_sample_at: None,
        })
    }
}

impl HapticDevice for GamepadDevice {
    fn spec(&self) -> &DeviceSpec {
        &self.spec
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        // The gilrs context established in acquire is the channel; nothing
        // further to open, but a vanished gamepad is detected here.
        if !self.gilrs.gamepad(self.id).is_connected() {
            return Err(DeviceError::Io("gamepad disconnected before open".to_string()));
        }
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), DeviceError> {
        let ff_capable = self.gilrs.gamepad(self.id).is_ff_supported();
        if !ff_capable {
            warn!("gamepad has no rumble support, forces will not be felt");
            return Ok(());
        }
        let effect = EffectBuilder::new()
            .add_effect(BaseEffect {
                kind: BaseEffectType::Strong { magnitude: 40_000 },
                scheduling: Replay {
                    play_for: Ticks::from_ms(100),
                    with_delay: Ticks::from_ms(0),
                    ..Default::default()
                },
                ..Default::default()
            })
            .gamepads(&[self.id])
            .finish(&mut self.gilrs)
            .map_err(|e| DeviceError::Io(e.to_string()))?;
        self.rumble = Some(effect);
        debug!("rumble effect uploaded");
        Ok(())
    }

    fn sample(&mut self) -> Result<DeviceSample, DeviceError> {
        // Drain pending events so the cached gamepad state is current.
        while self.gilrs.next_event().is_some() {}

        let now = Instant::now();
        let (position, switch_pressed) = {
            let gamepad = self.gilrs.gamepad(self.id);
            if !gamepad.is_connected() {
                return Err(DeviceError::Io("gamepad disconnected".to_string()));
            }
            let radius = self.spec.workspace_radius;
            let position = DVec3::new(
                f64::from(gamepad.value(Axis::RightStickY)) * radius,
                f64::from(gamepad.value(Axis::LeftStickX)) * radius,
                f64::from(gamepad.value(Axis::LeftStickY)) * radius,
            );
            (position, gamepad.is_pressed(Button::South))
        };

        let velocity = match self.last_sample_at {
            Some(last) => {
                let dt = now.duration_since(last).as_secs_f64();
                if dt > 0.0 && dt < MAX_VELOCITY_DT {
                    (position - self.last_position) / dt
                } else {
                    DVec3::ZERO
                }
            }
            None => DVec3::ZERO,
        };
        self.last_position = position;
        self.last_sample_at = Some(now);

        Ok(DeviceSample {
            position,
            velocity,
            switch_pressed,
        })
    }

    fn actuate(&mut self, force: DVec3) -> Result<(), DeviceError> {
        let Some(rumble) = &self.rumble else {
            return Ok(());
        };
        let magnitude = force.length();
        if !self.rumble_on && magnitude > RUMBLE_ON_THRESHOLD {
            rumble.play().map_err(|e| DeviceError::Io(e.to_string()))?;
            self.rumble_on = true;
        } else if self.rumble_on && magnitude < RUMBLE_OFF_THRESHOLD {
            rumble.stop().map_err(|e| DeviceError::Io(e.to_string()))?;
            self.rumble_on = false;
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(rumble) = self.rumble.take() {
            if self.rumble_on {
                if let Err(e) = rumble.stop() {
                    debug!("could not stop rumble on close: {}", e);
                }
            }
        }
        self.rumble_on = false;
    }
}
