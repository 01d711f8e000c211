//! Simulated haptic device.
//!
//! A damped point mass driven by a slow sinusoidal excitation and by the last
//! commanded force. The excitation pushes the mass through the Y/Z walls so
//! the wall springs visibly (and numerically) push back, which makes the demo
//! work without hardware and gives tests a deterministic plant: `step` is pure
//! in its inputs, wall-clock time only enters through `sample`.

use std::f64::consts::TAU;
use std::time::Instant;

use glam::DVec3;

use super::session::HapticDevice;
use super::types::{DeviceError, DeviceSample, DeviceSpec};
use crate::config::DeviceConfig;

const MASS_KG: f64 = 0.1;
const DAMPING_N_PER_MPS: f64 = 0.8;
/// Integration is capped to this step so a stalled caller cannot blow up the
/// explicit integrator.
const MAX_STEP_S: f64 = 0.050;

pub struct SimulatedDevice {
    spec: DeviceSpec,
    drive_amplitude: f64,
    drive_frequency_hz: f64,
    position: DVec3,
    velocity: DVec3,
    commanded_force: DVec3,
    switch_pressed: bool,
    elapsed: f64,
    last_sample_at: Option<Instant>,
}

impl SimulatedDevice {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            spec: DeviceSpec {
                name: "simulated haptic device".to_string(),
                max_stiffness: 25_000.0,
                max_force: 40.0,
                workspace_radius: config.workspace_radius,
            },
            drive_amplitude: config.sim.drive_amplitude,
            drive_frequency_hz: config.sim.drive_frequency_hz,
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            commanded_force: DVec3::ZERO,
            switch_pressed: false,
            elapsed: 0.0,
            last_sample_at: None,
        }
    }

    /// Advances the plant by `dt` seconds with semi-implicit Euler.
    fn step(&mut self, dt: f64) {
        let dt = dt.clamp(0.0, MAX_STEP_S);
        if dt == 0.0 {
            return;
        }
        self.elapsed += dt;
        let phase = TAU * self.drive_frequency_hz * self.elapsed;
        // Phase-shifted drives on Y and Z trace a loop that crosses the walls.
        let drive = DVec3::new(
            0.0,
            self.drive_amplitude * phase.sin(),
            self.drive_amplitude * (0.7 * phase).cos(),
        );
        let net = self.commanded_force + drive - self.velocity * DAMPING_N_PER_MPS;
        self.velocity += net / MASS_KG * dt;
        self.position += self.velocity * dt;
    }
}

impl HapticDevice for SimulatedDevice {
    fn spec(&self) -> &DeviceSpec {
        &self.spec
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), DeviceError> {
        self.position = DVec3::ZERO;
        self.velocity = DVec3::ZERO;
        self.commanded_force = DVec3::ZERO;
        self.elapsed = 0.0;
        self.last_sample_at = None;
        Ok(())
    }

    fn sample(&mut self) -> Result<DeviceSample, DeviceError> {
        let now = Instant::now();
        if let Some(last) = self.last_sample_at {
            self.step(now.duration_since(last).as_secs_f64());
        }
        self.last_sample_at = Some(now);
        Ok(DeviceSample {
            position: self.position,
            velocity: self.velocity,
            switch_pressed: self.switch_pressed,
        })
    }

    fn actuate(&mut self, force: DVec3) -> Result<(), DeviceError> {
        self.commanded_force = force;
        Ok(())
    }

    fn close(&mut self) {
        self.commanded_force = DVec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;

    fn quiet_device() -> SimulatedDevice {
        let mut config = DeviceConfig::default();
        config.sim.drive_amplitude = 0.0;
        SimulatedDevice::new(&config)
    }

    #[test]
    fn stepping_is_deterministic() {
        let mut a = SimulatedDevice::new(&DeviceConfig::default());
        let mut b = SimulatedDevice::new(&DeviceConfig::default());
        for _ in 0..1000 {
            a.step(0.001);
            b.step(0.001);
        }
        assert_eq!(a.position, b.position);
        assert_eq!(a.velocity, b.velocity);
    }

    #[test]
    fn commanded_force_moves_the_mass() {
        let mut device = quiet_device();
        device.actuate(DVec3::new(0.0, 1.0, 0.0)).unwrap();
        for _ in 0..100 {
            device.step(0.001);
        }
        assert!(device.velocity.y > 0.0);
        assert!(device.position.y > 0.0);
        assert_eq!(device.position.x, 0.0);
        assert_eq!(device.position.z, 0.0);
    }

    #[test]
    fn at_rest_without_drive_or_force() {
        let mut device = quiet_device();
        for _ in 0..100 {
            device.step(0.001);
        }
        assert_eq!(device.position, DVec3::ZERO);
        assert_eq!(device.velocity, DVec3::ZERO);
    }

    #[test]
    fn oversized_steps_are_capped() {
        let mut device = quiet_device();
        device.actuate(DVec3::new(0.0, 1.0, 0.0)).unwrap();
        device.step(10.0);
        // One capped step at most: velocity stays bounded.
        assert!(device.velocity.y <= 1.0 / MASS_KG * MAX_STEP_S + 1e-9);
    }
}
