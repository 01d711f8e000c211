//! State shared between the haptic loop and the render loop.
//!
//! Per-field atomics, no locks. The haptic loop stores with `Relaxed`; the
//! render loop loads with `Relaxed`. Only eventual visibility is promised: a
//! frame may see a position whose axes come from two different iterations,
//! which at display cadence is invisible and never a safety issue. The
//! shutdown flags are the exception and use acquire/release, because the
//! close-after-exit ordering hangs off them.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use glam::DVec3;

use crate::device::DeviceSample;

/// Last-known device state for the on-screen overlay.
#[derive(Debug, Default)]
pub struct SharedDisplayState {
    position: [AtomicU64; 3],
    velocity: [AtomicU64; 3],
    switch_pressed: AtomicBool,
    rate_hz: AtomicU32,
}

/// One relaxed read of everything the render loop wants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySnapshot {
    pub position: DVec3,
    pub velocity: DVec3,
    pub switch_pressed: bool,
    pub rate_hz: u32,
}

fn store_vec(cells: &[AtomicU64; 3], value: DVec3) {
    cells[0].store(value.x.to_bits(), Ordering::Relaxed);
    cells[1].store(value.y.to_bits(), Ordering::Relaxed);
    cells[2].store(value.z.to_bits(), Ordering::Relaxed);
}

fn load_vec(cells: &[AtomicU64; 3]) -> DVec3 {
    DVec3::new(
        f64::from_bits(cells[0].load(Ordering::Relaxed)),
        f64::from_bits(cells[1].load(Ordering::Relaxed)),
        f64::from_bits(cells[2].load(Ordering::Relaxed)),
    )
}

impl SharedDisplayState {
    /// Publishes one device sample. Haptic loop side.
    pub fn publish_sample(&self, sample: &DeviceSample) {
        store_vec(&self.position, sample.position);
        store_vec(&self.velocity, sample.velocity);
        self.switch_pressed
            .store(sample.switch_pressed, Ordering::Relaxed);
    }

    /// Publishes a completed 1-second rate estimate. Haptic loop side.
    pub fn publish_rate(&self, rate_hz: u32) {
        self.rate_hz.store(rate_hz, Ordering::Relaxed);
    }

    /// Reads the current state. Render loop side.
    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            position: load_vec(&self.position),
            velocity: load_vec(&self.velocity),
            switch_pressed: self.switch_pressed.load(Ordering::Relaxed),
            rate_hz: self.rate_hz.load(Ordering::Relaxed),
        }
    }
}

/// Cooperative shutdown flags.
///
/// `running` is written only by the coordinator and read by the loop every
/// iteration; `finished` is written exactly once by the loop after its final
/// check. Invariant: `finished` becomes true only after the loop has observed
/// `running == false` and exited, and the device is closed only after
/// `finished` is observed true.
#[derive(Debug, Default)]
pub struct SimulationFlags {
    running: AtomicBool,
    finished: AtomicBool,
}

impl SimulationFlags {
    /// Marks the simulation running. Coordinator side, before spawn.
    pub fn start(&self) {
        self.running.store(true, Ordering::Release);
    }

    /// Requests cooperative stop. Coordinator side.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Checked by the loop at the top of every iteration.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Set by the loop exactly once, after it has exited.
    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

/// Rolling 1-second iteration counter for the haptic update rate.
///
/// Counts `tick` calls; when a full second has elapsed since the window
/// started, the count is reported and the window resets.
#[derive(Debug)]
pub struct RateEstimator {
    window_start: Instant,
    count: u32,
}

const RATE_WINDOW: Duration = Duration::from_secs(1);

impl RateEstimator {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            count: 0,
        }
    }

    /// Counts one iteration; returns the rate when a window completes.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        self.count = self.count.saturating_add(1);
        if now.duration_since(self.window_start) >= RATE_WINDOW {
            let rate = self.count;
            self.count = 0;
            self.window_start = now;
            Some(rate)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_last_publish() {
        let shared = SharedDisplayState::default();
        let sample = DeviceSample {
            position: DVec3::new(0.01, -0.02, 0.003),
            velocity: DVec3::new(0.0, 0.5, -0.5),
            switch_pressed: true,
        };
        shared.publish_sample(&sample);
        shared.publish_rate(950);

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.position, sample.position);
        assert_eq!(snapshot.velocity, sample.velocity);
        assert!(snapshot.switch_pressed);
        assert_eq!(snapshot.rate_hz, 950);
    }

    #[test]
    fn negative_zero_and_specials_survive_the_bit_store() {
        let shared = SharedDisplayState::default();
        let sample = DeviceSample {
            position: DVec3::new(-0.0, f64::MIN_POSITIVE, 1e300),
            velocity: DVec3::ZERO,
            switch_pressed: false,
        };
        shared.publish_sample(&sample);
        assert_eq!(shared.snapshot().position, sample.position);
    }

    #[test]
    fn flags_start_and_stop() {
        let flags = SimulationFlags::default();
        assert!(!flags.is_running());
        assert!(!flags.is_finished());
        flags.start();
        assert!(flags.is_running());
        flags.request_stop();
        assert!(!flags.is_running());
        flags.mark_finished();
        assert!(flags.is_finished());
    }

    #[test]
    fn rate_counts_ticks_per_window() {
        let start = Instant::now();
        let mut estimator = RateEstimator::new(start);
        for i in 1..1000 {
            let now = start + Duration::from_millis(i);
            assert_eq!(estimator.tick(now), None, "window closed early at {i} ms");
        }
        // The tick that crosses the 1 s boundary reports all 1000 iterations.
        let rate = estimator.tick(start + Duration::from_millis(1000));
        assert_eq!(rate, Some(1000));
    }

    #[test]
    fn rate_window_resets_after_reporting() {
        let start = Instant::now();
        let mut estimator = RateEstimator::new(start);
        assert_eq!(estimator.tick(start + Duration::from_secs(1)), Some(1));
        for i in 0..499 {
            let now = start + Duration::from_secs(1) + Duration::from_millis(i * 2);
            assert_eq!(estimator.tick(now), None);
        }
        let rate = estimator.tick(start + Duration::from_secs(2));
        assert_eq!(rate, Some(500));
    }
}
