//! The free-running haptic update loop.
//!
//! Each iteration samples the device, evaluates the wall-spring law, clamps
//! the command to the device's force limit, actuates, publishes the sample to
//! the shared display state and ticks the rate estimator. There is no
//! inter-iteration delay; the rate is bounded only by device I/O latency.
//!
//! The typestate split keeps device access out of the idle phase: a loop is
//! built `Idle`, and only the `Running` state has the body that touches the
//! session. With no session attached the body is skipped with a cheap check
//! every iteration - the thread still honors the stop flag and never touches
//! a device it does not have.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use statum::{machine, state, transition};
use tracing::{debug, info, warn};

use super::force::{clamp_force, WallSpring};
use super::shared::{RateEstimator, SharedDisplayState, SimulationFlags};
use crate::device::DeviceSession;

/// Sleep applied only on the no-device path, so an idle loop does not spin a
/// core at 100%.
const IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// Device I/O errors are logged on the first occurrence and then once per
/// this many repeats; the loop itself never dies from them.
const IO_ERROR_LOG_EVERY: u64 = 1000;

#[state]
#[derive(Debug, Clone)]
pub enum SimulationState {
    Idle,
    Running,
}

#[machine]
pub struct HapticLoop<SimulationState> {
    session: Option<DeviceSession>,
    force_law: WallSpring,
    shared: Arc<SharedDisplayState>,
    flags: Arc<SimulationFlags>,
}

impl HapticLoop<Idle> {
    /// Builds an idle loop. `session` is `None` when discovery or open failed;
    /// the loop then runs as a stop-flag-only shell.
    pub fn create(
        session: Option<DeviceSession>,
        force_law: WallSpring,
        shared: Arc<SharedDisplayState>,
        flags: Arc<SimulationFlags>,
    ) -> Self {
        Self::builder()
            .session(session)
            .force_law(force_law)
            .shared(shared)
            .flags(flags)
            .build()
    }
}

#[transition]
impl HapticLoop<Idle> {
    pub fn start(self) -> HapticLoop<Running> {
        info!(
            "starting haptic loop (device attached: {})",
            self.session.is_some()
        );
        self.transition()
    }
}

impl HapticLoop<Running> {
    /// Runs until the stop flag is observed false, then marks the simulation
    /// finished and hands the session back for closing.
    ///
    /// Phases: while `running` holds the body executes every iteration; once
    /// the flag is observed false the body is never entered again (draining);
    /// setting `finished` is the single terminal action.
    pub fn run(mut self) -> Option<DeviceSession> {
        let force_limit = self
            .session
            .as_ref()
            .map(|session| session.spec().max_force)
            .unwrap_or(0.0);
        let mut rate = RateEstimator::new(Instant::now());
        let mut io_errors: u64 = 0;

        while self.flags.is_running() {
            let Some(session) = self.session.as_mut() else {
                thread::sleep(IDLE_BACKOFF);
                continue;
            };

            match session.sample() {
                Ok(sample) => {
                    let force = clamp_force(self.force_law.force(sample.position), force_limit);
                    if let Err(e) = session.actuate(force) {
                        io_errors += 1;
                        if io_errors == 1 || io_errors % IO_ERROR_LOG_EVERY == 0 {
                            warn!("force command failed ({} so far): {}", io_errors, e);
                        }
                    }
                    self.shared.publish_sample(&sample);
                }
                Err(e) => {
                    io_errors += 1;
                    if io_errors == 1 || io_errors % IO_ERROR_LOG_EVERY == 0 {
                        warn!("device sample failed ({} so far): {}", io_errors, e);
                    }
                }
            }

            if let Some(rate_hz) = rate.tick(Instant::now()) {
                self.shared.publish_rate(rate_hz);
                debug!("haptic rate: {} Hz", rate_hz);
            }
        }

        info!("haptic loop drained after stop request ({} I/O errors)", io_errors);
        self.flags.mark_finished();
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendKind, DeviceConfig};
    use crate::device;

    fn sim_session() -> DeviceSession {
        let config = DeviceConfig {
            backend: BackendKind::Sim,
            ..DeviceConfig::default()
        };
        let mut session = device::acquire(&config, 0).unwrap();
        session.open().unwrap();
        session.initialize().unwrap();
        session
    }

    #[test]
    fn loop_without_device_stops_cleanly() {
        let shared = Arc::new(SharedDisplayState::default());
        let flags = Arc::new(SimulationFlags::default());
        flags.start();

        let running = HapticLoop::create(None, WallSpring::default(), shared, flags.clone()).start();
        let worker = thread::spawn(move || running.run());

        thread::sleep(Duration::from_millis(20));
        assert!(!flags.is_finished(), "finished before stop was requested");

        flags.request_stop();
        let session = worker.join().unwrap();
        assert!(session.is_none());
        assert!(flags.is_finished());
    }

    #[test]
    fn loop_with_sim_device_publishes_and_returns_session() {
        let shared = Arc::new(SharedDisplayState::default());
        let flags = Arc::new(SimulationFlags::default());
        flags.start();

        let running = HapticLoop::create(
            Some(sim_session()),
            WallSpring::default(),
            shared.clone(),
            flags.clone(),
        )
        .start();
        let worker = thread::spawn(move || running.run());

        // Give the free-running loop time to drive the sim plant off origin.
        thread::sleep(Duration::from_millis(100));
        flags.request_stop();
        let session = worker.join().unwrap().expect("session handed back");

        assert!(flags.is_finished());
        assert!(!session.is_closed(), "loop must not close the device itself");
        let snapshot = shared.snapshot();
        assert!(
            snapshot.position != glam::DVec3::ZERO || snapshot.velocity != glam::DVec3::ZERO,
            "loop never published a sample"
        );
    }

    #[test]
    fn stop_request_before_first_iteration_is_honored() {
        let shared = Arc::new(SharedDisplayState::default());
        let flags = Arc::new(SimulationFlags::default());
        // Never started: the first check observes not-running and drains.
        let running =
            HapticLoop::create(Some(sim_session()), WallSpring::default(), shared, flags.clone())
                .start();
        let session = running.run();
        assert!(flags.is_finished());
        assert!(session.is_some());
    }
}
