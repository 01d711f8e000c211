//! Haptic thread lifecycle: spawn and coordinated shutdown.
//!
//! The coordinator owns the only path to closing the device. `shutdown`
//! clears the running flag, waits for the loop to report finished, joins the
//! thread to take the session back, and closes it last. That ordering is the
//! core invariant of the whole program: the device handle is never closed
//! while the loop might still call `sample` or `actuate` on it.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::force::WallSpring;
use super::haptic_loop::HapticLoop;
use super::rt;
use super::shared::{SharedDisplayState, SimulationFlags};
use crate::device::DeviceSession;

/// Granularity of the finished-flag poll during shutdown.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);
/// Upper bound on the poll before falling through to join, so a wedged loop
/// cannot hang process exit forever.
const SHUTDOWN_WAIT_CAP: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum HapticError {
    #[error("failed to spawn haptic thread: {0}")]
    Thread(String),
}

/// Handle to the running haptic thread; consuming it is the only way to stop
/// the loop and close the device.
pub struct HapticHandle {
    flags: Arc<SimulationFlags>,
    thread: thread::JoinHandle<Option<DeviceSession>>,
}

impl HapticHandle {
    /// Marks the simulation running and spawns the loop on a dedicated,
    /// real-time-promoted thread. `session` may be `None`; the loop then
    /// idles cheaply but still participates in the shutdown protocol.
    pub fn spawn(
        session: Option<DeviceSession>,
        force_law: WallSpring,
        shared: Arc<SharedDisplayState>,
        flags: Arc<SimulationFlags>,
    ) -> Result<Self, HapticError> {
        flags.start();
        let loop_flags = Arc::clone(&flags);
        let thread = thread::Builder::new()
            .name("haptic-loop".to_string())
            .spawn(move || {
                rt::promote_current_thread();
                HapticLoop::create(session, force_law, shared, loop_flags)
                    .start()
                    .run()
            })
            .map_err(|e| HapticError::Thread(e.to_string()))?;
        Ok(Self { flags, thread })
    }

    /// Requests cooperative stop, waits for completion, then closes the
    /// device. Returns the closed session for inspection.
    pub fn shutdown(self) -> Option<DeviceSession> {
        info!("requesting haptic loop stop");
        self.flags.request_stop();

        let mut waited = Duration::ZERO;
        while !self.flags.is_finished() {
            if waited >= SHUTDOWN_WAIT_CAP {
                warn!("haptic loop did not report finished within {:?}, joining anyway", waited);
                break;
            }
            thread::sleep(SHUTDOWN_POLL);
            waited += SHUTDOWN_POLL;
        }

        match self.thread.join() {
            Ok(Some(mut session)) => {
                session.close();
                Some(session)
            }
            Ok(None) => {
                debug!("haptic loop exited with no device attached");
                None
            }
            Err(_) => {
                error!("haptic loop thread panicked; no session to close");
                None
            }
        }
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
    fn shutdown_closes_the_device_after_the_loop_finished() {
        let shared = Arc::new(SharedDisplayState::default());
        let flags = Arc::new(SimulationFlags::default());
        let handle = HapticHandle::spawn(
            Some(sim_session()),
            WallSpring::default(),
            shared,
            Arc::clone(&flags),
        )
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        assert!(flags.is_running());
        assert!(!flags.is_finished());

        let session = handle.shutdown().expect("session returned");
        assert!(flags.is_finished(), "shutdown returned before the loop exited");
        assert!(session.is_closed());
    }

    #[test]
    fn shutdown_without_device_is_clean() {
        let shared = Arc::new(SharedDisplayState::default());
        let flags = Arc::new(SimulationFlags::default());
        let handle =
            HapticHandle::spawn(None, WallSpring::default(), shared, Arc::clone(&flags)).unwrap();

        thread::sleep(Duration::from_millis(20));
        assert!(handle.shutdown().is_none());
        assert!(flags.is_finished());
    }

    #[test]
    fn spawn_sets_the_running_flag_before_the_loop_starts() {
        let shared = Arc::new(SharedDisplayState::default());
        let flags = Arc::new(SimulationFlags::default());
        let handle =
            HapticHandle::spawn(None, WallSpring::default(), shared, Arc::clone(&flags)).unwrap();
        assert!(flags.is_running());
        handle.shutdown();
    }
}
