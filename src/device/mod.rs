//! Force-feedback device access.
//!
//! The rest of the application only sees the narrow [`HapticDevice`] contract:
//! discover, acquire, open, initialize, sample, actuate, close. Two backends
//! implement it:
//!
//! 1. [`gamepad`] - a gilrs-backed gamepad, sticks mapped into the workspace
//! 2. [`sim`] - a deterministic simulated device for tests and hardware-free runs
//!
//! Device failures are never fatal to the process; they disable force feedback
//! for the session and the render loop carries on.

pub mod gamepad;
pub mod sim;
mod session;
mod types;

pub use session::{acquire, discover, DeviceSession, HapticDevice};
pub use types::{DeviceError, DeviceInfo, DeviceSample, DeviceSpec};
