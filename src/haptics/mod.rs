//! Haptic simulation core.
//!
//! Layout mirrors the runtime structure:
//!
//! 1. [`force`] - the pure wall-spring force law
//! 2. [`shared`] - atomic state shared between the haptic and render loops
//! 3. [`haptic_loop`] - the free-running sample/force/actuate loop
//! 4. [`handle`] - thread spawn and the shutdown coordinator
//! 5. [`rt`] - best-effort real-time priority for the loop thread
//!
//! The loop runs on its own OS thread at the highest schedulable priority it
//! can get; the render loop only ever touches [`shared`]. The one ordering
//! guarantee in the system is at shutdown: the device session is closed
//! strictly after the loop thread has exited.

pub mod force;
pub mod handle;
pub mod haptic_loop;
pub mod rt;
pub mod shared;

pub use force::WallSpring;
pub use handle::{HapticError, HapticHandle};
pub use shared::{DisplaySnapshot, SharedDisplayState, SimulationFlags};
