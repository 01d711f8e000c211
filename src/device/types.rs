use glam::DVec3;

/// One instantaneous reading from a device.
///
/// Produced by every haptic loop iteration and consumed immediately; nothing
/// here is persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSample {
    /// End-effector position in meters, device frame.
    pub position: DVec3,
    /// Linear velocity in m/s.
    pub velocity: DVec3,
    /// State of the user switch on the end effector.
    pub switch_pressed: bool,
}

/// Static capabilities reported by a device after acquisition.
#[derive(Debug, Clone)]
pub struct DeviceSpec {
    pub name: String,
    /// Maximum closed-loop stiffness the device can render, in N/m.
    pub max_stiffness: f64,
    /// Maximum continuous force the device accepts, in N. Commanded forces
    /// are clamped to this before actuation.
    pub max_force: f64,
    /// Radius of the reachable workspace, in meters.
    pub workspace_radius: f64,
}

/// Description of a device found during discovery, before it is acquired.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
}

/// Errors from the device layer.
///
/// All of these are terminal for force feedback only: the caller logs them,
/// drops the session, and keeps rendering.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Zero devices enumerated, or an acquire index out of range.
    #[error("no haptic device available: {0}")]
    NoDevice(String),

    /// The physical link could not be established or broke mid-session.
    #[error("device I/O failed: {0}")]
    Io(String),

    /// The backend library itself failed to come up.
    #[error("device backend error: {0}")]
    Backend(String),
}
