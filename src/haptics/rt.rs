//! Best-effort real-time promotion for the haptic thread.
//!
//! A force-feedback loop goes unstable when its update rate drops too low for
//! the stiffness it renders, so the loop thread asks for the highest
//! schedulable priority available. Failure is expected without the right
//! capabilities and is never fatal.

#[cfg(unix)]
pub fn promote_current_thread() {
    use libc::{sched_param, sched_setscheduler, SCHED_FIFO};

    let param = sched_param { sched_priority: 80 };
    // SAFETY: sched_setscheduler only reads the param struct; pid 0 targets
    // the calling thread.
    let rc = unsafe { sched_setscheduler(0, SCHED_FIFO, &param) };
    if rc != 0 {
        // Usually EPERM without CAP_SYS_NICE.
        tracing::warn!("haptic thread stays at normal priority (SCHED_FIFO denied)");
    } else {
        tracing::debug!("haptic thread promoted to SCHED_FIFO priority 80");
    }
}

#[cfg(not(unix))]
pub fn promote_current_thread() {
    tracing::debug!("real-time thread promotion not implemented on this platform");
}
