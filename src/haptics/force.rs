//! Wall-spring force law.
//!
//! The workspace is unconstrained on X and bounded on Y and Z. Each bound is
//! an independent one-sided spring: past a wall, the restoring force on that
//! axis is proportional to penetration depth; inside (or exactly on) the wall
//! the axis contributes nothing. There is no corner rounding - the four walls
//! never interact.

use glam::DVec3;

/// Default wall stiffness, N/m.
pub const WALL_STIFFNESS: f64 = 10_000.0;
/// Default wall position on Y and Z, meters.
pub const WALL_HALF_EXTENT: f64 = 0.02;

/// Stateless wall-spring parameters. `force` is deterministic and evaluated
/// on every haptic iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallSpring {
    /// Spring stiffness, N/m.
    pub stiffness: f64,
    /// Wall distance from the origin on Y and Z, meters.
    pub half_extent: f64,
}

impl Default for WallSpring {
    fn default() -> Self {
        Self {
            stiffness: WALL_STIFFNESS,
            half_extent: WALL_HALF_EXTENT,
        }
    }
}

impl WallSpring {
    /// Reaction force for a device at `position`.
    ///
    /// Open inequality: exactly on a wall the force is zero.
    pub fn force(&self, position: DVec3) -> DVec3 {
        let bound = self.half_extent;
        let mut force = DVec3::ZERO;

        if position.y > bound {
            force.y = -self.stiffness * (position.y - bound);
        }
        if position.y < -bound {
            force.y = -self.stiffness * (position.y + bound);
        }
        if position.z > bound {
            force.z = -self.stiffness * (position.z - bound);
        }
        if position.z < -bound {
            force.z = -self.stiffness * (position.z + bound);
        }

        force
    }
}

/// Scales `force` down to `limit` newtons if it exceeds it. A non-positive
/// limit disables clamping.
pub fn clamp_force(force: DVec3, limit: f64) -> DVec3 {
    if limit <= 0.0 {
        return force;
    }
    let magnitude = force.length();
    if magnitude > limit {
        force * (limit / magnitude)
    } else {
        force
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn zero_inside_the_box() {
        let law = WallSpring::default();
        for &y in &[-0.02, -0.015, 0.0, 0.015, 0.02] {
            for &z in &[-0.02, 0.0, 0.02] {
                let force = law.force(DVec3::new(0.5, y, z));
                assert_eq!(force, DVec3::ZERO, "expected no force at y={y} z={z}");
            }
        }
    }

    #[test]
    fn x_axis_is_unconstrained() {
        let law = WallSpring::default();
        assert_eq!(law.force(DVec3::new(10.0, 0.0, 0.0)), DVec3::ZERO);
        assert_eq!(law.force(DVec3::new(-10.0, 0.0, 0.0)), DVec3::ZERO);
    }

    #[test]
    fn penetration_on_positive_y() {
        let law = WallSpring::default();
        let force = law.force(DVec3::new(0.0, 0.03, 0.0));
        assert!(close(force.y, -100.0), "got {}", force.y);
        assert_eq!(force.z, 0.0);
        assert_eq!(force.x, 0.0);
    }

    #[test]
    fn penetration_on_negative_y() {
        let law = WallSpring::default();
        let force = law.force(DVec3::new(0.0, -0.03, 0.0));
        assert!(close(force.y, 100.0), "got {}", force.y);
    }

    #[test]
    fn penetration_on_z_mirrors_y() {
        let law = WallSpring::default();
        let above = law.force(DVec3::new(0.0, 0.0, 0.03));
        let below = law.force(DVec3::new(0.0, 0.0, -0.03));
        assert!(close(above.z, -100.0));
        assert!(close(below.z, 100.0));
        assert_eq!(above.y, 0.0);
    }

    #[test]
    fn restoring_force_is_odd_symmetric() {
        let law = WallSpring::default();
        for &y in &[0.021, 0.05, 0.3] {
            let plus = law.force(DVec3::new(0.0, y, 0.0));
            let minus = law.force(DVec3::new(0.0, -y, 0.0));
            assert!(close(plus.y, -minus.y));
        }
    }

    #[test]
    fn corner_engages_both_axes_independently() {
        let law = WallSpring::default();
        let force = law.force(DVec3::new(0.0, 0.03, -0.03));
        assert!(close(force.y, -100.0));
        assert!(close(force.z, 100.0));
    }

    #[test]
    fn clamp_leaves_small_forces_alone() {
        let force = DVec3::new(0.0, -3.0, 4.0);
        assert_eq!(clamp_force(force, 10.0), force);
        assert_eq!(clamp_force(DVec3::ZERO, 10.0), DVec3::ZERO);
    }

    #[test]
    fn clamp_preserves_direction() {
        let clamped = clamp_force(DVec3::new(0.0, -30.0, 40.0), 10.0);
        assert!(close(clamped.length(), 10.0));
        assert!(close(clamped.y / clamped.z, -30.0 / 40.0));
    }

    #[test]
    fn clamp_disabled_by_nonpositive_limit() {
        let force = DVec3::new(0.0, -300.0, 0.0);
        assert_eq!(clamp_force(force, 0.0), force);
    }
}
