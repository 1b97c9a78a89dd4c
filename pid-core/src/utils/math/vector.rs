//! Vector helpers shared by the error-signal strategies and actuator sinks.
//!
//! All functions are total: degenerate inputs (zero vectors, negative limits)
//! collapse to a neutral result instead of producing NaN.
//!
//! # Example
//! ```rust
//! use glam::Vec3;
//! use pid_core::utils::math::vector::clamp_magnitude;
//! let v = clamp_magnitude(Vec3::new(30.0, 40.0, 0.0), 10.0);
//! assert!((v.length() - 10.0).abs() < 1e-5);
//! ```

use core::f32::consts::PI;

use glam::{Mat3, Quat, Vec3};
use libm;

/// Squared-length threshold below which a vector is treated as zero.
const EPSILON_SQ: f32 = 1e-15;

/// Scale `v` down to `max` if it is longer, otherwise return it unchanged.
///
/// A negative `max` is treated as zero.
pub fn clamp_magnitude(
    v: Vec3,
    max: f32,
) -> Vec3 {
    let max = max.max(0.0);
    if v.length_squared() > max * max {
        v.normalize_or_zero() * max
    } else {
        v
    }
}

/// Cap a velocity at `max_speed`. Used by sinks, never by the controllers.
pub fn cap_velocity(
    velocity: Vec3,
    max_speed: f32,
) -> Vec3 {
    clamp_magnitude(velocity, max_speed)
}

/// Angle between two vectors in degrees, `0` when either is (near) zero.
pub fn angle_between(
    a: Vec3,
    b: Vec3,
) -> f32 {
    let (a_sq, b_sq) = (a.length_squared(), b.length_squared());
    if a_sq < EPSILON_SQ || b_sq < EPSILON_SQ {
        return 0.0;
    }
    let cos = (a.dot(b) / libm::sqrtf(a_sq * b_sq)).clamp(-1.0, 1.0);
    libm::acosf(cos) * (180.0 / PI)
}

/// Remove the component of `v` along `normal`.
pub fn project_on_plane(
    v: Vec3,
    normal: Vec3,
) -> Vec3 {
    let sq = normal.length_squared();
    if sq < EPSILON_SQ {
        return v;
    }
    v - normal * (v.dot(normal) / sq)
}

/// Rotation whose +Z axis points along `forward` and whose +Y axis is as
/// close to `up` as possible.
///
/// Returns `None` when `forward` is zero. If `forward` is parallel to `up`,
/// world +Z (or +X) is used as the secondary axis instead.
pub fn look_rotation(
    forward: Vec3,
    up: Vec3,
) -> Option<Quat> {
    let z = forward.try_normalize()?;
    let x = up
        .cross(z)
        .try_normalize()
        .or_else(|| Vec3::Z.cross(z).try_normalize())
        .or_else(|| Vec3::X.cross(z).try_normalize())?;
    let y = z.cross(x);
    Some(Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize())
}

/// Slerp `current` toward `target` by `speed * dt`, saturating at the target.
pub fn turn_toward(
    current: Quat,
    target: Quat,
    speed: f32,
    dt: f32,
) -> Quat {
    let t = (speed * dt).clamp(0.0, 1.0);
    current.slerp(target, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_magnitude_short_vector_untouched() {
        let v = Vec3::new(1.0, 2.0, 2.0);
        assert_eq!(clamp_magnitude(v, 5.0), v);
    }

    #[test]
    fn test_clamp_magnitude_long_vector_scaled() {
        let v = clamp_magnitude(Vec3::new(0.0, 0.0, -200.0), 100.0);
        assert!((v - Vec3::new(0.0, 0.0, -100.0)).length() < 1e-4);
    }

    #[test]
    fn test_clamp_magnitude_negative_limit() {
        assert_eq!(clamp_magnitude(Vec3::ONE, -3.0), Vec3::ZERO);
    }

    #[test]
    fn test_angle_between() {
        assert!((angle_between(Vec3::X, Vec3::Y) - 90.0).abs() < 1e-4);
        assert!(angle_between(Vec3::Y, Vec3::Y).abs() < 1e-3);
        assert_eq!(angle_between(Vec3::ZERO, Vec3::Y), 0.0);
        assert_eq!(angle_between(Vec3::X * 1e-9, Vec3::Y * 1e6), 0.0);
        assert!((angle_between(Vec3::X * 1e-3, Vec3::Y * 1e-3) - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_project_on_plane() {
        let p = project_on_plane(Vec3::new(1.0, 5.0, 0.0), Vec3::Y);
        assert!((p - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_look_rotation_identity() {
        let q = look_rotation(Vec3::Z, Vec3::Y).unwrap();
        assert!((q * Vec3::Z - Vec3::Z).length() < 1e-5);
        assert!((q * Vec3::Y - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_look_rotation_points_forward() {
        let dir = Vec3::new(1.0, 0.0, 1.0);
        let q = look_rotation(dir, Vec3::Y).unwrap();
        assert!((q * Vec3::Z - dir.normalize()).length() < 1e-5);
        assert!(look_rotation(Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn test_look_rotation_parallel_to_up() {
        let q = look_rotation(Vec3::Y, Vec3::Y).unwrap();
        assert!((q * Vec3::Z - Vec3::Y).length() < 1e-5);
    }
}
