//! Minimal rigid-body plant standing in for a physics engine.

use glam::{Quat, Vec3};
use pid_core::utils::{math::vector, Pose};

pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Point mass with orientation.
#[derive(Debug, Clone, Copy)]
pub struct RigidBody {
    pub pose: Pose,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub mass: f32,
    /// Scalar moment of inertia dividing every torque.
    pub inertia: f32,
    pub max_angular_speed: f32,
    pub use_gravity: bool,
}

impl RigidBody {
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            linear_damping: 0.0,
            angular_damping: 0.05,
            mass: 1.0,
            inertia: 1.0,
            max_angular_speed: 50.0,
            use_gravity: false,
        }
    }

    /// Torque produced by a force applied at a world-space point.
    pub fn torque_at(
        &self,
        force: Vec3,
        point: Vec3,
    ) -> Vec3 {
        (point - self.pose.position).cross(force)
    }

    /// Semi-implicit Euler step. Gravity is applied on top of `force`.
    pub fn step(
        &mut self,
        force: Vec3,
        torque: Vec3,
        dt: f32,
    ) {
        let gravity = if self.use_gravity { GRAVITY } else { Vec3::ZERO };
        self.velocity += (force / self.mass + gravity) * dt;
        self.velocity *= 1.0 / (1.0 + self.linear_damping * dt);

        self.angular_velocity += torque / self.inertia * dt;
        self.angular_velocity *= 1.0 / (1.0 + self.angular_damping * dt);
        self.angular_velocity = vector::clamp_magnitude(self.angular_velocity, self.max_angular_speed);

        self.pose.position += self.velocity * dt;
        self.pose.rotation =
            (Quat::from_scaled_axis(self.angular_velocity * dt) * self.pose.rotation).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falls_under_gravity() {
        let mut body = RigidBody::new(Pose::at(Vec3::new(0.0, 10.0, 0.0)));
        body.use_gravity = true;
        for _ in 0..10 {
            body.step(Vec3::ZERO, Vec3::ZERO, 0.1);
        }
        assert!(body.pose.position.y < 10.0);
        assert!(body.velocity.y < 0.0);
    }

    #[test]
    fn test_torque_at_offset_point() {
        let body = RigidBody::new(Pose::IDENTITY);
        let t = body.torque_at(Vec3::Y, Vec3::X);
        assert_eq!(t, Vec3::Z);
    }
}
