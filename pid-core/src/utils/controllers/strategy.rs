//! Error-signal construction and output post-processing per actuator archetype.
//!
//! Every function here is pure: current and target state in, error or
//! corrected output out. The error is rebuilt each tick and never stored.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::utils::math::{pose::Pose, vector};

/// Rotation axis that turns `current_up` toward `target_up`.
///
/// Its length is the sine of the tilt, so the error vanishes when aligned.
pub fn orientation_error(
    current_up: Vec3,
    target_up: Vec3,
) -> Vec3 {
    current_up.cross(target_up.normalize_or_zero())
}

/// Offset between the follow point (target position plus an offset in the
/// target's frame) and the current position.
pub fn position_error(
    target: &Pose,
    local_offset: Vec3,
    current_position: Vec3,
) -> Vec3 {
    target.position + target.transform_direction(local_offset) - current_position
}

/// Positive when the actuator point sits below its desired height.
pub fn height_error(
    desired_height: f32,
    measured_distance: f32,
) -> f32 {
    desired_height - measured_distance
}

/// Rotation axis that turns `current_forward` toward `direction_to_target`.
pub fn bearing_error(
    current_forward: Vec3,
    direction_to_target: Vec3,
) -> Vec3 {
    current_forward.cross(direction_to_target.normalize_or_zero())
}

/// Offset between a world-space goal and the current position.
pub fn follow_error(
    desired_world_position: Vec3,
    current_position: Vec3,
) -> Vec3 {
    desired_world_position - current_position
}

/// Thrusters can only push away from the ground.
pub fn floor_at_zero(output: f32) -> f32 {
    output.max(0.0)
}

/// Explicit Euler step of a velocity over `dt`.
pub fn euler_step(
    velocity: Vec3,
    dt: f32,
) -> Vec3 {
    velocity * dt
}

/// How the sink should interpret a post-processed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Angular acceleration about a world-space axis.
    Torque,
    /// Linear acceleration.
    Force,
    /// Position delta to add directly (kinematic integration).
    Displacement,
}

/// Post-processed controller output handed to an actuator sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub kind: OutputKind,
    pub value: Vec3,
}

/// Closed set of vector-valued actuator archetypes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    /// Keep the body's up axis aligned with `target_up`.
    OrientationHold { target_up: Vec3 },
    /// Follow a target at `offset` (target frame), force clamped to `max_force`.
    PositionFollow { offset: Vec3, max_force: f32 },
    /// Steer the forward axis toward the target. `planar` drops the vertical
    /// component of the bearing for yaw-only steering.
    BearingTrack { planar: bool },
    /// Kinematic follow at `offset` (target frame), speed clamped to `max_speed`.
    CameraFollow { offset: Vec3, max_speed: f32 },
}

impl Strategy {
    /// Whether an error can be formed without a target pose.
    pub fn requires_target(&self) -> bool {
        !matches!(self, Strategy::OrientationHold { .. })
    }

    pub fn output_kind(&self) -> OutputKind {
        match self {
            Strategy::OrientationHold { .. } | Strategy::BearingTrack { .. } => OutputKind::Torque,
            Strategy::PositionFollow { .. } => OutputKind::Force,
            Strategy::CameraFollow { .. } => OutputKind::Displacement,
        }
    }

    /// Build this tick's error vector. `None` if a needed target is missing.
    pub fn error(
        &self,
        body: &Pose,
        target: Option<&Pose>,
    ) -> Option<Vec3> {
        match *self {
            Strategy::OrientationHold { target_up } => {
                Some(orientation_error(body.up(), target_up))
            }
            Strategy::PositionFollow { offset, .. } => {
                target.map(|t| position_error(t, offset, body.position))
            }
            Strategy::BearingTrack { planar } => target.map(|t| {
                let mut direction = t.position - body.position;
                if planar {
                    direction.y = 0.0;
                }
                bearing_error(body.forward(), direction)
            }),
            Strategy::CameraFollow { offset, .. } => {
                target.map(|t| follow_error(t.transform_point(offset), body.position))
            }
        }
    }

    /// Turn the raw PID vector into the value the sink consumes.
    pub fn post_process(
        &self,
        raw: Vec3,
        dt: f32,
    ) -> Command {
        let value = match *self {
            Strategy::OrientationHold { .. } | Strategy::BearingTrack { .. } => raw,
            Strategy::PositionFollow { max_force, .. } => vector::clamp_magnitude(raw, max_force),
            Strategy::CameraFollow { max_speed, .. } => {
                euler_step(vector::clamp_magnitude(raw, max_speed), dt)
            }
        };
        Command {
            kind: self.output_kind(),
            value,
        }
    }

    /// Position a follower should snap to on (re)initialization, if any.
    pub fn snap_position(
        &self,
        target: &Pose,
    ) -> Option<Vec3> {
        match *self {
            Strategy::CameraFollow { offset, .. } => Some(target.transform_point(offset)),
            _ => None,
        }
    }
}
