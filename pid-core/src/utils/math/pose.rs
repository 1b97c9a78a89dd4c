//! Rigid pose (position + orientation) as reported by the host's scene layer.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World-space position and orientation of a body or target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(
        position: Vec3,
        rotation: Quat,
    ) -> Self {
        Self { position, rotation }
    }

    /// Pose at `position` with identity rotation.
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Local +Y in world space.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Local +Z in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Frame-relative offset to world space.
    pub fn transform_point(
        &self,
        local: Vec3,
    ) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Frame-relative direction to world space (no translation).
    pub fn transform_direction(
        &self,
        local: Vec3,
    ) -> Vec3 {
        self.rotation * local
    }
}
