//! Actuator controllers: an axis bundle plus a strategy plus a phase.
//!
//! Two shapes exist. [`VectorController`] drives one 3D output (torque,
//! force or displacement) through one of the [`Strategy`] variants.
//! [`AltitudeHold`] drives `N` independent thrusters, one scalar each.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{
    bundle::{AxisBundle, Vec3Bundle},
    pid::Gains,
    strategy::{self, Command, Strategy},
};
use crate::utils::math::{pose::Pose, vector};

/// Lifecycle of an actuator controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Inactive,
    Tracking,
}

/// What a vector controller sees on one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub body: Pose,
    pub target: Option<Pose>,
}

/// Three-axis controller for one actuator.
#[derive(Debug, Clone)]
pub struct VectorController {
    strategy: Strategy,
    gains: Gains,
    bundle: Vec3Bundle,
    phase: Phase,
}

impl VectorController {
    /// New controller in the `Inactive` phase.
    pub fn new(
        strategy: Strategy,
        gains: Gains,
    ) -> Self {
        Self {
            strategy,
            gains,
            bundle: Vec3Bundle::new(),
            phase: Phase::Inactive,
        }
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn gains(&self) -> Gains {
        self.gains
    }

    /// Retune in place. Controller state is kept.
    pub fn set_gains(
        &mut self,
        gains: Gains,
    ) {
        self.gains = gains;
    }

    /// Change the up direction an orientation hold aims for.
    pub fn set_target_up(
        &mut self,
        up: Vec3,
    ) {
        if let Strategy::OrientationHold { target_up } = &mut self.strategy {
            *target_up = up;
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn bundle(&self) -> &Vec3Bundle {
        &self.bundle
    }

    /// Enter `Tracking` with cleared state (enable, reuse from a pool).
    pub fn activate(&mut self) {
        tracing::debug!(from = ?self.phase, "controller activated");
        self.bundle.reset_all();
        self.phase = Phase::Tracking;
    }

    /// A new target was assigned. Always clears state, even when tracking.
    pub fn acquire(&mut self) {
        tracing::debug!(from = ?self.phase, "target acquired");
        self.bundle.reset_all();
        self.phase = Phase::Tracking;
    }

    /// Target lost or actuator disabled.
    pub fn release(&mut self) {
        tracing::debug!(from = ?self.phase, "controller released");
        self.bundle.reset_all();
        self.phase = Phase::Inactive;
    }

    pub fn reset(&mut self) {
        self.bundle.reset_all();
    }

    /// Teleport point for followers plus a state reset.
    ///
    /// Returns `None` (and leaves state alone) for strategies that do not
    /// snap.
    pub fn snap(
        &mut self,
        target: &Pose,
    ) -> Option<Vec3> {
        let position = self.strategy.snap_position(target)?;
        tracing::debug!(?position, "follower snapped to goal");
        self.bundle.reset_all();
        Some(position)
    }

    /// Advance one tick.
    ///
    /// Inactive controllers output nothing. A tracking controller that needs
    /// a target and has none releases itself.
    pub fn tick(
        &mut self,
        observation: &Observation,
        dt: f32,
    ) -> Option<Command> {
        if self.phase == Phase::Inactive {
            return None;
        }
        if self.strategy.requires_target() && observation.target.is_none() {
            self.release();
            return None;
        }
        let error = self.strategy.error(&observation.body, observation.target.as_ref())?;
        let raw = self.bundle.update_vec3(error, dt, self.gains);
        let command = self.strategy.post_process(raw, dt);
        tracing::trace!(?error, ?command, "vector tick");
        Some(command)
    }
}

/// Ground-probe result for one thruster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundHit {
    pub distance: f32,
    pub normal: Vec3,
}

/// Hover rig parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoverParams {
    pub hover_height: f32,
    pub hover_force: f32,
    /// Degrees of tilt tolerated before the righting torque kicks in.
    pub tilt_limit: f32,
}

impl Default for HoverParams {
    fn default() -> Self {
        Self {
            hover_height: 1.5,
            hover_force: 4.0,
            tilt_limit: 30.0,
        }
    }
}

/// Probe reach as a multiple of the hover height.
pub const PROBE_RANGE_FACTOR: f32 = 1.5;

/// Per-tick output of an [`AltitudeHold`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverOutput<const N: usize> {
    /// Upward acceleration per thruster, never negative.
    pub thrust: [f32; N],
    /// Mean normal of the probes that hit, `Vec3::Y` if none did.
    pub ground_normal: Vec3,
    pub contacts: usize,
}

impl<const N: usize> HoverOutput<N> {
    pub fn airborne(&self) -> bool {
        self.contacts == 0
    }
}

/// Scalar height hold over `N` thrusters.
#[derive(Debug, Clone)]
pub struct AltitudeHold<const N: usize> {
    params: HoverParams,
    gains: Gains,
    bundle: AxisBundle<N>,
}

impl<const N: usize> AltitudeHold<N> {
    pub fn new(
        params: HoverParams,
        gains: Gains,
    ) -> Self {
        Self {
            params,
            gains,
            bundle: AxisBundle::new(),
        }
    }

    pub fn params(&self) -> &HoverParams {
        &self.params
    }

    pub fn bundle(&self) -> &AxisBundle<N> {
        &self.bundle
    }

    /// Maximum distance a thruster probe should reach.
    pub fn probe_range(&self) -> f32 {
        self.params.hover_height * PROBE_RANGE_FACTOR
    }

    pub fn reset(&mut self) {
        self.bundle.reset_all();
    }

    /// Advance one tick. A thruster without ground contact is reset, not skipped.
    pub fn tick(
        &mut self,
        probes: &[Option<GroundHit>; N],
        dt: f32,
    ) -> HoverOutput<N> {
        let mut thrust = [0.0; N];
        let mut normal_sum = Vec3::ZERO;
        let mut contacts = 0;

        for (i, probe) in probes.iter().enumerate() {
            match probe {
                Some(hit) => {
                    let error = strategy::height_error(self.params.hover_height, hit.distance);
                    let raw = self
                        .bundle
                        .update_axis(i, error, dt, self.gains)
                        .unwrap_or_default();
                    thrust[i] = self.params.hover_force * strategy::floor_at_zero(raw);
                    normal_sum += hit.normal;
                    contacts += 1;
                }
                None => {
                    if !self.bundle.unit(i).is_some_and(|u| u.is_at_rest()) {
                        tracing::debug!(thruster = i, "ground contact lost");
                    }
                    self.bundle.reset_axis(i);
                }
            }
        }

        let ground_normal = if contacts > 0 {
            (normal_sum / contacts as f32).try_normalize().unwrap_or(Vec3::Y)
        } else {
            Vec3::Y
        };
        tracing::trace!(?thrust, contacts, "hover tick");

        HoverOutput {
            thrust,
            ground_normal,
            contacts,
        }
    }

    /// Righting torque for this rig's tilt limit.
    pub fn stabilize(
        &self,
        body_up: Vec3,
    ) -> Option<Vec3> {
        righting_torque(body_up, self.params.tilt_limit)
    }
}

/// Angular acceleration pulling `body_up` back to world up once it tilts
/// more than `tilt_limit` degrees. Scales with half the tilt angle.
pub fn righting_torque(
    body_up: Vec3,
    tilt_limit: f32,
) -> Option<Vec3> {
    let angle = vector::angle_between(body_up, Vec3::Y);
    (angle > tilt_limit).then(|| body_up.cross(Vec3::Y) * (angle * 0.5))
}

/// Forward direction flattened onto the ground plane.
pub fn slope_move_direction(
    forward: Vec3,
    ground_normal: Vec3,
) -> Vec3 {
    vector::project_on_plane(forward, ground_normal).normalize_or_zero()
}
