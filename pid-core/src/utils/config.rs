//! Rig configuration.
//!
//! A rig is one actuator archetype plus its tuning and the fixed step it
//! runs at. Configurations are JSON documents tagged by `"kind"`:
//!
//! ```json
//! { "step": 0.02, "archetype": { "kind": "camera_follow", "max_speed": 50.0 } }
//! ```
//!
//! Missing fields fall back to the archetype's stock tuning.

use core::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::utils::controllers::{
    archetypes::{AltitudeHold, HoverParams, VectorController},
    pid::Gains,
    strategy::Strategy,
};

/// Fixed step used when a configuration does not name one (50 Hz).
pub const DEFAULT_STEP: f32 = 0.02;

/// Errors raised while loading or validating a configuration.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    NegativeGain { gain: &'static str, value: f32 },
    NonFiniteGain { gain: &'static str },
    InvalidStep(f32),
    InvalidParameter { name: &'static str, value: f32 },
    UnknownArchetype,
}

impl fmt::Display for ConfigError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "invalid configuration: {e}"),
            ConfigError::NegativeGain { gain, value } => {
                write!(f, "gain {gain} must be non-negative, got {value}")
            }
            ConfigError::NonFiniteGain { gain } => write!(f, "gain {gain} is not finite"),
            ConfigError::InvalidStep(step) => {
                write!(f, "step must be positive and finite, got {step}")
            }
            ConfigError::InvalidParameter { name, value } => {
                write!(f, "parameter {name} out of range: {value}")
            }
            ConfigError::UnknownArchetype => write!(f, "unknown archetype"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

fn non_negative(
    name: &'static str,
    value: f32,
) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

fn positive(
    name: &'static str,
    value: f32,
) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

/// Keep a body's up axis aligned with a target direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationHoldConfig {
    pub gains: Gains,
    pub target_up: Vec3,
}

impl Default for OrientationHoldConfig {
    fn default() -> Self {
        Self {
            gains: Gains::new(2000.0, 0.0, 150.0),
            target_up: Vec3::Y,
        }
    }
}

/// Follow a target at an offset in its frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionFollowConfig {
    pub gains: Gains,
    pub offset: Vec3,
    pub max_force: f32,
    /// Enforced by the sink on the body's velocity.
    pub max_speed: f32,
    /// Heading slerp rate (1/s) while facing the target.
    pub rotation_speed: f32,
}

impl Default for PositionFollowConfig {
    fn default() -> Self {
        Self {
            gains: Gains::new(10.0, 0.0, 25.0),
            offset: Vec3::new(2.0, 2.0, -2.0),
            max_force: 100.0,
            max_speed: 20.0,
            rotation_speed: 5.0,
        }
    }
}

/// Per-thruster hover over the ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AltitudeHoldConfig {
    pub gains: Gains,
    pub hover: HoverParams,
    pub move_speed: f32,
    pub turn_speed: f32,
}

impl Default for AltitudeHoldConfig {
    fn default() -> Self {
        Self {
            gains: Gains::new(2.0, 0.0, 10.0),
            hover: HoverParams::default(),
            move_speed: 10.0,
            turn_speed: 2.0,
        }
    }
}

/// Steer toward a target while flying forward at constant speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BearingTrackConfig {
    pub gains: Gains,
    pub speed: f32,
    pub planar: bool,
}

impl Default for BearingTrackConfig {
    fn default() -> Self {
        Self {
            gains: Gains::new(200.0, 0.0, 25.0),
            speed: 30.0,
            planar: false,
        }
    }
}

/// Kinematic follow camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraFollowConfig {
    pub gains: Gains,
    pub offset: Vec3,
    pub max_speed: f32,
    /// Look-at slerp rate (1/s).
    pub look_speed: f32,
}

impl Default for CameraFollowConfig {
    fn default() -> Self {
        Self {
            // kd >= 1 makes the kinematic Euler loop diverge
            gains: Gains::new(5.0, 0.0, 0.5),
            offset: Vec3::new(0.0, 3.0, -6.0),
            max_speed: 50.0,
            look_speed: 10.0,
        }
    }
}

/// One of the supported actuator archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArchetypeConfig {
    OrientationHold(OrientationHoldConfig),
    PositionFollow(PositionFollowConfig),
    AltitudeHold(AltitudeHoldConfig),
    BearingTrack(BearingTrackConfig),
    CameraFollow(CameraFollowConfig),
}

impl ArchetypeConfig {
    pub const NAMES: [&'static str; 5] = [
        "orientation_hold",
        "position_follow",
        "altitude_hold",
        "bearing_track",
        "camera_follow",
    ];

    /// Stock tuning for the archetype called `name`.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "orientation_hold" => Self::OrientationHold(Default::default()),
            "position_follow" => Self::PositionFollow(Default::default()),
            "altitude_hold" => Self::AltitudeHold(Default::default()),
            "bearing_track" => Self::BearingTrack(Default::default()),
            "camera_follow" => Self::CameraFollow(Default::default()),
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OrientationHold(_) => Self::NAMES[0],
            Self::PositionFollow(_) => Self::NAMES[1],
            Self::AltitudeHold(_) => Self::NAMES[2],
            Self::BearingTrack(_) => Self::NAMES[3],
            Self::CameraFollow(_) => Self::NAMES[4],
        }
    }

    pub fn gains(&self) -> Gains {
        match self {
            Self::OrientationHold(c) => c.gains,
            Self::PositionFollow(c) => c.gains,
            Self::AltitudeHold(c) => c.gains,
            Self::BearingTrack(c) => c.gains,
            Self::CameraFollow(c) => c.gains,
        }
    }

    /// Vector strategy for this archetype; `None` for altitude hold.
    pub fn strategy(&self) -> Option<Strategy> {
        match *self {
            Self::OrientationHold(c) => Some(Strategy::OrientationHold {
                target_up: c.target_up,
            }),
            Self::PositionFollow(c) => Some(Strategy::PositionFollow {
                offset: c.offset,
                max_force: c.max_force,
            }),
            Self::AltitudeHold(_) => None,
            Self::BearingTrack(c) => Some(Strategy::BearingTrack { planar: c.planar }),
            Self::CameraFollow(c) => Some(Strategy::CameraFollow {
                offset: c.offset,
                max_speed: c.max_speed,
            }),
        }
    }

    /// Build the vector controller, in the `Inactive` phase.
    pub fn vector_controller(&self) -> Option<VectorController> {
        self.strategy()
            .map(|strategy| VectorController::new(strategy, self.gains()))
    }

    /// Build an `N`-thruster altitude hold.
    pub fn altitude_hold<const N: usize>(&self) -> Option<AltitudeHold<N>> {
        match self {
            Self::AltitudeHold(c) => Some(AltitudeHold::new(c.hover, c.gains)),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gains().validate()?;
        match self {
            Self::OrientationHold(c) => {
                if c.target_up.length_squared() == 0.0 || !c.target_up.is_finite() {
                    return Err(ConfigError::InvalidParameter {
                        name: "target_up",
                        value: c.target_up.length(),
                    });
                }
            }
            Self::PositionFollow(c) => {
                non_negative("max_force", c.max_force)?;
                non_negative("max_speed", c.max_speed)?;
                non_negative("rotation_speed", c.rotation_speed)?;
            }
            Self::AltitudeHold(c) => {
                positive("hover_height", c.hover.hover_height)?;
                non_negative("hover_force", c.hover.hover_force)?;
                non_negative("tilt_limit", c.hover.tilt_limit)?;
                non_negative("move_speed", c.move_speed)?;
                non_negative("turn_speed", c.turn_speed)?;
            }
            Self::BearingTrack(c) => non_negative("speed", c.speed)?,
            Self::CameraFollow(c) => {
                non_negative("max_speed", c.max_speed)?;
                non_negative("look_speed", c.look_speed)?;
            }
        }
        Ok(())
    }
}

fn default_step() -> f32 {
    DEFAULT_STEP
}

/// Top-level configuration for one controlled rig.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigConfig {
    #[serde(default = "default_step")]
    pub step: f32,
    /// Seconds of tracking before the actuator is released (projectiles).
    #[serde(default)]
    pub lifetime: Option<f32>,
    pub archetype: ArchetypeConfig,
}

impl RigConfig {
    /// Stock configuration for `name`; projectiles get a 5 s lifetime.
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        let archetype = ArchetypeConfig::from_name(name).ok_or(ConfigError::UnknownArchetype)?;
        let lifetime = matches!(archetype, ArchetypeConfig::BearingTrack(_)).then_some(5.0);
        Ok(Self {
            step: DEFAULT_STEP,
            lifetime,
            archetype,
        })
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let result = self.validate_inner();
        if let Err(e) = &result {
            tracing::warn!(archetype = self.archetype.name(), "rejected configuration: {}", e);
        }
        result
    }

    fn validate_inner(&self) -> Result<(), ConfigError> {
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(ConfigError::InvalidStep(self.step));
        }
        if let Some(lifetime) = self.lifetime {
            positive("lifetime", lifetime)?;
        }
        self.archetype.validate()
    }
}
