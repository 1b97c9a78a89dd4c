//! Utility re-exports for the PID control core.
//!
//! - `controllers`: PID units, axis bundles, error-signal strategies,
//!   actuator archetypes and the fixed-step control-loop driver
//! - `math`: vector and pose helpers shared by the strategies
//! - `config`: serde-backed rig configuration and its validation errors

pub mod config;
pub mod controllers;
pub mod math;

pub use config::{ConfigError, RigConfig};
pub use controllers::{
    AltitudeHold, AxisBundle, ControlLoop, Gains, PidUnit, Strategy, VectorController,
};
pub use math::pose::Pose;
