//! Module Exports
//!
//! This file exports the control modules, leaves first.
//!
//! - `pid`: the single-axis PID unit and its gains.
//! - `bundle`: fixed-size bundles of independent PID units.
//! - `strategy`: per-archetype error signals and output post-processing.
//! - `archetypes`: actuator controllers built from the above.
//! - `driver`: the fixed-step control loop and host traits.

pub mod archetypes;
pub mod bundle;
pub mod driver;
pub mod pid;
pub mod strategy;

pub use archetypes::{
    righting_torque, slope_move_direction, AltitudeHold, GroundHit, HoverOutput, HoverParams,
    Observation, Phase, VectorController,
};
pub use bundle::{AxisBundle, Vec3Bundle};
pub use driver::{Actuator, ActuatorSink, ControlLoop, Sensor, TickReport};
pub use pid::{Gains, PidUnit, MIN_DELTA_TIME};
pub use strategy::{Command, OutputKind, Strategy};
