//! Single-axis discrete PID unit.
//!
//! The unit only carries the state that must survive between ticks
//! (previous error and accumulated integral). Gains and the time step are
//! supplied on every call so that one tuning can be shared by many units
//! and retuned live without touching controller state.

use serde::{Deserialize, Serialize};

use crate::utils::config::ConfigError;

/// Ticks shorter than this are ignored by [`PidUnit::update`].
pub const MIN_DELTA_TIME: f32 = 1e-5;

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Gains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl Gains {
    pub const fn new(
        kp: f32,
        ki: f32,
        kd: f32,
    ) -> Self {
        Self { kp, ki, kd }
    }

    /// Pure proportional gains.
    pub const fn p(kp: f32) -> Self {
        Self::new(kp, 0.0, 0.0)
    }

    /// Reject negative or non-finite gains.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteGain { gain: name });
            }
            if value < 0.0 {
                return Err(ConfigError::NegativeGain { gain: name, value });
            }
        }
        Ok(())
    }
}

/// A discrete PID controller for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidUnit {
    last_error: f32,
    integral: f32,
}

impl PidUnit {
    /// Create a unit with zeroed state.
    pub const fn new() -> Self {
        Self {
            last_error: 0.0,
            integral: 0.0,
        }
    }

    /// Compute the correction for `error` over a tick of length `dt`.
    ///
    /// Returns `0.0` and leaves the state untouched when `dt <= MIN_DELTA_TIME`.
    /// A non-positive `ki` also clears the accumulated integral, so re-enabling
    /// the I-term later starts from zero. The output is not clamped.
    pub fn update(
        &mut self,
        error: f32,
        dt: f32,
        kp: f32,
        ki: f32,
        kd: f32,
    ) -> f32 {
        if dt <= MIN_DELTA_TIME {
            return 0.0;
        }

        if ki <= 0.0 {
            self.integral = 0.0;
        } else {
            self.integral += error * dt;
        }

        let derivative = (error - self.last_error) / dt;
        self.last_error = error;

        kp * error + ki * self.integral + kd * derivative
    }

    /// [`update`](Self::update) with a [`Gains`] triple.
    pub fn update_with(
        &mut self,
        error: f32,
        dt: f32,
        gains: Gains,
    ) -> f32 {
        self.update(error, dt, gains.kp, gains.ki, gains.kd)
    }

    /// Reset integrator and derivative history.
    pub fn reset(&mut self) {
        self.last_error = 0.0;
        self.integral = 0.0;
    }

    pub fn last_error(&self) -> f32 {
        self.last_error
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// True when both state fields are zero.
    pub fn is_at_rest(&self) -> bool {
        self.last_error == 0.0 && self.integral == 0.0
    }
}
