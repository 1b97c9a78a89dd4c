//! Fixed-step control loop and the host-facing sensor/actuator interfaces.

use super::archetypes::{AltitudeHold, GroundHit, HoverOutput, Observation, Phase, VectorController};
use super::strategy::Command;
use crate::utils::config::ConfigError;

/// A controller that turns one sensor reading into one actuator command.
pub trait Actuator {
    type Input;
    type Command;

    /// Advance one tick; `None` when there is nothing to apply.
    fn tick(
        &mut self,
        input: &Self::Input,
        dt: f32,
    ) -> Option<Self::Command>;

    /// Clear controller state and stop actuating.
    fn reset(&mut self);

    /// Clear controller state and start actuating.
    fn activate(&mut self);

    fn is_active(&self) -> bool;
}

/// Host-side source of the current/target state.
pub trait Sensor {
    type Reading;

    fn sample(&mut self) -> Self::Reading;
}

/// Host-side force/torque applicator or position integrator.
pub trait ActuatorSink {
    type Command;

    /// Called once per tick, with `None` when the actuator was idle.
    fn apply(
        &mut self,
        command: Option<Self::Command>,
        dt: f32,
    );
}

impl Actuator for VectorController {
    type Input = Observation;
    type Command = Command;

    fn tick(
        &mut self,
        input: &Observation,
        dt: f32,
    ) -> Option<Command> {
        VectorController::tick(self, input, dt)
    }

    fn reset(&mut self) {
        self.release();
    }

    fn activate(&mut self) {
        VectorController::activate(self);
    }

    fn is_active(&self) -> bool {
        self.phase() == Phase::Tracking
    }
}

impl<const N: usize> Actuator for AltitudeHold<N> {
    type Input = [Option<GroundHit>; N];
    type Command = HoverOutput<N>;

    fn tick(
        &mut self,
        input: &Self::Input,
        dt: f32,
    ) -> Option<HoverOutput<N>> {
        Some(AltitudeHold::tick(self, input, dt))
    }

    fn reset(&mut self) {
        AltitudeHold::reset(self);
    }

    fn activate(&mut self) {
        AltitudeHold::reset(self);
    }

    fn is_active(&self) -> bool {
        true
    }
}

/// Outcome of one [`ControlLoop::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub applied: bool,
    pub finished: bool,
}

/// Drives one actuator once per fixed step against a host.
pub struct ControlLoop<A, H> {
    actuator: A,
    host: H,
    step: f32,
    lifetime: Option<f32>,
    elapsed: f32,
    ticks: u64,
    finished: bool,
}

impl<A, H> ControlLoop<A, H>
where
    A: Actuator,
    H: Sensor<Reading = A::Input> + ActuatorSink<Command = A::Command>,
{
    /// Create a loop ticking every `step` seconds.
    pub fn new(
        actuator: A,
        host: H,
        step: f32,
    ) -> Result<Self, ConfigError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(ConfigError::InvalidStep(step));
        }
        Ok(Self {
            actuator,
            host,
            step,
            lifetime: None,
            elapsed: 0.0,
            ticks: 0,
            finished: false,
        })
    }

    /// Release the actuator `lifetime` seconds after the loop started,
    /// whether or not it had a target in the meantime.
    pub fn with_lifetime(
        mut self,
        lifetime: f32,
    ) -> Result<Self, ConfigError> {
        if !lifetime.is_finite() || lifetime <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "lifetime",
                value: lifetime,
            });
        }
        self.lifetime = Some(lifetime);
        Ok(self)
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Reuse from a pool: clear the lifetime clock and re-activate the
    /// actuator with cleared state.
    pub fn restart(&mut self) {
        tracing::debug!(elapsed = self.elapsed, "control loop restarted");
        self.elapsed = 0.0;
        self.finished = false;
        self.actuator.activate();
    }

    /// Sample, compute, apply.
    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;
        let dt = self.step;

        if !self.finished {
            self.elapsed += dt;
            if self.lifetime.is_some_and(|limit| self.elapsed >= limit) {
                tracing::debug!(elapsed = self.elapsed, "lifetime expired, releasing actuator");
                self.actuator.reset();
                self.finished = true;
            }
        }

        let command = if self.finished {
            None
        } else {
            let reading = self.host.sample();
            self.actuator.tick(&reading, dt)
        };
        let applied = command.is_some();
        self.host.apply(command, dt);

        TickReport {
            tick: self.ticks,
            applied,
            finished: self.finished,
        }
    }

    /// Run up to `n` ticks, stopping early once finished.
    pub fn run(
        &mut self,
        n: usize,
    ) -> Option<TickReport> {
        let mut last = None;
        for _ in 0..n {
            let report = self.tick();
            last = Some(report);
            if report.finished {
                break;
            }
        }
        last
    }

    pub fn into_parts(self) -> (A, H) {
        (self.actuator, self.host)
    }
}
