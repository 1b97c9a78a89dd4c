//! Host-side scenes that feed the controllers and apply their output.

use glam::{Quat, Vec3};
use pid_core::utils::{
    config::{ArchetypeConfig, ConfigError, RigConfig},
    controllers::{
        righting_torque, slope_move_direction, Actuator, ActuatorSink, AltitudeHold, Command,
        ControlLoop, GroundHit, HoverOutput, HoverParams, Observation, OutputKind, Sensor,
        Strategy, VectorController,
    },
    math::vector,
    Pose,
};
use serde::Serialize;

use crate::plant::RigidBody;

/// Thruster count of the hover rig.
pub const THRUSTERS: usize = 4;

/// Target circling `center` at `radius`, facing along its path.
#[derive(Debug, Clone, Copy)]
pub struct MovingTarget {
    pub center: Vec3,
    pub radius: f32,
    pub rate: f32,
}

impl MovingTarget {
    pub fn pose_at(
        &self,
        time: f32,
    ) -> Pose {
        let angle = self.rate * time;
        let position = self.center + Vec3::new(angle.cos(), 0.0, angle.sin()) * self.radius;
        let heading = Vec3::new(-angle.sin(), 0.0, angle.cos()) * self.rate.signum();
        let rotation = vector::look_rotation(heading, Vec3::Y).unwrap_or(Quat::IDENTITY);
        Pose::new(position, rotation)
    }
}

/// Scene knobs that do not belong to the controller configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioOptions {
    /// Target hidden from the sensors in `[start, end)` seconds.
    pub dropout: Option<(f32, f32)>,
    /// Scripted throttle for the hover rig, -1..=1.
    pub move_input: f32,
    pub turn_input: f32,
}

/// One line of simulation output.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Telemetry {
    pub tick: u64,
    pub time: f32,
    pub position: Vec3,
    pub tilt: f32,
    pub output: Vec3,
    pub goal_distance: Option<f32>,
    pub active: bool,
    pub finished: bool,
}

/// Sink-side limits applied to a chasing body.
#[derive(Debug, Clone, Copy, Default)]
struct SinkLimits {
    max_speed: Option<f32>,
    forward_speed: Option<f32>,
    /// Yaw toward the target in the horizontal plane.
    face_rate: Option<f32>,
    /// Full look-at toward the target.
    look_rate: Option<f32>,
}

/// A body chasing (or ignoring) a moving target.
pub struct ChaseHost {
    body: RigidBody,
    target: Option<MovingTarget>,
    limits: SinkLimits,
    dropout: Option<(f32, f32)>,
    time: f32,
    last_output: Vec3,
}

impl ChaseHost {
    fn target_pose(&self) -> Option<Pose> {
        let target = self.target?;
        let hidden = self
            .dropout
            .is_some_and(|(start, end)| self.time >= start && self.time < end);
        (!hidden).then(|| target.pose_at(self.time))
    }

    fn turn_toward(
        &mut self,
        mut direction: Vec3,
        rate: f32,
        planar: bool,
        dt: f32,
    ) {
        if planar {
            direction.y = 0.0;
        }
        if direction.length_squared() <= 0.1 {
            return;
        }
        if let Some(goal) = vector::look_rotation(direction, Vec3::Y) {
            self.body.pose.rotation = vector::turn_toward(self.body.pose.rotation, goal, rate, dt);
        }
    }
}

impl Sensor for ChaseHost {
    type Reading = Observation;

    fn sample(&mut self) -> Observation {
        Observation {
            body: self.body.pose,
            target: self.target_pose(),
        }
    }
}

impl ActuatorSink for ChaseHost {
    type Command = Command;

    fn apply(
        &mut self,
        command: Option<Command>,
        dt: f32,
    ) {
        if let Some(speed) = self.limits.forward_speed {
            self.body.velocity = self.body.pose.forward() * speed;
        }

        let (force, torque) = match command {
            Some(Command {
                kind: OutputKind::Force,
                value,
            }) => (value, Vec3::ZERO),
            Some(Command {
                kind: OutputKind::Torque,
                value,
            }) => (Vec3::ZERO, value),
            Some(Command {
                kind: OutputKind::Displacement,
                value,
            }) => {
                self.body.pose.position += value;
                (Vec3::ZERO, Vec3::ZERO)
            }
            None => (Vec3::ZERO, Vec3::ZERO),
        };
        self.last_output = command.map(|c| c.value).unwrap_or_default();
        self.body.step(force, torque, dt);

        if let Some(max_speed) = self.limits.max_speed {
            self.body.velocity = vector::cap_velocity(self.body.velocity, max_speed);
        }
        if let Some(target) = self.target_pose() {
            let direction = target.position - self.body.pose.position;
            if let Some(rate) = self.limits.face_rate {
                self.turn_toward(direction, rate, true, dt);
            } else if let Some(rate) = self.limits.look_rate {
                self.turn_toward(direction, rate, false, dt);
            }
        }
        self.time += dt;
    }
}

/// Four-thruster hover board over the ground plane `y = 0`.
pub struct HoverHost {
    body: RigidBody,
    thrusters: [Vec3; THRUSTERS],
    params: HoverParams,
    probe_range: f32,
    move_speed: f32,
    turn_speed: f32,
    move_input: f32,
    turn_input: f32,
    time: f32,
    last_output: Vec3,
}

impl HoverHost {
    /// Distance along `-up` from `origin` to the ground plane, if within `range`.
    fn probe(
        &self,
        origin: Vec3,
        range: f32,
    ) -> Option<GroundHit> {
        let up = self.body.pose.up();
        if up.y <= 1e-3 {
            return None;
        }
        let distance = origin.y / up.y;
        (0.0..=range).contains(&distance).then_some(GroundHit {
            distance,
            normal: Vec3::Y,
        })
    }
}

impl Sensor for HoverHost {
    type Reading = [Option<GroundHit>; THRUSTERS];

    fn sample(&mut self) -> Self::Reading {
        self.thrusters
            .map(|local| self.probe(self.body.pose.transform_point(local), self.probe_range))
    }
}

impl ActuatorSink for HoverHost {
    type Command = HoverOutput<THRUSTERS>;

    fn apply(
        &mut self,
        command: Option<HoverOutput<THRUSTERS>>,
        dt: f32,
    ) {
        let mut force = Vec3::ZERO;
        let mut torque = Vec3::ZERO;
        let ground_normal = command.map_or(Vec3::Y, |out| out.ground_normal);

        if let Some(out) = command {
            for (local, thrust) in self.thrusters.iter().zip(out.thrust) {
                let lift = Vec3::Y * thrust;
                let point = self.body.pose.transform_point(*local);
                force += lift;
                torque += self.body.torque_at(lift, point);
            }
        }
        self.last_output = force;

        // drive, turn, righting and air pull are accelerations
        let (mass, inertia) = (self.body.mass, self.body.inertia);
        let up = self.body.pose.up();
        force += slope_move_direction(self.body.pose.forward(), ground_normal)
            * (self.move_input * self.move_speed * mass);
        torque += up * (self.turn_input * self.turn_speed * inertia);
        if let Some(righting) = righting_torque(up, self.params.tilt_limit) {
            torque += righting * inertia;
        }
        if self.body.pose.position.y > self.params.hover_height * 2.0 {
            force += Vec3::NEG_Y * (10.0 * mass);
        }

        self.body.step(force, torque, dt);
        self.time += dt;
    }
}

/// Where the controller is trying to put the body, if it has a point goal.
fn goal_point(
    strategy: &Strategy,
    target: &Pose,
) -> Option<Vec3> {
    match *strategy {
        Strategy::OrientationHold { .. } => None,
        Strategy::PositionFollow { offset, .. } => {
            Some(target.position + target.transform_direction(offset))
        }
        Strategy::BearingTrack { .. } => Some(target.position),
        Strategy::CameraFollow { offset, .. } => Some(target.transform_point(offset)),
    }
}

/// A configured controller bound to its host scene.
pub enum Rig {
    Chase(ControlLoop<VectorController, ChaseHost>),
    Hover(ControlLoop<AltitudeHold<THRUSTERS>, HoverHost>),
}

impl Rig {
    pub fn build(
        config: &RigConfig,
        options: &ScenarioOptions,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let archetype = &config.archetype;

        if let ArchetypeConfig::AltitudeHold(hover) = archetype {
            let ctrl = archetype
                .altitude_hold::<THRUSTERS>()
                .ok_or(ConfigError::UnknownArchetype)?;
            let mut body = RigidBody::new(Pose::at(Vec3::new(0.0, hover.hover.hover_height, 0.0)));
            body.use_gravity = true;
            body.angular_damping = 5.0;
            body.mass = THRUSTERS as f32;
            body.inertia = 4.0;
            let host = HoverHost {
                body,
                thrusters: [
                    Vec3::new(0.5, 0.0, 1.0),
                    Vec3::new(-0.5, 0.0, 1.0),
                    Vec3::new(0.5, 0.0, -1.0),
                    Vec3::new(-0.5, 0.0, -1.0),
                ],
                params: hover.hover,
                probe_range: ctrl.probe_range(),
                move_speed: hover.move_speed,
                turn_speed: hover.turn_speed,
                move_input: options.move_input.clamp(-1.0, 1.0),
                turn_input: options.turn_input.clamp(-1.0, 1.0),
                time: 0.0,
                last_output: Vec3::ZERO,
            };
            return ControlLoop::new(ctrl, host, config.step).map(Rig::Hover);
        }

        let mut ctrl = archetype
            .vector_controller()
            .ok_or(ConfigError::UnknownArchetype)?;
        let orbit = MovingTarget {
            center: Vec3::ZERO,
            radius: 10.0,
            rate: 0.5,
        };
        let mut body = RigidBody::new(Pose::IDENTITY);
        let mut limits = SinkLimits::default();
        let target = match *archetype {
            ArchetypeConfig::OrientationHold(_) => {
                body.pose.rotation = Quat::from_rotation_z(0.6);
                body.inertia = 20.0;
                body.angular_damping = 1.0;
                None
            }
            ArchetypeConfig::PositionFollow(c) => {
                body.pose.position = Vec3::new(0.0, 0.0, -15.0);
                body.linear_damping = 3.0;
                body.angular_damping = 5.0;
                limits.max_speed = Some(c.max_speed);
                limits.face_rate = Some(c.rotation_speed);
                Some(orbit)
            }
            ArchetypeConfig::BearingTrack(c) => {
                body.angular_damping = 3.0;
                limits.forward_speed = Some(c.speed);
                Some(MovingTarget {
                    center: Vec3::new(0.0, 0.0, 60.0),
                    ..orbit
                })
            }
            ArchetypeConfig::CameraFollow(c) => {
                limits.look_rate = Some(c.look_speed);
                Some(orbit)
            }
            ArchetypeConfig::AltitudeHold(_) => None,
        };

        if let Some(start) = target.map(|t| t.pose_at(0.0)) {
            if let Some(position) = ctrl.snap(&start) {
                body.pose.position = position;
            }
        }
        ctrl.activate();

        let host = ChaseHost {
            body,
            target,
            limits,
            dropout: options.dropout,
            time: 0.0,
            last_output: Vec3::ZERO,
        };
        let mut lp = ControlLoop::new(ctrl, host, config.step)?;
        if let Some(lifetime) = config.lifetime {
            lp = lp.with_lifetime(lifetime)?;
        }
        Ok(Rig::Chase(lp))
    }

    /// Advance one step and report.
    pub fn tick(&mut self) -> Telemetry {
        match self {
            Rig::Chase(lp) => {
                // target came back: reacquire, snapping followers into place
                if !lp.is_finished() && !lp.actuator().is_active() {
                    if let Some(target) = lp.host().target_pose() {
                        if let Some(position) = lp.actuator_mut().snap(&target) {
                            lp.host_mut().body.pose.position = position;
                        }
                        lp.actuator_mut().acquire();
                    }
                }
                let report = lp.tick();
                let host = lp.host();
                let goal_distance = host.target_pose().and_then(|target| {
                    goal_point(lp.actuator().strategy(), &target)
                        .map(|goal| goal.distance(host.body.pose.position))
                });
                Telemetry {
                    tick: report.tick,
                    time: host.time,
                    position: host.body.pose.position,
                    tilt: vector::angle_between(host.body.pose.up(), Vec3::Y),
                    output: host.last_output,
                    goal_distance,
                    active: lp.actuator().is_active(),
                    finished: report.finished,
                }
            }
            Rig::Hover(lp) => {
                let report = lp.tick();
                let host = lp.host();
                Telemetry {
                    tick: report.tick,
                    time: host.time,
                    position: host.body.pose.position,
                    tilt: vector::angle_between(host.body.pose.up(), Vec3::Y),
                    output: host.last_output,
                    goal_distance: Some((host.body.pose.position.y - host.params.hover_height).abs()),
                    active: report.applied,
                    finished: report.finished,
                }
            }
        }
    }

    pub fn step(&self) -> f32 {
        match self {
            Rig::Chase(lp) => lp.step(),
            Rig::Hover(lp) => lp.step(),
        }
    }
}
