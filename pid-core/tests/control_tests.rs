use glam::{Quat, Vec3};
use pid_core::utils::controllers::{
    archetypes::{GroundHit, HoverParams, Observation},
    driver::{ActuatorSink, ControlLoop, Sensor},
    strategy::{Command, OutputKind},
    AltitudeHold, AxisBundle, Gains, PidUnit, Strategy, VectorController,
};
use pid_core::utils::math::{pose::Pose, vector};

/// Point mass with an orientation, integrated with explicit Euler.
#[derive(Debug, Clone, Copy)]
struct Body {
    pose: Pose,
    velocity: Vec3,
    angular_velocity: Vec3,
    angular_damping: f32,
}

impl Body {
    fn at(pose: Pose) -> Self {
        Self {
            pose,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            angular_damping: 0.0,
        }
    }

    fn integrate(
        &mut self,
        accel: Vec3,
        torque: Vec3,
        dt: f32,
    ) {
        self.velocity += accel * dt;
        self.angular_velocity += torque * dt;
        self.angular_velocity *= 1.0 / (1.0 + self.angular_damping * dt);
        self.pose.position += self.velocity * dt;
        self.pose.rotation =
            (Quat::from_scaled_axis(self.angular_velocity * dt) * self.pose.rotation).normalize();
    }
}

/// Host with one body chasing a static target.
struct Scene {
    body: Body,
    target: Option<Pose>,
    forward_speed: Option<f32>,
    closest: f32,
}

impl Sensor for Scene {
    type Reading = Observation;

    fn sample(&mut self) -> Observation {
        Observation {
            body: self.body.pose,
            target: self.target,
        }
    }
}

impl ActuatorSink for Scene {
    type Command = Command;

    fn apply(
        &mut self,
        command: Option<Command>,
        dt: f32,
    ) {
        if let Some(speed) = self.forward_speed {
            self.body.velocity = self.body.pose.forward() * speed;
        }
        let (accel, torque) = match command {
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
        self.body.integrate(accel, torque, dt);
        if let Some(target) = self.target {
            self.closest = self.closest.min(self.body.pose.position.distance(target.position));
        }
    }
}

fn scene(body: Body, target: Option<Pose>) -> Scene {
    Scene {
        body,
        target,
        forward_speed: None,
        closest: f32::MAX,
    }
}

#[test]
fn test_integral_matches_gain_error_time() {
    let (k, e) = (0.75, -3.0);
    for t in 1..=6 {
        let mut pid = PidUnit::new();
        let mut out = 0.0;
        for _ in 0..t {
            out = pid.update(e, 1.0, 0.0, k, 0.0);
        }
        assert!((out - k * e * t as f32).abs() < 1e-4, "tick {}", t);
    }
}

#[test]
fn test_derivative_uses_previous_error() {
    let mut pid = PidUnit::new();
    let (e1, e2, dt, k) = (2.0, -1.0, 0.25, 3.0);
    pid.update(e1, dt, 0.0, 0.0, k);
    let out = pid.update(e2, dt, 0.0, 0.0, k);
    assert!((out - k * (e2 - e1) / dt).abs() < 1e-4);
}

#[test]
fn test_zero_length_tick_does_not_disturb_derivative() {
    let mut pid = PidUnit::new();
    pid.update(1.0, 0.1, 0.0, 0.0, 1.0);
    assert_eq!(pid.update(50.0, 0.0, 0.0, 0.0, 1.0), 0.0);
    let out = pid.update(2.0, 0.1, 0.0, 0.0, 1.0);
    assert!((out - 10.0).abs() < 1e-4);
}

#[test]
fn test_bundle_reset_clears_every_axis() {
    let mut bundle = AxisBundle::<5>::new();
    bundle.update([1.0, -2.0, 3.0, -4.0, 5.0], 0.5, Gains::new(1.0, 1.0, 1.0));
    assert!(!bundle.is_at_rest());
    bundle.reset_all();
    bundle.reset_all();
    assert!(bundle.is_at_rest());
}

#[test]
fn test_orientation_hold_rights_a_tilted_body() {
    let tilted = Pose::new(Vec3::ZERO, Quat::from_rotation_z(0.8));
    let mut ctrl = VectorController::new(
        Strategy::OrientationHold { target_up: Vec3::Y },
        Gains::new(50.0, 0.0, 10.0),
    );
    ctrl.activate();
    let mut lp = ControlLoop::new(ctrl, scene(Body::at(tilted), None), 0.01).unwrap();
    lp.run(500);
    let up = lp.host().body.pose.up();
    assert!(vector::angle_between(up, Vec3::Y) < 1.0, "up = {:?}", up);
}

#[test]
fn test_orientation_hold_tracks_new_up() {
    let mut ctrl = VectorController::new(
        Strategy::OrientationHold { target_up: Vec3::Y },
        Gains::new(50.0, 0.0, 10.0),
    );
    ctrl.activate();
    ctrl.set_target_up(Vec3::new(1.0, 1.0, 0.0));
    let mut lp = ControlLoop::new(ctrl, scene(Body::at(Pose::IDENTITY), None), 0.01).unwrap();
    lp.run(800);
    let up = lp.host().body.pose.up();
    assert!(vector::angle_between(up, Vec3::new(1.0, 1.0, 0.0)) < 2.0, "up = {:?}", up);
}

#[test]
fn test_position_follow_force_is_clamped() {
    let mut ctrl = VectorController::new(
        Strategy::PositionFollow {
            offset: Vec3::new(2.0, 2.0, -2.0),
            max_force: 100.0,
        },
        Gains::new(10.0, 0.0, 25.0),
    );
    ctrl.acquire();
    let obs = Observation {
        body: Pose::IDENTITY,
        target: Some(Pose::at(Vec3::new(500.0, 0.0, 0.0))),
    };
    let cmd = ctrl.tick(&obs, 0.02).unwrap();
    assert_eq!(cmd.kind, OutputKind::Force);
    assert!(cmd.value.length() <= 100.0 + 1e-3);
    assert!(cmd.value.x > 0.0);
}

#[test]
fn test_position_follow_settles_at_offset() {
    let mut ctrl = VectorController::new(
        Strategy::PositionFollow {
            offset: Vec3::new(2.0, 2.0, -2.0),
            max_force: 100.0,
        },
        Gains::new(4.0, 0.0, 3.0),
    );
    ctrl.acquire();
    let target = Pose::new(Vec3::new(10.0, 0.0, 10.0), Quat::from_rotation_y(1.0));
    let mut lp = ControlLoop::new(ctrl, scene(Body::at(Pose::IDENTITY), Some(target)), 0.02).unwrap();
    lp.run(1500);
    let goal = target.transform_point(Vec3::new(2.0, 2.0, -2.0));
    let pos = lp.host().body.pose.position;
    assert!(pos.distance(goal) < 0.05, "pos = {:?}, goal = {:?}", pos, goal);
}

#[test]
fn test_bearing_track_homes_in_and_expires() {
    let mut ctrl = VectorController::new(Strategy::BearingTrack { planar: false }, Gains::new(200.0, 0.0, 25.0));
    ctrl.activate();
    let mut host = scene(Body::at(Pose::IDENTITY), Some(Pose::at(Vec3::new(10.0, 0.0, 60.0))));
    host.forward_speed = Some(30.0);
    host.body.angular_damping = 3.0;
    let mut lp = ControlLoop::new(ctrl, host, 0.02).unwrap().with_lifetime(5.0).unwrap();
    let report = lp.run(1000).unwrap();
    assert!(report.finished);
    assert!(lp.ticks() <= 251);
    assert!(lp.host().closest < 2.0, "closest = {}", lp.host().closest);
    assert!(lp.actuator().bundle().is_at_rest());
}

#[test]
fn test_camera_snap_then_follow() {
    let offset = Vec3::new(0.0, 3.0, -6.0);
    let mut ctrl = VectorController::new(
        Strategy::CameraFollow {
            offset,
            max_speed: 50.0,
        },
        Gains::new(5.0, 0.0, 0.0),
    );
    let target = Pose::at(Vec3::new(4.0, 0.0, 4.0));
    let snapped = ctrl.snap(&target).unwrap();
    ctrl.activate();
    let mut body = Body::at(Pose::at(snapped));
    let obs = Observation {
        body: body.pose,
        target: Some(target),
    };
    assert_eq!(ctrl.tick(&obs, 0.02).unwrap().value, Vec3::ZERO);

    // target jumps, camera glides without exceeding max speed
    let moved = Pose::at(Vec3::new(104.0, 0.0, 4.0));
    for _ in 0..400 {
        let obs = Observation {
            body: body.pose,
            target: Some(moved),
        };
        let cmd = ctrl.tick(&obs, 0.02).unwrap();
        assert!(cmd.value.length() <= 50.0 * 0.02 + 1e-4);
        body.pose.position += cmd.value;
    }
    assert!(body.pose.position.distance(moved.transform_point(offset)) < 0.01);
}

#[test]
fn test_altitude_hold_settles_under_gravity() {
    let gains = Gains::new(2.0, 0.0, 10.0);
    let params = HoverParams::default();
    let mut hover = AltitudeHold::<1>::new(params, gains);
    let (mut height, mut vel, dt) = (1.5f32, 0.0f32, 0.02f32);
    for _ in 0..2000 {
        let probe = (height <= hover.probe_range()).then_some(GroundHit {
            distance: height,
            normal: Vec3::Y,
        });
        let out = hover.tick(&[probe], dt);
        assert!(out.thrust[0] >= 0.0);
        vel += (out.thrust[0] - 9.81) * dt;
        height = (height + vel * dt).max(0.0);
    }
    let expected = params.hover_height - 9.81 / (params.hover_force * gains.kp);
    assert!((height - expected).abs() < 0.05, "height = {}", height);
}

#[test]
fn test_altitude_hold_forgets_while_airborne() {
    let mut hover = AltitudeHold::<3>::new(HoverParams::default(), Gains::new(2.0, 1.0, 10.0));
    let hit = Some(GroundHit {
        distance: 0.5,
        normal: Vec3::Y,
    });
    for _ in 0..10 {
        hover.tick(&[hit, hit, hit], 0.02);
    }
    let out = hover.tick(&[None, None, None], 0.02);
    assert!(out.airborne());
    assert_eq!(out.thrust, [0.0; 3]);
    assert!(hover.bundle().is_at_rest());

    // first tick back matches a fresh unit
    let mut fresh = PidUnit::new();
    let expected = 4.0 * fresh.update(1.0, 0.02, 2.0, 1.0, 10.0).max(0.0);
    let out = hover.tick(&[hit, None, None], 0.02);
    assert!((out.thrust[0] - expected).abs() < 1e-3);
}
