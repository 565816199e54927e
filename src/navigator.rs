use self::orientation::{constrain_rotation, facing_rotation};
pub use self::profile::{Keyframe, SpeedProfile, PROFILE_INTEGRATION_STEPS};
use crate::curve::{Crossings, Curve, Cursor};
use crate::math::{Point3d, Quat, Vector3d};
use crate::segment::{Direction, DISTANCE_EPSILON};
use cgmath::prelude::*;
use cgmath::One;
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

mod orientation;
mod profile;

/// How the speed of a [PathNavigator] is determined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedMode {
    /// The reference velocity scaled by the profile at the current position,
    /// with one profile key per control point.
    NodeBased,
    /// A velocity calibrated to finish the path in a fixed duration, scaled by
    /// the profile at the elapsed fraction of that duration.
    DurationBased,
}

/// The attributes of a [PathNavigator].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorAttributes {
    pub mode: SpeedMode,
    /// The speed in units per second before the profile is applied.
    /// Negative values travel from the end of the path towards its head.
    pub reference_velocity: f64,
    /// The time in seconds a duration based traversal takes.
    pub duration: f64,
    /// The speed multiplier curve.
    pub profile: SpeedProfile,
    /// Keep facing the end of the path even while travelling backwards.
    pub always_forward: bool,
    /// Resample the current segment and its neighbours every tick,
    /// for curves which are edited while being travelled along.
    pub always_update_current_segment: bool,
    /// The largest rotation allowed about each axis, in degrees.
    pub rotation_constraint: Vector3d,
}

impl Default for NavigatorAttributes {
    fn default() -> Self {
        Self {
            mode: SpeedMode::NodeBased,
            reference_velocity: 1.0,
            duration: 1.0,
            profile: SpeedProfile::default(),
            always_forward: false,
            always_update_current_segment: false,
            rotation_constraint: Vector3d::new(180.0, 180.0, 180.0),
        }
    }
}

/// The lifecycle of a [PathNavigator].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigatorState {
    /// Not yet started.
    Idle,
    /// Advancing once per tick.
    Running,
    /// Reached the end of the path.
    Completed,
    /// Halted by the caller.
    Stopped,
}

/// The outcome of a single [PathNavigator::tick].
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    /// Where the navigator is on the curve.
    pub cursor: Cursor,
    /// The world position for the moving object.
    pub position: Point3d,
    /// The world orientation for the moving object.
    pub rotation: Quat,
    /// The signed velocity used for this tick.
    pub velocity: f64,
    /// The segments entered during this tick, in order.
    pub crossed: Crossings,
    /// Whether this tick reached the end of the path.
    pub completed: bool,
}

/// Drives a position and orientation along a [Curve], one tick at a time.
pub struct PathNavigator {
    attributes: NavigatorAttributes,
    state: NavigatorState,
    /// The current location on the curve.
    cursor: Cursor,
    /// Time since the traversal started, in s.
    elapsed: f64,
    /// The speed which completes a duration based traversal on time.
    calibrated_velocity: f64,
    /// The curve length the calibration was made for.
    calibrated_length: f64,
    /// Whether the calibration must be redone before the next tick.
    needs_calibration: bool,
    /// The velocity used by the last tick.
    actual_velocity: f64,
    /// The direction of the last movement.
    direction: Direction,
    position: Point3d,
    rotation: Quat,
    on_complete: Option<Box<dyn FnMut()>>,
    on_segment_changed: Option<Box<dyn FnMut(usize)>>,
}

impl PathNavigator {
    /// Creates an idle navigator.
    pub fn new(attributes: &NavigatorAttributes) -> Self {
        Self {
            attributes: attributes.clone(),
            state: NavigatorState::Idle,
            cursor: Cursor::default(),
            elapsed: 0.0,
            calibrated_velocity: 0.0,
            calibrated_length: 0.0,
            needs_calibration: true,
            actual_velocity: 0.0,
            direction: Direction::of(attributes.reference_velocity),
            position: Point3d::origin(),
            rotation: Quat::one(),
            on_complete: None,
            on_segment_changed: None,
        }
    }

    /// Gets the attributes, including any changes made by the setters.
    pub fn attributes(&self) -> &NavigatorAttributes {
        &self.attributes
    }

    /// Gets the lifecycle state.
    pub fn state(&self) -> NavigatorState {
        self.state
    }

    /// Gets the current location on the curve.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Time since the traversal started, in s.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// The signed velocity used by the last tick.
    pub fn actual_velocity(&self) -> f64 {
        self.actual_velocity
    }

    /// Gets the world position for the moving object.
    pub fn position(&self) -> Point3d {
        self.position
    }

    /// Gets the world orientation for the moving object.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Registers a callback invoked once when the end of the path is reached.
    pub fn on_complete(&mut self, callback: impl FnMut() + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Registers a callback invoked with the index of every segment entered.
    pub fn on_segment_changed(&mut self, callback: impl FnMut(usize) + 'static) {
        self.on_segment_changed = Some(Box::new(callback));
    }

    /// Sets the reference velocity; the sign selects the direction of travel.
    pub fn set_reference_velocity(&mut self, velocity: f64) {
        self.attributes.reference_velocity = velocity;
    }

    /// Reverses the direction of travel, keeping the speed.
    pub fn reverse(&mut self) {
        self.attributes.reference_velocity = -self.attributes.reference_velocity;
    }

    /// Sets the time in s a duration based traversal takes.
    pub fn set_duration(&mut self, duration: f64) {
        self.attributes.duration = duration;
        self.needs_calibration = true;
    }

    /// Switches between position and time driven speed.
    pub fn set_mode(&mut self, mode: SpeedMode) {
        self.attributes.mode = mode;
        self.needs_calibration = true;
    }

    /// Replaces the speed multiplier curve.
    pub fn set_profile(&mut self, profile: SpeedProfile) {
        self.attributes.profile = profile;
        self.needs_calibration = true;
    }

    /// Begins a traversal from the head of the curve, or from its tail when
    /// the reference velocity is negative.
    pub fn start(&mut self, curve: &mut Curve) {
        curve.force_update_all();
        self.direction = Direction::of(self.attributes.reference_velocity);
        self.cursor = curve.head(self.direction);
        self.elapsed = 0.0;
        self.actual_velocity = 0.0;
        self.calibrate(curve);
        self.state = NavigatorState::Running;
        self.update_transform(curve);
        debug!(
            "Navigator started {:?} along {} segments (length {:.3})",
            self.direction,
            curve.segments().len(),
            curve.total_length()
        );
    }

    /// Halts the traversal; later ticks do nothing.
    pub fn stop(&mut self) {
        if self.state == NavigatorState::Running {
            debug!("Navigator stopped after {:.3}s", self.elapsed);
            self.state = NavigatorState::Stopped;
        }
    }

    /// Advances the traversal by one frame of `dt` seconds.
    ///
    /// Returns `None` unless the navigator is running.
    pub fn tick(&mut self, curve: &mut Curve, dt: f64) -> Option<Step> {
        if self.state != NavigatorState::Running {
            return None;
        }
        if self.attributes.always_update_current_segment
            && self.cursor.segment < curve.segments().len()
        {
            curve.force_update_around(self.cursor.segment);
        }
        let resized = (curve.total_length() - self.calibrated_length).abs() > DISTANCE_EPSILON;
        if self.needs_calibration || (resized && self.attributes.mode == SpeedMode::DurationBased) {
            self.calibrate(curve);
        }

        let velocity = self.velocity(curve, dt);
        self.elapsed += dt;
        self.actual_velocity = velocity;
        if velocity != 0.0 {
            self.direction = Direction::of(velocity);
        }

        let traversal = curve.resolve_distance(self.cursor, velocity * dt);
        self.cursor = traversal.cursor;
        if let Some(callback) = self.on_segment_changed.as_mut() {
            for &segment in &traversal.crossed {
                callback(segment);
            }
        }
        self.update_transform(curve);
        trace!(
            "Navigator at {:?} moving at {:.3} after {:.3}s",
            self.position,
            velocity,
            self.elapsed
        );

        if traversal.reached_end {
            self.state = NavigatorState::Completed;
            info!("Navigator reached the end of the path after {:.3}s", self.elapsed);
            if let Some(callback) = self.on_complete.as_mut() {
                callback();
            }
        }

        Some(Step {
            cursor: self.cursor,
            position: self.position,
            rotation: self.rotation,
            velocity,
            crossed: traversal.crossed,
            completed: traversal.reached_end,
        })
    }

    /// The signed velocity for a tick of `dt` seconds starting now.
    fn velocity(&self, curve: &Curve, dt: f64) -> f64 {
        let profile = &self.attributes.profile;
        match self.attributes.mode {
            SpeedMode::NodeBased => {
                let node = match curve.segments().is_empty() {
                    true => 0.0,
                    false => curve.node_position(&self.cursor),
                };
                self.attributes.reference_velocity * profile.evaluate(node)
            }
            SpeedMode::DurationBased => {
                let sign = Direction::of(self.attributes.reference_velocity).sign();
                let progress = (self.elapsed + 0.5 * dt) / self.attributes.duration;
                let progress = match curve.is_auto_connect() {
                    true => progress.rem_euclid(1.0),
                    false => progress.min(1.0),
                };
                sign * self.calibrated_velocity * profile.evaluate(progress)
            }
        }
    }

    /// Solves for the velocity which makes the time integral of speed match
    /// the length of the curve over the configured duration.
    fn calibrate(&mut self, curve: &Curve) {
        self.needs_calibration = false;
        if self.attributes.mode != SpeedMode::DurationBased {
            return;
        }
        let length = curve.total_length();
        self.calibrated_length = length;
        let duration = self.attributes.duration;
        if !(duration > 0.0) {
            warn!("Duration {} is not positive; using the reference velocity", duration);
            self.calibrated_velocity = self.attributes.reference_velocity.abs();
            return;
        }
        let integral = self.attributes.profile.integrate(PROFILE_INTEGRATION_STEPS);
        self.calibrated_velocity = if integral > f64::EPSILON {
            length / (duration * integral)
        } else {
            warn!("Speed profile integrates to {}; ignoring it for calibration", integral);
            length / duration
        };
        debug!(
            "Calibrated velocity {:.4} to travel {:.3} in {:.3}s",
            self.calibrated_velocity, length, duration
        );
    }

    fn update_transform(&mut self, curve: &Curve) {
        if curve.segments().is_empty() {
            return;
        }
        self.position = curve.position_at(&self.cursor);
        let facing = facing_rotation(
            curve.tangent_at(&self.cursor),
            self.direction,
            self.attributes.always_forward,
        );
        // Degenerate tangents keep the previous orientation
        if let Some(rotation) = facing {
            self.rotation = constrain_rotation(rotation, self.attributes.rotation_constraint);
        }
    }
}

impl std::fmt::Debug for PathNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathNavigator")
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("elapsed", &self.elapsed)
            .field("actual_velocity", &self.actual_velocity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::curve::CurveAttributes;
    use crate::math::FORWARD;
    use crate::point::{ControlPoint, Pose};
    use assert_approx_eq::assert_approx_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn line(length: f64) -> Curve {
        let handle = Vector3d::new(0.0, 0.0, length / 3.0);
        let attributes = CurveAttributes {
            sample_count: 31,
            ..Default::default()
        };
        Curve::with_points(
            &attributes,
            vec![
                ControlPoint::with_handles(Pose::default(), handle, -handle),
                ControlPoint::with_handles(Pose::at(Point3d::new(0.0, 0.0, length)), handle, -handle),
            ],
        )
    }

    #[test]
    fn idle_navigator_does_not_move() {
        let mut curve = line(10.0);
        let mut navigator = PathNavigator::new(&NavigatorAttributes::default());
        assert_eq!(navigator.state(), NavigatorState::Idle);
        assert!(navigator.tick(&mut curve, 0.1).is_none());
    }

    #[test]
    fn node_based_speed_follows_profile() {
        let mut curve = line(10.0);
        let mut navigator = PathNavigator::new(&NavigatorAttributes {
            reference_velocity: 2.0,
            profile: SpeedProfile::constant(1.5),
            ..Default::default()
        });
        navigator.start(&mut curve);
        let step = navigator.tick(&mut curve, 1.0).unwrap();
        assert_approx_eq!(step.velocity, 3.0);
        assert_approx_eq!(step.position.z, 3.0, 1e-9);
        assert_approx_eq!((step.rotation.rotate_vector(FORWARD) - FORWARD).magnitude(), 0.0, 1e-9);
    }

    #[test]
    fn duration_based_traversal_finishes_on_time() {
        let mut curve = line(12.0);
        let mut navigator = PathNavigator::new(&NavigatorAttributes {
            mode: SpeedMode::DurationBased,
            duration: 4.0,
            profile: SpeedProfile::linear(&[(0.0, 0.5), (1.0, 1.5)]),
            ..Default::default()
        });
        navigator.start(&mut curve);

        let dt = 0.01;
        let mut ticks = 0;
        while navigator.tick(&mut curve, dt).is_some() {
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert_eq!(navigator.state(), NavigatorState::Completed);
        assert_approx_eq!(navigator.elapsed(), 4.0, 0.02);
    }

    #[test]
    fn callbacks_fire_per_crossing_and_once_on_completion() {
        let mut curve = line(10.0);
        curve.add_point(ControlPoint::with_handles(
            Pose::at(Point3d::new(0.0, 0.0, 20.0)),
            Vector3d::new(0.0, 0.0, 3.0),
            Vector3d::new(0.0, 0.0, -3.0),
        ));
        assert_eq!(curve.segments().len(), 2);

        let crossed = Rc::new(RefCell::new(vec![]));
        let completions = Rc::new(RefCell::new(0));
        let mut navigator = PathNavigator::new(&NavigatorAttributes {
            reference_velocity: 100.0,
            ..Default::default()
        });
        {
            let crossed = crossed.clone();
            navigator.on_segment_changed(move |segment| crossed.borrow_mut().push(segment));
            let completions = completions.clone();
            navigator.on_complete(move || *completions.borrow_mut() += 1);
        }
        navigator.start(&mut curve);

        let step = navigator.tick(&mut curve, 1.0).unwrap();
        assert!(step.completed);
        assert_eq!(*crossed.borrow(), vec![1]);
        assert!(navigator.tick(&mut curve, 1.0).is_none());
        assert_eq!(*completions.borrow(), 1);
    }

    #[test]
    fn calibration_follows_length_changes() {
        let mut curve = line(10.0);
        let mut navigator = PathNavigator::new(&NavigatorAttributes {
            mode: SpeedMode::DurationBased,
            duration: 4.0,
            ..Default::default()
        });
        navigator.start(&mut curve);
        curve.set_point_position(1, Point3d::new(0.0, 0.0, 20.0));
        curve.commit();
        assert!(curve.total_length() > 19.0);

        while navigator.tick(&mut curve, 0.01).is_some() {
            assert!(navigator.elapsed() < 6.0);
        }
        assert_approx_eq!(navigator.elapsed(), 4.0, 0.02);
    }

    #[test]
    fn zero_length_path_completes() {
        let point = ControlPoint::with_handles(
            Pose::at(Point3d::new(2.0, 0.0, 2.0)),
            Vector3d::zero(),
            Vector3d::zero(),
        );
        let mut curve = Curve::with_points(&CurveAttributes::default(), vec![point.clone(), point]);
        let mut navigator = PathNavigator::new(&NavigatorAttributes::default());
        navigator.start(&mut curve);
        for _ in 0..10 {
            navigator.tick(&mut curve, 1.0);
        }
        assert_eq!(navigator.state(), NavigatorState::Completed);
    }

    #[test]
    fn stopped_navigator_stays_put() {
        let mut curve = line(10.0);
        let mut navigator = PathNavigator::new(&NavigatorAttributes::default());
        navigator.start(&mut curve);
        navigator.tick(&mut curve, 1.0);
        navigator.stop();
        let position = navigator.position();
        assert!(navigator.tick(&mut curve, 1.0).is_none());
        assert_eq!(navigator.position(), position);
        assert_eq!(navigator.state(), NavigatorState::Stopped);
    }

    #[test]
    fn negative_velocity_starts_from_the_tail() {
        let mut curve = line(10.0);
        let mut navigator = PathNavigator::new(&NavigatorAttributes {
            reference_velocity: -1.0,
            ..Default::default()
        });
        navigator.start(&mut curve);
        assert_approx_eq!(navigator.position().z, 10.0);
        let step = navigator.tick(&mut curve, 2.0).unwrap();
        assert_approx_eq!(step.position.z, 8.0, 1e-9);
        let facing = step.rotation.rotate_vector(FORWARD);
        assert_approx_eq!(facing.z, -1.0, 1e-9);
    }
}
