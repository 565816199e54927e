//! Tests that drive a navigator along a single path.

use std::cell::RefCell;
use std::rc::Rc;

use assert_approx_eq::assert_approx_eq;
use bezier_path::cgmath::prelude::*;
use bezier_path::math::{Point3d, Vector3d};
use bezier_path::{
    ControlPoint, Curve, CurveAttributes, Cursor, NavigatorAttributes, NavigatorState,
    PathNavigator, Pose, SpeedMode, SpeedProfile,
};

/// Two anchors 10 units apart along X, with handles 2 units along the chord.
fn straight() -> Curve {
    let handle = Vector3d::new(2.0, 0.0, 0.0);
    Curve::with_points(
        &CurveAttributes::default(),
        vec![
            ControlPoint::with_handles(Pose::at(Point3d::new(0.0, 0.0, 0.0)), handle, -handle),
            ControlPoint::with_handles(Pose::at(Point3d::new(10.0, 0.0, 0.0)), handle, -handle),
        ],
    )
}

fn square(closed: bool) -> Curve {
    let corners = [
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(10.0, 0.0, 0.0),
        Point3d::new(10.0, 0.0, 10.0),
        Point3d::new(0.0, 0.0, 10.0),
    ];
    let n = corners.len();
    let points = (0..n)
        .map(|i| {
            let handle = (corners[(i + 1) % n] - corners[(i + n - 1) % n]) / 6.0;
            ControlPoint::with_handles(Pose::at(corners[i]), handle, -handle)
        })
        .collect();
    let attributes = CurveAttributes {
        auto_connect: closed,
        sample_count: 24,
        ..Default::default()
    };
    Curve::with_points(&attributes, points)
}

fn navigator(velocity: f64) -> PathNavigator {
    PathNavigator::new(&NavigatorAttributes {
        reference_velocity: velocity,
        ..Default::default()
    })
}

/// Test the straight two point path.
#[test]
fn straight_segment() {
    let curve = straight();
    assert_eq!(curve.segments().len(), 1);
    assert_approx_eq!(curve.total_length(), 10.0, 1e-9);

    let mid = curve.segment(0).position_at(0.5);
    assert_approx_eq!(mid.distance(Point3d::new(5.0, 0.0, 0.0)), 0.0, 1e-9);

    let traversal = curve.resolve_distance(Cursor::default(), 10.0);
    assert!(traversal.reached_end);
    let end = curve.position_at(&traversal.cursor);
    assert_approx_eq!(end.distance(Point3d::new(10.0, 0.0, 0.0)), 0.0, 1e-9);
}

/// Test that one lap of a closed loop lands back on the first sample.
#[test]
fn closed_loop_wraps_around() {
    let curve = square(true);
    let traversal = curve.resolve_distance(Cursor::default(), curve.total_length());
    assert_eq!((traversal.cursor.segment, traversal.cursor.sample), (0, 0));
    assert!(!traversal.reached_end);

    let mut curve = curve;
    let mut nav = navigator(curve.total_length() / 4.0);
    nav.start(&mut curve);
    for _ in 0..20 {
        let step = nav.tick(&mut curve, 1.0).unwrap();
        assert!(!step.completed);
    }
    assert_eq!(nav.state(), NavigatorState::Running);
}

/// Test that running off the end of an open path completes exactly once.
#[test]
fn end_of_path_completes_once() {
    let mut curve = straight();
    let completions = Rc::new(RefCell::new(0));
    let mut nav = navigator(4.0);
    {
        let completions = completions.clone();
        nav.on_complete(move || *completions.borrow_mut() += 1);
    }
    nav.start(&mut curve);

    let mut ticks = 0;
    while nav.tick(&mut curve, 1.0).is_some() {
        ticks += 1;
    }
    assert_eq!(ticks, 3);
    assert_eq!(nav.state(), NavigatorState::Completed);
    assert_approx_eq!(nav.position().distance(Point3d::new(10.0, 0.0, 0.0)), 0.0, 1e-9);

    for _ in 0..5 {
        assert!(nav.tick(&mut curve, 1.0).is_none());
    }
    assert_eq!(*completions.borrow(), 1);
}

/// Test that reversing mid-path moves back by exactly one tick's distance.
#[test]
fn direction_reversal() {
    let mut curve = straight();
    let mut nav = navigator(1.0);
    nav.start(&mut curve);
    for _ in 0..3 {
        nav.tick(&mut curve, 1.0);
    }
    let reached = curve.distance_along(&nav.cursor());
    assert_approx_eq!(reached, 3.0, 1e-9);

    nav.reverse();
    let mut previous = reached;
    for _ in 0..2 {
        let step = nav.tick(&mut curve, 1.0).unwrap();
        let along = curve.distance_along(&step.cursor);
        assert_approx_eq!(previous - along, 1.0, 1e-9);
        assert!(step.velocity < 0.0);
        previous = along;
    }
    assert_approx_eq!(nav.position().x, 1.0, 1e-9);
}

/// Test that every boundary crossed is reported, in order.
#[test]
fn waypoints_fire_in_order() {
    let mut curve = square(true);
    let crossed = Rc::new(RefCell::new(vec![]));
    let mut nav = navigator(1.0);
    {
        let crossed = crossed.clone();
        nav.on_segment_changed(move |segment| crossed.borrow_mut().push(segment));
    }
    nav.start(&mut curve);

    // Two segments per tick, then a full lap in one
    let two = curve.segment(0).length() + curve.segment(1).length();
    nav.set_reference_velocity(two + 1e-3);
    nav.tick(&mut curve, 1.0);
    assert_eq!(*crossed.borrow(), vec![1, 2]);

    nav.set_reference_velocity(curve.total_length());
    nav.tick(&mut curve, 1.0);
    assert_eq!(*crossed.borrow(), vec![1, 2, 3, 0, 1, 2]);
}

/// Test that a duration based traversal takes its duration whatever the profile.
#[test]
fn duration_based_speed() {
    for profile in [
        SpeedProfile::constant(1.0),
        SpeedProfile::linear(&[(0.0, 2.0), (1.0, 0.5)]),
        SpeedProfile::linear(&[(0.0, 0.5), (0.5, 2.0), (1.0, 0.5)]),
    ] {
        let mut curve = square(false);
        let mut nav = PathNavigator::new(&NavigatorAttributes {
            mode: SpeedMode::DurationBased,
            duration: 5.0,
            profile,
            ..Default::default()
        });
        nav.start(&mut curve);
        let dt = 0.005;
        while nav.tick(&mut curve, dt).is_some() {
            assert!(nav.elapsed() < 6.0);
        }
        assert_approx_eq!(nav.elapsed(), 5.0, 0.05);
    }
}

/// Test that edits to the current segment are picked up while travelling.
#[test]
fn live_edits_follow_the_current_segment() {
    let mut curve = straight();
    let mut nav = PathNavigator::new(&NavigatorAttributes {
        always_update_current_segment: true,
        ..Default::default()
    });
    nav.start(&mut curve);
    nav.tick(&mut curve, 1.0);

    curve.set_point_position(1, Point3d::new(20.0, 0.0, 0.0));
    let step = nav.tick(&mut curve, 1.0).unwrap();
    assert!(curve.total_length() > 15.0);
    assert!(step.position.x < 3.0);
}
