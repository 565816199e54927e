use std::time::Instant;

use bezier_path::math::{Point3d, Vector3d};
use bezier_path::{
    ControlPoint, Curve, CurveAttributes, NavigatorAttributes, PathNavigator, PathRecord, Pose,
    SpeedProfile, Transform,
};

const NUM_FRAMES: u32 = 600;
const FRAME_TIME: f64 = 1.0 / 60.0;

/// A closed loop through the corners of a 10 x 10 square.
fn square_loop() -> Curve {
    let corners = [
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(10.0, 0.0, 0.0),
        Point3d::new(10.0, 0.0, 10.0),
        Point3d::new(0.0, 0.0, 10.0),
    ];
    let points = (0..corners.len())
        .map(|i| {
            let prev = corners[(i + corners.len() - 1) % corners.len()];
            let next = corners[(i + 1) % corners.len()];
            let handle: Vector3d = (next - prev) / 6.0;
            ControlPoint::with_handles(Pose::at(corners[i]), handle, -handle)
        })
        .collect();
    let attributes = CurveAttributes {
        auto_connect: true,
        sample_count: 32,
        ..Default::default()
    };
    Curve::with_points(&attributes, points)
}

fn main() -> bezier_path::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let mut curve = match std::env::args().nth(1) {
        Some(path) => PathRecord::read(std::fs::File::open(path)?)?.into_curve(Transform::identity())?,
        None => square_loop(),
    };
    log::info!(
        "Path of {} points, {} segments, length {:.3}",
        curve.points().len(),
        curve.segments().len(),
        curve.total_length()
    );

    let mut navigator = PathNavigator::new(&NavigatorAttributes {
        reference_velocity: 5.0,
        profile: SpeedProfile::linear(&[(0.0, 0.5), (0.5, 1.5), (1.0, 0.5)]),
        ..Default::default()
    });
    navigator.on_segment_changed(|segment| println!("Entered segment {}", segment));
    navigator.on_complete(|| println!("Reached the end of the path"));
    navigator.start(&mut curve);

    let start = Instant::now();
    let mut frames = 0;
    for frame in 0..NUM_FRAMES {
        let Some(step) = navigator.tick(&mut curve, FRAME_TIME) else {
            break;
        };
        frames += 1;
        if frame % 30 == 0 {
            let p = step.position;
            println!(
                "t = {:>6.3}s  pos = ({:>7.3}, {:>7.3}, {:>7.3})  v = {:.3}",
                navigator.elapsed(),
                p.x,
                p.y,
                p.z,
                step.velocity
            );
        }
    }
    let frame = start.elapsed() / frames.max(1);
    println!("Avg. tick: {:?} over {} ticks", frame, frames);
    Ok(())
}
