use crate::math::{look_rotation, wrap_degrees, Quat, Vector3d, UP};
use crate::segment::Direction;
use cgmath::{Deg, Euler, Rad};

/// Limits of at least this many degrees leave an axis unconstrained.
const UNCONSTRAINED: f64 = 180.0;

/// Computes the orientation of an object travelling along `tangent` in `direction`.
///
/// Unless `always_forward` is set, an object moving backwards turns to face
/// the way it is going. Returns `None` for a vanishing tangent.
pub fn facing_rotation(
    tangent: Option<Vector3d>,
    direction: Direction,
    always_forward: bool,
) -> Option<Quat> {
    let forward = match direction {
        Direction::Backward if !always_forward => -tangent?,
        _ => tangent?,
    };
    look_rotation(forward, UP)
}

/// Clamps each Euler angle of `rotation`, wrapped into (-180, 180], to
/// plus or minus the matching component of `limits` in degrees.
pub fn constrain_rotation(rotation: Quat, limits: Vector3d) -> Quat {
    if limits.x.abs() >= UNCONSTRAINED
        && limits.y.abs() >= UNCONSTRAINED
        && limits.z.abs() >= UNCONSTRAINED
    {
        return rotation;
    }
    let euler: Euler<Rad<f64>> = rotation.into();
    let clamp = |angle: Rad<f64>, limit: f64| {
        let degrees = wrap_degrees(Deg::from(angle).0);
        let limit = limit.abs();
        Deg(degrees.clamp(-limit, limit))
    };
    Quat::from(Euler::new(
        clamp(euler.x, limits.x),
        clamp(euler.y, limits.y),
        clamp(euler.z, limits.z),
    ))
}
