use super::{Quat, Vector3d};
use cgmath::prelude::*;
use cgmath::Matrix3;

/// Vectors shorter than this are treated as having no direction.
pub const DIRECTION_EPSILON: f64 = 1e-9;

/// The local forward axis of control points and moving objects.
pub const FORWARD: Vector3d = Vector3d::new(0.0, 0.0, 1.0);

/// The world up axis used when deriving orientations.
pub const UP: Vector3d = Vector3d::new(0.0, 1.0, 0.0);

/// Normalises a vector, or returns `None` if it is too short to have a direction.
#[inline]
pub fn try_normalize(v: Vector3d) -> Option<Vector3d> {
    let mag = v.magnitude();
    (mag > DIRECTION_EPSILON && mag.is_finite()).then(|| v / mag)
}

/// Wraps an angle in degrees into the range (-180, 180].
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Computes the rotation which maps the local forward axis onto `forward`,
/// keeping the local up axis as close to `up` as possible.
///
/// Returns `None` if `forward` has no direction.
pub fn look_rotation(forward: Vector3d, up: Vector3d) -> Option<Quat> {
    let forward = try_normalize(forward)?;
    match try_normalize(up.cross(forward)) {
        Some(right) => {
            let up = forward.cross(right);
            Some(Quat::from(Matrix3::from_cols(right, up, forward)))
        }
        // Looking straight along `up`
        None => Some(Quat::from_arc(FORWARD, forward, Some(UP))),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn wraps_degrees() {
        assert_approx_eq!(wrap_degrees(0.0), 0.0);
        assert_approx_eq!(wrap_degrees(180.0), 180.0);
        assert_approx_eq!(wrap_degrees(-180.0), 180.0);
        assert_approx_eq!(wrap_degrees(190.0), -170.0);
        assert_approx_eq!(wrap_degrees(720.0 + 45.0), 45.0);
        assert_approx_eq!(wrap_degrees(-90.0), -90.0);
    }

    #[test]
    fn look_rotation_faces_forward() {
        for dir in [
            Vector3d::new(1.0, 0.0, 0.0),
            Vector3d::new(0.0, 0.0, -3.0),
            Vector3d::new(1.0, 2.0, 3.0),
            Vector3d::new(0.0, 5.0, 0.0),
        ] {
            let rot = look_rotation(dir, UP).unwrap();
            let facing = rot.rotate_vector(FORWARD);
            assert_approx_eq!((facing - dir.normalize()).magnitude(), 0.0, 1e-9);
        }
    }

    #[test]
    fn degenerate_directions() {
        assert!(try_normalize(Vector3d::new(0.0, 0.0, 0.0)).is_none());
        assert!(look_rotation(Vector3d::new(0.0, 0.0, 0.0), UP).is_none());
        assert!(try_normalize(Vector3d::new(f64::NAN, 0.0, 0.0)).is_none());
    }
}
