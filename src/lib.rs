pub use cgmath;
pub use curve::{Crossings, Curve, CurveAttributes, Cursor, Traversal};
pub use error::{Error, Result};
pub use navigator::{
    Keyframe, NavigatorAttributes, NavigatorState, PathNavigator, SpeedMode, SpeedProfile, Step,
    PROFILE_INTEGRATION_STEPS,
};
pub use persist::{PathRecord, PointRecord};
pub use point::{ControlPoint, Handle, HandleKind, Pose, Transform, DEFAULT_HANDLE_LENGTH};
pub use segment::{CurveSegment, Direction, DEFAULT_SAMPLE_COUNT};
pub use util::Interval;

mod curve;
mod error;
pub mod math;
mod navigator;
mod persist;
mod point;
mod segment;
mod util;
