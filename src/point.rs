use crate::math::{Point3d, Quat, Vector3d, FORWARD};
use cgmath::prelude::*;
use cgmath::One;
use serde::{Deserialize, Serialize};

/// The distance of a new control point's handles from its anchor.
pub const DEFAULT_HANDLE_LENGTH: f64 = 1.0;

/// A position and orientation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point3d,
    pub rotation: Quat,
}

impl Pose {
    pub const fn new(position: Point3d, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// A pose at `position` with no rotation.
    pub fn at(position: Point3d) -> Self {
        Self::new(position, Quat::one())
    }

    /// Maps an offset in this pose's frame to a point in the parent frame.
    pub fn derive_world(&self, local_offset: Vector3d) -> Point3d {
        self.position + self.rotation.rotate_vector(local_offset)
    }

    /// The inverse of [Pose::derive_world].
    pub fn derive_local(&self, world: Point3d) -> Vector3d {
        self.rotation.invert().rotate_vector(world - self.position)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Point3d::origin())
    }
}

/// The placement of a curve in the world, which its control points are relative to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Point3d,
    pub rotation: Quat,
    pub scale: Vector3d,
}

impl Transform {
    /// Gets a transform which leaves positions and rotations unchanged.
    pub fn identity() -> Self {
        Self {
            position: Point3d::origin(),
            rotation: Quat::one(),
            scale: Vector3d::new(1.0, 1.0, 1.0),
        }
    }

    /// Maps a point relative to the curve into the world.
    pub fn transform_point(&self, local: Point3d) -> Point3d {
        let scaled = local.to_vec().mul_element_wise(self.scale);
        self.position + self.rotation.rotate_vector(scaled)
    }

    /// Maps a world point into the curve's space.
    pub fn inverse_transform_point(&self, world: Point3d) -> Point3d {
        let unrotated = self.rotation.invert().rotate_vector(world - self.position);
        Point3d::from_vec(unrotated.div_element_wise(self.scale))
    }

    /// Maps a rotation relative to the curve into the world.
    pub fn transform_rotation(&self, local: Quat) -> Quat {
        self.rotation * local
    }

    /// Maps a world rotation into the curve's space.
    pub fn inverse_transform_rotation(&self, world: Quat) -> Quat {
        self.rotation.invert() * world
    }

    /// Maps a pose relative to this transform into the world.
    pub fn transform_pose(&self, local: &Pose) -> Pose {
        Pose::new(
            self.transform_point(local.position),
            self.transform_rotation(local.rotation),
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Identifies one of the two handles of a [ControlPoint].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// The handle shaping the segment leaving the point.
    Outgoing = 0,
    /// The handle shaping the segment arriving at the point.
    Incoming = 1,
}

impl HandleKind {
    /// Gets the index of the handle within a control point.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Gets the handle on the other side of the anchor.
    pub const fn opposite(self) -> Self {
        match self {
            HandleKind::Outgoing => HandleKind::Incoming,
            HandleKind::Incoming => HandleKind::Outgoing,
        }
    }
}

/// An off-curve control point of a [ControlPoint].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Handle {
    /// The offset from the anchor, in the anchor's frame.
    local_position: Vector3d,
    /// The derived world position.
    position: Point3d,
}

impl Handle {
    /// Gets the offset from the anchor, in the anchor's frame.
    pub fn local_position(&self) -> Vector3d {
        self.local_position
    }

    /// Gets the world position of the handle.
    pub fn position(&self) -> Point3d {
        self.position
    }
}

/// An anchor on the curve plus the two handles which set its tangents.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlPoint {
    /// The pose relative to the owning curve.
    local: Pose,
    /// The derived world pose.
    world: Pose,
    /// Indexed by [HandleKind].
    handles: [Handle; 2],
    /// Whether the handles are kept mirrored through the anchor.
    auto_smooth: bool,
}

impl ControlPoint {
    /// Creates a control point with handles along its local forward and back axes.
    pub fn new(local: Pose) -> Self {
        let offset = FORWARD * DEFAULT_HANDLE_LENGTH;
        Self::with_handles(local, offset, -offset)
    }

    /// Creates a control point with the given local handle offsets.
    pub fn with_handles(local: Pose, outgoing: Vector3d, incoming: Vector3d) -> Self {
        let mut point = Self {
            local,
            world: local,
            handles: [
                Handle {
                    local_position: outgoing,
                    position: Point3d::origin(),
                },
                Handle {
                    local_position: incoming,
                    position: Point3d::origin(),
                },
            ],
            auto_smooth: false,
        };
        point.update_handles();
        point
    }

    /// The world position of the anchor.
    pub fn position(&self) -> Point3d {
        self.world.position
    }

    /// Gets the world rotation of the anchor.
    pub fn rotation(&self) -> Quat {
        self.world.rotation
    }

    /// The pose relative to the owning curve.
    pub fn local_pose(&self) -> Pose {
        self.local
    }

    /// Gets the derived world pose.
    pub fn world_pose(&self) -> Pose {
        self.world
    }

    /// Gets one of the two handles.
    pub fn handle(&self, kind: HandleKind) -> &Handle {
        &self.handles[kind.index()]
    }

    /// Whether the handles are kept mirrored through the anchor.
    pub fn is_auto_smooth(&self) -> bool {
        self.auto_smooth
    }

    /// Moves the anchor to a world position, carrying the handles along.
    pub fn set_position(&mut self, position: Point3d, parent: &Transform) {
        self.world.position = position;
        self.local.position = parent.inverse_transform_point(position);
        self.update_handles();
    }

    /// Moves the anchor to a position relative to the owning curve.
    pub fn set_local_position(&mut self, position: Point3d, parent: &Transform) {
        self.local.position = position;
        self.world.position = parent.transform_point(position);
        self.update_handles();
    }

    /// Rotates the anchor to a world orientation, carrying the handles with it.
    pub fn set_rotation(&mut self, rotation: Quat, parent: &Transform) {
        self.world.rotation = rotation;
        self.local.rotation = parent.inverse_transform_rotation(rotation);
        self.update_handles();
    }

    /// Rotates the anchor relative to the owning curve.
    pub fn set_local_rotation(&mut self, rotation: Quat, parent: &Transform) {
        self.local.rotation = rotation;
        self.world.rotation = parent.transform_rotation(rotation);
        self.update_handles();
    }

    /// Re-derives the world pose after the owning curve has moved.
    pub fn update_world(&mut self, parent: &Transform) {
        self.world = parent.transform_pose(&self.local);
        self.update_handles();
    }

    /// Sets a handle's offset from the anchor.
    ///
    /// With auto-smooth enabled the opposite handle is mirrored through the anchor.
    pub fn set_local_handle_position(&mut self, kind: HandleKind, local_position: Vector3d) {
        self.write_handle(kind, local_position);
        if self.auto_smooth {
            self.write_handle(kind.opposite(), -local_position);
        }
    }

    /// Moves a handle to a world position.
    pub fn set_handle_position(&mut self, kind: HandleKind, position: Point3d) {
        let local_position = self.world.derive_local(position);
        self.set_local_handle_position(kind, local_position);
    }

    /// Enables or disables handle mirroring. Enabling it mirrors the
    /// incoming handle from the outgoing one straight away.
    pub fn set_auto_smooth(&mut self, auto_smooth: bool) {
        self.auto_smooth = auto_smooth;
        if auto_smooth {
            self.smooth_handles(HandleKind::Outgoing);
        }
    }

    /// Places the handle opposite to `reference` antipodal to it about the anchor.
    pub fn smooth_handles(&mut self, reference: HandleKind) {
        let mirrored = -self.handles[reference.index()].local_position;
        self.write_handle(reference.opposite(), mirrored);
    }

    fn write_handle(&mut self, kind: HandleKind, local_position: Vector3d) {
        let handle = &mut self.handles[kind.index()];
        handle.local_position = local_position;
        handle.position = self.world.derive_world(local_position);
    }

    fn update_handles(&mut self) {
        for handle in &mut self.handles {
            handle.position = self.world.derive_world(handle.local_position);
        }
    }
}

impl Default for ControlPoint {
    fn default() -> Self {
        Self::new(Pose::default())
    }
}
