use std::collections::BTreeMap;

use cgmath::{Matrix4, Quaternion, SquareMatrix, Vector3};
use mint;

use object::ObjectId;

/// Handle of a [`SceneNode`](struct.SceneNode.html) in its [`Scene`](struct.Scene.html).
///
/// Handles are never reused by a scene, even after the node is destroyed.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(pub(crate) usize);

bitflags! {
    pub(crate) struct NodeFlags: u8 {
        const LOCAL_DIRTY   = 1 << 0;
        const DERIVED_DIRTY = 1 << 1;
        const VISIBLE       = 1 << 2;
        const DISPLAYABLE   = 1 << 3;
    }
}

/// Node of the scene graph.
///
/// The local matrix is rebuilt from position, orientation and scale only
/// when they changed; the derived matrix only when the node or one of its
/// ancestors changed. Both are computed on request through the owning
/// [`Scene`](struct.Scene.html).
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub(crate) name: String,
    pub(crate) position: Vector3<f32>,
    pub(crate) orientation: Quaternion<f32>,
    pub(crate) scale: Vector3<f32>,
    pub(crate) matrix: Matrix4<f32>,
    pub(crate) derived_matrix: Matrix4<f32>,
    pub(crate) flags: NodeFlags,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: BTreeMap<String, NodeId>,
    pub(crate) objects: BTreeMap<String, ObjectId>,
}

impl SceneNode {
    pub(crate) fn new(name: &str) -> Self {
        SceneNode {
            name: name.to_string(),
            position: Vector3::new(0.0, 0.0, 0.0),
            orientation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            matrix: Matrix4::identity(),
            derived_matrix: Matrix4::identity(),
            flags: NodeFlags::LOCAL_DIRTY | NodeFlags::DERIVED_DIRTY | NodeFlags::VISIBLE,
            parent: None,
            children: BTreeMap::new(),
            objects: BTreeMap::new(),
        }
    }

    /// Name of the node, unique in its scene.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position relative to the parent.
    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    /// Orientation relative to the parent.
    pub fn orientation(&self) -> Quaternion<f32> {
        self.orientation
    }

    /// Scale relative to the parent.
    pub fn scale(&self) -> Vector3<f32> {
        self.scale
    }

    /// Parent node.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes by name.
    pub fn children(&self) -> &BTreeMap<String, NodeId> {
        &self.children
    }

    /// Attached movable objects by name.
    pub fn objects(&self) -> &BTreeMap<String, ObjectId> {
        &self.objects
    }

    /// Invisible nodes are not rendered by cameras.
    pub fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    /// `true` for the root and for nodes attached below a displayable node.
    pub fn is_displayable(&self) -> bool {
        self.flags.contains(NodeFlags::DISPLAYABLE)
    }

    /// `true` until the local matrix is rebuilt after a change.
    pub fn is_local_dirty(&self) -> bool {
        self.flags.contains(NodeFlags::LOCAL_DIRTY)
    }

    /// `true` until the derived matrix is rebuilt after a change of the
    /// node or of one of its ancestors.
    pub fn is_derived_dirty(&self) -> bool {
        self.flags.contains(NodeFlags::DERIVED_DIRTY)
    }

    pub(crate) fn local_matrix(&mut self) -> Matrix4<f32> {
        if self.flags.contains(NodeFlags::LOCAL_DIRTY) {
            self.matrix = Matrix4::from_translation(self.position)
                * Matrix4::from(self.orientation)
                * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
            self.flags.remove(NodeFlags::LOCAL_DIRTY);
        }
        self.matrix
    }

    pub(crate) fn transform(&self) -> NodeTransform {
        NodeTransform::new(self.position, self.orientation, self.scale)
    }
}

/// Position, rotation and scale of a [`SceneNode`](struct.SceneNode.html).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeTransform {
    /// Position.
    pub position: mint::Point3<f32>,
    /// Orientation.
    pub orientation: mint::Quaternion<f32>,
    /// Scale.
    pub scale: mint::Vector3<f32>,
}

impl NodeTransform {
    pub(crate) fn new(
        position: Vector3<f32>,
        orientation: Quaternion<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        let pos: mint::Vector3<f32> = position.into();
        NodeTransform {
            position: pos.into(),
            orientation: orientation.into(),
            scale: scale.into(),
        }
    }
}

/// General information about a scene node.
#[derive(Clone, Debug)]
pub struct NodeInfo {
    /// Relative to parent transform.
    pub transform: NodeTransform,
    /// World transform (relative to the scene's root).
    pub world_transform: NodeTransform,
    /// Derived matrix.
    pub world_matrix: mint::ColumnMatrix4<f32>,
    /// Is the node visible by cameras or not?
    pub visible: bool,
    /// Is the node under the scene's root?
    pub displayable: bool,
}
