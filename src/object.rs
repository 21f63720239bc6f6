use node::NodeId;

/// Handle of a [`MovableObject`](struct.MovableObject.html) in its scene.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectId(pub(crate) usize);

/// What a movable object stands for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ObjectKind {
    /// A placed mesh instance.
    Geometry,
    /// A camera.
    Camera,
    /// A light source.
    Light,
}

/// An entity that can be attached to a [`SceneNode`](struct.SceneNode.html).
///
/// The node doesn't own the object, it only keeps its handle. The object
/// keeps a back-reference to the node it is attached to.
#[derive(Clone, Debug, PartialEq)]
pub struct MovableObject {
    pub(crate) name: String,
    pub(crate) kind: ObjectKind,
    pub(crate) parent: Option<NodeId>,
}

impl MovableObject {
    /// Creates a detached object.
    pub fn new(
        name: &str,
        kind: ObjectKind,
    ) -> Self {
        MovableObject {
            name: name.to_string(),
            kind,
            parent: None,
        }
    }

    /// Name of the object, unique in its scene.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What the object stands for.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Node this object is attached to.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}
