//! Scene graph registry.

use std::collections::{BTreeMap, HashMap};

use cgmath::{Matrix4, Quaternion, Rad, Rotation3, Vector3};
use mint;
use vec_map::VecMap;

use animation::{AnimatedObjectGroup, Animation, LocalPose, MovingKind, State};
use node::{NodeFlags, NodeId, NodeInfo, NodeTransform, SceneNode};
use object::{MovableObject, ObjectId, ObjectKind};

/// Name of the node every scene is rooted at.
pub const ROOT_NAME: &str = "RootNode";

/// Game scene: owns every node, movable object and animated object group.
///
/// Relationships between nodes and objects are stored as handles into the
/// scene, which is the only owner. Requests on unknown handles are ignored.
#[derive(Debug)]
pub struct Scene {
    name: String,
    root: NodeId,
    nodes: VecMap<SceneNode>,
    node_names: HashMap<String, NodeId>,
    objects: VecMap<MovableObject>,
    object_names: HashMap<String, ObjectId>,
    groups: BTreeMap<String, AnimatedObjectGroup>,
    next_node: usize,
    next_object: usize,
}

impl Scene {
    /// Creates a scene holding only its displayable root node.
    pub fn new(name: &str) -> Self {
        let mut root = SceneNode::new(ROOT_NAME);
        root.flags.insert(NodeFlags::DISPLAYABLE);
        let mut nodes = VecMap::new();
        nodes.insert(0, root);
        let mut node_names = HashMap::new();
        node_names.insert(ROOT_NAME.to_string(), NodeId(0));
        Scene {
            name: name.to_string(),
            root: NodeId(0),
            nodes,
            node_names,
            objects: VecMap::new(),
            object_names: HashMap::new(),
            groups: BTreeMap::new(),
            next_node: 1,
            next_object: 0,
        }
    }

    /// Name of the scene.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node called `name`, creating it below `parent` (or below
    /// the root) if there is none.
    pub fn create_node(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
    ) -> NodeId {
        if name == ROOT_NAME {
            warn!("Can't create another {} in scene {:?}", ROOT_NAME, self.name);
            return self.root;
        }
        if let Some(&id) = self.node_names.get(name) {
            return id;
        }

        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id.0, SceneNode::new(name));
        self.node_names.insert(name.to_string(), id);
        info!("Created node {:?} in scene {:?}", name, self.name);

        let parent = parent.unwrap_or(self.root);
        self.attach_to(id, parent);
        id
    }

    /// Creates a node with a generated `SceneNode_<n>` name.
    pub fn create_unnamed_node(
        &mut self,
        parent: Option<NodeId>,
    ) -> NodeId {
        let mut name = format!("SceneNode_{}", self.next_node);
        while self.node_names.contains_key(&name) {
            self.next_node += 1;
            name = format!("SceneNode_{}", self.next_node);
        }
        self.create_node(&name, parent)
    }

    /// Returns the node behind `id`.
    pub fn node(
        &self,
        id: NodeId,
    ) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    /// Looks up a node by name.
    pub fn find_node(
        &self,
        name: &str,
    ) -> Option<NodeId> {
        self.node_names.get(name).cloned()
    }

    /// Iterates over all nodes.
    pub fn nodes<'a>(&'a self) -> impl Iterator<Item = (NodeId, &'a SceneNode)> + 'a {
        self.nodes.iter().map(|(index, node)| (NodeId(index), node))
    }

    /// Removes a node from the scene.
    ///
    /// The node is detached from its parent, its children are detached and
    /// kept, its objects are unlinked. The root can't be destroyed.
    pub fn destroy_node(
        &mut self,
        id: NodeId,
    ) -> bool {
        if id == self.root {
            warn!("Can't destroy the root node of scene {:?}", self.name);
            return false;
        }
        if !self.nodes.contains_key(id.0) {
            return false;
        }

        self.detach(id);
        self.detach_all_children(id);
        let node = match self.nodes.remove(id.0) {
            Some(node) => node,
            None => return false,
        };
        for (_, object) in node.objects {
            if let Some(object) = self.objects.get_mut(object.0) {
                object.parent = None;
            }
        }
        self.node_names.remove(&node.name);
        info!("Destroyed node {:?} in scene {:?}", node.name, self.name);
        true
    }

    fn for_each_descendant<F>(
        &mut self,
        id: NodeId,
        mut f: F,
    ) where
        F: FnMut(&mut SceneNode),
    {
        let mut stack: Vec<NodeId> = match self.nodes.get(id.0) {
            Some(node) => node.children.values().cloned().collect(),
            None => return,
        };
        while let Some(child) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(child.0) {
                f(node);
                stack.extend(node.children.values().cloned());
            }
        }
    }

    fn modify<F>(
        &mut self,
        id: NodeId,
        f: F,
    ) where
        F: FnOnce(&mut SceneNode),
    {
        match self.nodes.get_mut(id.0) {
            Some(node) => {
                f(node);
                node.flags.insert(NodeFlags::LOCAL_DIRTY | NodeFlags::DERIVED_DIRTY);
            }
            None => return,
        }
        self.for_each_descendant(id, |node| node.flags.insert(NodeFlags::DERIVED_DIRTY));
    }

    /// Sets the position relative to the parent.
    pub fn set_position<P>(
        &mut self,
        id: NodeId,
        position: P,
    ) where
        P: Into<mint::Point3<f32>>,
    {
        let p: mint::Point3<f32> = position.into();
        self.modify(id, |node| node.position = Vector3::new(p.x, p.y, p.z));
    }

    /// Sets the orientation relative to the parent.
    pub fn set_orientation<Q>(
        &mut self,
        id: NodeId,
        orientation: Q,
    ) where
        Q: Into<mint::Quaternion<f32>>,
    {
        let q: mint::Quaternion<f32> = orientation.into();
        let q = Quaternion::from(q);
        self.modify(id, |node| node.orientation = q);
    }

    /// Sets the scale relative to the parent.
    pub fn set_scale<V>(
        &mut self,
        id: NodeId,
        scale: V,
    ) where
        V: Into<mint::Vector3<f32>>,
    {
        let s: mint::Vector3<f32> = scale.into();
        let s = Vector3::from(s);
        self.modify(id, |node| node.scale = s);
    }

    /// Moves the node by `offset`.
    pub fn translate<V>(
        &mut self,
        id: NodeId,
        offset: V,
    ) where
        V: Into<mint::Vector3<f32>>,
    {
        let offset: mint::Vector3<f32> = offset.into();
        let offset = Vector3::from(offset);
        self.modify(id, |node| node.position += offset);
    }

    /// Composes `rotation` after the current orientation.
    pub fn rotate<Q>(
        &mut self,
        id: NodeId,
        rotation: Q,
    ) where
        Q: Into<mint::Quaternion<f32>>,
    {
        let rotation: mint::Quaternion<f32> = rotation.into();
        let rotation = Quaternion::from(rotation);
        self.modify(id, |node| node.orientation = node.orientation * rotation);
    }

    /// Rotates around the Y axis.
    pub fn yaw<A>(
        &mut self,
        id: NodeId,
        angle: A,
    ) where
        A: Into<Rad<f32>>,
    {
        let rotation: Quaternion<f32> = Quaternion::from_angle_y(angle);
        self.rotate(id, rotation);
    }

    /// Rotates around the X axis.
    pub fn pitch<A>(
        &mut self,
        id: NodeId,
        angle: A,
    ) where
        A: Into<Rad<f32>>,
    {
        let rotation: Quaternion<f32> = Quaternion::from_angle_x(angle);
        self.rotate(id, rotation);
    }

    /// Rotates around the Z axis.
    pub fn roll<A>(
        &mut self,
        id: NodeId,
        angle: A,
    ) where
        A: Into<Rad<f32>>,
    {
        let rotation: Quaternion<f32> = Quaternion::from_angle_z(angle);
        self.rotate(id, rotation);
    }

    /// Multiplies the scale component-wise by `factor`.
    pub fn scale_by<V>(
        &mut self,
        id: NodeId,
        factor: V,
    ) where
        V: Into<mint::Vector3<f32>>,
    {
        let f: mint::Vector3<f32> = factor.into();
        let f = Vector3::from(f);
        self.modify(id, |node| {
            node.scale = Vector3::new(node.scale.x * f.x, node.scale.y * f.y, node.scale.z * f.z)
        });
    }

    /// Invisible nodes are not rendered by cameras.
    pub fn set_visible(
        &mut self,
        id: NodeId,
        visible: bool,
    ) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.flags.set(NodeFlags::VISIBLE, visible);
        }
    }

    /// Local matrix of the node, rebuilt if its components changed.
    pub fn transformation_matrix(
        &mut self,
        id: NodeId,
    ) -> Option<Matrix4<f32>> {
        self.nodes.get_mut(id.0).map(SceneNode::local_matrix)
    }

    /// World matrix of the node, rebuilt if it or an ancestor changed.
    pub fn derived_transformation_matrix(
        &mut self,
        id: NodeId,
    ) -> Option<Matrix4<f32>> {
        let (dirty, parent) = {
            let node = self.nodes.get(id.0)?;
            (node.is_derived_dirty(), node.parent)
        };
        if !dirty {
            return self.nodes.get(id.0).map(|node| node.derived_matrix);
        }

        let parent_matrix = match parent {
            Some(parent) => self.derived_transformation_matrix(parent),
            None => None,
        };
        let node = self.nodes.get_mut(id.0)?;
        let local = node.local_matrix();
        node.derived_matrix = match parent_matrix {
            Some(parent) => parent * local,
            None => local,
        };
        node.flags.remove(NodeFlags::DERIVED_DIRTY);
        Some(node.derived_matrix)
    }

    /// World position: translation of the derived matrix.
    pub fn derived_position(
        &mut self,
        id: NodeId,
    ) -> Option<Vector3<f32>> {
        self.derived_transformation_matrix(id).map(|m| m.w.truncate())
    }

    /// World orientation: the orientations composed along the ancestry.
    pub fn derived_orientation(
        &self,
        id: NodeId,
    ) -> Option<Quaternion<f32>> {
        let mut node = self.nodes.get(id.0)?;
        let mut orientation = node.orientation;
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(p.0)) {
            orientation = parent.orientation * orientation;
            node = parent;
        }
        Some(orientation)
    }

    /// World scale: the scales multiplied along the ancestry.
    pub fn derived_scale(
        &self,
        id: NodeId,
    ) -> Option<Vector3<f32>> {
        let mut node = self.nodes.get(id.0)?;
        let mut scale = node.scale;
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(p.0)) {
            scale = Vector3::new(scale.x * parent.scale.x, scale.y * parent.scale.y, scale.z * parent.scale.z);
            node = parent;
        }
        Some(scale)
    }

    fn relink(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
    ) {
        let (name, old) = match self.nodes.get(id.0) {
            Some(node) => (node.name.clone(), node.parent),
            None => return,
        };
        if let Some(old) = old.and_then(|old| self.nodes.get_mut(old.0)) {
            old.children.remove(&name);
        }

        let displayable = match parent {
            Some(parent) => match self.nodes.get_mut(parent.0) {
                Some(node) => {
                    node.children.insert(name, id);
                    node.is_displayable()
                }
                None => false,
            },
            None => false,
        };

        if let Some(node) = self.nodes.get_mut(id.0) {
            node.parent = parent;
            node.flags.set(NodeFlags::DISPLAYABLE, displayable);
            node.flags.insert(NodeFlags::DERIVED_DIRTY);
        }
        self.for_each_descendant(id, |node| {
            node.flags.set(NodeFlags::DISPLAYABLE, displayable);
            node.flags.insert(NodeFlags::DERIVED_DIRTY);
        });
    }

    /// Attaches `id` below `parent`, detaching it from its current parent.
    ///
    /// Refused when `parent` is the node itself or one of its descendants.
    pub fn attach_to(
        &mut self,
        id: NodeId,
        parent: NodeId,
    ) -> bool {
        if !self.nodes.contains_key(id.0) || !self.nodes.contains_key(parent.0) {
            return false;
        }
        if id == self.root {
            error!("The root node of scene {:?} can't be attached", self.name);
            return false;
        }
        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == id {
                error!("Node {:?} can't be attached below itself", self.nodes[id.0].name);
                return false;
            }
            ancestor = self.nodes.get(current.0).and_then(|node| node.parent);
        }

        debug!("Attaching {:?} to {:?}", self.nodes[id.0].name, self.nodes[parent.0].name);
        self.relink(id, Some(parent));
        true
    }

    /// Attaches `child` below `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> bool {
        self.attach_to(child, parent)
    }

    /// Detaches the node from its parent.
    ///
    /// The node and its descendants stop being displayable. The root is
    /// left displayable.
    pub fn detach(
        &mut self,
        id: NodeId,
    ) {
        if id == self.root {
            if let Some(root) = self.nodes.get_mut(id.0) {
                root.flags.insert(NodeFlags::DERIVED_DIRTY);
            }
            return;
        }
        if let Some(node) = self.nodes.get(id.0) {
            if node.parent.is_some() {
                debug!("Detaching {:?}", node.name);
            }
        }
        self.relink(id, None);
    }

    /// Detaches `child` if it is a child of `parent`.
    pub fn detach_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> bool {
        match self.nodes.get(child.0) {
            Some(node) if node.parent == Some(parent) => {
                self.detach(child);
                true
            }
            _ => false,
        }
    }

    /// Detaches the child of `parent` called `name`.
    pub fn detach_child_by_name(
        &mut self,
        parent: NodeId,
        name: &str,
    ) -> bool {
        match self.child(parent, name) {
            Some(child) => self.detach_child(parent, child),
            None => false,
        }
    }

    /// Detaches every child of `parent`.
    pub fn detach_all_children(
        &mut self,
        parent: NodeId,
    ) {
        let children: Vec<NodeId> = match self.nodes.get(parent.0) {
            Some(node) => node.children.values().cloned().collect(),
            None => return,
        };
        for child in children {
            self.detach(child);
        }
    }

    /// Returns the child of `parent` called `name`.
    pub fn child(
        &self,
        parent: NodeId,
        name: &str,
    ) -> Option<NodeId> {
        self.nodes
            .get(parent.0)
            .and_then(|node| node.children.get(name))
            .cloned()
    }

    /// Returns `true` if `parent` has a child called `name`.
    pub fn has_child(
        &self,
        parent: NodeId,
        name: &str,
    ) -> bool {
        self.child(parent, name).is_some()
    }

    /// Returns `true` if a matrix of the node needs rebuilding.
    pub fn is_modified(
        &self,
        id: NodeId,
    ) -> bool {
        self.nodes
            .get(id.0)
            .map_or(false, |node| node.is_local_dirty() || node.is_derived_dirty())
    }

    /// Get actual information about a node, rebuilding its matrices.
    pub fn node_info(
        &mut self,
        id: NodeId,
    ) -> Option<NodeInfo> {
        let world_matrix = self.derived_transformation_matrix(id)?;
        let world_transform = NodeTransform::new(
            world_matrix.w.truncate(),
            self.derived_orientation(id)?,
            self.derived_scale(id)?,
        );
        let node = self.nodes.get(id.0)?;
        Some(NodeInfo {
            transform: node.transform(),
            world_transform,
            world_matrix: world_matrix.into(),
            visible: node.is_visible(),
            displayable: node.is_displayable(),
        })
    }

    /// Returns the movable object called `name`, creating it if there is
    /// none. A new object is attached to `node` when given.
    pub fn create_object(
        &mut self,
        name: &str,
        kind: ObjectKind,
        node: Option<NodeId>,
    ) -> ObjectId {
        if let Some(&id) = self.object_names.get(name) {
            return id;
        }
        let id = ObjectId(self.next_object);
        self.next_object += 1;
        self.objects.insert(id.0, MovableObject::new(name, kind));
        self.object_names.insert(name.to_string(), id);
        info!("Created {:?} object {:?} in scene {:?}", kind, name, self.name);
        if let Some(node) = node {
            self.attach_object(node, id);
        }
        id
    }

    /// Attaches `object` to `node`, detaching it from its previous node.
    pub fn attach_object(
        &mut self,
        node: NodeId,
        object: ObjectId,
    ) -> bool {
        if !self.nodes.contains_key(node.0) {
            return false;
        }
        let (name, previous) = match self.objects.get(object.0) {
            Some(data) => (data.name.clone(), data.parent),
            None => return false,
        };
        if let Some(previous) = previous.and_then(|p| self.nodes.get_mut(p.0)) {
            previous.objects.remove(&name);
        }
        if let Some(target) = self.nodes.get_mut(node.0) {
            target.objects.insert(name, object);
        }
        if let Some(data) = self.objects.get_mut(object.0) {
            data.parent = Some(node);
        }
        true
    }

    /// Detaches `object` from `node` and clears its back-reference.
    pub fn detach_object(
        &mut self,
        node: NodeId,
        object: ObjectId,
    ) -> bool {
        let name = match self.objects.get(object.0) {
            Some(data) if data.parent == Some(node) => data.name.clone(),
            _ => return false,
        };
        if let Some(parent) = self.nodes.get_mut(node.0) {
            parent.objects.remove(&name);
        }
        if let Some(data) = self.objects.get_mut(object.0) {
            data.parent = None;
        }
        true
    }

    /// Removes a movable object from the scene.
    pub fn destroy_object(
        &mut self,
        id: ObjectId,
    ) -> bool {
        let parent = match self.objects.get(id.0) {
            Some(object) => object.parent,
            None => return false,
        };
        if let Some(parent) = parent {
            self.detach_object(parent, id);
        }
        match self.objects.remove(id.0) {
            Some(object) => {
                self.object_names.remove(&object.name);
                true
            }
            None => false,
        }
    }

    /// Returns the movable object behind `id`.
    pub fn object(
        &self,
        id: ObjectId,
    ) -> Option<&MovableObject> {
        self.objects.get(id.0)
    }

    /// Looks up a movable object by name.
    pub fn find_object(
        &self,
        name: &str,
    ) -> Option<ObjectId> {
        self.object_names.get(name).cloned()
    }

    /// Returns the group called `name`, creating it if there is none.
    pub fn create_animated_object_group(
        &mut self,
        name: &str,
    ) -> &mut AnimatedObjectGroup {
        let scene = &self.name;
        self.groups.entry(name.to_string()).or_insert_with(|| {
            info!("Created animated object group {:?} in scene {:?}", name, scene);
            AnimatedObjectGroup::new(name)
        })
    }

    /// Returns the group called `name`.
    pub fn animated_object_group(
        &self,
        name: &str,
    ) -> Option<&AnimatedObjectGroup> {
        self.groups.get(name)
    }

    /// Returns the group called `name`.
    pub fn animated_object_group_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut AnimatedObjectGroup> {
        self.groups.get_mut(name)
    }

    /// Removes the group called `name`.
    pub fn remove_animated_object_group(
        &mut self,
        name: &str,
    ) -> Option<AnimatedObjectGroup> {
        self.groups.remove(name)
    }

    /// All groups, by name.
    pub fn animated_object_groups(&self) -> &BTreeMap<String, AnimatedObjectGroup> {
        &self.groups
    }

    /// Advances every group by the time elapsed since its last update, then
    /// applies the running movable-object animations to the nodes.
    pub fn update(&mut self) {
        for group in self.groups.values_mut() {
            group.update();
        }
        self.apply_groups();
    }

    /// Advances every group by `delta` seconds, then applies the running
    /// movable-object animations to the nodes.
    pub fn update_elapsed(
        &mut self,
        delta: f32,
    ) {
        for group in self.groups.values_mut() {
            group.update_elapsed(delta);
        }
        self.apply_groups();
    }

    fn apply_groups(&mut self) {
        let mut poses = Vec::new();
        for group in self.groups.values() {
            for object in group.objects().values() {
                for animation in object.animations().values() {
                    if animation.state() != State::Stopped {
                        collect_poses(animation, &mut poses);
                    }
                }
            }
        }
        for (name, pose) in poses {
            self.apply_pose(&name, pose);
        }
    }

    /// Writes the last computed pose of every movable object driven by
    /// `animation` onto the node the object is attached to.
    ///
    /// The pose is the object's final transformation, so the pivots and
    /// moving objects above it in the animation are included.
    pub fn apply_animation(
        &mut self,
        animation: &Animation,
    ) {
        let mut poses = Vec::new();
        collect_poses(animation, &mut poses);
        for (name, pose) in poses {
            self.apply_pose(&name, pose);
        }
    }

    fn apply_pose(
        &mut self,
        object: &str,
        pose: LocalPose,
    ) {
        let node = match self
            .find_object(object)
            .and_then(|id| self.objects.get(id.0))
            .and_then(|object| object.parent)
        {
            Some(node) => node,
            None => return,
        };
        self.modify(node, |node| {
            node.position = pose.position;
            node.orientation = pose.orientation;
            node.scale = pose.scale;
        });
    }
}

fn collect_poses(
    animation: &Animation,
    poses: &mut Vec<(String, LocalPose)>,
) {
    for (_, id) in animation.iter() {
        if let Some(object) = animation.moving_object(id) {
            if let (&MovingKind::Object(ref name), Some(pose)) = (object.kind(), object.final_pose()) {
                poses.push((name.clone(), pose));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use animation::Animable;
    use cgmath::{Deg, SquareMatrix};
    use geometry::Geometry;
    use std::rc::Rc;

    #[test]
    fn new_scene_has_a_displayable_root() {
        let scene = Scene::new("test");
        let root = scene.node(scene.root()).unwrap();
        assert_eq!(root.name(), ROOT_NAME);
        assert!(root.is_displayable());
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn create_node_is_get_or_create() {
        let mut scene = Scene::new("test");
        let a = scene.create_node("a", None);
        let b = scene.create_node("b", Some(a));
        assert_eq!(scene.create_node("b", None), b);
        assert_eq!(scene.node(b).unwrap().parent(), Some(a));
        assert_eq!(scene.create_node(ROOT_NAME, Some(a)), scene.root());
        assert!(scene.node(b).unwrap().is_displayable());
    }

    #[test]
    fn unnamed_nodes_get_distinct_names() {
        let mut scene = Scene::new("test");
        let a = scene.create_unnamed_node(None);
        let b = scene.create_unnamed_node(None);
        assert_ne!(scene.node(a).unwrap().name(), scene.node(b).unwrap().name());
        assert!(scene.node(a).unwrap().name().starts_with("SceneNode_"));
    }

    #[test]
    fn node_counters_are_per_scene() {
        let mut first = Scene::new("first");
        let mut second = Scene::new("second");
        let a = first.create_unnamed_node(None);
        let b = second.create_unnamed_node(None);
        assert_eq!(first.node(a).unwrap().name(), second.node(b).unwrap().name());
    }

    #[test]
    fn attach_below_descendant_is_refused() {
        let mut scene = Scene::new("test");
        let a = scene.create_node("a", None);
        let b = scene.create_node("b", Some(a));
        assert!(!scene.attach_to(a, b));
        assert!(!scene.attach_to(a, a));
        assert_eq!(scene.node(a).unwrap().parent(), Some(scene.root()));
    }

    #[test]
    fn destroy_node_keeps_children() {
        let mut scene = Scene::new("test");
        let a = scene.create_node("a", None);
        let b = scene.create_node("b", Some(a));
        let lamp = scene.create_object("lamp", ObjectKind::Light, Some(a));

        assert!(scene.destroy_node(a));
        assert!(!scene.destroy_node(scene.root()));
        assert!(scene.node(a).is_none());
        assert_eq!(scene.find_node("a"), None);
        let child = scene.node(b).unwrap();
        assert_eq!(child.parent(), None);
        assert!(!child.is_displayable());
        assert_eq!(scene.object(lamp).unwrap().parent(), None);
    }

    #[test]
    fn detach_child_by_name() {
        let mut scene = Scene::new("test");
        let a = scene.create_node("a", None);
        scene.create_node("b", Some(a));
        assert!(scene.has_child(a, "b"));
        assert!(scene.detach_child_by_name(a, "b"));
        assert!(!scene.has_child(a, "b"));
        assert!(!scene.detach_child_by_name(a, "b"));
    }

    #[test]
    fn relative_transforms() {
        let mut scene = Scene::new("test");
        let a = scene.create_node("a", None);
        scene.translate(a, [1.0, 0.0, 0.0]);
        scene.translate(a, [1.0, 2.0, 0.0]);
        scene.scale_by(a, [2.0, 3.0, 1.0]);
        scene.scale_by(a, [2.0, 1.0, 1.0]);
        scene.yaw(a, Deg(90.0));

        let node = scene.node(a).unwrap();
        assert_eq!(node.position(), Vector3::new(2.0, 2.0, 0.0));
        assert_eq!(node.scale(), Vector3::new(4.0, 3.0, 1.0));
        let expected = Quaternion::from_angle_y(Deg(90.0));
        assert!((node.orientation().s - expected.s).abs() < 1e-6);
        assert!(scene.is_modified(a));
    }

    #[test]
    fn derived_orientation_and_scale_compose() {
        let mut scene = Scene::new("test");
        let a = scene.create_node("a", None);
        let b = scene.create_node("b", Some(a));
        scene.set_scale(a, [2.0, 2.0, 2.0]);
        scene.set_scale(b, [1.0, 3.0, 1.0]);
        scene.roll(a, Deg(90.0));

        assert_eq!(scene.derived_scale(b), Some(Vector3::new(2.0, 6.0, 2.0)));
        let q = scene.derived_orientation(b).unwrap();
        let expected = Quaternion::from_angle_z(Deg(90.0));
        assert!((q.v.z - expected.v.z).abs() < 1e-6);
    }

    #[test]
    fn objects_move_between_nodes() {
        let mut scene = Scene::new("test");
        let a = scene.create_node("a", None);
        let b = scene.create_node("b", None);
        let cam = scene.create_object("cam", ObjectKind::Camera, Some(a));
        assert_eq!(scene.create_object("cam", ObjectKind::Light, None), cam);

        assert!(scene.attach_object(b, cam));
        assert!(scene.node(a).unwrap().objects().is_empty());
        assert_eq!(scene.node(b).unwrap().objects().get("cam"), Some(&cam));
        assert!(!scene.detach_object(a, cam));
        assert!(scene.detach_object(b, cam));
        assert_eq!(scene.object(cam).unwrap().parent(), None);
        assert!(scene.destroy_object(cam));
        assert_eq!(scene.find_object("cam"), None);
    }

    #[test]
    fn node_info_reports_world_transform() {
        let mut scene = Scene::new("test");
        let a = scene.create_node("a", None);
        let b = scene.create_node("b", Some(a));
        scene.set_position(a, [1.0, 0.0, 0.0]);
        scene.set_position(b, [0.0, 0.0, 5.0]);
        scene.set_visible(b, false);

        let info = scene.node_info(b).unwrap();
        assert_eq!(info.world_transform.position, mint::Point3 { x: 1.0, y: 0.0, z: 5.0 });
        assert_eq!(info.transform.position, mint::Point3 { x: 0.0, y: 0.0, z: 5.0 });
        assert!(!info.visible);
        assert!(info.displayable);
        assert!(!scene.is_modified(b));
    }

    #[test]
    fn apply_animation_moves_attached_node() {
        let mut scene = Scene::new("test");
        let node = scene.create_node("door", None);
        let object = scene.create_object("door", ObjectKind::Geometry, Some(node));

        let mut animation = Animation::new("open");
        let moving = animation
            .add_moving_object(scene.object(object).unwrap())
            .unwrap();
        *animation
            .moving_object_mut(moving)
            .unwrap()
            .add_translate_key_frame(1.0) = Vector3::new(0.0, 0.0, 3.0);
        animation.play();
        animation.update(1.0);
        scene.apply_animation(&animation);

        assert_eq!(scene.node(node).unwrap().position(), Vector3::new(0.0, 0.0, 3.0));
        assert_eq!(
            scene.derived_transformation_matrix(node),
            Some(Matrix4::from_translation(Vector3::new(0.0, 0.0, 3.0)))
        );
        assert_ne!(scene.transformation_matrix(node), Some(Matrix4::identity()));
    }

    #[test]
    fn apply_animation_includes_parent_moving_objects() {
        let mut scene = Scene::new("test");
        let node = scene.create_node("door", None);
        let object = scene.create_object("door", ObjectKind::Geometry, Some(node));

        let mut animation = Animation::new("swing");
        let pivot = animation.add_moving_node();
        let door = animation
            .add_moving_object(scene.object(object).unwrap())
            .unwrap();
        assert!(animation.add_child(pivot, door));
        *animation
            .moving_object_mut(pivot)
            .unwrap()
            .add_translate_key_frame(0.0) = Vector3::new(5.0, 0.0, 0.0);
        *animation
            .moving_object_mut(door)
            .unwrap()
            .add_translate_key_frame(0.0) = Vector3::new(0.0, 0.0, 1.0);
        animation.play();
        animation.update(0.0);
        scene.apply_animation(&animation);

        assert_eq!(scene.node(node).unwrap().position(), Vector3::new(5.0, 0.0, 1.0));
        assert_eq!(scene.derived_position(node), Some(Vector3::new(5.0, 0.0, 1.0)));
    }

    #[test]
    fn update_applies_running_group_animations() {
        let mut scene = Scene::new("test");
        let holder = scene.create_node("holder", None);
        scene.set_position(holder, [0.0, 0.0, 3.0]);
        let node = scene.create_node("crate", Some(holder));
        scene.set_position(node, [1.0, 0.0, 0.0]);
        let object = scene.create_object("crate", ObjectKind::Geometry, Some(node));

        let mut geometry = Geometry::new("crate", None);
        {
            let lift = geometry.create_animation("lift");
            let moving = lift.add_moving_object(scene.object(object).unwrap()).unwrap();
            let moving = lift.moving_object_mut(moving).unwrap();
            *moving.add_translate_key_frame(0.0) = Vector3::new(0.0, 0.0, 0.0);
            *moving.add_translate_key_frame(2.0) = Vector3::new(0.0, 2.0, 0.0);
        }
        let geometry = Rc::new(geometry);
        {
            let group = scene.create_animated_object_group("crates");
            group.add_animation("lift");
            group.create_object("crate").unwrap().set_geometry(&geometry);
        }

        scene.update_elapsed(1.0);
        assert_eq!(scene.node(node).unwrap().position(), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(scene.derived_position(node), Some(Vector3::new(1.0, 0.0, 3.0)));

        scene
            .animated_object_group_mut("crates")
            .unwrap()
            .start_animation("lift");
        scene.update_elapsed(1.0);
        assert_eq!(scene.node(node).unwrap().position(), Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(scene.derived_position(node), Some(Vector3::new(0.0, 1.0, 3.0)));

        scene
            .animated_object_group_mut("crates")
            .unwrap()
            .stop_animation("lift");
        scene.set_position(node, [1.0, 0.0, 0.0]);
        scene.update_elapsed(0.5);
        assert_eq!(scene.derived_position(node), Some(Vector3::new(1.0, 0.0, 3.0)));
    }
}
