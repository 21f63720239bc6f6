//! Animation system.
//!
//! ## Introduction
//!
//! Keyframe animation is built from three layers.
//!
//! ### Templates
//!
//! An [`Animation`] owns a tree of [`MovingObjectBase`] values, each one
//! holding the scale, translate and rotate keyframes of a bone, a movable
//! object or an abstract pivot node. Animations are attached by name to
//! [`Animable`] entities: meshes, skeletons and geometries. Those are
//! templates and are never played directly.
//!
//! ### Instances
//!
//! An [`AnimatedObject`] clones the templates of its geometry, mesh and
//! skeleton with [`Animation::instantiate`], so that every instance keeps
//! its own playback state.
//!
//! ### Groups
//!
//! An [`AnimatedObjectGroup`] registers animation names and drives all of
//! its objects with the same elapsed time on every update.
//!
//! ## Walkthrough
//!
//! ```rust
//! # extern crate castor3d;
//! # extern crate cgmath;
//! use std::rc::Rc;
//! use castor3d::animation::{Animable, AnimatedObjectGroup};
//! use castor3d::{Mesh, Skeleton};
//!
//! # fn main() {
//! let mut skeleton = Skeleton::new();
//! let hip = skeleton.add_bone("hip", cgmath::Matrix4::from_scale(1.0));
//!
//! let mut walk = castor3d::animation::Animation::new("walk");
//! walk.set_looped(true);
//! let moving = walk.add_moving_bone(&skeleton, hip).unwrap();
//! walk.moving_object_mut(moving).unwrap().add_translate_key_frame(1.0).x = 1.0;
//! skeleton.add_animation(walk);
//!
//! let mut mesh = Mesh::new("body");
//! mesh.set_skeleton(Rc::new(skeleton));
//! let mesh = Rc::new(mesh);
//!
//! let mut group = AnimatedObjectGroup::new("crowd");
//! group.add_animation("walk");
//! group.create_object("walker").unwrap().set_mesh(&mesh);
//! group.start_animation("walk");
//! group.update_elapsed(0.25);
//! # }
//! ```
//!
//! [`Animation`]: struct.Animation.html
//! [`Animation::instantiate`]: struct.Animation.html#method.instantiate
//! [`MovingObjectBase`]: struct.MovingObjectBase.html
//! [`Animable`]: trait.Animable.html
//! [`AnimatedObject`]: struct.AnimatedObject.html
//! [`AnimatedObjectGroup`]: struct.AnimatedObjectGroup.html

use std::collections::BTreeMap;
use std::mem;

use cgmath::{Matrix4, SquareMatrix};

use object::MovableObject;
use skeleton::{Bone, BoneId, Skeleton};

mod animable;
mod animated;
mod group;
mod moving;
mod track;

pub use self::animable::Animable;
pub use self::animated::AnimatedObject;
pub use self::group::AnimatedObjectGroup;
pub use self::moving::{BoneBinding, LocalPose, MovingKind, MovingObjectBase, MovingObjectId};
pub use self::track::{Interpolate, Interpolation, Track};

quick_error! {
    #[doc = "Structural error of the animation layer."]
    #[derive(Clone, Debug, PartialEq)]
    pub enum AnimationError {
        #[doc = "The bone or movable object is already bound in this animation."]
        DuplicateBinding(name: String) {
            display("{:?} is already bound in this animation", name)
        }

        #[doc = "The skeleton has no bone at this index."]
        UnknownBone(index: usize) {
            display("no bone at index {} in the skeleton", index)
        }
    }
}

/// Playback state of an [`Animation`](struct.Animation.html).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum State {
    /// Time advances on every update.
    Playing,
    /// Time is frozen, the pose is still applied.
    Paused,
    /// Time is reset, nothing is applied.
    Stopped,
}

/// A named keyframe animation over a tree of moving objects.
#[derive(Clone, Debug)]
pub struct Animation {
    name: String,
    current_time: f32,
    state: State,
    scale: f32,
    looped: bool,
    length: f32,
    objects: Vec<MovingObjectBase>,
    bindings: BTreeMap<String, MovingObjectId>,
    next_node: usize,
}

impl Animation {
    /// Creates an empty, stopped animation.
    pub fn new(name: &str) -> Self {
        Animation {
            name: name.to_string(),
            current_time: 0.0,
            state: State::Stopped,
            scale: 1.0,
            looped: false,
            length: 0.0,
            objects: Vec::new(),
            bindings: BTreeMap::new(),
            next_node: 0,
        }
    }

    /// Name of the animation.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn push_object(
        &mut self,
        object: MovingObjectBase,
    ) -> MovingObjectId {
        let id = MovingObjectId(self.objects.len());
        self.bindings.insert(object.key.clone(), id);
        self.objects.push(object);
        id
    }

    fn fresh_node_key(&mut self) -> String {
        self.fresh_key("node")
    }

    fn fresh_key(
        &mut self,
        prefix: &str,
    ) -> String {
        loop {
            let key = format!("{}#{}", prefix, self.next_node);
            self.next_node += 1;
            if !self.bindings.contains_key(&key) {
                return key;
            }
        }
    }

    /// Adds an abstract pivot node, bound under an ordinal key.
    pub fn add_moving_node(&mut self) -> MovingObjectId {
        let key = self.fresh_node_key();
        self.push_object(MovingObjectBase::new(key, MovingKind::Node))
    }

    /// Adds a moving object driving `bone` of `skeleton`.
    ///
    /// Fails if a moving object is already bound under the bone's name.
    pub fn add_moving_bone(
        &mut self,
        skeleton: &Skeleton,
        bone: BoneId,
    ) -> Result<MovingObjectId, AnimationError> {
        let binding = BoneBinding::new(skeleton, bone)
            .ok_or_else(|| AnimationError::UnknownBone(bone.index()))?;
        if self.bindings.contains_key(binding.name()) {
            return Err(AnimationError::DuplicateBinding(binding.name().to_string()));
        }
        let key = binding.name().to_string();
        Ok(self.push_object(MovingObjectBase::new(key, MovingKind::Bone(binding))))
    }

    /// Adds a moving object driving the movable `object`.
    ///
    /// Fails if a moving object is already bound under the object's name.
    pub fn add_moving_object(
        &mut self,
        object: &MovableObject,
    ) -> Result<MovingObjectId, AnimationError> {
        if self.bindings.contains_key(object.name()) {
            return Err(AnimationError::DuplicateBinding(object.name().to_string()));
        }
        let key = object.name().to_string();
        let kind = MovingKind::Object(key.clone());
        Ok(self.push_object(MovingObjectBase::new(key, kind)))
    }

    fn is_ancestor(
        &self,
        ancestor: MovingObjectId,
        mut id: MovingObjectId,
    ) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.objects[id.0].parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    /// Makes `child` a child of `parent`.
    ///
    /// Moving objects are never re-parented: the request is ignored when
    /// `child` already has a parent, when it would create a cycle or when a
    /// handle is unknown. Returns `true` if the link was made.
    pub fn add_child(
        &mut self,
        parent: MovingObjectId,
        child: MovingObjectId,
    ) -> bool {
        if parent.0 >= self.objects.len() || child.0 >= self.objects.len() {
            warn!("Unknown moving object handle in {:?}", self.name);
            return false;
        }
        if let Some(old) = self.objects[child.0].parent {
            warn!("Moving object {:?} already has parent {:?}",
                self.objects[child.0].key, self.objects[old.0].key);
            return false;
        }
        if self.is_ancestor(child, parent) {
            warn!("Moving object {:?} can't be a child of its own descendant {:?}",
                self.objects[child.0].key, self.objects[parent.0].key);
            return false;
        }
        self.objects[child.0].parent = Some(parent);
        self.objects[parent.0].children.push(child);
        true
    }

    /// Returns the moving object behind `id`.
    pub fn moving_object(
        &self,
        id: MovingObjectId,
    ) -> Option<&MovingObjectBase> {
        self.objects.get(id.0)
    }

    /// Returns the moving object behind `id`.
    pub fn moving_object_mut(
        &mut self,
        id: MovingObjectId,
    ) -> Option<&mut MovingObjectBase> {
        self.objects.get_mut(id.0)
    }

    /// Looks up a moving object by binding key.
    pub fn get_moving_object(
        &self,
        key: &str,
    ) -> Option<MovingObjectId> {
        self.bindings.get(key).cloned()
    }

    /// Looks up the moving object bound to `bone`.
    pub fn moving_object_for_bone(
        &self,
        bone: &Bone,
    ) -> Option<MovingObjectId> {
        self.find_bound(bone.name(), |kind| match *kind {
            MovingKind::Bone(_) => true,
            _ => false,
        })
    }

    /// Looks up the moving object bound to the movable `object`.
    pub fn moving_object_for_object(
        &self,
        object: &MovableObject,
    ) -> Option<MovingObjectId> {
        self.find_bound(object.name(), |kind| match *kind {
            MovingKind::Object(_) => true,
            _ => false,
        })
    }

    /// Binding under `name` if its kind matches, else the first moving object
    /// of that kind and name merged under a suffixed key.
    fn find_bound<F>(
        &self,
        name: &str,
        matches: F,
    ) -> Option<MovingObjectId>
    where
        F: Fn(&MovingKind) -> bool,
    {
        self.bindings
            .get(name)
            .cloned()
            .filter(|id| matches(&self.objects[id.0].kind))
            .or_else(|| {
                self.objects
                    .iter()
                    .position(|object| matches(&object.kind) && object.name() == name)
                    .map(MovingObjectId)
            })
    }

    /// Number of moving objects, children included.
    pub fn moving_objects_count(&self) -> usize {
        self.objects.len()
    }

    /// Iterates over the `(key, handle)` bindings in key order.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a str, MovingObjectId)> + 'a {
        self.bindings.iter().map(|(key, &id)| (key.as_str(), id))
    }

    /// Top-level moving objects, in insertion order.
    pub fn roots<'a>(&'a self) -> impl Iterator<Item = MovingObjectId> + 'a {
        self.objects
            .iter()
            .enumerate()
            .filter(|&(_, object)| object.parent.is_none())
            .map(|(index, _)| MovingObjectId(index))
    }

    /// Current playback state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Starts or resumes playback.
    pub fn play(&mut self) {
        debug!("Playing {:?} from {}", self.name, self.current_time);
        self.state = State::Playing;
    }

    /// Pauses playback. Only a playing animation can be paused.
    pub fn pause(&mut self) {
        if self.state == State::Playing {
            debug!("Pausing {:?} at {}", self.name, self.current_time);
            self.state = State::Paused;
        }
    }

    /// Stops playback and rewinds to the start.
    pub fn stop(&mut self) {
        if self.state != State::Stopped {
            debug!("Stopping {:?}", self.name);
        }
        self.state = State::Stopped;
        self.current_time = 0.0;
    }

    /// Time-scale multiplier.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Sets the time-scale multiplier.
    pub fn set_scale(
        &mut self,
        scale: f32,
    ) {
        self.scale = scale;
    }

    /// Returns `true` if playback wraps at the end.
    pub fn is_looped(&self) -> bool {
        self.looped
    }

    /// Sets whether playback wraps at the end.
    pub fn set_looped(
        &mut self,
        looped: bool,
    ) {
        self.looped = looped;
    }

    /// Current playback time in seconds.
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    /// Cached length in seconds, `0.0` until computed.
    pub fn length(&self) -> f32 {
        self.length
    }

    fn measure(
        objects: &mut [MovingObjectBase],
        id: MovingObjectId,
    ) -> f32 {
        let children = objects[id.0].children.clone();
        let length = children
            .into_iter()
            .fold(objects[id.0].key_frames_length(), |length, child| {
                length.max(Animation::measure(objects, child))
            });
        objects[id.0].length = length;
        length
    }

    /// Recomputes the length as the maximum length of the top-level objects.
    pub fn compute_length(&mut self) -> f32 {
        let roots: Vec<_> = self.roots().collect();
        let objects = &mut self.objects;
        let length = roots
            .into_iter()
            .fold(0.0, |length: f32, root| length.max(Animation::measure(objects, root)));
        self.length = length;
        length
    }

    /// Advances playback by `delta` seconds and updates the moving objects.
    pub fn update(
        &mut self,
        delta: f32,
    ) {
        if self.length == 0.0 {
            self.compute_length();
        }

        if self.state == State::Playing {
            self.current_time += delta * self.scale;
            if self.current_time >= self.length {
                if !self.looped {
                    self.current_time = self.length;
                    debug!("{:?} reached its end", self.name);
                    self.state = State::Paused;
                } else if self.length > 0.0 {
                    self.current_time %= self.length;
                }
            }
        }

        if self.state != State::Stopped {
            let time = self.current_time;
            let looped = self.looped;
            let mut stack: Vec<(MovingObjectId, Matrix4<f32>)> = self
                .roots()
                .map(|root| (root, Matrix4::identity()))
                .collect();
            while let Some((id, parent)) = stack.pop() {
                let object = &mut self.objects[id.0];
                object.update(time, looped, &parent);
                let transform = object.final_transformation();
                stack.extend(object.children.iter().map(|&child| (child, transform)));
            }
        }
    }

    fn merge_subtree(
        &mut self,
        template: &Animation,
        source: MovingObjectId,
        parent: Option<MovingObjectId>,
        skeleton: Option<&Skeleton>,
    ) {
        let object = &template.objects[source.0];
        let existing = match object.kind {
            MovingKind::Node => None,
            ref kind => self.objects
                .iter()
                .position(|candidate| {
                    mem::discriminant(&candidate.kind) == mem::discriminant(kind)
                        && candidate.name() == kind.name()
                })
                .map(MovingObjectId),
        };
        let target = match existing {
            Some(id) => id,
            None => {
                let mut clone = object.detached_clone(skeleton);
                if self.bindings.contains_key(&clone.key) {
                    clone.key = match clone.kind {
                        MovingKind::Node => self.fresh_node_key(),
                        ref kind => {
                            warn!("{:?} already binds another kind of moving object as {:?}",
                                self.name, kind.name());
                            let prefix = kind.name().to_string();
                            self.fresh_key(&prefix)
                        }
                    };
                }
                let id = self.push_object(clone);
                if let Some(parent) = parent {
                    self.objects[id.0].parent = Some(parent);
                    self.objects[parent.0].children.push(id);
                }
                id
            }
        };
        for &child in &object.children {
            self.merge_subtree(template, child, Some(target), skeleton);
        }
    }

    /// Extends this animation with the moving objects of `template` that it
    /// doesn't bind yet.
    ///
    /// Bones and movable objects already bound keep their keyframes, the new
    /// children found below them in `template` are appended. A bone and a
    /// movable object sharing a name are kept apart, the later one under a
    /// `<name>#<n>` key. Bone bindings
    /// are rebound by name against `skeleton`. The cached length is reset.
    pub fn merge(
        &mut self,
        template: &Animation,
        skeleton: Option<&Skeleton>,
    ) {
        let roots: Vec<_> = template.roots().collect();
        for root in roots {
            self.merge_subtree(template, root, None, skeleton);
        }
        self.length = 0.0;
    }

    /// Creates a private, stopped copy of this animation.
    ///
    /// The moving-object tree is deep-cloned and its bone bindings are
    /// resolved by name against `skeleton`. Scale and loop flag are kept.
    pub fn instantiate(
        &self,
        skeleton: Option<&Skeleton>,
    ) -> Animation {
        let mut animation = Animation::new(&self.name);
        animation.scale = self.scale;
        animation.looped = self.looped;
        animation.next_node = self.next_node;
        animation.merge(self, skeleton);
        animation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;
    use object::{MovableObject, ObjectKind};

    fn two_second_animation() -> (Animation, MovingObjectId) {
        let mut animation = Animation::new("slide");
        let node = animation.add_moving_node();
        {
            let object = animation.moving_object_mut(node).unwrap();
            *object.add_translate_key_frame(0.0) = Vector3::new(0.0, 0.0, 0.0);
            *object.add_translate_key_frame(2.0) = Vector3::new(2.0, 0.0, 0.0);
        }
        (animation, node)
    }

    #[test]
    fn stop_and_pause_from_stopped_are_no_ops() {
        let mut animation = Animation::new("idle");
        animation.stop();
        assert_eq!(animation.current_time(), 0.0);
        animation.pause();
        assert_eq!(animation.state(), State::Stopped);
    }

    #[test]
    fn stop_rewinds() {
        let (mut animation, _) = two_second_animation();
        animation.play();
        animation.update(0.5);
        animation.stop();
        assert_eq!(animation.state(), State::Stopped);
        assert_eq!(animation.current_time(), 0.0);
    }

    #[test]
    fn scale_multiplies_delta() {
        let (mut animation, _) = two_second_animation();
        animation.set_scale(2.0);
        animation.play();
        animation.update(0.25);
        assert_eq!(animation.current_time(), 0.5);
    }

    #[test]
    fn not_looped_clamps_and_pauses() {
        let (mut animation, node) = two_second_animation();
        animation.play();
        animation.update(5.0);

        assert_eq!(animation.current_time(), 2.0);
        assert_eq!(animation.state(), State::Paused);
        let pose = animation.moving_object(node).unwrap().pose().unwrap();
        assert_eq!(pose.position, Vector3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn looped_wraps() {
        let (mut animation, _) = two_second_animation();
        animation.set_looped(true);
        animation.play();
        animation.update(2.5);
        assert!((animation.current_time() - 0.5).abs() < 1e-5);
        assert_eq!(animation.state(), State::Playing);
    }

    #[test]
    fn zero_length_never_wraps() {
        let mut animation = Animation::new("empty");
        animation.set_looped(true);
        animation.play();
        animation.update(1.0);
        assert_eq!(animation.length(), 0.0);
        assert_eq!(animation.current_time(), 1.0);
    }

    #[test]
    fn length_includes_children() {
        let mut animation = Animation::new("arm");
        let shoulder = animation.add_moving_node();
        let elbow = animation.add_moving_node();
        animation
            .moving_object_mut(shoulder)
            .unwrap()
            .add_rotate_key_frame(1.0);
        animation
            .moving_object_mut(elbow)
            .unwrap()
            .add_rotate_key_frame(3.0);
        assert!(animation.add_child(shoulder, elbow));

        assert_eq!(animation.compute_length(), 3.0);
        assert_eq!(animation.moving_object(shoulder).unwrap().length(), 3.0);
        assert_eq!(animation.roots().collect::<Vec<_>>(), vec![shoulder]);
    }

    #[test]
    fn children_are_never_reparented() {
        let mut animation = Animation::new("chain");
        let a = animation.add_moving_node();
        let b = animation.add_moving_node();
        let c = animation.add_moving_node();
        assert!(animation.add_child(a, b));
        assert!(!animation.add_child(c, b));
        assert!(!animation.add_child(b, a));
        assert_eq!(animation.moving_object(a).unwrap().children(), &[b]);
    }

    #[test]
    fn duplicate_object_binding_is_an_error() {
        let crate_object = MovableObject::new("crate", ObjectKind::Geometry);
        let mut animation = Animation::new("bounce");
        let id = animation.add_moving_object(&crate_object).unwrap();

        assert_eq!(
            animation.add_moving_object(&crate_object),
            Err(AnimationError::DuplicateBinding("crate".to_string()))
        );
        assert_eq!(animation.moving_object_for_object(&crate_object), Some(id));
        assert_eq!(animation.get_moving_object("crate"), Some(id));
        assert_eq!(animation.get_moving_object("barrel"), None);
    }

    #[test]
    fn unknown_bone_is_an_error() {
        let skeleton = Skeleton::new();
        let mut animation = Animation::new("wave");
        assert_eq!(
            animation.add_moving_bone(&skeleton, BoneId(3)),
            Err(AnimationError::UnknownBone(3))
        );
    }

    #[test]
    fn instantiate_resets_playback() {
        let (mut template, node) = two_second_animation();
        template.set_looped(true);
        template.set_scale(0.5);
        template.play();
        template.update(1.0);

        let instance = template.instantiate(None);
        assert_eq!(instance.state(), State::Stopped);
        assert_eq!(instance.current_time(), 0.0);
        assert_eq!(instance.length(), 0.0);
        assert!(instance.is_looped());
        assert_eq!(instance.scale(), 0.5);
        assert_eq!(
            instance.moving_object(node).unwrap().translates(),
            template.moving_object(node).unwrap().translates()
        );
    }

    #[test]
    fn merge_extends_bound_objects() {
        let mut skeleton = Skeleton::new();
        let root = skeleton.add_bone("root", Matrix4::identity());
        let tip = skeleton.add_bone("tip", Matrix4::identity());
        skeleton.add_child(root, tip);

        let mut first = Animation::new("pose");
        first.add_moving_bone(&skeleton, root).unwrap();

        let mut second = Animation::new("pose");
        let second_root = second.add_moving_bone(&skeleton, root).unwrap();
        let second_tip = second.add_moving_bone(&skeleton, tip).unwrap();
        second.add_child(second_root, second_tip);

        let mut instance = first.instantiate(Some(&skeleton));
        instance.merge(&second, Some(&skeleton));

        assert_eq!(instance.moving_objects_count(), 2);
        let root_id = instance.get_moving_object("root").unwrap();
        let tip_id = instance.get_moving_object("tip").unwrap();
        assert_eq!(instance.moving_object(tip_id).unwrap().parent(), Some(root_id));
    }

    #[test]
    fn merge_keeps_bone_and_object_of_the_same_name_apart() {
        let mut skeleton = Skeleton::new();
        let hip = skeleton.add_bone("hip", Matrix4::identity());
        let knee = skeleton.add_bone("knee", Matrix4::identity());
        skeleton.add_child(hip, knee);

        let mut placement = Animation::new("walk");
        placement.add_moving_object(&MovableObject::new("hip", ObjectKind::Geometry)).unwrap();

        let mut legs = Animation::new("walk");
        let moving_hip = legs.add_moving_bone(&skeleton, hip).unwrap();
        let moving_knee = legs.add_moving_bone(&skeleton, knee).unwrap();
        legs.add_child(moving_hip, moving_knee);
        *legs
            .moving_object_mut(moving_hip)
            .unwrap()
            .add_translate_key_frame(1.0) = Vector3::new(0.0, 1.0, 0.0);

        let mut instance = placement.instantiate(Some(&skeleton));
        instance.merge(&legs, Some(&skeleton));

        assert_eq!(instance.moving_objects_count(), 3);
        let object = instance.get_moving_object("hip").unwrap();
        assert!(instance.moving_object(object).unwrap().children().is_empty());
        let bone = instance
            .moving_object_for_bone(skeleton.bone(hip).unwrap())
            .unwrap();
        assert!(instance.moving_object(bone).unwrap().key().starts_with("hip#"));
        assert_eq!(instance.moving_object(bone).unwrap().translates().len(), 1);
        let knee = instance.get_moving_object("knee").unwrap();
        assert_eq!(instance.moving_object(knee).unwrap().parent(), Some(bone));
    }
}
