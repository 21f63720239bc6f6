use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use cgmath::{Matrix4, SquareMatrix};
use itertools::Itertools;

use super::{Animable, Animation, State};
use geometry::Geometry;
use mesh::Mesh;
use skeleton::Skeleton;

/// A playing instance of the animations of a geometry, mesh or skeleton.
///
/// Assigning a source instantiates private copies of its template
/// animations, then goes on with the sources below it: a geometry brings its
/// mesh, a mesh brings its skeleton. Animations found at several levels
/// under the same name are merged into one.
#[derive(Debug)]
pub struct AnimatedObject {
    name: String,
    geometry: Weak<Geometry>,
    mesh: Weak<Mesh>,
    skeleton: Weak<Skeleton>,
    animations: BTreeMap<String, Animation>,
}

impl AnimatedObject {
    /// Creates an object with no source and no animation.
    pub fn new(name: &str) -> Self {
        AnimatedObject {
            name: name.to_string(),
            geometry: Weak::new(),
            mesh: Weak::new(),
            skeleton: Weak::new(),
            animations: BTreeMap::new(),
        }
    }

    /// Name of the object.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Geometry the animations come from.
    pub fn geometry(&self) -> Option<Rc<Geometry>> {
        self.geometry.upgrade()
    }

    /// Mesh the animations come from.
    pub fn mesh(&self) -> Option<Rc<Mesh>> {
        self.mesh.upgrade()
    }

    /// Skeleton the animations come from.
    pub fn skeleton(&self) -> Option<Rc<Skeleton>> {
        self.skeleton.upgrade()
    }

    fn copy_animations(
        &mut self,
        source: &BTreeMap<String, Animation>,
        skeleton: Option<&Skeleton>,
    ) {
        if source.is_empty() {
            return;
        }
        for (name, template) in source {
            if let Some(existing) = self.animations.get_mut(name) {
                existing.merge(template, skeleton);
                continue;
            }
            self.animations
                .insert(name.clone(), template.instantiate(skeleton));
        }
        debug!("{:?} instantiated {}", self.name, source.keys().join(", "));
    }

    fn attach_skeleton(
        &mut self,
        skeleton: &Rc<Skeleton>,
    ) {
        self.skeleton = Rc::downgrade(skeleton);
        self.copy_animations(skeleton.animations(), Some(skeleton));
    }

    fn attach_mesh(
        &mut self,
        mesh: &Rc<Mesh>,
    ) {
        self.mesh = Rc::downgrade(mesh);
        let skeleton = mesh.skeleton();
        self.copy_animations(mesh.animations(), skeleton.map(|s| &**s));
        if let Some(skeleton) = skeleton {
            self.attach_skeleton(skeleton);
        }
    }

    /// Replaces all animations with the ones of `geometry`, its mesh and
    /// the mesh's skeleton.
    pub fn set_geometry(
        &mut self,
        geometry: &Rc<Geometry>,
    ) {
        self.animations.clear();
        self.geometry = Rc::downgrade(geometry);
        self.mesh = Weak::new();
        self.skeleton = Weak::new();

        let mesh = geometry.mesh();
        let skeleton = mesh.and_then(|mesh| mesh.skeleton());
        self.copy_animations(geometry.animations(), skeleton.map(|s| &**s));
        if let Some(mesh) = mesh {
            self.attach_mesh(mesh);
        }
    }

    /// Replaces all animations with the ones of `mesh` and its skeleton.
    ///
    /// The geometry reference is dropped.
    pub fn set_mesh(
        &mut self,
        mesh: &Rc<Mesh>,
    ) {
        self.animations.clear();
        self.geometry = Weak::new();
        self.skeleton = Weak::new();
        self.attach_mesh(mesh);
    }

    /// Replaces all animations with the ones of `skeleton`.
    ///
    /// The geometry and mesh references are dropped.
    pub fn set_skeleton(
        &mut self,
        skeleton: &Rc<Skeleton>,
    ) {
        self.animations.clear();
        self.geometry = Weak::new();
        self.mesh = Weak::new();
        self.attach_skeleton(skeleton);
    }

    /// Plays the animation called `name`, if any.
    pub fn start_animation(
        &mut self,
        name: &str,
    ) {
        if let Some(animation) = self.animations.get_mut(name) {
            animation.play();
        }
    }

    /// Stops the animation called `name`, if any.
    pub fn stop_animation(
        &mut self,
        name: &str,
    ) {
        if let Some(animation) = self.animations.get_mut(name) {
            animation.stop();
        }
    }

    /// Pauses the animation called `name`, if any.
    pub fn pause_animation(
        &mut self,
        name: &str,
    ) {
        if let Some(animation) = self.animations.get_mut(name) {
            animation.pause();
        }
    }

    /// Plays every animation.
    pub fn start_all_animations(&mut self) {
        for animation in self.animations.values_mut() {
            animation.play();
        }
    }

    /// Stops every animation.
    pub fn stop_all_animations(&mut self) {
        for animation in self.animations.values_mut() {
            animation.stop();
        }
    }

    /// Pauses every animation.
    pub fn pause_all_animations(&mut self) {
        for animation in self.animations.values_mut() {
            animation.pause();
        }
    }

    /// Returns the animation called `name`.
    pub fn animation(
        &self,
        name: &str,
    ) -> Option<&Animation> {
        self.animations.get(name)
    }

    /// Returns the animation called `name`.
    pub fn animation_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut Animation> {
        self.animations.get_mut(name)
    }

    /// The instantiated animations, by name.
    pub fn animations(&self) -> &BTreeMap<String, Animation> {
        &self.animations
    }

    /// Number of instantiated animations.
    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    /// Advances every animation that isn't stopped by `delta` seconds.
    pub fn update(
        &mut self,
        delta: f32,
    ) {
        for animation in self.animations.values_mut() {
            if animation.state() != State::Stopped {
                animation.update(delta);
            }
        }
    }

    /// Skinning matrix of every bone of the skeleton, in skinning order.
    ///
    /// A bone takes its matrix from the first running animation, by name,
    /// that drives it. Bones driven by none get the identity.
    pub fn skinning_matrices(&self) -> Vec<Matrix4<f32>> {
        let skeleton = match self.skeleton.upgrade() {
            Some(skeleton) => skeleton,
            None => return Vec::new(),
        };
        skeleton
            .bones()
            .iter()
            .map(|bone| {
                self.animations
                    .values()
                    .filter(|animation| animation.state() != State::Stopped)
                    .filter_map(|animation| {
                        animation
                            .moving_object_for_bone(bone)
                            .and_then(|id| animation.moving_object(id))
                            .and_then(|object| object.bone_transformation())
                    })
                    .next()
                    .unwrap_or_else(Matrix4::identity)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    fn rig() -> Rc<Mesh> {
        let mut skeleton = Skeleton::new();
        let hip = skeleton.add_bone("hip", Matrix4::identity());
        let knee = skeleton.add_bone("knee", Matrix4::identity());
        skeleton.add_child(hip, knee);

        let mut walk = Animation::new("walk");
        let moving = walk.add_moving_bone(&skeleton, knee).unwrap();
        *walk
            .moving_object_mut(moving)
            .unwrap()
            .add_translate_key_frame(1.0) = Vector3::new(0.0, 1.0, 0.0);
        skeleton.add_animation(walk);
        skeleton.create_animation("idle");

        let mut mesh = Mesh::new("legs");
        mesh.set_skeleton(Rc::new(skeleton));
        mesh.create_animation("walk");
        Rc::new(mesh)
    }

    #[test]
    fn set_mesh_cascades_to_skeleton() {
        let mesh = rig();
        let mut object = AnimatedObject::new("walker");
        object.set_mesh(&mesh);

        assert!(object.mesh().is_some());
        assert!(object.skeleton().is_some());
        assert_eq!(object.animation_count(), 2);
        assert_eq!(object.animation("walk").unwrap().moving_objects_count(), 1);
    }

    #[test]
    fn set_skeleton_drops_the_mesh() {
        let mesh = rig();
        let mut object = AnimatedObject::new("walker");
        object.set_mesh(&mesh);
        let skeleton = mesh.skeleton().unwrap().clone();
        object.set_skeleton(&skeleton);

        assert!(object.mesh().is_none());
        assert!(object.skeleton().is_some());
        assert_eq!(object.animation_count(), 2);
    }

    #[test]
    fn set_geometry_cascades_to_mesh() {
        let mesh = rig();
        let mut geometry = Geometry::new("walker", Some(mesh));
        geometry.create_animation("wave");
        let geometry = Rc::new(geometry);

        let mut object = AnimatedObject::new("walker");
        object.set_geometry(&geometry);
        assert_eq!(object.animations().keys().collect::<Vec<_>>(), vec!["idle", "walk", "wave"]);
        assert!(object.geometry().is_some());
    }

    #[test]
    fn unknown_names_are_ignored() {
        let mut object = AnimatedObject::new("walker");
        object.set_mesh(&rig());
        object.start_animation("jump");
        object.pause_animation("jump");
        object.stop_animation("jump");
        assert!(object
            .animations()
            .values()
            .all(|animation| animation.state() == State::Stopped));
    }

    #[test]
    fn skinning_uses_running_animations() {
        let mesh = rig();
        let mut object = AnimatedObject::new("walker");
        object.set_mesh(&mesh);

        assert_eq!(object.skinning_matrices(), vec![Matrix4::identity(); 2]);
        object.start_animation("walk");
        object.update(0.5);
        let matrices = object.skinning_matrices();
        assert_eq!(matrices[0], Matrix4::identity());
        assert_eq!(matrices[1], Matrix4::from_translation(Vector3::new(0.0, 1.0, 0.0)));
    }
}
