use std::collections::{BTreeMap, BTreeSet};

use super::AnimatedObject;
use timer::Timer;

/// A set of animated objects played in step.
///
/// Only the animation names registered with [`add_animation`] can be
/// controlled through the group; the other names are ignored. Every update
/// advances all objects by the same elapsed time.
///
/// [`add_animation`]: #method.add_animation
#[derive(Debug)]
pub struct AnimatedObjectGroup {
    name: String,
    animations: BTreeSet<String>,
    objects: BTreeMap<String, AnimatedObject>,
    timer: Timer,
}

impl AnimatedObjectGroup {
    /// Creates an empty group. Its timer starts now.
    pub fn new(name: &str) -> Self {
        AnimatedObjectGroup {
            name: name.to_string(),
            animations: BTreeSet::new(),
            objects: BTreeMap::new(),
            timer: Timer::new(),
        }
    }

    /// Name of the group.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers an animation name for group control.
    pub fn add_animation(
        &mut self,
        name: &str,
    ) {
        self.animations.insert(name.to_string());
    }

    /// Adds `object` under its own name.
    ///
    /// Returns `false` and keeps the existing object if the name is taken.
    pub fn add_object(
        &mut self,
        object: AnimatedObject,
    ) -> bool {
        if self.objects.contains_key(object.name()) {
            return false;
        }
        self.objects.insert(object.name().to_string(), object);
        true
    }

    /// Creates an object called `name`.
    ///
    /// Returns `None`, leaving the existing object untouched, if the name is
    /// already used in this group.
    pub fn create_object(
        &mut self,
        name: &str,
    ) -> Option<&mut AnimatedObject> {
        if self.objects.contains_key(name) {
            return None;
        }
        info!("Created animated object {:?} in group {:?}", name, self.name);
        Some(
            self.objects
                .entry(name.to_string())
                .or_insert_with(|| AnimatedObject::new(name)),
        )
    }

    fn for_registered<F>(
        &mut self,
        name: &str,
        mut f: F,
    ) where
        F: FnMut(&mut AnimatedObject),
    {
        if !self.animations.contains(name) {
            return;
        }
        for object in self.objects.values_mut() {
            f(object);
        }
    }

    /// Sets the loop flag of the animation called `name` in every object.
    pub fn set_animation_looped(
        &mut self,
        name: &str,
        looped: bool,
    ) {
        self.for_registered(name, |object| {
            if let Some(animation) = object.animation_mut(name) {
                animation.set_looped(looped);
            }
        });
    }

    /// Plays the animation called `name` in every object.
    pub fn start_animation(
        &mut self,
        name: &str,
    ) {
        self.for_registered(name, |object| object.start_animation(name));
    }

    /// Stops the animation called `name` in every object.
    pub fn stop_animation(
        &mut self,
        name: &str,
    ) {
        self.for_registered(name, |object| object.stop_animation(name));
    }

    /// Pauses the animation called `name` in every object.
    pub fn pause_animation(
        &mut self,
        name: &str,
    ) {
        self.for_registered(name, |object| object.pause_animation(name));
    }

    /// Plays every registered animation.
    pub fn start_all_animations(&mut self) {
        let names: Vec<String> = self.animations.iter().cloned().collect();
        for name in names {
            self.start_animation(&name);
        }
    }

    /// Stops every registered animation.
    pub fn stop_all_animations(&mut self) {
        let names: Vec<String> = self.animations.iter().cloned().collect();
        for name in names {
            self.stop_animation(&name);
        }
    }

    /// Pauses every registered animation.
    pub fn pause_all_animations(&mut self) {
        let names: Vec<String> = self.animations.iter().cloned().collect();
        for name in names {
            self.pause_animation(&name);
        }
    }

    /// Number of registered animation names.
    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    /// Number of objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// The registered animation names.
    pub fn animations(&self) -> &BTreeSet<String> {
        &self.animations
    }

    /// The objects, by name.
    pub fn objects(&self) -> &BTreeMap<String, AnimatedObject> {
        &self.objects
    }

    /// Returns the object called `name`.
    pub fn object(
        &self,
        name: &str,
    ) -> Option<&AnimatedObject> {
        self.objects.get(name)
    }

    /// Returns the object called `name`.
    pub fn object_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut AnimatedObject> {
        self.objects.get_mut(name)
    }

    /// Advances every object by the time elapsed since the last update.
    pub fn update(&mut self) {
        let elapsed = self.timer.lap();
        self.update_elapsed(elapsed);
    }

    /// Advances every object by `delta` seconds.
    pub fn update_elapsed(
        &mut self,
        delta: f32,
    ) {
        for object in self.objects.values_mut() {
            object.update(delta);
        }
    }
}
