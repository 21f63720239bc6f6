use std::collections::BTreeMap;

use super::Animation;

/// An entity that carries named template animations.
///
/// Meshes, skeletons and geometries are animable. Their animations are never
/// played directly: an [`AnimatedObject`] instantiates private copies of them.
///
/// Implement it with the [`animable!`] macro.
///
/// [`AnimatedObject`]: struct.AnimatedObject.html
/// [`animable!`]: ../macro.animable.html
pub trait Animable {
    /// The template animations, by name.
    fn animations(&self) -> &BTreeMap<String, Animation>;

    /// The template animations, by name.
    fn animations_mut(&mut self) -> &mut BTreeMap<String, Animation>;

    /// Returns the animation called `name`, creating an empty one if needed.
    fn create_animation(
        &mut self,
        name: &str,
    ) -> &mut Animation {
        self.animations_mut()
            .entry(name.to_string())
            .or_insert_with(|| Animation::new(name))
    }

    /// Stores `animation` under its own name, returning the one it replaces.
    fn add_animation(
        &mut self,
        animation: Animation,
    ) -> Option<Animation> {
        let name = animation.name().to_string();
        self.animations_mut().insert(name, animation)
    }

    /// Returns the animation called `name`.
    fn animation(
        &self,
        name: &str,
    ) -> Option<&Animation> {
        self.animations().get(name)
    }

    /// Returns the animation called `name`.
    fn animation_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut Animation> {
        self.animations_mut().get_mut(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy {
        animations: BTreeMap<String, Animation>,
    }
    animable!(Dummy);

    #[test]
    fn create_animation_is_get_or_create() {
        let mut dummy = Dummy { animations: BTreeMap::new() };
        dummy.create_animation("walk").set_looped(true);
        assert!(dummy.create_animation("walk").is_looped());
        assert_eq!(dummy.animations().len(), 1);
    }

    #[test]
    fn add_animation_replaces_by_name() {
        let mut dummy = Dummy { animations: BTreeMap::new() };
        dummy.create_animation("run");
        let previous = dummy.add_animation(Animation::new("run"));
        assert!(previous.is_some());
        assert!(dummy.animation("run").is_some());
        assert!(dummy.animation("jump").is_none());
    }
}
