/// Implements [`Animable`] on a type that stores its template animations in a
/// `BTreeMap<String, Animation>` field.
///
/// If the field parameter is omitted then the field name defaults to `animations`.
///
/// # Examples
///
/// ```rust
/// #[macro_use]
/// extern crate castor3d;
///
/// use std::collections::BTreeMap;
/// use castor3d::animation::{Animable, Animation};
///
/// struct Prop {
///     clips: BTreeMap<String, Animation>,
/// }
/// animable!(Prop::clips);
///
/// # fn main() {
/// let mut prop = Prop { clips: BTreeMap::new() };
/// prop.create_animation("spin");
/// assert!(prop.animation("spin").is_some());
/// # }
/// ```
///
/// [`Animable`]: animation/trait.Animable.html
#[macro_export]
macro_rules! animable {
    ($($name:ident),*) => {
        animable!($($name::animations),*);
    };
    ($($name:ident::$field:ident),*) => {
        $(
            impl $crate::animation::Animable for $name {
                fn animations(&self) -> &::std::collections::BTreeMap<String, $crate::animation::Animation> {
                    &self.$field
                }

                fn animations_mut(&mut self) -> &mut ::std::collections::BTreeMap<String, $crate::animation::Animation> {
                    &mut self.$field
                }
            }
        )*
    };
}
