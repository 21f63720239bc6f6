//! Mesh skinning.

use std::collections::BTreeMap;

use cgmath::{Matrix4, SquareMatrix};
use mint;

use animation::{Animation, MovingKind};

/// Index of a [`Bone`] in its [`Skeleton`].
///
/// Bone indices follow insertion order, which is the order vertex bone
/// attributes refer to.
///
/// [`Bone`]: struct.Bone.html
/// [`Skeleton`]: struct.Skeleton.html
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BoneId(pub(crate) usize);

impl BoneId {
    /// Position of the bone in the skinning order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single bone that forms one component of a [`Skeleton`].
///
/// [`Skeleton`]: struct.Skeleton.html
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    name: String,
    offset: Matrix4<f32>,
    final_transformation: Matrix4<f32>,
    parent: Option<BoneId>,
    children: Vec<BoneId>,
}

impl Bone {
    /// Name of the bone, unique in its skeleton.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind-pose transform from mesh space to bone space.
    pub fn offset_matrix(&self) -> Matrix4<f32> {
        self.offset
    }

    /// Skinning transform computed at the last applied animation frame.
    pub fn final_transformation(&self) -> Matrix4<f32> {
        self.final_transformation
    }

    /// Parent bone.
    pub fn parent(&self) -> Option<BoneId> {
        self.parent
    }

    /// Child bones, in the order they were added.
    pub fn children(&self) -> &[BoneId] {
        &self.children
    }
}

/// Contains array of bones.
#[derive(Clone, Debug)]
pub struct Skeleton {
    bones: Vec<Bone>,
    global_inverse: Matrix4<f32>,
    animations: BTreeMap<String, Animation>,
}
animable!(Skeleton);

impl Default for Skeleton {
    fn default() -> Self {
        Skeleton {
            bones: Vec::new(),
            global_inverse: Matrix4::identity(),
            animations: BTreeMap::new(),
        }
    }
}

impl Skeleton {
    /// Creates an empty skeleton with an identity global inverse transform.
    pub fn new() -> Self {
        Skeleton::default()
    }

    /// Appends a bone with the given bind-pose `offset` matrix.
    pub fn add_bone<M>(
        &mut self,
        name: &str,
        offset: M,
    ) -> BoneId
    where
        M: Into<mint::ColumnMatrix4<f32>>,
    {
        let offset: mint::ColumnMatrix4<f32> = offset.into();
        let id = BoneId(self.bones.len());
        self.bones.push(Bone {
            name: name.to_string(),
            offset: Matrix4::from(offset),
            final_transformation: Matrix4::identity(),
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Appends `child` to the children of `parent`.
    ///
    /// The hierarchy is not validated: the caller builds a proper tree.
    pub fn add_child(
        &mut self,
        parent: BoneId,
        child: BoneId,
    ) {
        if parent.0 >= self.bones.len() || child.0 >= self.bones.len() {
            return;
        }
        self.bones[parent.0].children.push(child);
        self.bones[child.0].parent = Some(parent);
    }

    /// Returns the bone at `id`.
    pub fn bone(
        &self,
        id: BoneId,
    ) -> Option<&Bone> {
        self.bones.get(id.0)
    }

    /// Looks up a bone by name.
    pub fn bone_by_name(
        &self,
        name: &str,
    ) -> Option<BoneId> {
        self.bones
            .iter()
            .position(|bone| bone.name == name)
            .map(BoneId)
    }

    /// All bones, in skinning order.
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Number of bones.
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Returns `true` if the skeleton has no bone.
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// World to bind-space correction applied to every bone.
    pub fn global_inverse_transform(&self) -> Matrix4<f32> {
        self.global_inverse
    }

    /// Sets the world to bind-space correction.
    pub fn set_global_inverse_transform<M>(
        &mut self,
        transform: M,
    ) where
        M: Into<mint::ColumnMatrix4<f32>>,
    {
        let transform: mint::ColumnMatrix4<f32> = transform.into();
        self.global_inverse = Matrix4::from(transform);
    }

    /// Calls `visit` on every descendant of `bone`, in pre-order.
    pub fn traverse_hierarchy<F>(
        &self,
        bone: BoneId,
        mut visit: F,
    ) where
        F: FnMut(BoneId, &Bone),
    {
        let mut stack = match self.bones.get(bone.0) {
            Some(bone) => bone.children.iter().rev().cloned().collect::<Vec<_>>(),
            None => return,
        };
        while let Some(id) = stack.pop() {
            let bone = &self.bones[id.0];
            visit(id, bone);
            stack.extend(bone.children.iter().rev().cloned());
        }
    }

    /// Stores the bone transforms computed by `animation` as the final
    /// transformations of the same-named bones.
    pub fn apply_animation(
        &mut self,
        animation: &Animation,
    ) {
        for (_, id) in animation.iter() {
            let object = match animation.moving_object(id) {
                Some(object) => object,
                None => continue,
            };
            if let MovingKind::Bone(ref binding) = *object.kind() {
                if let (Some(bone), Some(transform)) =
                    (self.bone_by_name(binding.name()), object.bone_transformation())
                {
                    self.bones[bone.0].final_transformation = transform;
                }
            }
        }
    }

    /// Final transformations of all bones, in skinning order.
    pub fn final_transforms(&self) -> Vec<Matrix4<f32>> {
        self.bones.iter().map(|bone| bone.final_transformation).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    fn arm() -> (Skeleton, BoneId, BoneId, BoneId, BoneId) {
        let mut skeleton = Skeleton::new();
        let shoulder = skeleton.add_bone("shoulder", Matrix4::identity());
        let elbow = skeleton.add_bone("elbow", Matrix4::identity());
        let wrist = skeleton.add_bone("wrist", Matrix4::identity());
        let thumb = skeleton.add_bone("thumb", Matrix4::identity());
        skeleton.add_child(shoulder, elbow);
        skeleton.add_child(elbow, wrist);
        skeleton.add_child(shoulder, thumb);
        (skeleton, shoulder, elbow, wrist, thumb)
    }

    #[test]
    fn bones_keep_insertion_order() {
        let (skeleton, shoulder, _, wrist, _) = arm();
        let names: Vec<_> = skeleton.bones().iter().map(Bone::name).collect();
        assert_eq!(names, vec!["shoulder", "elbow", "wrist", "thumb"]);
        assert_eq!(skeleton.bone_by_name("wrist"), Some(wrist));
        assert_eq!(skeleton.bone_by_name("knee"), None);
        assert_eq!(skeleton.bone(wrist).unwrap().parent().map(BoneId::index), Some(1));
        assert_eq!(skeleton.bone(shoulder).unwrap().parent(), None);
    }

    #[test]
    fn traverse_is_pre_order() {
        let (skeleton, shoulder, elbow, wrist, thumb) = arm();
        let mut visited = Vec::new();
        skeleton.traverse_hierarchy(shoulder, |id, _| visited.push(id));
        assert_eq!(visited, vec![elbow, wrist, thumb]);
    }

    #[test]
    fn offset_is_stored_as_given() {
        let mut skeleton = Skeleton::new();
        let offset = Matrix4::from_translation(Vector3::new(0.0, 0.0, 1.0));
        let hand = skeleton.add_bone("hand", offset);
        assert_eq!(skeleton.bone(hand).unwrap().offset_matrix(), offset);
        assert_eq!(skeleton.final_transforms(), vec![Matrix4::identity()]);
    }

    #[test]
    fn apply_animation_writes_final_transformations() {
        let mut skeleton = Skeleton::new();
        let hand = skeleton.add_bone("hand", Matrix4::from_translation(Vector3::new(0.0, 0.0, 1.0)));
        let mut animation = Animation::new("lift");
        let moving = animation.add_moving_bone(&skeleton, hand).unwrap();
        *animation
            .moving_object_mut(moving)
            .unwrap()
            .add_translate_key_frame(0.0) = Vector3::new(0.0, 2.0, 0.0);
        animation.play();
        animation.update(0.0);
        skeleton.apply_animation(&animation);

        assert_eq!(
            skeleton.bone(hand).unwrap().final_transformation(),
            Matrix4::from_translation(Vector3::new(0.0, 2.0, 1.0))
        );
    }
}
