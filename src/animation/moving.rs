//! Moving objects: the per-animation tree of things that keyframes drive.

use cgmath::{InnerSpace, Matrix3, Matrix4, Quaternion, SquareMatrix, Vector3};
use mint;

use super::track::{Interpolation, Track};
use skeleton::{BoneId, Skeleton};

/// Handle of a [`MovingObjectBase`] inside its owning [`Animation`].
///
/// Handles are only meaningful for the animation that issued them.
///
/// [`MovingObjectBase`]: struct.MovingObjectBase.html
/// [`Animation`]: struct.Animation.html
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MovingObjectId(pub(crate) usize);

impl MovingObjectId {
    /// Position of the object in its animation's arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Binding of a moving object to a skeleton bone.
///
/// The offset matrix and the skeleton's global inverse transform are copied
/// when the binding is made; neither changes while an animation plays.
#[derive(Clone, Debug, PartialEq)]
pub struct BoneBinding {
    pub(crate) name: String,
    pub(crate) bone: BoneId,
    pub(crate) offset: Matrix4<f32>,
    pub(crate) global_inverse: Matrix4<f32>,
}

impl BoneBinding {
    /// Binds to `bone` of `skeleton`, or returns `None` if there is no such bone.
    pub fn new(
        skeleton: &Skeleton,
        bone: BoneId,
    ) -> Option<Self> {
        let data = skeleton.bone(bone)?;
        Some(BoneBinding {
            name: data.name().to_string(),
            bone,
            offset: data.offset_matrix(),
            global_inverse: skeleton.global_inverse_transform(),
        })
    }

    /// Name of the bound bone.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the bound bone in its skeleton.
    pub fn bone(&self) -> BoneId {
        self.bone
    }

    /// Bind-pose offset matrix of the bound bone.
    pub fn offset(&self) -> Matrix4<f32> {
        self.offset
    }
}

/// What a moving object drives.
#[derive(Clone, Debug, PartialEq)]
pub enum MovingKind {
    /// Abstract pivot, only used to place intermediate transforms.
    Node,
    /// A skeleton bone.
    Bone(BoneBinding),
    /// A movable object of the scene, by name.
    Object(String),
}

impl MovingKind {
    /// Name of the driven entity, empty for abstract nodes.
    pub fn name(&self) -> &str {
        match *self {
            MovingKind::Node => "",
            MovingKind::Bone(ref binding) => &binding.name,
            MovingKind::Object(ref name) => name,
        }
    }

    /// Rebinds a bone binding against `skeleton` by bone name.
    pub(crate) fn rebound(
        &self,
        skeleton: Option<&Skeleton>,
    ) -> MovingKind {
        match *self {
            MovingKind::Bone(ref binding) => {
                let rebound = skeleton.and_then(|skeleton| {
                    skeleton
                        .bone_by_name(&binding.name)
                        .and_then(|bone| BoneBinding::new(skeleton, bone))
                });
                match rebound {
                    Some(binding) => MovingKind::Bone(binding),
                    None => {
                        if skeleton.is_some() {
                            warn!("Bone {:?} is missing from the target skeleton - keeping its template binding",
                                binding.name);
                        }
                        self.clone()
                    }
                }
            }
            _ => self.clone(),
        }
    }
}

/// Interpolated local components of a moving object at its last update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalPose {
    /// Translation.
    pub position: Vector3<f32>,
    /// Rotation.
    pub orientation: Quaternion<f32>,
    /// Non-uniform scale.
    pub scale: Vector3<f32>,
}

/// A node of an animation's moving-object tree.
///
/// Holds the scale, translate and rotate keyframe channels of one animated
/// entity and the matrices computed from them at the last update.
#[derive(Clone, Debug)]
pub struct MovingObjectBase {
    pub(crate) key: String,
    pub(crate) kind: MovingKind,
    scales: Track<Vector3<f32>>,
    translates: Track<Vector3<f32>>,
    rotates: Track<Quaternion<f32>>,
    interpolation: Interpolation,
    node_transform: Matrix4<f32>,
    final_transformation: Matrix4<f32>,
    bone_transformation: Matrix4<f32>,
    pose: Option<LocalPose>,
    final_pose: Option<LocalPose>,
    pub(crate) length: f32,
    pub(crate) parent: Option<MovingObjectId>,
    pub(crate) children: Vec<MovingObjectId>,
}

impl MovingObjectBase {
    pub(crate) fn new(
        key: String,
        kind: MovingKind,
    ) -> Self {
        MovingObjectBase {
            key,
            kind,
            scales: Track::new(),
            translates: Track::new(),
            rotates: Track::new(),
            interpolation: Interpolation::default(),
            node_transform: Matrix4::identity(),
            final_transformation: Matrix4::identity(),
            bone_transformation: Matrix4::identity(),
            pose: None,
            final_pose: None,
            length: 0.0,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Key of this object in its animation.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// What this object drives.
    pub fn kind(&self) -> &MovingKind {
        &self.kind
    }

    /// Name of the driven entity, empty for abstract nodes.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Parent object, if any.
    pub fn parent(&self) -> Option<MovingObjectId> {
        self.parent
    }

    /// Children, in insertion order.
    pub fn children(&self) -> &[MovingObjectId] {
        &self.children
    }

    /// Returns the scale keyframe at `time`, creating it as a unit scale.
    pub fn add_scale_key_frame(
        &mut self,
        time: f32,
    ) -> &mut Vector3<f32> {
        self.scales.insert(time, Vector3::new(1.0, 1.0, 1.0))
    }

    /// Returns the translate keyframe at `time`, creating it as a null translation.
    pub fn add_translate_key_frame(
        &mut self,
        time: f32,
    ) -> &mut Vector3<f32> {
        self.translates.insert(time, Vector3::new(0.0, 0.0, 0.0))
    }

    /// Returns the rotate keyframe at `time`, creating it as the identity rotation.
    pub fn add_rotate_key_frame(
        &mut self,
        time: f32,
    ) -> &mut Quaternion<f32> {
        self.rotates.insert(time, Quaternion::new(1.0, 0.0, 0.0, 0.0))
    }

    /// Removes the scale keyframe starting at `time`, if any.
    pub fn remove_scale_key_frame(
        &mut self,
        time: f32,
    ) {
        let _ = self.scales.remove(time);
    }

    /// Removes the translate keyframe starting at `time`, if any.
    pub fn remove_translate_key_frame(
        &mut self,
        time: f32,
    ) {
        let _ = self.translates.remove(time);
    }

    /// Removes the rotate keyframe starting at `time`, if any.
    pub fn remove_rotate_key_frame(
        &mut self,
        time: f32,
    ) {
        let _ = self.rotates.remove(time);
    }

    /// Scale keyframes.
    pub fn scales(&self) -> &Track<Vector3<f32>> {
        &self.scales
    }

    /// Translate keyframes.
    pub fn translates(&self) -> &Track<Vector3<f32>> {
        &self.translates
    }

    /// Rotate keyframes.
    pub fn rotates(&self) -> &Track<Quaternion<f32>> {
        &self.rotates
    }

    /// Returns `true` if any channel holds a keyframe.
    pub fn has_key_frames(&self) -> bool {
        !self.scales.is_empty() || !self.translates.is_empty() || !self.rotates.is_empty()
    }

    /// Interpolation used between keyframes.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Sets the interpolation used between keyframes.
    pub fn set_interpolation(
        &mut self,
        interpolation: Interpolation,
    ) {
        self.interpolation = interpolation;
    }

    /// Static local transform used when the object has no keyframes.
    pub fn node_transform(&self) -> Matrix4<f32> {
        self.node_transform
    }

    /// Sets the static local transform used when the object has no keyframes.
    pub fn set_node_transform<M>(
        &mut self,
        transform: M,
    ) where
        M: Into<mint::ColumnMatrix4<f32>>,
    {
        let transform: mint::ColumnMatrix4<f32> = transform.into();
        self.node_transform = Matrix4::from(transform);
    }

    /// Length of this object's keyframes, children included.
    ///
    /// Stored when the owning animation computes its own length.
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Overrides the stored length.
    pub fn set_length(
        &mut self,
        length: f32,
    ) {
        self.length = length;
    }

    /// Time of the last keyframe of this object alone.
    pub fn key_frames_length(&self) -> f32 {
        self.scales
            .length()
            .max(self.translates.length())
            .max(self.rotates.length())
    }

    /// Parent transform combined with this object's local transform.
    ///
    /// This is the transform handed down to the children.
    pub fn final_transformation(&self) -> Matrix4<f32> {
        self.final_transformation
    }

    /// Skinning transform of a bone-bound object:
    /// `global_inverse * final_transformation * offset`.
    pub fn bone_transformation(&self) -> Option<Matrix4<f32>> {
        match self.kind {
            MovingKind::Bone(_) => Some(self.bone_transformation),
            _ => None,
        }
    }

    /// Local components computed at the last update.
    pub fn pose(&self) -> Option<LocalPose> {
        self.pose
    }

    /// Components of `final_transformation` at the last update, parent
    /// transforms included. `None` before the first update.
    pub fn final_pose(&self) -> Option<LocalPose> {
        self.final_pose
    }

    fn compute(
        &mut self,
        time: f32,
    ) -> Matrix4<f32> {
        if !self.has_key_frames() {
            self.pose = None;
            return self.node_transform;
        }

        let pose = LocalPose {
            position: self
                .translates
                .sample(time, self.interpolation)
                .unwrap_or_else(|| Vector3::new(0.0, 0.0, 0.0)),
            orientation: self
                .rotates
                .sample(time, self.interpolation)
                .unwrap_or_else(|| Quaternion::new(1.0, 0.0, 0.0, 0.0)),
            scale: self
                .scales
                .sample(time, self.interpolation)
                .unwrap_or_else(|| Vector3::new(1.0, 1.0, 1.0)),
        };
        self.pose = Some(pose);

        Matrix4::from_translation(pose.position)
            * Matrix4::from(pose.orientation)
            * Matrix4::from_nonuniform_scale(pose.scale.x, pose.scale.y, pose.scale.z)
    }

    /// Recomputes the matrices of this object alone at `time`.
    ///
    /// The caller walks the children with `final_transformation`.
    pub(crate) fn update(
        &mut self,
        time: f32,
        looped: bool,
        parent: &Matrix4<f32>,
    ) {
        let time = if looped && self.length > 0.0 {
            time % self.length
        } else {
            time
        };
        let local = self.compute(time);
        self.final_transformation = parent * local;
        self.final_pose = Some(decompose(&self.final_transformation));
        if let MovingKind::Bone(ref binding) = self.kind {
            self.bone_transformation =
                binding.global_inverse * self.final_transformation * binding.offset;
        }
    }

    /// Copy of this object with fresh matrices, no links and a rebound target.
    pub(crate) fn detached_clone(
        &self,
        skeleton: Option<&Skeleton>,
    ) -> Self {
        MovingObjectBase {
            key: self.key.clone(),
            kind: self.kind.rebound(skeleton),
            scales: self.scales.clone(),
            translates: self.translates.clone(),
            rotates: self.rotates.clone(),
            interpolation: self.interpolation,
            node_transform: self.node_transform,
            final_transformation: Matrix4::identity(),
            bone_transformation: Matrix4::identity(),
            pose: None,
            final_pose: None,
            length: self.length,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Splits an affine transform into translation, rotation and scale.
///
/// Shear coming from non-uniform scales under rotated parents is dropped.
fn decompose(matrix: &Matrix4<f32>) -> LocalPose {
    let axes = [matrix.x.truncate(), matrix.y.truncate(), matrix.z.truncate()];
    let scale = Vector3::new(axes[0].magnitude(), axes[1].magnitude(), axes[2].magnitude());
    let unit = |axis: Vector3<f32>, length: f32| if length > 0.0 { axis / length } else { axis };
    let rotation = Matrix3::from_cols(
        unit(axes[0], scale.x),
        unit(axes[1], scale.y),
        unit(axes[2], scale.z),
    );
    LocalPose {
        position: matrix.w.truncate(),
        orientation: Quaternion::from(rotation).normalize(),
        scale,
    }
}
