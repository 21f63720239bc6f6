//! Meshes, submeshes and their bounding volumes.

use std::collections::BTreeMap;
use std::rc::Rc;

use arrayvec::ArrayVec;
use cgmath::{EuclideanSpace, MetricSpace, Point3};
use mint;

use animation::Animation;
use skeleton::{BoneId, Skeleton};

/// Maximum number of bones influencing one vertex.
pub const MAX_BONES_PER_VERTEX: usize = 4;

/// Bone influences of one vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexBoneData {
    influences: ArrayVec<(BoneId, f32), MAX_BONES_PER_VERTEX>,
}

impl VertexBoneData {
    /// Creates a vertex influenced by no bone.
    pub fn new() -> Self {
        VertexBoneData::default()
    }

    /// Adds an influence. Returns `false` and drops it if the vertex
    /// already has [`MAX_BONES_PER_VERTEX`](constant.MAX_BONES_PER_VERTEX.html) of them.
    pub fn add(
        &mut self,
        bone: BoneId,
        weight: f32,
    ) -> bool {
        match self.influences.try_push((bone, weight)) {
            Ok(()) => true,
            Err(_) => {
                warn!("Vertex already has {} bone influences, dropping bone {}",
                    MAX_BONES_PER_VERTEX, bone.index());
                false
            }
        }
    }

    /// The `(bone, weight)` influences.
    pub fn influences(&self) -> &[(BoneId, f32)] {
        &self.influences
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: mint::Point3<f32>,
    /// Maximum corner.
    pub max: mint::Point3<f32>,
}

impl BoundingBox {
    fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a mint::Point3<f32>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(
            BoundingBox { min: first, max: first },
            |bbox, p| bbox.union(&BoundingBox { min: *p, max: *p }),
        ))
    }

    /// Smallest box holding both boxes.
    pub fn union(
        &self,
        other: &BoundingBox,
    ) -> BoundingBox {
        BoundingBox {
            min: mint::Point3 {
                x: self.min.x.min(other.min.x),
                y: self.min.y.min(other.min.y),
                z: self.min.z.min(other.min.z),
            },
            max: mint::Point3 {
                x: self.max.x.max(other.max.x),
                y: self.max.y.max(other.max.y),
                z: self.max.z.max(other.max.z),
            },
        }
    }

    /// Centre of the box.
    pub fn center(&self) -> mint::Point3<f32> {
        Point3::from(self.min).midpoint(Point3::from(self.max)).into()
    }
}

/// Bounding sphere centred on the bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    /// Centre.
    pub center: mint::Point3<f32>,
    /// Radius.
    pub radius: f32,
}

/// A part of a [`Mesh`](struct.Mesh.html) drawn in one call.
#[derive(Clone, Debug, Default)]
pub struct Submesh {
    /// Vertex positions.
    pub vertices: Vec<mint::Point3<f32>>,
    /// Triangles, as indices into `vertices`.
    pub faces: Vec<[u32; 3]>,
    /// Per-vertex bone influences, empty for rigid submeshes.
    pub bones: Vec<VertexBoneData>,
    bounding_box: Option<BoundingBox>,
    bounding_sphere: Option<BoundingSphere>,
}

impl Submesh {
    /// Computes the bounding volumes from the vertices.
    pub fn compute_containers(&mut self) {
        self.bounding_box = BoundingBox::from_points(&self.vertices);
        self.bounding_sphere = self.bounding_box.map(|bbox| {
            let center = Point3::from(bbox.center());
            let radius = self
                .vertices
                .iter()
                .map(|&v| center.distance(Point3::from(v)))
                .fold(0.0, f32::max);
            BoundingSphere {
                center: center.into(),
                radius,
            }
        });
    }

    /// Bounding box computed by the last `compute_containers` call.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    /// Bounding sphere computed by the last `compute_containers` call.
    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        self.bounding_sphere
    }

    /// Returns `true` if at least one vertex is influenced by a bone.
    pub fn is_skinned(&self) -> bool {
        self.bones.iter().any(|data| !data.influences().is_empty())
    }
}

/// Receives the submeshes to upload.
///
/// This is the only contact between the mesh data and a rendering backend.
pub trait SubmeshRenderer {
    /// Generates and uploads the buffers of `submesh`.
    fn generate_buffers(
        &mut self,
        submesh: &Submesh,
    );
}

/// A set of submeshes, optionally skinned by a shared skeleton.
#[derive(Clone, Debug)]
pub struct Mesh {
    name: String,
    submeshes: Vec<Submesh>,
    skeleton: Option<Rc<Skeleton>>,
    animations: BTreeMap<String, Animation>,
}
animable!(Mesh);

impl Mesh {
    /// Creates an empty mesh.
    pub fn new(name: &str) -> Self {
        Mesh {
            name: name.to_string(),
            submeshes: Vec::new(),
            skeleton: None,
            animations: BTreeMap::new(),
        }
    }

    /// Name of the mesh.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends an empty submesh.
    pub fn create_submesh(&mut self) -> &mut Submesh {
        self.submeshes.push(Submesh::default());
        let last = self.submeshes.len() - 1;
        &mut self.submeshes[last]
    }

    /// The submeshes.
    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes
    }

    /// Skeleton skinning this mesh.
    pub fn skeleton(&self) -> Option<&Rc<Skeleton>> {
        self.skeleton.as_ref()
    }

    /// Sets the skeleton skinning this mesh.
    pub fn set_skeleton(
        &mut self,
        skeleton: Rc<Skeleton>,
    ) {
        self.skeleton = Some(skeleton);
    }

    /// Computes the bounding volumes of every submesh.
    pub fn compute_containers(&mut self) {
        for submesh in &mut self.submeshes {
            submesh.compute_containers();
        }
    }

    /// Union of the submesh bounding boxes.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.submeshes
            .iter()
            .filter_map(Submesh::bounding_box)
            .fold(None, |acc: Option<BoundingBox>, bbox| match acc {
                Some(acc) => Some(acc.union(&bbox)),
                None => Some(bbox),
            })
    }

    /// Hands every submesh to `renderer`.
    pub fn generate_buffers<R: SubmeshRenderer>(
        &self,
        renderer: &mut R,
    ) {
        for submesh in &self.submeshes {
            renderer.generate_buffers(submesh);
        }
    }
}
