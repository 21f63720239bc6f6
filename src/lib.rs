#![warn(missing_docs)]
//! Scene graph, skeleton and keyframe animation core of the Castor3D engine.
//!
//! ## Overview
//!
//! * A [`Scene`] owns every [`SceneNode`] and [`MovableObject`]. Nodes cache
//!   their local and world matrices and rebuild them lazily after a change.
//! * A [`Skeleton`] holds the bones of a [`Mesh`] in skinning order.
//! * The [`animation`] module plays keyframe animations over bones, movable
//!   objects and pivot nodes, per instance, in synchronized groups.
//!
//! ```rust
//! # extern crate castor3d;
//! # fn main() {
//! let mut scene = castor3d::Scene::new("demo");
//! let arm = scene.create_node("arm", None);
//! let hand = scene.create_node("hand", Some(arm));
//! scene.set_position(arm, [1.0, 0.0, 0.0]);
//! scene.set_position(hand, [0.0, 1.0, 0.0]);
//! let world = scene.derived_position(hand).unwrap();
//! assert_eq!((world.x, world.y, world.z), (1.0, 1.0, 0.0));
//! # }
//! ```
//!
//! [`Scene`]: struct.Scene.html
//! [`SceneNode`]: struct.SceneNode.html
//! [`MovableObject`]: struct.MovableObject.html
//! [`Skeleton`]: struct.Skeleton.html
//! [`Mesh`]: struct.Mesh.html
//! [`animation`]: animation/index.html

extern crate arrayvec;
#[macro_use]
extern crate bitflags;
extern crate cgmath;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate mint;
#[macro_use]
extern crate quick_error;
extern crate vec_map;

#[macro_use]
mod macros;

pub mod animation;
mod geometry;
mod mesh;
mod node;
mod object;
mod scene;
mod skeleton;
mod timer;

pub use animation::{AnimatedObject, AnimatedObjectGroup, Animable, Animation, AnimationError};
pub use geometry::Geometry;
pub use mesh::{BoundingBox, BoundingSphere, Mesh, Submesh, SubmeshRenderer, VertexBoneData,
               MAX_BONES_PER_VERTEX};
pub use node::{NodeId, NodeInfo, NodeTransform, SceneNode};
pub use object::{MovableObject, ObjectId, ObjectKind};
pub use scene::{Scene, ROOT_NAME};
pub use skeleton::{Bone, BoneId, Skeleton};
pub use timer::{Timer, TimerDuration};

/// Position in 3D space.
pub type Position = cgmath::Point3<f32>;
/// Direction or displacement in 3D space.
pub type Vector = cgmath::Vector3<f32>;
/// Rotation in 3D space.
pub type Orientation = cgmath::Quaternion<f32>;
/// Affine transform.
pub type Matrix = cgmath::Matrix4<f32>;
