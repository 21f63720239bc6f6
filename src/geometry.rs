//! Placed mesh instances.

use std::collections::BTreeMap;
use std::rc::Rc;

use animation::Animation;
use mesh::Mesh;

/// The animable side of a mesh placed in a scene.
///
/// A geometry shares the name of the [`MovableObject`] that places it, and
/// carries the animations that belong to that placement rather than to the
/// mesh itself.
///
/// [`MovableObject`]: struct.MovableObject.html
#[derive(Clone, Debug)]
pub struct Geometry {
    name: String,
    mesh: Option<Rc<Mesh>>,
    animations: BTreeMap<String, Animation>,
}
animable!(Geometry);

impl Geometry {
    /// Creates a geometry, optionally showing `mesh`.
    pub fn new(
        name: &str,
        mesh: Option<Rc<Mesh>>,
    ) -> Self {
        Geometry {
            name: name.to_string(),
            mesh,
            animations: BTreeMap::new(),
        }
    }

    /// Name of the geometry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mesh shown by this geometry.
    pub fn mesh(&self) -> Option<&Rc<Mesh>> {
        self.mesh.as_ref()
    }

    /// Sets the mesh shown by this geometry.
    pub fn set_mesh(
        &mut self,
        mesh: Option<Rc<Mesh>>,
    ) {
        self.mesh = mesh;
    }
}
