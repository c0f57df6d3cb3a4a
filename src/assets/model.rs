//! Decoded model, owned by the loader until it is moved into a scene with
//! [`Scene::instantiate`](crate::scene::Scene::instantiate).

use crate::resources::mesh::Mesh;
use crate::scene::Transform;

#[derive(Debug)]
pub struct ModelNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<Mesh>,
    /// Indices into [`ModelAsset::nodes`].
    pub children: Vec<usize>,
}

#[derive(Debug)]
pub struct ModelAsset {
    pub name: String,
    /// Transform of the group node that holds the model in the scene.
    pub root: Transform,
    pub nodes: Vec<ModelNode>,
    /// Indices of the top-level nodes.
    pub roots: Vec<usize>,
}

impl ModelAsset {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: Transform::new(),
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn meshes_mut(&mut self) -> impl Iterator<Item = &mut Mesh> {
        self.nodes.iter_mut().filter_map(|n| n.mesh.as_mut())
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.mesh.is_some()).count()
    }

    /// Applies the same shadow flags to every drawable part.
    pub fn set_shadows(&mut self, cast: bool, receive: bool) {
        for mesh in self.meshes_mut() {
            mesh.cast_shadows = cast;
            mesh.receive_shadows = receive;
        }
    }
}
