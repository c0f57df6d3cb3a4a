use std::borrow::Cow;

use glam::Vec3;

use super::NodeKey;
use super::light::Light;
use super::transform::Transform;
use crate::resources::mesh::Mesh;

/// A scene graph node.
///
/// Nodes carry their components inline: an optional drawable [`Mesh`] and an
/// optional [`Light`]. Hierarchy links are maintained by the [`Scene`](super::Scene).
#[derive(Debug)]
pub struct Node {
    pub name: Cow<'static, str>,
    pub transform: Transform,
    pub visible: bool,

    pub mesh: Option<Mesh>,
    pub light: Option<Light>,

    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::new(),
            visible: true,
            mesh: None,
            light: None,
            parent: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_mesh(name: impl Into<Cow<'static, str>>, mesh: Mesh) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::new(name)
        }
    }

    #[must_use]
    pub fn with_light(name: impl Into<Cow<'static, str>>, light: Light) -> Self {
        Self {
            light: Some(light),
            ..Self::new(name)
        }
    }

    #[must_use]
    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}
