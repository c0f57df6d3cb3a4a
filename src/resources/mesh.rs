use std::sync::Arc;

use super::geometry::Geometry;
use super::material::Material;

/// Drawable component of a node: shared geometry plus its own material.
#[derive(Debug)]
pub struct Mesh {
    pub geometry: Arc<Geometry>,
    pub material: Material,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
    pub visible: bool,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: impl Into<Arc<Geometry>>, material: Material) -> Self {
        Self {
            geometry: geometry.into(),
            material,
            cast_shadows: false,
            receive_shadows: false,
            visible: true,
        }
    }

    #[must_use]
    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadows = cast;
        self.receive_shadows = receive;
        self
    }
}
