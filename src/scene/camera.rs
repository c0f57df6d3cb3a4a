use std::borrow::Cow;

use glam::{Mat4, Vec3};
use uuid::Uuid;

use super::transform::Transform;

/// Perspective camera.
///
/// The camera lives outside the scene graph; it owns its own [`Transform`]
/// which the orbit controller rewrites every tick.
#[derive(Debug, Clone)]
pub struct Camera {
    pub uuid: Uuid,
    pub name: Cow<'static, str>,
    pub transform: Transform,

    // Projection (fov stored in radians)
    fov: f32,
    aspect: f32,
    pub near: f32,
    pub far: f32,

    // Cached matrices, read by the renderer
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) view_projection_matrix: Mat4,
}

impl Camera {
    /// Creates a perspective camera. `fov_degrees` is the vertical field of view.
    #[must_use]
    pub fn new_perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            uuid: Uuid::new_v4(),
            name: Cow::Borrowed("Camera"),
            transform: Transform::new(),
            fov: fov_degrees.to_radians(),
            aspect,
            near,
            far,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        };

        cam.update_projection_matrix();
        cam.update_view_matrix();
        cam
    }

    #[must_use]
    pub fn fov_degrees(&self) -> f32 {
        self.fov.to_degrees()
    }

    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Updates the aspect ratio and recomputes the projection.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
            self.update_projection_matrix();
        }
    }

    pub fn set_fov_degrees(&mut self, fov_degrees: f32) {
        self.fov = fov_degrees.to_radians();
        self.update_projection_matrix();
    }

    pub fn update_projection_matrix(&mut self) {
        // glam's perspective_rh targets a [0, 1] depth range, matching wgpu
        self.projection_matrix = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    /// Recomputes the view matrix from the camera transform.
    pub fn update_view_matrix(&mut self) {
        self.transform.update_local_matrix();
        let local = self.transform.local_matrix;
        self.transform.set_world_matrix(local);
        self.view_matrix = Mat4::from(local).inverse();
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    /// Moves the camera and points it at `target`.
    pub fn look_at_from(&mut self, position: Vec3, target: Vec3) {
        self.transform.position = position;
        self.transform.look_at(target, Vec3::Y);
        self.update_view_matrix();
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.view_projection_matrix
    }
}
