use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::resources::input::{Input, Key, MouseButton};
use crate::scene::Camera;

/// Keyboard pan step, in screen pixels per key press.
const KEY_PAN_PIXELS: f32 = 7.0;
const PHI_EPS: f32 = 0.0001;

/// Orbit camera around a target point.
///
/// Left drag rotates, right drag, Shift/Ctrl + left drag or arrow keys pan,
/// the wheel zooms. Grabbing with the left button stops leftover damped
/// rotation. With
/// `auto_rotate` the camera also circles the target on its own at
/// `auto_rotate_speed` (1.0 is one turn per minute).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitControls {
    pub enabled: bool,

    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub damping_factor: f32,
    pub enable_damping: bool,
    pub min_distance: f32,
    pub max_distance: f32,

    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,

    pub center: Vec3,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,

    #[serde(skip)]
    rotate_delta: Vec2,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 10.0)
    }
}

impl OrbitControls {
    #[must_use]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            enabled: true,

            rotate_speed: 1.0,
            zoom_speed: 0.05,
            pan_speed: 1.0,
            damping_factor: 0.05,
            enable_damping: true,
            min_distance: 1.0,
            max_distance: 1000.0,

            auto_rotate: false,
            auto_rotate_speed: 2.0,

            center,
            radius,
            theta: 0.0,
            phi: PI / 2.0,

            rotate_delta: Vec2::ZERO,
        }
    }

    /// Orbit state matching the camera's current position around `target`.
    #[must_use]
    pub fn from_camera(camera: &Camera, target: Vec3) -> Self {
        let mut controls = Self::new(target, 1.0);
        controls.set_target(target, camera.position());
        controls
    }

    #[must_use]
    pub fn with_auto_rotate(mut self, speed: f32) -> Self {
        self.auto_rotate = true;
        self.auto_rotate_speed = speed;
        self
    }

    /// Moves the orbit center, keeping the camera where it is.
    pub fn set_target(&mut self, target: Vec3, camera_position: Vec3) {
        self.center = target;
        let offset = camera_position - target;
        self.radius = offset.length().clamp(self.min_distance, self.max_distance);
        if offset.length_squared() > f32::EPSILON {
            self.theta = offset.x.atan2(offset.z);
            self.phi = (offset.y / offset.length()).clamp(-1.0, 1.0).acos();
        }
        self.phi = self.phi.clamp(PHI_EPS, PI - PHI_EPS);
    }

    #[must_use]
    pub fn target(&self) -> Vec3 {
        self.center
    }

    /// Camera position implied by the current spherical coordinates.
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        self.center + self.radius * spherical_direction(self.theta, self.phi)
    }

    /// Radians of auto-rotation for a step of `dt` seconds.
    #[must_use]
    pub fn auto_rotation_angle(&self, dt: f32) -> f32 {
        TAU / 60.0 * self.auto_rotate_speed * dt
    }

    /// Applies this tick's input and rewrites the camera transform.
    pub fn update(&mut self, camera: &mut Camera, input: &Input, dt: f32) {
        if self.enabled {
            self.apply_input(input, camera.fov_degrees());
        }

        if self.auto_rotate {
            self.theta -= self.auto_rotation_angle(dt);
        }

        if self.enable_damping {
            let target_fps = 60.0;
            let retention = (1.0 - self.damping_factor).powf(dt * target_fps);
            let delta_apply = self.rotate_delta * (1.0 - retention);

            self.theta += delta_apply.x;
            self.phi += delta_apply.y;
            self.rotate_delta *= retention;
        } else {
            self.theta += self.rotate_delta.x;
            self.phi += self.rotate_delta.y;
            self.rotate_delta = Vec2::ZERO;
        }
        self.phi = self.phi.clamp(PHI_EPS, PI - PHI_EPS);

        camera.look_at_from(self.eye(), self.center);
    }

    fn apply_input(&mut self, input: &Input, fov_degrees: f32) {
        let screen_height = input.screen_size().y.max(1.0);
        let cursor_delta = input.mouse_delta();

        if input.get_mouse_button_down(MouseButton::Left) {
            self.rotate_delta = Vec2::ZERO;
        }
        let pan_modifier = input.get_key(Key::Shift) || input.get_key(Key::Control);
        let left_drag = input.get_mouse_button(MouseButton::Left);

        if left_drag && !pan_modifier {
            let rotate_per_pixel = TAU / screen_height;
            self.rotate_delta -= cursor_delta * rotate_per_pixel * self.rotate_speed;
        }

        let scroll = input.scroll_delta().y;
        if scroll != 0.0 {
            let scale = (1.0 - self.zoom_speed).powf(scroll.abs());
            if scroll > 0.0 {
                self.radius *= scale;
            } else {
                self.radius /= scale;
            }
            self.radius = self.radius.clamp(self.min_distance, self.max_distance);
        }

        let mut pan_pixels = Vec2::ZERO;
        if input.get_mouse_button(MouseButton::Right) || (left_drag && pan_modifier) {
            pan_pixels += cursor_delta;
        }
        for (key, step) in [
            (Key::ArrowUp, Vec2::new(0.0, KEY_PAN_PIXELS)),
            (Key::ArrowDown, Vec2::new(0.0, -KEY_PAN_PIXELS)),
            (Key::ArrowLeft, Vec2::new(KEY_PAN_PIXELS, 0.0)),
            (Key::ArrowRight, Vec2::new(-KEY_PAN_PIXELS, 0.0)),
        ] {
            if input.get_key_down(key) {
                pan_pixels += step;
            }
        }
        if pan_pixels != Vec2::ZERO {
            self.pan(pan_pixels, fov_degrees, screen_height);
        }
    }

    /// Pans by a screen-space delta, in pixels.
    fn pan(&mut self, pixels: Vec2, fov_degrees: f32, screen_height: f32) {
        let half_fov = fov_degrees.to_radians() / 2.0;
        let target_world_height = 2.0 * self.radius * half_fov.tan();
        let pixels_to_world_ratio = target_world_height / screen_height;

        let forward = -spherical_direction(self.theta, self.phi);
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward).normalize();

        self.center += (right * -pixels.x + up * pixels.y) * pixels_to_world_ratio * self.pan_speed;
    }
}

fn spherical_direction(theta: f32, phi: f32) -> Vec3 {
    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();
    Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
}
