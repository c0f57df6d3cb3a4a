//! Per-tick scene animation
//!
//! Behaviors run at the start of every tick, before the orbit controller
//! and the render. Rates are stored per second; [`Rate::per_reference_tick`]
//! converts the fixed per-frame increments of the showcase scenes to that
//! form using [`REFERENCE_HZ`].

use glam::Vec3;

use crate::resources::uniforms::UniformValue;
use crate::scene::{NodeKey, Scene};

/// Refresh rate the per-frame showcase constants were tuned for.
pub const REFERENCE_HZ: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rate {
    /// Amount per second, scaled by the tick's `dt`.
    PerSecond(f32),
    /// Fixed amount per tick regardless of `dt`.
    PerTick(f32),
}

impl Rate {
    /// A per-frame constant expressed as a `dt`-scaled rate at [`REFERENCE_HZ`].
    #[must_use]
    pub fn per_reference_tick(amount: f32) -> Self {
        Self::PerSecond(amount * REFERENCE_HZ)
    }

    #[must_use]
    pub fn step(self, dt: f32) -> f32 {
        match self {
            Self::PerSecond(rate) => rate * dt,
            Self::PerTick(amount) => amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    /// Rotates a node about a local axis.
    Spin { node: NodeKey, axis: Vec3, rate: Rate },
    /// Advances a float uniform on the node's material.
    UniformClock {
        node: NodeKey,
        uniform: String,
        rate: Rate,
    },
}

impl Behavior {
    /// Spin around Y by `radians` per reference tick.
    #[must_use]
    pub fn spin_y(node: NodeKey, radians: f32) -> Self {
        Self::Spin {
            node,
            axis: Vec3::Y,
            rate: Rate::per_reference_tick(radians),
        }
    }

    /// Uniform clock advancing by `amount` per reference tick.
    #[must_use]
    pub fn uniform_clock(node: NodeKey, uniform: impl Into<String>, amount: f32) -> Self {
        Self::UniformClock {
            node,
            uniform: uniform.into(),
            rate: Rate::per_reference_tick(amount),
        }
    }

    /// Switches to a frame-locked rate with the same per-reference-tick step.
    #[must_use]
    pub fn per_tick(self) -> Self {
        let lock = |rate: Rate| match rate {
            Rate::PerSecond(r) => Rate::PerTick(r / REFERENCE_HZ),
            locked @ Rate::PerTick(_) => locked,
        };
        match self {
            Self::Spin { node, axis, rate } => Self::Spin {
                node,
                axis,
                rate: lock(rate),
            },
            Self::UniformClock { node, uniform, rate } => Self::UniformClock {
                node,
                uniform,
                rate: lock(rate),
            },
        }
    }

    #[must_use]
    pub fn node(&self) -> NodeKey {
        match self {
            Self::Spin { node, .. } | Self::UniformClock { node, .. } => *node,
        }
    }

    /// Applies one tick. Returns `false` when nothing changed: the node is
    /// gone, or the uniform is not registered yet because the material has
    /// not been compiled.
    pub fn apply(&self, scene: &mut Scene, dt: f32) -> bool {
        let Some(node) = scene.get_mut(self.node()) else {
            return false;
        };

        match self {
            Self::Spin { axis, rate, .. } => {
                node.transform.rotate_local(*axis, rate.step(dt));
                true
            }
            Self::UniformClock { uniform, rate, .. } => {
                let Some(mesh) = node.mesh.as_mut() else {
                    return false;
                };
                let step = rate.step(dt);
                mesh.material.update_uniform(uniform, |value| {
                    if let UniformValue::Float(t) = value {
                        *t += step;
                    }
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_rate_matches_per_tick_at_sixty_hz() {
        let rate = Rate::per_reference_tick(0.01);
        assert!((rate.step(1.0 / 60.0) - 0.01).abs() < 1e-6);
        assert!((rate.step(1.0 / 120.0) - 0.005).abs() < 1e-6);
    }

    #[test]
    fn frame_locked_rate_ignores_dt() {
        let mut scene = Scene::new();
        let key = scene.add(crate::scene::Node::new("n"));
        let locked = Behavior::spin_y(key, 0.01).per_tick();
        let Behavior::Spin {
            rate: Rate::PerTick(step),
            ..
        } = locked
        else {
            panic!("expected a frame-locked spin, got {locked:?}");
        };
        assert!((step - 0.01).abs() < 1e-6);
        assert!(locked.apply(&mut scene, 5.0));
    }

    #[test]
    fn missing_node_is_a_no_op() {
        let mut scene = Scene::new();
        let key = scene.add(crate::scene::Node::new("n"));
        scene.remove(key);
        assert!(!Behavior::spin_y(key, 0.01).apply(&mut scene, 0.016));
    }
}
