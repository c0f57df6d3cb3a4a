//! Lighting rigs
//!
//! Fixed light layouts used by the showcase scenes. Installing a rig adds
//! exactly its lights, in a stable order, at fixed positions.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::light::{Light, SpotLight};
use super::node::Node;
use super::{NodeKey, Scene};
use crate::renderer::area_light::ensure_area_light_support;
use crate::resources::material::hex_color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightingRig {
    /// Red, green and blue 5x8 area panels around the origin plus a shadow
    /// casting key light from above.
    #[default]
    AreaTrio,
    /// One soft white spot light from the upper left, casting shadows.
    SpotStudio,
    /// A directional key light and a dim ambient fill.
    KeyAndFill,
    /// No lights.
    None,
}

impl LightingRig {
    /// Number of lights [`install`](Self::install) adds.
    #[must_use]
    pub fn light_count(self) -> usize {
        match self {
            Self::AreaTrio => 4,
            Self::SpotStudio => 1,
            Self::KeyAndFill => 2,
            Self::None => 0,
        }
    }

    #[must_use]
    pub fn uses_area_lights(self) -> bool {
        matches!(self, Self::AreaTrio)
    }

    /// Adds the rig's lights at the scene root and returns their keys.
    pub fn install(self, scene: &mut Scene) -> Vec<NodeKey> {
        if self.uses_area_lights() {
            ensure_area_light_support();
        }

        let nodes = match self {
            Self::AreaTrio => area_trio(),
            Self::SpotStudio => vec![
                Node::with_light(
                    "spot",
                    Light::new_spot(
                        Vec3::ONE,
                        200.0,
                        SpotLight {
                            penumbra: 1.0,
                            ..SpotLight::default()
                        },
                    )
                    .with_target(Vec3::ZERO)
                    .with_shadows(2048),
                )
                .at(Vec3::new(-3.0, 10.0, 4.0)),
            ],
            Self::KeyAndFill => vec![
                Node::with_light("key", Light::new_directional(Vec3::ONE, 2.0).with_target(Vec3::ZERO))
                    .at(Vec3::new(5.0, 5.0, -5.0)),
                Node::with_light("fill", Light::new_ambient(Vec3::ONE, 0.2)),
            ],
            Self::None => Vec::new(),
        };

        let keys: Vec<NodeKey> = nodes.into_iter().map(|node| scene.add(node)).collect();
        log::debug!("Installed {self:?} rig with {} light(s)", keys.len());
        keys
    }
}

fn area_trio() -> Vec<Node> {
    let panel = |name: &'static str, hex: u32, position: Vec3, rotation_y: f32| {
        let mut node = Node::with_light(name, Light::new_area(hex_color(hex), 3.0, 5.0, 8.0)).at(position);
        node.transform.set_rotation_euler(0.0, rotation_y, 0.0);
        node
    };

    vec![
        panel("area_red", 0xff0000, Vec3::new(-5.0, 4.0, 0.0), -FRAC_PI_2),
        panel("area_green", 0x00ff00, Vec3::new(0.0, 4.0, 5.0), 0.0),
        panel("area_blue", 0x0000ff, Vec3::new(5.0, 4.0, 0.0), FRAC_PI_2),
        Node::with_light(
            "key",
            Light::new_directional(Vec3::ONE, 1.0)
                .with_target(Vec3::ZERO)
                .with_shadows(1024),
        )
        .at(Vec3::new(0.0, 7.0, 2.0)),
    ]
}
