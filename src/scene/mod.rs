//! Scene graph
//!
//! - Node: hierarchy entry carrying a transform and optional mesh/light
//! - Transform: TRS with dirty-checked matrices
//! - Scene: node arena plus environment and background
//! - Camera: perspective camera living beside the scene
//! - Light: directional, ambient, area and spot lights
//! - builder / rig / showcase: construction of the reference scenes

pub mod background;
pub mod builder;
pub mod camera;
pub mod environment;
pub mod light;
pub mod node;
pub mod rig;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod showcase;
pub mod transform;

pub use background::Background;
pub use builder::{GroundPlane, SceneBundle, SceneConfig, SceneGraphBuilder};
pub use camera::Camera;
pub use environment::Environment;
pub use light::{Light, LightKind, ShadowConfig, SpotLight};
pub use node::Node;
pub use rig::LightingRig;
pub use scene::Scene;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeKey;
}
