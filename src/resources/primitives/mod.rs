//! Procedural geometry used by the showcase scenes.

pub mod icosahedron;
pub mod plane;
pub mod torus_knot;

pub use icosahedron::{IcosahedronOptions, create_icosahedron};
pub use plane::{PlaneOptions, create_plane};
pub use torus_knot::{TorusKnotOptions, create_torus_knot};
