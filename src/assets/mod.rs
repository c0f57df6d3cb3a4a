//! Asset loading
//!
//! - [`io`]: byte sources (files, memory, HTTP) with chunk progress
//! - [`codec`]: glTF and equirectangular decoders
//! - [`pipeline`]: the mesh-then-environment load state machine

pub mod cancel;
pub mod codec;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod progress;

pub use cancel::CancelToken;
pub use codec::{EnvironmentCodec, EquirectCodec, GltfCodec, ModelCodec};
#[cfg(feature = "http")]
pub use io::HttpAssetReader;
pub use io::{AssetReader, AssetReaderVariant, FileAssetReader, MemoryAssetReader};
pub use model::{ModelAsset, ModelNode};
pub use pipeline::{
    AssetLoadPipeline, EnvironmentRequest, LoadState, LoadTarget, MeshRequest, Milestone,
};
pub use progress::{LoadProgress, ProgressTracker};
