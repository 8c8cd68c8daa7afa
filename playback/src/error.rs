//! Error taxonomy of the load → normalize → play pipeline.
//!
//! Every failure a single viewport can hit collapses into [`ViewportError`];
//! the composer turns that into the grid fallback without touching any other
//! viewport.

use crate::asset::AssetFormat;
use crate::transport::ViewportId;

/// Fetching the raw bytes failed.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("asset not found: {path}")]
    NotFound { path: String },

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("request for '{path}' failed: {message}")]
    Http { path: String, message: String },

    #[error("request for '{path}' returned status {status}")]
    Status { path: String, status: u16 },

    #[error("no asset source can serve '{path}'")]
    Unsupported { path: String },
}

/// The bytes were fetched but are not a usable animated character.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed glTF: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("malformed FBX: {0}")]
    Fbx(String),

    #[error("unsupported FBX version {major}.{minor}")]
    UnsupportedFbxVersion { major: u32, minor: u32 },

    #[error("{format:?} asset is missing {what}")]
    Missing { format: AssetFormat, what: String },

    #[error("{format:?} asset references {what} {index}, but only {len} exist")]
    OutOfRange {
        format: AssetFormat,
        what: &'static str,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum NormalizeError {
    #[error("model has no vertices")]
    EmptyGeometry,

    #[error("mesh '{mesh}' contains non-finite vertex data")]
    NonFinite { mesh: String },

    #[error("model bounds are degenerate (largest dimension {max_dimension})")]
    DegenerateBounds { max_dimension: f32 },

    #[error("mesh '{mesh}' references joint {joint} of {len}")]
    JointOutOfRange {
        mesh: String,
        joint: usize,
        len: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ViewportError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

impl ViewportError {
    /// Short category shown next to a failed viewport.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Load(LoadError::NotFound { .. }) => "not found",
            Self::Load(_) => "load failed",
            Self::Parse(_) => "unreadable",
            Self::Normalize(_) => "invalid geometry",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TransportError {
    #[error("viewport {from:?} is not the playback authority ({authority:?})")]
    NotAuthority {
        from: ViewportId,
        authority: ViewportId,
    },

    #[error("playback speed must be finite and positive, got {0}")]
    InvalidSpeed(f32),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PresetError {
    #[error("view presets can only be issued from the authority viewport, not {0:?}")]
    NotAuthority(ViewportId),
}
