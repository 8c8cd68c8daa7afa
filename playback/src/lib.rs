//! Renderer-independent core of the motion explorer.
//!
//! Assets (GLB or binary FBX) are decoded behind the [`AnimatedAsset`]
//! capability, normalized into a common frame and played back by one engine
//! per viewport. A single [`TransportController`] and [`CameraSync`] keep
//! every viewport of an [`ExplorerSession`] on the same timeline and view.

pub mod asset;
pub mod camera;
pub mod engine;
pub mod error;
pub mod keyframes;
pub mod model;
pub mod normalize;
pub mod pose;
pub mod presets;
pub mod session;
pub mod source;
pub mod store;
pub mod theme;
pub mod transport;
pub mod viewport;

#[cfg(test)]
mod fixtures;

pub use glam;

pub use asset::{AnimatedAsset, AssetFormat, FbxAsset, GlbAsset, LoadedModel};
pub use camera::{CameraPose, CameraSync, OrbitController, OrbitGesture};
pub use engine::{PlaybackCursor, PlaybackEngine, PlaybackState, Role};
pub use error::{LoadError, NormalizeError, ParseError, PresetError, TransportError, ViewportError};
pub use keyframes::{KeyframeEstimate, estimate_keyframes};
pub use model::{AnimationClip, AssetScene, MaterialSlot, NEUTRAL_MATTE_COLOR, SkinnedMesh};
pub use normalize::{AnchorKind, Normalization, NormalizedModel, normalize};
pub use presets::{PresetChannel, PresetCommand, ViewPreset};
pub use session::{ExplorerSession, SessionConfig, TargetRow};
#[cfg(feature = "http")]
pub use source::HttpAssetSource;
pub use source::{AssetLoader, AssetRequest, AssetSource, FsAssetSource, source_for_root};
pub use store::{SharedState, Subscription};
pub use theme::{ThemeConfig, ThemeStorage};
pub use transport::{SPEED_CHOICES, TransportController, TransportState, ViewportId};
pub use viewport::{LoadOutcome, LoadStatus, LoadTicket, Viewport, ViewportContent, ViewportKind};

/// Returns the playback crate version string.
pub fn playback_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
