//! Animated-asset capability.
//!
//! GLB and FBX characters are decoded into the same [`AssetScene`] and
//! [`AnimationClip`] shapes; everything downstream of [`AssetFormat::decode`]
//! only sees the [`AnimatedAsset`] trait.

mod fbx;
mod glb;

use std::fmt::Debug;

use catalog::AssetExtension;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::model::{AnimationClip, AssetScene};

pub use fbx::FbxAsset;
pub use glb::GlbAsset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetFormat {
    Glb,
    Fbx,
}

impl AssetFormat {
    pub fn extension(self) -> &'static str {
        AssetExtension::from(self).suffix()
    }

    /// Format tag for a path or URL, by extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".glb") || lower.ends_with(".gltf") {
            Some(Self::Glb)
        } else if lower.ends_with(".fbx") {
            Some(Self::Fbx)
        } else {
            None
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<LoadedModel, ParseError> {
        match self {
            Self::Glb => Ok(Box::new(GlbAsset::from_slice(bytes)?)),
            Self::Fbx => Ok(Box::new(FbxAsset::from_slice(bytes)?)),
        }
    }
}

impl From<AssetExtension> for AssetFormat {
    fn from(extension: AssetExtension) -> Self {
        match extension {
            AssetExtension::Glb => Self::Glb,
            AssetExtension::Fbx => Self::Fbx,
        }
    }
}

impl From<AssetFormat> for AssetExtension {
    fn from(format: AssetFormat) -> Self {
        match format {
            AssetFormat::Glb => Self::Glb,
            AssetFormat::Fbx => Self::Fbx,
        }
    }
}

pub trait AnimatedAsset: Send + Sync + Debug {
    fn format(&self) -> AssetFormat;
    fn scene(&self) -> &AssetScene;
    fn scene_mut(&mut self) -> &mut AssetScene;
    fn clips(&self) -> &[AnimationClip];

    /// The clip a viewport binds on load.
    fn primary_clip(&self) -> Option<&AnimationClip> {
        self.clips().first()
    }
}

/// A decoded character, owned by exactly one viewport.
pub type LoadedModel = Box<dyn AnimatedAsset>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_detected_from_extension() {
        assert_eq!(AssetFormat::from_path("a/YBot.fbx.glb"), Some(AssetFormat::Glb));
        assert_eq!(AssetFormat::from_path("a/YBot.FBX"), Some(AssetFormat::Fbx));
        assert_eq!(AssetFormat::from_path("a/YBot.obj"), None);
    }

    #[test]
    fn garbage_bytes_fail_to_parse_in_both_formats() {
        let bytes = b"definitely not a model";
        assert!(AssetFormat::Glb.decode(bytes).is_err());
        assert!(AssetFormat::Fbx.decode(bytes).is_err());
    }
}
