//! Binary FBX characters.
//!
//! The document is read with `fbxcel` into an owned node tree, then the
//! object graph (`Objects` + `Connections`) is resolved into the shared scene
//! model. Only what a skinned character clip needs is resolved: models,
//! mesh geometry, skin clusters and translation/rotation/scale curves.

mod scene;
mod tree;

use super::{AnimatedAsset, AssetFormat};
use crate::error::ParseError;
use crate::model::{AnimationClip, AssetScene};

#[derive(Debug, Clone)]
pub struct FbxAsset {
    scene: AssetScene,
    clips: Vec<AnimationClip>,
}

impl FbxAsset {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
        let document = tree::parse_document(bytes)?;
        let (scene, clips) = scene::build_scene(&document)?;
        log::debug!(
            "Decoded FBX with {} nodes, {} meshes, {} clips",
            scene.nodes.len(),
            scene.meshes.len(),
            clips.len()
        );
        Ok(Self { scene, clips })
    }
}

impl AnimatedAsset for FbxAsset {
    fn format(&self) -> AssetFormat {
        AssetFormat::Fbx
    }

    fn scene(&self) -> &AssetScene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut AssetScene {
        &mut self.scene
    }

    fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose;

    #[test]
    fn resolved_fbx_scene_poses_like_any_other_asset() {
        let document = scene::tests::rigged_quad_document();
        let (scene, clips) = scene::build_scene(&document).unwrap();
        let asset = FbxAsset { scene, clips };

        let clip = asset.primary_clip().unwrap();
        let rest = pose::rest_globals(asset.scene());
        let end = pose::sample_globals(asset.scene(), clip, clip.duration);
        let hips = asset.scene().find_node("mixamorig:Hips").unwrap();
        assert!((rest[hips].w_axis.y - 100.0).abs() < 1e-4);
        assert!((end[hips].w_axis.y - 110.0).abs() < 1e-4);
    }
}
