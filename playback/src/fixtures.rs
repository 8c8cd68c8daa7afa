//! In-memory assets for unit tests.

use glam::Vec3;

use crate::asset::{AnimatedAsset, AssetFormat, LoadedModel};
use crate::model::{AnimationClip, AssetScene, NodeTransform, SceneNode, SkinnedMesh, Track, TrackValues};

/// How far the hips of [`sliding_box`] travel along X over the clip.
pub(crate) const SLIDE_DISTANCE: f32 = 4.0;

#[derive(Debug, Clone)]
pub(crate) struct TestAsset {
    scene: AssetScene,
    clips: Vec<AnimationClip>,
}

impl TestAsset {
    pub(crate) fn new(scene: AssetScene, clips: Vec<AnimationClip>) -> Self {
        Self { scene, clips }
    }
}

impl AnimatedAsset for TestAsset {
    fn format(&self) -> AssetFormat {
        AssetFormat::Glb
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

/// A one-unit quad rigidly bound to a `Hips` joint that slides along X.
pub(crate) fn sliding_box(duration: f32, samples: usize) -> LoadedModel {
    let hips = SceneNode {
        name: "Hips".to_string(),
        parent: None,
        rest: NodeTransform::IDENTITY,
        is_joint: true,
    };
    let quad = SkinnedMesh::rigid(
        "quad",
        0,
        vec![
            Vec3::new(-0.5, 0.0, 0.0),
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(0.5, 1.0, 0.0),
            Vec3::new(-0.5, 1.0, 0.0),
        ],
        vec![Vec3::Z; 4],
        vec![0, 1, 2, 0, 2, 3],
    );

    let last = samples.saturating_sub(1).max(1) as f32;
    let times: Vec<f32> = (0..samples).map(|i| i as f32 / last * duration).collect();
    let values = (0..samples)
        .map(|i| Vec3::new(i as f32 / last * SLIDE_DISTANCE, 0.0, 0.0))
        .collect();
    let clip = AnimationClip {
        name: "slide".to_string(),
        duration,
        tracks: vec![Track {
            node: 0,
            times,
            values: TrackValues::Translation(values),
        }],
    };

    Box::new(TestAsset::new(
        AssetScene {
            nodes: vec![hips],
            meshes: vec![quad],
        },
        vec![clip],
    ))
}
