//! Format-independent scene data shared by every asset variant.

use glam::{Mat4, Quat, Vec3};

/// `#aaaaaa`, the flat grey every normalized mesh is drawn with.
pub const NEUTRAL_MATTE_COLOR: [f32; 3] = [170.0 / 255.0, 170.0 / 255.0, 170.0 / 255.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl NodeTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn to_matrix(self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<usize>,
    pub rest: NodeTransform,
    /// Referenced by at least one skin.
    pub is_joint: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialSlot {
    /// Whatever the asset shipped with; only seen before normalization.
    #[default]
    Authored,
    /// Double-sided matte grey.
    NeutralMatte,
}

/// Triangle mesh bound to scene nodes through a skin.
///
/// Meshes without a skin are expressed as rigidly bound to their owning node:
/// one joint, identity inverse bind, every vertex fully weighted to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinnedMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    /// Indices into `joints`, four influences per vertex.
    pub joint_indices: Vec<[u16; 4]>,
    pub joint_weights: Vec<[f32; 4]>,
    /// Scene node index of every joint.
    pub joints: Vec<usize>,
    pub inverse_bind: Vec<Mat4>,
    pub material: MaterialSlot,
    pub double_sided: bool,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
}

impl SkinnedMesh {
    pub fn rigid(
        name: impl Into<String>,
        node: usize,
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> Self {
        let vertex_count = positions.len();
        Self {
            name: name.into(),
            positions,
            normals,
            indices,
            joint_indices: vec![[0; 4]; vertex_count],
            joint_weights: vec![[1.0, 0.0, 0.0, 0.0]; vertex_count],
            joints: vec![node],
            inverse_bind: vec![Mat4::IDENTITY],
            material: MaterialSlot::Authored,
            double_sided: false,
            cast_shadows: false,
            receive_shadows: false,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

impl TrackValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Translation(values) | Self::Scale(values) => values.len(),
            Self::Rotation(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keyframes of one property of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub node: usize,
    pub times: Vec<f32>,
    pub values: TrackValues,
}

impl Track {
    pub fn sample_count(&self) -> usize {
        self.times.len()
    }

    /// Key times are finite and never decrease.
    pub fn has_ordered_times(&self) -> bool {
        self.times.iter().all(|t| t.is_finite())
            && self.times.windows(2).all(|pair| pair[0] <= pair[1])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Largest key time across all tracks.
    pub fn key_span(&self) -> f32 {
        self.tracks
            .iter()
            .filter_map(|track| track.times.last().copied())
            .fold(0.0, f32::max)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetScene {
    pub nodes: Vec<SceneNode>,
    pub meshes: Vec<SkinnedMesh>,
}

impl AssetScene {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(SkinnedMesh::vertex_count).sum()
    }

    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.name == name)
    }

    /// Depth-first, parents before children, roots in declaration order.
    pub fn hierarchy_order(&self) -> Vec<usize> {
        let mut children = vec![Vec::new(); self.nodes.len()];
        let mut roots = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            match node.parent {
                Some(parent) if parent < self.nodes.len() && parent != index => {
                    children[parent].push(index)
                }
                _ => roots.push(index),
            }
        }

        let mut order = Vec::with_capacity(self.nodes.len());
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = roots.into_iter().rev().collect();
        while let Some(index) = stack.pop() {
            if std::mem::replace(&mut visited[index], true) {
                continue;
            }
            order.push(index);
            stack.extend(children[index].iter().rev().copied());
        }
        order
    }
}
