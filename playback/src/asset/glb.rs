use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::mesh::Mode;

use super::{AnimatedAsset, AssetFormat};
use crate::error::ParseError;
use crate::model::{
    AnimationClip, AssetScene, MaterialSlot, NodeTransform, SceneNode, SkinnedMesh, Track,
    TrackValues,
};

/// Binary glTF (or embedded JSON glTF) character.
#[derive(Debug, Clone)]
pub struct GlbAsset {
    scene: AssetScene,
    clips: Vec<AnimationClip>,
}

impl GlbAsset {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
        let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
        let buffers = gltf::import_buffers(&document, None, blob)?;
        let read = |buffer: gltf::Buffer<'_>| {
            buffers.get(buffer.index()).map(|data| data.0.as_slice())
        };

        let mut nodes = read_nodes(&document);
        let mut meshes = Vec::new();

        for node in document.nodes() {
            let Some(mesh) = node.mesh() else {
                continue;
            };
            let skin = node.skin();
            let (joints, inverse_bind) = match &skin {
                Some(skin) => {
                    let joints: Vec<usize> = skin.joints().map(|joint| joint.index()).collect();
                    for &joint in &joints {
                        nodes[joint].is_joint = true;
                    }
                    let inverse_bind = skin
                        .reader(read)
                        .read_inverse_bind_matrices()
                        .map(|matrices| matrices.map(|m| Mat4::from_cols_array_2d(&m)).collect())
                        .unwrap_or_else(|| vec![Mat4::IDENTITY; joints.len()]);
                    (joints, inverse_bind)
                }
                None => (vec![node.index()], vec![Mat4::IDENTITY]),
            };

            for (primitive_index, primitive) in mesh.primitives().enumerate() {
                if primitive.mode() != Mode::Triangles {
                    log::debug!(
                        "Skipping non-triangle primitive {} of mesh '{}'",
                        primitive_index,
                        mesh.name().unwrap_or_default()
                    );
                    continue;
                }
                let reader = primitive.reader(read);
                let Some(positions) = reader.read_positions() else {
                    continue;
                };
                let positions: Vec<Vec3> = positions.map(Vec3::from).collect();
                let vertex_count = positions.len();
                let normals: Vec<Vec3> = reader
                    .read_normals()
                    .map(|normals| normals.map(Vec3::from).collect())
                    .unwrap_or_else(|| vec![Vec3::ZERO; vertex_count]);
                let indices: Vec<u32> = reader
                    .read_indices()
                    .map(|indices| indices.into_u32().collect())
                    .unwrap_or_else(|| (0..vertex_count as u32).collect());
                if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                    return Err(ParseError::OutOfRange {
                        format: AssetFormat::Glb,
                        what: "vertex",
                        index: bad as usize,
                        len: vertex_count,
                    });
                }

                let name = mesh
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("mesh{}", mesh.index()));
                let mut skinned =
                    SkinnedMesh::rigid(name, node.index(), positions, normals, indices);
                skinned.material = MaterialSlot::Authored;
                skinned.double_sided = primitive.material().double_sided();

                if skin.is_some() {
                    if let (Some(joint_indices), Some(weights)) =
                        (reader.read_joints(0), reader.read_weights(0))
                    {
                        skinned.joint_indices = joint_indices.into_u16().collect();
                        skinned.joint_weights =
                            weights.into_f32().map(normalize_weights).collect();
                        skinned.joints = joints.clone();
                        skinned.inverse_bind = inverse_bind.clone();
                    }
                }
                meshes.push(skinned);
            }
        }

        if meshes.is_empty() {
            return Err(ParseError::Missing {
                format: AssetFormat::Glb,
                what: "triangle meshes".to_string(),
            });
        }

        let clips = read_clips(&document, read);
        log::debug!(
            "Decoded glTF with {} nodes, {} meshes, {} clips",
            nodes.len(),
            meshes.len(),
            clips.len()
        );

        Ok(Self {
            scene: AssetScene { nodes, meshes },
            clips,
        })
    }
}

impl AnimatedAsset for GlbAsset {
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

fn read_nodes(document: &gltf::Document) -> Vec<SceneNode> {
    let mut parents = vec![None; document.nodes().len()];
    for node in document.nodes() {
        for child in node.children() {
            parents[child.index()] = Some(node.index());
        }
    }

    document
        .nodes()
        .map(|node| SceneNode {
            name: node
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("node{}", node.index())),
            parent: parents[node.index()],
            rest: decompose(&node),
            is_joint: false,
        })
        .collect()
}

fn decompose(node: &gltf::Node) -> NodeTransform {
    match node.transform() {
        gltf::scene::Transform::Matrix { matrix } => {
            NodeTransform::from_matrix(Mat4::from_cols_array_2d(&matrix))
        }
        gltf::scene::Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => NodeTransform {
            translation: Vec3::from(translation),
            rotation: Quat::from_array(rotation).normalize(),
            scale: Vec3::from(scale),
        },
    }
}

fn read_clips<'a, 's, F>(document: &'a gltf::Document, read: F) -> Vec<AnimationClip>
where
    F: Clone + Fn(gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    let mut clips = Vec::new();
    for animation in document.animations() {
        let mut tracks = Vec::new();
        let mut duration = 0.0f32;

        for channel in animation.channels() {
            let node = channel.target().node().index();
            let reader = channel.reader(read.clone());
            let (Some(inputs), Some(outputs)) = (reader.read_inputs(), reader.read_outputs())
            else {
                continue;
            };
            let times: Vec<f32> = inputs.collect();
            let values = match outputs {
                ReadOutputs::Translations(values) => {
                    TrackValues::Translation(values.map(Vec3::from).collect())
                }
                ReadOutputs::Rotations(values) => TrackValues::Rotation(
                    values
                        .into_f32()
                        .map(|q| Quat::from_array(q).normalize())
                        .collect(),
                ),
                ReadOutputs::Scales(values) => TrackValues::Scale(values.map(Vec3::from).collect()),
                ReadOutputs::MorphTargetWeights(_) => continue,
            };
            // Cubic-spline samplers carry in/out tangents around every value.
            let values = strip_tangents(values, times.len());
            if values.len() != times.len() {
                continue;
            }
            let track = Track {
                node,
                times,
                values,
            };
            if !track.has_ordered_times() {
                log::warn!(
                    "Skipping channel on node {} of '{}': key times are not finite and ordered",
                    node,
                    animation.name().unwrap_or_default()
                );
                continue;
            }
            if let Some(&last) = track.times.last() {
                duration = duration.max(last);
            }
            tracks.push(track);
        }

        clips.push(AnimationClip {
            name: animation
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("animation{}", animation.index())),
            duration,
            tracks,
        });
    }
    clips
}

fn strip_tangents(values: TrackValues, key_count: usize) -> TrackValues {
    if values.len() != key_count * 3 {
        return values;
    }
    fn middle<T: Copy>(values: Vec<T>) -> Vec<T> {
        values.chunks_exact(3).map(|chunk| chunk[1]).collect()
    }
    match values {
        TrackValues::Translation(v) => TrackValues::Translation(middle(v)),
        TrackValues::Rotation(v) => TrackValues::Rotation(middle(v)),
        TrackValues::Scale(v) => TrackValues::Scale(middle(v)),
    }
}

fn normalize_weights(weights: [f32; 4]) -> [f32; 4] {
    let sum: f32 = weights.iter().sum();
    if sum <= f32::EPSILON || !sum.is_finite() {
        return [1.0, 0.0, 0.0, 0.0];
    }
    weights.map(|w| w / sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_are_renormalised() {
        assert_eq!(normalize_weights([2.0, 2.0, 0.0, 0.0]), [0.5, 0.5, 0.0, 0.0]);
        assert_eq!(normalize_weights([0.0; 4]), [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn cubic_tangents_are_dropped() {
        let values = TrackValues::Scale(vec![
            Vec3::ZERO,
            Vec3::ONE,
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::splat(2.0),
            Vec3::ZERO,
        ]);
        assert_eq!(
            strip_tangents(values, 2),
            TrackValues::Scale(vec![Vec3::ONE, Vec3::splat(2.0)])
        );
    }

    #[test]
    fn empty_document_is_rejected() {
        let raw = br#"{"asset":{"version":"2.0"}}"#;
        assert!(matches!(
            GlbAsset::from_slice(raw),
            Err(ParseError::Missing { .. })
        ));
    }
}
