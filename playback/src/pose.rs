//! Pose sampling and CPU linear-blend skinning.

use glam::{Mat3, Mat4, Vec3};

use crate::model::{AnimationClip, AssetScene, NodeTransform, SkinnedMesh, TrackValues};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for point in points {
            bounds.min = bounds.min.min(point);
            bounds.max = bounds.max.max(point);
        }
        Some(bounds)
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinnedVertices {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

pub fn rest_locals(scene: &AssetScene) -> Vec<NodeTransform> {
    scene.nodes.iter().map(|node| node.rest).collect()
}

/// Local transforms at `time`, rest values for untracked properties.
pub fn sample_locals(scene: &AssetScene, clip: &AnimationClip, time: f32) -> Vec<NodeTransform> {
    let mut locals = rest_locals(scene);
    for track in &clip.tracks {
        let Some(local) = locals.get_mut(track.node) else {
            continue;
        };
        let Some((prev, next, alpha)) = key_span(&track.times, time) else {
            continue;
        };
        match &track.values {
            TrackValues::Translation(values) => {
                local.translation = values[prev].lerp(values[next], alpha);
            }
            TrackValues::Scale(values) => {
                local.scale = values[prev].lerp(values[next], alpha);
            }
            TrackValues::Rotation(values) => {
                local.rotation = values[prev].slerp(values[next], alpha).normalize();
            }
        }
    }
    locals
}

pub fn rest_globals(scene: &AssetScene) -> Vec<Mat4> {
    globals_from_locals(scene, &rest_locals(scene))
}

pub fn sample_globals(scene: &AssetScene, clip: &AnimationClip, time: f32) -> Vec<Mat4> {
    globals_from_locals(scene, &sample_locals(scene, clip, time))
}

pub fn globals_from_locals(scene: &AssetScene, locals: &[NodeTransform]) -> Vec<Mat4> {
    let mut globals = vec![Mat4::IDENTITY; scene.nodes.len()];
    for index in scene.hierarchy_order() {
        let local = locals[index].to_matrix();
        globals[index] = match scene.nodes[index].parent {
            Some(parent) if parent < globals.len() => globals[parent] * local,
            _ => local,
        };
    }
    globals
}

/// Joint palette: `global(joint) * inverse_bind(joint)`.
pub fn palette(mesh: &SkinnedMesh, globals: &[Mat4]) -> Vec<Mat4> {
    mesh.joints
        .iter()
        .zip(&mesh.inverse_bind)
        .map(|(&joint, inverse_bind)| {
            globals.get(joint).copied().unwrap_or(Mat4::IDENTITY) * *inverse_bind
        })
        .collect()
}

pub fn skin_mesh(mesh: &SkinnedMesh, globals: &[Mat4]) -> SkinnedVertices {
    let palette = palette(mesh, globals);
    let normal_palette: Vec<Mat3> = palette
        .iter()
        .map(|m| Mat3::from_mat4(*m).inverse().transpose())
        .collect();

    let mut positions = Vec::with_capacity(mesh.vertex_count());
    let mut normals = Vec::with_capacity(mesh.vertex_count());
    for (vertex, position) in mesh.positions.iter().enumerate() {
        let joints = mesh.joint_indices.get(vertex).copied().unwrap_or([0; 4]);
        let weights = mesh
            .joint_weights
            .get(vertex)
            .copied()
            .unwrap_or([1.0, 0.0, 0.0, 0.0]);
        let normal = mesh.normals.get(vertex).copied().unwrap_or(Vec3::ZERO);

        let mut skinned_position = Vec3::ZERO;
        let mut skinned_normal = Vec3::ZERO;
        for (joint, weight) in joints.iter().zip(weights) {
            if weight <= 0.0 {
                continue;
            }
            let slot = *joint as usize;
            let (Some(matrix), Some(normal_matrix)) = (palette.get(slot), normal_palette.get(slot))
            else {
                continue;
            };
            skinned_position += matrix.transform_point3(*position) * weight;
            skinned_normal += (*normal_matrix * normal) * weight;
        }
        positions.push(skinned_position);
        normals.push(skinned_normal.normalize_or_zero());
    }

    SkinnedVertices { positions, normals }
}

/// Bounds of every mesh in the given pose.
pub fn scene_bounds(scene: &AssetScene, globals: &[Mat4]) -> Option<Aabb> {
    scene
        .meshes
        .iter()
        .filter_map(|mesh| Aabb::from_points(skin_mesh(mesh, globals).positions))
        .reduce(Aabb::union)
}

/// Surrounding keys of `time` and the blend factor between them.
fn key_span(times: &[f32], time: f32) -> Option<(usize, usize, f32)> {
    let last = times.len().checked_sub(1)?;
    if time <= times[0] {
        return Some((0, 0, 0.0));
    }
    if time >= times[last] {
        return Some((last, last, 0.0));
    }
    let next = times.partition_point(|&t| t <= time);
    if next == 0 {
        return None;
    }
    let prev = next - 1;
    let span = times[next] - times[prev];
    let alpha = if span <= f32::EPSILON {
        0.0
    } else {
        (time - times[prev]) / span
    };
    Some((prev, next, alpha))
}
