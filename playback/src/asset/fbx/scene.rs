use std::collections::{BTreeMap, HashMap};

use glam::{Mat4, Quat, Vec3};

use super::tree::{FbxNode, FbxValue};
use crate::asset::AssetFormat;
use crate::error::ParseError;
use crate::model::{
    AnimationClip, AssetScene, NodeTransform, SceneNode, SkinnedMesh, Track, TrackValues,
};

/// FBX time unit: ticks per second.
pub(crate) const KTIME_PER_SECOND: f64 = 46_186_158_000.0;

const MAX_INFLUENCES: usize = 4;

type ObjectId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Translation,
    Rotation,
    Scale,
}

impl Channel {
    fn from_property(name: &str) -> Option<Self> {
        match name {
            "Lcl Translation" => Some(Self::Translation),
            "Lcl Rotation" => Some(Self::Rotation),
            "Lcl Scaling" => Some(Self::Scale),
            _ => None,
        }
    }
}

struct Connection<'a> {
    child: ObjectId,
    parent: ObjectId,
    property: Option<&'a str>,
}

struct ModelInfo {
    node: usize,
    pre_rotation: Quat,
}

struct Curve {
    times: Vec<f32>,
    values: Vec<f32>,
}

impl Curve {
    fn sample(&self, time: f32, fallback: f32) -> f32 {
        let (Some(&first), Some(&last)) = (self.times.first(), self.times.last()) else {
            return fallback;
        };
        if self.values.len() != self.times.len() {
            return fallback;
        }
        if time <= first {
            return self.values[0];
        }
        if time >= last {
            return self.values[self.values.len() - 1];
        }
        let next = self.times.partition_point(|&t| t <= time);
        let prev = next - 1;
        let span = self.times[next] - self.times[prev];
        if span <= f32::EPSILON {
            return self.values[next];
        }
        let alpha = (time - self.times[prev]) / span;
        self.values[prev] + (self.values[next] - self.values[prev]) * alpha
    }
}

#[derive(Default)]
struct CurveNode {
    defaults: [f32; 3],
    axes: [Option<Curve>; 3],
    target: Option<(ObjectId, Channel)>,
}

/// Resolves `Objects` and `Connections` into scene nodes, meshes and clips.
pub(crate) fn build_scene(root: &FbxNode) -> Result<(AssetScene, Vec<AnimationClip>), ParseError> {
    let objects = root.child("Objects").ok_or_else(|| missing("Objects section"))?;
    let connections = read_connections(root);

    let mut nodes = Vec::new();
    let mut models: HashMap<ObjectId, ModelInfo> = HashMap::new();
    for model in objects.children_named("Model") {
        let Some(id) = object_id(model) else {
            continue;
        };
        let pre_rotation = vec3_property(model, "PreRotation")
            .map(euler_degrees_to_quat)
            .unwrap_or(Quat::IDENTITY);
        let rotation = vec3_property(model, "Lcl Rotation")
            .map(euler_degrees_to_quat)
            .unwrap_or(Quat::IDENTITY);
        models.insert(
            id,
            ModelInfo {
                node: nodes.len(),
                pre_rotation,
            },
        );
        nodes.push(SceneNode {
            name: object_name(model),
            parent: None,
            rest: NodeTransform {
                translation: vec3_property(model, "Lcl Translation").unwrap_or(Vec3::ZERO),
                rotation: pre_rotation * rotation,
                scale: vec3_property(model, "Lcl Scaling").unwrap_or(Vec3::ONE),
            },
            is_joint: object_kind(model) == Some("LimbNode"),
        });
    }
    for connection in &connections {
        if let (Some(child), Some(parent)) =
            (models.get(&connection.child), models.get(&connection.parent))
        {
            nodes[child.node].parent = Some(parent.node);
        }
    }

    let meshes = read_meshes(objects, &connections, &models, &mut nodes)?;
    if meshes.is_empty() {
        return Err(missing("mesh geometry"));
    }

    let clips = read_clips(objects, &connections, &models);
    Ok((AssetScene { nodes, meshes }, clips))
}

fn read_connections(root: &FbxNode) -> Vec<Connection<'_>> {
    let Some(section) = root.child("Connections") else {
        return Vec::new();
    };
    section
        .children_named("C")
        .filter_map(|c| {
            Some(Connection {
                child: c.attr(1)?.as_i64()?,
                parent: c.attr(2)?.as_i64()?,
                property: c.attr(3).and_then(FbxValue::as_str),
            })
        })
        .collect()
}

fn read_meshes(
    objects: &FbxNode,
    connections: &[Connection<'_>],
    models: &HashMap<ObjectId, ModelInfo>,
    nodes: &mut [SceneNode],
) -> Result<Vec<SkinnedMesh>, ParseError> {
    let deformers: HashMap<ObjectId, &FbxNode> = objects
        .children_named("Deformer")
        .filter_map(|d| Some((object_id(d)?, d)))
        .collect();

    let mut meshes = Vec::new();
    for geometry in objects.children_named("Geometry") {
        if object_kind(geometry) != Some("Mesh") {
            continue;
        }
        let Some(geometry_id) = object_id(geometry) else {
            continue;
        };
        let Some(owner) = connections
            .iter()
            .filter(|c| c.child == geometry_id)
            .find_map(|c| models.get(&c.parent))
        else {
            continue;
        };

        let positions: Vec<Vec3> = geometry
            .f64_array("Vertices")
            .ok_or_else(|| missing("Vertices"))?
            .chunks_exact(3)
            .map(|v| Vec3::new(v[0] as f32, v[1] as f32, v[2] as f32))
            .collect();
        let polygons = geometry
            .i64_array("PolygonVertexIndex")
            .ok_or_else(|| missing("PolygonVertexIndex"))?;
        let indices = triangulate(&polygons, positions.len())?;

        let vertex_count = positions.len();
        let name = object_name(geometry);
        let mut mesh = SkinnedMesh::rigid(
            name,
            owner.node,
            positions,
            vec![Vec3::ZERO; vertex_count],
            indices,
        );

        let skin = connections
            .iter()
            .filter(|c| c.parent == geometry_id)
            .filter_map(|c| deformers.get(&c.child).map(|d| (c.child, *d)))
            .find(|(_, d)| object_kind(d) == Some("Skin"));
        if let Some((skin_id, _)) = skin {
            apply_skin(&mut mesh, skin_id, owner.node, connections, &deformers, models, nodes)?;
        }
        meshes.push(mesh);
    }
    Ok(meshes)
}

fn apply_skin(
    mesh: &mut SkinnedMesh,
    skin_id: ObjectId,
    owner_node: usize,
    connections: &[Connection<'_>],
    deformers: &HashMap<ObjectId, &FbxNode>,
    models: &HashMap<ObjectId, ModelInfo>,
    nodes: &mut [SceneNode],
) -> Result<(), ParseError> {
    let vertex_count = mesh.vertex_count();
    let mut influences: Vec<Vec<(u16, f32)>> = vec![Vec::new(); vertex_count];
    let mut joints = Vec::new();
    let mut inverse_bind = Vec::new();

    let clusters = connections
        .iter()
        .filter(|c| c.parent == skin_id)
        .filter_map(|c| deformers.get(&c.child).map(|d| (c.child, *d)))
        .filter(|(_, d)| object_kind(d) == Some("Cluster"));
    for (cluster_id, cluster) in clusters {
        let Some(bone) = connections
            .iter()
            .filter(|c| c.parent == cluster_id)
            .find_map(|c| models.get(&c.child))
        else {
            continue;
        };
        let slot = joints.len() as u16;
        joints.push(bone.node);
        nodes[bone.node].is_joint = true;

        let transform = cluster_matrix(cluster, "Transform").unwrap_or(Mat4::IDENTITY);
        let link = cluster_matrix(cluster, "TransformLink").unwrap_or(Mat4::IDENTITY);
        inverse_bind.push(link.inverse() * transform);

        let indexes = cluster.i64_array("Indexes").unwrap_or_default();
        let weights = cluster.f64_array("Weights").unwrap_or_default();
        for (&vertex, &weight) in indexes.iter().zip(weights.iter()) {
            let vertex = usize::try_from(vertex).unwrap_or(usize::MAX);
            let Some(slots) = influences.get_mut(vertex) else {
                return Err(ParseError::OutOfRange {
                    format: AssetFormat::Fbx,
                    what: "skinned vertex",
                    index: vertex,
                    len: vertex_count,
                });
            };
            if weight > 0.0 {
                slots.push((slot, weight as f32));
            }
        }
    }

    if joints.is_empty() {
        return Ok(());
    }

    // Unweighted vertices stay attached to the mesh node itself.
    let owner_slot = joints.len() as u16;
    joints.push(owner_node);
    inverse_bind.push(Mat4::IDENTITY);

    for (vertex, mut slots) in influences.into_iter().enumerate() {
        slots.sort_by(|a, b| b.1.total_cmp(&a.1));
        slots.truncate(MAX_INFLUENCES);
        let total: f32 = slots.iter().map(|(_, w)| w).sum();
        let mut joint_indices = [owner_slot; 4];
        let mut weights = [0.0; 4];
        if total <= f32::EPSILON {
            weights[0] = 1.0;
        } else {
            for (i, (slot, weight)) in slots.into_iter().enumerate() {
                joint_indices[i] = slot;
                weights[i] = weight / total;
            }
        }
        mesh.joint_indices[vertex] = joint_indices;
        mesh.joint_weights[vertex] = weights;
    }
    mesh.joints = joints;
    mesh.inverse_bind = inverse_bind;
    Ok(())
}

fn read_clips(
    objects: &FbxNode,
    connections: &[Connection<'_>],
    models: &HashMap<ObjectId, ModelInfo>,
) -> Vec<AnimationClip> {
    let mut curve_nodes: HashMap<ObjectId, CurveNode> = HashMap::new();
    for node in objects.children_named("AnimationCurveNode") {
        let Some(id) = object_id(node) else {
            continue;
        };
        let mut curve_node = CurveNode::default();
        for (axis, key) in ["d|X", "d|Y", "d|Z"].into_iter().enumerate() {
            if let Some(value) = node.property(key).and_then(|v| v.first()?.as_f64()) {
                curve_node.defaults[axis] = value as f32;
            }
        }
        curve_nodes.insert(id, curve_node);
    }
    if curve_nodes.is_empty() {
        return Vec::new();
    }

    let curves: HashMap<ObjectId, &FbxNode> = objects
        .children_named("AnimationCurve")
        .filter_map(|c| Some((object_id(c)?, c)))
        .collect();
    let stacks: Vec<(ObjectId, String, f64)> = objects
        .children_named("AnimationStack")
        .filter_map(|stack| {
            let start = stack
                .property("LocalStart")
                .and_then(|v| v.first()?.as_i64())
                .unwrap_or(0);
            Some((object_id(stack)?, object_name(stack), start as f64 / KTIME_PER_SECOND))
        })
        .collect();
    let layer_stack: HashMap<ObjectId, ObjectId> = objects
        .children_named("AnimationLayer")
        .filter_map(object_id)
        .filter_map(|layer| {
            connections
                .iter()
                .find(|c| c.child == layer && stacks.iter().any(|(id, ..)| *id == c.parent))
                .map(|c| (layer, c.parent))
        })
        .collect();

    let mut curve_node_stack: HashMap<ObjectId, ObjectId> = HashMap::new();
    for connection in connections {
        if let Some(curve_node) = curve_nodes.get_mut(&connection.child) {
            if let Some(channel) = connection.property.and_then(Channel::from_property) {
                if models.contains_key(&connection.parent) {
                    curve_node.target = Some((connection.parent, channel));
                }
            } else if let Some(stack) = layer_stack.get(&connection.parent) {
                curve_node_stack.insert(connection.child, *stack);
            }
        }
        if let (Some(curve), Some(property)) = (curves.get(&connection.child), connection.property)
        {
            let axis = match property {
                "d|X" => 0,
                "d|Y" => 1,
                "d|Z" => 2,
                _ => continue,
            };
            if let Some(curve_node) = curve_nodes.get_mut(&connection.parent) {
                curve_node.axes[axis] = read_curve(curve);
            }
        }
    }

    let mut grouped: BTreeMap<Option<ObjectId>, Vec<&CurveNode>> = BTreeMap::new();
    for (id, curve_node) in &curve_nodes {
        grouped
            .entry(curve_node_stack.get(id).copied())
            .or_default()
            .push(curve_node);
    }

    let mut clips = Vec::new();
    let ordered_stacks = stacks
        .iter()
        .map(|(id, name, start)| (Some(*id), name.clone(), *start))
        .chain(std::iter::once((None, "Take 001".to_string(), 0.0)));
    for (stack, name, start) in ordered_stacks {
        let Some(group) = grouped.get(&stack) else {
            continue;
        };
        let mut tracks: Vec<Track> = group
            .iter()
            .filter_map(|curve_node| build_track(curve_node, models, start as f32))
            .collect();
        if tracks.is_empty() {
            continue;
        }
        tracks.sort_by_key(|track| track.node);
        let duration = tracks
            .iter()
            .filter_map(|track| track.times.last().copied())
            .fold(0.0, f32::max);
        clips.push(AnimationClip {
            name,
            duration,
            tracks,
        });
    }
    clips
}

fn read_curve(curve: &FbxNode) -> Option<Curve> {
    let times: Vec<f32> = curve
        .i64_array("KeyTime")?
        .into_iter()
        .map(|ticks| (ticks as f64 / KTIME_PER_SECOND) as f32)
        .collect();
    let values: Vec<f32> = curve
        .f64_array("KeyValueFloat")?
        .into_iter()
        .map(|v| v as f32)
        .collect();
    (times.len() == values.len() && !times.is_empty()).then_some(Curve { times, values })
}

fn build_track(
    curve_node: &CurveNode,
    models: &HashMap<ObjectId, ModelInfo>,
    start: f32,
) -> Option<Track> {
    let (model_id, channel) = curve_node.target?;
    let model = models.get(&model_id)?;

    let mut times: Vec<f32> = curve_node
        .axes
        .iter()
        .flatten()
        .flat_map(|curve| curve.times.iter().copied())
        .collect();
    if times.is_empty() {
        return None;
    }
    times.sort_by(f32::total_cmp);
    times.dedup_by(|a, b| (*a - *b).abs() <= f32::EPSILON);

    let sample = |time: f32| -> Vec3 {
        let axis = |i: usize| match &curve_node.axes[i] {
            Some(curve) => curve.sample(time, curve_node.defaults[i]),
            None => curve_node.defaults[i],
        };
        Vec3::new(axis(0), axis(1), axis(2))
    };
    let values = match channel {
        Channel::Translation => TrackValues::Translation(times.iter().map(|&t| sample(t)).collect()),
        Channel::Scale => TrackValues::Scale(times.iter().map(|&t| sample(t)).collect()),
        Channel::Rotation => TrackValues::Rotation(
            times
                .iter()
                .map(|&t| model.pre_rotation * euler_degrees_to_quat(sample(t)))
                .collect(),
        ),
    };
    Some(Track {
        node: model.node,
        times: times.into_iter().map(|t| (t - start).max(0.0)).collect(),
        values,
    })
}

/// Fan-triangulates `PolygonVertexIndex`; a negative index `i` closes a
/// polygon and stands for vertex `-i - 1`.
pub(crate) fn triangulate(polygons: &[i64], vertex_count: usize) -> Result<Vec<u32>, ParseError> {
    let mut indices = Vec::with_capacity(polygons.len() * 2);
    let mut polygon: Vec<u32> = Vec::with_capacity(4);
    for &raw in polygons {
        let (index, closes) = if raw < 0 { (-raw - 1, true) } else { (raw, false) };
        let index = usize::try_from(index).unwrap_or(usize::MAX);
        if index >= vertex_count {
            return Err(ParseError::OutOfRange {
                format: AssetFormat::Fbx,
                what: "vertex",
                index,
                len: vertex_count,
            });
        }
        polygon.push(index as u32);
        if closes {
            for i in 1..polygon.len().saturating_sub(1) {
                indices.extend_from_slice(&[polygon[0], polygon[i], polygon[i + 1]]);
            }
            polygon.clear();
        }
    }
    Ok(indices)
}

/// FBX `eEulerXYZ`: X is applied first, then Y, then Z.
pub(crate) fn euler_degrees_to_quat(degrees: Vec3) -> Quat {
    let r = degrees * (std::f32::consts::PI / 180.0);
    Quat::from_rotation_z(r.z) * Quat::from_rotation_y(r.y) * Quat::from_rotation_x(r.x)
}

fn cluster_matrix(cluster: &FbxNode, name: &str) -> Option<Mat4> {
    let values = cluster.f64_array(name)?;
    let array: [f32; 16] = values
        .iter()
        .map(|&v| v as f32)
        .collect::<Vec<_>>()
        .try_into()
        .ok()?;
    Some(Mat4::from_cols_array(&array))
}

fn vec3_property(node: &FbxNode, name: &str) -> Option<Vec3> {
    let values = node.property(name)?;
    let x = values.first()?.as_f64()? as f32;
    let y = values.get(1)?.as_f64()? as f32;
    let z = values.get(2)?.as_f64()? as f32;
    Some(Vec3::new(x, y, z))
}

fn object_id(node: &FbxNode) -> Option<ObjectId> {
    node.attr(0)?.as_i64()
}

/// `"Hips\0\x01Model"` and `"Model::Hips"` both name `Hips`.
fn object_name(node: &FbxNode) -> String {
    let raw = node.attr(1).and_then(FbxValue::as_str).unwrap_or_default();
    let name = raw.split("\u{0}\u{1}").next().unwrap_or_default();
    let name = name.rsplit("::").next().unwrap_or(name);
    name.to_string()
}

fn object_kind(node: &FbxNode) -> Option<&str> {
    node.attr(2).and_then(FbxValue::as_str)
}

fn missing(what: &str) -> ParseError {
    ParseError::Missing {
        format: AssetFormat::Fbx,
        what: what.to_string(),
    }
}
