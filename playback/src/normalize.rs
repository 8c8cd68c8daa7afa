//! Model normalization.
//!
//! Every character is restyled and re-framed the same way so that viewports
//! can be compared side by side: neutral matte material, recomputed smooth
//! normals, shadows on, anchored at the origin and scaled so its largest
//! dimension spans [`TARGET_SIZE`] world units.

use glam::Vec3;

use crate::asset::LoadedModel;
use crate::error::NormalizeError;
use crate::model::{AssetScene, MaterialSlot, SkinnedMesh};
use crate::pose::{self, Aabb};

/// Largest dimension of every normalized model.
pub const TARGET_SIZE: f32 = 2.0;

const ANCHOR_KEYWORDS: [&str; 3] = ["pelvis", "hips", "root"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorKind {
    /// Horizontal position of the named joint; vertical position untouched.
    Joint(usize),
    /// Bounding-box centre horizontally, bounding-box floor vertically.
    Bounds,
}

/// Uniform scale followed by a translation, applied to the model root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub translation: Vec3,
    pub scale: f32,
    pub anchor: AnchorKind,
    /// Rest-pose bounds before normalization.
    pub source_bounds: Aabb,
}

impl Normalization {
    pub fn apply(&self, point: Vec3) -> Vec3 {
        point * self.scale + self.translation
    }
}

#[derive(Debug)]
pub struct NormalizedModel {
    pub model: LoadedModel,
    pub transform: Normalization,
}

pub fn normalize(mut model: LoadedModel) -> Result<NormalizedModel, NormalizeError> {
    let scene = model.scene_mut();
    validate(scene)?;
    for mesh in &mut scene.meshes {
        restyle(mesh);
    }
    let transform = compute_normalization(scene)?;
    log::debug!(
        "Normalized model: scale {:.4}, translation {:?}, anchor {:?}",
        transform.scale,
        transform.translation,
        transform.anchor
    );
    Ok(NormalizedModel { model, transform })
}

/// Scale and translation for a scene, without touching it.
pub fn compute_normalization(scene: &AssetScene) -> Result<Normalization, NormalizeError> {
    let globals = pose::rest_globals(scene);
    let bounds = pose::scene_bounds(scene, &globals).ok_or(NormalizeError::EmptyGeometry)?;
    let max_dimension = bounds.max_dimension();
    if !max_dimension.is_finite() || max_dimension <= f32::EPSILON {
        return Err(NormalizeError::DegenerateBounds { max_dimension });
    }

    let (anchor, kind) = match find_anchor_joint(scene) {
        Some(joint) => {
            let position = globals[joint].w_axis.truncate();
            (Vec3::new(position.x, 0.0, position.z), AnchorKind::Joint(joint))
        }
        None => {
            let center = bounds.center();
            (Vec3::new(center.x, bounds.min.y, center.z), AnchorKind::Bounds)
        }
    };

    let scale = TARGET_SIZE / max_dimension;
    Ok(Normalization {
        translation: -anchor * scale,
        scale,
        anchor: kind,
        source_bounds: bounds,
    })
}

/// First skeleton joint in hierarchy order whose name mentions pelvis, hips
/// or root. Plain scene nodes never anchor.
pub fn find_anchor_joint(scene: &AssetScene) -> Option<usize> {
    scene.hierarchy_order().into_iter().find(|&index| {
        let node = &scene.nodes[index];
        let name = node.name.to_lowercase();
        node.is_joint && ANCHOR_KEYWORDS.iter().any(|keyword| name.contains(keyword))
    })
}

/// Area-weighted smooth vertex normals.
pub fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|normal| normal.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}

fn restyle(mesh: &mut SkinnedMesh) {
    mesh.material = MaterialSlot::NeutralMatte;
    mesh.double_sided = true;
    mesh.cast_shadows = true;
    mesh.receive_shadows = true;
    mesh.normals = smooth_normals(&mesh.positions, &mesh.indices);
}

fn validate(scene: &AssetScene) -> Result<(), NormalizeError> {
    if scene.vertex_count() == 0 {
        return Err(NormalizeError::EmptyGeometry);
    }
    for mesh in &scene.meshes {
        if mesh.positions.iter().any(|p| !p.is_finite()) {
            return Err(NormalizeError::NonFinite {
                mesh: mesh.name.clone(),
            });
        }
        if let Some(&joint) = mesh.joints.iter().find(|&&j| j >= scene.nodes.len()) {
            return Err(NormalizeError::JointOutOfRange {
                mesh: mesh.name.clone(),
                joint,
                len: scene.nodes.len(),
            });
        }
        let slots = mesh.joints.len().min(mesh.inverse_bind.len());
        if let Some(slot) = mesh
            .joint_indices
            .iter()
            .flatten()
            .map(|&slot| slot as usize)
            .find(|&slot| slot >= slots)
        {
            return Err(NormalizeError::JointOutOfRange {
                mesh: mesh.name.clone(),
                joint: slot,
                len: slots,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestAsset;
    use crate::model::{NodeTransform, SceneNode};

    const EPSILON: f32 = 1e-4;

    fn node(name: &str, translation: Vec3) -> SceneNode {
        SceneNode {
            name: name.to_string(),
            parent: None,
            rest: NodeTransform {
                translation,
                ..NodeTransform::IDENTITY
            },
            is_joint: true,
        }
    }

    /// A 1 x 4 x 2 box with its floor at y = 10, owned by node 0.
    fn box_scene(first_node: &str) -> AssetScene {
        let positions = vec![
            Vec3::new(-0.5, 0.0, -1.0),
            Vec3::new(0.5, 0.0, -1.0),
            Vec3::new(0.5, 4.0, 1.0),
            Vec3::new(-0.5, 4.0, 1.0),
        ];
        let mesh = SkinnedMesh::rigid(
            "box",
            0,
            positions,
            vec![Vec3::ZERO; 4],
            vec![0, 1, 2, 0, 2, 3],
        );
        AssetScene {
            nodes: vec![
                node(first_node, Vec3::new(3.0, 10.0, -2.0)),
                node("mixamorig:Hips", Vec3::new(7.0, 1.0, 7.0)),
            ],
            meshes: vec![mesh],
        }
    }

    fn boxed(scene: AssetScene) -> LoadedModel {
        Box::new(TestAsset::new(scene, Vec::new()))
    }

    #[test]
    fn largest_dimension_becomes_two_units() {
        let normalized = normalize(boxed(box_scene("Armature"))).unwrap();
        assert!((normalized.transform.scale - 0.5).abs() < EPSILON);
        let bounds = normalized.transform.source_bounds;
        let top = normalized.transform.apply(bounds.max);
        let floor = normalized.transform.apply(bounds.min);
        assert!((top.y - floor.y - TARGET_SIZE).abs() < EPSILON);
    }

    #[test]
    fn hips_joint_anchors_horizontally_only() {
        let normalized = normalize(boxed(box_scene("Armature"))).unwrap();
        assert_eq!(normalized.transform.anchor, AnchorKind::Joint(1));
        let hips = normalized.transform.apply(Vec3::new(7.0, 1.0, 7.0));
        assert!(hips.x.abs() < EPSILON && hips.z.abs() < EPSILON);
        assert!((hips.y - 0.5).abs() < EPSILON);
    }

    #[test]
    fn first_matching_joint_in_hierarchy_wins() {
        let scene = box_scene("RootNode");
        assert_eq!(find_anchor_joint(&scene), Some(0));
    }

    #[test]
    fn non_joint_nodes_never_anchor() {
        let mut scene = box_scene("RootNode");
        scene.nodes[0].is_joint = false;
        scene.nodes[0].rest.translation = Vec3::new(40.0, 0.0, 40.0);
        scene.nodes[1].parent = Some(0);
        assert_eq!(find_anchor_joint(&scene), Some(1));

        let normalized = normalize(boxed(scene)).unwrap();
        assert_eq!(normalized.transform.anchor, AnchorKind::Joint(1));
        let hips = normalized.transform.apply(Vec3::new(47.0, 1.0, 47.0));
        assert!(hips.x.abs() < EPSILON && hips.z.abs() < EPSILON);
    }

    #[test]
    fn bounds_anchor_puts_floor_on_origin() {
        let mut scene = box_scene("Armature");
        scene.nodes[1].name = "Spine".to_string();
        let normalized = normalize(boxed(scene)).unwrap();
        assert_eq!(normalized.transform.anchor, AnchorKind::Bounds);

        let bounds = normalized.transform.source_bounds;
        let floor_center = normalized
            .transform
            .apply(Vec3::new(bounds.center().x, bounds.min.y, bounds.center().z));
        assert!(floor_center.length() < EPSILON);
    }

    #[test]
    fn normalization_is_deterministic() {
        let a = normalize(boxed(box_scene("Armature"))).unwrap();
        let b = normalize(boxed(box_scene("Armature"))).unwrap();
        assert_eq!(a.transform, b.transform);
        assert_eq!(a.model.scene(), b.model.scene());
    }

    #[test]
    fn meshes_are_restyled() {
        let normalized = normalize(boxed(box_scene("Armature"))).unwrap();
        let mesh = &normalized.model.scene().meshes[0];
        assert_eq!(mesh.material, MaterialSlot::NeutralMatte);
        assert!(mesh.double_sided && mesh.cast_shadows && mesh.receive_shadows);
        assert!(mesh.normals.iter().all(|n| (n.length() - 1.0).abs() < EPSILON));
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        let mut empty = box_scene("Armature");
        empty.meshes[0].positions.clear();
        empty.meshes[0].joint_indices.clear();
        assert_eq!(
            normalize(boxed(empty)).unwrap_err(),
            NormalizeError::EmptyGeometry
        );

        let mut flat = box_scene("Armature");
        for p in &mut flat.meshes[0].positions {
            *p = Vec3::ONE;
        }
        assert!(matches!(
            normalize(boxed(flat)).unwrap_err(),
            NormalizeError::DegenerateBounds { .. }
        ));

        let mut nan = box_scene("Armature");
        nan.meshes[0].positions[0].x = f32::NAN;
        assert!(matches!(
            normalize(boxed(nan)).unwrap_err(),
            NormalizeError::NonFinite { .. }
        ));
    }
}
