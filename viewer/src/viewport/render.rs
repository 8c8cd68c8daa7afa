use std::collections::HashMap;

use bevy::asset::RenderAssetUsages;
use bevy::camera::visibility::NoFrustumCulling;
use bevy::light::{NotShadowCaster, NotShadowReceiver};
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use playback::pose::SkinnedVertices;
use playback::{NEUTRAL_MATTE_COLOR, SkinnedMesh, ViewportContent, ViewportId};

use super::components::{
    ExplorerLight, SessionResource, SkinnedPart, ViewportGrid, ViewportModel, all_viewport_layers,
    render_layer,
};
use crate::grid_overlay::{GridOverlayConfig, grid_material, grid_mesh};

#[derive(Resource, Clone)]
pub struct ExplorerMaterials {
    pub matte: Handle<StandardMaterial>,
    pub grid_mesh: Handle<Mesh>,
    pub grid_material: Handle<StandardMaterial>,
}

pub fn neutral_matte_material() -> StandardMaterial {
    let [r, g, b] = NEUTRAL_MATTE_COLOR;
    StandardMaterial {
        base_color: Color::srgb(r, g, b),
        perceptual_roughness: 1.0,
        metallic: 0.0,
        reflectance: 0.1,
        double_sided: true,
        cull_mode: None,
        ..default()
    }
}

pub fn setup_viewport_scene(
    mut commands: Commands,
    session: Res<SessionResource>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let grid = GridOverlayConfig::default();
    let explorer_materials = ExplorerMaterials {
        matte: materials.add(neutral_matte_material()),
        grid_mesh: meshes.add(grid_mesh(grid)),
        grid_material: materials.add(grid_material(grid)),
    };

    let ids: Vec<ViewportId> = session.viewports().map(|viewport| viewport.id()).collect();
    let every_viewport = all_viewport_layers(&ids);

    commands.spawn((
        DirectionalLight {
            illuminance: 9_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(3.0, 6.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
        every_viewport.clone(),
        ExplorerLight,
        Name::new("explorer_key_light"),
    ));
    commands.spawn((
        DirectionalLight {
            illuminance: 3_000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(-4.0, 3.0, -2.0).looking_at(Vec3::ZERO, Vec3::Y),
        every_viewport,
        ExplorerLight,
        Name::new("explorer_fill_light"),
    ));

    for id in ids {
        commands.spawn((
            Mesh3d(explorer_materials.grid_mesh.clone()),
            MeshMaterial3d(explorer_materials.grid_material.clone()),
            Transform::default(),
            NotShadowCaster,
            render_layer(id),
            ViewportGrid { id },
            Name::new(format!("viewport_grid_{}", id.0)),
        ));
    }

    commands.insert_resource(explorer_materials);
}

pub fn build_skinned_mesh(mesh: &SkinnedMesh, vertices: &SkinnedVertices) -> Mesh {
    let mut built = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    built.insert_attribute(Mesh::ATTRIBUTE_POSITION, to_arrays(&vertices.positions));
    built.insert_attribute(Mesh::ATTRIBUTE_NORMAL, to_arrays(&vertices.normals));
    built.insert_indices(Indices::U32(mesh.indices.clone()));
    built
}

fn to_arrays(values: &[playback::glam::Vec3]) -> Vec<[f32; 3]> {
    values.iter().map(|value| value.to_array()).collect()
}

/// Spawns a character when a viewport finishes loading and despawns it when
/// the viewport's model is replaced or dropped.
pub fn sync_model_entities(
    mut commands: Commands,
    session: Res<SessionResource>,
    models: Query<(Entity, &ViewportModel)>,
    materials: Option<Res<ExplorerMaterials>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    let Some(materials) = materials else {
        return;
    };

    let mut spawned: HashMap<ViewportId, u64> = HashMap::new();
    for (entity, model) in &models {
        let wanted = session.viewport(model.id).and_then(|viewport| match viewport.content() {
            ViewportContent::Model(_) => Some(viewport.generation()),
            ViewportContent::Grid => None,
        });
        if wanted == Some(model.generation) {
            spawned.insert(model.id, model.generation);
        } else {
            commands.entity(entity).despawn();
        }
    }

    for viewport in session.viewports() {
        let ViewportContent::Model(model) = viewport.content() else {
            continue;
        };
        if spawned.contains_key(&viewport.id()) {
            continue;
        }
        let Some(skinned) = viewport.skinned_meshes() else {
            continue;
        };

        let layer = render_layer(viewport.id());
        let transform = Transform {
            translation: Vec3::from_array(model.transform.translation.to_array()),
            scale: Vec3::splat(model.transform.scale),
            ..default()
        };
        let scene = model.model.scene();
        commands
            .spawn((
                transform,
                Visibility::default(),
                layer.clone(),
                ViewportModel {
                    id: viewport.id(),
                    generation: viewport.generation(),
                    uploaded_time: viewport.time(),
                },
                Name::new(format!("viewport_model_{}", viewport.id().0)),
            ))
            .with_children(|parent| {
                for (mesh_index, (mesh, vertices)) in scene.meshes.iter().zip(&skinned).enumerate() {
                    let mut part = parent.spawn((
                        Mesh3d(meshes.add(build_skinned_mesh(mesh, vertices))),
                        MeshMaterial3d(materials.matte.clone()),
                        Transform::default(),
                        NoFrustumCulling,
                        layer.clone(),
                        SkinnedPart { mesh_index },
                    ));
                    if !mesh.cast_shadows {
                        part.insert(NotShadowCaster);
                    }
                    if !mesh.receive_shadows {
                        part.insert(NotShadowReceiver);
                    }
                }
            });
        debug!(
            "Spawned {} meshes for viewport {}",
            scene.meshes.len(),
            viewport.id().0
        );
    }
}

/// Re-skins a character on the CPU whenever its cursor time moved.
pub fn upload_skinned_vertices(
    session: Res<SessionResource>,
    mut models: Query<(&mut ViewportModel, &Children)>,
    parts: Query<(&SkinnedPart, &Mesh3d)>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    for (mut model, children) in &mut models {
        let Some(viewport) = session.viewport(model.id) else {
            continue;
        };
        if viewport.generation() != model.generation {
            continue;
        }
        let time = viewport.time();
        if time == model.uploaded_time {
            continue;
        }
        let Some(skinned) = viewport.skinned_meshes() else {
            continue;
        };

        for child in children.iter() {
            let Ok((part, mesh3d)) = parts.get(child) else {
                continue;
            };
            let (Some(vertices), Some(mesh)) = (skinned.get(part.mesh_index), meshes.get_mut(&mesh3d.0))
            else {
                continue;
            };
            mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, to_arrays(&vertices.positions));
            mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, to_arrays(&vertices.normals));
        }
        model.uploaded_time = time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playback::glam::Vec3 as CoreVec3;

    #[test]
    fn skinned_mesh_keeps_vertex_and_index_counts() {
        let mesh = SkinnedMesh::rigid(
            "quad",
            0,
            vec![CoreVec3::ZERO, CoreVec3::X, CoreVec3::Z, CoreVec3::ONE],
            vec![CoreVec3::Y; 4],
            vec![0, 1, 2, 2, 1, 3],
        );
        let vertices = SkinnedVertices {
            positions: mesh.positions.clone(),
            normals: mesh.normals.clone(),
        };

        let built = build_skinned_mesh(&mesh, &vertices);
        assert_eq!(built.count_vertices(), 4);
        assert_eq!(built.indices().map(|indices| indices.len()), Some(6));
    }

    #[test]
    fn neutral_matte_is_double_sided_grey() {
        let material = neutral_matte_material();
        assert!(material.double_sided);
        assert!(material.cull_mode.is_none());
        assert_eq!(material.base_color, Color::srgb(170.0 / 255.0, 170.0 / 255.0, 170.0 / 255.0));
    }
}
