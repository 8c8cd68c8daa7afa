//! Per-viewport rendering: one camera, grid and character per panel, all
//! driven by the [`ExplorerSession`](playback::ExplorerSession) resource.

pub mod camera;
pub mod components;
pub mod layout;
pub mod loading;
pub mod render;

use bevy::prelude::*;

pub use components::{AssetAccess, SessionResource, ViewportCamera, ViewportModel};
pub use layout::PanelLayout;
pub use loading::LoadTasks;

/// Session work each frame: loads in, clock forward, camera state out.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionUpdate;

/// Loading and playback only. Needs no renderer, so it also runs under
/// `MinimalPlugins`.
pub struct ExplorerSessionPlugin;

impl Plugin for ExplorerSessionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LoadTasks>().add_systems(
            Update,
            (
                loading::dispatch_load_tasks,
                loading::poll_load_tasks,
                loading::advance_session,
            )
                .chain()
                .in_set(SessionUpdate),
        );
    }
}

pub struct ViewportRenderPlugin;

impl Plugin for ViewportRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PanelLayout>()
            .add_systems(
                Startup,
                (render::setup_viewport_scene, camera::spawn_viewport_cameras),
            )
            .add_systems(
                Update,
                (
                    camera::layout_viewports,
                    camera::orbit_hovered_viewport,
                )
                    .chain()
                    .before(SessionUpdate),
            )
            .add_systems(
                Update,
                (
                    render::sync_model_entities,
                    render::upload_skinned_vertices,
                    camera::apply_camera_poses,
                )
                    .after(SessionUpdate),
            );
    }
}
