use std::path::PathBuf;

use bevy::camera::visibility::RenderLayers;
use bevy::prelude::*;
use playback::{AssetLoader, ExplorerSession, ViewportId};

#[derive(Resource, Deref, DerefMut)]
pub struct SessionResource(pub ExplorerSession);

/// Shared by load tasks and the download buttons.
#[derive(Resource, Clone, Debug)]
pub struct AssetAccess {
    pub loader: AssetLoader,
    pub download_dir: PathBuf,
}

#[derive(Component, Clone, Copy, Debug)]
pub struct ViewportCamera {
    pub id: ViewportId,
}

#[derive(Component, Clone, Copy, Debug)]
pub struct ViewportGrid {
    pub id: ViewportId,
}

/// Root of a spawned character. `uploaded_time` is the cursor time the
/// child meshes were last skinned at.
#[derive(Component, Clone, Copy, Debug)]
pub struct ViewportModel {
    pub id: ViewportId,
    pub generation: u64,
    pub uploaded_time: Option<f32>,
}

#[derive(Component, Clone, Copy, Debug)]
pub struct SkinnedPart {
    pub mesh_index: usize,
}

#[derive(Component)]
pub struct ExplorerLight;

/// Layer 0 stays with the UI camera; viewport `n` draws on layer `n + 1`.
pub fn render_layer(id: ViewportId) -> RenderLayers {
    RenderLayers::layer(id.0 as usize + 1)
}

pub fn all_viewport_layers<'a>(ids: impl IntoIterator<Item = &'a ViewportId>) -> RenderLayers {
    ids.into_iter()
        .fold(RenderLayers::none(), |layers, id| {
            layers.with(id.0 as usize + 1)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewports_never_share_the_ui_layer() {
        let ids = [ViewportId::SOURCE, ViewportId(1), ViewportId(6)];
        let all = all_viewport_layers(&ids);
        assert!(!all.intersects(&RenderLayers::layer(0)));
        for id in ids {
            assert!(all.intersects(&render_layer(id)));
        }
        assert!(!render_layer(ViewportId(1)).intersects(&render_layer(ViewportId(2))));
    }
}
