use bevy::prelude::*;
use bevy_egui::{EguiGlobalSettings, EguiPlugin};
use playback::ExplorerSession;

use crate::app::plugins::{build_bevy_plugins, create_winit_settings};
use crate::infra::assets::resolver;
use crate::settings::{
    ExplorerSettings, SETTINGS_FILE_PATH, SettingsPlugin, SettingsResource, YamlThemeStorage,
};
use crate::ui::{ExplorerUiPlugin, ThemeResource, background_for};
use crate::viewport::{AssetAccess, ExplorerSessionPlugin, SessionResource, ViewportRenderPlugin};

pub fn configure_explorer_app(app: &mut App, startup_settings: &ExplorerSettings) {
    let theme = playback::ThemeConfig::load(YamlThemeStorage::new(SETTINGS_FILE_PATH));

    app.insert_resource(SettingsResource::new(startup_settings.clone()))
        .add_plugins(build_bevy_plugins(startup_settings))
        .insert_resource(create_winit_settings(startup_settings))
        .insert_resource(ClearColor(background_for(theme.get())))
        .insert_resource(EguiGlobalSettings {
            auto_create_primary_context: false,
            ..default()
        })
        .add_plugins(EguiPlugin::default())
        .add_plugins(SettingsPlugin)
        .insert_resource(ThemeResource(theme));

    insert_session_resources(app, startup_settings);

    app.add_plugins(ExplorerSessionPlugin)
        .add_plugins(ViewportRenderPlugin)
        .add_plugins(ExplorerUiPlugin);
}

/// Catalog, session and asset access for the configured asset root.
pub fn insert_session_resources(app: &mut App, settings: &ExplorerSettings) {
    let catalog = resolver::load_catalog(settings.assets.catalog_file.as_deref());
    let session = ExplorerSession::new(catalog, settings.session_config());
    info!(
        "Explorer ready: {} clips, {} viewports",
        session.catalog().len(),
        session.viewports().count()
    );

    app.insert_resource(SessionResource(session))
        .insert_resource(AssetAccess {
            loader: resolver::asset_loader_or_local(&settings.assets.root),
            download_dir: settings.assets.download_dir.clone(),
        });
}
