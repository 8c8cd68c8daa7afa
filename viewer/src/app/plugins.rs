use bevy::app::PluginGroupBuilder;
use bevy::prelude::*;
use bevy::render::pipelined_rendering::PipelinedRenderingPlugin;
use bevy::window::WindowResolution;
use bevy::winit::WinitSettings;

use crate::settings::{self, ExplorerSettings};

pub fn build_bevy_plugins(startup_settings: &ExplorerSettings) -> PluginGroupBuilder {
    DefaultPlugins
        .set(WindowPlugin {
            primary_window: Some(create_window_settings(startup_settings)),
            ..Default::default()
        })
        .disable::<PipelinedRenderingPlugin>()
}

pub fn create_winit_settings(startup_settings: &ExplorerSettings) -> WinitSettings {
    let focused_mode = startup_settings.window.fps_limit.to_update_mode();
    WinitSettings {
        focused_mode,
        unfocused_mode: focused_mode,
    }
}

fn create_window_settings(startup_settings: &ExplorerSettings) -> Window {
    Window {
        title: "Motion Explorer".into(),
        resolution: WindowResolution::new(
            startup_settings.window.width,
            startup_settings.window.height,
        ),
        resizable: true,
        present_mode: settings::present_mode_for(&startup_settings.window),
        ..Default::default()
    }
}
