use bevy::prelude::App;

use crate::composition::explorer_runtime::configure_explorer_app;
use crate::infra::persistence::settings_store;
use crate::settings::ExplorerSettings;

pub fn run_explorer_app() {
    let startup_settings = load_startup_settings();
    let mut app = App::new();
    configure_explorer_app(&mut app, &startup_settings);
    app.run();
}

fn load_startup_settings() -> ExplorerSettings {
    let startup_settings = settings_store::load();
    if let Err(error) = settings_store::ensure_exists(&startup_settings) {
        eprintln!(
            "Failed to ensure startup settings file '{}': {}",
            crate::settings::SETTINGS_FILE_PATH,
            error
        );
    }
    startup_settings
}
