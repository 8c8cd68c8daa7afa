use crate::settings::{ExplorerSettings, SettingsIoError};

pub fn load() -> ExplorerSettings {
    crate::settings::load_settings_or_default()
}

pub fn ensure_exists(settings: &ExplorerSettings) -> Result<(), SettingsIoError> {
    crate::settings::ensure_settings_file_exists(settings)
}
