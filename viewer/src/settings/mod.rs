use bevy::prelude::*;
use bevy::window::{PresentMode, PrimaryWindow, WindowResolution};
use bevy::winit::{UpdateMode, WinitSettings};
use catalog::{AssetExtension, DEFAULT_TARGETS_PER_PAGE};
use playback::session::DEFAULT_SOURCE_BASE;
use playback::{AssetFormat, SessionConfig, TargetRow, ThemeStorage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const SETTINGS_FILE_PATH: &str = "./explorer_settings.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FpsLimitSetting {
    Default60,
    Monitor,
    Unlimited,
}

impl Default for FpsLimitSetting {
    fn default() -> Self {
        Self::Default60
    }
}

impl FpsLimitSetting {
    pub const ALL: [Self; 3] = [Self::Default60, Self::Monitor, Self::Unlimited];

    pub fn to_update_mode(self) -> UpdateMode {
        match self {
            Self::Default60 => UpdateMode::reactive(Duration::from_secs_f64(1.0 / 60.0)),
            Self::Monitor | Self::Unlimited => UpdateMode::Continuous,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Default60 => "60 FPS",
            Self::Monitor => "Monitor",
            Self::Unlimited => "Unlimited",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceSettings {
    pub dark_mode: bool,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self { dark_mode: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetRowSetting {
    pub label: String,
    pub base: String,
    pub download_tag: Option<String>,
}

impl Default for TargetRowSetting {
    fn default() -> Self {
        Self {
            label: String::new(),
            base: String::new(),
            download_tag: None,
        }
    }
}

impl From<TargetRow> for TargetRowSetting {
    fn from(row: TargetRow) -> Self {
        Self {
            label: row.label,
            base: row.base,
            download_tag: row.download_tag,
        }
    }
}

impl TargetRowSetting {
    pub fn to_row(&self) -> TargetRow {
        TargetRow::new(&self.label, &self.base, self.download_tag.as_deref())
    }
}

/// Where characters come from. `root` is a directory or an `http(s)://` base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    pub root: String,
    pub source_base: String,
    pub target_rows: Vec<TargetRowSetting>,
    pub format: AssetExtension,
    pub catalog_file: Option<PathBuf>,
    pub download_dir: PathBuf,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            root: "assets".to_string(),
            source_base: DEFAULT_SOURCE_BASE.to_string(),
            target_rows: TargetRow::defaults()
                .into_iter()
                .map(TargetRowSetting::from)
                .collect(),
            format: AssetExtension::Glb,
            catalog_file: None,
            download_dir: PathBuf::from("downloads"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub targets_per_page: usize,
    /// Height of the egui control strip above the viewports, in logical pixels.
    pub control_strip_height: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            targets_per_page: DEFAULT_TARGETS_PER_PAGE,
            control_strip_height: 72.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub fps_limit: FpsLimitSetting,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 900,
            vsync: true,
            fps_limit: FpsLimitSetting::Default60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct ExplorerSettings {
    pub appearance: AppearanceSettings,
    pub assets: AssetSettings,
    pub layout: LayoutSettings,
    pub window: WindowSettings,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            appearance: AppearanceSettings::default(),
            assets: AssetSettings::default(),
            layout: LayoutSettings::default(),
            window: WindowSettings::default(),
        }
    }
}

impl ExplorerSettings {
    pub fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();
        let target_rows = if self.assets.target_rows.is_empty() {
            defaults.target_rows
        } else {
            self.assets
                .target_rows
                .iter()
                .map(TargetRowSetting::to_row)
                .collect()
        };
        SessionConfig {
            page_size: self.layout.targets_per_page.max(1),
            source_base: self.assets.source_base.clone(),
            target_rows,
            locator: catalog::AssetLocator::new("", self.assets.format),
        }
    }

    pub fn asset_format(&self) -> AssetFormat {
        self.assets.format.into()
    }
}

#[derive(Debug, Error)]
pub enum SettingsIoError {
    #[error("failed to read settings file: {0}")]
    Read(std::io::Error),
    #[error("failed to write settings file: {0}")]
    Write(std::io::Error),
    #[error("failed to decode YAML settings: {0}")]
    Deserialize(serde_yaml::Error),
    #[error("failed to encode YAML settings: {0}")]
    Serialize(serde_yaml::Error),
}

#[derive(Resource, Clone)]
pub struct SettingsResource {
    pub current: ExplorerSettings,
    path: PathBuf,
}

impl SettingsResource {
    pub fn new(current: ExplorerSettings) -> Self {
        Self::with_path(current, SETTINGS_FILE_PATH)
    }

    pub fn with_path(current: ExplorerSettings, path: impl Into<PathBuf>) -> Self {
        Self {
            current,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save_to_disk(&self) -> Result<(), SettingsIoError> {
        write_settings_to_path(&self.current, &self.path)
    }

    /// Switches the frame limit and persists it. Returns whether it changed.
    pub fn set_fps_limit(&mut self, limit: FpsLimitSetting) -> Result<bool, SettingsIoError> {
        if self.current.window.fps_limit == limit {
            return Ok(false);
        }
        self.current.window.fps_limit = limit;
        self.save_to_disk()?;
        Ok(true)
    }
}

/// Persists the dark-mode flag into the settings file, leaving every other
/// section as it is on disk.
#[derive(Debug, Clone)]
pub struct YamlThemeStorage {
    path: PathBuf,
}

impl YamlThemeStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ThemeStorage for YamlThemeStorage {
    type Error = SettingsIoError;

    fn load(&self) -> Option<bool> {
        if !self.path.exists() {
            return None;
        }
        load_settings_from_path(&self.path)
            .ok()
            .map(|settings| settings.appearance.dark_mode)
    }

    fn store(&mut self, dark_mode: bool) -> Result<(), Self::Error> {
        let mut settings = if self.path.exists() {
            load_settings_from_path(&self.path)?
        } else {
            ExplorerSettings::default()
        };
        settings.appearance.dark_mode = dark_mode;
        write_settings_to_path(&settings, &self.path)
    }
}

pub struct SettingsPlugin;

impl Plugin for SettingsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, apply_runtime_settings);
    }
}

pub fn load_settings_or_default() -> ExplorerSettings {
    let path = Path::new(SETTINGS_FILE_PATH);

    if !path.exists() {
        return ExplorerSettings::default();
    }

    match load_settings_from_path(path) {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!(
                "Failed to load settings from '{}': {}. Falling back to defaults.",
                SETTINGS_FILE_PATH, error
            );
            ExplorerSettings::default()
        }
    }
}

pub fn ensure_settings_file_exists(settings: &ExplorerSettings) -> Result<(), SettingsIoError> {
    let path = Path::new(SETTINGS_FILE_PATH);
    if path.exists() {
        return Ok(());
    }

    write_settings_to_path(settings, path)
}

pub fn present_mode_for(window: &WindowSettings) -> PresentMode {
    if matches!(window.fps_limit, FpsLimitSetting::Unlimited) {
        PresentMode::AutoNoVsync
    } else if window.vsync {
        PresentMode::AutoVsync
    } else {
        PresentMode::AutoNoVsync
    }
}

pub fn load_settings_from_path(path: &Path) -> Result<ExplorerSettings, SettingsIoError> {
    let raw = fs::read_to_string(path).map_err(SettingsIoError::Read)?;
    serde_yaml::from_str::<ExplorerSettings>(&raw).map_err(SettingsIoError::Deserialize)
}

pub fn write_settings_to_path(
    settings: &ExplorerSettings,
    path: &Path,
) -> Result<(), SettingsIoError> {
    let encoded = serde_yaml::to_string(settings).map_err(SettingsIoError::Serialize)?;
    fs::write(path, encoded).map_err(SettingsIoError::Write)
}

fn apply_runtime_settings(
    settings: Res<SettingsResource>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut winit_settings: ResMut<WinitSettings>,
    mut last_applied: Local<Option<WindowSettings>>,
) {
    let window_settings = settings.current.window;
    if last_applied.as_ref() == Some(&window_settings) {
        return;
    }

    if let Ok(mut window) = windows.single_mut() {
        if last_applied.is_some() {
            window.resolution = WindowResolution::new(window_settings.width, window_settings.height);
        }
        window.present_mode = present_mode_for(&window_settings);
    }

    let update_mode = window_settings.fps_limit.to_update_mode();
    winit_settings.focused_mode = update_mode;
    winit_settings.unfocused_mode = update_mode;

    *last_applied = Some(window_settings);
}
