use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use bevy_egui::{EguiContexts, EguiPrimaryContextPass, egui};
use catalog::display_character;
use playback::{
    ExplorerSession, LoadStatus, SPEED_CHOICES, Subscription, ThemeConfig, ViewPreset,
    ViewportId, ViewportKind,
};

use crate::settings::{FpsLimitSetting, SettingsResource, YamlThemeStorage};
use crate::viewport::{AssetAccess, PanelLayout, SessionResource};

const LIGHT_BACKGROUND: Color = Color::srgb(0.93, 0.93, 0.94);
const DARK_BACKGROUND: Color = Color::srgb(0.11, 0.11, 0.13);

#[derive(Resource)]
pub struct ThemeResource(pub ThemeConfig<YamlThemeStorage>);

pub struct ExplorerUiPlugin;

impl Plugin for ExplorerUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(EguiPrimaryContextPass, draw_explorer_ui);
    }
}

pub fn background_for(dark_mode: bool) -> Color {
    if dark_mode {
        DARK_BACKGROUND
    } else {
        LIGHT_BACKGROUND
    }
}

pub fn speed_label(speed: f32) -> String {
    format!("{speed}x")
}

pub fn status_caption(status: &LoadStatus) -> Option<String> {
    match status {
        // Failures fall back to the bare grid; the cause only goes to the log.
        LoadStatus::Loaded | LoadStatus::Error { .. } => None,
        LoadStatus::Empty => Some("empty".to_string()),
        LoadStatus::Pending => Some("loading...".to_string()),
    }
}

pub fn panel_title(session: &ExplorerSession, id: ViewportId) -> String {
    let Some(viewport) = session.viewport(id) else {
        return String::new();
    };
    let character = viewport
        .character()
        .map(display_character)
        .unwrap_or_default();
    match viewport.kind() {
        ViewportKind::Source => format!("SOURCE  {character}"),
        ViewportKind::Target { row, .. } => {
            let row_label = session
                .config()
                .target_rows
                .get(row)
                .map(|row| row.label.as_str())
                .unwrap_or_default();
            format!("{row_label}  {character}")
        }
    }
}

fn apply_explorer_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(10.0, 5.0);
    style.visuals.widgets.active.corner_radius = egui::CornerRadius::same(6);
    style.visuals.widgets.hovered.corner_radius = egui::CornerRadius::same(6);
    style.visuals.widgets.inactive.corner_radius = egui::CornerRadius::same(6);
    ctx.set_style(style);
}

fn draw_explorer_ui(
    mut contexts: EguiContexts,
    mut session: ResMut<SessionResource>,
    mut theme: ResMut<ThemeResource>,
    mut settings: ResMut<SettingsResource>,
    mut clear_color: ResMut<ClearColor>,
    access: Res<AssetAccess>,
    layout: Res<PanelLayout>,
    mut theme_seen: Local<Subscription>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    if let Some(dark_mode) = theme.0.poll(&mut theme_seen) {
        ctx.set_visuals(if dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });
        apply_explorer_style(ctx);
        clear_color.0 = background_for(dark_mode);
        settings.current.appearance.dark_mode = dark_mode;
    }

    draw_control_strip(ctx, &mut session, &mut theme, &mut settings);
    draw_panel_overlays(ctx, &mut session, &access, &layout);
}

fn draw_control_strip(
    ctx: &egui::Context,
    session: &mut ExplorerSession,
    theme: &mut ThemeResource,
    settings: &mut SettingsResource,
) {
    egui::TopBottomPanel::top("explorer_controls")
        .exact_height(settings.current.layout.control_strip_height)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Random motion").clicked() {
                    session.random_clip(&mut rand::thread_rng());
                }
                ui.strong(session.active_clip().name.clone());
                ui.separator();

                if ui.button("<").clicked() {
                    session.previous_page();
                }
                ui.label(session.carousel_label());
                if ui.button(">").clicked() {
                    session.next_page();
                }
                ui.separator();

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let dark_mode = theme.0.get();
                    let label = if dark_mode { "Light mode" } else { "Dark mode" };
                    if ui.button(label).clicked() {
                        if let Err(error) = theme.0.toggle() {
                            warn!("Failed to persist theme: {}", error);
                        }
                    }
                    draw_fps_limit_picker(ui, settings);
                });
            });

            ui.horizontal(|ui| {
                let running = session.transport().state().running;
                if ui.button(if running { "Pause" } else { "Play" }).clicked() {
                    session.toggle_playback();
                }

                let speed = session.transport().state().speed;
                for choice in SPEED_CHOICES {
                    if ui
                        .selectable_label(speed == choice, speed_label(choice))
                        .clicked()
                    {
                        if let Err(error) = session.set_speed(choice) {
                            warn!("{}", error);
                        }
                    }
                }
                ui.separator();

                let mut frame = session.transport().state().frame_index;
                let max = session.transport().slider_max();
                let response = ui.add(
                    egui::Slider::new(&mut frame, 0..=max)
                        .show_value(false)
                        .clamping(egui::SliderClamping::Always),
                );
                if response.changed() {
                    session.scrub_to_frame(frame);
                }
                ui.monospace(session.frame_label());
            });
        });
}

fn draw_fps_limit_picker(ui: &mut egui::Ui, settings: &mut SettingsResource) {
    let current = settings.current.window.fps_limit;
    let mut selected = current;
    egui::ComboBox::from_id_salt("fps_limit")
        .selected_text(selected.label())
        .show_ui(ui, |ui| {
            for option in FpsLimitSetting::ALL {
                ui.selectable_value(&mut selected, option, option.label());
            }
        });
    if selected == current {
        return;
    }
    if let Err(error) = settings.set_fps_limit(selected) {
        warn!(
            "Failed to save settings file '{}': {}",
            settings.path().display(),
            error
        );
    }
}

fn draw_panel_overlays(
    ctx: &egui::Context,
    session: &mut ExplorerSession,
    access: &AssetAccess,
    layout: &PanelLayout,
) {
    for panel in &layout.panels {
        let id = panel.id;
        let Some(status) = session.viewport(id).map(|viewport| viewport.status().clone()) else {
            continue;
        };
        let title = panel_title(session, id);
        let download = session.download_for(id);

        egui::Area::new(egui::Id::new(("viewport_overlay", id.0)))
            .fixed_pos(egui::pos2(panel.rect.min.x + 8.0, panel.rect.min.y + 6.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(0, 0, 0, 96))
                    .corner_radius(egui::CornerRadius::same(6))
                    .inner_margin(egui::Margin::symmetric(8, 4))
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new(title).color(egui::Color32::WHITE));
                        if let Some(caption) = status_caption(&status) {
                            ui.label(egui::RichText::new(caption).small().color(egui::Color32::LIGHT_GRAY));
                        }
                        ui.horizontal(|ui| {
                            if id == ViewportId::SOURCE {
                                for preset in ViewPreset::ALL {
                                    let button = ui
                                        .small_button(preset.axis_label())
                                        .on_hover_text(preset.label());
                                    if button.clicked() {
                                        if let Err(error) = session.issue_view_preset(id, preset) {
                                            warn!("{}", error);
                                        }
                                    }
                                }
                            }
                            if let Some(link) = download.clone() {
                                if ui.small_button("FBX").on_hover_text(link.file_name.as_str()).clicked() {
                                    spawn_download(access, link);
                                }
                            }
                        });
                    });
            });
    }
}

fn spawn_download(access: &AssetAccess, link: catalog::DownloadLink) {
    let loader = access.loader.clone();
    let dir = access.download_dir.clone();
    IoTaskPool::get()
        .spawn(async move {
            if let Err(error) = loader.download(&link, &dir) {
                warn!("Download of '{}' failed: {}", link.path, error);
            }
        })
        .detach();
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Catalog;
    use playback::SessionConfig;

    #[test]
    fn panel_titles_name_the_row_and_character() {
        let session = ExplorerSession::new(Catalog::builtin(), SessionConfig::default());
        assert_eq!(panel_title(&session, ViewportId::SOURCE), "SOURCE  YBOT");
        assert_eq!(
            panel_title(&session, session.target_id(1, 2)),
            "MIXAMO_RETARGETING  AMY"
        );
        assert_eq!(panel_title(&session, ViewportId(99)), "");
    }

    #[test]
    fn status_captions_hide_loaded_and_failed_viewports() {
        assert_eq!(status_caption(&LoadStatus::Loaded), None);
        assert_eq!(status_caption(&LoadStatus::Pending).as_deref(), Some("loading..."));
        assert_eq!(
            status_caption(&LoadStatus::Error {
                kind: "not found",
                message: "missing".to_string(),
            }),
            None
        );
    }

    #[test]
    fn speeds_and_backgrounds_are_labelled() {
        assert_eq!(speed_label(0.25), "0.25x");
        assert_eq!(speed_label(1.0), "1x");
        assert_ne!(background_for(true), background_for(false));
    }
}
