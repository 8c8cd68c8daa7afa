use bevy::camera::{ClearColorConfig, Viewport};
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::PrimaryEguiContext;
use bevy_egui::input::EguiWantsInput;
use playback::glam::Vec2 as CoreVec2;
use playback::{CameraPose, OrbitGesture, ViewportId};

use super::components::{SessionResource, ViewportCamera, render_layer};
use super::layout::{PanelLayout, physical_viewport};
use crate::settings::SettingsResource;

const ROTATE_RADIANS_PER_PIXEL: f32 = 0.008;
const PAN_PER_PIXEL_PER_UNIT: f32 = 0.0015;
const ZOOM_PER_LINE: f32 = 0.4;
const ZOOM_PER_PIXEL: f32 = 0.01;
const UI_CAMERA_ORDER: isize = 10_000;

#[derive(Component)]
pub struct OverlayUiCamera;

pub fn spawn_viewport_cameras(mut commands: Commands, session: Res<SessionResource>) {
    commands.spawn((
        Camera2d,
        Camera {
            viewport: None,
            order: UI_CAMERA_ORDER,
            clear_color: ClearColorConfig::None,
            ..default()
        },
        OverlayUiCamera,
        PrimaryEguiContext,
        Name::new("overlay_ui_camera"),
    ));

    for viewport in session.viewports() {
        let id = viewport.id();
        // The lowest-order camera clears the whole target; the rest draw on top.
        let clear_color = if id == ViewportId::SOURCE {
            ClearColorConfig::Default
        } else {
            ClearColorConfig::None
        };
        commands.spawn((
            Camera3d::default(),
            Camera {
                order: id.0 as isize,
                clear_color,
                ..default()
            },
            Tonemapping::AcesFitted,
            pose_transform(viewport.orbit().pose()),
            render_layer(id),
            ViewportCamera { id },
            Name::new(format!("viewport_camera_{}", id.0)),
        ));
    }
}

pub fn pose_transform(pose: CameraPose) -> Transform {
    let position = Vec3::from_array(pose.position.to_array());
    let target = Vec3::from_array(pose.target.to_array());
    let up = Vec3::from_array(pose.up().to_array());
    Transform::from_translation(position).looking_at(target, up)
}

pub fn layout_viewports(
    windows: Query<&Window, With<PrimaryWindow>>,
    settings: Res<SettingsResource>,
    session: Res<SessionResource>,
    mut layout: ResMut<PanelLayout>,
    mut cameras: Query<(&ViewportCamera, &mut Camera)>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let config = session.config();
    let computed = PanelLayout::compute(
        Vec2::new(window.width(), window.height()),
        settings.current.layout.control_strip_height,
        config.target_rows.len(),
        config.page_size,
    );
    if *layout == computed {
        return;
    }

    let physical_size = UVec2::new(window.physical_width(), window.physical_height());
    for (marker, mut camera) in &mut cameras {
        let rect = computed
            .rect(marker.id)
            .and_then(|rect| physical_viewport(rect, window.scale_factor(), physical_size));
        match rect {
            Some((physical_position, physical_size)) => {
                camera.viewport = Some(Viewport {
                    physical_position,
                    physical_size,
                    ..default()
                });
                camera.is_active = true;
            }
            None => camera.is_active = false,
        }
    }
    *layout = computed;
}

pub fn apply_camera_poses(
    session: Res<SessionResource>,
    mut cameras: Query<(&ViewportCamera, &mut Transform)>,
) {
    for (marker, mut transform) in &mut cameras {
        if let Some(viewport) = session.viewport(marker.id) {
            let target = pose_transform(viewport.orbit().pose());
            if *transform != target {
                *transform = target;
            }
        }
    }
}

/// Converts one frame of pointer input over a panel into orbit gestures.
/// Left drag rotates, right or middle drag pans, the wheel zooms.
pub fn pointer_gestures(
    drag: Vec2,
    scroll: f32,
    rotating: bool,
    panning: bool,
    distance: f32,
) -> Vec<OrbitGesture> {
    let mut gestures = Vec::new();
    if drag != Vec2::ZERO {
        if rotating {
            gestures.push(OrbitGesture::Rotate {
                yaw: drag.x * ROTATE_RADIANS_PER_PIXEL,
                pitch: drag.y * ROTATE_RADIANS_PER_PIXEL,
            });
        } else if panning {
            let scale = PAN_PER_PIXEL_PER_UNIT * distance;
            gestures.push(OrbitGesture::Pan(CoreVec2::new(
                -drag.x * scale,
                drag.y * scale,
            )));
        }
    }
    if scroll.abs() > f32::EPSILON {
        gestures.push(OrbitGesture::Zoom(scroll));
    }
    gestures
}

/// Routes pointer input to the panel under the cursor. A drag stays with the
/// panel it started on.
pub fn orbit_hovered_viewport(
    windows: Query<&Window, With<PrimaryWindow>>,
    layout: Res<PanelLayout>,
    egui_wants_input: Option<Res<EguiWantsInput>>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mut session: ResMut<SessionResource>,
    mut dragging: Local<Option<ViewportId>>,
) {
    let drag: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();
    let scroll: f32 = mouse_wheel
        .read()
        .map(|wheel| match wheel.unit {
            MouseScrollUnit::Line => wheel.y * ZOOM_PER_LINE,
            MouseScrollUnit::Pixel => wheel.y * ZOOM_PER_PIXEL,
        })
        .sum();

    let rotating = mouse_buttons.pressed(MouseButton::Left);
    let panning =
        mouse_buttons.pressed(MouseButton::Right) || mouse_buttons.pressed(MouseButton::Middle);
    if !rotating && !panning {
        *dragging = None;
    }

    let egui_busy = egui_wants_input
        .as_ref()
        .is_some_and(|wants| wants.wants_any_pointer_input());
    let hovered = windows
        .single()
        .ok()
        .and_then(|window| window.cursor_position())
        .and_then(|cursor| layout.panel_at(cursor));

    let target = match *dragging {
        Some(id) => Some(id),
        None if egui_busy => None,
        None => {
            if rotating || panning {
                *dragging = hovered;
            }
            hovered
        }
    };
    let Some(id) = target else {
        return;
    };

    let distance = session
        .viewport(id)
        .map(|viewport| viewport.orbit().distance)
        .unwrap_or(1.0);
    for gesture in pointer_gestures(drag, scroll, rotating, panning, distance) {
        session.orbit_camera(id, gesture);
    }
}
