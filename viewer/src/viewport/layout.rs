//! Screen split: the source panel on the left, target rows to its right,
//! everything below the control strip. Rects are in logical pixels with the
//! origin at the window's top-left corner.

use bevy::math::{Rect, UVec2, Vec2};
use bevy::prelude::Resource;
use playback::ViewportId;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Panel {
    pub id: ViewportId,
    pub rect: Rect,
}

#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub struct PanelLayout {
    pub panels: Vec<Panel>,
}

impl PanelLayout {
    pub fn compute(window: Vec2, strip_height: f32, rows: usize, per_page: usize) -> Self {
        let top = strip_height.clamp(0.0, window.y);
        let body_height = (window.y - top).max(0.0);
        let columns = per_page.max(1) + 1;
        let column_width = window.x.max(0.0) / columns as f32;

        let mut panels = Vec::with_capacity(1 + rows * per_page);
        panels.push(Panel {
            id: ViewportId::SOURCE,
            rect: Rect::new(0.0, top, column_width, top + body_height),
        });

        if rows == 0 {
            return Self { panels };
        }
        let row_height = body_height / rows as f32;
        for row in 0..rows {
            for column in 0..per_page {
                let x = (column + 1) as f32 * column_width;
                let y = top + row as f32 * row_height;
                panels.push(Panel {
                    id: ViewportId((1 + row * per_page + column) as u16),
                    rect: Rect::new(x, y, x + column_width, y + row_height),
                });
            }
        }
        Self { panels }
    }

    pub fn rect(&self, id: ViewportId) -> Option<Rect> {
        self.panels
            .iter()
            .find(|panel| panel.id == id)
            .map(|panel| panel.rect)
    }

    pub fn panel_at(&self, point: Vec2) -> Option<ViewportId> {
        self.panels
            .iter()
            .find(|panel| panel.rect.contains(point))
            .map(|panel| panel.id)
    }
}

/// Physical position and size of a logical rect, or `None` when it would
/// cover no pixels.
pub fn physical_viewport(rect: Rect, scale_factor: f32, window: UVec2) -> Option<(UVec2, UVec2)> {
    let min = (rect.min * scale_factor).round().max(Vec2::ZERO).as_uvec2();
    let max = (rect.max * scale_factor).round().max(Vec2::ZERO).as_uvec2().min(window);
    if max.x <= min.x || max.y <= min.y {
        return None;
    }
    Some((min, max - min))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_takes_the_first_column_below_the_strip() {
        let layout = PanelLayout::compute(Vec2::new(1600.0, 872.0), 72.0, 2, 3);
        assert_eq!(layout.panels.len(), 7);
        assert_eq!(
            layout.rect(ViewportId::SOURCE),
            Some(Rect::new(0.0, 72.0, 400.0, 872.0))
        );
        assert_eq!(
            layout.rect(ViewportId(6)),
            Some(Rect::new(1200.0, 472.0, 1600.0, 872.0))
        );
    }

    #[test]
    fn hit_testing_finds_the_panel_under_the_cursor() {
        let layout = PanelLayout::compute(Vec2::new(1600.0, 872.0), 72.0, 2, 3);
        assert_eq!(layout.panel_at(Vec2::new(10.0, 500.0)), Some(ViewportId::SOURCE));
        assert_eq!(layout.panel_at(Vec2::new(900.0, 100.0)), Some(ViewportId(2)));
        assert_eq!(layout.panel_at(Vec2::new(900.0, 600.0)), Some(ViewportId(5)));
        assert_eq!(layout.panel_at(Vec2::new(900.0, 10.0)), None);
    }

    #[test]
    fn physical_rects_scale_and_clip_to_the_window() {
        let rect = Rect::new(400.0, 72.0, 800.0, 472.0);
        assert_eq!(
            physical_viewport(rect, 2.0, UVec2::new(3200, 1744)),
            Some((UVec2::new(800, 144), UVec2::new(800, 800)))
        );
        assert_eq!(
            physical_viewport(rect, 1.0, UVec2::new(600, 300)),
            Some((UVec2::new(400, 72), UVec2::new(200, 228)))
        );
        assert_eq!(physical_viewport(rect, 1.0, UVec2::new(300, 300)), None);
    }

    #[test]
    fn collapsed_window_yields_empty_panels() {
        let layout = PanelLayout::compute(Vec2::new(0.0, 50.0), 72.0, 2, 3);
        assert!(
            layout
                .panels
                .iter()
                .all(|panel| physical_viewport(panel.rect, 1.0, UVec2::new(0, 50)).is_none())
        );
    }
}
