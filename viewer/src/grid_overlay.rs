use bevy::asset::RenderAssetUsages;
use bevy::mesh::PrimitiveTopology;
use bevy::prelude::*;

pub const GRID_OVERLAY_COLOR: Color = Color::srgba(0.5, 0.5, 0.5, 0.6);

/// Ground grid drawn under every character, and on its own when a viewport
/// has nothing to show.
#[derive(Clone, Copy, Debug)]
pub struct GridOverlayConfig {
    pub cell_size: f32,
    pub visible_half_cells: i32,
    pub y_offset: f32,
    pub color: Color,
}

impl Default for GridOverlayConfig {
    fn default() -> Self {
        Self {
            cell_size: 0.5,
            visible_half_cells: 10,
            y_offset: 0.0,
            color: GRID_OVERLAY_COLOR,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLineSegment {
    pub start: Vec3,
    pub end: Vec3,
}

pub fn grid_line_count(visible_half_cells: i32) -> usize {
    let half = visible_half_cells.max(0) as usize;
    if half == 0 {
        return 0;
    }
    2 * (2 * half + 1)
}

/// Full-length lines along X and Z through every cell boundary.
pub fn build_grid_segments(config: GridOverlayConfig) -> Vec<GridLineSegment> {
    if config.cell_size <= 0.0 {
        return Vec::new();
    }

    let half = config.visible_half_cells.max(0);
    if half == 0 {
        return Vec::new();
    }
    let extent = half as f32 * config.cell_size;
    let y = config.y_offset;
    let mut lines = Vec::with_capacity(grid_line_count(half));

    for i in -half..=half {
        let offset = i as f32 * config.cell_size;
        lines.push(GridLineSegment {
            start: Vec3::new(-extent, y, offset),
            end: Vec3::new(extent, y, offset),
        });
        lines.push(GridLineSegment {
            start: Vec3::new(offset, y, -extent),
            end: Vec3::new(offset, y, extent),
        });
    }

    lines
}

pub fn grid_mesh(config: GridOverlayConfig) -> Mesh {
    let positions: Vec<[f32; 3]> = build_grid_segments(config)
        .into_iter()
        .flat_map(|segment| [segment.start.to_array(), segment.end.to_array()])
        .collect();
    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh
}

pub fn grid_material(config: GridOverlayConfig) -> StandardMaterial {
    StandardMaterial {
        base_color: config.color,
        unlit: true,
        alpha_mode: AlphaMode::Blend,
        ..default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_spans_ten_units() {
        let config = GridOverlayConfig::default();
        let segments = build_grid_segments(config);
        assert_eq!(segments.len(), grid_line_count(config.visible_half_cells));
        assert_eq!(segments.len(), 42);

        let max_x = segments
            .iter()
            .flat_map(|s| [s.start.x, s.end.x])
            .fold(f32::MIN, f32::max);
        assert_eq!(max_x, 5.0);
        assert!(segments.iter().all(|s| s.start.y == 0.0 && s.end.y == 0.0));
    }

    #[test]
    fn degenerate_configs_draw_nothing() {
        let mut config = GridOverlayConfig::default();
        config.cell_size = 0.0;
        assert!(build_grid_segments(config).is_empty());

        config.cell_size = 1.0;
        config.visible_half_cells = -3;
        assert!(build_grid_segments(config).is_empty());
        assert_eq!(grid_line_count(-3), 0);
    }

    #[test]
    fn grid_mesh_holds_two_vertices_per_line() {
        let mesh = grid_mesh(GridOverlayConfig::default());
        assert_eq!(mesh.count_vertices(), 84);
        assert_eq!(mesh.primitive_topology(), PrimitiveTopology::LineList);
    }
}
