use crate::config::{CanvasConfig, GridConfig};
use crate::types::{Point, Size};

/// Snapping grid. Cell width and height are independent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub cell_width: f64,
    pub cell_height: f64,
    pub enabled: bool,
}

impl Grid {
    pub fn new(cell_width: f64, cell_height: f64) -> Self {
        Self {
            cell_width,
            cell_height,
            enabled: true,
        }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self {
            cell_width: config.cell_width,
            cell_height: config.cell_height,
            enabled: config.snap,
        }
    }

    /// Nearest grid intersection, or `p` itself when snapping is off.
    pub fn snap(&self, p: Point) -> Point {
        if !self.enabled {
            return p;
        }
        Point::new(
            snap_axis(p.x, self.cell_width),
            snap_axis(p.y, self.cell_height),
        )
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::from_config(&GridConfig::default())
    }
}

fn snap_axis(value: f64, cell: f64) -> f64 {
    if cell <= 0.0 || !value.is_finite() {
        return value;
    }
    (value / cell).round() * cell
}

/// Keep an element of `size` fully inside the canvas.
pub fn clamp_to_canvas(position: Point, size: Size, canvas: &CanvasConfig) -> Point {
    let max_x = (canvas.width - size.width).max(0.0);
    let max_y = (canvas.height - size.height).max(0.0);
    Point::new(position.x.clamp(0.0, max_x), position.y.clamp(0.0, max_y))
}

/// Snap and clamp together, staying on the grid even at the canvas edge.
pub fn place(position: Point, size: Size, grid: &Grid, canvas: &CanvasConfig) -> Point {
    let clamped = clamp_to_canvas(position, size, canvas);
    if !grid.enabled {
        return clamped;
    }
    let max_x = (canvas.width - size.width).max(0.0);
    let max_y = (canvas.height - size.height).max(0.0);
    Point::new(
        fit_axis(snap_axis(clamped.x, grid.cell_width), grid.cell_width, max_x),
        fit_axis(snap_axis(clamped.y, grid.cell_height), grid.cell_height, max_y),
    )
}

fn fit_axis(snapped: f64, cell: f64, max: f64) -> f64 {
    if snapped > max {
        (snapped - cell).max(0.0)
    } else {
        snapped.max(0.0)
    }
}
