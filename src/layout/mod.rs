//! Spatial layout: grid snapping, canvas clamping, the pan/zoom viewport and
//! orthogonal connector geometry.

pub mod connector;
pub mod grid;
pub mod viewport;

pub use connector::{
    boundary_point, connector_geometry, connector_segment, label_anchor, route,
    ConnectorGeometry, LabelPlacement,
};
pub use grid::{clamp_to_canvas, place, Grid};
pub use viewport::Viewport;

use crate::config::{CanvasConfig, EngineConfig};
use crate::core::graph::SchemaGraph;
use crate::error::Result;
use crate::types::{ConnectionId, Point, Size};

/// Grid and canvas bounds used to position elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub grid: Grid,
    pub canvas: CanvasConfig,
}

impl Layout {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            grid: Grid::from_config(&config.grid),
            canvas: config.canvas,
        }
    }

    /// Final resting position of an element whose top-left corner is requested at
    /// `position`.
    pub fn place(&self, position: Point, size: Size) -> Point {
        place(position, size, &self.grid, &self.canvas)
    }

    /// Position of a dragged element: the pointer minus the offset it was grabbed at.
    pub fn drag_to(&self, pointer: Point, grab_offset: Point, size: Size) -> Point {
        self.place(pointer - grab_offset, size)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Connector geometry for a stored connection. `None` when both ends share a center.
pub fn connection_geometry(
    graph: &SchemaGraph,
    connection: ConnectionId,
) -> Result<Option<ConnectorGeometry>> {
    let connection = graph.require_connection(connection)?;
    let source = graph.require_element(connection.source())?.bounds();
    let target = graph.require_element(connection.target())?.bounds();
    Ok(connector_geometry(
        &source,
        &target,
        connection.condition().label_rotation,
    ))
}
