//! Engine configuration.
//!
//! Every knob has a default; a JSON file only needs the fields it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{Point, Size};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub grid: GridConfig,
    pub zoom: ZoomConfig,
    pub canvas: CanvasConfig,
    pub element_size: Size,
    pub branches: BranchConfig,
    pub scaffold: ScaffoldConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub cell_width: f64,
    pub cell_height: f64,
    pub snap: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_width: 120.0,
            cell_height: 60.0,
            snap: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomConfig {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.6,
            max: 1.4,
            step: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 4000.0,
            height: 3000.0,
        }
    }
}

/// Reserved branch labels of a strict approval gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchConfig {
    pub approved: String,
    pub rejected: String,
    pub default_color: String,
}

impl BranchConfig {
    pub fn is_reserved(&self, label: &str) -> bool {
        label == self.approved || label == self.rejected
    }
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            approved: "Согласовано".to_owned(),
            rejected: "Отклонено".to_owned(),
            default_color: "#4a5568".to_owned(),
        }
    }
}

/// Offsets used when compound intents place extra elements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaffoldConfig {
    /// Where the DECISION created with an APPROVAL lands, relative to the APPROVAL.
    pub approval_decision_offset: Point,
    /// Placeholder PROCESS for the approved branch, relative to the DECISION.
    pub approved_branch_offset: Point,
    /// Placeholder PROCESS for the rejected branch, relative to the DECISION.
    pub rejected_branch_offset: Point,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            approval_decision_offset: Point::new(240.0, 0.0),
            approved_branch_offset: Point::new(240.0, -120.0),
            rejected_branch_offset: Point::new(240.0, 120.0),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    grid: Option<GridConfigFile>,
    zoom: Option<ZoomConfigFile>,
    canvas: Option<CanvasConfigFile>,
    element_size: Option<Size>,
    branches: Option<BranchConfigFile>,
    scaffold: Option<ScaffoldConfigFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridConfigFile {
    cell_width: Option<f64>,
    cell_height: Option<f64>,
    snap: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ZoomConfigFile {
    min: Option<f64>,
    max: Option<f64>,
    step: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct CanvasConfigFile {
    width: Option<f64>,
    height: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BranchConfigFile {
    approved: Option<String>,
    rejected: Option<String>,
    default_color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScaffoldConfigFile {
    approval_decision_offset: Option<Point>,
    approved_branch_offset: Option<Point>,
    rejected_branch_offset: Option<Point>,
}

impl EngineConfig {
    /// Overlay a JSON document on the defaults.
    pub fn from_json_str(contents: &str) -> anyhow::Result<Self> {
        let parsed: ConfigFile = serde_json::from_str(contents)?;
        let mut config = Self::default();
        config.overlay(parsed);
        config.validate()?;
        Ok(config)
    }

    fn overlay(&mut self, parsed: ConfigFile) {
        if let Some(grid) = parsed.grid {
            if let Some(v) = grid.cell_width {
                self.grid.cell_width = v;
            }
            if let Some(v) = grid.cell_height {
                self.grid.cell_height = v;
            }
            if let Some(v) = grid.snap {
                self.grid.snap = v;
            }
        }
        if let Some(zoom) = parsed.zoom {
            if let Some(v) = zoom.min {
                self.zoom.min = v;
            }
            if let Some(v) = zoom.max {
                self.zoom.max = v;
            }
            if let Some(v) = zoom.step {
                self.zoom.step = v;
            }
        }
        if let Some(canvas) = parsed.canvas {
            if let Some(v) = canvas.width {
                self.canvas.width = v;
            }
            if let Some(v) = canvas.height {
                self.canvas.height = v;
            }
        }
        if let Some(size) = parsed.element_size {
            self.element_size = size;
        }
        if let Some(branches) = parsed.branches {
            if let Some(v) = branches.approved {
                self.branches.approved = v;
            }
            if let Some(v) = branches.rejected {
                self.branches.rejected = v;
            }
            if let Some(v) = branches.default_color {
                self.branches.default_color = v;
            }
        }
        if let Some(scaffold) = parsed.scaffold {
            if let Some(v) = scaffold.approval_decision_offset {
                self.scaffold.approval_decision_offset = v;
            }
            if let Some(v) = scaffold.approved_branch_offset {
                self.scaffold.approved_branch_offset = v;
            }
            if let Some(v) = scaffold.rejected_branch_offset {
                self.scaffold.rejected_branch_offset = v;
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.grid.cell_width <= 0.0 || self.grid.cell_height <= 0.0 {
            anyhow::bail!("grid cells must have a positive size");
        }
        if self.zoom.min <= 0.0 || self.zoom.min > self.zoom.max {
            anyhow::bail!(
                "zoom bounds are inverted or non-positive: [{}, {}]",
                self.zoom.min,
                self.zoom.max
            );
        }
        if self.branches.approved == self.branches.rejected {
            anyhow::bail!("approved and rejected branch labels must differ");
        }
        Ok(())
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    EngineConfig::from_json_str(&contents)
}
