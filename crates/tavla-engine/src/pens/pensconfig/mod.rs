// Modules
pub mod brushconfig;
pub mod connectorconfig;
pub mod eraserconfig;
pub mod selectorconfig;
pub mod shaperconfig;
pub mod tileconfig;
pub mod typewriterconfig;

// Re-exports
pub use brushconfig::BrushConfig;
pub use connectorconfig::ConnectorConfig;
pub use eraserconfig::EraserConfig;
pub use selectorconfig::SelectorConfig;
pub use shaperconfig::ShaperConfig;
pub use tileconfig::TileConfig;
pub use typewriterconfig::TypewriterConfig;

// Imports
use serde::{Deserialize, Serialize};
use tavla_compose::Color;

/// The toolbar tool surface.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    num_derive::FromPrimitive,
    num_derive::ToPrimitive,
)]
#[serde(rename = "tool")]
pub enum Tool {
    #[serde(rename = "hand")]
    Hand = 0,
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "lasso")]
    Lasso,
    #[serde(rename = "pen")]
    Pen,
    #[serde(rename = "highlighter")]
    Highlighter,
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "arrow")]
    Arrow,
    #[serde(rename = "rectangle")]
    Rectangle,
    #[serde(rename = "diamond")]
    Diamond,
    #[serde(rename = "ellipse")]
    Ellipse,
    #[serde(rename = "frame")]
    Frame,
    #[serde(rename = "eraser")]
    Eraser,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "laser")]
    Laser,
    #[serde(rename = "tile")]
    Tile,
}

impl Default for Tool {
    fn default() -> Self {
        Self::Select
    }
}

impl TryFrom<u32> for Tool {
    type Error = anyhow::Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        num_traits::FromPrimitive::from_u32(value)
            .ok_or_else(|| anyhow::anyhow!("Tool try_from::<u32>() for value {} failed", value))
    }
}

/// How a stroke outline is dashed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    num_derive::FromPrimitive,
    num_derive::ToPrimitive,
)]
#[serde(rename = "stroke_style")]
pub enum StrokeStyle {
    #[serde(rename = "solid")]
    Solid = 0,
    #[serde(rename = "dashed")]
    Dashed,
    #[serde(rename = "dotted")]
    Dotted,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::Solid
    }
}

impl TryFrom<u32> for StrokeStyle {
    type Error = anyhow::Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        num_traits::FromPrimitive::from_u32(value).ok_or_else(|| {
            anyhow::anyhow!("StrokeStyle try_from::<u32>() for value {} failed", value)
        })
    }
}

/// The line cap of stroked paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename = "line_cap")]
pub enum LineCap {
    #[serde(rename = "butt")]
    Butt,
    #[default]
    #[serde(rename = "round")]
    Round,
}

/// Whether closed shapes get filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename = "fill_pattern")]
pub enum FillPattern {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "solid")]
    Solid,
}

/// Stroke options shared by the drawing pens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename = "stroke_options")]
pub struct StrokeOptions {
    #[serde(rename = "color")]
    pub color: Color,
    #[serde(rename = "width")]
    pub width: f64,
    #[serde(rename = "opacity")]
    pub opacity: f64,
    #[serde(rename = "style")]
    pub style: StrokeStyle,
    #[serde(rename = "line_cap")]
    pub line_cap: LineCap,
}

impl Default for StrokeOptions {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 2.0,
            opacity: 1.0,
            style: StrokeStyle::default(),
            line_cap: LineCap::default(),
        }
    }
}

/// The configurations of all pens.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename = "pens_config")]
pub struct PensConfig {
    #[serde(rename = "brush_config")]
    pub brush_config: BrushConfig,
    #[serde(rename = "connector_config")]
    pub connector_config: ConnectorConfig,
    #[serde(rename = "eraser_config")]
    pub eraser_config: EraserConfig,
    #[serde(rename = "selector_config")]
    pub selector_config: SelectorConfig,
    #[serde(rename = "shaper_config")]
    pub shaper_config: ShaperConfig,
    #[serde(rename = "tile_config")]
    pub tile_config: TileConfig,
    #[serde(rename = "typewriter_config")]
    pub typewriter_config: TypewriterConfig,
    /// Prevents the auto-switch back to the select tool after a commit.
    #[serde(rename = "is_tool_locked")]
    pub is_tool_locked: bool,
    /// Read-only boards allow panning only.
    #[serde(rename = "is_read_only")]
    pub is_read_only: bool,
}
