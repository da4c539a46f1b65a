// Imports
use super::{FillPattern, StrokeOptions};
use serde::{Deserialize, Serialize};
use tavla_compose::Color;

/// Configuration of the freehand pen and highlighter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename = "brush_config")]
pub struct BrushConfig {
    #[serde(rename = "stroke")]
    pub stroke: StrokeOptions,
    /// Highlighter strokes render wide and translucent.
    #[serde(rename = "highlighter")]
    pub highlighter: bool,
    /// Closed strokes get filled when set to solid.
    #[serde(rename = "fill_pattern")]
    pub fill_pattern: FillPattern,
    #[serde(rename = "fill_color")]
    pub fill_color: Option<Color>,
    /// Hand-drawn wobble rendering, forwarded to the renderer.
    #[serde(rename = "hand_drawn_mode")]
    pub hand_drawn_mode: bool,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            stroke: StrokeOptions::default(),
            highlighter: false,
            fill_pattern: FillPattern::default(),
            fill_color: None,
            hand_drawn_mode: false,
        }
    }
}

impl BrushConfig {
    pub const STROKE_WIDTH_MIN: f64 = 0.1;
    pub const STROKE_WIDTH_MAX: f64 = 120.0;
    const HIGHLIGHTER_OPACITY: f64 = 0.4;
    const HIGHLIGHTER_WIDTH_FACTOR: f64 = 6.0;

    /// The effective stroke width of the current mode.
    pub fn effective_width(&self) -> f64 {
        if self.highlighter {
            self.stroke.width * Self::HIGHLIGHTER_WIDTH_FACTOR
        } else {
            self.stroke.width
        }
    }

    /// The effective opacity of the current mode.
    pub fn effective_opacity(&self) -> f64 {
        if self.highlighter {
            Self::HIGHLIGHTER_OPACITY
        } else {
            self.stroke.opacity
        }
    }
}
