// Imports
use super::{FillPattern, StrokeOptions};
use serde::{Deserialize, Serialize};
use tavla_compose::Color;

/// Which shape kind the shaper creates.
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
#[serde(rename = "shape_kind")]
pub enum ShapeKind {
    #[serde(rename = "rectangle")]
    Rectangle = 0,
    #[serde(rename = "diamond")]
    Diamond,
    #[serde(rename = "ellipse")]
    Ellipse,
    #[serde(rename = "frame")]
    Frame,
}

impl Default for ShapeKind {
    fn default() -> Self {
        Self::Rectangle
    }
}

impl TryFrom<u32> for ShapeKind {
    type Error = anyhow::Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        num_traits::FromPrimitive::from_u32(value).ok_or_else(|| {
            anyhow::anyhow!("ShapeKind try_from::<u32>() for value {} failed", value)
        })
    }
}

/// Configuration of the shape pen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename = "shaper_config")]
pub struct ShaperConfig {
    #[serde(rename = "stroke")]
    pub stroke: StrokeOptions,
    #[serde(rename = "kind")]
    pub kind: ShapeKind,
    #[serde(rename = "fill_pattern")]
    pub fill_pattern: FillPattern,
    #[serde(rename = "fill_color")]
    pub fill_color: Option<Color>,
    #[serde(rename = "corner_radius")]
    pub corner_radius: f64,
    /// Hand-drawn wobble rendering, forwarded to the renderer.
    #[serde(rename = "hand_drawn_mode")]
    pub hand_drawn_mode: bool,
}

impl Default for ShaperConfig {
    fn default() -> Self {
        Self {
            stroke: StrokeOptions::default(),
            kind: ShapeKind::default(),
            fill_pattern: FillPattern::default(),
            fill_color: None,
            corner_radius: 0.0,
            hand_drawn_mode: false,
        }
    }
}

impl ShaperConfig {
    /// Shapes below this width or height are dropped on commit.
    pub const MIN_COMMIT_SIZE: f64 = 2.0;
}
