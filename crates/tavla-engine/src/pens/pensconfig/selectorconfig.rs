// Imports
use serde::{Deserialize, Serialize};

/// How empty-canvas drags select elements.
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
#[serde(rename = "selector_style")]
pub enum SelectorStyle {
    /// Axis-aligned selection box, selects fully contained elements.
    #[serde(rename = "rectangle")]
    Rectangle = 0,
    /// Freehand lasso polygon, selects elements whose bounds center falls inside.
    #[serde(rename = "lasso")]
    Lasso,
}

impl Default for SelectorStyle {
    fn default() -> Self {
        Self::Rectangle
    }
}

impl TryFrom<u32> for SelectorStyle {
    type Error = anyhow::Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        num_traits::FromPrimitive::from_u32(value).ok_or_else(|| {
            anyhow::anyhow!("SelectorStyle try_from::<u32>() for value {} failed", value)
        })
    }
}

/// Configuration of the selector.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename = "selector_config")]
pub struct SelectorConfig {
    #[serde(rename = "style")]
    pub style: SelectorStyle,
    /// Lock the aspect ratio while resizing, in addition to the shift modifier.
    #[serde(rename = "resize_lock_aspectratio")]
    pub resize_lock_aspectratio: bool,
}
