// Imports
use serde::{Deserialize, Serialize};

/// Configuration of the eraser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename = "eraser_config")]
pub struct EraserConfig {
    /// The eraser stroke width.
    #[serde(rename = "width")]
    pub width: f64,
}

impl Default for EraserConfig {
    fn default() -> Self {
        Self {
            width: Self::WIDTH_DEFAULT,
        }
    }
}

impl EraserConfig {
    pub const WIDTH_MIN: f64 = 1.0;
    pub const WIDTH_MAX: f64 = 500.0;
    pub const WIDTH_DEFAULT: f64 = 12.0;

    /// The erase radius: twice the eraser stroke width.
    pub fn erase_radius(&self) -> f64 {
        self.width * 2.0
    }
}
