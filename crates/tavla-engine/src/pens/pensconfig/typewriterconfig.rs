// Imports
use crate::element::TextAlign;
use serde::{Deserialize, Serialize};
use tavla_compose::Color;

/// Configuration of the typewriter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename = "typewriter_config")]
pub struct TypewriterConfig {
    #[serde(rename = "color")]
    pub color: Color,
    #[serde(rename = "font_size")]
    pub font_size: f64,
    #[serde(rename = "font_family")]
    pub font_family: String,
    #[serde(rename = "line_height")]
    pub line_height: f64,
    #[serde(rename = "letter_spacing")]
    pub letter_spacing: f64,
    #[serde(rename = "text_align")]
    pub text_align: TextAlign,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            font_size: Self::FONT_SIZE_DEFAULT,
            font_family: String::from("sans-serif"),
            line_height: 1.25,
            letter_spacing: 0.0,
            text_align: TextAlign::default(),
        }
    }
}

impl TypewriterConfig {
    pub const FONT_SIZE_MIN: f64 = 4.0;
    pub const FONT_SIZE_MAX: f64 = 240.0;
    pub const FONT_SIZE_DEFAULT: f64 = 16.0;
}
