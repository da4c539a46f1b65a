// Imports
use serde::{Deserialize, Serialize};

/// A rgba color as exchanged with the element store.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(default, rename = "color")]
pub struct Color {
    /// Red, ranging [0.0, 1.0].
    #[serde(rename = "r")]
    pub r: f64,
    /// Green, ranging [0.0, 1.0].
    #[serde(rename = "g")]
    pub g: f64,
    /// Blue, ranging [0.0, 1.0].
    #[serde(rename = "b")]
    pub b: f64,
    /// Alpha, ranging [0.0, 1.0].
    #[serde(rename = "a")]
    pub a: f64,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    /// Transparent color with r,g,b set to 0.0.
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Black color.
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    /// White color.
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    /// A new color from rgba values, each ranging [0.0, 1.0].
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }

    /// A new color with the given alpha.
    pub fn with_alpha(mut self, a: f64) -> Self {
        self.a = a.clamp(0.0, 1.0);
        self
    }

    /// Convert from a packed 32 bit integer, in the format 0xRRGGBBAA.
    pub fn from_u32_rgba(value: u32) -> Self {
        Self {
            r: f64::from((value >> 24) & 0xff) / 255.0,
            g: f64::from((value >> 16) & 0xff) / 255.0,
            b: f64::from((value >> 8) & 0xff) / 255.0,
            a: f64::from(value & 0xff) / 255.0,
        }
    }

    /// Convert to a packed 32 bit integer, in the format 0xRRGGBBAA.
    pub fn to_u32_rgba(self) -> u32 {
        ((self.r * 255.0).round() as u32) << 24
            | ((self.g * 255.0).round() as u32) << 16
            | ((self.b * 255.0).round() as u32) << 8
            | (self.a * 255.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_roundtrip() {
        let color = Color::from_u32_rgba(0x3584e4ff);
        assert_eq!(color.to_u32_rgba(), 0x3584e4ff);
        assert_eq!(Color::BLACK.to_u32_rgba(), 0x000000ff);
        assert_eq!(Color::TRANSPARENT.to_u32_rgba(), 0x00000000);
    }
}
