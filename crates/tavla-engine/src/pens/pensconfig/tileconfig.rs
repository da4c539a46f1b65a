// Imports
use serde::{Deserialize, Serialize};

/// Configuration of the tile pen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename = "tile_config")]
pub struct TileConfig {
    /// The tile type created on pointer down, resolved by the tile metrics port.
    #[serde(rename = "selected_tile_type")]
    pub selected_tile_type: String,
    /// The note style forwarded to the host for note tiles.
    #[serde(rename = "selected_note_style")]
    pub selected_note_style: String,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            selected_tile_type: String::from("note"),
            selected_note_style: String::from("square"),
        }
    }
}
