// Imports
use super::StrokeOptions;
use crate::element::{ArrowHead, ConnectorStyle};
use serde::{Deserialize, Serialize};

/// Which connector kind the pen creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename = "connector_kind")]
pub enum ConnectorKind {
    #[serde(rename = "line")]
    Line,
    #[default]
    #[serde(rename = "arrow")]
    Arrow,
}

/// Configuration of the line / arrow pen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename = "connector_config")]
pub struct ConnectorConfig {
    #[serde(rename = "stroke")]
    pub stroke: StrokeOptions,
    #[serde(rename = "kind")]
    pub kind: ConnectorKind,
    #[serde(rename = "connector_style")]
    pub connector_style: ConnectorStyle,
    #[serde(rename = "arrow_start")]
    pub arrow_start: Option<ArrowHead>,
    #[serde(rename = "arrow_end")]
    pub arrow_end: Option<ArrowHead>,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            stroke: StrokeOptions::default(),
            kind: ConnectorKind::default(),
            connector_style: ConnectorStyle::default(),
            arrow_start: None,
            arrow_end: Some(ArrowHead::Triangle),
        }
    }
}
