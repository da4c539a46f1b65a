// Imports
use serde::{Deserialize, Serialize};
use tavla_compose::handles::HandlePosition;

/// How a connector's point list is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename = "connector_style")]
pub enum ConnectorStyle {
    /// Straight segments between the points.
    #[default]
    #[serde(rename = "sharp")]
    Sharp,
    /// The points are curve control points (quadratic for three, Catmull-Rom for more).
    #[serde(rename = "curved")]
    Curved,
    /// Orthogonal polyline, no diagonal segments.
    #[serde(rename = "elbow")]
    Elbow,
}

/// The preferred first-segment orientation of an elbow route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename = "elbow_route")]
pub enum ElbowRoute {
    /// First segment vertical.
    #[serde(rename = "vertical")]
    Vertical,
    /// First segment horizontal.
    #[serde(rename = "horizontal")]
    Horizontal,
    /// No preference, the planner decides.
    #[default]
    #[serde(rename = "unset")]
    Unset,
}

/// An anchor tying a connector endpoint to a shape's snap point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "connection")]
pub struct Connection {
    /// The id of the referenced shape.
    #[serde(rename = "element_id")]
    pub element_id: String,
    /// The anchor position on the referenced shape.
    #[serde(rename = "position")]
    pub position: HandlePosition,
}

impl Connection {
    pub fn new(element_id: impl Into<String>, position: HandlePosition) -> Self {
        Self {
            element_id: element_id.into(),
            position,
        }
    }
}

/// An arrow head shape. Not part of the routing contracts, carried through for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "arrow_head")]
pub enum ArrowHead {
    #[serde(rename = "triangle")]
    Triangle,
    #[serde(rename = "bar")]
    Bar,
    #[serde(rename = "dot")]
    Dot,
}

/// The connector-specific part of `line` and `arrow` elements.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename = "connector")]
pub struct Connector {
    /// The geometry of the connector, always at least two entries.
    ///
    /// For sharp and elbow styles these are polyline vertices. For the curved style the
    /// same slot holds curve control points, disambiguated by [Connector::style]. The
    /// renderer and the hit-testing sampler share that interpretation.
    #[serde(rename = "points")]
    pub points: Vec<na::Vector2<f64>>,
    /// How the points are interpreted.
    #[serde(rename = "style")]
    pub style: ConnectorStyle,
    /// The preferred elbow orientation, reset whenever the planner re-routes.
    #[serde(rename = "elbow_route")]
    pub elbow_route: ElbowRoute,
    /// The anchor of the first point, if connected.
    #[serde(rename = "start_connection")]
    pub start_connection: Option<Connection>,
    /// The anchor of the last point, if connected.
    #[serde(rename = "end_connection")]
    pub end_connection: Option<Connection>,
    /// Head shape at the start.
    #[serde(rename = "arrow_start")]
    pub arrow_start: Option<ArrowHead>,
    /// Head shape at the end.
    #[serde(rename = "arrow_end")]
    pub arrow_end: Option<ArrowHead>,
}

impl Connector {
    /// A new sharp two-point connector.
    pub fn new_sharp(start: na::Vector2<f64>, end: na::Vector2<f64>) -> Self {
        Self {
            points: vec![start, end],
            ..Default::default()
        }
    }

    /// The first point. Empty point lists yield the origin.
    pub fn start(&self) -> na::Vector2<f64> {
        self.points.first().copied().unwrap_or_default()
    }

    /// The last point.
    pub fn end(&self) -> na::Vector2<f64> {
        self.points.last().copied().unwrap_or_default()
    }

    /// The connection of the given end.
    pub fn connection(&self, start_end: bool) -> Option<&Connection> {
        if start_end {
            self.start_connection.as_ref()
        } else {
            self.end_connection.as_ref()
        }
    }
}
