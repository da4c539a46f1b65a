// Modules
pub mod connector;

// Re-exports
pub use connector::{ArrowHead, Connection, Connector, ConnectorStyle, ElbowRoute};

// Imports
use p2d::bounding_volume::{Aabb, BoundingVolume};
use serde::{Deserialize, Serialize};
use tavla_compose::Color;
use tavla_compose::ext::AabbExt;
use tavla_compose::geometry;

/// A stable element id, unique within a board.
pub type ElementId = String;

/// Axis-aligned position and size of a box-like element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(default, rename = "box_geometry")]
pub struct BoxGeometry {
    #[serde(rename = "x")]
    pub x: f64,
    #[serde(rename = "y")]
    pub y: f64,
    #[serde(rename = "width")]
    pub width: f64,
    #[serde(rename = "height")]
    pub height: f64,
}

impl BoxGeometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            na::point![self.x, self.y],
            na::point![self.x + self.width, self.y + self.height],
        )
    }

    pub fn center(&self) -> na::Vector2<f64> {
        na::vector![self.x + self.width * 0.5, self.y + self.height * 0.5]
    }

    pub fn set_bounds(&mut self, bounds: Aabb) {
        self.x = bounds.mins[0];
        self.y = bounds.mins[1];
        self.width = bounds.extents()[0];
        self.height = bounds.extents()[1];
    }
}

/// A freehand pen path.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename = "pen_path")]
pub struct PenPath {
    #[serde(rename = "points")]
    pub points: Vec<na::Vector2<f64>>,
    /// Set when the stroke was detected as closed on commit.
    #[serde(rename = "is_closed")]
    pub is_closed: bool,
    #[serde(rename = "fill_color")]
    pub fill_color: Option<Color>,
}

/// Alignment of text inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename = "text_align")]
pub enum TextAlign {
    #[default]
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "center")]
    Center,
    #[serde(rename = "right")]
    Right,
}

/// A text element. Width and height are maintained through the text metrics port
/// whenever the text or the font options change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename = "text_block")]
pub struct TextBlock {
    #[serde(rename = "geometry")]
    pub geometry: BoxGeometry,
    #[serde(rename = "text")]
    pub text: String,
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
    /// Fixed-width text boxes wrap, plain text grows with its content.
    #[serde(rename = "is_text_box")]
    pub is_text_box: bool,
}

/// A frame, grouping the elements whose `frame_id` references it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename = "frame")]
pub struct Frame {
    #[serde(rename = "geometry")]
    pub geometry: BoxGeometry,
    #[serde(rename = "label")]
    pub label: String,
}

/// An ephemeral laser trail. Never selected, faded out by the renderer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename = "laser_trail")]
pub struct LaserTrail {
    #[serde(rename = "points")]
    pub points: Vec<na::Vector2<f64>>,
    /// Milliseconds since engine start, monotonically growing per creation.
    #[serde(rename = "timestamp")]
    pub timestamp: u64,
}

/// A tile, its inner content owned by the host.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename = "tile")]
pub struct Tile {
    #[serde(rename = "geometry")]
    pub geometry: BoxGeometry,
    #[serde(rename = "tile_type")]
    pub tile_type: String,
}

/// The kind-specific part of an element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "body")]
pub enum Body {
    #[serde(rename = "pen")]
    Pen(PenPath),
    #[serde(rename = "line")]
    Line(Connector),
    #[serde(rename = "arrow")]
    Arrow(Connector),
    #[serde(rename = "rectangle")]
    Rectangle(BoxGeometry),
    #[serde(rename = "diamond")]
    Diamond(BoxGeometry),
    #[serde(rename = "ellipse")]
    Ellipse(BoxGeometry),
    #[serde(rename = "text")]
    Text(TextBlock),
    #[serde(rename = "frame")]
    Frame(Frame),
    #[serde(rename = "web_embed")]
    WebEmbed(BoxGeometry),
    #[serde(rename = "laser")]
    Laser(LaserTrail),
    #[serde(rename = "tile")]
    Tile(Tile),
}

/// An element on the board, as exchanged with the element store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "element")]
pub struct Element {
    /// The stable id.
    #[serde(rename = "id")]
    pub id: ElementId,
    /// The layer order. Higher values are drawn on top.
    #[serde(rename = "z")]
    pub z: f64,
    /// Rotation in degrees around the current bounds center. Stored bounds stay axis-aligned.
    #[serde(rename = "rotation")]
    pub rotation: f64,
    #[serde(rename = "stroke_color")]
    pub stroke_color: Color,
    #[serde(rename = "stroke_width")]
    pub stroke_width: f64,
    #[serde(rename = "opacity")]
    pub opacity: f64,
    #[serde(rename = "hidden")]
    pub hidden: bool,
    #[serde(rename = "locked")]
    pub locked: bool,
    /// The id of the containing frame, if any.
    #[serde(rename = "frame_id")]
    pub frame_id: Option<ElementId>,
    #[serde(rename = "group_id")]
    pub group_id: Option<String>,
    /// The kind-specific body.
    #[serde(rename = "body")]
    pub body: Body,
}

impl Element {
    /// A new element with default styling.
    pub fn new(id: impl Into<ElementId>, body: Body) -> Self {
        Self {
            id: id.into(),
            z: 0.0,
            rotation: 0.0,
            stroke_color: Color::BLACK,
            stroke_width: 1.0,
            opacity: 1.0,
            hidden: false,
            locked: false,
            frame_id: None,
            group_id: None,
            body,
        }
    }

    /// Whether the element is a connector (`line` or `arrow`).
    pub fn is_connector(&self) -> bool {
        matches!(self.body, Body::Line(_) | Body::Arrow(_))
    }

    /// Whether the element carries a point sequence.
    pub fn is_path_like(&self) -> bool {
        matches!(
            self.body,
            Body::Pen(_) | Body::Line(_) | Body::Arrow(_) | Body::Laser(_)
        )
    }

    /// Whether connector endpoints can snap to this element.
    pub fn is_snappable(&self) -> bool {
        !self.hidden
            && matches!(
                self.body,
                Body::Rectangle(_)
                    | Body::Diamond(_)
                    | Body::Ellipse(_)
                    | Body::Text(_)
                    | Body::Frame(_)
                    | Body::WebEmbed(_)
                    | Body::Tile(_)
            )
    }

    /// Whether the route planners treat this element as an obstacle.
    pub fn is_obstacle(&self) -> bool {
        !self.hidden && !self.is_path_like()
    }

    /// Whether the element can enter a selection. Lasers never can.
    pub fn is_selectable(&self) -> bool {
        !self.hidden && !self.locked && !matches!(self.body, Body::Laser(_))
    }

    /// The connector body, for `line` and `arrow` elements.
    pub fn connector(&self) -> Option<&Connector> {
        match &self.body {
            Body::Line(connector) | Body::Arrow(connector) => Some(connector),
            _ => None,
        }
    }

    /// The mutable connector body, for `line` and `arrow` elements.
    pub fn connector_mut(&mut self) -> Option<&mut Connector> {
        match &mut self.body {
            Body::Line(connector) | Body::Arrow(connector) => Some(connector),
            _ => None,
        }
    }

    /// The box geometry, for box-like elements.
    pub fn box_geometry(&self) -> Option<&BoxGeometry> {
        match &self.body {
            Body::Rectangle(geometry)
            | Body::Diamond(geometry)
            | Body::Ellipse(geometry)
            | Body::WebEmbed(geometry) => Some(geometry),
            Body::Text(text) => Some(&text.geometry),
            Body::Frame(frame) => Some(&frame.geometry),
            Body::Tile(tile) => Some(&tile.geometry),
            _ => None,
        }
    }

    /// The mutable box geometry, for box-like elements.
    pub fn box_geometry_mut(&mut self) -> Option<&mut BoxGeometry> {
        match &mut self.body {
            Body::Rectangle(geometry)
            | Body::Diamond(geometry)
            | Body::Ellipse(geometry)
            | Body::WebEmbed(geometry) => Some(geometry),
            Body::Text(text) => Some(&mut text.geometry),
            Body::Frame(frame) => Some(&mut frame.geometry),
            Body::Tile(tile) => Some(&mut tile.geometry),
            _ => None,
        }
    }

    /// The point sequence, for path-like elements.
    pub fn points(&self) -> Option<&[na::Vector2<f64>]> {
        match &self.body {
            Body::Pen(path) => Some(&path.points),
            Body::Line(connector) | Body::Arrow(connector) => Some(&connector.points),
            Body::Laser(trail) => Some(&trail.points),
            _ => None,
        }
    }

    /// The mutable point sequence, for path-like elements.
    pub fn points_mut(&mut self) -> Option<&mut Vec<na::Vector2<f64>>> {
        match &mut self.body {
            Body::Pen(path) => Some(&mut path.points),
            Body::Line(connector) | Body::Arrow(connector) => Some(&mut connector.points),
            Body::Laser(trail) => Some(&mut trail.points),
            _ => None,
        }
    }

    /// The stored axis-aligned bounds.
    ///
    /// Rotation never changes the stored bounds, see [Element::world_bounds].
    pub fn bounds(&self) -> Aabb {
        match &self.body {
            Body::Pen(_) | Body::Line(_) | Body::Arrow(_) | Body::Laser(_) => {
                let points = self.points().unwrap_or(&[]);
                let mut bounds = match points.first() {
                    Some(first) => Aabb::new((*first).into(), (*first).into()),
                    None => return Aabb::new_zero(),
                };
                for point in points.iter().skip(1) {
                    bounds.take_point((*point).into());
                }
                bounds.loosened(self.stroke_width * 2.0)
            }
            _ => self
                .box_geometry()
                .map(|geometry| geometry.bounds())
                .unwrap_or_else(Aabb::new_zero),
        }
    }

    /// The axis-aligned envelope of the bounds under the element's rotation.
    pub fn world_bounds(&self) -> Aabb {
        geometry::rotated_envelope(self.bounds(), self.rotation)
    }

    /// The bounds center.
    pub fn center(&self) -> na::Vector2<f64> {
        self.bounds().center().coords
    }

    /// Translate the element by the offset.
    pub fn translate(&mut self, offset: na::Vector2<f64>) {
        if let Some(points) = self.points_mut() {
            for point in points.iter_mut() {
                *point += offset;
            }
        } else if let Some(geometry) = self.box_geometry_mut() {
            geometry.x += offset[0];
            geometry.y += offset[1];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_bounds() {
        let element = Element::new("r1", Body::Rectangle(BoxGeometry::new(10.0, 20.0, 30.0, 40.0)));
        let bounds = element.bounds();
        assert_eq!(bounds.mins, na::point![10.0, 20.0]);
        assert_eq!(bounds.maxs, na::point![40.0, 60.0]);
        assert_eq!(element.center(), na::vector![25.0, 40.0]);
    }

    #[test]
    fn path_bounds_padded_by_stroke() {
        let mut element = Element::new(
            "p1",
            Body::Pen(PenPath {
                points: vec![na::vector![0.0, 0.0], na::vector![10.0, 4.0]],
                ..Default::default()
            }),
        );
        element.stroke_width = 2.0;
        let bounds = element.bounds();
        assert_eq!(bounds.mins, na::point![-4.0, -4.0]);
        assert_eq!(bounds.maxs, na::point![14.0, 8.0]);
    }

    #[test]
    fn world_bounds_under_rotation() {
        let mut element =
            Element::new("r1", Body::Rectangle(BoxGeometry::new(0.0, 0.0, 40.0, 20.0)));
        element.rotation = 90.0;
        let world = element.world_bounds();
        // the envelope of the rotated box swaps the extents around the center
        approx::assert_relative_eq!(world.extents()[0], 20.0, epsilon = 1e-9);
        approx::assert_relative_eq!(world.extents()[1], 40.0, epsilon = 1e-9);
        approx::assert_relative_eq!(world.center().coords, element.center(), epsilon = 1e-9);
    }

    #[test]
    fn connector_element_serde_roundtrip() {
        use crate::element::connector::Connection;
        use tavla_compose::handles::HandlePosition;

        let mut connector = Connector::new_sharp(na::vector![180.0, 130.0], na::vector![300.0, 130.0]);
        connector.start_connection = Some(Connection::new("a", HandlePosition::East));
        connector.style = ConnectorStyle::Elbow;
        let element = Element::new("arrow-1", Body::Arrow(connector));

        let json = serde_json::to_string(&element).unwrap();
        assert!(json.contains("\"e\""));
        let back: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "arrow-1");
        let connector = back.connector().unwrap();
        assert_eq!(connector.style, ConnectorStyle::Elbow);
        assert_eq!(
            connector.start_connection.as_ref().unwrap().position,
            HandlePosition::East
        );
        assert_eq!(connector.points[1], na::vector![300.0, 130.0]);
    }

    #[test]
    fn translate_moves_points_and_boxes() {
        let mut connector = Element::new(
            "c1",
            Body::Arrow(Connector::new_sharp(
                na::vector![0.0, 0.0],
                na::vector![10.0, 0.0],
            )),
        );
        connector.translate(na::vector![5.0, 5.0]);
        assert_eq!(connector.points().unwrap()[0], na::vector![5.0, 5.0]);

        let mut rect = Element::new("r1", Body::Rectangle(BoxGeometry::new(0.0, 0.0, 10.0, 10.0)));
        rect.translate(na::vector![-2.0, 3.0]);
        assert_eq!(rect.box_geometry().unwrap().x, -2.0);
        assert_eq!(rect.box_geometry().unwrap().y, 3.0);
    }
}
