//! The narrow interfaces the core calls out through. The element store, the
//! collaboration transport, text shaping and tile sizing are all owned by the host.

// Imports
use crate::element::{Connection, ConnectorStyle, ElbowRoute, Element, ElementId, TextAlign};
use std::collections::HashSet;
use tavla_compose::Color;
use thiserror::Error;

/// An error surfaced by the store port. The core logs it and aborts the gesture.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("element `{0}` not found")]
    NotFound(ElementId),
    #[error("store rejected the operation: {0}")]
    Rejected(String),
}

/// A three-state patch for optional element fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldPatch<T> {
    /// Leave the field untouched.
    #[default]
    Keep,
    /// Replace the field value.
    Set(T),
    /// Clear the field.
    Clear,
}

impl<T> FieldPatch<T> {
    /// Apply onto the target field.
    pub fn apply_to(self, target: &mut Option<T>) {
        match self {
            FieldPatch::Keep => {}
            FieldPatch::Set(value) => *target = Some(value),
            FieldPatch::Clear => *target = None,
        }
    }
}

/// A partial element update, sent through [StorePort::update] / [StorePort::batch_update].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Rotation in degrees.
    pub rotation: Option<f64>,
    /// Replacement point sequence for path-like elements.
    pub points: Option<Vec<na::Vector2<f64>>>,
    pub connector_style: Option<ConnectorStyle>,
    pub elbow_route: Option<ElbowRoute>,
    pub start_connection: FieldPatch<Connection>,
    pub end_connection: FieldPatch<Connection>,
    pub is_closed: Option<bool>,
    pub fill_color: Option<Color>,
}

impl ElementPatch {
    /// A patch replacing only the point sequence.
    pub fn from_points(points: Vec<na::Vector2<f64>>) -> Self {
        Self {
            points: Some(points),
            ..Default::default()
        }
    }

    /// Apply the patch onto an element. Hosts with their own records mirror this.
    pub fn apply_to(self, element: &mut Element) {
        if let Some(geometry) = element.box_geometry_mut() {
            if let Some(x) = self.x {
                geometry.x = x;
            }
            if let Some(y) = self.y {
                geometry.y = y;
            }
            if let Some(width) = self.width {
                geometry.width = width;
            }
            if let Some(height) = self.height {
                geometry.height = height;
            }
        }
        if let Some(rotation) = self.rotation {
            element.rotation = rotation;
        }
        if let Some(points) = self.points {
            if let Some(target) = element.points_mut() {
                *target = points;
            }
        }
        if let crate::element::Body::Pen(path) = &mut element.body {
            if let Some(is_closed) = self.is_closed {
                path.is_closed = is_closed;
            }
            if let Some(fill_color) = self.fill_color {
                path.fill_color = Some(fill_color);
            }
        }
        if let Some(connector) = element.connector_mut() {
            if let Some(style) = self.connector_style {
                connector.style = style;
            }
            if let Some(elbow_route) = self.elbow_route {
                connector.elbow_route = elbow_route;
            }
            self.start_connection.apply_to(&mut connector.start_connection);
            self.end_connection.apply_to(&mut connector.end_connection);
        }
    }
}

/// The element store. Single writer and owner of the authoritative element list.
pub trait StorePort: std::fmt::Debug {
    /// The current element snapshot.
    fn elements(&self) -> Vec<Element>;
    /// Ids selected by remote collaborators. Those never enter the local selection.
    fn remotely_selected_ids(&self) -> HashSet<ElementId>;
    /// Insert a new element.
    fn add(&mut self, element: Element) -> Result<(), StoreError>;
    /// Patch a single element.
    fn update(&mut self, id: &str, patch: ElementPatch) -> Result<(), StoreError>;
    /// Patch several elements in one transaction.
    fn batch_update(&mut self, patches: Vec<(ElementId, ElementPatch)>) -> Result<(), StoreError>;
    /// Delete a single element.
    fn delete(&mut self, id: &str) -> Result<(), StoreError>;
    /// Delete several elements in one transaction.
    fn delete_many(&mut self, ids: &[ElementId]) -> Result<(), StoreError>;
    /// A transform gesture is starting; lets the store batch a history entry.
    fn on_start_transform(&mut self);
}

/// The collaboration transport.
pub trait CollabPort: std::fmt::Debug {
    /// Broadcast the local cursor, in world coordinates. At most once per animation frame.
    fn update_cursor(&mut self, x: f64, y: f64);
    /// Broadcast the local selection.
    fn update_selected(&mut self, ids: &[ElementId]);
    /// Broadcast the local viewport.
    fn update_viewport(&mut self, pan: na::Vector2<f64>, zoom: f64);
    /// Broadcast which user is being followed.
    fn update_following_user(&mut self, user_id: Option<&str>);
    /// Broadcast the in-progress drawing element, None when the gesture ends.
    fn update_drawing_element(&mut self, element: Option<&Element>);
}

/// Text measurement, provided by the host's text layout.
pub trait TextMetricsPort: std::fmt::Debug {
    /// The width of the widest single grapheme of the text, in world units.
    fn min_single_char_width(
        &self,
        text: &str,
        font_size: f64,
        font_family: &str,
        letter_spacing: f64,
    ) -> f64;

    /// The height of the text wrapped into the given width, in world units.
    #[allow(clippy::too_many_arguments)]
    fn measure_wrapped_text_height(
        &self,
        text: &str,
        width: f64,
        font_size: f64,
        line_height: f64,
        font_family: &str,
        letter_spacing: f64,
        align: TextAlign,
    ) -> f64;
}

/// Tile sizing, provided by the host's tile registry.
pub trait TileMetricsPort: std::fmt::Debug {
    /// The minimum size a tile of the type can be resized to.
    fn min_tile_size(&self, tile_type: &str) -> na::Vector2<f64>;
    /// The size a freshly created tile of the type gets.
    fn default_tile_size(&self, tile_type: &str) -> na::Vector2<f64>;
}
