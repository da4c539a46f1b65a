//! Connector endpoint and segment reshaping from the select tool.

// Imports
use super::Selector;
use crate::element::{ConnectorStyle, ElbowRoute, Element, ElementId};
use crate::ports::{ElementPatch, FieldPatch};
use crate::router::{self, polyline};
use crate::snap::{self, SnapTarget};
use crate::element::Connection;
use tavla_compose::geometry;

const COORD_EPS: f64 = 1e-6;

/// Which axis a dragged elbow run moves along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DragAxis {
    X,
    Y,
}

/// The kinds of connector point drags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConnectorDragKind {
    /// Drag a collinear run of elbow vertices perpendicular to its segment.
    ElbowSegment {
        axis: DragAxis,
        range: (usize, usize),
    },
    /// Drag a connector endpoint, with snapping and re-routing.
    Endpoint { is_start: bool },
    /// Drag the midpoint of a two point connector, inserting a bend.
    CreateCorner,
    /// Drag the control point of a curved connector.
    CurvedMid,
}

/// The state of an active connector reshape drag.
#[derive(Debug, Clone)]
pub(super) struct ReshapeDrag {
    pub connector_id: ElementId,
    pub kind: ConnectorDragKind,
    /// The connector element as it was at drag start.
    pub original: Element,
    /// The working geometry, live-updated through the store while dragging.
    pub points: Vec<na::Vector2<f64>>,
    pub pending_snap: Option<SnapTarget>,
    /// A sharp endpoint over an out-of-sight snap previews the escalated route; the
    /// style itself only changes on pointer up.
    pub preview_escalated: bool,
    /// The elbow route preference chosen by a corner insertion.
    pub elbow_route: Option<ElbowRoute>,
}

/// Hit-test the reshape handles of a selected connector.
pub(super) fn hit_connector_handle(
    element: &Element,
    pos: na::Vector2<f64>,
    zoom: f64,
) -> Option<ConnectorDragKind> {
    let connector = element.connector()?;
    let points = &connector.points;
    if points.len() < 2 {
        return None;
    }
    let tolerance = Selector::RESIZE_HANDLE_TOLERANCE / zoom;

    if (pos - points[0]).magnitude() <= tolerance {
        return Some(ConnectorDragKind::Endpoint { is_start: true });
    }
    if (pos - points[points.len() - 1]).magnitude() <= tolerance {
        return Some(ConnectorDragKind::Endpoint { is_start: false });
    }

    if points.len() == 2 {
        let mid = (points[0] + points[1]) * 0.5;
        if (pos - mid).magnitude() <= tolerance {
            return Some(ConnectorDragKind::CreateCorner);
        }
        return None;
    }

    if connector.style == ConnectorStyle::Curved {
        if (pos - points[1]).magnitude() <= tolerance {
            return Some(ConnectorDragKind::CurvedMid);
        }
        return None;
    }

    if connector.style == ConnectorStyle::Elbow {
        for (i, w) in points.windows(2).enumerate() {
            if geometry::dist_to_segment(pos, w[0], w[1]) <= tolerance {
                let vertical = (w[0][0] - w[1][0]).abs() <= COORD_EPS;
                let axis = if vertical { DragAxis::X } else { DragAxis::Y };
                let range = collinear_run(points, i, axis);
                return Some(ConnectorDragKind::ElbowSegment { axis, range });
            }
        }
    }

    None
}

/// The contiguous run of vertices sharing the dragged coordinate of segment `i`.
fn collinear_run(points: &[na::Vector2<f64>], i: usize, axis: DragAxis) -> (usize, usize) {
    let coord = |p: na::Vector2<f64>| match axis {
        DragAxis::X => p[0],
        DragAxis::Y => p[1],
    };
    let base = coord(points[i]);
    let mut r0 = i;
    let mut r1 = i + 1;
    while r0 > 0 && (coord(points[r0 - 1]) - base).abs() <= COORD_EPS {
        r0 -= 1;
    }
    while r1 + 1 < points.len() && (coord(points[r1 + 1]) - base).abs() <= COORD_EPS {
        r1 += 1;
    }
    (r0, r1)
}

/// Start a reshape drag on the connector.
pub(super) fn begin_drag(element: &Element, kind: ConnectorDragKind) -> ReshapeDrag {
    let mut points = element
        .connector()
        .map(|c| c.points.clone())
        .unwrap_or_default();
    let mut kind = kind;

    // an edge drag touching an anchored endpoint duplicates it first, so the
    // endpoint itself stays put while the edge moves away
    if let ConnectorDragKind::ElbowSegment { range, .. } = &mut kind {
        if range.0 == 0 {
            points.insert(0, points[0]);
            range.0 += 1;
            range.1 += 1;
        }
        if range.1 == points.len() - 1 {
            points.push(points[points.len() - 1]);
        }
    }

    ReshapeDrag {
        connector_id: element.id.clone(),
        kind,
        original: element.clone(),
        points,
        pending_snap: None,
        preview_escalated: false,
        elbow_route: None,
    }
}

impl ReshapeDrag {
    fn original_style(&self) -> ConnectorStyle {
        self.original
            .connector()
            .map(|c| c.style)
            .unwrap_or_default()
    }

    fn other_connection_id(&self, is_start: bool) -> Option<&str> {
        self.original
            .connector()
            .and_then(|c| c.connection(!is_start))
            .map(|c| c.element_id.as_str())
    }

    /// Apply a pointer move to the working geometry.
    pub(super) fn apply_move(
        &mut self,
        pos: na::Vector2<f64>,
        elements: &[Element],
        zoom: f64,
    ) {
        match self.kind.clone() {
            ConnectorDragKind::ElbowSegment { axis, range } => {
                for i in range.0..=range.1 {
                    match axis {
                        DragAxis::X => self.points[i][0] = pos[0],
                        DragAxis::Y => self.points[i][1] = pos[1],
                    }
                }
            }
            ConnectorDragKind::CurvedMid => {
                self.points[1] = pos;
            }
            ConnectorDragKind::CreateCorner => {
                let (p0, p2) = {
                    let connector = self.original.connector().unwrap();
                    (connector.start(), connector.end())
                };
                match self.original_style() {
                    ConnectorStyle::Curved => {
                        self.points = vec![p0, pos, p2];
                    }
                    ConnectorStyle::Elbow => {
                        let mid = (p0 + p2) * 0.5;
                        let delta = pos - mid;
                        if delta[0].abs() >= delta[1].abs() {
                            self.points = vec![
                                p0,
                                na::vector![pos[0], p0[1]],
                                na::vector![pos[0], p2[1]],
                                p2,
                            ];
                            self.elbow_route = Some(ElbowRoute::Horizontal);
                        } else {
                            self.points = vec![
                                p0,
                                na::vector![p0[0], pos[1]],
                                na::vector![p2[0], pos[1]],
                                p2,
                            ];
                            self.elbow_route = Some(ElbowRoute::Vertical);
                        }
                    }
                    ConnectorStyle::Sharp => {
                        self.points = vec![p0, pos, p2];
                    }
                }
            }
            ConnectorDragKind::Endpoint { is_start } => {
                self.apply_endpoint_move(is_start, pos, elements, zoom);
            }
        }
    }

    fn apply_endpoint_move(
        &mut self,
        is_start: bool,
        pos: na::Vector2<f64>,
        elements: &[Element],
        zoom: f64,
    ) {
        let style = self.original_style();
        let original_points = &self.original.connector().unwrap().points;
        let other = if is_start {
            *original_points.last().unwrap()
        } else {
            original_points[0]
        };
        let other_conn_id = self.other_connection_id(is_start).map(str::to_owned);

        let snap = snap::find_nearest_snap_target(
            pos,
            elements,
            Some(self.connector_id.as_str()),
            snap::SNAP_DISTANCE / zoom,
            style,
            Some(other),
        );
        self.pending_snap = snap.clone();

        let connector_id = self.connector_id.clone();
        let fixed_conn_id = other_conn_id.clone();
        let route_to = move |target: na::Vector2<f64>, target_id: Option<&str>| {
            // routed from the fixed end towards the dragged one, reversed for start drags
            let mut route = router::elbow_route_around_obstacles(
                other,
                target,
                elements,
                Some(connector_id.as_str()),
                fixed_conn_id.as_deref(),
                target_id,
            );
            if is_start {
                route.reverse();
            }
            route
        };

        match style {
            ConnectorStyle::Elbow => {
                if let Some(snap) = &snap {
                    self.points = route_to(snap.point, Some(snap.element_id.as_str()));
                } else if other_conn_id.is_some() {
                    // still routed, so the polyline keeps exiting orthogonal to the
                    // connected side instead of riding along it
                    self.points = route_to(pos, None);
                } else {
                    self.move_endpoint_preserving_axis(is_start, pos);
                }
            }
            ConnectorStyle::Sharp => {
                if let Some(snap) = &snap {
                    if snap.out_of_line_of_sight {
                        self.preview_escalated = true;
                        self.points = route_to(snap.point, Some(snap.element_id.as_str()));
                    } else {
                        self.preview_escalated = false;
                        self.set_endpoint(is_start, snap.point);
                    }
                } else {
                    self.preview_escalated = false;
                    self.set_endpoint(is_start, pos);
                }
            }
            ConnectorStyle::Curved => {
                let target = snap.as_ref().map(|s| s.point).unwrap_or(pos);
                let target_id = snap.as_ref().map(|s| s.element_id.as_str());
                let (start_pt, end_pt, start_id, end_id) = if is_start {
                    (target, other, target_id, other_conn_id.as_deref())
                } else {
                    (other, target, other_conn_id.as_deref(), target_id)
                };
                self.points = router::curved_route_around_obstacles(
                    start_pt,
                    end_pt,
                    elements,
                    Some(self.connector_id.as_str()),
                    start_id,
                    end_id,
                );
            }
        }
    }

    fn set_endpoint(&mut self, is_start: bool, pos: na::Vector2<f64>) {
        let last = self.points.len() - 1;
        if is_start {
            self.points[0] = pos;
        } else {
            self.points[last] = pos;
        }
    }

    /// Move an elbow endpoint and adjust the adjacent vertex so the neighboring
    /// segment keeps its axis.
    fn move_endpoint_preserving_axis(&mut self, is_start: bool, pos: na::Vector2<f64>) {
        let last = self.points.len() - 1;
        let (endpoint_idx, adjacent_idx) = if is_start { (0, 1) } else { (last, last - 1) };
        let old_endpoint = self.points[endpoint_idx];
        let adjacent = self.points[adjacent_idx];
        let was_horizontal = (old_endpoint[1] - adjacent[1]).abs() <= COORD_EPS;

        self.points[endpoint_idx] = pos;
        if self.points.len() > 2 {
            if was_horizontal {
                self.points[adjacent_idx][1] = pos[1];
            } else {
                self.points[adjacent_idx][0] = pos[0];
            }
        }
    }

    /// The patch committed on pointer up.
    pub(super) fn commit(mut self, zoom: f64) -> ElementPatch {
        let mut patch = ElementPatch::default();

        match &self.kind {
            ConnectorDragKind::Endpoint { is_start } => {
                let connection_patch = match &self.pending_snap {
                    Some(snap) => {
                        if self.preview_escalated
                            && self.original_style() == ConnectorStyle::Sharp
                        {
                            patch.connector_style = Some(ConnectorStyle::Elbow);
                            patch.elbow_route = Some(ElbowRoute::Unset);
                        }
                        FieldPatch::Set(Connection::new(snap.element_id.clone(), snap.position))
                    }
                    None => FieldPatch::Clear,
                };
                if *is_start {
                    patch.start_connection = connection_patch;
                } else {
                    patch.end_connection = connection_patch;
                }
            }
            ConnectorDragKind::ElbowSegment { .. } => {
                // collinear cleanup once the route carries no diagonal segment
                let eps = 0.5 / zoom;
                if !polyline::has_diagonal(&self.points, eps) {
                    self.points = polyline::simplify_collinear(self.points, eps);
                }
            }
            ConnectorDragKind::CreateCorner => {
                if let Some(route) = self.elbow_route {
                    patch.elbow_route = Some(route);
                }
            }
            ConnectorDragKind::CurvedMid => {}
        }

        patch.points = Some(polyline::dedup_consecutive(self.points, 1e-9));
        patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Body, BoxGeometry, Connector};

    fn elbow_connector(points: Vec<na::Vector2<f64>>) -> Element {
        let mut connector = Connector::new_sharp(na::vector![0.0, 0.0], na::vector![0.0, 0.0]);
        connector.style = ConnectorStyle::Elbow;
        connector.points = points;
        Element::new("arrow", Body::Arrow(connector))
    }

    #[test]
    fn segment_hit_captures_the_collinear_run() {
        let element = elbow_connector(vec![
            na::vector![0.0, 0.0],
            na::vector![100.0, 0.0],
            na::vector![100.0, 50.0],
            na::vector![100.0, 120.0],
            na::vector![200.0, 120.0],
        ]);
        // hit the vertical segment chain at x = 100
        let kind = hit_connector_handle(&element, na::vector![102.0, 60.0], 1.0).unwrap();
        assert_eq!(
            kind,
            ConnectorDragKind::ElbowSegment {
                axis: DragAxis::X,
                range: (1, 3),
            }
        );
    }

    #[test]
    fn edge_drag_moves_the_run_and_keeps_endpoints() {
        let element = elbow_connector(vec![
            na::vector![0.0, 0.0],
            na::vector![100.0, 0.0],
            na::vector![100.0, 120.0],
            na::vector![200.0, 120.0],
        ]);
        let kind = hit_connector_handle(&element, na::vector![99.0, 60.0], 1.0).unwrap();
        let mut drag = begin_drag(&element, kind);
        drag.apply_move(na::vector![140.0, 60.0], &[], 1.0);

        assert_eq!(drag.points[0], na::vector![0.0, 0.0]);
        assert_eq!(*drag.points.last().unwrap(), na::vector![200.0, 120.0]);
        // the vertical run moved to the cursor x
        assert!(drag
            .points
            .iter()
            .any(|p| (p[0] - 140.0).abs() < 1e-9));
        // still orthogonal
        for w in drag.points.windows(2) {
            assert!((w[0][0] - w[1][0]).abs() < 1e-9 || (w[0][1] - w[1][1]).abs() < 1e-9);
        }
    }

    #[test]
    fn elbow_commit_simplifies_collinear_runs() {
        let element = elbow_connector(vec![
            na::vector![0.0, 0.0],
            na::vector![50.0, 0.0],
            na::vector![100.0, 0.0],
            na::vector![100.0, 80.0],
        ]);
        let drag = begin_drag(
            &element,
            ConnectorDragKind::ElbowSegment {
                axis: DragAxis::Y,
                range: (1, 2),
            },
        );
        let patch = drag.commit(1.0);
        let points = patch.points.unwrap();
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn sharp_endpoint_on_out_of_sight_snap_escalates_on_commit_only() {
        let shape = Element::new("a", Body::Rectangle(BoxGeometry::new(200.0, 200.0, 80.0, 60.0)));
        let mut connector = Connector::new_sharp(na::vector![50.0, 230.0], na::vector![150.0, 230.0]);
        connector.style = ConnectorStyle::Sharp;
        let arrow = Element::new("arrow", Body::Arrow(connector));
        let elements = vec![shape, arrow.clone()];

        let mut drag = begin_drag(&arrow, ConnectorDragKind::Endpoint { is_start: false });
        // drag the end onto the far side of the shape
        drag.apply_move(na::vector![281.0, 230.0], &elements, 1.0);

        assert!(drag.preview_escalated);
        assert!(drag.points.len() > 2);
        let patch = drag.commit(1.0);
        assert_eq!(patch.connector_style, Some(ConnectorStyle::Elbow));
        assert_eq!(patch.elbow_route, Some(ElbowRoute::Unset));
        assert!(matches!(patch.end_connection, FieldPatch::Set(_)));
    }

    #[test]
    fn snap_unsnap_snap_returns_to_the_in_sight_state() {
        let shape = Element::new("a", Body::Rectangle(BoxGeometry::new(200.0, 200.0, 80.0, 60.0)));
        let connector = Connector::new_sharp(na::vector![50.0, 230.0], na::vector![150.0, 230.0]);
        let arrow = Element::new("arrow", Body::Arrow(connector));
        let elements = vec![shape, arrow.clone()];

        // snap onto the in-sight west anchor
        let mut drag = begin_drag(&arrow, ConnectorDragKind::Endpoint { is_start: false });
        drag.apply_move(na::vector![201.0, 230.0], &elements, 1.0);
        assert!(!drag.preview_escalated);
        let first_patch = drag.commit(1.0);

        // drag away, then back to the same anchor
        let mut drag = begin_drag(&arrow, ConnectorDragKind::Endpoint { is_start: false });
        drag.apply_move(na::vector![120.0, 120.0], &elements, 1.0);
        let away_patch = drag.commit(1.0);
        assert!(matches!(away_patch.end_connection, FieldPatch::Clear));

        let mut drag = begin_drag(&arrow, ConnectorDragKind::Endpoint { is_start: false });
        drag.apply_move(na::vector![201.0, 230.0], &elements, 1.0);
        let second_patch = drag.commit(1.0);

        assert_eq!(first_patch.points, second_patch.points);
        assert_eq!(first_patch.end_connection, second_patch.end_connection);
        assert_eq!(second_patch.connector_style, None);
    }

    #[test]
    fn endpoint_release_without_snap_clears_the_connection() {
        let arrow = elbow_connector(vec![
            na::vector![0.0, 0.0],
            na::vector![100.0, 0.0],
            na::vector![100.0, 80.0],
        ]);
        let mut drag = begin_drag(&arrow, ConnectorDragKind::Endpoint { is_start: false });
        drag.apply_move(na::vector![140.0, 90.0], &[], 1.0);
        let patch = drag.commit(1.0);
        assert!(matches!(patch.end_connection, FieldPatch::Clear));
    }
}
