// Imports
use crate::element::{ConnectorStyle, Element, ElementId};
use p2d::bounding_volume::{Aabb, BoundingVolume};
use tavla_compose::geometry::{self, Side};
use tavla_compose::handles::HandlePosition;

/// The snap radius in world units. Interactive call sites divide by the camera zoom.
pub const SNAP_DISTANCE: f64 = 20.0;
/// Edge-sliding snaps are considered up to this factor of the snap distance.
const EDGE_SNAP_FACTOR: f64 = 1.2;
/// Line-of-sight tests run against the target bounds shrunk by this inset, in world units.
pub(crate) const LINE_OF_SIGHT_INSET: f64 = 5.0;

/// A typed snap point on a shape outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapPoint {
    /// The anchor position the point belongs to.
    pub position: HandlePosition,
    /// The point in world coordinates, rotation applied.
    pub pos: na::Vector2<f64>,
}

/// How a snap target was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SnapKind {
    /// One of the four corner snap points.
    Corner,
    /// One of the four edge midpoint snap points.
    EdgeMidpoint,
    /// A free point sliding along the shape outline.
    EdgeSlide,
}

/// The result of a snap search.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapTarget {
    /// The id of the snapped-to element.
    pub element_id: ElementId,
    /// The anchor position written into the connection on commit.
    ///
    /// For edge-sliding snaps this is the nearest typed position.
    pub position: HandlePosition,
    /// The exact snap point in world coordinates.
    pub point: na::Vector2<f64>,
    /// How the target was found.
    pub kind: SnapKind,
    /// Set when the segment from the other endpoint to the snap point crosses the
    /// target's interior. Consumed by the state machine to escalate sharp connectors
    /// to elbow on commit, never to reject the snap.
    pub out_of_line_of_sight: bool,
}

/// The anchor point for the given position on the element, rotation applied.
pub fn anchor_point(element: &Element, position: HandlePosition) -> na::Vector2<f64> {
    let bounds = element.bounds();
    let center = bounds.center().coords;
    let local = local_anchor_point(element, bounds, position);
    geometry::rotate_point_about(local, center, element.rotation)
}

fn local_anchor_point(
    element: &Element,
    bounds: Aabb,
    position: HandlePosition,
) -> na::Vector2<f64> {
    use crate::element::Body;

    let center = bounds.center().coords;
    let half_extents = bounds.half_extents();

    match &element.body {
        Body::Ellipse(_) => match position {
            // cardinal outline points
            HandlePosition::North => center + na::vector![0.0, -half_extents[1]],
            HandlePosition::South => center + na::vector![0.0, half_extents[1]],
            HandlePosition::West => center + na::vector![-half_extents[0], 0.0],
            HandlePosition::East => center + na::vector![half_extents[0], 0.0],
            // the 45 degree outline points stand in for the corners
            corner => {
                let sign = corner.resize_sign();
                let diag = std::f64::consts::FRAC_1_SQRT_2;
                center
                    + na::vector![
                        sign[0] * half_extents[0] * diag,
                        sign[1] * half_extents[1] * diag
                    ]
            }
        },
        Body::Diamond(_) => {
            let vertex = |side: Side| match side {
                Side::Top => na::vector![center[0], bounds.mins[1]],
                Side::Bottom => na::vector![center[0], bounds.maxs[1]],
                Side::Left => na::vector![bounds.mins[0], center[1]],
                Side::Right => na::vector![bounds.maxs[0], center[1]],
            };
            match position {
                // the four diamond vertices
                HandlePosition::North => vertex(Side::Top),
                HandlePosition::South => vertex(Side::Bottom),
                HandlePosition::West => vertex(Side::Left),
                HandlePosition::East => vertex(Side::Right),
                // side midpoints halfway between adjacent vertices
                HandlePosition::NorthEast => (vertex(Side::Top) + vertex(Side::Right)) * 0.5,
                HandlePosition::SouthEast => (vertex(Side::Right) + vertex(Side::Bottom)) * 0.5,
                HandlePosition::SouthWest => (vertex(Side::Bottom) + vertex(Side::Left)) * 0.5,
                HandlePosition::NorthWest => (vertex(Side::Left) + vertex(Side::Top)) * 0.5,
            }
        }
        _ => position.point_in_bounds(bounds),
    }
}

/// The typed snap points of the element: four corners and four edge midpoints,
/// shape-specific for ellipse and diamond. Empty for connectors, pen paths and lasers.
pub fn element_snap_points(element: &Element) -> Vec<SnapPoint> {
    if !element.is_snappable() {
        return Vec::new();
    }
    let bounds = element.bounds();
    let center = bounds.center().coords;

    HandlePosition::ALL
        .into_iter()
        .map(|position| SnapPoint {
            position,
            pos: geometry::rotate_point_about(
                local_anchor_point(element, bounds, position),
                center,
                element.rotation,
            ),
        })
        .collect()
}

/// The nearest point on the element outline to `pos`, used for edge sliding.
pub fn edge_snap_point(element: &Element, pos: na::Vector2<f64>) -> Option<na::Vector2<f64>> {
    use crate::element::Body;

    if !element.is_snappable() {
        return None;
    }
    let bounds = element.bounds();
    let center = bounds.center().coords;
    // work in the unrotated local frame, rotate the result back out
    let local_pos = geometry::rotate_point_about(pos, center, -element.rotation);

    let local = match &element.body {
        Body::Ellipse(_) => {
            let half_extents = bounds.half_extents();
            let dir = local_pos - center;
            if dir.magnitude() == 0.0 {
                center + na::vector![half_extents[0], 0.0]
            } else {
                let theta = dir[1].atan2(dir[0]);
                center + na::vector![half_extents[0] * theta.cos(), half_extents[1] * theta.sin()]
            }
        }
        Body::Diamond(_) => {
            let top = na::vector![center[0], bounds.mins[1]];
            let right = na::vector![bounds.maxs[0], center[1]];
            let bottom = na::vector![center[0], bounds.maxs[1]];
            let left = na::vector![bounds.mins[0], center[1]];

            [(top, right), (right, bottom), (bottom, left), (left, top)]
                .into_iter()
                .map(|(a, b)| geometry::closest_point_on_segment(local_pos, a, b))
                .min_by(|a, b| {
                    (local_pos - a)
                        .magnitude()
                        .total_cmp(&(local_pos - b).magnitude())
                })
                .unwrap()
        }
        _ => {
            let clamped = na::vector![
                local_pos[0].clamp(bounds.mins[0], bounds.maxs[0]),
                local_pos[1].clamp(bounds.mins[1], bounds.maxs[1])
            ];
            // points inside the box are pushed out to the nearest edge
            let dist_left = clamped[0] - bounds.mins[0];
            let dist_right = bounds.maxs[0] - clamped[0];
            let dist_top = clamped[1] - bounds.mins[1];
            let dist_bottom = bounds.maxs[1] - clamped[1];
            let min_dist = dist_left.min(dist_right).min(dist_top).min(dist_bottom);

            if min_dist == dist_left {
                na::vector![bounds.mins[0], clamped[1]]
            } else if min_dist == dist_right {
                na::vector![bounds.maxs[0], clamped[1]]
            } else if min_dist == dist_top {
                na::vector![clamped[0], bounds.mins[1]]
            } else {
                na::vector![clamped[0], bounds.maxs[1]]
            }
        }
    };

    Some(geometry::rotate_point_about(local, center, element.rotation))
}

/// Whether the segment from the other connector endpoint to the snap point stays clear
/// of the target's interior, shrunk by [LINE_OF_SIGHT_INSET].
pub fn is_snap_point_accessible(
    other_endpoint: na::Vector2<f64>,
    snap_point: na::Vector2<f64>,
    target: &Element,
) -> bool {
    let interior = target.world_bounds().tightened(LINE_OF_SIGHT_INSET);
    if interior.mins[0] >= interior.maxs[0] || interior.mins[1] >= interior.maxs[1] {
        return true;
    }
    !geometry::segment_intersects_aabb(other_endpoint, snap_point, interior, 0.0)
}

/// Search the nearest snap target for a connector endpoint at `pos`.
///
/// Typed snap points win within `snap_distance`; edge-sliding snaps are considered at
/// `1.2 x snap_distance` only when no typed point qualifies. Ties break by element
/// order, then corners over edge midpoints, then over edge slides.
pub fn find_nearest_snap_target(
    pos: na::Vector2<f64>,
    elements: &[Element],
    excluded_id: Option<&str>,
    snap_distance: f64,
    connector_style: ConnectorStyle,
    other_endpoint: Option<na::Vector2<f64>>,
) -> Option<SnapTarget> {
    let candidates = elements
        .iter()
        .filter(|e| e.is_snappable() && Some(e.id.as_str()) != excluded_id);

    let mut best: Option<(f64, SnapTarget)> = None;

    for element in candidates.clone() {
        for snap in element_snap_points(element) {
            let dist = (pos - snap.pos).magnitude();
            if dist >= snap_distance {
                continue;
            }
            if best.as_ref().map_or(true, |(best_dist, _)| dist < *best_dist) {
                best = Some((
                    dist,
                    SnapTarget {
                        element_id: element.id.clone(),
                        position: snap.position,
                        point: snap.pos,
                        kind: if snap.position.is_corner() {
                            SnapKind::Corner
                        } else {
                            SnapKind::EdgeMidpoint
                        },
                        out_of_line_of_sight: false,
                    },
                ));
            }
        }
    }

    if best.is_none() {
        for element in candidates {
            let Some(point) = edge_snap_point(element, pos) else {
                continue;
            };
            let dist = (pos - point).magnitude();
            if dist >= snap_distance * EDGE_SNAP_FACTOR {
                continue;
            }
            if best.as_ref().map_or(true, |(best_dist, _)| dist < *best_dist) {
                let position = nearest_typed_position(element, point);
                best = Some((
                    dist,
                    SnapTarget {
                        element_id: element.id.clone(),
                        position,
                        point,
                        kind: SnapKind::EdgeSlide,
                        out_of_line_of_sight: false,
                    },
                ));
            }
        }
    }

    let (_, mut target) = best?;

    if connector_style == ConnectorStyle::Sharp {
        if let Some(other) = other_endpoint {
            let element = elements.iter().find(|e| e.id == target.element_id);
            if let Some(element) = element {
                target.out_of_line_of_sight =
                    !is_snap_point_accessible(other, target.point, element);
            }
        }
    }

    Some(target)
}

fn nearest_typed_position(element: &Element, point: na::Vector2<f64>) -> HandlePosition {
    element_snap_points(element)
        .into_iter()
        .min_by(|a, b| {
            (point - a.pos)
                .magnitude()
                .total_cmp(&(point - b.pos).magnitude())
        })
        .map(|snap| snap.position)
        .unwrap_or(HandlePosition::North)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Body, BoxGeometry, Element};
    use approx::assert_relative_eq;

    fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> Element {
        Element::new(id, Body::Rectangle(BoxGeometry::new(x, y, w, h)))
    }

    #[test]
    fn rectangle_snap_points() {
        let element = rect("r1", 100.0, 100.0, 80.0, 60.0);
        let points = element_snap_points(&element);
        assert_eq!(points.len(), 8);

        let east = points
            .iter()
            .find(|p| p.position == HandlePosition::East)
            .unwrap();
        assert_eq!(east.pos, na::vector![180.0, 130.0]);

        let north_west = points
            .iter()
            .find(|p| p.position == HandlePosition::NorthWest)
            .unwrap();
        assert_eq!(north_west.pos, na::vector![100.0, 100.0]);
    }

    #[test]
    fn diamond_snap_points_on_vertices_and_side_midpoints() {
        let element = Element::new("d1", Body::Diamond(BoxGeometry::new(0.0, 0.0, 100.0, 60.0)));
        let points = element_snap_points(&element);

        let north = points
            .iter()
            .find(|p| p.position == HandlePosition::North)
            .unwrap();
        assert_eq!(north.pos, na::vector![50.0, 0.0]);

        let north_east = points
            .iter()
            .find(|p| p.position == HandlePosition::NorthEast)
            .unwrap();
        assert_eq!(north_east.pos, na::vector![75.0, 15.0]);
    }

    #[test]
    fn ellipse_cardinal_and_diagonal_points() {
        let element = Element::new("e1", Body::Ellipse(BoxGeometry::new(0.0, 0.0, 100.0, 60.0)));
        let points = element_snap_points(&element);

        let east = points
            .iter()
            .find(|p| p.position == HandlePosition::East)
            .unwrap();
        assert_relative_eq!(east.pos[0], 100.0);
        assert_relative_eq!(east.pos[1], 30.0);

        let south_east = points
            .iter()
            .find(|p| p.position == HandlePosition::SouthEast)
            .unwrap();
        assert_relative_eq!(
            south_east.pos[0],
            50.0 + 50.0 * std::f64::consts::FRAC_1_SQRT_2
        );
        assert_relative_eq!(
            south_east.pos[1],
            30.0 + 30.0 * std::f64::consts::FRAC_1_SQRT_2
        );
    }

    #[test]
    fn snap_points_rotate_with_the_element() {
        let mut element = rect("r1", -10.0, -10.0, 20.0, 20.0);
        element.rotation = 90.0;
        let points = element_snap_points(&element);
        let east = points
            .iter()
            .find(|p| p.position == HandlePosition::East)
            .unwrap();
        assert_relative_eq!(east.pos[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(east.pos[1], 10.0, epsilon = 1e-9);
    }

    #[test]
    fn edge_snap_clamps_to_nearest_edge() {
        let element = rect("r1", 0.0, 0.0, 100.0, 50.0);
        // outside the box
        let snapped = edge_snap_point(&element, na::vector![110.0, 20.0]).unwrap();
        assert_eq!(snapped, na::vector![100.0, 20.0]);
        // inside the box, pushed to the nearest edge
        let snapped = edge_snap_point(&element, na::vector![50.0, 45.0]).unwrap();
        assert_eq!(snapped, na::vector![50.0, 50.0]);
    }

    #[test]
    fn nearest_target_prefers_typed_points_over_edge_slides() {
        let elements = vec![rect("r1", 0.0, 0.0, 100.0, 50.0)];
        // close to the east midpoint
        let target = find_nearest_snap_target(
            na::vector![104.0, 28.0],
            &elements,
            None,
            SNAP_DISTANCE,
            ConnectorStyle::Sharp,
            None,
        )
        .unwrap();
        assert_eq!(target.kind, SnapKind::EdgeMidpoint);
        assert_eq!(target.position, HandlePosition::East);
        assert_eq!(target.point, na::vector![100.0, 25.0]);

        // near the edge but away from any typed point: edge slide kicks in
        let target = find_nearest_snap_target(
            na::vector![104.0, 38.0],
            &elements,
            None,
            10.0,
            ConnectorStyle::Sharp,
            None,
        )
        .unwrap();
        assert_eq!(target.kind, SnapKind::EdgeSlide);
        assert_eq!(target.point, na::vector![100.0, 38.0]);
    }

    #[test]
    fn excluded_element_is_skipped() {
        let elements = vec![rect("r1", 0.0, 0.0, 100.0, 50.0)];
        let target = find_nearest_snap_target(
            na::vector![100.0, 25.0],
            &elements,
            Some("r1"),
            SNAP_DISTANCE,
            ConnectorStyle::Sharp,
            None,
        );
        assert!(target.is_none());
    }

    #[test]
    fn line_of_sight_flag_set_when_segment_crosses_target() {
        let elements = vec![rect("a", 200.0, 200.0, 80.0, 60.0)];
        // snapping to the east midpoint while the other endpoint sits far on the west
        let target = find_nearest_snap_target(
            na::vector![281.0, 230.0],
            &elements,
            None,
            SNAP_DISTANCE,
            ConnectorStyle::Sharp,
            Some(na::vector![50.0, 230.0]),
        )
        .unwrap();
        assert_eq!(target.position, HandlePosition::East);
        assert!(target.out_of_line_of_sight);

        // same snap, but the other endpoint is on the east side: clear line of sight
        let target = find_nearest_snap_target(
            na::vector![281.0, 230.0],
            &elements,
            None,
            SNAP_DISTANCE,
            ConnectorStyle::Sharp,
            Some(na::vector![400.0, 230.0]),
        )
        .unwrap();
        assert!(!target.out_of_line_of_sight);
    }
}
