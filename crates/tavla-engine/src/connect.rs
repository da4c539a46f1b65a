//! The connected-arrow follow-up pass: rewrites connector geometry whenever attached
//! shapes move, resize or rotate, escalating sharp connectors to elbow when a straight
//! line would tunnel a shape.

// Imports
use crate::element::{Connector, ConnectorStyle, ElbowRoute, Element, ElementId};
use crate::router;
use crate::snap;
use std::collections::HashSet;
use tavla_compose::geometry;

/// A geometry rewrite for one connector attached to a moved shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorUpdate {
    /// The connector element id.
    pub id: ElementId,
    /// The rewritten geometry.
    pub points: Vec<na::Vector2<f64>>,
    /// Present when the rewrite decides the style (kept sharp or escalated to elbow).
    pub style: Option<ConnectorStyle>,
    /// Set when the planner re-routed and the elbow route preference is stale.
    pub clear_elbow_route: bool,
}

impl ConnectorUpdate {
    /// Apply the update to the element.
    pub fn apply_to(&self, element: &mut Element) {
        if let Some(connector) = element.connector_mut() {
            connector.points = self.points.clone();
            if let Some(style) = self.style {
                connector.style = style;
            }
            if self.clear_elbow_route {
                connector.elbow_route = ElbowRoute::Unset;
            }
        }
    }
}

/// Compute the follow-up updates for every connector referencing a moved element.
///
/// Pure over the element snapshot: the same input yields the same output, and applying
/// the result before calling again yields identical geometry.
pub fn connected_connector_updates(
    moved_ids: &HashSet<ElementId>,
    elements: &[Element],
) -> Vec<ConnectorUpdate> {
    let mut updates = Vec::new();

    for element in elements {
        let Some(connector) = element.connector() else {
            continue;
        };
        if connector.points.len() < 2 {
            // contract violation, never mutate
            tracing::warn!(
                "Skipping connected-arrow update for connector `{}` with fewer than two points.",
                element.id
            );
            continue;
        }

        let start_moved = connector
            .start_connection
            .as_ref()
            .is_some_and(|c| moved_ids.contains(&c.element_id));
        let end_moved = connector
            .end_connection
            .as_ref()
            .is_some_and(|c| moved_ids.contains(&c.element_id));
        if !start_moved && !end_moved {
            continue;
        }

        if let Some(update) = rewrite_connector(element, connector, elements, start_moved, end_moved)
        {
            updates.push(update);
        }
    }

    updates
}

fn rewrite_connector(
    element: &Element,
    connector: &Connector,
    elements: &[Element],
    start_moved: bool,
    end_moved: bool,
) -> Option<ConnectorUpdate> {
    // recompute anchored endpoints; a connection to a deleted shape keeps its last point
    let resolve = |connection: Option<&crate::element::Connection>,
                   current: na::Vector2<f64>| {
        connection
            .and_then(|c| {
                elements
                    .iter()
                    .find(|e| e.id == c.element_id)
                    .map(|e| snap::anchor_point(e, c.position))
            })
            .unwrap_or(current)
    };
    let new_start = resolve(connector.start_connection.as_ref(), connector.start());
    let new_end = resolve(connector.end_connection.as_ref(), connector.end());

    let start_element_id = connector
        .start_connection
        .as_ref()
        .map(|c| c.element_id.as_str());
    let end_element_id = connector
        .end_connection
        .as_ref()
        .map(|c| c.element_id.as_str());
    let is_self_connection =
        start_element_id.is_some() && start_element_id == end_element_id;

    let reroute_elbow = || {
        router::elbow_route_around_obstacles(
            new_start,
            new_end,
            elements,
            Some(element.id.as_str()),
            start_element_id,
            end_element_id,
        )
    };

    match connector.style {
        ConnectorStyle::Elbow => Some(ConnectorUpdate {
            id: element.id.clone(),
            points: reroute_elbow(),
            style: None,
            clear_elbow_route: true,
        }),
        ConnectorStyle::Curved => Some(ConnectorUpdate {
            id: element.id.clone(),
            points: router::curved_route_around_obstacles(
                new_start,
                new_end,
                elements,
                Some(element.id.as_str()),
                start_element_id,
                end_element_id,
            ),
            style: None,
            clear_elbow_route: true,
        }),
        ConnectorStyle::Sharp if connector.points.len() == 2 => {
            if is_self_connection {
                return Some(ConnectorUpdate {
                    id: element.id.clone(),
                    points: reroute_elbow(),
                    style: Some(ConnectorStyle::Elbow),
                    clear_elbow_route: true,
                });
            }
            if straight_has_line_of_sight(element, elements, new_start, new_end) {
                Some(ConnectorUpdate {
                    id: element.id.clone(),
                    points: vec![new_start, new_end],
                    style: Some(ConnectorStyle::Sharp),
                    clear_elbow_route: false,
                })
            } else {
                Some(ConnectorUpdate {
                    id: element.id.clone(),
                    points: reroute_elbow(),
                    style: Some(ConnectorStyle::Elbow),
                    clear_elbow_route: true,
                })
            }
        }
        ConnectorStyle::Sharp => {
            if is_self_connection {
                return Some(ConnectorUpdate {
                    id: element.id.clone(),
                    points: reroute_elbow(),
                    style: Some(ConnectorStyle::Elbow),
                    clear_elbow_route: true,
                });
            }
            // bent sharp connector: move the anchored endpoints, keep the bends
            let mut points = connector.points.clone();
            if start_moved {
                points[0] = new_start;
            }
            if end_moved {
                let last = points.len() - 1;
                points[last] = new_end;
            }

            // escalate when a segment adjacent to a moved endpoint now tunnels a shape
            let mut tunnels = false;
            if start_moved {
                tunnels |= !segment_clear(element, elements, points[0], points[1]);
            }
            if end_moved {
                let last = points.len() - 1;
                tunnels |= !segment_clear(element, elements, points[last - 1], points[last]);
            }

            if tunnels {
                Some(ConnectorUpdate {
                    id: element.id.clone(),
                    points: reroute_elbow(),
                    style: Some(ConnectorStyle::Elbow),
                    clear_elbow_route: true,
                })
            } else {
                Some(ConnectorUpdate {
                    id: element.id.clone(),
                    points,
                    style: None,
                    clear_elbow_route: false,
                })
            }
        }
    }
}

/// Whether the straight segment stays clear of every shape not connected to the connector.
fn straight_has_line_of_sight(
    connector_element: &Element,
    elements: &[Element],
    start: na::Vector2<f64>,
    end: na::Vector2<f64>,
) -> bool {
    segment_clear(connector_element, elements, start, end)
}

fn segment_clear(
    connector_element: &Element,
    elements: &[Element],
    a: na::Vector2<f64>,
    b: na::Vector2<f64>,
) -> bool {
    let connected: [Option<&str>; 2] = match connector_element.connector() {
        Some(connector) => [
            connector
                .start_connection
                .as_ref()
                .map(|c| c.element_id.as_str()),
            connector
                .end_connection
                .as_ref()
                .map(|c| c.element_id.as_str()),
        ],
        None => [None, None],
    };

    elements
        .iter()
        .filter(|e| {
            e.is_obstacle()
                && e.id != connector_element.id
                && !connected.contains(&Some(e.id.as_str()))
        })
        .all(|e| !geometry::segment_intersects_aabb(a, b, e.world_bounds(), 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Body, BoxGeometry, Connection, Element};
    use approx::assert_relative_eq;
    use tavla_compose::handles::HandlePosition;

    fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> Element {
        Element::new(id, Body::Rectangle(BoxGeometry::new(x, y, w, h)))
    }

    fn connected_arrow(id: &str, start_id: &str, end_id: &str) -> Element {
        let mut connector = Connector::new_sharp(na::vector![0.0, 0.0], na::vector![0.0, 0.0]);
        connector.start_connection = Some(Connection::new(start_id, HandlePosition::East));
        connector.end_connection = Some(Connection::new(end_id, HandlePosition::West));
        Element::new(id, Body::Arrow(connector))
    }

    fn moved(ids: &[&str]) -> HashSet<ElementId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn moved_shape_keeps_sharp_arrow_with_line_of_sight() {
        let a = rect("a", 100.0, 260.0, 80.0, 60.0);
        let b = rect("b", 300.0, 100.0, 80.0, 60.0);
        let arrow = connected_arrow("arrow", "a", "b");
        let elements = vec![a, b, arrow];

        let updates = connected_connector_updates(&moved(&["a"]), &elements);
        assert_eq!(updates.len(), 1);
        let update = &updates[0];
        assert_eq!(update.id, "arrow");
        assert_eq!(update.style, Some(ConnectorStyle::Sharp));
        assert_eq!(
            update.points,
            vec![na::vector![180.0, 290.0], na::vector![300.0, 130.0]]
        );
    }

    #[test]
    fn tunneling_straight_arrow_escalates_to_elbow() {
        let a = rect("a", 100.0, 260.0, 80.0, 60.0);
        let b = rect("b", 300.0, 100.0, 80.0, 60.0);
        let c = rect("c", 220.0, 140.0, 40.0, 120.0);
        let arrow = connected_arrow("arrow", "a", "b");
        let elements = vec![a, b, c, arrow];

        let updates = connected_connector_updates(&moved(&["a"]), &elements);
        assert_eq!(updates.len(), 1);
        let update = &updates[0];
        assert_eq!(update.style, Some(ConnectorStyle::Elbow));
        assert!(update.clear_elbow_route);
        assert_eq!(update.points[0], na::vector![180.0, 290.0]);
        assert_eq!(*update.points.last().unwrap(), na::vector![300.0, 130.0]);
        // no diagonal segments in the escalated route
        for w in update.points.windows(2) {
            assert!((w[0][0] - w[1][0]).abs() <= 1e-6 || (w[0][1] - w[1][1]).abs() <= 1e-6);
        }
    }

    #[test]
    fn anchored_endpoint_matches_snap_point_after_update() {
        let a = rect("a", 100.0, 260.0, 80.0, 60.0);
        let b = rect("b", 300.0, 100.0, 80.0, 60.0);
        let arrow = connected_arrow("arrow", "a", "b");
        let elements = vec![a, b, arrow];

        let updates = connected_connector_updates(&moved(&["a", "b"]), &elements);
        let update = &updates[0];
        let expected_start = snap::anchor_point(&elements[0], HandlePosition::East);
        let expected_end = snap::anchor_point(&elements[1], HandlePosition::West);
        assert_relative_eq!(update.points[0], expected_start, epsilon = 1e-6);
        assert_relative_eq!(*update.points.last().unwrap(), expected_end, epsilon = 1e-6);
    }

    #[test]
    fn self_connected_sharp_arrow_always_escalates() {
        let a = rect("a", 100.0, 100.0, 80.0, 60.0);
        let mut arrow = connected_arrow("arrow", "a", "a");
        if let Some(connector) = arrow.connector_mut() {
            connector.end_connection = Some(Connection::new("a", HandlePosition::South));
        }
        let elements = vec![a, arrow];

        let updates = connected_connector_updates(&moved(&["a"]), &elements);
        let update = &updates[0];
        assert_eq!(update.style, Some(ConnectorStyle::Elbow));
        assert!(update.points.len() >= 5);
    }

    #[test]
    fn bent_sharp_arrow_moves_only_the_anchored_endpoint() {
        let a = rect("a", 0.0, 0.0, 40.0, 40.0);
        let mut arrow = connected_arrow("arrow", "a", "missing-no-conn");
        if let Some(connector) = arrow.connector_mut() {
            connector.start_connection = Some(Connection::new("a", HandlePosition::East));
            connector.end_connection = None;
            connector.points = vec![
                na::vector![40.0, 20.0],
                na::vector![200.0, 20.0],
                na::vector![200.0, 200.0],
            ];
        }
        let mut elements = vec![a, arrow];

        // move the shape and its stored geometry, then run the follow-up
        elements[0].translate(na::vector![0.0, 30.0]);
        let updates = connected_connector_updates(&moved(&["a"]), &elements);
        let update = &updates[0];
        assert_eq!(update.style, None);
        assert_eq!(update.points[0], na::vector![40.0, 50.0]);
        // the bend and the free endpoint stay in place
        assert_eq!(update.points[1], na::vector![200.0, 20.0]);
        assert_eq!(update.points[2], na::vector![200.0, 200.0]);
    }

    #[test]
    fn updates_are_idempotent() {
        let a = rect("a", 100.0, 260.0, 80.0, 60.0);
        let b = rect("b", 300.0, 100.0, 80.0, 60.0);
        let arrow = connected_arrow("arrow", "a", "b");
        let mut elements = vec![a, b, arrow];
        let moved_set = moved(&["a"]);

        let first = connected_connector_updates(&moved_set, &elements);
        for update in &first {
            let element = elements.iter_mut().find(|e| e.id == update.id).unwrap();
            update.apply_to(element);
        }
        let second = connected_connector_updates(&moved_set, &elements);
        assert_eq!(first[0].points, second[0].points);
    }

    #[test]
    fn connection_to_deleted_shape_keeps_last_points() {
        let a = rect("a", 100.0, 100.0, 80.0, 60.0);
        let mut arrow = connected_arrow("arrow", "a", "gone");
        if let Some(connector) = arrow.connector_mut() {
            connector.points = vec![na::vector![180.0, 130.0], na::vector![400.0, 130.0]];
        }
        let elements = vec![a, arrow];

        let updates = connected_connector_updates(&moved(&["a", "gone"]), &elements);
        let update = &updates[0];
        // the end anchored to the deleted shape retains its last point
        assert_eq!(*update.points.last().unwrap(), na::vector![400.0, 130.0]);
        assert_eq!(update.points[0], na::vector![180.0, 130.0]);
    }
}
