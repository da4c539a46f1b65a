// Modules
mod curved;
mod elbow;
pub mod polyline;

// Re-exports
pub use curved::curved_route_around_obstacles;
pub use elbow::{elbow_route_around_obstacles, OBSTACLE_MARGIN};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Body, BoxGeometry, Element};
    use approx::assert_relative_eq;
    use tavla_compose::geometry;

    fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> Element {
        Element::new(id, Body::Rectangle(BoxGeometry::new(x, y, w, h)))
    }

    fn assert_orthogonal(points: &[na::Vector2<f64>]) {
        for w in points.windows(2) {
            let dx = (w[0][0] - w[1][0]).abs();
            let dy = (w[0][1] - w[1][1]).abs();
            assert!(
                dx <= 1e-6 || dy <= 1e-6,
                "diagonal segment {:?} -> {:?}",
                w[0],
                w[1]
            );
        }
    }

    #[test]
    fn unconnected_line_of_sight_stays_straight() {
        let start = na::vector![0.0, 0.0];
        let end = na::vector![200.0, 150.0];
        let route = elbow_route_around_obstacles(start, end, &[], None, None, None);
        assert_eq!(route, vec![start, end]);
    }

    #[test]
    fn unconnected_routes_around_an_obstacle() {
        let elements = vec![rect("o1", 200.0, 100.0, 100.0, 100.0)];
        let start = na::vector![0.0, 150.0];
        let end = na::vector![500.0, 150.0];
        let route = elbow_route_around_obstacles(start, end, &[], None, None, None);
        assert_eq!(route, vec![start, end]);

        let route = elbow_route_around_obstacles(start, end, &elements, None, None, None);
        assert!(route.len() >= 3);
        assert_orthogonal(&route);
        assert_eq!(route[0], start);
        assert_eq!(*route.last().unwrap(), end);
        let obstacle = elements[0].bounds();
        for w in route.windows(2) {
            assert!(!geometry::segment_intersects_aabb(w[0], w[1], obstacle, 0.0));
        }
    }

    #[test]
    fn dual_connection_aligned_exits_route_straight() {
        // two rectangles side by side, anchors facing each other on the same y
        let elements = vec![
            rect("a", 100.0, 100.0, 80.0, 60.0),
            rect("b", 300.0, 100.0, 80.0, 60.0),
        ];
        let route = elbow_route_around_obstacles(
            na::vector![180.0, 130.0],
            na::vector![300.0, 130.0],
            &elements,
            None,
            Some("a"),
            Some("b"),
        );
        assert_eq!(
            route,
            vec![na::vector![180.0, 130.0], na::vector![300.0, 130.0]]
        );
    }

    #[test]
    fn dual_connection_offset_shapes_route_with_mid_split() {
        // the start shape moved down, exits still face each other
        let elements = vec![
            rect("a", 100.0, 260.0, 80.0, 60.0),
            rect("b", 300.0, 100.0, 80.0, 60.0),
        ];
        let route = elbow_route_around_obstacles(
            na::vector![180.0, 290.0],
            na::vector![300.0, 130.0],
            &elements,
            None,
            Some("a"),
            Some("b"),
        );
        assert_eq!(
            route,
            vec![
                na::vector![180.0, 290.0],
                na::vector![240.0, 290.0],
                na::vector![240.0, 130.0],
                na::vector![300.0, 130.0],
            ]
        );
    }

    #[test]
    fn dual_connection_detours_around_a_blocking_shape() {
        let elements = vec![
            rect("a", 100.0, 260.0, 80.0, 60.0),
            rect("b", 300.0, 100.0, 80.0, 60.0),
            rect("c", 220.0, 140.0, 40.0, 120.0),
        ];
        let route = elbow_route_around_obstacles(
            na::vector![180.0, 290.0],
            na::vector![300.0, 130.0],
            &elements,
            None,
            Some("a"),
            Some("b"),
        );
        assert_orthogonal(&route);
        assert_eq!(route[0], na::vector![180.0, 290.0]);
        assert_eq!(*route.last().unwrap(), na::vector![300.0, 130.0]);
        // the detour stays clear of the blocking shape itself
        let blocker = elements[2].bounds();
        for w in route.windows(2) {
            assert!(
                !geometry::segment_intersects_aabb(w[0], w[1], blocker, 0.0),
                "segment {:?} -> {:?} tunnels the blocker",
                w[0],
                w[1]
            );
        }
        // it routes above or below the blocker at the inflated clearance
        let rail_y = route[1][1];
        assert!(rail_y <= 60.0 || rail_y >= 340.0);
    }

    #[test]
    fn self_connection_adjacent_sides_routes_around_the_shared_corner() {
        let elements = vec![rect("a", 100.0, 100.0, 80.0, 60.0)];
        // east anchor to south anchor
        let route = elbow_route_around_obstacles(
            na::vector![180.0, 130.0],
            na::vector![140.0, 160.0],
            &elements,
            Some("arrow"),
            Some("a"),
            Some("a"),
        );
        assert_eq!(route.len(), 5);
        assert_orthogonal(&route);
        let bounds = elements[0].bounds();
        for point in &route[1..route.len() - 1] {
            assert!(
                !(point[0] > bounds.mins[0]
                    && point[0] < bounds.maxs[0]
                    && point[1] > bounds.mins[1]
                    && point[1] < bounds.maxs[1]),
                "interior vertex {point:?} inside the shape"
            );
        }
    }

    #[test]
    fn self_connection_opposite_sides_routes_over_a_perpendicular_side() {
        let elements = vec![rect("a", 100.0, 100.0, 80.0, 60.0)];
        // east anchor to west anchor
        let route = elbow_route_around_obstacles(
            na::vector![180.0, 130.0],
            na::vector![100.0, 130.0],
            &elements,
            Some("arrow"),
            Some("a"),
            Some("a"),
        );
        assert_eq!(route.len(), 6);
        assert_orthogonal(&route);
    }

    #[test]
    fn single_end_connection_in_band_routes_around_the_near_corner() {
        let elements = vec![rect("a", 200.0, 200.0, 80.0, 60.0)];
        // reaching the east anchor from the far west side
        let route = elbow_route_around_obstacles(
            na::vector![50.0, 230.0],
            na::vector![280.0, 230.0],
            &elements,
            None,
            None,
            Some("a"),
        );
        assert_eq!(route.len(), 5);
        assert_orthogonal(&route);
        // the approach into the anchor is orthogonal to the east side
        let len = route.len();
        assert_relative_eq!(route[len - 2][1], 230.0);
        assert!(route[len - 2][0] > 280.0);
    }

    #[test]
    fn single_end_connection_out_of_band_turns_once() {
        let elements = vec![rect("a", 200.0, 200.0, 80.0, 60.0)];
        // reaching the south anchor from outside the expanded band
        let route = elbow_route_around_obstacles(
            na::vector![500.0, 500.0],
            na::vector![240.0, 260.0],
            &elements,
            None,
            None,
            Some("a"),
        );
        assert_eq!(
            route,
            vec![
                na::vector![500.0, 500.0],
                na::vector![240.0, 500.0],
                na::vector![240.0, 260.0],
            ]
        );
    }

    #[test]
    fn curved_line_of_sight_returns_offset_midpoint() {
        let elements = vec![
            rect("a", 100.0, 100.0, 80.0, 60.0),
            rect("b", 400.0, 100.0, 80.0, 60.0),
        ];
        let start = na::vector![180.0, 130.0];
        let end = na::vector![400.0, 130.0];
        let route =
            curved_route_around_obstacles(start, end, &elements, None, Some("a"), Some("b"));
        assert_eq!(route.len(), 3);
        assert_eq!(route[0], start);
        assert_eq!(route[2], end);
        // perpendicular offset of min(0.1 * len, 30) = 22
        let mid = (start + end) * 0.5;
        assert_relative_eq!(route[1][0], mid[0], epsilon = 1e-9);
        assert_relative_eq!((route[1][1] - mid[1]).abs(), 22.0, epsilon = 1e-9);
    }

    #[test]
    fn curved_without_line_of_sight_routes_around_a_corner() {
        let elements = vec![rect("a", 200.0, 200.0, 80.0, 60.0)];
        // reaching the east anchor from the west: the straight segment crosses the shape
        let start = na::vector![50.0, 230.0];
        let end = na::vector![280.0, 230.0];
        let route = curved_route_around_obstacles(start, end, &elements, None, None, Some("a"));
        assert_eq!(route.len(), 4);
        assert_eq!(route[0], start);
        assert_eq!(route[3], end);
        // the approach point sits one margin out from the east side
        assert_relative_eq!(route[2][0], 280.0 + OBSTACLE_MARGIN);
        assert_relative_eq!(route[2][1], 230.0);
        // the routing point is an outer corner of the inflated bound
        assert_relative_eq!(route[1][0], 280.0 + OBSTACLE_MARGIN);
        assert!(route[1][1] == 200.0 - OBSTACLE_MARGIN || route[1][1] == 260.0 + OBSTACLE_MARGIN);
    }
}
