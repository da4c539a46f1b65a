// Imports
use super::elbow::OBSTACLE_MARGIN;
use crate::element::Element;
use crate::snap::LINE_OF_SIGHT_INSET;
use p2d::bounding_volume::{Aabb, BoundingVolume};
use tavla_compose::ext::Vector2Ext;
use tavla_compose::geometry::{self, Side};

/// The gentle curve offsets its midpoint control by at most this many world units.
const GENTLE_CURVE_MAX_OFFSET: f64 = 30.0;

/// Plan curve control points from `start` to `end` around the connected shapes.
///
/// With line of sight the result is a three point gentle curve, the midpoint control
/// offset perpendicular to the segment, away from the connected shape center. Without
/// line of sight the result is four control points routing around an outer corner of
/// the connected bound.
pub fn curved_route_around_obstacles(
    start: na::Vector2<f64>,
    end: na::Vector2<f64>,
    elements: &[Element],
    _excluded_id: Option<&str>,
    start_element_id: Option<&str>,
    target_element_id: Option<&str>,
) -> Vec<na::Vector2<f64>> {
    let find = |id: Option<&str>| {
        id.and_then(|id| elements.iter().find(|e| e.id == id))
            .map(|e| e.world_bounds())
    };
    let start_bounds = find(start_element_id);
    let target_bounds = find(target_element_id);

    let sight_blocked = |bounds: Option<Aabb>| {
        bounds.is_some_and(|b| {
            let interior = b.tightened(LINE_OF_SIGHT_INSET);
            interior.mins[0] < interior.maxs[0]
                && interior.mins[1] < interior.maxs[1]
                && geometry::segment_intersects_aabb(start, end, interior, 0.0)
        })
    };

    if !sight_blocked(start_bounds) && !sight_blocked(target_bounds) {
        if let Some(gentle) = gentle_curve(start, end, start_bounds, target_bounds) {
            return gentle;
        }
    }

    // route around the connected endpoint's bound, preferring the target end
    if let Some(target_bounds) = target_bounds {
        let (routing_point, approach_point) = corner_route(end, start, target_bounds);
        return vec![start, routing_point, approach_point, end];
    }
    if let Some(start_bounds) = start_bounds {
        let (routing_point, approach_point) = corner_route(start, end, start_bounds);
        return vec![start, approach_point, routing_point, end];
    }

    vec![start, (start + end) * 0.5, end]
}

/// The three point gentle curve, or None when its samples still graze a connected shape.
fn gentle_curve(
    start: na::Vector2<f64>,
    end: na::Vector2<f64>,
    start_bounds: Option<Aabb>,
    target_bounds: Option<Aabb>,
) -> Option<Vec<na::Vector2<f64>>> {
    let length = (end - start).magnitude();
    if length == 0.0 {
        return Some(vec![start, start, end]);
    }
    let perp = (end - start).orth_unit();
    let mid = (start + end) * 0.5;

    // bend away from the connected shape center
    let relevant_center = target_bounds
        .or(start_bounds)
        .map(|b| b.center().coords);
    let direction = match relevant_center {
        Some(center) if perp.dot(&(mid - center)) < 0.0 => -1.0,
        _ => 1.0,
    };
    let control = mid + perp * direction * (0.1 * length).min(GENTLE_CURVE_MAX_OFFSET);

    // the curve must not ride along a connected shape edge
    let grazes = |bounds: Option<Aabb>| {
        bounds.is_some_and(|b| {
            let expanded = b.loosened(LINE_OF_SIGHT_INSET);
            (1..=9).any(|i| {
                let t = i as f64 * 0.1;
                let sample = quad_point(start, control, end, t);
                sample[0] >= expanded.mins[0]
                    && sample[0] <= expanded.maxs[0]
                    && sample[1] >= expanded.mins[1]
                    && sample[1] <= expanded.maxs[1]
            })
        })
    };
    if grazes(start_bounds) || grazes(target_bounds) {
        return None;
    }

    Some(vec![start, control, end])
}

fn quad_point(
    p0: na::Vector2<f64>,
    p1: na::Vector2<f64>,
    p2: na::Vector2<f64>,
    t: f64,
) -> na::Vector2<f64> {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

/// The outer routing corner and the orthogonal approach point for a connected endpoint.
fn corner_route(
    anchor: na::Vector2<f64>,
    other: na::Vector2<f64>,
    bounds: Aabb,
) -> (na::Vector2<f64>, na::Vector2<f64>) {
    let side = Side::of_point(bounds, anchor);
    let inflated = bounds.loosened(OBSTACLE_MARGIN);
    let center = bounds.center().coords;
    let approach_point = anchor + side.outward() * OBSTACLE_MARGIN;

    let routing_point = if side.is_horizontal() {
        let x = if side == Side::Left {
            inflated.mins[0]
        } else {
            inflated.maxs[0]
        };
        let y = if other[1] < center[1] {
            inflated.mins[1]
        } else {
            inflated.maxs[1]
        };
        na::vector![x, y]
    } else {
        let y = if side == Side::Top {
            inflated.mins[1]
        } else {
            inflated.maxs[1]
        };
        let x = if other[0] < center[0] {
            inflated.mins[0]
        } else {
            inflated.maxs[0]
        };
        na::vector![x, y]
    };

    (routing_point, approach_point)
}
