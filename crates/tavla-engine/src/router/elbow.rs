// Imports
use super::polyline;
use crate::element::Element;
use p2d::bounding_volume::{Aabb, BoundingVolume};
use tavla_compose::ext::AabbExt;
use tavla_compose::geometry::{self, Side};

/// Clearance kept around obstacles, in world units.
pub const OBSTACLE_MARGIN: f64 = 80.0;
/// Clearance around the shape for self-connection routes.
const SELF_ROUTE_MARGIN: f64 = 40.0;
/// Preferred exit distance from a connected side.
const PREFERRED_EXIT_MARGIN: f64 = 40.0;
/// Exit distance never drops below this, even for narrow inter-shape gaps.
const MIN_EXIT_MARGIN: f64 = 20.0;

const SIMPLIFY_EPS: f64 = 1e-6;

/// Plan an orthogonal polyline from `start` to `end` around the other elements.
///
/// `excluded_id` is the connector being routed, `start_element_id`/`target_element_id`
/// the shapes the endpoints are connected to, if any. The result carries no diagonal
/// segments except for the unconnected line-of-sight case, which stays a plain two
/// point segment.
pub fn elbow_route_around_obstacles(
    start: na::Vector2<f64>,
    end: na::Vector2<f64>,
    elements: &[Element],
    excluded_id: Option<&str>,
    start_element_id: Option<&str>,
    target_element_id: Option<&str>,
) -> Vec<na::Vector2<f64>> {
    let find = |id: Option<&str>| {
        id.and_then(|id| elements.iter().find(|e| e.id == id))
            .map(|e| e.world_bounds())
    };
    let start_bounds = find(start_element_id);
    let target_bounds = find(target_element_id);

    let obstacles: Vec<Aabb> = elements
        .iter()
        .filter(|e| {
            e.is_obstacle()
                && Some(e.id.as_str()) != excluded_id
                && Some(e.id.as_str()) != start_element_id
                && Some(e.id.as_str()) != target_element_id
        })
        .map(|e| e.world_bounds().loosened(OBSTACLE_MARGIN))
        .collect();

    let route = match (start_bounds, target_bounds) {
        (None, None) => {
            if path_clear(&[start, end], &obstacles) {
                return vec![start, end];
            }
            route_around_obstacles(start, end, &obstacles)
        }
        (Some(bounds), Some(_)) if start_element_id == target_element_id => {
            self_connection_route(start, end, bounds)
        }
        (Some(start_bounds), Some(target_bounds)) => {
            dual_connection_route(start, end, start_bounds, target_bounds, &obstacles)
        }
        (Some(start_bounds), None) => single_start_route(start, end, start_bounds),
        (None, Some(target_bounds)) => single_end_route(start, end, target_bounds),
    };

    polyline::simplify_collinear(polyline::dedup_consecutive(route, 1e-9), SIMPLIFY_EPS)
}

fn path_clear(points: &[na::Vector2<f64>], obstacles: &[Aabb]) -> bool {
    // shrunk a hair so paths riding along an inflated obstacle edge count as clear
    points.windows(2).all(|w| {
        obstacles
            .iter()
            .all(|o| !geometry::segment_intersects_aabb(w[0], w[1], *o, -0.5))
    })
}

/// The coordinate of the given side line of the bounds.
fn side_line(bounds: Aabb, side: Side) -> f64 {
    match side {
        Side::Top => bounds.mins[1],
        Side::Bottom => bounds.maxs[1],
        Side::Left => bounds.mins[0],
        Side::Right => bounds.maxs[0],
    }
}

/// Project the point outward onto the side line of the bounds.
fn project_to_side(point: na::Vector2<f64>, bounds: Aabb, side: Side) -> na::Vector2<f64> {
    if side.is_horizontal() {
        na::vector![side_line(bounds, side), point[1]]
    } else {
        na::vector![point[0], side_line(bounds, side)]
    }
}

/// The outer corner where a left/right side meets a top/bottom side.
fn outer_corner(bounds: Aabb, x_side: Side, y_side: Side) -> na::Vector2<f64> {
    na::vector![side_line(bounds, x_side), side_line(bounds, y_side)]
}

fn self_connection_route(
    start: na::Vector2<f64>,
    end: na::Vector2<f64>,
    bounds: Aabb,
) -> Vec<na::Vector2<f64>> {
    let start_side = Side::of_point(bounds, start);
    let end_side = Side::of_point(bounds, end);
    let outer = bounds.loosened(SELF_ROUTE_MARGIN);

    let candidates: Vec<Vec<na::Vector2<f64>>> = if start_side == end_side {
        // both on the same side: out, across, back in
        vec![vec![
            start,
            project_to_side(start, outer, start_side),
            project_to_side(end, outer, end_side),
            end,
        ]]
    } else if start_side.outward() == -end_side.outward() {
        // opposite sides: around either of the two perpendicular sides
        let vias = if start_side.is_horizontal() {
            [Side::Top, Side::Bottom]
        } else {
            [Side::Left, Side::Right]
        };
        vias.into_iter()
            .map(|via| {
                let (corner_start, corner_end) = if start_side.is_horizontal() {
                    (
                        outer_corner(outer, start_side, via),
                        outer_corner(outer, end_side, via),
                    )
                } else {
                    (
                        outer_corner(outer, via, start_side),
                        outer_corner(outer, via, end_side),
                    )
                };
                vec![
                    start,
                    project_to_side(start, outer, start_side),
                    corner_start,
                    corner_end,
                    project_to_side(end, outer, end_side),
                    end,
                ]
            })
            .collect()
    } else {
        // adjacent sides: around the shared outer corner
        let corner = if start_side.is_horizontal() {
            outer_corner(outer, start_side, end_side)
        } else {
            outer_corner(outer, end_side, start_side)
        };
        vec![vec![
            start,
            project_to_side(start, outer, start_side),
            corner,
            project_to_side(end, outer, end_side),
            end,
        ]]
    };

    candidates
        .into_iter()
        .min_by(|a, b| {
            polyline::manhattan_length(a).total_cmp(&polyline::manhattan_length(b))
        })
        .unwrap_or_else(|| vec![start, end])
}

/// The per-axis exit margin between two connected shapes: half the gap, clamped
/// into [MIN_EXIT_MARGIN, PREFERRED_EXIT_MARGIN], the preferred margin when the
/// shapes overlap on the axis.
fn dual_margin(gap: f64) -> f64 {
    if gap <= 0.0 {
        PREFERRED_EXIT_MARGIN
    } else {
        (gap * 0.5).min(PREFERRED_EXIT_MARGIN).max(MIN_EXIT_MARGIN)
    }
}

fn dual_connection_route(
    start: na::Vector2<f64>,
    end: na::Vector2<f64>,
    start_bounds: Aabb,
    target_bounds: Aabb,
    obstacles: &[Aabb],
) -> Vec<na::Vector2<f64>> {
    let hgap = (target_bounds.mins[0] - start_bounds.maxs[0])
        .max(start_bounds.mins[0] - target_bounds.maxs[0]);
    let vgap = (target_bounds.mins[1] - start_bounds.maxs[1])
        .max(start_bounds.mins[1] - target_bounds.maxs[1]);
    let margin_x = dual_margin(hgap);
    let margin_y = dual_margin(vgap);

    let start_side = Side::of_point(start_bounds, start);
    let end_side = Side::of_point(target_bounds, end);
    let margin_of = |side: Side| {
        if side.is_horizontal() {
            margin_x
        } else {
            margin_y
        }
    };
    let start_exit = start + start_side.outward() * margin_of(start_side);
    let end_exit = end + end_side.outward() * margin_of(end_side);

    let mut candidates: Vec<Vec<na::Vector2<f64>>> = Vec::new();

    if start_side.is_horizontal() == end_side.is_horizontal() {
        if start_side.is_horizontal() {
            // aligned-exit direct
            if (start[1] - end[1]).abs() <= SIMPLIFY_EPS {
                candidates.push(vec![start, end]);
            }
            // mid-split between the exits
            let mid_x = (start_exit[0] + end_exit[0]) * 0.5;
            candidates.push(vec![
                start,
                na::vector![mid_x, start[1]],
                na::vector![mid_x, end[1]],
                end,
            ]);
        } else {
            if (start[0] - end[0]).abs() <= SIMPLIFY_EPS {
                candidates.push(vec![start, end]);
            }
            let mid_y = (start_exit[1] + end_exit[1]) * 0.5;
            candidates.push(vec![
                start,
                na::vector![start[0], mid_y],
                na::vector![end[0], mid_y],
                end,
            ]);
        }
    } else {
        // different axes: the two L corner variants through the exits
        if start_side.is_horizontal() {
            candidates.push(vec![
                start,
                start_exit,
                na::vector![end[0], start[1]],
                end_exit,
                end,
            ]);
            candidates.push(vec![
                start,
                start_exit,
                na::vector![start_exit[0], end_exit[1]],
                end_exit,
                end,
            ]);
        } else {
            candidates.push(vec![
                start,
                start_exit,
                na::vector![start[0], end[1]],
                end_exit,
                end,
            ]);
            candidates.push(vec![
                start,
                start_exit,
                na::vector![end_exit[0], start_exit[1]],
                end_exit,
                end,
            ]);
        }
    }

    // the four outer perimeter routes
    let mut merged = start_bounds;
    merged.merge(&target_bounds);
    let rails = [
        (false, merged.mins[1] - margin_y),
        (false, merged.maxs[1] + margin_y),
        (true, merged.mins[0] - margin_x),
        (true, merged.maxs[0] + margin_x),
    ];
    for (vertical_rail, rail) in rails {
        let project = |p: na::Vector2<f64>| {
            if vertical_rail {
                na::vector![rail, p[1]]
            } else {
                na::vector![p[0], rail]
            }
        };
        candidates.push(vec![
            start,
            start_exit,
            project(start_exit),
            project(end_exit),
            end_exit,
            end,
        ]);
    }

    let best = candidates
        .iter()
        .filter(|path| dual_path_valid(path, start_bounds, target_bounds))
        .filter(|path| path_clear(path, obstacles))
        .min_by(|a, b| polyline::manhattan_length(a).total_cmp(&polyline::manhattan_length(b)));
    if let Some(path) = best {
        return path.clone();
    }

    // every candidate was blocked by an obstacle: route around the blockers
    if !obstacles.is_empty() {
        let detour = route_around_obstacles(start, end, obstacles);
        if dual_path_valid(&detour, start_bounds, target_bounds) {
            return detour;
        }
    }

    // orthogonal L from the start exit
    let corner = if start_side.is_horizontal() {
        na::vector![start_exit[0], end[1]]
    } else {
        na::vector![end[0], start_exit[1]]
    };
    vec![start, start_exit, corner, end]
}

/// A dual-connection path is valid when no interior vertex lies inside either
/// connected bound, the first segment only enters the start bound, the last segment
/// only enters the target bound, and all intermediate segments clear both.
fn dual_path_valid(
    points: &[na::Vector2<f64>],
    start_bounds: Aabb,
    target_bounds: Aabb,
) -> bool {
    if points.len() < 2 {
        return false;
    }
    // boundary contact is fine, the bounds are tightened a hair
    let start_interior = start_bounds.tightened(0.5);
    let target_interior = target_bounds.tightened(0.5);
    let crosses = |a: na::Vector2<f64>, b: na::Vector2<f64>, interior: Aabb| {
        geometry::segment_intersects_aabb(a, b, interior, 0.0)
    };

    if points.len() == 2 {
        return !crosses(points[0], points[1], start_interior)
            && !crosses(points[0], points[1], target_interior);
    }

    for point in &points[1..points.len() - 1] {
        if start_bounds.contains_point_strict(*point)
            || target_bounds.contains_point_strict(*point)
        {
            return false;
        }
    }

    let last = points.len() - 2;
    for (i, w) in points.windows(2).enumerate() {
        if i == 0 {
            if crosses(w[0], w[1], target_interior) {
                return false;
            }
        } else if i == last {
            if crosses(w[0], w[1], start_interior) {
                return false;
            }
        } else if crosses(w[0], w[1], start_interior) || crosses(w[0], w[1], target_interior) {
            return false;
        }
    }
    true
}

fn single_start_route(
    start: na::Vector2<f64>,
    end: na::Vector2<f64>,
    start_bounds: Aabb,
) -> Vec<na::Vector2<f64>> {
    let side = Side::of_point(start_bounds, start);
    let exit = start + side.outward() * PREFERRED_EXIT_MARGIN;
    let corner = if side.is_horizontal() {
        na::vector![exit[0], end[1]]
    } else {
        na::vector![end[0], exit[1]]
    };
    vec![start, exit, corner, end]
}

fn single_end_route(
    start: na::Vector2<f64>,
    end: na::Vector2<f64>,
    target_bounds: Aabb,
) -> Vec<na::Vector2<f64>> {
    let side = Side::of_point(target_bounds, end);
    let expanded = target_bounds.loosened(OBSTACLE_MARGIN);

    if side.is_horizontal() {
        let out_x = side_line(expanded, side);
        if start[1] >= expanded.mins[1] && start[1] <= expanded.maxs[1] {
            // within the expanded band: around the near outer corner
            let corner_y = if (end[1] - expanded.mins[1]).abs() < (end[1] - expanded.maxs[1]).abs()
            {
                expanded.mins[1]
            } else {
                expanded.maxs[1]
            };
            vec![
                start,
                na::vector![start[0], corner_y],
                na::vector![out_x, corner_y],
                na::vector![out_x, end[1]],
                end,
            ]
        } else {
            // across one axis, then turn into the side
            vec![start, na::vector![start[0], end[1]], end]
        }
    } else {
        let out_y = side_line(expanded, side);
        if start[0] >= expanded.mins[0] && start[0] <= expanded.maxs[0] {
            let corner_x = if (end[0] - expanded.mins[0]).abs() < (end[0] - expanded.maxs[0]).abs()
            {
                expanded.mins[0]
            } else {
                expanded.maxs[0]
            };
            vec![
                start,
                na::vector![corner_x, start[1]],
                na::vector![corner_x, out_y],
                na::vector![end[0], out_y],
                end,
            ]
        } else {
            vec![start, na::vector![end[0], start[1]], end]
        }
    }
}

/// Routing for unconnected endpoints with a blocked straight line: L paths first,
/// then the eight corner paths around the closest blocking obstacle, then the
/// over-the-top or under-the-bottom fallback at the obstacle's y edge.
fn route_around_obstacles(
    start: na::Vector2<f64>,
    end: na::Vector2<f64>,
    obstacles: &[Aabb],
) -> Vec<na::Vector2<f64>> {
    let horizontal_first = vec![start, na::vector![end[0], start[1]], end];
    if path_clear(&horizontal_first, obstacles) {
        return horizontal_first;
    }
    let vertical_first = vec![start, na::vector![start[0], end[1]], end];
    if path_clear(&vertical_first, obstacles) {
        return vertical_first;
    }

    let span = Aabb::new_positive(start.into(), end.into());
    let Some(blocker) = obstacles
        .iter()
        .filter(|o| {
            o.intersection(&span).is_some()
                && geometry::segment_intersects_aabb(start, end, **o, 0.0)
        })
        .min_by(|a, b| {
            (a.center().coords - start)
                .magnitude()
                .total_cmp(&(b.center().coords - start).magnitude())
        })
        .copied()
    else {
        return horizontal_first;
    };

    let corners = [
        blocker.mins.coords,
        na::vector![blocker.maxs[0], blocker.mins[1]],
        blocker.maxs.coords,
        na::vector![blocker.mins[0], blocker.maxs[1]],
    ];
    let mut candidates: Vec<Vec<na::Vector2<f64>>> = Vec::with_capacity(8);
    for corner in corners {
        candidates.push(vec![
            start,
            na::vector![corner[0], start[1]],
            corner,
            na::vector![end[0], corner[1]],
            end,
        ]);
        candidates.push(vec![
            start,
            na::vector![start[0], corner[1]],
            corner,
            na::vector![corner[0], end[1]],
            end,
        ]);
    }

    let best = candidates
        .into_iter()
        .filter(|path| path_clear(path, obstacles))
        .min_by(|a, b| polyline::manhattan_length(a).total_cmp(&polyline::manhattan_length(b)));
    if let Some(path) = best {
        return path;
    }

    // last resort: over the top or under the bottom of the blocker
    let over = vec![
        start,
        na::vector![start[0], blocker.mins[1]],
        na::vector![end[0], blocker.mins[1]],
        end,
    ];
    let under = vec![
        start,
        na::vector![start[0], blocker.maxs[1]],
        na::vector![end[0], blocker.maxs[1]],
        end,
    ];
    if polyline::manhattan_length(&over) <= polyline::manhattan_length(&under) {
        over
    } else {
        under
    }
}
