// Imports
use crate::ext::AabbExt;
use p2d::bounding_volume::Aabb;

/// A side of an axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Side {
    /// Top side (negative y).
    Top,
    /// Bottom side (positive y).
    Bottom,
    /// Left side (negative x).
    Left,
    /// Right side (positive x).
    Right,
}

impl Side {
    /// The outward unit normal of the side.
    pub fn outward(self) -> na::Vector2<f64> {
        match self {
            Side::Top => na::vector![0.0, -1.0],
            Side::Bottom => na::vector![0.0, 1.0],
            Side::Left => na::vector![-1.0, 0.0],
            Side::Right => na::vector![1.0, 0.0],
        }
    }

    /// Whether the side's outward normal is horizontal.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    /// The side of `bounds` the point is on, determined by proximity to the edges,
    /// falling back to the direction from the center for points far inside or outside.
    pub fn of_point(bounds: Aabb, pos: na::Vector2<f64>) -> Self {
        let dist_left = (pos[0] - bounds.mins[0]).abs();
        let dist_right = (pos[0] - bounds.maxs[0]).abs();
        let dist_top = (pos[1] - bounds.mins[1]).abs();
        let dist_bottom = (pos[1] - bounds.maxs[1]).abs();

        let min_dist = dist_left.min(dist_right).min(dist_top).min(dist_bottom);
        const EDGE_PROXIMITY: f64 = 1.0;

        if min_dist <= EDGE_PROXIMITY {
            if dist_left == min_dist {
                Side::Left
            } else if dist_right == min_dist {
                Side::Right
            } else if dist_top == min_dist {
                Side::Top
            } else {
                Side::Bottom
            }
        } else {
            // fall back to the dominant direction from the center
            let dir = pos - bounds.center().coords;
            let extents = bounds.half_extents().add_scalar(f64::EPSILON);
            if (dir[0] / extents[0]).abs() >= (dir[1] / extents[1]).abs() {
                if dir[0] >= 0.0 { Side::Right } else { Side::Left }
            } else if dir[1] >= 0.0 {
                Side::Bottom
            } else {
                Side::Top
            }
        }
    }
}

/// Rotate a point around a center, angle in degrees.
pub fn rotate_point_about(
    point: na::Vector2<f64>,
    center: na::Vector2<f64>,
    angle_deg: f64,
) -> na::Vector2<f64> {
    if angle_deg == 0.0 {
        return point;
    }
    let rot = na::Rotation2::new(angle_deg.to_radians());
    center + rot * (point - center)
}

/// Rotate a vector, angle in radians.
pub fn rotate_vector(v: na::Vector2<f64>, angle_rad: f64) -> na::Vector2<f64> {
    na::Rotation2::new(angle_rad) * v
}

/// The axis-aligned envelope of the given bounds rotated by the angle (degrees) around its center.
pub fn rotated_envelope(bounds: Aabb, angle_deg: f64) -> Aabb {
    if angle_deg == 0.0 {
        return bounds;
    }
    let center = bounds.center().coords;
    let corners = [
        bounds.mins.coords,
        na::vector![bounds.maxs[0], bounds.mins[1]],
        bounds.maxs.coords,
        na::vector![bounds.mins[0], bounds.maxs[1]],
    ];
    let mut mins = na::vector![f64::INFINITY, f64::INFINITY];
    let mut maxs = na::vector![f64::NEG_INFINITY, f64::NEG_INFINITY];
    for corner in corners {
        let rotated = rotate_point_about(corner, center, angle_deg);
        mins = na::vector![mins[0].min(rotated[0]), mins[1].min(rotated[1])];
        maxs = na::vector![maxs[0].max(rotated[0]), maxs[1].max(rotated[1])];
    }
    Aabb::new(mins.into(), maxs.into())
}

/// The counter-clockwise predicate over three points.
fn ccw(a: na::Vector2<f64>, b: na::Vector2<f64>, c: na::Vector2<f64>) -> bool {
    (c[1] - a[1]) * (b[0] - a[0]) > (b[1] - a[1]) * (c[0] - a[0])
}

/// Whether the segments `a1-a2` and `b1-b2` intersect.
pub fn segments_intersect(
    a1: na::Vector2<f64>,
    a2: na::Vector2<f64>,
    b1: na::Vector2<f64>,
    b2: na::Vector2<f64>,
) -> bool {
    ccw(a1, b1, b2) != ccw(a2, b1, b2) && ccw(a1, a2, b1) != ccw(a1, a2, b2)
}

/// Whether the segment `start-end` intersects the box expanded by a symmetric margin.
///
/// True if either endpoint lies inside the expanded box, or any of the four box edges
/// intersects the segment.
pub fn segment_intersects_aabb(
    start: na::Vector2<f64>,
    end: na::Vector2<f64>,
    bounds: Aabb,
    margin: f64,
) -> bool {
    let expanded = bounds.extend_by(na::Vector2::repeat(margin));

    let inside = |p: na::Vector2<f64>| {
        p[0] >= expanded.mins[0]
            && p[0] <= expanded.maxs[0]
            && p[1] >= expanded.mins[1]
            && p[1] <= expanded.maxs[1]
    };
    if inside(start) || inside(end) {
        return true;
    }

    let tl = expanded.mins.coords;
    let tr = na::vector![expanded.maxs[0], expanded.mins[1]];
    let br = expanded.maxs.coords;
    let bl = na::vector![expanded.mins[0], expanded.maxs[1]];

    segments_intersect(start, end, tl, tr)
        || segments_intersect(start, end, tr, br)
        || segments_intersect(start, end, br, bl)
        || segments_intersect(start, end, bl, tl)
}

/// The point on the segment `a-b` nearest to `p`.
///
/// Zero-length segments return `a`.
pub fn closest_point_on_segment(
    p: na::Vector2<f64>,
    a: na::Vector2<f64>,
    b: na::Vector2<f64>,
) -> na::Vector2<f64> {
    let ab = b - a;
    let length_squared = ab.norm_squared();
    if length_squared == 0.0 {
        return a;
    }
    let t = ((p - a).dot(&ab) / length_squared).clamp(0.0, 1.0);
    a + ab * t
}

/// The distance from `p` to the segment `a-b`.
pub fn dist_to_segment(p: na::Vector2<f64>, a: na::Vector2<f64>, b: na::Vector2<f64>) -> f64 {
    (p - closest_point_on_segment(p, a, b)).magnitude()
}

/// The distance from `p` to the box (zero when inside).
pub fn dist_to_aabb(p: na::Vector2<f64>, bounds: Aabb) -> f64 {
    (p - bounds.clamp_point(p)).magnitude()
}

/// Whether the point lies inside the polygon, using the even-odd rule.
pub fn point_in_polygon(p: na::Vector2<f64>, polygon: &[na::Vector2<f64>]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if ((pi[1] > p[1]) != (pj[1] > p[1]))
            && p[0] < (pj[0] - pi[0]) * (p[1] - pi[1]) / (pj[1] - pi[1]) + pi[0]
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rotate_point() {
        let p = na::vector![10.0, 0.0];
        let center = na::vector![0.0, 0.0];
        let rotated = rotate_point_about(p, center, 90.0);
        assert_relative_eq!(rotated[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(rotated[1], 10.0, epsilon = 1e-9);
    }

    #[test]
    fn segment_intersection() {
        let a1 = na::vector![0.0, 0.0];
        let a2 = na::vector![10.0, 10.0];
        let b1 = na::vector![0.0, 10.0];
        let b2 = na::vector![10.0, 0.0];
        assert!(segments_intersect(a1, a2, b1, b2));
        assert!(!segments_intersect(a1, a2, b1, na::vector![20.0, 20.0]));
    }

    #[test]
    fn segment_against_box_with_margin() {
        let bounds = Aabb::new(na::point![10.0, 10.0], na::point![20.0, 20.0]);
        // passes beside the box, but inside the margin
        assert!(segment_intersects_aabb(
            na::vector![0.0, 25.0],
            na::vector![30.0, 25.0],
            bounds,
            6.0
        ));
        assert!(!segment_intersects_aabb(
            na::vector![0.0, 25.0],
            na::vector![30.0, 25.0],
            bounds,
            0.0
        ));
        // endpoint inside
        assert!(segment_intersects_aabb(
            na::vector![15.0, 15.0],
            na::vector![40.0, 15.0],
            bounds,
            0.0
        ));
    }

    #[test]
    fn dist_segment_degenerate() {
        let a = na::vector![4.0, 4.0];
        assert_relative_eq!(dist_to_segment(na::vector![4.0, 8.0], a, a), 4.0);
    }

    #[test]
    fn polygon_containment_even_odd() {
        let polygon = [
            na::vector![0.0, 0.0],
            na::vector![10.0, 0.0],
            na::vector![10.0, 10.0],
            na::vector![0.0, 10.0],
        ];
        assert!(point_in_polygon(na::vector![5.0, 5.0], &polygon));
        assert!(!point_in_polygon(na::vector![15.0, 5.0], &polygon));
    }

    #[test]
    fn side_of_point_prefers_near_edge() {
        let bounds = Aabb::new(na::point![0.0, 0.0], na::point![100.0, 50.0]);
        assert_eq!(Side::of_point(bounds, na::vector![100.0, 25.0]), Side::Right);
        assert_eq!(Side::of_point(bounds, na::vector![50.0, 0.0]), Side::Top);
        // a point well inside falls back to the dominant center direction
        assert_eq!(Side::of_point(bounds, na::vector![80.0, 25.0]), Side::Right);
    }
}
