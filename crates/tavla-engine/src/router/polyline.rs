// Imports
use crate::element::{Connector, ConnectorStyle};
use tavla_compose::ext::Vector2Ext;

/// Sample steps for a quadratic curve (three control points).
const QUAD_CURVE_STEPS: usize = 32;
/// Sample steps per Catmull-Rom segment (four or more control points).
const CATMULL_ROM_STEPS: usize = 12;

/// The manhattan length of the polyline.
pub fn manhattan_length(points: &[na::Vector2<f64>]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1] - w[0]).manhattan_norm())
        .sum()
}

/// Remove consecutive duplicate points.
pub fn dedup_consecutive(points: Vec<na::Vector2<f64>>, eps: f64) -> Vec<na::Vector2<f64>> {
    let mut out: Vec<na::Vector2<f64>> = Vec::with_capacity(points.len());
    for point in points {
        if out
            .last()
            .map_or(true, |last| !last.approx_eq_eps(&point, eps))
        {
            out.push(point);
        }
    }
    out
}

/// Remove interior points of axis-collinear runs, with coordinates compared at `eps`.
///
/// Endpoints always stay.
pub fn simplify_collinear(points: Vec<na::Vector2<f64>>, eps: f64) -> Vec<na::Vector2<f64>> {
    if points.len() < 3 {
        return points;
    }
    let mut out: Vec<na::Vector2<f64>> = Vec::with_capacity(points.len());
    out.push(points[0]);
    for i in 1..points.len() - 1 {
        let prev = *out.last().unwrap();
        let current = points[i];
        let next = points[i + 1];
        let collinear_x =
            (prev[0] - current[0]).abs() <= eps && (current[0] - next[0]).abs() <= eps;
        let collinear_y =
            (prev[1] - current[1]).abs() <= eps && (current[1] - next[1]).abs() <= eps;
        if !(collinear_x || collinear_y) {
            out.push(current);
        }
    }
    out.push(points[points.len() - 1]);
    out
}

/// Whether any segment of the polyline is diagonal, with coordinates compared at `eps`.
pub fn has_diagonal(points: &[na::Vector2<f64>], eps: f64) -> bool {
    points
        .windows(2)
        .any(|w| (w[0][0] - w[1][0]).abs() > eps && (w[0][1] - w[1][1]).abs() > eps)
}

/// The polyline a connector is rendered with, used for hit-testing.
///
/// Sharp and elbow connectors use their vertices directly. Curved connectors sample
/// the control points with the renderer-shared scheme: a quadratic curve for three
/// points, Catmull-Rom segments for four or more.
pub fn connector_polyline(connector: &Connector) -> Vec<na::Vector2<f64>> {
    match connector.style {
        ConnectorStyle::Sharp | ConnectorStyle::Elbow => connector.points.clone(),
        ConnectorStyle::Curved => sample_curve(&connector.points),
    }
}

/// Sample curve control points into a polyline.
pub fn sample_curve(points: &[na::Vector2<f64>]) -> Vec<na::Vector2<f64>> {
    match points.len() {
        0 | 1 | 2 => points.to_vec(),
        3 => {
            let quad = kurbo::QuadBez::new(
                points[0].to_kurbo_point(),
                points[1].to_kurbo_point(),
                points[2].to_kurbo_point(),
            );
            (0..=QUAD_CURVE_STEPS)
                .map(|i| {
                    let t = i as f64 / QUAD_CURVE_STEPS as f64;
                    na::Vector2::from_kurbo_point(kurbo::ParamCurve::eval(&quad, t))
                })
                .collect()
        }
        _ => {
            let mut sampled = vec![points[0]];
            for i in 0..points.len() - 1 {
                let p0 = if i == 0 { points[0] } else { points[i - 1] };
                let p1 = points[i];
                let p2 = points[i + 1];
                let p3 = if i + 2 < points.len() {
                    points[i + 2]
                } else {
                    points[points.len() - 1]
                };
                for step in 1..=CATMULL_ROM_STEPS {
                    let t = step as f64 / CATMULL_ROM_STEPS as f64;
                    sampled.push(catmull_rom(p0, p1, p2, p3, t));
                }
            }
            sampled
        }
    }
}

fn catmull_rom(
    p0: na::Vector2<f64>,
    p1: na::Vector2<f64>,
    p2: na::Vector2<f64>,
    p3: na::Vector2<f64>,
    t: f64,
) -> na::Vector2<f64> {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((p1 * 2.0)
        + (p2 - p0) * t
        + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
        + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * t3)
}

/// The distance from the point to the polyline.
pub fn dist_to_polyline(pos: na::Vector2<f64>, points: &[na::Vector2<f64>]) -> f64 {
    match points.len() {
        0 => f64::INFINITY,
        1 => (pos - points[0]).magnitude(),
        _ => points
            .windows(2)
            .map(|w| tavla_compose::geometry::dist_to_segment(pos, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn simplify_removes_collinear_runs() {
        let points = vec![
            na::vector![0.0, 0.0],
            na::vector![10.0, 0.0],
            na::vector![20.0, 0.0],
            na::vector![20.0, 10.0],
        ];
        let simplified = simplify_collinear(points, 1e-6);
        assert_eq!(
            simplified,
            vec![
                na::vector![0.0, 0.0],
                na::vector![20.0, 0.0],
                na::vector![20.0, 10.0],
            ]
        );
    }

    #[test]
    fn diagonal_detection() {
        let ortho = vec![
            na::vector![0.0, 0.0],
            na::vector![10.0, 0.0],
            na::vector![10.0, 5.0],
        ];
        assert!(!has_diagonal(&ortho, 1e-6));
        let diag = vec![na::vector![0.0, 0.0], na::vector![10.0, 5.0]];
        assert!(has_diagonal(&diag, 1e-6));
    }

    #[test]
    fn quad_curve_sampling() {
        let points = [
            na::vector![0.0, 0.0],
            na::vector![50.0, 50.0],
            na::vector![100.0, 0.0],
        ];
        let sampled = sample_curve(&points);
        assert_eq!(sampled.len(), QUAD_CURVE_STEPS + 1);
        assert_eq!(sampled[0], points[0]);
        assert_eq!(*sampled.last().unwrap(), points[2]);
        // apex of the symmetric quadratic
        let mid = sampled[QUAD_CURVE_STEPS / 2];
        assert_relative_eq!(mid[0], 50.0, epsilon = 1e-9);
        assert_relative_eq!(mid[1], 25.0, epsilon = 1e-9);
    }

    #[test]
    fn catmull_rom_sampling_passes_through_control_points() {
        let points = [
            na::vector![0.0, 0.0],
            na::vector![40.0, 20.0],
            na::vector![80.0, -20.0],
            na::vector![120.0, 0.0],
        ];
        let sampled = sample_curve(&points);
        assert_eq!(sampled.len(), 1 + CATMULL_ROM_STEPS * 3);
        assert_eq!(sampled[0], points[0]);
        assert_eq!(sampled[CATMULL_ROM_STEPS], points[1]);
        assert_eq!(sampled[CATMULL_ROM_STEPS * 2], points[2]);
        assert_eq!(*sampled.last().unwrap(), points[3]);
    }

    #[test]
    fn polyline_distance() {
        let points = vec![
            na::vector![0.0, 0.0],
            na::vector![10.0, 0.0],
            na::vector![10.0, 10.0],
        ];
        assert_relative_eq!(dist_to_polyline(na::vector![5.0, 3.0], &points), 3.0);
        assert_relative_eq!(dist_to_polyline(na::vector![14.0, 5.0], &points), 4.0);
    }
}
