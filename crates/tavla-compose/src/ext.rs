// Imports
use p2d::bounding_volume::Aabb;

/// Extension trait for [`na::Vector2<f64>`].
pub trait Vector2Ext
where
    Self: Sized,
{
    /// The orthogonal vector, normalized to length 1
    fn orth_unit(&self) -> Self;
    /// a new vector by taking the mins of each x and y values
    fn mins(&self, other: &Self) -> Self;
    /// a new vector by taking the maxs of each x and y values
    fn maxs(&self, other: &Self) -> Self;
    /// calculates the angle self is "ahead" of other (counter clockwise)
    fn angle_ahead(&self, other: &Self) -> f64;
    /// The manhattan (L1) norm.
    fn manhattan_norm(&self) -> f64;
    /// Converts to kurbo::Point
    fn to_kurbo_point(&self) -> kurbo::Point;
    /// Converts from kurbo::Point
    fn from_kurbo_point(kurbo_point: kurbo::Point) -> Self;
    /// Approximate equality
    fn approx_eq(&self, other: &Self) -> bool;
    /// Approximate equality with an explicit absolute tolerance
    fn approx_eq_eps(&self, other: &Self, eps: f64) -> bool;
}

impl Vector2Ext for na::Vector2<f64> {
    fn orth_unit(&self) -> Self {
        let rot_90deg = na::Rotation2::new(std::f64::consts::PI * 0.5);

        let normalized = if self.magnitude() > 0.0 {
            self.normalize()
        } else {
            return na::Vector2::from_element(0.0);
        };

        rot_90deg * normalized
    }

    fn mins(&self, other: &Self) -> Self {
        na::vector![self[0].min(other[0]), self[1].min(other[1])]
    }

    fn maxs(&self, other: &Self) -> Self {
        na::vector![self[0].max(other[0]), self[1].max(other[1])]
    }

    fn angle_ahead(&self, other: &Self) -> f64 {
        other[1].atan2(other[0]) - self[1].atan2(self[0])
    }

    fn manhattan_norm(&self) -> f64 {
        self[0].abs() + self[1].abs()
    }

    fn to_kurbo_point(&self) -> kurbo::Point {
        kurbo::Point {
            x: self[0],
            y: self[1],
        }
    }

    fn from_kurbo_point(kurbo_point: kurbo::Point) -> Self {
        na::vector![kurbo_point.x, kurbo_point.y]
    }

    fn approx_eq(&self, other: &Self) -> bool {
        approx::relative_eq!(self[0], other[0]) && approx::relative_eq!(self[1], other[1])
    }

    fn approx_eq_eps(&self, other: &Self, eps: f64) -> bool {
        (self[0] - other[0]).abs() <= eps && (self[1] - other[1]).abs() <= eps
    }
}

/// Extension trait for [p2d::bounding_volume::Aabb].
pub trait AabbExt
where
    Self: Sized,
{
    /// New Aabb at position zero, with size zero
    fn new_zero() -> Self;
    /// New Aabb, ensuring its mins, maxs are valid (maxs >= mins)
    fn new_positive(start: na::Point2<f64>, end: na::Point2<f64>) -> Self;
    /// Translates the Aabb by a offset
    fn translate(&self, offset: na::Vector2<f64>) -> Self;
    /// extends on every side by the given size
    fn extend_by(&self, extend_by: na::Vector2<f64>) -> Self;
    /// Ensures the Aabb is positive (maxs >= mins)
    fn ensure_positive(&mut self);
    /// Whether the point lies in the strict interior (boundary excluded)
    fn contains_point_strict(&self, point: na::Vector2<f64>) -> bool;
    /// The point within the Aabb that is nearest to the given point
    fn clamp_point(&self, point: na::Vector2<f64>) -> na::Vector2<f64>;
    /// Converts a Aabb to a kurbo Rectangle
    fn to_kurbo_rect(&self) -> kurbo::Rect;
    /// Approximate equality
    fn approx_eq(&self, other: &Self) -> bool;
}

impl AabbExt for Aabb {
    fn new_zero() -> Self {
        Aabb::new(na::point![0.0, 0.0], na::point![0.0, 0.0])
    }

    fn new_positive(start: na::Point2<f64>, end: na::Point2<f64>) -> Self {
        if start[0] <= end[0] && start[1] <= end[1] {
            Aabb::new(na::point![start[0], start[1]], na::point![end[0], end[1]])
        } else if start[0] > end[0] && start[1] <= end[1] {
            Aabb::new(na::point![end[0], start[1]], na::point![start[0], end[1]])
        } else if start[0] <= end[0] && start[1] > end[1] {
            Aabb::new(na::point![start[0], end[1]], na::point![end[0], start[1]])
        } else {
            Aabb::new(na::point![end[0], end[1]], na::point![start[0], start[1]])
        }
    }

    fn translate(&self, offset: na::Vector2<f64>) -> Aabb {
        self.transform_by(&na::convert(na::Translation2::from(offset)))
    }

    fn extend_by(&self, extend_by: na::Vector2<f64>) -> Aabb {
        Aabb::new(
            (self.mins.coords - extend_by).into(),
            (self.maxs.coords + extend_by).into(),
        )
    }

    fn ensure_positive(&mut self) {
        if self.mins[0] > self.maxs[0] {
            std::mem::swap(&mut self.mins[0], &mut self.maxs[0]);
        }
        if self.mins[1] > self.maxs[1] {
            std::mem::swap(&mut self.mins[1], &mut self.maxs[1]);
        }
    }

    fn contains_point_strict(&self, point: na::Vector2<f64>) -> bool {
        point[0] > self.mins[0]
            && point[0] < self.maxs[0]
            && point[1] > self.mins[1]
            && point[1] < self.maxs[1]
    }

    fn clamp_point(&self, point: na::Vector2<f64>) -> na::Vector2<f64> {
        na::vector![
            point[0].clamp(self.mins[0], self.maxs[0]),
            point[1].clamp(self.mins[1], self.maxs[1])
        ]
    }

    fn to_kurbo_rect(&self) -> kurbo::Rect {
        kurbo::Rect::from_points(
            self.mins.coords.to_kurbo_point(),
            self.maxs.coords.to_kurbo_point(),
        )
    }

    fn approx_eq(&self, other: &Self) -> bool {
        self.mins.coords.approx_eq(&other.mins.coords)
            && self.maxs.coords.approx_eq(&other.maxs.coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_new_positive() {
        let aabb = Aabb::new_positive(na::point![10.0, -4.0], na::point![-2.0, 8.0]);
        assert_eq!(aabb.mins, na::point![-2.0, -4.0]);
        assert_eq!(aabb.maxs, na::point![10.0, 8.0]);
    }

    #[test]
    fn aabb_clamp_point() {
        let aabb = Aabb::new(na::point![0.0, 0.0], na::point![10.0, 10.0]);
        assert_eq!(
            aabb.clamp_point(na::vector![20.0, 5.0]),
            na::vector![10.0, 5.0]
        );
        assert_eq!(
            aabb.clamp_point(na::vector![3.0, 4.0]),
            na::vector![3.0, 4.0]
        );
    }

    #[test]
    fn aabb_strict_containment() {
        let aabb = Aabb::new(na::point![0.0, 0.0], na::point![10.0, 10.0]);
        assert!(aabb.contains_point_strict(na::vector![5.0, 5.0]));
        assert!(!aabb.contains_point_strict(na::vector![0.0, 5.0]));
        assert!(!aabb.contains_point_strict(na::vector![11.0, 5.0]));
    }
}
