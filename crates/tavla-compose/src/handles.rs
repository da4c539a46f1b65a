// Imports
use crate::geometry::Side;
use p2d::bounding_volume::Aabb;
use serde::{Deserialize, Serialize};

/// One of the eight positions on the edge of a bounding box.
///
/// Used both for resize handles and for connector anchor positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename = "handle_position")]
pub enum HandlePosition {
    /// North west corner.
    #[serde(rename = "nw")]
    NorthWest,
    /// North edge midpoint.
    #[serde(rename = "n")]
    North,
    /// North east corner.
    #[serde(rename = "ne")]
    NorthEast,
    /// East edge midpoint.
    #[serde(rename = "e")]
    East,
    /// South east corner.
    #[serde(rename = "se")]
    SouthEast,
    /// South edge midpoint.
    #[serde(rename = "s")]
    South,
    /// South west corner.
    #[serde(rename = "sw")]
    SouthWest,
    /// West edge midpoint.
    #[serde(rename = "w")]
    West,
}

impl HandlePosition {
    /// All eight positions, corners first.
    pub const ALL: [Self; 8] = [
        Self::NorthWest,
        Self::NorthEast,
        Self::SouthEast,
        Self::SouthWest,
        Self::North,
        Self::East,
        Self::South,
        Self::West,
    ];

    /// The four corner positions.
    pub const CORNERS: [Self; 4] = [
        Self::NorthWest,
        Self::NorthEast,
        Self::SouthEast,
        Self::SouthWest,
    ];

    /// The four edge midpoint positions.
    pub const EDGE_MIDPOINTS: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Whether this is a corner position.
    pub fn is_corner(self) -> bool {
        matches!(
            self,
            Self::NorthWest | Self::NorthEast | Self::SouthEast | Self::SouthWest
        )
    }

    /// The position diagonally or directly across.
    pub fn opposite(self) -> Self {
        match self {
            Self::NorthWest => Self::SouthEast,
            Self::North => Self::South,
            Self::NorthEast => Self::SouthWest,
            Self::East => Self::West,
            Self::SouthEast => Self::NorthWest,
            Self::South => Self::North,
            Self::SouthWest => Self::NorthEast,
            Self::West => Self::East,
        }
    }

    /// The point of the position on the given bounds.
    pub fn point_in_bounds(self, bounds: Aabb) -> na::Vector2<f64> {
        let center = bounds.center().coords;
        match self {
            Self::NorthWest => bounds.mins.coords,
            Self::North => na::vector![center[0], bounds.mins[1]],
            Self::NorthEast => na::vector![bounds.maxs[0], bounds.mins[1]],
            Self::East => na::vector![bounds.maxs[0], center[1]],
            Self::SouthEast => bounds.maxs.coords,
            Self::South => na::vector![center[0], bounds.maxs[1]],
            Self::SouthWest => na::vector![bounds.mins[0], bounds.maxs[1]],
            Self::West => na::vector![bounds.mins[0], center[1]],
        }
    }

    /// The per-axis sign the position contributes when used as a resize handle:
    /// west pulls x negative, east positive, north pulls y negative, south positive.
    pub fn resize_sign(self) -> na::Vector2<f64> {
        match self {
            Self::NorthWest => na::vector![-1.0, -1.0],
            Self::North => na::vector![0.0, -1.0],
            Self::NorthEast => na::vector![1.0, -1.0],
            Self::East => na::vector![1.0, 0.0],
            Self::SouthEast => na::vector![1.0, 1.0],
            Self::South => na::vector![0.0, 1.0],
            Self::SouthWest => na::vector![-1.0, 1.0],
            Self::West => na::vector![-1.0, 0.0],
        }
    }

    /// The edge midpoint handle for the given box side.
    pub fn from_side(side: Side) -> Self {
        match side {
            Side::Top => Self::North,
            Side::Bottom => Self::South,
            Side::Left => Self::West,
            Side::Right => Self::East,
        }
    }

    /// The box side an edge midpoint handle sits on, None for corners.
    pub fn side(self) -> Option<Side> {
        match self {
            Self::North => Some(Side::Top),
            Self::South => Some(Side::Bottom),
            Self::West => Some(Side::Left),
            Self::East => Some(Side::Right),
            _ => None,
        }
    }

    /// The direction angle of the handle from the bounds center, in degrees.
    /// Zero degrees points east, growing clockwise in screen coordinates.
    fn direction_angle(self) -> f64 {
        match self {
            Self::East => 0.0,
            Self::SouthEast => 45.0,
            Self::South => 90.0,
            Self::SouthWest => 135.0,
            Self::West => 180.0,
            Self::NorthWest => 225.0,
            Self::North => 270.0,
            Self::NorthEast => 315.0,
        }
    }

    /// The resize cursor label for this handle when the element carries the given
    /// rotation (degrees), snapped to the nearest 45 degree sector.
    pub fn resize_cursor(self, rotation_deg: f64) -> &'static str {
        let angle = (self.direction_angle() + rotation_deg).rem_euclid(360.0);
        let sector = ((angle + 22.5) / 45.0).floor() as i32 % 8;
        match sector {
            0 | 4 => "ew-resize",
            1 | 5 => "nwse-resize",
            2 | 6 => "ns-resize",
            _ => "nesw-resize",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involution() {
        for handle in HandlePosition::ALL {
            assert_eq!(handle.opposite().opposite(), handle);
        }
    }

    #[test]
    fn handle_points() {
        let bounds = Aabb::new(na::point![0.0, 0.0], na::point![10.0, 20.0]);
        assert_eq!(
            HandlePosition::SouthEast.point_in_bounds(bounds),
            na::vector![10.0, 20.0]
        );
        assert_eq!(
            HandlePosition::North.point_in_bounds(bounds),
            na::vector![5.0, 0.0]
        );
    }

    #[test]
    fn cursor_rotates_with_element() {
        assert_eq!(HandlePosition::East.resize_cursor(0.0), "ew-resize");
        assert_eq!(HandlePosition::East.resize_cursor(90.0), "ns-resize");
        assert_eq!(HandlePosition::SouthEast.resize_cursor(0.0), "nwse-resize");
        assert_eq!(HandlePosition::SouthEast.resize_cursor(90.0), "nesw-resize");
        // snapping picks the nearest sector
        assert_eq!(HandlePosition::East.resize_cursor(20.0), "ew-resize");
        assert_eq!(HandlePosition::East.resize_cursor(30.0), "nwse-resize");
    }
}
