// Imports
use crate::WidgetFlags;
use p2d::bounding_volume::Aabb;
use serde::{Deserialize, Serialize};
use tavla_compose::ext::AabbExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NudgeDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

/// The view onto the infinite canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename = "camera")]
pub struct Camera {
    /// The offset in surface coordinates.
    #[serde(rename = "offset")]
    offset: na::Vector2<f64>,
    /// The dimensions in surface coordinates.
    #[serde(rename = "size")]
    size: na::Vector2<f64>,
    /// The camera zoom, origin at (0.0, 0.0).
    #[serde(rename = "zoom")]
    zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: na::Vector2::zeros(),
            size: na::vector![800.0, 600.0],
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub const ZOOM_MIN: f64 = 0.1;
    pub const ZOOM_MAX: f64 = 8.0;
    pub const ZOOM_DEFAULT: f64 = 1.0;

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom.clamp(Self::ZOOM_MIN, Self::ZOOM_MAX);
        self
    }

    pub fn with_offset(mut self, offset: na::Vector2<f64>) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_size(mut self, size: na::Vector2<f64>) -> Self {
        self.size = size;
        self
    }

    /// The current viewport offset in surface coordinate space.
    pub fn offset(&self) -> na::Vector2<f64> {
        self.offset
    }

    pub fn set_offset(&mut self, offset: na::Vector2<f64>) -> WidgetFlags {
        let mut widget_flags = WidgetFlags::default();
        self.offset = offset;
        widget_flags.view_modified = true;
        widget_flags.redraw = true;
        widget_flags
    }

    /// The current viewport size in surface coordinate space.
    pub fn size(&self) -> na::Vector2<f64> {
        self.size
    }

    pub fn set_size(&mut self, size: na::Vector2<f64>) -> WidgetFlags {
        let mut widget_flags = WidgetFlags::default();
        self.size = size;
        widget_flags.view_modified = true;
        widget_flags.redraw = true;
        widget_flags
    }

    /// The zoom.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom.
    pub fn zoom_to(&mut self, zoom: f64) -> WidgetFlags {
        let mut widget_flags = WidgetFlags::default();
        self.zoom = zoom.clamp(Self::ZOOM_MIN, Self::ZOOM_MAX);
        widget_flags.zoomed = true;
        widget_flags.redraw = true;
        widget_flags
    }

    /// The viewport in world coordinate space.
    pub fn viewport(&self) -> Aabb {
        Aabb::new_positive(
            (self.offset / self.zoom).into(),
            ((self.offset + self.size) / self.zoom).into(),
        )
    }

    /// The current viewport center in world coordinate space.
    pub fn viewport_center(&self) -> na::Vector2<f64> {
        (self.offset + self.size * 0.5) / self.zoom
    }

    /// Transform a point from surface coords to world coords.
    pub fn surface_to_world(&self, pos: na::Vector2<f64>) -> na::Vector2<f64> {
        (pos + self.offset) / self.zoom
    }

    /// Transform a point from world coords to surface coords.
    pub fn world_to_surface(&self, pos: na::Vector2<f64>) -> na::Vector2<f64> {
        pos * self.zoom - self.offset
    }

    /// Transform Aabb from world coords to surface coords.
    pub fn transform_bounds(&self, bounds: Aabb) -> Aabb {
        Aabb::new(
            self.world_to_surface(bounds.mins.coords).into(),
            self.world_to_surface(bounds.maxs.coords).into(),
        )
    }

    /// The transform from world coords to surface coords.
    ///
    /// To get the inverse, call `.inverse()`.
    pub fn transform(&self) -> na::Affine2<f64> {
        na::try_convert(
            // LHS is applied onto RHS, so the order is scaling by zoom -> Translation by offset
            na::Translation2::from(-self.offset).to_homogeneous()
                * na::Scale2::from(na::Vector2::from_element(self.zoom)).to_homogeneous(),
        )
        .unwrap()
    }

    /// Detects if a nudge is needed, meaning: the position is close to an edge of the current viewport.
    pub fn detect_nudge_needed(&self, pos: na::Vector2<f64>) -> Option<NudgeDirection> {
        const NUDGE_VIEWPORT_DIST: f64 = 10.0;
        let viewport = self.viewport();
        let nudge_north = pos[1] <= viewport.mins[1] + NUDGE_VIEWPORT_DIST;
        let nudge_east = pos[0] >= viewport.maxs[0] - NUDGE_VIEWPORT_DIST;
        let nudge_south = pos[1] >= viewport.maxs[1] - NUDGE_VIEWPORT_DIST;
        let nudge_west = pos[0] <= viewport.mins[0] + NUDGE_VIEWPORT_DIST;

        match (nudge_north, nudge_east, nudge_south, nudge_west) {
            (true, false, _, false) => Some(NudgeDirection::North),
            (true, true, _, _) => Some(NudgeDirection::NorthEast),
            (false, true, false, _) => Some(NudgeDirection::East),
            (_, true, true, _) => Some(NudgeDirection::SouthEast),
            (_, false, true, false) => Some(NudgeDirection::South),
            (_, _, true, true) => Some(NudgeDirection::SouthWest),
            (false, _, false, true) => Some(NudgeDirection::West),
            (true, _, _, true) => Some(NudgeDirection::NorthWest),
            (false, false, false, false) => None,
        }
    }

    pub fn nudge(&mut self, direction: NudgeDirection) -> WidgetFlags {
        const NUDGE_AMOUNT: f64 = 20.0;
        let nudge_offset = match direction {
            NudgeDirection::North => na::vector![0., -NUDGE_AMOUNT],
            NudgeDirection::NorthEast => na::vector![NUDGE_AMOUNT, -NUDGE_AMOUNT],
            NudgeDirection::East => na::vector![NUDGE_AMOUNT, 0.],
            NudgeDirection::SouthEast => na::vector![NUDGE_AMOUNT, NUDGE_AMOUNT],
            NudgeDirection::South => na::vector![0., NUDGE_AMOUNT],
            NudgeDirection::SouthWest => na::vector![-NUDGE_AMOUNT, NUDGE_AMOUNT],
            NudgeDirection::West => na::vector![-NUDGE_AMOUNT, 0.],
            NudgeDirection::NorthWest => na::vector![-NUDGE_AMOUNT, -NUDGE_AMOUNT],
        };
        self.set_offset(self.offset() + nudge_offset)
    }

    pub fn nudge_w_pos(&mut self, pos: na::Vector2<f64>) -> WidgetFlags {
        let mut widget_flags = WidgetFlags::default();
        if let Some(nudge_direction) = self.detect_nudge_needed(pos) {
            widget_flags |= self.nudge(nudge_direction);
        }
        widget_flags
    }
}

#[cfg(test)]
mod tests {
    use crate::Camera;
    use approx::assert_relative_eq;

    #[test]
    fn transform_vec() {
        let offset = na::vector![4.0, 2.0];
        let zoom = 1.5;
        let camera = Camera::default().with_zoom(zoom).with_offset(offset);

        // Point in world coordinates
        let p0 = na::point![10.0, 2.0];

        // first zoom, then translate
        assert_relative_eq!(
            camera.transform().transform_point(&p0).coords,
            (p0.coords * zoom) - offset
        );
    }

    #[test]
    fn surface_world_roundtrip() {
        let camera = Camera::default()
            .with_zoom(2.0)
            .with_offset(na::vector![100.0, -40.0]);
        let surface = na::vector![250.0, 310.0];

        assert_relative_eq!(
            camera.world_to_surface(camera.surface_to_world(surface)),
            surface
        );
    }

    #[test]
    fn viewport() {
        let zoom = 2.0;
        let offset = na::vector![10.0, 10.0];
        let size = na::vector![20.0, 30.0];
        let camera = Camera::default()
            .with_zoom(zoom)
            .with_offset(offset)
            .with_size(size);

        let mins = na::Point2::from(offset / zoom);
        let maxs = na::Point2::from((offset + size) / zoom);

        let viewport = camera.viewport();

        assert_relative_eq!(viewport.mins, mins);
        assert_relative_eq!(viewport.maxs, maxs);
    }
}
