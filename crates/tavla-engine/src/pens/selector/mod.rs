// Modules
mod penevents;
mod reshape;

// Imports
use super::PenBehaviour;
use super::PenStyle;
use crate::WidgetFlags;
use crate::connect::ConnectorUpdate;
use crate::element::{Body, Element, ElementId};
use crate::engine::EngineViewMut;
use crate::router::polyline;
use crate::throttle::Throttle;
use p2d::bounding_volume::{Aabb, BoundingVolume};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tavla_compose::EventResult;
use tavla_compose::geometry;
use tavla_compose::handles::HandlePosition;
use tavla_compose::penevent::{PenEvent, PenProgress};

#[derive(Debug, Clone)]
pub(super) enum ModifyState {
    Up,
    Hover(na::Vector2<f64>),
    Translate {
        start_pos: na::Vector2<f64>,
        current_pos: na::Vector2<f64>,
        has_drag_moved: bool,
    },
    Rotate {
        element_id: ElementId,
        rotation_center: na::Point2<f64>,
        start_pointer_angle: f64,
        start_rotation: f64,
    },
    Resize {
        from_handle: HandlePosition,
        start_bounds: Aabb,
        start_pos: na::Vector2<f64>,
    },
    ReshapeConnector(reshape::ReshapeDrag),
}

#[derive(Debug, Clone)]
pub(super) enum SelectorState {
    Idle,
    /// Dragging a selection box or lasso path on empty canvas.
    Selecting { path: Vec<na::Vector2<f64>> },
    ModifySelection {
        modify_state: ModifyState,
        selection: Vec<ElementId>,
        selection_bounds: Aabb,
    },
}

/// The select tool: hover, translate, resize, rotate, box and lasso selection, and
/// connector reshaping.
#[derive(Debug)]
pub struct Selector {
    pub(super) state: SelectorState,
    /// Snapshot of the selected elements at gesture start. All drag deltas are
    /// computed against it, so interleaved remote edits cannot corrupt the gesture.
    pub(super) original_selected: Vec<Element>,
    /// Snapshot of all elements at gesture start, for routing and follow-ups.
    pub(super) original_elements: Vec<Element>,
    pub(super) followup_throttle: Throttle<Vec<ConnectorUpdate>>,
}

impl Default for Selector {
    fn default() -> Self {
        Self {
            state: SelectorState::Idle,
            original_selected: Vec::new(),
            original_elements: Vec::new(),
            followup_throttle: Throttle::new(Self::CONNECTED_UPDATE_WAIT),
        }
    }
}

impl PenBehaviour for Selector {
    fn style(&self) -> PenStyle {
        PenStyle::Selector
    }

    fn deinit(&mut self) -> WidgetFlags {
        self.state = SelectorState::Idle;
        self.original_selected.clear();
        self.original_elements.clear();
        self.followup_throttle.reset();
        WidgetFlags::default()
    }

    fn handle_event(
        &mut self,
        event: PenEvent,
        now: Instant,
        engine_view: &mut EngineViewMut,
    ) -> (EventResult<PenProgress>, WidgetFlags) {
        match event {
            PenEvent::Down {
                element,
                modifier_keys,
            } => self.handle_pen_event_down(element, modifier_keys, now, engine_view),
            PenEvent::Up {
                element,
                modifier_keys,
            } => self.handle_pen_event_up(element, modifier_keys, now, engine_view),
            PenEvent::Proximity { element, .. } => {
                self.handle_pen_event_proximity(element, engine_view)
            }
            PenEvent::KeyPressed {
                keyboard_key,
                modifier_keys,
            } => self.handle_pen_event_keypressed(keyboard_key, modifier_keys, engine_view),
            PenEvent::Cancel => self.handle_pen_event_cancel(),
        }
    }
}

impl Selector {
    /// Follow-up connector updates are throttled to this window during drags.
    pub(super) const CONNECTED_UPDATE_WAIT: Duration = Duration::from_millis(16);
    /// Resize handle hit tolerance, in surface units.
    pub(super) const RESIZE_HANDLE_TOLERANCE: f64 = 10.0;
    /// The rotate handle sits this far outside the rotate side, in surface units.
    pub(super) const ROTATE_HANDLE_OFFSET: f64 = 29.0;
    /// Rotate handle radius, in surface units.
    pub(super) const ROTATE_HANDLE_RADIUS: f64 = 4.0;
    /// Box selections below this size are dropped on commit.
    pub(super) const BOX_SELECT_MIN_SIZE: f64 = 5.0;
    /// Lasso selections need at least this many points to commit.
    pub(super) const LASSO_MIN_POINTS: usize = 3;
    /// Lasso points closer than this to the previous point are dropped.
    pub(super) const LASSO_MIN_SAMPLE_DIST: f64 = 4.0;
    /// Box-like translations only apply after the cursor moved this far.
    pub(super) const DRAG_MOVE_THRESHOLD: f64 = 3.0;
    /// The frame handle height above the frame top edge, in surface units.
    pub(super) const FRAME_HANDLE_HEIGHT: f64 = 18.0;
    /// Rotation snaps to multiples of this angle with shift, in degrees.
    pub(super) const ROTATE_SNAP_DEG: f64 = 15.0;

    /// The merged world bounds of the elements with the given ids.
    pub(super) fn bounds_for(elements: &[Element], ids: &[ElementId]) -> Option<Aabb> {
        let mut iter = elements.iter().filter(|e| ids.contains(&e.id));
        let mut bounds = iter.next()?.world_bounds();
        for element in iter {
            bounds.merge(&element.world_bounds());
        }
        Some(bounds)
    }

    /// The rotation applied to the selection frame: the element's rotation for a
    /// single selection, zero for multi selections.
    pub(super) fn selection_rotation(elements: &[Element], selection: &[ElementId]) -> f64 {
        if selection.len() != 1 {
            return 0.0;
        }
        elements
            .iter()
            .find(|e| Some(&e.id) == selection.first())
            .map(|e| e.rotation)
            .unwrap_or(0.0)
    }

    /// The rotate handle center: outside the north edge midpoint, rotated with the
    /// selection.
    pub(super) fn rotate_handle_center(
        bounds: Aabb,
        rotation: f64,
        zoom: f64,
    ) -> na::Vector2<f64> {
        let top_mid = na::vector![bounds.center()[0], bounds.mins[1]];
        let center = bounds.center().coords;
        let handle = top_mid - na::vector![0.0, Self::ROTATE_HANDLE_OFFSET / zoom];
        geometry::rotate_point_about(handle, center, rotation)
    }

    pub(super) fn hit_rotate_handle(
        pos: na::Vector2<f64>,
        bounds: Aabb,
        rotation: f64,
        zoom: f64,
    ) -> bool {
        let center = Self::rotate_handle_center(bounds, rotation, zoom);
        (pos - center).magnitude() <= Self::ROTATE_HANDLE_RADIUS / zoom
    }

    /// Hit-test the resize handles: four corners for single selections, corners and
    /// edge midpoints for multi selections.
    pub(super) fn hit_resize_handle(
        pos: na::Vector2<f64>,
        bounds: Aabb,
        rotation: f64,
        multi: bool,
        zoom: f64,
    ) -> Option<HandlePosition> {
        let tolerance = Self::RESIZE_HANDLE_TOLERANCE / zoom;
        let center = bounds.center().coords;
        let handles: &[HandlePosition] = if multi {
            &HandlePosition::ALL
        } else {
            &HandlePosition::CORNERS
        };
        handles
            .iter()
            .copied()
            .find(|handle| {
                let handle_pos =
                    geometry::rotate_point_about(handle.point_in_bounds(bounds), center, rotation);
                (pos - handle_pos).magnitude() <= tolerance
            })
    }

    /// Single selections also treat the selection frame edges as midpoint handles.
    pub(super) fn hit_edge_handle(
        pos: na::Vector2<f64>,
        bounds: Aabb,
        rotation: f64,
        zoom: f64,
    ) -> Option<HandlePosition> {
        let tolerance = Self::RESIZE_HANDLE_TOLERANCE / zoom;
        let center = bounds.center().coords;
        let corner = |handle: HandlePosition| {
            geometry::rotate_point_about(handle.point_in_bounds(bounds), center, rotation)
        };
        let edges = [
            (HandlePosition::North, HandlePosition::NorthWest, HandlePosition::NorthEast),
            (HandlePosition::East, HandlePosition::NorthEast, HandlePosition::SouthEast),
            (HandlePosition::South, HandlePosition::SouthWest, HandlePosition::SouthEast),
            (HandlePosition::West, HandlePosition::NorthWest, HandlePosition::SouthWest),
        ];
        edges.iter().find_map(|(mid, a, b)| {
            (geometry::dist_to_segment(pos, corner(*a), corner(*b)) <= tolerance).then_some(*mid)
        })
    }

    /// The handle tab above a frame's top edge.
    pub(super) fn frame_handle_bounds(frame: &Element, zoom: f64) -> Aabb {
        let bounds = frame.bounds();
        let height = Self::FRAME_HANDLE_HEIGHT / zoom;
        let width = bounds.extents()[0].min(120.0 / zoom);
        Aabb::new(
            na::point![bounds.mins[0], bounds.mins[1] - height],
            na::point![bounds.mins[0] + width, bounds.mins[1]],
        )
    }

    /// The topmost selectable element under the position. Frames are only reachable
    /// through their handle, lasers never.
    pub(super) fn topmost_element_at<'e>(
        elements: &'e [Element],
        pos: na::Vector2<f64>,
        remote: &HashSet<ElementId>,
        zoom: f64,
    ) -> Option<&'e Element> {
        elements
            .iter()
            .filter(|e| e.is_selectable() && !remote.contains(&e.id))
            .filter(|e| !matches!(e.body, Body::Frame(_)))
            .filter(|e| match &e.body {
                Body::Pen(path) => {
                    polyline::dist_to_polyline(pos, &path.points)
                        <= (e.stroke_width * 2.0).max(5.0 / zoom)
                }
                Body::Line(connector) | Body::Arrow(connector) => {
                    let rendered = polyline::connector_polyline(connector);
                    polyline::dist_to_polyline(pos, &rendered)
                        <= (e.stroke_width * 2.0).max(5.0 / zoom)
                }
                _ => {
                    let bounds = e.bounds();
                    let local = geometry::rotate_point_about(
                        pos,
                        bounds.center().coords,
                        -e.rotation,
                    );
                    local[0] >= bounds.mins[0]
                        && local[0] <= bounds.maxs[0]
                        && local[1] >= bounds.mins[1]
                        && local[1] <= bounds.maxs[1]
                }
            })
            .max_by(|a, b| a.z.total_cmp(&b.z))
    }

    /// The element ids selected by clicking one element: its whole group, or the
    /// element alone when ungrouped.
    pub(super) fn group_members(elements: &[Element], element: &Element) -> Vec<ElementId> {
        match &element.group_id {
            Some(group_id) => elements
                .iter()
                .filter(|e| e.group_id.as_ref() == Some(group_id) && e.is_selectable())
                .map(|e| e.id.clone())
                .collect(),
            None => vec![element.id.clone()],
        }
    }

    /// A frame and its contained descendants, skipping lasers, hidden, locked and
    /// remotely selected elements.
    pub(super) fn frame_with_descendants(
        elements: &[Element],
        frame_id: &str,
        remote: &HashSet<ElementId>,
    ) -> Vec<ElementId> {
        let mut ids = vec![frame_id.to_string()];
        ids.extend(
            elements
                .iter()
                .filter(|e| e.frame_id.as_deref() == Some(frame_id))
                .filter(|e| e.is_selectable() && !remote.contains(&e.id))
                .map(|e| e.id.clone()),
        );
        ids
    }
}

/// The outcome of a resize computation: the new stored bounds (axis-aligned) of one
/// element, rotation unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct ResizedBounds {
    pub bounds: Aabb,
}

/// Resize a single rotated element in its local frame, keeping the handle opposite
/// the dragged one fixed in world space.
///
/// With `allow_mirror` off, dragging past the anchor clamps at the minimum size
/// instead of flipping (text never mirrors).
pub(super) fn resize_single_rotated(
    rotation_deg: f64,
    handle: HandlePosition,
    start_bounds: Aabb,
    pointer: na::Vector2<f64>,
    min_size: na::Vector2<f64>,
    lock_ratio: bool,
    allow_mirror: bool,
) -> ResizedBounds {
    let pre_center = start_bounds.center().coords;
    let sign = handle.resize_sign();
    let anchor_local = handle.opposite().point_in_bounds(start_bounds);
    let anchor_world = geometry::rotate_point_about(anchor_local, pre_center, rotation_deg);
    let pointer_local = geometry::rotate_point_about(pointer, pre_center, -rotation_deg);

    let start_extents = start_bounds.extents();
    let mut width = if sign[0] != 0.0 {
        (pointer_local[0] - anchor_local[0]) * sign[0]
    } else {
        start_extents[0]
    };
    let mut height = if sign[1] != 0.0 {
        (pointer_local[1] - anchor_local[1]) * sign[1]
    } else {
        start_extents[1]
    };

    if lock_ratio && start_extents[0] > 0.0 && start_extents[1] > 0.0 {
        let scale = (width.abs() / start_extents[0]).max(height.abs() / start_extents[1]);
        width = start_extents[0] * scale * if width < 0.0 { -1.0 } else { 1.0 };
        height = start_extents[1] * scale * if height < 0.0 { -1.0 } else { 1.0 };
    }

    if allow_mirror {
        // clamp to the minimum absolute size, preserving the mirror direction
        if width.abs() < min_size[0] {
            width = min_size[0] * if width < 0.0 { -1.0 } else { 1.0 };
        }
        if height.abs() < min_size[1] {
            height = min_size[1] * if height < 0.0 { -1.0 } else { 1.0 };
        }
    } else {
        width = width.max(min_size[0]);
        height = height.max(min_size[1]);
    }

    // the anchor stays fixed in world space; derive the new world center from it
    let center_local_offset = na::vector![
        if sign[0] != 0.0 { sign[0] * width * 0.5 } else { pre_center[0] - anchor_local[0] },
        if sign[1] != 0.0 { sign[1] * height * 0.5 } else { pre_center[1] - anchor_local[1] }
    ];
    let new_center_world =
        anchor_world + geometry::rotate_vector(center_local_offset, rotation_deg.to_radians());

    let half_extents = na::vector![width.abs() * 0.5, height.abs() * 0.5];
    ResizedBounds {
        bounds: Aabb::from_half_extents(new_center_world.into(), half_extents),
    }
}

/// The signed target bounds of an axis-aligned selection resize: the handle opposite
/// the dragged one stays fixed, shift preserves the aspect ratio around it.
pub(super) fn resize_selection_bounds(
    handle: HandlePosition,
    start_bounds: Aabb,
    pointer: na::Vector2<f64>,
    lock_ratio: bool,
) -> (na::Vector2<f64>, na::Vector2<f64>) {
    let sign = handle.resize_sign();
    let anchor = handle.opposite().point_in_bounds(start_bounds);
    let start_extents = start_bounds.extents();

    let mut scale = na::vector![
        if sign[0] != 0.0 && start_extents[0] > 0.0 {
            (pointer[0] - anchor[0]) * sign[0] / start_extents[0]
        } else {
            1.0
        },
        if sign[1] != 0.0 && start_extents[1] > 0.0 {
            (pointer[1] - anchor[1]) * sign[1] / start_extents[1]
        } else {
            1.0
        }
    ];

    if lock_ratio {
        let uniform = scale[0].abs().max(scale[1].abs());
        scale = na::vector![
            uniform * if scale[0] < 0.0 { -1.0 } else { 1.0 },
            uniform * if scale[1] < 0.0 { -1.0 } else { 1.0 }
        ];
    }

    (anchor, scale)
}

/// Scale a point around the anchor with the signed per-axis scale.
pub(super) fn scale_about(
    point: na::Vector2<f64>,
    anchor: na::Vector2<f64>,
    scale: na::Vector2<f64>,
) -> na::Vector2<f64> {
    anchor + (point - anchor).component_mul(&scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rotated_resize_keeps_the_opposite_handle_fixed() {
        for rotation in [-170.0, -90.0, -30.0, 0.0, 15.0, 45.0, 120.0, 180.0] {
            for handle in HandlePosition::ALL {
                let start_bounds = Aabb::new(na::point![100.0, 100.0], na::point![200.0, 160.0]);
                let pre_center = start_bounds.center().coords;
                let anchor_world = geometry::rotate_point_about(
                    handle.opposite().point_in_bounds(start_bounds),
                    pre_center,
                    rotation,
                );

                // drag the handle outward in its world direction
                let handle_world = geometry::rotate_point_about(
                    handle.point_in_bounds(start_bounds),
                    pre_center,
                    rotation,
                );
                let pointer = handle_world
                    + geometry::rotate_vector(
                        handle.resize_sign() * 20.0,
                        rotation.to_radians(),
                    );

                let resized = resize_single_rotated(
                    rotation,
                    handle,
                    start_bounds,
                    pointer,
                    na::vector![2.0, 2.0],
                    false,
                    true,
                );

                let new_center = resized.bounds.center().coords;
                let new_anchor_world = geometry::rotate_point_about(
                    handle.opposite().point_in_bounds(resized.bounds),
                    new_center,
                    rotation,
                );
                assert_relative_eq!(new_anchor_world, anchor_world, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn rotated_resize_grows_along_the_dragged_axis() {
        let start_bounds = Aabb::new(na::point![0.0, 0.0], na::point![100.0, 60.0]);
        // unrotated east drag by +40
        let resized = resize_single_rotated(
            0.0,
            HandlePosition::East,
            start_bounds,
            na::vector![140.0, 30.0],
            na::vector![2.0, 2.0],
            false,
            true,
        );
        assert_relative_eq!(resized.bounds.extents()[0], 140.0);
        assert_relative_eq!(resized.bounds.extents()[1], 60.0);
        assert_relative_eq!(resized.bounds.mins[0], 0.0);

        // rotated by 90 degrees, the same local drag happens along world y
        let resized = resize_single_rotated(
            90.0,
            HandlePosition::East,
            start_bounds,
            na::vector![50.0, 100.0],
            na::vector![2.0, 2.0],
            false,
            true,
        );
        assert_relative_eq!(resized.bounds.extents()[1], 60.0, epsilon = 1e-9);
    }

    #[test]
    fn resize_clamps_to_minimum_size() {
        let start_bounds = Aabb::new(na::point![0.0, 0.0], na::point![100.0, 60.0]);
        let resized = resize_single_rotated(
            0.0,
            HandlePosition::East,
            start_bounds,
            na::vector![0.5, 30.0],
            na::vector![2.0, 2.0],
            false,
            true,
        );
        assert_relative_eq!(resized.bounds.extents()[0], 2.0);
    }

    #[test]
    fn selection_scale_mirrors_past_the_anchor() {
        let start_bounds = Aabb::new(na::point![0.0, 0.0], na::point![100.0, 100.0]);
        let (anchor, scale) = resize_selection_bounds(
            HandlePosition::SouthEast,
            start_bounds,
            na::vector![-50.0, 50.0],
            false,
        );
        assert_eq!(anchor, na::vector![0.0, 0.0]);
        assert_relative_eq!(scale[0], -0.5);
        assert_relative_eq!(scale[1], 0.5);
    }
}
