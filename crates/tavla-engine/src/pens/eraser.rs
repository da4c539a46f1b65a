// Imports
use super::PenBehaviour;
use super::PenStyle;
use crate::WidgetFlags;
use crate::element::{Body, Element, ElementId};
use crate::engine::EngineViewMut;
use crate::router::polyline;
use std::collections::HashSet;
use std::time::Instant;
use tavla_compose::eventresult::{EventPropagation, EventResult};
use tavla_compose::ext::AabbExt;
use tavla_compose::geometry;
use tavla_compose::penevent::{PenEvent, PenProgress};

#[derive(Debug, Clone, Copy)]
pub enum EraserState {
    Up,
    Down(na::Vector2<f64>),
}

/// The eraser. Marks hit elements while dragging and deletes the marked set on
/// pointer up.
#[derive(Debug, Clone)]
pub struct Eraser {
    state: EraserState,
    marked_for_erase: HashSet<ElementId>,
}

impl Default for Eraser {
    fn default() -> Self {
        Self {
            state: EraserState::Up,
            marked_for_erase: HashSet::new(),
        }
    }
}

/// Whether the eraser at `pos` with the given radius hits the element.
pub fn element_hit_by_eraser(element: &Element, pos: na::Vector2<f64>, radius: f64) -> bool {
    if element.hidden {
        return false;
    }
    match &element.body {
        Body::Pen(path) => match path.points.len() {
            0 => false,
            1 => (pos - path.points[0]).magnitude() < radius + element.stroke_width,
            _ => {
                polyline::dist_to_polyline(pos, &path.points) < radius + element.stroke_width
            }
        },
        Body::Laser(trail) => {
            polyline::dist_to_polyline(pos, &trail.points) < radius + element.stroke_width
        }
        Body::Line(connector) | Body::Arrow(connector) => {
            let rendered = polyline::connector_polyline(connector);
            polyline::dist_to_polyline(pos, &rendered) < radius + element.stroke_width
        }
        _ => {
            // box-like kinds: distance to the clamped nearest point, under rotation
            let bounds = element.bounds();
            let local_pos =
                geometry::rotate_point_about(pos, bounds.center().coords, -element.rotation);
            (local_pos - bounds.clamp_point(local_pos)).magnitude() < radius
        }
    }
}

impl Eraser {
    fn mark_hits(&mut self, pos: na::Vector2<f64>, engine_view: &mut EngineViewMut) {
        let radius = engine_view.pens_config.eraser_config.erase_radius();
        let remote = engine_view.store.remotely_selected_ids();

        for element in engine_view.store.elements() {
            if remote.contains(&element.id) || element.locked {
                continue;
            }
            if element_hit_by_eraser(&element, pos, radius) {
                self.marked_for_erase.insert(element.id);
            }
        }
    }

    fn commit(&mut self, engine_view: &mut EngineViewMut, widget_flags: &mut WidgetFlags) {
        if self.marked_for_erase.is_empty() {
            return;
        }
        let ids: Vec<ElementId> = self.marked_for_erase.drain().collect();
        match engine_view.store.delete_many(&ids) {
            Ok(()) => {
                widget_flags.store_modified = true;
            }
            Err(e) => {
                tracing::error!("Failed to erase marked elements, Err: {e:?}");
            }
        }
    }
}

impl PenBehaviour for Eraser {
    fn style(&self) -> PenStyle {
        PenStyle::Eraser
    }

    fn deinit(&mut self) -> WidgetFlags {
        self.state = EraserState::Up;
        self.marked_for_erase.clear();
        WidgetFlags::default()
    }

    fn handle_event(
        &mut self,
        event: PenEvent,
        _now: Instant,
        engine_view: &mut EngineViewMut,
    ) -> (EventResult<PenProgress>, WidgetFlags) {
        let mut widget_flags = WidgetFlags::default();

        let event_result = match (&mut self.state, event) {
            (EraserState::Up, PenEvent::Down { element, .. }) => {
                self.mark_hits(element.pos, engine_view);
                self.state = EraserState::Down(element.pos);
                widget_flags.redraw = true;
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::InProgress,
                }
            }
            (EraserState::Down(current), PenEvent::Down { element, .. }) => {
                *current = element.pos;
                self.mark_hits(element.pos, engine_view);
                widget_flags.redraw = true;
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::InProgress,
                }
            }
            (EraserState::Down(_), PenEvent::Up { element, .. }) => {
                self.mark_hits(element.pos, engine_view);
                self.commit(engine_view, &mut widget_flags);
                self.state = EraserState::Up;
                widget_flags.redraw = true;
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::Finished,
                }
            }
            (EraserState::Down(_), PenEvent::Cancel) => {
                self.marked_for_erase.clear();
                self.state = EraserState::Up;
                widget_flags.redraw = true;
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::Finished,
                }
            }
            (_, _) => EventResult {
                handled: false,
                propagate: EventPropagation::Proceed,
                progress: PenProgress::Idle,
            },
        };

        (event_result, widget_flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{BoxGeometry, Connector, ConnectorStyle};

    #[test]
    fn eraser_hits_elbow_arrow_only_near_segments() {
        let mut connector = Connector::new_sharp(na::vector![0.0, 0.0], na::vector![0.0, 0.0]);
        connector.style = ConnectorStyle::Elbow;
        connector.points = vec![
            na::vector![0.0, 0.0],
            na::vector![100.0, 0.0],
            na::vector![100.0, 100.0],
            na::vector![200.0, 100.0],
        ];
        let mut arrow = Element::new("arrow", Body::Arrow(connector));
        arrow.stroke_width = 2.0;
        // erase radius 2 x stroke: threshold is radius + element stroke width
        let radius = 4.0;

        assert!(element_hit_by_eraser(&arrow, na::vector![50.0, 3.0], radius));
        assert!(element_hit_by_eraser(&arrow, na::vector![104.0, 50.0], radius));
        assert!(!element_hit_by_eraser(&arrow, na::vector![50.0, 50.0], radius));
        assert!(!element_hit_by_eraser(&arrow, na::vector![0.0, 60.0], radius));
    }

    #[test]
    fn eraser_hits_boxes_by_clamped_distance() {
        let rect = Element::new("r1", Body::Rectangle(BoxGeometry::new(0.0, 0.0, 100.0, 50.0)));
        assert!(element_hit_by_eraser(&rect, na::vector![105.0, 25.0], 6.0));
        assert!(!element_hit_by_eraser(&rect, na::vector![110.0, 25.0], 6.0));
        // inside the box the clamped distance is zero
        assert!(element_hit_by_eraser(&rect, na::vector![50.0, 25.0], 6.0));
    }
}
