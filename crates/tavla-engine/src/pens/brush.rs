// Imports
use super::PenBehaviour;
use super::PenStyle;
use super::pensconfig::FillPattern;
use crate::WidgetFlags;
use crate::element::{Body, Element, PenPath};
use crate::engine::EngineViewMut;
use std::time::Instant;
use tavla_compose::eventresult::{EventPropagation, EventResult};
use tavla_compose::geometry;
use tavla_compose::penevent::{PenEvent, PenProgress};

#[derive(Debug, Clone)]
enum BrushState {
    Idle,
    Drawing { points: Vec<na::Vector2<f64>> },
}

/// The freehand pen / highlighter. The stroke accrues points while drawing and
/// commits a single pen element on pointer up.
#[derive(Debug, Clone)]
pub struct Brush {
    state: BrushState,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            state: BrushState::Idle,
        }
    }
}

impl Brush {
    /// Samples closer than this to the previous point are dropped.
    const MIN_SAMPLE_DIST: f64 = 0.5;
    /// Start and end closer than this count as a closed stroke.
    const CLOSE_DIST: f64 = 12.0;

    /// Whether the stroke is closed: endpoints close together, or the path crossing itself.
    fn stroke_is_closed(points: &[na::Vector2<f64>]) -> bool {
        let Some((first, last)) = points.first().zip(points.last()) else {
            return false;
        };
        if points.len() >= 3 && (last - first).magnitude() < Self::CLOSE_DIST {
            return true;
        }
        // self intersection over non-adjacent segment pairs
        for i in 0..points.len().saturating_sub(1) {
            for j in i + 2..points.len().saturating_sub(1) {
                if geometry::segments_intersect(
                    points[i],
                    points[i + 1],
                    points[j],
                    points[j + 1],
                ) {
                    return true;
                }
            }
        }
        false
    }
}

impl PenBehaviour for Brush {
    fn style(&self) -> PenStyle {
        PenStyle::Brush
    }

    fn deinit(&mut self) -> WidgetFlags {
        self.state = BrushState::Idle;
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
            (BrushState::Idle, PenEvent::Down { element, .. }) => {
                self.state = BrushState::Drawing {
                    points: vec![element.pos],
                };
                widget_flags.redraw = true;
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::InProgress,
                }
            }
            (BrushState::Drawing { points }, PenEvent::Down { element, .. }) => {
                if points
                    .last()
                    .map_or(true, |last| (element.pos - last).magnitude() >= Self::MIN_SAMPLE_DIST)
                {
                    points.push(element.pos);
                    widget_flags |= engine_view.camera.nudge_w_pos(element.pos);
                    widget_flags.redraw = true;
                }
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::InProgress,
                }
            }
            (BrushState::Drawing { points }, PenEvent::Up { element, .. }) => {
                let mut points = std::mem::take(points);
                if points
                    .last()
                    .map_or(true, |last| (element.pos - last).magnitude() >= Self::MIN_SAMPLE_DIST)
                {
                    points.push(element.pos);
                }
                self.state = BrushState::Idle;

                let config = engine_view.pens_config.brush_config.clone();
                let is_closed = Self::stroke_is_closed(&points);
                let fill_color = if is_closed && config.fill_pattern == FillPattern::Solid {
                    Some(config.fill_color.unwrap_or(config.stroke.color))
                } else {
                    None
                };

                let mut element = Element::new(
                    engine_view.fresh_element_id(),
                    Body::Pen(PenPath {
                        points,
                        is_closed,
                        fill_color,
                    }),
                );
                element.stroke_color = config.stroke.color;
                element.stroke_width = config.effective_width();
                element.opacity = config.effective_opacity();

                if let Err(e) = engine_view.store.add(element) {
                    tracing::error!("Failed to add pen stroke to the store, Err: {e:?}");
                } else {
                    widget_flags.store_modified = true;
                }
                widget_flags.redraw = true;

                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::Finished,
                }
            }
            (BrushState::Drawing { .. }, PenEvent::Cancel) => {
                self.state = BrushState::Idle;
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

    #[test]
    fn closure_by_endpoint_proximity() {
        let points = vec![
            na::vector![0.0, 0.0],
            na::vector![100.0, 0.0],
            na::vector![100.0, 100.0],
            na::vector![2.0, 4.0],
        ];
        assert!(Brush::stroke_is_closed(&points));
    }

    #[test]
    fn closure_by_self_intersection() {
        let points = vec![
            na::vector![0.0, 0.0],
            na::vector![100.0, 0.0],
            na::vector![100.0, 50.0],
            na::vector![50.0, -50.0],
        ];
        assert!(Brush::stroke_is_closed(&points));
    }

    #[test]
    fn open_stroke_is_not_closed() {
        let points = vec![
            na::vector![0.0, 0.0],
            na::vector![100.0, 0.0],
            na::vector![200.0, 50.0],
        ];
        assert!(!Brush::stroke_is_closed(&points));
    }
}
