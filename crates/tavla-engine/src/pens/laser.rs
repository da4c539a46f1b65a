// Imports
use super::PenBehaviour;
use super::PenStyle;
use crate::WidgetFlags;
use crate::element::{Body, Element, LaserTrail};
use crate::engine::EngineViewMut;
use std::time::Instant;
use tavla_compose::eventresult::{EventPropagation, EventResult};
use tavla_compose::penevent::{PenEvent, PenProgress};

#[derive(Debug, Clone)]
enum LaserState {
    Idle,
    Drawing { points: Vec<na::Vector2<f64>> },
}

/// The laser pointer. Commits an ephemeral trail element which the renderer fades
/// out on its own schedule.
#[derive(Debug, Clone)]
pub struct LaserPen {
    state: LaserState,
}

impl Default for LaserPen {
    fn default() -> Self {
        Self {
            state: LaserState::Idle,
        }
    }
}

impl PenBehaviour for LaserPen {
    fn style(&self) -> PenStyle {
        PenStyle::LaserPen
    }

    fn deinit(&mut self) -> WidgetFlags {
        self.state = LaserState::Idle;
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
            (LaserState::Idle, PenEvent::Down { element, .. }) => {
                self.state = LaserState::Drawing {
                    points: vec![element.pos],
                };
                widget_flags.redraw = true;
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::InProgress,
                }
            }
            (LaserState::Drawing { points }, PenEvent::Down { element, .. }) => {
                points.push(element.pos);
                widget_flags.redraw = true;
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::InProgress,
                }
            }
            (LaserState::Drawing { points }, PenEvent::Up { element, .. }) => {
                let mut points = std::mem::take(points);
                points.push(element.pos);
                self.state = LaserState::Idle;

                let mut laser = Element::new(
                    engine_view.fresh_element_id(),
                    Body::Laser(LaserTrail {
                        points,
                        timestamp: engine_view.now_ms,
                    }),
                );
                laser.stroke_width = 3.0;

                if let Err(e) = engine_view.store.add(laser) {
                    tracing::error!("Failed to add laser trail to the store, Err: {e:?}");
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
            (LaserState::Drawing { .. }, PenEvent::Cancel) => {
                self.state = LaserState::Idle;
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
