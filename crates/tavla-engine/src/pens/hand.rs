// Imports
use super::PenBehaviour;
use super::PenStyle;
use crate::WidgetFlags;
use crate::engine::EngineViewMut;
use std::time::Instant;
use tavla_compose::eventresult::{EventPropagation, EventResult};
use tavla_compose::penevent::{PenEvent, PenProgress};

#[derive(Debug, Clone, Copy)]
enum HandState {
    Idle,
    /// The world point under the cursor when the pan started. Kept fixed: after each
    /// offset adjustment the same surface position maps back onto it.
    Panning { anchor: na::Vector2<f64> },
}

/// The hand pen, panning the camera.
#[derive(Debug, Clone, Copy)]
pub struct Hand {
    state: HandState,
}

impl Default for Hand {
    fn default() -> Self {
        Self {
            state: HandState::Idle,
        }
    }
}

impl PenBehaviour for Hand {
    fn style(&self) -> PenStyle {
        PenStyle::Hand
    }

    fn deinit(&mut self) -> WidgetFlags {
        self.state = HandState::Idle;
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
            (HandState::Idle, PenEvent::Down { element, .. }) => {
                self.state = HandState::Panning {
                    anchor: element.pos,
                };
                widget_flags.cursor = Some("grabbing");
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::InProgress,
                }
            }
            (HandState::Panning { anchor }, PenEvent::Down { element, .. }) => {
                let delta = element.pos - *anchor;
                let zoom = engine_view.camera.zoom();
                let offset = engine_view.camera.offset();
                widget_flags |= engine_view.camera.set_offset(offset - delta * zoom);
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::InProgress,
                }
            }
            (HandState::Panning { .. }, PenEvent::Up { .. } | PenEvent::Cancel) => {
                self.state = HandState::Idle;
                widget_flags.cursor = Some("grab");
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
