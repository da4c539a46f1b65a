// Imports
use super::PenBehaviour;
use super::PenStyle;
use crate::WidgetFlags;
use crate::element::{Body, BoxGeometry, Element, TextBlock};
use crate::engine::EngineViewMut;
use std::time::Instant;
use tavla_compose::eventresult::{EventPropagation, EventResult};
use tavla_compose::penevent::{PenEvent, PenProgress};

#[derive(Debug, Clone, Copy)]
enum TypewriterState {
    Idle,
    /// Pressed down on empty canvas, the element is created on pointer up.
    Pending { pos: na::Vector2<f64> },
}

/// The typewriter creates text elements and hands them to the host text editor.
/// The editing itself is external; the engine only flags which element to edit.
#[derive(Debug, Clone)]
pub struct Typewriter {
    state: TypewriterState,
}

impl Default for Typewriter {
    fn default() -> Self {
        Self {
            state: TypewriterState::Idle,
        }
    }
}

impl PenBehaviour for Typewriter {
    fn style(&self) -> PenStyle {
        PenStyle::Typewriter
    }

    fn deinit(&mut self) -> WidgetFlags {
        self.state = TypewriterState::Idle;
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
            (TypewriterState::Idle, PenEvent::Down { element, .. }) => {
                // pressing an existing text element starts editing it instead
                let hit = engine_view
                    .store
                    .elements()
                    .into_iter()
                    .filter(|e| matches!(e.body, Body::Text(_)) && !e.hidden)
                    .filter(|e| {
                        let bounds = e.world_bounds();
                        element.pos[0] >= bounds.mins[0]
                            && element.pos[0] <= bounds.maxs[0]
                            && element.pos[1] >= bounds.mins[1]
                            && element.pos[1] <= bounds.maxs[1]
                    })
                    .max_by(|a, b| a.z.total_cmp(&b.z));

                if let Some(hit) = hit {
                    widget_flags.edit_text = Some(hit.id);
                    EventResult {
                        handled: true,
                        propagate: EventPropagation::Stop,
                        progress: PenProgress::Finished,
                    }
                } else {
                    self.state = TypewriterState::Pending { pos: element.pos };
                    EventResult {
                        handled: true,
                        propagate: EventPropagation::Stop,
                        progress: PenProgress::InProgress,
                    }
                }
            }
            (TypewriterState::Pending { pos }, PenEvent::Up { .. }) => {
                let pos = *pos;
                self.state = TypewriterState::Idle;

                let config = engine_view.pens_config.typewriter_config.clone();
                let width = engine_view.text_metrics.min_single_char_width(
                    "W",
                    config.font_size,
                    &config.font_family,
                    config.letter_spacing,
                );
                let height = config.font_size * config.line_height;

                let mut text_element = Element::new(
                    engine_view.fresh_element_id(),
                    Body::Text(TextBlock {
                        geometry: BoxGeometry::new(pos[0], pos[1], width, height),
                        text: String::new(),
                        font_size: config.font_size,
                        font_family: config.font_family.clone(),
                        line_height: config.line_height,
                        letter_spacing: config.letter_spacing,
                        text_align: config.text_align,
                        is_text_box: false,
                    }),
                );
                text_element.stroke_color = config.color;
                let id = text_element.id.clone();

                if let Err(e) = engine_view.store.add(text_element) {
                    tracing::error!("Failed to add text element to the store, Err: {e:?}");
                } else {
                    widget_flags.store_modified = true;
                    widget_flags.edit_text = Some(id);
                }
                widget_flags.redraw = true;

                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::Finished,
                }
            }
            (TypewriterState::Pending { .. }, PenEvent::Cancel) => {
                self.state = TypewriterState::Idle;
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
