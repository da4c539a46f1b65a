// Imports
use super::PenBehaviour;
use super::PenStyle;
use crate::WidgetFlags;
use crate::element::{Body, BoxGeometry, Element, Tile};
use crate::engine::EngineViewMut;
use std::time::Instant;
use tavla_compose::eventresult::{EventPropagation, EventResult};
use tavla_compose::penevent::{PenEvent, PenProgress};

#[derive(Debug, Clone, Copy)]
enum TilePenState {
    Idle,
    /// The tile was created on pointer down and follows the pointer until release.
    Placing,
}

/// The tile pen. Unlike shapes, tiles are created on pointer down at their default
/// size.
#[derive(Debug, Clone)]
pub struct TilePen {
    state: TilePenState,
    placed_id: Option<String>,
}

impl Default for TilePen {
    fn default() -> Self {
        Self {
            state: TilePenState::Idle,
            placed_id: None,
        }
    }
}

impl PenBehaviour for TilePen {
    fn style(&self) -> PenStyle {
        PenStyle::TilePen
    }

    fn deinit(&mut self) -> WidgetFlags {
        self.state = TilePenState::Idle;
        self.placed_id = None;
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
            (TilePenState::Idle, PenEvent::Down { element, .. }) => {
                let tile_type = engine_view.pens_config.tile_config.selected_tile_type.clone();
                let size = engine_view.tile_metrics.default_tile_size(&tile_type);

                let tile = Element::new(
                    engine_view.fresh_element_id(),
                    Body::Tile(Tile {
                        geometry: BoxGeometry::new(
                            element.pos[0] - size[0] * 0.5,
                            element.pos[1] - size[1] * 0.5,
                            size[0],
                            size[1],
                        ),
                        tile_type,
                    }),
                );
                let id = tile.id.clone();

                match engine_view.store.add(tile) {
                    Ok(()) => {
                        self.placed_id = Some(id);
                        self.state = TilePenState::Placing;
                        widget_flags.store_modified = true;
                    }
                    Err(e) => {
                        tracing::error!("Failed to add tile to the store, Err: {e:?}");
                    }
                }
                widget_flags.redraw = true;

                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::InProgress,
                }
            }
            (TilePenState::Placing, PenEvent::Down { element, .. }) => {
                if let Some(id) = &self.placed_id {
                    if let Some(tile) = engine_view
                        .store
                        .elements()
                        .into_iter()
                        .find(|e| &e.id == id)
                    {
                        let bounds = tile.bounds();
                        let patch = crate::ports::ElementPatch {
                            x: Some(element.pos[0] - bounds.extents()[0] * 0.5),
                            y: Some(element.pos[1] - bounds.extents()[1] * 0.5),
                            ..Default::default()
                        };
                        if let Err(e) = engine_view.store.update(id, patch) {
                            tracing::error!("Failed to move placed tile, Err: {e:?}");
                        } else {
                            widget_flags.store_modified = true;
                            widget_flags.redraw = true;
                        }
                    }
                }
                EventResult {
                    handled: true,
                    propagate: EventPropagation::Stop,
                    progress: PenProgress::InProgress,
                }
            }
            (TilePenState::Placing, PenEvent::Up { .. } | PenEvent::Cancel) => {
                self.state = TilePenState::Idle;
                self.placed_id = None;
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
