// Imports
use super::PenStyle;
use crate::WidgetFlags;
use crate::engine::EngineViewMut;
use std::time::Instant;
use tavla_compose::EventResult;
use tavla_compose::penevent::{PenEvent, PenProgress};

/// Types that are pens.
pub trait PenBehaviour {
    /// Init the pen.
    ///
    /// Called right after the pen becomes the current one.
    fn init(&mut self, _engine_view: &mut EngineViewMut) -> WidgetFlags {
        WidgetFlags::default()
    }

    /// Deinit the pen. Cancels any gesture in progress.
    fn deinit(&mut self) -> WidgetFlags {
        WidgetFlags::default()
    }

    /// The pen style.
    fn style(&self) -> PenStyle;

    /// Update the pen state with the state from the engine.
    fn update_state(&mut self, _engine_view: &mut EngineViewMut) -> WidgetFlags {
        WidgetFlags::default()
    }

    /// Handle a pen event.
    fn handle_event(
        &mut self,
        event: PenEvent,
        now: Instant,
        engine_view: &mut EngineViewMut,
    ) -> (EventResult<PenProgress>, WidgetFlags);
}
