// Modules
pub mod brush;
pub mod connectorpen;
pub mod eraser;
pub mod hand;
pub mod laser;
pub mod penbehaviour;
pub mod penholder;
pub mod pensconfig;
pub mod selector;
pub mod shaper;
pub mod tilepen;
pub mod typewriter;

// Re-exports
pub use brush::Brush;
pub use connectorpen::ConnectorPen;
pub use eraser::Eraser;
pub use hand::Hand;
pub use laser::LaserPen;
pub use penbehaviour::PenBehaviour;
pub use penholder::PenHolder;
pub use pensconfig::PensConfig;
pub use selector::Selector;
pub use shaper::Shaper;
pub use tilepen::TilePen;
pub use typewriter::Typewriter;

// Imports
use crate::WidgetFlags;
use crate::engine::EngineViewMut;
use core::fmt::Display;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tavla_compose::EventResult;
use tavla_compose::penevent::{PenEvent, PenProgress};

#[derive(Debug)]
pub enum Pen {
    Hand(Hand),
    Selector(Selector),
    Brush(Brush),
    ConnectorPen(ConnectorPen),
    Shaper(Shaper),
    Typewriter(Typewriter),
    Eraser(Eraser),
    LaserPen(LaserPen),
    TilePen(TilePen),
}

impl Default for Pen {
    fn default() -> Self {
        Self::Selector(Selector::default())
    }
}

impl Pen {
    pub fn new(style: PenStyle) -> Self {
        match style {
            PenStyle::Hand => Self::Hand(Hand::default()),
            PenStyle::Selector => Self::Selector(Selector::default()),
            PenStyle::Brush => Self::Brush(Brush::default()),
            PenStyle::ConnectorPen => Self::ConnectorPen(ConnectorPen::default()),
            PenStyle::Shaper => Self::Shaper(Shaper::default()),
            PenStyle::Typewriter => Self::Typewriter(Typewriter::default()),
            PenStyle::Eraser => Self::Eraser(Eraser::default()),
            PenStyle::LaserPen => Self::LaserPen(LaserPen::default()),
            PenStyle::TilePen => Self::TilePen(TilePen::default()),
        }
    }
}

impl PenBehaviour for Pen {
    fn init(&mut self, engine_view: &mut EngineViewMut) -> WidgetFlags {
        match self {
            Pen::Hand(hand) => hand.init(engine_view),
            Pen::Selector(selector) => selector.init(engine_view),
            Pen::Brush(brush) => brush.init(engine_view),
            Pen::ConnectorPen(connectorpen) => connectorpen.init(engine_view),
            Pen::Shaper(shaper) => shaper.init(engine_view),
            Pen::Typewriter(typewriter) => typewriter.init(engine_view),
            Pen::Eraser(eraser) => eraser.init(engine_view),
            Pen::LaserPen(laserpen) => laserpen.init(engine_view),
            Pen::TilePen(tilepen) => tilepen.init(engine_view),
        }
    }

    fn deinit(&mut self) -> WidgetFlags {
        match self {
            Pen::Hand(hand) => hand.deinit(),
            Pen::Selector(selector) => selector.deinit(),
            Pen::Brush(brush) => brush.deinit(),
            Pen::ConnectorPen(connectorpen) => connectorpen.deinit(),
            Pen::Shaper(shaper) => shaper.deinit(),
            Pen::Typewriter(typewriter) => typewriter.deinit(),
            Pen::Eraser(eraser) => eraser.deinit(),
            Pen::LaserPen(laserpen) => laserpen.deinit(),
            Pen::TilePen(tilepen) => tilepen.deinit(),
        }
    }

    fn style(&self) -> PenStyle {
        match self {
            Pen::Hand(hand) => hand.style(),
            Pen::Selector(selector) => selector.style(),
            Pen::Brush(brush) => brush.style(),
            Pen::ConnectorPen(connectorpen) => connectorpen.style(),
            Pen::Shaper(shaper) => shaper.style(),
            Pen::Typewriter(typewriter) => typewriter.style(),
            Pen::Eraser(eraser) => eraser.style(),
            Pen::LaserPen(laserpen) => laserpen.style(),
            Pen::TilePen(tilepen) => tilepen.style(),
        }
    }

    fn update_state(&mut self, engine_view: &mut EngineViewMut) -> WidgetFlags {
        match self {
            Pen::Hand(hand) => hand.update_state(engine_view),
            Pen::Selector(selector) => selector.update_state(engine_view),
            Pen::Brush(brush) => brush.update_state(engine_view),
            Pen::ConnectorPen(connectorpen) => connectorpen.update_state(engine_view),
            Pen::Shaper(shaper) => shaper.update_state(engine_view),
            Pen::Typewriter(typewriter) => typewriter.update_state(engine_view),
            Pen::Eraser(eraser) => eraser.update_state(engine_view),
            Pen::LaserPen(laserpen) => laserpen.update_state(engine_view),
            Pen::TilePen(tilepen) => tilepen.update_state(engine_view),
        }
    }

    fn handle_event(
        &mut self,
        event: PenEvent,
        now: Instant,
        engine_view: &mut EngineViewMut,
    ) -> (EventResult<PenProgress>, WidgetFlags) {
        match self {
            Pen::Hand(hand) => hand.handle_event(event, now, engine_view),
            Pen::Selector(selector) => selector.handle_event(event, now, engine_view),
            Pen::Brush(brush) => brush.handle_event(event, now, engine_view),
            Pen::ConnectorPen(connectorpen) => connectorpen.handle_event(event, now, engine_view),
            Pen::Shaper(shaper) => shaper.handle_event(event, now, engine_view),
            Pen::Typewriter(typewriter) => typewriter.handle_event(event, now, engine_view),
            Pen::Eraser(eraser) => eraser.handle_event(event, now, engine_view),
            Pen::LaserPen(laserpen) => laserpen.handle_event(event, now, engine_view),
            Pen::TilePen(tilepen) => tilepen.handle_event(event, now, engine_view),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename = "pen_style")]
pub enum PenStyle {
    #[serde(rename = "hand")]
    Hand,
    #[default]
    #[serde(rename = "selector")]
    Selector,
    #[serde(rename = "brush")]
    Brush,
    #[serde(rename = "connectorpen")]
    ConnectorPen,
    #[serde(rename = "shaper")]
    Shaper,
    #[serde(rename = "typewriter")]
    Typewriter,
    #[serde(rename = "eraser")]
    Eraser,
    #[serde(rename = "laserpen")]
    LaserPen,
    #[serde(rename = "tilepen")]
    TilePen,
}

impl Display for PenStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PenStyle::Hand => write!(f, "hand"),
            PenStyle::Selector => write!(f, "selector"),
            PenStyle::Brush => write!(f, "brush"),
            PenStyle::ConnectorPen => write!(f, "connectorpen"),
            PenStyle::Shaper => write!(f, "shaper"),
            PenStyle::Typewriter => write!(f, "typewriter"),
            PenStyle::Eraser => write!(f, "eraser"),
            PenStyle::LaserPen => write!(f, "laserpen"),
            PenStyle::TilePen => write!(f, "tilepen"),
        }
    }
}
