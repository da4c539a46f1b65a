// Imports
use super::pensconfig::Tool;
use super::{Hand, Pen, PenBehaviour, PenStyle};
use crate::WidgetFlags;
use crate::engine::EngineViewMut;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tavla_compose::eventresult::EventPropagation;
use tavla_compose::penevent::{PenEvent, PenProgress, PointerButton};

/// The Penholder holds the pens and related state and handles pen events.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default, rename = "penholder")]
pub struct PenHolder {
    #[serde(rename = "tool")]
    tool: Tool,

    #[serde(skip)]
    current_pen: Pen,
    #[serde(skip)]
    progress: PenProgress,
    /// Middle-button drags pan through a temporary hand, regardless of the tool.
    #[serde(skip)]
    temporary_hand: Option<Hand>,
}

impl Default for PenHolder {
    fn default() -> Self {
        Self {
            tool: Tool::default(),
            current_pen: Pen::default(),
            progress: PenProgress::Idle,
            temporary_hand: None,
        }
    }
}

impl PenHolder {
    /// The current toolbar tool.
    pub fn current_tool(&self) -> Tool {
        self.tool
    }

    /// The style of the current pen.
    pub fn current_pen_style(&self) -> PenStyle {
        self.current_pen.style()
    }

    /// The current pen progress.
    pub fn current_pen_progress(&self) -> PenProgress {
        self.progress
    }

    pub fn current_pen_ref(&self) -> &Pen {
        &self.current_pen
    }

    /// Change the active tool, configuring the matching pen.
    pub fn change_tool(&mut self, tool: Tool, engine_view: &mut EngineViewMut) -> WidgetFlags {
        let mut widget_flags = WidgetFlags::default();

        configure_tool(tool, engine_view);
        let style = tool_style(tool);

        if style != self.current_pen.style() {
            widget_flags |= self.current_pen.deinit();
            self.current_pen = Pen::new(style);
            widget_flags |= self.current_pen.init(engine_view);
        }
        widget_flags |= self.current_pen.update_state(engine_view);

        self.tool = tool;
        self.progress = PenProgress::Idle;
        widget_flags.refresh_ui = true;
        widget_flags.redraw = true;
        widget_flags
    }

    /// Handle a pen event, dispatching to the current pen (or the temporary pan).
    pub(crate) fn handle_pen_event(
        &mut self,
        event: PenEvent,
        now: Instant,
        engine_view: &mut EngineViewMut,
    ) -> (EventPropagation, WidgetFlags) {
        let mut widget_flags = WidgetFlags::default();

        // middle button pans regardless of the active tool
        if self.temporary_hand.is_some() || is_middle_button_down(&event) {
            let mut hand = self.temporary_hand.take().unwrap_or_default();
            let (event_result, wf) = hand.handle_event(event, now, engine_view);
            widget_flags |= wf;
            if event_result.progress != PenProgress::Finished {
                self.temporary_hand = Some(hand);
            }
            return (event_result.propagate, widget_flags);
        }

        // read-only boards only allow panning
        if engine_view.pens_config.is_read_only && self.current_pen.style() != PenStyle::Hand {
            return (EventPropagation::Proceed, widget_flags);
        }

        let (event_result, wf) = self.current_pen.handle_event(event, now, engine_view);
        widget_flags |= wf;
        self.progress = event_result.progress;

        if event_result.progress == PenProgress::Finished {
            widget_flags |= self.handle_changed_pen_progress(engine_view);
        }

        (event_result.propagate, widget_flags)
    }

    fn handle_changed_pen_progress(&mut self, engine_view: &mut EngineViewMut) -> WidgetFlags {
        let mut widget_flags = WidgetFlags::default();

        // most tools switch back to select after a commit; pen, highlighter, eraser
        // and laser keep drawing
        let auto_switches = matches!(
            self.tool,
            Tool::Lasso
                | Tool::Line
                | Tool::Arrow
                | Tool::Rectangle
                | Tool::Diamond
                | Tool::Ellipse
                | Tool::Frame
                | Tool::Text
                | Tool::Tile
        );
        if auto_switches && !engine_view.pens_config.is_tool_locked {
            widget_flags |= self.change_tool(Tool::Select, engine_view);
        }

        widget_flags
    }
}

fn is_middle_button_down(event: &PenEvent) -> bool {
    match event {
        PenEvent::Down { element, .. } => element.button == PointerButton::Middle,
        _ => false,
    }
}

/// The pen style a toolbar tool maps to.
fn tool_style(tool: Tool) -> PenStyle {
    match tool {
        Tool::Hand => PenStyle::Hand,
        Tool::Select | Tool::Lasso => PenStyle::Selector,
        Tool::Pen | Tool::Highlighter => PenStyle::Brush,
        Tool::Line | Tool::Arrow => PenStyle::ConnectorPen,
        Tool::Rectangle | Tool::Diamond | Tool::Ellipse | Tool::Frame => PenStyle::Shaper,
        Tool::Eraser => PenStyle::Eraser,
        Tool::Text => PenStyle::Typewriter,
        Tool::Laser => PenStyle::LaserPen,
        Tool::Tile => PenStyle::TilePen,
    }
}

/// Adjust the pen configs to the chosen tool.
fn configure_tool(tool: Tool, engine_view: &mut EngineViewMut) {
    use crate::pens::pensconfig::connectorconfig::ConnectorKind;
    use crate::pens::pensconfig::selectorconfig::SelectorStyle;
    use crate::pens::pensconfig::shaperconfig::ShapeKind;

    let config = &mut *engine_view.pens_config;
    match tool {
        Tool::Select => config.selector_config.style = SelectorStyle::Rectangle,
        Tool::Lasso => config.selector_config.style = SelectorStyle::Lasso,
        Tool::Pen => config.brush_config.highlighter = false,
        Tool::Highlighter => config.brush_config.highlighter = true,
        Tool::Line => config.connector_config.kind = ConnectorKind::Line,
        Tool::Arrow => config.connector_config.kind = ConnectorKind::Arrow,
        Tool::Rectangle => config.shaper_config.kind = ShapeKind::Rectangle,
        Tool::Diamond => config.shaper_config.kind = ShapeKind::Diamond,
        Tool::Ellipse => config.shaper_config.kind = ShapeKind::Ellipse,
        Tool::Frame => config.shaper_config.kind = ShapeKind::Frame,
        Tool::Hand | Tool::Eraser | Tool::Text | Tool::Laser | Tool::Tile => {}
    }
}
