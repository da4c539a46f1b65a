// Imports
use crate::pens::pensconfig::Tool;
use crate::pens::{PenHolder, PensConfig};
use crate::ports::{CollabPort, StorePort, TextMetricsPort, TileMetricsPort};
use crate::{Camera, WidgetFlags};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tavla_compose::penevent::{
    KeyboardKey, ModifierKey, PenEvent, PointerButton, PointerElement,
};

/// Source of fresh element ids: a session prefix plus a growing counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename = "element_id_source")]
pub struct ElementIdSource {
    #[serde(rename = "prefix")]
    prefix: String,
    #[serde(rename = "counter")]
    counter: u64,
}

impl Default for ElementIdSource {
    fn default() -> Self {
        Self {
            prefix: String::from("el"),
            counter: 0,
        }
    }
}

impl ElementIdSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("{}-{}", self.prefix, self.counter)
    }
}

/// The host-owned ports, passed into every engine call.
#[derive(Debug)]
pub struct EnginePorts<'a> {
    pub store: &'a mut dyn StorePort,
    pub collab: &'a mut dyn CollabPort,
    pub text_metrics: &'a dyn TextMetricsPort,
    pub tile_metrics: &'a dyn TileMetricsPort,
}

/// A mutable view into the engine and its ports, excluding the penholder.
#[derive(Debug)]
pub struct EngineViewMut<'a> {
    pub pens_config: &'a mut PensConfig,
    pub camera: &'a mut Camera,
    pub store: &'a mut dyn StorePort,
    pub collab: &'a mut dyn CollabPort,
    pub text_metrics: &'a dyn TextMetricsPort,
    pub tile_metrics: &'a dyn TileMetricsPort,
    pub ids: &'a mut ElementIdSource,
    /// Milliseconds since engine start, for laser timestamps.
    pub now_ms: u64,
}

impl EngineViewMut<'_> {
    /// A fresh element id.
    pub fn fresh_element_id(&mut self) -> String {
        self.ids.next_id()
    }
}

/// A raw pointer event as delivered by the host, in client coordinates.
#[derive(Debug, Clone, Copy)]
pub struct RawPointerEvent {
    pub client_x: f64,
    pub client_y: f64,
    /// 0 = left, 1 = middle, 2 = right.
    pub button: u8,
    /// Bitmask of the held buttons (1 = left, 4 = middle, 2 = right).
    pub buttons: u8,
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    /// The click count, 1 for single clicks.
    pub detail: u8,
}

impl RawPointerEvent {
    /// A plain left-button event at the client position.
    pub fn new(client_x: f64, client_y: f64) -> Self {
        Self {
            client_x,
            client_y,
            button: 0,
            buttons: 1,
            shift: false,
            ctrl: false,
            meta: false,
            alt: false,
            detail: 1,
        }
    }

    fn pointer_button(&self) -> PointerButton {
        match self.button {
            0 => PointerButton::Left,
            1 => PointerButton::Middle,
            2 => PointerButton::Right,
            _ => PointerButton::Other,
        }
    }

    /// The button derived from the held-buttons mask, for move events.
    fn held_button(&self) -> PointerButton {
        if self.buttons & 4 != 0 {
            PointerButton::Middle
        } else if self.buttons & 2 != 0 {
            PointerButton::Right
        } else {
            PointerButton::Left
        }
    }

    fn modifier_keys(&self) -> Vec<ModifierKey> {
        let mut keys = Vec::new();
        if self.shift {
            keys.push(ModifierKey::KeyboardShift);
        }
        if self.ctrl {
            keys.push(ModifierKey::KeyboardCtrl);
        }
        if self.alt {
            keys.push(ModifierKey::KeyboardAlt);
        }
        if self.meta {
            keys.push(ModifierKey::KeyboardMeta);
        }
        keys
    }
}

/// The engine: owns the camera, the pen configs and the pen state machines, and turns
/// raw pointer input into element updates through the ports.
#[derive(Debug)]
pub struct Engine {
    camera: Camera,
    pens_config: PensConfig,
    penholder: PenHolder,
    ids: ElementIdSource,
    epoch: Instant,
    /// The last pointer position in world coordinates, broadcast once per frame.
    last_cursor_pos: Option<na::Vector2<f64>>,
    cursor_dirty: bool,
    viewport_dirty: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            pens_config: PensConfig::default(),
            penholder: PenHolder::default(),
            ids: ElementIdSource::default(),
            epoch: Instant::now(),
            last_cursor_pos: None,
            cursor_dirty: false,
            viewport_dirty: false,
        }
    }
}

impl Engine {
    pub fn new(id_prefix: impl Into<String>) -> Self {
        Self {
            ids: ElementIdSource::new(id_prefix),
            ..Default::default()
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn pens_config(&self) -> &PensConfig {
        &self.pens_config
    }

    pub fn pens_config_mut(&mut self) -> &mut PensConfig {
        &mut self.pens_config
    }

    pub fn current_tool(&self) -> Tool {
        self.penholder.current_tool()
    }

    /// Change the active tool.
    pub fn change_tool(
        &mut self,
        tool: Tool,
        ports: &mut EnginePorts,
        now: Instant,
    ) -> WidgetFlags {
        let now_ms = self.now_ms(now);
        let mut view = EngineViewMut {
            pens_config: &mut self.pens_config,
            camera: &mut self.camera,
            store: &mut *ports.store,
            collab: &mut *ports.collab,
            text_metrics: ports.text_metrics,
            tile_metrics: ports.tile_metrics,
            ids: &mut self.ids,
            now_ms,
        };
        self.penholder.change_tool(tool, &mut view)
    }

    /// Convert the client position of a raw event into world coordinates.
    ///
    /// `rect_origin` is the canvas origin in client coordinates.
    fn world_pos(&self, raw: &RawPointerEvent, rect_origin: na::Vector2<f64>) -> na::Vector2<f64> {
        self.camera
            .surface_to_world(na::vector![raw.client_x, raw.client_y] - rect_origin)
    }

    pub fn handle_pointer_down(
        &mut self,
        raw: RawPointerEvent,
        rect_origin: na::Vector2<f64>,
        now: Instant,
        ports: &mut EnginePorts,
    ) -> WidgetFlags {
        let pos = self.world_pos(&raw, rect_origin);
        self.track_cursor(pos);
        let event = PenEvent::Down {
            element: PointerElement {
                pos,
                button: raw.pointer_button(),
                click_count: raw.detail.max(1),
            },
            modifier_keys: raw.modifier_keys(),
        };
        self.handle_pen_event(event, now, ports)
    }

    pub fn handle_pointer_move(
        &mut self,
        raw: RawPointerEvent,
        rect_origin: na::Vector2<f64>,
        now: Instant,
        ports: &mut EnginePorts,
    ) -> WidgetFlags {
        let pos = self.world_pos(&raw, rect_origin);
        self.track_cursor(pos);
        let element = PointerElement {
            pos,
            button: raw.held_button(),
            click_count: raw.detail.max(1),
        };
        let event = if raw.buttons != 0 {
            PenEvent::Down {
                element,
                modifier_keys: raw.modifier_keys(),
            }
        } else {
            PenEvent::Proximity {
                element,
                modifier_keys: raw.modifier_keys(),
            }
        };
        self.handle_pen_event(event, now, ports)
    }

    pub fn handle_pointer_up(
        &mut self,
        raw: RawPointerEvent,
        rect_origin: na::Vector2<f64>,
        now: Instant,
        ports: &mut EnginePorts,
    ) -> WidgetFlags {
        let pos = self.world_pos(&raw, rect_origin);
        self.track_cursor(pos);
        let event = PenEvent::Up {
            element: PointerElement {
                pos,
                button: raw.pointer_button(),
                click_count: raw.detail.max(1),
            },
            modifier_keys: raw.modifier_keys(),
        };
        self.handle_pen_event(event, now, ports)
    }

    /// Pointer capture was lost: cancels any gesture in progress.
    pub fn handle_pointer_cancel(&mut self, now: Instant, ports: &mut EnginePorts) -> WidgetFlags {
        self.handle_pen_event(PenEvent::Cancel, now, ports)
    }

    pub fn handle_key_pressed(
        &mut self,
        keyboard_key: KeyboardKey,
        modifier_keys: Vec<ModifierKey>,
        now: Instant,
        ports: &mut EnginePorts,
    ) -> WidgetFlags {
        self.handle_pen_event(
            PenEvent::KeyPressed {
                keyboard_key,
                modifier_keys,
            },
            now,
            ports,
        )
    }

    /// Handle a pen event with the current pen.
    pub fn handle_pen_event(
        &mut self,
        event: PenEvent,
        now: Instant,
        ports: &mut EnginePorts,
    ) -> WidgetFlags {
        let now_ms = self.now_ms(now);
        let mut view = EngineViewMut {
            pens_config: &mut self.pens_config,
            camera: &mut self.camera,
            store: &mut *ports.store,
            collab: &mut *ports.collab,
            text_metrics: ports.text_metrics,
            tile_metrics: ports.tile_metrics,
            ids: &mut self.ids,
            now_ms,
        };
        let (_propagation, widget_flags) = self.penholder.handle_pen_event(event, now, &mut view);
        if widget_flags.view_modified || widget_flags.zoomed {
            self.viewport_dirty = true;
        }
        widget_flags
    }

    /// An animation frame: broadcasts the cursor and viewport at most once per frame.
    pub fn handle_animation_frame(&mut self, ports: &mut EnginePorts) {
        if self.cursor_dirty {
            if let Some(pos) = self.last_cursor_pos {
                ports.collab.update_cursor(pos[0], pos[1]);
            }
            self.cursor_dirty = false;
        }
        if self.viewport_dirty {
            ports
                .collab
                .update_viewport(self.camera.offset(), self.camera.zoom());
            self.viewport_dirty = false;
        }
    }

    /// Start or stop following another user's viewport.
    pub fn follow_user(&mut self, user_id: Option<&str>, ports: &mut EnginePorts) {
        ports.collab.update_following_user(user_id);
    }

    fn track_cursor(&mut self, pos: na::Vector2<f64>) {
        self.last_cursor_pos = Some(pos);
        self.cursor_dirty = true;
    }

    fn now_ms(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.epoch).as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Body, BoxGeometry, Connector, ConnectorStyle, Element};
    use crate::pens::pensconfig::Tool;
    use crate::testing::{FixedTextMetrics, FixedTileMetrics, MemoryStore, RecordingCollab};
    use tavla_compose::handles::HandlePosition;

    fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> Element {
        Element::new(id, Body::Rectangle(BoxGeometry::new(x, y, w, h)))
    }

    struct Harness {
        engine: Engine,
        store: MemoryStore,
        collab: RecordingCollab,
        text_metrics: FixedTextMetrics,
        tile_metrics: FixedTileMetrics,
        now: Instant,
    }

    impl Harness {
        fn new(elements: Vec<Element>) -> Self {
            Self {
                engine: Engine::default(),
                store: MemoryStore::with_elements(elements),
                collab: RecordingCollab::default(),
                text_metrics: FixedTextMetrics,
                tile_metrics: FixedTileMetrics,
                now: Instant::now(),
            }
        }

        fn change_tool(&mut self, tool: Tool) {
            let mut ports = EnginePorts {
                store: &mut self.store,
                collab: &mut self.collab,
                text_metrics: &self.text_metrics,
                tile_metrics: &self.tile_metrics,
            };
            let _ = self.engine.change_tool(tool, &mut ports, self.now);
        }

        fn down(&mut self, x: f64, y: f64) {
            let raw = RawPointerEvent::new(x, y);
            let mut ports = EnginePorts {
                store: &mut self.store,
                collab: &mut self.collab,
                text_metrics: &self.text_metrics,
                tile_metrics: &self.tile_metrics,
            };
            let _ = self
                .engine
                .handle_pointer_down(raw, na::Vector2::zeros(), self.now, &mut ports);
        }

        fn drag_to(&mut self, x: f64, y: f64) {
            self.now += std::time::Duration::from_millis(40);
            let raw = RawPointerEvent::new(x, y);
            let mut ports = EnginePorts {
                store: &mut self.store,
                collab: &mut self.collab,
                text_metrics: &self.text_metrics,
                tile_metrics: &self.tile_metrics,
            };
            let _ = self
                .engine
                .handle_pointer_move(raw, na::Vector2::zeros(), self.now, &mut ports);
        }

        fn up(&mut self, x: f64, y: f64) {
            self.now += std::time::Duration::from_millis(40);
            let mut raw = RawPointerEvent::new(x, y);
            raw.buttons = 0;
            let mut ports = EnginePorts {
                store: &mut self.store,
                collab: &mut self.collab,
                text_metrics: &self.text_metrics,
                tile_metrics: &self.tile_metrics,
            };
            let _ = self
                .engine
                .handle_pointer_up(raw, na::Vector2::zeros(), self.now, &mut ports);
        }
    }

    #[test]
    fn sharp_arrow_between_two_rectangles_with_line_of_sight() {
        let mut h = Harness::new(vec![
            rect("a", 100.0, 100.0, 80.0, 60.0),
            rect("b", 300.0, 100.0, 80.0, 60.0),
        ]);
        h.change_tool(Tool::Arrow);

        h.down(180.0, 130.0);
        h.drag_to(260.0, 130.0);
        h.up(300.0, 130.0);

        let arrow = h
            .store
            .elements
            .iter()
            .find(|e| e.is_connector())
            .expect("arrow committed");
        let connector = arrow.connector().unwrap();
        assert_eq!(connector.style, ConnectorStyle::Sharp);
        assert_eq!(
            connector.points,
            vec![na::vector![180.0, 130.0], na::vector![300.0, 130.0]]
        );
        let start = connector.start_connection.as_ref().unwrap();
        assert_eq!(start.element_id, "a");
        assert_eq!(start.position, HandlePosition::East);
        let end = connector.end_connection.as_ref().unwrap();
        assert_eq!(end.element_id, "b");
        assert_eq!(end.position, HandlePosition::West);
    }

    #[test]
    fn sharp_arrow_with_out_of_sight_snap_commits_as_elbow() {
        let mut h = Harness::new(vec![rect("a", 200.0, 200.0, 80.0, 60.0)]);
        h.change_tool(Tool::Arrow);

        h.down(50.0, 230.0);
        h.drag_to(150.0, 230.0);
        h.up(281.0, 230.0);

        let arrow = h
            .store
            .elements
            .iter()
            .find(|e| e.is_connector())
            .expect("arrow committed");
        let connector = arrow.connector().unwrap();
        assert_eq!(connector.style, ConnectorStyle::Elbow);
        assert!(connector.points.len() > 2);
        let end = connector.end_connection.as_ref().unwrap();
        assert_eq!(end.element_id, "a");
        assert_eq!(end.position, HandlePosition::East);
        // orthogonal route
        for w in connector.points.windows(2) {
            assert!((w[0][0] - w[1][0]).abs() <= 1e-6 || (w[0][1] - w[1][1]).abs() <= 1e-6);
        }
    }

    #[test]
    fn translating_a_shape_rewrites_the_attached_connector() {
        let mut connector = Connector::new_sharp(na::vector![180.0, 130.0], na::vector![300.0, 130.0]);
        connector.start_connection = Some(crate::element::Connection::new(
            "a",
            HandlePosition::East,
        ));
        connector.end_connection = Some(crate::element::Connection::new(
            "b",
            HandlePosition::West,
        ));
        let arrow = Element::new("arrow", Body::Arrow(connector));

        let mut h = Harness::new(vec![
            rect("a", 100.0, 100.0, 80.0, 60.0),
            rect("b", 300.0, 100.0, 80.0, 60.0),
            arrow,
        ]);
        h.change_tool(Tool::Select);

        // grab the middle of shape a and drag it down
        h.down(140.0, 130.0);
        h.drag_to(140.0, 200.0);
        h.up(140.0, 290.0);

        let a = h.store.get("a").unwrap();
        assert_eq!(a.bounds().mins, na::point![100.0, 260.0]);

        let arrow = h.store.get("arrow").unwrap();
        let connector = arrow.connector().unwrap();
        assert_eq!(connector.style, ConnectorStyle::Sharp);
        assert_eq!(
            connector.points,
            vec![na::vector![180.0, 290.0], na::vector![300.0, 130.0]]
        );
    }

    #[test]
    fn read_only_blocks_drawing() {
        let mut h = Harness::new(vec![]);
        h.change_tool(Tool::Pen);
        h.engine.pens_config_mut().is_read_only = true;

        h.down(10.0, 10.0);
        h.drag_to(50.0, 50.0);
        h.up(80.0, 80.0);

        assert!(h.store.elements.is_empty());
    }

    #[test]
    fn middle_button_pans_in_any_tool() {
        let mut h = Harness::new(vec![]);
        h.change_tool(Tool::Pen);

        let mut raw = RawPointerEvent::new(100.0, 100.0);
        raw.button = 1;
        raw.buttons = 4;
        let mut ports = EnginePorts {
            store: &mut h.store,
            collab: &mut h.collab,
            text_metrics: &h.text_metrics,
            tile_metrics: &h.tile_metrics,
        };
        let _ = h
            .engine
            .handle_pointer_down(raw, na::Vector2::zeros(), h.now, &mut ports);

        let mut raw = RawPointerEvent::new(60.0, 80.0);
        raw.button = 1;
        raw.buttons = 4;
        let _ = h
            .engine
            .handle_pointer_move(raw, na::Vector2::zeros(), h.now, &mut ports);

        // dragging left/up moves the view offset right/down in surface coords
        assert_eq!(h.engine.camera().offset(), na::vector![40.0, 20.0]);
        assert!(h.store.elements.is_empty());
    }

    #[test]
    fn lasso_selection_picks_elements_by_center() {
        let mut h = Harness::new(vec![
            rect("a", 10.0, 10.0, 20.0, 20.0),
            rect("b", 200.0, 200.0, 20.0, 20.0),
        ]);
        h.change_tool(Tool::Lasso);

        h.down(0.0, 0.0);
        h.drag_to(60.0, 0.0);
        h.drag_to(60.0, 60.0);
        h.drag_to(0.0, 60.0);
        h.up(0.0, 55.0);

        let selected = h.collab.selected_updates.last().unwrap();
        assert_eq!(selected, &vec![String::from("a")]);
    }

    #[test]
    fn box_selection_below_min_size_clears() {
        let mut h = Harness::new(vec![rect("a", 0.0, 0.0, 4.0, 4.0)]);
        h.change_tool(Tool::Select);

        h.down(-1.0, -1.0);
        h.drag_to(2.0, 2.0);
        h.up(3.0, 3.0);

        let selected = h.collab.selected_updates.last().unwrap();
        assert!(selected.is_empty());
    }
}
