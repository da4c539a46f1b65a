// Imports
use serde::{Deserialize, Serialize};

/// A single pointer sample, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerElement {
    /// The position in world coordinates.
    pub pos: na::Vector2<f64>,
    /// The pointer button the sample was taken with.
    pub button: PointerButton,
    /// The click count of the gesture (1 for single clicks, 2 for double clicks).
    pub click_count: u8,
}

impl PointerElement {
    /// A new pointer element with the left button and a single click.
    pub fn new(pos: na::Vector2<f64>) -> Self {
        Self {
            pos,
            button: PointerButton::Left,
            click_count: 1,
        }
    }
}

/// A pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PointerButton {
    /// Primary button.
    Left,
    /// Middle / wheel button.
    Middle,
    /// Secondary button.
    Right,
    /// Any other button.
    Other,
}

/// A Pen Event.
///
/// Note that there is no "motion" event, because we want the events to be entirely stateless.
/// Motion events already encode state as they would only be valid if they are preceded by a down event.
/// As a result, multiple down events are emitted while the pointer is pressed down and being moved.
/// This should be handled accordingly by the state machines which receive the events.
#[derive(Debug, Clone)]
pub enum PenEvent {
    /// A pen down event. Is repeatedly emitted while the pointer is pressed down and moved.
    Down {
        /// The element for the down event.
        element: PointerElement,
        /// Modifier keys pressed during the event.
        modifier_keys: Vec<ModifierKey>,
    },
    /// A pen up event.
    Up {
        /// The element for the up event.
        element: PointerElement,
        /// Modifier keys pressed during the event.
        modifier_keys: Vec<ModifierKey>,
    },
    /// A hover event. Is repeatedly emitted while the pointer is moved without being pressed down.
    Proximity {
        /// The element for the proximity event.
        element: PointerElement,
        /// Modifier keys pressed during the event.
        modifier_keys: Vec<ModifierKey>,
    },
    /// A keyboard key pressed event.
    KeyPressed {
        /// the key
        keyboard_key: KeyboardKey,
        /// Modifier keys pressed during the event.
        modifier_keys: Vec<ModifierKey>,
    },
    /// Cancel event when the pointer vanishes unexpectedly or capture is lost.
    ///
    /// Should finish all current actions and reset all state.
    Cancel,
}

/// A key on the keyboard.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyboardKey {
    /// A Unicode character.
    Unicode(char),
    /// Backspace.
    BackSpace,
    /// Escape.
    Escape,
    /// Delete.
    Delete,
    /// Unsupported Key.
    Unsupported,
}

/// A modifier key.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename = "modifier_key")]
pub enum ModifierKey {
    /// Shift.
    #[serde(rename = "keyboard_shift")]
    KeyboardShift,
    /// Ctrl.
    #[serde(rename = "keyboard_ctrl")]
    KeyboardCtrl,
    /// Alt.
    #[serde(rename = "keyboard_alt")]
    KeyboardAlt,
    /// Meta / Super.
    #[serde(rename = "keyboard_meta")]
    KeyboardMeta,
}

/// The current pen state. Used wherever there is internal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PenState {
    /// Up.
    Up,
    /// Proximity.
    Proximity,
    /// Down.
    Down,
}

/// The pen progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PenProgress {
    /// In idle state.
    Idle,
    /// In progress state.
    InProgress,
    /// Pen is finished.
    Finished,
}
