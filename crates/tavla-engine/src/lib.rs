#![warn(missing_debug_implementations)]
#![allow(clippy::single_match)]

//! The tavla-engine crate is the connector routing and interaction core of the tavla whiteboard.
//!
//! It owns the pointer-interaction state machines, the snap engine, the elbow and curved
//! route planners and the connection maintenance pass. Rendering, text editing, history and
//! the element store itself are external and reached through the ports in [ports].

// Modules
pub mod camera;
pub mod connect;
pub mod element;
pub mod engine;
pub mod pens;
pub mod ports;
pub mod router;
pub mod snap;
#[cfg(test)]
pub(crate) mod testing;
pub mod throttle;
pub mod widgetflags;

// Re-exports
pub use camera::Camera;
pub use element::Element;
pub use engine::Engine;
pub use pens::PenHolder;
pub use widgetflags::WidgetFlags;

// Renames
extern crate nalgebra as na;
extern crate parry2d_f64 as p2d;
