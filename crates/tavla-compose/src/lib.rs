#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![allow(clippy::single_match)]

//! the tavla-compose crate provides tavla with building blocks for canvas geometry, pointer events and interaction math.

// Modules
/// colors
pub mod color;
/// Event result.
pub mod eventresult;
/// module for extension traits for foreign types
pub mod ext;
/// geometry primitives shared by the snap engine, the route planners and hit-testing
pub mod geometry;
/// resize handle and anchor position math
pub mod handles;
/// module for pen events
pub mod penevent;

// Re-exports
pub use color::Color;
pub use eventresult::EventResult;
pub use handles::HandlePosition;
pub use penevent::PenEvent;

// Renames
extern crate nalgebra as na;
extern crate parry2d_f64 as p2d;
