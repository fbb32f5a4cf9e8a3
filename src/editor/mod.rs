//! Editor interaction state machine.
//!
//! State is a plain value passed into and returned from `Editor::handle`, so the
//! whole interaction can be driven without a rendering surface.

pub mod machine;
pub mod state;

pub use machine::{Editor, Effect, Transition};
pub use state::{Drag, EditorEvent, EditorState, PanGesture, PointerButton, Tool};
