//! Snapshot diffing and incremental re-rendering.
//!
//! Observers compare the newly published snapshot against the previous
//! one to get a tile-level changed set, then re-flatten only those tiles
//! into their preview layer.

pub use diff::CanvasDiff;
pub use render::render_canvas;

pub mod diff;
pub mod render;
