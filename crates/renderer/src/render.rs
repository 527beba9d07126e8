//! Selective re-flattening of changed tiles into a target preview layer.

use document::{CanvasState, LayerContent};

use crate::diff::CanvasDiff;

/// Bring `target` up to date with `current`: resize it to the canvas
/// dimensions and re-flatten every tile the diff marked.
pub fn render_canvas(current: &CanvasState, target: &mut LayerContent, diff: &CanvasDiff) {
    target.resize_to(current.width(), current.height());
    let grid = current.grid();
    diff.each_index(|index| {
        let flattened = current.flatten_tile(index);
        let pos = grid.tile_pos(index).expect("tile index in range");
        target
            .put_tile(&flattened, pos.x, pos.y, 0)
            .expect("diff position inside the target grid");
    });
}
