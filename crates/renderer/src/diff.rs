//! The per-tile change bitmap built by comparing two snapshots.

use bitvec::prelude::{BitVec, Lsb0};
use document::{CanvasState, LayerContent, LayerProps, Tile};
use model::TileGrid;

/// Reusable diff state. `begin` resizes it to the current canvas; the
/// check methods accumulate changed tiles until the next `begin`.
#[derive(Debug, Clone, Default)]
pub struct CanvasDiff {
    tiles_per_row: u32,
    tiles_per_column: u32,
    tile_changes: BitVec<usize, Lsb0>,
    layer_props_changed: bool,
}

impl CanvasDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn tiles_per_row(&self) -> u32 {
        self.tiles_per_row
    }

    pub const fn tiles_per_column(&self) -> u32 {
        self.tiles_per_column
    }

    /// Resize to the new canvas dimensions. When the dimensions changed,
    /// every tile starts out marked.
    // TODO: on grow, narrow the initial marking to the newly added tiles.
    pub fn begin(
        &mut self,
        old_width: u32,
        old_height: u32,
        current_width: u32,
        current_height: u32,
        layer_props_changed: bool,
    ) {
        let grid = TileGrid::new(current_width, current_height);
        self.tiles_per_row = grid.tiles_per_row();
        self.tiles_per_column = grid.tiles_per_column();
        let init = old_width != current_width || old_height != current_height;
        self.tile_changes = BitVec::repeat(init, grid.tile_count());
        self.layer_props_changed = layer_props_changed;
    }

    /// Probe every still-unchanged tile with `check`; a true result marks
    /// it changed.
    pub fn check<F>(&mut self, mut check: F)
    where
        F: FnMut(usize) -> bool,
    {
        for index in 0..self.tile_changes.len() {
            if !self.tile_changes[index] && check(index) {
                self.tile_changes.set(index, true);
            }
        }
    }

    pub fn check_all(&mut self) {
        self.tile_changes.fill(true);
    }

    pub fn each_index<F>(&self, mut each: F)
    where
        F: FnMut(usize),
    {
        for index in self.tile_changes.iter_ones() {
            each(index);
        }
    }

    pub fn each_pos<F>(&self, mut each: F)
    where
        F: FnMut(u32, u32),
    {
        for index in self.tile_changes.iter_ones() {
            each(
                (index % self.tiles_per_row as usize) as u32,
                (index / self.tiles_per_row as usize) as u32,
            );
        }
    }

    pub fn tiles_changed(&self) -> bool {
        self.tile_changes.any()
    }

    /// Read and clear the layer-props-changed flag.
    pub fn layer_props_changed_reset(&mut self) -> bool {
        let layer_props_changed = self.layer_props_changed;
        self.layer_props_changed = false;
        layer_props_changed
    }
}

/// Diff `current` against `previous` into `diff`. Without a previous
/// snapshot the canvas counts as brand new and everything is marked.
pub fn diff_canvas_states(
    current: &CanvasState,
    previous: Option<&CanvasState>,
    diff: &mut CanvasDiff,
) {
    let Some(previous) = previous else {
        diff.begin(0, 0, current.width(), current.height(), false);
        return;
    };

    let layer_props_changed = layer_props_differ(current, previous);
    diff.begin(
        previous.width(),
        previous.height(),
        current.width(),
        current.height(),
        layer_props_changed,
    );
    if std::ptr::eq(current, previous) {
        return;
    }

    if !Tile::ptr_eq(current.background(), previous.background())
        || current.width() != previous.width()
        || current.height() != previous.height()
    {
        diff.check_all();
    } else if !current.same_layers(previous) {
        diff_layer_lists(current, previous, diff);
    }
}

fn layer_props_differ(current: &CanvasState, previous: &CanvasState) -> bool {
    if current.same_layers(previous) {
        return false;
    }
    let current_layers = current.layers().layers();
    let previous_layers = previous.layers().layers();
    current_layers.len() != previous_layers.len()
        || current_layers
            .iter()
            .zip(previous_layers.iter())
            .any(|(a, b)| !std::sync::Arc::ptr_eq(&a.props, &b.props))
}

fn diff_layer_lists(current: &CanvasState, previous: &CanvasState, diff: &mut CanvasDiff) {
    let current_layers = current.layers().layers();
    let previous_layers = previous.layers().layers();
    if current_layers.len() != previous_layers.len() {
        diff.check_all();
        return;
    }
    let grid = current.grid();
    for (layer, prev_layer) in current_layers.iter().zip(previous_layers.iter()) {
        if layer.props.layer_id != prev_layer.props.layer_id {
            diff.check_all();
            return;
        }
        diff_layer_content(
            &layer.content,
            &layer.props,
            &prev_layer.content,
            &prev_layer.props,
            grid,
            diff,
        );
    }
}

/// Tile-level diff of one layer. A change to any render-affecting
/// property marks the whole layer; otherwise tiles are compared by
/// identity first and content second, so logically identical snapshots
/// diff clean.
pub fn diff_layer_content(
    content: &LayerContent,
    props: &LayerProps,
    previous_content: &LayerContent,
    previous_props: &LayerProps,
    grid: TileGrid,
    diff: &mut CanvasDiff,
) {
    if props.renders_differently_from(previous_props) {
        mark_layer_content(content, previous_content, grid, diff);
        return;
    }
    if sublayers_differ(content, previous_content) {
        mark_layer_content(content, previous_content, grid, diff);
        return;
    }
    diff.check(|index| {
        let pos = grid.tile_pos(index).expect("tile index in range");
        !Tile::same_pixels(content.tile_at(pos), previous_content.tile_at(pos))
    });
}

fn sublayers_differ(content: &LayerContent, previous_content: &LayerContent) -> bool {
    let a = content.sub_layers();
    let b = previous_content.sub_layers();
    a.len() != b.len()
        || a.iter().zip(b.iter()).any(|(x, y)| {
            !std::sync::Arc::ptr_eq(&x.content, &y.content)
                || !std::sync::Arc::ptr_eq(&x.props, &y.props)
        })
}

/// Mark every tile where either revision of the layer has content.
fn mark_layer_content(
    content: &LayerContent,
    previous_content: &LayerContent,
    grid: TileGrid,
    diff: &mut CanvasDiff,
) {
    diff.check(|index| {
        let pos = grid.tile_pos(index).expect("tile index in range");
        !content.tile_at(pos).is_blank()
            || !previous_content.tile_at(pos).is_blank()
            || !content.sub_layers().is_empty()
            || !previous_content.sub_layers().is_empty()
    });
}
