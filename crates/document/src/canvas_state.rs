//! The atomic unit of snapshotting: canvas dimensions, the optional
//! background tile and the layer stack.

use std::sync::Arc;

use model::{ContextId, TileGrid, MAX_CANVAS_SIZE};

use crate::image::Image;
use crate::layer_list::LayerList;
use crate::tile::{Tile, TileData};
use crate::StateError;

#[derive(Debug, Clone)]
pub struct CanvasState {
    width: u32,
    height: u32,
    background: Tile,
    layers: Arc<LayerList>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasState {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            background: Tile::Blank,
            layers: Arc::new(LayerList::new()),
        }
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub fn grid(&self) -> TileGrid {
        TileGrid::new(self.width, self.height)
    }

    pub fn background(&self) -> &Tile {
        &self.background
    }

    pub fn set_background(&mut self, tile: Tile) {
        self.background = tile;
    }

    pub fn layers(&self) -> &Arc<LayerList> {
        &self.layers
    }

    /// Copy-on-write access to the layer stack.
    pub fn layers_mut(&mut self) -> &mut LayerList {
        Arc::make_mut(&mut self.layers)
    }

    /// Same layer stack node in both snapshots?
    pub fn same_layers(&self, other: &CanvasState) -> bool {
        Arc::ptr_eq(&self.layers, &other.layers)
    }

    /// Grow or shrink the canvas by border deltas, translating layer
    /// pixels by (left, top) and keeping the background tile.
    pub fn resize(
        &mut self,
        context_id: ContextId,
        top: i32,
        right: i32,
        bottom: i32,
        left: i32,
    ) -> Result<(), StateError> {
        let north = -(top as i64);
        let west = -(left as i64);
        let east = self.width as i64 + right as i64;
        let south = self.height as i64 + bottom as i64;
        if north >= south || west >= east {
            return Err(StateError::InvalidArgument(
                "invalid resize: borders are reversed".to_string(),
            ));
        }

        let width = east + left as i64;
        let height = south + top as i64;
        if width < 1 || height < 1 || width > MAX_CANVAS_SIZE as i64 || height > MAX_CANVAS_SIZE as i64
        {
            return Err(StateError::InvalidArgument(format!(
                "invalid resize: {width}x{height}"
            )));
        }

        log::debug!("resize: width {width}, height {height}");
        self.width = width as u32;
        self.height = height as u32;
        if !self.layers.is_empty() {
            self.layers_mut().resize(context_id, top, right, bottom, left);
        }
        Ok(())
    }

    /// Flatten one tile of the whole canvas: background plus every
    /// visible layer, pending strokes included.
    pub fn flatten_tile(&self, tile_index: usize) -> Tile {
        let grid = self.grid();
        let pos = grid.tile_pos(tile_index).expect("tile index in range");
        let mut target = match &self.background {
            Tile::Blank => TileData::new_blank(0),
            background => {
                let mut data = TileData::new_blank(0);
                data.pixels.copy_from_slice(background.pixels());
                data
            }
        };
        self.layers.flatten_tile_onto(pos, &mut target);
        target.persist()
    }

    /// Flatten the whole canvas into one image.
    pub fn to_flat_image(&self, include_background: bool) -> Result<Image, StateError> {
        if self.width == 0 || self.height == 0 {
            return Err(StateError::InvalidArgument(
                "can't create a flat image with zero pixels".to_string(),
            ));
        }

        let grid = self.grid();
        let mut image = Image::new(self.width, self.height);
        for tile_index in 0..grid.tile_count() {
            let pos = grid.tile_pos(tile_index).expect("tile index in range");
            let mut target = TileData::new_blank(0);
            if include_background && !self.background.is_blank() {
                target.pixels.copy_from_slice(self.background.pixels());
            }
            self.layers.flatten_tile_onto(pos, &mut target);

            let (tile_width, tile_height) = grid.tile_extent(pos);
            for row in 0..tile_height {
                let canvas_y = pos.y * model::TILE_SIZE + row;
                let canvas_x = pos.x * model::TILE_SIZE;
                let src_start = (row * model::TILE_SIZE) as usize;
                let dst_start = (canvas_y * self.width + canvas_x) as usize;
                image.pixels_mut()[dst_start..dst_start + tile_width as usize]
                    .copy_from_slice(&target.pixels[src_start..src_start + tile_width as usize]);
            }
        }
        Ok(image)
    }
}
