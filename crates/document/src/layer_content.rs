//! The tile grid of one layer, plus the per-stroke sublayers indirect
//! drawing accumulates into.

use std::sync::Arc;

use model::pixel::{composite_mask, composite_pixels, Pixel};
use model::{BlendMode, ContextId, Rect, TileGrid, TilePos, TILE_SIZE};

use crate::image::Image;
use crate::layer::Layer;
use crate::layer_props::LayerProps;
use crate::tile::{Tile, TileData};
use crate::StateError;

static BLANK_TILE: Tile = Tile::Blank;

/// One brush dab rasterized to a coverage mask. `mask` is `diameter` rows
/// of `diameter` coverage bytes with the dab's opacity already baked in.
#[derive(Debug, Clone)]
pub struct BrushStamp {
    pub left: i32,
    pub top: i32,
    pub diameter: u32,
    pub mask: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct LayerContent {
    width: u32,
    height: u32,
    grid: TileGrid,
    tiles: Arc<Vec<Tile>>,
    sublayers: Vec<Layer>,
}

impl LayerContent {
    pub fn new(width: u32, height: u32, fill: Option<&Tile>) -> Self {
        let grid = TileGrid::new(width, height);
        let fill_tile = fill.cloned().unwrap_or(Tile::Blank);
        Self {
            width,
            height,
            grid,
            tiles: Arc::new(vec![fill_tile; grid.tile_count()]),
            sublayers: Vec::new(),
        }
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn grid(&self) -> TileGrid {
        self.grid
    }

    /// The tile at a grid position, or the blank tile outside the grid:
    /// layers smaller than the canvas read as transparent beyond their
    /// own extent.
    pub fn tile_at(&self, pos: TilePos) -> &Tile {
        match self.grid.tile_index(pos) {
            Ok(index) => &self.tiles[index],
            Err(_) => &BLANK_TILE,
        }
    }

    pub fn tile_at_index(&self, index: usize) -> &Tile {
        &self.tiles[index]
    }

    pub fn sub_layers(&self) -> &[Layer] {
        &self.sublayers
    }

    pub fn has_sublayer(&self, sublayer_id: u32) -> bool {
        self.find_sublayer(sublayer_id).is_some()
    }

    fn find_sublayer(&self, sublayer_id: u32) -> Option<usize> {
        self.sublayers
            .iter()
            .position(|sublayer| sublayer.props.sublayer_id == sublayer_id)
    }

    /// Flatten every tile into one image of the layer's dimensions.
    /// Sublayers are not composited here; they are a property of the
    /// in-progress stroke, not of the stored pixels.
    pub fn to_image(&self) -> Image {
        let mut image = Image::new(self.width, self.height);
        for index in 0..self.grid.tile_count() {
            let tile = &self.tiles[index];
            if tile.is_blank() {
                continue;
            }
            let pos = self.grid.tile_pos(index).expect("tile index in range");
            let (tile_width, tile_height) = self.grid.tile_extent(pos);
            let pixels = tile.pixels();
            for row in 0..tile_height {
                let canvas_y = pos.y * TILE_SIZE + row;
                let canvas_x = pos.x * TILE_SIZE;
                let src_start = (row * TILE_SIZE) as usize;
                let dst_start = (canvas_y * self.width + canvas_x) as usize;
                image.pixels_mut()[dst_start..dst_start + tile_width as usize]
                    .copy_from_slice(&pixels[src_start..src_start + tile_width as usize]);
            }
        }
        image
    }

    /// Copy out a rectangular region, optionally gated by a monochrome
    /// mask of the same dimensions: only pixels under white mask pixels
    /// are kept.
    pub fn select(&self, rect: Rect, mask: Option<&Image>) -> Image {
        let mut selection = self.to_image().subimage_rect(rect);
        if let Some(mask) = mask {
            debug_assert_eq!(mask.width(), selection.width());
            debug_assert_eq!(mask.height(), selection.height());
            for (pixel, gate) in selection
                .pixels_mut()
                .iter_mut()
                .zip(mask.pixels().iter())
            {
                if gate.a == 0 {
                    *pixel = Pixel::default();
                }
            }
        }
        selection
    }

    /// Grow or shrink by border deltas, translating existing pixels by
    /// (left, top). Newly exposed area is blank. Sublayers are carried
    /// along so in-progress strokes survive a canvas resize.
    pub fn resized(
        &self,
        context_id: ContextId,
        top: i32,
        right: i32,
        bottom: i32,
        left: i32,
    ) -> LayerContent {
        let width = (self.width as i32 + left + right).max(0) as u32;
        let height = (self.height as i32 + top + bottom).max(0) as u32;
        let mut resized = LayerContent::new(width, height, None);

        let tile_aligned = left.rem_euclid(TILE_SIZE as i32) == 0
            && top.rem_euclid(TILE_SIZE as i32) == 0
            && self.width % TILE_SIZE == 0
            && self.height % TILE_SIZE == 0;
        if tile_aligned {
            // Tile-aligned translation shares the tiles instead of
            // copying pixels.
            let tile_dx = left / TILE_SIZE as i32;
            let tile_dy = top / TILE_SIZE as i32;
            let tiles = Arc::make_mut(&mut resized.tiles);
            for index in 0..resized.grid.tile_count() {
                let pos = resized.grid.tile_pos(index).expect("tile index in range");
                let src_x = pos.x as i32 - tile_dx;
                let src_y = pos.y as i32 - tile_dy;
                if src_x >= 0 && src_y >= 0 {
                    let src = self.tile_at(TilePos {
                        x: src_x as u32,
                        y: src_y as u32,
                    });
                    tiles[index] = src.clone();
                }
            }
        } else if width > 0 && height > 0 {
            resized.blit_image(context_id, left, top, &self.to_image());
        }

        for sublayer in &self.sublayers {
            let mut carried = sublayer.clone();
            *Arc::make_mut(&mut carried.content) =
                sublayer.content.resized(context_id, top, right, bottom, left);
            resized.sublayers.push(carried);
        }
        resized
    }

    /// Materialize a grid of the given dimensions, carrying existing
    /// tiles over at matching positions. Used by the render driver's
    /// target layer.
    pub fn resize_to(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        let grid = TileGrid::new(width, height);
        let mut tiles = vec![Tile::Blank; grid.tile_count()];
        for (index, slot) in tiles.iter_mut().enumerate() {
            let pos = grid.tile_pos(index).expect("tile index in range");
            if self.grid.tile_index(pos).is_ok() {
                *slot = self.tile_at(pos).clone();
            }
        }
        self.width = width;
        self.height = height;
        self.grid = grid;
        self.tiles = Arc::new(tiles);
    }

    /// Composite this layer's tile at `pos` onto `target`. When a stroke
    /// is pending in sublayers, the stored tile and the sublayers are
    /// flattened into a scratch tile first so the whole layer blends as
    /// one unit.
    pub fn flatten_tile_onto(
        &self,
        pos: TilePos,
        target: &mut TileData,
        opacity: u8,
        blend_mode: BlendMode,
    ) {
        let own = self.tile_at(pos);
        if self.sublayers.is_empty() {
            own.composite_onto(target, opacity, blend_mode);
            return;
        }

        let mut scratch = TileData::new_blank(0);
        scratch.pixels.copy_from_slice(own.pixels());
        for sublayer in &self.sublayers {
            sublayer.flatten_tile_onto(pos, &mut scratch);
        }
        if !scratch.is_blank() {
            composite_pixels(&mut target.pixels, &scratch.pixels, opacity, blend_mode);
        }
    }

    fn clip_to_layer(&self, rect: Rect) -> Option<Rect> {
        rect.intersected(Rect::new(0, 0, self.width as i32, self.height as i32))
    }

    /// Composite an image at (left, top) with the given blend mode.
    pub fn put_image(
        &mut self,
        context_id: ContextId,
        blend_mode: BlendMode,
        left: i32,
        top: i32,
        image: &Image,
    ) {
        let Some(rect) = self.clip_to_layer(Rect::new(
            left,
            top,
            image.width() as i32,
            image.height() as i32,
        )) else {
            return;
        };
        let grid = self.grid;
        let tiles = Arc::make_mut(&mut self.tiles);
        for_each_tile_row(grid, rect, |index, canvas_x, canvas_y, length, local_start| {
            let data = tiles[index].data_mut(context_id);
            let src_start =
                ((canvas_y - top) as u32 * image.width() + (canvas_x - left) as u32) as usize;
            composite_pixels(
                &mut data.pixels[local_start..local_start + length],
                &image.pixels()[src_start..src_start + length],
                255,
                blend_mode,
            );
        });
        self.normalize_rect(rect);
    }

    /// Replace pixels with an image's, alpha included. Used by resize
    /// translation and region moves, where compositing would be wrong.
    pub fn blit_image(&mut self, context_id: ContextId, left: i32, top: i32, image: &Image) {
        let Some(rect) = self.clip_to_layer(Rect::new(
            left,
            top,
            image.width() as i32,
            image.height() as i32,
        )) else {
            return;
        };
        let grid = self.grid;
        let tiles = Arc::make_mut(&mut self.tiles);
        for_each_tile_row(grid, rect, |index, canvas_x, canvas_y, length, local_start| {
            let data = tiles[index].data_mut(context_id);
            let src_start =
                ((canvas_y - top) as u32 * image.width() + (canvas_x - left) as u32) as usize;
            data.pixels[local_start..local_start + length]
                .copy_from_slice(&image.pixels()[src_start..src_start + length]);
        });
        self.normalize_rect(rect);
    }

    /// Fill the rectangle spanned by the half-open bounds. The caller has
    /// already validated and clipped against the canvas; this clips
    /// against the layer.
    pub fn fill_rect(
        &mut self,
        context_id: ContextId,
        blend_mode: BlendMode,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        color: u32,
    ) {
        let Some(rect) = self.clip_to_layer(Rect::new(left, top, right - left, bottom - top))
        else {
            return;
        };
        let source_row = [Pixel::from_bgra(color); TILE_SIZE as usize];
        let grid = self.grid;
        let tiles = Arc::make_mut(&mut self.tiles);
        for_each_tile_row(grid, rect, |index, _, _, length, local_start| {
            let data = tiles[index].data_mut(context_id);
            composite_pixels(
                &mut data.pixels[local_start..local_start + length],
                &source_row[..length],
                255,
                blend_mode,
            );
        });
        self.normalize_rect(rect);
    }

    /// Store a tile at grid position (x, y) and at up to `repeat`
    /// following positions in row-major order, stopping at the end of the
    /// grid.
    pub fn put_tile(&mut self, tile: &Tile, x: u32, y: u32, repeat: u32) -> Result<(), StateError> {
        let start = self
            .grid
            .tile_index(TilePos { x, y })
            .map_err(|_| StateError::InvalidArgument(format!("tile position {x},{y} out of range")))?;
        let tiles = Arc::make_mut(&mut self.tiles);
        let end = (start + repeat as usize + 1).min(tiles.len());
        for slot in &mut tiles[start..end] {
            *slot = tile.clone();
        }
        Ok(())
    }

    /// Stamp one brush dab.
    pub fn brush_stamp_apply(
        &mut self,
        context_id: ContextId,
        color: Pixel,
        blend_mode: BlendMode,
        stamp: &BrushStamp,
    ) {
        let Some(rect) = self.clip_to_layer(Rect::new(
            stamp.left,
            stamp.top,
            stamp.diameter as i32,
            stamp.diameter as i32,
        )) else {
            return;
        };
        let grid = self.grid;
        let tiles = Arc::make_mut(&mut self.tiles);
        for_each_tile_row(grid, rect, |index, canvas_x, canvas_y, length, local_start| {
            let data = tiles[index].data_mut(context_id);
            let mask_start = ((canvas_y - stamp.top) as u32 * stamp.diameter
                + (canvas_x - stamp.left) as u32) as usize;
            composite_mask(
                &mut data.pixels[local_start..local_start + length],
                &stamp.mask[mask_start..mask_start + length],
                color,
                255,
                blend_mode,
            );
        });
        self.normalize_rect(rect);
    }

    /// Composite every tile of `other` onto this content.
    pub fn merge(
        &mut self,
        context_id: ContextId,
        other: &LayerContent,
        opacity: u8,
        blend_mode: BlendMode,
    ) {
        let tiles = Arc::make_mut(&mut self.tiles);
        for index in 0..self.grid.tile_count() {
            let pos = self.grid.tile_pos(index).expect("tile index in range");
            let src = other.tile_at(pos);
            if src.is_blank() {
                continue;
            }
            let dst = &mut tiles[index];
            if dst.is_blank() && opacity == 255 && blend_mode == BlendMode::Normal {
                // Compositing onto nothing with plain source-over yields
                // the source, so share the tile instead of copying it.
                *dst = src.clone();
                continue;
            }
            src.composite_onto(dst.data_mut(context_id), opacity, blend_mode);
            dst.normalize();
        }
    }

    /// The sublayer with the given id, created with default props when
    /// missing. Returns uniquely owned content and props, ready to write.
    pub fn sublayer_mut(
        &mut self,
        sublayer_id: u32,
    ) -> (&mut LayerContent, &mut LayerProps) {
        let index = match self.find_sublayer(sublayer_id) {
            Some(index) => index,
            None => {
                let content = LayerContent::new(self.width, self.height, None);
                let mut props = LayerProps::new(sublayer_id, String::new());
                props.sublayer_id = sublayer_id;
                self.sublayers.push(Layer::new(content, props));
                self.sublayers.len() - 1
            }
        };
        let sublayer = &mut self.sublayers[index];
        (
            Arc::make_mut(&mut sublayer.content),
            Arc::make_mut(&mut sublayer.props),
        )
    }

    /// Merge the sublayer at `index` into the stored pixels and drop it.
    pub fn merge_sublayer_at(&mut self, context_id: ContextId, index: usize) {
        let sublayer = self.sublayers.remove(index);
        self.merge(
            context_id,
            &sublayer.content,
            sublayer.props.opacity,
            sublayer.props.blend_mode,
        );
    }

    pub fn merge_sublayer(&mut self, context_id: ContextId, sublayer_id: u32) -> bool {
        match self.find_sublayer(sublayer_id) {
            Some(index) => {
                self.merge_sublayer_at(context_id, index);
                true
            }
            None => false,
        }
    }

    pub fn merge_all_sublayers(&mut self, context_id: ContextId) {
        while !self.sublayers.is_empty() {
            self.merge_sublayer_at(context_id, 0);
        }
    }

    /// Collapse tiles in the rectangle that an edit may have left fully
    /// transparent.
    fn normalize_rect(&mut self, rect: Rect) {
        let grid = self.grid;
        let tiles = Arc::make_mut(&mut self.tiles);
        let tile_left = rect.x as u32 / TILE_SIZE;
        let tile_top = rect.y as u32 / TILE_SIZE;
        let tile_right = rect.right() as u32 / TILE_SIZE;
        let tile_bottom = rect.bottom() as u32 / TILE_SIZE;
        for tile_y in tile_top..=tile_bottom {
            for tile_x in tile_left..=tile_right {
                if let Ok(index) = grid.tile_index(TilePos {
                    x: tile_x,
                    y: tile_y,
                }) {
                    tiles[index].normalize();
                }
            }
        }
    }
}

/// Visit every (tile, row segment) covered by `rect`, which must already
/// be clipped to the grid. The callback receives the tile index, the
/// canvas coordinates of the segment start, its length, and the start
/// offset inside the tile's pixel block.
fn for_each_tile_row<F>(grid: TileGrid, rect: Rect, mut callback: F)
where
    F: FnMut(usize, i32, i32, usize, usize),
{
    debug_assert!(rect.x >= 0 && rect.y >= 0 && !rect.is_empty());
    let tile_left = rect.x as u32 / TILE_SIZE;
    let tile_top = rect.y as u32 / TILE_SIZE;
    let tile_right = rect.right() as u32 / TILE_SIZE;
    let tile_bottom = rect.bottom() as u32 / TILE_SIZE;
    for tile_y in tile_top..=tile_bottom {
        for tile_x in tile_left..=tile_right {
            let pos = TilePos {
                x: tile_x,
                y: tile_y,
            };
            let Ok(index) = grid.tile_index(pos) else {
                continue;
            };
            let span_left = rect.x.max((tile_x * TILE_SIZE) as i32);
            let span_right = rect.right().min((tile_x * TILE_SIZE + TILE_SIZE - 1) as i32);
            let span_top = rect.y.max((tile_y * TILE_SIZE) as i32);
            let span_bottom = rect.bottom().min((tile_y * TILE_SIZE + TILE_SIZE - 1) as i32);
            let length = (span_right - span_left + 1) as usize;
            for canvas_y in span_top..=span_bottom {
                let local_x = span_left as u32 - tile_x * TILE_SIZE;
                let local_y = canvas_y as u32 - tile_y * TILE_SIZE;
                let local_start = (local_y * TILE_SIZE + local_x) as usize;
                callback(index, span_left, canvas_y, length, local_start);
            }
        }
    }
}
