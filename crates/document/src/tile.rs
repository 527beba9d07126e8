//! Fixed-size pixel blocks, the unit of storage, diffing and rendering.

use std::sync::Arc;

use model::pixel::{composite_pixels, Pixel, ZERO_PIXEL};
use model::{BlendMode, ContextId, TILE_LENGTH};

use crate::StateError;

static BLANK_PIXELS: [Pixel; TILE_LENGTH] = [ZERO_PIXEL; TILE_LENGTH];

/// A tile is either the shared all-transparent block or a heap pixel
/// block. Cloning is a reference count bump; writing goes through
/// [`Tile::data_mut`], which copies only when the block is shared.
#[derive(Debug, Clone, Default)]
pub enum Tile {
    #[default]
    Blank,
    Bitmap(Arc<TileData>),
}

#[derive(Debug, Clone)]
pub struct TileData {
    /// Who last painted this tile. Carried for downstream bookkeeping
    /// only; never affects pixel content.
    pub context_id: ContextId,
    pub pixels: [Pixel; TILE_LENGTH],
}

impl TileData {
    pub fn new_blank(context_id: ContextId) -> Self {
        Self {
            context_id,
            pixels: [ZERO_PIXEL; TILE_LENGTH],
        }
    }

    pub fn new_solid(context_id: ContextId, pixel: Pixel) -> Self {
        Self {
            context_id,
            pixels: [pixel; TILE_LENGTH],
        }
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|pixel| pixel.is_zero())
    }

    /// Freeze into a tile, collapsing an all-transparent block back to the
    /// shared blank tile.
    pub fn persist(self) -> Tile {
        if self.is_blank() {
            Tile::Blank
        } else {
            Tile::Bitmap(Arc::new(self))
        }
    }
}

impl Tile {
    pub fn from_solid_color(context_id: ContextId, bgra: u32) -> Tile {
        if bgra == 0 {
            Tile::Blank
        } else {
            Tile::Bitmap(Arc::new(TileData::new_solid(
                context_id,
                Pixel::from_bgra(bgra),
            )))
        }
    }

    /// Decompress a zlib tile payload. The payload must inflate to exactly
    /// one tile's worth of pixels in canonical byte order.
    pub fn from_compressed(context_id: ContextId, input: &[u8]) -> Result<Tile, StateError> {
        let bytes = codec::inflate_exact(input, TILE_LENGTH * 4)?;
        let mut data = TileData::new_blank(context_id);
        for (pixel, chunk) in data.pixels.iter_mut().zip(bytes.chunks_exact(4)) {
            *pixel = Pixel::from_bgra(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        Ok(data.persist())
    }

    /// Deflate the pixel payload in canonical byte order.
    pub fn compress(&self) -> Result<Vec<u8>, StateError> {
        let mut bytes = Vec::with_capacity(TILE_LENGTH * 4);
        for pixel in self.pixels() {
            bytes.extend_from_slice(&pixel.to_bgra().to_le_bytes());
        }
        Ok(codec::deflate(&bytes)?)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Tile::Blank)
    }

    pub fn context_id(&self) -> ContextId {
        match self {
            Tile::Blank => 0,
            Tile::Bitmap(data) => data.context_id,
        }
    }

    pub fn pixels(&self) -> &[Pixel; TILE_LENGTH] {
        match self {
            Tile::Blank => &BLANK_PIXELS,
            Tile::Bitmap(data) => &data.pixels,
        }
    }

    /// Mutable access for in-place edits. A blank tile is expanded to a
    /// zeroed block and a shared block is copied first, so the returned
    /// data is always uniquely owned.
    pub fn data_mut(&mut self, context_id: ContextId) -> &mut TileData {
        if let Tile::Blank = self {
            *self = Tile::Bitmap(Arc::new(TileData::new_blank(context_id)));
        }
        match self {
            Tile::Bitmap(data) => {
                let data = Arc::make_mut(data);
                data.context_id = context_id;
                data
            }
            Tile::Blank => unreachable!(),
        }
    }

    /// Collapse back to the shared blank tile if an edit left this tile
    /// fully transparent.
    pub fn normalize(&mut self) {
        if let Tile::Bitmap(data) = self {
            if data.is_blank() {
                *self = Tile::Blank;
            }
        }
    }

    /// Identity comparison: do both references point at the same block?
    pub fn ptr_eq(a: &Tile, b: &Tile) -> bool {
        match (a, b) {
            (Tile::Blank, Tile::Blank) => true,
            (Tile::Bitmap(a), Tile::Bitmap(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Content comparison with the identity check as the fast path, so
    /// shared tiles never touch pixel data.
    pub fn same_pixels(a: &Tile, b: &Tile) -> bool {
        Tile::ptr_eq(a, b) || a.pixels() == b.pixels()
    }

    /// Composite `src` over this tile's pixels.
    pub fn composite_onto(
        &self,
        target: &mut TileData,
        opacity: u8,
        blend_mode: BlendMode,
    ) {
        if !self.is_blank() {
            composite_pixels(&mut target.pixels, self.pixels(), opacity, blend_mode);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tile_is_all_zero() {
        assert!(Tile::Blank.is_blank());
        assert!(Tile::Blank.pixels().iter().all(|pixel| pixel.is_zero()));
    }

    #[test]
    fn solid_color_zero_is_the_blank_tile() {
        assert!(Tile::from_solid_color(1, 0).is_blank());
        assert!(!Tile::from_solid_color(1, 0xff00ff00).is_blank());
    }

    #[test]
    fn persist_collapses_transparent_blocks() {
        let data = TileData::new_blank(3);
        assert!(data.persist().is_blank());

        let data = TileData::new_solid(3, Pixel::from_bgra(0xff000001));
        assert!(!data.persist().is_blank());
    }

    #[test]
    fn data_mut_copies_shared_blocks() {
        let original = Tile::from_solid_color(1, 0xffffffff);
        let mut copy = original.clone();
        assert!(Tile::ptr_eq(&original, &copy));

        copy.data_mut(2).pixels[0] = ZERO_PIXEL;
        assert!(!Tile::ptr_eq(&original, &copy));
        assert_eq!(original.pixels()[0], Pixel::from_bgra(0xffffffff));
        assert_eq!(copy.pixels()[0], ZERO_PIXEL);
        assert_eq!(copy.context_id(), 2);
    }

    #[test]
    fn normalize_restores_the_blank_singleton() {
        let mut tile = Tile::from_solid_color(1, 0xff123456);
        *tile.data_mut(1) = TileData::new_blank(1);
        assert!(!tile.is_blank());
        tile.normalize();
        assert!(tile.is_blank());
    }

    #[test]
    fn compress_then_decompress_round_trips() {
        let mut tile = Tile::Blank;
        let data = tile.data_mut(7);
        for (index, pixel) in data.pixels.iter_mut().enumerate() {
            *pixel = Pixel::from_bgra(0xff000000 | index as u32);
        }
        let compressed = tile.compress().expect("compress");
        let decompressed = Tile::from_compressed(7, &compressed).expect("decompress");
        assert_eq!(tile.pixels()[..], decompressed.pixels()[..]);
    }

    #[test]
    fn from_compressed_rejects_wrong_payload_size() {
        let compressed = codec::deflate(&[0_u8; 16]).expect("deflate");
        assert!(matches!(
            Tile::from_compressed(1, &compressed),
            Err(StateError::Decode(codec::CodecError::SizeMismatch { .. }))
        ));
    }

    #[test]
    fn same_pixels_compares_content_behind_different_identities() {
        let a = Tile::from_solid_color(1, 0xff445566);
        let b = Tile::from_solid_color(2, 0xff445566);
        assert!(!Tile::ptr_eq(&a, &b));
        assert!(Tile::same_pixels(&a, &b));
        assert!(!Tile::same_pixels(&a, &Tile::Blank));
    }
}
