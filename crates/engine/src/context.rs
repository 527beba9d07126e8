//! Exclusive per-interpreter scratch state: the transform fetch buffer
//! and the rasterizer's growable scratch pool. One draw context belongs
//! to one interpreter thread; it is never shared.

use model::pixel::{Pixel, ZERO_PIXEL};
use model::TILE_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawContextConfig {
    /// Size of the bilinear fetch buffer, in tiles' worth of pixels.
    pub transform_buffer_tiles: usize,
    /// Initial rasterizer scratch pool size, in entries.
    pub raster_pool_initial: usize,
    /// The pool doubles on demand up to this many entries; needing more
    /// fails the operation.
    pub raster_pool_max: usize,
}

impl Default for DrawContextConfig {
    fn default() -> Self {
        Self {
            transform_buffer_tiles: 1,
            raster_pool_initial: 4096,
            raster_pool_max: 1 << 24,
        }
    }
}

#[derive(Debug)]
pub struct DrawContext {
    transform_buffer: Vec<Pixel>,
    raster_pool: Vec<f32>,
    raster_pool_max: usize,
}

impl Default for DrawContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawContext {
    pub fn new() -> Self {
        Self::with_config(DrawContextConfig::default())
    }

    pub fn with_config(config: DrawContextConfig) -> Self {
        Self {
            transform_buffer: vec![ZERO_PIXEL; config.transform_buffer_tiles.max(1) * TILE_LENGTH],
            raster_pool: vec![0.0; config.raster_pool_initial.max(1)],
            raster_pool_max: config.raster_pool_max,
        }
    }

    pub fn raster_pool_max(&self) -> usize {
        self.raster_pool_max
    }

    /// The fetch buffer together with at least `required` entries of
    /// rasterizer scratch. The pool doubles until it fits, or returns
    /// `None` once that would exceed the configured maximum.
    pub fn buffers(&mut self, required: usize) -> Option<(&mut [Pixel], &mut [f32])> {
        if required > self.raster_pool.len() {
            let mut size = self.raster_pool.len().max(1);
            while size < required {
                size *= 2;
            }
            if size > self.raster_pool_max {
                return None;
            }
            self.raster_pool.resize(size, 0.0);
        }
        Some((&mut self.transform_buffer, &mut self.raster_pool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_doubles_up_to_the_cap() {
        let mut context = DrawContext::with_config(DrawContextConfig {
            transform_buffer_tiles: 1,
            raster_pool_initial: 8,
            raster_pool_max: 32,
        });
        let (_, pool) = context.buffers(9).expect("within cap");
        assert_eq!(pool.len(), 16);
        let (_, pool) = context.buffers(32).expect("at cap");
        assert_eq!(pool.len(), 32);
        assert!(context.buffers(33).is_none());
    }

    #[test]
    fn transform_buffer_is_tile_sized() {
        let mut context = DrawContext::new();
        let (buffer, _) = context.buffers(1).expect("buffers");
        assert_eq!(buffer.len(), TILE_LENGTH);
    }
}
