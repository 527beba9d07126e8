//! Rasterization of brush dab records into coverage stamps.
//!
//! Brush parameter interpretation (pressure curves, spacing) happens in
//! the message producer; this module only turns the dab records it sends
//! into masks and stamps them onto layer content.

use document::{BrushStamp, LayerContent};
use model::pixel::Pixel;
use model::{BlendMode, ContextId};
use protocol::{ClassicDab, PixelDab};

#[derive(Debug, Clone, Copy)]
pub enum DabShape {
    /// Soft round dab with a hardness-controlled falloff. Positions in
    /// 1/4 pixel steps, diameter in 1/256 pixel steps.
    Classic,
    /// Hard round dab on whole pixels.
    PixelRound,
    /// Hard square dab on whole pixels.
    PixelSquare,
}

pub struct DrawDabsParams<'a> {
    pub context_id: ContextId,
    pub origin_x: i32,
    pub origin_y: i32,
    pub color: u32,
    pub blend_mode: BlendMode,
    pub classic_dabs: &'a [ClassicDab],
    pub pixel_dabs: &'a [PixelDab],
    pub shape: DabShape,
}

/// Stamp every dab onto `content`. The dab color's alpha byte is not
/// used here; per-dab opacity modulates the stamp coverage instead.
pub fn draw_dabs(content: &mut LayerContent, params: &DrawDabsParams) {
    let color = Pixel::from_bgra(params.color | 0xff00_0000);
    match params.shape {
        DabShape::Classic => {
            for dab in params.classic_dabs {
                let stamp = classic_stamp(params.origin_x, params.origin_y, dab);
                content.brush_stamp_apply(params.context_id, color, params.blend_mode, &stamp);
            }
        }
        DabShape::PixelRound | DabShape::PixelSquare => {
            let round = matches!(params.shape, DabShape::PixelRound);
            for dab in params.pixel_dabs {
                let stamp = pixel_stamp(params.origin_x, params.origin_y, dab, round);
                content.brush_stamp_apply(params.context_id, color, params.blend_mode, &stamp);
            }
        }
    }
}

fn classic_stamp(origin_x: i32, origin_y: i32, dab: &ClassicDab) -> BrushStamp {
    let center_x = origin_x as f32 + dab.x as f32 / 4.0;
    let center_y = origin_y as f32 + dab.y as f32 / 4.0;
    // Dab sizes are 16 bits on the wire; anything larger is garbage.
    let radius = dab.size.min(u16::MAX as u32) as f32 / 256.0 / 2.0;
    let hardness = dab.hardness as f32 / 255.0;

    let left = (center_x - radius).floor() as i32;
    let top = (center_y - radius).floor() as i32;
    let diameter = ((center_x + radius).ceil() as i32 - left).max(1) as u32;
    let diameter = diameter.max(((center_y + radius).ceil() as i32 - top).max(1) as u32);

    let mut mask = vec![0_u8; (diameter * diameter) as usize];
    for row in 0..diameter {
        for column in 0..diameter {
            let dx = (left + column as i32) as f32 + 0.5 - center_x;
            let dy = (top + row as i32) as f32 + 0.5 - center_y;
            let distance = (dx * dx + dy * dy).sqrt();
            let coverage = feathered_coverage(distance, radius, hardness);
            mask[(row * diameter + column) as usize] =
                (coverage * dab.opacity as f32 + 0.5) as u8;
        }
    }
    BrushStamp {
        left,
        top,
        diameter,
        mask,
    }
}

/// 1.0 inside the hard core, falling off linearly to 0 at the radius.
/// The edge always gets at least half a pixel of falloff so hairline
/// dabs stay visible.
fn feathered_coverage(distance: f32, radius: f32, hardness: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    let core = (radius * hardness).min(radius - 0.5).max(0.0);
    if distance <= core {
        1.0
    } else if distance >= radius {
        0.0
    } else {
        (radius - distance) / (radius - core)
    }
}

fn pixel_stamp(origin_x: i32, origin_y: i32, dab: &PixelDab, round: bool) -> BrushStamp {
    let diameter = (dab.size as u32).max(1);
    let left = origin_x + dab.x - (diameter / 2) as i32;
    let top = origin_y + dab.y - (diameter / 2) as i32;

    let mut mask = vec![0_u8; (diameter * diameter) as usize];
    if round {
        let radius = diameter as f32 / 2.0;
        let center = diameter as f32 / 2.0;
        for row in 0..diameter {
            for column in 0..diameter {
                let dx = column as f32 + 0.5 - center;
                let dy = row as f32 + 0.5 - center;
                if dx * dx + dy * dy <= radius * radius {
                    mask[(row * diameter + column) as usize] = dab.opacity;
                }
            }
        }
    } else {
        mask.fill(dab.opacity);
    }
    BrushStamp {
        left,
        top,
        diameter,
        mask,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_stamp_covers_the_full_block() {
        let dab = PixelDab {
            x: 0,
            y: 0,
            size: 3,
            opacity: 200,
        };
        let stamp = pixel_stamp(10, 10, &dab, false);
        assert_eq!(stamp.diameter, 3);
        assert_eq!(stamp.left, 9);
        assert_eq!(stamp.top, 9);
        assert!(stamp.mask.iter().all(|&coverage| coverage == 200));
    }

    #[test]
    fn round_stamp_clears_the_corners() {
        let dab = PixelDab {
            x: 0,
            y: 0,
            size: 4,
            opacity: 255,
        };
        let stamp = pixel_stamp(0, 0, &dab, true);
        assert_eq!(stamp.mask[0], 0);
        assert_eq!(stamp.mask[(stamp.diameter * stamp.diameter - 1) as usize], 0);
        let center = (stamp.diameter / 2 * stamp.diameter + stamp.diameter / 2) as usize;
        assert_eq!(stamp.mask[center], 255);
    }

    #[test]
    fn classic_stamp_fades_toward_the_edge() {
        let dab = ClassicDab {
            x: 0,
            y: 0,
            size: 16 * 256,
            hardness: 128,
            opacity: 255,
        };
        let stamp = classic_stamp(32, 32, &dab);
        let center =
            (stamp.diameter / 2 * stamp.diameter + stamp.diameter / 2) as usize;
        assert_eq!(stamp.mask[center], 255);
        assert_eq!(stamp.mask[0], 0);
    }

    #[test]
    fn dab_opacity_scales_the_classic_mask() {
        let dab = ClassicDab {
            x: 0,
            y: 0,
            size: 8 * 256,
            hardness: 255,
            opacity: 128,
        };
        let stamp = classic_stamp(16, 16, &dab);
        let center =
            (stamp.diameter / 2 * stamp.diameter + stamp.diameter / 2) as usize;
        assert_eq!(stamp.mask[center], 128);
    }
}
