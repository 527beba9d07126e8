//! This crate defines the typed drawing command records the interpreter
//! consumes. Can be depended on by any crate; should not depend on other
//! crates.
//!
//! Records carry raw wire values (blend modes as bytes, colors as BGRA
//! words); validation against the known enums is the interpreter's job, so
//! a malformed command fails there instead of at decode time.

pub type ContextId = u32;
pub type LayerId = u32;

pub const LAYER_CREATE_FLAG_COPY: u8 = 0x01;
pub const LAYER_CREATE_FLAG_INSERT: u8 = 0x02;

pub const LAYER_ATTR_FLAG_CENSORED: u8 = 0x01;
pub const LAYER_ATTR_FLAG_FIXED: u8 = 0x02;

/// Tile-sized payloads are either a solid BGRA color or a zlib-deflated
/// pixel block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TilePayload {
    Color(u32),
    Compressed(Vec<u8>),
}

/// One soft round dab. Positions are offsets from the message origin in
/// 1/4 pixel steps, diameters in 1/256 pixel steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassicDab {
    pub x: i32,
    pub y: i32,
    pub size: u32,
    pub hardness: u8,
    pub opacity: u8,
}

/// One hard pixel dab (round or square depending on the message type).
/// Positions are offsets from the message origin in whole pixels,
/// diameters in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelDab {
    pub x: i32,
    pub y: i32,
    pub size: u8,
    pub opacity: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    CanvasResize {
        context_id: ContextId,
        top: i32,
        right: i32,
        bottom: i32,
        left: i32,
    },
    LayerCreate {
        context_id: ContextId,
        layer_id: LayerId,
        source_id: LayerId,
        fill: u32,
        flags: u8,
        title: String,
    },
    LayerAttr {
        layer_id: LayerId,
        sublayer_id: u32,
        opacity: u8,
        blend_mode: u8,
        flags: u8,
    },
    LayerOrder {
        layer_ids: Vec<LayerId>,
    },
    LayerRetitle {
        layer_id: LayerId,
        title: String,
    },
    LayerDelete {
        context_id: ContextId,
        layer_id: LayerId,
        merge: bool,
    },
    LayerVisibility {
        layer_id: LayerId,
        visible: bool,
    },
    PutImage {
        context_id: ContextId,
        layer_id: LayerId,
        blend_mode: u8,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        image: Vec<u8>,
    },
    FillRect {
        context_id: ContextId,
        layer_id: LayerId,
        blend_mode: u8,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: u32,
    },
    RegionMove {
        context_id: ContextId,
        layer_id: LayerId,
        src_x: i32,
        src_y: i32,
        src_width: i32,
        src_height: i32,
        dst_quad: [i32; 8],
        mask: Option<Vec<u8>>,
    },
    PutTile {
        context_id: ContextId,
        layer_id: LayerId,
        sublayer_id: u32,
        x: u32,
        y: u32,
        repeat: u32,
        tile: TilePayload,
    },
    CanvasBackground {
        context_id: ContextId,
        tile: TilePayload,
    },
    PenUp {
        context_id: ContextId,
    },
    DrawDabsClassic {
        context_id: ContextId,
        layer_id: LayerId,
        origin_x: i32,
        origin_y: i32,
        color: u32,
        blend_mode: u8,
        indirect: bool,
        dabs: Vec<ClassicDab>,
    },
    DrawDabsPixel {
        context_id: ContextId,
        layer_id: LayerId,
        origin_x: i32,
        origin_y: i32,
        color: u32,
        blend_mode: u8,
        indirect: bool,
        dabs: Vec<PixelDab>,
    },
    DrawDabsPixelSquare {
        context_id: ContextId,
        layer_id: LayerId,
        origin_x: i32,
        origin_y: i32,
        color: u32,
        blend_mode: u8,
        indirect: bool,
        dabs: Vec<PixelDab>,
    },
    /// A message type the producer recognized on the wire but this
    /// interpreter does not handle.
    Unknown {
        message_type: u8,
    },
}

impl Message {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Message::CanvasResize { .. } => "canvas_resize",
            Message::LayerCreate { .. } => "layer_create",
            Message::LayerAttr { .. } => "layer_attr",
            Message::LayerOrder { .. } => "layer_order",
            Message::LayerRetitle { .. } => "layer_retitle",
            Message::LayerDelete { .. } => "layer_delete",
            Message::LayerVisibility { .. } => "layer_visibility",
            Message::PutImage { .. } => "put_image",
            Message::FillRect { .. } => "fill_rect",
            Message::RegionMove { .. } => "region_move",
            Message::PutTile { .. } => "put_tile",
            Message::CanvasBackground { .. } => "canvas_background",
            Message::PenUp { .. } => "pen_up",
            Message::DrawDabsClassic { .. } => "draw_dabs_classic",
            Message::DrawDabsPixel { .. } => "draw_dabs_pixel",
            Message::DrawDabsPixelSquare { .. } => "draw_dabs_pixel_square",
            Message::Unknown { .. } => "unknown",
        }
    }
}
