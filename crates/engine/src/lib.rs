//! The command interpreter: a deterministic transition function from one
//! immutable canvas snapshot plus one drawing message to the next
//! snapshot.
//!
//! Every handler works on a fresh clone of the input state, which shares
//! all untouched subtrees; a failed handler simply drops the clone, so
//! the input snapshot is never disturbed. Handlers that find no work to
//! do hand back the input snapshot itself.

use std::fmt;
use std::sync::Arc;

use document::{CanvasState, Image, StateError, Tile};
use model::{BlendMode, ContextId, LayerId, Quad, Rect};
use protocol::{Message, TilePayload};

pub use context::{DrawContext, DrawContextConfig};
pub use transform::{image_transform, TransformError};

pub mod context;
pub mod paint;
pub mod transform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    State(StateError),
    Transform(TransformError),
    UnknownMessage { message_type: u8 },
}

impl fmt::Display for CommandError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::State(error) => write!(formatter, "{error}"),
            CommandError::Transform(error) => write!(formatter, "{error}"),
            CommandError::UnknownMessage { message_type } => {
                write!(formatter, "unhandled draw message type {message_type}")
            }
        }
    }
}

impl std::error::Error for CommandError {}

impl From<StateError> for CommandError {
    fn from(error: StateError) -> Self {
        CommandError::State(error)
    }
}

impl From<TransformError> for CommandError {
    fn from(error: TransformError) -> Self {
        CommandError::Transform(error)
    }
}

fn invalid_argument(message: String) -> CommandError {
    CommandError::State(StateError::InvalidArgument(message))
}

fn known_blend_mode(operation: &str, raw: u8) -> Result<BlendMode, CommandError> {
    BlendMode::from_raw(raw)
        .ok_or_else(|| invalid_argument(format!("{operation}: unknown blend mode {raw}")))
}

fn brush_blend_mode(operation: &str, raw: u8) -> Result<BlendMode, CommandError> {
    let mode = known_blend_mode(operation, raw)?;
    if mode.valid_for_brush() {
        Ok(mode)
    } else {
        Err(invalid_argument(format!(
            "{operation}: blend mode {} not applicable to brushes",
            mode.name()
        )))
    }
}

fn tile_from_payload(context_id: ContextId, payload: &TilePayload) -> Result<Tile, CommandError> {
    Ok(match payload {
        TilePayload::Color(color) => Tile::from_solid_color(context_id, *color),
        TilePayload::Compressed(bytes) => Tile::from_compressed(context_id, bytes)?,
    })
}

/// Apply one drawing message to a snapshot, yielding the next snapshot or
/// a failure that leaves the input untouched.
pub fn handle(
    state: &Arc<CanvasState>,
    dc: &mut DrawContext,
    message: &Message,
) -> Result<Arc<CanvasState>, CommandError> {
    log::debug!("draw command {}", message.type_name());
    match message {
        Message::CanvasResize {
            context_id,
            top,
            right,
            bottom,
            left,
        } => {
            let mut next = CanvasState::clone(state);
            next.resize(*context_id, *top, *right, *bottom, *left)?;
            Ok(Arc::new(next))
        }
        Message::LayerCreate {
            context_id,
            layer_id,
            source_id,
            fill,
            flags,
            title,
        } => {
            let mut next = CanvasState::clone(state);
            let fill_tile = if *fill == 0 {
                None
            } else {
                Some(Tile::from_solid_color(*context_id, *fill))
            };
            let (width, height) = (next.width(), next.height());
            next.layers_mut().layer_create(
                *layer_id,
                *source_id,
                fill_tile.as_ref(),
                flags & protocol::LAYER_CREATE_FLAG_INSERT != 0,
                flags & protocol::LAYER_CREATE_FLAG_COPY != 0,
                width,
                height,
                title.clone(),
            )?;
            Ok(Arc::new(next))
        }
        Message::LayerAttr {
            layer_id,
            sublayer_id,
            opacity,
            blend_mode,
            flags,
        } => {
            let mode = known_blend_mode("layer attributes", *blend_mode)?;
            let mut next = CanvasState::clone(state);
            next.layers_mut().layer_attr(
                *layer_id,
                *sublayer_id,
                *opacity,
                mode,
                flags & protocol::LAYER_ATTR_FLAG_CENSORED != 0,
                flags & protocol::LAYER_ATTR_FLAG_FIXED != 0,
            )?;
            Ok(Arc::new(next))
        }
        Message::LayerOrder { layer_ids } => {
            let mut next = CanvasState::clone(state);
            next.layers_mut().layer_reorder(layer_ids)?;
            Ok(Arc::new(next))
        }
        Message::LayerRetitle { layer_id, title } => {
            let mut next = CanvasState::clone(state);
            next.layers_mut().layer_retitle(*layer_id, title.clone())?;
            Ok(Arc::new(next))
        }
        Message::LayerDelete {
            context_id,
            layer_id,
            merge,
        } => {
            let mut next = CanvasState::clone(state);
            next.layers_mut()
                .layer_delete(*context_id, *layer_id, *merge)?;
            Ok(Arc::new(next))
        }
        Message::LayerVisibility { layer_id, visible } => {
            let mut next = CanvasState::clone(state);
            next.layers_mut().layer_visibility(*layer_id, *visible)?;
            Ok(Arc::new(next))
        }
        Message::PutImage {
            context_id,
            layer_id,
            blend_mode,
            x,
            y,
            width,
            height,
            image,
        } => handle_put_image(
            state, *context_id, *layer_id, *blend_mode, *x, *y, *width, *height, image,
        ),
        Message::FillRect {
            context_id,
            layer_id,
            blend_mode,
            x,
            y,
            width,
            height,
            color,
        } => handle_fill_rect(
            state, *context_id, *layer_id, *blend_mode, *x, *y, *width, *height, *color,
        ),
        Message::RegionMove {
            context_id,
            layer_id,
            src_x,
            src_y,
            src_width,
            src_height,
            dst_quad,
            mask,
        } => handle_region_move(
            state,
            dc,
            *context_id,
            *layer_id,
            Rect::new(*src_x, *src_y, *src_width, *src_height),
            dst_quad,
            mask.as_deref(),
        ),
        Message::PutTile {
            context_id,
            layer_id,
            sublayer_id,
            x,
            y,
            repeat,
            tile,
        } => {
            let tile = tile_from_payload(*context_id, tile)?;
            let mut next = CanvasState::clone(state);
            next.layers_mut()
                .put_tile(&tile, *layer_id, *sublayer_id, *x, *y, *repeat)?;
            Ok(Arc::new(next))
        }
        Message::CanvasBackground { context_id, tile } => {
            let tile = tile_from_payload(*context_id, tile)?;
            let mut next = CanvasState::clone(state);
            next.set_background(tile);
            Ok(Arc::new(next))
        }
        Message::PenUp { context_id } => handle_pen_up(state, *context_id),
        Message::DrawDabsClassic {
            context_id,
            layer_id,
            origin_x,
            origin_y,
            color,
            blend_mode,
            indirect,
            dabs,
        } => {
            if dabs.is_empty() {
                return Ok(Arc::clone(state));
            }
            handle_draw_dabs(
                state,
                *context_id,
                *layer_id,
                *blend_mode,
                *indirect,
                paint::DrawDabsParams {
                    context_id: *context_id,
                    origin_x: *origin_x,
                    origin_y: *origin_y,
                    color: *color,
                    blend_mode: BlendMode::Normal,
                    classic_dabs: dabs,
                    pixel_dabs: &[],
                    shape: paint::DabShape::Classic,
                },
                *color,
            )
        }
        Message::DrawDabsPixel {
            context_id,
            layer_id,
            origin_x,
            origin_y,
            color,
            blend_mode,
            indirect,
            dabs,
        } => {
            if dabs.is_empty() {
                return Ok(Arc::clone(state));
            }
            handle_draw_dabs(
                state,
                *context_id,
                *layer_id,
                *blend_mode,
                *indirect,
                paint::DrawDabsParams {
                    context_id: *context_id,
                    origin_x: *origin_x,
                    origin_y: *origin_y,
                    color: *color,
                    blend_mode: BlendMode::Normal,
                    classic_dabs: &[],
                    pixel_dabs: dabs,
                    shape: paint::DabShape::PixelRound,
                },
                *color,
            )
        }
        Message::DrawDabsPixelSquare {
            context_id,
            layer_id,
            origin_x,
            origin_y,
            color,
            blend_mode,
            indirect,
            dabs,
        } => {
            if dabs.is_empty() {
                return Ok(Arc::clone(state));
            }
            handle_draw_dabs(
                state,
                *context_id,
                *layer_id,
                *blend_mode,
                *indirect,
                paint::DrawDabsParams {
                    context_id: *context_id,
                    origin_x: *origin_x,
                    origin_y: *origin_y,
                    color: *color,
                    blend_mode: BlendMode::Normal,
                    classic_dabs: &[],
                    pixel_dabs: dabs,
                    shape: paint::DabShape::PixelSquare,
                },
                *color,
            )
        }
        Message::Unknown { message_type } => Err(CommandError::UnknownMessage {
            message_type: *message_type,
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_put_image(
    state: &Arc<CanvasState>,
    context_id: ContextId,
    layer_id: LayerId,
    blend_mode: u8,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    compressed: &[u8],
) -> Result<Arc<CanvasState>, CommandError> {
    let mode = known_blend_mode("put image", blend_mode)?;
    if width == 0
        || height == 0
        || width > model::MAX_CANVAS_SIZE
        || height > model::MAX_CANVAS_SIZE
    {
        return Err(invalid_argument(format!(
            "put image: invalid dimensions {width}x{height}"
        )));
    }
    let image = Image::from_compressed(width, height, compressed)?;
    let mut next = CanvasState::clone(state);
    next.layers_mut()
        .put_image(context_id, layer_id, mode, x, y, &image)?;
    Ok(Arc::new(next))
}

#[allow(clippy::too_many_arguments)]
fn handle_fill_rect(
    state: &Arc<CanvasState>,
    context_id: ContextId,
    layer_id: LayerId,
    blend_mode: u8,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    color: u32,
) -> Result<Arc<CanvasState>, CommandError> {
    let mode = brush_blend_mode("fill rect", blend_mode)?;

    let left = x.max(0);
    let top = y.max(0);
    let right = x.saturating_add(width).min(state.width() as i32);
    let bottom = y.saturating_add(height).min(state.height() as i32);
    if left >= right || top >= bottom {
        return Err(invalid_argument(
            "fill rect: effective area to fill is zero".to_string(),
        ));
    }

    let mut next = CanvasState::clone(state);
    next.layers_mut()
        .fill_rect(context_id, layer_id, mode, left, top, right, bottom, color)?;
    Ok(Arc::new(next))
}

fn handle_region_move(
    state: &Arc<CanvasState>,
    dc: &mut DrawContext,
    context_id: ContextId,
    layer_id: LayerId,
    src_rect: Rect,
    dst_quad: &[i32; 8],
    mask: Option<&[u8]>,
) -> Result<Arc<CanvasState>, CommandError> {
    if src_rect.width <= 0 || src_rect.height <= 0 {
        return Err(invalid_argument(
            "region move: selection is empty".to_string(),
        ));
    }

    let mask = match mask {
        Some(compressed) => Some(Image::from_compressed_monochrome(
            src_rect.width as u32,
            src_rect.height as u32,
            compressed,
        )?),
        None => None,
    };

    let quad = Quad::new(
        dst_quad[0], dst_quad[1], dst_quad[2], dst_quad[3], dst_quad[4], dst_quad[5], dst_quad[6],
        dst_quad[7],
    );
    let max_size = (state.width() as i64 + 1) * (state.height() as i64 + 1);
    if quad.bounds().size() > max_size {
        return Err(invalid_argument(
            "region move: attempt to scale beyond image size".to_string(),
        ));
    }

    let mut next = CanvasState::clone(state);
    let content = next.layers_mut().content_mut(layer_id)?;

    let selection = content.select(src_rect, mask.as_ref());
    match &mask {
        Some(mask) => {
            // Only the masked pixels move, so only they are cleared.
            content.put_image(context_id, BlendMode::Erase, src_rect.x, src_rect.y, mask);
        }
        None => {
            content.fill_rect(
                context_id,
                BlendMode::Erase,
                src_rect.x,
                src_rect.y,
                src_rect.x + src_rect.width,
                src_rect.y + src_rect.height,
                0xff00_0000,
            );
        }
    }

    let (moved, offset_x, offset_y) = image_transform(&selection, dc, quad)?;
    content.put_image(context_id, BlendMode::Normal, offset_x, offset_y, &moved);
    Ok(Arc::new(next))
}

fn handle_pen_up(
    state: &Arc<CanvasState>,
    context_id: ContextId,
) -> Result<Arc<CanvasState>, CommandError> {
    // Only indirect strokes leave sublayers behind. Walk the read-only
    // tree first; when there is nothing to merge, no node is cloned and
    // the caller keeps the very same snapshot.
    if !state.layers().has_context_sublayers(context_id) {
        return Ok(Arc::clone(state));
    }
    let mut next = CanvasState::clone(state);
    next.layers_mut().merge_context_sublayers(context_id);
    Ok(Arc::new(next))
}

#[allow(clippy::too_many_arguments)]
fn handle_draw_dabs(
    state: &Arc<CanvasState>,
    context_id: ContextId,
    layer_id: LayerId,
    blend_mode: u8,
    indirect: bool,
    mut params: paint::DrawDabsParams<'_>,
    color: u32,
) -> Result<Arc<CanvasState>, CommandError> {
    let mode = brush_blend_mode("draw dabs", blend_mode)?;

    let mut next = CanvasState::clone(state);
    let content = next.layers_mut().content_mut(layer_id)?;
    if indirect {
        // Dabs accumulate into a per-context sublayer with plain
        // compositing; the requested mode and the color's alpha apply
        // when the stroke is merged on pen up.
        let (sub_content, sub_props) = content.sublayer_mut(context_id);
        sub_props.opacity = (color >> 24) as u8;
        sub_props.blend_mode = mode;
        params.blend_mode = BlendMode::Normal;
        paint::draw_dabs(sub_content, &params);
    } else {
        params.blend_mode = mode;
        paint::draw_dabs(content, &params);
    }
    Ok(Arc::new(next))
}
