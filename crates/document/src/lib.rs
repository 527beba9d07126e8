//! The persistent canvas data model.
//!
//! Every node (canvas state, layer list, layer content, layer props, tile)
//! is immutable once published and shared by reference. Command handlers
//! mutate a freshly cloned state; the clone shares all untouched subtrees
//! and copies only the nodes it actually writes to, so producing a new
//! snapshot per command stays cheap.

use std::fmt;

pub use canvas_state::CanvasState;
pub use image::{Image, ImageFileType};
pub use layer::Layer;
pub use layer_content::{BrushStamp, LayerContent};
pub use layer_list::LayerList;
pub use layer_props::LayerProps;
pub use tile::{Tile, TileData};

pub mod canvas_state;
pub mod image;
pub mod layer;
pub mod layer_content;
pub mod layer_list;
pub mod layer_props;
pub mod tile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    InvalidArgument(String),
    LayerNotFound { layer_id: model::LayerId },
    SublayerNotFound { layer_id: model::LayerId, sublayer_id: u32 },
    LayerExists { layer_id: model::LayerId },
    Decode(codec::CodecError),
}

impl fmt::Display for StateError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::InvalidArgument(message) => write!(formatter, "{message}"),
            StateError::LayerNotFound { layer_id } => {
                write!(formatter, "layer {layer_id} not found")
            }
            StateError::SublayerNotFound {
                layer_id,
                sublayer_id,
            } => {
                write!(
                    formatter,
                    "sublayer {sublayer_id} of layer {layer_id} not found"
                )
            }
            StateError::LayerExists { layer_id } => {
                write!(formatter, "layer {layer_id} already exists")
            }
            StateError::Decode(error) => write!(formatter, "decode failed: {error}"),
        }
    }
}

impl std::error::Error for StateError {}

impl From<codec::CodecError> for StateError {
    fn from(error: codec::CodecError) -> Self {
        StateError::Decode(error)
    }
}
