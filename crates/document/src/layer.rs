use std::sync::Arc;

use model::TilePos;

use crate::layer_content::LayerContent;
use crate::layer_props::LayerProps;
use crate::tile::TileData;

/// One (content, props) pair. The same shape serves both top-level layers
/// and the per-stroke sublayers nested inside a layer's content.
#[derive(Debug, Clone)]
pub struct Layer {
    pub content: Arc<LayerContent>,
    pub props: Arc<LayerProps>,
}

impl Layer {
    pub fn new(content: LayerContent, props: LayerProps) -> Self {
        Self {
            content: Arc::new(content),
            props: Arc::new(props),
        }
    }

    pub fn content_mut(&mut self) -> &mut LayerContent {
        Arc::make_mut(&mut self.content)
    }

    pub fn props_mut(&mut self) -> &mut LayerProps {
        Arc::make_mut(&mut self.props)
    }

    /// Composite this layer's contribution to one tile onto `target`,
    /// honoring visibility, opacity and blend mode.
    pub fn flatten_tile_onto(&self, pos: TilePos, target: &mut TileData) {
        if self.props.visible && self.props.opacity > 0 {
            self.content
                .flatten_tile_onto(pos, target, self.props.opacity, self.props.blend_mode);
        }
    }
}
