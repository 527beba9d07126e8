//! The ordered stack of layers, bottom to top. Layer ids are unique
//! within the list.

use std::sync::Arc;

use model::{BlendMode, ContextId, LayerId, TilePos};

use crate::image::Image;
use crate::layer::Layer;
use crate::layer_content::LayerContent;
use crate::layer_props::LayerProps;
use crate::tile::{Tile, TileData};
use crate::StateError;

#[derive(Debug, Clone, Default)]
pub struct LayerList {
    layers: Vec<Layer>,
}

impl LayerList {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn at(&self, index: usize) -> &Layer {
        &self.layers[index]
    }

    pub fn index_of(&self, layer_id: LayerId) -> Option<usize> {
        self.layers
            .iter()
            .position(|layer| layer.props.layer_id == layer_id)
    }

    pub fn find(&self, layer_id: LayerId) -> Option<&Layer> {
        self.index_of(layer_id).map(|index| &self.layers[index])
    }

    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers
            .iter()
            .map(|layer| layer.props.layer_id)
            .collect()
    }

    fn layer_mut(&mut self, layer_id: LayerId) -> Result<&mut Layer, StateError> {
        let index = self
            .index_of(layer_id)
            .ok_or(StateError::LayerNotFound { layer_id })?;
        Ok(&mut self.layers[index])
    }

    pub fn content_mut(&mut self, layer_id: LayerId) -> Result<&mut LayerContent, StateError> {
        Ok(self.layer_mut(layer_id)?.content_mut())
    }

    /// Create a new layer. With `copy` the content duplicates
    /// `source_id`'s; with `insert` the layer goes just above
    /// `source_id`, otherwise on top of the stack. `fill` seeds every
    /// grid cell.
    #[allow(clippy::too_many_arguments)]
    pub fn layer_create(
        &mut self,
        layer_id: LayerId,
        source_id: LayerId,
        fill: Option<&Tile>,
        insert: bool,
        copy: bool,
        canvas_width: u32,
        canvas_height: u32,
        title: String,
    ) -> Result<(), StateError> {
        if layer_id == 0 {
            return Err(StateError::InvalidArgument(
                "layer id must be nonzero".to_string(),
            ));
        }
        if self.index_of(layer_id).is_some() {
            return Err(StateError::LayerExists { layer_id });
        }

        let content = if copy {
            let source = self
                .find(source_id)
                .ok_or(StateError::LayerNotFound { layer_id: source_id })?;
            LayerContent::clone(&source.content)
        } else {
            LayerContent::new(canvas_width, canvas_height, fill)
        };

        let position = if insert {
            let source_index = self
                .index_of(source_id)
                .ok_or(StateError::LayerNotFound { layer_id: source_id })?;
            source_index + 1
        } else {
            self.layers.len()
        };

        self.layers.insert(
            position,
            Layer::new(content, LayerProps::new(layer_id, title)),
        );
        Ok(())
    }

    /// Change layer attributes, or those of one of its stroke sublayers
    /// when `sublayer_id` is nonzero. The sublayer is created on demand
    /// so a stroke can be configured before its first dab lands.
    pub fn layer_attr(
        &mut self,
        layer_id: LayerId,
        sublayer_id: u32,
        opacity: u8,
        blend_mode: BlendMode,
        censored: bool,
        fixed: bool,
    ) -> Result<(), StateError> {
        let layer = self.layer_mut(layer_id)?;
        if sublayer_id != 0 {
            let (_, sub_props) = layer.content_mut().sublayer_mut(sublayer_id);
            sub_props.opacity = opacity;
            sub_props.blend_mode = blend_mode;
        } else {
            let props = layer.props_mut();
            props.opacity = opacity;
            props.blend_mode = blend_mode;
            props.censored = censored;
            props.fixed = fixed;
        }
        Ok(())
    }

    /// Reorder to match `layer_ids`, which must be a permutation of the
    /// current ids.
    pub fn layer_reorder(&mut self, layer_ids: &[LayerId]) -> Result<(), StateError> {
        if layer_ids.len() != self.layers.len() {
            return Err(StateError::InvalidArgument(format!(
                "reorder has {} layers, but the list has {}",
                layer_ids.len(),
                self.layers.len()
            )));
        }
        let mut reordered = Vec::with_capacity(self.layers.len());
        for &layer_id in layer_ids {
            if reordered
                .iter()
                .any(|layer: &Layer| layer.props.layer_id == layer_id)
            {
                return Err(StateError::InvalidArgument(format!(
                    "duplicate layer {layer_id} in reorder"
                )));
            }
            let layer = self
                .find(layer_id)
                .ok_or(StateError::LayerNotFound { layer_id })?;
            reordered.push(layer.clone());
        }
        self.layers = reordered;
        Ok(())
    }

    pub fn layer_retitle(&mut self, layer_id: LayerId, title: String) -> Result<(), StateError> {
        self.layer_mut(layer_id)?.props_mut().title = title;
        Ok(())
    }

    pub fn layer_visibility(&mut self, layer_id: LayerId, visible: bool) -> Result<(), StateError> {
        self.layer_mut(layer_id)?.props_mut().visible = visible;
        Ok(())
    }

    /// Remove a layer. With `merge`, its flattened contribution (pending
    /// sublayers included) is composited into the layer immediately
    /// below first.
    pub fn layer_delete(
        &mut self,
        context_id: ContextId,
        layer_id: LayerId,
        merge: bool,
    ) -> Result<(), StateError> {
        let index = self
            .index_of(layer_id)
            .ok_or(StateError::LayerNotFound { layer_id })?;
        if merge {
            if index == 0 {
                return Err(StateError::InvalidArgument(
                    "bottom layer has nothing below to merge into".to_string(),
                ));
            }
            let deleted = self.layers[index].clone();
            let mut flattened = LayerContent::clone(&deleted.content);
            flattened.merge_all_sublayers(context_id);
            self.layers[index - 1].content_mut().merge(
                context_id,
                &flattened,
                deleted.props.opacity,
                deleted.props.blend_mode,
            );
        }
        self.layers.remove(index);
        Ok(())
    }

    pub fn put_image(
        &mut self,
        context_id: ContextId,
        layer_id: LayerId,
        blend_mode: BlendMode,
        x: i32,
        y: i32,
        image: &Image,
    ) -> Result<(), StateError> {
        self.content_mut(layer_id)?
            .put_image(context_id, blend_mode, x, y, image);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fill_rect(
        &mut self,
        context_id: ContextId,
        layer_id: LayerId,
        blend_mode: BlendMode,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        color: u32,
    ) -> Result<(), StateError> {
        self.content_mut(layer_id)?
            .fill_rect(context_id, blend_mode, left, top, right, bottom, color);
        Ok(())
    }

    /// Store a tile into a layer, or into one of its stroke sublayers
    /// when `sublayer_id` is nonzero.
    #[allow(clippy::too_many_arguments)]
    pub fn put_tile(
        &mut self,
        tile: &Tile,
        layer_id: LayerId,
        sublayer_id: u32,
        x: u32,
        y: u32,
        repeat: u32,
    ) -> Result<(), StateError> {
        let content = self.content_mut(layer_id)?;
        if sublayer_id != 0 {
            let (sub_content, _) = content.sublayer_mut(sublayer_id);
            sub_content.put_tile(tile, x, y, repeat)
        } else {
            content.put_tile(tile, x, y, repeat)
        }
    }

    /// Merge every sublayer owned by `context_id` into its parent layer.
    /// Returns whether anything was merged; when false the list is
    /// untouched, letting the caller keep the previous snapshot alive.
    pub fn merge_context_sublayers(&mut self, context_id: ContextId) -> bool {
        let mut merged_any = false;
        for index in 0..self.layers.len() {
            while self.layers[index].content.has_sublayer(context_id) {
                self.layers[index]
                    .content_mut()
                    .merge_sublayer(context_id, context_id);
                merged_any = true;
            }
        }
        merged_any
    }

    /// Whether any layer holds a sublayer owned by `context_id`. Cheap
    /// read-only walk used to keep pen-up lazy.
    pub fn has_context_sublayers(&self, context_id: ContextId) -> bool {
        self.layers
            .iter()
            .any(|layer| layer.content.has_sublayer(context_id))
    }

    /// Composite every visible layer's tile at `pos` onto `target`.
    pub fn flatten_tile_onto(&self, pos: TilePos, target: &mut TileData) {
        for layer in &self.layers {
            layer.flatten_tile_onto(pos, target);
        }
    }

    /// Resize every layer to new canvas borders.
    pub fn resize(&mut self, context_id: ContextId, top: i32, right: i32, bottom: i32, left: i32) {
        for layer in &mut self.layers {
            let resized = layer.content.resized(context_id, top, right, bottom, left);
            *Arc::make_mut(&mut layer.content) = resized;
        }
    }
}

#[cfg(test)]
mod tests;
