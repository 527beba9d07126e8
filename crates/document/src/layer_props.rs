use model::{BlendMode, LayerId};

/// Per-layer attributes. Content and props are split so that attribute
/// changes never copy pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerProps {
    pub layer_id: LayerId,
    pub title: String,
    pub opacity: u8,
    pub blend_mode: BlendMode,
    pub visible: bool,
    pub censored: bool,
    pub fixed: bool,
    /// Nonzero when these props belong to an indirect-stroke sublayer, in
    /// which case it is the drawing context id that owns the stroke.
    pub sublayer_id: u32,
}

impl LayerProps {
    pub fn new(layer_id: LayerId, title: String) -> Self {
        Self {
            layer_id,
            title,
            opacity: 255,
            blend_mode: BlendMode::Normal,
            visible: true,
            censored: false,
            fixed: false,
            sublayer_id: 0,
        }
    }

    /// Whether a change from `self` to `other` affects composited output.
    /// Title changes do not; they only matter to list observers.
    pub fn renders_differently_from(&self, other: &LayerProps) -> bool {
        self.opacity != other.opacity
            || self.blend_mode != other.blend_mode
            || self.visible != other.visible
            || self.censored != other.censored
    }
}
