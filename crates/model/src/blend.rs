/// Layer and brush compositing modes. Discriminants are the wire values
/// carried by drawing messages.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Erase = 0,
    Normal = 1,
    Multiply = 2,
    Screen = 3,
    Overlay = 4,
    Darken = 5,
    Lighten = 6,
    Add = 7,
    Subtract = 8,
    Recolor = 9,
    Behind = 10,
}

impl Default for BlendMode {
    fn default() -> Self {
        Self::Normal
    }
}

impl BlendMode {
    pub fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => Self::Erase,
            1 => Self::Normal,
            2 => Self::Multiply,
            3 => Self::Screen,
            4 => Self::Overlay,
            5 => Self::Darken,
            6 => Self::Lighten,
            7 => Self::Add,
            8 => Self::Subtract,
            9 => Self::Recolor,
            10 => Self::Behind,
            _ => return None,
        })
    }

    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Whether brush operations (fills, dabs) may use this mode. Modes
    /// that need to read back composite results below the layer are layer
    /// modes only.
    pub const fn valid_for_brush(self) -> bool {
        !matches!(self, Self::Overlay)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Erase => "erase",
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Recolor => "recolor",
            Self::Behind => "behind",
        }
    }
}
