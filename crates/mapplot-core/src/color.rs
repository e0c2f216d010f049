//! Plot colors and the fixed legend palette.

use serde::{Deserialize, Serialize};

/// RGBA color, straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(&self, a: u8) -> Self {
        Self { a, ..*self }
    }

    pub fn to_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Colors handed out to legend groups, in order.
pub const LEGEND_PALETTE: [Color; 8] = [
    Color::rgb(255, 0, 0),
    Color::rgb(0, 255, 0),
    Color::rgb(25, 120, 255),
    Color::rgb(255, 255, 0),
    Color::rgb(255, 0, 255),
    Color::rgb(0, 255, 255),
    Color::rgb(255, 128, 0),
    Color::rgb(255, 255, 255),
];

/// Legend text color used while plotting topography, where item colors carry no meaning.
pub const TOPOGRAPHY_LEGEND_COLOR: Color = Color::rgb(210, 210, 210);
