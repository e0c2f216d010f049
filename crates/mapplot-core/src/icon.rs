use crate::color::{Color, LEGEND_PALETTE};
use crate::settings::IconSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IconShape {
    Circle,
    Square,
    Diamond,
    Triangle,
    Cross,
}

impl IconShape {
    pub const ALL: [IconShape; 5] = [
        IconShape::Circle,
        IconShape::Square,
        IconShape::Diamond,
        IconShape::Triangle,
        IconShape::Cross,
    ];
}

/// Everything that determines how a plot icon looks.
///
/// Descriptors are immutable values: a per-point color is a new descriptor,
/// so rendered icons can be cached by descriptor without aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlotIcon {
    pub shape: IconShape,
    pub color: Color,
    pub size: u32,
    pub line_width: u32,
    pub fill: bool,
}

impl PlotIcon {
    /// The icon for a legend group: colors cycle first, then shapes.
    pub fn for_group(group: u32, settings: &IconSettings) -> Self {
        let colors = LEGEND_PALETTE.len() as u32;
        let shapes = IconShape::ALL.len() as u32;
        Self {
            shape: IconShape::ALL[((group / colors) % shapes) as usize],
            color: LEGEND_PALETTE[(group % colors) as usize],
            size: settings.size,
            line_width: settings.line_width,
            fill: settings.fill,
        }
    }

    pub fn with_color(self, color: Color) -> Self {
        Self { color, ..self }
    }
}
