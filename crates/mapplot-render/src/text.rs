//! Text measuring and drawing with fontdue.

use crate::error::{RenderError, RenderResult};
use crate::raster::blend_pixel;
use fontdue::layout::{
    CoordinateSystem, HorizontalAlign, Layout, LayoutSettings, TextStyle, VerticalAlign,
};
use image::RgbaImage;
use mapplot_core::Color;

/// Height of wrapped text. Seam for legend layout, so layout can be checked
/// without a font file.
pub trait TextMeasure {
    fn text_height(&self, text: &str, max_width: f32) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    Center,
    End,
}

/// Target box for a block of text.
#[derive(Debug, Clone, Copy)]
pub struct TextBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub horizontal: Align,
    pub vertical: Align,
}

impl TextBox {
    pub fn top_left(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            horizontal: Align::Start,
            vertical: Align::Start,
        }
    }

    /// A box of the given size centred on `(cx, cy)`, text centred within it.
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
            horizontal: Align::Center,
            vertical: Align::Center,
        }
    }
}

/// The map font at its fixed pixel size. Without a font nothing is drawn and
/// measurements fall back to a line-height estimate.
pub struct TextRenderer {
    font: Option<fontdue::Font>,
    size: f32,
}

impl TextRenderer {
    pub fn from_bytes(bytes: &[u8], size: f32) -> RenderResult<Self> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| RenderError::asset("font", e))?;
        Ok(Self {
            font: Some(font),
            size,
        })
    }

    pub fn without_font(size: f32) -> Self {
        Self { font: None, size }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    fn layout(&self, font: &fontdue::Font, text: &str, settings: &LayoutSettings) -> Layout {
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(settings);
        layout.append(&[font], &TextStyle::new(text, self.size, 0));
        layout
    }

    pub fn draw(&self, image: &mut RgbaImage, text: &str, bounds: TextBox, color: Color) {
        let Some(font) = self.font.as_ref() else {
            return;
        };
        let settings = LayoutSettings {
            x: bounds.x,
            y: bounds.y,
            max_width: Some(bounds.width),
            max_height: Some(bounds.height),
            horizontal_align: match bounds.horizontal {
                Align::Start => HorizontalAlign::Left,
                Align::Center => HorizontalAlign::Center,
                Align::End => HorizontalAlign::Right,
            },
            vertical_align: match bounds.vertical {
                Align::Start => VerticalAlign::Top,
                Align::Center => VerticalAlign::Middle,
                Align::End => VerticalAlign::Bottom,
            },
            ..LayoutSettings::default()
        };
        let layout = self.layout(font, text, &settings);

        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (metrics, bitmap) = font.rasterize_indexed(glyph.key.glyph_index, glyph.key.px);
            blend_glyph(
                image,
                glyph.x,
                glyph.y,
                metrics.width,
                metrics.height,
                &bitmap,
                color,
            );
        }
    }
}

impl TextMeasure for TextRenderer {
    fn text_height(&self, text: &str, max_width: f32) -> u32 {
        match self.font.as_ref() {
            Some(font) => {
                let settings = LayoutSettings {
                    max_width: Some(max_width),
                    ..LayoutSettings::default()
                };
                self.layout(font, text, &settings).height().ceil() as u32
            }
            None => {
                let lines = text.lines().count().max(1) as f32;
                (lines * self.size * 1.2).ceil() as u32
            }
        }
    }
}

fn blend_glyph(
    image: &mut RgbaImage,
    x: f32,
    y: f32,
    width: usize,
    height: usize,
    bitmap: &[u8],
    color: Color,
) {
    let start_x = x.floor() as i32;
    let start_y = y.floor() as i32;
    for row in 0..height {
        for col in 0..width {
            let alpha = bitmap[row * width + col];
            if alpha == 0 {
                continue;
            }
            blend_pixel(image, start_x + col as i32, start_y + row as i32, color, alpha);
        }
    }
}
