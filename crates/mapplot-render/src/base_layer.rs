//! The unplotted map: background, overlays and the color adjustment pass.

use crate::assets::{AssetProvider, PointSource};
use crate::error::{RenderError, RenderResult};
use crate::geometry::MapGeometry;
use crate::raster::{blit_centered, stroke_circle};
use crate::transform::CoordinateTransform;
use image::RgbaImage;
use mapplot_core::{CancellationToken, CellSettings, MapSettings, Space};
use rayon::prelude::*;
use std::sync::Arc;

/// Luminance weights applied when the map is drawn in grayscale.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Points checked between cancellation polls.
const CANCEL_STRIDE: usize = 1024;

pub struct BaseLayerBuilder<'a> {
    pub geometry: &'a MapGeometry,
    pub assets: &'a dyn AssetProvider,
    pub points: &'a dyn PointSource,
    pub cancel: &'a CancellationToken,
}

impl BaseLayerBuilder<'_> {
    pub fn build(&self, space: &Space, settings: &MapSettings) -> RenderResult<RgbaImage> {
        let mut layer = if space.is_cell() {
            let mut layer = RgbaImage::new(self.geometry.dimension, self.geometry.dimension);
            if settings.cell.draw_outline {
                self.draw_cell_outline(&mut layer, space, &settings.cell)?;
            }
            layer
        } else {
            let background = self.assets.background(settings.map.background)?;
            let name = crate::assets::background_asset_name(settings.map.background);
            self.check_dimensions(name, &background)?;
            let mut layer = (*background).clone();
            for name in &settings.map.overlays {
                if self.cancel.is_cancelled() {
                    return Err(RenderError::Cancelled);
                }
                let overlay = self.assets.overlay(name)?;
                self.check_dimensions(name, &overlay)?;
                image::imageops::overlay(&mut layer, overlay.as_ref(), 0, 0);
            }
            layer
        };

        adjust_colors(&mut layer, settings.map.brightness, settings.map.grayscale);
        Ok(layer)
    }

    fn check_dimensions(&self, name: &str, image: &Arc<RgbaImage>) -> RenderResult<()> {
        let expected = self.geometry.dimension;
        if image.width() != expected || image.height() != expected {
            return Err(RenderError::AssetDimensions {
                name: name.to_string(),
                width: image.width(),
                height: image.height(),
                expected,
            });
        }
        Ok(())
    }

    /// Ring every recorded point of the cell to give a silhouette to plot against.
    fn draw_cell_outline(
        &self,
        layer: &mut RgbaImage,
        space: &Space,
        cell: &CellSettings,
    ) -> RenderResult<()> {
        let transform = CoordinateTransform::for_space(space, self.geometry);
        let window = space.height_window(cell.min_height_percent, cell.max_height_percent);
        let glyph = outline_glyph(cell);

        let points = self.points.points_for_cell(space.id);
        tracing::debug!("Drawing cell outline from {} points", points.len());
        for (i, point) in points.iter().enumerate() {
            if i % CANCEL_STRIDE == 0 && self.cancel.is_cancelled() {
                return Err(RenderError::Cancelled);
            }
            if !window.contains(point.z) {
                continue;
            }
            let placed = transform.apply(point);
            if !self.geometry.in_image(placed.x, placed.y) {
                continue;
            }
            blit_centered(layer, &glyph, placed.x, placed.y);
        }
        Ok(())
    }
}

fn outline_glyph(cell: &CellSettings) -> RgbaImage {
    let size = cell.outline_size.max(2);
    let width = cell.outline_width.max(1) as f32;
    let mut glyph = RgbaImage::new(size, size);
    let half = size as f32 / 2.0;
    stroke_circle(
        &mut glyph,
        half,
        half,
        half - width / 2.0,
        width,
        cell.outline_color.with_alpha(cell.outline_alpha),
    );
    glyph
}

/// Scale every channel by `brightness`%, optionally collapsing to NTSC
/// luminance first. Alpha is untouched.
pub fn adjust_colors(image: &mut RgbaImage, brightness: u32, grayscale: bool) {
    let b = brightness as f32 / 100.0;
    if !grayscale && brightness == 100 {
        return;
    }
    let row_bytes = image.width() as usize * 4;
    if row_bytes == 0 {
        return;
    }
    image.par_chunks_mut(row_bytes).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            let (r, g, b_in) = (f32::from(px[0]), f32::from(px[1]), f32::from(px[2]));
            let scaled = |v: f32| (v * b).round().clamp(0.0, 255.0) as u8;
            if grayscale {
                let luma = scaled(LUMA_R * r + LUMA_G * g + LUMA_B * b_in);
                px[0] = luma;
                px[1] = luma;
                px[2] = luma;
            } else {
                px[0] = scaled(r);
                px[1] = scaled(g);
                px[2] = scaled(b_in);
            }
        }
    });
}
