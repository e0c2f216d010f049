use crate::raster::{draw_line, fill_circle, fill_polygon, fill_rect, stroke_circle, stroke_polygon, stroke_rect};
use image::RgbaImage;
use mapplot_core::{IconShape, PlotIcon};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Rasterise an icon descriptor into a `size × size` image.
pub fn render_icon(icon: &PlotIcon) -> RgbaImage {
    let size = icon.size.max(2);
    let mut image = RgbaImage::new(size, size);
    let s = size as f32;
    let line = icon.line_width.max(1) as f32;
    let inset = line / 2.0;
    let color = icon.color;

    match icon.shape {
        IconShape::Circle => {
            if icon.fill {
                fill_circle(&mut image, s / 2.0, s / 2.0, s / 2.0, color);
            } else {
                stroke_circle(&mut image, s / 2.0, s / 2.0, s / 2.0, line, color);
            }
        }
        IconShape::Square => {
            let max = size as i32;
            if icon.fill {
                fill_rect(&mut image, 0, 0, max, max, color);
            } else {
                stroke_rect(&mut image, 0, 0, max, max, line as i32, color);
            }
        }
        IconShape::Diamond => {
            let points = [
                (s / 2.0, inset),
                (s - inset, s / 2.0),
                (s / 2.0, s - inset),
                (inset, s / 2.0),
            ];
            outline_or_fill(&mut image, &points, line, icon);
        }
        IconShape::Triangle => {
            let points = [(s / 2.0, inset), (s - inset, s - inset), (inset, s - inset)];
            outline_or_fill(&mut image, &points, line, icon);
        }
        IconShape::Cross => {
            draw_line(&mut image, (inset, inset), (s - inset, s - inset), line, color);
            draw_line(&mut image, (s - inset, inset), (inset, s - inset), line, color);
        }
    }
    image
}

fn outline_or_fill(image: &mut RgbaImage, points: &[(f32, f32)], line: f32, icon: &PlotIcon) {
    if icon.fill {
        fill_polygon(image, points, icon.color);
    } else {
        stroke_polygon(image, points, line, icon.color);
    }
}

/// Rendered icons keyed by descriptor.
#[derive(Default)]
pub struct IconCache {
    icons: Mutex<HashMap<PlotIcon, Arc<RgbaImage>>>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, icon: &PlotIcon) -> Arc<RgbaImage> {
        let mut icons = self.icons.lock();
        icons
            .entry(*icon)
            .or_insert_with(|| Arc::new(render_icon(icon)))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.icons.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reset(&self) {
        self.icons.lock().clear();
    }
}
