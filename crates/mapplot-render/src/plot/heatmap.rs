//! Heatmap mode: weighted density on a square grid.

use super::{PlotContext, PlotSummary};
use crate::error::RenderResult;
use crate::geometry::MapGeometry;
use crate::progress::{Progress, STATUS_HEATMAP_ACCUMULATE, STATUS_HEATMAP_RENDER};
use crate::raster::blend_raw;
use image::RgbaImage;
use mapplot_core::{Color, HeatmapColorMode, Legend};
use rayon::prelude::*;

/// `resolution × resolution` accumulators, two weight slots each.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapGrid {
    resolution: usize,
    weights: Vec<[f64; 2]>,
}

impl HeatmapGrid {
    pub fn new(resolution: u32) -> Self {
        let resolution = resolution.max(1) as usize;
        Self {
            resolution,
            weights: vec![[0.0; 2]; resolution * resolution],
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution as u32
    }

    /// Pixel width of one grid square.
    pub fn square_size(&self, geometry: &MapGeometry) -> f64 {
        f64::from(geometry.dimension) / self.resolution as f64
    }

    /// The square containing image position `(x, y)`. May lie off the grid.
    pub fn square_of(&self, geometry: &MapGeometry, x: f64, y: f64) -> (i64, i64) {
        let size = self.square_size(geometry);
        ((x / size).floor() as i64, (y / size).floor() as i64)
    }

    pub fn weights(&self, x: u32, y: u32) -> [f64; 2] {
        self.weights[y as usize * self.resolution + x as usize]
    }

    pub fn total(&self, x: u32, y: u32) -> f64 {
        let [a, b] = self.weights(x, y);
        a + b
    }

    /// Spread `weight` from square `(sx, sy)` to every square within `blend`
    /// squares (inclusive), falling off as `1 / (d² + 1)`.
    pub fn accumulate(&mut self, sx: i64, sy: i64, slot: usize, weight: f64, blend: u32) {
        let slot = slot.min(1);
        let blend = i64::from(blend);
        let res = self.resolution as i64;
        for y in sy.saturating_sub(blend).max(0)..=sy.saturating_add(blend).min(res - 1) {
            for x in sx.saturating_sub(blend).max(0)..=sx.saturating_add(blend).min(res - 1) {
                let dx = sx - x;
                let dy = sy - y;
                let dist_sq = dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy));
                if dist_sq > blend.saturating_mul(blend) {
                    continue;
                }
                let additional = weight * (1.0 / (dist_sq as f64 + 1.0));
                self.weights[(y * res + x) as usize][slot] += additional;
            }
        }
    }

    pub fn largest(&self) -> f64 {
        self.weights
            .iter()
            .map(|[a, b]| a + b)
            .fold(0.0, f64::max)
    }

    /// Color of a square relative to the heaviest one. `None` for empty squares.
    pub fn color(weights: [f64; 2], largest: f64, mode: HeatmapColorMode) -> Option<Color> {
        let [a, b] = weights;
        let total = a + b;
        if largest <= 0.0 || total <= 0.0 {
            return None;
        }
        let alpha = channel(total / largest);
        Some(match mode {
            HeatmapColorMode::Mono => Color::rgba(255, 0, 0, alpha),
            HeatmapColorMode::Duo => Color::rgba(channel(a / total), 0, channel(b / total), alpha),
        })
    }

    /// Paint every non-empty square onto `image`. Columns lying wholly left
    /// of the plot rectangle are left alone.
    pub fn render(&self, image: &mut RgbaImage, geometry: &MapGeometry, mode: HeatmapColorMode) {
        let largest = self.largest();
        if largest <= 0.0 {
            return;
        }
        let colors: Vec<Option<Color>> = self
            .weights
            .par_iter()
            .map(|w| Self::color(*w, largest, mode))
            .collect();

        let size = self.square_size(geometry);
        let res = self.resolution;
        let width = image.width() as usize;
        if width == 0 {
            return;
        }
        let columns: Vec<Option<usize>> = (0..width)
            .map(|x| {
                let sx = ((x as f64 / size).floor() as usize).min(res - 1);
                let left = sx as f64 * size;
                (left + size >= geometry.plot_x_min).then_some(sx)
            })
            .collect();

        image
            .par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                let sy = ((y as f64 / size).floor() as usize).min(res - 1);
                for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                    let Some(sx) = columns[x] else {
                        continue;
                    };
                    if let Some(color) = colors[sy * res + sx] {
                        blend_raw(pixel, color);
                    }
                }
            });
    }
}

fn channel(fraction: f64) -> u8 {
    (fraction * 255.0).round().clamp(0.0, 255.0) as u8
}

pub fn plot_heatmap(
    image: &mut RgbaImage,
    legend: &Legend,
    ctx: &PlotContext<'_>,
    progress: &mut Progress<'_>,
) -> RenderResult<PlotSummary> {
    let settings = &ctx.settings.heatmap;
    progress.status(STATUS_HEATMAP_ACCUMULATE);
    let transform = ctx.transform();
    let mut grid = HeatmapGrid::new(settings.resolution);
    let mut summary = PlotSummary::default();

    for item in legend.items() {
        progress.check()?;
        let slot = match settings.color_mode {
            HeatmapColorMode::Mono => 0,
            HeatmapColorMode::Duo => (item.legend_group % 2) as usize,
        };
        for (i, point) in item.points.iter().enumerate() {
            progress.check_every(i)?;
            let (x, y) = transform.apply_xy(point.x, point.y);
            if !x.is_finite() || !y.is_finite() {
                summary.skipped += 1;
                continue;
            }
            let (sx, sy) = grid.square_of(ctx.geometry, x, y);
            grid.accumulate(sx, sy, slot, point.weight, settings.blend_distance);
            summary.plotted += 1;
        }
        progress.advance(item.count());
    }

    progress.check()?;
    progress.status(STATUS_HEATMAP_RENDER);
    tracing::debug!(
        "Heatmap {}² largest weight {:.3}",
        grid.resolution(),
        grid.largest()
    );
    grid.render(image, ctx.geometry, settings.color_mode);
    Ok(summary)
}
