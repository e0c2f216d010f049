use crate::geometry::MapGeometry;
use mapplot_core::{Color, Legend, MapDataPoint};

/// Alpha of topography icons.
const TOPOGRAPHY_ALPHA: u8 = 200;

/// Height normalization across every point of the legend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightScale {
    pub min: f64,
    pub range: f64,
}

impl HeightScale {
    /// Spans each point's `z ± bound_z / 2`, clamped to the world height
    /// limits. A zero range becomes 1.
    pub fn from_legend(legend: &Legend, geometry: &MapGeometry) -> Self {
        let mut bounds: Option<(f64, f64)> = None;
        for point in legend.items().iter().flat_map(|item| item.points.iter()) {
            let (low, high) = point.z_span();
            bounds = Some(match bounds {
                None => (low, high),
                Some((min, max)) => (min.min(low), max.max(high)),
            });
        }
        let (min, max) = bounds.unwrap_or((0.0, 0.0));
        let min = min.max(geometry.z_limit_lower);
        let max = max.min(geometry.z_limit_upper);
        let range = (max - min).abs();
        Self {
            min,
            range: if range == 0.0 { 1.0 } else { range },
        }
    }

    /// The point's upper bound on a 0..=255 scale.
    pub fn value(&self, point: &MapDataPoint, geometry: &MapGeometry) -> u8 {
        let (_, top) = point.z_span();
        let z = geometry.clamp_height(top);
        (((z - self.min) / self.range) * 255.0).clamp(0.0, 255.0) as u8
    }
}

/// Red for high, green for low. With `bands` the value snaps to that many
/// evenly spaced levels first.
pub fn topography_color(value: u8, bands: Option<u8>) -> Color {
    let value = match bands {
        Some(n) if n >= 2 => quantize(value, n),
        _ => value,
    };
    Color::rgba(value, 255 - value, 0, TOPOGRAPHY_ALPHA)
}

fn quantize(value: u8, bands: u8) -> u8 {
    let steps = f64::from(bands - 1);
    let level = (f64::from(value) / 255.0 * steps).round();
    (level * 255.0 / steps).round() as u8
}
