use crate::geometry::MapGeometry;
use crate::text::{Align, TextBox, TextRenderer};
use image::RgbaImage;
use mapplot_core::{CellScaling, Color, MapSettings, PlotMode, Space};

/// The bottom-right info block for the current view.
pub fn info_text(space: &Space, settings: &MapSettings) -> String {
    let mut text = String::new();
    if space.is_cell() {
        let scale = space.scaling.unwrap_or(CellScaling::IDENTITY).scale;
        text.push_str(&format!(
            "{} ({})\nHeight distribution: {}% - {}%\nScale: 1:{}\n\n",
            space.display_name,
            space.editor_id,
            settings.cell.min_height_percent,
            settings.cell.max_height_percent,
            (scale * 100.0).round() / 100.0,
        ));
    }
    if settings.plot.mode == PlotMode::Topography {
        text.push_str("Topographic View\n");
    }
    text.push_str(&settings.watermark);
    text
}

pub fn draw_info_text(image: &mut RgbaImage, text: &TextRenderer, geometry: &MapGeometry, info: &str) {
    let bounds = TextBox {
        x: geometry.plot_x_min as f32,
        y: 0.0,
        width: (f64::from(geometry.dimension) - geometry.plot_x_min) as f32,
        height: geometry.dimension as f32,
        horizontal: Align::End,
        vertical: Align::End,
    };
    text.draw(image, info, bounds, Color::WHITE);
}
