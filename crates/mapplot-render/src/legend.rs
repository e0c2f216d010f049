//! Legend layout: one row per legend group, vertically centred, overflow counted.

use crate::geometry::MapGeometry;
use crate::icons::IconCache;
use crate::raster::blit_centered;
use crate::text::{Align, TextBox, TextMeasure, TextRenderer};
use image::RgbaImage;
use mapplot_core::{
    Color, HeatmapColorMode, Legend, LegendMode, MapItem, MapSettings, PlotIcon, PlotMode,
    TOPOGRAPHY_LEGEND_COLOR,
};
use std::collections::HashSet;

const HEATMAP_PRIMARY: Color = Color::rgb(255, 0, 0);
const HEATMAP_SECONDARY: Color = Color::rgb(0, 0, 255);

#[derive(Debug, Clone, PartialEq)]
pub struct LegendRow {
    pub group: u32,
    pub text: String,
    pub color: Color,
    /// Drawn left of the text in modes that plot icons
    pub icon: Option<PlotIcon>,
}

/// Where a drawn row sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPlacement {
    pub row: usize,
    pub top: i64,
    pub height: u32,
    /// Pushes text down to sit centrally against a taller icon
    pub text_offset: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegendLayout {
    pub placements: Vec<RowPlacement>,
    pub skipped: usize,
    pub total_height: u64,
}

impl LegendLayout {
    pub fn overflow_text(&self) -> Option<String> {
        match self.skipped {
            0 => None,
            1 => Some("+1 more item...".to_string()),
            n => Some(format!("+{n} more items...")),
        }
    }
}

/// The rows to show, in legend order. Items of a group bound to an override
/// text collapse into the first such row; other items keep their own rows.
pub fn legend_rows(legend: &Legend, settings: &MapSettings) -> Vec<LegendRow> {
    let mode = settings.map.legend_mode;
    if mode == LegendMode::Hidden {
        return Vec::new();
    }
    let plot_mode = settings.plot.mode;
    let overrides = legend.overridden_texts();
    let mut drawn: HashSet<u32> = HashSet::new();
    let mut rows = Vec::new();

    for item in legend.items() {
        let group = item.legend_group;
        if drawn.contains(&group) && overrides.contains_key(&group) {
            continue;
        }
        let icon = PlotIcon::for_group(group, &settings.plot.icon);
        let text = match overrides.get(&group) {
            Some(text) => text.clone(),
            None => item_text(item, mode),
        };
        rows.push(LegendRow {
            group,
            text,
            color: row_color(group, &icon, settings),
            icon: plot_mode.shows_icons().then_some(icon),
        });
        drawn.insert(group);
    }
    rows
}

fn item_text(item: &MapItem, mode: LegendMode) -> String {
    match mode {
        LegendMode::Extended => format!(
            "{} ({}) ×{}",
            item.display_name,
            item.editor_id,
            item.count()
        ),
        LegendMode::Compact | LegendMode::Hidden => item.display_name.clone(),
    }
}

fn row_color(group: u32, icon: &PlotIcon, settings: &MapSettings) -> Color {
    match settings.plot.mode {
        PlotMode::Topography => TOPOGRAPHY_LEGEND_COLOR,
        PlotMode::Heatmap => match settings.heatmap.color_mode {
            HeatmapColorMode::Duo if group % 2 == 1 => HEATMAP_SECONDARY,
            _ => HEATMAP_PRIMARY,
        },
        PlotMode::Icon | PlotMode::Cluster => icon.color,
    }
}

/// Measure every row, centre the block on the image, and place rows top
/// down. A row is placed only if it starts below the top edge and ends above
/// the bottom edge; the rest are counted as skipped.
pub fn layout(rows: &[LegendRow], measure: &dyn TextMeasure, geometry: &MapGeometry) -> LegendLayout {
    let width = geometry.legend_width() as f32;
    let measured: Vec<(u32, u32)> = rows
        .iter()
        .map(|row| {
            let text = measure.text_height(&row.text, width);
            let icon = row.icon.map_or(0, |icon| icon.size);
            (text, icon)
        })
        .collect();
    let total_height: u64 = measured
        .iter()
        .map(|(text, icon)| u64::from(*text.max(icon)))
        .sum();

    let dimension = i64::from(geometry.dimension);
    let mut caret = dimension / 2 - total_height as i64 / 2;
    let mut layout = LegendLayout {
        total_height,
        ..LegendLayout::default()
    };

    for (row, (text, icon)) in measured.into_iter().enumerate() {
        let height = text.max(icon);
        if caret > 0 && caret + i64::from(height) < dimension {
            layout.placements.push(RowPlacement {
                row,
                top: caret,
                height,
                text_offset: icon.saturating_sub(text) / 2,
            });
        } else {
            layout.skipped += 1;
        }
        caret += i64::from(height);
    }
    layout
}

/// Draw placed rows and the overflow line.
pub fn draw_legend(
    image: &mut RgbaImage,
    rows: &[LegendRow],
    layout: &LegendLayout,
    geometry: &MapGeometry,
    icons: &IconCache,
    text: &TextRenderer,
) {
    let width = geometry.legend_width() as f32;
    for placement in &layout.placements {
        let row = &rows[placement.row];
        let top = placement.top as f64;
        if let Some(icon) = row.icon.as_ref() {
            let rendered = icons.get(icon);
            blit_centered(
                image,
                &rendered,
                geometry.legend_icon_x,
                top + f64::from(placement.height) / 2.0,
            );
        }
        text.draw(
            image,
            &row.text,
            TextBox::top_left(
                geometry.legend_x_min as f32,
                (top + f64::from(placement.text_offset)) as f32,
                width,
                placement.height as f32,
            ),
            row.color,
        );
    }

    if let Some(overflow) = layout.overflow_text() {
        let bounds = TextBox {
            vertical: Align::End,
            ..TextBox::top_left(
                geometry.legend_x_min as f32,
                0.0,
                width,
                geometry.dimension as f32,
            )
        };
        text.draw(image, &overflow, bounds, Color::WHITE);
    }
}
