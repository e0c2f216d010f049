//! The plot renderer: draws the legend's points onto a composite.

pub mod cluster;
pub mod heatmap;
pub mod points;
pub mod topography;

use crate::error::RenderResult;
use crate::geometry::MapGeometry;
use crate::icons::IconCache;
use crate::progress::Progress;
use crate::text::TextRenderer;
use crate::transform::{CoordinateTransform, ImagePoint};
use image::RgbaImage;
use mapplot_core::{HeightWindow, Legend, MapDataPoint, MapSettings, PlotMode, Space};

pub use cluster::{Cluster, ClusterShape};
pub use heatmap::HeatmapGrid;
pub use topography::{HeightScale, topography_color};

/// Everything a plot pass reads.
pub struct PlotContext<'a> {
    pub geometry: &'a MapGeometry,
    pub space: &'a Space,
    pub settings: &'a MapSettings,
    pub icons: &'a IconCache,
    pub text: &'a TextRenderer,
}

impl PlotContext<'_> {
    pub fn transform(&self) -> CoordinateTransform {
        CoordinateTransform::for_space(self.space, self.geometry)
    }

    pub fn height_window(&self) -> HeightWindow {
        if self.space.is_cell() {
            self.space.height_window(
                self.settings.cell.min_height_percent,
                self.settings.cell.max_height_percent,
            )
        } else {
            HeightWindow::unbounded()
        }
    }

    /// Place a point for icon, topography or cluster drawing. `None` when it
    /// falls outside the height window or the drawable area.
    pub fn place(
        &self,
        transform: &CoordinateTransform,
        window: &HeightWindow,
        point: &MapDataPoint,
    ) -> Option<ImagePoint> {
        if self.space.is_cell() {
            if !window.overlaps_span(point.z, point.bound_z) {
                return None;
            }
            let placed = transform.apply(point);
            self.geometry.in_image(placed.x, placed.y).then_some(placed)
        } else {
            let placed = transform.apply(point);
            self.geometry
                .in_plot_area(placed.x, placed.y)
                .then_some(placed)
        }
    }
}

/// Counters from one plot pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlotSummary {
    pub plotted: usize,
    pub volumes: usize,
    pub skipped: usize,
    /// Points carrying a primitive shape with no drawing rule
    pub unrecognized_shapes: usize,
    pub clusters: usize,
}

/// Run the pass for the active plot mode over `legend`, in legend order.
pub fn plot(
    image: &mut RgbaImage,
    legend: &Legend,
    ctx: &PlotContext<'_>,
    progress: &mut Progress<'_>,
) -> RenderResult<PlotSummary> {
    let mode = ctx.settings.plot.mode;
    tracing::debug!(
        "Plotting {} items ({} points) in {:?} mode",
        legend.len(),
        legend.total_points(),
        mode
    );
    let summary = match mode {
        PlotMode::Icon | PlotMode::Topography => points::plot_points(image, legend, ctx, progress)?,
        PlotMode::Heatmap => heatmap::plot_heatmap(image, legend, ctx, progress)?,
        PlotMode::Cluster => cluster::plot_clusters(image, legend, ctx, progress)?,
    };
    progress.finish();
    Ok(summary)
}
