//! Icon and topography modes: one icon or volume per point.

use super::{HeightScale, PlotContext, PlotSummary, topography_color};
use crate::error::RenderResult;
use crate::progress::{Progress, STATUS_PLOTTING};
use crate::raster::{blit_centered, fill_rotated};
use crate::transform::ImagePoint;
use image::RgbaImage;
use mapplot_core::{Color, Legend, MapDataPoint, PlotIcon, PlotMode, VolumeKind};

pub fn plot_points(
    image: &mut RgbaImage,
    legend: &Legend,
    ctx: &PlotContext<'_>,
    progress: &mut Progress<'_>,
) -> RenderResult<PlotSummary> {
    progress.status(STATUS_PLOTTING);
    let topography = ctx.settings.plot.mode == PlotMode::Topography;
    let scale = topography.then(|| HeightScale::from_legend(legend, ctx.geometry));
    let transform = ctx.transform();
    let window = ctx.height_window();
    let mut summary = PlotSummary::default();

    for item in legend.items() {
        progress.check()?;
        let group_icon = PlotIcon::for_group(item.legend_group, &ctx.settings.plot.icon);
        let mut unrecognized = 0;

        for (i, point) in item.points.iter().enumerate() {
            progress.check_every(i)?;
            let Some(placed) = ctx.place(&transform, &window, point) else {
                summary.skipped += 1;
                continue;
            };
            let icon = match scale {
                Some(scale) => group_icon.with_color(topography_color(
                    scale.value(point, ctx.geometry),
                    ctx.settings.topography.color_bands,
                )),
                None => group_icon,
            };

            match draw_point(image, ctx, point, &placed, &icon) {
                Drawn::Icon => summary.plotted += 1,
                Drawn::Volume => {
                    summary.plotted += 1;
                    summary.volumes += 1;
                }
                Drawn::Unrecognized => {
                    unrecognized += 1;
                    summary.skipped += 1;
                }
            }
        }

        if unrecognized > 0 {
            tracing::warn!(
                "{} points of {} carry a primitive shape with no drawing rule and were skipped",
                unrecognized,
                item.editor_id
            );
            summary.unrecognized_shapes += unrecognized;
        }
        progress.advance(item.count());
    }
    Ok(summary)
}

enum Drawn {
    Icon,
    Volume,
    Unrecognized,
}

fn draw_point(
    image: &mut RgbaImage,
    ctx: &PlotContext<'_>,
    point: &MapDataPoint,
    placed: &ImagePoint,
    icon: &PlotIcon,
) -> Drawn {
    let min = ctx.geometry.min_volume_dimension;
    let as_volume = ctx.settings.plot.draw_volumes
        && placed.bound_x >= min
        && placed.bound_y >= min;

    match point.shape.as_ref() {
        Some(shape) if as_volume => match shape.volume_kind() {
            Some(kind) => {
                let color: Color = icon.color.with_alpha(ctx.geometry.volume_opacity);
                fill_rotated(
                    image,
                    placed.x,
                    placed.y,
                    placed.bound_x,
                    placed.bound_y,
                    placed.rotation_z,
                    kind == VolumeKind::Ellipse,
                    color,
                );
                Drawn::Volume
            }
            None => Drawn::Unrecognized,
        },
        _ => {
            let rendered = ctx.icons.get(icon);
            blit_centered(image, &rendered, placed.x, placed.y);
            Drawn::Icon
        }
    }
}
