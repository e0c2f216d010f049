//! Base layer ownership and full composites.

use crate::assets::{AssetProvider, PointSource};
use crate::base_layer::BaseLayerBuilder;
use crate::error::{RenderError, RenderResult};
use crate::geometry::MapGeometry;
use crate::icons::IconCache;
use crate::legend::{draw_legend, layout, legend_rows};
use crate::plot::{PlotContext, PlotSummary, plot};
use crate::progress::{Progress, RenderObserver, STATUS_BASE_LAYER};
use crate::text::TextRenderer;
use crate::watermark::{draw_info_text, info_text};
use image::RgbaImage;
use mapplot_core::{CancellationToken, Legend, MapSettings, Space};
use parking_lot::RwLock;
use std::sync::Arc;

/// Counters describing one finished composite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub plot: PlotSummary,
    pub base_rebuilt: bool,
    pub legend_rows: usize,
    pub legend_skipped: usize,
}

pub struct RenderOutput {
    pub image: RgbaImage,
    pub summary: RenderSummary,
}

/// One map view's rendering state: the current base layer, the icon cache
/// and the font.
pub struct MapEngine {
    geometry: MapGeometry,
    assets: Arc<dyn AssetProvider>,
    points: Arc<dyn PointSource>,
    text: TextRenderer,
    icons: IconCache,
    base_layer: RwLock<Option<Arc<RgbaImage>>>,
}

impl MapEngine {
    pub fn new(assets: Arc<dyn AssetProvider>, points: Arc<dyn PointSource>) -> Self {
        Self::with_geometry(MapGeometry::standard(), assets, points)
    }

    pub fn with_geometry(
        geometry: MapGeometry,
        assets: Arc<dyn AssetProvider>,
        points: Arc<dyn PointSource>,
    ) -> Self {
        let text = match assets.font() {
            Some(bytes) => match TextRenderer::from_bytes(&bytes, geometry.font_size) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Map font unusable, drawing without text: {}", e);
                    TextRenderer::without_font(geometry.font_size)
                }
            },
            None => TextRenderer::without_font(geometry.font_size),
        };
        Self {
            geometry,
            assets,
            points,
            text,
            icons: IconCache::new(),
            base_layer: RwLock::new(None),
        }
    }

    pub fn geometry(&self) -> &MapGeometry {
        &self.geometry
    }

    pub fn icon_cache(&self) -> &IconCache {
        &self.icons
    }

    pub fn reset_icon_cache(&self) {
        tracing::debug!("Dropping {} cached plot icons", self.icons.len());
        self.icons.reset();
    }

    pub fn base_layer(&self) -> Option<Arc<RgbaImage>> {
        self.base_layer.read().clone()
    }

    /// Recompose the background for `space`. Replaces the current base layer
    /// only on success.
    pub fn rebuild_base_layer(
        &self,
        space: &Space,
        settings: &MapSettings,
        observer: &dyn RenderObserver,
        cancel: &CancellationToken,
    ) -> RenderResult<Arc<RgbaImage>> {
        settings.validate()?;
        observer.status(STATUS_BASE_LAYER);
        tracing::info!("Building base layer for {} ({})", space.display_name, space.id);
        let layer = BaseLayerBuilder {
            geometry: &self.geometry,
            assets: self.assets.as_ref(),
            points: self.points.as_ref(),
            cancel,
        }
        .build(space, settings)?;
        let layer = Arc::new(layer);
        *self.base_layer.write() = Some(layer.clone());
        Ok(layer)
    }

    /// Composite the info text, legend and plots onto a copy of the base layer.
    pub fn render(
        &self,
        space: &Space,
        legend: &Legend,
        settings: &MapSettings,
        observer: &dyn RenderObserver,
        cancel: &CancellationToken,
    ) -> RenderResult<RenderOutput> {
        settings.validate()?;
        let base = self.base_layer().ok_or(RenderError::MissingBaseLayer)?;
        let mut image = (*base).clone();

        draw_info_text(&mut image, &self.text, &self.geometry, &info_text(space, settings));

        let rows = legend_rows(legend, settings);
        let placed = layout(&rows, &self.text, &self.geometry);
        draw_legend(&mut image, &rows, &placed, &self.geometry, &self.icons, &self.text);
        if placed.skipped > 0 {
            tracing::debug!("{} legend rows did not fit", placed.skipped);
        }

        let ctx = PlotContext {
            geometry: &self.geometry,
            space,
            settings,
            icons: &self.icons,
            text: &self.text,
        };
        let mut progress = Progress::new(observer, cancel, legend.total_points());
        let plot_summary = plot(&mut image, legend, &ctx, &mut progress)?;

        Ok(RenderOutput {
            image,
            summary: RenderSummary {
                plot: plot_summary,
                base_rebuilt: false,
                legend_rows: placed.placements.len(),
                legend_skipped: placed.skipped,
            },
        })
    }

    /// Rebuild the base layer when asked to or when there is none, then render.
    pub fn draw(
        &self,
        space: &Space,
        legend: &Legend,
        settings: &MapSettings,
        rebuild_base: bool,
        observer: &dyn RenderObserver,
        cancel: &CancellationToken,
    ) -> RenderResult<RenderOutput> {
        let rebuilt = rebuild_base || self.base_layer().is_none();
        if rebuilt {
            self.rebuild_base_layer(space, settings, observer, cancel)?;
        }
        let mut output = self.render(space, legend, settings, observer, cancel)?;
        output.summary.base_rebuilt = rebuilt;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{NoPoints, StaticAssets};
    use crate::plot::test_support::{item, mid, world};
    use crate::progress::NullObserver;
    use crate::progress::tests::RecordingObserver;
    use image::Rgba;
    use mapplot_core::{Background, MapDataPoint, PlotIcon};

    const DIM: u32 = 128;

    fn engine() -> MapEngine {
        let assets = StaticAssets::new()
            .with_background(Background::Normal, RgbaImage::from_pixel(DIM, DIM, Rgba([40, 40, 40, 255])));
        MapEngine::with_geometry(MapGeometry::scaled(DIM), Arc::new(assets), Arc::new(NoPoints))
    }

    fn one_point_legend(engine: &MapEngine) -> Legend {
        let (x, y) = mid(engine.geometry());
        [item(1, 0, vec![MapDataPoint::at(x, y, 0.0)])].into_iter().collect()
    }

    #[test]
    fn test_render_needs_base_layer() {
        let engine = engine();
        let result = engine.render(
            &world(),
            &Legend::new(),
            &MapSettings::default(),
            &NullObserver,
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(RenderError::MissingBaseLayer)));
    }

    #[test]
    fn test_draw_composites_onto_copy_of_base() {
        let engine = engine();
        let legend = one_point_legend(&engine);
        let settings = MapSettings::default();
        let output = engine
            .draw(&world(), &legend, &settings, false, &NullObserver, &CancellationToken::new())
            .unwrap();
        assert!(output.summary.base_rebuilt);
        assert_eq!(output.summary.plot.plotted, 1);
        assert_eq!(output.summary.legend_rows, 1);

        let (x, y) = mid(engine.geometry());
        let base = engine.base_layer().unwrap();
        assert_eq!(base.get_pixel(x as u32, y as u32).0, [40, 40, 40, 255]);
        assert_ne!(output.image, *base);

        let again = engine
            .draw(&world(), &legend, &settings, false, &NullObserver, &CancellationToken::new())
            .unwrap();
        assert!(!again.summary.base_rebuilt);
        assert_eq!(again.image, output.image);
    }

    #[test]
    fn test_invalid_settings_fail_before_drawing() {
        let engine = engine();
        let mut settings = MapSettings::default();
        settings.heatmap.resolution = 300;
        let result = engine.draw(
            &world(),
            &Legend::new(),
            &settings,
            true,
            &NullObserver,
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(RenderError::Config(_))));
        assert!(engine.base_layer().is_none());
    }

    #[test]
    fn test_cancelled_draw_reports_cancelled() {
        let engine = engine();
        let legend = one_point_legend(&engine);
        let cancel = CancellationToken::new();
        engine
            .rebuild_base_layer(&world(), &MapSettings::default(), &NullObserver, &cancel)
            .unwrap();
        cancel.cancel();
        let result = engine.render(&world(), &legend, &MapSettings::default(), &NullObserver, &cancel);
        assert!(matches!(result, Err(RenderError::Cancelled)));
    }

    #[test]
    fn test_missing_background_is_asset_error() {
        let engine = engine();
        let mut settings = MapSettings::default();
        settings.map.background = Background::Military;
        let result = engine.rebuild_base_layer(&world(), &settings, &NullObserver, &CancellationToken::new());
        assert!(matches!(result, Err(RenderError::Asset { .. })));
    }

    #[test]
    fn test_draw_reports_status_and_progress() {
        let engine = engine();
        let legend = one_point_legend(&engine);
        let observer = RecordingObserver::default();
        engine
            .draw(&world(), &legend, &MapSettings::default(), true, &observer, &CancellationToken::new())
            .unwrap();
        let statuses = observer.statuses.lock().clone();
        assert_eq!(statuses.first().map(String::as_str), Some(STATUS_BASE_LAYER));
        assert_eq!(observer.fractions.lock().last(), Some(&1.0));
    }

    #[test]
    fn test_icon_cache_reset() {
        let engine = engine();
        let legend = one_point_legend(&engine);
        engine
            .draw(&world(), &legend, &MapSettings::default(), true, &NullObserver, &CancellationToken::new())
            .unwrap();
        assert!(!engine.icon_cache().is_empty());
        let icon = PlotIcon::for_group(0, &MapSettings::default().plot.icon);
        let before = engine.icon_cache().get(&icon);
        engine.reset_icon_cache();
        assert!(engine.icon_cache().is_empty());
        assert!(!Arc::ptr_eq(&before, &engine.icon_cache().get(&icon)));
    }
}
