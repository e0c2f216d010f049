pub mod assets;
pub mod base_layer;
pub mod engine;
pub mod error;
pub mod export;
pub mod geometry;
pub mod icons;
pub mod legend;
pub mod plot;
pub mod progress;
pub mod raster;
pub mod text;
pub mod transform;
pub mod watermark;

pub use assets::{AssetProvider, DirectoryAssets, NoPoints, PointSource, StaticAssets};
pub use base_layer::{BaseLayerBuilder, adjust_colors};
pub use engine::{MapEngine, RenderOutput, RenderSummary};
pub use error::{RenderError, RenderResult};
pub use export::{ensure_png_extension, export_png, open_preview};
pub use geometry::MapGeometry;
pub use icons::{IconCache, render_icon};
pub use legend::{LegendLayout, LegendRow, RowPlacement, layout as layout_legend, legend_rows};
pub use plot::{HeatmapGrid, PlotContext, PlotSummary};
pub use progress::{NullObserver, RenderObserver};
pub use text::{TextMeasure, TextRenderer};
pub use transform::{CoordinateTransform, ImagePoint};
