pub mod cancellation;
pub mod color;
pub mod error;
pub mod icon;
pub mod item;
pub mod legend;
pub mod settings;
pub mod space;

pub use cancellation::CancellationToken;
pub use color::{Color, LEGEND_PALETTE, TOPOGRAPHY_LEGEND_COLOR};
pub use error::{ConfigError, LegendError};
pub use icon::{IconShape, PlotIcon};
pub use item::{ItemId, MapDataPoint, MapItem, PrimitiveShape, VolumeKind};
pub use legend::Legend;
pub use settings::{
    Background, BaseMapSettings, CellSettings, ClusterSettings, HeatmapColorMode,
    HeatmapSettings, IconSettings, LegendMode, MapSettings, PlotMode, PlotSettings,
    TopographySettings,
};
pub use space::{CellScaling, HeightWindow, Space, SpaceId};
