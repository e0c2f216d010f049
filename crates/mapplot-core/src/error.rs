use thiserror::Error;

/// Settings that cannot be rendered. Fatal to the draw that observes them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unsupported heatmap resolution {0} (expected 128, 256, 512 or 1024)")]
    HeatmapResolution(u32),
    #[error("Unsupported number of topography color bands {0} (expected 2 to 5)")]
    ColorBands(u8),
    #[error("Map brightness {0}% is outside 0-500%")]
    Brightness(u32),
    #[error("Height band {min}% - {max}% is invalid")]
    HeightBand { min: u8, max: u8 },
    #[error("Cluster range {0}px is outside {min}-{max}px", min = crate::settings::ClusterSettings::MIN_RANGE, max = crate::settings::ClusterSettings::MAX_RANGE)]
    ClusterRange(u32),
    #[error("Icon size {0}px is too small")]
    IconSize(u32),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LegendError {
    #[error("No legend item with id {0}")]
    UnknownItem(u32),
    #[error("Legend groups must be non-negative, got {0}")]
    NegativeGroup(i64),
}
