use crate::color::Color;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlotMode {
    #[default]
    Icon,
    Heatmap,
    Topography,
    Cluster,
}

impl PlotMode {
    pub fn shows_icons(self) -> bool {
        matches!(self, PlotMode::Icon | PlotMode::Topography)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Background {
    #[default]
    Normal,
    Military,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HeatmapColorMode {
    #[default]
    Mono,
    Duo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LegendMode {
    #[default]
    Compact,
    Extended,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub plot: PlotSettings,
    pub heatmap: HeatmapSettings,
    pub topography: TopographySettings,
    pub cluster: ClusterSettings,
    pub map: BaseMapSettings,
    pub cell: CellSettings,
    #[serde(default = "default_watermark")]
    pub watermark: String,
}

fn default_watermark() -> String {
    "Made with mapplot".to_string()
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            plot: PlotSettings::default(),
            heatmap: HeatmapSettings::default(),
            topography: TopographySettings::default(),
            cluster: ClusterSettings::default(),
            map: BaseMapSettings::default(),
            cell: CellSettings::default(),
            watermark: default_watermark(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    pub mode: PlotMode,
    #[serde(default = "default_true")]
    pub draw_volumes: bool,
    pub icon: IconSettings,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            mode: PlotMode::Icon,
            draw_volumes: true,
            icon: IconSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconSettings {
    pub size: u32,
    pub line_width: u32,
    pub fill: bool,
}

impl Default for IconSettings {
    fn default() -> Self {
        Self {
            size: 20,
            line_width: 3,
            fill: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapSettings {
    pub resolution: u32,
    pub blend_distance: u32,
    pub color_mode: HeatmapColorMode,
}

impl HeatmapSettings {
    pub const RESOLUTIONS: [u32; 4] = [128, 256, 512, 1024];
}

impl Default for HeatmapSettings {
    fn default() -> Self {
        Self {
            resolution: 256,
            blend_distance: 4,
            color_mode: HeatmapColorMode::Mono,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TopographySettings {
    /// `None` plots a continuous gradient.
    pub color_bands: Option<u8>,
}

impl TopographySettings {
    pub const MIN_BANDS: u8 = 2;
    pub const MAX_BANDS: u8 = 5;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    pub range: u32,
    /// px², below which a cluster is drawn as a circle instead of its hull
    pub minimum_polygon_area: f64,
    /// Circles wider than this are drawn as their hull instead
    pub maximum_circle_radius: f64,
    pub polygon_line_thickness: u32,
    pub bounding_circle_min_radius: f64,
    /// Hull vertices this close together are merged
    pub polygon_point_reduction_range: f64,
}

impl ClusterSettings {
    pub const MIN_RANGE: u32 = 30;
    pub const MAX_RANGE: u32 = 800;
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            range: 100,
            minimum_polygon_area: 250.0,
            maximum_circle_radius: 50.0,
            polygon_line_thickness: 4,
            bounding_circle_min_radius: 15.0,
            polygon_point_reduction_range: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseMapSettings {
    /// Percent, 100 leaves the background untouched
    pub brightness: u32,
    pub grayscale: bool,
    pub background: Background,
    /// Overlay layer names, composited in order
    pub overlays: Vec<String>,
    pub legend_mode: LegendMode,
}

impl BaseMapSettings {
    pub const DEFAULT_BRIGHTNESS: u32 = 100;
    pub const MAX_BRIGHTNESS: u32 = 500;
}

impl Default for BaseMapSettings {
    fn default() -> Self {
        Self {
            brightness: Self::DEFAULT_BRIGHTNESS,
            grayscale: false,
            background: Background::Normal,
            overlays: Vec::new(),
            legend_mode: LegendMode::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellSettings {
    #[serde(default = "default_true")]
    pub draw_outline: bool,
    pub outline_size: u32,
    pub outline_width: u32,
    pub outline_alpha: u8,
    pub outline_color: Color,
    pub min_height_percent: u8,
    pub max_height_percent: u8,
}

impl Default for CellSettings {
    fn default() -> Self {
        Self {
            draw_outline: true,
            outline_size: 7,
            outline_width: 1,
            outline_alpha: 80,
            outline_color: Color::rgb(255, 255, 255),
            min_height_percent: 0,
            max_height_percent: 100,
        }
    }
}

fn default_true() -> bool {
    true
}

impl MapSettings {
    /// Reject anything the renderer has no rule for.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !HeatmapSettings::RESOLUTIONS.contains(&self.heatmap.resolution) {
            return Err(ConfigError::HeatmapResolution(self.heatmap.resolution));
        }
        if let Some(bands) = self.topography.color_bands {
            if !(TopographySettings::MIN_BANDS..=TopographySettings::MAX_BANDS).contains(&bands) {
                return Err(ConfigError::ColorBands(bands));
            }
        }
        if self.map.brightness > BaseMapSettings::MAX_BRIGHTNESS {
            return Err(ConfigError::Brightness(self.map.brightness));
        }
        let (min, max) = (self.cell.min_height_percent, self.cell.max_height_percent);
        if min > max || max > 100 {
            return Err(ConfigError::HeightBand { min, max });
        }
        if !(ClusterSettings::MIN_RANGE..=ClusterSettings::MAX_RANGE).contains(&self.cluster.range) {
            return Err(ConfigError::ClusterRange(self.cluster.range));
        }
        if self.plot.icon.size < 2 {
            return Err(ConfigError::IconSize(self.plot.icon.size));
        }
        Ok(())
    }

    /// Restore the base-map group to defaults, keeping plot preferences.
    pub fn reset_map(&mut self) {
        self.map = BaseMapSettings {
            legend_mode: self.map.legend_mode,
            ..BaseMapSettings::default()
        };
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mapplot").join("settings.json"))
    }

    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        tracing::info!("Loading settings from {:?}", path);
        if !path.exists() {
            tracing::info!("Settings file not found, using defaults");
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    tracing::debug!("Settings loaded successfully: {:?}", settings);
                    settings
                }
                Err(e) => {
                    tracing::error!("Failed to parse settings: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::error!("Failed to read settings file: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        match Self::default_path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(MapSettings::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_unsupported_resolution() {
        let mut settings = MapSettings::default();
        settings.heatmap.resolution = 300;
        assert_eq!(
            settings.validate(),
            Err(ConfigError::HeatmapResolution(300))
        );
    }

    #[test]
    fn test_rejects_inverted_height_band() {
        let mut settings = MapSettings::default();
        settings.cell.min_height_percent = 60;
        settings.cell.max_height_percent = 40;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::HeightBand { min: 60, max: 40 })
        ));
    }

    #[test]
    fn test_rejects_color_bands_out_of_range() {
        let mut settings = MapSettings::default();
        settings.topography.color_bands = Some(7);
        assert_eq!(settings.validate(), Err(ConfigError::ColorBands(7)));
        settings.topography.color_bands = Some(3);
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: MapSettings =
            serde_json::from_str(r#"{"plot":{"mode":"Heatmap"},"heatmap":{"resolution":512}}"#)
                .unwrap();
        assert_eq!(settings.plot.mode, PlotMode::Heatmap);
        assert!(settings.plot.draw_volumes);
        assert_eq!(settings.heatmap.resolution, 512);
        assert_eq!(settings.heatmap.blend_distance, 4);
        assert_eq!(settings.map.brightness, 100);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = MapSettings::default();
        settings.map.grayscale = true;
        settings.map.overlays = vec!["nw_morgantown".into()];
        settings.save_to(&path).unwrap();

        assert_eq!(MapSettings::load_from(&path), settings);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(MapSettings::load_from(&path), MapSettings::default());
    }

    #[test]
    fn test_reset_map_keeps_legend_mode() {
        let mut settings = MapSettings::default();
        settings.map.brightness = 40;
        settings.map.background = Background::Military;
        settings.map.legend_mode = LegendMode::Hidden;
        settings.reset_map();
        assert_eq!(settings.map.brightness, 100);
        assert_eq!(settings.map.background, Background::Normal);
        assert_eq!(settings.map.legend_mode, LegendMode::Hidden);
    }
}
