//! Fixed pixel layout of the map image.

/// Pixel constants of the composited image.
///
/// Every layer image must be `dimension`². The plot rectangle is the part of
/// the world surface a player can reach; the strip left of it holds the legend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapGeometry {
    pub dimension: u32,
    pub plot_x_min: f64,
    pub plot_x_max: f64,
    pub plot_y_min: f64,
    pub plot_y_max: f64,
    pub legend_x_min: f64,
    pub legend_icon_x: f64,
    pub font_size: f32,
    pub volume_opacity: u8,
    /// Volumes narrower than this on either axis are drawn as icons
    pub min_volume_dimension: f64,
    /// z outside these limits is treated as parked-out-of-the-way geometry
    pub z_limit_lower: f64,
    pub z_limit_upper: f64,
}

impl MapGeometry {
    pub const STANDARD_DIMENSION: u32 = 4096;

    pub const fn standard() -> Self {
        Self {
            dimension: Self::STANDARD_DIMENSION,
            plot_x_min: 650.0,
            plot_x_max: 3610.0,
            plot_y_min: 508.0,
            plot_y_max: 3382.0,
            legend_x_min: 220.0,
            legend_icon_x: 141.0,
            font_size: 36.0,
            volume_opacity: 128,
            min_volume_dimension: 8.0,
            z_limit_lower: -1000.0,
            z_limit_upper: 42000.0,
        }
    }

    /// The standard layout proportionally resized to `dimension`.
    /// Height limits are world units and stay as they are.
    pub fn scaled(dimension: u32) -> Self {
        let base = Self::standard();
        let f = f64::from(dimension) / f64::from(base.dimension);
        Self {
            dimension,
            plot_x_min: base.plot_x_min * f,
            plot_x_max: base.plot_x_max * f,
            plot_y_min: base.plot_y_min * f,
            plot_y_max: base.plot_y_max * f,
            legend_x_min: base.legend_x_min * f,
            legend_icon_x: base.legend_icon_x * f,
            font_size: (f64::from(base.font_size) * f).max(6.0) as f32,
            volume_opacity: base.volume_opacity,
            min_volume_dimension: base.min_volume_dimension,
            z_limit_lower: base.z_limit_lower,
            z_limit_upper: base.z_limit_upper,
        }
    }

    pub fn center(&self) -> f64 {
        f64::from(self.dimension) / 2.0
    }

    pub fn legend_width(&self) -> f64 {
        self.plot_x_min - self.legend_x_min
    }

    /// Whether a world-mode point lies on the reachable surface.
    pub fn in_plot_area(&self, x: f64, y: f64) -> bool {
        x >= self.plot_x_min && x < self.plot_x_max && y >= self.plot_y_min && y < self.plot_y_max
    }

    pub fn in_image(&self, x: f64, y: f64) -> bool {
        let d = f64::from(self.dimension);
        x >= 0.0 && x < d && y >= 0.0 && y < d
    }

    pub fn clamp_height(&self, z: f64) -> f64 {
        z.clamp(self.z_limit_lower, self.z_limit_upper)
    }
}

impl Default for MapGeometry {
    fn default() -> Self {
        Self::standard()
    }
}
