//! World/cell coordinates to image pixels.

use crate::geometry::MapGeometry;
use mapplot_core::{CellScaling, MapDataPoint, Space};

/// A data point placed on the image. Derived per draw; the source point is
/// left as it was.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub bound_x: f64,
    pub bound_y: f64,
    pub bound_z: f64,
    pub rotation_z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    scaling: Option<CellScaling>,
    center: f64,
}

impl CoordinateTransform {
    pub fn world(geometry: &MapGeometry) -> Self {
        Self {
            scaling: None,
            center: geometry.center(),
        }
    }

    pub fn cell(scaling: CellScaling, geometry: &MapGeometry) -> Self {
        Self {
            scaling: Some(scaling),
            center: geometry.center(),
        }
    }

    /// Cells without scaling data fall back to identity scaling.
    pub fn for_space(space: &Space, geometry: &MapGeometry) -> Self {
        if space.is_world {
            Self::world(geometry)
        } else {
            Self::cell(space.scaling.unwrap_or(CellScaling::IDENTITY), geometry)
        }
    }

    pub fn apply(&self, point: &MapDataPoint) -> ImagePoint {
        let (x, y) = self.apply_xy(point.x, point.y);
        let scale = self.scaling.map_or(1.0, |s| s.scale);
        ImagePoint {
            x,
            y,
            z: point.z,
            bound_x: point.bound_x * scale,
            bound_y: point.bound_y * scale,
            bound_z: point.bound_z,
            rotation_z: point.rotation_z,
        }
    }

    pub fn apply_xy(&self, x: f64, y: f64) -> (f64, f64) {
        match self.scaling {
            None => (x, y),
            Some(s) => (
                (x + s.x_offset - self.center) * s.scale + self.center,
                (y + s.y_offset - self.center) * s.scale + self.center,
            ),
        }
    }

    /// Inverse of [`apply_xy`](Self::apply_xy).
    pub fn invert_xy(&self, x: f64, y: f64) -> (f64, f64) {
        match self.scaling {
            None => (x, y),
            Some(s) => (
                (x - self.center) / s.scale + self.center - s.x_offset,
                (y - self.center) / s.scale + self.center - s.y_offset,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapplot_core::PrimitiveShape;
    use proptest::prelude::*;

    fn geometry() -> MapGeometry {
        MapGeometry::standard()
    }

    #[test]
    fn test_world_is_identity() {
        let t = CoordinateTransform::world(&geometry());
        let p = MapDataPoint::at(1000.0, 2000.0, 5.0);
        let out = t.apply(&p);
        assert_eq!((out.x, out.y, out.z), (1000.0, 2000.0, 5.0));
    }

    #[test]
    fn test_cell_scales_around_center() {
        let scaling = CellScaling {
            scale: 2.0,
            x_offset: 10.0,
            y_offset: -10.0,
        };
        let t = CoordinateTransform::cell(scaling, &geometry());
        let p = MapDataPoint::at(2038.0, 2058.0, 0.0).with_volume(
            PrimitiveShape::Box,
            (4.0, 6.0, 8.0),
            30.0,
        );
        let out = t.apply(&p);
        assert_eq!(out.x, 2048.0);
        assert_eq!(out.y, 2048.0);
        assert_eq!(out.bound_x, 8.0);
        assert_eq!(out.bound_y, 12.0);
        assert_eq!(out.bound_z, 8.0);
        assert_eq!(out.rotation_z, 30.0);
    }

    #[test]
    fn test_apply_does_not_touch_source() {
        let t = CoordinateTransform::cell(
            CellScaling {
                scale: 3.0,
                x_offset: 1.0,
                y_offset: 1.0,
            },
            &geometry(),
        );
        let p = MapDataPoint::at(100.0, 100.0, 0.0);
        let first = t.apply(&p);
        let second = t.apply(&p);
        assert_eq!(first, second);
        assert_eq!(p.x, 100.0);
    }

    proptest! {
        #[test]
        fn prop_cell_transform_inverts(
            x in -50_000.0f64..50_000.0,
            y in -50_000.0f64..50_000.0,
            scale in 0.01f64..40.0,
            x_offset in -5_000.0f64..5_000.0,
            y_offset in -5_000.0f64..5_000.0,
        ) {
            let t = CoordinateTransform::cell(CellScaling { scale, x_offset, y_offset }, &geometry());
            let (ix, iy) = t.apply_xy(x, y);
            let (rx, ry) = t.invert_xy(ix, iy);
            let tolerance = 1e-6 * (1.0 + x.abs().max(y.abs()) + x_offset.abs().max(y_offset.abs()));
            prop_assert!((rx - x).abs() < tolerance, "x {} -> {} -> {}", x, ix, rx);
            prop_assert!((ry - y).abs() < tolerance, "y {} -> {} -> {}", y, iy, ry);
        }
    }
}
