use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpaceId(pub u32);

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

/// A world or cell. Loaded by the catalog and only referenced by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub id: SpaceId,
    pub editor_id: String,
    pub display_name: String,
    pub is_world: bool,
    /// Lowest and highest z of anything in the space, used to turn the user's
    /// height percentiles into coordinates.
    #[serde(default)]
    pub z_range: Option<(f64, f64)>,
    /// Only present for cells.
    #[serde(default)]
    pub scaling: Option<CellScaling>,
}

impl Space {
    pub fn is_cell(&self) -> bool {
        !self.is_world
    }

    /// The coordinate window covering `min_percent..=max_percent` of the
    /// space's height range. Spaces without a known range admit everything.
    pub fn height_window(&self, min_percent: u8, max_percent: u8) -> HeightWindow {
        match self.z_range {
            Some((low, high)) => {
                let span = high - low;
                HeightWindow {
                    min: low + span * f64::from(min_percent) / 100.0,
                    max: low + span * f64::from(max_percent) / 100.0,
                }
            }
            None => HeightWindow::unbounded(),
        }
    }
}

/// Per-cell transform parameters, computed once per selected space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellScaling {
    pub scale: f64,
    pub x_offset: f64,
    pub y_offset: f64,
}

impl CellScaling {
    pub const IDENTITY: CellScaling = CellScaling {
        scale: 1.0,
        x_offset: 0.0,
        y_offset: 0.0,
    };
}

/// Inclusive z interval a cell-mode point must overlap to be drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightWindow {
    pub min: f64,
    pub max: f64,
}

impl HeightWindow {
    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn contains(&self, z: f64) -> bool {
        z >= self.min && z <= self.max
    }

    /// Whether a volume centred on `z` with total height `bound_z` reaches into the window.
    pub fn overlaps_span(&self, z: f64, bound_z: f64) -> bool {
        let half = bound_z / 2.0;
        !(z + half < self.min || z - half > self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(z_range: Option<(f64, f64)>) -> Space {
        Space {
            id: SpaceId(0x0000_3A2B),
            editor_id: "TestCell".into(),
            display_name: "Test Cell".into(),
            is_world: false,
            z_range,
            scaling: Some(CellScaling::IDENTITY),
        }
    }

    #[test]
    fn test_height_window_from_percentiles() {
        let window = cell(Some((-200.0, 800.0))).height_window(10, 50);
        assert!((window.min - -100.0).abs() < 1e-9);
        assert!((window.max - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_range_admits_everything() {
        let window = cell(None).height_window(40, 60);
        assert!(window.contains(1e9));
        assert!(window.contains(-1e9));
    }

    #[test]
    fn test_span_overlap_counts_volume_height() {
        let window = HeightWindow { min: 0.0, max: 100.0 };
        assert!(window.overlaps_span(-10.0, 40.0));
        assert!(!window.overlaps_span(-30.0, 40.0));
        assert!(window.overlaps_span(110.0, 40.0));
        assert!(!window.overlaps_span(130.0, 40.0));
    }

    #[test]
    fn test_space_id_display_is_form_id() {
        assert_eq!(SpaceId(0x25DA15).to_string(), "0025DA15");
    }
}
