use crate::SpaceId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

/// Primitive shape tag carried by volume points.
///
/// Tags outside the known set are kept verbatim so the renderer can report
/// them as a coverage gap instead of losing them at load time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PrimitiveShape {
    Box,
    Line,
    Plane,
    Sphere,
    Ellipsoid,
    Other(String),
}

/// How a primitive is filled when drawn as a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
    Rectangle,
    Ellipse,
}

impl PrimitiveShape {
    pub fn volume_kind(&self) -> Option<VolumeKind> {
        match self {
            PrimitiveShape::Box | PrimitiveShape::Line | PrimitiveShape::Plane => {
                Some(VolumeKind::Rectangle)
            }
            PrimitiveShape::Sphere | PrimitiveShape::Ellipsoid => Some(VolumeKind::Ellipse),
            PrimitiveShape::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PrimitiveShape::Box => "Box",
            PrimitiveShape::Line => "Line",
            PrimitiveShape::Plane => "Plane",
            PrimitiveShape::Sphere => "Sphere",
            PrimitiveShape::Ellipsoid => "Ellipsoid",
            PrimitiveShape::Other(tag) => tag,
        }
    }
}

impl From<&str> for PrimitiveShape {
    fn from(tag: &str) -> Self {
        match tag {
            "Box" => PrimitiveShape::Box,
            "Line" => PrimitiveShape::Line,
            "Plane" => PrimitiveShape::Plane,
            "Sphere" => PrimitiveShape::Sphere,
            "Ellipsoid" => PrimitiveShape::Ellipsoid,
            other => PrimitiveShape::Other(other.to_string()),
        }
    }
}

impl From<String> for PrimitiveShape {
    fn from(tag: String) -> Self {
        PrimitiveShape::from(tag.as_str())
    }
}

impl From<PrimitiveShape> for String {
    fn from(shape: PrimitiveShape) -> Self {
        shape.as_str().to_string()
    }
}

/// One occurrence of a [`MapItem`], in map-image units.
///
/// Never modified by rendering; transforms produce new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDataPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub bound_x: f64,
    #[serde(default)]
    pub bound_y: f64,
    #[serde(default)]
    pub bound_z: f64,
    /// Degrees, clockwise in image space.
    #[serde(default)]
    pub rotation_z: f64,
    #[serde(default)]
    pub shape: Option<PrimitiveShape>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl MapDataPoint {
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            bound_x: 0.0,
            bound_y: 0.0,
            bound_z: 0.0,
            rotation_z: 0.0,
            shape: None,
            weight: default_weight(),
        }
    }

    pub fn with_volume(
        mut self,
        shape: PrimitiveShape,
        bounds: (f64, f64, f64),
        rotation_z: f64,
    ) -> Self {
        self.shape = Some(shape);
        self.bound_x = bounds.0;
        self.bound_y = bounds.1;
        self.bound_z = bounds.2;
        self.rotation_z = rotation_z;
        self
    }

    /// Lower and upper z of the point including half its volume height.
    pub fn z_span(&self) -> (f64, f64) {
        let half = self.bound_z / 2.0;
        (self.z - half, self.z + half)
    }
}

/// A legend entry and every occurrence it plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapItem {
    pub id: ItemId,
    pub editor_id: String,
    pub display_name: String,
    pub space: SpaceId,
    #[serde(default)]
    pub legend_group: u32,
    #[serde(default)]
    pub overriding_legend_text: Option<String>,
    pub points: Arc<[MapDataPoint]>,
}

impl MapItem {
    pub fn new(
        id: ItemId,
        editor_id: impl Into<String>,
        display_name: impl Into<String>,
        space: SpaceId,
        points: Vec<MapDataPoint>,
    ) -> Self {
        Self {
            id,
            editor_id: editor_id.into(),
            display_name: display_name.into(),
            space,
            legend_group: 0,
            overriding_legend_text: None,
            points: points.into(),
        }
    }

    pub fn count(&self) -> usize {
        self.points.len()
    }

    /// The override text, if it carries anything visible.
    pub fn override_text(&self) -> Option<&str> {
        self.overriding_legend_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}
