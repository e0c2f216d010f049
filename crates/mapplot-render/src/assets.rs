//! Collaborator seams: raster assets by logical name, and cell point data.

use crate::error::{RenderError, RenderResult};
use image::RgbaImage;
use mapplot_core::{Background, MapDataPoint, SpaceId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub trait AssetProvider: Send + Sync {
    fn background(&self, background: Background) -> RenderResult<Arc<RgbaImage>>;
    fn overlay(&self, name: &str) -> RenderResult<Arc<RgbaImage>>;
    /// Font file bytes; `None` renders the map without text.
    fn font(&self) -> Option<Vec<u8>>;
}

/// Supplies every recorded point in a cell, for the outline background.
pub trait PointSource: Send + Sync {
    fn points_for_cell(&self, cell: SpaceId) -> Vec<MapDataPoint>;
}

/// No outline data.
pub struct NoPoints;

impl PointSource for NoPoints {
    fn points_for_cell(&self, _cell: SpaceId) -> Vec<MapDataPoint> {
        Vec::new()
    }
}

impl PointSource for HashMap<SpaceId, Vec<MapDataPoint>> {
    fn points_for_cell(&self, cell: SpaceId) -> Vec<MapDataPoint> {
        self.get(&cell).cloned().unwrap_or_default()
    }
}

pub fn background_asset_name(background: Background) -> &'static str {
    match background {
        Background::Normal => "background_normal",
        Background::Military => "background_military",
    }
}

/// Assets read from a directory of `<name>.png` files plus `font.ttf`.
/// Decoded images are kept for the lifetime of the provider.
pub struct DirectoryAssets {
    root: PathBuf,
    loaded: Mutex<HashMap<String, Arc<RgbaImage>>>,
}

impl DirectoryAssets {
    pub const ENV_VAR: &'static str = "MAPPLOT_ASSET_DIR";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Directory named by `MAPPLOT_ASSET_DIR`, else `./assets` if it exists.
    pub fn discover() -> Option<Self> {
        if let Ok(dir) = std::env::var(Self::ENV_VAR) {
            let path = PathBuf::from(dir);
            if path.is_dir() {
                return Some(Self::new(path));
            }
        }
        let local = std::env::current_dir().ok()?.join("assets");
        local.is_dir().then(|| Self::new(local))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn image(&self, name: &str) -> RenderResult<Arc<RgbaImage>> {
        if let Some(image) = self.loaded.lock().get(name) {
            return Ok(image.clone());
        }
        let path = self.root.join(format!("{name}.png"));
        tracing::debug!("Loading map asset {:?}", path);
        let image = image::open(&path)
            .map_err(|e| RenderError::asset(name, e))?
            .into_rgba8();
        let image = Arc::new(image);
        self.loaded.lock().insert(name.to_string(), image.clone());
        Ok(image)
    }
}

impl AssetProvider for DirectoryAssets {
    fn background(&self, background: Background) -> RenderResult<Arc<RgbaImage>> {
        self.image(background_asset_name(background))
    }

    fn overlay(&self, name: &str) -> RenderResult<Arc<RgbaImage>> {
        self.image(name)
    }

    fn font(&self) -> Option<Vec<u8>> {
        let path = self.root.join("font.ttf");
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("No map font at {:?}: {}", path, e);
                None
            }
        }
    }
}

/// Assets held in memory, for hosts that generate their own layers.
#[derive(Default)]
pub struct StaticAssets {
    images: HashMap<String, Arc<RgbaImage>>,
    font: Option<Vec<u8>>,
}

impl StaticAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, name: impl Into<String>, image: RgbaImage) -> Self {
        self.images.insert(name.into(), Arc::new(image));
        self
    }

    pub fn with_background(self, background: Background, image: RgbaImage) -> Self {
        self.with_image(background_asset_name(background), image)
    }

    pub fn with_font(mut self, bytes: Vec<u8>) -> Self {
        self.font = Some(bytes);
        self
    }

    fn image(&self, name: &str) -> RenderResult<Arc<RgbaImage>> {
        self.images
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::asset(name, "not registered"))
    }
}

impl AssetProvider for StaticAssets {
    fn background(&self, background: Background) -> RenderResult<Arc<RgbaImage>> {
        self.image(background_asset_name(background))
    }

    fn overlay(&self, name: &str) -> RenderResult<Arc<RgbaImage>> {
        self.image(name)
    }

    fn font(&self) -> Option<Vec<u8>> {
        self.font.clone()
    }
}
