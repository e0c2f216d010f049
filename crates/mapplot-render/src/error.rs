use mapplot_core::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Asset '{name}' unavailable: {reason}")]
    Asset { name: String, reason: String },
    #[error("Asset '{name}' is {width}x{height}, expected {expected}x{expected}")]
    AssetDimensions {
        name: String,
        width: u32,
        height: u32,
        expected: u32,
    },
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No base layer has been built")]
    MissingBaseLayer,
    #[error("Draw cancelled")]
    Cancelled,
}

impl RenderError {
    pub fn asset(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Asset {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RenderError::Cancelled)
    }
}

pub type RenderResult<T> = Result<T, RenderError>;
