use mapplot_core::LegendError;
use mapplot_render::RenderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("A draw is in progress")]
    Busy,
    #[error("No map has been drawn yet")]
    NoImage,
    #[error("Legend error: {0}")]
    Legend(#[from] LegendError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}
