//! Draw orchestration for map hosts: owns the scene, coalesces redraw
//! requests and reports progress over a channel.

pub mod error;
pub mod events;
pub mod job;
pub mod orchestrator;
pub mod scene;

pub use error::OrchestratorError;
pub use events::DrawEvent;
pub use job::DrawJob;
pub use orchestrator::{DrawOrchestrator, DrawRequest, DrawState};
pub use scene::Scene;
