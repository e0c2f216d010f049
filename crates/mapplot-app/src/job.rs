use crate::scene::Scene;
use mapplot_core::CancellationToken;
use mapplot_render::{MapEngine, RenderObserver, RenderOutput, RenderResult};

/// The work behind one draw cycle.
pub trait DrawJob: Send + Sync {
    fn draw(
        &self,
        scene: &Scene,
        rebuild_base: bool,
        observer: &dyn RenderObserver,
        cancel: &CancellationToken,
    ) -> RenderResult<RenderOutput>;

    /// Drop any cached plot icons.
    fn reset_icon_cache(&self) {}
}

impl DrawJob for MapEngine {
    fn draw(
        &self,
        scene: &Scene,
        rebuild_base: bool,
        observer: &dyn RenderObserver,
        cancel: &CancellationToken,
    ) -> RenderResult<RenderOutput> {
        MapEngine::draw(
            self,
            &scene.space,
            &scene.legend,
            &scene.settings,
            rebuild_base,
            observer,
            cancel,
        )
    }

    fn reset_icon_cache(&self) {
        MapEngine::reset_icon_cache(self);
    }
}
