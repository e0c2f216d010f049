//! Single-flight draw coalescing.
//!
//! At most one draw runs at a time. Requests made while drawing are folded
//! into a single pending follow-up that records only the newest
//! rebuild-base flag; it starts as soon as the running draw finishes.

use crate::error::OrchestratorError;
use crate::events::{ChannelObserver, DrawEvent};
use crate::job::DrawJob;
use crate::scene::Scene;
use crossbeam_channel::{Receiver, Sender, unbounded};
use image::RgbaImage;
use mapplot_core::{CancellationToken, ItemId, MapItem, PlotMode, Space};
use mapplot_render::{RenderError, RenderSummary};
use parking_lot::{Condvar, Mutex};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawState {
    Idle,
    Drawing,
}

/// What became of a draw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawRequest {
    Started,
    /// Folded into the follow-up of the running draw
    Coalesced,
}

struct Inner {
    state: DrawState,
    pending: Option<bool>,
    cancel: Option<CancellationToken>,
    scene: Arc<Scene>,
    /// Set until a base layer for the current space and map settings exists
    force_rebuild: bool,
    last_image: Option<Arc<RgbaImage>>,
    last_summary: Option<RenderSummary>,
}

struct Cycle {
    rebuild_base: bool,
    cancel: CancellationToken,
    scene: Arc<Scene>,
}

impl Inner {
    fn begin(&mut self, requested: bool) -> Cycle {
        let rebuild_base = requested || self.force_rebuild;
        self.force_rebuild = false;
        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());
        self.state = DrawState::Drawing;
        Cycle {
            rebuild_base,
            cancel,
            scene: Arc::clone(&self.scene),
        }
    }
}

struct Shared {
    job: Arc<dyn DrawJob>,
    inner: Mutex<Inner>,
    idle: Condvar,
}

/// Owns the scene and runs draws of it off the calling thread.
///
/// Hosts subscribe to [`DrawEvent`]s and call [`request_draw`](Self::request_draw)
/// whenever something visible changes.
#[derive(Clone)]
pub struct DrawOrchestrator {
    shared: Arc<Shared>,
    events_tx: Sender<DrawEvent>,
    events_rx: Receiver<DrawEvent>,
}

impl DrawOrchestrator {
    pub fn new(job: Arc<dyn DrawJob>, scene: Scene) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            shared: Arc::new(Shared {
                job,
                inner: Mutex::new(Inner {
                    state: DrawState::Idle,
                    pending: None,
                    cancel: None,
                    scene: Arc::new(scene),
                    force_rebuild: true,
                    last_image: None,
                    last_summary: None,
                }),
                idle: Condvar::new(),
            }),
            events_tx,
            events_rx,
        }
    }

    /// Subscribe to draw events. Intended for a single consumer.
    pub fn events(&self) -> Receiver<DrawEvent> {
        self.events_rx.clone()
    }

    pub fn state(&self) -> DrawState {
        self.shared.inner.lock().state
    }

    pub fn is_drawing(&self) -> bool {
        self.state() == DrawState::Drawing
    }

    /// Draw now, or remember this request as the follow-up of the running draw.
    pub fn request_draw(&self, rebuild_base: bool) -> DrawRequest {
        let cycle = {
            let mut inner = self.shared.inner.lock();
            if inner.state == DrawState::Drawing {
                inner.pending = Some(rebuild_base);
                let _ = self.events_tx.send(DrawEvent::FollowUpQueued { rebuild_base });
                tracing::debug!("Draw in progress, follow-up queued (rebuild base: {})", rebuild_base);
                return DrawRequest::Coalesced;
            }
            inner.begin(rebuild_base)
        };

        let shared = Arc::clone(&self.shared);
        let events_tx = self.events_tx.clone();
        // Draws are long; keep the caller's thread free.
        std::thread::spawn(move || run_draws(shared, events_tx, cycle));
        DrawRequest::Started
    }

    /// Ask the running draw to stop. No effect when idle.
    pub fn cancel(&self) {
        if let Some(cancel) = self.shared.inner.lock().cancel.as_ref() {
            tracing::info!("Cancelling draw");
            cancel.cancel();
        }
    }

    pub fn wait_until_idle(&self) {
        let mut inner = self.shared.inner.lock();
        while inner.state == DrawState::Drawing {
            self.shared.idle.wait(&mut inner);
        }
    }

    /// Like [`wait_until_idle`](Self::wait_until_idle); `false` on timeout.
    pub fn wait_until_idle_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut inner = self.shared.inner.lock();
        while inner.state == DrawState::Drawing {
            if self.shared.idle.wait_until(&mut inner, deadline).timed_out() {
                return inner.state == DrawState::Idle;
            }
        }
        true
    }

    /// A copy of the scene as the next draw will see it.
    pub fn scene(&self) -> Scene {
        self.shared.inner.lock().scene.as_ref().clone()
    }

    /// Edit the scene. Refused while drawing. A change of space or of
    /// base-layer settings makes the next draw rebuild the base layer, and a
    /// change of plot mode drops cached icons.
    ///
    /// `edit` runs on a copy without holding the state lock, so it may call
    /// back into the orchestrator. The copy replaces the scene only if nothing
    /// else changed it or started a draw meanwhile; otherwise `Busy`.
    pub fn update_scene<R>(&self, edit: impl FnOnce(&mut Scene) -> R) -> Result<R, OrchestratorError> {
        let before = {
            let inner = self.shared.inner.lock();
            if inner.state == DrawState::Drawing {
                return Err(OrchestratorError::Busy);
            }
            Arc::clone(&inner.scene)
        };

        let mut scene = before.as_ref().clone();
        let out = edit(&mut scene);

        let base_changed = scene.space != before.space
            || scene.settings.map != before.settings.map
            || scene.settings.cell != before.settings.cell;
        let mode_changed = scene.settings.plot.mode != before.settings.plot.mode;
        {
            let mut inner = self.shared.inner.lock();
            if inner.state == DrawState::Drawing || !Arc::ptr_eq(&inner.scene, &before) {
                return Err(OrchestratorError::Busy);
            }
            inner.scene = Arc::new(scene);
            if base_changed {
                tracing::debug!("Base layer inputs changed, next draw rebuilds it");
                inner.force_rebuild = true;
            }
        }

        if mode_changed {
            self.shared.job.reset_icon_cache();
        }
        Ok(out)
    }

    pub fn set_space(&self, space: Space) -> Result<(), OrchestratorError> {
        self.update_scene(|scene| scene.space = space)
    }

    pub fn set_plot_mode(&self, mode: PlotMode) -> Result<(), OrchestratorError> {
        self.update_scene(|scene| scene.settings.plot.mode = mode)
    }

    /// Add to the legend under the lowest free group, returning it.
    pub fn add_to_legend(&self, item: MapItem) -> Result<u32, OrchestratorError> {
        self.update_scene(|scene| scene.legend.add(item))
    }

    pub fn remove_from_legend(&self, id: ItemId) -> Result<MapItem, OrchestratorError> {
        self.update_scene(|scene| scene.legend.remove(id))?
            .map_err(OrchestratorError::from)
    }

    pub fn clear_legend(&self) -> Result<(), OrchestratorError> {
        self.update_scene(|scene| scene.legend.clear())
    }

    /// Restore the default base map look, keeping the legend mode. The next
    /// draw rebuilds the base layer if anything changed.
    pub fn reset_map(&self) -> Result<(), OrchestratorError> {
        self.update_scene(|scene| scene.settings.reset_map())
    }

    /// The composite of the most recent completed draw.
    pub fn last_image(&self) -> Option<Arc<RgbaImage>> {
        self.shared.inner.lock().last_image.clone()
    }

    pub fn last_summary(&self) -> Option<RenderSummary> {
        self.shared.inner.lock().last_summary.clone()
    }

    pub fn export_current_image(&self, path: impl AsRef<Path>) -> Result<PathBuf, OrchestratorError> {
        let image = self.last_image().ok_or(OrchestratorError::NoImage)?;
        Ok(mapplot_render::export_png(&image, path.as_ref())?)
    }

    pub fn open_preview(&self) -> Result<PathBuf, OrchestratorError> {
        let image = self.last_image().ok_or(OrchestratorError::NoImage)?;
        Ok(mapplot_render::open_preview(&image)?)
    }
}

/// Worker loop: run `cycle`, then any follow-up queued meanwhile, until none
/// is left. Always leaves the orchestrator idle.
fn run_draws(shared: Arc<Shared>, events_tx: Sender<DrawEvent>, mut cycle: Cycle) {
    loop {
        let _ = events_tx.send(DrawEvent::Started {
            rebuild_base: cycle.rebuild_base,
        });
        tracing::info!("Draw started (rebuild base: {})", cycle.rebuild_base);
        let start = Instant::now();

        let observer = ChannelObserver {
            tx: events_tx.clone(),
        };
        let result = catch_unwind(AssertUnwindSafe(|| {
            shared
                .job
                .draw(&cycle.scene, cycle.rebuild_base, &observer, &cycle.cancel)
        }));

        let mut inner = shared.inner.lock();
        let succeeded = match result {
            Ok(Ok(output)) => {
                inner.last_image = Some(Arc::new(output.image));
                inner.last_summary = Some(output.summary.clone());
                tracing::info!("Draw completed in {}ms", start.elapsed().as_millis());
                let _ = events_tx.send(DrawEvent::Completed {
                    summary: output.summary,
                });
                true
            }
            Ok(Err(RenderError::Cancelled)) => {
                tracing::info!("Draw cancelled");
                let _ = events_tx.send(DrawEvent::Cancelled);
                false
            }
            Ok(Err(err)) => {
                tracing::error!("Draw failed: {}", err);
                let _ = events_tx.send(DrawEvent::Failed {
                    error: err.to_string(),
                });
                false
            }
            Err(_) => {
                tracing::error!("Draw panicked");
                let _ = events_tx.send(DrawEvent::Failed {
                    error: "Draw panicked".to_string(),
                });
                false
            }
        };
        if cycle.rebuild_base && !succeeded {
            inner.force_rebuild = true;
        }

        match inner.pending.take() {
            Some(rebuild_base) => {
                cycle = inner.begin(rebuild_base);
            }
            None => {
                inner.state = DrawState::Idle;
                inner.cancel = None;
                shared.idle.notify_all();
                return;
            }
        }
    }
}
