use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use image::{Rgba, RgbaImage};
use mapplot_app::{
    DrawEvent, DrawJob, DrawOrchestrator, DrawRequest, DrawState, OrchestratorError, Scene,
};
use mapplot_core::{
    Background, CancellationToken, ItemId, LegendMode, MapDataPoint, MapItem, PlotMode, Space,
    SpaceId,
};
use mapplot_render::{
    MapEngine, MapGeometry, NoPoints, RenderError, RenderObserver, RenderOutput, RenderResult,
    RenderSummary, StaticAssets,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

enum Outcome {
    Succeed,
    Fail,
    Panic,
}

/// A draw job that blocks until the test tells it how to finish.
struct GatedJob {
    calls: Mutex<Vec<bool>>,
    resets: AtomicUsize,
    entered_tx: Sender<()>,
    release_rx: Receiver<Outcome>,
}

impl DrawJob for GatedJob {
    fn draw(
        &self,
        _scene: &Scene,
        rebuild_base: bool,
        observer: &dyn RenderObserver,
        cancel: &CancellationToken,
    ) -> RenderResult<RenderOutput> {
        self.calls.lock().push(rebuild_base);
        observer.status("Plotting...");
        self.entered_tx.send(()).unwrap();
        loop {
            if cancel.is_cancelled() {
                return Err(RenderError::Cancelled);
            }
            match self.release_rx.recv_timeout(Duration::from_millis(5)) {
                Ok(Outcome::Succeed) | Err(RecvTimeoutError::Disconnected) => {
                    return Ok(RenderOutput {
                        image: RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])),
                        summary: RenderSummary::default(),
                    });
                }
                Ok(Outcome::Fail) => {
                    return Err(RenderError::asset("background_normal", "file not found"));
                }
                Ok(Outcome::Panic) => panic!("draw job exploded"),
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    fn reset_icon_cache(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    orchestrator: DrawOrchestrator,
    job: Arc<GatedJob>,
    entered: Receiver<()>,
    release: Sender<Outcome>,
}

impl Harness {
    fn new() -> Self {
        let (entered_tx, entered) = unbounded();
        let (release, release_rx) = unbounded();
        let job = Arc::new(GatedJob {
            calls: Mutex::new(Vec::new()),
            resets: AtomicUsize::new(0),
            entered_tx,
            release_rx,
        });
        let orchestrator = DrawOrchestrator::new(job.clone(), Scene::new(world(1)));
        Self {
            orchestrator,
            job,
            entered,
            release,
        }
    }

    fn wait_entered(&self) {
        self.entered.recv_timeout(WAIT).expect("draw job should start");
    }

    fn finish(&self, outcome: Outcome) {
        self.release.send(outcome).unwrap();
    }

    /// One full draw that succeeds.
    fn draw_once(&self, rebuild_base: bool) {
        assert_eq!(self.orchestrator.request_draw(rebuild_base), DrawRequest::Started);
        self.wait_entered();
        self.finish(Outcome::Succeed);
        assert!(self.orchestrator.wait_until_idle_timeout(WAIT));
    }

    fn calls(&self) -> Vec<bool> {
        self.job.calls.lock().clone()
    }

    fn events(&self) -> Vec<DrawEvent> {
        self.orchestrator.events().try_iter().collect()
    }
}

fn world(id: u32) -> Space {
    Space {
        id: SpaceId(id),
        editor_id: format!("World{id}"),
        display_name: format!("World {id}"),
        is_world: true,
        z_range: None,
        scaling: None,
    }
}

fn count(events: &[DrawEvent], pred: impl Fn(&DrawEvent) -> bool) -> usize {
    events.iter().filter(|event| pred(event)).count()
}

#[test]
fn requests_during_a_draw_collapse_into_one_follow_up() {
    let h = Harness::new();
    assert_eq!(h.orchestrator.request_draw(false), DrawRequest::Started);
    h.wait_entered();
    assert!(h.orchestrator.is_drawing());

    for flag in [true, true, false] {
        assert_eq!(h.orchestrator.request_draw(flag), DrawRequest::Coalesced);
    }

    h.finish(Outcome::Succeed);
    h.wait_entered();
    h.finish(Outcome::Succeed);
    assert!(h.orchestrator.wait_until_idle_timeout(WAIT));

    // First draw is forced to build a base layer; the follow-up keeps the newest flag.
    assert_eq!(h.calls(), vec![true, false]);

    let events = h.events();
    assert_eq!(count(&events, |e| matches!(e, DrawEvent::FollowUpQueued { .. })), 3);
    assert_eq!(count(&events, |e| matches!(e, DrawEvent::Started { .. })), 2);
    assert_eq!(count(&events, |e| matches!(e, DrawEvent::Completed { .. })), 2);
    assert_eq!(h.orchestrator.state(), DrawState::Idle);
}

#[test]
fn idle_request_starts_immediately() {
    let h = Harness::new();
    h.draw_once(false);
    h.draw_once(false);
    assert_eq!(h.calls(), vec![true, false]);
    assert!(h.orchestrator.last_image().is_some());
}

#[test]
fn superseded_images_are_released_without_draining_events() {
    let h = Harness::new();
    h.draw_once(false);
    let first = h.orchestrator.last_image().unwrap();
    for _ in 0..3 {
        h.draw_once(false);
    }
    assert_eq!(Arc::strong_count(&first), 1);
    assert_eq!(Arc::strong_count(&h.orchestrator.last_image().unwrap()), 2);
}

#[test]
fn status_and_completion_events_arrive_in_order() {
    let h = Harness::new();
    h.draw_once(true);
    let events = h.events();
    assert!(matches!(events.first(), Some(DrawEvent::Started { rebuild_base: true })));
    assert!(matches!(&events[1], DrawEvent::Status { label } if label == "Plotting..."));
    assert!(matches!(events.last(), Some(DrawEvent::Completed { .. })));
}

#[test]
fn cancel_returns_to_idle_without_failure() {
    let h = Harness::new();
    h.orchestrator.request_draw(false);
    h.wait_entered();
    h.orchestrator.cancel();
    assert!(h.orchestrator.wait_until_idle_timeout(WAIT));

    let events = h.events();
    assert_eq!(count(&events, |e| matches!(e, DrawEvent::Cancelled)), 1);
    assert_eq!(count(&events, |e| matches!(e, DrawEvent::Failed { .. })), 0);
    assert_eq!(count(&events, |e| matches!(e, DrawEvent::Completed { .. })), 0);
    assert!(h.orchestrator.last_image().is_none());
}

#[test]
fn cancel_when_idle_does_nothing() {
    let h = Harness::new();
    h.orchestrator.cancel();
    assert_eq!(h.orchestrator.state(), DrawState::Idle);
    assert!(h.events().is_empty());
}

#[test]
fn cancelled_draw_still_runs_pending_follow_up() {
    let h = Harness::new();
    h.orchestrator.request_draw(false);
    h.wait_entered();
    assert_eq!(h.orchestrator.request_draw(false), DrawRequest::Coalesced);
    h.orchestrator.cancel();

    // The follow-up gets a fresh token and still owes the base layer.
    h.wait_entered();
    h.finish(Outcome::Succeed);
    assert!(h.orchestrator.wait_until_idle_timeout(WAIT));
    assert_eq!(h.calls(), vec![true, true]);

    let events = h.events();
    assert_eq!(count(&events, |e| matches!(e, DrawEvent::Cancelled)), 1);
    assert_eq!(count(&events, |e| matches!(e, DrawEvent::Completed { .. })), 1);
}

#[test]
fn failed_draw_reports_and_recovers() {
    let h = Harness::new();
    h.orchestrator.request_draw(false);
    h.wait_entered();
    h.finish(Outcome::Fail);
    assert!(h.orchestrator.wait_until_idle_timeout(WAIT));

    let events = h.events();
    let failure = events.iter().find_map(|e| match e {
        DrawEvent::Failed { error } => Some(error.clone()),
        _ => None,
    });
    assert!(failure.expect("failure event").contains("background_normal"));

    h.draw_once(false);
    // The base layer never got built, so it is still owed.
    assert_eq!(h.calls(), vec![true, true]);
}

#[test]
fn panicking_draw_reports_failure() {
    let h = Harness::new();
    h.orchestrator.request_draw(false);
    h.wait_entered();
    h.finish(Outcome::Panic);
    assert!(h.orchestrator.wait_until_idle_timeout(WAIT));
    assert_eq!(h.orchestrator.state(), DrawState::Idle);

    let events = h.events();
    assert_eq!(count(&events, |e| matches!(e, DrawEvent::Failed { .. })), 1);

    h.draw_once(false);
    assert!(h.orchestrator.last_image().is_some());
}

#[test]
fn scene_edits_are_refused_while_drawing() {
    let h = Harness::new();
    h.orchestrator.request_draw(false);
    h.wait_entered();
    assert!(matches!(
        h.orchestrator.set_plot_mode(PlotMode::Heatmap),
        Err(OrchestratorError::Busy)
    ));
    h.finish(Outcome::Succeed);
    assert!(h.orchestrator.wait_until_idle_timeout(WAIT));

    h.orchestrator.set_plot_mode(PlotMode::Heatmap).unwrap();
    assert_eq!(h.orchestrator.scene().settings.plot.mode, PlotMode::Heatmap);
}

#[test]
fn plot_mode_change_resets_icon_cache() {
    let h = Harness::new();
    h.orchestrator.set_plot_mode(PlotMode::Topography).unwrap();
    h.orchestrator.set_plot_mode(PlotMode::Topography).unwrap();
    assert_eq!(h.job.resets.load(Ordering::SeqCst), 1);
}

#[test]
fn space_change_forces_base_rebuild() {
    let h = Harness::new();
    h.draw_once(false);
    h.draw_once(false);

    let item = MapItem::new(ItemId(7), "Stimpak", "Stimpak", SpaceId(1), vec![MapDataPoint::at(1.0, 1.0, 0.0)]);
    assert_eq!(h.orchestrator.add_to_legend(item).unwrap(), 0);
    h.draw_once(false);

    h.orchestrator.set_space(world(2)).unwrap();
    h.draw_once(false);

    h.orchestrator
        .update_scene(|scene| scene.settings.map.background = Background::Military)
        .unwrap();
    h.draw_once(false);

    assert_eq!(h.calls(), vec![true, false, false, true, true]);
}

#[test]
fn reset_map_restores_defaults_and_rebuilds() {
    let h = Harness::new();
    h.orchestrator
        .update_scene(|scene| {
            scene.settings.map.brightness = 40;
            scene.settings.map.legend_mode = LegendMode::Hidden;
        })
        .unwrap();
    h.draw_once(false);

    h.orchestrator.reset_map().unwrap();
    let settings = h.orchestrator.scene().settings;
    assert_eq!(settings.map.brightness, 100);
    assert_eq!(settings.map.legend_mode, LegendMode::Hidden);
    h.draw_once(false);

    // Already at defaults: nothing to rebuild.
    h.orchestrator.reset_map().unwrap();
    h.draw_once(false);

    assert_eq!(h.calls(), vec![true, true, false]);
}

#[test]
fn scene_edit_may_call_back_into_orchestrator() {
    let h = Harness::new();
    let orchestrator = h.orchestrator.clone();
    let seen = h
        .orchestrator
        .update_scene(|scene| {
            scene.settings.plot.mode = PlotMode::Cluster;
            (orchestrator.state(), orchestrator.scene().settings.plot.mode, orchestrator.last_image().is_none())
        })
        .unwrap();
    assert_eq!(seen, (DrawState::Idle, PlotMode::Icon, true));
    assert_eq!(h.orchestrator.scene().settings.plot.mode, PlotMode::Cluster);
}

#[test]
fn legend_edits_go_through_scene() {
    let h = Harness::new();
    let item = MapItem::new(ItemId(3), "Ammo", "Ammo", SpaceId(1), Vec::new());
    h.orchestrator.add_to_legend(item).unwrap();
    assert_eq!(h.orchestrator.scene().legend.len(), 1);

    let removed = h.orchestrator.remove_from_legend(ItemId(3)).unwrap();
    assert_eq!(removed.id, ItemId(3));
    assert!(matches!(
        h.orchestrator.remove_from_legend(ItemId(3)),
        Err(OrchestratorError::Legend(_))
    ));

    for id in 4..7 {
        h.orchestrator
            .add_to_legend(MapItem::new(ItemId(id), "Ammo", "Ammo", SpaceId(1), Vec::new()))
            .unwrap();
    }
    h.orchestrator.clear_legend().unwrap();
    assert!(h.orchestrator.scene().legend.is_empty());
}

#[test]
fn export_needs_a_finished_draw() {
    let h = Harness::new();
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        h.orchestrator.export_current_image(dir.path().join("map")),
        Err(OrchestratorError::NoImage)
    ));

    h.draw_once(false);
    let path = h.orchestrator.export_current_image(dir.path().join("map")).unwrap();
    assert_eq!(path, dir.path().join("map.png"));
    let saved = image::open(&path).unwrap().into_rgba8();
    assert_eq!(saved.dimensions(), (2, 2));
    assert_eq!(saved.get_pixel(0, 0).0, [1, 2, 3, 255]);
}

#[test]
fn engine_draws_through_orchestrator() {
    const DIM: u32 = 128;
    let assets = StaticAssets::new().with_background(
        Background::Normal,
        RgbaImage::from_pixel(DIM, DIM, Rgba([30, 30, 30, 255])),
    );
    let geometry = MapGeometry::scaled(DIM);
    let x = (geometry.plot_x_min + geometry.plot_x_max) / 2.0;
    let y = (geometry.plot_y_min + geometry.plot_y_max) / 2.0;
    let engine = MapEngine::with_geometry(geometry, Arc::new(assets), Arc::new(NoPoints));

    let orchestrator = DrawOrchestrator::new(Arc::new(engine), Scene::new(world(1)));
    orchestrator
        .add_to_legend(MapItem::new(ItemId(1), "Nuka", "Nuka-Cola", SpaceId(1), vec![MapDataPoint::at(x, y, 0.0)]))
        .unwrap();

    orchestrator.request_draw(false);
    assert!(orchestrator.wait_until_idle_timeout(WAIT));

    let events: Vec<DrawEvent> = orchestrator.events().try_iter().collect();
    assert!(events.iter().any(|e| matches!(e, DrawEvent::Status { label } if label == "Building base layer...")));
    let summary = events
        .iter()
        .find_map(|e| match e {
            DrawEvent::Completed { summary } => Some(summary.clone()),
            _ => None,
        })
        .expect("completed event");
    assert_eq!(orchestrator.last_image().unwrap().dimensions(), (DIM, DIM));
    assert!(summary.base_rebuilt);
    assert_eq!(summary.plot.plotted, 1);
    assert_eq!(orchestrator.last_summary(), Some(summary));
}
