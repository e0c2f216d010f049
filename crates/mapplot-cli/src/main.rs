use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use mapplot_app::{DrawEvent, DrawOrchestrator, Scene};
use mapplot_core::{Legend, MapDataPoint, MapItem, MapSettings, PlotMode, Space};
use mapplot_render::{DirectoryAssets, MapEngine, PointSource};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene document (JSON): the space, legend items and optional settings
    #[arg(short, long)]
    scene: PathBuf,

    /// Directory holding background/overlay PNGs and font.ttf
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Where to write the map. `.png` is appended when missing
    #[arg(short, long, default_value = "map.png")]
    out: PathBuf,

    /// Settings file, overriding the scene's and the user's saved settings
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Force a base layer rebuild
    #[arg(long)]
    rebuild: bool,

    /// Give each item the lowest free legend group instead of the one in the document
    #[arg(long)]
    auto_groups: bool,

    /// Open the result in the system image viewer
    #[arg(long)]
    preview: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Icon,
    Heatmap,
    Topography,
    Cluster,
}

impl From<ModeArg> for PlotMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Icon => PlotMode::Icon,
            ModeArg::Heatmap => PlotMode::Heatmap,
            ModeArg::Topography => PlotMode::Topography,
            ModeArg::Cluster => PlotMode::Cluster,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SceneDocument {
    space: Space,
    #[serde(default)]
    items: Vec<MapItem>,
    /// Every recorded point of a cell, for its outline
    #[serde(default)]
    outline_points: Vec<MapDataPoint>,
    #[serde(default)]
    settings: Option<MapSettings>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let content = std::fs::read_to_string(&args.scene)
        .with_context(|| format!("reading scene {:?}", args.scene))?;
    let document: SceneDocument =
        serde_json::from_str(&content).with_context(|| format!("parsing scene {:?}", args.scene))?;

    let mut settings = match (&args.settings, document.settings) {
        (Some(path), _) => MapSettings::load_from(path),
        (None, Some(settings)) => settings,
        (None, None) => MapSettings::load(),
    };
    if let Some(mode) = args.mode {
        settings.plot.mode = mode.into();
    }

    let mut legend = Legend::new();
    for item in document.items {
        if args.auto_groups {
            legend.add(item);
        } else {
            legend.push(item);
        }
    }

    let assets = match args.assets {
        Some(dir) => DirectoryAssets::new(dir),
        None => match DirectoryAssets::discover() {
            Some(assets) => assets,
            None => bail!(
                "no asset directory given; pass --assets or set {}",
                DirectoryAssets::ENV_VAR
            ),
        },
    };
    println!("Using assets from {:?}", assets.root());

    let mut outlines: HashMap<_, Vec<MapDataPoint>> = HashMap::new();
    outlines.insert(document.space.id, document.outline_points);
    let points: Arc<dyn PointSource> = Arc::new(outlines);
    let engine = MapEngine::new(Arc::new(assets), points);

    println!(
        "Drawing {} ({} items, {} points)",
        document.space.display_name,
        legend.len(),
        legend.total_points()
    );
    let scene = Scene::new(document.space)
        .with_legend(legend)
        .with_settings(settings);
    let orchestrator = DrawOrchestrator::new(Arc::new(engine), scene);
    let events = orchestrator.events();

    orchestrator.request_draw(args.rebuild);

    let mut failure = None;
    for event in events.iter() {
        match event {
            DrawEvent::Status { label } => println!("{}", label),
            DrawEvent::Completed { summary, .. } => {
                println!(
                    "Plotted {} points ({} volumes, {} skipped, {} clusters)",
                    summary.plot.plotted,
                    summary.plot.volumes,
                    summary.plot.skipped,
                    summary.plot.clusters
                );
                if summary.legend_skipped > 0 {
                    println!("{} legend rows did not fit", summary.legend_skipped);
                }
                break;
            }
            DrawEvent::Failed { error } => {
                failure = Some(error);
                break;
            }
            DrawEvent::Cancelled => {
                failure = Some("draw cancelled".to_string());
                break;
            }
            _ => {}
        }
    }
    orchestrator.wait_until_idle();
    if let Some(error) = failure {
        bail!("draw failed: {}", error);
    }

    let path = orchestrator.export_current_image(&args.out)?;
    println!("Map written to {:?}", path);

    if args.preview {
        orchestrator.open_preview()?;
    }
    Ok(())
}
