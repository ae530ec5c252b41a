use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use defectpaste::{
    AugmentationStateCache, DefectLibrary, EditorSession, Point, SceneEvent, SessionOpts,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "defectpaste", version)]
struct Cli {
    /// Session options JSON (opacities, crop margin, mask threshold, base name).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Paste one defect onto a target image and write color, mask and metadata.
    Place(PlaceArgs),
    /// Batch export every image of a persisted session.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct PlaceArgs {
    /// Target image.
    #[arg(long)]
    target: PathBuf,

    /// Defect mask (white marks the defect).
    #[arg(long)]
    mask: PathBuf,

    /// Defect image paired with the mask.
    #[arg(long)]
    image: PathBuf,

    /// Left edge in target pixels; centered when omitted.
    #[arg(long, requires = "y")]
    x: Option<f64>,

    /// Top edge in target pixels; centered when omitted.
    #[arg(long, requires = "x")]
    y: Option<f64>,

    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Rotation in degrees about the defect's center.
    #[arg(long, default_value_t = 0.0)]
    rotation: f64,

    /// Layer opacity in [0, 1]; the session default when omitted.
    #[arg(long)]
    opacity: Option<f64>,

    /// Output color PNG; `_mask.png` and `_metadata.json` are written beside it.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Directory holding a persisted session.
    #[arg(long)]
    session: PathBuf,

    /// Mask library root.
    #[arg(long)]
    masks: PathBuf,

    /// Defect image library root.
    #[arg(long)]
    images: PathBuf,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Output file prefix; the configured base name when omitted.
    #[arg(long)]
    base: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let opts = match &cli.config {
        Some(path) => SessionOpts::from_json_file(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => SessionOpts::default(),
    };
    match cli.cmd {
        Command::Place(args) => cmd_place(opts, args),
        Command::Export(args) => cmd_export(opts, args),
    }
}

fn cmd_place(opts: SessionOpts, args: PlaceArgs) -> anyhow::Result<()> {
    let mut session = EditorSession::new(opts, DefectLibrary::new());
    session.switch_image(&args.target)?;

    let position = args.x.zip(args.y).map(|(x, y)| Point::new(x, y));
    let event = session.add_defect_pair(&args.mask, &args.image, position)?;
    let SceneEvent::Placed { id, .. } = event else {
        anyhow::bail!("defect was not placed");
    };

    let opacity = args
        .opacity
        .unwrap_or_else(|| session.opts().defect_opacity);
    session.update_transform(id, args.scale, args.rotation, opacity)?;

    create_parent(&args.out)?;
    let paths = session.save(&args.out)?;
    for p in [&paths.color, &paths.mask, &paths.metadata] {
        eprintln!("wrote {}", p.display());
    }
    Ok(())
}

fn cmd_export(opts: SessionOpts, args: ExportArgs) -> anyhow::Result<()> {
    let cache = AugmentationStateCache::load(&args.session)?;
    let library = DefectLibrary::scan(&args.masks, &args.images)?;
    let mut session = EditorSession::new(opts, library).with_cache(cache);

    let report = session.save_all(&args.out, args.base.as_deref())?;
    for item in &report.exported {
        eprintln!(
            "{} -> {}",
            item.key.path().display(),
            item.paths.color.display()
        );
    }
    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.item, skipped.reason);
    }
    eprintln!(
        "exported {} image(s) to {}",
        report.exported.len(),
        args.out.display()
    );
    Ok(())
}

fn create_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
