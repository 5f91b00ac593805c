use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use lottie_sheet::{
    AnimationDocument, BakeParameters, CpuLottieEngine, LottieTexture, SheetSettings,
    TextureRegistry, VectorEngine, artifact, plan_sheet,
};

#[derive(Parser, Debug)]
#[command(name = "lottie-sheet", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bake a Lottie JSON file into a PNG sprite sheet.
    Bake(BakeArgs),
    /// Print animation and planned sheet details as JSON.
    Info(InfoArgs),
}

/// Parameter overrides; anything not given comes from the document's
/// stored `gd_*` keys, then from defaults.
#[derive(Parser, Debug)]
struct Overrides {
    /// Sheet scale relative to the animation's natural size.
    #[arg(long)]
    scale: Option<f64>,

    /// First sampled frame.
    #[arg(long)]
    frame_begin: Option<f64>,

    /// End of the sampled range (exclusive unless the range is empty).
    #[arg(long)]
    frame_end: Option<f64>,

    /// Number of cells.
    #[arg(long)]
    frame_count: Option<u32>,

    /// Fixed row count; `0` or less picks a near-square grid.
    #[arg(long, allow_hyphen_values = true)]
    rows: Option<i32>,

    /// Largest sheet edge in pixels (default from `LOTTIE_SHEET_MAX_DIMENSION`).
    #[arg(long)]
    max_dimension: Option<u32>,
}

#[derive(Parser, Debug)]
struct BakeArgs {
    /// Input Lottie JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    overrides: Overrides,

    /// Also write the document with the bake parameters embedded.
    #[arg(long)]
    save_artifact: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input Lottie JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[command(flatten)]
    overrides: Overrides,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Bake(args) => cmd_bake(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn read_document(path: &Path) -> anyhow::Result<AnimationDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read animation '{}'", path.display()))?;
    AnimationDocument::parse(&text).with_context(|| format!("parse '{}'", path.display()))
}

impl Overrides {
    fn params(&self, doc: &AnimationDocument) -> BakeParameters {
        let stored = artifact::read_bake_parameters(doc);
        BakeParameters {
            scale: self.scale.unwrap_or(stored.scale),
            frame_begin: self.frame_begin.unwrap_or(stored.frame_begin),
            frame_end: self.frame_end.unwrap_or(stored.frame_end),
            frame_count: self.frame_count.unwrap_or(stored.frame_count),
            rows: self.rows.unwrap_or(stored.rows),
        }
    }

    fn settings(&self) -> SheetSettings {
        let mut settings = SheetSettings::from_env();
        if let Some(max) = self.max_dimension.filter(|&n| n > 0) {
            settings.max_dimension = max;
        }
        settings
    }
}

fn cmd_bake(args: BakeArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.in_path)?;
    let params = args.overrides.params(&doc);

    let mut tex = LottieTexture::new(Box::new(CpuLottieEngine::new()), TextureRegistry::shared())
        .with_settings(args.overrides.settings());
    tex.update(doc, params)
        .with_context(|| format!("bake '{}'", args.in_path.display()))?;

    let sheet = tex
        .image()
        .context("nothing was baked (frame count is 0)")?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        sheet.as_raw(),
        sheet.width(),
        sheet.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    if let Some(path) = &args.save_artifact {
        artifact::save_artifact_file(path, &tex)?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(g) = tex.geometry() {
        eprintln!(
            "wrote {} ({}x{} cells of {}x{}, scale {})",
            args.out.display(),
            g.rows,
            g.columns,
            g.cell_width,
            g.cell_height,
            g.effective_scale
        );
    }
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.in_path)?;
    let params = args.overrides.params(&doc);
    let settings = args.overrides.settings();

    let mut engine = CpuLottieEngine::new();
    engine
        .load(&doc.engine_text()?)
        .with_context(|| format!("load '{}'", args.in_path.display()))?;

    let geometry = if params.frame_count == 0 {
        None
    } else {
        Some(plan_sheet(
            params.frame_count,
            params.rows,
            params.scale,
            engine.natural_size(),
            settings.max_dimension,
        )?)
    };

    let report = serde_json::json!({
        "natural_size": engine.natural_size(),
        "total_frame_count": engine.total_frame_count(),
        "duration": engine.duration(),
        "params": params,
        "max_dimension": settings.max_dimension,
        "geometry": geometry.map(|g| serde_json::json!({
            "rows": g.rows,
            "columns": g.columns,
            "cell_width": g.cell_width,
            "cell_height": g.cell_height,
            "sheet_width": g.sheet_width(),
            "sheet_height": g.sheet_height(),
            "effective_scale": g.effective_scale,
            "clamp": g.clamp,
        })),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
