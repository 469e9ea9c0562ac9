use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use canvasmark::{
    AnnotationClass, AnnotationData, AnnotationId, Editor, EditorConfig, FrameIndex, ImageSize,
    ItemInfo, MergePolygons, StageAnnotationPayload, SubtractPolygons, ViewServices,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "canvasmark", version)]
struct Cli {
    /// Editor config JSON; `CANVASMARK_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a stage file.
    Inspect(InspectArgs),
    /// Print the geometry of every annotation at a frame as JSON.
    Infer(FrameArgs),
    /// Rasterize the annotations at a frame to a PNG.
    Render(RenderArgs),
    /// Merge or subtract two polygons and print the resulting rings.
    Boolean(BooleanArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input stage JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input stage JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based); ignored for still images.
    #[arg(long, default_value_t = 0)]
    frame: u64,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    at: FrameArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct BooleanArgs {
    /// Input stage JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Operation to run.
    #[arg(long, value_enum)]
    op: BooleanChoice,

    /// Polygon that receives the result.
    #[arg(long)]
    target: String,

    /// Polygon merged into or cut by the target.
    #[arg(long)]
    other: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BooleanChoice {
    Merge,
    Subtract,
}

/// One item with its classes and stage annotations.
#[derive(Debug, serde::Deserialize)]
struct StageFile {
    width: u32,
    height: u32,
    /// Present for videos.
    #[serde(default)]
    frame_count: Option<u64>,
    #[serde(default)]
    classes: Vec<AnnotationClass>,
    annotations: Vec<StageAnnotationPayload>,
}

impl StageFile {
    fn item(&self) -> ItemInfo {
        let size = ImageSize::new(self.width, self.height);
        match self.frame_count {
            Some(frames) => ItemInfo::video("stage", size, frames, None),
            None => ItemInfo::image("stage", size),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(&config, args),
        Command::Infer(args) => cmd_infer(&config, args),
        Command::Render(args) => cmd_render(&config, args),
        Command::Boolean(args) => cmd_boolean(&config, args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EditorConfig> {
    let base = match path {
        Some(path) => {
            let s = std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            EditorConfig::from_json_str(&s).with_context(|| "parse config JSON")?
        }
        None => EditorConfig::default(),
    };
    base.with_env_overrides()
        .with_context(|| "apply CANVASMARK_* overrides")
}

fn read_stage_json(path: &Path) -> anyhow::Result<StageFile> {
    let f = File::open(path).with_context(|| format!("open stage file '{}'", path.display()))?;
    let r = BufReader::new(f);
    let stage: StageFile = serde_json::from_reader(r).with_context(|| "parse stage JSON")?;
    anyhow::ensure!(
        stage.width > 0 && stage.height > 0,
        "stage item must have a non-zero size"
    );
    Ok(stage)
}

/// Editor with every built-in plugin, one canvas the size of the item, and the stage loaded at
/// `frame`.
fn open_stage(config: &EditorConfig, stage: &StageFile, frame: u64) -> anyhow::Result<Editor> {
    let mut editor = Editor::new(config.clone(), ViewServices::in_memory())?;
    editor.add_view(f64::from(stage.width), f64::from(stage.height));
    editor.install_all_plugins()?;
    let serializers = editor.registry().serializers.clone();
    let view = editor
        .active_view_mut()
        .context("editor has no view")?;
    view.set_classes(stage.classes.iter().cloned());
    editor.set_item(stage.item())?;
    pollster::block_on(editor.run_pending());

    let view = editor
        .active_view_mut()
        .context("editor has no view")?;
    let loaded = view.load_annotations(&stage.annotations, &serializers);
    if loaded < stage.annotations.len() {
        tracing::warn!(
            skipped = stage.annotations.len() - loaded,
            "some annotations could not be decoded"
        );
    }
    if stage.frame_count.is_some() {
        editor.jump_to_frame(FrameIndex(frame))?;
    }
    pollster::block_on(editor.run_pending());
    Ok(editor)
}

fn cmd_inspect(config: &EditorConfig, args: InspectArgs) -> anyhow::Result<()> {
    let stage = read_stage_json(&args.in_path)?;
    let editor = open_stage(config, &stage, 0)?;
    let view = editor.active_view().context("editor has no view")?;

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    let mut videos = 0;
    let mut keyframes = 0;
    for a in view.annotations().annotations() {
        *by_type.entry(a.annotation_type.as_str()).or_default() += 1;
        if let Some(track) = a.video() {
            videos += 1;
            keyframes += track.frames.values().filter(|k| k.keyframe).count();
        }
    }

    println!(
        "item: {}x{}{}",
        stage.width,
        stage.height,
        stage
            .frame_count
            .map(|n| format!(", {n} frames"))
            .unwrap_or_default()
    );
    println!("classes: {}", stage.classes.len());
    println!(
        "annotations: {} decoded of {}",
        view.annotations().len(),
        stage.annotations.len()
    );
    for (ty, n) in &by_type {
        println!("  {ty}: {n}");
    }
    if videos > 0 {
        println!("video tracks: {videos} ({keyframes} keyframes)");
    }
    Ok(())
}

fn cmd_infer(config: &EditorConfig, args: FrameArgs) -> anyhow::Result<()> {
    let stage = read_stage_json(&args.in_path)?;
    let editor = open_stage(config, &stage, args.frame)?;
    let view = editor.active_view().context("editor has no view")?;
    let frame = view.frame();

    let mut out = Vec::new();
    for a in view.annotations().annotations() {
        let Some(data) = view.annotations().data_at(a, frame) else {
            continue;
        };
        out.push(serde_json::json!({
            "id": a.id,
            "type": a.annotation_type,
            "class_id": a.class_id,
            "z_index": a.z_index,
            "data": data.as_ref(),
        }));
    }
    let doc = serde_json::json!({ "frame": frame.0, "annotations": out });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn cmd_render(config: &EditorConfig, args: RenderArgs) -> anyhow::Result<()> {
    let stage = read_stage_json(&args.at.in_path)?;
    let mut editor = open_stage(config, &stage, args.at.frame)?;
    let frame = editor
        .redraw()?
        .context("nothing to redraw after loading the stage")?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_boolean(config: &EditorConfig, args: BooleanArgs) -> anyhow::Result<()> {
    let stage = read_stage_json(&args.in_path)?;
    let editor = open_stage(config, &stage, 0)?;
    let view = editor.active_view().context("editor has no view")?;
    let find = |id: &str| {
        view.annotations()
            .get(&AnnotationId::from(id))
            .with_context(|| format!("no annotation '{id}' in stage"))
    };
    let (target, other) = (find(&args.target)?, find(&args.other)?);

    let result = match args.op {
        BooleanChoice::Merge => Some(MergePolygons::new(target, other)?.merged().clone()),
        BooleanChoice::Subtract => SubtractPolygons::new(target, other)?.result().cloned(),
    };
    let rings = match result.as_ref().and_then(|a| a.static_data()) {
        Some(AnnotationData::Polygon(p)) => p.rings(),
        _ => Vec::new(),
    };
    if rings.is_empty() {
        eprintln!("result is empty");
    }
    println!("{}", serde_json::to_string_pretty(&rings)?);
    Ok(())
}
