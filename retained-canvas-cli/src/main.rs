use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use retained_canvas::{Canvas, CanvasConfig, Color, RasterSurface, Surface, TextEngine};

mod scene;

use scene::{Scene, BUILTIN_SCENES};

/// retained-canvas: render canvas scenes to PNG
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a built-in scene or a scene file to PNG
    Render(RenderArgs),
    /// List the built-in scenes
    ListScenes,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Built-in scene name or path to a scene file
    #[arg(short, long)]
    scene: String,

    /// Path to output PNG file to be created
    #[arg(short, long)]
    output: PathBuf,

    /// Output width in pixels
    #[arg(long, default_value_t = 200)]
    width: u32,

    /// Output height in pixels
    #[arg(long, default_value_t = 200)]
    height: u32,

    /// CSS color painted before the scene
    #[arg(short, long, default_value = "transparent")]
    background: String,

    /// Pixels per inch recorded in the PNG header
    #[arg(long)]
    ppi: Option<f32>,

    /// Text shaping engine
    #[arg(long, value_enum, default_value_t = TextMode::Shaped)]
    text: TextMode,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TextMode {
    /// Shape and draw glyphs with the installed system fonts
    Shaped,
    /// Measure only; glyphs are not drawn
    Approximate,
}

impl From<TextMode> for TextEngine {
    fn from(mode: TextMode) -> Self {
        match mode {
            TextMode::Shaped => TextEngine::CosmicText,
            TextMode::Approximate => TextEngine::Approximate,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render(args) => render(args),
        Commands::ListScenes => {
            for (name, description, _) in BUILTIN_SCENES {
                println!("{name:<8} {description}");
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn render(args: RenderArgs) -> Result<()> {
    let scene = Scene::load(&args.scene)?;
    let background = Color::parse(&args.background)
        .with_context(|| format!("invalid background color {:?}", args.background))?;

    let raster = Arc::new(
        RasterSurface::new(args.width, args.height).context("failed to create output surface")?,
    );
    let surface: Arc<dyn Surface> = raster.clone();

    let config = CanvasConfig::default().with_text_engine(args.text.into());
    let mut canvas = Canvas::with_config(config);
    canvas.set_surface(Some(surface));

    canvas.clear(background)?;
    let viewport = scene.viewport();
    canvas.scale(
        f64::from(args.width) / viewport.width,
        f64::from(args.height) / viewport.height,
    );
    log::info!(
        "rendering {} ({} commands) at {}x{}",
        args.scene,
        scene.commands().len(),
        args.width,
        args.height
    );
    scene
        .draw(&mut canvas)
        .with_context(|| format!("failed to draw scene {}", args.scene))?;
    // Scripts may leave saves open; composite their layers before the frame ends.
    canvas.restore_to_count(0);
    canvas.finish().context("failed to finish rendering")?;
    if !canvas.is_valid() {
        bail!("rendering surface rejected a draw call; see the log for details");
    }

    let png_data = raster.to_png(args.ppi).context("failed to encode PNG")?;
    fs::write(&args.output, png_data)
        .with_context(|| format!("failed to write output file {}", args.output.display()))?;
    log::info!("wrote {}", args.output.display());
    Ok(())
}
