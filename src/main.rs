//! Code City - isometric code visualization
//!
//! CLI commands:
//! - gui: Launch the native viewer
//! - serve: Start HTTP server
//! - render: Write the city as an SVG file
//! - stats: Print dataset statistics
//! - extract: Scan a source tree into a city JSON snapshot

mod color;
mod config;
mod extract;
mod gui;
mod interaction;
mod layout;
mod loader;
mod logging;
mod model;
mod panels;
mod projection;
mod render;
mod server;
mod session;
mod svg;
mod view;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::layout::LayoutStrategy;
use crate::loader::DataSource;

/// Local snapshot used when no source is given or the configured one fails
const DEFAULT_DATA_FILE: &str = "city-data.json";

#[derive(Parser)]
#[command(name = "code_city")]
#[command(about = "Isometric city view of a codebase, colored by git activity")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to code_city.yaml config
    #[arg(short, long, global = true, default_value = "code_city.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch native GUI viewer
    Gui {
        /// URL or path of the city JSON
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (defaults to PORT or 8080)
        #[arg(short, long)]
        port: Option<u16>,

        /// URL or path of the city JSON
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Render the city to an SVG file
    Render(RenderArgs),

    /// Print statistics for a city JSON
    Stats {
        #[arg(short, long, default_value = DEFAULT_DATA_FILE)]
        input: PathBuf,
    },

    /// Scan a source tree and write the city JSON
    Extract {
        /// Root of the source tree
        dir: PathBuf,

        #[arg(short, long, default_value = DEFAULT_DATA_FILE)]
        output: PathBuf,

        /// Skip git history
        #[arg(long)]
        no_git: bool,
    },
}

#[derive(Args)]
struct RenderArgs {
    #[arg(short, long, default_value = DEFAULT_DATA_FILE)]
    input: PathBuf,

    #[arg(short, long, default_value = "city.svg")]
    output: PathBuf,

    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    #[arg(long, default_value_t = 800.0)]
    height: f64,

    /// quadrant or grid (defaults to the config)
    #[arg(short, long)]
    strategy: Option<LayoutStrategy>,

    #[arg(long)]
    no_frequency: bool,

    #[arg(long)]
    no_age: bool,

    #[arg(long)]
    no_glow: bool,

    #[arg(long)]
    color_blind: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = config::Settings::load();

    // Initialize logging first
    logging::init_logging(&settings.log_dir)?;
    tracing::info!("Code City starting up");

    let cli = Cli::parse();
    tracing::debug!("CLI args parsed: config={:?}", cli.config);

    let config = if cli.config.exists() {
        tracing::info!("Loading config from {:?}", cli.config);
        config::Config::load(&cli.config)?
    } else {
        tracing::warn!("Config file not found: {:?}, using defaults", cli.config);
        config::Config::default()
    };

    match cli.command {
        Commands::Gui { data } => {
            let source = data_source(data, &settings);
            let initial = loader::load_with_fallback(&source, fallback_for(&source)).await;
            tracing::info!("Launching native GUI viewer");
            gui::run_viewer(config, initial)?;
        }

        Commands::Serve { port, data } => {
            let source = data_source(data, &settings);
            let (city, _) = loader::load_with_fallback(&source, fallback_for(&source))
                .await
                .with_context(|| format!("loading {}", source))?;
            let state = server::AppState::new(city, config);
            server::serve(state, port.unwrap_or(settings.port), &settings.web_dir).await?;
        }

        Commands::Render(args) => {
            render_svg(config, &args)?;
        }

        Commands::Stats { input } => {
            print_stats(&config, &input)?;
        }

        Commands::Extract { dir, output, no_git } => {
            extract_city(&dir, &output, no_git)?;
        }
    }

    Ok(())
}

/// CLI flag, then CITY_DATA, then the local default file
fn data_source(arg: Option<String>, settings: &config::Settings) -> DataSource {
    let raw = arg
        .or_else(|| settings.data.clone())
        .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string());
    match raw.parse() {
        Ok(source) => source,
        Err(never) => match never {},
    }
}

fn fallback_for(source: &DataSource) -> Option<&'static Path> {
    let default = Path::new(DEFAULT_DATA_FILE);
    match source {
        DataSource::File(path) if path == default => None,
        _ => Some(default),
    }
}

fn render_svg(config: config::Config, args: &RenderArgs) -> anyhow::Result<()> {
    let data = loader::read_file(&args.input)?;

    let mut session = session::Session::new(config);
    if let Some(strategy) = args.strategy {
        session.set_strategy(strategy);
    }
    let mut options = session.options();
    options.colors.frequency = !args.no_frequency;
    options.colors.age = !args.no_age;
    options.colors.color_blind = args.color_blind;
    options.glow = !args.no_glow;
    session.set_options(options);

    let canvas = view::CanvasSize::new(args.width, args.height);
    session.resize(canvas);
    session.load(data);

    let svg = svg::to_svg(session.render(), canvas);
    std::fs::write(&args.output, svg).with_context(|| format!("writing {:?}", args.output))?;
    println!(
        "Rendered {} buildings ({}) to {:?}",
        session.layout().building_count(),
        session.strategy(),
        args.output
    );
    Ok(())
}

fn print_stats(config: &config::Config, input: &Path) -> anyhow::Result<()> {
    let data = loader::read_file(input)?;
    let stats = panels::CityStats::compute(&data, config.render.recent_days, chrono::Utc::now());

    println!("City statistics for {:?}:", input);
    println!();
    for line in stats.lines() {
        println!("  {}", line);
    }
    Ok(())
}

fn extract_city(dir: &Path, output: &Path, no_git: bool) -> anyhow::Result<()> {
    println!("Scanning {:?}...", dir);
    let options = extract::ExtractOptions { git: !no_git };
    let data = extract::extract(dir, &options)?;

    std::fs::write(output, data.to_json_pretty()?).with_context(|| format!("writing {:?}", output))?;
    println!(
        "Wrote {} classes in {} packages ({} lines) to {:?}",
        data.class_count(),
        data.packages.len(),
        data.total_loc(),
        output
    );
    Ok(())
}
