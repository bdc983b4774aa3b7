//! Mapmark - Main entry point
//!
//! Composes the marker scene once and optionally dumps it as JSON.

mod config;

use anyhow::Result;
use clap::Parser;
use mapmark_core::{compose_scene, Scene};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "mapmark")]
#[command(about = "Compose labeled map markers into a 3D scene")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mapmark.toml")]
    config: PathBuf,

    /// Map image to use as the base surface
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write a JSON snapshot of the composed scene to this path
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Write the default configuration to --config and exit
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Mapmark v{}", env!("CARGO_PKG_VERSION"));

    if args.write_default_config {
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Wrote default configuration");
        return Ok(());
    }

    // Load configuration
    let config = config::load_config(&args.config)?;
    let mut run = config.to_run_config();

    // Override image path if specified
    if let Some(image) = args.image {
        run.image_path = image;
    }

    info!(
        image = %run.image_path.display(),
        size = run.max_size_dim,
        "Configuration loaded"
    );

    let dataset = config.load_dataset()?;

    let mut scene = Scene::new();
    let report = compose_scene(&mut scene, &run, &dataset)?;

    println!("Composed {} markers:", report.markers.len());
    for group in report.group_names() {
        println!("  - {}", group);
    }
    if report.surface.is_none() {
        println!("  (no base surface: {} not found)", run.image_path.display());
    }

    if let Some(path) = args.dump {
        let json = scene.snapshot().to_json()?;
        std::fs::write(&path, json)?;
        info!(path = %path.display(), "Wrote scene snapshot");
    }

    Ok(())
}
