//! `lumen` - render a demo scene to a bitmap.

mod scene;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use lumen_math::Vec3;
use lumen_renderer::{render, save_image, RenderSettings};

use crate::scene::{build_scene, SceneKind};

/// Offline Monte Carlo path tracer.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene to render
    #[arg(long, value_enum, default_value_t = SceneKind::Spheres)]
    scene: SceneKind,

    /// JSON settings file; replaces the scene's default camera
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output image (.bmp or .png)
    #[arg(short, long, default_value = "image.bmp")]
    output: PathBuf,

    /// Image width in pixels
    #[arg(short, long)]
    width: Option<u32>,

    /// Width over height
    #[arg(long)]
    aspect_ratio: Option<f32>,

    /// Samples per pixel
    #[arg(short, long)]
    samples: Option<u32>,

    /// Maximum ray bounces
    #[arg(long)]
    max_depth: Option<u32>,

    /// Vertical field of view in degrees
    #[arg(long)]
    vfov: Option<f32>,

    /// Camera position as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    look_from: Option<Vec3>,

    /// Point the camera looks at, as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    look_at: Option<Vec3>,

    /// Camera up direction as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    up: Option<Vec3>,

    /// Defocus blur cone angle in degrees (0 disables depth of field)
    #[arg(long)]
    defocus_angle: Option<f32>,

    /// Distance to the plane of perfect focus
    #[arg(long)]
    focus_dist: Option<f32>,

    /// Number of parallel row sections (defaults to hardware parallelism)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Seed for sampling and scene layout
    #[arg(long)]
    seed: Option<u64>,

    /// Log per-row progress
    #[arg(short, long)]
    verbose: bool,
}

/// Parse `x,y,z` into a vector.
fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts = s
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid vector `{s}`: {e}"))?;

    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("expected three comma-separated numbers, got `{s}`")),
    }
}

fn load_settings(path: &Path) -> Result<RenderSettings> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open settings file {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse settings file {}", path.display()))
}

/// Combine the scene defaults, the settings file and command-line overrides.
fn resolve_settings(args: &Args) -> Result<RenderSettings> {
    let mut settings = match &args.config {
        Some(path) => load_settings(path)?,
        None => RenderSettings {
            camera: args.scene.default_camera(),
            ..Default::default()
        },
    };

    let camera = &mut settings.camera;
    if let Some(width) = args.width {
        camera.image_width = width;
    }
    if let Some(aspect_ratio) = args.aspect_ratio {
        camera.aspect_ratio = aspect_ratio;
    }
    if let Some(samples) = args.samples {
        camera.samples_per_pixel = samples;
    }
    if let Some(max_depth) = args.max_depth {
        camera.max_depth = max_depth;
    }
    if let Some(vfov) = args.vfov {
        camera.vfov = vfov;
    }
    if let Some(look_from) = args.look_from {
        camera.look_from = look_from;
    }
    if let Some(look_at) = args.look_at {
        camera.look_at = look_at;
    }
    if let Some(up) = args.up {
        camera.vup = up;
    }
    if let Some(defocus_angle) = args.defocus_angle {
        camera.defocus_angle = defocus_angle;
    }
    if let Some(focus_dist) = args.focus_dist {
        camera.focus_dist = focus_dist;
    }

    if args.threads.is_some() {
        settings.render.threads = args.threads;
    }
    if args.seed.is_some() {
        settings.render.seed = args.seed;
    }

    Ok(settings)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    log::info!("Starting Lumen");

    let mut settings = resolve_settings(&args)?;
    // Pin the seed so the scene layout and the render share it
    let seed = *settings.render.seed.get_or_insert_with(rand::random);

    let camera = settings
        .camera
        .build()
        .context("Invalid camera settings")?;

    let world = build_scene(args.scene, seed);
    log::info!("Scene {:?} has {} objects", args.scene, world.len());

    let start = Instant::now();
    let image = render(&camera, &world, &settings.render).context("Render failed")?;
    log::info!("Elapsed time: {:.3}s", start.elapsed().as_secs_f64());

    save_image(&args.output, &image)
        .with_context(|| format!("Failed to save image to {}", args.output.display()))?;

    Ok(())
}
