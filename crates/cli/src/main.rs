#![deny(unsafe_code)]
//! Headless CLI for the wind sandbox.
//!
//! Subcommands:
//! - `run` - simulate N frames over procedural terrain, write a PNG and
//!   print the last HUD readout
//! - `list` - print the wind layers and camera presets
//! - `config` - print the default configuration or its schema

mod error;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use error::CliError;
use serde_json::{json, Value};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;
use wind_sandbox_core::glam::DVec2;
use wind_sandbox_core::layers::DOMAIN;
use wind_sandbox_core::{
    CameraPreset, Canvas, HeadlessCamera, LayerId, LayeredWindModel, ProceduralTerrain,
    RenderLoop, Rgb, SimConfig,
};
use wind_sandbox_snapshot::snapshot::write_png;

#[derive(Parser)]
#[command(name = "wind-sandbox", version, about = "Layered wind and balloon sandbox")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Logging verbosity: trace, debug, info, warn or error.
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate frames and write a PNG snapshot of the overlay.
    Run {
        /// Canvas width in pixels.
        #[arg(short = 'W', long, default_value_t = 960)]
        width: usize,

        /// Canvas height in pixels.
        #[arg(short = 'H', long, default_value_t = 640)]
        height: usize,

        /// Number of frames to simulate.
        #[arg(short, long, default_value_t = 300)]
        frames: u64,

        /// Seed override for wind jitter and particles.
        #[arg(long)]
        seed: Option<u64>,

        /// Seed for the procedural terrain.
        #[arg(long, default_value_t = 7)]
        terrain_seed: u32,

        /// Config file (JSON object of SimConfig keys).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Config overrides as a JSON string, applied on top of --config.
        #[arg(long, default_value = "{}")]
        params: String,

        /// Spawn the balloon at "LNG,LAT".
        #[arg(long)]
        spawn: Option<String>,

        /// Keep the burner on for the first N frames.
        #[arg(long, default_value_t = 0)]
        burn_frames: u64,

        /// Follow the balloon with the chase camera.
        #[arg(long)]
        chase: bool,

        /// Camera preset to fly to at start.
        #[arg(short, long)]
        preset: Option<String>,

        /// Layer to hide (repeatable).
        #[arg(long = "hide")]
        hidden: Vec<String>,

        /// Background color as #rrggbb.
        #[arg(long, default_value = "#0b1020")]
        background: String,

        /// Keep the overlay transparent instead of filling the background.
        #[arg(long)]
        transparent: bool,

        /// Output file path.
        #[arg(short, long, default_value = "wind.png")]
        output: PathBuf,
    },
    /// List wind layers and camera presets.
    List,
    /// Print the default configuration.
    Config {
        /// Print the parameter schema instead.
        #[arg(long)]
        schema: bool,
    },
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

fn init_logging(level: &str) -> Result<(), CliError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::Io(format!("logger setup failed: {e}")))
}

fn parse_spawn(spec: &str) -> Result<(f64, f64), CliError> {
    let bad = || CliError::Input(format!("invalid --spawn '{spec}', expected LNG,LAT"));
    let (lng, lat) = spec.split_once(',').ok_or_else(bad)?;
    let lng: f64 = lng.trim().parse().map_err(|_| bad())?;
    let lat: f64 = lat.trim().parse().map_err(|_| bad())?;
    if !(lng.is_finite() && lat.is_finite()) {
        return Err(bad());
    }
    Ok((lng, lat))
}

/// Merges the config file (if any) with inline overrides into a `SimConfig`.
fn load_config(path: Option<&Path>, params: &str, seed: Option<u64>) -> Result<SimConfig, CliError> {
    let mut merged = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
            serde_json::from_str::<Value>(&text)
                .map_err(|e| CliError::Input(format!("invalid config file: {e}")))?
        }
        None => json!({}),
    };
    let overrides: Value = serde_json::from_str(params)
        .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
    let (Some(base), Some(extra)) = (merged.as_object_mut(), overrides.as_object()) else {
        return Err(CliError::Input("config must be a JSON object".into()));
    };
    base.extend(extra.clone());
    if let Some(seed) = seed {
        base.insert("seed".into(), json!(seed));
    }
    Ok(SimConfig::from_json(&merged))
}

fn list(json_mode: bool) -> Result<(), CliError> {
    let model = LayeredWindModel::new(SimConfig::default().seed)?;
    let layers: Vec<Value> = model
        .layers()
        .iter()
        .map(|l| {
            json!({
                "id": l.id,
                "altitude_ft": l.altitude_ft,
                "color": l.color,
                "ratio": l.ratio,
                "max_speed": l.field.max_magnitude(),
            })
        })
        .collect();
    let presets = CameraPreset::names();
    if json_mode {
        let info = json!({ "layers": layers, "presets": presets });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("Layers:");
        for l in model.layers() {
            println!(
                "  {:<8} {:>6} ft  {}  {:>3.0}%",
                l.id,
                l.altitude_ft,
                l.color.to_hex(),
                l.ratio * 100.0
            );
        }
        println!("Presets:");
        println!("  {}", presets.join(", "));
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => list(cli.json)?,
        Command::Config { schema } => {
            let value = if schema {
                SimConfig::param_schema()
            } else {
                serde_json::to_value(SimConfig::default())?
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Command::Run {
            width,
            height,
            frames,
            seed,
            terrain_seed,
            config,
            params,
            spawn,
            burn_frames,
            chase,
            preset,
            hidden,
            background,
            transparent,
            output,
        } => {
            let config = load_config(config.as_deref(), &params, seed)?;
            let background = Rgb::from_hex(&background)?;
            let spawn = spawn.as_deref().map(parse_spawn).transpose()?;
            let exaggeration = config.exaggeration;

            let mut sim = RenderLoop::new(config)?;
            for name in &hidden {
                sim.set_layer_active(name.parse::<LayerId>()?, false);
            }

            let terrain = ProceduralTerrain::new(terrain_seed);
            let start = CameraPreset::find("overview")?.target;
            let viewport = DVec2::new(width as f64, height as f64);
            let mut camera = HeadlessCamera::new(start, viewport, exaggeration, &terrain);
            let mut canvas = Canvas::new(width, height)?;

            if let Some(name) = &preset {
                sim.apply_preset(&mut camera, name)?;
            }
            if let Some((lng, lat)) = spawn {
                if !DOMAIN.contains(lng, lat) {
                    return Err(CliError::Input(format!(
                        "spawn point ({lng}, {lat}) is outside the wind domain"
                    )));
                }
                sim.spawn_balloon(lng, lat, &terrain);
            }
            sim.set_chase(chase);

            info!(frames, width, height, particles = sim.particles().len(), "simulating");
            let mut hud = None;
            for i in 0..frames {
                sim.set_burner(i < burn_frames);
                hud = Some(sim.frame(&mut camera, &terrain, &mut canvas));
                camera.advance();
            }
            debug!(repaints = camera.repaint_requests(), "simulation finished");

            write_png(&canvas, (!transparent).then_some(background), &output)?;

            if cli.json {
                let info = json!({
                    "frames": frames,
                    "width": width,
                    "height": height,
                    "seed": sim.config().seed,
                    "output": output.display().to_string(),
                    "hud": hud,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "simulated {frames} frames ({width}x{height}, {} particles) -> {}",
                    sim.particles().len(),
                    output.display()
                );
                if let Some(b) = hud.as_ref().and_then(|h| h.balloon.as_ref()) {
                    eprintln!(
                        "balloon at ({:.4}, {:.4}), {:.0} ft ({:.0} ft AGL), wind {:.5} deg/tick toward {:.0} deg",
                        b.lng, b.lat, b.altitude_ft, b.agl_ft, b.wind_speed, b.wind_heading_deg
                    );
                }
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;
    let result = init_logging(&cli.log_level).and_then(|()| run(cli));
    if let Err(e) = result {
        if json_mode {
            let j = json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
