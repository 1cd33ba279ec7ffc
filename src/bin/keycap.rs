// Keycap CLI
// Loads a translation file, hooks the keyboards and runs until signalled

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use keycap_core::event::{EvdevHook, EventLoop};
use keycap_core::output::UinputOutput;
use keycap_core::settings::Settings;
use keycap_core::{decode, Backend, Engine, StatusCode};

/// How often the main thread checks for signals and a stopped hook
const WATCH_INTERVAL: Duration = Duration::from_millis(200);

/// Keyboard key-translation engine
#[derive(Parser, Debug)]
#[command(name = "keycap")]
#[command(version)]
#[command(about = "Translate key chords into key, mouse and delay sequences", long_about = None)]
struct Args {
    /// Binary translation file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// settings.toml (default: ~/.config/keycap/settings.toml)
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Devices to grab, overriding [devices].only (can be used multiple times)
    #[arg(short, long, value_name = "DEVICE")]
    devices: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Decode the translation file, print its records and exit
    #[arg(long)]
    check_config: bool,

    /// List available keyboard devices
    #[arg(long)]
    list_devices: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn list_devices() -> anyhow::Result<()> {
    let devices = EventLoop::list_devices().context("Error finding keyboard devices")?;
    println!("Found {} keyboard device(s):", devices.len());
    for device in &devices {
        match &device.path {
            Some(path) => println!("  {}: {} ({})", device.index, device.name, path),
            None => println!("  {}: {}", device.index, device.name),
        }
    }
    Ok(())
}

fn check_config(path: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let records = decode(bytes).with_context(|| format!("Invalid translation file {}", path.display()))?;
    println!(
        "{}: {} record(s), {} bytes",
        path.display(),
        records.len(),
        records.byte_len()
    );
    for record in records.iter() {
        println!("  {}", record);
    }
    Ok(())
}

/// Device filter precedence: CLI --devices > settings [devices].only > autodetect
fn device_filter(args: &Args, settings: &Settings) -> Vec<String> {
    if args.devices.is_empty() {
        settings.devices().to_vec()
    } else {
        args.devices.clone()
    }
}

fn run(args: &Args, config_path: &Path) -> anyhow::Result<StatusCode> {
    let settings = Settings::load(args.settings.as_deref()).context("Failed to load settings")?;

    let output = Arc::new(
        UinputOutput::new()
            .context("Failed to create virtual output device")?
            .with_throttle_delays(settings.key_pre_delay_ms(), settings.key_post_delay_ms()),
    );
    let hook = Arc::new(
        EvdevHook::new(Arc::clone(&output))
            .with_devices(device_filter(args, &settings))
            .with_eject_key(settings.emergency_eject_key()),
    );
    let engine = Engine::new(
        Backend::new(hook, output.clone(), output),
        settings.engine_options(),
    );
    log::debug!("synthesis mode: {:?}", engine.synthesis_mode());

    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("Failed to install signal handlers")?;

    let status = engine.load(config_path);
    if !status.is_success() {
        eprintln!("Failed to load {}: {}", config_path.display(), status);
        return Ok(status);
    }
    println!(
        "keycap is running with {} record(s). Press Ctrl+C to exit.",
        engine.active_records()
    );

    'watch: loop {
        for signal in signals.pending() {
            match signal {
                SIGHUP => {
                    let status = engine.load(config_path);
                    if !status.is_success() {
                        eprintln!("Reload of {} failed: {}", config_path.display(), status);
                        return Ok(status);
                    }
                    log::info!("Reloaded {} record(s)", engine.active_records());
                }
                _ => {
                    println!("\nReceived signal, shutting down gracefully...");
                    break 'watch;
                }
            }
        }

        if engine.reap_stopped_hook() {
            println!("Keyboards released, exiting.");
            break;
        }
        thread::sleep(WATCH_INTERVAL);
    }

    engine.shutdown();
    Ok(StatusCode::Success)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list_devices {
        return list_devices();
    }

    let config_path = args
        .config
        .clone()
        .ok_or_else(|| anyhow!("--config is required when not using --list-devices"))?;

    if args.check_config {
        return check_config(&config_path);
    }

    let status = run(&args, &config_path)?;
    if !status.is_success() {
        std::process::exit(status.code());
    }
    Ok(())
}
