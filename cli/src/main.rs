//! blinkmorse - replay, calibration and chart tooling

mod cli;
mod replay;

use anyhow::Context;
use blinkmorse_core::{
    calibrate, patterns, save_model, BlinkEvent, DecodeStatus, DenseNetwork, ModelStatus, Session,
    SessionConfig,
};
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    // --verbose enables debug-level output unless RUST_LOG says otherwise
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay {
            trace,
            config,
            profile,
            json,
        } => run_replay(&trace, config, profile, json),
        Commands::Calibrate {
            dots,
            dashes,
            out,
            network,
        } => run_calibrate(&dots, &dashes, &out, network),
        Commands::Chart => {
            run_chart();
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    SessionConfig::from_json_with_defaults(&text)
        .with_context(|| format!("bad config {}", path.display()))
}

fn run_replay(
    trace: &Path,
    config: Option<PathBuf>,
    profile: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let frames = replay::load_trace(trace)?;
    info!("replaying {} frames from {}", frames.len(), trace.display());

    let mut session = match profile {
        Some(path) => {
            let (session, status) = Session::with_profile(config, &path);
            if status == ModelStatus::Untrained {
                eprintln!("no trained model at {}, using duration threshold", path.display());
            }
            session
        }
        None => Session::new(config),
    };

    for timed in replay::replay(&mut session, &frames) {
        if json {
            println!("{}", serde_json::to_string(&timed.event)?);
            continue;
        }
        let event = &timed.event;
        if let Some(symbol) = event.symbol {
            println!("{:8.3}s  blink {}  [{}]", timed.t, symbol.as_char(), event.sequence);
        }
        match event.status {
            DecodeStatus::Decoded => {
                let ch = event.char.unwrap_or(patterns::UNDECODABLE);
                println!("{:8.3}s  letter '{ch}'  \"{}\"", timed.t, event.message);
            }
            DecodeStatus::SpaceAdded => {
                println!("{:8.3}s  space  \"{}\"", timed.t, event.message);
            }
            DecodeStatus::Waiting => {}
        }
    }

    if !json {
        println!("message: \"{}\"", session.message());
    }
    Ok(())
}

fn read_blinks(path: &Path) -> anyhow::Result<Vec<BlinkEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse blinks in {}", path.display()))
}

fn run_calibrate(
    dots: &Path,
    dashes: &Path,
    out: &Path,
    network: Option<PathBuf>,
) -> anyhow::Result<()> {
    let dots = read_blinks(dots)?;
    let dashes = read_blinks(dashes)?;

    let mut bundle = calibrate(&dots, &dashes)?;
    if let Some(path) = network {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read network {}", path.display()))?;
        let network: DenseNetwork = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse network {}", path.display()))?;
        bundle = bundle.with_network(network)?;
    }

    save_model(&bundle, out)?;
    println!(
        "profile written to {} (dot threshold {:.3}s, {})",
        out.display(),
        bundle.dot_threshold,
        if bundle.network.is_some() { "with network" } else { "threshold only" }
    );
    Ok(())
}

fn run_chart() {
    for (i, (ch, pattern)) in patterns::table().enumerate() {
        print!("{ch}  {pattern:<8}");
        if i % 4 == 3 {
            println!();
        } else {
            print!("  ");
        }
    }
    println!();
}
