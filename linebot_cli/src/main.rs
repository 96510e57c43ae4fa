#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Line follower CLI: runs the simulated robot, fits calibrations, and
//! downloads telemetry.

mod cli;
mod dump;
mod logging;
mod sim;

use clap::Parser;
use cli::{Cli, Commands, JSON_MODE};
use eyre::WrapErr;
use linebot_core::runner::run_session;
use linebot_core::sampler::MotionSampler;
use linebot_core::buffer::SharedSampleBuffer;
use linebot_hardware::{LoopbackTransport, SimulatedMotor};
use linebot_traits::DriveMotor;
use linebot_traits::clock::MonotonicClock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);

    let cfg = load_config(&args.config)?;
    logging::init(&args.log_level, &cfg.logging)?;

    match args.cmd {
        Commands::Run { episodes } => run(&cfg, episodes, args.json),
        Commands::SelfCheck => self_check(&cfg, args.json),
        Commands::Calibrate { csv } => calibrate(&csv, args.json),
        Commands::Dump { record_ms } => dump(&cfg, record_ms),
    }
}

fn load_config(path: &std::path::Path) -> eyre::Result<linebot_config::Config> {
    let cfg = if path.exists() {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading config {}", path.display()))?;
        linebot_config::load_toml(&text)
            .wrap_err_with(|| format!("parsing config {}", path.display()))?
    } else {
        linebot_config::Config::default()
    };
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

fn run(cfg: &linebot_config::Config, episodes: Option<u32>, json: bool) -> eyre::Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::SeqCst);
        })
        .wrap_err("installing Ctrl-C handler")?;
    }

    let (mut supervisor, odometer) = sim::build_rig(cfg)?;
    // The client side stays alive so the in-process server has a peer; a
    // serial or BT transport takes its place on the real robot.
    let (server_side, _client) = LoopbackTransport::pair();

    let done = AtomicU32::new(0);
    let buffer = run_session(&mut supervisor, odometer, server_side, &cfg.telemetry, || {
        if shutdown.load(Ordering::SeqCst) {
            return true;
        }
        match episodes {
            Some(n) => done.fetch_add(1, Ordering::SeqCst) >= n,
            None => false,
        }
    })?;

    let state = supervisor.state().label();
    let samples = buffer.count();
    if json {
        let line = serde_json::json!({ "state": state, "samples": samples });
        println!("{line}");
    } else {
        println!("run finished in state {state} with {samples} samples recorded");
    }
    Ok(())
}

fn self_check(cfg: &linebot_config::Config, json: bool) -> eyre::Result<()> {
    // Assembling the rig exercises config mapping and builder validation.
    let (supervisor, _odometer) = sim::build_rig(cfg)?;
    drop(supervisor);
    if json {
        println!("{}", serde_json::json!({ "status": "ok" }));
    } else {
        println!("self-check: OK");
    }
    Ok(())
}

fn calibrate(csv: &std::path::Path, json: bool) -> eyre::Result<()> {
    let rows = linebot_config::read_surface_csv(csv)?;
    let fitted = linebot_config::Thresholds::from_rows(&rows)?;
    tracing::info!(low = fitted.low, high = fitted.high, "thresholds fitted");
    if json {
        let line = serde_json::json!({ "low": fitted.low, "high": fitted.high });
        println!("{line}");
    } else {
        println!(
            "fitted thresholds: black below {}, white above {}",
            fitted.low, fitted.high
        );
    }
    Ok(())
}

fn dump(cfg: &linebot_config::Config, record_ms: u64) -> eyre::Result<()> {
    // Drive the simulated motors at a fixed duty so the recorded odometry
    // is non-trivial.
    let mut left = SimulatedMotor::new("left");
    let mut right = SimulatedMotor::new("right");
    left.set_pwm(60).map_err(|e| eyre::eyre!("sim motor: {e}"))?;
    right.set_pwm(40).map_err(|e| eyre::eyre!("sim motor: {e}"))?;
    let odometer = linebot_hardware::SimulatedOdometer::attached(left.handle(), right.handle());

    let buffer = SharedSampleBuffer::new(cfg.telemetry.capacity);
    let sampler = MotionSampler::spawn(
        odometer,
        buffer.clone(),
        cfg.telemetry.sampler_hz,
        MonotonicClock::new(),
    );
    std::thread::sleep(Duration::from_millis(record_ms));
    drop(sampler);

    let printed = dump::download_and_print(
        &buffer,
        Duration::from_millis(cfg.telemetry.recv_timeout_ms),
    )?;
    tracing::info!(printed, "telemetry dump complete");
    Ok(())
}
