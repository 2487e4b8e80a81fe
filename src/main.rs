use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use vehicle_sim::api;
use vehicle_sim::simulation::{Simulation, SimulationConfig};

#[derive(Parser)]
#[command(name = "vehicle_sim")]
#[command(about = "Single-vehicle lane simulation with start/stop control")]
struct Cli {
    /// Read control commands from stdin instead of running a fixed session
    #[arg(long)]
    interactive: bool,

    /// Number of ticks to drive for in headless mode
    #[arg(long, default_value = "10")]
    ticks: u32,

    /// Milliseconds between ticks
    #[arg(long, default_value = "1000")]
    tick_ms: u64,

    /// Seed for obstacle detection, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn config(&self) -> SimulationConfig {
        let config = SimulationConfig::with_tick_interval(Duration::from_millis(self.tick_ms));
        match self.seed {
            Some(seed) => config.seed(seed),
            None => config,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,vehicle_sim=info"),
    )
    .init();

    let cli = Cli::parse();
    let mut sim = Simulation::new(cli.config());
    sim.spawn_loop().context("Failed to start simulation loop")?;

    let session = if cli.interactive {
        run_interactive(&sim)
    } else {
        run_headless(&sim, cli.ticks)
    };

    // Shut the loop down even if the session failed
    let report = sim.shutdown().context("Simulation shutdown failed")?;
    session?;

    println!(
        "Loop ran {} ticks ({} failed, {} lane changes)",
        report.ticks_run, report.ticks_failed, report.lane_changes
    );
    Ok(())
}

/// Drive for a fixed number of ticks, printing the status after each one
fn run_headless(sim: &Simulation, ticks: u32) -> Result<()> {
    let interval = sim.config().tick_interval;
    info!("Running headless for {} ticks, interval {:?}", ticks, interval);

    print_response(api::CONTROL_PATH, &api::control(sim.control(), r#"{"command": "start"}"#))?;

    for tick in 1..=ticks {
        std::thread::sleep(interval);
        println!("--- After tick {} ---", tick);
        print_response(api::STATUS_PATH, &api::status(sim.control()))?;
    }

    print_response(api::CONTROL_PATH, &api::control(sim.control(), r#"{"command": "stop"}"#))?;
    // Let one tick settle the stopped state
    std::thread::sleep(interval);

    println!("=== Final State ===");
    print_response(api::STATUS_PATH, &api::status(sim.control()))
}

/// Line-oriented control: `status`, `quit`/`exit`, or a control command
fn run_interactive(sim: &Simulation) -> Result<()> {
    println!("Commands: start, stop, status, quit");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "status" => print_response(api::STATUS_PATH, &api::status(sim.control()))?,
            command => {
                let body = serde_json::json!({ "command": command }).to_string();
                print_response(api::CONTROL_PATH, &api::control(sim.control(), &body))?;
            }
        }
    }
    Ok(())
}

fn print_response(path: &str, response: &api::ApiResponse) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{} {} {}", path, response.status_code, response.body)?;
    out.flush()?;
    Ok(())
}
