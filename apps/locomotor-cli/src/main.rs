use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use locomotor_kernel::{Sample, Scenario, Simulation};
use locomotor_motor::{MotorConfig, MotorEvent};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "locomotor-cli", about = "Run character locomotion scenarios")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default tuning summary
    Info,
    /// Print the default configuration as YAML
    Defaults {
        /// Print a complete default scenario instead of just the motor config
        #[arg(long)]
        scenario: bool,
    },
    /// Load a scenario and report problems without running it
    Validate {
        /// Scenario YAML file
        path: PathBuf,
    },
    /// Run a scenario and summarize the result
    Run {
        /// Scenario YAML file
        path: PathBuf,
        /// Emit one JSON object per sampled tick on stdout
        #[arg(long)]
        json: bool,
        /// Sample every N ticks
        #[arg(short, long, default_value = "1")]
        every: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            let config = MotorConfig::default();
            println!("locomotor-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "speeds: forward={} sideways={} backwards={}",
                config.movement.max_forward_speed,
                config.movement.max_sideways_speed,
                config.movement.max_backwards_speed
            );
            println!(
                "gravity={} max_fall_speed={} jump={}+{}m",
                config.movement.gravity,
                config.movement.max_fall_speed,
                config.jumping.base_height,
                config.jumping.extra_height
            );
            println!(
                "platforms: enabled={} transfer={:?}",
                config.moving_platform.enabled, config.moving_platform.movement_transfer
            );
        }
        Commands::Defaults { scenario } => {
            let yaml = if scenario {
                Scenario::default().to_yaml()?
            } else {
                serde_yaml::to_string(&MotorConfig::default())?
            };
            print!("{yaml}");
        }
        Commands::Validate { path } => {
            let scenario = Scenario::load(&path).with_context(|| format!("loading {}", path.display()))?;
            Simulation::new(&scenario)?;
            println!(
                "{}: ok ({} bodies, {} ticks at dt={})",
                scenario.name,
                scenario.bodies.len(),
                scenario.ticks(),
                scenario.dt
            );
        }
        Commands::Run { path, json, every } => {
            let scenario = Scenario::load(&path).with_context(|| format!("loading {}", path.display()))?;
            let mut sim = Simulation::new(&scenario)?;
            let every = every.max(1);
            tracing::info!(path = %path.display(), json, every, "running scenario");

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let mut summary = Summary::default();
            while !sim.finished() {
                let sample = sim.step();
                summary.record(&sample);
                if json && (sample.tick % every == 0 || !sample.events.is_empty()) {
                    serde_json::to_writer(&mut out, &sample)?;
                    writeln!(out)?;
                }
            }

            if !json {
                let character = sim.world.character();
                println!("scenario: {}", scenario.name);
                println!("ticks: {} ({:.2}s)", sim.world.tick(), sim.world.time());
                println!("final position: {:?}", character.position);
                println!("final velocity: {:?}", sim.motor.velocity());
                println!(
                    "grounded={} platform={:?}",
                    sim.motor.is_grounded(),
                    sim.motor.active_platform().and_then(|id| sim.world.body(id)).map(|b| &b.name)
                );
                println!(
                    "jumps={} landings={} falls={} ceiling_hits={} launches={}",
                    summary.jumps, summary.landings, summary.falls, summary.ceiling_hits, summary.launches
                );
                println!("airborne ticks: {}, sliding ticks: {}", summary.airborne, summary.sliding);
                println!("state hash: {:#x}", sim.world.state_hash());
            }
        }
    }

    Ok(())
}

#[derive(Debug, Default)]
struct Summary {
    jumps: usize,
    landings: usize,
    falls: usize,
    ceiling_hits: usize,
    launches: usize,
    airborne: usize,
    sliding: usize,
}

impl Summary {
    fn record(&mut self, sample: &Sample) {
        if !sample.grounded {
            self.airborne += 1;
        }
        if sample.sliding {
            self.sliding += 1;
        }
        for event in &sample.events {
            match event {
                MotorEvent::Jumped { .. } => self.jumps += 1,
                MotorEvent::Landed { .. } => self.landings += 1,
                MotorEvent::Fell => self.falls += 1,
                MotorEvent::HitCeiling => self.ceiling_hits += 1,
                MotorEvent::ExternalVelocity { .. } => self.launches += 1,
            }
        }
    }
}
