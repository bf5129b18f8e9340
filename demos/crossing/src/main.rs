//! `crossing` — run the collision stage over a synthetic crossroads.
//!
//! Three threads form a closed loop each tick:
//!
//! ```text
//! localization ──frame──► collision stage ──hazards──► planner
//!      ▲                                                  │
//!      └────────────────────── ack ───────────────────────┘
//! ```
//!
//! The planner stops every vehicle flagged as hazardous, moves the rest,
//! and writes each decision to CSV.

mod logging;
mod output;
mod scenario;


use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing::{info, warn};

use tm_collision::{CollisionStageBuilder, HazardFrame, LocalizationFrame};
use tm_core::{CollisionConfig, Version};
use tm_pipeline::{DataPacket, Messenger, PipelineError, PipelineResult, RunnerObserver};
use tm_world::WorldBackend;

use crate::output::HazardWriter;
use crate::scenario::{Scenario, Vehicle};

/// Simulated seconds per tick.
const DT: f64 = 0.05;

#[derive(Parser, Debug)]
#[command(name = "crossing", version, about = "Drive the collision stage over a synthetic crossroads")]
struct Cli {
    /// Ticks to simulate
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Managed vehicles, split across the eastbound and northbound roads
    #[arg(short, long, default_value_t = 10)]
    vehicles: usize,

    /// Unregistered vehicles on the westbound lane
    #[arg(long, default_value_t = 3)]
    traffic: usize,

    /// Worker threads for the collision stage
    #[arg(short, long, default_value_t = 4)]
    workers: usize,

    /// RNG seed for vehicle placement and speeds
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// TOML file overriding collision parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV output path
    #[arg(short, long, default_value = "hazards.csv")]
    out: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None       => CollisionConfig::default(),
    };
    let scenario = Scenario::generate(cli.vehicles, cli.traffic, cli.seed);
    let writer   = HazardWriter::create(&cli.out)
        .with_context(|| format!("creating {}", cli.out.display()))?;
    info!(
        vehicles = cli.vehicles,
        traffic = cli.traffic,
        workers = cli.workers,
        ticks = cli.ticks,
        "crossing scenario ready"
    );

    let localization: Arc<Messenger<LocalizationFrame>> = Arc::new(Messenger::with_version(Version(1)));
    let hazards: Arc<Messenger<HazardFrame>> = Arc::new(Messenger::with_version(Version(0)));
    let ack: Arc<Messenger<()>> = Arc::new(Messenger::new());

    let mut runner = CollisionStageBuilder::new(
        Arc::clone(&localization),
        Arc::clone(&hazards),
        Arc::clone(&scenario.world) as Arc<dyn WorldBackend>,
    )
    .config(config)
    .pool_size(cli.workers)
    .number_of_vehicles(cli.vehicles)
    .build_runner()?;

    let producer = {
        let managed = Arc::clone(&scenario.managed);
        let (localization, ack) = (Arc::clone(&localization), Arc::clone(&ack));
        let ticks = cli.ticks;
        thread::Builder::new()
            .name("localization".into())
            .spawn(move || produce(&managed, &localization, &ack, ticks))?
    };
    let planner = {
        let (hazards, ack) = (Arc::clone(&hazards), Arc::clone(&ack));
        // Captured before any thread runs so the first frame is never missed.
        let since = hazards.version();
        thread::Builder::new()
            .name("planner".into())
            .spawn(move || plan(scenario, writer, &hazards, &ack, since))?
    };

    let run = runner.run(&mut Progress::new(100));
    let produced = producer.join().map_err(|_| anyhow!("localization thread panicked"))?;
    let planned  = planner.join().map_err(|_| anyhow!("planner thread panicked"))?;

    let ticks = run.context("collision stage failed")?;
    produced.context("localization failed")?;
    let rows = planned.context("planner failed")?;

    let stats = runner.stage().stats();
    info!(
        ticks,
        rows,
        skipped_pairs = stats.skipped_pairs,
        discoveries = stats.discoveries,
        evictions = stats.evictions,
        contentions = stats.contentions,
        out = %cli.out.display(),
        "done"
    );
    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<CollisionConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: CollisionConfig = toml::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

// ── Localization ──────────────────────────────────────────────────────────────

/// Publish one frame per tick, waiting for the planner between frames.
/// Always closes the localization channel on exit.
fn produce(
    managed:      &[Vehicle],
    localization: &Messenger<LocalizationFrame>,
    ack:          &Messenger<()>,
    ticks:        u64,
) -> PipelineResult<()> {
    let result = produce_frames(managed, localization, ack, ticks);
    localization.close();
    match result {
        // The planner quit early; the collision stage reports why.
        Err(PipelineError::Closed) => Ok(()),
        other => other,
    }
}

fn produce_frames(
    managed:      &[Vehicle],
    localization: &Messenger<LocalizationFrame>,
    ack:          &Messenger<()>,
    ticks:        u64,
) -> PipelineResult<()> {
    let mut acked = ack.version();
    for _ in 0..ticks {
        let frame = managed.iter().map(Vehicle::localization).collect();
        let next  = localization.version().next();
        localization.publish(DataPacket::new(next, Arc::new(frame)))?;
        acked = ack.receive(acked)?.version;
    }
    Ok(())
}

// ── Planner ───────────────────────────────────────────────────────────────────

/// Apply each hazard frame to the vehicles until the hazard channel closes.
/// Returns the number of CSV rows written.
fn plan(
    mut scenario: Scenario,
    mut writer:   HazardWriter<std::fs::File>,
    hazards:      &Messenger<HazardFrame>,
    ack:          &Messenger<()>,
    since:        Version,
) -> anyhow::Result<u64> {
    let result = plan_frames(&mut scenario, &mut writer, hazards, ack, since);
    ack.close();
    writer.finish().context("flushing hazard csv")?;
    result?;
    Ok(writer.rows())
}

fn plan_frames(
    scenario: &mut Scenario,
    writer:   &mut HazardWriter<std::fs::File>,
    hazards:  &Messenger<HazardFrame>,
    ack:      &Messenger<()>,
    mut since: Version,
) -> anyhow::Result<()> {
    loop {
        let packet = match hazards.receive(since) {
            Ok(packet) => packet,
            Err(PipelineError::Closed) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        since = packet.version;
        if packet.data.len() != scenario.managed.len() {
            warn!(
                version = %packet.version,
                got = packet.data.len(),
                expected = scenario.managed.len(),
                "hazard frame size mismatch"
            );
        }

        writer.write_frame(packet.version, &scenario.managed, &packet.data)?;
        for (vehicle, record) in scenario.managed.iter().zip(packet.data.iter()) {
            let speed = if record.hazard { 0.0 } else { vehicle.cruise };
            vehicle.advance(speed, DT);
        }
        scenario.step_traffic(DT)?;

        ack.publish(DataPacket::new(ack.version().next(), ()))?;
    }
}

// ── Progress ──────────────────────────────────────────────────────────────────

struct Progress {
    every:   u64,
    started: Instant,
}

impl Progress {
    fn new(every: u64) -> Self {
        Self { every: every.max(1), started: Instant::now() }
    }
}

impl RunnerObserver for Progress {
    fn on_tick_end(&mut self, tick: u64, version: Version, len: usize) {
        if (tick + 1) % self.every == 0 {
            info!(tick = tick + 1, %version, vehicles = len, "collision stage progress");
        }
    }

    fn on_stop(&mut self, ticks: u64) {
        info!(
            ticks,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "collision stage stopped"
        );
    }
}
