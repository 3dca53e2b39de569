//! tavern — a small rust_npc scene.
//!
//! A handful of patrons share a seven-waypoint tavern.  They loiter, stroll
//! between tables, fetch ale from a single keg (queueing when someone else
//! is drawing), and wave back when waved at.  Snapshots land in
//! `output/tavern/` as CSV.
//!
//! ```text
//! cargo run -p tavern --release [config.json]
//! RUST_LOG=debug cargo run -p tavern
//! ```
//!
//! The optional JSON file may set any `SimConfig` field; missing fields keep
//! their defaults.

mod conduct;
mod layout;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use npc_core::{CharacterId, Point, SimConfig, SimRng, Tick};
use npc_dispatch::Gesture;
use npc_output::{CsvWriter, OutputWriter, SimOutputObserver};
use npc_sim::{CharacterSnapshot, SimBuilder, SimObserver, TickStats};

use conduct::{Conduct, Notes, SharedNotes, unit_for};
use layout::build_tavern;

// ── Constants ─────────────────────────────────────────────────────────────────

const PATRON_COUNT: usize = 6;
const SIM_SECS:     u64   = 120;
/// Someone waves about this often.
const WAVE_EVERY_SECS: f32 = 4.0;
const WAVE_RADIUS:     f32 = 5.0;
const OUTPUT_DIR:      &str = "output/tavern";

// ── Observer wrapper to count rows ────────────────────────────────────────────

struct CountingObserver<W: OutputWriter> {
    inner:         SimOutputObserver<W>,
    snapshot_rows: usize,
    summary_rows:  usize,
    contacts:      usize,
    gestures:      usize,
}

impl<W: OutputWriter> CountingObserver<W> {
    fn new(inner: SimOutputObserver<W>) -> Self {
        Self { inner, snapshot_rows: 0, summary_rows: 0, contacts: 0, gestures: 0 }
    }
}

impl<W: OutputWriter> SimObserver for CountingObserver<W> {
    fn on_tick_end(&mut self, tick: Tick, stats: &TickStats) {
        self.summary_rows += 1;
        self.contacts += stats.contacts;
        self.gestures += stats.gestures;
        self.inner.on_tick_end(tick, stats);
    }

    fn on_snapshot(&mut self, tick: Tick, characters: &[CharacterSnapshot]) {
        self.snapshot_rows += characters.len();
        self.inner.on_snapshot(tick, characters);
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        self.inner.on_sim_end(final_tick);
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

fn load_config() -> Result<SimConfig> {
    let Some(path) = std::env::args().nth(1) else {
        let base = SimConfig::default();
        return Ok(SimConfig {
            total_ticks: SIM_SECS * (1.0 / base.tick_secs).round() as u64,
            seed: 42,
            ..base
        });
    };
    let file = File::open(&path).with_context(|| format!("opening config {path}"))?;
    let config: SimConfig =
        serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing config {path}"))?;
    Ok(config)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    config.validate()?;
    println!("=== tavern — rust_npc ===");
    println!("Patrons: {PATRON_COUNT}  |  Ticks: {}  |  Seed: {}", config.total_ticks, config.seed);
    println!();

    // 1. Floor plan and props.
    let (graph, props, places) = build_tavern();
    println!("Tavern: {} waypoints, {} links, {} props", graph.waypoint_count(), graph.link_count(), props.len());
    let places = Arc::new(places);

    // 2. Spawn points, jittered so nobody starts inside anyone else.
    let mut rng = SimRng::new(config.seed);
    let spawns: Vec<Point> = (0..PATRON_COUNT)
        .map(|i| {
            let base = places.spots[i % places.spots.len()];
            Point::flat(base.x + rng.gen_range(-0.8..0.8), base.z + rng.gen_range(-0.8..0.8))
        })
        .collect();
    let facings: Vec<f32> = (0..PATRON_COUNT).map(|_| rng.gen_range(-3.1..3.1)).collect();
    let speeds: Vec<f32> = (0..PATRON_COUNT).map(|_| rng.gen_range(1.1..1.6)).collect();

    // 3. Build the sim.  Each patron's units share one notepad.
    let notepads: Vec<SharedNotes> = (0..PATRON_COUNT).map(|_| Arc::new(Mutex::new(Notes::default()))).collect();
    let unit_places = Arc::clone(&places);
    let mut sim = SimBuilder::new(config.clone(), Conduct::Idle, move |id: CharacterId, kind, _| {
        unit_for(kind, &unit_places, &notepads[id.index()])
    })
    .spawn_points(spawns)
    .facings(facings)
    .speeds(speeds)
    .graph(graph)
    .props(props)
    .build()?;

    // 4. Output.
    std::fs::create_dir_all(OUTPUT_DIR)?;
    let writer = CsvWriter::new(Path::new(OUTPUT_DIR))?;
    let mut obs = CountingObserver::new(SimOutputObserver::new(writer, &config));

    // 5. Run, injecting a wave every few seconds.
    let wave_every = sim.clock.ticks_for_secs(WAVE_EVERY_SECS).max(1);
    let mut waves = 0;
    let t0 = Instant::now();
    info!(patrons = PATRON_COUNT, "opening time");
    while sim.now() < config.end_tick() {
        if sim.now().0 % wave_every == 0 {
            let who = CharacterId(rng.gen_range(0..PATRON_COUNT as u32));
            let at = sim.character(who)?.body.position;
            let heard = sim.broadcast(Gesture::new(Some(who), "wave", at), WAVE_RADIUS);
            info!(%who, heard, "wave");
            waves += 1;
        }
        sim.run_ticks(1, &mut obs)?;
    }
    obs.on_sim_end(sim.now());
    let elapsed = t0.elapsed();

    if let Some(e) = obs.inner.take_error() {
        eprintln!("output error: {e}");
    }

    // 6. Summary.
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  character_snapshots.csv : {} rows", obs.snapshot_rows);
    println!("  tick_summaries.csv      : {} rows", obs.summary_rows);
    println!("  waves: {waves}  |  gestures handled: {}  |  contacts: {}", obs.gestures, obs.contacts);
    println!();

    println!("{:<10} {:<8} {:<18} {:<10}", "Patron", "Unit", "Position", "Holding");
    println!("{}", "-".repeat(48));
    for snap in sim.snapshots() {
        println!(
            "{:<10} {:<8} {:<18} {:<10}",
            snap.id.0,
            snap.unit,
            format!("({:.1}, {:.1})", snap.position.x, snap.position.z),
            snap.holding.map_or_else(|| "-".to_owned(), |p| p.to_string()),
        );
    }

    Ok(())
}
