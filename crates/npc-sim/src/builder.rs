//! Fluent builder for constructing a [`Sim`].

use std::sync::Arc;

use tracing::debug;

use npc_core::{CharacterId, CharacterRng, Point, SimConfig};
use npc_dispatch::{BehaviorUnit, Dispatcher, UnitKind};
use npc_nav::{DEFAULT_SPEED, Navigator, WaypointGraph};
use npc_sched::Scheduler;

use crate::{Body, Character, PropTable, Sim, SimError, SimResult};

/// Fluent builder for [`Sim<K>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: tick length, seed, contact radius, ...
/// - the default unit kind every character starts in
/// - a unit factory, called once per character per kind in declaration
///   order, with the character's scheduler so units can pre-build nodes
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                          |
/// |---------------------|----------------------------------|
/// | `.spawn_points(v)`  | no characters                    |
/// | `.character(p)`     | appends one spawn point          |
/// | `.facings(v)`       | all `0.0`                        |
/// | `.speeds(v)`        | all [`DEFAULT_SPEED`]            |
/// | `.graph(g)`         | `WaypointGraph::empty()`         |
/// | `.props(t)`         | an empty [`PropTable`]           |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, Conduct::Idle, |_, kind, _| make_unit(kind))
///     .spawn_points(vec![Point::flat(0.0, 0.0), Point::flat(4.0, 0.0)])
///     .graph(tavern_graph)
///     .props(props)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<K, F>
where
    K: UnitKind,
    F: FnMut(CharacterId, K, &mut Scheduler<Body>) -> Box<dyn BehaviorUnit<K, Body>>,
{
    config:  SimConfig,
    default: K,
    factory: F,
    spawns:  Vec<Point>,
    facings: Option<Vec<f32>>,
    speeds:  Option<Vec<f32>>,
    graph:   Option<WaypointGraph>,
    props:   Option<PropTable>,
}

impl<K, F> SimBuilder<K, F>
where
    K: UnitKind,
    F: FnMut(CharacterId, K, &mut Scheduler<Body>) -> Box<dyn BehaviorUnit<K, Body>>,
{
    /// Create a builder with all required inputs.
    pub fn new(config: SimConfig, default: K, factory: F) -> Self {
        Self {
            config,
            default,
            factory,
            spawns:  Vec::new(),
            facings: None,
            speeds:  None,
            graph:   None,
            props:   None,
        }
    }

    /// One character per point; replaces any earlier spawn points.
    pub fn spawn_points(mut self, points: Vec<Point>) -> Self {
        self.spawns = points;
        self
    }

    /// Add one character at `at`.
    pub fn character(mut self, at: Point) -> Self {
        self.spawns.push(at);
        self
    }

    /// Initial yaw per character (must match the spawn count).
    pub fn facings(mut self, facings: Vec<f32>) -> Self {
        self.facings = Some(facings);
        self
    }

    /// Walking speed per character in m/s (must match the spawn count).
    pub fn speeds(mut self, speeds: Vec<f32>) -> Self {
        self.speeds = Some(speeds);
        self
    }

    /// The waypoint graph walks are routed over.
    ///
    /// If not called, every walk fails with an empty-graph error and
    /// `MoveTo` nodes fail on their next evaluation.
    pub fn graph(mut self, graph: WaypointGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn props(mut self, props: PropTable) -> Self {
        self.props = Some(props);
        self
    }

    /// Validate inputs, build every character, start its default unit, and
    /// return a ready-to-run [`Sim`].
    pub fn build(mut self) -> SimResult<Sim<K>> {
        self.config.validate()?;
        let count = self.spawns.len();

        // ── Validate and resolve optional inputs ──────────────────────────
        let facings = resolve(self.facings, count, 0.0, "facings")?;
        let speeds = resolve(self.speeds, count, DEFAULT_SPEED, "speeds")?;
        if let Some(bad) = speeds.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(SimError::Config(format!("walking speed must be positive, got {bad}")));
        }

        let graph = Arc::new(self.graph.unwrap_or_else(WaypointGraph::empty));
        let props = Arc::new(self.props.unwrap_or_default());

        // ── Build characters ──────────────────────────────────────────────
        let mut characters = Vec::with_capacity(count);
        for (i, &at) in self.spawns.iter().enumerate() {
            let id = CharacterId(i as u32);
            let nav = Navigator::new(Arc::clone(&graph)).with_speed(speeds[i]);
            let rng = CharacterRng::new(self.config.seed, id);
            let body = Body::new(id, at, facings[i], nav, Arc::clone(&props), rng);
            let factory = &mut self.factory;
            let dispatcher = Dispatcher::new(self.default, |kind, sched| factory(id, kind, sched));
            characters.push(Character::new(body, dispatcher));
        }
        for c in &mut characters {
            c.start();
        }
        debug!(characters = count, waypoints = graph.waypoint_count(), props = props.len(), "sim built");

        Ok(Sim {
            clock: self.config.make_clock(),
            #[cfg(feature = "parallel")]
            pool: thread_pool(self.config.num_threads)?,
            config: self.config,
            characters,
            props,
            graph,
        })
    }
}

fn resolve(given: Option<Vec<f32>>, count: usize, fill: f32, what: &'static str) -> SimResult<Vec<f32>> {
    match given {
        Some(v) if v.len() != count => Err(SimError::CountMismatch { expected: count, got: v.len(), what }),
        Some(v) => Ok(v),
        None => Ok(vec![fill; count]),
    }
}

/// A dedicated pool when a thread count is configured; otherwise Rayon's
/// global pool is used.
#[cfg(feature = "parallel")]
fn thread_pool(threads: Option<usize>) -> SimResult<Option<rayon::ThreadPool>> {
    let Some(n) = threads else {
        return Ok(None);
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build()
        .map(Some)
        .map_err(|e| SimError::Config(format!("thread pool: {e}")))
}
