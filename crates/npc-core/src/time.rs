//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter advanced once per host
//! frame.  Every tick represents the same fixed step of `tick_secs` seconds,
//! so node timeouts computed from tick counts are exact and reproducible:
//!
//!   elapsed_secs = tick * tick_secs
//!
//! Each phase callback receives a [`Frame`] (the tick being processed plus
//! the step length) rather than reading a global clock.

use std::fmt;

use crate::{CoreError, CoreResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// The tick currently being processed and its fixed step length.
///
/// Cheap to copy; passed by value into every phase.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frame {
    pub tick: Tick,
    /// Seconds represented by one tick.
    pub dt: f32,
}

impl Frame {
    #[inline]
    pub fn new(tick: Tick, dt: f32) -> Self {
        Self { tick, dt }
    }

    /// Seconds elapsed between `since` and this frame's tick.
    #[inline]
    pub fn secs_since(&self, since: Tick) -> f32 {
        self.tick.since(since) as f32 * self.dt
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self { tick: Tick::ZERO, dt: SimConfig::DEFAULT_TICK_SECS }
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks the current tick and converts tick counts to simulated seconds.
///
/// `SimClock` is cheap to copy and intentionally holds no heap data.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Seconds one tick represents.
    pub tick_secs: f32,
    /// The current tick, advanced by `SimClock::advance()` each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(tick_secs: f32) -> Self {
        Self { tick_secs, current_tick: Tick::ZERO }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.current_tick.0 as f64 * self.tick_secs as f64
    }

    /// The frame for the current tick.
    #[inline]
    pub fn frame(&self) -> Frame {
        Frame::new(self.current_tick, self.tick_secs)
    }

    /// How many ticks span `secs` seconds? (rounds up, so a wait never ends early)
    #[inline]
    pub fn ticks_for_secs(&self, secs: f32) -> u64 {
        (secs / self.tick_secs).ceil().max(0.0) as u64
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2} s)", self.current_tick, self.elapsed_secs())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically loaded from a JSON file by the application crate (with the
/// `serde` feature) and passed to the simulation builder.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Seconds per tick.  Default: 1/30 s.
    pub tick_secs: f32,

    /// Total ticks to simulate.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Worker thread count passed to Rayon.  `None` uses all logical cores.
    pub num_threads: Option<usize>,

    /// Emit a snapshot every N ticks.  0 disables snapshots.
    pub output_interval_ticks: u64,

    /// Two characters closer than this (metres, planar) touch each other and
    /// both receive a contact notification.
    pub contact_radius: f32,
}

impl SimConfig {
    pub const DEFAULT_TICK_SECS: f32 = 1.0 / 30.0;

    /// The tick at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_secs)
    }

    /// Reject values the tick loop cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.tick_secs.is_finite() && self.tick_secs > 0.0) {
            return Err(CoreError::Config(format!(
                "tick_secs must be a positive number, got {}",
                self.tick_secs
            )));
        }
        if self.contact_radius.is_nan() || self.contact_radius < 0.0 {
            return Err(CoreError::Config(format!(
                "contact_radius must be non-negative, got {}",
                self.contact_radius
            )));
        }
        if self.num_threads == Some(0) {
            return Err(CoreError::Config("num_threads must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_secs:             Self::DEFAULT_TICK_SECS,
            total_ticks:           30 * 60,
            seed:                  0,
            num_threads:           None,
            output_interval_ticks: 30,
            contact_radius:        0.6,
        }
    }
}
