//! `SimOutputObserver<W>`: bridges `SimObserver` to an `OutputWriter`.

use tracing::warn;

use npc_core::{SimConfig, Tick};
use npc_sim::{CharacterSnapshot, SimObserver, TickStats};

use crate::row::{CharacterSnapshotRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes character snapshots and tick summaries to
/// any [`OutputWriter`] backend.
///
/// Errors from the writer are stored because `SimObserver` methods have no
/// return value.  After `sim.run()` returns, check with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    tick_secs:  f64,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    /// Create an observer backed by `writer`, using `config` to convert ticks
    /// to simulated seconds.
    pub fn new(writer: W, config: &SimConfig) -> Self {
        Self { writer, tick_secs: f64::from(config.tick_secs), last_error: None }
    }

    /// Take the stored write error, if any.  Only the first error is kept.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            if self.last_error.is_none() {
                warn!(error = %e, "output write failed; later errors are dropped");
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_tick_end(&mut self, tick: Tick, stats: &TickStats) {
        let row = TickSummaryRow {
            tick:         tick.0,
            elapsed_secs: tick.0 as f64 * self.tick_secs,
            busy:         stats.busy as u64,
            moving:       stats.moving as u64,
            contacts:     stats.contacts as u64,
            gestures:     stats.gestures as u64,
        };
        let result = self.writer.write_tick_summary(&row);
        self.store_err(result);
    }

    fn on_snapshot(&mut self, tick: Tick, characters: &[CharacterSnapshot]) {
        if characters.is_empty() {
            return;
        }
        let rows: Vec<CharacterSnapshotRow> =
            characters.iter().map(|s| CharacterSnapshotRow::from_snapshot(tick.0, s)).collect();
        let result = self.writer.write_snapshots(&rows);
        self.store_err(result);
    }

    fn on_sim_end(&mut self, _final_tick: Tick) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
