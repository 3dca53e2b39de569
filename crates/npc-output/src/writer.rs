//! The `OutputWriter` trait implemented by backend writers.

use crate::{CharacterSnapshotRow, OutputResult, TickSummaryRow};

/// A sink for snapshot and tick-summary rows.
///
/// All methods are infallible from the observer's perspective: errors are
/// stored and retrieved with
/// [`SimOutputObserver::take_error`][crate::SimOutputObserver::take_error].
pub trait OutputWriter {
    /// Write a batch of character snapshots.
    fn write_snapshots(&mut self, rows: &[CharacterSnapshotRow]) -> OutputResult<()>;

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
