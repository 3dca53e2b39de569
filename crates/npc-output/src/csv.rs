//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `character_snapshots.csv`
//! - `tick_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;
use tracing::debug;

use crate::writer::OutputWriter;
use crate::{CharacterSnapshotRow, OutputResult, TickSummaryRow};

pub const SNAPSHOT_FILE: &str = "character_snapshots.csv";
pub const SUMMARY_FILE: &str = "tick_summaries.csv";

const SNAPSHOT_HEADER: [&str; 11] = [
    "character_id", "tick", "x", "y", "z", "facing", "unit", "root", "animation", "moving", "holding",
];

const SUMMARY_HEADER: [&str; 6] = ["tick", "elapsed_secs", "busy", "moving", "contacts", "gestures"];

/// Writes simulation output to two CSV files.
pub struct CsvWriter {
    snapshots: Writer<File>,
    summaries: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create (or truncate) the two CSV files in `dir` and write the header
    /// rows.  `dir` must exist.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut snapshots = Writer::from_path(dir.join(SNAPSHOT_FILE))?;
        snapshots.write_record(SNAPSHOT_HEADER)?;

        let mut summaries = Writer::from_path(dir.join(SUMMARY_FILE))?;
        summaries.write_record(SUMMARY_HEADER)?;

        debug!(dir = %dir.display(), "csv output opened");
        Ok(Self { snapshots, summaries, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_snapshots(&mut self, rows: &[CharacterSnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.snapshots.write_record(&[
                row.character_id.to_string(),
                row.tick.to_string(),
                format!("{:.3}", row.x),
                format!("{:.3}", row.y),
                format!("{:.3}", row.z),
                format!("{:.4}", row.facing),
                row.unit.clone(),
                row.root.clone(),
                row.animation.to_string(),
                (row.moving as u8).to_string(),
                row.holding.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            format!("{:.3}", row.elapsed_secs),
            row.busy.to_string(),
            row.moving.to_string(),
            row.contacts.to_string(),
            row.gestures.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.snapshots.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
