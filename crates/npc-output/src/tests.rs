//! Unit and integration tests for npc-output.

use tempfile::TempDir;

use npc_core::{AnimId, CharacterId, Point, PropId, SimConfig, Tick};
use npc_sim::{CharacterSnapshot, SimObserver, TickStats};

use crate::csv::{SNAPSHOT_FILE, SUMMARY_FILE};
use crate::*;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn tmp() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

fn snapshot(id: u32) -> CharacterSnapshot {
    CharacterSnapshot {
        id:        CharacterId(id),
        position:  Point::flat(id as f32, 2.0),
        facing:    0.5,
        unit:      "Idle".into(),
        root:      None,
        animation: AnimId(0),
        moving:    false,
        holding:   None,
    }
}

fn summary_row(tick: u64) -> TickSummaryRow {
    TickSummaryRow { tick, elapsed_secs: tick as f64 * 0.5, busy: 2, moving: 1, contacts: 0, gestures: tick }
}

fn read(dir: &TempDir, file: &str) -> (Vec<String>, Vec<::csv::StringRecord>) {
    let mut rdr = ::csv::Reader::from_path(dir.path().join(file)).unwrap();
    let headers = rdr.headers().unwrap().iter().map(str::to_owned).collect();
    let rows = rdr.records().map(|r| r.unwrap()).collect();
    (headers, rows)
}

/// Fails every write; counts calls.
#[derive(Default)]
struct Broken {
    calls: usize,
}

impl OutputWriter for Broken {
    fn write_snapshots(&mut self, _rows: &[CharacterSnapshotRow]) -> OutputResult<()> {
        self.calls += 1;
        Err(std::io::Error::other(format!("snapshot write {}", self.calls)).into())
    }

    fn write_tick_summary(&mut self, _row: &TickSummaryRow) -> OutputResult<()> {
        self.calls += 1;
        Err(std::io::Error::other(format!("summary write {}", self.calls)).into())
    }

    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}

// ── Rows ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod row_tests {
    use super::*;

    #[test]
    fn flattens_optional_fields() {
        let idle = CharacterSnapshotRow::from_snapshot(9, &snapshot(3));
        assert_eq!(idle.character_id, 3);
        assert_eq!(idle.tick, 9);
        assert_eq!(idle.root, "");
        assert_eq!(idle.holding, u32::MAX);

        let busy = CharacterSnapshot {
            root: Some("fetch ale".into()),
            holding: Some(PropId(1)),
            ..snapshot(0)
        };
        let row = CharacterSnapshotRow::from_snapshot(0, &busy);
        assert_eq!(row.root, "fetch ale");
        assert_eq!(row.holding, 1);
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use super::*;

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join(SNAPSHOT_FILE).exists());
        assert!(dir.path().join(SUMMARY_FILE).exists());
    }

    #[test]
    fn missing_directory_errors() {
        let dir = tmp();
        let result = CsvWriter::new(&dir.path().join("nope"));
        assert!(result.is_err());
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let (headers, rows) = read(&dir, SNAPSHOT_FILE);
        assert_eq!(headers, [
            "character_id", "tick", "x", "y", "z", "facing", "unit", "root", "animation", "moving", "holding",
        ]);
        assert!(rows.is_empty());

        let (headers, _) = read(&dir, SUMMARY_FILE);
        assert_eq!(headers, ["tick", "elapsed_secs", "busy", "moving", "contacts", "gestures"]);
    }

    #[test]
    fn csv_snapshot_rows() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let rows: Vec<_> = (0..3).map(|i| CharacterSnapshotRow::from_snapshot(5, &snapshot(i))).collect();
        w.write_snapshots(&rows).unwrap();
        w.finish().unwrap();

        let (_, read_rows) = read(&dir, SNAPSHOT_FILE);
        assert_eq!(read_rows.len(), 3);
        assert_eq!(&read_rows[0][0], "0"); // character_id
        assert_eq!(&read_rows[0][1], "5"); // tick
        assert_eq!(&read_rows[2][2], "2.000"); // x
        assert_eq!(&read_rows[1][6], "Idle");
        assert_eq!(&read_rows[1][9], "0"); // moving
    }

    #[test]
    fn csv_tick_summary_row() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_tick_summary(&summary_row(3)).unwrap();
        w.finish().unwrap();

        let (_, rows) = read(&dir, SUMMARY_FILE);
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "3");
        assert_eq!(&rows[0][1], "1.500");
        assert_eq!(&rows[0][5], "3");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use super::*;

    #[test]
    fn keeps_only_the_first_error() {
        let mut obs = SimOutputObserver::new(Broken::default(), &SimConfig::default());
        obs.on_tick_end(Tick(0), &TickStats::default());
        obs.on_snapshot(Tick(0), &[snapshot(0)]);

        let err = obs.take_error().unwrap();
        assert_eq!(err.to_string(), "I/O error: summary write 1");
        assert!(obs.take_error().is_none());
        assert_eq!(obs.into_writer().calls, 2);
    }

    #[test]
    fn empty_snapshot_is_skipped() {
        let mut obs = SimOutputObserver::new(Broken::default(), &SimConfig::default());
        obs.on_snapshot(Tick(0), &[]);
        assert!(obs.take_error().is_none());
    }

    #[test]
    fn integration_csv() {
        use npc_dispatch::{BehaviorUnit, IdleUnit};
        use npc_sim::{Body, SimBuilder};
        use strum::{EnumCount, EnumIter};

        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, EnumCount)]
        enum Mode {
            Idle,
        }

        let config = SimConfig {
            tick_secs:             0.5,
            total_ticks:           6,
            seed:                  1,
            num_threads:           Some(1),
            output_interval_ticks: 2,
            contact_radius:        0.6,
        };
        let mut sim = SimBuilder::new(config.clone(), Mode::Idle, |_, _, _| -> Box<dyn BehaviorUnit<Mode, Body>> {
            Box::new(IdleUnit)
        })
        .spawn_points(vec![Point::ORIGIN, Point::flat(3.0, 0.0), Point::flat(6.0, 0.0)])
        .build()
        .unwrap();

        let dir = tmp();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = SimOutputObserver::new(writer, &config);
        sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none(), "no write errors expected");

        // Snapshots at ticks 0, 2 and 4: 3 ticks x 3 characters.
        let (_, rows) = read(&dir, SNAPSHOT_FILE);
        assert_eq!(rows.len(), 9);
        assert!(rows.iter().all(|r| &r[6] == "Idle"));

        let (_, summaries) = read(&dir, SUMMARY_FILE);
        assert_eq!(summaries.len(), 6);
        assert_eq!(&summaries[5][1], "2.500");
    }
}
