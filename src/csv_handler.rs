// src/csv_handler.rs
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csv::{ReaderBuilder, WriterBuilder};
use tokio::sync::Mutex;
use tokio::task;
use tracing::info;

use crate::data_types::{CellCoord, RawGrid};
use crate::error::{FetchError, WriteError};
use crate::source::{CellWriter, GridSource};

/// File holding one tab's export. Tab names like `17/05/68` become `17-05-68.csv`.
pub fn tab_file(dir: &Path, tab: &str) -> PathBuf {
    let name: String = tab
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect();
    dir.join(format!("{name}.csv"))
}

fn read_grid(path: &Path) -> Result<RawGrid, csv::Error> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut grid = Vec::new();
    for result in reader.records() {
        let record = result?;
        grid.push(record.iter().map(String::from).collect());
    }
    Ok(grid)
}

/// Writes the grid next to `path` and renames it into place, so readers
/// see either the old file or the new one.
fn write_grid(path: &Path, grid: &RawGrid) -> Result<(), csv::Error> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    let mut writer = WriterBuilder::new().flexible(true).from_path(&staging)?;
    for row in grid {
        if row.is_empty() {
            // csv skips zero-field records, which would shift every row below
            writer.write_record([""])?;
        } else {
            writer.write_record(row)?;
        }
    }
    writer.flush()?;
    drop(writer);

    fs::rename(&staging, path)?;
    Ok(())
}

/// Reads tabs from a folder of CSV exports.
pub struct CsvGridSource {
    dir: PathBuf,
}

impl CsvGridSource {
    pub fn new(dir: PathBuf) -> Self {
        CsvGridSource { dir }
    }
}

#[async_trait]
impl GridSource for CsvGridSource {
    async fn fetch_grid(&self, tab: &str) -> Result<RawGrid, FetchError> {
        let path = tab_file(&self.dir, tab);
        task::spawn_blocking(move || {
            read_grid(&path).map_err(|err| {
                let shown = path.display().to_string();
                if err.is_io_error() {
                    FetchError::Io { path: shown, message: err.to_string() }
                } else {
                    FetchError::Csv { path: shown, message: err.to_string() }
                }
            })
        })
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?
    }
}

/// Rewrites one cell of a tab's CSV export.
pub struct CsvCellWriter {
    dir: PathBuf,
    // held for the whole read-modify-write of a file
    lock: Mutex<()>,
}

impl CsvCellWriter {
    pub fn new(dir: PathBuf) -> Self {
        CsvCellWriter {
            dir,
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl CellWriter for CsvCellWriter {
    async fn write_cell(&self, tab: &str, coord: CellCoord, value: &str) -> Result<(), WriteError> {
        if coord.row == 0 {
            return Err(WriteError::RowOutOfRange(coord.row));
        }
        let path = tab_file(&self.dir, tab);
        let value = value.to_string();

        // Writes to different cells of one tab would otherwise rewrite the
        // file from stale copies and drop each other's changes.
        let _guard = self.lock.lock().await;
        task::spawn_blocking(move || -> Result<(), WriteError> {
            let mut grid = read_grid(&path)?;
            if grid.len() < coord.row {
                grid.resize(coord.row, Vec::new());
            }
            let row = &mut grid[coord.row - 1];
            if row.len() <= coord.col {
                row.resize(coord.col + 1, String::new());
            }
            row[coord.col] = value;
            write_grid(&path, &grid)?;
            info!(path = %path.display(), cell = %coord.a1(), "csv cell updated");
            Ok(())
        })
        .await
        .map_err(|e| WriteError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;
    use crate::data_types::OrderField;
    use crate::transform::{locate, parse};

    fn temp_dir(label: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("order_dashboard_{label}_{suffix}"));
        fs::create_dir_all(&dir).expect("temp dir");
        dir
    }

    const SHEET: &str = "h,h,h,h,h,h,h,h,h,h,h\n\
                         d,,,,,,,,5,2,1\n\
                         O1,P1,C1,D1,3,T1,รอดำเนินการ,N1\n\
                         O2,P2\n";

    #[test]
    fn tab_names_become_file_names() {
        let dir = Path::new("/data");
        assert_eq!(tab_file(dir, "17/05/68"), PathBuf::from("/data/17-05-68.csv"));
    }

    #[tokio::test]
    async fn reads_jagged_rows() {
        let dir = temp_dir("csv_read");
        fs::write(tab_file(&dir, "17/05/68"), SHEET).expect("write");

        let grid = CsvGridSource::new(dir.clone()).fetch_grid("17/05/68").await.expect("grid");
        fs::remove_dir_all(&dir).expect("cleanup");

        assert_eq!(grid.len(), 4);
        assert_eq!(grid[1].len(), 11);
        assert_eq!(grid[3], vec!["O2", "P2"]);
    }

    #[tokio::test]
    async fn missing_tab_file_is_an_io_error() {
        let dir = temp_dir("csv_missing");
        let err = CsvGridSource::new(dir.clone()).fetch_grid("19/05/68").await.expect_err("missing");
        fs::remove_dir_all(&dir).expect("cleanup");

        assert!(matches!(err, FetchError::Io { .. }));
    }

    #[tokio::test]
    async fn written_cell_is_read_back() {
        let dir = temp_dir("csv_write");
        fs::write(tab_file(&dir, "17/05/68"), SHEET).expect("write");
        let source = CsvGridSource::new(dir.clone());
        let writer = CsvCellWriter::new(dir.clone());

        let coord = locate(2, OrderField::Status);
        writer.write_cell("17/05/68", coord, "จัดส่งแล้ว").await.expect("write cell");
        let (records, summary) = parse(&source.fetch_grid("17/05/68").await.expect("grid"));

        let coord = locate(1, OrderField::Quantity);
        writer.write_cell("17/05/68", coord, "3").await.expect("same value");
        let (again, _) = parse(&source.fetch_grid("17/05/68").await.expect("grid"));
        fs::remove_dir_all(&dir).expect("cleanup");

        assert_eq!(records[2].status, "จัดส่งแล้ว");
        assert_eq!(records[2].order_number, "O2");
        assert_eq!(records[1].status, "รอดำเนินการ");
        assert_eq!(summary.total_orders, 5);
        assert_eq!(again, records);
    }

    #[tokio::test]
    async fn writes_past_the_end_extend_the_sheet() {
        let dir = temp_dir("csv_extend");
        fs::write(tab_file(&dir, "20/05/68"), "h\n").expect("write");
        let writer = CsvCellWriter::new(dir.clone());

        writer
            .write_cell("20/05/68", locate(2, OrderField::Notes), "late")
            .await
            .expect("write");
        let grid = CsvGridSource::new(dir.clone()).fetch_grid("20/05/68").await.expect("grid");
        fs::remove_dir_all(&dir).expect("cleanup");

        let (records, _) = parse(&grid);
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].notes, "late");
        assert_eq!(records[0], crate::data_types::OrderRecord { id: 0, ..Default::default() });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_to_different_cells_all_land() {
        let dir = temp_dir("csv_concurrent");
        let mut sheet = String::from("h,h,h,h,h,h,h,h\n");
        for id in 0..20 {
            sheet.push_str(&format!("O{id},P{id},C{id},D{id},1,T{id},รอดำเนินการ,\n"));
        }
        fs::write(tab_file(&dir, "21/05/68"), sheet).expect("write");

        let writer = std::sync::Arc::new(CsvCellWriter::new(dir.clone()));
        let mut handles = Vec::new();
        for id in 0..20 {
            let writer = writer.clone();
            handles.push(tokio::spawn(async move {
                writer
                    .write_cell("21/05/68", locate(id, OrderField::Notes), &format!("N{id}"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("write cell");
        }

        let grid = CsvGridSource::new(dir.clone()).fetch_grid("21/05/68").await.expect("grid");
        fs::remove_dir_all(&dir).expect("cleanup");

        assert_eq!(grid.len(), 21);
        let (records, _) = parse(&grid);
        for (id, record) in records.iter().enumerate() {
            assert_eq!(record.order_number, format!("O{id}"));
            assert_eq!(record.notes, format!("N{id}"));
        }
    }

    #[tokio::test]
    async fn rewrite_leaves_no_staging_file() {
        let dir = temp_dir("csv_staging");
        fs::write(tab_file(&dir, "22/05/68"), SHEET).expect("write");

        CsvCellWriter::new(dir.clone())
            .write_cell("22/05/68", locate(1, OrderField::Notes), "rush")
            .await
            .expect("write");
        let names: Vec<_> = fs::read_dir(&dir)
            .expect("list")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        fs::remove_dir_all(&dir).expect("cleanup");

        assert_eq!(names, vec![std::ffi::OsString::from("22-05-68.csv")]);
    }

    #[tokio::test]
    async fn row_zero_is_rejected() {
        let writer = CsvCellWriter::new(std::env::temp_dir());
        let err = writer
            .write_cell("17/05/68", CellCoord { row: 0, col: 0 }, "x")
            .await
            .expect_err("row zero");
        assert!(matches!(err, WriteError::RowOutOfRange(0)));
    }
}
