// src/source.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use tracing::{info, warn};

use crate::cloud_handler::{ServiceAccountWriter, SheetsReader};
use crate::config::{Settings, WriteMode};
use crate::csv_handler::{CsvCellWriter, CsvGridSource};
use crate::data_types::{CellCoord, DataSource, RawGrid, SheetSnapshot};
use crate::error::{FetchError, WriteError};
use crate::transform;

/// Somewhere raw tab grids can be read from.
#[async_trait]
pub trait GridSource: Send + Sync {
    async fn fetch_grid(&self, tab: &str) -> Result<RawGrid, FetchError>;
}

/// Persists one cell of one tab as text.
#[async_trait]
pub trait CellWriter: Send + Sync {
    async fn write_cell(&self, tab: &str, coord: CellCoord, value: &str) -> Result<(), WriteError>;
}

/// Accepts every write without touching the sheet.
pub struct SimulatedWriter;

#[async_trait]
impl CellWriter for SimulatedWriter {
    async fn write_cell(&self, tab: &str, coord: CellCoord, value: &str) -> Result<(), WriteError> {
        info!(tab, cell = %coord.a1(), value, "simulated cell update");
        Ok(())
    }
}

/// Fetches a tab and turns it into records plus summary.
pub async fn load_snapshot(source: Arc<dyn GridSource>, tab: String) -> Result<SheetSnapshot, FetchError> {
    info!(tab = %tab, "fetching sheet");
    let grid = source.fetch_grid(&tab).await?;
    let (records, summary) = transform::parse(&grid);
    info!(tab = %tab, records = records.len(), "sheet loaded");
    Ok(SheetSnapshot {
        tab,
        records,
        summary,
        fetched_at: Local::now(),
    })
}

/// Writes one cell and reports only whether it landed.
pub async fn write_back(writer: Arc<dyn CellWriter>, tab: String, coord: CellCoord, value: String) -> bool {
    match writer.write_cell(&tab, coord, &value).await {
        Ok(()) => true,
        Err(err) => {
            warn!(tab = %tab, cell = %coord.a1(), error = %err, "cell update failed");
            false
        }
    }
}

/// Reader and writer pair for one data source.
#[derive(Clone)]
pub struct Backend {
    pub source: DataSource,
    pub reader: Arc<dyn GridSource>,
    pub writer: Arc<dyn CellWriter>,
}

impl Backend {
    pub fn from_settings(settings: &Settings) -> Self {
        match &settings.local_dir {
            Some(dir) => Self::local(dir.clone()),
            None => Self::cloud(settings),
        }
    }

    pub fn local(dir: std::path::PathBuf) -> Self {
        Backend {
            source: DataSource::Local(dir.clone()),
            reader: Arc::new(CsvGridSource::new(dir.clone())),
            writer: Arc::new(CsvCellWriter::new(dir)),
        }
    }

    pub fn cloud(settings: &Settings) -> Self {
        let writer: Arc<dyn CellWriter> = match settings.write_mode {
            WriteMode::Simulated => Arc::new(SimulatedWriter),
            WriteMode::ServiceAccount => Arc::new(ServiceAccountWriter::new(
                settings.spreadsheet_id.clone(),
                settings.credentials_path.clone(),
            )),
        };
        Backend {
            source: DataSource::Cloud {
                spreadsheet_id: settings.spreadsheet_id.clone(),
            },
            reader: Arc::new(SheetsReader::new(
                settings.api_base.clone(),
                settings.spreadsheet_id.clone(),
                settings.api_key.clone(),
            )),
            writer,
        }
    }
}
