// src/cloud_handler.rs
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use async_trait::async_trait;
use google_sheets4::api::{Scope, ValueRange};
use google_sheets4::hyper::client::HttpConnector;
use google_sheets4::hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use google_sheets4::{hyper, Sheets};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{from_str, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

use crate::data_types::{CellCoord, RawGrid};
use crate::error::{FetchError, WriteError};
use crate::source::{CellWriter, GridSource};

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Reads tab values through the public values endpoint using an API key.
pub struct SheetsReader {
    http: Client,
    api_base: String,
    spreadsheet_id: String,
    api_key: String,
}

impl SheetsReader {
    pub fn new(api_base: String, spreadsheet_id: String, api_key: String) -> Self {
        SheetsReader {
            http: Client::new(),
            api_base,
            spreadsheet_id,
            api_key,
        }
    }

    fn values_url(&self, tab: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| FetchError::Transport(format!("invalid api base {}: {e}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::Transport(format!("api base {} cannot hold a path", self.api_base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", tab]);
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl GridSource for SheetsReader {
    async fn fetch_grid(&self, tab: &str) -> Result<RawGrid, FetchError> {
        let url = self.values_url(tab)?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        debug!(tab, status = status.as_u16(), "values response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(FetchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ValuesResponse = response.json().await?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Quotes a tab name for use in an A1 range, e.g. `'17/05/68'!G5`.
fn a1_range(tab: &str, coord: CellCoord) -> String {
    format!("'{}'!{}", tab.replace('\'', "''"), coord.a1())
}

type SheetsHub = Sheets<HttpsConnector<HttpConnector>>;

/// Writes cells with a service account through `spreadsheets.values.update`.
pub struct ServiceAccountWriter {
    spreadsheet_id: String,
    credentials_path: PathBuf,
    hub: OnceCell<SheetsHub>,
}

impl ServiceAccountWriter {
    pub fn new(spreadsheet_id: String, credentials_path: PathBuf) -> Self {
        ServiceAccountWriter {
            spreadsheet_id,
            credentials_path,
            hub: OnceCell::new(),
        }
    }

    async fn authenticate(&self) -> Result<SheetsHub, WriteError> {
        let mut json = String::new();
        File::open(&self.credentials_path)?.read_to_string(&mut json)?;

        let service_account_key: ServiceAccountKey =
            from_str(&json).map_err(|e| WriteError::Auth(format!("invalid service account key: {e}")))?;

        let auth = ServiceAccountAuthenticator::builder(service_account_key)
            .build()
            .await
            .map_err(|e| WriteError::Auth(e.to_string()))?;

        let connector = HttpsConnectorBuilder::new()
            .with_native_roots()
            .https_or_http()
            .enable_http1()
            .build();
        info!(path = %self.credentials_path.display(), "service account authenticated");
        Ok(Sheets::new(hyper::Client::builder().build(connector), auth))
    }
}

#[async_trait]
impl CellWriter for ServiceAccountWriter {
    async fn write_cell(&self, tab: &str, coord: CellCoord, value: &str) -> Result<(), WriteError> {
        let hub = self.hub.get_or_try_init(|| self.authenticate()).await?;
        let range = a1_range(tab, coord);
        let request = ValueRange {
            range: Some(range.clone()),
            major_dimension: Some("ROWS".to_string()),
            values: Some(vec![vec![Value::String(value.to_string())]]),
            ..Default::default()
        };

        let (_, response) = hub
            .spreadsheets()
            .values_update(request, &self.spreadsheet_id, &range)
            .value_input_option("USER_ENTERED")
            .add_scope(Scope::Spreadsheet)
            .doit()
            .await?;
        info!(range = %range, updated = ?response.updated_cells, "cell updated");
        Ok(())
    }
}
