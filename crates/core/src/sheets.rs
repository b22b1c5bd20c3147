//! Publishes the exported CSV into a Google Sheets spreadsheet.
//!
//! Thin wrapper over the Sheets v4 hub: installed-app OAuth with a
//! persisted token cache, clear-then-update of the data range, and a
//! last-updated timestamp cell.

use std::path::Path;

use google_sheets4::api::{ClearValuesRequest, ValueRange};
use google_sheets4::{Sheets, hyper_rustls, hyper_util, yup_oauth2};
use tracing::info;

use crate::error::{EkosError, Result};

pub const SPREADSHEET_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

type Hub = Sheets<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// The spreadsheet ranges one delivery run writes to.
#[derive(Debug, Clone)]
pub struct SheetTarget {
    pub spreadsheet_id: String,
    pub data_range: String,
    pub info_range: String,
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub major_dimension: String,
    pub value_input_option: String,
    /// Clear the target range before writing. Clear and update are two
    /// API calls; a failure between them leaves the range empty.
    pub clear: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            major_dimension: "ROWS".to_string(),
            value_input_option: "USER_ENTERED".to_string(),
            clear: true,
        }
    }
}

pub struct SheetsPublisher {
    hub: Hub,
    target: SheetTarget,
}

impl SheetsPublisher {
    /// Runs the installed-app OAuth flow (reusing or refreshing tokens
    /// cached at `token_path`) and binds the hub to one spreadsheet target.
    pub async fn connect(cred_path: &Path, token_path: &Path, target: SheetTarget) -> Result<Self> {
        let secret = yup_oauth2::read_application_secret(cred_path)
            .await
            .map_err(|e| {
                EkosError::Spreadsheet(format!(
                    "cannot read client secret {}: {e}",
                    cred_path.display()
                ))
            })?;

        let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
            secret,
            yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
        )
        .persist_tokens_to_disk(token_path.to_path_buf())
        .build()
        .await
        .map_err(|e| EkosError::Spreadsheet(format!("oauth flow failed: {e}")))?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| EkosError::Spreadsheet(format!("tls setup failed: {e}")))?
            .https_or_http()
            .enable_http1()
            .build();
        let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
            .build(connector);

        Ok(Self {
            hub: Sheets::new(client, auth),
            target,
        })
    }

    /// Writes the CSV's rows into the data range, clearing it first by
    /// default.
    pub async fn import_csv(&self, csv_path: &Path, opts: &ImportOptions) -> Result<()> {
        let rows = csv_rows(csv_path)?;
        let row_count = rows.len();
        let range = self.target.data_range.clone();

        if opts.clear {
            self.clear(&range).await?;
        }
        self.update(&range, rows, &opts.major_dimension, &opts.value_input_option)
            .await?;

        info!(
            target = "ekos",
            spreadsheet = %self.target.spreadsheet_id,
            range = %range,
            rows = row_count,
            "spreadsheet data imported"
        );
        Ok(())
    }

    /// Clears the info range and writes the current local timestamp into it
    /// as a single cell.
    pub async fn stamp_last_updated(&self) -> Result<()> {
        let now = chrono::Local::now().naive_local().to_string();
        let range = self.target.info_range.clone();
        self.clear(&range).await?;
        self.update(
            &range,
            vec![vec![serde_json::Value::String(now.clone())]],
            "ROWS",
            "USER_ENTERED",
        )
        .await?;

        info!(target = "ekos", range = %range, stamp = %now, "last-updated cell stamped");
        Ok(())
    }

    async fn clear(&self, range: &str) -> Result<()> {
        self.hub
            .spreadsheets()
            .values_clear(ClearValuesRequest::default(), &self.target.spreadsheet_id, range)
            .add_scope(SPREADSHEET_SCOPE)
            .doit()
            .await
            .map_err(|e| EkosError::Spreadsheet(e.to_string()))?;
        Ok(())
    }

    async fn update(
        &self,
        range: &str,
        values: Vec<Vec<serde_json::Value>>,
        major_dimension: &str,
        value_input_option: &str,
    ) -> Result<()> {
        let body = ValueRange {
            major_dimension: Some(major_dimension.to_string()),
            range: Some(range.to_string()),
            values: Some(values),
        };
        self.hub
            .spreadsheets()
            .values_update(body, &self.target.spreadsheet_id, range)
            .value_input_option(value_input_option)
            .add_scope(SPREADSHEET_SCOPE)
            .doit()
            .await
            .map_err(|e| EkosError::Spreadsheet(e.to_string()))?;
        Ok(())
    }
}

/// Reads a headerless CSV into the row-major cell values the API expects.
/// Rows keep their order and may be ragged.
pub fn csv_rows(path: &Path) -> Result<Vec<Vec<serde_json::Value>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| serde_json::Value::String(field.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_preserve_order_quoting_and_ragged_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("deliveries.csv");
        std::fs::write(
            &path,
            "Customer,Cases,Notes\n\"Bottle Shop, Inc.\",12,\n\"Tap Room\",3,\"keg only\"\nshort-row\n",
        )
        .unwrap();

        let rows = csv_rows(&path).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0][0], "Customer");
        assert_eq!(rows[1][0], "Bottle Shop, Inc.");
        assert_eq!(rows[2][2], "keg only");
        assert_eq!(rows[3].len(), 1);
    }

    #[test]
    fn csv_rows_reports_missing_file() {
        let err = csv_rows(Path::new("/nonexistent/deliveries.csv")).unwrap_err();
        assert!(matches!(err, EkosError::Csv(_)));
    }
}
