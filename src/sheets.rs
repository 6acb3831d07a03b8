//! Spreadsheet surface and its Google Sheets implementation.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

use crate::auth::AccessToken;
use crate::placement::GridPosition;

/// Cell and dimension writes used by placement. Coordinates are 1-based.
#[async_trait]
pub trait SpreadsheetSurface: Send + Sync {
    async fn clear_cell(&self, cell: GridPosition) -> Result<()>;

    async fn set_formula(&self, cell: GridPosition, formula: &str) -> Result<()>;

    async fn set_row_height(&self, row: u32, px: u32) -> Result<()>;

    async fn set_column_width(&self, col: u32, px: u32) -> Result<()>;
}

/// Sheets v4 client; every call is one `batchUpdate` round trip
fn zero_based(index: u32) -> Result<u32> {
    index
        .checked_sub(1)
        .ok_or_else(|| anyhow!("sheet rows and columns start at 1, got 0"))
}

pub struct SheetsClient {
    client: Client,
    endpoint: Url,
    sheet_id: u32,
    token: AccessToken,
}

impl SheetsClient {
    pub fn new(
        base_url: &str,
        spreadsheet_id: &str,
        sheet_id: u32,
        token: AccessToken,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        let endpoint = Url::parse(&format!(
            "{}/v4/spreadsheets/{}:batchUpdate",
            base_url.trim_end_matches('/'),
            spreadsheet_id
        ))
        .with_context(|| format!("Invalid Sheets API base URL: {}", base_url))?;

        Ok(Self {
            client,
            endpoint,
            sheet_id,
            token,
        })
    }

    fn cell_range(&self, cell: GridPosition) -> Result<Value> {
        Ok(json!({
            "sheetId": self.sheet_id,
            "startRowIndex": zero_based(cell.row)?,
            "endRowIndex": cell.row,
            "startColumnIndex": zero_based(cell.col)?,
            "endColumnIndex": cell.col,
        }))
    }

    fn dimension_request(&self, dimension: &str, index: u32, px: u32) -> Result<Value> {
        Ok(json!({
            "updateDimensionProperties": {
                "range": {
                    "sheetId": self.sheet_id,
                    "dimension": dimension,
                    "startIndex": zero_based(index)?,
                    "endIndex": index,
                },
                "properties": { "pixelSize": px },
                "fields": "pixelSize",
            }
        }))
    }

    #[instrument(skip(self, request), err)]
    async fn batch_update(&self, request: Value) -> Result<()> {
        let body = json!({ "requests": [request] });
        debug!("POST {}", self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.token.secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!("Sheets batchUpdate failed with {}", status);
            return Err(anyhow!("Sheets API error: {} - {}", status, text));
        }
        Ok(())
    }
}

#[async_trait]
impl SpreadsheetSurface for SheetsClient {
    async fn clear_cell(&self, cell: GridPosition) -> Result<()> {
        self.batch_update(json!({
            "updateCells": {
                "range": self.cell_range(cell)?,
                "fields": "userEnteredValue",
            }
        }))
        .await
    }

    async fn set_formula(&self, cell: GridPosition, formula: &str) -> Result<()> {
        self.batch_update(json!({
            "updateCells": {
                "range": self.cell_range(cell)?,
                "rows": [{ "values": [{ "userEnteredValue": { "formulaValue": formula } }] }],
                "fields": "userEnteredValue",
            }
        }))
        .await
    }

    async fn set_row_height(&self, row: u32, px: u32) -> Result<()> {
        self.batch_update(self.dimension_request("ROWS", row, px)?).await
    }

    async fn set_column_width(&self, col: u32, px: u32) -> Result<()> {
        self.batch_update(self.dimension_request("COLUMNS", col, px)?).await
    }
}
