#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Thin wrapper over the Google Sheets v4 REST API: list the tabs of a
//! spreadsheet and append grading rows to one of them.

use std::sync::LazyLock;

use bon::Builder;
use regex::Regex;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::Tabled;

use crate::error::SheetsError;

/// API root used by [`SheetsClient`] unless overridden.
pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4";

/// OAuth scope a token needs for reading and appending.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Columns written by [`SheetsClient::append_row`].
pub const APPEND_COLUMNS: &str = "A:F";

/// Matches the id segment of a spreadsheet link.
static SPREADSHEET_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)").expect("spreadsheet id regex"));

/// Pulls the spreadsheet id out of a link such as
/// `https://docs.google.com/spreadsheets/d/<id>/edit#gid=0`.
pub fn extract_spreadsheet_id(url: &str) -> Option<String> {
    SPREADSHEET_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Builds the A1 range for appends, quoting the sheet title.
pub fn append_range(sheet_title: &str) -> String {
    format!("'{}'!{APPEND_COLUMNS}", sheet_title.replace('\'', "''"))
}

/// One tab of a spreadsheet.
#[derive(Tabled, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worksheet {
    #[tabled(rename = "ID")]
    /// * `id`: numeric sheet id
    pub id:    i64,
    #[tabled(rename = "Title")]
    /// * `title`: tab name, used in ranges
    pub title: String,
}

/// Subset of the `spreadsheets.get` response we read.
#[derive(Deserialize)]
struct SpreadsheetResponse {
    /// Tabs of the spreadsheet
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

/// Wrapper around a sheet's properties.
#[derive(Deserialize)]
struct SheetEntry {
    /// Sheet properties
    properties: SheetProperties,
}

/// The sheet properties we care about.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    /// Numeric id
    sheet_id: i64,
    /// Tab name
    title:    String,
}

/// What an append wrote.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendResult {
    /// Details of the written cells
    #[serde(default)]
    pub updates: Option<AppendUpdates>,
}

/// Cells touched by an append.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendUpdates {
    /// A1 range that was written
    pub updated_range: Option<String>,
    /// Number of rows written
    pub updated_rows:  Option<i64>,
}

/// Authenticated Google Sheets client.
#[derive(Clone, Builder)]
#[builder(on(String, into))]
pub struct SheetsClient {
    /// Shared HTTP client
    #[builder(default)]
    http:         Client,
    /// OAuth bearer token with [`SHEETS_SCOPE`]
    access_token: String,
    /// API root
    #[builder(default = DEFAULT_SHEETS_ENDPOINT.to_string())]
    endpoint:     String,
}

impl SheetsClient {
    /// Builds a client from an optional stored token.
    pub fn authenticated(http: Client, token: Option<String>) -> Result<Self, SheetsError> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or(SheetsError::NotAuthenticated)?;
        Ok(Self::builder().http(http).access_token(token).build())
    }

    /// Joins `segments` onto the API root, percent-encoding each one.
    pub fn url(&self, segments: &[&str]) -> Result<Url, SheetsError> {
        let invalid = || SheetsError::InvalidEndpoint(self.endpoint.clone());
        let mut url = Url::parse(&self.endpoint).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Lists the tabs of a spreadsheet.
    pub async fn fetch_worksheets(&self, spreadsheet_id: &str) -> Result<Vec<Worksheet>, SheetsError> {
        let url = self.url(&["spreadsheets", spreadsheet_id])?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[("fields", "sheets.properties(sheetId,title)")])
            .send()
            .await?;

        let body: SpreadsheetResponse = check_status(response).await?.json().await?;
        Ok(body
            .sheets
            .into_iter()
            .map(|s| Worksheet {
                id:    s.properties.sheet_id,
                title: s.properties.title,
            })
            .collect())
    }

    /// Appends one row below the existing data of `sheet_title`.
    pub async fn append_row(
        &self,
        spreadsheet_id: &str,
        sheet_title: &str,
        values: Vec<String>,
    ) -> Result<AppendResult, SheetsError> {
        let range = append_range(sheet_title);
        let url = self.url(&["spreadsheets", spreadsheet_id, "values", &format!("{range}:append")])?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "values": [values] }))
            .send()
            .await?;

        let result: AppendResult = check_status(response).await?.json().await?;
        tracing::info!(
            "Appended row to {}",
            result
                .updates
                .as_ref()
                .and_then(|u| u.updated_range.as_deref())
                .unwrap_or(&range)
        );
        Ok(result)
    }
}

/// Turns a non-success response into [`SheetsError::Status`].
async fn check_status(response: Response) -> Result<Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!("Google Sheets API returned {status}: {body}");
    Err(SheetsError::Status { status, body })
}
