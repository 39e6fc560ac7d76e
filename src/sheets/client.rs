use super::{AccessToken, SheetOperations};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com";

// Columns read from each tab
const SHEET_COLUMNS: &str = "A:Z";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetMetadata>,
}

#[derive(Debug, Deserialize)]
struct SheetMetadata {
    properties: Option<SheetProperties>,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: Option<String>,
}

pub struct SheetsClient {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(client: Client, spreadsheet_id: String) -> Result<Self> {
        Self::with_base_url(client, spreadsheet_id, SHEETS_API_URL)
    }

    pub fn with_base_url(client: Client, spreadsheet_id: String, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid Sheets API URL: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            spreadsheet_id,
        })
    }

    fn spreadsheet_endpoint(&self, extra: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("Invalid Sheets API URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str()])
            .extend(extra);
        Ok(url)
    }
}

/// Map a failed values request onto the per-sheet error taxonomy
async fn sheet_error(sheet_name: &str, response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let sheet = sheet_name.to_string();
    let message = format!("{} - {}", status, body);

    match status {
        StatusCode::FORBIDDEN => AppError::SheetAccess { sheet, message },
        StatusCode::NOT_FOUND => AppError::SheetNotFound { sheet, message },
        // Sheets reports a missing tab as an unparseable range
        StatusCode::BAD_REQUEST if body.contains("Unable to parse range") => {
            AppError::SheetNotFound { sheet, message }
        }
        _ => AppError::SheetFetch { sheet, message },
    }
}

fn cell_to_string(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetOperations for SheetsClient {
    #[instrument(name = "Fetching sheet", skip(self, token))]
    async fn read_sheet(&self, token: &AccessToken, sheet_name: &str) -> Result<Vec<Vec<String>>> {
        let range = format!("{}!{}", sheet_name, SHEET_COLUMNS);
        let url = self.spreadsheet_endpoint(&["values", &range])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| AppError::SheetFetch {
                sheet: sheet_name.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(sheet_error(sheet_name, response).await);
        }

        let range: ValueRange = response.json().await.map_err(|e| AppError::SheetFetch {
            sheet: sheet_name.to_string(),
            message: format!("Invalid values response: {}", e),
        })?;

        let rows: Vec<Vec<String>> = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();
        debug!(rows = rows.len(), "Read sheet");

        Ok(rows)
    }

    #[instrument(name = "Listing sheets", skip_all)]
    async fn sheet_titles(&self, token: &AccessToken) -> Result<Vec<String>> {
        let mut url = self.spreadsheet_endpoint(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let response = self
            .client
            .get(url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| AppError::SheetFetch {
                sheet: self.spreadsheet_id.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = format!("{} - {}", status, body);
            let sheet = self.spreadsheet_id.clone();
            return Err(match status {
                StatusCode::FORBIDDEN => AppError::SheetAccess { sheet, message },
                StatusCode::NOT_FOUND => AppError::SheetNotFound { sheet, message },
                _ => AppError::SheetFetch { sheet, message },
            });
        }

        let metadata: SpreadsheetMetadata =
            response.json().await.map_err(|e| AppError::SheetFetch {
                sheet: self.spreadsheet_id.clone(),
                message: format!("Invalid metadata response: {}", e),
            })?;

        Ok(metadata
            .sheets
            .into_iter()
            .filter_map(|sheet| sheet.properties.and_then(|p| p.title))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SPREADSHEET_ID: &str = "sheet-123";

    fn test_client(base_url: &str) -> SheetsClient {
        SheetsClient::with_base_url(Client::new(), SPREADSHEET_ID.to_string(), base_url).unwrap()
    }

    fn test_token() -> AccessToken {
        AccessToken::new("ya29.test".to_string(), Utc::now() + Duration::hours(1))
    }

    #[test]
    fn test_values_endpoint_encodes_sheet_name() {
        let client = test_client(SHEETS_API_URL);
        let url = client
            .spreadsheet_endpoint(&["values", "Room 3!A:Z"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/Room%203!A:Z"
        );
    }

    #[tokio::test]
    async fn test_read_sheet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-123/values/Room%203!A:Z"))
            .and(header("authorization", "Bearer ya29.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "range": "'Room 3'!A1:Z2",
                "majorDimension": "ROWS",
                "values": [
                    ["Room ID", "Room Type", "Smoke Alarm Count"],
                    ["R3", "Kitchen", 2]
                ]
            })))
            .mount(&server)
            .await;

        let rows = test_client(&server.uri())
            .read_sheet(&test_token(), "Room 3")
            .await
            .unwrap();

        assert_eq!(
            rows,
            vec![
                vec!["Room ID", "Room Type", "Smoke Alarm Count"],
                vec!["R3", "Kitchen", "2"],
            ]
        );
    }

    #[tokio::test]
    async fn test_read_empty_sheet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "range": "'Room 9'!A1:Z1000",
                "majorDimension": "ROWS"
            })))
            .mount(&server)
            .await;

        let rows = test_client(&server.uri())
            .read_sheet(&test_token(), "Room 9")
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_read_sheet_error_mapping() {
        let cases: [(u16, &str, &str); 4] = [
            (403, "The caller does not have permission", "access"),
            (404, "Requested entity was not found.", "not_found"),
            (400, "Unable to parse range: Room 12!A:Z", "not_found"),
            (500, "Internal error", "fetch"),
        ];

        for (status, message, expected) in cases {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
                    "error": {"code": status, "message": message}
                })))
                .mount(&server)
                .await;

            let err = test_client(&server.uri())
                .read_sheet(&test_token(), "Room 12")
                .await
                .unwrap_err();

            let matched = match expected {
                "access" => matches!(err, AppError::SheetAccess { ref sheet, .. } if sheet == "Room 12"),
                "not_found" => matches!(err, AppError::SheetNotFound { .. }),
                _ => matches!(err, AppError::SheetFetch { .. }),
            };
            assert!(matched, "status {} mapped to {:?}", status, err);
        }
    }

    #[tokio::test]
    async fn test_sheet_titles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-123"))
            .and(query_param("fields", "sheets.properties.title"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sheets": [
                    {"properties": {"title": "Room 1"}},
                    {"properties": {"title": "Summary"}},
                    {"properties": {"title": "Room 2"}}
                ]
            })))
            .mount(&server)
            .await;

        let titles = test_client(&server.uri())
            .sheet_titles(&test_token())
            .await
            .unwrap();
        assert_eq!(titles, vec!["Room 1", "Summary", "Room 2"]);
    }

    #[tokio::test]
    async fn test_sheet_titles_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .sheet_titles(&test_token())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SheetAccess { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_sheet_titles_unreachable() {
        // Nothing listens on the discard port
        let err = test_client("http://127.0.0.1:9")
            .sheet_titles(&test_token())
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::SheetFetch { ref sheet, .. } if sheet == SPREADSHEET_ID),
            "got {:?}",
            err
        );
    }
}
