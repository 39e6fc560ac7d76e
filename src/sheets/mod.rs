pub(crate) mod auth;
mod client;

pub use auth::{AccessToken, ServiceAccountAuth, ServiceAccountCredentials};
pub use client::SheetsClient;

use crate::error::Result;
use async_trait::async_trait;

/// Produces a bearer token for one fetch cycle.
#[async_trait]
pub trait TokenSource {
    async fn access_token(&self) -> Result<AccessToken>;
}

#[async_trait]
pub trait SheetOperations {
    /// Read the raw rows of a tab, first row being the headers.
    async fn read_sheet(&self, token: &AccessToken, sheet_name: &str) -> Result<Vec<Vec<String>>>;

    /// List the titles of every tab in the spreadsheet.
    async fn sheet_titles(&self, token: &AccessToken) -> Result<Vec<String>>;
}
