use super::cache::{ALL_ROOMS_KEY, RoomCache, SyncCacheEntry, TtlPolicy};
use crate::error::{AppError, Result};
use crate::models::RoomSheetRecord;
use crate::sheets::{AccessToken, SheetOperations, TokenSource};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use indicatif::ProgressStyle;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{Span, debug, info, instrument, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;

/// Outcome of `fetch_all`. Failures are reported in `error`, never raised.
#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    pub success: bool,
    pub data: Vec<RoomSheetRecord>,
    pub cached: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncResult {
    fn from_entry(entry: &SyncCacheEntry, cached: bool) -> Self {
        Self {
            success: true,
            data: entry.records.as_ref().clone(),
            cached,
            timestamp: entry.fetched_at,
            error: None,
        }
    }

    fn failed(err: &AppError) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            cached: false,
            timestamp: Utc::now(),
            error: Some(err.to_string()),
        }
    }
}

/// Report of spreadsheet reachability and which room tabs exist.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    pub success: bool,
    pub authenticated: bool,
    pub spreadsheet_reachable: bool,
    pub present: Vec<String>,
    pub missing: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct RoomSync<A, S, C> {
    auth: A,
    sheets: S,
    cache: C,
    ttl: TtlPolicy,
    sheet_names: Vec<String>,
}

impl<A, S, C> RoomSync<A, S, C>
where
    A: TokenSource + Sync,
    S: SheetOperations + Sync,
    C: RoomCache,
{
    pub fn new(auth: A, sheets: S, cache: C, ttl: TtlPolicy, sheet_names: Vec<String>) -> Self {
        Self {
            auth,
            sheets,
            cache,
            ttl,
            sheet_names,
        }
    }

    /// Serve cached room data while fresh, otherwise fetch every room tab.
    pub async fn fetch_all(&self, force_refresh: bool) -> SyncResult {
        if !force_refresh
            && let Some(entry) = self.fresh_entry()
        {
            debug!(fetched_at = %entry.fetched_at, "Serving cached room data");
            return SyncResult::from_entry(&entry, true);
        }

        match self.refresh().await {
            Ok(entry) => SyncResult::from_entry(&entry, false),
            Err(e) => {
                warn!(error = %e, "Room sync failed");
                SyncResult::failed(&e)
            }
        }
    }

    /// Drop the cached entry so the next fetch goes to the network.
    pub fn invalidate(&self) {
        self.cache.clear();
        debug!("Room cache cleared");
    }

    /// Check credentials and spreadsheet reachability without reading rows.
    #[instrument(name = "Diagnosing spreadsheet access", skip_all)]
    pub async fn diagnose(&self) -> Diagnosis {
        let mut diagnosis = Diagnosis {
            success: false,
            authenticated: false,
            spreadsheet_reachable: false,
            present: Vec::new(),
            missing: Vec::new(),
            timestamp: Utc::now(),
            error: None,
        };

        let token = match self.auth.access_token().await {
            Ok(token) => token,
            Err(e) => {
                diagnosis.error = Some(e.to_string());
                return diagnosis;
            }
        };
        diagnosis.authenticated = true;

        let titles = match self.sheets.sheet_titles(&token).await {
            Ok(titles) => titles.into_iter().collect::<HashSet<_>>(),
            Err(e) => {
                diagnosis.error = Some(e.to_string());
                return diagnosis;
            }
        };
        diagnosis.spreadsheet_reachable = true;

        let (present, missing): (Vec<String>, Vec<String>) = self
            .sheet_names
            .iter()
            .cloned()
            .partition(|name| titles.contains(name));
        diagnosis.present = present;
        diagnosis.missing = missing;
        diagnosis.success = true;

        info!(
            present = diagnosis.present.len(),
            missing = diagnosis.missing.len(),
            "Spreadsheet reachable"
        );

        diagnosis
    }

    /// Read one tab and reduce it to a record, if it has one.
    pub async fn fetch_sheet(
        &self,
        token: &AccessToken,
        sheet_name: &str,
    ) -> Result<Option<RoomSheetRecord>> {
        let rows = self.sheets.read_sheet(token, sheet_name).await?;
        let record = RoomSheetRecord::from_sheet_rows(&rows);
        if record.is_none() {
            debug!(sheet = sheet_name, "Sheet has no usable room record");
        }
        Ok(record)
    }

    fn fresh_entry(&self) -> Option<SyncCacheEntry> {
        self.cache
            .get(ALL_ROOMS_KEY)
            .filter(|entry| self.ttl.is_fresh(entry.fetched_at, Utc::now()))
    }

    #[instrument(name = "Syncing rooms", skip_all)]
    async fn refresh(&self) -> Result<SyncCacheEntry> {
        let token = self
            .auth
            .access_token()
            .await
            .map_err(|e| AppError::FetchAll(Box::new(e)))?;

        let span = Span::current();
        span.pb_set_style(
            &ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
            )
            .map_err(|e| AppError::Other(e.into()))?,
        );
        span.pb_set_message("Fetching room sheets");
        span.pb_set_length(self.sheet_names.len() as u64);

        // Every sheet settles on its own; one failure never cancels the rest
        let results = join_all(self.sheet_names.iter().map(|name| {
            let token = &token;
            let span = &span;
            async move {
                let record = match self.fetch_sheet(token, name).await {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(sheet = %name, error = %e, "Skipping sheet");
                        None
                    }
                };
                span.pb_inc(1);
                record
            }
        }))
        .await;

        let records: Vec<RoomSheetRecord> = results.into_iter().flatten().collect();
        info!(
            rooms = records.len(),
            sheets = self.sheet_names.len(),
            "Room data fetched"
        );

        let entry = SyncCacheEntry::new(records, Utc::now());
        self.cache.set(ALL_ROOMS_KEY, entry.clone());

        Ok(entry)
    }
}
