use super::{print_json, room_sync};
use crate::config::Config;
use crate::error::Result;
use tracing::{info, warn};

pub async fn execute() -> Result<()> {
    let config = Config::load()?;
    let sync = room_sync(&config)?;

    let diagnosis = sync.diagnose().await;
    match diagnosis.success {
        true => info!(
            spreadsheet = %config.google.spreadsheet_id,
            missing = ?diagnosis.missing,
            "Service account can read the spreadsheet"
        ),
        false => warn!("Service account check failed"),
    }

    print_json(&diagnosis)
}
