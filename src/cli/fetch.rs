use super::{print_json, room_sync};
use crate::config::Config;
use crate::error::Result;
use tracing::info;

pub async fn execute(force: bool) -> Result<()> {
    let config = Config::load()?;
    let sync = room_sync(&config)?;

    let result = sync.fetch_all(force).await;
    if result.success {
        info!(rooms = result.data.len(), "Fetch completed");
    }

    print_json(&result)
}
