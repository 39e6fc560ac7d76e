use super::room_sync;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::RoomSheetRecord;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{info, instrument};

#[instrument(name = "Exporting rooms", skip_all, fields(output = ?output))]
pub async fn execute(output: &Path, force: bool) -> Result<()> {
    let config = Config::load()?;
    let sync = room_sync(&config)?;

    let result = sync.fetch_all(force).await;
    if !result.success {
        let message = result.error.unwrap_or_else(|| "Room sync failed".to_string());
        return Err(AppError::Other(anyhow::anyhow!(message)));
    }

    let file = File::create(output)?;
    write_rooms_csv(&result.data, file)?;

    info!(rooms = result.data.len(), "Export completed");

    Ok(())
}

/// One row per room; field columns are the sorted union of every room's keys.
fn write_rooms_csv<W: Write>(records: &[RoomSheetRecord], writer: W) -> Result<()> {
    let keys: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.fields.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec!["Room ID", "Room Type"];
    header.extend(keys.iter().copied());
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![record.room_id.clone(), record.room_type.clone()];
        row.extend(keys.iter().map(|key| {
            record
                .fields
                .get(*key)
                .map(|value| value.to_string())
                .unwrap_or_default()
        }));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}
