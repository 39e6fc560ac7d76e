use super::print_json;
use crate::config::Config;
use crate::error::Result;
use clap::Subcommand;
use serde::Serialize;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show the config file path
    Paths,
    /// Show the effective settings after environment overrides (no secrets)
    Config,
}

impl ShowResource {
    pub async fn execute(&self) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(),
            ShowResource::Config => {
                let config = Config::load()?;
                print_json(&SettingsSummary::from_config(&config))
            }
        }
    }
}

fn show_paths() -> Result<()> {
    let config_path = Config::config_file()?;
    info!(path = ?config_path, exists = config_path.exists(), "Config path");
    Ok(())
}

/// What a sync run will use. The private key is reported only as present or not.
#[derive(Debug, Serialize)]
struct SettingsSummary {
    spreadsheet_id: String,
    client_email: String,
    project_id: String,
    token_uri: String,
    private_key_set: bool,
    cache_seconds: u64,
    room_sheets: Vec<String>,
}

impl SettingsSummary {
    fn from_config(config: &Config) -> Self {
        let google = &config.google;
        Self {
            spreadsheet_id: google.spreadsheet_id.clone(),
            client_email: google.client_email.clone(),
            project_id: google.project_id.clone(),
            token_uri: google.token_uri.clone(),
            private_key_set: !google.private_key.trim().is_empty(),
            cache_seconds: config.sync.cache_seconds,
            room_sheets: config.sync.sheet_names(),
        }
    }
}
