mod diagnose;
mod export;
mod fetch;
mod serve;
mod show;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::sheets::{ServiceAccountAuth, ServiceAccountCredentials, SheetsClient};
use crate::sync::{MemoryCache, RoomSync, TtlPolicy};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use show::ShowResource;

pub(crate) type LiveSync = RoomSync<ServiceAccountAuth, SheetsClient, MemoryCache>;

#[derive(Parser, Debug)]
#[command(name = "room-sheets-sync")]
#[command(about = "Sync per-room property data from Google Sheets with a service account", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Fetch { force } => fetch::execute(*force).await,
            Commands::Diagnose => diagnose::execute().await,
            Commands::Serve { bind } => serve::execute(bind).await,
            Commands::Export { output, force } => export::execute(output, *force).await,
            Commands::Show { resource } => resource.execute().await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch room data and print it as JSON
    Fetch {
        /// Ignore any cached data
        #[arg(long)]
        force: bool,
    },
    /// Check service account access and which room sheets exist
    Diagnose,
    /// Serve the /api/sheets endpoints over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: String,
    },
    /// Write fetched room data to a CSV file
    Export {
        #[arg(long, short)]
        output: PathBuf,
        #[arg(long)]
        force: bool,
    },
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}

/// Wire the live service account, Sheets client and in-memory cache together
pub(crate) fn room_sync(config: &Config) -> Result<LiveSync> {
    let credentials = ServiceAccountCredentials::from_config(&config.google)?;

    let http_client = reqwest::Client::builder()
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

    let auth = ServiceAccountAuth::new(credentials, http_client.clone());
    let sheets = SheetsClient::new(http_client, config.google.spreadsheet_id.clone())?;

    Ok(RoomSync::new(
        auth,
        sheets,
        MemoryCache::new(),
        TtlPolicy::from_secs(config.sync.cache_seconds),
        config.sync.sheet_names(),
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
