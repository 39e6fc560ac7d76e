use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_DIR_PREFIX: &str = "room-sheets-sync";

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_CACHE_SECONDS: u64 = 300;
const DEFAULT_ROOM_SHEETS: u32 = 14;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub google: GoogleConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_email: String,
    /// PEM-encoded RSA key. Literal `\n` sequences are accepted in place of newlines.
    pub private_key: String,
    pub project_id: String,
    pub private_key_id: String,
    pub token_uri: String,
    pub spreadsheet_id: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_email: String::new(),
            private_key: String::new(),
            project_id: String::new(),
            private_key_id: String::new(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            spreadsheet_id: String::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SyncConfig {
    /// How long a successful fetch is served from cache
    pub cache_seconds: u64,
    /// Number of "Room N" tabs to read, starting at "Room 1"
    pub room_sheets: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cache_seconds: DEFAULT_CACHE_SECONDS,
            room_sheets: DEFAULT_ROOM_SHEETS,
        }
    }
}

impl SyncConfig {
    pub fn sheet_names(&self) -> Vec<String> {
        (1..=self.room_sheets).map(|n| format!("Room {}", n)).collect()
    }
}

impl Config {
    /// Load the config file if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file()?;

        let mut config = match config_path.exists() {
            true => {
                let contents = fs::read_to_string(&config_path)?;
                toml::from_str(&contents)
                    .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?
            }
            false => Config::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.google.private_key = unescape_newlines(&config.google.private_key);

        if config.google.spreadsheet_id.is_empty() {
            return Err(AppError::Config(format!(
                "google.spreadsheet_id must be set in {:?} or via GOOGLE_SHEETS_ID",
                config_path
            )));
        }

        Ok(config)
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let google = &mut self.google;
        let overrides: [(&str, &mut String); 6] = [
            ("GOOGLE_SERVICE_ACCOUNT_EMAIL", &mut google.client_email),
            ("GOOGLE_PRIVATE_KEY", &mut google.private_key),
            ("GOOGLE_PROJECT_ID", &mut google.project_id),
            ("GOOGLE_PRIVATE_KEY_ID", &mut google.private_key_id),
            ("GOOGLE_TOKEN_URI", &mut google.token_uri),
            ("GOOGLE_SHEETS_ID", &mut google.spreadsheet_id),
        ];

        for (key, field) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *field = value;
            }
        }
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file("config.toml")
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))
    }
}

// Keys pasted into env files usually carry escaped newlines
fn unescape_newlines(key: &str) -> String {
    key.replace("\\n", "\n")
}
