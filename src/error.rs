use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Service account authentication error: {0}")]
    Auth(String),

    #[error("Service account lacks access to sheet '{sheet}': {message}")]
    SheetAccess { sheet: String, message: String },

    #[error("Sheet '{sheet}' not found: {message}")]
    SheetNotFound { sheet: String, message: String },

    #[error("Failed to fetch sheet '{sheet}': {message}")]
    SheetFetch { sheet: String, message: String },

    #[error("Failed to fetch room data: {0}")]
    FetchAll(Box<AppError>),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
