use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source '{source_name}' is missing required column: {column}")]
    MissingColumn { source_name: String, column: String },

    #[error("Station list error: {0}")]
    Stations(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, CleanerError>;
