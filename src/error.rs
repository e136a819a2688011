use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Browser session is not open")]
    SessionClosed,

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Timed out after {secs}s waiting for {what}")]
    WaitTimeout { what: String, secs: u64 },

    #[error("No alert dialog present")]
    NoAlert,

    #[error("JavaScript evaluation failed: {0}")]
    Evaluation(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("Could not parse number from {0:?}")]
    NumberParse(String),

    #[error("Could not parse duration from {0:?}")]
    DurationParse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Detail listener is no longer running")]
    ListenerGone,

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error("General error: {0}")]
    General(String),
}

impl CrawlError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::LaunchFailed(_) | Self::SessionClosed | Self::ListenerGone => 3,
            Self::WaitTimeout { .. } => 4,
            Self::ElementNotFound { .. } => 5,
            Self::IoError(_) | Self::CsvError(_) | Self::ScreenshotFailed(_) => 6,
            Self::ConfigError(_) | Self::TomlDeError(_) | Self::TomlSerError(_) => 7,
            Self::InvalidUrl(_) => 2,
            _ => 1,
        }
    }
}
