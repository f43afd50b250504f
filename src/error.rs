use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Notify error: {0}")]
    Notify(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a page body could not be turned into typed data.
#[derive(Debug, Error)]
pub enum ParseError {
    /// No decode strategy recognised the body. Callers log and skip the tick.
    #[error("unrecognized page shape")]
    UnrecognizedShape,

    /// The embedded `data-page` attribute was found but is not valid JSON.
    #[error("embedded page data is not valid JSON: {0}")]
    Malformed(serde_json::Error),

    /// Valid JSON that does not match the expected page schema.
    #[error("page data does not match schema: {0}")]
    Schema(serde_json::Error),
}

impl AppError {
    /// True for transport failures and non-success HTTP statuses.
    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Network(_) | AppError::HttpStatus { .. })
    }

    pub fn is_unrecognized_shape(&self) -> bool {
        matches!(self, AppError::Parse(ParseError::UnrecognizedShape))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
