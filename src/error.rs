use thiserror::Error;

/// Everything that can go wrong while refreshing one dataset.
///
/// `Fetch`, `Schema` and `Persistence` are recoverable at the commodity level,
/// the orchestrator logs them and moves on.  `Config` aborts the whole run.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("unexpected data: {0}")]
    Schema(String),
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FeedError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, FeedError::Config(_))
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FeedError::Schema(e.to_string())
        } else {
            FeedError::Fetch(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Schema(e.to_string())
    }
}

impl From<std::io::Error> for FeedError {
    fn from(e: std::io::Error) -> Self {
        FeedError::Persistence(e.to_string())
    }
}

impl From<duckdb::Error> for FeedError {
    fn from(e: duckdb::Error) -> Self {
        FeedError::Schema(e.to_string())
    }
}

impl From<jiff::Error> for FeedError {
    fn from(e: jiff::Error) -> Self {
        FeedError::Schema(e.to_string())
    }
}
