use thiserror::Error;

/// Errors raised while driving the browser for a single site.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Navigation did not finish within the configured timeout.
    #[error("Navigation to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// Navigation failed for any other reason.
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// The browser itself misbehaved (tab gone, evaluation failed).
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, url::ParseError),
}

impl ScrapeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScrapeError::Timeout { .. })
    }
}
