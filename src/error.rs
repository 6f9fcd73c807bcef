use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} returned {status}")]
    Status { url: String, status: StatusCode },
    #[error("body of {url} is not an html document: {reason}")]
    Parse { url: String, reason: String },
    #[error("required field `{field}` not found on {url}")]
    RequiredFieldMissing { field: &'static str, url: String },
    #[error("selector rule for `{field}` is invalid: {reason}")]
    InvalidRule { field: &'static str, reason: String },
    #[error("configured `{field}` is not a usable url: {reason}")]
    InvalidUrl { field: &'static str, reason: String },
}

impl ScrapeError {
    /// True when the failure came from the remote site rather than from local rules.
    pub fn is_upstream(&self) -> bool {
        !matches!(
            self,
            ScrapeError::InvalidRule { .. }
                | ScrapeError::InvalidUrl { .. }
                | ScrapeError::Client(_)
        )
    }
}
