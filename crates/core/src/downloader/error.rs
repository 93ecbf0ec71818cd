use thiserror::Error;

/// Errors from fetching clips.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("download of {url} failed with HTTP status {status}")]
    HttpStatus { status: u16, url: String },

    #[error("lookup of asset {id} failed with HTTP status {status}")]
    LookupStatus { status: u16, id: String },

    #[error("could not resolve asset {id}: {reason}")]
    Resolution { id: String, reason: String },

    #[error("download of {url} stalled for more than {timeout_secs}s")]
    Stalled { timeout_secs: u64, url: String },

    #[error("invalid file url: {0}")]
    InvalidFileUrl(String),

    #[error("asset {id} requires an api key but none is configured")]
    MissingCredentials { id: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    pub fn resolution(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
