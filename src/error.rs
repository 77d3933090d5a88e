use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrabError {
    #[error(
        "no images found at {url}; if this is a desktop URL, try the mobile page (m.comic.naver.com)"
    )]
    NoImagesFound { url: String },

    #[error("GET {url} failed after {attempts} attempt(s)")]
    FetchExhausted { url: String, attempts: usize },
}

impl GrabError {
    /// Process exit code the CLI reports for this condition.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NoImagesFound { .. } => 2,
            Self::FetchExhausted { .. } => 1,
        }
    }
}
