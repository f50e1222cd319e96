/// Failure while retrieving a pricing page. Always recoverable through the
/// fallback chain; never surfaces to a boundary on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => FetchError::Status {
                status: status.as_u16(),
            },
            None => FetchError::Transport(e.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodemateError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("no pricing tiers could be extracted for {tool}")]
    Extraction { tool: String },

    #[error("Tool {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0} data unavailable.")]
    Unavailable(String),

    #[error("bad catalog: {0}")]
    Catalog(String),

    #[error("bad configuration: {0}")]
    Config(String),
}

impl CodemateError {
    /// HTTP status a boundary should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            CodemateError::Validation(_) => 400,
            CodemateError::NotFound(_) => 404,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, CodemateError>;
