use std::fmt;

use catalog_core::AlreadyRunning;

use crate::controller::ControllerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Errors surfaced by the harvesting pipeline.
///
/// `Fetch`, `Render` and `Parse` stay inside the pipeline: collection-level
/// ones end a collection, product-level ones land on the product record.
/// The remaining variants abort a whole harvest.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("fetch of {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("page controller failed on {url}: {source}")]
    Render {
        url: String,
        #[source]
        source: ControllerError,
    },
    #[error("could not parse {url}: {reason}")]
    Parse { url: String, reason: String },
    #[error("invalid harvest input: {0}")]
    InvalidInput(String),
    #[error("page controller session failed to start: {0}")]
    SessionStart(#[source] ControllerError),
    #[error(transparent)]
    AlreadyRunning(#[from] AlreadyRunning),
}

impl HarvestError {
    pub(crate) fn fetch(url: &str, source: FetchError) -> Self {
        HarvestError::Fetch {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn render(url: &str, source: ControllerError) -> Self {
        HarvestError::Render {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn parse(url: &str, reason: impl Into<String>) -> Self {
        HarvestError::Parse {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}
