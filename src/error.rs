use thiserror::Error;

/// Failure to turn a preview document into a page snapshot
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The configured content selector is not valid CSS
    #[error("invalid content selector `{0}`")]
    InvalidSelector(String),

    /// The content selector matched nothing in the preview document
    #[error("content selector `{0}` matched nothing in the preview document")]
    ContentNotFound(String),
}

/// Failure to retrieve a preview, a translation bundle or a favicon
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be completed
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("failed fetching {url}: {status} {reason}")]
    Status {
        url: String,
        status: u16,
        reason: String,
    },

    /// The WebDriver session could not load the page
    #[error("webdriver failed loading {url}: {message}")]
    WebDriver { url: String, message: String },
}

/// Failure reported by, or while talking to, the analysis engine
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The engine handle could not be created
    #[error("could not create analysis engine: {0}")]
    Construction(String),

    /// `analyze` was called before `initialize`
    #[error("analysis engine is not initialized")]
    Uninitialized,

    /// The engine refused the content package or failed while assessing it
    #[error("analysis engine rejected the request: {0}")]
    Rejected(String),

    /// The channel to the engine broke down
    #[error("analysis engine unreachable: {0}")]
    Transport(String),
}

/// A second `analyze` was attempted while one was still outstanding
#[derive(Debug, Clone, Copy, Error)]
#[error("an analysis is already in flight")]
pub struct SessionBusy;

/// Errors that end a preview cycle and surface in the panel
#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Errors while loading the panel configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}
