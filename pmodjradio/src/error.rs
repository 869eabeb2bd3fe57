//! Error types for the DJ radio client

/// Result type alias for DJ radio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching or analysing a channel
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed (connection, timeout, body decoding)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-200 status
    #[error("Cannot access {url}: HTTP {status}")]
    Fetch {
        /// Requested URL
        url: String,
        /// Status code returned by the server
        status: u16,
    },

    /// A listing page could not be turned into records
    #[error("{}", parse_message(.row, .message))]
    Parse {
        /// Index of the offending row within the page, if known
        row: Option<usize>,
        /// What went wrong
        message: String,
    },

    /// The embedded metadata block is not valid JSON
    #[error("Invalid channel metadata: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The channel exists but no program could be listed
    #[error("Channel has no programs")]
    EmptyChannel,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

fn parse_message(row: &Option<usize>, message: &str) -> String {
    match row {
        Some(row) => format!("Parsing failed at row {}: {}", row, message),
        None => format!("Parsing failed: {}", message),
    }
}

impl Error {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a page-level parsing error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            row: None,
            message: msg.into(),
        }
    }

    /// Create a parsing error attached to a table row
    pub fn row(row: usize, msg: impl Into<String>) -> Self {
        Self::Parse {
            row: Some(row),
            message: msg.into(),
        }
    }

    /// Attach a row index to a parsing error that has none
    pub(crate) fn at_row(self, row: usize) -> Self {
        match self {
            Self::Parse { row: None, message } => Self::Parse {
                row: Some(row),
                message,
            },
            other => other,
        }
    }
}
