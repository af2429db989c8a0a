use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitHubError>;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The file changed since the sha we sent was read.
    #[error("Revision conflict on {path}: {message}")]
    Conflict { path: String, message: String },

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl GitHubError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, GitHubError::Conflict { .. })
    }
}

impl From<reqwest::Error> for GitHubError {
    fn from(err: reqwest::Error) -> Self {
        GitHubError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for GitHubError {
    fn from(err: serde_json::Error) -> Self {
        GitHubError::Parse(err.to_string())
    }
}

impl From<base64::DecodeError> for GitHubError {
    fn from(err: base64::DecodeError) -> Self {
        GitHubError::Decode(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for GitHubError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        GitHubError::Decode(err.to_string())
    }
}
