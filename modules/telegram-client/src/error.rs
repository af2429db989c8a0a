use thiserror::Error;

pub type Result<T> = std::result::Result<T, TelegramError>;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Long poll timed out")]
    Timeout,

    #[error("Bot API error ({code}): {description}")]
    Api { code: i64, description: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TelegramError::Timeout
        } else {
            TelegramError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TelegramError {
    fn from(err: serde_json::Error) -> Self {
        TelegramError::Parse(err.to_string())
    }
}
