use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GalaxyError {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
}
