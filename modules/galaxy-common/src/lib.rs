pub mod config;
pub mod error;
pub mod types;

pub use config::{
    load_config, parse_config, AppConfig, ClassifierConfig, ConversationConfig, FileConfig,
};
pub use error::GalaxyError;
pub use types::*;
