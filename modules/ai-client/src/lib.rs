pub mod error;
pub mod inference;
pub mod traits;
pub mod util;

pub use error::{AiError, Result};
pub use inference::{ChatOptions, InferenceClient, HF_ROUTER_URL};
pub use traits::{Message, MessageRole};
pub use util::{preview, truncate_chars};
