pub mod cascade;
pub mod controller;
pub mod extract;
pub mod heuristic;
pub mod prompt;
pub mod publish;
pub mod render;
pub mod sanitize;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use cascade::{Cascade, CascadeOutcome, CascadeSettings};
pub use controller::{Button, ButtonAction, Controller, ControllerSettings, Reply};
pub use extract::{extract_url, normalize_url, strip_tracking_params};
pub use heuristic::classify_heuristic;
pub use publish::{PublishOutcome, Publisher};
pub use render::{render_card, render_card_with_id};
pub use sanitize::parse_model_output;
pub use session::{ConversationId, MemorySessionStore, Session, SessionState, SessionStore};
pub use traits::{
    ChatModel, Classifier, CompletionRequest, DocumentStore, GitHubDocument, Progress,
    RemoteDocument, StoreError,
};
