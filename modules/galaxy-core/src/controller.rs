//! Conversation state machine.
//!
//! A post is classified, then the controller either publishes it right away
//! or parks the record in a [`Session`] while it waits for the user: a
//! missing link, a category choice when the model was unsure, or a decision
//! about a duplicate. Replies are transport-neutral; the bot turns
//! [`Reply::buttons`] into an inline keyboard.

use std::sync::Arc;

use galaxy_common::{Category, ClassificationRecord, ConversationConfig, URL_MISSING, URL_NONE};
use tracing::{debug, info};

use crate::extract::extract_url;
use crate::publish::{PublishOutcome, Publisher};
use crate::session::{ConversationId, Session, SessionState, SessionStore};
use crate::traits::{Classifier, Progress};

const CANCEL_COMMAND: &str = "/cancel";

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Below this confidence an alternative category is offered.
    pub confidence_threshold: u8,
    /// Links containing this marker are treated as missing.
    pub self_link_marker: Option<String>,
    /// Shorter posts are ignored.
    pub min_text_chars: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from(&ConversationConfig::default())
    }
}

impl From<&ConversationConfig> for ControllerSettings {
    fn from(config: &ConversationConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            self_link_marker: config
                .self_link_marker
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_lowercase),
            min_text_chars: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, action: ButtonAction) -> Self {
        Self {
            label: label.into(),
            data: action.data(),
        }
    }
}

/// Text shown to the user plus optional rows of buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub buttons: Vec<Vec<Button>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Vec<Button>>) -> Self {
        self.buttons = buttons;
        self
    }
}

/// Decoded callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// `cat_<key>`
    Category(Category),
    /// `dup_yes`
    DuplicateYes,
    /// `dup_no`, also used as the cancel button of the category choice.
    Cancel,
}

impl ButtonAction {
    pub fn parse(data: &str) -> Option<ButtonAction> {
        match data.trim() {
            "dup_yes" => Some(ButtonAction::DuplicateYes),
            "dup_no" => Some(ButtonAction::Cancel),
            other => other
                .strip_prefix("cat_")?
                .parse::<Category>()
                .ok()
                .map(ButtonAction::Category),
        }
    }

    pub fn data(&self) -> String {
        match self {
            ButtonAction::Category(cat) => format!("cat_{}", cat.as_str()),
            ButtonAction::DuplicateYes => "dup_yes".to_string(),
            ButtonAction::Cancel => "dup_no".to_string(),
        }
    }
}

pub struct Controller {
    classifier: Arc<dyn Classifier>,
    publisher: Arc<Publisher>,
    sessions: Arc<dyn SessionStore>,
    settings: ControllerSettings,
}

impl Controller {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        publisher: Arc<Publisher>,
        sessions: Arc<dyn SessionStore>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            classifier,
            publisher,
            sessions,
            settings,
        }
    }

    /// Handle an incoming text or caption. `None` means the message is
    /// silently ignored.
    pub async fn on_text(
        &self,
        conversation: ConversationId,
        text: &str,
        progress: Option<&dyn Progress>,
    ) -> Option<Reply> {
        let trimmed = text.trim();

        if let Some(session) = self.sessions.get(conversation).await {
            if trimmed.eq_ignore_ascii_case(CANCEL_COMMAND) {
                self.sessions.clear(conversation).await;
                return Some(Reply::text("🙅 Cancelled."));
            }
            return match session.state {
                SessionState::AwaitingManualLink => {
                    Some(self.on_manual_link(conversation, session, trimmed, progress).await)
                }
                SessionState::AwaitingCategoryChoice | SessionState::AwaitingDuplicateDecision => {
                    Some(Reply::text("👆 Use the buttons above, or send /cancel."))
                }
            };
        }

        if trimmed.chars().count() < self.settings.min_text_chars || trimmed.starts_with('/') {
            debug!(conversation, "Ignoring short text or command");
            return None;
        }

        if let Some(progress) = progress {
            progress.update("🧠 Galaxy AI: analyzing...").await;
        }
        let record = self.classifier.classify(text, progress).await;
        info!(
            conversation,
            section = %record.section,
            confidence = record.confidence,
            name = %record.name,
            "Post analyzed"
        );

        Some(self.route(conversation, record, progress).await)
    }

    /// Handle a pressed inline button.
    pub async fn on_button(
        &self,
        conversation: ConversationId,
        data: &str,
        progress: Option<&dyn Progress>,
    ) -> Option<Reply> {
        let Some(session) = self.sessions.get(conversation).await else {
            return Some(Reply::text("❌ This data is outdated. Send the post again."));
        };

        let action = ButtonAction::parse(data);
        debug!(conversation, data, state = ?session.state, "Button pressed");

        let reply = match (session.state, action) {
            (SessionState::AwaitingCategoryChoice, Some(ButtonAction::Category(category))) => {
                let mut record = session.record;
                record.section = category;
                if let Some(progress) = progress {
                    progress
                        .update(&format!("👌 Category: {}. Uploading...", category.upper()))
                        .await;
                }
                self.after_category(conversation, record, progress).await
            }
            (SessionState::AwaitingDuplicateDecision, Some(ButtonAction::DuplicateYes)) => {
                if let Some(progress) = progress {
                    progress.update("🚀 Force push...").await;
                }
                self.publish_and_reply(conversation, session.record, true)
                    .await
            }
            (
                SessionState::AwaitingCategoryChoice | SessionState::AwaitingDuplicateDecision,
                Some(ButtonAction::Cancel),
            ) => {
                self.sessions.clear(conversation).await;
                Reply::text("🙅 Cancelled.")
            }
            _ => Reply::text("⚠️ This button is no longer active."),
        };
        Some(reply)
    }

    async fn on_manual_link(
        &self,
        conversation: ConversationId,
        session: Session,
        text: &str,
        progress: Option<&dyn Progress>,
    ) -> Reply {
        let url = if text == URL_NONE {
            URL_NONE.to_string()
        } else {
            match extract_url(text) {
                found if found != URL_MISSING => found,
                _ => {
                    return Reply::text(
                        "⚠️ That doesn't look like a link. Send a link, or # to publish without one.",
                    )
                }
            }
        };

        let mut record = session.record;
        record.url = url;
        if let Some(progress) = progress {
            progress.update("🔄 Updating the catalogue...").await;
        }
        self.publish_and_reply(conversation, record, false).await
    }

    async fn route(
        &self,
        conversation: ConversationId,
        record: ClassificationRecord,
        progress: Option<&dyn Progress>,
    ) -> Reply {
        let unsure = record.confidence < self.settings.confidence_threshold;
        if let Some(alternative) = record.distinct_alternative().filter(|_| unsure) {
            let text = format!(
                "🤔 The AI is unsure (confidence: {}%)\nItem: {}\nWhere should it go?",
                record.confidence, record.name
            );
            let buttons = vec![
                vec![
                    Button::new(
                        format!("📂 {}", record.section.upper()),
                        ButtonAction::Category(record.section),
                    ),
                    Button::new(
                        format!("📂 {}", alternative.upper()),
                        ButtonAction::Category(alternative),
                    ),
                ],
                vec![Button::new("❌ Cancel", ButtonAction::Cancel)],
            ];
            self.sessions
                .put(
                    conversation,
                    Session::new(SessionState::AwaitingCategoryChoice, record),
                )
                .await;
            return Reply::text(text).with_buttons(buttons);
        }

        self.after_category(conversation, record, progress).await
    }

    /// Link check, then publish.
    async fn after_category(
        &self,
        conversation: ConversationId,
        record: ClassificationRecord,
        progress: Option<&dyn Progress>,
    ) -> Reply {
        if record.section.requires_link() && self.link_is_bad(&record.url) {
            let text = format!(
                "🧐 Item: {} -> Section: {}\n⚠️ Send a link (or # to publish without one).",
                record.name,
                record.section.upper()
            );
            self.sessions
                .put(
                    conversation,
                    Session::new(SessionState::AwaitingManualLink, record),
                )
                .await;
            return Reply::text(text);
        }

        if let Some(progress) = progress {
            progress
                .update(&format!(
                    "🚀 Publishing {} to {}...",
                    record.name,
                    record.section.upper()
                ))
                .await;
        }
        self.publish_and_reply(conversation, record, false).await
    }

    fn link_is_bad(&self, url: &str) -> bool {
        let trimmed = url.trim();
        if trimmed.is_empty()
            || trimmed == URL_MISSING
            || trimmed == URL_NONE
            || trimmed.eq_ignore_ascii_case("none")
        {
            return true;
        }
        self.settings
            .self_link_marker
            .as_deref()
            .is_some_and(|marker| trimmed.to_lowercase().contains(marker))
    }

    async fn publish_and_reply(
        &self,
        conversation: ConversationId,
        record: ClassificationRecord,
        force: bool,
    ) -> Reply {
        let outcome = self.publisher.publish(&record, force).await;
        info!(conversation, outcome = %outcome, force, "Publish finished");

        match outcome {
            PublishOutcome::Ok => {
                self.sessions.clear(conversation).await;
                let mut text = format!(
                    "✅ Published: {} -> {}",
                    record.name,
                    record.section.upper()
                );
                if force {
                    text.push_str(" (forced)");
                }
                if let Some(reply) = record.reply_text.as_deref() {
                    text.push_str("\n\n");
                    text.push_str(reply);
                }
                Reply::text(text)
            }
            PublishOutcome::Duplicate => {
                let buttons = vec![
                    vec![Button::new("✅ Add anyway", ButtonAction::DuplicateYes)],
                    vec![Button::new("❌ Cancel", ButtonAction::Cancel)],
                ];
                self.sessions
                    .put(
                        conversation,
                        Session::new(SessionState::AwaitingDuplicateDecision, record),
                    )
                    .await;
                Reply::text("⚠️ This link or title is already in the catalogue. Add it anyway?")
                    .with_buttons(buttons)
            }
            PublishOutcome::MarkerError => {
                self.sessions.clear(conversation).await;
                Reply::text(format!(
                    "❌ Marker {} not found in the document.",
                    record.section.marker()
                ))
            }
            PublishOutcome::GitError => {
                self.sessions.clear(conversation).await;
                Reply::text(format!("❌ Publishing failed (code: {outcome})."))
            }
        }
    }
}
