//! Long-polling loop and per-update dispatch.
//!
//! Updates are queued per chat and drained by one worker per chat, so the
//! turns of one conversation run in arrival order while other chats proceed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use galaxy_common::AppConfig;
use galaxy_core::Controller;
use telegram_client::{CallbackQuery, Message, TelegramClient, TelegramError, Update};
use tracing::{debug, info, warn};

use crate::queue::{ChatQueues, TurnHandler};
use crate::status::StatusMessage;

/// Server-side long poll duration.
const POLL_SECS: u64 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(5);
const GENERIC_FAILURE: &str = "❌ Something went wrong. Please try again.";

#[derive(Clone)]
pub struct Bot {
    client: TelegramClient,
    queues: ChatQueues<Update>,
}

impl Bot {
    pub fn new(client: TelegramClient, controller: Arc<Controller>, config: Arc<AppConfig>) -> Self {
        let turns: Arc<dyn TurnHandler<Update>> = Arc::new(Turns {
            client: client.clone(),
            controller,
            config,
        });
        Self {
            client,
            queues: ChatQueues::new(turns),
        }
    }

    /// Poll until a fatal error. Transient failures are retried here.
    pub async fn run(&self) -> Result<()> {
        self.client
            .delete_webhook(true)
            .await
            .context("Failed to delete webhook")?;
        info!("Polling for updates");

        let mut offset: i64 = 0;
        loop {
            let updates = match self.client.get_updates(offset, POLL_SECS).await {
                Ok(updates) => updates,
                // Normal when the long poll outlives the HTTP timeout
                Err(TelegramError::Timeout) => continue,
                Err(TelegramError::Api { code: 401, description }) => {
                    bail!("Bot token rejected: {description}")
                }
                Err(e) => {
                    warn!(error = %e, "getUpdates failed");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                self.dispatch(update).await;
            }
        }
    }

    async fn dispatch(&self, update: Update) {
        let Some(chat_id) = chat_of(&update) else {
            debug!(update_id = update.update_id, "Ignoring update without chat");
            return;
        };
        self.queues.submit(chat_id, update).await;
    }
}

/// Runs one conversation turn against the controller.
struct Turns {
    client: TelegramClient,
    controller: Arc<Controller>,
    config: Arc<AppConfig>,
}

#[async_trait]
impl TurnHandler<Update> for Turns {
    async fn handle(&self, chat_id: i64, update: Update) {
        if let Err(e) = self.turn(chat_id, update).await {
            warn!(chat_id, error = %e, "Conversation turn failed");
            if let Err(e) = self.client.send_message(chat_id, GENERIC_FAILURE, None).await {
                warn!(chat_id, error = %e, "Failed to report failure");
            }
        }
    }
}

impl Turns {
    async fn turn(&self, chat_id: i64, update: Update) -> Result<()> {
        if let Some(callback) = update.callback_query {
            return self.handle_callback(chat_id, callback).await;
        }
        if let Some(message) = update.message {
            return self.handle_message(chat_id, message).await;
        }
        Ok(())
    }

    async fn handle_message(&self, chat_id: i64, message: Message) -> Result<()> {
        let user_id = message.from.as_ref().map(|u| u.id).unwrap_or_default();
        if !self.config.is_allowed(user_id) {
            warn!(user_id, chat_id, "Unauthorized sender ignored");
            return Ok(());
        }
        let Some(text) = message.content() else {
            return Ok(());
        };

        let status = StatusMessage::new(self.client.clone(), chat_id);
        if let Some(reply) = self.controller.on_text(chat_id, text, Some(&status)).await {
            status.show(&reply).await?;
        }
        Ok(())
    }

    async fn handle_callback(&self, chat_id: i64, callback: CallbackQuery) -> Result<()> {
        if let Err(e) = self.client.answer_callback_query(&callback.id, None).await {
            debug!(error = %e, "Failed to answer callback query");
        }
        if !self.config.is_allowed(callback.from.id) {
            warn!(user_id = callback.from.id, chat_id, "Unauthorized button press ignored");
            return Ok(());
        }
        let data = callback.data.as_deref().unwrap_or_default();

        let status = match &callback.message {
            Some(message) => {
                StatusMessage::editing(self.client.clone(), chat_id, message.message_id)
            }
            None => StatusMessage::new(self.client.clone(), chat_id),
        };
        if let Some(reply) = self.controller.on_button(chat_id, data, Some(&status)).await {
            status.show(&reply).await?;
        }
        Ok(())
    }
}

/// Conversation key of an update: the chat of the message, or of the
/// message carrying the pressed button. Button presses without a message
/// fall back to the presser's private chat.
pub fn chat_of(update: &Update) -> Option<i64> {
    if let Some(callback) = &update.callback_query {
        return Some(
            callback
                .message
                .as_ref()
                .map(|m| m.chat.id)
                .unwrap_or(callback.from.id),
        );
    }
    update.message.as_ref().map(|m| m.chat.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn chat_of_message_and_callback() {
        let msg = update(r#"{"update_id": 1, "message": {"message_id": 5, "chat": {"id": -100}, "text": "hi"}}"#);
        assert_eq!(chat_of(&msg), Some(-100));

        let cb = update(
            r#"{"update_id": 2, "callback_query": {"id": "q", "from": {"id": 9, "first_name": "A"},
                "message": {"message_id": 6, "chat": {"id": 77}}, "data": "dup_yes"}}"#,
        );
        assert_eq!(chat_of(&cb), Some(77));

        let orphan = update(
            r#"{"update_id": 3, "callback_query": {"id": "q", "from": {"id": 9}, "data": "dup_no"}}"#,
        );
        assert_eq!(chat_of(&orphan), Some(9));

        assert_eq!(chat_of(&update(r#"{"update_id": 4}"#)), None);
    }
}
