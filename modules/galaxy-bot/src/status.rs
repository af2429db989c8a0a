use async_trait::async_trait;
use galaxy_core::{Progress, Reply};
use telegram_client::{InlineKeyboardButton, InlineKeyboardMarkup, TelegramClient};
use tokio::sync::Mutex;
use tracing::warn;

/// One bot message per conversation turn that is edited in place: progress
/// lines first, then the final reply with its buttons.
pub struct StatusMessage {
    client: TelegramClient,
    chat_id: i64,
    message_id: Mutex<Option<i64>>,
}

impl StatusMessage {
    /// Nothing is sent until the first update.
    pub fn new(client: TelegramClient, chat_id: i64) -> Self {
        Self {
            client,
            chat_id,
            message_id: Mutex::new(None),
        }
    }

    /// Reuse an existing bot message, e.g. the one carrying a pressed button.
    pub fn editing(client: TelegramClient, chat_id: i64, message_id: i64) -> Self {
        Self {
            client,
            chat_id,
            message_id: Mutex::new(Some(message_id)),
        }
    }

    async fn set(
        &self,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> telegram_client::Result<()> {
        let mut message_id = self.message_id.lock().await;
        match *message_id {
            Some(id) => {
                self.client
                    .edit_message_text(self.chat_id, id, text, keyboard)
                    .await
            }
            None => {
                let sent = self.client.send_message(self.chat_id, text, keyboard).await?;
                *message_id = Some(sent.message_id);
                Ok(())
            }
        }
    }

    pub async fn show(&self, reply: &Reply) -> telegram_client::Result<()> {
        let markup = keyboard(reply);
        self.set(&reply.text, markup.as_ref()).await
    }
}

#[async_trait]
impl Progress for StatusMessage {
    async fn update(&self, text: &str) {
        if let Err(e) = self.set(text, None).await {
            warn!(chat_id = self.chat_id, error = %e, "Failed to update status message");
        }
    }
}

pub fn keyboard(reply: &Reply) -> Option<InlineKeyboardMarkup> {
    if reply.buttons.is_empty() {
        return None;
    }
    let inline_keyboard = reply
        .buttons
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| InlineKeyboardButton {
                    text: button.label.clone(),
                    callback_data: button.data.clone(),
                })
                .collect()
        })
        .collect();
    Some(InlineKeyboardMarkup { inline_keyboard })
}
