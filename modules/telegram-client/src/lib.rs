pub mod error;
pub mod types;

pub use error::{Result, TelegramError};
pub use types::{
    CallbackQuery, Chat, InlineKeyboardButton, InlineKeyboardMarkup, Message, Update, User,
};

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use types::ApiResponse;

const BASE_URL: &str = "https://api.telegram.org";

/// Telegram rejects messages above 4096 characters.
const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.base_url.trim_end_matches('/'),
            self.token,
            method
        )
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
        timeout: Option<Duration>,
    ) -> Result<T> {
        let mut request = self.client.post(self.method_url(method)).json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let resp = request.send().await?;
        let body = resp.text().await?;
        let parsed: ApiResponse<T> = serde_json::from_str(&body)?;

        match parsed {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            other => Err(TelegramError::Api {
                code: other.error_code.unwrap_or_default(),
                description: other
                    .description
                    .unwrap_or_else(|| "missing result".to_string()),
            }),
        }
    }

    /// Long-poll for updates after `offset`. The HTTP timeout leaves 15s of
    /// headroom over the server-side poll.
    pub async fn get_updates(&self, offset: i64, poll_secs: u64) -> Result<Vec<Update>> {
        let payload = json!({
            "offset": offset,
            "timeout": poll_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        self.call(
            "getUpdates",
            &payload,
            Some(Duration::from_secs(poll_secs + 15)),
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": clamp_text(text),
        });
        if let Some(markup) = keyboard.filter(|m| !m.is_empty()) {
            payload["reply_markup"] = serde_json::to_value(markup)?;
        }
        self.call("sendMessage", &payload, None).await
    }

    /// Replace a message's text (and keyboard). An omitted keyboard removes
    /// the buttons. "message is not modified" is not an error.
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<()> {
        let mut payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": clamp_text(text),
        });
        if let Some(markup) = keyboard.filter(|m| !m.is_empty()) {
            payload["reply_markup"] = serde_json::to_value(markup)?;
        }
        match self.call::<Value>("editMessageText", &payload, None).await {
            Ok(_) => Ok(()),
            Err(TelegramError::Api { description, .. })
                if description.contains("message is not modified") =>
            {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Acknowledge a button press so the client stops its spinner.
    pub async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut payload = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            payload["text"] = Value::String(text.to_string());
        }
        self.call::<bool>("answerCallbackQuery", &payload, None)
            .await
            .map(|_| ())
    }

    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<()> {
        let payload = json!({ "drop_pending_updates": drop_pending_updates });
        self.call::<bool>("deleteWebhook", &payload, None)
            .await
            .map(|_| ())
    }
}

fn clamp_text(text: &str) -> String {
    match text.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((idx, _)) => format!("{}\n\n[truncated]", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url() {
        let client = TelegramClient::new("123:abc".into());
        assert_eq!(
            client.method_url("getUpdates"),
            "https://api.telegram.org/bot123:abc/getUpdates"
        );
    }

    #[test]
    fn test_clamp_text_leaves_short_text() {
        assert_eq!(clamp_text("hello"), "hello");
        let long = "я".repeat(MAX_MESSAGE_CHARS + 10);
        let clamped = clamp_text(&long);
        assert!(clamped.ends_with("[truncated]"));
        assert_eq!(clamped.chars().filter(|c| *c == 'я').count(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn test_parse_updates() {
        let body = r#"{"ok":true,"result":[
            {"update_id":10,"message":{"message_id":1,"chat":{"id":42},"from":{"id":7,"first_name":"A"},"caption":"look https://x.io"}},
            {"update_id":11,"callback_query":{"id":"cb1","from":{"id":7,"first_name":"A"},"data":"dup_yes","message":{"message_id":2,"chat":{"id":42}}}}
        ]}"#;
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(body).unwrap();
        let updates = parsed.result.unwrap();
        assert_eq!(updates.len(), 2);
        let msg = updates[0].message.as_ref().unwrap();
        assert_eq!(msg.content(), Some("look https://x.io"));
        let cb = updates[1].callback_query.as_ref().unwrap();
        assert_eq!(cb.data.as_deref(), Some("dup_yes"));
        assert_eq!(cb.message.as_ref().unwrap().chat.id, 42);
    }

    #[test]
    fn test_parse_error_envelope() {
        let body = r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#;
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(body).unwrap();
        assert!(!parsed.ok);
        assert!(parsed.result.is_none());
        assert_eq!(parsed.error_code, Some(401));
    }

    #[test]
    fn test_keyboard_serialization() {
        let markup = InlineKeyboardMarkup {
            inline_keyboard: vec![vec![InlineKeyboardButton {
                text: "Yes".into(),
                callback_data: "dup_yes".into(),
            }]],
        };
        let json = serde_json::to_value(&markup).unwrap();
        assert_eq!(json["inline_keyboard"][0][0]["callback_data"], "dup_yes");
        assert!(InlineKeyboardMarkup::default().is_empty());
    }
}
