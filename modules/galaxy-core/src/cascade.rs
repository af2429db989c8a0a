//! Ordered model cascade with a heuristic last resort.
//!
//! Each configured model gets one attempt under its own timeout. The first
//! answer that parses into an object is normalized into a
//! [`ClassificationRecord`]. When every model fails the caller gets
//! [`CascadeOutcome::AllFailed`], and [`Cascade::classify`] turns that into a
//! heuristic classification so a record is always produced.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use galaxy_common::{
    Category, ClassificationRecord, ClassifierConfig, URL_MISSING, URL_NONE,
};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::extract::extract_url;
use crate::heuristic::classify_heuristic;
use crate::prompt::{build_user_prompt, SYSTEM_PROMPT};
use crate::sanitize::parse_model_output;
use crate::traits::{ChatModel, Classifier, CompletionRequest, Progress};

#[derive(Debug, Clone)]
pub struct CascadeSettings {
    /// Tried in this order.
    pub models: Vec<String>,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_input_chars: usize,
}

impl Default for CascadeSettings {
    fn default() -> Self {
        Self::from(&ClassifierConfig::default())
    }
}

impl From<&ClassifierConfig> for CascadeSettings {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            models: config.models.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_input_chars: config.max_input_chars,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeOutcome {
    Success {
        record: ClassificationRecord,
        model: String,
    },
    AllFailed,
}

pub struct Cascade {
    model: Arc<dyn ChatModel>,
    settings: CascadeSettings,
}

impl Cascade {
    pub fn new(model: Arc<dyn ChatModel>, settings: CascadeSettings) -> Self {
        Self { model, settings }
    }

    pub fn settings(&self) -> &CascadeSettings {
        &self.settings
    }

    /// Try each model in order; stop at the first usable answer.
    pub async fn attempt(&self, text: &str, progress: Option<&dyn Progress>) -> CascadeOutcome {
        let url_hint = extract_url(text);
        let user = build_user_prompt(text, &url_hint, self.settings.max_input_chars);
        let total = self.settings.models.len();

        for (index, model) in self.settings.models.iter().enumerate() {
            if let Some(progress) = progress {
                progress
                    .update(&format!(
                        "🧠 Galaxy AI: analyzing ({}/{}, {})...",
                        index + 1,
                        total,
                        short_model_name(model)
                    ))
                    .await;
            }

            let request = CompletionRequest {
                model: model.as_str(),
                system: SYSTEM_PROMPT,
                user: &user,
                max_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
            };

            let raw = match tokio::time::timeout(self.settings.timeout, self.model.complete(&request))
                .await
            {
                Ok(Ok(raw)) => raw,
                Ok(Err(e)) => {
                    warn!(model = %model, error = %e, "Model call failed, trying next");
                    continue;
                }
                Err(_) => {
                    warn!(
                        model = %model,
                        timeout_secs = self.settings.timeout.as_secs(),
                        "Model timed out, trying next"
                    );
                    continue;
                }
            };

            let Some(value) = parse_model_output(&raw) else {
                warn!(model = %model, "Model answer is not parseable, trying next");
                continue;
            };

            let record = record_from_output(&value, &url_hint);
            info!(
                model = %model,
                section = %record.section,
                confidence = record.confidence,
                "Classified"
            );
            return CascadeOutcome::Success {
                record,
                model: model.clone(),
            };
        }

        CascadeOutcome::AllFailed
    }

    /// Like [`attempt`](Self::attempt), with the heuristic as final stage.
    pub async fn classify(
        &self,
        text: &str,
        progress: Option<&dyn Progress>,
    ) -> ClassificationRecord {
        match self.attempt(text, progress).await {
            CascadeOutcome::Success { record, .. } => record,
            CascadeOutcome::AllFailed => {
                warn!(
                    models = self.settings.models.len(),
                    "All models failed, using heuristic classification"
                );
                classify_heuristic(text)
            }
        }
    }
}

#[async_trait]
impl Classifier for Cascade {
    async fn classify(&self, text: &str, progress: Option<&dyn Progress>) -> ClassificationRecord {
        Cascade::classify(self, text, progress).await
    }
}

fn short_model_name(model: &str) -> &str {
    model.rsplit('/').next().unwrap_or(model)
}

fn is_none_like(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "" | "none" | "null" | "missing" | "n/a" | "nil"
    )
}

/// String view of a field. Numbers and booleans are stringified; `null`,
/// missing and none-like values are `None`.
fn text_field(value: &Value, key: &str) -> Option<String> {
    let text = match value.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!is_none_like(&text)).then_some(text)
}

fn confidence_field(value: &Value) -> u8 {
    let parsed = match value.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(c) if c.is_finite() => c.round().clamp(0.0, 100.0) as u8,
        _ => 100,
    }
}

fn is_absolute_http(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Normalize a parsed model answer. Missing fields get record defaults and
/// the link falls back to what the extractor found in the post.
pub(crate) fn record_from_output(value: &Value, url_hint: &str) -> ClassificationRecord {
    let defaults = ClassificationRecord::default();

    let section = match text_field(value, "section").map(|s| s.parse::<Category>()) {
        Some(Ok(section)) => section,
        Some(Err(e)) => {
            debug!(error = %e, "Model answered outside the taxonomy");
            Category::default()
        }
        None => Category::default(),
    };

    let fallback_url = if url_hint == URL_MISSING || url_hint.trim().is_empty() {
        URL_NONE.to_string()
    } else {
        url_hint.to_string()
    };
    let url = match text_field(value, "url") {
        Some(u) if u == URL_NONE => u,
        Some(u) if is_absolute_http(&u) => u,
        _ => fallback_url,
    };

    ClassificationRecord {
        section,
        alternative: text_field(value, "alternative").and_then(|a| Category::parse(&a)),
        confidence: confidence_field(value),
        name: text_field(value, "name").unwrap_or(defaults.name),
        desc: text_field(value, "desc").unwrap_or(defaults.desc),
        url,
        platform: text_field(value, "platform"),
        prompt_body: text_field(value, "prompt_body"),
        reply_text: text_field(value, "reply_text"),
    }
}
