use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Application configuration loaded from environment variables.
/// Contains only secrets and deployment-specific values; classifier and
/// conversation tunables live in the TOML [`FileConfig`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Credentials
    pub tg_token: String,
    pub github_token: String,
    pub hf_token: String,

    // Operators allowed to talk to the bot. Empty means anyone.
    pub allowed_user_ids: Vec<i64>,

    // Target document
    pub repo_name: String,
    pub file_path: String,
    pub branch: String,

    // Inference endpoint override (defaults to the Hugging Face router)
    pub inference_base_url: Option<String>,

    // Liveness endpoint
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            tg_token: required_env("TG_TOKEN")?,
            github_token: required_env("GITHUB_TOKEN")?,
            hf_token: required_env("HF_TOKEN")?,
            allowed_user_ids: parse_id_list(&std::env::var("ALLOWED_USER_IDS").unwrap_or_default())?,
            repo_name: std::env::var("REPO_NAME")
                .unwrap_or_else(|_| "YgalaxyY/BookMarkCore".to_string()),
            file_path: std::env::var("FILE_PATH").unwrap_or_else(|_| "index.html".to_string()),
            branch: std::env::var("BRANCH").unwrap_or_else(|_| "main".to_string()),
            inference_base_url: std::env::var("INFERENCE_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a number")?,
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().count().min(5);
            let head: String = val.chars().take(n).collect();
            format!("{}...({} chars)", head, val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  TG_TOKEN: {}", preview(&self.tg_token));
        tracing::info!("  GITHUB_TOKEN: {}", preview(&self.github_token));
        tracing::info!("  HF_TOKEN: {}", preview(&self.hf_token));
        tracing::info!("  ALLOWED_USER_IDS: {} entries", self.allowed_user_ids.len());
        tracing::info!(
            "  TARGET: {}:{} @ {}",
            self.repo_name,
            self.file_path,
            self.branch
        );
    }

    /// Empty allow-list admits everyone.
    pub fn is_allowed(&self, user_id: i64) -> bool {
        self.allowed_user_ids.is_empty() || self.allowed_user_ids.contains(&user_id)
    }
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("{key} environment variable is required"))
}

fn parse_id_list(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("ALLOWED_USER_IDS entry is not a number: {s}"))
        })
        .collect()
}

// --- File config ---

/// TOML-backed tunables. Every field has a default so the file is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub classifier: ClassifierConfig,
    pub conversation: ConversationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Tried in order; the first usable answer wins.
    pub models: Vec<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_input_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            models: vec![
                "meta-llama/Llama-3.3-70B-Instruct".to_string(),
                "Qwen/Qwen2.5-72B-Instruct".to_string(),
                "mistralai/Mistral-Small-24B-Instruct-2501".to_string(),
            ],
            timeout_secs: 30,
            max_tokens: 2500,
            temperature: 0.1,
            max_input_chars: 6000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversationConfig {
    /// Below this confidence the user is asked to pick between two categories.
    pub confidence_threshold: u8,
    pub session_ttl_secs: u64,
    /// Links containing this string point at the bookmark site itself and
    /// are treated as missing.
    pub self_link_marker: Option<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 80,
            session_ttl_secs: 3600,
            self_link_marker: Some("ygalaxyy".to_string()),
        }
    }
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<FileConfig> {
    Ok(toml::from_str(content)?)
}
