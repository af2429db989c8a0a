//! Offline classification used when every remote model is unavailable.

use ai_client::truncate_chars;
use galaxy_common::{Category, ClassificationRecord, URL_MISSING, URL_NONE};

use crate::extract::extract_url;

/// Phrases that mark a post as a ready-to-use prompt. Matched case-sensitively.
const PROMPT_MARKERS: &[&str] = &[
    "I want you to act as",
    "Act as",
    "You are a",
    "You are an",
    "System prompt",
    "Prompt:",
    "Ты —",
    "Ты - ",
    "Представь, что ты",
    "Действуй как",
    "Веди себя как",
    "Промпт:",
];

const NAME_MAX_CHARS: usize = 60;
const DESC_MAX_CHARS: usize = 100;
const MIN_TITLE_CHARS: usize = 10;

/// Classify `text` without any network access. Always produces a record.
pub fn classify_heuristic(text: &str) -> ClassificationRecord {
    let found = extract_url(text);
    let url = if found == URL_MISSING {
        URL_NONE.to_string()
    } else {
        found
    };

    if let Some(start) = earliest_marker(text) {
        let body = text[start..].trim();
        return ClassificationRecord {
            section: Category::Prompts,
            confidence: 100,
            name: prompt_title(text),
            desc: truncate_chars(body, DESC_MAX_CHARS).to_string(),
            url,
            prompt_body: Some(body.to_string()),
            ..Default::default()
        };
    }

    let first_line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| truncate_chars(line, NAME_MAX_CHARS).to_string())
        .unwrap_or_else(|| "Resource".to_string());

    if url.contains("github.com") {
        return ClassificationRecord {
            section: Category::Dev,
            confidence: 100,
            name: first_line,
            url,
            ..Default::default()
        };
    }

    let desc = truncate_chars(text.trim(), DESC_MAX_CHARS);
    ClassificationRecord {
        section: Category::Ideas,
        confidence: 50,
        name: first_line,
        desc: if desc.is_empty() {
            ClassificationRecord::default().desc
        } else {
            desc.to_string()
        },
        url,
        ..Default::default()
    }
}

/// Byte offset of the first prompt marker in `text` that starts a word.
fn earliest_marker(text: &str) -> Option<usize> {
    PROMPT_MARKERS
        .iter()
        .filter_map(|marker| {
            text.match_indices(marker)
                .map(|(at, _)| at)
                .find(|&at| starts_word(text, at))
        })
        .min()
}

fn starts_word(text: &str, at: usize) -> bool {
    text[..at]
        .chars()
        .next_back()
        .map_or(true, |c| !c.is_alphanumeric())
}

fn prompt_title(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| line.chars().count() >= MIN_TITLE_CHARS && !line.contains("http"))
        .map(|line| truncate_chars(line, NAME_MAX_CHARS).to_string())
        .unwrap_or_else(|| "AI Prompt".to_string())
}
