use std::fmt;
use std::sync::{Arc, LazyLock};

use galaxy_common::ClassificationRecord;
use regex::Regex;
use tracing::{info, warn};

use crate::extract::{normalize_url, strip_tracking_params};
use crate::render::{html_escape, render_card};
use crate::traits::{DocumentStore, StoreError};

static RE_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]*)""#).expect("href pattern is valid"));

/// Result of one publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Ok,
    /// The link or title is already in the document.
    Duplicate,
    /// The category's insertion marker is missing; nothing was written.
    MarkerError,
    /// Read or write against the store failed, including revision conflicts.
    GitError,
}

impl PublishOutcome {
    pub fn code(&self) -> &'static str {
        match self {
            PublishOutcome::Ok => "OK",
            PublishOutcome::Duplicate => "DUPLICATE",
            PublishOutcome::MarkerError => "MARKER_ERROR",
            PublishOutcome::GitError => "GIT_ERROR",
        }
    }
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Splices rendered cards into the shared document.
pub struct Publisher {
    store: Arc<dyn DocumentStore>,
}

impl Publisher {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Insert `record` above its category marker. `force` skips the
    /// duplicate check. Every call reads the document afresh.
    pub async fn publish(&self, record: &ClassificationRecord, force: bool) -> PublishOutcome {
        let document = match self.store.read().await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "Failed to read document");
                return PublishOutcome::GitError;
            }
        };

        if !force {
            if let Some(hit) = find_duplicate(&document.content, record) {
                info!(name = %record.name, matched = %hit, "Duplicate entry");
                return PublishOutcome::Duplicate;
            }
        }

        let marker = record.section.marker();
        let Some(position) = document.content.find(&marker) else {
            warn!(marker = %marker, "Insertion marker not found");
            return PublishOutcome::MarkerError;
        };

        let mut card_record = record.clone();
        if record.has_link() {
            card_record.url = strip_tracking_params(&record.url);
        }
        let card = render_card(&card_record);

        let mut updated = String::with_capacity(document.content.len() + card.len() + 1);
        updated.push_str(&document.content[..position]);
        updated.push_str(&card);
        updated.push('\n');
        updated.push_str(&document.content[position..]);

        let message = commit_message(record);
        match self
            .store
            .write(&updated, &document.revision, &message)
            .await
        {
            Ok(()) => {
                info!(
                    name = %record.name,
                    section = %record.section,
                    forced = force,
                    "Published"
                );
                PublishOutcome::Ok
            }
            Err(StoreError::Conflict(e)) => {
                warn!(error = %e, "Document changed while publishing");
                PublishOutcome::GitError
            }
            Err(e) => {
                warn!(error = %e, "Failed to write document");
                PublishOutcome::GitError
            }
        }
    }
}

pub fn commit_message(record: &ClassificationRecord) -> String {
    format!("Add: {} [{}] via GalaxyBot", record.name, record.section.upper())
}

/// What in `content` makes `record` a duplicate, if anything: a link whose
/// normalized form equals the record's, or the record's escaped title.
fn find_duplicate(content: &str, record: &ClassificationRecord) -> Option<String> {
    if record.has_link() {
        let normalized = normalize_url(&record.url);
        if !normalized.is_empty() {
            if content.contains(&normalized) || content.contains(&html_escape(&normalized)) {
                return Some(normalized);
            }
            let linked = RE_HREF
                .captures_iter(content)
                .any(|caps| normalize_url(&html_unescape(&caps[1])) == normalized);
            if linked {
                return Some(normalized);
            }
        }
    }

    let name = html_escape(record.name.trim());
    if !name.is_empty() && content.contains(&name) {
        return Some(name);
    }
    None
}

/// Inverse of [`html_escape`] for attribute values.
fn html_unescape(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use galaxy_common::Category;

    fn record(name: &str, url: &str) -> ClassificationRecord {
        ClassificationRecord {
            section: Category::Dev,
            name: name.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn outcome_codes() {
        assert_eq!(PublishOutcome::Ok.to_string(), "OK");
        assert_eq!(PublishOutcome::Duplicate.to_string(), "DUPLICATE");
        assert_eq!(PublishOutcome::MarkerError.to_string(), "MARKER_ERROR");
        assert_eq!(PublishOutcome::GitError.to_string(), "GIT_ERROR");
    }

    #[test]
    fn commit_message_format() {
        assert_eq!(
            commit_message(&record("Ripgrep", "https://github.com/x/rg")),
            "Add: Ripgrep [DEV] via GalaxyBot"
        );
    }

    #[test]
    fn duplicate_by_normalized_url() {
        let content = r#"<a href="https://example.com/page/?id=7">"#;
        let rec = record("Other", "https://example.com/page?utm_source=tg&id=7");
        assert!(find_duplicate(content, &rec).is_some());
    }

    #[test]
    fn duplicate_by_escaped_name() {
        let content = "<h3>Tom &amp; Jerry</h3>";
        assert!(find_duplicate(content, &record("Tom & Jerry", "#")).is_some());
        assert!(find_duplicate(content, &record("Tom and Jerry", "#")).is_none());
    }

    #[test]
    fn sentinel_urls_never_match() {
        let content = "MISSING # anything";
        assert!(find_duplicate(content, &record("Fresh", "MISSING")).is_none());
        assert!(find_duplicate(content, &record("Fresh", "#")).is_none());
    }

    #[test]
    fn duplicate_ignores_host_case_and_trailing_slash() {
        let content = r#"<a href="https://GitHub.com/owner/repo/" target="_blank">"#;
        assert!(find_duplicate(content, &record("Other", "https://github.com/owner/repo")).is_some());

        let content = r#"<a href="https://example.com/docs/?id=7&amp;utm_medium=tg">"#;
        assert!(find_duplicate(content, &record("Docs", "https://example.com/docs?id=7")).is_some());
    }

    #[test]
    fn different_query_is_not_a_duplicate() {
        let content = r#"<a href="https://example.com/docs/?id=7">"#;
        assert!(find_duplicate(content, &record("Docs", "https://example.com/docs/?id=8")).is_none());
    }

    #[test]
    fn unescape_reverses_escape() {
        let raw = r#"a&b <c> "d" 'e'"#;
        assert_eq!(html_unescape(&html_escape(raw)), raw);
    }

    #[test]
    fn escaped_query_in_document_still_matches() {
        let content = r#"href="https://example.com/s?a=1&amp;b=2""#;
        assert!(find_duplicate(content, &record("New", "https://example.com/s?a=1&b=2")).is_some());
    }
}
