//! Link extraction from free-form posts and URL canonicalization for
//! duplicate detection.

use std::sync::LazyLock;

use galaxy_common::URL_MISSING;
use regex::Regex;
use url::Url;

static RE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:https?://|www\.)[^\s<>")\]]+"#).expect("URL pattern is valid")
});

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ')', ']'];

/// Hosts of the chat platform itself. Links there are only kept when they
/// point at a specific message.
const CHAT_HOSTS: &[&str] = &["t.me", "telegram.me", "telegram.org", "telegram.dog"];

/// Query parameters that only identify a campaign or a share event.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "yclid", "dclid", "mc_cid", "mc_eid", "igshid", "ref", "ref_src", "si",
    "_hsenc", "_hsmi",
];

/// First external link in `text`, or `"MISSING"`.
pub fn extract_url(text: &str) -> String {
    RE_URL
        .find_iter(text)
        .filter_map(|m| clean_candidate(m.as_str()))
        .next()
        .unwrap_or_else(|| URL_MISSING.to_string())
}

fn clean_candidate(raw: &str) -> Option<String> {
    let trimmed = raw.trim_end_matches(TRAILING_PUNCTUATION);
    let absolute = if trimmed.starts_with("www.") {
        format!("https://{trimmed}")
    } else {
        trimmed.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;
    let host = parsed.host_str()?;
    if host.is_empty() || is_chat_internal(host, &parsed) {
        return None;
    }
    Some(absolute)
}

fn is_chat_internal(host: &str, parsed: &Url) -> bool {
    let host = host.trim_start_matches("www.");
    if !CHAT_HOSTS.contains(&host) {
        return false;
    }
    // t.me/channel/1234 is a permalink to a post and worth keeping.
    let is_permalink = parsed
        .path_segments()
        .map(|mut segments| {
            segments.any(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        })
        .unwrap_or(false);
    !is_permalink
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Drop tracking pairs from a raw query string, keeping the rest verbatim
/// and in order.
fn filter_query(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            !is_tracking_param(key)
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonical form used for duplicate detection: scheme, host, port and path
/// without trailing slash, plus the non-tracking query parameters.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let parsed = match Url::parse(trimmed) {
        Ok(parsed) if parsed.host_str().is_some() => parsed,
        _ => return trimmed.trim_end_matches('/').to_string(),
    };

    let mut out = format!(
        "{}://{}",
        parsed.scheme(),
        parsed.host_str().unwrap_or_default()
    );
    if let Some(port) = parsed.port() {
        out.push_str(&format!(":{port}"));
    }
    out.push_str(parsed.path().trim_end_matches('/'));

    let query = parsed.query().map(filter_query).unwrap_or_default();
    if !query.is_empty() {
        out.push('?');
        out.push_str(&query);
    }
    out
}

/// Remove tracking parameters but otherwise leave the link as written.
pub fn strip_tracking_params(raw: &str) -> String {
    let trimmed = raw.trim();
    let (before_fragment, fragment) = match trimmed.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (trimmed, None),
    };
    let Some((base, query)) = before_fragment.split_once('?') else {
        return trimmed.to_string();
    };

    let mut out = base.to_string();
    let query = filter_query(query);
    if !query.is_empty() {
        out.push('?');
        out.push_str(&query);
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_link_and_strips_punctuation() {
        assert_eq!(
            extract_url("Check out this tool https://example.com/widget, for Android"),
            "https://example.com/widget"
        );
        assert_eq!(
            extract_url("(see https://a.io/x).; and https://b.io"),
            "https://a.io/x"
        );
        assert_eq!(extract_url("list: [https://a.io/y]"), "https://a.io/y");
    }

    #[test]
    fn missing_when_no_link() {
        assert_eq!(extract_url("just some words"), "MISSING");
        assert_eq!(extract_url(""), "MISSING");
        assert_eq!(extract_url("broken https://."), "MISSING");
    }

    #[test]
    fn www_links_become_absolute() {
        assert_eq!(extract_url("go to www.rust-lang.org."), "https://www.rust-lang.org");
    }

    #[test]
    fn skips_chat_links_unless_permalink() {
        assert_eq!(
            extract_url("join t.me https://t.me/somechannel then https://github.com/a/b"),
            "https://github.com/a/b"
        );
        assert_eq!(
            extract_url("source: https://t.me/somechannel/1234"),
            "https://t.me/somechannel/1234"
        );
        assert_eq!(extract_url("https://telegram.me/joinchat"), "MISSING");
    }

    #[test]
    fn normalize_drops_tracking_keeps_functional_params() {
        assert_eq!(
            normalize_url("https://example.com/page?utm_source=x&id=7"),
            "https://example.com/page?id=7"
        );
        assert_eq!(
            normalize_url("https://example.com/page/?fbclid=abc"),
            "https://example.com/page"
        );
        assert_eq!(normalize_url("https://Example.com/a/#top"), "https://example.com/a");
        assert_eq!(normalize_url("http://h.io:8080/x/"), "http://h.io:8080/x");
    }

    #[test]
    fn normalize_unparseable_input() {
        assert_eq!(normalize_url("  not a url/ "), "not a url");
    }

    #[test]
    fn strip_tracking_keeps_shape() {
        assert_eq!(
            strip_tracking_params("https://example.com/page/?utm_medium=m&id=7#frag"),
            "https://example.com/page/?id=7#frag"
        );
        assert_eq!(
            strip_tracking_params("https://example.com/page?UTM_SOURCE=x"),
            "https://example.com/page"
        );
        assert_eq!(strip_tracking_params("#"), "#");
    }
}
