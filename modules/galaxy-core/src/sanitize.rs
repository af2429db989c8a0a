//! Recovery of a JSON object from whatever a chat model answered with.
//!
//! Models wrap their answer in markdown fences, add prose around it, leave
//! trailing commas, or emit Python dict literals. Each repair step is tried
//! in turn; the first one that yields an object wins.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

static RE_FENCED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)\s*```").expect("fence pattern is valid")
});

static RE_TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("trailing comma pattern is valid"));

/// Parse a model answer into a JSON object. `None` when nothing usable is in it.
pub fn parse_model_output(raw: &str) -> Option<Value> {
    let candidate = extract_candidate(raw)?;
    let repaired = RE_TRAILING_COMMA.replace_all(&candidate, "$1");

    if let Some(value) = parse_object(&repaired) {
        return Some(value);
    }

    let converted = python_literal_to_json(&repaired);
    if let Some(value) = parse_object(&converted) {
        return Some(value);
    }

    debug!(
        preview = %ai_client::preview(raw, 200),
        "Model output is not a recoverable object"
    );
    None
}

fn extract_candidate(raw: &str) -> Option<String> {
    let body = RE_FENCED
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }
    Some(body[start..=end].to_string())
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

/// Rewrite a Python-style literal into JSON: single-quoted strings become
/// double-quoted, `True`/`False`/`None` become `true`/`false`/`null`, and raw
/// newlines inside strings are escaped.
fn python_literal_to_json(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) => {
                match c {
                    '\\' if i + 1 < chars.len() => {
                        let next = chars[i + 1];
                        if next == '\'' && q == '\'' {
                            out.push('\'');
                        } else {
                            out.push('\\');
                            out.push(next);
                        }
                        i += 1;
                    }
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    '"' if q == '\'' => out.push_str("\\\""),
                    c if c == q => {
                        out.push('"');
                        quote = None;
                    }
                    c => out.push(c),
                }
                i += 1;
            }
            None => {
                if c == '\'' || c == '"' {
                    out.push('"');
                    quote = Some(c);
                    i += 1;
                    continue;
                }
                if c.is_ascii_alphabetic() {
                    let start = i;
                    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();
                    out.push_str(match word.as_str() {
                        "True" => "true",
                        "False" => "false",
                        "None" => "null",
                        other => other,
                    });
                    continue;
                }
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_fenced_and_trailing_comma_payloads_agree() {
        let bare = r#"{"section": "dev", "name": "X"}"#;
        let fenced = "Here you go:\n```json\n{\"section\": \"dev\", \"name\": \"X\"}\n```\nEnjoy";
        let plain_fence = "```\n{\"section\": \"dev\", \"name\": \"X\"}\n```";
        let trailing = "{\"section\": \"dev\", \"name\": \"X\",}";

        let expected = json!({"section": "dev", "name": "X"});
        assert_eq!(parse_model_output(bare), Some(expected.clone()));
        assert_eq!(parse_model_output(fenced), Some(expected.clone()));
        assert_eq!(parse_model_output(plain_fence), Some(expected.clone()));
        assert_eq!(parse_model_output(trailing), Some(expected));
    }

    #[test]
    fn prose_around_braces_is_ignored() {
        let raw = "Sure! The answer is {\"section\": \"apk\", \"tags\": [1, 2,],} hope it helps";
        assert_eq!(
            parse_model_output(raw),
            Some(json!({"section": "apk", "tags": [1, 2]}))
        );
    }

    #[test]
    fn python_literals_are_converted() {
        let raw = "{'section': 'prompts', 'ok': True, 'alt': None, 'name': 'It\\'s \"quoted\"'}";
        assert_eq!(
            parse_model_output(raw),
            Some(json!({
                "section": "prompts",
                "ok": true,
                "alt": null,
                "name": "It's \"quoted\""
            }))
        );
    }

    #[test]
    fn raw_newlines_inside_strings_survive() {
        let raw = "{'prompt_body': 'line one\nline two'}";
        assert_eq!(
            parse_model_output(raw),
            Some(json!({"prompt_body": "line one\nline two"}))
        );
    }

    #[test]
    fn keywords_inside_strings_are_untouched() {
        let raw = "{'desc': 'True story about None', 'flag': False}";
        assert_eq!(
            parse_model_output(raw),
            Some(json!({"desc": "True story about None", "flag": false}))
        );
    }

    #[test]
    fn unrecoverable_input_is_none() {
        assert_eq!(parse_model_output(""), None);
        assert_eq!(parse_model_output("no json here"), None);
        assert_eq!(parse_model_output("} backwards {"), None);
        assert_eq!(parse_model_output("{not: valid: at all}"), None);
    }

    #[test]
    fn arrays_are_not_objects() {
        assert_eq!(parse_model_output("[{\"a\": 1}]"), Some(json!({"a": 1})));
        assert_eq!(parse_model_output("[1, 2]"), None);
    }
}
