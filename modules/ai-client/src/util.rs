/// Truncate a string to at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Short single-line preview of model output for log lines.
pub fn preview(s: &str, max_chars: usize) -> String {
    let flat: String = s
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let cut = truncate_chars(&flat, max_chars);
    if cut.len() < flat.len() {
        format!("{cut}...")
    } else {
        cut.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_multibyte() {
        let text = "Привет мир";
        assert_eq!(truncate_chars(text, 6), "Привет");
    }

    #[test]
    fn test_truncate_within_bounds() {
        assert_eq!(truncate_chars("Hello", 100), "Hello");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_preview_flattens_newlines() {
        assert_eq!(preview("{\n\"a\": 1\n}", 100), "{ \"a\": 1 }");
        assert_eq!(preview("abcdef", 3), "abc...");
    }
}
