//! Formatting helpers for the detail panel.

use chrono::Duration;

/// Compact human duration: `850ms`, `4.2s`, `3.5m`, `1.2h`.
pub fn format_duration(d: Duration) -> String {
    let ms = d.num_milliseconds().max(0);
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else if ms < 3_600_000 {
        format!("{:.1}m", ms as f64 / 60_000.0)
    } else {
        format!("{:.1}h", ms as f64 / 3_600_000.0)
    }
}

/// One rendered line. `key` is padded to the widest key of its block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLine {
    pub key: Option<String>,
    pub text: String,
}

impl DetailLine {
    fn text(text: impl Into<String>) -> Self {
        Self {
            key: None,
            text: text.into(),
        }
    }
}

pub const NO_DETAILS: &str = "No details";

/// Lays out an event payload for reading.
///
/// A payload that is JSON as a whole is pretty printed. Otherwise it is split
/// into `key: value` pairs on top-level commas, keys are aligned, and any
/// value that is itself JSON is pretty printed on the lines below its key.
pub fn pretty_details(details: &str) -> Vec<DetailLine> {
    let trimmed = details.trim();
    if trimmed.is_empty() {
        return vec![DetailLine::text(NO_DETAILS)];
    }
    if looks_like_json(trimmed) {
        return pretty_json(trimmed).lines().map(DetailLine::text).collect();
    }

    let pairs: Vec<(Option<&str>, &str)> = split_preserving_json(trimmed)
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match find_key_colon(part) {
            Some(idx) if idx > 0 => (Some(part[..idx].trim()), part[idx + 1..].trim()),
            _ => (None, part),
        })
        .collect();
    let width = pairs
        .iter()
        .filter_map(|(key, _)| key.map(str::len))
        .max()
        .unwrap_or(0);

    let mut lines = Vec::new();
    for (key, value) in pairs {
        let Some(key) = key else {
            lines.push(DetailLine::text(value));
            continue;
        };
        let padded = format!("{key:<width$}");
        let pretty = looks_like_json(value).then(|| pretty_json(value));
        match pretty {
            Some(block) if block != value => {
                lines.push(DetailLine {
                    key: Some(padded),
                    text: String::new(),
                });
                lines.extend(block.lines().map(DetailLine::text));
            }
            _ => lines.push(DetailLine {
                key: Some(padded),
                text: value.to_string(),
            }),
        }
    }
    lines
}

fn looks_like_json(s: &str) -> bool {
    s.starts_with('{') || s.starts_with('[')
}

/// Pretty prints `s` if it parses as JSON, otherwise returns it unchanged.
pub fn pretty_json(s: &str) -> String {
    serde_json::from_str::<serde_json::Value>(s)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| s.to_string())
}

/// Splits on commas that are not nested inside braces or brackets.
pub fn split_preserving_json(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < s.len() {
        parts.push(&s[start..]);
    }
    parts
}

/// Byte index of the colon separating key from value, ignoring colons inside
/// JSON strings, objects, or arrays.
pub fn find_key_colon(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string = false;
    for (i, ch) in s.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => depth -= 1,
            ':' if depth == 0 && !in_string => return Some(i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_buckets() {
        assert_eq!(format_duration(Duration::milliseconds(850)), "850ms");
        assert_eq!(format_duration(Duration::milliseconds(4_200)), "4.2s");
        assert_eq!(format_duration(Duration::seconds(210)), "3.5m");
        assert_eq!(format_duration(Duration::minutes(72)), "1.2h");
        assert_eq!(format_duration(Duration::seconds(-3)), "0ms");
    }

    #[test]
    fn split_keeps_nested_commas() {
        let parts = split_preserving_json(r#"a: 1, input: {"x": 1, "y": [2, 3]}, b: 2"#);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].trim(), r#"input: {"x": 1, "y": [2, 3]}"#);
    }

    #[test]
    fn key_colon_skips_quoted_and_nested() {
        assert_eq!(find_key_colon("Reason: boom"), Some(6));
        assert_eq!(find_key_colon(r#"{"k": 1}"#), None);
        assert_eq!(find_key_colon(r#""a:b": 1"#), Some(5));
    }

    #[test]
    fn whole_json_is_pretty_printed() {
        let lines = pretty_details(r#"{"activityType":{"name":"Charge"}}"#);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.key.is_none()));
    }

    #[test]
    fn key_values_are_aligned_and_json_values_expanded() {
        let lines = pretty_details(r#"ScheduledEventId: 5, Input: {"amount": 10}"#);
        assert_eq!(lines[0].key.as_deref(), Some("ScheduledEventId"));
        assert_eq!(lines[0].text, "5");
        assert_eq!(lines[1].key, Some(format!("{:<16}", "Input")));
        assert!(lines[1].text.is_empty());
        assert_eq!(lines[2].text, "{");
    }

    #[test]
    fn empty_details_say_so() {
        assert_eq!(pretty_details("  "), vec![DetailLine::text(NO_DETAILS)]);
    }
}
