use crate::domain::model::RowRecord;
use regex::Regex;
use std::sync::OnceLock;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("placeholder pattern is valid"))
}

pub fn placeholder(key: &str) -> String {
    format!("{{{{{}}}}}", key)
}

/// Replaces every `{{key}}` for each field of `row` with the field's value.
///
/// Replacement is literal and sequential: fields are applied one after another
/// in key order, so a value that itself contains `{{other}}` may be replaced by
/// a later field. Placeholders with no matching field are left as they are.
pub fn substitute(line: &str, row: &RowRecord) -> String {
    if !line.contains("{{") {
        return line.to_string();
    }

    let mut keys: Vec<&str> = row.keys().collect();
    keys.sort_unstable();

    let mut result = line.to_string();
    for key in keys {
        let token = placeholder(key);
        if result.contains(&token) {
            if let Some(value) = row.get(key) {
                result = result.replace(&token, value);
            }
        }
    }
    result
}

/// Distinct placeholder names in `text`, in order of first appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in placeholder_pattern().captures_iter(text) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
