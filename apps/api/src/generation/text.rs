//! Small text helpers shared by the prompt builder, the fallback template and
//! the cover letter.

/// Placeholder rendered for absent optional fields.
pub const NOT_AVAILABLE: &str = "N/A";

/// Marker appended to truncated excerpts.
pub const ELLIPSIS: &str = "...";

/// Returns the trimmed text cut to `budget` characters, with [`ELLIPSIS`]
/// appended only when something was cut. Blank input yields `None`.
pub fn excerpt(text: &str, budget: usize) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.chars().count() <= budget {
        return Some(text.to_string());
    }
    let cut: String = text.chars().take(budget).collect();
    Some(format!("{}{ELLIPSIS}", cut.trim_end()))
}

/// The value, or `N/A` when absent or blank.
pub fn or_na(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => NOT_AVAILABLE,
    }
}

/// Fills `{key}` placeholders in a single left-to-right pass.
///
/// Substituted values are never rescanned, so user text containing braces
/// cannot trigger a second substitution. Unknown placeholders are kept verbatim.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match values.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
