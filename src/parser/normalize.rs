/// Literal values the site uses in place of missing data.
const PLACEHOLDERS: &[&str] = &["not annotated", "not available"];

fn is_placeholder(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    PLACEHOLDERS.contains(&lower.as_str())
}

/// Trimmed text, or None when the whole value is a placeholder.
pub fn normalize_empty(text: &str) -> Option<String> {
    if is_placeholder(text) {
        None
    } else {
        Some(text.trim().to_string())
    }
}

/// Strip every whitespace character: "C 9 H 8 O 4" → "C9H8O4".
pub fn format_formula(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Split a comma-separated category cell. None when the cell is empty or
/// every entry is a placeholder.
pub fn normalize_categories(raw: &str) -> Option<Vec<String>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let categories: Vec<String> = raw.split(',').map(|c| c.trim().to_string()).collect();
    if categories.iter().all(|c| is_placeholder(c)) {
        None
    } else {
        Some(categories)
    }
}

// ── Tests ──
