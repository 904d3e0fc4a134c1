//! Table cells for CLI output.

/// Shortens `content` to at most `max_chars` characters, marking the cut
/// with an ellipsis. Counts chars, not bytes.
pub fn truncate_cell(content: &str, max_chars: usize) -> String {
    let content = content.trim();
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let kept: String = content.chars().take(max_chars - 1).collect();
    format!("{}…", kept.trim_end())
}

pub fn pad_cell(content: &str, width: usize) -> String {
    let cell = truncate_cell(content, width);
    let fill = width.saturating_sub(cell.chars().count());
    format!("{}{}", cell, " ".repeat(fill))
}
