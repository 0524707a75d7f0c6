//! Removal of Markdown code fences around model output.

const FENCE: &str = "```";

/// Strip code-fence markup from raw model output.
///
/// A leading fence line (with or without a language tag) and a trailing fence
/// are removed. Text without fences is only trimmed, so applying this twice
/// gives the same result as applying it once. If the text does not start with
/// a fence but embeds a ```` ```json ```` block after some prose, the block's
/// interior is returned.
pub fn strip_code_fences(raw: &str) -> String {
    let text = raw.trim();

    if !text.starts_with(FENCE) {
        if let Some(inner) = embedded_json_block(text) {
            return inner.trim().to_string();
        }
        return text.to_string();
    }

    // Drop the opening fence line.
    let mut body = match text.find('\n') {
        Some(idx) => text[idx + 1..].to_string(),
        None => String::new(),
    };

    let trimmed = body.trim_end();
    if trimmed.ends_with(FENCE) {
        let last_line_start = trimmed.rfind('\n').map(|i| i + 1).unwrap_or(0);
        body = if trimmed[last_line_start..].trim() == FENCE {
            trimmed[..last_line_start].to_string()
        } else {
            trimmed[..trimmed.len() - FENCE.len()].to_string()
        };
    }

    body.trim().to_string()
}

/// Interior of the first ```` ```json ```` block in `text`, if any.
fn embedded_json_block(text: &str) -> Option<&str> {
    let start = text.find("```json")? + "```json".len();
    let rest = &text[start..];
    let end = rest.find(FENCE).unwrap_or(rest.len());
    Some(&rest[..end])
}
