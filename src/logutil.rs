//! Keeps user-supplied text (names, chat lines, unparsed commands) from
//! breaking log lines apart.

const MAX_PREVIEW: usize = 200;

/// Escape a string for single-line logging, truncated to a short preview.
pub fn escape_log(s: &str) -> String {
    escape_log_with_limit(s, MAX_PREVIEW)
}

/// Escape backslashes and control characters; anything past `limit` chars is
/// replaced by an ellipsis.
pub fn escape_log_with_limit(s: &str, limit: usize) -> String {
    let mut out = String::with_capacity(s.len().min(limit) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= limit {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
