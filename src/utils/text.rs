pub fn truncate_utf8_prefix(value: &str, max_bytes: usize) -> String {
    if max_bytes == 0 {
        return String::new();
    }
    if value.len() <= max_bytes {
        return value.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

/// Shortens a command for log lines, marking the cut with an ellipsis.
pub fn preview_command(command: &str, max_bytes: usize) -> String {
    let trimmed = command.trim();
    let cut = truncate_utf8_prefix(trimmed, max_bytes);
    if cut.len() < trimmed.len() {
        format!("{}...", cut)
    } else {
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::{preview_command, truncate_utf8_prefix};

    #[test]
    fn truncate_utf8_prefix_handles_ascii() {
        assert_eq!(truncate_utf8_prefix("hello", 3), "hel");
    }

    #[test]
    fn truncate_utf8_prefix_does_not_split_utf8() {
        assert_eq!(truncate_utf8_prefix("a\u{00e9}b", 2), "a");
        assert_eq!(truncate_utf8_prefix("a\u{00e9}b", 3), "a\u{00e9}");
    }

    #[test]
    fn preview_command_marks_truncation() {
        assert_eq!(preview_command("  uptime  ", 50), "uptime");
        assert_eq!(preview_command("tail -f /var/log/syslog", 7), "tail -f...");
    }
}
