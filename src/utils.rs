//! Small formatting and timing helpers shared by views and managers.

use unicode_segmentation::UnicodeSegmentation;

/// Milliseconds since the Unix epoch.
///
/// Uses chrono (which reads `Date.now()` on wasm via the `wasmbind` feature)
/// so it also works in native unit tests.
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Truncate to `max` user-perceived characters, appending `suffix` when cut.
pub fn truncate(s: &str, max: usize, suffix: &str) -> String {
    let graphemes: Vec<&str> = s.graphemes(true).collect();
    if graphemes.len() <= max {
        return s.to_string();
    }
    let mut out: String = graphemes[..max].concat();
    out.push_str(suffix);
    out
}

pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut last_dash = false;
    for c in s.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            last_dash = false;
        } else if (c.is_whitespace() || c == '-') && !last_dash && !slug.is_empty() {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Escape text for interpolation into HTML markup and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// "Just now", "5m ago", "3h ago", "2d ago".
pub fn relative_time(then_ms: u64, now_ms: u64) -> String {
    let seconds = now_ms.saturating_sub(then_ms) / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d ago", days)
    } else if hours > 0 {
        format!("{}h ago", hours)
    } else if minutes > 0 {
        format!("{}m ago", minutes)
    } else {
        "Just now".to_string()
    }
}

/// Relative time for an RFC 3339 timestamp; falls back to the raw string.
pub fn relative_time_rfc3339(timestamp: &str, now_ms: u64) -> String {
    match chrono::DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => relative_time(dt.timestamp_millis().max(0) as u64, now_ms),
        Err(_) => timestamp.to_string(),
    }
}

pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rendered = format!("{:.*}", decimals, value);
    // Drop trailing zeros the way a float parse would ("1.50" -> "1.5").
    let rendered = if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        rendered
    };
    format!("{} {}", rendered, UNITS[unit])
}

/// Up to two initials from a display name.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(|c| c.to_uppercase())
        .collect()
}

/// Delay before retry number `attempt` (0-based): `base * 2^attempt`.
pub fn backoff_delay(base_ms: u32, attempt: u32) -> u32 {
    base_ms.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_covers_markup_and_quotes() {
        assert_eq!(
            escape_html(r#"<b title="x">Tom & 'Jerry'</b>"#),
            "&lt;b title=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn capitalize_handles_empty_and_unicode() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("agent"), "Agent");
        assert_eq!(capitalize("élan"), "Élan");
    }

    #[test]
    fn truncate_counts_graphemes() {
        assert_eq!(truncate("hello", 10, "..."), "hello");
        assert_eq!(truncate("hello world", 5, "..."), "hello...");
        // Family emoji is a single grapheme made of several code points.
        assert_eq!(truncate("👨‍👩‍👧abc", 1, "…"), "👨‍👩‍👧…");
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("My  Research Agent!"), "my-research-agent");
        assert_eq!(slugify("--Flow--"), "flow");
    }

    #[test]
    fn relative_time_buckets() {
        let now = 10 * 24 * 3_600_000;
        assert_eq!(relative_time(now - 5_000, now), "Just now");
        assert_eq!(relative_time(now - 5 * 60_000, now), "5m ago");
        assert_eq!(relative_time(now - 3 * 3_600_000, now), "3h ago");
        assert_eq!(relative_time(now - 2 * 86_400_000, now), "2d ago");
        // Clock skew never underflows.
        assert_eq!(relative_time(now + 1_000, now), "Just now");
    }

    #[test]
    fn format_bytes_scales_units() {
        assert_eq!(format_bytes(0, 2), "0 Bytes");
        assert_eq!(format_bytes(512, 2), "512 Bytes");
        assert_eq!(format_bytes(1536, 2), "1.5 KB");
        assert_eq!(format_bytes(1_048_576, 2), "1 MB");
    }

    #[test]
    fn initials_take_two_words() {
        assert_eq!(initials("research assistant bot"), "RA");
        assert_eq!(initials("solo"), "S");
        assert_eq!(initials("   "), "");
    }

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff_delay(1000, 0), 1000);
        assert_eq!(backoff_delay(1000, 1), 2000);
        assert_eq!(backoff_delay(1000, 2), 4000);
        assert_eq!(backoff_delay(1000, 40), u32::MAX);
    }
}
