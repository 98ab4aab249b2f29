use chrono::{DateTime, NaiveDateTime, Utc};
use unicode_normalization::UnicodeNormalization;

pub const MAX_SLUG_LEN: usize = 80;
pub const UNTITLED: &str = "untitled";
/// Filename stamp for conversations without a usable creation time.
pub const STAMP_SENTINEL: &str = "00000000-000000";

pub fn slugify(text: &str) -> String {
    slugify_with_max(text, MAX_SLUG_LEN)
}

/// Lowercase ASCII token of `[a-z0-9-]`, at most `max_len` bytes.
///
/// Accents are decomposed and dropped, other non-ASCII text is removed
/// outright (no transliteration). Truncation can leave a trailing dash.
pub fn slugify_with_max(text: &str, max_len: usize) -> String {
    let mut slug = String::with_capacity(text.len().min(max_len * 2));
    let mut pending_dash = false;

    for ch in text.nfkd().filter(char::is_ascii) {
        let ch = ch.to_ascii_lowercase();
        if ch.is_whitespace() || ch == '-' {
            pending_dash = true;
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        }
        // Everything else is stripped without breaking a dash run.
    }

    if slug.is_empty() {
        slug.push_str(UNTITLED);
    }
    slug.truncate(max_len);
    slug
}

/// `YYYYMMDD-HHMMSS` (UTC) for an ISO-8601 timestamp, or the all-zero
/// sentinel when missing or unparsable. Naive timestamps are read as UTC.
pub fn filename_stamp(iso: Option<&str>) -> String {
    iso.and_then(parse_iso)
        .map(|dt| dt.format("%Y%m%d-%H%M%S").to_string())
        .unwrap_or_else(|| STAMP_SENTINEL.to_string())
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
