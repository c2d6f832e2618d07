//! Text helpers

/// Longest prefix of `s` that fits in `max_bytes` without splitting a
/// character
pub fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_untouched() {
        assert_eq!(truncate_utf8("abc", 10), "abc");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // "é" is two bytes
        assert_eq!(truncate_utf8("aéb", 2), "a");
        assert_eq!(truncate_utf8("aéb", 3), "aé");
        assert_eq!(truncate_utf8("", 0), "");
    }
}
