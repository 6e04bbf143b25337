use std::borrow::Cow;

/// Strips control characters from feed-supplied text.
///
/// Removes ASCII control chars (0x00-0x08, 0x0B-0x0C, 0x0E-0x1F, 0x7F) that
/// have no meaning in HTML text and would otherwise be copied verbatim into
/// the rendered page. Tab, newline and carriage return are kept.
///
/// Returns `Cow::Borrowed` when the input is already clean (common case).
///
/// # Examples
///
/// ```
/// use feedme::util::strip_control_chars;
///
/// assert_eq!(strip_control_chars("plain"), "plain");
/// assert_eq!(strip_control_chars("bell\x07 ring"), "bell ring");
/// ```
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|c| !is_stripped(*c)).collect())
}

fn is_stripped(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0b}' | '\u{0c}' | '\u{0e}'..='\u{1f}' | '\u{7f}')
}
