//! Reversed source windows for backward test-definition search.
//!
//! Ruby test openers (`def test_x`, `test "x" do`, `should "x" do`) start a
//! line and precede the cursor. Reversing a bounded window ending at the
//! cursor line turns "nearest opener above the cursor" into "leftmost match"
//! for an ordinary forward regex search. Line breaks become a two-character
//! marker so the whole window is a single line; the backslash in the marker
//! keeps name patterns from running across lines.

/// Marker written in place of every line break, in forward order.
pub const LINE_BREAK_MARKER: &str = "\\N";

/// Default number of characters read before the cursor.
pub const DEFAULT_WINDOW_SIZE: usize = 2000;

/// A reversed, single-line slice of buffer text ending at the cursor line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceWindow(String);

impl SourceWindow {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Build the reversed window for `cursor_offset` (a character offset).
///
/// The window starts `window_size` characters before the cursor, clamped to
/// the buffer start, and runs to the end of the cursor's line.
pub fn make_window(buffer: &str, cursor_offset: usize, window_size: usize) -> SourceWindow {
    let chars: Vec<char> = buffer.chars().collect();
    let cursor = cursor_offset.min(chars.len());
    let start = cursor.saturating_sub(window_size);
    let end = chars[cursor..]
        .iter()
        .position(|&c| c == '\n' || c == '\r')
        .map(|i| cursor + i)
        .unwrap_or(chars.len());

    let mut forward = String::with_capacity(end - start);
    let mut iter = chars[start..end].iter().peekable();
    while let Some(&c) = iter.next() {
        match c {
            '\r' => {
                if iter.peek() == Some(&&'\n') {
                    iter.next();
                }
                forward.push_str(LINE_BREAK_MARKER);
            }
            '\n' => forward.push_str(LINE_BREAK_MARKER),
            _ => forward.push(c),
        }
    }

    SourceWindow(forward.chars().rev().collect())
}

/// 1-based line number of the cursor, as used by `-l` selectors.
pub fn line_number_at(buffer: &str, cursor_offset: usize) -> u32 {
    let breaks = buffer
        .chars()
        .take(cursor_offset)
        .filter(|&c| c == '\n')
        .count();
    breaks as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverses_and_marks_line_breaks() {
        let window = make_window("ab\ncd", 4, 100);
        assert_eq!(window.as_str(), "dcN\\ba");
    }

    #[test]
    fn test_extends_to_end_of_cursor_line() {
        let buffer = "def test_x\n  assert true\nend\n";
        // cursor on the "a" of assert
        let window = make_window(buffer, 13, 100);
        assert_eq!(window.as_str(), "eurt tressa  N\\x_tset fed");
    }

    #[test]
    fn test_clamps_window_start() {
        let buffer = "0123456789";
        let window = make_window(buffer, 5, 3);
        assert_eq!(window.as_str(), "98765432");
    }

    #[test]
    fn test_clamps_cursor_past_end() {
        let window = make_window("abc", 99, 2000);
        assert_eq!(window.as_str(), "cba");
    }

    #[test]
    fn test_crlf_is_one_break() {
        let window = make_window("a\r\nb", 3, 10);
        assert_eq!(window.as_str(), "bN\\a");
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let window = make_window("é\nxyz", 2, 1);
        assert_eq!(window.as_str(), "zyxN\\");
    }

    #[test]
    fn test_line_number_at() {
        let buffer = "one\ntwo\nthree";
        assert_eq!(line_number_at(buffer, 0), 1);
        assert_eq!(line_number_at(buffer, 4), 2);
        assert_eq!(line_number_at(buffer, 10), 3);
        assert_eq!(line_number_at(buffer, 500), 3);
    }
}
