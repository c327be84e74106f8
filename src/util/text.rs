use std::borrow::Cow;
use std::iter::Peekable;
use std::str::Chars;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a string in terminal columns (CJK and emoji count as 2).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Truncates a string to fit within `max_width` terminal columns.
///
/// Appends "..." when text is cut. Widths of 3 or less return as many
/// characters as fit, without an ellipsis. Returns `Cow::Borrowed` when the
/// string already fits.
///
/// # Examples
///
/// ```
/// use formulary::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Rose Absolute", 20), "Rose Absolute");
/// assert_eq!(truncate_to_width("Rose Absolute", 8), "Rose ...");
/// assert_eq!(truncate_to_width("Rose", 2), "Ro");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let budget = if max_width <= ELLIPSIS_WIDTH {
        max_width
    } else {
        max_width - ELLIPSIS_WIDTH
    };

    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    if max_width <= ELLIPSIS_WIDTH {
        Cow::Owned(s[..end].to_string())
    } else {
        Cow::Owned(format!("{}{}", &s[..end], ELLIPSIS))
    }
}

/// C1 single-character CSI, equivalent to `ESC [`.
const CSI: char = '\u{9b}';
/// C1 single-character OSC, equivalent to `ESC ]`.
const OSC: char = '\u{9d}';
/// C1 string terminator.
const ST: char = '\u{9c}';

/// Skip a CSI body through its final byte (0x40-0x7E).
fn skip_csi(chars: &mut Peekable<Chars<'_>>) {
    for c in chars.by_ref() {
        if ('\x40'..='\x7e').contains(&c) {
            break;
        }
    }
}

/// Skip an OSC body through BEL, ST or `ESC \`.
fn skip_osc(chars: &mut Peekable<Chars<'_>>) {
    while let Some(c) = chars.next() {
        match c {
            '\x07' | ST => break,
            '\x1b' if chars.peek() == Some(&'\\') => {
                chars.next();
                break;
            }
            _ => {}
        }
    }
}

/// Neutralize untrusted record text before it is drawn.
///
/// Remote fields are rendered straight into the terminal, so everything that
/// could drive the terminal is removed:
/// - CSI sequences (`ESC [` or U+009B ... final byte 0x40-0x7E)
/// - OSC sequences (`ESC ]` or U+009D ... BEL, ST or `ESC \`)
/// - every other C0 and C1 control, DEL and bare ESC included
///
/// Line breaks and tabs become single spaces so a card field stays on one
/// line. Returns `Cow::Borrowed` when nothing needed changing.
pub fn sanitize_field(s: &str) -> Cow<'_, str> {
    if !s.chars().any(char::is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' if chars.peek() == Some(&'[') => {
                chars.next();
                skip_csi(&mut chars);
            }
            '\x1b' if chars.peek() == Some(&']') => {
                chars.next();
                skip_osc(&mut chars);
            }
            CSI => skip_csi(&mut chars),
            OSC => skip_osc(&mut chars),
            '\t' | '\n' | '\r' => {
                if !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_truncate_fits() {
        assert_eq!(truncate_to_width("Short", 10), "Short");
        assert!(matches!(truncate_to_width("Short", 10), Cow::Borrowed(_)));
        assert_eq!(truncate_to_width("12345", 5), "12345");
    }

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
        assert_eq!(truncate_to_width("Testing", 4), "T...");
    }

    #[test]
    fn test_truncate_cjk() {
        assert_eq!(truncate_to_width("香水香水", 7), "香水...");
        assert_eq!(truncate_to_width("香水", 1), "");
        assert_eq!(truncate_to_width("香水", 3), "香");
    }

    #[test]
    fn test_truncate_narrow_widths() {
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("Test", 1), "T");
        assert_eq!(truncate_to_width("Test", 3), "Tes");
    }

    #[test]
    fn test_clean_text_is_borrowed() {
        let input = "Rose de Mai — EDP";
        let out = sanitize_field(input);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, input);
    }

    #[test]
    fn test_strips_ansi_color() {
        assert_eq!(sanitize_field("\x1b[31mRed\x1b[0m"), "Red");
    }

    #[test]
    fn test_strips_osc_title_bel_and_st() {
        assert_eq!(sanitize_field("\x1b]0;pwned\x07Rose"), "Rose");
        assert_eq!(sanitize_field("\x1b]0;pwned\x1b\\Rose"), "Rose");
    }

    #[test]
    fn test_strips_bare_esc_and_controls() {
        assert_eq!(sanitize_field("a\x1bb\x00c\x07d\x7fe"), "abcde");
    }

    #[test]
    fn test_flattens_line_breaks() {
        assert_eq!(sanitize_field("Rose\nAbsolute"), "Rose Absolute");
        assert_eq!(sanitize_field("Rose\r\n\tAbsolute"), "Rose Absolute");
    }

    #[test]
    fn test_preserves_unicode() {
        assert_eq!(sanitize_field("香水 \x1b[1mバラ\x1b[0m"), "香水 バラ");
    }

    #[test]
    fn test_strips_c1_sequences_and_controls() {
        assert_eq!(sanitize_field("\u{9b}31mRose\u{9d}0;pwned\u{9c}"), "Rose");
        assert_eq!(sanitize_field("\u{9d}0;title\x07Oud"), "Oud");
        assert_eq!(sanitize_field("a\u{85}b\u{9f}c"), "abc");
    }

    #[test]
    fn test_only_escapes_becomes_empty() {
        assert_eq!(sanitize_field("\x1b[2J\x1b[H"), "");
    }

    proptest! {
        #[test]
        fn sanitized_output_has_no_controls(s in any::<String>()) {
            let out = sanitize_field(&s);
            prop_assert!(!out.chars().any(char::is_control));
        }

        #[test]
        fn printable_ascii_is_untouched(s in "[ -~]{0,64}") {
            let out = sanitize_field(&s);
            prop_assert_eq!(out.as_ref(), s.as_str());
        }
    }
}
