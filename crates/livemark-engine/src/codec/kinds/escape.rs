//! Backslash escapes for markup characters that are plain text.

use super::block_prefix::{BlockQuote, Heading, ListItem};

pub struct Escape;

impl Escape {
    pub const MARK: char = '\\';
    /// Escaped wherever they occur in text.
    pub const INLINE: [char; 9] = ['\\', '*', '_', '~', '`', '[', ']', '<', '|'];
    /// Escaped only where they would open a block at the start of a line.
    pub const LINE_START: [char; 3] = [Heading::MARK, '>', '.'];

    pub fn is_escapable(c: char) -> bool {
        Self::INLINE.contains(&c) || Self::LINE_START.contains(&c)
    }

    /// Escapes `text`. `line_start` marks text that opens a paragraph line,
    /// where a leading `#`, `> ` or `1. ` would otherwise change the block.
    ///
    /// Also returns, for every `char` offset `0..=len` of `text`, the offset
    /// of the same character in the escaped output.
    pub fn escape(text: &str, line_start: bool) -> (String, Vec<usize>) {
        let marker = if line_start { Self::line_marker(text) } else { None };
        let mut out = String::with_capacity(text.len());
        let mut offsets = Vec::with_capacity(text.len() + 1);
        let mut n = 0;
        for (i, c) in text.char_indices() {
            offsets.push(n);
            if Self::INLINE.contains(&c) || marker == Some(i) {
                out.push(Self::MARK);
                n += 1;
            }
            out.push(c);
            n += 1;
        }
        offsets.push(n);
        (out, offsets)
    }

    /// Byte index of the character that would make `text` a block prefix.
    fn line_marker(text: &str) -> Option<usize> {
        if text.starts_with(Heading::MARK) || text.starts_with(BlockQuote::PREFIX.trim_end()) {
            return Some(0);
        }
        match ListItem::strip(text) {
            Some((true, content)) => Some(content - ". ".len()),
            _ => None,
        }
    }

    pub fn unescape(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c == Self::MARK
                && let Some(&next) = chars.peek()
                && Self::is_escapable(next)
            {
                out.push(next);
                chars.next();
                continue;
            }
            out.push(c);
        }
        out
    }

    /// `char` offset in `unescape(text)` of byte `at` of `text`. A position
    /// between an escape and the character it escapes lands before that
    /// character.
    pub fn char_offset(text: &str, at: usize) -> usize {
        let mut count = 0;
        let mut chars = text.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if i >= at {
                break;
            }
            if c == Self::MARK
                && let Some(&(j, next)) = chars.peek()
                && Self::is_escapable(next)
            {
                if j >= at {
                    break;
                }
                chars.next();
            }
            count += 1;
        }
        count
    }

    /// Whether the character at byte `at` follows an odd run of escapes.
    pub fn is_escaped(text: &str, at: usize) -> bool {
        text.as_bytes()[..at.min(text.len())]
            .iter()
            .rev()
            .take_while(|&&b| b == b'\\')
            .count()
            % 2
            == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("snake_case_name", false, r"snake\_case\_name")]
    #[case("2 * 3", false, r"2 \* 3")]
    #[case(r"C:\dir", false, r"C:\\dir")]
    #[case("a | b", false, r"a \| b")]
    #[case("<sup>", false, r"\<sup>")]
    #[case("# not a heading", true, r"\# not a heading")]
    #[case("# mid-line", false, "# mid-line")]
    #[case("> not a quote", true, r"\> not a quote")]
    #[case("12. not a list", true, r"12\. not a list")]
    #[case("1.5 litres", true, "1.5 litres")]
    fn escapes(#[case] text: &str, #[case] line_start: bool, #[case] expected: &str) {
        let (escaped, _) = Escape::escape(text, line_start);
        assert_eq!(escaped, expected);
        assert_eq!(Escape::unescape(&escaped), text);
    }

    #[test]
    fn offsets_point_before_the_escape() {
        let (_, offsets) = Escape::escape("a_b", false);
        assert_eq!(offsets, vec![0, 1, 3, 4]);
    }

    #[test]
    fn unknown_escapes_stay_literal() {
        assert_eq!(Escape::unescape(r"\n \p"), r"\n \p");
        assert_eq!(Escape::unescape(r"end\"), r"end\");
    }

    #[test]
    fn char_offsets_skip_escapes() {
        let text = r"snake\_case";
        assert_eq!(Escape::char_offset(text, 5), 5);
        assert_eq!(Escape::char_offset(text, 6), 5);
        assert_eq!(Escape::char_offset(text, 7), 6);
        assert_eq!(Escape::char_offset(text, text.len()), 10);
    }

    #[test]
    fn escaped_pipes() {
        assert!(Escape::is_escaped(r"a\|", 2));
        assert!(!Escape::is_escaped(r"a\\|", 3));
        assert!(!Escape::is_escaped("|", 0));
    }
}
