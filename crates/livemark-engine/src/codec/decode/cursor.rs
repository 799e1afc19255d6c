use crate::codec::kinds::Escape;

/// Byte cursor over a slice of decoder input.
///
/// Tracks the absolute byte position in the full input via `base`. All
/// delimiters are ASCII, so every position a construct starts or stops at
/// is a `char` boundary.
#[derive(Clone)]
pub struct Cursor<'a> {
    pub s: &'a str,
    pub base: usize,
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str, base: usize) -> Self {
        Self { s, base, i: 0 }
    }

    /// Absolute position in the input.
    pub fn pos(&self) -> usize {
        self.base + self.i
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    pub fn starts_with(&self, pat: &str) -> bool {
        self.s.as_bytes()[self.i.min(self.s.len())..].starts_with(pat.as_bytes())
    }

    /// Advances past one whole `char`.
    pub fn bump(&mut self) -> Option<char> {
        let ch = self.s.get(self.i..)?.chars().next()?;
        self.i += ch.len_utf8();
        Some(ch)
    }

    pub fn bump_str(&mut self, pat: &str) {
        self.i += pat.len();
    }

    /// Steps over a backslash escape and the character it escapes, if one
    /// is at the cursor.
    pub fn bump_escape(&mut self) -> bool {
        let mut chars = self.s.get(self.i..).unwrap_or_default().chars();
        if chars.next() == Some(Escape::MARK) && chars.next().is_some_and(Escape::is_escapable) {
            // Escapable characters are all ASCII.
            self.i += 2;
            return true;
        }
        false
    }

    /// Moves to absolute position `pos`.
    pub fn seek(&mut self, pos: usize) {
        self.i = pos - self.base;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cur = Cursor::new("hello", 10);
        assert_eq!(cur.pos(), 10);
        assert!(!cur.eof());
        assert_eq!(cur.bump(), Some('h'));
        assert_eq!(cur.pos(), 11);
    }

    #[test]
    fn bump_steps_over_multibyte_chars() {
        let mut cur = Cursor::new("é*", 0);
        assert_eq!(cur.bump(), Some('é'));
        assert_eq!(cur.pos(), 2);
        assert!(cur.starts_with("*"));
    }

    #[test]
    fn escapes_are_one_step() {
        let mut cur = Cursor::new(r"\*a\n", 0);
        assert!(cur.bump_escape());
        assert_eq!(cur.pos(), 2);
        assert!(!cur.bump_escape());
        cur.bump();
        assert!(!cur.bump_escape());
    }

    #[test]
    fn starts_with_past_end() {
        let mut cur = Cursor::new("ab", 0);
        assert!(!cur.starts_with("abc"));
        cur.bump_str("ab");
        assert!(cur.eof());
        assert!(cur.starts_with(""));
        assert_eq!(cur.bump(), None);
    }
}
