/// A byte range `[start, end)` into decoder input.
///
/// Decoded text leaves keep the span they were cut from; the caret is
/// resolved against these spans instead of a marker spliced into the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `at`.
    pub fn empty_at(at: usize) -> Self {
        Self { start: at, end: at }
    }

    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Whether `pos` lies inside the span or on either edge.
    pub fn touches(self, pos: usize) -> bool {
        self.start <= pos && pos <= self.end
    }

    pub fn slice(self, src: &str) -> &str {
        &src[self.start..self.end]
    }

    /// Narrows the span to exclude leading and trailing whitespace.
    pub fn trim(self, src: &str) -> Self {
        let s = self.slice(src);
        let lead = s.len() - s.trim_start().len();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Self::empty_at(self.start + lead.min(s.len()));
        }
        Self::new(self.start + lead, self.start + lead + trimmed.len())
    }
}
