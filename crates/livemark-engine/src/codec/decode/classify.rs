use crate::codec::kinds::{BlockQuote, CodeFence, Heading, Image, ListItem, Table};
use crate::codec::span::Span;

/// One line of input, without its line terminator.
#[derive(Debug, Clone, Copy)]
pub struct LineRef<'a> {
    pub span: Span,
    pub text: &'a str,
}

/// Splits `src` into lines with their byte spans. A trailing newline does
/// not produce an extra empty line.
pub fn lines_with_spans(src: &str) -> impl Iterator<Item = LineRef<'_>> + '_ {
    let mut offset = 0usize;
    src.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let text = raw.trim_end_matches(['\r', '\n']);
        LineRef {
            span: Span::new(start, start + text.len()),
            text,
        }
    })
}

/// What a line looks like in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    /// A fence line; `bare` fences (no language) can also close a block.
    Fence { lang: Span, bare: bool },
    Image { alt: Span, src: Span },
    TableSeparator,
    TableRow,
    Heading { level: usize, content: Span },
    ListItem { ordered: bool, content: Span },
    Quote { content: Span },
    Text,
}

/// Classification of a single line containing only local facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineClass {
    pub line: Span,
    pub kind: LineKind,
}

/// Classifies lines by fixed precedence: fence, image, table, heading,
/// list item, quote, text.
pub struct MarkdownLineClassifier;

impl MarkdownLineClassifier {
    pub fn classify(&self, lr: &LineRef<'_>) -> LineClass {
        LineClass {
            line: lr.span,
            kind: Self::kind(lr),
        }
    }

    fn kind(lr: &LineRef<'_>) -> LineKind {
        let text = lr.text;
        let at = |offset: usize| lr.span.start + offset;
        let rest = |offset: usize| Span::new(at(offset), lr.span.end);

        if text.trim().is_empty() {
            return LineKind::Blank;
        }
        if let Some((start, end)) = CodeFence::open(text) {
            return LineKind::Fence {
                lang: Span::new(at(start), at(end)),
                bare: start == end,
            };
        }
        if let Some(image) = Image::parse_line(text) {
            return LineKind::Image {
                alt: Span::new(at(image.alt.0), at(image.alt.1)),
                src: Span::new(at(image.src.0), at(image.src.1)),
            };
        }
        if Table::is_separator(text) {
            return LineKind::TableSeparator;
        }
        if Table::is_row(text) {
            return LineKind::TableRow;
        }
        if let Some((level, offset)) = Heading::strip(text) {
            return LineKind::Heading {
                level,
                content: rest(offset),
            };
        }
        if let Some((ordered, offset)) = ListItem::strip(text) {
            return LineKind::ListItem {
                ordered,
                content: rest(offset),
            };
        }
        if let Some(offset) = BlockQuote::strip(text) {
            return LineKind::Quote {
                content: rest(offset),
            };
        }
        LineKind::Text
    }
}
