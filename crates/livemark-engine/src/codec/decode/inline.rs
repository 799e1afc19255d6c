use std::collections::HashMap;

use crate::codec::kinds::{CodeSpan, Delimited, Link};
use crate::codec::span::Span;
use crate::tree::CosmeticTag;

use super::cursor::Cursor;

/// A parsed inline node with byte spans into the decoder input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineNode {
    Text(Span),
    Element {
        tag: CosmeticTag,
        full: Span,
        /// Link target, for `a` only.
        href: Option<Span>,
        children: Vec<InlineNode>,
    },
}

/// Parses the inline content at `span` of `src`.
///
/// # Precedence
/// Backslash escapes come first: an escaped character is always text.
/// Code spans are raw zones and win over everything else; links come next,
/// then the [`Delimited`] kinds in their listed order. A closer search steps
/// over code spans and links, so a `**` inside code never closes strong text.
/// Element content must be non-empty; anything that fails to close is text.
pub fn parse_inline(src: &str, span: Span) -> Vec<InlineNode> {
    InlineParser::new(src).parse(span)
}

/// One parse over one span. Closer searches pass the same positions again
/// and again, so where each code span or link ends is remembered.
struct InlineParser<'s> {
    src: &'s str,
    code_ends: HashMap<usize, Option<usize>>,
    raw_ends: HashMap<usize, Option<usize>>,
}

impl<'s> InlineParser<'s> {
    fn new(src: &'s str) -> Self {
        Self {
            src,
            code_ends: HashMap::new(),
            raw_ends: HashMap::new(),
        }
    }

    fn parse(&mut self, span: Span) -> Vec<InlineNode> {
        let src = self.src;
        let mut cur = Cursor::new(&src[span.start..span.end], span.start);
        let mut out = vec![];
        let mut text_start = cur.pos();

        fn flush_text(out: &mut Vec<InlineNode>, start: usize, end: usize) {
            if end > start {
                out.push(InlineNode::Text(Span { start, end }));
            }
        }

        while !cur.eof() {
            if cur.bump_escape() {
                continue;
            }
            let start = cur.pos();
            if let Some(node) = self.try_parse_any(&mut cur) {
                flush_text(&mut out, text_start, start);
                text_start = cur.pos();
                out.push(node);
                continue;
            }
            cur.bump();
        }

        flush_text(&mut out, text_start, cur.pos());
        out
    }

    fn try_parse_any(&mut self, cur: &mut Cursor<'_>) -> Option<InlineNode> {
        if let Some(node) = try_parse_code_span(cur) {
            return Some(node);
        }
        if let Some(node) = self.try_parse_link(cur) {
            return Some(node);
        }
        self.try_parse_delimited(cur)
    }

    /// Steps over a code span at the cursor, if there is one.
    fn skip_code(&mut self, cur: &mut Cursor<'_>) -> bool {
        let start = cur.pos();
        let end = *self.code_ends.entry(start).or_insert_with(|| {
            let mut ahead = cur.clone();
            try_parse_code_span(&mut ahead).map(|_| ahead.pos())
        });
        seek_to(cur, end)
    }

    /// Steps over a code span or link at the cursor, if there is one.
    fn skip_raw(&mut self, cur: &mut Cursor<'_>) -> bool {
        if self.skip_code(cur) {
            return true;
        }
        let start = cur.pos();
        let cached = self.raw_ends.get(&start).copied();
        let end = match cached {
            Some(end) => end,
            None => {
                let mut ahead = cur.clone();
                let end = self.try_parse_link(&mut ahead).map(|_| ahead.pos());
                self.raw_ends.insert(start, end);
                end
            }
        };
        seek_to(cur, end)
    }

    /// `[text](href)`. On failure the cursor is restored.
    fn try_parse_link(&mut self, cur: &mut Cursor<'_>) -> Option<InlineNode> {
        if !cur.starts_with(Link::OPEN) {
            return None;
        }
        let saved = cur.clone();
        let start = cur.pos();
        cur.bump_str(Link::OPEN);
        let text_start = cur.pos();

        while !cur.eof() && !cur.starts_with(Link::MIDDLE) {
            if !cur.bump_escape() && !self.skip_code(cur) {
                cur.bump();
            }
        }
        let text_end = cur.pos();
        if cur.eof() || text_end == text_start {
            *cur = saved;
            return None;
        }
        cur.bump_str(Link::MIDDLE);
        let href_start = cur.pos();
        while !cur.eof() && !cur.starts_with(Link::CLOSE) {
            cur.bump();
        }
        let href_end = cur.pos();
        if cur.eof() {
            *cur = saved;
            return None;
        }
        cur.bump_str(Link::CLOSE);

        let text = Span::new(text_start, text_end);
        Some(InlineNode::Element {
            tag: CosmeticTag::A,
            full: Span::new(start, cur.pos()),
            href: Some(Span::new(href_start, href_end)),
            children: parse_inline(self.src, text),
        })
    }

    /// Strong, emphasis, strike, sup and sub. On failure the cursor is restored.
    fn try_parse_delimited(&mut self, cur: &mut Cursor<'_>) -> Option<InlineNode> {
        for d in Delimited::INPUT {
            if !cur.starts_with(d.open) {
                continue;
            }
            let saved = cur.clone();
            let start = cur.pos();
            cur.bump_str(d.open);
            let inner_start = cur.pos();
            let doubled = d.doubled();

            let closed = loop {
                if cur.eof() {
                    break false;
                }
                if cur.bump_escape() || self.skip_raw(cur) {
                    continue;
                }
                if let Some(doubled) = &doubled
                    && cur.starts_with(doubled)
                {
                    cur.bump_str(doubled);
                    continue;
                }
                if cur.starts_with(d.close) {
                    break true;
                }
                cur.bump();
            };
            let inner_end = cur.pos();
            if !closed || inner_end == inner_start {
                *cur = saved;
                continue;
            }
            cur.bump_str(d.close);

            let inner = Span::new(inner_start, inner_end);
            return Some(InlineNode::Element {
                tag: d.tag,
                full: Span::new(start, cur.pos()),
                href: None,
                children: parse_inline(self.src, inner),
            });
        }
        None
    }
}

fn seek_to(cur: &mut Cursor<'_>, end: Option<usize>) -> bool {
    match end {
        Some(end) => {
            cur.seek(end);
            true
        }
        None => false,
    }
}

/// `` ``code`` `` then `` `code` ``. On failure the cursor is restored.
fn try_parse_code_span(cur: &mut Cursor<'_>) -> Option<InlineNode> {
    for tick in [CodeSpan::DOUBLE_TICK, CodeSpan::TICK] {
        if !cur.starts_with(tick) {
            continue;
        }
        let saved = cur.clone();
        let start = cur.pos();
        cur.bump_str(tick);
        let inner_start = cur.pos();
        while !cur.eof() && !cur.starts_with(tick) {
            cur.bump();
        }
        let inner_end = cur.pos();
        if cur.eof() || inner_end == inner_start {
            *cur = saved;
            continue;
        }
        cur.bump_str(tick);
        let inner = Span::new(inner_start, inner_end);
        return Some(InlineNode::Element {
            tag: CosmeticTag::Code,
            full: Span::new(start, cur.pos()),
            href: None,
            children: vec![InlineNode::Text(inner)],
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(s: &str) -> Vec<InlineNode> {
        parse_inline(s, Span::new(0, s.len()))
    }

    fn text(start: usize, end: usize) -> InlineNode {
        InlineNode::Text(Span::new(start, end))
    }

    /// Compact rendering: `strong(llo)`, text as-is.
    fn render(src: &str, nodes: &[InlineNode]) -> String {
        nodes
            .iter()
            .map(|n| match n {
                InlineNode::Text(sp) => sp.slice(src).to_string(),
                InlineNode::Element {
                    tag,
                    href,
                    children,
                    ..
                } => {
                    let href = href.map(|h| format!("<{}>", h.slice(src))).unwrap_or_default();
                    format!("{}{href}({})", tag.name(), render(src, children))
                }
            })
            .collect()
    }

    #[test]
    fn plain_text() {
        assert_eq!(parse("hello world"), vec![text(0, 11)]);
    }

    #[test]
    fn strong_inside_text() {
        let nodes = parse("he**llo**");
        assert_eq!(
            nodes,
            vec![
                text(0, 2),
                InlineNode::Element {
                    tag: CosmeticTag::Strong,
                    full: Span::new(2, 9),
                    href: None,
                    children: vec![text(4, 7)],
                }
            ]
        );
    }

    #[test]
    fn code_span_is_a_raw_zone() {
        let src = "`**not bold**` and ``a`b``";
        assert_eq!(render(src, &parse(src)), "code(**not bold**) and code(a`b)");
    }

    #[test]
    fn closer_inside_code_is_ignored() {
        let src = "**a `b**` c**";
        assert_eq!(render(src, &parse(src)), "strong(a code(b**) c)");
    }

    #[test]
    fn link_with_formatted_text() {
        let src = "see [**x**](x.md)!";
        assert_eq!(render(src, &parse(src)), "see a<x.md>(strong(x))!");
    }

    #[test]
    fn empty_href_is_a_link() {
        let src = "[bare]()";
        assert_eq!(render(src, &parse(src)), "a<>(bare)");
    }

    #[test]
    fn emphasis_forms() {
        let src = "_a_ *b* ~c~ ~~d~~";
        assert_eq!(render(src, &parse(src)), "em(a) em(b) del(c) del(d)");
    }

    #[test]
    fn em_around_strong() {
        let src = "*a **b** c*";
        assert_eq!(render(src, &parse(src)), "em(a strong(b) c)");
    }

    #[test]
    fn sup_and_sub() {
        let src = "x<sup>2</sup> H<sub>2</sub>O";
        assert_eq!(render(src, &parse(src)), "xsup(2) Hsub(2)O");
    }

    #[test]
    fn unclosed_and_empty_markup_is_text() {
        for src in ["**open", "a * b", "``", "[x](y", "[](y)"] {
            assert_eq!(parse(src), vec![text(0, src.len())], "{src}");
        }
    }

    #[test]
    fn escaped_delimiters_are_text() {
        let src = r"snake\_case\_name and 2 \* 3 \* 4";
        assert_eq!(parse(src), vec![text(0, src.len())]);

        let src = r"**a\*\*b** \[x\](y)";
        assert_eq!(render(src, &parse(src)), r"strong(a\*\*b) \[x\](y)");
    }

    #[test]
    fn escape_before_code_tick() {
        let src = r"\`a `b`";
        assert_eq!(render(src, &parse(src)), r"\`a code(b)");
    }

    #[test]
    fn unclosed_openers_before_unclosed_links() {
        let src = "<sup>[".repeat(500);
        let start = std::time::Instant::now();
        assert_eq!(parse(&src), vec![text(0, src.len())]);
        assert!(start.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn spans_are_absolute() {
        let src = "# he**llo**";
        let nodes = parse_inline(src, Span::new(2, src.len()));
        assert_eq!(render(src, &nodes), "hestrong(llo)");
        assert_eq!(nodes[0], text(2, 4));
    }
}
