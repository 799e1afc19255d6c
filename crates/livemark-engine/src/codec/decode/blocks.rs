use log::debug;

use crate::codec::span::Span;
use crate::error::EngineError;

use super::classify::{LineClass, LineKind};
use super::table::{self, ParsedTable};

/// A block found by the structural pass. Inline content is still raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedBlock {
    Heading { level: usize, content: Span },
    Paragraph { content: Span },
    Quote { content: Span },
    List { ordered: bool, items: Vec<Span> },
    Fence { lang: Span, body: Span },
    Image { alt: Span, src: Span },
    Table(ParsedTable),
}

#[derive(Debug, Default)]
enum LeafState {
    #[default]
    None,
    List {
        ordered: bool,
        items: Vec<Span>,
    },
    Table {
        lines: Vec<LineClass>,
    },
    Fence {
        opener: Span,
        lang: Span,
        body: Vec<LineClass>,
    },
}

/// Phase 2 of block parsing: groups classified lines into blocks.
///
/// Lists and tables accumulate across consecutive lines; everything else is
/// one block per line. A fence swallows lines until a bare closing fence;
/// if the input ends first, the opener becomes a paragraph and the
/// swallowed lines are replayed.
pub struct BlockBuilder<'a> {
    src: &'a str,
    leaf: LeafState,
    out: Vec<ParsedBlock>,
    diagnostics: Vec<EngineError>,
}

impl<'a> BlockBuilder<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            leaf: LeafState::None,
            out: vec![],
            diagnostics: vec![],
        }
    }

    pub fn push(&mut self, c: &LineClass) {
        if let LeafState::Fence { body, .. } = &mut self.leaf {
            if matches!(c.kind, LineKind::Fence { bare: true, .. }) {
                self.close_fence(c.line);
            } else {
                body.push(*c);
            }
            return;
        }

        match c.kind {
            LineKind::Blank => self.flush(),
            LineKind::Fence { lang, .. } => {
                self.flush();
                self.leaf = LeafState::Fence {
                    opener: c.line,
                    lang,
                    body: vec![],
                };
            }
            LineKind::TableRow | LineKind::TableSeparator => {
                if let LeafState::Table { lines } = &mut self.leaf {
                    lines.push(*c);
                } else {
                    self.flush();
                    self.leaf = LeafState::Table { lines: vec![*c] };
                }
            }
            LineKind::ListItem { ordered, content } => match &mut self.leaf {
                LeafState::List {
                    ordered: open,
                    items,
                } if *open == ordered => items.push(content),
                _ => {
                    self.flush();
                    self.leaf = LeafState::List {
                        ordered,
                        items: vec![content],
                    };
                }
            },
            LineKind::Heading { level, content } => self.single(ParsedBlock::Heading { level, content }),
            LineKind::Quote { content } => self.single(ParsedBlock::Quote { content }),
            LineKind::Image { alt, src } => self.single(ParsedBlock::Image { alt, src }),
            LineKind::Text => self.single(ParsedBlock::Paragraph { content: c.line }),
        }
    }

    /// Flushes open state at end of input; returns blocks and diagnostics.
    pub fn finish(mut self) -> (Vec<ParsedBlock>, Vec<EngineError>) {
        while !matches!(self.leaf, LeafState::None) {
            self.flush();
        }
        (self.out, self.diagnostics)
    }

    fn single(&mut self, block: ParsedBlock) {
        self.flush();
        self.out.push(block);
    }

    fn close_fence(&mut self, closer: Span) {
        if let LeafState::Fence { lang, body, .. } = std::mem::take(&mut self.leaf) {
            let body = match (body.first(), body.last()) {
                (Some(first), Some(last)) => Span::new(first.line.start, last.line.end),
                _ => Span::empty_at(closer.start),
            };
            self.out.push(ParsedBlock::Fence { lang, body });
        }
    }

    fn flush(&mut self) {
        match std::mem::take(&mut self.leaf) {
            LeafState::None => {}
            LeafState::List { ordered, items } => self.out.push(ParsedBlock::List { ordered, items }),
            LeafState::Table { lines } => match table::assemble(self.src, &lines) {
                Ok(parsed) => self.out.push(ParsedBlock::Table(parsed)),
                Err(err) => {
                    log::warn!("table fallback to paragraph: {err}");
                    self.diagnostics.push(err);
                    if let (Some(first), Some(last)) = (lines.first(), lines.last()) {
                        self.out.push(ParsedBlock::Paragraph {
                            content: Span::new(first.line.start, last.line.end),
                        });
                    }
                }
            },
            LeafState::Fence { opener, body, .. } => {
                debug!("unterminated fence at byte {}, treating as text", opener.start);
                self.out.push(ParsedBlock::Paragraph { content: opener });
                for line in &body {
                    self.push(line);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode::classify::{MarkdownLineClassifier, lines_with_spans};
    use pretty_assertions::assert_eq;

    fn build(src: &str) -> (Vec<ParsedBlock>, Vec<EngineError>) {
        let mut builder = BlockBuilder::new(src);
        for lr in lines_with_spans(src) {
            builder.push(&MarkdownLineClassifier.classify(&lr));
        }
        builder.finish()
    }

    fn slices<'s>(src: &'s str, spans: &[Span]) -> Vec<&'s str> {
        spans.iter().map(|s| s.slice(src)).collect()
    }

    #[test]
    fn one_paragraph_per_line() {
        let src = "first\nsecond\n\nthird";
        let (blocks, _) = build(src);
        let contents: Vec<&str> = blocks
            .iter()
            .map(|b| match b {
                ParsedBlock::Paragraph { content } => content.slice(src),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn list_items_merge_per_run_of_same_kind() {
        let src = "* a\n* b\n1. c\n\n* d";
        let (blocks, _) = build(src);
        assert_eq!(blocks.len(), 3);
        match &blocks[0] {
            ParsedBlock::List { ordered, items } => {
                assert!(!ordered);
                assert_eq!(slices(src, items), vec!["a", "b"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(&blocks[1], ParsedBlock::List { ordered: true, items } if items.len() == 1));
        assert!(matches!(&blocks[2], ParsedBlock::List { ordered: false, .. }));
    }

    #[test]
    fn fence_keeps_body_verbatim() {
        let src = "```rust\nlet a = 1;\n\n# not a heading\n```\nafter";
        let (blocks, _) = build(src);
        match &blocks[0] {
            ParsedBlock::Fence { lang, body } => {
                assert_eq!(lang.slice(src), "rust");
                assert_eq!(body.slice(src), "let a = 1;\n\n# not a heading");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(blocks[1], ParsedBlock::Paragraph { .. }));
    }

    #[test]
    fn empty_fence_body() {
        let src = "```\n```";
        let (blocks, _) = build(src);
        assert_eq!(
            blocks,
            vec![ParsedBlock::Fence {
                lang: Span::new(3, 3),
                body: Span::empty_at(4)
            }]
        );
    }

    #[test]
    fn unterminated_fence_is_literal() {
        let src = "```js\n# Title";
        let (blocks, diagnostics) = build(src);
        assert!(diagnostics.is_empty());
        assert_eq!(
            blocks,
            vec![
                ParsedBlock::Paragraph {
                    content: Span::new(0, 5)
                },
                ParsedBlock::Heading {
                    level: 1,
                    content: Span::new(8, 13)
                },
            ]
        );
    }

    #[test]
    fn ragged_table_becomes_one_paragraph() {
        let src = "| a | b |\n| c |";
        let (blocks, diagnostics) = build(src);
        assert_eq!(
            blocks,
            vec![ParsedBlock::Paragraph {
                content: Span::new(0, src.len())
            }]
        );
        assert_eq!(
            diagnostics,
            vec![EngineError::TableShape {
                row: 1,
                expected: 2,
                found: 1
            }]
        );
    }
}
