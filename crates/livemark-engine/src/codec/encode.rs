//! # Encoder (tree to text)
//!
//! Pre-order walk emitting [`Chunk`]s. Markup tokens carry no source; text
//! chunks remember the leaf they came from, which is how the caret's
//! `char` offset in the output is found.
//!
//! Outside `pre`, whitespace runs collapse to a single space. Outside code,
//! markup characters in text are backslash-escaped (see [`Escape`]), so
//! the text decodes back to the same leaves. The caret offset inside a leaf
//! is mapped through both.
//!
//! Empty paragraphs have no text form: a `p("")` between blocks encodes to
//! a blank line, which decodes to nothing.

use std::borrow::Cow;
use std::sync::OnceLock;

use log::trace;
use regex::Regex;

use super::kinds::{
    BlockQuote, CodeFence, CodeSpan, Delimited, Escape, Heading, Image, Link, ListItem, Table,
};
use crate::error::{EngineError, Result};
use crate::position::Position;
use crate::tree::{
    BlockTag, CosmeticTag, Element, NodeId, NodeKind, StructuralTag, Tag, Tree, byte_index,
    char_len,
};

/// Attribute a markdown view `pre` carries: the tag of the block it replaced.
pub const MARKDOWN_VIEW_ATTR: &str = "data-markdown";

static WHITESPACE_RUN: OnceLock<Regex> = OnceLock::new();

fn collapse_whitespace(s: &str) -> Cow<'_, str> {
    WHITESPACE_RUN
        .get_or_init(|| Regex::new(r"\s+").expect("Invalid whitespace regex"))
        .replace_all(s, " ")
}

/// Encoder output: the text plus the caret's `char` offset in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub text: String,
    pub caret: Option<usize>,
}

/// How a leaf's `char` offsets map into its chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mapping {
    /// `pre` content, copied as is.
    Verbatim,
    /// Code content: whitespace collapsed, nothing escaped.
    Collapsed,
    /// Whitespace collapsed, then escaped; indexed by collapsed offset.
    Escaped(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Chunk {
    text: String,
    source: Option<NodeId>,
    mapping: Mapping,
}

/// Encodes the subtree at `node` (a block, or the root for the whole
/// document) and locates `position` in the output.
pub fn encode(tree: &Tree, node: NodeId, position: Option<Position>) -> Result<Encoded> {
    if !tree.contains(node) {
        return Err(EngineError::NodeNotFound(node));
    }
    let mut walker = Walker::default();
    walker.emit(tree, node, Context::default());
    trace!("encoded {:?} into {} chunks", node, walker.chunks.len());

    let caret = position
        .map(|p| locate(tree, &walker.chunks, node, p))
        .transpose()?;
    let text = walker.chunks.into_iter().map(|c| c.text).collect();
    Ok(Encoded { text, caret })
}

/// The whole document as text, blocks separated by a blank line.
pub fn to_markdown(tree: &Tree) -> String {
    let mut walker = Walker::default();
    walker.emit(tree, tree.root(), Context::default());
    walker.chunks.into_iter().map(|c| c.text).collect()
}

fn locate(tree: &Tree, chunks: &[Chunk], root: NodeId, position: Position) -> Result<usize> {
    let mut acc = 0;
    for chunk in chunks {
        if chunk.source == Some(position.node) {
            let raw = tree.text(position.node)?;
            let len = char_len(raw);
            if position.offset > len {
                return Err(EngineError::OffsetOutOfRange {
                    node: position.node,
                    offset: position.offset,
                    len,
                });
            }
            let prefix = &raw[..byte_index(raw, position.offset)];
            let collapsed = || char_len(&collapse_whitespace(prefix));
            let mapped = match &chunk.mapping {
                Mapping::Verbatim => position.offset,
                Mapping::Collapsed => collapsed(),
                Mapping::Escaped(offsets) => {
                    let k = collapsed();
                    offsets.get(k).copied().unwrap_or_else(|| char_len(&chunk.text))
                }
            };
            return Ok(acc + mapped);
        }
        acc += char_len(&chunk.text);
    }
    Err(EngineError::PositionNotFound {
        node: position.node,
        root,
    })
}

#[derive(Debug, Clone, Copy, Default)]
struct Context {
    verbatim: bool,
    /// Inside inline code: collapse whitespace but never escape.
    raw: bool,
    ordered: bool,
}

#[derive(Default)]
struct Walker {
    chunks: Vec<Chunk>,
    /// Nothing has been written yet on the current paragraph line.
    line_start: bool,
}

impl Walker {
    fn markup(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.line_start = false;
            self.chunks.push(Chunk {
                text,
                source: None,
                mapping: Mapping::Verbatim,
            });
        }
    }

    fn leaf(&mut self, id: NodeId, content: &str, ctx: Context) {
        let (text, mapping) = if ctx.verbatim {
            (content.to_string(), Mapping::Verbatim)
        } else if ctx.raw {
            (collapse_whitespace(content).into_owned(), Mapping::Collapsed)
        } else {
            let (text, offsets) = Escape::escape(&collapse_whitespace(content), self.line_start);
            (text, Mapping::Escaped(offsets))
        };
        if !text.is_empty() {
            self.line_start = false;
        }
        self.chunks.push(Chunk {
            text,
            source: Some(id),
            mapping,
        });
    }

    fn children(&mut self, tree: &Tree, id: NodeId, ctx: Context) {
        for &child in tree.children(id) {
            self.emit(tree, child, ctx);
        }
    }

    fn emit(&mut self, tree: &Tree, id: NodeId, ctx: Context) {
        match tree.kind(id) {
            Ok(NodeKind::Root) => {
                for (i, &child) in tree.children(id).iter().enumerate() {
                    if i > 0 {
                        self.markup("\n");
                    }
                    self.emit(tree, child, ctx);
                }
            }
            Ok(NodeKind::Text(content)) => self.leaf(id, content, ctx),
            Ok(NodeKind::Element(element)) => self.element(tree, id, element, ctx),
            Err(_) => {}
        }
    }

    fn element(&mut self, tree: &Tree, id: NodeId, element: &Element, ctx: Context) {
        match element.tag {
            Tag::Block(block) => self.block(tree, id, element, block, ctx),
            Tag::Cosmetic(cosmetic) => self.cosmetic(tree, id, element, cosmetic, ctx),
            Tag::Structural(StructuralTag::Li) => {
                self.markup(ListItem::prefix(ctx.ordered));
                self.children(tree, id, ctx);
                self.markup("\n");
            }
            Tag::Structural(StructuralTag::Thead | StructuralTag::Tbody) => {
                for &row in tree.children(id) {
                    self.table_row(tree, row, ctx);
                }
            }
            Tag::Structural(StructuralTag::Tr) => self.table_row(tree, id, ctx),
            Tag::Structural(StructuralTag::Th | StructuralTag::Td) => {
                self.children(tree, id, ctx)
            }
        }
    }

    fn block(&mut self, tree: &Tree, id: NodeId, element: &Element, tag: BlockTag, ctx: Context) {
        match tag {
            BlockTag::H1 | BlockTag::H2 | BlockTag::H3 | BlockTag::H4 => {
                let level = tag.heading_level().unwrap_or(1);
                self.markup(Heading::prefix(level));
                self.children(tree, id, ctx);
                self.markup("\n");
            }
            BlockTag::P => {
                self.line_start = true;
                self.children(tree, id, ctx);
                self.line_start = false;
                self.markup("\n");
            }
            BlockTag::Blockquote => {
                self.markup(BlockQuote::PREFIX);
                self.children(tree, id, ctx);
                self.markup("\n");
            }
            BlockTag::Ul | BlockTag::Ol => {
                let ctx = Context {
                    ordered: tag == BlockTag::Ol,
                    ..ctx
                };
                self.children(tree, id, ctx);
            }
            BlockTag::Pre => {
                let verbatim = Context {
                    verbatim: true,
                    ..ctx
                };
                if element.attributes.contains_key(MARKDOWN_VIEW_ATTR) {
                    self.children(tree, id, verbatim);
                    self.markup("\n");
                } else {
                    let lang = element.attributes.get("lang").map_or("", String::as_str);
                    self.markup(CodeFence::opener(lang));
                    self.children(tree, id, verbatim);
                    self.markup(CodeFence::closer());
                }
            }
            BlockTag::Img => {
                self.markup(Image::OPEN);
                self.children(tree, id, ctx);
                let src = element.attributes.get("src").map_or("", String::as_str);
                self.markup(Image::suffix(src));
            }
            BlockTag::Table => self.table(tree, id, ctx),
        }
    }

    fn cosmetic(
        &mut self,
        tree: &Tree,
        id: NodeId,
        element: &Element,
        tag: CosmeticTag,
        ctx: Context,
    ) {
        match tag {
            CosmeticTag::Code => {
                let tick = CodeSpan::delimiter_for(&tree.text_content(id));
                self.markup(tick);
                self.children(tree, id, Context { raw: true, ..ctx });
                self.markup(tick);
            }
            CosmeticTag::A => {
                self.markup(Link::OPEN);
                self.children(tree, id, ctx);
                let href = element.attributes.get("href").map_or("", String::as_str);
                self.markup(Link::suffix(href));
            }
            _ => {
                if let Some(d) = Delimited::output(tag) {
                    self.markup(d.open);
                    self.children(tree, id, ctx);
                    self.markup(d.close);
                }
            }
        }
    }

    fn table(&mut self, tree: &Tree, id: NodeId, ctx: Context) {
        for &section in tree.children(id) {
            let is_head = tree.tag(section) == Some(Tag::Structural(StructuralTag::Thead));
            match tree.tag(section) {
                Some(Tag::Structural(StructuralTag::Tr)) => self.table_row(tree, section, ctx),
                _ => {
                    for &row in tree.children(section) {
                        self.table_row(tree, row, ctx);
                    }
                }
            }
            if is_head {
                let columns = tree
                    .children(section)
                    .first()
                    .map_or(1, |&row| tree.children(row).len());
                self.markup(Table::separator(columns));
            }
        }
    }

    fn table_row(&mut self, tree: &Tree, row: NodeId, ctx: Context) {
        for (i, &cell) in tree.children(row).iter().enumerate() {
            self.markup(if i == 0 { Table::ROW_OPEN } else { Table::CELL_GAP });
            self.children(tree, cell, ctx);
        }
        self.markup(Table::ROW_CLOSE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Outline;
    use pretty_assertions::assert_eq;

    fn doc(blocks: Vec<Outline>) -> Tree {
        Tree::from_outlines(&blocks)
    }

    fn first_block(tree: &Tree) -> NodeId {
        tree.children(tree.root())[0]
    }

    #[test]
    fn strong_inside_paragraph_with_caret() {
        let tree = doc(vec![Outline::element(
            BlockTag::P,
            vec![
                Outline::text("he"),
                Outline::element(CosmeticTag::Strong, vec![Outline::text("llo")]),
            ],
        )]);
        let p = first_block(&tree);
        let llo = tree.last_text_leaf(p).unwrap();

        let encoded = encode(&tree, p, Some(Position::new(llo, 1))).unwrap();
        assert_eq!(encoded.text, "he**llo**\n");
        assert_eq!(encoded.caret, Some(5));
    }

    #[test]
    fn heading_prefix() {
        let tree = doc(vec![Outline::element(BlockTag::H3, vec![Outline::text("Deep")])]);
        let encoded = encode(&tree, first_block(&tree), None).unwrap();
        assert_eq!(encoded.text, "### Deep\n");
        assert_eq!(encoded.caret, None);
    }

    #[test]
    fn lists_use_parent_kind() {
        let item = |s: &str| Outline::element(StructuralTag::Li, vec![Outline::text(s)]);
        let tree = doc(vec![
            Outline::element(BlockTag::Ul, vec![item("a"), item("b")]),
            Outline::element(BlockTag::Ol, vec![item("c")]),
        ]);
        assert_eq!(to_markdown(&tree), "* a\n* b\n\n1. c\n");
    }

    #[test]
    fn pre_is_verbatim_and_fenced() {
        let tree = doc(vec![Outline::element_with(
            BlockTag::Pre,
            [("lang", "rust")],
            vec![Outline::text("fn  main() {}\n  x")],
        )]);
        assert_eq!(to_markdown(&tree), "```rust\nfn  main() {}\n  x\n```\n");
    }

    #[test]
    fn markdown_view_is_emitted_without_fence() {
        let tree = doc(vec![Outline::element_with(
            BlockTag::Pre,
            [(MARKDOWN_VIEW_ATTR, "p")],
            vec![Outline::text("he**llo**")],
        )]);
        assert_eq!(to_markdown(&tree), "he**llo**\n");
    }

    #[test]
    fn whitespace_collapses_and_caret_follows() {
        let tree = doc(vec![Outline::element(BlockTag::P, vec![Outline::text("a   b\n c")])]);
        let p = first_block(&tree);
        let leaf = tree.first_text_leaf(p).unwrap();

        let encoded = encode(&tree, p, Some(Position::new(leaf, 5))).unwrap();
        assert_eq!(encoded.text, "a b c\n");
        assert_eq!(encoded.caret, Some(3));
    }

    #[test]
    fn code_uses_double_tick_when_needed() {
        let tree = doc(vec![Outline::element(
            BlockTag::P,
            vec![
                Outline::element(CosmeticTag::Code, vec![Outline::text("a`b")]),
                Outline::text(" and "),
                Outline::element(CosmeticTag::Code, vec![Outline::text("**x**")]),
            ],
        )]);
        assert_eq!(to_markdown(&tree), "``a`b`` and `**x**`\n");
    }

    #[test]
    fn links_images_and_scripts() {
        let tree = doc(vec![
            Outline::element(
                BlockTag::P,
                vec![
                    Outline::element_with(CosmeticTag::A, [("href", "x.md")], vec![Outline::text("x")]),
                    Outline::text(" "),
                    Outline::element(CosmeticTag::A, vec![Outline::text("bare")]),
                    Outline::text(" H"),
                    Outline::element(CosmeticTag::Sub, vec![Outline::text("2")]),
                    Outline::text("O "),
                    Outline::element(CosmeticTag::Del, vec![Outline::text("gone")]),
                    Outline::text(" "),
                    Outline::element(CosmeticTag::Em, vec![Outline::text("it")]),
                ],
            ),
            Outline::element_with(BlockTag::Img, [("src", "cat.png")], vec![Outline::text("cat")]),
        ]);
        assert_eq!(
            to_markdown(&tree),
            "[x](x.md) [bare]() H<sub>2</sub>O ~gone~ _it_\n\n![cat](cat.png)\n"
        );
    }

    #[test]
    fn table_with_header() {
        let cell = |tag: StructuralTag, s: &str| Outline::element(tag, vec![Outline::text(s)]);
        let tree = doc(vec![Outline::element(
            BlockTag::Table,
            vec![
                Outline::element(
                    StructuralTag::Thead,
                    vec![Outline::element(
                        StructuralTag::Tr,
                        vec![cell(StructuralTag::Th, "a"), cell(StructuralTag::Th, "b")],
                    )],
                ),
                Outline::element(
                    StructuralTag::Tbody,
                    vec![Outline::element(
                        StructuralTag::Tr,
                        vec![cell(StructuralTag::Td, "1"), cell(StructuralTag::Td, "2")],
                    )],
                ),
            ],
        )]);
        assert_eq!(to_markdown(&tree), "| a | b |\n|-|-|\n| 1 | 2 |\n");
    }

    #[test]
    fn caret_outside_subtree_is_an_error() {
        let tree = doc(vec![
            Outline::element(BlockTag::P, vec![Outline::text("one")]),
            Outline::element(BlockTag::P, vec![Outline::text("two")]),
        ]);
        let blocks = tree.children(tree.root()).to_vec();
        let other = tree.first_text_leaf(blocks[1]).unwrap();

        let err = encode(&tree, blocks[0], Some(Position::new(other, 0))).unwrap_err();
        assert_eq!(
            err,
            EngineError::PositionNotFound {
                node: other,
                root: blocks[0]
            }
        );
    }

    #[test]
    fn caret_past_leaf_end_is_an_error() {
        let tree = doc(vec![Outline::element(BlockTag::P, vec![Outline::text("ab")])]);
        let p = first_block(&tree);
        let leaf = tree.first_text_leaf(p).unwrap();
        let err = encode(&tree, p, Some(Position::new(leaf, 3))).unwrap_err();
        assert_eq!(
            err,
            EngineError::OffsetOutOfRange {
                node: leaf,
                offset: 3,
                len: 2
            }
        );
    }

    #[test]
    fn markup_characters_in_text_are_escaped() {
        let tree = doc(vec![
            Outline::element(BlockTag::P, vec![Outline::text("snake_case_name")]),
            Outline::element(BlockTag::P, vec![Outline::text("# not a heading")]),
            Outline::element(BlockTag::P, vec![Outline::text("1. not a list")]),
            Outline::element(
                BlockTag::P,
                vec![
                    Outline::text("2 * 3 "),
                    Outline::element(CosmeticTag::Code, vec![Outline::text("a_b")]),
                ],
            ),
            Outline::element(BlockTag::H2, vec![Outline::text("# kept")]),
        ]);
        assert_eq!(
            to_markdown(&tree),
            "snake\\_case\\_name\n\n\\# not a heading\n\n1\\. not a list\n\n2 \\* 3 `a_b`\n\n## # kept\n"
        );
    }

    #[test]
    fn caret_maps_through_escapes() {
        let tree = doc(vec![Outline::element(BlockTag::P, vec![Outline::text("a_b_c")])]);
        let p = first_block(&tree);
        let leaf = tree.first_text_leaf(p).unwrap();
        let encoded = encode(&tree, p, Some(Position::new(leaf, 3))).unwrap();
        assert_eq!(encoded.text, "a\\_b\\_c\n");
        assert_eq!(encoded.caret, Some(4));
    }

    #[test]
    fn empty_paragraph_between_blocks_is_a_blank_line() {
        let tree = doc(vec![
            Outline::element(BlockTag::P, vec![Outline::text("a")]),
            Outline::element(BlockTag::P, vec![Outline::text("")]),
            Outline::element(BlockTag::P, vec![Outline::text("b")]),
        ]);
        assert_eq!(to_markdown(&tree), "a\n\n\n\nb\n");
    }

    #[test]
    fn caret_counts_chars_not_bytes() {
        let tree = doc(vec![Outline::element(
            BlockTag::P,
            vec![
                Outline::element(CosmeticTag::Em, vec![Outline::text("été")]),
                Outline::text("ü"),
            ],
        )]);
        let p = first_block(&tree);
        let leaf = tree.last_text_leaf(p).unwrap();
        let encoded = encode(&tree, p, Some(Position::new(leaf, 1))).unwrap();
        assert_eq!(encoded.text, "_été_ü\n");
        assert_eq!(encoded.caret, Some(6));
    }
}
