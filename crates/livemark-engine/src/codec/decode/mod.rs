//! # Decoder (text to tree)
//!
//! ## Architecture
//!
//! 1. **Classify**: each line gets a [`classify::LineKind`] from local facts.
//! 2. **Build**: [`blocks::BlockBuilder`] groups lines into blocks (lists and
//!    tables span lines; fences are raw zones).
//! 3. **Inline**: [`inline::parse_inline`] runs over every inline-bearing
//!    block, code spans first.
//! 4. **Materialize**: a fresh [`Tree`]; every text leaf remembers the byte
//!    span it was cut from. Backslash escapes are removed from leaf text,
//!    except in code, which is raw.
//! 5. **Resolve**: the caret is placed in the leaf whose span touches it.
//!
//! Decoding never fails. Problems that force a fallback (a ragged table)
//! are returned as diagnostics.

pub mod blocks;
pub mod classify;
pub mod cursor;
pub mod inline;
pub mod table;

use log::debug;

use crate::codec::kinds::Escape;
use crate::codec::span::Span;
use crate::error::EngineError;
use crate::position::Position;
use crate::tree::{
    Attributes, BlockTag, CosmeticTag, NodeId, StructuralTag, Tag, Tree, byte_index, char_len,
};

use blocks::{BlockBuilder, ParsedBlock};
use classify::{MarkdownLineClassifier, lines_with_spans};
use inline::{InlineNode, parse_inline};

/// Decoder output.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub tree: Tree,
    /// Children of the root, in order.
    pub blocks: Vec<NodeId>,
    pub position: Position,
    pub diagnostics: Vec<EngineError>,
}

/// Parses `text` into a fresh tree and relocates `caret` (a `char` offset
/// into `text`, clamped to its length) onto a text leaf.
pub fn decode(text: &str, caret: usize) -> Decoded {
    let caret_byte = byte_index(text, caret);

    let mut builder = BlockBuilder::new(text);
    for lr in lines_with_spans(text) {
        builder.push(&MarkdownLineClassifier.classify(&lr));
    }
    let (parsed, diagnostics) = builder.finish();

    let mut m = Materializer {
        src: text,
        tree: Tree::new(),
        leaves: vec![],
    };
    for block in &parsed {
        m.block(block);
    }
    if m.leaves.is_empty() {
        let root = m.tree.root();
        m.leaf(root, Span::empty_at(caret_byte), true);
    }

    let position = resolve_caret(text, &m.tree, &m.leaves, caret_byte);
    let blocks = m.tree.children(m.tree.root()).to_vec();
    Decoded {
        tree: m.tree,
        blocks,
        position,
        diagnostics,
    }
}

/// A materialized text leaf and where its text came from.
#[derive(Debug, Clone, Copy)]
struct Leaf {
    id: NodeId,
    span: Span,
    /// Taken verbatim; escapes were not removed.
    raw: bool,
}

impl Leaf {
    /// `char` offset in the leaf of byte `pos` of the input.
    fn offset(&self, src: &str, pos: usize) -> usize {
        if self.raw {
            char_len(&src[self.span.start..pos])
        } else {
            Escape::char_offset(self.span.slice(src), pos - self.span.start)
        }
    }
}

struct Materializer<'a> {
    src: &'a str,
    tree: Tree,
    leaves: Vec<Leaf>,
}

impl Materializer<'_> {
    fn attach(&mut self, parent: NodeId, child: NodeId) {
        // Fresh detached nodes, and inline parsing never yields adjacent text.
        let _ = self.tree.append_child(parent, child);
    }

    fn element(&mut self, parent: NodeId, tag: impl Into<Tag>) -> NodeId {
        let id = self.tree.create_element(tag);
        self.attach(parent, id);
        id
    }

    fn leaf(&mut self, parent: NodeId, span: Span, raw: bool) {
        let text = span.slice(self.src);
        let id = if raw {
            self.tree.create_text(text)
        } else {
            self.tree.create_text(Escape::unescape(text))
        };
        self.attach(parent, id);
        self.leaves.push(Leaf { id, span, raw });
    }

    /// Inline content of `span` under `parent`; an empty span still gets a
    /// (empty) leaf so the caret has somewhere to go.
    fn inline(&mut self, parent: NodeId, span: Span) {
        let nodes = parse_inline(self.src, span);
        if nodes.is_empty() {
            self.leaf(parent, Span::empty_at(span.start), false);
        }
        for node in &nodes {
            self.inline_node(parent, node, false);
        }
    }

    fn inline_node(&mut self, parent: NodeId, node: &InlineNode, raw: bool) {
        match node {
            InlineNode::Text(span) => self.leaf(parent, *span, raw),
            InlineNode::Element {
                tag,
                href,
                children,
                ..
            } => {
                let mut attributes = Attributes::new();
                if let Some(href) = href {
                    attributes.insert("href".to_string(), href.slice(self.src).to_string());
                }
                let id = self.tree.create_element_with(*tag, attributes);
                self.attach(parent, id);
                let raw = raw || *tag == CosmeticTag::Code;
                for child in children {
                    self.inline_node(id, child, raw);
                }
            }
        }
    }

    fn block(&mut self, block: &ParsedBlock) {
        let root = self.tree.root();
        match block {
            ParsedBlock::Heading { level, content } => {
                let tag = BlockTag::heading(*level).unwrap_or(BlockTag::H4);
                let id = self.element(root, tag);
                self.inline(id, *content);
            }
            ParsedBlock::Paragraph { content } => {
                let id = self.element(root, BlockTag::P);
                self.inline(id, *content);
            }
            ParsedBlock::Quote { content } => {
                let id = self.element(root, BlockTag::Blockquote);
                self.inline(id, *content);
            }
            ParsedBlock::List { ordered, items } => {
                let tag = if *ordered { BlockTag::Ol } else { BlockTag::Ul };
                let list = self.element(root, tag);
                for item in items {
                    let li = self.element(list, StructuralTag::Li);
                    self.inline(li, *item);
                }
            }
            ParsedBlock::Fence { lang, body } => {
                let mut attributes = Attributes::new();
                if !lang.is_empty() {
                    attributes.insert("lang".to_string(), lang.slice(self.src).to_string());
                }
                let pre = self.tree.create_element_with(BlockTag::Pre, attributes);
                self.attach(root, pre);
                self.leaf(pre, *body, true);
            }
            ParsedBlock::Image { alt, src } => {
                let mut attributes = Attributes::new();
                attributes.insert("src".to_string(), src.slice(self.src).to_string());
                let img = self.tree.create_element_with(BlockTag::Img, attributes);
                self.attach(root, img);
                self.inline(img, *alt);
            }
            ParsedBlock::Table(table) => {
                let id = self.element(root, BlockTag::Table);
                if let Some(head) = &table.head {
                    let thead = self.element(id, StructuralTag::Thead);
                    self.row(thead, head, StructuralTag::Th);
                }
                if !table.rows.is_empty() {
                    let tbody = self.element(id, StructuralTag::Tbody);
                    for row in &table.rows {
                        self.row(tbody, row, StructuralTag::Td);
                    }
                }
            }
        }
    }

    fn row(&mut self, section: NodeId, cells: &[Span], cell_tag: StructuralTag) {
        let tr = self.element(section, StructuralTag::Tr);
        for cell in cells {
            let id = self.element(tr, cell_tag);
            self.inline(id, *cell);
        }
    }
}

/// Places the caret on the leaf whose span touches it (first wins). From
/// inside syntax it first moves forward to the next word character; failing
/// that it snaps to the next leaf's start, else the last leaf's end.
fn resolve_caret(src: &str, tree: &Tree, leaves: &[Leaf], caret: usize) -> Position {
    let touching = |pos: usize| {
        leaves
            .iter()
            .find(|leaf| leaf.span.touches(pos))
            .map(|leaf| Position::new(leaf.id, leaf.offset(src, pos)))
    };

    if let Some(position) = touching(caret) {
        return position;
    }
    let forward = src
        .get(caret..)
        .and_then(|rest| rest.char_indices().find(|(_, c)| c.is_alphanumeric()))
        .map_or(src.len(), |(i, _)| caret + i);
    debug!("caret {caret} inside syntax, moving to {forward}");
    if let Some(position) = touching(forward) {
        return position;
    }
    if let Some(leaf) = leaves.iter().find(|leaf| leaf.span.start >= forward) {
        return Position::new(leaf.id, 0);
    }
    match leaves.last() {
        Some(leaf) => Position::new(leaf.id, tree.text_len(leaf.id).unwrap_or(0)),
        None => Position::new(tree.root(), 0),
    }
}
