//! Markdown views: a block swapped for a `pre` holding its encoded text.
//!
//! The `pre` carries [`MARKDOWN_VIEW_ATTR`] with the name of the block it
//! replaced, so an emptied view can come back as the same kind of block.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::codec::{MARKDOWN_VIEW_ATTR, decode, encode};
use crate::error::{EngineError, Result};
use crate::position::Position;
use crate::tree::{Attributes, BlockTag, NodeId, StructuralTag, Tree, char_len};

use super::blocks::{Replacement, replace_block};

pub fn is_markdown_view(tree: &Tree, block: NodeId) -> bool {
    tree.block_tag(block) == Some(BlockTag::Pre)
        && tree.attribute(block, MARKDOWN_VIEW_ATTR).is_some()
}

/// Replaces `block` by its markdown view. `caret` must lie inside `block`.
pub fn open(tree: &mut Tree, block: NodeId, caret: Position) -> Result<Replacement> {
    let tag = tree
        .block_tag(block)
        .ok_or(EngineError::NodeNotFound(block))?;
    let encoded = encode(tree, block, Some(caret))?;
    let text = encoded
        .text
        .strip_suffix('\n')
        .unwrap_or(&encoded.text)
        .to_string();
    let offset = encoded.caret.unwrap_or(0).min(char_len(&text));
    debug!("opening markdown view of {} block {block:?}", tag.name());

    tree.transaction(|t| {
        let mut attributes = Attributes::new();
        attributes.insert(MARKDOWN_VIEW_ATTR.to_string(), tag.name().to_string());
        let pre = t.create_element_with(BlockTag::Pre, attributes);
        let leaf = t.create_text(text);
        let _ = t.append_child(pre, leaf)?;
        replace_block(t, block, &[pre])?;
        Ok(Replacement {
            blocks: vec![pre],
            caret: Position::new(leaf, offset),
        })
    })
}

/// A markdown view turned back into structured blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closed {
    pub blocks: Vec<NodeId>,
    /// The relocated caret, when one was inside the view.
    pub caret: Option<Position>,
    /// Decoder fallbacks, already logged.
    pub diagnostics: Vec<EngineError>,
}

/// Decodes the text of `view` and puts the resulting blocks in its place.
pub fn close(tree: &mut Tree, view: NodeId, caret: Option<Position>) -> Result<Closed> {
    let text = tree.text_content(view);
    let offset = caret.and_then(|c| offset_in(tree, view, c));
    let cached = tree
        .attribute(view, MARKDOWN_VIEW_ATTR)
        .and_then(BlockTag::from_name);

    let decoded = decode(&text, offset.unwrap_or(0));
    for d in &decoded.diagnostics {
        warn!("markdown view {view:?}: {d}");
    }

    tree.transaction(|t| {
        let mut mapping = BTreeMap::new();
        let mut blocks = Vec::with_capacity(decoded.blocks.len());
        for &b in &decoded.blocks {
            let copy = t.graft(&decoded.tree, b, &mut mapping)?;
            let block = if t.is_text(copy) {
                adopt(t, copy, cached)?
            } else {
                copy
            };
            blocks.push(block);
        }
        replace_block(t, view, &blocks)?;
        debug!("closed markdown view {view:?} into {} block(s)", blocks.len());

        let caret = offset.and_then(|_| {
            mapping
                .get(&decoded.position.node)
                .map(|&node| Position::new(node, decoded.position.offset))
        });
        Ok(Closed {
            blocks,
            caret,
            diagnostics: decoded.diagnostics.clone(),
        })
    })
}

/// `char` offset of `caret` in the concatenated text of `view`.
fn offset_in(tree: &Tree, view: NodeId, caret: Position) -> Option<usize> {
    let mut acc = 0;
    for leaf in tree.text_leaves(view) {
        if leaf == caret.node {
            return Some(acc + caret.offset);
        }
        acc += tree.text_len(leaf).ok()?;
    }
    None
}

/// Gives a bare text leaf (what an empty view decodes to) a block to live
/// in, of the kind the view replaced when that kind can hold text.
fn adopt(tree: &mut Tree, leaf: NodeId, cached: Option<BlockTag>) -> Result<NodeId> {
    let block = match cached {
        Some(tag) if tag.is_list() => {
            let list = tree.create_element(tag);
            let li = tree.create_element(StructuralTag::Li);
            let _ = tree.append_child(list, li)?;
            let _ = tree.append_child(li, leaf)?;
            return Ok(list);
        }
        Some(BlockTag::Table | BlockTag::Img) | None => tree.create_element(BlockTag::P),
        Some(tag) => tree.create_element(tag),
    };
    let _ = tree.append_child(block, leaf)?;
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{CosmeticTag, Outline};
    use pretty_assertions::assert_eq;

    fn rendered(tree: &Tree) -> Vec<String> {
        tree.outline_children(tree.root())
            .iter()
            .map(Outline::to_string)
            .collect()
    }

    #[test]
    fn open_and_close_keep_the_caret() {
        let mut tree = Tree::from_outlines(&[Outline::element(
            BlockTag::P,
            vec![
                Outline::text("he"),
                Outline::element(CosmeticTag::Strong, vec![Outline::text("llo")]),
            ],
        )]);
        let p = tree.children(tree.root())[0];
        let llo = tree.last_text_leaf(p).unwrap();

        let opened = open(&mut tree, p, Position::new(llo, 1)).unwrap();
        assert_eq!(rendered(&tree), vec![r#"pre[data-markdown="p"]("he**llo**")"#]);
        assert_eq!(opened.caret.offset, 5);
        let view = opened.blocks[0];
        assert!(is_markdown_view(&tree, view));

        let closed = close(&mut tree, view, Some(opened.caret)).unwrap();
        assert_eq!(rendered(&tree), vec![r#"p("he", strong("llo"))"#]);
        let caret = closed.caret.unwrap();
        assert_eq!((tree.text(caret.node).unwrap(), caret.offset), ("llo", 1));
        assert!(closed.diagnostics.is_empty());
    }

    #[test]
    fn code_block_view_shows_the_fence() {
        let mut tree = Tree::from_outlines(&[Outline::element_with(
            BlockTag::Pre,
            [("lang", "rust")],
            vec![Outline::text("fn x() {}")],
        )]);
        let pre = tree.children(tree.root())[0];
        let leaf = tree.first_text_leaf(pre).unwrap();
        let opened = open(&mut tree, pre, Position::new(leaf, 0)).unwrap();
        assert_eq!(
            tree.text_content(opened.blocks[0]),
            "```rust\nfn x() {}\n```"
        );
        close(&mut tree, opened.blocks[0], None).unwrap();
        assert_eq!(rendered(&tree), vec![r#"pre[lang="rust"]("fn x() {}")"#]);
    }

    #[test]
    fn emptied_view_keeps_block_kind() {
        let mut tree = Tree::from_outlines(&[Outline::element(
            BlockTag::H2,
            vec![Outline::text("gone")],
        )]);
        let h2 = tree.children(tree.root())[0];
        let leaf = tree.first_text_leaf(h2).unwrap();
        let opened = open(&mut tree, h2, Position::new(leaf, 0)).unwrap();
        tree.set_text(opened.caret.node, "").unwrap();

        let caret = Position::new(opened.caret.node, 0);
        let closed = close(&mut tree, opened.blocks[0], Some(caret)).unwrap();
        assert_eq!(rendered(&tree), vec![r#"h2("")"#]);
        assert!(closed.caret.is_some());
    }

    #[test]
    fn edited_view_may_split_into_blocks() {
        let mut tree =
            Tree::from_outlines(&[Outline::element(BlockTag::P, vec![Outline::text("x")])]);
        let p = tree.children(tree.root())[0];
        let leaf = tree.first_text_leaf(p).unwrap();
        let opened = open(&mut tree, p, Position::new(leaf, 1)).unwrap();
        tree.set_text(opened.caret.node, "| a | b |\n| c |\n\n* d").unwrap();

        let closed = close(&mut tree, opened.blocks[0], None).unwrap();
        assert_eq!(
            rendered(&tree),
            vec![r#"p("| a | b |\n| c |")"#, r#"ul(li("d"))"#]
        );
        assert_eq!(closed.blocks.len(), 2);
        assert_eq!(closed.caret, None);
        assert_eq!(closed.diagnostics.len(), 1);
    }
}
