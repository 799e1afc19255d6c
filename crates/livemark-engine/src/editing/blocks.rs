//! Block-level rewrites: re-tagging, inserting images, selecting.
//!
//! Each operation works on one top-level block and hands back the block(s)
//! that now stand in its place together with the caret to re-apply.

use log::debug;

use crate::error::{EngineError, Result};
use crate::position::{Direction, Position, Selection};
use crate::tree::{Attributes, BlockTag, NodeId, StructuralTag, Tree, char_len};

/// Outcome of a block rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Blocks now standing where the old block was, in order.
    pub blocks: Vec<NodeId>,
    pub caret: Position,
}

/// Re-tags `block` as `target`, keeping the caret on the same character.
///
/// - `ul` and `ol` swap in place.
/// - A plain block becomes a one-item list; a list becomes one block per item.
/// - `pre` flattens inline markup (list items become lines); leaving `pre`
///   turns each line into an item when the target is a list.
/// - Tables and images can neither be changed nor be targets.
pub fn change_block(
    tree: &mut Tree,
    block: NodeId,
    target: BlockTag,
    caret: Position,
) -> Result<Replacement> {
    let current = tree
        .block_tag(block)
        .ok_or(EngineError::NodeNotFound(block))?;
    if matches!(current, BlockTag::Table | BlockTag::Img)
        || matches!(target, BlockTag::Table | BlockTag::Img)
    {
        return Err(EngineError::UnsupportedBlockChange {
            from: current.name(),
            to: target.name(),
        });
    }
    if current == target {
        return Ok(Replacement {
            blocks: vec![block],
            caret,
        });
    }
    debug!("change block {block:?}: {} -> {}", current.name(), target.name());

    tree.transaction(|t| {
        if current.is_list() && target.is_list() {
            t.set_tag(block, target)?;
            return Ok(Replacement {
                blocks: vec![block],
                caret,
            });
        }
        if target == BlockTag::Pre {
            return into_pre(t, block, caret);
        }
        if current == BlockTag::Pre {
            return out_of_pre(t, block, target, caret);
        }
        if target.is_list() {
            let list = t.create_element(target);
            let li = t.create_element(StructuralTag::Li);
            let _ = t.append_child(list, li)?;
            move_children(t, block, li)?;
            replace_block(t, block, &[list])?;
            return Ok(Replacement {
                blocks: vec![list],
                caret,
            });
        }
        if current.is_list() {
            let mut blocks = vec![];
            for li in t.children(block).to_vec() {
                let b = t.create_element(target);
                move_children(t, li, b)?;
                blocks.push(b);
            }
            replace_block(t, block, &blocks)?;
            return Ok(Replacement { blocks, caret });
        }
        t.set_tag(block, target)?;
        Ok(Replacement {
            blocks: vec![block],
            caret,
        })
    })
}

/// Puts `new` where `old` sits under the root and frees `old`.
pub(crate) fn replace_block(tree: &mut Tree, old: NodeId, new: &[NodeId]) -> Result<()> {
    let root = tree.root();
    for &b in new {
        let _ = tree.insert_before(root, b, Some(old))?;
    }
    let _ = tree.remove_child(root, old)?;
    tree.discard(old);
    Ok(())
}

/// Moves every child of `from` to the end of `to`. An element left without
/// text gets an empty leaf so the caret can land in it.
fn move_children(tree: &mut Tree, from: NodeId, to: NodeId) -> Result<()> {
    for child in tree.children(from).to_vec() {
        let _ = tree.append_child(to, child)?;
    }
    if tree.first_text_leaf(to).is_err() {
        let leaf = tree.create_text("");
        let _ = tree.append_child(to, leaf)?;
    }
    Ok(())
}

/// Plain text of `block` (list items on their own lines) and the caret's
/// offset in it, when the caret is inside.
fn flat_text(tree: &Tree, block: NodeId, caret: Position) -> (String, Option<usize>) {
    let rows = match tree.block_tag(block) {
        Some(tag) if tag.is_list() => tree.children(block).to_vec(),
        _ => vec![block],
    };
    let mut text = String::new();
    let mut offset = None;
    for (i, row) in rows.into_iter().enumerate() {
        if i > 0 {
            text.push('\n');
        }
        for leaf in tree.text_leaves(row) {
            if leaf == caret.node {
                offset = Some(char_len(&text) + caret.offset);
            }
            text.push_str(tree.text(leaf).unwrap_or_default());
        }
    }
    (text, offset)
}

fn into_pre(tree: &mut Tree, block: NodeId, caret: Position) -> Result<Replacement> {
    let (text, offset) = flat_text(tree, block, caret);
    let pre = tree.create_element(BlockTag::Pre);
    let leaf = tree.create_text(text);
    let _ = tree.append_child(pre, leaf)?;
    replace_block(tree, block, &[pre])?;
    Ok(Replacement {
        blocks: vec![pre],
        caret: offset.map_or(caret, |o| Position::new(leaf, o)),
    })
}

fn out_of_pre(
    tree: &mut Tree,
    pre: NodeId,
    target: BlockTag,
    caret: Position,
) -> Result<Replacement> {
    let (text, offset) = flat_text(tree, pre, caret);
    let mut blocks = vec![];
    let mut moved = None;

    if target.is_list() {
        let list = tree.create_element(target);
        let mut line_start = 0;
        for line in text.split('\n') {
            let li = tree.create_element(StructuralTag::Li);
            let leaf = tree.create_text(line);
            let _ = tree.append_child(li, leaf)?;
            let _ = tree.append_child(list, li)?;
            let line_len = char_len(line);
            if let Some(o) = offset
                && moved.is_none()
                && (line_start..=line_start + line_len).contains(&o)
            {
                moved = Some(Position::new(leaf, o - line_start));
            }
            line_start += line_len + 1;
        }
        blocks.push(list);
    } else {
        let b = tree.create_element(target);
        let leaf = tree.create_text(text);
        let _ = tree.append_child(b, leaf)?;
        moved = offset.map(|o| Position::new(leaf, o));
        blocks.push(b);
    }
    replace_block(tree, pre, &blocks)?;
    Ok(Replacement {
        blocks,
        caret: moved.unwrap_or(caret),
    })
}

/// Inserts an image block next to the block holding `caret`: before it
/// when the caret is at offset 0, after it otherwise. The caret moves to
/// the start of the caption.
pub fn insert_image(
    tree: &mut Tree,
    caret: Position,
    src: &str,
    caption: &str,
) -> Result<Replacement> {
    let block = tree
        .block_of(caret.node)
        .ok_or(EngineError::NodeNotFound(caret.node))?;
    tree.transaction(|t| {
        let mut attributes = Attributes::new();
        attributes.insert("src".to_string(), src.to_string());
        let img = t.create_element_with(BlockTag::Img, attributes);
        let leaf = t.create_text(caption);
        let _ = t.append_child(img, leaf)?;
        let reference = if caret.offset == 0 {
            Some(block)
        } else {
            t.next_sibling(block)
        };
        let root = t.root();
        let _ = t.insert_before(root, img, reference)?;
        Ok(Replacement {
            blocks: vec![img],
            caret: Position::new(leaf, 0),
        })
    })
}

/// Selection spanning all the text of `block`.
pub fn block_selection(tree: &Tree, block: NodeId) -> Result<Selection> {
    let first = tree.first_text_leaf(block)?;
    let last = tree.last_text_leaf(block)?;
    Ok(Selection::new(
        Position::new(first, 0),
        Position::new(last, tree.text_len(last)?),
        Direction::Forward,
    ))
}
