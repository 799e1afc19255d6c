//! # Inline Toggle Engine
//!
//! Applies or removes one cosmetic tag at the caret or over a selection
//! inside a single text leaf, keeping the caret on the same logical
//! character.
//!
//! | context | result |
//! |---|---|
//! | caret inside `tag` (self or ancestor, below the block) | that element is unwrapped |
//! | `sup` inside `sub` or the reverse | the element is re-tagged |
//! | non-empty selection | the selected run is wrapped; caret at its end |
//! | caret inside another cosmetic element | that element is wrapped |
//! | caret in or next to a word | the word is wrapped |
//! | anywhere else | an empty element is inserted at the caret |
//!
//! Wrapping flattens any `tag` element already inside the new one, so
//! bolding never nests. Every toggle runs in a [`Tree::transaction`].

mod word;

use log::debug;

use crate::error::{EngineError, Result};
use crate::position::{Position, Remap, Selection};
use crate::tree::{Attributes, BlockTag, CosmeticTag, NodeId, Tree};

pub use word::word_at;

/// Toggles `tag` for `selection` and returns the new caret.
pub fn toggle_inline(tree: &mut Tree, tag: CosmeticTag, selection: Selection) -> Result<Position> {
    let (start, end) = selection.ordered();
    if start.node != end.node {
        return Err(EngineError::UnsupportedSelection {
            anchor: selection.anchor.node,
            focus: selection.focus.node,
        });
    }
    let node = start.node;
    let len = tree.text_len(node)?;
    for p in [start, end] {
        if p.offset > len {
            return Err(EngineError::OffsetOutOfRange {
                node,
                offset: p.offset,
                len,
            });
        }
    }
    if tree.block_of(node).and_then(|b| tree.block_tag(b)) == Some(BlockTag::Pre) {
        return Err(EngineError::InlineInCode(node));
    }
    let caret = selection.head();

    if let Some(found) = closest_cosmetic(tree, node, |t| t == tag) {
        debug!("toggle {tag:?}: removing {found:?}");
        return tree.transaction(|t| Ok(t.unwrap(found)?.apply(caret)));
    }

    if let Some(other) = tag.exclusive_with()
        && let Some(found) = closest_cosmetic(tree, node, |t| t == other)
    {
        debug!("toggle {tag:?}: re-tagging {found:?} from {other:?}");
        return tree.transaction(|t| {
            t.set_tag(found, tag)?;
            Ok(caret)
        });
    }

    tree.transaction(|t| {
        if !selection.is_collapsed() {
            debug!("toggle {tag:?}: wrapping selection {}..{}", start.offset, end.offset);
            let (_, inner, remap) = wrap_range(t, tag, node, start.offset, end.offset)?;
            return Ok(remap.apply(Position::new(inner, end.offset - start.offset)));
        }

        if let Some(enclosing) = closest_cosmetic(t, node, |_| true) {
            debug!("toggle {tag:?}: wrapping enclosing {enclosing:?}");
            let wrapper = create(t, tag);
            t.wrap(&[enclosing], wrapper)?;
            let remap = flatten(t, wrapper, tag)?;
            return Ok(remap.apply(caret));
        }

        let text = t.text(node)?.to_string();
        match word_at(&text, caret.offset) {
            Some((from, to)) => {
                debug!("toggle {tag:?}: wrapping word {from}..{to}");
                let (_, inner, remap) = wrap_range(t, tag, node, from, to)?;
                Ok(remap.apply(Position::new(inner, caret.offset - from)))
            }
            None => {
                debug!("toggle {tag:?}: inserting empty element");
                insert_empty(t, tag, caret)
            }
        }
    })
}

/// Nearest cosmetic ancestor of `node` whose tag satisfies `pred`, stopping
/// at the enclosing block.
fn closest_cosmetic(
    tree: &Tree,
    node: NodeId,
    pred: impl Fn(CosmeticTag) -> bool,
) -> Option<NodeId> {
    tree.ancestors(node)
        .take_while(|&a| tree.block_tag(a).is_none() && a != tree.root())
        .find(|&a| tree.cosmetic_tag(a).is_some_and(&pred))
}

fn create(tree: &mut Tree, tag: CosmeticTag) -> NodeId {
    let mut attributes = Attributes::new();
    if tag == CosmeticTag::A {
        attributes.insert("href".to_string(), String::new());
    }
    tree.create_element_with(tag, attributes)
}

/// Wraps `from..to` (in `char`s) of the leaf `node` in a new `tag` element.
/// Returns the element, the leaf now holding the wrapped run, and the remap
/// from flattening.
fn wrap_range(
    tree: &mut Tree,
    tag: CosmeticTag,
    node: NodeId,
    from: usize,
    to: usize,
) -> Result<(NodeId, NodeId, Remap)> {
    let middle = if from > 0 {
        tree.split_text(node, from)?
    } else {
        node
    };
    if to - from < tree.text_len(middle)? {
        tree.split_text(middle, to - from)?;
    }
    let wrapper = create(tree, tag);
    tree.wrap(&[middle], wrapper)?;
    let remap = flatten(tree, wrapper, tag)?;
    Ok((wrapper, middle, remap))
}

/// Unwraps every `tag` element strictly below `element`.
fn flatten(tree: &mut Tree, element: NodeId, tag: CosmeticTag) -> Result<Remap> {
    let mut nested = Vec::new();
    let mut stack: Vec<NodeId> = tree.children(element).to_vec();
    while let Some(n) = stack.pop() {
        if tree.cosmetic_tag(n) == Some(tag) {
            nested.push(n);
        }
        stack.extend(tree.children(n).iter().copied());
    }
    let mut remap = Remap::none();
    for n in nested {
        remap = remap.then(tree.unwrap(n)?);
    }
    Ok(remap)
}

fn insert_empty(tree: &mut Tree, tag: CosmeticTag, caret: Position) -> Result<Position> {
    let node = caret.node;
    let parent = tree.parent(node).ok_or(EngineError::NodeNotFound(node))?;
    let element = create(tree, tag);
    let leaf = tree.create_text("");
    let _ = tree.append_child(element, leaf)?;

    let reference = if caret.offset == 0 {
        Some(node)
    } else if caret.offset == tree.text_len(node)? {
        tree.next_sibling(node)
    } else {
        Some(tree.split_text(node, caret.offset)?)
    };
    let _ = tree.insert_before(parent, element, reference)?;
    Ok(Position::new(leaf, 0))
}
