//! # Document Tree
//!
//! An arena of nodes addressed by [`NodeId`]. Every node is the root, a
//! text leaf or an element with a [`Tag`] and attributes; elements own
//! their children exclusively.
//!
//! ## Merge invariant
//!
//! No two adjacent siblings are both text leaves. Every public mutation
//! (`append_child`, `insert_before`, `replace_child`, `remove_child`,
//! `unwrap`) re-merges the affected parent before returning and hands back
//! a [`Remap`] so callers holding a [`crate::Position`] inside a merged-away
//! leaf can relocate it.
//!
//! Detached nodes stay in the arena until [`Tree::discard`] frees them, so a
//! subtree removed from one place can be re-inserted elsewhere. Freed slots
//! are handed out again by later allocations.

pub mod outline;
pub mod tags;

use std::collections::BTreeMap;
use std::fmt;

pub use outline::Outline;
pub use tags::{BlockTag, CosmeticTag, StructuralTag, Tag};

use crate::error::{EngineError, Result};
use crate::position::Remap;

/// Element attributes (`href`, `src`, `lang`, ...).
pub type Attributes = BTreeMap<String, String>;

/// Handle to a node in a [`Tree`]. Slots freed by removal are reused under
/// a new generation, so a handle to a freed node never reaches its successor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    pub fn index(self) -> usize {
        self.index
    }

    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self {
            index,
            generation: 0,
        }
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.generation {
            0 => write!(f, "NodeId({})", self.index),
            g => write!(f, "NodeId({}v{g})", self.index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: Tag,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// Undo log of an open [`Tree::transaction`]: the first prior state of
/// every pre-existing slot the transaction touched.
#[derive(Debug, Clone)]
struct Journal {
    len: usize,
    free: Vec<usize>,
    saved: BTreeMap<usize, Slot>,
}

/// The result of [`Tree::merge_adjacent_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    /// The surviving leaf holding the whole run.
    pub node: NodeId,
    /// Combined length of the run in `char`s.
    pub len: usize,
    pub remap: Remap,
}

/// Number of `char`s in `s`.
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the `chars`-th `char` of `s` (clamped to `s.len()`).
pub(crate) fn byte_index(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(b, _)| b)
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Slot>,
    free: Vec<usize>,
    journals: Vec<Journal>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Slot {
                generation: 0,
                data: Some(NodeData {
                    kind: NodeKind::Root,
                    parent: None,
                    children: Vec::new(),
                }),
            }],
            free: Vec::new(),
            journals: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        }
    }

    /// Builds a tree whose root holds `blocks`.
    pub fn from_outlines(blocks: &[Outline]) -> Self {
        let mut tree = Self::new();
        for block in blocks {
            let id = tree.build(block);
            let root = tree.root;
            // Fresh detached node under the root: cannot fail.
            let _ = tree.append_child(root, id);
        }
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop()
            && let Some(slot) = self.slot_mut(index)
        {
            slot.generation += 1;
            slot.data = Some(data);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.nodes.push(Slot {
            generation: 0,
            data: Some(data),
        });
        NodeId {
            index: self.nodes.len() - 1,
            generation: 0,
        }
    }

    /// Mutable access to a slot, saving its state first when an open
    /// transaction has not seen it yet.
    fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        if let Some(journal) = self.journals.last_mut()
            && index < journal.len
            && !journal.saved.contains_key(&index)
            && let Some(slot) = self.nodes.get(index)
        {
            journal.saved.insert(index, slot.clone());
        }
        self.nodes.get_mut(index)
    }

    /// Empties the slot of `id` for reuse.
    fn release(&mut self, id: NodeId) -> Option<NodeData> {
        let slot = self.slot_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let data = slot.data.take()?;
        self.free.push(id.index);
        Some(data)
    }

    fn data(&self, id: NodeId) -> Result<&NodeData> {
        self.nodes
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_ref())
            .ok_or(EngineError::NodeNotFound(id))
    }

    fn data_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.slot_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_mut())
            .ok_or(EngineError::NodeNotFound(id))
    }

    // ---- creation -------------------------------------------------------

    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(content.into()))
    }

    pub fn create_element(&mut self, tag: impl Into<Tag>) -> NodeId {
        self.create_element_with(tag, Attributes::new())
    }

    pub fn create_element_with(&mut self, tag: impl Into<Tag>, attributes: Attributes) -> NodeId {
        self.alloc(NodeKind::Element(Element {
            tag: tag.into(),
            attributes,
        }))
    }

    // ---- queries --------------------------------------------------------

    pub fn contains(&self, id: NodeId) -> bool {
        self.data(id).is_ok()
    }

    pub fn kind(&self, id: NodeId) -> Result<&NodeKind> {
        Ok(&self.data(id)?.kind)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Ok(NodeKind::Text(_)))
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Ok(NodeKind::Element(e)) => Some(e),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<Tag> {
        self.element(id).map(|e| e.tag)
    }

    pub fn block_tag(&self, id: NodeId) -> Option<BlockTag> {
        self.tag(id).and_then(Tag::as_block)
    }

    pub fn cosmetic_tag(&self, id: NodeId) -> Option<CosmeticTag> {
        self.tag(id).and_then(Tag::as_cosmetic)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .and_then(|e| e.attributes.get(name))
            .map(String::as_str)
    }

    pub fn text(&self, id: NodeId) -> Result<&str> {
        match &self.data(id)?.kind {
            NodeKind::Text(s) => Ok(s),
            _ => Err(EngineError::NotText(id)),
        }
    }

    /// Length of a text leaf in `char`s.
    pub fn text_len(&self, id: NodeId) -> Result<usize> {
        self.text(id).map(char_len)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).ok().and_then(|d| d.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.data(id) {
            Ok(d) => &d.children,
            Err(_) => &[],
        }
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        idx.checked_sub(1).map(|i| self.children(parent)[i])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        self.children(parent).get(idx + 1).copied()
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// `id` itself or its nearest ancestor matching `pred`.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&Tree, NodeId) -> bool) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| pred(self, n))
    }

    /// The top-level block (child of the root) containing `id`.
    pub fn block_of(&self, id: NodeId) -> Option<NodeId> {
        self.closest(id, |t, n| t.parent(n) == Some(t.root))
    }

    /// True when `node` is `ancestor` or lies below it.
    pub fn is_inclusive_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Concatenated text of every leaf below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_leaves(id)
            .into_iter()
            .filter_map(|leaf| self.text(leaf).ok())
            .collect()
    }

    /// Text leaves below `id` in document order (`id` itself if it is text).
    pub fn text_leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if self.is_text(n) {
                out.push(n);
            } else {
                stack.extend(self.children(n).iter().rev());
            }
        }
        out
    }

    pub fn first_text_leaf(&self, id: NodeId) -> Result<NodeId> {
        self.data(id)?;
        self.text_leaves(id)
            .first()
            .copied()
            .ok_or(EngineError::EmptyNode(id))
    }

    pub fn last_text_leaf(&self, id: NodeId) -> Result<NodeId> {
        self.data(id)?;
        self.text_leaves(id)
            .last()
            .copied()
            .ok_or(EngineError::EmptyNode(id))
    }

    /// Whether any two adjacent children of `id` (or below) are both text.
    pub fn has_adjacent_text(&self, id: NodeId) -> bool {
        let children = self.children(id);
        children
            .windows(2)
            .any(|w| self.is_text(w[0]) && self.is_text(w[1]))
            || children.iter().any(|&c| self.has_adjacent_text(c))
    }

    // ---- in-place edits ------------------------------------------------

    pub fn set_text(&mut self, id: NodeId, content: impl Into<String>) -> Result<()> {
        match &mut self.data_mut(id)?.kind {
            NodeKind::Text(s) => {
                *s = content.into();
                Ok(())
            }
            _ => Err(EngineError::NotText(id)),
        }
    }

    pub fn set_tag(&mut self, id: NodeId, tag: impl Into<Tag>) -> Result<()> {
        match &mut self.data_mut(id)?.kind {
            NodeKind::Element(e) => {
                e.tag = tag.into();
                Ok(())
            }
            _ => Err(EngineError::NodeNotFound(id)),
        }
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        match &mut self.data_mut(id)?.kind {
            NodeKind::Element(e) => {
                e.attributes.insert(name.into(), value.into());
                Ok(())
            }
            _ => Err(EngineError::NodeNotFound(id)),
        }
    }

    // ---- structural mutation -------------------------------------------

    fn detach(&mut self, child: NodeId) -> Result<()> {
        if let Some(parent) = self.data(child)?.parent {
            self.data_mut(parent)?.children.retain(|&c| c != child);
            self.data_mut(child)?.parent = None;
        }
        Ok(())
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.data(parent)?;
        self.data(child)?;
        if self.is_inclusive_descendant(parent, child) {
            return Err(EngineError::CyclicInsert { parent, child });
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<Remap> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` under `parent` before `reference` (at the end when `None`).
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<Remap> {
        self.check_insertable(parent, child)?;
        if let Some(r) = reference
            && self.parent(r) != Some(parent)
        {
            return Err(EngineError::NotAChild { parent, child: r });
        }
        self.detach(child)?;
        let idx = match reference {
            Some(r) => self.children(parent).iter().position(|&c| c == r),
            None => None,
        };
        let data = self.data_mut(parent)?;
        match idx {
            Some(i) => data.children.insert(i, child),
            None => data.children.push(child),
        }
        self.data_mut(child)?.parent = Some(parent);
        Ok(self.normalize(parent))
    }

    /// Puts `new` where `old` was; `old` is left detached.
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> Result<Remap> {
        if self.parent(old) != Some(parent) {
            return Err(EngineError::NotAChild { parent, child: old });
        }
        if new == old {
            return Ok(Remap::none());
        }
        self.check_insertable(parent, new)?;
        self.detach(new)?;
        let idx = self
            .index_in_parent(old)
            .ok_or(EngineError::NotAChild { parent, child: old })?;
        self.data_mut(parent)?.children[idx] = new;
        self.data_mut(old)?.parent = None;
        self.data_mut(new)?.parent = Some(parent);
        Ok(self.normalize(parent))
    }

    /// Detaches `child` from `parent`, merging the text it separated.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<Remap> {
        if self.parent(child) != Some(parent) {
            return Err(EngineError::NotAChild { parent, child });
        }
        self.detach(child)?;
        Ok(self.normalize(parent))
    }

    /// Replaces `element` by its children, in place.
    pub fn unwrap(&mut self, element: NodeId) -> Result<Remap> {
        let parent = self
            .parent(element)
            .ok_or(EngineError::NodeNotFound(element))?;
        let idx = self
            .index_in_parent(element)
            .ok_or(EngineError::NotAChild { parent, child: element })?;
        let children = std::mem::take(&mut self.data_mut(element)?.children);
        for &c in &children {
            self.data_mut(c)?.parent = Some(parent);
        }
        let siblings = &mut self.data_mut(parent)?.children;
        let rest = siblings.split_off(idx + 1);
        siblings.truncate(idx);
        siblings.extend(children);
        siblings.extend(rest);
        self.data_mut(element)?.parent = None;
        self.discard(element);
        Ok(self.normalize(parent))
    }

    /// Splits a text leaf at `offset` (in `char`s); the tail becomes a new
    /// next sibling. Leaves two adjacent text leaves: callers must wrap or
    /// re-merge before handing the tree back.
    pub(crate) fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId> {
        let content = self.text(id)?.to_string();
        let len = char_len(&content);
        if offset > len {
            return Err(EngineError::OffsetOutOfRange {
                node: id,
                offset,
                len,
            });
        }
        let at = byte_index(&content, offset);
        let tail = self.create_text(&content[at..]);
        self.set_text(id, &content[..at])?;
        let parent = self.parent(id).ok_or(EngineError::NodeNotFound(id))?;
        let idx = self
            .index_in_parent(id)
            .ok_or(EngineError::NotAChild { parent, child: id })?;
        self.data_mut(parent)?.children.insert(idx + 1, tail);
        self.data_mut(tail)?.parent = Some(parent);
        Ok(tail)
    }

    /// Moves `nodes` (consecutive siblings) into `wrapper`, which takes
    /// their place. No merging happens: the wrapper separates its neighbours.
    pub(crate) fn wrap(&mut self, nodes: &[NodeId], wrapper: NodeId) -> Result<()> {
        let Some(&first) = nodes.first() else {
            return Ok(());
        };
        let parent = self.parent(first).ok_or(EngineError::NodeNotFound(first))?;
        let idx = self
            .index_in_parent(first)
            .ok_or(EngineError::NotAChild { parent, child: first })?;
        self.detach(wrapper)?;
        for &n in nodes {
            self.detach(n)?;
            self.data_mut(n)?.parent = Some(wrapper);
            self.data_mut(wrapper)?.children.push(n);
        }
        self.data_mut(parent)?.children.insert(idx, wrapper);
        self.data_mut(wrapper)?.parent = Some(parent);
        Ok(())
    }

    /// Frees `id` and everything below it. Positions into freed leaves
    /// become dangling.
    pub fn discard(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        let _ = self.detach(id);
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(data) = self.release(n) {
                stack.extend(data.children);
            }
        }
    }

    /// Merges every run of adjacent text children of `parent`.
    pub fn normalize(&mut self, parent: NodeId) -> Remap {
        let mut remap = Remap::none();
        let children = self.children(parent).to_vec();
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
        for child in children {
            let absorbed = match kept.last() {
                Some(&prev) if self.is_text(prev) && self.is_text(child) => {
                    let tail = self.text(child).map(str::to_string).unwrap_or_default();
                    if let Ok(NodeData {
                        kind: NodeKind::Text(head),
                        ..
                    }) = self.data_mut(prev)
                    {
                        let shift = char_len(head.as_str());
                        head.push_str(&tail);
                        remap.push(child, prev, shift);
                    }
                    true
                }
                _ => false,
            };
            if absorbed {
                self.release(child);
            } else {
                kept.push(child);
            }
        }
        if let Ok(data) = self.data_mut(parent) {
            data.children = kept;
        }
        remap
    }

    /// Collapses the run of text siblings containing `node` into the run's
    /// first leaf.
    pub fn merge_adjacent_text(&mut self, node: NodeId) -> Result<Merged> {
        self.text(node)?;
        let mut first = node;
        while let Some(prev) = self.previous_sibling(first) {
            if !self.is_text(prev) {
                break;
            }
            first = prev;
        }
        let remap = match self.parent(node) {
            Some(parent) => self.normalize(parent),
            None => Remap::none(),
        };
        Ok(Merged {
            node: first,
            len: self.text_len(first)?,
            remap,
        })
    }

    /// Runs `op`; if it fails the tree is restored to its prior state.
    /// Only the slots `op` touches are saved, so the cost follows the edit
    /// rather than the document.
    pub fn transaction<T>(&mut self, op: impl FnOnce(&mut Tree) -> Result<T>) -> Result<T> {
        self.journals.push(Journal {
            len: self.nodes.len(),
            free: self.free.clone(),
            saved: BTreeMap::new(),
        });
        let result = op(self);
        let Some(journal) = self.journals.pop() else {
            return result;
        };
        if result.is_err() {
            for (index, slot) in journal.saved {
                if let Some(current) = self.nodes.get_mut(index) {
                    *current = slot;
                }
            }
            self.nodes.truncate(journal.len);
            self.free = journal.free;
        } else if let Some(outer) = self.journals.last_mut() {
            for (index, slot) in journal.saved {
                if index < outer.len {
                    outer.saved.entry(index).or_insert(slot);
                }
            }
        }
        result
    }

    // ---- outlines --------------------------------------------------------

    /// Owned structural snapshot of `id`; `None` for the root (use
    /// [`Tree::outline_children`]).
    pub fn outline(&self, id: NodeId) -> Option<Outline> {
        match self.kind(id).ok()? {
            NodeKind::Text(s) => Some(Outline::Text(s.clone())),
            NodeKind::Element(e) => Some(Outline::Element {
                tag: e.tag,
                attributes: e.attributes.clone(),
                children: self.outline_children(id),
            }),
            NodeKind::Root => None,
        }
    }

    pub fn outline_children(&self, id: NodeId) -> Vec<Outline> {
        self.children(id)
            .iter()
            .filter_map(|&c| self.outline(c))
            .collect()
    }

    /// Copies the subtree at `node` of `source` into this tree, detached.
    /// `mapping` receives every source id with its copy.
    pub fn graft(
        &mut self,
        source: &Tree,
        node: NodeId,
        mapping: &mut BTreeMap<NodeId, NodeId>,
    ) -> Result<NodeId> {
        let copy = match source.kind(node)? {
            NodeKind::Text(s) => self.create_text(s.clone()),
            NodeKind::Element(e) => self.create_element_with(e.tag, e.attributes.clone()),
            NodeKind::Root => return Err(EngineError::NodeNotFound(node)),
        };
        mapping.insert(node, copy);
        for &child in source.children(node) {
            let c = self.graft(source, child, mapping)?;
            let _ = self.append_child(copy, c)?;
        }
        Ok(copy)
    }

    /// Materializes `outline` as a detached subtree.
    pub fn build(&mut self, outline: &Outline) -> NodeId {
        match outline {
            Outline::Text(s) => self.create_text(s.clone()),
            Outline::Element {
                tag,
                attributes,
                children,
            } => {
                let id = self.create_element_with(*tag, attributes.clone());
                for child in children {
                    let c = self.build(child);
                    // Both nodes are fresh and detached.
                    let _ = self.append_child(id, c);
                }
                id
            }
        }
    }
}
