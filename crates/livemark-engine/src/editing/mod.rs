//! # Editor session
//!
//! [`Editor`] owns the live document and talks to the surface it is shown
//! in through [`Host`]. Every user action reads the host selection, runs
//! one engine operation and hands the new caret back to the host.
//!
//! While the caret sits in a markdown view only [`Action::ToggleMarkdown`]
//! and [`Action::SelectBlock`] run; everything else is ignored.

pub mod actions;
pub mod blocks;
pub mod keymap;
pub mod view;

use log::{debug, warn};

pub use actions::Action;
pub use blocks::Replacement;
pub use keymap::Keymap;

use crate::codec::{decode, to_markdown};
use crate::error::{EngineError, Result};
use crate::position::{Position, Selection};
use crate::toggle::toggle_inline;
use crate::tree::{BlockTag, CosmeticTag, NodeId, Tree};

/// The rendering surface the editor is attached to.
pub trait Host {
    /// Current selection, if the surface has focus.
    fn selection(&self) -> Option<Selection>;

    fn set_selection(&mut self, selection: Selection);

    /// `old` was removed from the document and `new_blocks` now stand in
    /// its place.
    fn block_replaced(&mut self, old: NodeId, new_blocks: &[NodeId]);

    fn block_inserted(&mut self, _block: NodeId) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    /// `src` of a freshly inserted image.
    pub image_src: String,
    /// Caption of a freshly inserted image.
    pub image_caption: String,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            image_src: "https://placehold.co/600x400/EEE/31343C".to_string(),
            image_caption: "placeholder text".to_string(),
        }
    }
}

/// Edit-bar state at a position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formats {
    pub block: Option<BlockTag>,
    /// Enclosing cosmetic tags, nearest first.
    pub cosmetics: Vec<CosmeticTag>,
    pub href: Option<String>,
    pub markdown_view: bool,
}

impl Formats {
    /// Whether a button for `action` should be highlighted.
    pub fn is_active(&self, action: Action) -> bool {
        match action {
            Action::ChangeBlock(tag) => !self.markdown_view && self.block == Some(tag),
            Action::ToggleInline(tag) => self.cosmetics.contains(&tag),
            Action::ToggleMarkdown => self.markdown_view,
            Action::SelectBlock | Action::InsertImage => false,
        }
    }

    /// Whether `action` would run here.
    pub fn is_enabled(&self, action: Action) -> bool {
        if self.markdown_view {
            return action.allowed_in_markdown_view();
        }
        !matches!(action, Action::ToggleInline(_)) || self.block != Some(BlockTag::Pre)
    }
}

pub struct Editor<H: Host> {
    tree: Tree,
    host: H,
    options: EditorOptions,
}

impl<H: Host> Editor<H> {
    pub fn new(tree: Tree, host: H, options: EditorOptions) -> Self {
        Self {
            tree,
            host,
            options,
        }
    }

    /// Decodes `text` into a fresh document and puts the host caret at
    /// `caret` (a `char` offset into `text`). Decoder fallbacks are logged.
    pub fn from_markdown(
        text: &str,
        caret: usize,
        mut host: H,
        options: EditorOptions,
    ) -> Result<Self> {
        let decoded = decode(text, caret);
        for d in &decoded.diagnostics {
            warn!("while loading document: {d}");
        }
        let mut tree = decoded.tree;
        let root = tree.root();
        for child in tree.children(root).to_vec() {
            if tree.is_text(child) {
                let p = tree.create_element(BlockTag::P);
                let _ = tree.replace_child(root, p, child)?;
                let _ = tree.append_child(p, child)?;
            }
        }
        host.set_selection(Selection::caret(decoded.position));
        Ok(Self::new(tree, host, options))
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// For edits the host makes itself (typing).
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    pub fn to_markdown(&self) -> String {
        to_markdown(&self.tree)
    }

    /// Runs the action bound to `key`, if any. Returns whether one was bound.
    pub fn handle_key(&mut self, keymap: &Keymap, key: &str) -> Result<bool> {
        match keymap.lookup(key) {
            Some(action) => {
                self.dispatch(action)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        let Some(selection) = self.host.selection() else {
            debug!("{action}: no selection");
            return Ok(());
        };
        let head = selection.head();
        let block = self
            .tree
            .block_of(head.node)
            .ok_or(EngineError::NodeNotFound(head.node))?;
        let in_view = view::is_markdown_view(&self.tree, block);
        if in_view && !action.allowed_in_markdown_view() {
            debug!("{action}: ignored inside markdown view");
            return Ok(());
        }

        match action {
            Action::ChangeBlock(tag) => {
                let r = blocks::change_block(&mut self.tree, block, tag, head)?;
                self.commit(block, r);
            }
            Action::ToggleInline(_) if self.tree.block_tag(block) == Some(BlockTag::Pre) => {
                debug!("{action}: ignored inside a code block");
            }
            Action::ToggleInline(tag) => {
                let caret = toggle_inline(&mut self.tree, tag, selection)?;
                self.host.set_selection(Selection::caret(caret));
            }
            Action::ToggleMarkdown if in_view => {
                let closed = view::close(&mut self.tree, block, Some(head))?;
                self.host.block_replaced(block, &closed.blocks);
                if let Some(caret) = closed.caret {
                    self.host.set_selection(Selection::caret(caret));
                }
            }
            Action::ToggleMarkdown => {
                let r = view::open(&mut self.tree, block, head)?;
                self.commit(block, r);
            }
            Action::SelectBlock => {
                let selection = blocks::block_selection(&self.tree, block)?;
                self.host.set_selection(selection);
            }
            Action::InsertImage => {
                let r = blocks::insert_image(
                    &mut self.tree,
                    head,
                    &self.options.image_src,
                    &self.options.image_caption,
                )?;
                for &b in &r.blocks {
                    self.host.block_inserted(b);
                }
                self.host.set_selection(Selection::caret(r.caret));
            }
        }
        Ok(())
    }

    pub fn change_block(&mut self, tag: BlockTag) -> Result<()> {
        self.dispatch(Action::ChangeBlock(tag))
    }

    pub fn toggle_inline(&mut self, tag: CosmeticTag) -> Result<()> {
        self.dispatch(Action::ToggleInline(tag))
    }

    pub fn toggle_markdown(&mut self) -> Result<()> {
        self.dispatch(Action::ToggleMarkdown)
    }

    pub fn select_block(&mut self) -> Result<()> {
        self.dispatch(Action::SelectBlock)
    }

    pub fn insert_image(&mut self) -> Result<()> {
        self.dispatch(Action::InsertImage)
    }

    /// Turns every markdown view the caret is no longer in back into
    /// structured blocks. Hosts call this when the caret moves.
    pub fn caret_moved(&mut self) -> Result<()> {
        let current = self
            .host
            .selection()
            .and_then(|s| self.tree.block_of(s.head().node));
        let root = self.tree.root();
        let views: Vec<NodeId> = self
            .tree
            .children(root)
            .iter()
            .copied()
            .filter(|&b| Some(b) != current && view::is_markdown_view(&self.tree, b))
            .collect();
        for v in views {
            let closed = view::close(&mut self.tree, v, None)?;
            self.host.block_replaced(v, &closed.blocks);
        }
        Ok(())
    }

    pub fn formats_at(&self, position: Position) -> Formats {
        let Some(block) = self.tree.block_of(position.node) else {
            return Formats::default();
        };
        let cosmetics = std::iter::once(position.node)
            .chain(self.tree.ancestors(position.node))
            .take_while(|&n| n != block)
            .filter_map(|n| self.tree.cosmetic_tag(n))
            .collect();
        let href = self
            .link_at(position)
            .and_then(|a| self.tree.attribute(a, "href"))
            .map(str::to_string);
        Formats {
            block: self.tree.block_tag(block),
            cosmetics,
            href,
            markdown_view: view::is_markdown_view(&self.tree, block),
        }
    }

    /// Sets the `href` of the link around `position`. Returns `false` when
    /// there is no link there.
    pub fn set_link_href(&mut self, position: Position, href: &str) -> Result<bool> {
        match self.link_at(position) {
            Some(a) => {
                self.tree.set_attribute(a, "href", href)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn link_at(&self, position: Position) -> Option<NodeId> {
        self.tree.closest(position.node, |t, n| {
            t.cosmetic_tag(n) == Some(CosmeticTag::A)
        })
    }

    fn commit(&mut self, old: NodeId, r: Replacement) {
        if r.blocks != [old] {
            self.host.block_replaced(old, &r.blocks);
        }
        self.host.set_selection(Selection::caret(r.caret));
    }
}
