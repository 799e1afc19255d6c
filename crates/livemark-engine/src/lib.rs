//! Editing core for a live Markdown surface.
//!
//! A document is a [`Tree`] of blocks. Any block can be swapped for its
//! flat text form ([`encode`]) and back ([`decode`]) with the caret kept on
//! the same character, and cosmetic markup can be toggled in place
//! ([`toggle_inline`]). [`Editor`] ties these together behind a [`Host`].

pub mod codec;
pub mod editing;
pub mod error;
pub mod position;
pub mod toggle;
pub mod tree;

pub use codec::{Decoded, Encoded, decode, encode, to_markdown};
pub use editing::{Action, Editor, EditorOptions, Formats, Host, Keymap};
pub use error::{EngineError, Result};
pub use position::{Direction, Position, Remap, Selection};
pub use toggle::toggle_inline;
pub use tree::{BlockTag, CosmeticTag, NodeId, NodeKind, Outline, StructuralTag, Tag, Tree};
