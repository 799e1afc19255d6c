use thiserror::Error;

use crate::tree::NodeId;

/// Errors raised by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The caret's node is not part of the subtree being encoded.
    #[error("position node {node:?} is not inside the encoded subtree {root:?}")]
    PositionNotFound { node: NodeId, root: NodeId },

    /// No text leaf exists below a node where one is required.
    #[error("no text leaf below node {0:?}")]
    EmptyNode(NodeId),

    /// Table rows disagree on their column count.
    #[error("table row {row} has {found} columns, expected {expected}")]
    TableShape {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A selection spanning more than one text node was given to the toggle engine.
    #[error("selection spans text nodes {anchor:?} and {focus:?}")]
    UnsupportedSelection { anchor: NodeId, focus: NodeId },

    /// Inline formatting was requested inside a code block, whose text is
    /// encoded verbatim.
    #[error("node {0:?} is inside a code block")]
    InlineInCode(NodeId),

    #[error("node {0:?} does not exist")]
    NodeNotFound(NodeId),

    #[error("node {0:?} is not a text leaf")]
    NotText(NodeId),

    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("cannot insert {child:?} below its own descendant {parent:?}")]
    CyclicInsert { parent: NodeId, child: NodeId },

    #[error("offset {offset} is past the end of {node:?} (length {len})")]
    OffsetOutOfRange {
        node: NodeId,
        offset: usize,
        len: usize,
    },

    #[error("cannot turn a {from} block into {to}")]
    UnsupportedBlockChange {
        from: &'static str,
        to: &'static str,
    },

    #[error("unknown action `{0}`")]
    UnknownAction(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
