//! # Position References
//!
//! A [`Position`] names the caret as a text leaf plus a `char` offset into
//! that leaf. It never refers to an offset in any serialized form, so it
//! stays meaningful while the tree is rewritten: every tree mutation that
//! merges text leaves hands back a [`Remap`] that relocates positions
//! pointing into leaves that were folded into a neighbour.

use crate::tree::NodeId;

/// The caret: a text leaf and a `char` offset into it (`0..=len`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Which end of a selection the user is dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// A host selection: where it started (`anchor`), where it is now (`focus`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
    pub direction: Direction,
}

impl Selection {
    /// A collapsed selection at `position`.
    pub fn caret(position: Position) -> Self {
        Self {
            anchor: position,
            focus: position,
            direction: Direction::Forward,
        }
    }

    pub fn new(anchor: Position, focus: Position, direction: Direction) -> Self {
        Self {
            anchor,
            focus,
            direction,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// The caret end of the selection: its end in document order.
    pub fn head(&self) -> Position {
        self.ordered().1
    }

    /// Start and end in document order. Within one leaf the offsets decide;
    /// across leaves only `direction` can.
    pub fn ordered(&self) -> (Position, Position) {
        let (a, b) = (self.anchor, self.focus);
        if a.node == b.node {
            return if a.offset <= b.offset { (a, b) } else { (b, a) };
        }
        match self.direction {
            Direction::Forward => (a, b),
            Direction::Backward => (b, a),
        }
    }
}

/// One text leaf folded into another during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Moved {
    from: NodeId,
    into: NodeId,
    shift: usize,
}

/// Relocation table produced by tree mutations that merge text leaves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct Remap {
    moves: Vec<Moved>,
}

impl Remap {
    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, from: NodeId, into: NodeId, shift: usize) {
        self.moves.push(Moved { from, into, shift });
    }

    /// Appends the moves of a later mutation.
    pub fn then(mut self, later: Remap) -> Self {
        self.moves.extend(later.moves);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Relocates `position` through every recorded merge, in order.
    pub fn apply(&self, position: Position) -> Position {
        self.moves.iter().fold(position, |p, m| {
            if p.node == m.from {
                Position::new(m.into, p.offset + m.shift)
            } else {
                p
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> NodeId {
        NodeId::from_index(n)
    }

    #[test]
    fn head_follows_direction() {
        let a = Position::new(id(1), 2);
        let b = Position::new(id(1), 5);
        let forward = Selection::new(a, b, Direction::Forward);
        let backward = Selection::new(b, a, Direction::Backward);

        assert_eq!(forward.head(), b);
        assert_eq!(backward.head(), b);
        assert_eq!(forward.ordered(), (a, b));
        assert_eq!(backward.ordered(), (a, b));
    }

    #[test]
    fn same_leaf_order_comes_from_offsets() {
        let a = Position::new(id(1), 4);
        let b = Position::new(id(1), 1);
        let mislabelled = Selection::new(a, b, Direction::Forward);

        assert_eq!(mislabelled.ordered(), (b, a));
        assert_eq!(mislabelled.head(), a);
    }

    #[test]
    fn cross_leaf_order_comes_from_direction() {
        let a = Position::new(id(1), 4);
        let b = Position::new(id(2), 1);

        assert_eq!(Selection::new(a, b, Direction::Forward).ordered(), (a, b));
        assert_eq!(Selection::new(b, a, Direction::Backward).ordered(), (a, b));
    }

    #[test]
    fn collapsed_caret() {
        let s = Selection::caret(Position::new(id(3), 0));
        assert!(s.is_collapsed());
    }

    #[test]
    fn remap_moves_only_merged_nodes() {
        let mut remap = Remap::none();
        remap.push(id(2), id(1), 4);

        assert_eq!(remap.apply(Position::new(id(2), 1)), Position::new(id(1), 5));
        assert_eq!(remap.apply(Position::new(id(3), 1)), Position::new(id(3), 1));
    }

    #[test]
    fn remap_chains_in_order() {
        let mut first = Remap::none();
        first.push(id(3), id(2), 2);
        let mut second = Remap::none();
        second.push(id(2), id(1), 10);

        let chained = first.then(second);
        assert_eq!(chained.apply(Position::new(id(3), 1)), Position::new(id(1), 13));
    }
}
