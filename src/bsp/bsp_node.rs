//! src/bsp/bsp_node.rs

use crate::bsp::bsp_line::{side_of_line, BspLine, LineSide};
use crate::utils::BoundingBox;

/// Index of a node in the builder's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A build-time region: an unordered bag of walls plus their bounding box.
#[derive(Debug, Clone, Default)]
pub struct Sector {
    pub lines: Vec<BspLine>,
    pub bounds: BoundingBox,
}

impl Sector {
    pub fn new(lines: Vec<BspLine>) -> Self {
        let mut sector = Sector {
            lines,
            bounds: BoundingBox::new_empty(),
        };
        sector.calc_bounds();
        sector
    }

    /// Convex when every wall lies strictly in front of every other wall.
    pub fn convex(&self) -> bool {
        for (a, line_a) in self.lines.iter().enumerate() {
            for (b, line_b) in self.lines.iter().enumerate() {
                if a != b && side_of_line(line_a, line_b) != LineSide::Front {
                    return false;
                }
            }
        }
        true
    }

    pub fn calc_bounds(&mut self) {
        self.bounds = BoundingBox::new_empty();
        for line in &self.lines {
            self.bounds.grow(line.a);
            self.bounds.grow(line.b);
        }
    }
}

/// Either a convex (or not yet processed) leaf, or a split with two children.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Leaf(Sector),
    Internal {
        split: BspLine,
        front: NodeId,
        back: NodeId,
    },
}

/// A node in the builder's arena. `parent` is a back-reference used for walking
/// towards the root; children are owned through the arena indices in `kind`.
#[derive(Debug, Clone)]
pub struct BspNode {
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl BspNode {
    pub fn create_leaf(parent: Option<NodeId>, sector: Sector) -> Self {
        BspNode {
            parent,
            kind: NodeKind::Leaf(sector),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn sector(&self) -> Option<&Sector> {
        match &self.kind {
            NodeKind::Leaf(sector) => Some(sector),
            NodeKind::Internal { .. } => None,
        }
    }

    pub fn split(&self) -> Option<&BspLine> {
        match &self.kind {
            NodeKind::Internal { split, .. } => Some(split),
            NodeKind::Leaf(_) => None,
        }
    }
}
