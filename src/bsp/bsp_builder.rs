// src/bsp/bsp_builder.rs

use log::{debug, error, info};
use rayon::prelude::*;

use crate::bsp::bsp_line::{self, side_of_line, side_of_point, BspLine, LineSide};
use crate::bsp::bsp_node::{BspNode, NodeId, NodeKind, Sector};
use crate::config::Config;
use crate::error::BuildError;
use crate::utils::{BoundingBox, Vec2};

/// Weights of the split-candidate score. Higher scores win.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitScoreWeights {
    pub balance_weight: f32,
    pub split_weight: f32,
    pub area_ratio_weight: f32,
    pub orthogonal_bonus: f32,
}

impl Default for SplitScoreWeights {
    fn default() -> Self {
        SplitScoreWeights {
            balance_weight: 2.0,
            split_weight: 1.0,
            area_ratio_weight: 1.0,
            orthogonal_bonus: 100.0,
        }
    }
}

impl SplitScoreWeights {
    pub fn from_config(config: &mut Config) -> Self {
        let defaults = SplitScoreWeights::default();
        SplitScoreWeights {
            balance_weight: config.get_f32("bsp.splitscore.balance_weight", defaults.balance_weight),
            split_weight: config.get_f32("bsp.splitscore.split_weight", defaults.split_weight),
            area_ratio_weight: config
                .get_f32("bsp.splitscore.area_ratio_weight", defaults.area_ratio_weight),
            orthogonal_bonus: config
                .get_f32("bsp.splitscore.orthogonal_bonus", defaults.orthogonal_bonus),
        }
    }
}

/// What one split candidate would do to its sector.
#[derive(Debug, Clone, Default)]
pub struct SplitScoreData {
    /// Lines in front, including the candidate and the front pieces of split lines.
    pub front: usize,
    /// Lines behind, including the back pieces of split lines.
    pub back: usize,
    pub splits: usize,
    pub front_bound: BoundingBox,
    pub back_bound: BoundingBox,
    pub ortho: bool,
}

impl SplitScoreData {
    fn add_front(&mut self, line: &BspLine) {
        self.front += 1;
        self.front_bound.grow(line.a);
        self.front_bound.grow(line.b);
    }

    fn add_back(&mut self, line: &BspLine) {
        self.back += 1;
        self.back_bound.grow(line.a);
        self.back_bound.grow(line.b);
    }
}

/// Incrementally partitions a bag of walls into a tree of convex leaves.
///
/// Drive it with [`split`](Self::split) one step at a time, or [`build`](Self::build) to
/// run to completion. Nodes live in an arena; the root is always `NodeId(0)`.
#[derive(Debug, Default)]
pub struct BspTreeBuilder {
    nodes: Vec<BspNode>,
    /// Non-convex leaves still to be split.
    process_queue: Vec<NodeId>,
    pub split_score_weights: SplitScoreWeights,
}

impl BspTreeBuilder {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new(split_score_weights: SplitScoreWeights) -> Self {
        BspTreeBuilder {
            nodes: Vec::new(),
            process_queue: Vec::new(),
            split_score_weights,
        }
    }

    /// Seeds the root leaf with `lines`, queueing it unless it is already convex.
    pub fn init(&mut self, lines: &[BspLine]) -> Result<(), BuildError> {
        if lines.is_empty() {
            return Err(BuildError::EmptyInput);
        }

        self.nodes.clear();
        self.process_queue.clear();

        let sector = Sector::new(lines.to_vec());
        let convex = sector.convex();
        self.nodes.push(BspNode::create_leaf(None, sector));

        if !convex {
            self.process_queue.push(Self::ROOT);
        }

        debug!("bsp init: {} lines, root convex: {}", lines.len(), convex);
        Ok(())
    }

    /// Splits one queued leaf. Does nothing once the queue is empty.
    pub fn split(&mut self) -> Result<(), BuildError> {
        let Some(node_id) = self.process_queue.pop() else {
            return Ok(());
        };

        let sector = match &mut self.nodes[node_id.0].kind {
            NodeKind::Leaf(sector) => std::mem::take(sector),
            NodeKind::Internal { .. } => return Ok(()),
        };

        let Some(best_split) = self.choose_split(&sector) else {
            error!(
                "Bsp tree build failed, no split found for a sector of {} lines",
                sector.lines.len()
            );
            let lines = sector.lines.len();
            // Leave the leaf intact so the failed state can still be inspected.
            self.nodes[node_id.0].kind = NodeKind::Leaf(sector);
            self.process_queue.push(node_id);
            return Err(BuildError::NoSplitFound { lines });
        };

        let split = sector.lines[best_split];
        let mut front_lines = Vec::with_capacity(sector.lines.len());
        let mut back_lines = Vec::with_capacity(sector.lines.len());

        for (index, line) in sector.lines.iter().enumerate() {
            if index == best_split {
                front_lines.push(*line);
                continue;
            }

            match side_of_line(&split, line) {
                LineSide::Front => front_lines.push(*line),
                LineSide::Back => back_lines.push(*line),
                LineSide::On => {
                    if let Some((front, back)) = bsp_line::split(&split, line) {
                        front_lines.push(front);
                        back_lines.push(back);
                    }
                }
            }
        }

        let front_sector = Sector::new(front_lines);
        let back_sector = Sector::new(back_lines);
        let front_convex = front_sector.convex();
        let back_convex = back_sector.convex();

        let front_id = NodeId(self.nodes.len());
        self.nodes.push(BspNode::create_leaf(Some(node_id), front_sector));
        let back_id = NodeId(self.nodes.len());
        self.nodes.push(BspNode::create_leaf(Some(node_id), back_sector));

        self.nodes[node_id.0].kind = NodeKind::Internal {
            split,
            front: front_id,
            back: back_id,
        };

        // Stack discipline: the front child is processed next.
        if !back_convex {
            self.process_queue.push(back_id);
        }
        if !front_convex {
            self.process_queue.push(front_id);
        }

        debug!(
            "bsp split node {} -> front {} (convex {}), back {} (convex {}), {} queued",
            node_id.0,
            front_id.0,
            front_convex,
            back_id.0,
            back_convex,
            self.process_queue.len()
        );
        Ok(())
    }

    /// Splits until every leaf is convex.
    pub fn build(&mut self) -> Result<(), BuildError> {
        while !self.complete() {
            self.split()?;
        }
        info!(
            "bsp build complete: {} nodes, {} leaves, depth {}",
            self.nodes.len(),
            self.leaves().len(),
            self.depth()
        );
        Ok(())
    }

    pub fn complete(&self) -> bool {
        self.process_queue.is_empty()
    }

    pub fn queued(&self) -> usize {
        self.process_queue.len()
    }

    pub fn calc_split_score(&self, data: &SplitScoreData) -> f32 {
        let weights = &self.split_score_weights;
        let mut score = 0.0;

        let balance = data.front.abs_diff(data.back);
        score -= balance as f32 * weights.balance_weight;

        score -= data.splits as f32 * weights.split_weight;

        let front_area = data.front_bound.area();
        let back_area = data.back_bound.area();
        let area_ratio = if front_area == back_area {
            1.0
        } else {
            front_area.min(back_area) / front_area.max(back_area)
        };
        score += area_ratio * weights.area_ratio_weight;

        if data.ortho {
            score += weights.orthogonal_bonus;
        }

        score
    }

    /// Index of the highest scoring line that leaves something behind it.
    fn choose_split(&self, sector: &Sector) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;

        for (candidate_index, candidate) in sector.lines.iter().enumerate() {
            let data = Self::score_data(sector, candidate_index, candidate);
            if data.back == 0 {
                continue;
            }

            let score = self.calc_split_score(&data);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((candidate_index, score));
            }
        }

        best.map(|(index, _)| index)
    }

    fn score_data(sector: &Sector, candidate_index: usize, candidate: &BspLine) -> SplitScoreData {
        let mut data = SplitScoreData {
            ortho: candidate.is_axis_aligned(),
            ..SplitScoreData::default()
        };

        for (test_index, test) in sector.lines.iter().enumerate() {
            if test_index == candidate_index {
                data.add_front(test);
                continue;
            }

            match side_of_line(candidate, test) {
                LineSide::Front => data.add_front(test),
                LineSide::Back => data.add_back(test),
                LineSide::On => {
                    data.splits += 1;
                    match bsp_line::split(candidate, test) {
                        Some((front, back)) => {
                            data.add_front(&front);
                            data.add_back(&back);
                        }
                        None => {
                            data.add_front(test);
                            data.add_back(test);
                        }
                    }
                }
            }
        }

        data
    }

    pub fn node(&self, id: NodeId) -> &BspNode {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> Option<&BspNode> {
        self.nodes.first()
    }

    /// Every leaf, in arena order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_leaf())
            .map(|(index, _)| NodeId(index))
            .collect()
    }

    /// Checks every leaf's convexity in parallel.
    pub fn all_leaves_convex(&self) -> bool {
        self.nodes
            .par_iter()
            .filter_map(|node| node.sector())
            .all(|sector| sector.convex())
    }

    /// Longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        self.leaves()
            .into_iter()
            .map(|leaf| self.ancestors(leaf).count())
            .max()
            .unwrap_or(0)
    }

    /// Walks from `id`'s parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes.get(id.0).and_then(|n| n.parent), move |p| {
            self.nodes[p.0].parent
        })
    }

    /// Leaf containing `p`. Points on or in front of a split go to its front, with no
    /// epsilon, the same rule the compiled [`Node::side`](crate::compiled::Node::side) uses.
    pub fn leaf_at(&self, p: Vec2) -> Option<NodeId> {
        let mut id = Self::ROOT;
        loop {
            match &self.nodes.get(id.0)?.kind {
                NodeKind::Leaf(_) => return Some(id),
                NodeKind::Internal { split, front, back } => {
                    id = if split.n.dot(p) >= split.n.dot(split.a) {
                        *front
                    } else {
                        *back
                    };
                }
            }
        }
    }

    /// Clips `line` to the region of `id` by cutting it with each ancestor's split and
    /// keeping the piece on `id`'s side. Returns `None` once nothing is left.
    pub fn clip_to_ancestors(&self, id: NodeId, mut line: BspLine) -> Option<BspLine> {
        let mut child = id;

        while let Some(parent) = self.nodes[child.0].parent {
            if line.length() <= 0.0 {
                return None;
            }

            if let NodeKind::Internal { split, front, .. } = &self.nodes[parent.0].kind {
                let in_front = *front == child;
                match bsp_line::split(split, &line) {
                    Some((front_piece, back_piece)) => {
                        line = if in_front { front_piece } else { back_piece };
                    }
                    None => {
                        // Entirely on one side; drop it if that is the wrong side.
                        let side = side_of_line(split, &line);
                        let wrong_side = match side {
                            LineSide::Front => !in_front,
                            LineSide::Back => in_front,
                            LineSide::On => false,
                        };
                        if wrong_side && !Self::touches(split, &line) {
                            return None;
                        }
                    }
                }
            }

            child = parent;
        }

        (line.length() > 0.0).then_some(line)
    }

    /// The split of internal node `id`, extended `extent` units past its ends and clipped
    /// to the node's region.
    pub fn split_line_extent(&self, id: NodeId, extent: f32) -> Option<BspLine> {
        let split = self.nodes.get(id.0)?.split()?;
        self.clip_to_ancestors(id, split.extended(extent))
    }

    fn touches(split: &BspLine, line: &BspLine) -> bool {
        side_of_point(split, line.a) == LineSide::On && side_of_point(split, line.b) == LineSide::On
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::bsp_procedural::{random_room, RoomConfig};
    use crate::bsp::EPSILON;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Closed loop through `points`, wound clockwise so right-hand normals face inwards.
    fn room(points: &[(f32, f32)]) -> Vec<BspLine> {
        let p: Vec<Vec2> = points.iter().map(|&(x, y)| Vec2::new(x, y)).collect();
        (0..p.len())
            .map(|i| BspLine::new(p[i], p[(i + 1) % p.len()]))
            .collect()
    }

    fn l_shape() -> Vec<BspLine> {
        room(&[(0.0, 0.0), (0.0, 2.0), (1.0, 2.0), (1.0, 1.0), (2.0, 1.0), (2.0, 0.0)])
    }

    fn assert_leaves_convex(builder: &BspTreeBuilder) {
        for leaf in builder.leaves() {
            let sector = builder.node(leaf).sector().unwrap();
            for (a, line_a) in sector.lines.iter().enumerate() {
                for (b, line_b) in sector.lines.iter().enumerate() {
                    if a != b {
                        assert_eq!(side_of_line(line_a, line_b), LineSide::Front);
                    }
                }
            }
        }
    }

    #[test]
    fn test_square_needs_no_split() {
        let mut builder = BspTreeBuilder::default();
        builder
            .init(&room(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]))
            .unwrap();
        assert!(builder.complete());
        assert_eq!(builder.queued(), 0);
        assert!(builder.root().unwrap().is_leaf());
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let mut builder = BspTreeBuilder::default();
        assert_eq!(builder.init(&[]), Err(BuildError::EmptyInput));
    }

    #[test]
    fn test_l_shape_single_split() {
        let mut builder = BspTreeBuilder::default();
        builder.init(&l_shape()).unwrap();
        assert!(!builder.complete());

        builder.split().unwrap();
        assert!(builder.complete());
        assert_eq!(builder.leaves().len(), 2);
        assert_leaves_convex(&builder);

        let upper_arm = builder.leaf_at(Vec2::new(0.5, 1.5)).unwrap();
        let lower_arm = builder.leaf_at(Vec2::new(1.5, 0.5)).unwrap();
        assert_ne!(upper_arm, lower_arm);

        let upper = builder.node(upper_arm).sector().unwrap();
        let lower = builder.node(lower_arm).sector().unwrap();
        assert!(upper.bounds.contains(Vec2::new(0.5, 1.5)));
        assert!(lower.bounds.contains(Vec2::new(1.5, 0.5)));
        assert!(!lower.bounds.contains(Vec2::new(0.5, 1.5)));
    }

    #[test]
    fn test_split_is_noop_when_complete() {
        let mut builder = BspTreeBuilder::default();
        builder.init(&l_shape()).unwrap();
        builder.build().unwrap();
        let count = builder.node_count();
        builder.split().unwrap();
        assert_eq!(builder.node_count(), count);
    }

    #[test]
    fn test_parent_links_and_depth() {
        let mut builder = BspTreeBuilder::default();
        builder.init(&l_shape()).unwrap();
        builder.build().unwrap();
        for leaf in builder.leaves() {
            assert_eq!(builder.ancestors(leaf).collect::<Vec<_>>(), vec![BspTreeBuilder::ROOT]);
        }
        assert_eq!(builder.depth(), 1);
    }

    #[test]
    fn test_score_prefers_balance_and_ortho() {
        let builder = BspTreeBuilder::default();
        let balanced = SplitScoreData {
            front: 3,
            back: 3,
            ortho: true,
            ..Default::default()
        };
        let lopsided = SplitScoreData {
            front: 5,
            back: 1,
            ortho: true,
            ..Default::default()
        };
        let diagonal = SplitScoreData {
            front: 3,
            back: 3,
            ..Default::default()
        };
        assert!(builder.calc_split_score(&balanced) > builder.calc_split_score(&lopsided));
        assert!(builder.calc_split_score(&balanced) > builder.calc_split_score(&diagonal));
    }

    #[test]
    fn test_collinear_same_facing_is_convex() {
        let lines = vec![
            BspLine::with_normal(Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0)),
            BspLine::with_normal(Vec2::new(0.0, 2.0), Vec2::new(0.0, 3.0), Vec2::new(1.0, 0.0)),
        ];
        let mut builder = BspTreeBuilder::default();
        builder.init(&lines).unwrap();
        assert!(builder.complete());
    }

    #[test]
    fn test_walls_facing_apart_split_once() {
        let facing_apart = vec![
            BspLine::with_normal(Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0), Vec2::new(-1.0, 0.0)),
            BspLine::with_normal(Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 0.0)),
        ];
        let mut builder = BspTreeBuilder::default();
        builder.init(&facing_apart).unwrap();
        assert!(!builder.complete());
        builder.build().unwrap();
        assert_eq!(builder.node_count(), 3);
        assert_eq!(builder.leaves().len(), 2);
    }

    #[test]
    fn test_clip_to_ancestors_keeps_own_side() {
        let mut builder = BspTreeBuilder::default();
        builder.init(&l_shape()).unwrap();
        builder.build().unwrap();

        let root_extent = builder.split_line_extent(BspTreeBuilder::ROOT, 100.0).unwrap();
        assert!(root_extent.length() >= 200.0);

        // The root split is x = 1 or y = 1; this diagonal crosses both at (1, 1).
        let diagonal = BspLine::new(Vec2::new(-5.0, -5.0), Vec2::new(5.0, 5.0));
        let mut total = 0.0;
        for leaf in builder.leaves() {
            let piece = builder.clip_to_ancestors(leaf, diagonal).unwrap();
            let mid = (piece.a + piece.b) * 0.5;
            assert_eq!(builder.leaf_at(mid), Some(leaf));
            total += piece.length();
        }
        assert!((total - diagonal.length()).abs() < 1e-3);
    }

    #[test]
    fn test_generated_rooms_always_complete_convex() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..25 {
            let lines = random_room(&mut rng, &RoomConfig::default());
            let mut builder = BspTreeBuilder::default();
            builder.init(&lines).unwrap();
            builder.build().unwrap();
            assert!(builder.complete());
            assert!(builder.all_leaves_convex());
            assert_leaves_convex(&builder);
        }
    }

    #[test]
    fn test_leaf_at_has_no_tolerance_near_a_split() {
        let mut builder = BspTreeBuilder::default();
        builder.init(&l_shape()).unwrap();
        builder.build().unwrap();
        let NodeKind::Internal { split, front, back } = builder.nodes()[0].kind.clone() else {
            panic!("root should be split");
        };

        let mid = (split.a + split.b) * 0.5;
        assert_eq!(builder.leaf_at(mid), Some(front));
        // Well inside the on-line tolerance, but still behind.
        let behind = mid - split.n * (EPSILON * 0.5);
        assert_eq!(side_of_point(&split, behind), LineSide::On);
        assert_eq!(builder.leaf_at(behind), Some(back));
        assert_eq!(builder.leaf_at(mid + split.n * (EPSILON * 0.5)), Some(front));
    }

    #[test]
    fn test_point_location_is_deterministic() {
        let mut builder = BspTreeBuilder::default();
        builder.init(&l_shape()).unwrap();
        builder.build().unwrap();
        let p = Vec2::new(0.25, 0.75);
        assert_eq!(builder.leaf_at(p), builder.leaf_at(p));
    }
}
