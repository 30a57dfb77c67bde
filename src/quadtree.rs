use tracing::{debug, trace};

use crate::config::QuadTreeConfig;
use crate::error::{QuadTreeError, Result};
use crate::list::List;
use crate::rect::{Extent, Rect};
use crate::QuadTreeVisitor;

/// A payload stored together with the point it was inserted at.
#[derive(Clone, Debug, PartialEq)]
pub struct Item<T> {
    pub x: f32,
    pub y: f32,
    pub payload: T,
}

impl<T> Item<T> {
    #[inline]
    fn distance_squared(&self, x: f32, y: f32) -> f32 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }
}

#[derive(Clone, Debug)]
struct Node<T> {
    bounds: Extent,
    depth: u8,
    /// Index of the NW child; the NE, SW and SE children follow it.
    first_child: Option<usize>,
    items: Vec<Item<T>>,
}

impl<T> Node<T> {
    fn leaf(bounds: Extent, depth: u8) -> Self {
        Self {
            bounds,
            depth,
            first_child: None,
            items: Vec::new(),
        }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.first_child.is_none()
    }
}

/// Point quadtree meant to be cleared and refilled once per simulation step.
///
/// Leaves split lazily once they hold more than `capacity` items, unless they
/// already sit at `max_depth`. Nodes live in a flat list owned by the tree,
/// children of a node being stored next to each other.
#[derive(Clone)]
pub struct QuadTree<T> {
    config: QuadTreeConfig,
    nodes: List<Node<T>>,
    len: usize,
}

impl<T> QuadTree<T> {
    const ROOT: usize = 0;

    pub fn new(max_depth: u8, capacity: usize, bounds: Rect) -> Result<Self> {
        Self::from_config(QuadTreeConfig::new(max_depth, capacity, bounds))
    }

    pub fn from_config(config: QuadTreeConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            max_depth = config.max_depth,
            capacity = config.capacity,
            bounds = ?config.bounds,
            "creating quadtree"
        );

        let mut nodes = List::new();
        nodes.push(Node::leaf(Extent::from_rect(config.bounds), 0));
        Ok(Self {
            config,
            nodes,
            len: 0,
        })
    }

    pub fn config(&self) -> &QuadTreeConfig {
        &self.config
    }

    pub fn bounds(&self) -> Rect {
        self.config.bounds
    }

    pub fn max_depth(&self) -> u8 {
        self.config.max_depth
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes, branches and leaves alike.
    pub fn node_count(&self) -> usize {
        self.nodes.size()
    }

    /// Stores `payload` at `(x, y)`.
    ///
    /// Fails with [`QuadTreeError::OutOfBounds`] when the point lies outside
    /// the root bounds, in which case nothing is stored.
    pub fn add_item(&mut self, x: f32, y: f32, payload: T) -> Result<()> {
        if !self.nodes.get(Self::ROOT).bounds.contains(x, y) {
            return Err(QuadTreeError::OutOfBounds { x, y });
        }
        self.node_insert(Self::ROOT, Item { x, y, payload });
        self.len += 1;
        Ok(())
    }

    /// Drops every node and item, leaving a single empty root leaf.
    pub fn clear(&mut self) {
        trace!(
            items = self.len,
            nodes = self.nodes.size(),
            "clearing quadtree"
        );
        self.nodes.clear();
        self.nodes
            .push(Node::leaf(Extent::from_rect(self.config.bounds), 0));
        self.len = 0;
    }

    /// Payloads of every item within `radius` (inclusive) of `(x, y)`.
    ///
    /// Results come in tree order, which is deterministic but otherwise
    /// meaningless.
    pub fn items_in_radius(&self, x: f32, y: f32, radius: f32) -> Vec<&T> {
        let mut out = Vec::new();
        self.for_each_in_radius(x, y, radius, |item| out.push(&item.payload));
        out
    }

    /// Calls `f` with every item within `radius` (inclusive) of `(x, y)`.
    ///
    /// Subtrees whose bounds the circle does not reach are skipped.
    pub fn for_each_in_radius<'a, F>(&'a self, x: f32, y: f32, radius: f32, mut f: F)
    where
        F: FnMut(&'a Item<T>),
    {
        let radius_sq = radius * radius;
        let mut to_process = List::<usize>::with_capacity(4 * self.config.max_depth as usize + 1);
        to_process.push(Self::ROOT);

        while let Some(idx) = to_process.pop() {
            let node = self.nodes.get(idx);
            if !node.bounds.intersects_circle(x, y, radius) {
                continue;
            }
            match node.first_child {
                // Reversed so NW is popped first.
                Some(fc) => (0..4).rev().for_each(|i| {
                    to_process.push(fc + i);
                }),
                None => node
                    .items
                    .iter()
                    .filter(|item| item.distance_squared(x, y) <= radius_sq)
                    .for_each(&mut f),
            }
        }
    }

    /// Every node's bounds and depth, root first, children in NW, NE, SW, SE
    /// order.
    pub fn traverse(&self) -> Traverse<'_, T> {
        let mut to_process = List::with_capacity(4 * self.config.max_depth as usize + 1);
        to_process.push(Self::ROOT);
        Traverse {
            nodes: &self.nodes,
            to_process,
        }
    }

    /// Every stored item, in the same order a full-range query yields them.
    pub fn items(&self) -> impl Iterator<Item = &Item<T>> + '_ {
        let mut nodes = self.traverse();
        std::iter::from_fn(move || nodes.next_node()).flat_map(|node| node.items.iter())
    }

    /// Walks the tree in the order of [`QuadTree::traverse`], reporting each
    /// leaf's items right after the leaf itself.
    pub fn visit<V>(&self, visitor: &mut V)
    where
        V: QuadTreeVisitor<T>,
    {
        let mut nodes = self.traverse();
        while let Some(node) = nodes.next_node() {
            if node.is_leaf() {
                visitor.leaf(node.depth, node.bounds.to_rect());
                for item in &node.items {
                    visitor.item(item);
                }
            } else {
                visitor.branch(node.depth, node.bounds.to_rect());
            }
        }
    }

    fn node_insert(&mut self, start_node: usize, item: Item<T>) {
        let mut idx = start_node;
        while let Some(fc) = self.nodes.get(idx).first_child {
            idx = fc + self.nodes.get(idx).bounds.quadrant(item.x, item.y);
        }
        self.leaf_insert(idx, item);
    }

    fn leaf_insert(&mut self, idx: usize, item: Item<T>) {
        let node = self.nodes.get_mut(idx);
        node.items.push(item);

        // If the leaf is over capacity, split it.
        if node.items.len() > self.config.capacity && node.depth < self.config.max_depth {
            self.subdivide(idx);
        }
    }

    fn subdivide(&mut self, idx: usize) {
        let node = self.nodes.get_mut(idx);
        let bounds = node.bounds;
        let depth = node.depth;
        let items = std::mem::take(&mut node.items);
        trace!(depth, items = items.len(), ?bounds, "subdividing node");

        let fc = self.nodes.size();
        for quadrant in bounds.split() {
            self.nodes.push(Node::leaf(quadrant, depth + 1));
        }
        self.nodes.get_mut(idx).first_child = Some(fc);

        // Hand every former item down; children may split in turn.
        for item in items {
            self.node_insert(idx, item);
        }
    }

    /// Panics unless every structural invariant of the tree holds.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let mut items = 0;
        for idx in 0..self.nodes.size() {
            let node = self.nodes.get(idx);
            match node.first_child {
                Some(fc) => {
                    assert!(node.items.is_empty(), "branch {idx} holds items");
                    assert!(node.depth < self.config.max_depth);
                    let expected = node.bounds.split();
                    for (i, quadrant) in expected.iter().enumerate() {
                        let child = self.nodes.get(fc + i);
                        assert_eq!(child.bounds, *quadrant);
                        assert_eq!(child.depth, node.depth + 1);
                    }
                    // Quadrants meet on shared edges and reach the
                    // parent's edges exactly.
                    let parent = node.bounds;
                    let [nw, ne, sw, se] = expected;
                    assert_eq!((nw.min_x, nw.min_y), (parent.min_x, parent.min_y));
                    assert_eq!((ne.min_y, ne.max_x), (parent.min_y, parent.max_x));
                    assert_eq!((sw.min_x, sw.max_y), (parent.min_x, parent.max_y));
                    assert_eq!((se.max_x, se.max_y), (parent.max_x, parent.max_y));
                    assert_eq!(nw.max_x, ne.min_x);
                    assert_eq!(sw.max_x, se.min_x);
                    assert_eq!(nw.max_y, sw.min_y);
                    assert_eq!(ne.max_y, se.min_y);
                }
                None => {
                    if node.depth < self.config.max_depth {
                        assert!(node.items.len() <= self.config.capacity);
                    }
                    for item in &node.items {
                        assert!(node.bounds.contains(item.x, item.y));
                    }
                    items += node.items.len();
                }
            }
        }
        assert_eq!(items, self.len);
        assert_eq!(self.traverse().count(), self.nodes.size());
    }
}

impl<T> std::fmt::Debug for QuadTree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadTree")
            .field("config", &self.config)
            .field("items", &self.len)
            .field("nodes", &self.nodes.size())
            .finish()
    }
}

/// Lazy pre-order walk over a tree's nodes, see [`QuadTree::traverse`].
pub struct Traverse<'a, T> {
    nodes: &'a List<Node<T>>,
    to_process: List<usize>,
}

impl<'a, T> Traverse<'a, T> {
    fn next_node(&mut self) -> Option<&'a Node<T>> {
        let idx = self.to_process.pop()?;
        let node = self.nodes.get(idx);
        if let Some(fc) = node.first_child {
            for i in (0..4).rev() {
                self.to_process.push(fc + i);
            }
        }
        Some(node)
    }
}

impl<T> Iterator for Traverse<'_, T> {
    type Item = (Rect, u8);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_node()
            .map(|node| (node.bounds.to_rect(), node.depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_tree() -> QuadTree<(i32, i32)> {
        let mut tree = QuadTree::new(3, 4, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        for (x, y) in [(10, 10), (12, 12), (15, 15), (90, 90), (11, 11)] {
            tree.add_item(x as f32, y as f32, (x, y)).unwrap();
        }
        tree
    }

    fn sorted(mut v: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
        v.sort();
        v
    }

    #[test]
    fn test_new_tree_is_single_leaf() {
        let tree = QuadTree::<u32>::new(3, 4, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(
            tree.traverse().collect::<Vec<_>>(),
            vec![(Rect::new(0.0, 0.0, 100.0, 100.0), 0)]
        );
    }

    #[test]
    fn test_new_rejects_invalid_configuration() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(matches!(
            QuadTree::<u32>::new(3, 0, bounds),
            Err(QuadTreeError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            QuadTree::<u32>::new(3, 4, Rect::new(0.0, 0.0, 0.0, 100.0)),
            Err(QuadTreeError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_no_split_until_capacity_exceeded() {
        let mut tree = QuadTree::new(3, 4, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        for i in 0..4 {
            tree.add_item(10.0 + i as f32, 10.0, i).unwrap();
        }
        assert_eq!(tree.node_count(), 1);
        tree.assert_invariants();
    }

    #[test]
    fn test_fifth_insert_subdivides_root() {
        let tree = scenario_tree();
        tree.assert_invariants();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.node_count(), 5);

        let nodes: Vec<_> = tree.traverse().collect();
        assert_eq!(nodes[0], (Rect::new(0.0, 0.0, 100.0, 100.0), 0));
        assert_eq!(nodes[1], (Rect::new(0.0, 0.0, 50.0, 50.0), 1));
        assert_eq!(nodes[4], (Rect::new(50.0, 50.0, 50.0, 50.0), 1));

        let nw = tree.nodes.get(1);
        let se = tree.nodes.get(4);
        assert_eq!(
            sorted(nw.items.iter().map(|item| item.payload).collect()),
            vec![(10, 10), (11, 11), (12, 12), (15, 15)]
        );
        assert_eq!(se.items.len(), 1);
        assert_eq!(se.items[0].payload, (90, 90));
        assert!(tree.nodes.get(0).items.is_empty());
    }

    #[test]
    fn test_radius_query_scenario() {
        let tree = scenario_tree();
        let found = tree.items_in_radius(11.0, 11.0, 3.0);
        assert_eq!(
            sorted(found.into_iter().copied().collect()),
            vec![(10, 10), (11, 11), (12, 12)]
        );
    }

    #[test]
    fn test_zero_radius() {
        let tree = scenario_tree();
        assert!(tree.items_in_radius(13.0, 13.0, 0.0).is_empty());
        assert_eq!(tree.items_in_radius(15.0, 15.0, 0.0), vec![&(15, 15)]);
    }

    #[test]
    fn test_query_never_fails() {
        let tree = scenario_tree();
        assert!(tree.items_in_radius(11.0, 11.0, -1.0).is_empty());
        assert!(tree.items_in_radius(11.0, 11.0, f32::NAN).is_empty());
        assert!(tree.items_in_radius(-500.0, 900.0, 10.0).is_empty());
        assert_eq!(tree.items_in_radius(-500.0, 900.0, f32::INFINITY).len(), 5);
    }

    #[test]
    fn test_out_of_bounds_leaves_tree_untouched() {
        let mut tree = scenario_tree();
        assert_eq!(
            tree.add_item(100.5, 50.0, (100, 50)),
            Err(QuadTreeError::OutOfBounds { x: 100.5, y: 50.0 })
        );
        assert!(tree.add_item(f32::NAN, 50.0, (0, 0)).is_err());
        assert_eq!(tree.len(), 5);
        tree.assert_invariants();

        // edges are in bounds
        tree.add_item(100.0, 100.0, (100, 100)).unwrap();
        tree.add_item(0.0, 0.0, (0, 0)).unwrap();
        assert_eq!(tree.len(), 7);
        tree.assert_invariants();
    }

    #[test]
    fn test_clear() {
        let mut tree = scenario_tree();
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert!(tree.items_in_radius(50.0, 50.0, f32::INFINITY).is_empty());
        assert_eq!(tree.traverse().count(), 1);

        tree.clear();
        assert_eq!(tree.node_count(), 1);
        tree.assert_invariants();
    }

    #[test]
    fn test_clear_drops_payloads() {
        use std::rc::Rc;

        let payload = Rc::new(());
        let mut tree = QuadTree::new(2, 1, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        for i in 0..10 {
            tree.add_item(i as f32, i as f32, Rc::clone(&payload)).unwrap();
        }
        assert_eq!(Rc::strong_count(&payload), 11);
        tree.clear();
        assert_eq!(Rc::strong_count(&payload), 1);
    }

    #[test]
    fn test_max_depth_caps_subdivision() {
        let mut tree = QuadTree::new(2, 1, Rect::new(0.0, 0.0, 16.0, 16.0)).unwrap();
        for i in 0..20 {
            tree.add_item(1.0, 1.0, i).unwrap();
        }
        tree.assert_invariants();
        assert!(tree.traverse().all(|(_, depth)| depth <= 2));
        // root + 4 children + 4 grandchildren under NW
        assert_eq!(tree.node_count(), 9);
        assert_eq!(tree.items_in_radius(1.0, 1.0, 0.0).len(), 20);
    }

    #[test]
    fn test_zero_max_depth_never_splits() {
        let mut tree = QuadTree::new(0, 1, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        for i in 0..50 {
            tree.add_item((i % 10) as f32, (i / 5) as f32, i).unwrap();
        }
        assert_eq!(tree.node_count(), 1);
        tree.assert_invariants();
    }

    #[test]
    fn test_cascading_split_on_redistribution() {
        // Every point lands in the NW quadrant of the NW quadrant.
        let mut tree = QuadTree::new(4, 2, Rect::new(0.0, 0.0, 64.0, 64.0)).unwrap();
        tree.add_item(1.0, 1.0, 0).unwrap();
        tree.add_item(2.0, 2.0, 1).unwrap();
        tree.add_item(3.0, 3.0, 2).unwrap();
        tree.assert_invariants();
        assert!(tree.traverse().any(|(_, depth)| depth >= 2));
    }

    #[test]
    fn test_far_edges_found_with_awkward_bounds() {
        let bounds = Rect::new(0.1, 0.3, 0.7, 0.9);
        let (right, bottom) = (bounds.right(), bounds.bottom());
        let mut tree = QuadTree::new(10, 1, bounds).unwrap();
        tree.add_item(right, bottom, "corner").unwrap();
        tree.add_item(right, 0.5, "right edge").unwrap();
        tree.add_item(0.4, bottom, "bottom edge").unwrap();
        tree.add_item(0.3, 0.6, "inside").unwrap();
        tree.assert_invariants();
        assert!(tree.node_count() > 1);

        assert_eq!(tree.items_in_radius(right, bottom, 0.0), vec![&"corner"]);
        assert_eq!(tree.items_in_radius(right, 0.5, 0.0), vec![&"right edge"]);
        assert_eq!(tree.items_in_radius(0.4, bottom, 0.0), vec![&"bottom edge"]);
    }

    #[test]
    fn test_shared_edge_goes_north_west() {
        let mut tree = QuadTree::new(1, 1, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        tree.add_item(50.0, 50.0, "center").unwrap();
        tree.add_item(50.0, 80.0, "vertical line").unwrap();
        tree.add_item(80.0, 50.0, "horizontal line").unwrap();
        tree.assert_invariants();

        let leaf_items = |i: usize| -> Vec<&'static str> {
            tree.nodes.get(i).items.iter().map(|item| item.payload).collect()
        };
        assert_eq!(leaf_items(1), vec!["center"]);
        assert_eq!(leaf_items(2), vec!["horizontal line"]);
        assert_eq!(leaf_items(3), vec!["vertical line"]);
        assert!(leaf_items(4).is_empty());
    }

    #[test]
    fn test_traverse_is_restartable() {
        let tree = scenario_tree();
        let first: Vec<_> = tree.traverse().collect();
        let second: Vec<_> = tree.traverse().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), tree.node_count());
    }

    #[test]
    fn test_items_iterates_everything() {
        let tree = scenario_tree();
        let all: Vec<_> = tree.items().map(|item| item.payload).collect();
        let queried: Vec<_> = tree
            .items_in_radius(0.0, 0.0, f32::INFINITY)
            .into_iter()
            .copied()
            .collect();
        assert_eq!(all, queried);
        assert_eq!(all.len(), 5);
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl QuadTreeVisitor<(i32, i32)> for Recorder {
        fn item(&mut self, item: &Item<(i32, i32)>) {
            self.events.push(format!("item {:?}", item.payload));
        }

        fn leaf(&mut self, depth: u8, bounds: Rect) {
            self.events.push(format!("leaf {depth} {}", bounds.x));
        }

        fn branch(&mut self, depth: u8, bounds: Rect) {
            self.events.push(format!("branch {depth} {}", bounds.x));
        }
    }

    #[test]
    fn test_visit_reports_items_after_their_leaf() {
        let mut tree = QuadTree::new(3, 4, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        tree.add_item(10.0, 10.0, (10, 10)).unwrap();
        for i in 0..4 {
            tree.add_item(90.0, 90.0 - i as f32, (90, 90 - i)).unwrap();
        }

        let mut recorder = Recorder::default();
        tree.visit(&mut recorder);
        assert_eq!(
            recorder.events,
            vec![
                "branch 0 0",
                "leaf 1 0",
                "item (10, 10)",
                "leaf 1 50",
                "leaf 1 0",
                "leaf 1 50",
                "item (90, 90)",
                "item (90, 89)",
                "item (90, 88)",
                "item (90, 87)",
            ]
        );
    }
}
