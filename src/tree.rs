//! Arena-backed move tree.
//!
//! Nodes live in one `Vec` and point at each other through [`NodeId`]s:
//! `next` is the single mainline successor, `prev` the predecessor, and
//! `variations` the alternative lines that replace the move leading to a
//! node. A variation's first node has the same `prev` as the node it
//! replaces, and nothing on the mainline links forward into it.

use crate::position::BoardState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One ply of a game.
#[derive(Debug, Clone)]
pub struct Node<B: BoardState> {
    pub position: B,
    pub ply: u32,
    /// Move that produced this node; `None` only for a tree root.
    pub mv: Option<B::Move>,
    /// The move as written in the source, without count or suffix.
    pub notation: Option<String>,
    /// Move-number prefix as written, e.g. `"5..."`.
    pub move_count: Option<String>,
    /// Suffix annotations and translated glyphs, e.g. `"!?"`.
    pub punctuation: String,
    pub comments: Vec<String>,
    /// Comments written inside a variation before its first move.
    pub leading_comments: Vec<String>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    variations: Vec<NodeId>,
}

impl<B: BoardState> Node<B> {
    fn new(position: B) -> Self {
        Self {
            ply: position.ply(),
            position,
            mv: None,
            notation: None,
            move_count: None,
            punctuation: String::new(),
            comments: Vec::new(),
            leading_comments: Vec::new(),
            prev: None,
            next: None,
            variations: Vec::new(),
        }
    }

    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    pub fn variations(&self) -> &[NodeId] {
        &self.variations
    }
}

#[derive(Debug, Clone)]
pub struct MoveTree<B: BoardState> {
    nodes: Vec<Node<B>>,
}

impl<B: BoardState> MoveTree<B> {
    /// Creates a tree holding only the root node for `start`.
    pub fn new(start: B) -> Self {
        Self {
            nodes: vec![Node::new(start)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &Node<B> {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<B> {
        &mut self.nodes[id.0]
    }

    /// Adds a node reached by `mv` from `from`.
    ///
    /// With `link` set the node becomes `from`'s mainline successor;
    /// otherwise it only points back at `from` and must be registered as a
    /// variation by the caller.
    pub(crate) fn push_move(
        &mut self,
        from: NodeId,
        mv: B::Move,
        position: B,
        link: bool,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut node = Node::new(position);
        node.mv = Some(mv);
        node.prev = Some(from);
        self.nodes.push(node);

        if link {
            self.nodes[from.0].next = Some(id);
        }
        id
    }

    pub(crate) fn add_variation(&mut self, at: NodeId, first: NodeId) {
        self.nodes[at.0].variations.push(first);
    }

    /// Follows `next` links from `start` to the end of its line.
    pub fn line(&self, start: NodeId) -> Line<'_, B> {
        Line {
            tree: self,
            cursor: Some(start),
        }
    }

    /// The mainline, root included.
    pub fn mainline(&self) -> Line<'_, B> {
        self.line(self.root())
    }

    /// Every line from the root to a leaf, mainline first.
    ///
    /// A variation path shares the prefix up to the fork point and then
    /// continues along the variation instead of the replaced node.
    pub fn paths(&self) -> Vec<Vec<NodeId>> {
        let mut paths = Vec::new();
        self.walk(self.root(), Vec::new(), &mut paths);
        paths
    }

    fn walk(&self, start: NodeId, mut path: Vec<NodeId>, paths: &mut Vec<Vec<NodeId>>) {
        let mut forks = Vec::new();
        for id in self.line(start) {
            let node = self.node(id);
            for &variation in &node.variations {
                forks.push((variation, path.len()));
            }
            path.push(id);
        }

        let finished = path.clone();
        paths.push(finished);

        for (variation, prefix_len) in forks {
            self.walk(variation, path[..prefix_len].to_vec(), paths);
        }
    }
}

pub struct Line<'t, B: BoardState> {
    tree: &'t MoveTree<B>,
    cursor: Option<NodeId>,
}

impl<B: BoardState> Iterator for Line<'_, B> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.cursor?;
        self.cursor = self.tree.node(id).next;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Chess;

    fn push(tree: &mut MoveTree<Chess>, from: NodeId, san: &str, link: bool) -> NodeId {
        let pos = tree.node(from).position.clone();
        let mv = pos.resolve(san).unwrap();
        let next = pos.apply(&mv);
        let id = tree.push_move(from, mv, next, link);
        tree.node_mut(id).notation = Some(san.to_string());
        id
    }

    fn notations(tree: &MoveTree<Chess>, path: &[NodeId]) -> Vec<String> {
        path.iter()
            .filter_map(|&id| tree.node(id).notation.clone())
            .collect()
    }

    #[test]
    fn test_new_tree_has_only_root() {
        let tree = MoveTree::new(Chess::default());
        assert!(tree.is_empty());
        assert_eq!(tree.node(tree.root()).ply, 0);
        assert!(tree.node(tree.root()).prev().is_none());
        assert_eq!(tree.paths(), vec![vec![tree.root()]]);
    }

    #[test]
    fn test_mainline_links_are_consistent() {
        let mut tree = MoveTree::new(Chess::default());
        let root = tree.root();
        let e4 = push(&mut tree, root, "e4", true);
        let e5 = push(&mut tree, e4, "e5", true);

        assert_eq!(tree.node(e4).next(), Some(e5));
        assert_eq!(tree.node(e5).prev(), Some(e4));
        assert_eq!(tree.node(e5).ply, 2);
        assert_eq!(tree.mainline().collect::<Vec<_>>(), vec![tree.root(), e4, e5]);
    }

    #[test]
    fn test_variation_shares_prev_and_stays_off_mainline() {
        let mut tree = MoveTree::new(Chess::default());
        let root = tree.root();
        let e4 = push(&mut tree, root, "e4", true);
        let e5 = push(&mut tree, e4, "e5", true);
        let c5 = push(&mut tree, e4, "c5", false);
        tree.add_variation(e5, c5);
        let nf3 = push(&mut tree, c5, "Nf3", true);

        assert_eq!(tree.node(c5).prev(), tree.node(e5).prev());
        assert_eq!(tree.node(e4).next(), Some(e5));
        assert_eq!(tree.node(c5).next(), Some(nf3));

        let paths = tree.paths();
        assert_eq!(paths.len(), 2);
        assert_eq!(notations(&tree, &paths[0]), vec!["e4", "e5"]);
        assert_eq!(notations(&tree, &paths[1]), vec!["e4", "c5", "Nf3"]);
    }
}
