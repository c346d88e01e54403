//! The observable tree store.
//!
//! Owns the node hierarchy in a stable graph (parent → child containment
//! edges), the authoritative selection, and the focused node. Indices
//! stay valid across removals of other nodes. Views subscribe to the
//! event bus and re-read the store on change.

use crate::model::{TreeNode, TreeNodeModel};
use nf_core::events::EventDispatcher;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use std::rc::Rc;

/// Emitted on the store bus after structural or selection changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    NodeAdded(NodeIndex),
    NodeRemoved(NodeIndex),
    NodeChanged(NodeIndex),
    SelectionChanged,
    FocusChanged(Option<NodeIndex>),
}

pub struct TreeNodeStore {
    graph: StableDiGraph<TreeNode, ()>,
    root: NodeIndex,
    selected: Vec<NodeIndex>,
    focused: Option<NodeIndex>,
    pub events: Rc<EventDispatcher<TreeEvent>>,
}

impl TreeNodeStore {
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let mut root_node = TreeNode::from_model(&TreeNodeModel::new(""));
        root_node.selectable = false;
        root_node.can_drop = true;
        let root = graph.add_node(root_node);
        Self {
            graph,
            root,
            selected: Vec::new(),
            focused: None,
            events: Rc::new(EventDispatcher::new()),
        }
    }

    /// The invisible root every top-level node hangs off.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    // ─── Structure ───────────────────────────────────────────────────────

    /// Insert a node description — and its entire subtree — under
    /// `parent` (the root when `None`). Every descendant becomes owned by
    /// this store and resolvable through it. Returns the top node's index.
    pub fn insert(&mut self, parent: Option<NodeIndex>, model: &TreeNodeModel) -> NodeIndex {
        let parent = parent.unwrap_or(self.root);
        let idx = self.insert_subtree(parent, model);
        self.events.emit(&TreeEvent::NodeAdded(idx));
        idx
    }

    fn insert_subtree(&mut self, parent: NodeIndex, model: &TreeNodeModel) -> NodeIndex {
        let idx = self.graph.add_node(TreeNode::from_model(model));
        log::trace!("tree insert `{}` under {parent:?}", model.label);
        self.graph.add_edge(parent, idx, ());
        for child in &model.children {
            self.insert_subtree(idx, child);
        }
        idx
    }

    /// Remove a node and its whole subtree. Removed nodes are pruned from
    /// the selection, and focus clears if it pointed into the subtree.
    pub fn remove(&mut self, idx: NodeIndex) -> bool {
        if idx == self.root || !self.graph.contains_node(idx) {
            return false;
        }
        let doomed = self.collect_subtree(idx);
        log::trace!("tree remove {idx:?} ({} node(s))", doomed.len());
        for &node in &doomed {
            self.graph.remove_node(node);
        }

        let before = self.selected.len();
        self.selected.retain(|n| !doomed.contains(n));
        if self.selected.len() != before {
            self.events.emit(&TreeEvent::SelectionChanged);
        }
        if let Some(focus) = self.focused
            && doomed.contains(&focus)
        {
            self.focused = None;
            self.events.emit(&TreeEvent::FocusChanged(None));
        }
        self.events.emit(&TreeEvent::NodeRemoved(idx));
        true
    }

    fn collect_subtree(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = vec![idx];
        let mut stack = vec![idx];
        while let Some(node) = stack.pop() {
            for child in self.graph.neighbors_directed(node, Direction::Outgoing) {
                out.push(child);
                stack.push(child);
            }
        }
        out
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&TreeNode> {
        self.graph.node_weight(idx)
    }

    /// Mutate a node through the store so views hear about it.
    pub fn update<R>(&mut self, idx: NodeIndex, f: impl FnOnce(&mut TreeNode) -> R) -> Option<R> {
        let result = self.graph.node_weight_mut(idx).map(f);
        if result.is_some() {
            self.events.emit(&TreeEvent::NodeChanged(idx));
        }
        result
    }

    pub fn contains(&self, idx: NodeIndex) -> bool {
        self.graph.contains_node(idx)
    }

    /// Number of nodes, excluding the root.
    pub fn len(&self) -> usize {
        self.graph.node_count() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Children in insertion order.
    ///
    /// Sorts by `NodeIndex` so the result is deterministic regardless of
    /// adjacency-list iteration order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    /// Check if `ancestor` is a parent/grandparent/… of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeIndex, descendant: NodeIndex) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut current = descendant;
        while let Some(parent) = self.parent(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    // ─── Drag / drop ─────────────────────────────────────────────────────

    pub fn can_drag(&self, idx: NodeIndex) -> bool {
        self.get(idx).map(|n| n.can_drag && !n.disabled).unwrap_or(false)
    }

    pub fn can_drop(&self, idx: NodeIndex) -> bool {
        self.get(idx).map(|n| n.can_drop && !n.disabled).unwrap_or(false)
    }

    /// Reparent `child` under `new_parent`, gated on the capability flags.
    /// Dropping a node into its own subtree is refused.
    pub fn reparent(&mut self, child: NodeIndex, new_parent: NodeIndex) -> bool {
        if !self.can_drag(child)
            || !self.can_drop(new_parent)
            || child == new_parent
            || self.is_ancestor_of(child, new_parent)
        {
            return false;
        }
        if let Some(old_parent) = self.parent(child)
            && let Some(edge) = self.graph.find_edge(old_parent, child)
        {
            self.graph.remove_edge(edge);
        }
        self.graph.add_edge(new_parent, child, ());
        self.events.emit(&TreeEvent::NodeChanged(child));
        true
    }

    // ─── Selection & focus ───────────────────────────────────────────────

    /// Selected indices, in selection order.
    pub fn selection(&self) -> &[NodeIndex] {
        &self.selected
    }

    /// Selection protocol — the same shift/toggle algorithm the canvas
    /// uses. Non-selectable and disabled nodes act like empty space.
    pub fn select(&mut self, idx: Option<NodeIndex>, shift_down: bool, toggle: bool) {
        let idx = idx.filter(|&i| {
            self.get(i)
                .map(|n| n.selectable && !n.disabled)
                .unwrap_or(false)
        });

        let previous = self.selected.clone();
        let next = if !shift_down {
            match idx {
                Some(i) => vec![i],
                None => Vec::new(),
            }
        } else {
            match idx {
                Some(i) => {
                    let currently = self.get(i).map(|n| n.selected).unwrap_or(false);
                    let selected = if toggle { !currently } else { currently };
                    let mut next = previous.clone();
                    if selected && !next.contains(&i) {
                        next.push(i);
                    } else if !selected {
                        next.retain(|&existing| existing != i);
                    }
                    next
                }
                None => previous.clone(),
            }
        };

        if next == previous {
            return;
        }

        for &node in &previous {
            if let Some(n) = self.graph.node_weight_mut(node) {
                n.selected = false;
            }
        }
        for &node in &next {
            if let Some(n) = self.graph.node_weight_mut(node) {
                n.selected = true;
            }
        }
        self.selected = next;
        self.events.emit(&TreeEvent::SelectionChanged);
    }

    pub fn focused(&self) -> Option<NodeIndex> {
        self.focused
    }

    /// Move keyboard focus. Decoupled from selection — arrowing through
    /// the tree must not rewrite the selection.
    pub fn focus(&mut self, idx: Option<NodeIndex>) {
        let idx = idx.filter(|&i| self.contains(i));
        if idx == self.focused {
            return;
        }
        self.focused = idx;
        self.events.emit(&TreeEvent::FocusChanged(idx));
    }
}

impl Default for TreeNodeStore {
    fn default() -> Self {
        Self::new()
    }
}
