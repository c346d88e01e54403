//! Tree node descriptions.
//!
//! A `TreeNodeModel` is a plain value describing a node and its subtree,
//! buildable detached from any store. Inserting it into a
//! [`TreeNodeStore`] flattens the whole subtree into the store's arena —
//! after that, the store owns the state and hands out indices.
//!
//! [`TreeNodeStore`]: crate::store::TreeNodeStore

/// A buildable description of a tree node and its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNodeModel {
    pub label: String,
    pub icon: Option<String>,
    pub selectable: bool,
    pub expanded: bool,
    pub disabled: bool,
    pub can_drag: bool,
    pub can_drop: bool,
    pub children: Vec<TreeNodeModel>,
}

impl TreeNodeModel {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            icon: None,
            selectable: true,
            expanded: false,
            disabled: false,
            can_drag: false,
            can_drop: false,
            children: Vec::new(),
        }
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn draggable(mut self, can_drag: bool) -> Self {
        self.can_drag = can_drag;
        self
    }

    pub fn droppable(mut self, can_drop: bool) -> Self {
        self.can_drop = can_drop;
        self
    }

    pub fn child(mut self, child: TreeNodeModel) -> Self {
        self.children.push(child);
        self
    }
}

/// The store-owned state of one tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub icon: Option<String>,
    pub selectable: bool,
    pub expanded: bool,
    pub disabled: bool,
    pub can_drag: bool,
    pub can_drop: bool,
    pub selected: bool,
}

impl TreeNode {
    pub(crate) fn from_model(model: &TreeNodeModel) -> Self {
        Self {
            label: model.label.clone(),
            icon: model.icon.clone(),
            selectable: model.selectable,
            expanded: model.expanded,
            disabled: model.disabled,
            can_drag: model.can_drag,
            can_drop: model.can_drop,
            selected: false,
        }
    }
}
