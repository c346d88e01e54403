//! Linear undo/redo history.
//!
//! Applied actions are pushed to the past stack; undo pops and applies
//! the inverse, moving the action to the future stack. A new action
//! invalidates any previously-undone branch — this is a linear history,
//! not a tree. Depth is bounded; the oldest entry is evicted first.

use crate::actions::{ActionError, EditorAction};
use nf_core::container::Container;
use nf_core::template::TemplateRegistry;

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

pub struct History {
    past: Vec<EditorAction>,
    future: Vec<EditorAction>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            past: Vec::with_capacity(limit),
            future: Vec::new(),
            limit,
        }
    }

    /// Apply an action and record it. On failure nothing is recorded and
    /// the container is untouched. Application is synchronous — an
    /// action's `redo` never dispatches another action.
    pub fn do_action(
        &mut self,
        container: &mut Container,
        registry: &TemplateRegistry,
        mut action: EditorAction,
    ) -> Result<(), ActionError> {
        action.redo(container, registry)?;
        self.past.push(action);
        if self.past.len() > self.limit {
            self.past.remove(0);
        }
        // A new action invalidates the redo branch.
        self.future.clear();
        Ok(())
    }

    /// Reverse the most recent action. Returns false when there is none.
    pub fn undo(&mut self, container: &mut Container) -> bool {
        let Some(mut action) = self.past.pop() else {
            return false;
        };
        action.undo(container);
        self.future.push(action);
        true
    }

    /// Re-apply the most recently undone action.
    pub fn redo(&mut self, container: &mut Container, registry: &TemplateRegistry) -> bool {
        let Some(mut action) = self.future.pop() else {
            return false;
        };
        // Re-applying state we already applied once cannot fail.
        if let Err(err) = action.redo(container, registry) {
            log::warn!("redo failed, dropping action: {err}");
            return false;
        }
        self.past.push(action);
        true
    }

    pub fn has_undos(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn has_redos(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.past.len()
    }

    /// Drop both stacks, e.g. after loading a new document.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::comment_edit;
    use nf_core::model::{Comment, ItemKind};

    fn setup() -> (Container, TemplateRegistry, nf_core::model::ItemId) {
        let mut container = Container::new();
        let id = container.insert(ItemKind::Comment(Comment {
            label: "v0".into(),
        }));
        (container, TemplateRegistry::new(), id)
    }

    fn label(container: &Container, id: nf_core::model::ItemId) -> String {
        container.get(id).unwrap().comment().unwrap().label.clone()
    }

    #[test]
    fn undo_then_redo_restores_either_state() {
        let (mut container, registry, id) = setup();
        let mut history = History::new(10);

        history
            .do_action(&mut container, &registry, comment_edit(id, "v1"))
            .unwrap();
        assert_eq!(label(&container, id), "v1");

        assert!(history.undo(&mut container));
        assert_eq!(label(&container, id), "v0");

        assert!(history.redo(&mut container, &registry));
        assert_eq!(label(&container, id), "v1");
    }

    #[test]
    fn new_action_clears_redo_branch() {
        let (mut container, registry, id) = setup();
        let mut history = History::new(10);

        history
            .do_action(&mut container, &registry, comment_edit(id, "v1"))
            .unwrap();
        history.undo(&mut container);
        assert!(history.has_redos());

        history
            .do_action(&mut container, &registry, comment_edit(id, "v2"))
            .unwrap();
        assert!(!history.has_redos());
        assert!(!history.redo(&mut container, &registry));
    }

    #[test]
    fn depth_is_capped_evicting_oldest() {
        let (mut container, registry, id) = setup();
        let limit = 3;
        let mut history = History::new(limit);

        for i in 0..limit + 5 {
            history
                .do_action(&mut container, &registry, comment_edit(id, &format!("v{i}")))
                .unwrap();
        }
        assert_eq!(history.depth(), limit);

        // Only `limit` undos are possible, landing on the oldest retained edit.
        let mut undos = 0;
        while history.undo(&mut container) {
            undos += 1;
        }
        assert_eq!(undos, limit);
        assert_eq!(label(&container, id), "v4");
    }

    #[test]
    fn empty_stacks_are_no_ops() {
        let (mut container, registry, _) = setup();
        let mut history = History::default();
        assert!(!history.undo(&mut container));
        assert!(!history.redo(&mut container, &registry));
        assert!(!history.has_undos());
        assert!(!history.has_redos());
    }

    #[test]
    fn failed_action_records_nothing() {
        let (mut container, registry, _) = setup();
        let mut history = History::new(10);

        let missing = nf_core::model::ItemId(999);
        let result = history.do_action(&mut container, &registry, comment_edit(missing, "x"));
        assert!(result.is_err());
        assert!(!history.has_undos());
    }
}
