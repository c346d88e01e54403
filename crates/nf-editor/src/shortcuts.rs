//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic editor actions. The map lives
//! here rather than in the host UI so every frontend binds the same way.

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    Delete,
    SelectAll,
    Deselect,
    AddComment,
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘, on
/// other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        match key {
            "z" | "Z" if cmd && shift => Some(ShortcutAction::Redo),
            "z" | "Z" if cmd => Some(ShortcutAction::Undo),
            "y" | "Y" if cmd => Some(ShortcutAction::Redo),
            "a" | "A" if cmd => Some(ShortcutAction::SelectAll),
            "m" | "M" if cmd => Some(ShortcutAction::AddComment),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}
