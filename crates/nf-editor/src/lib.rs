pub mod actions;
pub mod history;
pub mod lint;
pub mod schema;
pub mod shortcuts;

pub use actions::{ActionError, EditorAction, ItemMove};
pub use history::{DEFAULT_HISTORY_LIMIT, History};
pub use lint::{LintDiagnostic, LintSeverity, lint_container};
pub use schema::{ContainerSchema, SchemaEvent};
pub use shortcuts::{ShortcutAction, ShortcutMap};
