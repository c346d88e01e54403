//! The container schema: one open graph and its editing state.
//!
//! Owns the item arena and the undo history, translates UI intents into
//! actions, and emits a change event after every recorded mutation so
//! views re-render. The template registry is passed in by the caller —
//! the schema never reaches for ambient state, which keeps it testable
//! without a running application.

use crate::actions::{ActionError, EditorAction, selection_moved};
use crate::history::{DEFAULT_HISTORY_LIMIT, History};
use nf_core::container::Container;
use nf_core::events::EventDispatcher;
use nf_core::model::{ItemId, PortalKind};
use nf_core::prop::{Prop, TokenError};
use nf_core::template::TemplateRegistry;
use nf_core::token::{DecodeReport, WorkspaceToken, emit_workspace, parse_workspace};
use std::rc::Rc;

/// Emitted on the schema bus after any recorded mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaEvent {
    /// The graph changed; views should re-read it.
    Invalidated,
    /// The selection changed (also implies `Invalidated` semantics).
    SelectionChanged,
}

/// The live editor for one open container resource.
pub struct ContainerSchema {
    pub container: Container,
    history: History,
    /// Shallow id of the container resource this editor belongs to.
    resource: u32,
    pub events: Rc<EventDispatcher<SchemaEvent>>,
}

impl ContainerSchema {
    pub fn new(resource: u32) -> Self {
        Self::with_history_limit(resource, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(resource: u32, limit: usize) -> Self {
        Self {
            container: Container::new(),
            history: History::new(limit),
            resource,
            events: Rc::new(EventDispatcher::new()),
        }
    }

    pub fn resource(&self) -> u32 {
        self.resource
    }

    // ─── Actions ─────────────────────────────────────────────────────────

    /// Record and apply an action, then invalidate.
    pub fn do_action(
        &mut self,
        registry: &TemplateRegistry,
        action: EditorAction,
    ) -> Result<(), ActionError> {
        self.history
            .do_action(&mut self.container, registry, action)?;
        self.invalidate();
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.container);
        if changed {
            self.invalidate();
        }
        changed
    }

    pub fn redo(&mut self, registry: &TemplateRegistry) -> bool {
        let changed = self.history.redo(&mut self.container, registry);
        if changed {
            self.invalidate();
        }
        changed
    }

    pub fn has_undos(&self) -> bool {
        self.history.has_undos()
    }

    pub fn has_redos(&self) -> bool {
        self.history.has_redos()
    }

    /// Emit a change notification. Synchronous, same-thread delivery.
    pub fn invalidate(&self) {
        self.events.emit(&SchemaEvent::Invalidated);
    }

    // ─── Intent helpers ──────────────────────────────────────────────────

    pub fn create_behaviour(
        &mut self,
        registry: &TemplateRegistry,
        template: &str,
        alias: &str,
        left: f64,
        top: f64,
    ) -> Result<(), ActionError> {
        self.do_action(
            registry,
            EditorAction::BehaviourCreated {
                template: template.to_string(),
                alias: alias.to_string(),
                left,
                top,
                resource: None,
                portal: None,
                created: None,
                removed: Vec::new(),
            },
        )
    }

    pub fn create_asset_behaviour(
        &mut self,
        registry: &TemplateRegistry,
        alias: &str,
        resource: Option<u32>,
        left: f64,
        top: f64,
    ) -> Result<(), ActionError> {
        self.do_action(
            registry,
            EditorAction::BehaviourCreated {
                template: "Asset".to_string(),
                alias: alias.to_string(),
                left,
                top,
                resource,
                portal: None,
                created: None,
                removed: Vec::new(),
            },
        )
    }

    pub fn create_portal_behaviour(
        &mut self,
        registry: &TemplateRegistry,
        alias: &str,
        kind: PortalKind,
        prop: Prop,
        left: f64,
        top: f64,
    ) -> Result<(), ActionError> {
        self.do_action(
            registry,
            EditorAction::BehaviourCreated {
                template: "Portal".to_string(),
                alias: alias.to_string(),
                left,
                top,
                resource: None,
                portal: Some((kind, prop)),
                created: None,
                removed: Vec::new(),
            },
        )
    }

    pub fn remove_selected(&mut self, registry: &TemplateRegistry) -> Result<(), ActionError> {
        let ids = self.container.selection().to_vec();
        if ids.is_empty() {
            return Ok(());
        }
        self.do_action(
            registry,
            EditorAction::BehavioursRemoved {
                ids,
                removed: Vec::new(),
                prev_selection: Vec::new(),
            },
        )
    }

    /// Commit a completed drag gesture as one undoable step.
    pub fn move_items(
        &mut self,
        registry: &TemplateRegistry,
        targets: &[(ItemId, f64, f64)],
    ) -> Result<(), ActionError> {
        if targets.is_empty() {
            return Ok(());
        }
        let action = selection_moved(&self.container, targets);
        self.do_action(registry, action)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Selection protocol.
    ///
    /// Without shift the clicked item becomes the whole selection (or the
    /// selection clears on empty space). With shift the item's membership
    /// toggles — unless `toggle` is false, in which case its current
    /// state is kept. Only a selection that actually differs from the
    /// current one, member for member in order, records an undoable
    /// action: re-clicking a selected item never pollutes the history.
    pub fn on_node_selected(
        &mut self,
        registry: &TemplateRegistry,
        item: Option<ItemId>,
        shift_down: bool,
        toggle: bool,
    ) {
        let item = item.filter(|id| self.container.contains(*id));

        let previous = self.container.selection().to_vec();
        let next = if !shift_down {
            match item {
                Some(id) => vec![id],
                None => Vec::new(),
            }
        } else {
            match item {
                Some(id) => {
                    let currently = self
                        .container
                        .get(id)
                        .map(|i| i.selected)
                        .unwrap_or(false);
                    let selected = if toggle { !currently } else { currently };
                    let mut next = previous.clone();
                    if selected && !next.contains(&id) {
                        next.push(id);
                    } else if !selected {
                        next.retain(|&existing| existing != id);
                    }
                    next
                }
                None => previous.clone(),
            }
        };

        if next == previous {
            return;
        }

        let action = EditorAction::SelectionChanged {
            ids: next,
            prev: previous,
        };
        // Selection changes cannot fail.
        if self.do_action(registry, action).is_ok() {
            self.events.emit(&SchemaEvent::SelectionChanged);
        }
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Serialize the live graph, renumbering wire ordinals by position.
    pub fn serialize(&self) -> WorkspaceToken {
        emit_workspace(&self.container)
    }

    /// Replace the live graph with a decoded workspace. Existing items
    /// and the undo history are discarded; links that fail to resolve
    /// are dropped and counted in the report.
    pub fn deserialize(
        &mut self,
        token: &WorkspaceToken,
        registry: &TemplateRegistry,
    ) -> Result<DecodeReport, TokenError> {
        let (container, report) = parse_workspace(token, registry)?;
        self.container = container;
        self.history.clear();
        self.invalidate();
        Ok(report)
    }
}
