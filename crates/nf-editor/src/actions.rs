//! Reversible editor actions.
//!
//! Every graph mutation is an `EditorAction` that can be applied and
//! reversed symmetrically. Actions capture the state they need for their
//! inverse from the live container at first apply — a removal keeps the
//! removed items (positions included), an edit keeps the previous scalar —
//! so `redo; undo` always restores the container to a value-equal state.

use nf_core::container::{Container, RemovedItem};
use nf_core::id::Name;
use nf_core::model::{
    Behaviour, CanvasItem, Comment, ItemId, ItemKind, Link, LinkEnd, LinkError, PortalKind,
    check_portal_link,
};
use nf_core::prop::Prop;
use nf_core::template::TemplateRegistry;
use smallvec::SmallVec;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("no behaviour template named `{0}` is registered")]
    UnknownTemplate(String),
    #[error("item {0:?} does not exist")]
    MissingItem(ItemId),
    #[error(transparent)]
    Link(#[from] LinkError),
}

/// One absolute move of one item: both endpoints are stored, so applying
/// either direction is idempotent under repeated undo/redo.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemMove {
    pub id: ItemId,
    pub from: (f64, f64),
    pub to: (f64, f64),
}

/// A reversible graph-mutation command.
#[derive(Debug, Clone)]
pub enum EditorAction {
    /// Instantiate a behaviour from a registered definition. The concrete
    /// item kind follows the definition's name: `Asset` wraps a resource
    /// reference, `Portal` exposes a container-level portal.
    BehaviourCreated {
        template: String,
        alias: String,
        left: f64,
        top: f64,
        resource: Option<u32>,
        portal: Option<(PortalKind, Prop)>,
        created: Option<ItemId>,
        removed: Vec<RemovedItem>,
    },
    /// Remove behaviours (and, by cascade, every link touching them).
    BehavioursRemoved {
        ids: Vec<ItemId>,
        removed: Vec<RemovedItem>,
        /// Selection at removal time; removal prunes it, undo restores it.
        prev_selection: Vec<ItemId>,
    },
    CommentCreated {
        left: f64,
        top: f64,
        label: String,
        created: Option<ItemId>,
        removed: Vec<RemovedItem>,
    },
    CommentEditted {
        id: ItemId,
        prev_label: Option<String>,
        label: String,
    },
    CommentResized {
        id: ItemId,
        prev_size: Option<(f64, f64)>,
        size: (f64, f64),
    },
    /// Connect two portals. Validated against directionality, distinct
    /// behaviours, and data-type compatibility at apply time.
    LinkCreated {
        start: LinkEnd,
        end: LinkEnd,
        points: Vec<(f64, f64)>,
        created: Option<ItemId>,
        removed: Vec<RemovedItem>,
    },
    /// Add a portal to a live behaviour.
    PortalCreated {
        behaviour: ItemId,
        kind: PortalKind,
        prop: Prop,
    },
    /// Replace the selection. Stores stable ids for both directions.
    SelectionChanged {
        ids: Vec<ItemId>,
        prev: Vec<ItemId>,
    },
    /// Move items to absolute positions.
    SelectionMoved { moves: Vec<ItemMove> },
}

impl EditorAction {
    /// Apply the action to the container.
    pub fn redo(
        &mut self,
        container: &mut Container,
        registry: &TemplateRegistry,
    ) -> Result<(), ActionError> {
        match self {
            EditorAction::BehaviourCreated {
                template,
                alias,
                left,
                top,
                resource,
                portal,
                created,
                removed,
            } => {
                // A redo after undo restores the retained item so its id
                // (and any later action that references it) stays valid.
                if !removed.is_empty() {
                    container.restore_items(std::mem::take(removed));
                    return Ok(());
                }
                let definition = registry
                    .get_template(template)
                    .ok_or_else(|| ActionError::UnknownTemplate(template.clone()))?;
                let behaviour = Behaviour::from_definition(alias, definition);
                let kind = match (definition.name(), portal.as_ref()) {
                    ("Asset", _) => ItemKind::Asset {
                        behaviour,
                        resource: *resource,
                    },
                    ("Portal", Some((portal_kind, prop))) => {
                        let mut behaviour = behaviour;
                        behaviour.add_portal(*portal_kind, prop.clone())?;
                        ItemKind::Portal {
                            behaviour,
                            portal_kind: *portal_kind,
                            prop: prop.clone(),
                        }
                    }
                    _ => ItemKind::Behaviour(behaviour),
                };
                *created = Some(container.insert_at(kind, *left, *top));
                Ok(())
            }

            EditorAction::BehavioursRemoved {
                ids,
                removed,
                prev_selection,
            } => {
                *prev_selection = container.selection().to_vec();
                *removed = container.remove_items(ids);
                Ok(())
            }

            EditorAction::CommentCreated {
                left,
                top,
                label,
                created,
                removed,
            } => {
                if !removed.is_empty() {
                    container.restore_items(std::mem::take(removed));
                    return Ok(());
                }
                let id = container.insert_at(
                    ItemKind::Comment(Comment {
                        label: label.clone(),
                    }),
                    *left,
                    *top,
                );
                let item = container.get_mut(id).ok_or(ActionError::MissingItem(id))?;
                item.width = 180.0;
                item.height = 60.0;
                *created = Some(id);
                Ok(())
            }

            EditorAction::CommentEditted {
                id,
                prev_label,
                label,
            } => {
                let item = container.get_mut(*id).ok_or(ActionError::MissingItem(*id))?;
                match &mut item.kind {
                    ItemKind::Comment(comment) => {
                        *prev_label = Some(std::mem::replace(&mut comment.label, label.clone()));
                        Ok(())
                    }
                    _ => Err(ActionError::MissingItem(*id)),
                }
            }

            EditorAction::CommentResized {
                id,
                prev_size,
                size,
            } => {
                let item = container.get_mut(*id).ok_or(ActionError::MissingItem(*id))?;
                *prev_size = Some((item.width, item.height));
                item.width = size.0;
                item.height = size.1;
                Ok(())
            }

            EditorAction::LinkCreated {
                start,
                end,
                points,
                created,
                removed,
            } => {
                if !removed.is_empty() {
                    container.restore_items(std::mem::take(removed));
                    return Ok(());
                }
                let origin = portal_of(container, *start)?;
                let dest = portal_of(container, *end)?;
                check_portal_link(start.item, origin, end.item, dest, &registry.converters)?;

                let mut link = Link::new();
                link.start = Some(*start);
                link.end = Some(*end);
                link.points = SmallVec::from_vec(points.clone());
                let id = container.insert(ItemKind::Link(link));
                container.connect_link(id);
                *created = Some(id);
                Ok(())
            }

            EditorAction::PortalCreated {
                behaviour,
                kind,
                prop,
            } => {
                let item = container
                    .get_mut(*behaviour)
                    .ok_or(ActionError::MissingItem(*behaviour))?;
                let target = item.behaviour_mut().ok_or(LinkError::NotABehaviour)?;
                target.add_portal(*kind, prop.clone())?;
                Ok(())
            }

            EditorAction::SelectionChanged { ids, .. } => {
                container.set_selection(ids.clone());
                Ok(())
            }

            EditorAction::SelectionMoved { moves } => {
                apply_moves(container, moves, |m| m.to);
                Ok(())
            }
        }
    }

    /// Reverse a previously applied action.
    pub fn undo(&mut self, container: &mut Container) {
        match self {
            EditorAction::BehaviourCreated {
                created, removed, ..
            }
            | EditorAction::CommentCreated {
                created, removed, ..
            }
            | EditorAction::LinkCreated {
                created, removed, ..
            } => {
                // `created` stays set: the next redo restores the retained
                // item, and the undo after that removes it by id again.
                if let Some(id) = *created {
                    *removed = container.remove_items(&[id]);
                }
            }

            EditorAction::BehavioursRemoved {
                removed,
                prev_selection,
                ..
            } => {
                container.restore_items(std::mem::take(removed));
                container.set_selection(prev_selection.clone());
            }

            EditorAction::CommentEditted { id, prev_label, .. } => {
                if let Some(prev) = prev_label.take()
                    && let Some(item) = container.get_mut(*id)
                    && let ItemKind::Comment(comment) = &mut item.kind
                {
                    comment.label = prev;
                }
            }

            EditorAction::CommentResized { id, prev_size, .. } => {
                if let Some((width, height)) = prev_size.take()
                    && let Some(item) = container.get_mut(*id)
                {
                    item.width = width;
                    item.height = height;
                }
            }

            EditorAction::PortalCreated {
                behaviour, prop, ..
            } => {
                // Links attached after this action were created by later
                // actions and are already undone; the cascade is a no-op
                // then, and correct cleanup otherwise.
                let _ = container.remove_portal(*behaviour, prop.name);
            }

            EditorAction::SelectionChanged { prev, .. } => {
                container.set_selection(prev.clone());
            }

            EditorAction::SelectionMoved { moves } => {
                apply_moves(container, moves, |m| m.from);
            }
        }
    }
}

fn portal_of(container: &Container, end: LinkEnd) -> Result<&nf_core::model::Portal, ActionError> {
    container
        .get(end.item)
        .ok_or(ActionError::MissingItem(end.item))?
        .behaviour()
        .ok_or(LinkError::NotABehaviour)?
        .portal(end.portal)
        .ok_or_else(|| {
            ActionError::Link(LinkError::NoSuchPortal(end.portal.as_str().to_string()))
        })
}

fn apply_moves(container: &mut Container, moves: &[ItemMove], pick: impl Fn(&ItemMove) -> (f64, f64)) {
    for item_move in moves {
        if let Some(item) = container.get_mut(item_move.id) {
            let (left, top) = pick(item_move);
            item.left = left;
            item.top = top;
        }
    }
}

/// Convenience: capture a [`SelectionMoved`](EditorAction::SelectionMoved)
/// from the items' current positions and the drop targets.
pub fn selection_moved(
    container: &Container,
    targets: &[(ItemId, f64, f64)],
) -> EditorAction {
    let moves = targets
        .iter()
        .filter_map(|&(id, x, y)| {
            container.get(id).map(|item: &CanvasItem| ItemMove {
                id,
                from: (item.left, item.top),
                to: (x, y),
            })
        })
        .collect();
    EditorAction::SelectionMoved { moves }
}

/// Convenience: a comment-label edit with the previous label captured at
/// apply time.
pub fn comment_edit(id: ItemId, label: &str) -> EditorAction {
    EditorAction::CommentEditted {
        id,
        prev_label: None,
        label: label.to_string(),
    }
}

/// Convenience: a link between two named portals.
pub fn link(start_item: ItemId, start_portal: &str, end_item: ItemId, end_portal: &str) -> EditorAction {
    EditorAction::LinkCreated {
        start: LinkEnd {
            item: start_item,
            portal: Name::intern(start_portal),
        },
        end: LinkEnd {
            item: end_item,
            portal: Name::intern(end_portal),
        },
        points: Vec::new(),
        created: None,
        removed: Vec::new(),
    }
}
