//! Integration tests: the selection protocol.
//!
//! Selection changes are recorded as undoable actions — but only when the
//! selection actually changes, so re-clicks never pollute the history.

use nf_core::model::{Comment, ItemId, ItemKind};
use nf_core::template::TemplateRegistry;
use nf_editor::schema::{ContainerSchema, SchemaEvent};
use std::cell::Cell;
use std::rc::Rc;

/// Schema with three comments A, B, C and no history.
fn setup() -> (ContainerSchema, TemplateRegistry, ItemId, ItemId, ItemId) {
    let mut schema = ContainerSchema::new(1);
    let a = schema.container.insert(ItemKind::Comment(Comment { label: "A".into() }));
    let b = schema.container.insert(ItemKind::Comment(Comment { label: "B".into() }));
    let c = schema.container.insert(ItemKind::Comment(Comment { label: "C".into() }));
    (schema, TemplateRegistry::new(), a, b, c)
}

#[test]
fn plain_click_replaces_selection() {
    let (mut schema, registry, a, b, _) = setup();

    schema.on_node_selected(&registry, Some(a), false, true);
    assert_eq!(schema.container.selection(), &[a]);
    assert!(schema.container.get(a).unwrap().selected);

    schema.on_node_selected(&registry, Some(b), false, true);
    assert_eq!(schema.container.selection(), &[b]);
    assert!(!schema.container.get(a).unwrap().selected);
}

#[test]
fn reclick_of_selected_item_records_no_action() {
    let (mut schema, registry, a, _, _) = setup();

    schema.on_node_selected(&registry, Some(a), false, true);
    assert!(schema.has_undos());

    // Drain history down to the single selection action.
    let selects = Rc::new(Cell::new(0u32));
    let s = Rc::clone(&selects);
    schema.events.on(move |ev| {
        if matches!(ev, SchemaEvent::SelectionChanged) {
            s.set(s.get() + 1);
        }
    });

    schema.on_node_selected(&registry, Some(a), false, true);
    assert_eq!(selects.get(), 0, "no event for an unchanged selection");

    // Exactly one undo step exists; it clears the selection.
    assert!(schema.undo());
    assert!(schema.container.selection().is_empty());
    assert!(!schema.has_undos());
}

#[test]
fn shift_click_extends_in_selection_order() {
    let (mut schema, registry, a, b, c) = setup();

    schema.on_node_selected(&registry, Some(a), false, true);
    schema.on_node_selected(&registry, Some(c), true, true);
    schema.on_node_selected(&registry, Some(b), true, true);

    // Last selected is last.
    assert_eq!(schema.container.selection(), &[a, c, b]);
}

#[test]
fn shift_click_toggles_membership_off() {
    let (mut schema, registry, a, b, _) = setup();

    schema.on_node_selected(&registry, Some(a), false, true);
    schema.on_node_selected(&registry, Some(b), true, true);
    schema.on_node_selected(&registry, Some(a), true, true);

    assert_eq!(schema.container.selection(), &[b]);
    assert!(!schema.container.get(a).unwrap().selected);
}

#[test]
fn shift_click_without_toggle_keeps_state() {
    let (mut schema, registry, a, b, _) = setup();

    schema.on_node_selected(&registry, Some(a), false, true);
    // toggle=false on an already-selected item: nothing changes, no action.
    schema.on_node_selected(&registry, Some(a), true, false);
    assert_eq!(schema.container.selection(), &[a]);

    // toggle=false on an unselected item keeps it unselected.
    schema.on_node_selected(&registry, Some(b), true, false);
    assert_eq!(schema.container.selection(), &[a]);

    // Exactly one recorded action in total.
    assert!(schema.undo());
    assert!(!schema.has_undos());
}

#[test]
fn empty_click_clears_selection() {
    let (mut schema, registry, a, b, _) = setup();

    schema.on_node_selected(&registry, Some(a), false, true);
    schema.on_node_selected(&registry, Some(b), true, true);
    schema.on_node_selected(&registry, None, false, true);

    assert!(schema.container.selection().is_empty());
    assert!(!schema.container.get(a).unwrap().selected);

    // Clearing an already-empty selection records nothing further.
    schema.on_node_selected(&registry, None, false, true);
    assert!(schema.undo());
    assert_eq!(schema.container.selection(), &[a, b]);
}

#[test]
fn unknown_ids_are_treated_as_empty_space() {
    let (mut schema, registry, a, _, _) = setup();

    schema.on_node_selected(&registry, Some(a), false, true);
    schema.on_node_selected(&registry, Some(ItemId(999)), false, true);
    assert!(schema.container.selection().is_empty());
}

#[test]
fn selection_undo_redo_roundtrip() {
    let (mut schema, registry, a, b, _) = setup();

    schema.on_node_selected(&registry, Some(a), false, true);
    schema.on_node_selected(&registry, Some(b), true, true);

    assert!(schema.undo());
    assert_eq!(schema.container.selection(), &[a]);
    assert!(schema.undo());
    assert!(schema.container.selection().is_empty());

    assert!(schema.redo(&registry));
    assert_eq!(schema.container.selection(), &[a]);
    assert!(schema.redo(&registry));
    assert_eq!(schema.container.selection(), &[a, b]);
    assert!(schema.container.get(b).unwrap().selected);
}
