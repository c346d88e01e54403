//! Integration tests: action symmetry through the container schema.
//!
//! Every action class is applied and reversed, checking that the item
//! arena and selection return to a value-equal state, and that
//! `redo; undo; redo` equals a single `redo`.

use nf_core::model::{CanvasItem, ItemId, PortalKind};
use nf_core::prop::Prop;
use nf_core::template::{BehaviourDefinition, PortalTemplate, TemplateRegistry};
use nf_editor::actions::{EditorAction, comment_edit, link};
use nf_editor::schema::ContainerSchema;

fn registry() -> TemplateRegistry {
    let mut registry = TemplateRegistry::new();
    registry.register_template(
        BehaviourDefinition::new(
            "Oscillator",
            vec![
                PortalTemplate::new(PortalKind::Output, Prop::string("Out", "")),
                PortalTemplate::new(PortalKind::Input, Prop::string("In", "")),
                PortalTemplate::new(
                    PortalKind::Parameter,
                    Prop::num("rate", 1.0, 0.0, 10.0, 1, 0.5),
                ),
            ],
            true,
            true,
            true,
            true,
            Some("core"),
        )
        .unwrap(),
    );
    registry.register_template(
        BehaviourDefinition::new("Asset", vec![], false, false, true, true, Some("core")).unwrap(),
    );
    registry.register_template(
        BehaviourDefinition::new("Portal", vec![], true, true, false, false, Some("core")).unwrap(),
    );
    registry
}

fn snapshot(schema: &ContainerSchema) -> (Vec<CanvasItem>, Vec<ItemId>) {
    (
        schema.container.items().to_vec(),
        schema.container.selection().to_vec(),
    )
}

/// Two linked oscillators, ready for removal scenarios.
fn linked_schema(registry: &TemplateRegistry) -> (ContainerSchema, ItemId, ItemId) {
    let mut schema = ContainerSchema::new(1);
    schema
        .create_behaviour(registry, "Oscillator", "a", 0.0, 0.0)
        .unwrap();
    schema
        .create_behaviour(registry, "Oscillator", "b", 100.0, 0.0)
        .unwrap();
    let a = schema.container.items()[0].id;
    let b = schema.container.items()[1].id;
    schema.do_action(registry, link(a, "Out", b, "In")).unwrap();
    (schema, a, b)
}

// ─── Per-action symmetry ────────────────────────────────────────────────

#[test]
fn behaviour_created_roundtrip() {
    let registry = registry();
    let mut schema = ContainerSchema::new(1);
    let before = snapshot(&schema);

    schema
        .create_behaviour(&registry, "Oscillator", "osc", 40.0, 20.0)
        .unwrap();
    let after = snapshot(&schema);
    assert_eq!(after.0.len(), 1);
    assert_eq!(after.0[0].left, 40.0);
    assert_eq!(
        after.0[0].behaviour().unwrap().template.as_deref(),
        Some("Oscillator")
    );

    assert!(schema.undo());
    assert_eq!(snapshot(&schema), before);

    assert!(schema.redo(&registry));
    assert_eq!(snapshot(&schema), after);

    // A second full cycle exercises the restore-then-remove path.
    assert!(schema.undo());
    assert_eq!(snapshot(&schema), before);
    assert!(schema.redo(&registry));
    assert_eq!(snapshot(&schema), after);
}

#[test]
fn behaviour_created_from_definition_builds_parameter_properties() {
    let registry = registry();
    let mut schema = ContainerSchema::new(1);
    schema
        .create_behaviour(&registry, "Oscillator", "osc", 0.0, 0.0)
        .unwrap();

    let behaviour = schema.container.items()[0].behaviour().unwrap();
    assert_eq!(behaviour.portals().len(), 3);
    assert!(
        behaviour
            .properties
            .get(nf_core::id::Name::intern("rate"))
            .is_some()
    );
}

#[test]
fn asset_and_portal_kinds_follow_definition_name() {
    let registry = registry();
    let mut schema = ContainerSchema::new(1);
    schema
        .create_asset_behaviour(&registry, "sprite", Some(77), 0.0, 0.0)
        .unwrap();
    schema
        .create_portal_behaviour(
            &registry,
            "exit",
            PortalKind::Output,
            Prop::string("Done", ""),
            50.0,
            0.0,
        )
        .unwrap();

    match &schema.container.items()[0].kind {
        nf_core::model::ItemKind::Asset { resource, .. } => assert_eq!(*resource, Some(77)),
        other => panic!("expected asset item, got {}", other.tag()),
    }
    match &schema.container.items()[1].kind {
        nf_core::model::ItemKind::Portal { portal_kind, .. } => {
            assert_eq!(*portal_kind, PortalKind::Output)
        }
        other => panic!("expected portal item, got {}", other.tag()),
    }
}

#[test]
fn unknown_template_fails_without_recording() {
    let registry = registry();
    let mut schema = ContainerSchema::new(1);
    assert!(
        schema
            .create_behaviour(&registry, "Vanished", "x", 0.0, 0.0)
            .is_err()
    );
    assert!(!schema.has_undos());
    assert!(schema.container.is_empty());
}

#[test]
fn behaviours_removed_restores_links_on_undo() {
    let registry = registry();
    let (mut schema, a, b) = linked_schema(&registry);
    let before = snapshot(&schema);
    assert_eq!(before.0.len(), 3);

    schema.on_node_selected(&registry, Some(a), false, true);
    schema.remove_selected(&registry).unwrap();
    // Behaviour and its link are gone; the other behaviour survives.
    assert_eq!(schema.container.len(), 1);
    assert!(schema.container.contains(b));

    // Unwind removal and the selection change that preceded it.
    assert!(schema.undo());
    assert!(schema.undo());
    assert_eq!(snapshot(&schema), before);

    // The restored link is live on both portals again.
    let out_portal_links = schema
        .container
        .get(a)
        .unwrap()
        .behaviour()
        .unwrap()
        .portal(nf_core::id::Name::intern("Out"))
        .unwrap()
        .links
        .clone();
    assert_eq!(out_portal_links.len(), 1);
}

#[test]
fn comment_lifecycle_roundtrip() {
    let registry = registry();
    let mut schema = ContainerSchema::new(1);

    schema
        .do_action(
            &registry,
            EditorAction::CommentCreated {
                left: 5.0,
                top: 6.0,
                label: "hello".into(),
                created: None,
                removed: Vec::new(),
            },
        )
        .unwrap();
    let id = schema.container.items()[0].id;
    let created = snapshot(&schema);

    schema.do_action(&registry, comment_edit(id, "edited")).unwrap();
    schema
        .do_action(
            &registry,
            EditorAction::CommentResized {
                id,
                prev_size: None,
                size: (300.0, 90.0),
            },
        )
        .unwrap();
    let resized = snapshot(&schema);
    assert_eq!(schema.container.get(id).unwrap().width, 300.0);

    assert!(schema.undo()); // resize
    assert!(schema.undo()); // edit
    assert_eq!(snapshot(&schema), created);

    assert!(schema.redo(&registry));
    assert!(schema.redo(&registry));
    assert_eq!(snapshot(&schema), resized);
}

#[test]
fn link_created_roundtrip_and_validation() {
    let registry = registry();
    let mut schema = ContainerSchema::new(1);
    schema
        .create_behaviour(&registry, "Oscillator", "a", 0.0, 0.0)
        .unwrap();
    schema
        .create_behaviour(&registry, "Oscillator", "b", 0.0, 0.0)
        .unwrap();
    let a = schema.container.items()[0].id;
    let b = schema.container.items()[1].id;
    let before = snapshot(&schema);

    // Input → input is rejected and records nothing.
    assert!(schema.do_action(&registry, link(a, "In", b, "In")).is_err());
    assert_eq!(snapshot(&schema), before);

    schema.do_action(&registry, link(a, "Out", b, "In")).unwrap();
    let after = snapshot(&schema);
    assert_eq!(schema.container.len(), 3);

    assert!(schema.undo());
    assert_eq!(snapshot(&schema), before);
    assert!(schema.redo(&registry));
    assert_eq!(snapshot(&schema), after);
}

#[test]
fn portal_created_roundtrip() {
    let registry = registry();
    let mut schema = ContainerSchema::new(1);
    schema
        .create_behaviour(&registry, "Oscillator", "osc", 0.0, 0.0)
        .unwrap();
    let id = schema.container.items()[0].id;
    let before = snapshot(&schema);

    schema
        .do_action(
            &registry,
            EditorAction::PortalCreated {
                behaviour: id,
                kind: PortalKind::Product,
                prop: Prop::string("Result", ""),
            },
        )
        .unwrap();
    assert_eq!(
        schema.container.get(id).unwrap().behaviour().unwrap().portals().len(),
        4
    );

    // Duplicate portal name is rejected.
    assert!(
        schema
            .do_action(
                &registry,
                EditorAction::PortalCreated {
                    behaviour: id,
                    kind: PortalKind::Product,
                    prop: Prop::string("Result", ""),
                },
            )
            .is_err()
    );

    assert!(schema.undo());
    assert_eq!(snapshot(&schema), before);
}

#[test]
fn selection_moved_is_idempotent_under_redo() {
    let registry = registry();
    let (mut schema, a, b) = linked_schema(&registry);

    schema
        .move_items(&registry, &[(a, 30.0, 40.0), (b, 130.0, 40.0)])
        .unwrap();
    let moved = snapshot(&schema);

    assert!(schema.undo());
    assert_eq!(schema.container.get(a).unwrap().left, 0.0);
    assert!(schema.redo(&registry));
    assert_eq!(snapshot(&schema), moved);

    // redo; undo; redo equals a single redo
    assert!(schema.undo());
    assert!(schema.redo(&registry));
    assert_eq!(snapshot(&schema), moved);
}

// ─── History behavior through the schema ────────────────────────────────

#[test]
fn new_action_clears_redo() {
    let registry = registry();
    let mut schema = ContainerSchema::new(1);

    schema
        .create_behaviour(&registry, "Oscillator", "x", 0.0, 0.0)
        .unwrap();
    schema.undo();
    assert!(schema.has_redos());

    schema
        .create_behaviour(&registry, "Oscillator", "y", 0.0, 0.0)
        .unwrap();
    assert!(!schema.has_redos());
}

#[test]
fn history_truncates_to_limit() {
    let registry = registry();
    let limit = 4;
    let mut schema = ContainerSchema::with_history_limit(1, limit);
    schema
        .do_action(
            &registry,
            EditorAction::CommentCreated {
                left: 0.0,
                top: 0.0,
                label: "c".into(),
                created: None,
                removed: Vec::new(),
            },
        )
        .unwrap();
    let id = schema.container.items()[0].id;

    for i in 0..limit + 5 {
        schema
            .do_action(&registry, comment_edit(id, &format!("v{i}")))
            .unwrap();
    }

    let mut undos = 0;
    while schema.undo() {
        undos += 1;
    }
    assert_eq!(undos, limit);
}

#[test]
fn invalidate_fires_after_each_recorded_action() {
    use std::cell::Cell;
    use std::rc::Rc;

    let registry = registry();
    let mut schema = ContainerSchema::new(1);
    let fired = Rc::new(Cell::new(0u32));
    let f = Rc::clone(&fired);
    schema.events.on(move |ev| {
        if matches!(ev, nf_editor::schema::SchemaEvent::Invalidated) {
            f.set(f.get() + 1);
        }
    });

    schema
        .create_behaviour(&registry, "Oscillator", "x", 0.0, 0.0)
        .unwrap();
    schema.undo();
    schema.redo(&registry);
    assert_eq!(fired.get(), 3);
}
