//! Integration tests: the request-epoch staleness guard.
//!
//! A fetch completion that arrives after the resource was deleted, or
//! after a newer fetch began, must be discarded — never applied.

use nf_project::{AssetEntry, MemoryTransport, Project, ResourceKind, ResourceTransport};
use serde_json::json;

fn seeded_project() -> (Project, MemoryTransport, u32) {
    let mut project = Project::new();
    let mut transport = MemoryTransport::new();
    let shallow_id = project
        .create_resource(&mut transport, AssetEntry::new("hero", "Image"))
        .unwrap();
    (project, transport, shallow_id)
}

#[test]
fn refresh_applies_the_fetched_entry() {
    let (mut project, mut transport, shallow_id) = seeded_project();
    let server_id = project
        .resource::<AssetEntry>(shallow_id)
        .unwrap()
        .entry
        .id
        .clone()
        .unwrap();

    // The backend state changes behind our back.
    transport
        .edit(ResourceKind::Asset, &server_id, &json!({"name": "renamed"}))
        .unwrap();

    let applied = project
        .refresh_resource::<AssetEntry>(&mut transport, shallow_id)
        .unwrap();
    assert!(applied);
    assert_eq!(
        project.resource::<AssetEntry>(shallow_id).unwrap().entry.name,
        "renamed"
    );
}

#[test]
fn completion_after_delete_is_discarded() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (mut project, mut transport, shallow_id) = seeded_project();
    let server_id = project
        .resource::<AssetEntry>(shallow_id)
        .unwrap()
        .entry
        .id
        .clone()
        .unwrap();

    // Fetch begins, then the resource is deleted mid-flight.
    let token = project.begin_refresh(shallow_id);
    let response = transport.fetch(ResourceKind::Asset, &server_id).unwrap();
    project
        .delete_resource::<AssetEntry>(&mut transport, shallow_id)
        .unwrap();

    let applied = project
        .complete_refresh::<AssetEntry>(token, response)
        .unwrap();
    assert!(!applied, "stale completion must be a no-op");
    assert!(project.resource::<AssetEntry>(shallow_id).is_none());
}

#[test]
fn older_request_loses_to_newer_request() {
    let (mut project, mut transport, shallow_id) = seeded_project();
    let server_id = project
        .resource::<AssetEntry>(shallow_id)
        .unwrap()
        .entry
        .id
        .clone()
        .unwrap();

    let old_token = project.begin_refresh(shallow_id);
    let old_response = transport.fetch(ResourceKind::Asset, &server_id).unwrap();

    // A newer request supersedes the old one and completes first.
    transport
        .edit(ResourceKind::Asset, &server_id, &json!({"name": "newest"}))
        .unwrap();
    let new_token = project.begin_refresh(shallow_id);
    let new_response = transport.fetch(ResourceKind::Asset, &server_id).unwrap();
    assert!(
        project
            .complete_refresh::<AssetEntry>(new_token, new_response)
            .unwrap()
    );

    // The old response arrives late and must not clobber the newer state.
    assert!(
        !project
            .complete_refresh::<AssetEntry>(old_token, old_response)
            .unwrap()
    );
    assert_eq!(
        project.resource::<AssetEntry>(shallow_id).unwrap().entry.name,
        "newest"
    );
}
