//! Project orchestration.
//!
//! The project is the sole authority for resource identity and lifecycle:
//! it owns the typed resource collections, drives the transport, emits
//! domain events that tree views and editors re-render from, and tracks
//! the open container editors. Completion of a fetch is guarded by a
//! per-resource request epoch so a response that arrives after a delete
//! (or after a newer request) is discarded instead of resurrecting state.

use crate::resource::{
    AssetEntry, ContainerEntry, FileEntry, GroupEntry, ProjectResource, ResourceEntry,
    ResourceKind, ScriptEntry,
};
use crate::transport::{ResourceTransport, TransportError};
use nf_core::events::EventDispatcher;
use nf_core::prop::TokenError;
use nf_core::template::TemplateRegistry;
use nf_core::token::WorkspaceToken;
use nf_editor::schema::ContainerSchema;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("malformed server response: {0}")]
    Decode(String),
    #[error("no resource with shallow id {0}")]
    UnknownResource(u32),
    #[error("resource {0} has never been saved")]
    NeverSaved(u32),
    #[error("no open editor for container {0}")]
    NoOpenEditor(u32),
}

/// Emitted on the project bus after lifecycle changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectEvent {
    ResourceCreated(ResourceKind, u32),
    ResourceRemoved(ResourceKind, u32),
    Refreshed(u32),
    Edited(u32),
}

/// Capability token for completing an in-flight fetch. Stale tokens —
/// superseded by a newer request or a delete — are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    pub shallow_id: u32,
    epoch: u32,
}

/// Access to the typed collection for one entry type.
pub trait HasCollection<E: ResourceEntry> {
    fn resources(&self) -> &[ProjectResource<E>];
    fn resources_mut(&mut self) -> &mut Vec<ProjectResource<E>>;
}

macro_rules! has_collection {
    ($entry:ty, $field:ident) => {
        impl HasCollection<$entry> for Project {
            fn resources(&self) -> &[ProjectResource<$entry>] {
                &self.$field
            }

            fn resources_mut(&mut self) -> &mut Vec<ProjectResource<$entry>> {
                &mut self.$field
            }
        }
    };
}

#[derive(Default)]
pub struct Project {
    pub assets: Vec<ProjectResource<AssetEntry>>,
    pub containers: Vec<ProjectResource<ContainerEntry>>,
    pub scripts: Vec<ProjectResource<ScriptEntry>>,
    pub groups: Vec<ProjectResource<GroupEntry>>,
    pub files: Vec<ProjectResource<FileEntry>>,
    open_editors: Vec<ContainerSchema>,
    epochs: HashMap<u32, u32>,
    pub events: Rc<EventDispatcher<ProjectEvent>>,
}

has_collection!(AssetEntry, assets);
has_collection!(ContainerEntry, containers);
has_collection!(ScriptEntry, scripts);
has_collection!(GroupEntry, groups);
has_collection!(FileEntry, files);

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource<E: ResourceEntry>(&self, shallow_id: u32) -> Option<&ProjectResource<E>>
    where
        Self: HasCollection<E>,
    {
        self.resources()
            .iter()
            .find(|r| r.entry.shallow_id() == shallow_id)
    }

    pub fn resource_mut<E: ResourceEntry>(
        &mut self,
        shallow_id: u32,
    ) -> Option<&mut ProjectResource<E>>
    where
        Self: HasCollection<E>,
    {
        self.resources_mut()
            .iter_mut()
            .find(|r| r.entry.shallow_id() == shallow_id)
    }

    // ─── CRUD ────────────────────────────────────────────────────────────

    /// POST a new resource and adopt the stored entry. Emits
    /// `ResourceCreated` on success; transport rejections propagate to
    /// the caller untouched.
    pub fn create_resource<E: ResourceEntry>(
        &mut self,
        transport: &mut dyn ResourceTransport,
        entry: E,
    ) -> Result<u32, ProjectError>
    where
        Self: HasCollection<E>,
    {
        let payload = encode(&entry)?;
        let response = transport.create(E::KIND, &payload)?;
        let stored: E = decode(response)?;
        let shallow_id = stored.shallow_id();

        let mut resource = ProjectResource::new(stored);
        resource.mark_saved();
        self.resources_mut().push(resource);
        self.events
            .emit(&ProjectEvent::ResourceCreated(E::KIND, shallow_id));
        Ok(shallow_id)
    }

    /// DELETE a resource. The local copy is detached even when it was
    /// never saved; any in-flight fetch for it is invalidated. Deleting a
    /// container also drops its open editor.
    pub fn delete_resource<E: ResourceEntry>(
        &mut self,
        transport: &mut dyn ResourceTransport,
        shallow_id: u32,
    ) -> Result<(), ProjectError>
    where
        Self: HasCollection<E>,
    {
        let position = self
            .resources()
            .iter()
            .position(|r| r.entry.shallow_id() == shallow_id)
            .ok_or(ProjectError::UnknownResource(shallow_id))?;

        if let Some(server_id) = self.resources()[position].entry.id() {
            let server_id = server_id.to_string();
            transport.delete(E::KIND, &server_id)?;
        }
        self.resources_mut().remove(position);
        self.bump_epoch(shallow_id);

        if E::KIND == ResourceKind::Container {
            self.open_editors.retain(|e| e.resource() != shallow_id);
        }
        self.events
            .emit(&ProjectEvent::ResourceRemoved(E::KIND, shallow_id));
        Ok(())
    }

    /// PUT a partial entry update, mirroring it into the local copy.
    pub fn edit_resource<E: ResourceEntry>(
        &mut self,
        transport: &mut dyn ResourceTransport,
        shallow_id: u32,
        patch: &Value,
    ) -> Result<(), ProjectError>
    where
        Self: HasCollection<E>,
    {
        let resource = self
            .resource::<E>(shallow_id)
            .ok_or(ProjectError::UnknownResource(shallow_id))?;
        let server_id = resource
            .entry
            .id()
            .ok_or(ProjectError::NeverSaved(shallow_id))?
            .to_string();

        transport.edit(E::KIND, &server_id, patch)?;

        // Mirror the patch locally through the serde shape.
        let mut merged = encode(&resource.entry)?;
        if let (Some(target), Some(fields)) = (merged.as_object_mut(), patch.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        let entry: E = decode(merged)?;
        let resource = self
            .resource_mut::<E>(shallow_id)
            .ok_or(ProjectError::UnknownResource(shallow_id))?;
        resource.entry = entry;
        self.events.emit(&ProjectEvent::Edited(shallow_id));
        Ok(())
    }

    /// Persist a resource: POST when it has never been saved, PUT
    /// otherwise. Flips the saved flag.
    pub fn save_resource<E: ResourceEntry>(
        &mut self,
        transport: &mut dyn ResourceTransport,
        shallow_id: u32,
    ) -> Result<bool, ProjectError>
    where
        Self: HasCollection<E>,
    {
        let resource = self
            .resource::<E>(shallow_id)
            .ok_or(ProjectError::UnknownResource(shallow_id))?;
        let payload = encode(&resource.entry)?;
        let server_id = resource.entry.id().map(str::to_string);

        match server_id {
            Some(server_id) => {
                transport.edit(E::KIND, &server_id, &payload)?;
            }
            None => {
                let response = transport.create(E::KIND, &payload)?;
                let stored: E = decode(response)?;
                self.resource_mut::<E>(shallow_id)
                    .ok_or(ProjectError::UnknownResource(shallow_id))?
                    .entry = stored;
            }
        }
        self.resource_mut::<E>(shallow_id)
            .ok_or(ProjectError::UnknownResource(shallow_id))?
            .mark_saved();
        Ok(true)
    }

    // ─── Refresh with staleness guard ────────────────────────────────────

    /// Start a fetch for a resource. The returned token supersedes every
    /// earlier token for the same resource.
    pub fn begin_refresh(&mut self, shallow_id: u32) -> RequestToken {
        let epoch = self.bump_epoch(shallow_id);
        RequestToken { shallow_id, epoch }
    }

    /// Complete a fetch. A stale token — the resource was deleted or a
    /// newer request began meanwhile — is discarded with a debug log and
    /// `Ok(false)`.
    pub fn complete_refresh<E: ResourceEntry>(
        &mut self,
        token: RequestToken,
        response: Value,
    ) -> Result<bool, ProjectError>
    where
        Self: HasCollection<E>,
    {
        let current = self.epochs.get(&token.shallow_id).copied().unwrap_or(0);
        if current != token.epoch {
            log::debug!(
                "discarding stale refresh for resource {} (epoch {} != {current})",
                token.shallow_id,
                token.epoch
            );
            return Ok(false);
        }
        let Some(resource) = self.resource_mut::<E>(token.shallow_id) else {
            log::debug!("discarding refresh for deleted resource {}", token.shallow_id);
            return Ok(false);
        };
        resource.entry = decode(response)?;
        resource.mark_saved();
        self.events.emit(&ProjectEvent::Refreshed(token.shallow_id));
        Ok(true)
    }

    /// Fetch-and-apply in one step, for callers with a synchronous
    /// transport at hand.
    pub fn refresh_resource<E: ResourceEntry>(
        &mut self,
        transport: &mut dyn ResourceTransport,
        shallow_id: u32,
    ) -> Result<bool, ProjectError>
    where
        Self: HasCollection<E>,
    {
        let server_id = self
            .resource::<E>(shallow_id)
            .ok_or(ProjectError::UnknownResource(shallow_id))?
            .entry
            .id()
            .ok_or(ProjectError::NeverSaved(shallow_id))?
            .to_string();
        let token = self.begin_refresh(shallow_id);
        let response = transport.fetch(E::KIND, &server_id)?;
        self.complete_refresh::<E>(token, response)
    }

    fn bump_epoch(&mut self, shallow_id: u32) -> u32 {
        let epoch = self.epochs.entry(shallow_id).or_insert(0);
        *epoch += 1;
        *epoch
    }

    // ─── Open editors ────────────────────────────────────────────────────

    /// Open (or return the already-open) editor for a container,
    /// decoding its stored workspace.
    pub fn open_container(
        &mut self,
        registry: &TemplateRegistry,
        shallow_id: u32,
    ) -> Result<&mut ContainerSchema, ProjectError> {
        if let Some(position) = self
            .open_editors
            .iter()
            .position(|e| e.resource() == shallow_id)
        {
            return Ok(&mut self.open_editors[position]);
        }

        let entry_json = self
            .resource::<ContainerEntry>(shallow_id)
            .ok_or(ProjectError::UnknownResource(shallow_id))?
            .entry
            .json
            .clone();

        let mut schema = ContainerSchema::new(shallow_id);
        if !entry_json.is_null() {
            let token = WorkspaceToken::from_value(&entry_json)?;
            let report = schema.deserialize(&token, registry)?;
            if report.dropped_links > 0 {
                log::warn!(
                    "container {shallow_id}: dropped {} unresolvable link(s) on open",
                    report.dropped_links
                );
            }
        }
        self.open_editors.push(schema);
        Ok(self.open_editors.last_mut().expect("just pushed"))
    }

    pub fn open_editors(&self) -> &[ContainerSchema] {
        &self.open_editors
    }

    pub fn editor_mut(&mut self, shallow_id: u32) -> Option<&mut ContainerSchema> {
        self.open_editors
            .iter_mut()
            .find(|e| e.resource() == shallow_id)
    }

    /// Close a container editor, optionally persisting its serialized
    /// workspace first. The editor is detached and dropped either way.
    pub fn collapse_editor(
        &mut self,
        transport: &mut dyn ResourceTransport,
        shallow_id: u32,
        update_database: bool,
    ) -> Result<(), ProjectError> {
        let position = self
            .open_editors
            .iter()
            .position(|e| e.resource() == shallow_id)
            .ok_or(ProjectError::NoOpenEditor(shallow_id))?;

        if update_database {
            let workspace = self.open_editors[position].serialize().to_value();
            let resource = self
                .resource_mut::<ContainerEntry>(shallow_id)
                .ok_or(ProjectError::UnknownResource(shallow_id))?;
            resource.entry.json = workspace.clone();
            let server_id = resource.entry.id().map(str::to_string);

            if let Some(server_id) = server_id {
                transport.edit(
                    ResourceKind::Container,
                    &server_id,
                    &json!({ "json": workspace }),
                )?;
                self.resource_mut::<ContainerEntry>(shallow_id)
                    .ok_or(ProjectError::UnknownResource(shallow_id))?
                    .mark_saved();
            }
        }
        let editor = self.open_editors.remove(position);
        editor.events.dispose();
        Ok(())
    }
}

fn encode<E: ResourceEntry>(entry: &E) -> Result<Value, ProjectError> {
    serde_json::to_value(entry).map_err(|e| ProjectError::Decode(e.to_string()))
}

fn decode<E: ResourceEntry>(value: Value) -> Result<E, ProjectError> {
    serde_json::from_value(value).map_err(|e| ProjectError::Decode(e.to_string()))
}
