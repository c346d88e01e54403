//! The REST transport boundary.
//!
//! The project core never talks HTTP itself — it drives an injected
//! `ResourceTransport`. The real application binds this to its Ajax
//! layer; tests bind [`MemoryTransport`]. Errors carry the backend's
//! `{message, status}` rejection shape and are propagated to callers
//! unretried.

use crate::resource::ResourceKind;
use serde_json::{Value, json};
use std::collections::HashMap;
use thiserror::Error;

/// A remote failure, in the backend's rejection shape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} (status {status})")]
pub struct TransportError {
    pub message: String,
    pub status: u16,
}

impl TransportError {
    pub fn new(message: &str, status: u16) -> Self {
        Self {
            message: message.to_string(),
            status,
        }
    }

    pub fn not_found(id: &str) -> Self {
        Self::new(&format!("resource `{id}` not found"), 404)
    }
}

/// Server CRUD for project resources.
pub trait ResourceTransport {
    /// POST a new resource; the response is the stored entry including
    /// the server-assigned `_id`.
    fn create(&mut self, kind: ResourceKind, data: &Value) -> Result<Value, TransportError>;
    fn delete(&mut self, kind: ResourceKind, id: &str) -> Result<(), TransportError>;
    /// PUT a partial update of an entry.
    fn edit(&mut self, kind: ResourceKind, id: &str, data: &Value) -> Result<(), TransportError>;
    /// GET the current entry.
    fn fetch(&mut self, kind: ResourceKind, id: &str) -> Result<Value, TransportError>;
}

// ─── In-memory test double ───────────────────────────────────────────────

/// Transport double backed by a map. Records every call so tests can
/// assert on traffic, and can be switched into a failing mode.
#[derive(Default)]
pub struct MemoryTransport {
    entries: HashMap<(ResourceKind, String), Value>,
    next_id: u32,
    pub calls: Vec<String>,
    /// When set, every call fails with this error.
    pub failure: Option<TransportError>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, kind: ResourceKind, id: &str) -> Option<&Value> {
        self.entries.get(&(kind, id.to_string()))
    }

    fn check_failure(&self) -> Result<(), TransportError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl ResourceTransport for MemoryTransport {
    fn create(&mut self, kind: ResourceKind, data: &Value) -> Result<Value, TransportError> {
        self.check_failure()?;
        self.next_id += 1;
        let id = format!("r{}", self.next_id);
        self.calls.push(format!("POST /{}", kind.rest_path()));

        let mut entry = data.clone();
        if let Some(obj) = entry.as_object_mut() {
            obj.insert("_id".into(), json!(id));
        }
        self.entries.insert((kind, id), entry.clone());
        Ok(entry)
    }

    fn delete(&mut self, kind: ResourceKind, id: &str) -> Result<(), TransportError> {
        self.check_failure()?;
        self.calls.push(format!("DELETE /{}/{id}", kind.rest_path()));
        self.entries
            .remove(&(kind, id.to_string()))
            .map(|_| ())
            .ok_or_else(|| TransportError::not_found(id))
    }

    fn edit(&mut self, kind: ResourceKind, id: &str, data: &Value) -> Result<(), TransportError> {
        self.check_failure()?;
        self.calls.push(format!("PUT /{}/{id}", kind.rest_path()));
        let entry = self
            .entries
            .get_mut(&(kind, id.to_string()))
            .ok_or_else(|| TransportError::not_found(id))?;
        if let (Some(target), Some(patch)) = (entry.as_object_mut(), data.as_object()) {
            for (key, value) in patch {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    fn fetch(&mut self, kind: ResourceKind, id: &str) -> Result<Value, TransportError> {
        self.check_failure()?;
        self.calls.push(format!("GET /{}/{id}", kind.rest_path()));
        self.entries
            .get(&(kind, id.to_string()))
            .cloned()
            .ok_or_else(|| TransportError::not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_server_ids() {
        let mut transport = MemoryTransport::new();
        let entry = transport
            .create(ResourceKind::Asset, &json!({"name": "hero"}))
            .unwrap();
        assert_eq!(entry["_id"], json!("r1"));
        assert_eq!(transport.calls, vec!["POST /assets"]);
    }

    #[test]
    fn edit_merges_fields() {
        let mut transport = MemoryTransport::new();
        let entry = transport
            .create(ResourceKind::Script, &json!({"name": "tick", "source": ""}))
            .unwrap();
        let id = entry["_id"].as_str().unwrap();

        transport
            .edit(ResourceKind::Script, id, &json!({"source": "run()"}))
            .unwrap();
        let stored = transport.fetch(ResourceKind::Script, id).unwrap();
        assert_eq!(stored["source"], json!("run()"));
        assert_eq!(stored["name"], json!("tick"));
    }

    #[test]
    fn missing_resources_surface_404() {
        let mut transport = MemoryTransport::new();
        let err = transport.fetch(ResourceKind::File, "nope").unwrap_err();
        assert_eq!(err.status, 404);
    }

    #[test]
    fn failure_mode_rejects_everything() {
        let mut transport = MemoryTransport::new();
        transport.failure = Some(TransportError::new("backend down", 503));
        let err = transport
            .create(ResourceKind::Asset, &json!({}))
            .unwrap_err();
        assert_eq!(err.status, 503);
    }
}
