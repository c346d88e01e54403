//! Server-backed resources.
//!
//! A resource pairs a server entry DTO with the editable property set
//! the grid renders. `_id` is server identity, assigned on first save;
//! `shallowId` is session identity, assigned locally so graphs can
//! reference resources that have never been saved.

use nf_core::editable::{EditableSet, EditedEvent};
use nf_core::events::EventDispatcher;
use nf_core::id::{Name, next_shallow_id};
use nf_core::prop::PropValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::rc::Rc;

/// The resource families a project owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Asset,
    Container,
    Script,
    GroupArray,
    File,
}

impl ResourceKind {
    /// REST collection path on the backend.
    pub fn rest_path(&self) -> &'static str {
        match self {
            ResourceKind::Asset => "assets",
            ResourceKind::Container => "containers",
            ResourceKind::Script => "scripts",
            ResourceKind::GroupArray => "groups",
            ResourceKind::File => "files",
        }
    }

    pub fn all() -> [ResourceKind; 5] {
        [
            ResourceKind::Asset,
            ResourceKind::Container,
            ResourceKind::Script,
            ResourceKind::GroupArray,
            ResourceKind::File,
        ]
    }
}

/// A server entry DTO.
pub trait ResourceEntry: Clone + Serialize + DeserializeOwned {
    const KIND: ResourceKind;

    /// Server identity, absent until the first save round-trip.
    fn id(&self) -> Option<&str>;
    fn shallow_id(&self) -> u32;
    fn name(&self) -> &str;
}

macro_rules! entry_common {
    ($ty:ty, $kind:expr) => {
        impl ResourceEntry for $ty {
            const KIND: ResourceKind = $kind;

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn shallow_id(&self) -> u32 {
                self.shallow_id
            }

            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetEntry {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub shallow_id: u32,
    pub name: String,
    pub class_name: String,
    /// Tokenized property set.
    #[serde(default)]
    pub json: Value,
}

impl AssetEntry {
    pub fn new(name: &str, class_name: &str) -> Self {
        Self {
            id: None,
            shallow_id: next_shallow_id(),
            name: name.to_string(),
            class_name: class_name.to_string(),
            json: json!([]),
        }
    }
}
entry_common!(AssetEntry, ResourceKind::Asset);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerEntry {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub shallow_id: u32,
    pub name: String,
    /// Serialized workspace (`{ items, properties }`).
    #[serde(default)]
    pub json: Value,
}

impl ContainerEntry {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            shallow_id: next_shallow_id(),
            name: name.to_string(),
            json: Value::Null,
        }
    }
}
entry_common!(ContainerEntry, ResourceKind::Container);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScriptEntry {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub shallow_id: u32,
    pub name: String,
    #[serde(default)]
    pub source: String,
}

impl ScriptEntry {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            shallow_id: next_shallow_id(),
            name: name.to_string(),
            source: String::new(),
        }
    }
}
entry_common!(ScriptEntry, ResourceKind::Script);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupEntry {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub shallow_id: u32,
    pub name: String,
    /// Shallow ids of the grouped resources.
    #[serde(default)]
    pub items: Vec<u32>,
}

impl GroupEntry {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            shallow_id: next_shallow_id(),
            name: name.to_string(),
            items: Vec::new(),
        }
    }
}
entry_common!(GroupEntry, ResourceKind::GroupArray);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub shallow_id: u32,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub size: u64,
}

impl FileEntry {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            id: None,
            shallow_id: next_shallow_id(),
            name: name.to_string(),
            url: url.to_string(),
            size: 0,
        }
    }
}
entry_common!(FileEntry, ResourceKind::File);

// ─── ProjectResource ─────────────────────────────────────────────────────

/// A live resource: entry DTO, save state, and its property set.
pub struct ProjectResource<E: ResourceEntry> {
    pub entry: E,
    saved: bool,
    pub properties: EditableSet,
    /// Bus for `EditedEvent`s; the property set's parent dispatcher.
    pub events: Rc<EventDispatcher<EditedEvent>>,
}

impl<E: ResourceEntry> ProjectResource<E> {
    pub fn new(entry: E) -> Self {
        let events = Rc::new(EventDispatcher::new());
        let properties = EditableSet::new().with_parent(Rc::clone(&events));
        Self {
            entry,
            saved: false,
            properties,
            events,
        }
    }

    pub fn with_properties(mut self, mut properties: EditableSet) -> Self {
        properties.set_parent(Rc::clone(&self.events));
        self.properties = properties;
        self
    }

    pub fn saved(&self) -> bool {
        self.saved
    }

    pub fn mark_saved(&mut self) {
        self.saved = true;
    }

    /// Edit one property. The set notifies the bus and the resource
    /// becomes unsaved.
    pub fn edit_property(&mut self, name: Name, value: PropValue) -> bool {
        let updated = self.properties.update_value(name, value).is_some();
        if updated {
            self.saved = false;
        }
        updated
    }
}
