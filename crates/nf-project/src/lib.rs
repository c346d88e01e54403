pub mod project;
pub mod resource;
pub mod transport;

pub use project::{HasCollection, Project, ProjectError, ProjectEvent, RequestToken};
pub use resource::{
    AssetEntry, ContainerEntry, FileEntry, GroupEntry, ProjectResource, ResourceEntry,
    ResourceKind, ScriptEntry,
};
pub use transport::{MemoryTransport, ResourceTransport, TransportError};
