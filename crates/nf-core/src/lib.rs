pub mod container;
pub mod editable;
pub mod events;
pub mod id;
pub mod model;
pub mod prop;
pub mod template;
pub mod token;

pub use container::{Container, RemovedItem};
pub use editable::{EditableSet, EditedEvent};
pub use events::{EventDispatcher, ListenerId};
pub use id::{Name, next_shallow_id};
pub use model::*;
pub use prop::{Color, DataType, Prop, PropValue, TokenError};
pub use template::{
    AssetClass, BehaviourDefinition, DefinitionError, PortalTemplate, TemplateEvent,
    TemplateRegistry, TypeConverters,
};
pub use token::{DecodeReport, ItemToken, PortalToken, WorkspaceToken, emit_workspace, parse_workspace};
