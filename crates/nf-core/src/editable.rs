//! Ordered, name-keyed property collections.
//!
//! An `EditableSet` backs one property grid: insertion order is rendering
//! order, names are unique. Edits made through `update_value` notify the
//! owning object's dispatcher so the grid re-renders and resources mark
//! themselves unsaved.

use crate::events::EventDispatcher;
use crate::id::Name;
use crate::prop::{Prop, PropValue, TokenError};
use serde_json::{Value, json};
use std::rc::Rc;

/// Emitted on the parent dispatcher whenever a property changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditedEvent {
    pub name: Name,
}

/// An ordered collection of [`Prop`]s with unique names.
#[derive(Default)]
pub struct EditableSet {
    props: Vec<Prop>,
    parent: Option<Rc<EventDispatcher<EditedEvent>>>,
}

impl EditableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the dispatcher that receives [`EditedEvent`]s.
    pub fn with_parent(mut self, parent: Rc<EventDispatcher<EditedEvent>>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn set_parent(&mut self, parent: Rc<EventDispatcher<EditedEvent>>) {
        self.parent = Some(parent);
    }

    /// Add a property. Duplicate names are rejected, not overwritten:
    /// silently replacing would discard subtype metadata.
    pub fn add(&mut self, prop: Prop) -> bool {
        if self.get(prop.name).is_some() {
            log::warn!("duplicate property `{}` rejected", prop.name);
            return false;
        }
        self.props.push(prop);
        true
    }

    pub fn get(&self, name: Name) -> Option<&Prop> {
        self.props.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: Name) -> Option<&mut Prop> {
        self.props.iter_mut().find(|p| p.name == name)
    }

    /// Set a property's value and notify the parent dispatcher.
    /// Returns the newly stored value.
    pub fn update_value(&mut self, name: Name, value: PropValue) -> Option<&PropValue> {
        let prop = self.props.iter_mut().find(|p| p.name == name)?;
        prop.value = value;
        if let Some(parent) = &self.parent {
            parent.emit(&EditedEvent { name });
        }
        self.props.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Prop> {
        self.props.iter()
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Tokenize the whole set, preserving order.
    pub fn tokenize(&self, slim: bool) -> Value {
        json!(self.props.iter().map(|p| p.tokenize(slim)).collect::<Vec<_>>())
    }

    /// Decode a full token array back into a set.
    pub fn de_tokenize(token: &Value) -> Result<Self, TokenError> {
        let items = token.as_array().ok_or(TokenError::BadField {
            field: "properties",
            detail: "expected an array".into(),
        })?;
        let mut set = Self::new();
        for item in items {
            set.add(Prop::de_tokenize(item)?);
        }
        Ok(set)
    }
}

impl Clone for EditableSet {
    /// Clones share the parent dispatcher; props are deep-copied.
    fn clone(&self) -> Self {
        Self {
            props: self.props.clone(),
            parent: self.parent.clone(),
        }
    }
}

impl std::fmt::Debug for EditableSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditableSet")
            .field("props", &self.props)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl PartialEq for EditableSet {
    fn eq(&self, other: &Self) -> bool {
        self.props == other.props
    }
}
