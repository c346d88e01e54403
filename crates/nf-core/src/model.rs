//! Canvas item model.
//!
//! A container's canvas holds behaviours (typed nodes with portals),
//! comments, and links (edges between portals). Items carry a stable
//! `ItemId` assigned at creation by the owning [`Container`]; ordinal
//! positions exist only on the wire and are recomputed at every serialize.
//!
//! [`Container`]: crate::container::Container

use crate::editable::EditableSet;
use crate::id::Name;
use crate::prop::{DataType, Prop};
use crate::template::{BehaviourDefinition, TypeConverters};
use smallvec::SmallVec;
use thiserror::Error;

/// Stable identity of a canvas item, independent of array position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

/// Errors raised when building or validating portals and links.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("behaviour already has a portal named `{0}`")]
    DuplicatePortal(String),
    #[error("no portal named `{0}` on this behaviour")]
    NoSuchPortal(String),
    #[error("link origin must be an output or product portal")]
    BadOrigin,
    #[error("link destination must be an input or parameter portal")]
    BadDestination,
    #[error("a link cannot connect a behaviour to itself")]
    SameBehaviour,
    #[error("portal data types are incompatible: {from} -> {to}")]
    IncompatibleTypes { from: &'static str, to: &'static str },
    #[error("item is not a behaviour")]
    NotABehaviour,
}

// ─── Portals ─────────────────────────────────────────────────────────────

/// Connection point direction on a behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortalKind {
    Input,
    Output,
    Parameter,
    Product,
}

impl PortalKind {
    /// Origins start links; destinations terminate them.
    pub fn is_origin(&self) -> bool {
        matches!(self, PortalKind::Output | PortalKind::Product)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            PortalKind::Input => "input",
            PortalKind::Output => "output",
            PortalKind::Parameter => "parameter",
            PortalKind::Product => "product",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "input" => Some(PortalKind::Input),
            "output" => Some(PortalKind::Output),
            "parameter" => Some(PortalKind::Parameter),
            "product" => Some(PortalKind::Product),
            _ => None,
        }
    }
}

/// A typed connection point on a behaviour. The portal's property carries
/// its name and data type; `links` lists the link items attached here.
#[derive(Debug, Clone, PartialEq)]
pub struct Portal {
    pub kind: PortalKind,
    pub prop: Prop,
    pub links: SmallVec<[ItemId; 2]>,
}

impl Portal {
    pub fn new(kind: PortalKind, prop: Prop) -> Self {
        Self {
            kind,
            prop,
            links: SmallVec::new(),
        }
    }

    pub fn name(&self) -> Name {
        self.prop.name
    }

    pub fn data_type(&self) -> DataType {
        self.prop.data_type()
    }
}

/// Validate a proposed link from `origin` to `dest`.
///
/// Rules: origin must be an output/product, destination an
/// input/parameter, the two portals must sit on different behaviours, and
/// the data types must be identical or convertible.
pub fn check_portal_link(
    origin_item: ItemId,
    origin: &Portal,
    dest_item: ItemId,
    dest: &Portal,
    converters: &TypeConverters,
) -> Result<(), LinkError> {
    if !origin.kind.is_origin() {
        return Err(LinkError::BadOrigin);
    }
    if dest.kind.is_origin() {
        return Err(LinkError::BadDestination);
    }
    if origin_item == dest_item {
        return Err(LinkError::SameBehaviour);
    }
    if !converters.can_convert(origin.data_type(), dest.data_type()) {
        return Err(LinkError::IncompatibleTypes {
            from: origin.data_type().tag(),
            to: dest.data_type().tag(),
        });
    }
    Ok(())
}

// ─── Behaviours ──────────────────────────────────────────────────────────

/// A node in the graph: one unit of executable logic instantiated from a
/// [`BehaviourDefinition`] template.
#[derive(Debug, Clone, PartialEq)]
pub struct Behaviour {
    pub alias: String,
    pub behaviour_type: String,
    /// Name of the definition this was instantiated from, when known.
    pub template: Option<String>,
    portals: Vec<Portal>,
    pub properties: EditableSet,
}

impl Behaviour {
    pub fn new(alias: &str, behaviour_type: &str) -> Self {
        Self {
            alias: alias.to_string(),
            behaviour_type: behaviour_type.to_string(),
            template: None,
            portals: Vec::new(),
            properties: EditableSet::new(),
        }
    }

    /// Instantiate from a definition: portals come from the portal
    /// templates, properties from the parameter templates.
    pub fn from_definition(alias: &str, definition: &BehaviourDefinition) -> Self {
        let mut behaviour = Self::new(alias, definition.name());
        behaviour.template = Some(definition.name().to_string());
        for template in definition.portal_templates() {
            // Template names are unique by construction, so this cannot fail.
            let _ = behaviour.add_portal(template.kind, template.prop.clone());
        }
        behaviour.properties = definition.create_properties();
        behaviour
    }

    /// Add a portal. Names must be unique among siblings.
    pub fn add_portal(&mut self, kind: PortalKind, prop: Prop) -> Result<&mut Portal, LinkError> {
        if self.portals.iter().any(|p| p.name() == prop.name) {
            return Err(LinkError::DuplicatePortal(prop.name.as_str().to_string()));
        }
        self.portals.push(Portal::new(kind, prop));
        Ok(self.portals.last_mut().unwrap())
    }

    /// Detach and return a portal. Link cleanup is the owning container's
    /// job — it cascades removal of every link attached here.
    pub fn remove_portal(&mut self, name: Name) -> Option<Portal> {
        let pos = self.portals.iter().position(|p| p.name() == name)?;
        Some(self.portals.remove(pos))
    }

    pub fn portal(&self, name: Name) -> Option<&Portal> {
        self.portals.iter().find(|p| p.name() == name)
    }

    pub fn portal_mut(&mut self, name: Name) -> Option<&mut Portal> {
        self.portals.iter_mut().find(|p| p.name() == name)
    }

    /// All portals, in add order.
    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    pub fn portals_mut(&mut self) -> &mut [Portal] {
        &mut self.portals
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Portal> {
        self.portals.iter().filter(|p| p.kind == PortalKind::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Portal> {
        self.portals.iter().filter(|p| p.kind == PortalKind::Output)
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Portal> {
        self.portals
            .iter()
            .filter(|p| p.kind == PortalKind::Parameter)
    }

    pub fn products(&self) -> impl Iterator<Item = &Portal> {
        self.portals
            .iter()
            .filter(|p| p.kind == PortalKind::Product)
    }
}

// ─── Comments ────────────────────────────────────────────────────────────

/// Free-text annotation on the canvas. Size lives on the item frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub label: String,
}

// ─── Links ───────────────────────────────────────────────────────────────

/// A resolved link endpoint: a portal on a live item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkEnd {
    pub item: ItemId,
    pub portal: Name,
}

/// A directed edge between two portals on different behaviours.
///
/// Endpoints are `None` between deserialization pass one and the link
/// resolution pass; a link that cannot resolve both ends is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub start: Option<LinkEnd>,
    pub end: Option<LinkEnd>,
    /// Polyline for rendering, in canvas coordinates.
    pub points: SmallVec<[(f64, f64); 4]>,
    pub properties: EditableSet,
}

impl Link {
    pub fn new() -> Self {
        let mut properties = EditableSet::new();
        properties.add(Prop::num("frame-delay", 1.0, 0.0, 1000.0, 0, 1.0));
        Self {
            start: None,
            end: None,
            points: SmallVec::new(),
            properties,
        }
    }

    pub fn frame_delay(&self) -> f64 {
        self.properties
            .get(Name::intern("frame-delay"))
            .and_then(|p| p.num_value())
            .unwrap_or(1.0)
    }

    pub fn is_resolved(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Canvas items ────────────────────────────────────────────────────────

/// The item kinds a container can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Behaviour(Behaviour),
    /// A behaviour wrapping a project resource reference (by shallow id).
    Asset {
        behaviour: Behaviour,
        resource: Option<u32>,
    },
    /// A container-level portal exposed to parent graphs.
    Portal {
        behaviour: Behaviour,
        portal_kind: PortalKind,
        prop: Prop,
    },
    Comment(Comment),
    Link(Link),
}

impl ItemKind {
    /// Wire discriminator for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            ItemKind::Behaviour(_) => "behaviour",
            ItemKind::Asset { .. } => "asset",
            ItemKind::Portal { .. } => "portal",
            ItemKind::Comment(_) => "comment",
            ItemKind::Link(_) => "link",
        }
    }
}

/// One item on the canvas: layout frame, selection flag, and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasItem {
    pub id: ItemId,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub selected: bool,
    pub kind: ItemKind,
}

impl CanvasItem {
    pub fn new(id: ItemId, kind: ItemKind) -> Self {
        Self {
            id,
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            selected: false,
            kind,
        }
    }

    pub fn at(mut self, left: f64, top: f64) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// The behaviour payload, for the three behaviour-shaped kinds.
    pub fn behaviour(&self) -> Option<&Behaviour> {
        match &self.kind {
            ItemKind::Behaviour(b)
            | ItemKind::Asset { behaviour: b, .. }
            | ItemKind::Portal { behaviour: b, .. } => Some(b),
            _ => None,
        }
    }

    pub fn behaviour_mut(&mut self) -> Option<&mut Behaviour> {
        match &mut self.kind {
            ItemKind::Behaviour(b)
            | ItemKind::Asset { behaviour: b, .. }
            | ItemKind::Portal { behaviour: b, .. } => Some(b),
            _ => None,
        }
    }

    pub fn link(&self) -> Option<&Link> {
        match &self.kind {
            ItemKind::Link(l) => Some(l),
            _ => None,
        }
    }

    pub fn link_mut(&mut self) -> Option<&mut Link> {
        match &mut self.kind {
            ItemKind::Link(l) => Some(l),
            _ => None,
        }
    }

    pub fn comment(&self) -> Option<&Comment> {
        match &self.kind {
            ItemKind::Comment(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TypeConverters;

    fn portal(kind: PortalKind, name: &str) -> Portal {
        Portal::new(kind, Prop::num(name, 0.0, -f64::MAX, f64::MAX, 0, 1.0))
    }

    #[test]
    fn add_portal_rejects_duplicates() {
        let mut b = Behaviour::new("b", "Test");
        b.add_portal(PortalKind::Input, Prop::string("Value", ""))
            .unwrap();
        let err = b
            .add_portal(PortalKind::Output, Prop::string("Value", ""))
            .unwrap_err();
        assert_eq!(err, LinkError::DuplicatePortal("Value".into()));
    }

    #[test]
    fn portal_views_filter_by_kind() {
        let mut b = Behaviour::new("b", "Test");
        b.add_portal(PortalKind::Input, Prop::string("in", "")).unwrap();
        b.add_portal(PortalKind::Output, Prop::string("out", "")).unwrap();
        b.add_portal(PortalKind::Parameter, Prop::string("par", "")).unwrap();
        b.add_portal(PortalKind::Product, Prop::string("pro", "")).unwrap();

        assert_eq!(b.portals().len(), 4);
        assert_eq!(b.inputs().count(), 1);
        assert_eq!(b.outputs().count(), 1);
        assert_eq!(b.parameters().count(), 1);
        assert_eq!(b.products().count(), 1);
    }

    #[test]
    fn link_validation_rules() {
        let converters = TypeConverters::default();
        let a = ItemId(1);
        let b = ItemId(2);
        let out = portal(PortalKind::Output, "Out");
        let inp = portal(PortalKind::Input, "In");

        assert!(check_portal_link(a, &out, b, &inp, &converters).is_ok());
        assert_eq!(
            check_portal_link(a, &inp, b, &inp, &converters),
            Err(LinkError::BadOrigin)
        );
        assert_eq!(
            check_portal_link(a, &out, b, &out, &converters),
            Err(LinkError::BadDestination)
        );
        assert_eq!(
            check_portal_link(a, &out, a, &inp, &converters),
            Err(LinkError::SameBehaviour)
        );
    }

    #[test]
    fn link_type_compatibility_uses_converters() {
        let a = ItemId(1);
        let b = ItemId(2);
        let out = Portal::new(PortalKind::Output, Prop::num("Out", 0.0, 0.0, 1.0, 0, 1.0));
        let inp = Portal::new(PortalKind::Input, Prop::string("In", ""));

        let strict = TypeConverters::default();
        assert!(matches!(
            check_portal_link(a, &out, b, &inp, &strict),
            Err(LinkError::IncompatibleTypes { .. })
        ));

        let mut lenient = TypeConverters::default();
        lenient.register(DataType::Number, DataType::String);
        assert!(check_portal_link(a, &out, b, &inp, &lenient).is_ok());
    }

    #[test]
    fn new_link_carries_frame_delay() {
        let link = Link::new();
        assert_eq!(link.frame_delay(), 1.0);
        assert!(!link.is_resolved());
    }
}
