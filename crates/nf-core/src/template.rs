//! Behaviour templates and the plugin-provided registries.
//!
//! Definitions are static descriptions of a behaviour class: which portals
//! an instance starts with, which portal kinds a user may add, and which
//! plugin owns it. The registry is handed to editors explicitly — there is
//! no ambient singleton, which keeps the undo engine testable in isolation.

use crate::editable::EditableSet;
use crate::events::EventDispatcher;
use crate::model::PortalKind;
use crate::prop::{DataType, Prop};
use std::collections::HashMap;
use std::collections::HashSet;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("definition `{definition}` declares duplicate portal `{portal}`")]
    DuplicatePortal {
        definition: String,
        portal: String,
    },
}

/// One portal a definition stamps onto new instances.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalTemplate {
    pub kind: PortalKind,
    pub prop: Prop,
}

impl PortalTemplate {
    pub fn new(kind: PortalKind, prop: Prop) -> Self {
        Self { kind, prop }
    }
}

/// Static template describing a class of behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviourDefinition {
    name: String,
    portal_templates: Vec<PortalTemplate>,
    pub can_build_input: bool,
    pub can_build_output: bool,
    pub can_build_parameter: bool,
    pub can_build_product: bool,
    /// Owning plugin, for unload bookkeeping.
    pub plugin: Option<String>,
}

impl BehaviourDefinition {
    /// Build a definition, rejecting duplicate portal property names.
    pub fn new(
        name: &str,
        portal_templates: Vec<PortalTemplate>,
        can_build_input: bool,
        can_build_output: bool,
        can_build_parameter: bool,
        can_build_product: bool,
        plugin: Option<&str>,
    ) -> Result<Self, DefinitionError> {
        let mut seen = HashSet::new();
        for template in &portal_templates {
            if !seen.insert(template.prop.name) {
                return Err(DefinitionError::DuplicatePortal {
                    definition: name.to_string(),
                    portal: template.prop.name.as_str().to_string(),
                });
            }
        }
        Ok(Self {
            name: name.to_string(),
            portal_templates,
            can_build_input,
            can_build_output,
            can_build_parameter,
            can_build_product,
            plugin: plugin.map(str::to_string),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn portal_templates(&self) -> &[PortalTemplate] {
        &self.portal_templates
    }

    /// Build the editable property set a fresh instance starts with:
    /// one property per parameter portal.
    pub fn create_properties(&self) -> EditableSet {
        let mut set = EditableSet::new();
        for template in &self.portal_templates {
            if template.kind == PortalKind::Parameter {
                set.add(template.prop.clone());
            }
        }
        set
    }
}

/// A class of asset resources: its name and the property template new
/// assets of this class start from.
#[derive(Debug, Clone)]
pub struct AssetClass {
    pub name: String,
    pub plugin: Option<String>,
    property_templates: Vec<Prop>,
}

impl AssetClass {
    pub fn new(name: &str, plugin: Option<&str>, property_templates: Vec<Prop>) -> Self {
        Self {
            name: name.to_string(),
            plugin: plugin.map(str::to_string),
            property_templates,
        }
    }

    pub fn build_properties(&self) -> EditableSet {
        let mut set = EditableSet::new();
        for prop in &self.property_templates {
            set.add(prop.clone());
        }
        set
    }
}

// ─── Registry ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum TemplateEvent {
    Created(String),
    Removed(String),
}

/// Name-keyed behaviour definitions and asset classes.
///
/// Injected into editors and projects; plugins register on load and
/// unregister on unload, and the events let open tree views refresh.
#[derive(Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, BehaviourDefinition>,
    asset_classes: HashMap<String, AssetClass>,
    /// Data-type conversions plugins have registered for linking.
    pub converters: TypeConverters,
    pub events: Rc<EventDispatcher<TemplateEvent>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_template(&mut self, definition: BehaviourDefinition) {
        let name = definition.name().to_string();
        self.templates.insert(name.clone(), definition);
        self.events.emit(&TemplateEvent::Created(name));
    }

    pub fn unregister_template(&mut self, name: &str) -> bool {
        let removed = self.templates.remove(name).is_some();
        if removed {
            self.events.emit(&TemplateEvent::Removed(name.to_string()));
        }
        removed
    }

    pub fn get_template(&self, name: &str) -> Option<&BehaviourDefinition> {
        self.templates.get(name)
    }

    pub fn register_asset_class(&mut self, class: AssetClass) {
        self.asset_classes.insert(class.name.clone(), class);
    }

    pub fn get_asset_class(&self, name: &str) -> Option<&AssetClass> {
        self.asset_classes.get(name)
    }
}

// ─── Type conversion ─────────────────────────────────────────────────────

/// Registered data-type conversions consulted by link validation.
///
/// Identical types always convert; anything else needs a registered pair.
#[derive(Debug, Default)]
pub struct TypeConverters {
    pairs: HashSet<(DataType, DataType)>,
}

impl TypeConverters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, from: DataType, to: DataType) {
        self.pairs.insert((from, to));
    }

    pub fn can_convert(&self, from: DataType, to: DataType) -> bool {
        from == to || self.pairs.contains(&(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_portal_names_are_rejected() {
        let err = BehaviourDefinition::new(
            "Oscillator",
            vec![
                PortalTemplate::new(PortalKind::Input, Prop::string("Value", "")),
                PortalTemplate::new(PortalKind::Output, Prop::string("Value", "")),
            ],
            true,
            true,
            false,
            false,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicatePortal { portal, .. } if portal == "Value"));
    }

    #[test]
    fn create_properties_takes_parameter_templates() {
        let def = BehaviourDefinition::new(
            "Mixer",
            vec![
                PortalTemplate::new(PortalKind::Parameter, Prop::num("gain", 1.0, 0.0, 2.0, 2, 0.1)),
                PortalTemplate::new(PortalKind::Input, Prop::string("in", "")),
            ],
            false,
            false,
            true,
            false,
            Some("audio"),
        )
        .unwrap();

        let props = def.create_properties();
        assert_eq!(props.len(), 1);
        assert!(props.get(crate::id::Name::intern("gain")).is_some());
    }

    #[test]
    fn registry_emits_template_events() {
        use std::cell::RefCell;

        let mut registry = TemplateRegistry::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        registry.events.on(move |ev: &TemplateEvent| {
            s.borrow_mut().push(match ev {
                TemplateEvent::Created(n) => format!("+{n}"),
                TemplateEvent::Removed(n) => format!("-{n}"),
            });
        });

        let def =
            BehaviourDefinition::new("Timer", vec![], true, true, false, false, None).unwrap();
        registry.register_template(def);
        assert!(registry.get_template("Timer").is_some());
        assert!(registry.unregister_template("Timer"));
        assert!(!registry.unregister_template("Timer"));
        assert_eq!(*seen.borrow(), vec!["+Timer", "-Timer"]);
    }

    #[test]
    fn identical_types_always_convert() {
        let converters = TypeConverters::new();
        assert!(converters.can_convert(DataType::Number, DataType::Number));
        assert!(!converters.can_convert(DataType::Number, DataType::Bool));
    }
}
