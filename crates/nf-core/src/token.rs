//! Persisted workspace format.
//!
//! The wire contract of a container: `{ items: [...], properties: [...] }`
//! with a `type` discriminator per item. Items are identified by ordinal —
//! their position in the array, recomputed at every emit — and links store
//! their endpoints as behaviour-ordinal + portal-name pairs. Decoding is
//! two-pass: first every item is constructed, then link endpoints are
//! resolved against the finished arena; a link that cannot resolve both
//! ends is dropped and reported.

use crate::container::Container;
use crate::editable::EditableSet;
use crate::id::Name;
use crate::model::{
    Behaviour, CanvasItem, Comment, ItemId, ItemKind, Link, LinkEnd, PortalKind,
};
use crate::prop::{Prop, TokenError};
use crate::template::TemplateRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── Token types ─────────────────────────────────────────────────────────

/// One portal on a behaviour token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortalToken {
    /// Portal kind tag: `input` | `output` | `parameter` | `product`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Full property token; carries the portal's name and data type.
    pub property: Value,
}

/// A serialized canvas item, tag-discriminated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ItemToken {
    #[serde(rename = "behaviour", rename_all = "camelCase")]
    Behaviour {
        id: usize,
        left: f64,
        top: f64,
        alias: String,
        behaviour_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        template: Option<String>,
        portals: Vec<PortalToken>,
        properties: Value,
    },
    #[serde(rename = "asset", rename_all = "camelCase")]
    Asset {
        id: usize,
        left: f64,
        top: f64,
        alias: String,
        behaviour_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        asset_id: Option<u32>,
        portals: Vec<PortalToken>,
        properties: Value,
    },
    #[serde(rename = "portal", rename_all = "camelCase")]
    Portal {
        id: usize,
        left: f64,
        top: f64,
        alias: String,
        portal_type: String,
        property: Value,
    },
    #[serde(rename = "comment", rename_all = "camelCase")]
    Comment {
        id: usize,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        label: String,
    },
    #[serde(rename = "link", rename_all = "camelCase")]
    Link {
        id: usize,
        start_behaviour: usize,
        start_portal: String,
        end_behaviour: usize,
        end_portal: String,
        frame_delay: f64,
        points: Vec<(f64, f64)>,
    },
}

/// A complete persisted workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceToken {
    pub items: Vec<ItemToken>,
    pub properties: Value,
}

impl WorkspaceToken {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("workspace tokens are always representable")
    }

    pub fn from_value(value: &Value) -> Result<Self, TokenError> {
        serde_json::from_value(value.clone()).map_err(|e| TokenError::BadField {
            field: "workspace",
            detail: e.to_string(),
        })
    }
}

/// What `parse_workspace` had to discard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub dropped_links: usize,
}

// ─── Emit ────────────────────────────────────────────────────────────────

/// Serialize a container. Items are renumbered by position; link
/// endpoints are emitted as the current ordinals of their behaviours.
pub fn emit_workspace(container: &Container) -> WorkspaceToken {
    let items = container
        .items()
        .iter()
        .enumerate()
        .map(|(ordinal, item)| emit_item(container, item, ordinal))
        .collect();
    WorkspaceToken {
        items,
        properties: container.properties.tokenize(false),
    }
}

fn emit_item(container: &Container, item: &CanvasItem, ordinal: usize) -> ItemToken {
    match &item.kind {
        ItemKind::Behaviour(behaviour) => ItemToken::Behaviour {
            id: ordinal,
            left: item.left,
            top: item.top,
            alias: behaviour.alias.clone(),
            behaviour_type: behaviour.behaviour_type.clone(),
            template: behaviour.template.clone(),
            portals: emit_portals(behaviour),
            properties: behaviour.properties.tokenize(false),
        },
        ItemKind::Asset {
            behaviour,
            resource,
        } => ItemToken::Asset {
            id: ordinal,
            left: item.left,
            top: item.top,
            alias: behaviour.alias.clone(),
            behaviour_type: behaviour.behaviour_type.clone(),
            asset_id: *resource,
            portals: emit_portals(behaviour),
            properties: behaviour.properties.tokenize(false),
        },
        ItemKind::Portal {
            behaviour,
            portal_kind,
            prop,
        } => ItemToken::Portal {
            id: ordinal,
            left: item.left,
            top: item.top,
            alias: behaviour.alias.clone(),
            portal_type: portal_kind.tag().to_string(),
            property: prop.tokenize(false),
        },
        ItemKind::Comment(comment) => ItemToken::Comment {
            id: ordinal,
            left: item.left,
            top: item.top,
            width: item.width,
            height: item.height,
            label: comment.label.clone(),
        },
        ItemKind::Link(link) => {
            // Emitting an unresolved link would produce garbage ordinals;
            // resolution drops those at decode time, so both ends exist here.
            let (start, end) = link
                .start
                .zip(link.end)
                .expect("only resolved links are kept in a container");
            ItemToken::Link {
                id: ordinal,
                start_behaviour: container.index_of(start.item).unwrap_or(usize::MAX),
                start_portal: start.portal.as_str().to_string(),
                end_behaviour: container.index_of(end.item).unwrap_or(usize::MAX),
                end_portal: end.portal.as_str().to_string(),
                frame_delay: link.frame_delay(),
                points: link.points.iter().copied().collect(),
            }
        }
    }
}

fn emit_portals(behaviour: &Behaviour) -> Vec<PortalToken> {
    behaviour
        .portals()
        .iter()
        .map(|portal| PortalToken {
            kind: portal.kind.tag().to_string(),
            property: portal.prop.tokenize(false),
        })
        .collect()
}

// ─── Parse ───────────────────────────────────────────────────────────────

/// Decode a workspace into a fresh container.
///
/// Pass one constructs every item and records the wire-ordinal → live-id
/// map; pass two resolves link endpoints through that map. Links that
/// cannot resolve both ends are dropped with a warning and counted in the
/// report. Unknown behaviour templates are tolerated — the token's own
/// portal list is authoritative — but logged.
pub fn parse_workspace(
    token: &WorkspaceToken,
    registry: &TemplateRegistry,
) -> Result<(Container, DecodeReport), TokenError> {
    let mut container = Container::new();
    container.properties = EditableSet::de_tokenize(&token.properties)?;

    // Pass one: construct items, remembering ordinals and pending links.
    let mut by_ordinal: Vec<(usize, ItemId)> = Vec::new();
    let mut pending_links: Vec<(ItemId, usize, Name, usize, Name)> = Vec::new();

    for item_token in &token.items {
        match item_token {
            ItemToken::Behaviour {
                id,
                left,
                top,
                alias,
                behaviour_type,
                template,
                portals,
                properties,
            } => {
                let behaviour = parse_behaviour(
                    alias,
                    behaviour_type,
                    template.as_deref(),
                    portals,
                    properties,
                    registry,
                )?;
                let live = container.insert_at(ItemKind::Behaviour(behaviour), *left, *top);
                by_ordinal.push((*id, live));
            }
            ItemToken::Asset {
                id,
                left,
                top,
                alias,
                behaviour_type,
                asset_id,
                portals,
                properties,
            } => {
                let behaviour =
                    parse_behaviour(alias, behaviour_type, None, portals, properties, registry)?;
                let live = container.insert_at(
                    ItemKind::Asset {
                        behaviour,
                        resource: *asset_id,
                    },
                    *left,
                    *top,
                );
                by_ordinal.push((*id, live));
            }
            ItemToken::Portal {
                id,
                left,
                top,
                alias,
                portal_type,
                property,
            } => {
                let kind =
                    PortalKind::from_tag(portal_type).ok_or(TokenError::BadField {
                        field: "portalType",
                        detail: format!("unknown portal kind `{portal_type}`"),
                    })?;
                let prop = Prop::de_tokenize(property)?;
                let mut behaviour = Behaviour::new(alias, "Portal");
                behaviour.add_portal(kind, prop.clone()).map_err(|e| {
                    TokenError::BadField {
                        field: "property",
                        detail: e.to_string(),
                    }
                })?;
                let live = container.insert_at(
                    ItemKind::Portal {
                        behaviour,
                        portal_kind: kind,
                        prop,
                    },
                    *left,
                    *top,
                );
                by_ordinal.push((*id, live));
            }
            ItemToken::Comment {
                id,
                left,
                top,
                width,
                height,
                label,
            } => {
                let live =
                    container.insert_at(ItemKind::Comment(Comment { label: label.clone() }), *left, *top);
                let item = container.get_mut(live).unwrap();
                item.width = *width;
                item.height = *height;
                by_ordinal.push((*id, live));
            }
            ItemToken::Link {
                id,
                start_behaviour,
                start_portal,
                end_behaviour,
                end_portal,
                frame_delay,
                points,
            } => {
                let mut link = Link::new();
                link.points = points.iter().copied().collect();
                let _ = link.properties.update_value(
                    Name::intern("frame-delay"),
                    crate::prop::PropValue::Num {
                        value: *frame_delay,
                        min: 0.0,
                        max: 1000.0,
                        decimals: 0,
                        interval: 1.0,
                    },
                );
                let live = container.insert(ItemKind::Link(link));
                by_ordinal.push((*id, live));
                pending_links.push((
                    live,
                    *start_behaviour,
                    Name::intern(start_portal),
                    *end_behaviour,
                    Name::intern(end_portal),
                ));
            }
        }
    }

    // Pass two: resolve link endpoints now that every item exists.
    let mut report = DecodeReport::default();
    for (link_id, start_ord, start_portal, end_ord, end_portal) in pending_links {
        let start = resolve_end(&container, &by_ordinal, start_ord, start_portal);
        let end = resolve_end(&container, &by_ordinal, end_ord, end_portal);
        match start.zip(end) {
            Some((start, end)) => {
                let link = container.get_mut(link_id).and_then(CanvasItem::link_mut).unwrap();
                link.start = Some(start);
                link.end = Some(end);
                container.connect_link(link_id);
            }
            None => {
                log::warn!(
                    "dropping link {start_ord}:{start_portal} -> {end_ord}:{end_portal}: unresolved endpoint"
                );
                container.remove_items(&[link_id]);
                report.dropped_links += 1;
            }
        }
    }

    Ok((container, report))
}

fn parse_behaviour(
    alias: &str,
    behaviour_type: &str,
    template: Option<&str>,
    portals: &[PortalToken],
    properties: &Value,
    registry: &TemplateRegistry,
) -> Result<Behaviour, TokenError> {
    if let Some(template) = template
        && registry.get_template(template).is_none()
    {
        log::warn!("behaviour `{alias}` references unknown template `{template}`");
    }
    let mut behaviour = Behaviour::new(alias, behaviour_type);
    behaviour.template = template.map(str::to_string);
    for portal_token in portals {
        let kind = PortalKind::from_tag(&portal_token.kind).ok_or(TokenError::BadField {
            field: "type",
            detail: format!("unknown portal kind `{}`", portal_token.kind),
        })?;
        let prop = Prop::de_tokenize(&portal_token.property)?;
        behaviour.add_portal(kind, prop).map_err(|e| TokenError::BadField {
            field: "portals",
            detail: e.to_string(),
        })?;
    }
    behaviour.properties = EditableSet::de_tokenize(properties)?;
    Ok(behaviour)
}

fn resolve_end(
    container: &Container,
    by_ordinal: &[(usize, ItemId)],
    ordinal: usize,
    portal: Name,
) -> Option<LinkEnd> {
    let (_, item) = by_ordinal.iter().find(|(ord, _)| *ord == ordinal)?;
    let behaviour = container.get(*item)?.behaviour()?;
    behaviour.portal(portal)?;
    Some(LinkEnd {
        item: *item,
        portal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn behaviour_token(id: usize, portal_kind: &str, portal_name: &str) -> ItemToken {
        ItemToken::Behaviour {
            id,
            left: 10.0 * id as f64,
            top: 5.0,
            alias: format!("b{id}"),
            behaviour_type: "Test".into(),
            template: None,
            portals: vec![PortalToken {
                kind: portal_kind.into(),
                property: Prop::string(portal_name, "").tokenize(false),
            }],
            properties: json!([]),
        }
    }

    fn link_token(id: usize, start: usize, end: usize) -> ItemToken {
        ItemToken::Link {
            id,
            start_behaviour: start,
            start_portal: "Out".into(),
            end_behaviour: end,
            end_portal: "In".into(),
            frame_delay: 2.0,
            points: vec![(0.0, 0.0), (20.0, 10.0)],
        }
    }

    fn workspace(items: Vec<ItemToken>) -> WorkspaceToken {
        WorkspaceToken {
            items,
            properties: json!([]),
        }
    }

    #[test]
    fn links_resolve_to_live_portals() {
        let registry = TemplateRegistry::new();
        let token = workspace(vec![
            behaviour_token(0, "output", "Out"),
            behaviour_token(1, "input", "In"),
            link_token(2, 0, 1),
        ]);

        let (container, report) = parse_workspace(&token, &registry).unwrap();
        assert_eq!(report.dropped_links, 0);
        assert_eq!(container.len(), 3);

        let link_item = container
            .items()
            .iter()
            .find(|i| i.link().is_some())
            .unwrap();
        let link = link_item.link().unwrap();
        assert!(link.is_resolved());
        assert_eq!(link.frame_delay(), 2.0);

        // Both endpoint behaviours list the link on their portals.
        let start = link.start.unwrap();
        let portal = container
            .get(start.item)
            .unwrap()
            .behaviour()
            .unwrap()
            .portal(start.portal)
            .unwrap();
        assert_eq!(portal.links.as_slice(), &[link_item.id]);
    }

    #[test]
    fn unresolvable_link_is_dropped_with_report() {
        let registry = TemplateRegistry::new();
        let token = workspace(vec![
            behaviour_token(0, "output", "Out"),
            behaviour_token(1, "input", "In"),
            link_token(2, 7, 1), // ordinal 7 does not exist
        ]);

        let (container, report) = parse_workspace(&token, &registry).unwrap();
        assert_eq!(report.dropped_links, 1);
        assert_eq!(container.len(), 2);
        assert!(container.items().iter().all(|i| i.link().is_none()));
    }

    #[test]
    fn link_to_missing_portal_is_dropped() {
        let registry = TemplateRegistry::new();
        let token = workspace(vec![
            behaviour_token(0, "output", "Elsewhere"),
            behaviour_token(1, "input", "In"),
            link_token(2, 0, 1),
        ]);

        let (_, report) = parse_workspace(&token, &registry).unwrap();
        assert_eq!(report.dropped_links, 1);
    }

    #[test]
    fn emit_renumbers_by_position() {
        let registry = TemplateRegistry::new();
        let token = workspace(vec![
            behaviour_token(4, "output", "Out"),
            behaviour_token(9, "input", "In"),
            link_token(12, 4, 9),
        ]);
        let (container, _) = parse_workspace(&token, &registry).unwrap();

        let emitted = emit_workspace(&container);
        let ids: Vec<usize> = emitted
            .items
            .iter()
            .map(|t| match t {
                ItemToken::Behaviour { id, .. }
                | ItemToken::Asset { id, .. }
                | ItemToken::Portal { id, .. }
                | ItemToken::Comment { id, .. }
                | ItemToken::Link { id, .. } => *id,
            })
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);

        match &emitted.items[2] {
            ItemToken::Link {
                start_behaviour,
                end_behaviour,
                ..
            } => {
                assert_eq!(*start_behaviour, 0);
                assert_eq!(*end_behaviour, 1);
            }
            _ => panic!("expected link token"),
        }
    }

    #[test]
    fn workspace_roundtrips_through_json_value() {
        let registry = TemplateRegistry::new();
        let token = workspace(vec![
            behaviour_token(0, "output", "Out"),
            ItemToken::Comment {
                id: 1,
                left: 3.0,
                top: 4.0,
                width: 120.0,
                height: 40.0,
                label: "note".into(),
            },
        ]);
        let (container, _) = parse_workspace(&token, &registry).unwrap();

        let emitted = emit_workspace(&container);
        let value = emitted.to_value();
        assert_eq!(value["items"][1]["type"], json!("comment"));
        assert_eq!(WorkspaceToken::from_value(&value).unwrap(), emitted);
    }

    #[test]
    fn emit_parse_emit_is_stable() {
        let registry = TemplateRegistry::new();
        let token = workspace(vec![
            behaviour_token(0, "output", "Out"),
            behaviour_token(1, "input", "In"),
            link_token(2, 0, 1),
        ]);
        let (container, _) = parse_workspace(&token, &registry).unwrap();
        let first = emit_workspace(&container);
        let (container2, _) = parse_workspace(&first, &registry).unwrap();
        let second = emit_workspace(&container2);
        assert_eq!(first, second);
    }
}
