//! Lint diagnostics for containers.
//!
//! Reports structural issues without modifying the graph. Results feed
//! the problems panel in the host UI.

use nf_core::container::Container;
use nf_core::model::{CanvasItem, ItemId};
use std::collections::HashMap;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Should be fixed — likely a mistake.
    Warning,
    /// Informational — style suggestion.
    Info,
}

/// A single lint diagnostic for a canvas item.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    /// The item this diagnostic refers to.
    pub item: ItemId,
    /// Human-readable message.
    pub message: String,
    /// Severity level.
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "duplicate-alias").
    pub rule: &'static str,
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Run all lint rules over the container and return diagnostics.
#[must_use]
pub fn lint_container(container: &Container) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_duplicate_aliases(container, &mut diags);
    lint_disconnected_behaviours(container, &mut diags);
    lint_dangling_links(container, &mut diags);
    diags
}

// ─── Rules ───────────────────────────────────────────────────────────────

/// Warn when two behaviours share an alias — scripts address behaviours
/// by alias, so duplicates are ambiguous at runtime.
fn lint_duplicate_aliases(container: &Container, diags: &mut Vec<LintDiagnostic>) {
    let mut seen: HashMap<&str, ItemId> = HashMap::new();
    for item in container.items() {
        let Some(behaviour) = item.behaviour() else {
            continue;
        };
        if behaviour.alias.is_empty() {
            continue;
        }
        if seen.contains_key(behaviour.alias.as_str()) {
            diags.push(LintDiagnostic {
                item: item.id,
                message: format!("Duplicate behaviour alias `{}`.", behaviour.alias),
                severity: LintSeverity::Warning,
                rule: "duplicate-alias",
            });
        } else {
            seen.insert(behaviour.alias.as_str(), item.id);
        }
    }
}

/// Note behaviours with portals but no links at all — usually a node the
/// user forgot to wire up.
fn lint_disconnected_behaviours(container: &Container, diags: &mut Vec<LintDiagnostic>) {
    for item in container.items() {
        let Some(behaviour) = item.behaviour() else {
            continue;
        };
        let has_portals = !behaviour.portals().is_empty();
        let has_links = behaviour.portals().iter().any(|p| !p.links.is_empty());
        if has_portals && !has_links {
            diags.push(LintDiagnostic {
                item: item.id,
                message: format!(
                    "Behaviour `{}` has no connections.",
                    display_alias(behaviour.alias.as_str())
                ),
                severity: LintSeverity::Info,
                rule: "disconnected-behaviour",
            });
        }
    }
}

/// Warn when a portal's link list references an id that is not a live
/// link item — broken bookkeeping that would confuse hit-testing.
fn lint_dangling_links(container: &Container, diags: &mut Vec<LintDiagnostic>) {
    for item in container.items() {
        let Some(behaviour) = item.behaviour() else {
            continue;
        };
        for portal in behaviour.portals() {
            for &link_id in &portal.links {
                let live = container.get(link_id).and_then(CanvasItem::link).is_some();
                if !live {
                    diags.push(LintDiagnostic {
                        item: item.id,
                        message: format!(
                            "Portal `{}` references a link that no longer exists.",
                            portal.name()
                        ),
                        severity: LintSeverity::Warning,
                        rule: "dangling-link",
                    });
                }
            }
        }
    }
}

fn display_alias(alias: &str) -> &str {
    if alias.is_empty() { "(unnamed)" } else { alias }
}
