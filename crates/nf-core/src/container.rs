//! The container item arena.
//!
//! Owns every canvas item of one open graph plus the selection. Items are
//! stored in insertion order (which is z-order and wire order); identity
//! is the stable `ItemId`, never the array position. All mutation in
//! well-behaved code flows through editor actions — the arena itself only
//! provides the primitive, invariant-preserving operations.

use crate::editable::EditableSet;
use crate::model::{CanvasItem, ItemId, ItemKind};

/// An item removed from the arena together with the position it held,
/// so undo can reinsert it exactly where it was.
pub type RemovedItem = (usize, CanvasItem);

#[derive(Debug, Default)]
pub struct Container {
    items: Vec<CanvasItem>,
    selection: Vec<ItemId>,
    /// Graph-level properties shown when nothing is selected.
    pub properties: EditableSet,
    next_id: u32,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Lookup ──────────────────────────────────────────────────────────

    pub fn items(&self) -> &[CanvasItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.iter().any(|i| i.id == id)
    }

    pub fn get(&self, id: ItemId) -> Option<&CanvasItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut CanvasItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Current position of an item — wire ordinal at serialize time.
    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    pub fn id_at(&self, index: usize) -> Option<ItemId> {
        self.items.get(index).map(|i| i.id)
    }

    // ─── Insertion ───────────────────────────────────────────────────────

    /// Add a new item, assigning the next stable id.
    pub fn insert(&mut self, kind: ItemKind) -> ItemId {
        let id = self.fresh_id();
        self.items.push(CanvasItem::new(id, kind));
        id
    }

    /// Add a new item with an explicit frame.
    pub fn insert_at(&mut self, kind: ItemKind, left: f64, top: f64) -> ItemId {
        let id = self.insert(kind);
        let item = self.get_mut(id).unwrap();
        item.left = left;
        item.top = top;
        id
    }

    /// Reinsert a previously removed item at its recorded position,
    /// keeping its original id. Ids are never reissued, so a restored id
    /// cannot collide with a live one.
    pub fn restore(&mut self, (index, item): RemovedItem) {
        debug_assert!(!self.contains(item.id), "restoring a live id");
        let index = index.min(self.items.len());
        self.items.insert(index, item);
    }

    fn fresh_id(&mut self) -> ItemId {
        self.next_id += 1;
        ItemId(self.next_id)
    }

    // ─── Removal ─────────────────────────────────────────────────────────

    /// Remove the given items and every link that depends on them.
    ///
    /// Removing a behaviour-shaped item cascades to all links attached to
    /// any of its portals; removed links are detached from the portals of
    /// surviving behaviours. Removed items are pruned from the selection.
    /// Returns `(position, item)` pairs in ascending position order.
    pub fn remove_items(&mut self, ids: &[ItemId]) -> Vec<RemovedItem> {
        let mut doomed: Vec<ItemId> = Vec::new();
        for &id in ids {
            if self.contains(id) && !doomed.contains(&id) {
                doomed.push(id);
            }
        }
        // Cascade: links attached to any doomed behaviour's portals.
        let mut cascade: Vec<ItemId> = Vec::new();
        for &id in &doomed {
            if let Some(behaviour) = self.get(id).and_then(CanvasItem::behaviour) {
                for portal in behaviour.portals() {
                    for &link_id in &portal.links {
                        if !doomed.contains(&link_id) && !cascade.contains(&link_id) {
                            cascade.push(link_id);
                        }
                    }
                }
            }
        }
        doomed.extend(cascade);

        // Detach doomed links from surviving portals before any removal.
        for &id in &doomed {
            if self.get(id).and_then(CanvasItem::link).is_some() {
                self.detach_link(id);
            }
        }

        let mut removed: Vec<RemovedItem> = Vec::new();
        let mut positions: Vec<usize> = doomed
            .iter()
            .filter_map(|&id| self.index_of(id))
            .collect();
        positions.sort_unstable();
        for &pos in positions.iter().rev() {
            removed.push((pos, self.items.remove(pos)));
        }
        removed.reverse();

        self.selection.retain(|id| !doomed.contains(id));
        removed
    }

    /// Put back a batch returned by [`remove_items`](Self::remove_items),
    /// reattaching restored links to their endpoint portals.
    pub fn restore_items(&mut self, removed: Vec<RemovedItem>) {
        let link_ids: Vec<ItemId> = removed
            .iter()
            .filter(|(_, item)| item.link().is_some())
            .map(|(_, item)| item.id)
            .collect();
        for entry in removed {
            self.restore(entry);
        }
        for link_id in link_ids {
            self.connect_link(link_id);
        }
    }

    // ─── Link bookkeeping ────────────────────────────────────────────────

    /// Register a resolved link on both endpoint portals. Idempotent.
    pub fn connect_link(&mut self, link_id: ItemId) {
        let Some((start, end)) = self
            .get(link_id)
            .and_then(CanvasItem::link)
            .and_then(|l| l.start.zip(l.end))
        else {
            return;
        };
        for end_ref in [start, end] {
            if let Some(portal) = self
                .get_mut(end_ref.item)
                .and_then(CanvasItem::behaviour_mut)
                .and_then(|b| b.portal_mut(end_ref.portal))
                && !portal.links.contains(&link_id)
            {
                portal.links.push(link_id);
            }
        }
    }

    /// Remove a link id from both endpoint portals' link lists.
    pub fn detach_link(&mut self, link_id: ItemId) {
        let Some(link) = self.get(link_id).and_then(CanvasItem::link) else {
            return;
        };
        let ends: Vec<_> = [link.start, link.end].into_iter().flatten().collect();
        for end_ref in ends {
            if let Some(portal) = self
                .get_mut(end_ref.item)
                .and_then(CanvasItem::behaviour_mut)
                .and_then(|b| b.portal_mut(end_ref.portal))
            {
                portal.links.retain(|l| *l != link_id);
            }
        }
    }

    /// Remove a portal from a behaviour, cascading removal of every link
    /// attached to it. Returns the removed pieces for undo.
    pub fn remove_portal(
        &mut self,
        behaviour_id: ItemId,
        portal_name: crate::id::Name,
    ) -> Option<(crate::model::Portal, Vec<RemovedItem>)> {
        let link_ids: Vec<ItemId> = self
            .get(behaviour_id)
            .and_then(CanvasItem::behaviour)
            .and_then(|b| b.portal(portal_name))
            .map(|p| p.links.to_vec())?;
        let removed_links = self.remove_items(&link_ids);
        let portal = self
            .get_mut(behaviour_id)
            .and_then(CanvasItem::behaviour_mut)
            .and_then(|b| b.remove_portal(portal_name))?;
        Some((portal, removed_links))
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Selected ids, in selection order ("last selected" is last).
    pub fn selection(&self) -> &[ItemId] {
        &self.selection
    }

    /// Replace the selection wholesale. Unknown ids are dropped, keeping
    /// the `selection ⊆ items` invariant; `selected` flags are synced.
    pub fn set_selection(&mut self, ids: Vec<ItemId>) {
        for item in &mut self.items {
            item.selected = false;
        }
        let mut selection = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(item) = self.get_mut(id)
                && !selection.contains(&id)
            {
                item.selected = true;
                selection.push(id);
            }
        }
        self.selection = selection;
    }
}
