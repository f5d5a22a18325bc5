use super::{DraggedItem, Desktop};
use crate::events::{DesktopEvent, DropOutcome};
use crate::item::{ItemId, ItemKind};
use eframe::egui::{Pos2, Rect};
use log::debug;

/// True when the centre of `dragged` lies within `target` scaled by
/// `2 * gravity` around its own centre.
pub fn gravity_hit(dragged: Rect, target: Rect, gravity: f32) -> bool {
    Rect::from_center_size(target.center(), target.size() * (2.0 * gravity))
        .contains(dragged.center())
}

/// True when `a` and `b` share interior area. Rows stacked edge to edge
/// do not overlap.
pub(crate) fn overlaps(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x && b.min.x < a.max.x && a.min.y < b.max.y && b.min.y < a.max.y
}

impl Desktop {
    pub(crate) fn resolve_drop(
        &mut self,
        anchor: DraggedItem,
        payload: &[DraggedItem],
        pointer: Pos2,
    ) -> DropOutcome {
        let outcome = match self.item_rect(anchor.id) {
            Some(home) => {
                let dropped = Rect::from_min_size(pointer - anchor.offset, home.size());
                self.drop_at(anchor.id, payload, dropped)
            }
            None => DropOutcome::SnapBack,
        };
        debug!("drop of {:?} resolved to {outcome:?}", anchor.id);
        self.sync_columns();
        self.repaint = true;
        self.push_event(DesktopEvent::ItemDropped {
            item: anchor.id,
            outcome: outcome.clone(),
        });
        outcome
    }

    fn drop_at(&mut self, anchor: ItemId, payload: &[DraggedItem], dropped: Rect) -> DropOutcome {
        let movers = self.movers(payload);
        let gravity = self.config.gravity;

        let bin = self.visible_items().find(|&id| {
            id != anchor
                && self.tree.get(id).is_some_and(|i| i.kind.is_bin())
                && self.item_rect(id).is_some_and(|r| gravity_hit(dropped, r, gravity))
        });
        if bin.is_some() {
            if !self.tree.get(anchor).is_some_and(|i| i.destroyable) {
                return DropOutcome::SnapBack;
            }
            for id in movers {
                self.remove_item(id);
            }
            return DropOutcome::Binned;
        }

        let current_parent = self.tree.get(anchor).and_then(|i| i.parent);
        let folder = self.visible_items().find(|&id| {
            matches!(self.tree.get(id).map(|i| &i.kind), Some(ItemKind::Folder))
                && Some(id) != current_parent
                && !self.within_payload(id, &movers)
                && self.item_rect(id).is_some_and(|r| gravity_hit(dropped, r, gravity))
        });
        if let Some(folder) = folder {
            for &id in &movers {
                self.tree.add_child(folder, id);
            }
            return DropOutcome::IntoFolder(folder);
        }

        let Some((home_column, _)) = self.position_of(anchor) else {
            return DropOutcome::SnapBack;
        };
        let Some(column) = self.column_at_x(dropped.min.x) else {
            return DropOutcome::SnapBack;
        };
        if column == home_column {
            return DropOutcome::SnapBack;
        }
        let overlapping = self.visible_items().any(|id| {
            !movers.contains(&id) && self.item_rect(id).is_some_and(|r| overlaps(r, dropped))
        });
        if overlapping {
            return DropOutcome::SnapBack;
        }
        let parent = match column {
            0 => None,
            c => match self.expanded.get(c - 1) {
                Some(&source) => Some(source),
                None => return DropOutcome::SnapBack,
            },
        };
        if parent.is_some_and(|p| self.within_payload(p, &movers)) {
            return DropOutcome::SnapBack;
        }
        for &id in &movers {
            match parent {
                Some(p) => {
                    self.tree.add_child(p, id);
                }
                None => {
                    self.tree.detach(id);
                    if !self.columns[0].contains(&id) {
                        self.columns[0].push(id);
                    }
                }
            }
        }
        DropOutcome::Reparented { parent }
    }

    /// Payload items that may move: destroyable, and not carried along by
    /// another payload item's subtree.
    fn movers(&self, payload: &[DraggedItem]) -> Vec<ItemId> {
        let ids: Vec<ItemId> = payload
            .iter()
            .map(|d| d.id)
            .filter(|&id| self.tree.get(id).is_some_and(|i| i.destroyable))
            .collect();
        ids.iter()
            .copied()
            .filter(|&id| !ids.iter().any(|&other| self.tree.is_ancestor(other, id)))
            .collect()
    }

    /// True when `id` is one of `movers` or lies inside one of their subtrees.
    fn within_payload(&self, id: ItemId, movers: &[ItemId]) -> bool {
        movers
            .iter()
            .any(|&m| m == id || self.tree.is_ancestor(m, id))
    }
}
