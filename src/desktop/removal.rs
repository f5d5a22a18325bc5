use super::Desktop;
use crate::events::{DeletionPlan, DesktopEvent};
use crate::item::ItemId;
use log::{debug, info};

impl Desktop {
    /// Removes a visible, destroyable item together with its subtree.
    /// Columns showing that subtree are closed in the same call.
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        let Some((column, _)) = self.position_of(id) else {
            debug!("remove_item: {id:?} is not on the desktop");
            return false;
        };
        let Some(item) = self.tree.get(id) else {
            return false;
        };
        if !item.destroyable {
            debug!("remove_item: {id:?} is fixed");
            return false;
        }
        let label = item.label.clone();

        if column == 0 {
            self.columns[0].retain(|&other| other != id);
        }
        if let Some(depth) = self.expanded.iter().position(|&source| source == id) {
            self.expanded.truncate(depth);
        }

        let mut doomed = vec![id];
        doomed.extend(self.tree.descendants(id));
        let removed = self.tree.destroy(id);
        for gone in doomed {
            self.forget(gone);
        }
        self.sync_columns();
        self.repaint = true;

        info!("removed {label:?} ({} item(s))", removed.len());
        self.push_event(DesktopEvent::ItemRemoved { item: id, label });
        true
    }

    /// Roots to remove for the current selection plus everything they
    /// would take with them.
    pub fn deletion_plan(&self) -> DeletionPlan {
        let roots: Vec<ItemId> = self
            .top_selected_items()
            .into_iter()
            .filter(|&id| self.tree.get(id).is_some_and(|i| i.destroyable))
            .collect();
        let closure = roots
            .iter()
            .flat_map(|&root| std::iter::once(root).chain(self.get_all_descendants(root)))
            .collect();
        DeletionPlan { roots, closure }
    }

    /// Removes the plan's roots; returns how many were still present.
    pub fn apply_deletion(&mut self, plan: &DeletionPlan) -> usize {
        plan.roots
            .iter()
            .filter(|&&root| self.remove_item(root))
            .count()
    }
}
