use super::Desktop;
use crate::item::ItemId;

impl Desktop {
    fn set_selected(&mut self, id: ItemId, selected: bool) -> bool {
        match self.tree.get_mut(id) {
            Some(item) => {
                if item.selected != selected {
                    item.selected = selected;
                    self.repaint = true;
                }
                true
            }
            None => false,
        }
    }

    pub fn select(&mut self, id: ItemId) -> bool {
        self.set_selected(id, true)
    }

    pub fn deselect(&mut self, id: ItemId) -> bool {
        self.set_selected(id, false)
    }

    pub fn toggle(&mut self, id: ItemId) -> bool {
        let Some(selected) = self.tree.get(id).map(|i| i.selected) else {
            return false;
        };
        self.set_selected(id, !selected)
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.tree.get(id).is_some_and(|i| i.selected)
    }

    pub fn clear_selection(&mut self) {
        let selected: Vec<ItemId> = self
            .tree
            .iter()
            .filter(|(_, item)| item.selected)
            .map(|(id, _)| id)
            .collect();
        for id in selected {
            self.deselect(id);
        }
    }

    pub fn select_only(&mut self, id: ItemId) {
        self.clear_selection();
        self.select(id);
    }

    /// Selected items in column order.
    pub fn selected_items(&self) -> Vec<ItemId> {
        self.visible_items()
            .filter(|&id| self.is_selected(id))
            .collect()
    }

    /// Selected items that have no selected ancestor.
    pub fn top_selected_items(&self) -> Vec<ItemId> {
        self.selected_items()
            .into_iter()
            .filter(|&id| {
                !self
                    .tree
                    .ancestors(id)
                    .into_iter()
                    .any(|a| self.is_selected(a))
            })
            .collect()
    }

    /// Number of selected items that could be deleted or moved.
    pub fn selection_count(&self) -> usize {
        self.selected_items()
            .into_iter()
            .filter(|&id| self.tree.get(id).is_some_and(|i| i.destroyable))
            .count()
    }

    /// Keeps only the selected items of the shallowest column holding any.
    pub fn narrow_to_leftmost_column(&mut self) {
        let selected = self.selected_items();
        let Some(leftmost) = selected
            .iter()
            .filter_map(|&id| self.position_of(id).map(|(c, _)| c))
            .min()
        else {
            return;
        };
        for id in selected {
            if self.position_of(id).is_some_and(|(c, _)| c != leftmost) {
                self.deselect(id);
            }
        }
    }

    /// Selects every item in the column of the current selection, or the
    /// root column when nothing is selected.
    pub fn select_all_in_column(&mut self) {
        let column = self
            .selected_items()
            .first()
            .and_then(|&id| self.position_of(id))
            .map_or(0, |(c, _)| c);
        let items = self.columns.get(column).cloned().unwrap_or_default();
        self.clear_selection();
        for id in items {
            self.select(id);
        }
    }

    pub(crate) fn move_selection(&mut self, delta: isize) {
        let selected = self.selected_items();
        let focus = if delta < 0 {
            selected.first()
        } else {
            selected.last()
        };
        let Some((column, row)) = focus.and_then(|&id| self.position_of(id)) else {
            if let Some(&first) = self.columns[0].first() {
                self.select_only(first);
            }
            return;
        };
        let len = self.columns[column].len();
        let target = row.saturating_add_signed(delta).min(len.saturating_sub(1));
        let id = self.columns[column][target];
        self.select_only(id);
    }

    pub(crate) fn select_parent(&mut self) {
        let parent = self
            .selected_items()
            .first()
            .and_then(|&id| self.tree.get(id))
            .and_then(|item| item.parent);
        if let Some(parent) = parent {
            self.select_only(parent);
        }
    }

    pub(crate) fn select_first_child(&mut self) {
        let Some(&focus) = self.selected_items().first() else {
            return;
        };
        self.display_children_of(focus);
        let first = self.tree.get(focus).and_then(|item| item.children.first().copied());
        if let Some(child) = first {
            self.select_only(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::desktop::Desktop;
    use crate::item::Item;

    #[test]
    fn select_is_idempotent() {
        let mut d = Desktop::default();
        let a = d.add_item(Item::generic("a", None));
        d.select(a);
        d.select(a);
        assert_eq!(d.selected_items(), vec![a]);
        d.deselect(a);
        d.deselect(a);
        assert!(d.selected_items().is_empty());
    }

    #[test]
    fn top_selection_drops_descendants_of_selected_items() {
        let mut d = Desktop::default();
        let f = d.add_item(Item::folder("F"));
        let child = d.add_item_into(Item::generic("c", None), f).expect("add");
        let other = d.add_item(Item::generic("o", None));
        d.display_children_of(f);
        d.select(f);
        d.select(child);
        d.select(other);
        assert_eq!(d.top_selected_items(), vec![f, other]);
    }

    #[test]
    fn selection_count_ignores_fixed_items() {
        let mut d = Desktop::default();
        let bin = d.add_item(Item::bin());
        let a = d.add_item(Item::generic("a", None));
        d.select(bin);
        d.select(a);
        assert_eq!(d.selected_items().len(), 2);
        assert_eq!(d.selection_count(), 1);
    }

    #[test]
    fn narrowing_keeps_the_shallowest_column() {
        let mut d = Desktop::default();
        let f = d.add_item(Item::folder("F"));
        let a = d.add_item(Item::generic("a", None));
        let child = d.add_item_into(Item::generic("c", None), f).expect("add");
        d.display_children_of(f);
        d.select(child);
        d.select(a);
        d.narrow_to_leftmost_column();
        assert_eq!(d.selected_items(), vec![a]);
    }

    #[test]
    fn arrows_walk_the_column_and_the_tree() {
        let mut d = Desktop::default();
        let f = d.add_item(Item::folder("F"));
        let a = d.add_item(Item::generic("a", None));
        let child = d.add_item_into(Item::generic("c", None), f).expect("add");

        d.move_selection(1);
        assert_eq!(d.selected_items(), vec![f]);
        d.move_selection(1);
        assert_eq!(d.selected_items(), vec![a]);
        d.move_selection(1);
        assert_eq!(d.selected_items(), vec![a]);
        d.move_selection(-1);
        d.select_first_child();
        assert_eq!(d.selected_items(), vec![child]);
        d.select_parent();
        assert_eq!(d.selected_items(), vec![f]);
    }

    #[test]
    fn select_all_stays_in_one_column() {
        let mut d = Desktop::default();
        let f = d.add_item(Item::folder("F"));
        let c1 = d.add_item_into(Item::generic("c1", None), f).expect("add");
        let c2 = d.add_item_into(Item::generic("c2", None), f).expect("add");
        d.display_children_of(f);
        d.select(c2);
        d.select_all_in_column();
        assert_eq!(d.selected_items(), vec![c1, c2]);
    }
}
