use super::Desktop;
use crate::item::{Item, ItemId};
use eframe::egui::{pos2, vec2, Pos2, Rect};
use log::debug;

impl Desktop {
    pub fn columns(&self) -> &[Vec<ItemId>] {
        &self.columns
    }

    pub fn column_widths(&self) -> &[f32] {
        &self.column_widths
    }

    /// Items whose children are shown, shallowest first. Entry `c` is the
    /// source of column `c + 1`.
    pub fn expansion_path(&self) -> &[ItemId] {
        &self.expanded
    }

    pub fn is_expanded(&self, id: ItemId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn visible_items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.columns.iter().flatten().copied()
    }

    pub fn is_visible(&self, id: ItemId) -> bool {
        self.position_of(id).is_some()
    }

    /// Logical `(column, row)` of a visible item.
    pub fn position_of(&self, id: ItemId) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(c, column)| {
            column.iter().position(|&other| other == id).map(|r| (c, r))
        })
    }

    /// Left edge of column `c`.
    pub fn column_x(&self, column: usize) -> f32 {
        let gap = self.config.column_gap;
        self.config.left_margin
            + self
                .column_widths
                .iter()
                .take(column)
                .map(|w| w + gap)
                .sum::<f32>()
    }

    pub fn pixel_of(&self, column: usize, row: usize) -> Pos2 {
        pos2(
            self.column_x(column),
            self.config.top_margin + row as f32 * self.config.item_height,
        )
    }

    pub fn item_rect(&self, id: ItemId) -> Option<Rect> {
        let (column, row) = self.position_of(id)?;
        let width = self.tree.get(id)?.preferred_width;
        Some(Rect::from_min_size(
            self.pixel_of(column, row),
            vec2(width, self.config.item_height),
        ))
    }

    /// Topmost visible item under `pos`.
    pub fn item_at(&self, pos: Pos2) -> Option<ItemId> {
        self.visible_items()
            .find(|&id| self.item_rect(id).is_some_and(|r| r.contains(pos)))
    }

    /// Column whose horizontal band contains `x`. A band spans the column
    /// and the gap to its right; anything left of the first column maps
    /// to the root column.
    pub fn column_at_x(&self, x: f32) -> Option<usize> {
        if x < self.column_x(0) {
            return Some(0);
        }
        (0..self.columns.len()).find(|&c| {
            let start = self.column_x(c);
            let end = start + self.column_widths[c] + self.config.column_gap;
            x >= start && x < end
        })
    }

    pub fn recalculate_column_width(&mut self, column: usize) {
        let Some(items) = self.columns.get(column) else {
            return;
        };
        let width = items
            .iter()
            .filter_map(|&id| self.tree.get(id))
            .map(Item::preferred_width)
            .fold(0.0_f32, f32::max);
        if self.column_widths.len() < self.columns.len() {
            self.column_widths.resize(self.columns.len(), 0.0);
        }
        self.column_widths[column] = width;
    }

    pub(crate) fn recalculate_all_widths(&mut self) {
        self.column_widths.clear();
        self.column_widths.resize(self.columns.len(), 0.0);
        for column in 0..self.columns.len() {
            self.recalculate_column_width(column);
        }
    }

    /// Shows the children of `id` in the column after it, expanding every
    /// ancestor on the way. Items not rooted on the desktop are ignored.
    pub fn display_children_of(&mut self, id: ItemId) {
        if !self.tree.contains(id) {
            return;
        }
        let mut path = self.tree.ancestors(id);
        path.reverse();
        path.push(id);
        if !self.columns[0].contains(&path[0]) {
            debug!("display_children_of: {id:?} is not rooted on the desktop");
            return;
        }
        self.expanded = path;
        self.sync_columns();
        self.repaint = true;
    }

    /// Hides every column but the root one.
    pub fn collapse_to_root(&mut self) {
        self.collapse_after(0);
    }

    /// Keeps columns `0..=column` and drops everything to their right.
    pub fn collapse_after(&mut self, column: usize) {
        if self.expanded.len() <= column {
            return;
        }
        self.expanded.truncate(column);
        self.sync_columns();
        self.repaint = true;
    }

    /// Rebuilds columns past the root one from the expansion path, cutting
    /// the path at the first entry that no longer descends from the one
    /// before it.
    pub(crate) fn sync_columns(&mut self) {
        let tree = &self.tree;
        self.columns[0].retain(|&id| tree.get(id).is_some_and(|item| item.parent.is_none()));

        let mut valid = 0;
        for (depth, &source) in self.expanded.iter().enumerate() {
            let linked = match (tree.get(source), depth) {
                (None, _) => false,
                (Some(_), 0) => self.columns[0].contains(&source),
                (Some(item), _) => item.parent == Some(self.expanded[depth - 1]),
            };
            if !linked {
                break;
            }
            valid = depth + 1;
        }
        self.expanded.truncate(valid);

        self.columns.truncate(1);
        for &source in &self.expanded {
            let children = tree
                .get(source)
                .map(|item| item.children.clone())
                .unwrap_or_default();
            self.columns.push(children);
        }
        self.recalculate_all_widths();
        self.deselect_hidden();
        self.tree.debug_check();
    }

    fn deselect_hidden(&mut self) {
        let hidden: Vec<ItemId> = self
            .tree
            .iter()
            .filter(|(id, item)| item.selected && self.position_of(*id).is_none())
            .map(|(id, _)| id)
            .collect();
        for id in hidden {
            if let Some(item) = self.tree.get_mut(id) {
                item.selected = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::DesktopConfig;
    use crate::desktop::Desktop;
    use crate::item::Item;
    use eframe::egui::pos2;

    fn desk() -> Desktop {
        Desktop::new(DesktopConfig::default())
    }

    #[test]
    fn pixel_mapping_follows_widths_and_gaps() {
        let mut d = desk();
        let f = d.add_item(Item::folder("F"));
        let child = d.add_item_into(Item::generic("child", None), f).expect("add");
        d.display_children_of(f);

        let cfg = DesktopConfig::default();
        let w0 = d.column_widths()[0];
        assert_eq!(d.pixel_of(0, 0), pos2(cfg.left_margin, cfg.top_margin));
        let p = d.pixel_of(1, 2);
        assert!((p.x - (cfg.left_margin + w0 + cfg.column_gap)).abs() < 1e-3);
        assert_eq!(p.y, cfg.top_margin + 2.0 * cfg.item_height);
        let rect = d.item_rect(child).expect("visible");
        assert_eq!(rect.min, d.pixel_of(1, 0));
        assert_eq!(d.item_at(rect.center()), Some(child));
    }

    #[test]
    fn column_width_is_the_widest_item() {
        let mut d = desk();
        let a = d.add_item(Item::generic("a", None));
        let b = d.add_item(Item::generic("a far longer label", None));
        let widest = d.item(b).map(Item::preferred_width).unwrap_or_default();
        assert_eq!(d.column_widths()[0], widest);
        d.remove_item(b);
        let narrow = d.item(a).map(Item::preferred_width).unwrap_or_default();
        assert_eq!(d.column_widths()[0], narrow);
    }

    #[test]
    fn display_children_expands_the_whole_ancestor_path() {
        let mut d = desk();
        let top = d.add_item(Item::folder("top"));
        let mid = d.add_item_into(Item::folder("mid"), top).expect("add");
        let leaf = d.add_item_into(Item::generic("leaf", None), mid).expect("add");

        d.display_children_of(mid);
        assert_eq!(d.expansion_path(), &[top, mid]);
        assert_eq!(d.columns().len(), 3);
        assert_eq!(d.position_of(leaf), Some((2, 0)));

        d.collapse_after(1);
        assert_eq!(d.columns().len(), 2);
        assert_eq!(d.position_of(leaf), None);

        d.collapse_to_root();
        assert_eq!(d.columns().len(), 1);
        assert!(d.expansion_path().is_empty());
    }

    #[test]
    fn collapse_deselects_hidden_items() {
        let mut d = desk();
        let f = d.add_item(Item::folder("F"));
        let child = d.add_item_into(Item::generic("c", None), f).expect("add");
        d.display_children_of(f);
        d.select(child);
        d.collapse_to_root();
        assert!(d.item(child).is_some_and(|c| !c.is_selected()));
    }

    #[test]
    fn column_bands_include_the_trailing_gap() {
        let mut d = desk();
        let f = d.add_item(Item::folder("F"));
        d.add_item_into(Item::generic("c", None), f);
        d.display_children_of(f);

        let second = d.column_x(1);
        assert_eq!(d.column_at_x(0.0), Some(0));
        assert_eq!(d.column_at_x(second - 1.0), Some(0));
        assert_eq!(d.column_at_x(second + 1.0), Some(1));
        assert_eq!(d.column_at_x(10_000.0), None);
    }
}
