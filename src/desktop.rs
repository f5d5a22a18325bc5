mod dropping;
mod gesture;
mod layout;
mod removal;
mod selection;

pub use gesture::{DraggedItem, Gesture, PointerButton, PointerInput};

use crate::config::DesktopConfig;
use crate::events::DesktopEvent;
use crate::item::{Item, ItemId, ItemMetrics, ItemSpec, ItemTree};
use crate::keymap::{Action, Keymap};
use crate::measure::{CharWidthMeasure, TextMeasure};
use eframe::egui;
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
struct ClickRecord {
    item: ItemId,
    time: f64,
    pos: egui::Pos2,
}

/// Column-browser view over the item forest plus its interaction state.
///
/// `columns[0]` is the ordered list of root items. Every later column shows
/// the children of `expanded[c - 1]`, so `expanded.len() + 1 == columns.len()`.
/// All state is owned by the interaction thread.
pub struct Desktop {
    tree: ItemTree,
    columns: Vec<Vec<ItemId>>,
    column_widths: Vec<f32>,
    expanded: Vec<ItemId>,
    config: DesktopConfig,
    keymap: Keymap,
    gesture: Gesture,
    last_click: Option<ClickRecord>,
    events: Vec<DesktopEvent>,
    repaint: bool,
}

impl Default for Desktop {
    fn default() -> Self {
        Self::new(DesktopConfig::default())
    }
}

impl Desktop {
    pub fn new(config: DesktopConfig) -> Self {
        let measure = CharWidthMeasure {
            char_width: config.char_width,
            bold_factor: config.bold_factor,
        };
        Self::with_measure(config, Box::new(measure))
    }

    pub fn with_measure(config: DesktopConfig, measure: Box<dyn TextMeasure>) -> Self {
        let metrics = ItemMetrics {
            padding: config.item_padding,
            icon_width: config.icon_width,
            icon_gap: config.icon_gap,
        };
        Self {
            tree: ItemTree::new(metrics, measure),
            columns: vec![Vec::new()],
            column_widths: vec![0.0],
            expanded: Vec::new(),
            config,
            keymap: Keymap::default(),
            gesture: Gesture::Idle,
            last_click: None,
            events: Vec::new(),
            repaint: true,
        }
    }

    pub fn set_measure(&mut self, measure: Box<dyn TextMeasure>) {
        self.tree.set_measure(measure);
        self.recalculate_all_widths();
        self.repaint = true;
    }

    pub fn config(&self) -> &DesktopConfig {
        &self.config
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn keymap_mut(&mut self) -> &mut Keymap {
        &mut self.keymap
    }

    pub fn tree(&self) -> &ItemTree {
        &self.tree
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.tree.get(id)
    }

    pub fn label(&self, id: ItemId) -> Option<&str> {
        self.tree.get(id).map(Item::label)
    }

    pub fn push_event(&mut self, event: DesktopEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<DesktopEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn request_repaint(&mut self) {
        self.repaint = true;
    }

    /// Returns and clears the pending repaint flag.
    pub fn take_repaint(&mut self) -> bool {
        std::mem::take(&mut self.repaint)
    }

    /// Registers a new root item at the end of the first column.
    pub fn add_item(&mut self, item: Item) -> ItemId {
        let id = self.tree.insert(item);
        self.columns[0].push(id);
        self.recalculate_column_width(0);
        info!("added item {:?} ({})", id, self.label(id).unwrap_or_default());
        self.repaint = true;
        id
    }

    /// Adds `item` as the last child of `folder`. Leaves the desktop
    /// untouched when `folder` no longer exists.
    pub fn add_item_into(&mut self, item: Item, folder: ItemId) -> Option<ItemId> {
        if !self.tree.contains(folder) {
            warn!("add_item_into: target {folder:?} is gone");
            return None;
        }
        let id = self.tree.insert(item);
        self.tree.add_child(folder, id);
        self.sync_columns();
        self.repaint = true;
        Some(id)
    }

    /// Inserts `item` at a logical slot; columns past the first adopt the
    /// item into that column's expansion source.
    pub fn add_item_at(&mut self, item: Item, column: usize, row: usize) -> Option<ItemId> {
        if column == 0 {
            let id = self.tree.insert(item);
            let at = row.min(self.columns[0].len());
            self.columns[0].insert(at, id);
            self.recalculate_column_width(0);
            self.repaint = true;
            return Some(id);
        }
        let parent = *self.expanded.get(column - 1)?;
        let id = self.tree.insert(item);
        self.tree.insert_child(parent, id, row);
        self.sync_columns();
        self.repaint = true;
        Some(id)
    }

    /// Grafts a whole subtree, at the root when `into` is `None`.
    pub fn add_item_tree(&mut self, spec: ItemSpec, into: Option<ItemId>) -> Option<ItemId> {
        if into.is_some_and(|folder| !self.tree.contains(folder)) {
            warn!("add_item_tree: target {into:?} is gone");
            return None;
        }
        let count = spec.count();
        let root = self.graft(spec);
        match into {
            Some(folder) => {
                self.tree.add_child(folder, root);
            }
            None => self.columns[0].push(root),
        }
        self.sync_columns();
        self.tree.debug_check();
        info!("grafted {count} items under {into:?}");
        self.repaint = true;
        Some(root)
    }

    fn graft(&mut self, spec: ItemSpec) -> ItemId {
        let ItemSpec { item, children } = spec;
        let id = self.tree.insert(item);
        for child in children {
            let child_id = self.graft(child);
            self.tree.add_child(id, child_id);
        }
        id
    }

    /// Puts `new` in `old`'s slot, handing over its children and expansion.
    pub fn replace_item(&mut self, old: ItemId, new: Item) -> Option<ItemId> {
        let old_item = self.tree.get(old)?;
        let parent = old_item.parent;
        let children = old_item.children.clone();
        let selected = old_item.selected;

        let root_index = self.columns[0].iter().position(|&id| id == old);
        if parent.is_none() && root_index.is_none() {
            return None;
        }

        let id = self.tree.insert(new);
        match (parent, root_index) {
            (Some(p), _) => {
                let index = self
                    .tree
                    .get(p)
                    .and_then(|p| p.children.iter().position(|&c| c == old))
                    .unwrap_or(usize::MAX);
                self.tree.insert_child(p, id, index);
            }
            (None, Some(index)) => self.columns[0][index] = id,
            (None, None) => {}
        }
        for child in children {
            self.tree.add_child(id, child);
        }
        for source in &mut self.expanded {
            if *source == old {
                *source = id;
            }
        }
        if let Some(item) = self.tree.get_mut(id) {
            item.selected = selected;
        }
        self.tree.destroy(old);
        self.forget(old);
        self.sync_columns();
        self.tree.debug_check();
        self.repaint = true;
        Some(id)
    }

    pub fn rename_item(&mut self, id: ItemId, label: impl Into<String>) -> bool {
        if !self.tree.set_label(id, label) {
            return false;
        }
        if let Some((column, _)) = self.position_of(id) {
            self.recalculate_column_width(column);
        }
        self.repaint = true;
        true
    }

    pub fn find_by_label(&self, label: &str) -> Option<ItemId> {
        self.tree
            .iter()
            .find(|(_, item)| item.label == label)
            .map(|(id, _)| id)
    }

    /// `base`, or `base N` with the smallest N >= 2 not already in use.
    pub fn unique_label(&self, base: &str) -> String {
        if self.find_by_label(base).is_none() {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base} {n}"))
            .find(|candidate| self.find_by_label(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    pub fn create_folder(&mut self, base: &str) -> ItemId {
        let label = self.unique_label(base);
        self.add_item(Item::folder(label))
    }

    pub fn get_all_descendants(&self, id: ItemId) -> Vec<ItemId> {
        self.tree.descendants(id)
    }

    /// Runs the action bound to a key chord, returning it when one matched.
    pub fn handle_key(&mut self, key: egui::Key, modifiers: egui::Modifiers) -> Option<Action> {
        let action = self.keymap.lookup(key, modifiers)?.clone();
        debug!("key {key:?} -> {}", action.name());
        self.perform(&action);
        Some(action)
    }

    pub fn perform(&mut self, action: &Action) {
        match action {
            Action::DeleteSelection => {
                let plan = self.deletion_plan();
                if !plan.is_empty() {
                    self.push_event(DesktopEvent::DeleteRequested(plan));
                }
            }
            Action::Rename => {
                let candidates: Vec<ItemId> = self
                    .selected_items()
                    .into_iter()
                    .filter(|&id| self.tree.get(id).is_some_and(Item::is_destroyable))
                    .collect();
                if let [only] = candidates.as_slice() {
                    self.push_event(DesktopEvent::RenameRequested(*only));
                }
            }
            Action::SelectAll => self.select_all_in_column(),
            Action::SelectUp => self.move_selection(-1),
            Action::SelectDown => self.move_selection(1),
            Action::SelectParent => self.select_parent(),
            Action::SelectChild => self.select_first_child(),
            Action::Collapse => {
                if self.gesture.is_idle() {
                    self.collapse_to_root();
                } else {
                    self.cancel_gesture();
                }
            }
            Action::Named(name) => {
                let selection = self.selected_items();
                self.push_event(DesktopEvent::Action {
                    name: name.clone(),
                    selection,
                });
            }
        }
        self.repaint = true;
    }

    /// Drops transient references to an item that left the tree.
    fn forget(&mut self, id: ItemId) {
        if self.last_click.is_some_and(|c| c.item == id) {
            self.last_click = None;
        }
        if self.gesture.references(id) {
            self.gesture = Gesture::Idle;
        }
    }
}
