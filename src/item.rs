use crate::measure::TextMeasure;
use slotmap::SlotMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

slotmap::new_key_type! {
    /// Stable identity of an item for as long as it lives in the tree.
    pub struct ItemId;
}

/// Opaque collaborator data carried by generic items.
#[derive(Clone)]
pub struct Payload(Arc<dyn Any + Send + Sync>);

impl Payload {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Payload(..)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Import,
    NewFolder,
}

#[derive(Debug, Clone)]
pub enum ItemKind {
    Generic { payload: Option<Payload> },
    Folder,
    Bin,
    Shortcut(Shortcut),
}

impl ItemKind {
    pub fn is_folder(&self) -> bool {
        matches!(self, ItemKind::Folder)
    }

    pub fn is_bin(&self) -> bool {
        matches!(self, ItemKind::Bin)
    }

    fn is_fixed(&self) -> bool {
        matches!(self, ItemKind::Bin | ItemKind::Shortcut(_))
    }
}

/// Opaque icon reference resolved by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IconHandle(pub u32);

impl IconHandle {
    pub const GENERIC: IconHandle = IconHandle(0);
    pub const FOLDER: IconHandle = IconHandle(1);
    pub const BIN: IconHandle = IconHandle(2);
    pub const IMPORT: IconHandle = IconHandle(3);
    pub const NEW_FOLDER: IconHandle = IconHandle(4);
}

#[derive(Debug, Clone)]
pub struct Item {
    pub(crate) label: String,
    pub(crate) icon: IconHandle,
    pub(crate) kind: ItemKind,
    pub(crate) parent: Option<ItemId>,
    pub(crate) children: Vec<ItemId>,
    pub(crate) selected: bool,
    pub(crate) draggable: bool,
    pub(crate) destroyable: bool,
    pub(crate) preferred_width: f32,
}

impl Item {
    pub fn new(label: impl Into<String>, kind: ItemKind) -> Self {
        let icon = match &kind {
            ItemKind::Generic { .. } => IconHandle::GENERIC,
            ItemKind::Folder => IconHandle::FOLDER,
            ItemKind::Bin => IconHandle::BIN,
            ItemKind::Shortcut(Shortcut::Import) => IconHandle::IMPORT,
            ItemKind::Shortcut(Shortcut::NewFolder) => IconHandle::NEW_FOLDER,
        };
        let fixed = kind.is_fixed();
        Self {
            label: label.into(),
            icon,
            kind,
            parent: None,
            children: Vec::new(),
            selected: false,
            draggable: !fixed,
            destroyable: !fixed,
            preferred_width: 0.0,
        }
    }

    pub fn generic(label: impl Into<String>, payload: Option<Payload>) -> Self {
        Self::new(label, ItemKind::Generic { payload })
    }

    pub fn folder(label: impl Into<String>) -> Self {
        Self::new(label, ItemKind::Folder)
    }

    pub fn bin() -> Self {
        Self::new("Bin", ItemKind::Bin)
    }

    pub fn shortcut(label: impl Into<String>, shortcut: Shortcut) -> Self {
        Self::new(label, ItemKind::Shortcut(shortcut))
    }

    pub fn with_icon(mut self, icon: IconHandle) -> Self {
        self.icon = icon;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn icon(&self) -> IconHandle {
        self.icon
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn payload(&self) -> Option<&Payload> {
        match &self.kind {
            ItemKind::Generic { payload } => payload.as_ref(),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    pub fn children(&self) -> &[ItemId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_draggable(&self) -> bool {
        self.draggable
    }

    pub fn is_destroyable(&self) -> bool {
        self.destroyable
    }

    pub fn preferred_width(&self) -> f32 {
        self.preferred_width
    }
}

/// A detached subtree built off the interaction thread and grafted onto
/// the desktop in one step.
#[derive(Debug, Clone)]
pub struct ItemSpec {
    pub item: Item,
    pub children: Vec<ItemSpec>,
}

impl ItemSpec {
    pub fn new(item: Item) -> Self {
        Self {
            item,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: ItemSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ItemSpec::count).sum::<usize>()
    }
}

/// Horizontal decoration around an item's label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemMetrics {
    pub padding: f32,
    pub icon_width: f32,
    pub icon_gap: f32,
}

/// Arena owning every item; parents own their `children` list and
/// `parent` is a plain back reference.
pub struct ItemTree {
    items: SlotMap<ItemId, Item>,
    metrics: ItemMetrics,
    measure: Box<dyn TextMeasure>,
}

impl ItemTree {
    pub fn new(metrics: ItemMetrics, measure: Box<dyn TextMeasure>) -> Self {
        Self {
            items: SlotMap::with_key(),
            metrics,
            measure,
        }
    }

    pub fn set_measure(&mut self, measure: Box<dyn TextMeasure>) {
        self.measure = measure;
        let ids: Vec<ItemId> = self.items.keys().collect();
        for id in ids {
            self.refresh_width(id);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(id)
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.items.iter()
    }

    /// Inserts a detached item; any parent/children it carried are discarded.
    pub(crate) fn insert(&mut self, mut item: Item) -> ItemId {
        item.parent = None;
        item.children.clear();
        let id = self.items.insert(item);
        self.refresh_width(id);
        id
    }

    pub(crate) fn refresh_width(&mut self, id: ItemId) {
        let Some(item) = self.items.get(id) else {
            return;
        };
        let text = self.measure.text_width(&item.label, item.has_children());
        let width = self.metrics.padding * 2.0
            + self.metrics.icon_width
            + self.metrics.icon_gap
            + text;
        if let Some(item) = self.items.get_mut(id) {
            item.preferred_width = width;
        }
    }

    /// Appends `child` to `parent`, detaching it from any previous parent.
    pub fn add_child(&mut self, parent: ItemId, child: ItemId) -> bool {
        self.insert_child(parent, child, usize::MAX)
    }

    pub fn insert_child(&mut self, parent: ItemId, child: ItemId, index: usize) -> bool {
        if parent == child
            || !self.contains(parent)
            || !self.contains(child)
            || self.is_ancestor(child, parent)
        {
            return false;
        }
        self.detach(child);
        if let Some(p) = self.items.get_mut(parent) {
            let at = index.min(p.children.len());
            p.children.insert(at, child);
        }
        if let Some(c) = self.items.get_mut(child) {
            c.parent = Some(parent);
        }
        self.refresh_width(parent);
        true
    }

    /// Unlinks `id` from its parent. Returns the former parent.
    pub fn detach(&mut self, id: ItemId) -> Option<ItemId> {
        let parent = self.items.get_mut(id)?.parent.take()?;
        if let Some(p) = self.items.get_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        self.refresh_width(parent);
        Some(parent)
    }

    pub fn set_label(&mut self, id: ItemId, label: impl Into<String>) -> bool {
        let Some(item) = self.items.get_mut(id) else {
            return false;
        };
        item.label = label.into();
        self.refresh_width(id);
        true
    }

    /// Number of ancestors above `id`; roots have depth 0.
    pub fn depth(&self, id: ItemId) -> usize {
        self.ancestors(id).len()
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut cursor = self.items.get(id).and_then(|i| i.parent);
        while let Some(p) = cursor {
            out.push(p);
            cursor = self.items.get(p).and_then(|i| i.parent);
        }
        out
    }

    /// True when `ancestor` lies strictly above `id`.
    pub fn is_ancestor(&self, ancestor: ItemId, id: ItemId) -> bool {
        let mut cursor = self.items.get(id).and_then(|i| i.parent);
        while let Some(p) = cursor {
            if p == ancestor {
                return true;
            }
            cursor = self.items.get(p).and_then(|i| i.parent);
        }
        false
    }

    /// All descendants of `id` in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: ItemId, out: &mut Vec<ItemId>) {
        let Some(item) = self.items.get(id) else {
            return;
        };
        for &child in &item.children {
            out.push(child);
            self.collect_descendants(child, out);
        }
    }

    /// Removes `id` and its whole subtree from the arena.
    pub(crate) fn destroy(&mut self, id: ItemId) -> Vec<Item> {
        self.detach(id);
        let mut doomed = vec![id];
        doomed.extend(self.descendants(id));
        doomed
            .into_iter()
            .filter_map(|victim| self.items.remove(victim))
            .collect()
    }

    /// Checks parent/child symmetry over the whole arena.
    pub fn is_consistent(&self) -> bool {
        self.items.iter().all(|(id, item)| {
            let children_ok = item.children.iter().all(|&c| {
                self.items
                    .get(c)
                    .is_some_and(|child| child.parent == Some(id))
            });
            let parent_ok = item.parent.map_or(true, |p| {
                self.items
                    .get(p)
                    .is_some_and(|parent| parent.children.contains(&id))
            });
            children_ok && parent_ok
        })
    }

    pub(crate) fn debug_check(&self) {
        debug_assert!(self.is_consistent(), "item tree parent/child links diverged");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::CharWidthMeasure;

    fn tree() -> ItemTree {
        ItemTree::new(
            ItemMetrics {
                padding: 10.0,
                icon_width: 20.0,
                icon_gap: 6.0,
            },
            Box::new(CharWidthMeasure::default()),
        )
    }

    #[test]
    fn fixed_items_are_not_destroyable() {
        assert!(!Item::bin().is_destroyable());
        assert!(!Item::shortcut("Import", Shortcut::Import).is_draggable());
        assert!(Item::folder("F").is_destroyable());
        assert!(Item::generic("n", None).is_draggable());
    }

    #[test]
    fn add_child_links_both_ways_and_widens_parent() {
        let mut t = tree();
        let parent = t.insert(Item::folder("Parent"));
        let child = t.insert(Item::generic("Child", None));
        let leaf_width = t.get(parent).map(Item::preferred_width).unwrap_or_default();

        assert!(t.add_child(parent, child));
        assert_eq!(t.get(child).and_then(Item::parent), Some(parent));
        assert_eq!(t.get(parent).map(|p| p.children().to_vec()), Some(vec![child]));
        let bold_width = t.get(parent).map(Item::preferred_width).unwrap_or_default();
        assert!(bold_width > leaf_width);
        assert!(t.is_consistent());
    }

    #[test]
    fn moving_a_child_detaches_it_from_the_old_parent() {
        let mut t = tree();
        let a = t.insert(Item::folder("A"));
        let b = t.insert(Item::folder("B"));
        let c = t.insert(Item::generic("c", None));
        t.add_child(a, c);
        t.add_child(b, c);

        assert!(t.get(a).is_some_and(|a| a.children().is_empty()));
        assert_eq!(t.get(c).and_then(Item::parent), Some(b));
        assert!(t.is_consistent());
    }

    #[test]
    fn refuses_to_create_cycles() {
        let mut t = tree();
        let a = t.insert(Item::folder("A"));
        let b = t.insert(Item::folder("B"));
        assert!(t.add_child(a, b));
        assert!(!t.add_child(b, a));
        assert!(!t.add_child(a, a));
        assert_eq!(t.depth(b), 1);
        assert!(t.is_ancestor(a, b));
    }

    #[test]
    fn destroy_releases_the_subtree() {
        let mut t = tree();
        let root = t.insert(Item::folder("root"));
        let mid = t.insert(Item::folder("mid"));
        let leaf = t.insert(Item::generic("leaf", None));
        t.add_child(root, mid);
        t.add_child(mid, leaf);

        assert_eq!(t.descendants(root), vec![mid, leaf]);
        let removed = t.destroy(mid);
        assert_eq!(removed.len(), 2);
        assert!(!t.contains(leaf));
        assert!(t.get(root).is_some_and(|r| !r.has_children()));
        assert!(t.is_consistent());
    }

    #[test]
    fn payload_downcasts_to_its_type() {
        let item = Item::generic("net", Some(Payload::new(42u32)));
        assert_eq!(item.payload().and_then(|p| p.downcast_ref::<u32>()), Some(&42));
        assert!(item.payload().and_then(|p| p.downcast_ref::<String>()).is_none());
    }
}
