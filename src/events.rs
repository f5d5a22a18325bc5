use crate::item::ItemId;
use eframe::egui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Single click.
    Primary,
    /// Double click.
    Secondary,
    /// Middle button.
    Tertiary,
    /// Right button.
    Context,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    Binned,
    IntoFolder(ItemId),
    /// Moved to another column; `parent` is `None` for the root column.
    Reparented { parent: Option<ItemId> },
    SnapBack,
}

/// Items a delete gesture would remove: `roots` are removed, `closure`
/// lists roots plus every descendant for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeletionPlan {
    pub roots: Vec<ItemId>,
    pub closure: Vec<ItemId>,
}

impl DeletionPlan {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Intents reported to collaborators; drained on the interaction thread.
#[derive(Debug, Clone, PartialEq)]
pub enum DesktopEvent {
    Activated {
        item: ItemId,
        activation: Activation,
        at: egui::Pos2,
    },
    MultipleSelectionMenu {
        items: Vec<ItemId>,
        at: egui::Pos2,
    },
    ItemDropped {
        item: ItemId,
        outcome: DropOutcome,
    },
    ItemRemoved {
        item: ItemId,
        label: String,
    },
    DeleteRequested(DeletionPlan),
    RenameRequested(ItemId),
    ImportRequested,
    Action {
        name: String,
        selection: Vec<ItemId>,
    },
}
