use eframe::egui;
use netdesk::{DeletionPlan, ItemId};
use std::time::Instant;

/// An item gliding back to its slot after a drop that changed nothing.
pub struct SnapAnim {
    pub item: ItemId,
    pub from: egui::Pos2,
    pub start: Instant,
}

pub struct ContextMenu {
    pub items: Vec<ItemId>,
    pub at: egui::Pos2,
    pub opened_frame: u64,
}

pub struct RenameDialog {
    pub item: ItemId,
    pub text: String,
    pub focus_requested: bool,
}

pub struct DeleteDialog {
    pub plan: DeletionPlan,
    pub labels: Vec<String>,
}
