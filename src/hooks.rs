use crate::desktop::Desktop;
use crate::events::{Activation, DesktopEvent};
use crate::item::{ItemId, ItemKind, Shortcut};
use eframe::egui::Pos2;

pub type HookFn = fn(&mut Desktop, ItemId, Pos2);

/// Per-variant reactions to pointer activation, invoked only by the
/// desktop's pointer dispatch.
pub struct InteractionHooks {
    pub primary: HookFn,
    pub secondary: HookFn,
    pub tertiary: HookFn,
    pub context: HookFn,
}

impl InteractionHooks {
    pub fn get(&self, activation: Activation) -> HookFn {
        match activation {
            Activation::Primary => self.primary,
            Activation::Secondary => self.secondary,
            Activation::Tertiary => self.tertiary,
            Activation::Context => self.context,
        }
    }
}

static GENERIC_HOOKS: InteractionHooks = InteractionHooks {
    primary: reveal_and_notify,
    secondary: notify_secondary,
    tertiary: notify_tertiary,
    context: notify_context,
};

static FOLDER_HOOKS: InteractionHooks = InteractionHooks {
    primary: reveal_children,
    secondary: reveal_children,
    tertiary: notify_tertiary,
    context: notify_context,
};

static BIN_HOOKS: InteractionHooks = InteractionHooks {
    primary: ignore,
    secondary: ignore,
    tertiary: ignore,
    context: ignore,
};

static IMPORT_HOOKS: InteractionHooks = InteractionHooks {
    primary: request_import,
    secondary: request_import,
    tertiary: ignore,
    context: ignore,
};

static NEW_FOLDER_HOOKS: InteractionHooks = InteractionHooks {
    primary: create_folder,
    secondary: create_folder,
    tertiary: ignore,
    context: ignore,
};

pub fn hooks_for(kind: &ItemKind) -> &'static InteractionHooks {
    match kind {
        ItemKind::Generic { .. } => &GENERIC_HOOKS,
        ItemKind::Folder => &FOLDER_HOOKS,
        ItemKind::Bin => &BIN_HOOKS,
        ItemKind::Shortcut(Shortcut::Import) => &IMPORT_HOOKS,
        ItemKind::Shortcut(Shortcut::NewFolder) => &NEW_FOLDER_HOOKS,
    }
}

fn ignore(_: &mut Desktop, _: ItemId, _: Pos2) {}

fn reveal_children(desktop: &mut Desktop, item: ItemId, _: Pos2) {
    desktop.display_children_of(item);
}

fn notify(desktop: &mut Desktop, item: ItemId, at: Pos2, activation: Activation) {
    desktop.push_event(DesktopEvent::Activated {
        item,
        activation,
        at,
    });
}

fn reveal_and_notify(desktop: &mut Desktop, item: ItemId, at: Pos2) {
    desktop.display_children_of(item);
    notify(desktop, item, at, Activation::Primary);
}

fn notify_secondary(desktop: &mut Desktop, item: ItemId, at: Pos2) {
    notify(desktop, item, at, Activation::Secondary);
}

fn notify_tertiary(desktop: &mut Desktop, item: ItemId, at: Pos2) {
    notify(desktop, item, at, Activation::Tertiary);
}

fn notify_context(desktop: &mut Desktop, item: ItemId, at: Pos2) {
    notify(desktop, item, at, Activation::Context);
}

fn request_import(desktop: &mut Desktop, _: ItemId, _: Pos2) {
    desktop.push_event(DesktopEvent::ImportRequested);
}

fn create_folder(desktop: &mut Desktop, _: ItemId, _: Pos2) {
    desktop.create_folder("New Folder");
}
