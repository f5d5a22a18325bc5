mod runtime;
mod state;
mod style;
mod ui;

use eframe::egui;
use log::{debug, info, warn};
use netdesk::{
    Action, Activation, AppConfig, Desktop, DesktopEvent, DropOutcome, Item, ItemId, Shortcut,
    StopFlag, TaskOutput, TaskRunner, TextMeasure,
};
use state::{ContextMenu, DeleteDialog, RenameDialog, SnapAnim};
use std::path::PathBuf;
use std::time::Instant;

pub const APP_NAME: &str = "NetDesk";
pub const WINDOW_WIDTH: f32 = 960.0;
pub const WINDOW_HEIGHT: f32 = 640.0;
pub const MIN_WINDOW_WIDTH: f32 = 480.0;
pub const MIN_WINDOW_HEIGHT: f32 = 320.0;
const MAX_DELETE_PREVIEW: usize = 12;

/// Label widths measured with the fonts the painter actually uses.
struct EguiMeasure {
    ctx: egui::Context,
}

impl TextMeasure for EguiMeasure {
    fn text_width(&self, text: &str, bold: bool) -> f32 {
        self.ctx.fonts(|fonts| {
            fonts
                .layout_no_wrap(
                    text.to_owned(),
                    style::label_font(bold),
                    egui::Color32::WHITE,
                )
                .size()
                .x
        })
    }
}

pub struct DeskApp {
    desktop: Desktop,
    config: AppConfig,
    runner: TaskRunner,
    import_stop: Option<StopFlag>,
    measure_ready: bool,
    snap_anims: Vec<SnapAnim>,
    context_menu: Option<ContextMenu>,
    rename: Option<RenameDialog>,
    delete: Option<DeleteDialog>,
    warning_message: Option<(String, Instant)>,
    panel_origin: egui::Vec2,
    geometry_dirty: bool,
}

impl DeskApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        if let Some((x, y)) = config.last_pos {
            cc.egui_ctx
                .send_viewport_cmd(egui::ViewportCommand::OuterPosition(egui::pos2(x, y)));
        }

        let mut desktop = Desktop::new(config.desktop.clone());
        let overrides = desktop.keymap_mut().apply_overrides(&config.key_bindings);
        if overrides > 0 {
            info!("applied {overrides} key binding override(s)");
        }
        desktop.add_item(Item::shortcut("Import", Shortcut::Import));
        desktop.add_item(Item::shortcut("Create Folder", Shortcut::NewFolder));
        desktop.add_item(Item::bin());

        let ctx = cc.egui_ctx.clone();
        let runner = TaskRunner::spawn(move || ctx.request_repaint());

        Self {
            desktop,
            config,
            runner,
            import_stop: None,
            measure_ready: false,
            snap_anims: Vec::new(),
            context_menu: None,
            rename: None,
            delete: None,
            warning_message: None,
            panel_origin: egui::Vec2::ZERO,
            geometry_dirty: false,
        }
    }

    /// Fonts exist only once the first frame has started.
    fn ensure_measure(&mut self, ctx: &egui::Context) {
        if !self.measure_ready {
            self.desktop
                .set_measure(Box::new(EguiMeasure { ctx: ctx.clone() }));
            self.measure_ready = true;
        }
    }

    fn show_warning<S: Into<String>>(&mut self, message: S) {
        self.warning_message = Some((message.into(), Instant::now()));
    }

    /// Geometry is kept in memory while the window moves; disk is touched
    /// only on exit.
    fn note_window_geometry(&mut self, pos: egui::Pos2, size: egui::Vec2) {
        if record_window_geometry(&mut self.config, pos, size) {
            self.geometry_dirty = true;
        }
    }

    fn save_window_geometry(&mut self) {
        if std::mem::take(&mut self.geometry_dirty) {
            debug!("saving window geometry");
            self.config.save();
        }
    }

    fn start_import(&mut self) {
        if let Some(previous) = self.import_stop.take() {
            previous.request_stop();
        }
        let root = self
            .config
            .import_root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let depth = self.config.import_depth;
        info!("importing {} (depth {depth})", root.display());
        let stop = self.runner.submit(runtime::IMPORT_TASK, move |stop| {
            runtime::scan_directory(&root, depth, stop)
        });
        self.import_stop = Some(stop);
    }

    fn apply_task_outputs(&mut self) {
        for output in self.runner.drain() {
            match output {
                TaskOutput::Items { into, items } => {
                    for spec in items {
                        if self.desktop.add_item_tree(spec, into).is_none() {
                            self.show_warning("Import target is gone");
                        }
                    }
                    self.import_stop = None;
                }
                TaskOutput::Failed { task, reason } => {
                    warn!("{task} failed: {reason}");
                    self.show_warning(format!("{task} failed"));
                }
                TaskOutput::Cancelled { task } => info!("{task} cancelled"),
            }
        }
    }

    fn start_snap_back(&mut self, preview: Vec<(ItemId, egui::Rect)>) {
        let start = Instant::now();
        self.snap_anims.retain(|anim| !preview.iter().any(|(id, _)| *id == anim.item));
        self.snap_anims
            .extend(preview.into_iter().map(|(item, rect)| SnapAnim {
                item,
                from: rect.min,
                start,
            }));
    }

    fn process_desktop_events(&mut self, ctx: &egui::Context) {
        for event in self.desktop.drain_events() {
            match event {
                DesktopEvent::Activated {
                    item,
                    activation: Activation::Context,
                    at,
                } => self.open_context_menu(ctx, vec![item], at),
                DesktopEvent::Activated {
                    item, activation, ..
                } => self.on_activated(item, activation),
                DesktopEvent::MultipleSelectionMenu { items, at } => {
                    self.open_context_menu(ctx, items, at)
                }
                DesktopEvent::ItemDropped { item, outcome } => {
                    debug!("dropped {item:?}: {outcome:?}");
                    if let DropOutcome::IntoFolder(folder) = outcome {
                        let name = self.desktop.label(folder).unwrap_or_default().to_string();
                        self.show_warning(format!("Moved into {name}"));
                    }
                }
                DesktopEvent::ItemRemoved { label, .. } => info!("removed {label}"),
                DesktopEvent::DeleteRequested(plan) => {
                    let labels = plan
                        .closure
                        .iter()
                        .filter_map(|&id| self.desktop.label(id))
                        .map(str::to_string)
                        .collect();
                    self.delete = Some(DeleteDialog { plan, labels });
                }
                DesktopEvent::RenameRequested(item) => {
                    if let Some(label) = self.desktop.label(item) {
                        self.rename = Some(RenameDialog {
                            item,
                            text: label.to_string(),
                            focus_requested: false,
                        });
                    }
                }
                DesktopEvent::ImportRequested => self.start_import(),
                DesktopEvent::Action { name, selection } => self.on_named_action(&name, &selection),
            }
        }
    }

    fn open_context_menu(&mut self, ctx: &egui::Context, items: Vec<ItemId>, at: egui::Pos2) {
        self.context_menu = Some(ContextMenu {
            items,
            at,
            opened_frame: ctx.cumulative_pass_nr(),
        });
    }

    fn on_activated(&mut self, item: ItemId, activation: Activation) {
        let path = self
            .desktop
            .item(item)
            .and_then(|i| i.payload())
            .and_then(|p| p.downcast_ref::<PathBuf>())
            .cloned();
        match (activation, path) {
            (Activation::Secondary, Some(path)) => {
                info!("open {}", path.display());
                self.show_warning(format!("{}", path.display()));
            }
            (activation, _) => debug!("{activation:?} on {item:?}"),
        }
    }

    fn on_named_action(&mut self, name: &str, selection: &[ItemId]) {
        match name {
            "new-network" => {
                let label = self.desktop.unique_label("Network");
                self.desktop.add_item(Item::generic(label, None));
            }
            "open" => self.start_import(),
            other => {
                info!("{other} requested for {} item(s)", selection.len());
                self.show_warning(format!("No handler for {other}"));
            }
        }
    }

    fn perform(&mut self, action: Action) {
        self.desktop.perform(&action);
    }
}

/// Returns whether `config` changed.
pub(super) fn record_window_geometry(
    config: &mut AppConfig,
    pos: egui::Pos2,
    size: egui::Vec2,
) -> bool {
    let size = sanitize_window_size(size);
    let pos = Some((pos.x, pos.y));
    let size = Some((size.x, size.y));
    if config.last_pos == pos && config.last_size == size {
        return false;
    }
    config.last_pos = pos;
    config.last_size = size;
    true
}

pub(super) fn sanitize_window_size(size: egui::Vec2) -> egui::Vec2 {
    let width = if size.x.is_finite() {
        size.x
    } else {
        WINDOW_WIDTH
    };
    let height = if size.y.is_finite() {
        size.y
    } else {
        WINDOW_HEIGHT
    };
    egui::vec2(width.max(MIN_WINDOW_WIDTH), height.max(MIN_WINDOW_HEIGHT))
}

pub(super) fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}
