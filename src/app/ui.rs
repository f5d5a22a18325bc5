use super::state::DeleteDialog;
use super::style::{icon_glyph, label_font, DeskTheme, DROP_SHADOW, ITEM_ROUNDING};
use super::{ease_out_cubic, DeskApp, MAX_DELETE_PREVIEW};
use eframe::egui;
use log::debug;
use netdesk::{Action, DropOutcome, ItemId, PointerButton, PointerInput};
use std::time::Duration;

const SNAP_BACK_MS: u64 = 220;

impl eframe::App for DeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_measure(ctx);
        self.apply_task_outputs();
        self.track_window_geometry(ctx);

        let theme = DeskTheme::default();
        self.draw_desktop(ctx, &theme);
        self.handle_keys(ctx);
        self.process_desktop_events(ctx);

        self.draw_context_menu(ctx);
        self.draw_rename_window(ctx);
        self.draw_delete_window(ctx);

        if self.desktop.take_repaint() {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(stop) = self.import_stop.take() {
            stop.request_stop();
        }
        self.save_window_geometry();
    }
}

impl DeskApp {
    fn modal_open(&self) -> bool {
        self.context_menu.is_some() || self.rename.is_some() || self.delete.is_some()
    }

    fn track_window_geometry(&mut self, ctx: &egui::Context) {
        let (outer, inner) = ctx.input(|i| (i.viewport().outer_rect, i.viewport().inner_rect));
        if let (Some(outer), Some(inner)) = (outer, inner) {
            self.note_window_geometry(outer.min, inner.size());
        }
    }

    fn draw_desktop(&mut self, ctx: &egui::Context, theme: &DeskTheme) {
        let panel_frame = egui::Frame::none()
            .fill(theme.background)
            .stroke(egui::Stroke::NONE);

        egui::CentralPanel::default()
            .frame(panel_frame)
            .show(ctx, |ui| {
                let response =
                    ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
                self.panel_origin = response.rect.min.to_vec2();
                if !self.modal_open() {
                    self.feed_pointer(ctx);
                }

                let painter = ui.painter().clone();
                self.paint_columns(&painter, response.rect, theme);
                self.paint_items(&painter, theme);
                self.paint_rubber_band(&painter, theme);
                self.paint_drag_ghosts(ctx, theme);
                self.paint_snap_backs(ctx, theme);
                self.draw_warning_overlay(ui, theme);
            });
    }

    /// Translates raw egui pointer events into desktop coordinates.
    fn feed_pointer(&mut self, ctx: &egui::Context) {
        let (events, modifiers, time) =
            ctx.input(|i| (i.events.clone(), i.modifiers, i.time));
        let origin = self.panel_origin;

        for event in events {
            match event {
                egui::Event::PointerMoved(pos) => {
                    self.desktop.pointer_moved(pos - origin, modifiers);
                }
                egui::Event::PointerButton {
                    pos,
                    button,
                    pressed,
                    modifiers,
                } => {
                    let button = match button {
                        egui::PointerButton::Primary => PointerButton::Primary,
                        egui::PointerButton::Secondary => PointerButton::Secondary,
                        egui::PointerButton::Middle => PointerButton::Middle,
                        _ => continue,
                    };
                    let input = PointerInput {
                        pos: pos - origin,
                        button,
                        modifiers,
                        time,
                    };
                    if pressed {
                        self.desktop.pointer_pressed(input);
                        continue;
                    }
                    let preview = self.desktop.drag_preview();
                    if let Some(DropOutcome::SnapBack) = self.desktop.pointer_released(input) {
                        self.start_snap_back(preview);
                    }
                }
                _ => {}
            }
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if self.modal_open() || ctx.memory(|m| m.focused().is_some()) {
            return;
        }
        let keys: Vec<(egui::Key, egui::Modifiers)> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        modifiers,
                        ..
                    } => Some((*key, *modifiers)),
                    _ => None,
                })
                .collect()
        });
        for (key, modifiers) in keys {
            if let Some(action) = self.desktop.handle_key(key, modifiers) {
                debug!("{key:?} ran {}", action.name());
            }
        }
    }

    fn paint_columns(&self, painter: &egui::Painter, panel: egui::Rect, theme: &DeskTheme) {
        let origin = self.panel_origin;
        let top = self.desktop.config().top_margin;
        for (column, width) in self.desktop.column_widths().iter().enumerate().skip(1) {
            let x = self.desktop.column_x(column) + origin.x;
            let band = egui::Rect::from_min_max(
                egui::pos2(x - 4.0, panel.min.y + top - 4.0),
                egui::pos2(x + width + 4.0, panel.max.y),
            );
            painter.rect_filled(band, ITEM_ROUNDING, theme.column_band);
        }
    }

    fn paint_items(&self, painter: &egui::Painter, theme: &DeskTheme) {
        let dragged: Vec<ItemId> = self
            .desktop
            .drag_preview()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        for id in self.desktop.visible_items() {
            if self.snap_anims.iter().any(|anim| anim.item == id) {
                continue;
            }
            let Some(rect) = self.desktop.item_rect(id) else {
                continue;
            };
            let rect = rect.translate(self.panel_origin);
            self.paint_item(painter, id, rect, theme, dragged.contains(&id));
        }
    }

    fn paint_item(
        &self,
        painter: &egui::Painter,
        id: ItemId,
        rect: egui::Rect,
        theme: &DeskTheme,
        faded: bool,
    ) {
        let Some(item) = self.desktop.item(id) else {
            return;
        };
        let cfg = self.desktop.config();
        let mut fill = if item.is_selected() {
            theme.row_selected
        } else if self.desktop.is_expanded(id) {
            theme.row_expanded
        } else {
            theme.row_bg
        };
        if faded {
            fill = fill.gamma_multiply(0.35);
        }
        painter.rect_filled(rect, ITEM_ROUNDING, fill);
        if item.is_selected() {
            painter.rect_stroke(rect, ITEM_ROUNDING, egui::Stroke::new(1.0, theme.drop_hint));
        }

        painter.text(
            egui::pos2(
                rect.min.x + cfg.item_padding + cfg.icon_width * 0.5,
                rect.center().y,
            ),
            egui::Align2::CENTER_CENTER,
            icon_glyph(item.icon()),
            egui::FontId::proportional(cfg.icon_width * 0.8),
            theme.title_color,
        );
        let bold = item.has_children();
        painter.text(
            egui::pos2(
                rect.min.x + cfg.item_padding + cfg.icon_width + cfg.icon_gap,
                rect.center().y,
            ),
            egui::Align2::LEFT_CENTER,
            item.label(),
            label_font(bold),
            if bold {
                theme.parent_color
            } else {
                theme.title_color
            },
        );
    }

    fn paint_rubber_band(&self, painter: &egui::Painter, theme: &DeskTheme) {
        if let Some(band) = self.desktop.rubber_band() {
            let band = band.translate(self.panel_origin);
            painter.rect_filled(band, 2.0, theme.band_fill);
            painter.rect_stroke(band, 2.0, egui::Stroke::new(1.0, theme.band_stroke));
        }
    }

    /// Dragged items are drawn on the foreground layer, above everything.
    fn paint_drag_ghosts(&self, ctx: &egui::Context, theme: &DeskTheme) {
        let preview = self.desktop.drag_preview();
        if preview.is_empty() {
            return;
        }
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("drag_ghost"),
        ));
        for (id, rect) in preview {
            let rect = rect.translate(self.panel_origin);
            painter.rect_filled(
                rect.expand(DROP_SHADOW),
                ITEM_ROUNDING + DROP_SHADOW,
                egui::Color32::from_rgba_premultiplied(0, 0, 0, 32),
            );
            self.paint_item(&painter, id, rect, theme, false);
        }
        ctx.request_repaint();
    }

    fn paint_snap_backs(&mut self, ctx: &egui::Context, theme: &DeskTheme) {
        let duration = Duration::from_millis(SNAP_BACK_MS);
        let desktop = &self.desktop;
        self.snap_anims
            .retain(|anim| anim.start.elapsed() < duration && desktop.is_visible(anim.item));
        if self.snap_anims.is_empty() {
            return;
        }

        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("snap_back"),
        ));
        for anim in &self.snap_anims {
            let Some(home) = self.desktop.item_rect(anim.item) else {
                continue;
            };
            let t = anim.start.elapsed().as_secs_f32() / duration.as_secs_f32();
            let eased = ease_out_cubic(t);
            let min = anim.from + (home.min - anim.from) * eased;
            let rect = egui::Rect::from_min_size(min, home.size()).translate(self.panel_origin);
            self.paint_item(&painter, anim.item, rect, theme, false);
        }
        ctx.request_repaint();
    }

    fn draw_context_menu(&mut self, ctx: &egui::Context) {
        let Some(menu) = &self.context_menu else {
            return;
        };
        let items: Vec<ItemId> = menu
            .items
            .iter()
            .copied()
            .filter(|&id| self.desktop.item(id).is_some())
            .collect();
        let opened_frame = menu.opened_frame;
        let at = menu.at + self.panel_origin;
        let single = match items.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
        let is_folder = single
            .and_then(|id| self.desktop.item(id))
            .is_some_and(|item| item.kind().is_folder());

        let mut chosen: Option<Action> = None;
        let mut expand: Option<ItemId> = None;
        let area = egui::Area::new(egui::Id::new("desk_context_menu"))
            .order(egui::Order::Foreground)
            .fixed_pos(at)
            .show(ctx, |ui| {
                egui::Frame::menu(ui.style()).show(ui, |ui| {
                    ui.set_min_width(150.0);
                    if let Some(id) = single {
                        if is_folder && ui.button("Show contents").clicked() {
                            expand = Some(id);
                        }
                        if ui.button("Rename").clicked() {
                            chosen = Some(Action::Rename);
                        }
                    }
                    let delete_label = match single {
                        Some(_) => "Delete".to_string(),
                        None => format!("Delete {} items", items.len()),
                    };
                    if ui.button(delete_label).clicked() {
                        chosen = Some(Action::DeleteSelection);
                    }
                    ui.separator();
                    for (label, name) in [
                        ("Extract", "extract"),
                        ("Visualize", "visualize"),
                        ("Save", "save"),
                    ] {
                        if ui.button(label).clicked() {
                            chosen = Some(Action::Named(name.to_string()));
                        }
                    }
                });
            });

        let pressed_outside = ctx.cumulative_pass_nr() > opened_frame
            && ctx.input(|i| {
                i.pointer.any_pressed()
                    && i
                        .pointer
                        .interact_pos()
                        .is_some_and(|p| !area.response.rect.contains(p))
            });
        let escape = ctx.input(|i| i.key_pressed(egui::Key::Escape));

        if items.is_empty() || pressed_outside || escape || chosen.is_some() || expand.is_some() {
            self.context_menu = None;
        }
        if let Some(id) = expand {
            self.desktop.display_children_of(id);
        }
        if let Some(action) = chosen {
            self.perform(action);
        }
    }

    fn draw_rename_window(&mut self, ctx: &egui::Context) {
        let Some(mut dialog) = self.rename.take() else {
            return;
        };
        let mut decision: Option<bool> = None;
        egui::Window::new("Rename")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                let edit = ui.text_edit_singleline(&mut dialog.text);
                if !dialog.focus_requested {
                    edit.request_focus();
                    dialog.focus_requested = true;
                }
                if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    decision = Some(true);
                }
                ui.horizontal(|ui| {
                    if ui.button("Rename").clicked() {
                        decision = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        decision = Some(false);
                    }
                });
            });
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            decision = Some(false);
        }

        match decision {
            Some(true) => {
                let text = dialog.text.trim();
                if text.is_empty() {
                    self.show_warning("Name cannot be empty");
                    self.rename = Some(dialog);
                } else if !self.desktop.rename_item(dialog.item, text) {
                    self.show_warning("Item no longer exists");
                }
            }
            Some(false) => {}
            None => self.rename = Some(dialog),
        }
    }

    fn draw_delete_window(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.delete.take() else {
            return;
        };
        let mut decision: Option<bool> = None;
        egui::Window::new("Delete items")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!(
                    "Delete {} item(s)? This cannot be undone.",
                    dialog.labels.len()
                ));
                for label in dialog.labels.iter().take(MAX_DELETE_PREVIEW) {
                    ui.label(format!("• {label}"));
                }
                if dialog.labels.len() > MAX_DELETE_PREVIEW {
                    ui.weak(format!(
                        "… and {} more",
                        dialog.labels.len() - MAX_DELETE_PREVIEW
                    ));
                }
                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        decision = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        decision = Some(false);
                    }
                });
            });
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            decision = Some(false);
        }

        match decision {
            Some(true) => {
                let DeleteDialog { plan, labels } = dialog;
                let removed = self.desktop.apply_deletion(&plan);
                debug!("deleted {removed} root(s), {} item(s) total", labels.len());
            }
            Some(false) => {}
            None => self.delete = Some(dialog),
        }
    }

    fn draw_warning_overlay(&mut self, ui: &egui::Ui, theme: &DeskTheme) {
        if let Some((msg, start_time)) = &self.warning_message {
            let elapsed = start_time.elapsed();
            if elapsed < Duration::from_secs(2) {
                let painter = ui.ctx().layer_painter(egui::LayerId::new(
                    egui::Order::Foreground,
                    egui::Id::new("warning"),
                ));
                let rect = ui.clip_rect();

                let galley = painter.layout(
                    msg.clone(),
                    egui::FontId::proportional(15.0),
                    theme.toast_text,
                    f32::INFINITY,
                );

                let text_rect = galley.rect;
                let anchor = egui::pos2(rect.center().x, rect.max.y - 40.0);
                let placed = text_rect.translate(anchor - text_rect.center());
                painter.rect_filled(placed.expand(10.0), 10.0, theme.toast_bg);
                painter.rect_stroke(
                    placed.expand(10.0),
                    10.0,
                    egui::Stroke::new(1.0, theme.row_border),
                );
                painter.galley(placed.min, galley, theme.toast_text);
                ui.ctx().request_repaint();
            } else {
                self.warning_message = None;
            }
        }
    }
}
