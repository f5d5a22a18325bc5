use super::dropping::overlaps;
use super::{ClickRecord, Desktop};
use crate::events::{Activation, DesktopEvent, DropOutcome};
use crate::hooks::hooks_for;
use crate::item::ItemId;
use eframe::egui::{vec2, Modifiers, Pos2, Rect, Vec2};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pos: Pos2,
    pub button: PointerButton,
    pub modifiers: Modifiers,
    /// Seconds on any monotonic clock.
    pub time: f64,
}

impl PointerInput {
    pub fn primary(pos: Pos2, time: f64) -> Self {
        Self {
            pos,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            time,
        }
    }
}

/// One item following the pointer; `offset` is pointer minus item origin
/// at press time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DraggedItem {
    pub id: ItemId,
    pub offset: Vec2,
    pub origin: Pos2,
}

#[derive(Debug, Clone, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Button down on an item, not yet a click or a drag.
    Pressed {
        item: ItemId,
        button: PointerButton,
        press: Pos2,
        toggled: bool,
        moved: bool,
    },
    RubberBanding {
        anchor: Pos2,
        current: Pos2,
        additive: bool,
        prior: Vec<(ItemId, bool)>,
    },
    Dragging {
        anchor: DraggedItem,
        payload: Vec<DraggedItem>,
        pointer: Pos2,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    pub(crate) fn references(&self, id: ItemId) -> bool {
        match self {
            Gesture::Idle | Gesture::RubberBanding { .. } => false,
            Gesture::Pressed { item, .. } => *item == id,
            Gesture::Dragging { payload, .. } => payload.iter().any(|d| d.id == id),
        }
    }
}

fn is_additive(modifiers: Modifiers) -> bool {
    modifiers.shift || modifiers.command || modifiers.ctrl
}

impl Desktop {
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Runs `item`'s hook for `activation`.
    pub fn activate(&mut self, item: ItemId, activation: Activation, at: Pos2) {
        let Some(kind) = self.tree.get(item).map(|i| i.kind.clone()) else {
            return;
        };
        debug!("activate {item:?} {activation:?}");
        let hook = hooks_for(&kind).get(activation);
        hook(self, item, at);
        self.repaint = true;
    }

    pub fn pointer_pressed(&mut self, input: PointerInput) {
        if !self.gesture.is_idle() {
            self.cancel_gesture();
        }
        let Some(item) = self.item_at(input.pos) else {
            if input.button == PointerButton::Primary {
                self.begin_rubber_band(input);
            }
            return;
        };

        let toggled = input.button == PointerButton::Primary && is_additive(input.modifiers);
        if toggled {
            self.toggle(item);
        } else if input.button == PointerButton::Primary && !self.is_selected(item) {
            self.select_only(item);
        }
        self.gesture = Gesture::Pressed {
            item,
            button: input.button,
            press: input.pos,
            toggled,
            moved: false,
        };
        self.repaint = true;
    }

    fn begin_rubber_band(&mut self, input: PointerInput) {
        let prior: Vec<(ItemId, bool)> = self
            .visible_items()
            .map(|id| (id, self.is_selected(id)))
            .collect();
        let additive = is_additive(input.modifiers);
        if !additive {
            self.clear_selection();
        }
        debug!("rubber band from {:?}", input.pos);
        self.gesture = Gesture::RubberBanding {
            anchor: input.pos,
            current: input.pos,
            additive,
            prior,
        };
    }

    pub fn pointer_moved(&mut self, pos: Pos2, modifiers: Modifiers) {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Pressed {
                item,
                button,
                press,
                moved,
                ..
            } => {
                if press.distance(pos) <= self.config.click_slop {
                    return;
                }
                *moved = true;
                if *button == PointerButton::Primary {
                    let (item, press) = (*item, *press);
                    self.begin_drag(item, press, pos);
                }
            }
            Gesture::RubberBanding {
                current, additive, ..
            } => {
                *current = pos;
                let keep = *additive || is_additive(modifiers);
                self.apply_rubber_band(keep);
            }
            Gesture::Dragging { pointer, .. } => {
                *pointer = pos;
                self.repaint = true;
            }
        }
    }

    fn begin_drag(&mut self, item: ItemId, press: Pos2, pos: Pos2) {
        if !self.tree.get(item).is_some_and(|i| i.draggable) {
            return;
        }
        let mut ids = if self.is_selected(item) {
            self.top_selected_items()
        } else {
            vec![item]
        };
        ids.retain(|&id| self.tree.get(id).is_some_and(|i| i.draggable));
        if !ids.contains(&item) {
            ids.insert(0, item);
        }

        let payload: Vec<DraggedItem> = ids
            .into_iter()
            .filter_map(|id| {
                let origin = self.item_rect(id)?.min;
                Some(DraggedItem {
                    id,
                    offset: press - origin,
                    origin,
                })
            })
            .collect();
        let Some(anchor) = payload.iter().find(|d| d.id == item).copied() else {
            return;
        };
        debug!("dragging {} item(s) anchored on {item:?}", payload.len());
        self.gesture = Gesture::Dragging {
            anchor,
            payload,
            pointer: pos,
        };
        self.repaint = true;
    }

    fn apply_rubber_band(&mut self, keep_outside: bool) {
        let Gesture::RubberBanding {
            anchor,
            current,
            prior,
            ..
        } = &self.gesture
        else {
            return;
        };
        let band = Rect::from_two_pos(*anchor, *current);
        let prior = prior.clone();
        for (id, was_selected) in prior {
            let inside = self.item_rect(id).is_some_and(|r| overlaps(r, band));
            let selected = inside || (keep_outside && was_selected);
            self.set_selection_state(id, selected);
        }
        self.repaint = true;
    }

    fn set_selection_state(&mut self, id: ItemId, selected: bool) {
        if selected {
            self.select(id);
        } else {
            self.deselect(id);
        }
    }

    /// Finishes the gesture. Returns the drop outcome when it was a drag.
    pub fn pointer_released(&mut self, input: PointerInput) -> Option<DropOutcome> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => None,
            Gesture::Pressed {
                item,
                button,
                press,
                toggled,
                moved,
            } => {
                if moved || press.distance(input.pos) > self.config.click_slop {
                    return None;
                }
                match button {
                    PointerButton::Primary if !toggled => self.click(item, input),
                    PointerButton::Primary => {}
                    PointerButton::Secondary => self.context_click(item, input.pos),
                    PointerButton::Middle => {
                        self.activate(item, Activation::Tertiary, input.pos)
                    }
                }
                None
            }
            Gesture::RubberBanding {
                anchor,
                additive,
                prior,
                ..
            } => {
                self.gesture = Gesture::RubberBanding {
                    anchor,
                    current: input.pos,
                    additive,
                    prior,
                };
                self.apply_rubber_band(additive || is_additive(input.modifiers));
                self.gesture = Gesture::Idle;
                self.narrow_to_leftmost_column();
                self.repaint = true;
                None
            }
            Gesture::Dragging {
                anchor, payload, ..
            } => {
                let outcome = self.resolve_drop(anchor, &payload, input.pos);
                self.repaint = true;
                Some(outcome)
            }
        }
    }

    fn click(&mut self, item: ItemId, input: PointerInput) {
        if !self.tree.contains(item) {
            return;
        }
        self.select_only(item);
        let double = self.last_click.is_some_and(|last| {
            last.item == item
                && input.time - last.time <= self.config.double_click_secs
                && last.pos.distance(input.pos) <= self.config.click_slop
        });
        if double {
            self.last_click = None;
            self.activate(item, Activation::Secondary, input.pos);
        } else {
            self.last_click = Some(ClickRecord {
                item,
                time: input.time,
                pos: input.pos,
            });
            self.activate(item, Activation::Primary, input.pos);
        }
    }

    fn context_click(&mut self, item: ItemId, at: Pos2) {
        if !self.tree.contains(item) {
            return;
        }
        if self.is_selected(item) && self.selection_count() > 1 {
            let items = self.selected_items();
            self.push_event(DesktopEvent::MultipleSelectionMenu { items, at });
        } else {
            self.select_only(item);
            self.activate(item, Activation::Context, at);
        }
    }

    /// Aborts the current gesture; a rubber band restores the selection it
    /// started from.
    pub fn cancel_gesture(&mut self) {
        if let Gesture::RubberBanding { prior, .. } = std::mem::take(&mut self.gesture) {
            for (id, selected) in prior {
                self.set_selection_state(id, selected);
            }
        }
        self.repaint = true;
    }

    /// Where the dragged items are drawn right now.
    pub fn drag_preview(&self) -> Vec<(ItemId, Rect)> {
        let Gesture::Dragging {
            payload, pointer, ..
        } = &self.gesture
        else {
            return Vec::new();
        };
        payload
            .iter()
            .filter_map(|d| {
                let width = self.tree.get(d.id)?.preferred_width;
                let rect = Rect::from_min_size(
                    *pointer - d.offset,
                    vec2(width, self.config.item_height),
                );
                Some((d.id, rect))
            })
            .collect()
    }

    pub fn rubber_band(&self) -> Option<Rect> {
        match &self.gesture {
            Gesture::RubberBanding {
                anchor, current, ..
            } => Some(Rect::from_two_pos(*anchor, *current)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use eframe::egui::pos2;

    fn press(d: &mut Desktop, pos: Pos2, time: f64) {
        d.pointer_pressed(PointerInput::primary(pos, time));
    }

    fn release(d: &mut Desktop, pos: Pos2, time: f64) -> Option<DropOutcome> {
        d.pointer_released(PointerInput::primary(pos, time))
    }

    fn centre(d: &Desktop, id: ItemId) -> Pos2 {
        d.item_rect(id).map(|r| r.center()).unwrap_or(Pos2::ZERO)
    }

    #[test]
    fn click_selects_and_activates() {
        let mut d = Desktop::default();
        let a = d.add_item(Item::generic("a", None));
        let b = d.add_item(Item::generic("b", None));
        d.select(b);

        let at = centre(&d, a);
        press(&mut d, at, 0.0);
        assert!(release(&mut d, at + vec2(2.0, 0.0), 0.1).is_none());
        assert_eq!(d.selected_items(), vec![a]);
        assert!(matches!(
            d.drain_events().as_slice(),
            [DesktopEvent::Activated {
                activation: Activation::Primary,
                ..
            }]
        ));
    }

    #[test]
    fn second_quick_click_is_a_double_click() {
        let mut d = Desktop::default();
        let a = d.add_item(Item::generic("a", None));
        let at = centre(&d, a);
        press(&mut d, at, 0.0);
        release(&mut d, at, 0.05);
        press(&mut d, at, 0.2);
        release(&mut d, at, 0.25);
        press(&mut d, at, 5.0);
        release(&mut d, at, 5.05);

        let kinds: Vec<Activation> = d
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                DesktopEvent::Activated { activation, .. } => Some(activation),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![Activation::Primary, Activation::Secondary, Activation::Primary]
        );
    }

    #[test]
    fn movement_past_the_slop_starts_a_drag() {
        let mut d = Desktop::default();
        let a = d.add_item(Item::generic("a", None));
        let at = centre(&d, a);
        press(&mut d, at, 0.0);
        d.pointer_moved(at + vec2(2.0, 0.0), Modifiers::NONE);
        assert!(matches!(d.gesture(), Gesture::Pressed { .. }));
        d.pointer_moved(at + vec2(0.0, 40.0), Modifiers::NONE);
        let preview = d.drag_preview();
        assert_eq!(preview.len(), 1);
        let rect = d.item_rect(a).expect("visible");
        assert_eq!(preview[0].1.min, rect.min + vec2(0.0, 40.0));
    }

    #[test]
    fn fixed_items_never_drag() {
        let mut d = Desktop::default();
        let bin = d.add_item(Item::bin());
        let at = centre(&d, bin);
        press(&mut d, at, 0.0);
        d.pointer_moved(at + vec2(50.0, 50.0), Modifiers::NONE);
        assert!(d.drag_preview().is_empty());
        assert!(release(&mut d, at + vec2(50.0, 50.0), 0.1).is_none());
        assert!(d.drain_events().is_empty());
    }

    #[test]
    fn right_click_on_multi_selection_opens_the_group_menu() {
        let mut d = Desktop::default();
        let a = d.add_item(Item::generic("a", None));
        let b = d.add_item(Item::generic("b", None));
        d.select(a);
        d.select(b);
        d.drain_events();

        let at = centre(&d, b);
        let input = PointerInput {
            button: PointerButton::Secondary,
            ..PointerInput::primary(at, 0.0)
        };
        d.pointer_pressed(input);
        assert!(d.drain_events().is_empty());
        d.pointer_released(input);
        assert_eq!(
            d.drain_events(),
            vec![DesktopEvent::MultipleSelectionMenu {
                items: vec![a, b],
                at,
            }]
        );
    }

    #[test]
    fn shift_click_toggles_without_activating() {
        let mut d = Desktop::default();
        let a = d.add_item(Item::generic("a", None));
        let b = d.add_item(Item::generic("b", None));
        d.select(a);
        let at = centre(&d, b);
        let input = PointerInput {
            modifiers: Modifiers::SHIFT,
            ..PointerInput::primary(at, 0.0)
        };
        d.pointer_pressed(input);
        d.pointer_released(input);
        assert_eq!(d.selected_items(), vec![a, b]);
        assert!(d.drain_events().is_empty());
    }

    #[test]
    fn cancelled_band_restores_the_prior_selection() {
        let mut d = Desktop::default();
        let a = d.add_item(Item::generic("a", None));
        d.add_item(Item::generic("b", None));
        d.select(a);

        press(&mut d, pos2(400.0, 400.0), 0.0);
        assert!(d.selected_items().is_empty());
        d.pointer_moved(pos2(0.0, 0.0), Modifiers::NONE);
        assert_eq!(d.selected_items().len(), 2);
        d.cancel_gesture();
        assert_eq!(d.selected_items(), vec![a]);
        assert!(d.rubber_band().is_none());
    }

    #[test]
    fn context_and_middle_clicks_fire_on_release_within_the_slop() {
        let mut d = Desktop::default();
        let a = d.add_item(Item::generic("a", None));
        let at = centre(&d, a);
        let middle = PointerInput {
            button: PointerButton::Middle,
            ..PointerInput::primary(at, 0.0)
        };

        d.pointer_pressed(middle);
        assert!(d.drain_events().is_empty());
        d.pointer_released(middle);
        assert!(matches!(
            d.drain_events().as_slice(),
            [DesktopEvent::Activated {
                activation: Activation::Tertiary,
                ..
            }]
        ));

        let right = PointerInput {
            button: PointerButton::Secondary,
            ..middle
        };
        d.pointer_pressed(right);
        d.pointer_moved(at + vec2(30.0, 0.0), Modifiers::NONE);
        assert!(d.drag_preview().is_empty());
        d.pointer_released(PointerInput {
            pos: at + vec2(30.0, 0.0),
            ..right
        });
        assert!(d.drain_events().is_empty());
    }
}
