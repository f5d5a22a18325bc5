use eframe::egui::{Color32, FontId};
use netdesk::IconHandle;

pub const ITEM_ROUNDING: f32 = 5.0;
pub const DROP_SHADOW: f32 = 6.0;
pub const LABEL_SIZE: f32 = 14.0;
pub const BOLD_LABEL_SIZE: f32 = 15.0;

#[derive(Clone, Copy)]
pub struct DeskTheme {
    pub background: Color32,
    pub column_band: Color32,
    pub title_color: Color32,
    pub parent_color: Color32,
    pub row_bg: Color32,
    pub row_selected: Color32,
    pub row_expanded: Color32,
    pub row_border: Color32,
    pub band_fill: Color32,
    pub band_stroke: Color32,
    pub drop_hint: Color32,
    pub toast_bg: Color32,
    pub toast_text: Color32,
}

impl Default for DeskTheme {
    fn default() -> Self {
        Self {
            background: Color32::from_rgb(14, 20, 31),
            column_band: Color32::from_rgba_premultiplied(24, 36, 50, 90),
            title_color: Color32::from_rgb(226, 234, 244),
            parent_color: Color32::from_rgb(242, 248, 255),
            row_bg: Color32::from_rgba_premultiplied(24, 36, 50, 154),
            row_selected: Color32::from_rgba_premultiplied(45, 104, 114, 192),
            row_expanded: Color32::from_rgba_premultiplied(35, 53, 74, 184),
            row_border: Color32::from_rgba_premultiplied(147, 169, 194, 78),
            band_fill: Color32::from_rgba_premultiplied(93, 214, 189, 28),
            band_stroke: Color32::from_rgba_premultiplied(93, 214, 189, 160),
            drop_hint: Color32::from_rgba_premultiplied(93, 214, 189, 186),
            toast_bg: Color32::from_rgba_premultiplied(8, 12, 18, 236),
            toast_text: Color32::from_rgb(245, 250, 255),
        }
    }
}

/// Labels of items with children are drawn larger to stand out.
pub fn label_font(bold: bool) -> FontId {
    FontId::proportional(if bold { BOLD_LABEL_SIZE } else { LABEL_SIZE })
}

pub fn icon_glyph(icon: IconHandle) -> &'static str {
    match icon {
        IconHandle::FOLDER => "📁",
        IconHandle::BIN => "🗑",
        IconHandle::IMPORT => "📥",
        IconHandle::NEW_FOLDER => "➕",
        _ => "🔗",
    }
}
