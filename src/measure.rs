/// Measures rendered label widths so the layout can size columns.
pub trait TextMeasure {
    fn text_width(&self, text: &str, bold: bool) -> f32;
}

/// Per-character width estimate used when no font backend is available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharWidthMeasure {
    pub char_width: f32,
    pub bold_factor: f32,
}

impl Default for CharWidthMeasure {
    fn default() -> Self {
        Self {
            char_width: 7.0,
            bold_factor: 1.1,
        }
    }
}

impl TextMeasure for CharWidthMeasure {
    fn text_width(&self, text: &str, bold: bool) -> f32 {
        let base = text.chars().count() as f32 * self.char_width;
        if bold {
            base * self.bold_factor
        } else {
            base
        }
    }
}
