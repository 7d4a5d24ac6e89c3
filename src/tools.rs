use egui::Color32;

use crate::stroke::StrokeStyle;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ToolKind {
    #[default]
    Pen,
    Highlighter,
}

impl ToolKind {
    pub fn width(self) -> f32 {
        match self {
            ToolKind::Pen => 4.0,
            ToolKind::Highlighter => 20.0,
        }
    }

    pub fn alpha(self) -> f32 {
        match self {
            ToolKind::Pen => 1.0,
            ToolKind::Highlighter => 0.6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Pen => "pen",
            ToolKind::Highlighter => "highlighter",
        }
    }

    /// Style for new strokes drawn with this tool in `hue`.
    /// The hue's own alpha is ignored.
    pub fn style(self, hue: Color32) -> StrokeStyle {
        let [r, g, b, _] = hue.to_srgba_unmultiplied();
        let alpha = (self.alpha() * 255.0).round() as u8;
        StrokeStyle::new(Color32::from_rgba_unmultiplied(r, g, b, alpha), self.width())
    }
}
