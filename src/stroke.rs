use egui::{Color32, Pos2};
use std::sync::Arc;

/// Color and width a stroke is drawn with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color32,
    pub width: f32,
}

impl StrokeStyle {
    pub fn new(color: Color32, width: f32) -> Self {
        Self { color, width }
    }
}

// Immutable stroke for sharing
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    points: Vec<Pos2>,
    color: Color32,
    width: f32,
}

// Stroke being drawn; the only mutable kind
#[derive(Debug, Clone)]
pub struct InProgressStroke {
    points: Vec<Pos2>,
    style: StrokeStyle,
}

// Define a reference-counted type alias for Stroke
pub type StrokeRef = Arc<Stroke>;

impl Stroke {
    pub fn new(color: Color32, width: f32, points: Vec<Pos2>) -> Self {
        Self {
            points,
            color,
            width,
        }
    }

    pub fn new_ref(color: Color32, width: f32, points: Vec<Pos2>) -> StrokeRef {
        Arc::new(Self::new(color, width, points))
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn style(&self) -> StrokeStyle {
        StrokeStyle::new(self.color, self.width)
    }
}

impl InProgressStroke {
    /// Start a stroke at `point`
    pub fn new(point: Pos2, style: StrokeStyle) -> Self {
        Self {
            points: vec![point],
            style,
        }
    }

    pub fn add_point(&mut self, point: Pos2) {
        self.points.push(point);
    }

    /// Promote to a finished stroke, or `None` if no points were recorded
    pub fn finish(self) -> Option<StrokeRef> {
        if self.points.is_empty() {
            return None;
        }
        Some(Stroke::new_ref(self.style.color, self.style.width, self.points))
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }
}
