use egui::Pos2;

use crate::record::AnnotationRecord;
use crate::stroke::{InProgressStroke, StrokeRef, StrokeStyle};

/// Finished strokes in z-order plus at most one stroke being drawn.
///
/// Finished strokes are never mutated: they are appended, popped from the
/// tail by [`StrokeStore::undo`], or dropped all at once by [`StrokeStore::clear`].
#[derive(Debug, Clone, Default)]
pub struct StrokeStore {
    strokes: Vec<StrokeRef>,
    current: Option<InProgressStroke>,
}

impl StrokeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new stroke at `point`. An unfinished stroke is discarded.
    pub fn begin(&mut self, point: Pos2, style: StrokeStyle) {
        if self.current.is_some() {
            log::debug!("Discarding unfinished stroke on new pointer-down");
        }
        self.current = Some(InProgressStroke::new(point, style));
    }

    /// Append to the stroke being drawn. Returns false if none is in progress.
    pub fn extend(&mut self, point: Pos2) -> bool {
        match &mut self.current {
            Some(stroke) => {
                stroke.add_point(point);
                true
            }
            None => false,
        }
    }

    /// Promote the stroke being drawn to the tail of the collection.
    /// Returns true if a stroke was added.
    pub fn end(&mut self) -> bool {
        match self.current.take().and_then(InProgressStroke::finish) {
            Some(stroke) => {
                self.strokes.push(stroke);
                true
            }
            None => false,
        }
    }

    /// Remove the last finished stroke
    pub fn undo(&mut self) -> Option<StrokeRef> {
        self.strokes.pop()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.current = None;
    }

    /// Replace the finished strokes with the given records, skipping any that
    /// cannot be drawn. Any stroke in progress is discarded.
    pub fn load(&mut self, records: &[AnnotationRecord]) {
        self.current = None;
        self.strokes = records.iter().filter_map(AnnotationRecord::to_stroke).collect();

        let skipped = records.len() - self.strokes.len();
        if skipped > 0 {
            log::warn!("Skipped {} empty or invalid annotation records", skipped);
        }
    }

    pub fn snapshot(&self) -> Vec<AnnotationRecord> {
        self.strokes
            .iter()
            .map(|stroke| AnnotationRecord::from_stroke(stroke))
            .collect()
    }

    pub fn strokes(&self) -> &[StrokeRef] {
        &self.strokes
    }

    pub fn in_progress(&self) -> Option<&InProgressStroke> {
        self.current.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.current.is_some()
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Color32, pos2};

    fn pen() -> StrokeStyle {
        StrokeStyle::new(Color32::RED, 4.0)
    }

    #[test]
    fn test_extend_without_begin_is_noop() {
        let mut store = StrokeStore::new();
        assert!(!store.extend(pos2(1.0, 1.0)));
        assert!(!store.end());
        assert!(store.is_empty());
    }

    #[test]
    fn test_begin_twice_keeps_last_stroke() {
        let mut store = StrokeStore::new();
        store.begin(pos2(0.0, 0.0), pen());
        store.extend(pos2(1.0, 1.0));
        store.begin(pos2(50.0, 50.0), pen());
        assert!(store.end());

        assert_eq!(store.len(), 1);
        assert_eq!(store.strokes()[0].points(), &[pos2(50.0, 50.0)]);
    }

    #[test]
    fn test_style_is_captured_at_begin() {
        let mut store = StrokeStore::new();
        store.begin(pos2(0.0, 0.0), pen());
        store.end();
        store.begin(pos2(0.0, 0.0), StrokeStyle::new(Color32::BLUE, 20.0));
        store.end();

        assert_eq!(store.strokes()[0].style(), pen());
        assert_eq!(store.strokes()[1].width(), 20.0);
    }
}
