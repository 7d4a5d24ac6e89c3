use egui::{Color32, Pos2, Vec2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::stroke::{Stroke, StrokeRef};
use crate::util::time;

/// Current on-disk format version
pub const RECORD_FILE_VERSION: u32 = 1;

/// Errors that can occur while saving or loading annotation records
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to serialize annotation records: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to access annotation file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid annotation data: {0}")]
    InvalidData(String),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordPoint {
    pub x: f32,
    pub y: f32,
}

impl From<Pos2> for RecordPoint {
    fn from(pos: Pos2) -> Self {
        Self { x: pos.x, y: pos.y }
    }
}

impl From<RecordPoint> for Pos2 {
    fn from(point: RecordPoint) -> Self {
        Pos2::new(point.x, point.y)
    }
}

/// Plain, serializable form of one finished stroke.
///
/// `color` is premultiplied sRGBA as stored by [`Color32`], so converting back
/// and forth never changes a channel value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub points: Vec<RecordPoint>,
    pub color: [u8; 4],
    pub width: f32,
}

impl AnnotationRecord {
    pub fn from_stroke(stroke: &Stroke) -> Self {
        Self {
            points: stroke.points().iter().copied().map(RecordPoint::from).collect(),
            color: stroke.color().to_array(),
            width: stroke.width(),
        }
    }

    /// Rebuild the stroke, or `None` for a record that cannot be drawn
    /// (no points, non-finite coordinates, non-positive width).
    pub fn to_stroke(&self) -> Option<StrokeRef> {
        if self.points.is_empty() {
            return None;
        }
        if !self.width.is_finite() || self.width <= 0.0 {
            log::warn!("Dropping annotation record with invalid width {}", self.width);
            return None;
        }
        if self.points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            log::warn!("Dropping annotation record with non-finite coordinates");
            return None;
        }

        let [r, g, b, a] = self.color;
        let points = self.points.iter().copied().map(Pos2::from).collect();
        Some(Stroke::new_ref(
            Color32::from_rgba_premultiplied(r, g, b, a),
            self.width,
            points,
        ))
    }
}

/// Envelope written to disk for a set of annotation records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFile {
    pub version: u32,
    /// UNIX seconds
    pub saved_at: u64,
    /// Size of the surface the points were captured on
    pub canvas: [f32; 2],
    pub records: Vec<AnnotationRecord>,
}

impl RecordFile {
    pub fn new(canvas: Vec2, records: Vec<AnnotationRecord>) -> Self {
        Self {
            version: RECORD_FILE_VERSION,
            saved_at: time::timestamp_secs(),
            canvas: [canvas.x, canvas.y],
            records,
        }
    }

    pub fn canvas_size(&self) -> Vec2 {
        Vec2::new(self.canvas[0], self.canvas[1])
    }

    pub fn save(&self, path: impl AsRef<Path>) -> PersistenceResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::debug!("Saved {} annotation records to {}", self.records.len(), path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let json = fs::read_to_string(path)?;
        let file: RecordFile = serde_json::from_str(&json)?;

        if file.version > RECORD_FILE_VERSION {
            return Err(PersistenceError::InvalidData(format!(
                "unsupported record file version {}",
                file.version
            )));
        }

        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_stroke_keeps_color_bits() {
        let color = Color32::from_rgba_unmultiplied(200, 40, 10, 153);
        let stroke = Stroke::new(color, 20.0, vec![Pos2::new(1.5, 2.25)]);
        let record = AnnotationRecord::from_stroke(&stroke);

        let rebuilt = record.to_stroke().unwrap();
        assert_eq!(rebuilt.color(), color);
        assert_eq!(rebuilt.width(), 20.0);
        assert_eq!(rebuilt.points(), stroke.points());
    }

    #[test]
    fn test_invalid_records_are_rejected() {
        let empty = AnnotationRecord {
            points: vec![],
            color: [0, 0, 0, 255],
            width: 4.0,
        };
        assert!(empty.to_stroke().is_none());

        let bad_width = AnnotationRecord {
            points: vec![RecordPoint { x: 1.0, y: 1.0 }],
            color: [0, 0, 0, 255],
            width: 0.0,
        };
        assert!(bad_width.to_stroke().is_none());

        let nan_point = AnnotationRecord {
            points: vec![RecordPoint { x: f32::NAN, y: 1.0 }],
            color: [0, 0, 0, 255],
            width: 4.0,
        };
        assert!(nan_point.to_stroke().is_none());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        // Nested to cover directory creation
        let path = dir.path().join("reports").join("annotations.json");
        let records = vec![AnnotationRecord {
            points: vec![RecordPoint { x: 0.1, y: 0.2 }, RecordPoint { x: 3.3, y: 4.4 }],
            color: [255, 0, 0, 255],
            width: 4.0,
        }];
        let file = RecordFile::new(Vec2::new(320.0, 480.0), records);

        file.save(&path).unwrap();
        let loaded = RecordFile::load(&path).unwrap();
        assert_eq!(loaded, file);
        assert_eq!(loaded.canvas_size(), Vec2::new(320.0, 480.0));
    }

    #[test]
    fn test_load_rejects_future_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.json");
        let mut file = RecordFile::new(Vec2::new(1.0, 1.0), Vec::new());
        file.version = RECORD_FILE_VERSION + 1;
        file.save(&path).unwrap();

        assert!(matches!(
            RecordFile::load(&path),
            Err(PersistenceError::InvalidData(_))
        ));
    }
}
