use egui::{Color32, Rect, Vec2};
use image::RgbaImage;
use thiserror::Error;

use crate::geometry::AspectFit;
use crate::record::{AnnotationRecord, RecordFile};
use crate::surface::{DrawingSurface, PointerEvent};
use crate::tools::ToolKind;

/// Errors that can occur while editing an annotation
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("Cannot {action} a {state} annotation session")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error("Cannot annotate an empty image ({width}x{height}) in a {container:?} container")]
    EmptyImage {
        width: u32,
        height: u32,
        container: Vec2,
    },

    #[error("Clear request belongs to another session")]
    ForeignClearRequest,
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Finished,
}

impl SessionState {
    fn name(self) -> &'static str {
        match self {
            SessionState::Open => "open",
            SessionState::Finished => "finished",
        }
    }
}

/// Proof that the user confirmed clearing every stroke
#[derive(Debug)]
#[must_use = "a clear request does nothing until passed to clear_all"]
pub struct ClearRequest {
    session_id: uuid::Uuid,
}

/// What a finished session hands back to its caller
#[derive(Debug, Clone)]
pub struct AnnotationOutcome {
    /// The screenshot with every stroke composited at full resolution
    pub image: RgbaImage,
    /// The strokes in surface coordinates, for resuming later
    pub records: Vec<AnnotationRecord>,
    pub canvas_size: Vec2,
}

impl AnnotationOutcome {
    pub fn record_file(&self) -> RecordFile {
        RecordFile::new(self.canvas_size, self.records.clone())
    }
}

/// One editing pass over one screenshot.
pub struct AnnotationSession {
    id: uuid::Uuid,
    state: SessionState,
    image: RgbaImage,
    fit: AspectFit,
    surface: DrawingSurface,
    tool: ToolKind,
    hue: Color32,
}

impl std::fmt::Debug for AnnotationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("image", &self.image.dimensions())
            .field("surface", &self.surface)
            .field("tool", &self.tool)
            .finish()
    }
}

impl AnnotationSession {
    /// Default pen hue
    pub const DEFAULT_HUE: Color32 = Color32::RED;

    /// Open a session over `image` shown in a container of `container_size`,
    /// resuming from `existing` strokes captured earlier on the same image.
    pub fn open(
        image: RgbaImage,
        container_size: Vec2,
        existing: &[AnnotationRecord],
    ) -> SessionResult<Self> {
        let image_size = Vec2::new(image.width() as f32, image.height() as f32);
        let Some(fit) = AspectFit::new(image_size, container_size) else {
            return Err(SessionError::EmptyImage {
                width: image.width(),
                height: image.height(),
                container: container_size,
            });
        };

        let tool = ToolKind::default();
        let hue = Self::DEFAULT_HUE;
        let mut surface = DrawingSurface::new(container_size, tool.style(hue));
        surface.load(existing);

        let id = uuid::Uuid::new_v4();
        log::info!(
            "Opened annotation session {} over {}x{} image with {} strokes",
            id,
            image.width(),
            image.height(),
            surface.store().len()
        );

        Ok(Self {
            id,
            state: SessionState::Open,
            image,
            fit,
            surface,
            tool,
            hue,
        })
    }

    fn ensure_open(&self, action: &'static str) -> SessionResult<()> {
        match self.state {
            SessionState::Open => Ok(()),
            state => Err(SessionError::InvalidTransition {
                state: state.name(),
                action,
            }),
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn hue(&self) -> Color32 {
        self.hue
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn aspect_fit(&self) -> AspectFit {
        self.fit
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    /// Affects strokes started from now on only
    pub fn select_tool(&mut self, tool: ToolKind) -> SessionResult<()> {
        self.ensure_open("select a tool in")?;
        self.tool = tool;
        self.surface.set_style(tool.style(self.hue));
        log::debug!("Session {} switched to {}", self.id, tool.name());
        Ok(())
    }

    pub fn set_hue(&mut self, hue: Color32) -> SessionResult<()> {
        self.ensure_open("change the color of")?;
        self.hue = hue;
        self.surface.set_style(self.tool.style(hue));
        Ok(())
    }

    pub fn pointer(&mut self, event: PointerEvent) -> SessionResult<Option<Rect>> {
        self.ensure_open("draw in")?;
        Ok(self.surface.handle(event))
    }

    pub fn undo(&mut self) -> SessionResult<Option<Rect>> {
        self.ensure_open("undo in")?;
        Ok(self.surface.undo())
    }

    /// Ask to clear every stroke. The returned request must be confirmed by
    /// the user and passed back to [`AnnotationSession::clear_all`].
    pub fn request_clear_all(&self) -> SessionResult<ClearRequest> {
        self.ensure_open("clear")?;
        Ok(ClearRequest {
            session_id: self.id,
        })
    }

    /// Drop every stroke. Returns the region to redraw (the whole surface).
    pub fn clear_all(&mut self, request: ClearRequest) -> SessionResult<Rect> {
        self.ensure_open("clear")?;
        if request.session_id != self.id {
            return Err(SessionError::ForeignClearRequest);
        }
        log::info!("Cleared {} strokes in session {}", self.surface.store().len(), self.id);
        Ok(self.surface.clear())
    }

    /// The editing view: screenshot letterboxed into the container with the
    /// strokes on top.
    pub fn preview(&mut self) -> SessionResult<RgbaImage> {
        self.ensure_open("preview")?;
        Ok(self.surface.preview_over(&self.image))
    }

    pub fn records(&self) -> Vec<AnnotationRecord> {
        self.surface.snapshot()
    }

    /// Composite the strokes onto the screenshot and end the session.
    /// A stroke still being drawn is kept.
    pub fn finish(&mut self) -> SessionResult<AnnotationOutcome> {
        self.ensure_open("finish")?;
        self.surface.handle(PointerEvent::Cancel);

        let image = self.surface.composite_onto_image(&self.image);
        let records = self.surface.snapshot();
        self.state = SessionState::Finished;
        // The screenshot now lives in the outcome only.
        self.image = RgbaImage::new(0, 0);

        log::info!("Finished annotation session {} with {} strokes", self.id, records.len());
        Ok(AnnotationOutcome {
            image,
            records,
            canvas_size: self.surface.size(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;
    use image::Rgba;

    fn open_session() -> AnnotationSession {
        let image = RgbaImage::from_pixel(400, 200, Rgba([255, 255, 255, 255]));
        AnnotationSession::open(image, Vec2::new(300.0, 300.0), &[]).unwrap()
    }

    fn draw_line(session: &mut AnnotationSession, from: egui::Pos2, to: egui::Pos2) {
        session.pointer(PointerEvent::Down(from)).unwrap();
        session.pointer(PointerEvent::Move(to)).unwrap();
        session.pointer(PointerEvent::Up(to)).unwrap();
    }

    #[test]
    fn test_open_rejects_empty_image() {
        let result = AnnotationSession::open(RgbaImage::new(0, 10), Vec2::new(10.0, 10.0), &[]);
        assert!(matches!(result, Err(SessionError::EmptyImage { .. })));
    }

    #[test]
    fn test_tool_change_keeps_finished_strokes() {
        let mut session = open_session();
        draw_line(&mut session, pos2(10.0, 100.0), pos2(50.0, 100.0));
        session.select_tool(ToolKind::Highlighter).unwrap();
        session.set_hue(Color32::YELLOW).unwrap();
        draw_line(&mut session, pos2(10.0, 150.0), pos2(50.0, 150.0));

        let records = session.records();
        assert_eq!(records[0].width, 4.0);
        assert_eq!(records[0].color, Color32::RED.to_array());
        assert_eq!(records[1].width, 20.0);
        assert_eq!(records[1].color[3], 153);
    }

    #[test]
    fn test_clear_all_needs_matching_request() {
        let mut session = open_session();
        let mut other = open_session();
        draw_line(&mut session, pos2(10.0, 100.0), pos2(50.0, 100.0));

        let foreign = other.request_clear_all().unwrap();
        assert_eq!(session.clear_all(foreign), Err(SessionError::ForeignClearRequest));
        assert_eq!(session.records().len(), 1);

        let request = session.request_clear_all().unwrap();
        session.clear_all(request).unwrap();
        assert!(session.records().is_empty());
        assert_eq!(session.state(), SessionState::Open);
        assert!(other.undo().is_ok());
    }

    #[test]
    fn test_finish_is_terminal() {
        let mut session = open_session();
        draw_line(&mut session, pos2(10.0, 100.0), pos2(50.0, 100.0));
        let outcome = session.finish().unwrap();
        assert_eq!(outcome.image.dimensions(), (400, 200));
        assert_eq!(outcome.records.len(), 1);

        assert_eq!(session.state(), SessionState::Finished);
        assert_eq!(
            session.finish().unwrap_err(),
            SessionError::InvalidTransition {
                state: "finished",
                action: "finish",
            }
        );
        assert_eq!(
            session.undo().unwrap_err().to_string(),
            "Cannot undo in a finished annotation session"
        );
        assert!(session.undo().is_err());
        assert!(session.pointer(PointerEvent::Down(pos2(1.0, 1.0))).is_err());
        assert!(session.request_clear_all().is_err());
    }

    #[test]
    fn test_finish_keeps_stroke_in_progress() {
        let mut session = open_session();
        session.pointer(PointerEvent::Down(pos2(150.0, 150.0))).unwrap();
        session.pointer(PointerEvent::Move(pos2(160.0, 150.0))).unwrap();

        let outcome = session.finish().unwrap();
        assert_eq!(outcome.records.len(), 1);
    }
}
