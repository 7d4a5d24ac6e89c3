use egui::{Pos2, Rect, Vec2};
use image::{RgbaImage, imageops};

use crate::geometry::{self, AspectFit};
use crate::record::AnnotationRecord;
use crate::renderer::Renderer;
use crate::stroke::StrokeStyle;
use crate::stroke_store::StrokeStore;

/// Pointer input delivered to the surface, in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Pos2),
    Move(Pos2),
    Up(Pos2),
    /// Pointer capture was lost; the stroke is kept as drawn so far
    Cancel,
}

/// Turns pointer input into strokes and rasterizes them.
///
/// The stroke points are the only source of truth: every render starts from a
/// cleared buffer and redraws from the store, so nothing survives a clear.
pub struct DrawingSurface {
    size: Vec2,
    store: StrokeStore,
    style: StrokeStyle,
    canvas: RgbaImage,
}

// Custom Debug implementation to keep the pixel buffer out of logs
impl std::fmt::Debug for DrawingSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingSurface")
            .field("size", &self.size)
            .field("strokes", &self.store.len())
            .field("drawing", &self.store.is_drawing())
            .field("style", &self.style)
            .finish()
    }
}

impl DrawingSurface {
    pub fn new(size: Vec2, style: StrokeStyle) -> Self {
        let width = size.x.max(0.0).ceil() as u32;
        let height = size.y.max(0.0).ceil() as u32;
        Self {
            size,
            store: StrokeStore::new(),
            style,
            canvas: RgbaImage::new(width, height),
        }
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn full_rect(&self) -> Rect {
        Rect::from_min_size(Pos2::ZERO, self.size)
    }

    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    /// Style for strokes started after this call
    pub fn set_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }

    /// Feed one pointer event. Returns the region that needs redrawing.
    pub fn handle(&mut self, event: PointerEvent) -> Option<Rect> {
        match event {
            PointerEvent::Down(pos) => {
                self.store.begin(pos, self.style);
                Some(geometry::stroke_bounds(&[pos], self.style.width / 2.0))
            }
            PointerEvent::Move(pos) => {
                let stroke = self.store.in_progress()?;
                let last = stroke.points().last().copied().unwrap_or(pos);
                let radius = stroke.style().width / 2.0;
                self.store.extend(pos);
                Some(geometry::stroke_bounds(&[last, pos], radius))
            }
            PointerEvent::Up(pos) => {
                let moved = self.store.in_progress().and_then(|stroke| stroke.points().last().copied());
                if moved.is_some_and(|last| last != pos) {
                    self.store.extend(pos);
                }
                self.store.end();
                None
            }
            PointerEvent::Cancel => {
                self.store.end();
                None
            }
        }
    }

    pub fn undo(&mut self) -> Option<Rect> {
        self.store.undo().map(|_| self.full_rect())
    }

    pub fn clear(&mut self) -> Rect {
        self.store.clear();
        self.full_rect()
    }

    pub fn load(&mut self, records: &[AnnotationRecord]) -> Rect {
        self.store.load(records);
        self.full_rect()
    }

    pub fn snapshot(&self) -> Vec<AnnotationRecord> {
        self.store.snapshot()
    }

    /// Redraw every finished stroke, then the stroke in progress, onto a
    /// fully cleared buffer.
    pub fn render(&mut self) -> &RgbaImage {
        Renderer::clear(&mut self.canvas);
        draw_all(&self.store, &mut self.canvas, &Renderer::identity());
        &self.canvas
    }

    /// A copy of `base` with all strokes drawn on top, mapped from surface
    /// space into the image's own pixel space.
    pub fn composite_onto_image(&self, base: &RgbaImage) -> RgbaImage {
        let mut output = base.clone();
        let image_size = Vec2::new(base.width() as f32, base.height() as f32);

        match AspectFit::new(image_size, self.size) {
            Some(fit) => {
                let renderer = Renderer::mapped(move |p| fit.to_image(p), fit.width_scale());
                draw_all(&self.store, &mut output, &renderer);
            }
            None => log::warn!(
                "Cannot map {:?} surface onto {}x{} image; strokes skipped",
                self.size,
                base.width(),
                base.height()
            ),
        }
        output
    }

    /// Render the current strokes and lay them over `base` at surface size,
    /// which is what the user sees while editing.
    pub fn preview_over(&mut self, base: &RgbaImage) -> RgbaImage {
        let fit = geometry::aspect_fit_rect(
            Vec2::new(base.width() as f32, base.height() as f32),
            self.size,
        );
        let mut preview = RgbaImage::new(self.canvas.width(), self.canvas.height());
        if fit.is_positive() {
            let scaled = imageops::resize(
                base,
                fit.width().round().max(1.0) as u32,
                fit.height().round().max(1.0) as u32,
                imageops::FilterType::Triangle,
            );
            imageops::overlay(&mut preview, &scaled, fit.min.x.round() as i64, fit.min.y.round() as i64);
        }
        imageops::overlay(&mut preview, self.render(), 0, 0);
        preview
    }
}

fn draw_all<F: Fn(Pos2) -> Pos2>(store: &StrokeStore, target: &mut RgbaImage, renderer: &Renderer<F>) {
    for stroke in store.strokes() {
        renderer.draw_stroke(target, stroke.points(), stroke.color(), stroke.width());
    }
    if let Some(stroke) = store.in_progress() {
        let style = stroke.style();
        renderer.draw_stroke(target, stroke.points(), style.color, style.width);
    }
}
