use egui::{Pos2, Rect, Vec2, pos2};

/// Calculate distance from a point to a line segment
pub fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let line_vec = end - start;
    let point_vec = point - start;

    let line_len_sq = line_vec.length_sq();
    if line_len_sq == 0.0 {
        return point_vec.length();
    }

    let t = (point_vec.dot(line_vec) / line_len_sq).clamp(0.0, 1.0);
    let projection = start + line_vec * t;
    (point - projection).length()
}

/// Calculate the bounding box for a set of points, padded on every side
pub fn stroke_bounds(points: &[Pos2], padding: f32) -> Rect {
    if points.is_empty() {
        return Rect::NOTHING;
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;

    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Rect::from_min_max(
        pos2(min_x - padding, min_y - padding),
        pos2(max_x + padding, max_y + padding),
    )
}

fn is_usable(size: Vec2) -> bool {
    size.x.is_finite() && size.y.is_finite() && size.x > 0.0 && size.y > 0.0
}

/// The rect an image of `image_size` occupies when shown aspect-fit inside a
/// container of `container_size`, in container coordinates.
///
/// The rect is centered and letterboxed on one axis. Degenerate sizes give
/// [`Rect::NOTHING`].
pub fn aspect_fit_rect(image_size: Vec2, container_size: Vec2) -> Rect {
    if !is_usable(image_size) || !is_usable(container_size) {
        return Rect::NOTHING;
    }

    let image_aspect = image_size.x / image_size.y;
    let container_aspect = container_size.x / container_size.y;

    let displayed = if image_aspect > container_aspect {
        // Wider than the container: full width, bars above and below.
        Vec2::new(container_size.x, container_size.x / image_aspect)
    } else if image_aspect < container_aspect {
        Vec2::new(container_size.y * image_aspect, container_size.y)
    } else {
        container_size
    };

    let origin = pos2(
        (container_size.x - displayed.x) / 2.0,
        (container_size.y - displayed.y) / 2.0,
    );
    Rect::from_min_size(origin, displayed)
}

/// Maps between container space (where pointer input arrives) and the
/// full-resolution image shown aspect-fit inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectFit {
    displayed: Rect,
    image_size: Vec2,
}

impl AspectFit {
    /// Returns `None` when either size is degenerate.
    pub fn new(image_size: Vec2, container_size: Vec2) -> Option<Self> {
        let displayed = aspect_fit_rect(image_size, container_size);
        if !displayed.is_positive() {
            return None;
        }
        Some(Self {
            displayed,
            image_size,
        })
    }

    /// The displayed rect in container coordinates
    pub fn displayed_rect(&self) -> Rect {
        self.displayed
    }

    pub fn image_size(&self) -> Vec2 {
        self.image_size
    }

    /// Componentwise `image_size / displayed_size`
    pub fn scale(&self) -> Vec2 {
        self.image_size / self.displayed.size()
    }

    /// Scalar used for stroke widths; both axes agree for an aspect-fit rect.
    pub fn width_scale(&self) -> f32 {
        let scale = self.scale();
        (scale.x + scale.y) / 2.0
    }

    pub fn to_image(&self, container_point: Pos2) -> Pos2 {
        let scale = self.scale();
        let offset = container_point - self.displayed.min;
        pos2(offset.x * scale.x, offset.y * scale.y)
    }

    pub fn to_container(&self, image_point: Pos2) -> Pos2 {
        let scale = self.scale();
        self.displayed.min + Vec2::new(image_point.x / scale.x, image_point.y / scale.y)
    }
}
