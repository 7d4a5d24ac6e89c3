use egui::{Color32, Pos2, pos2};
use image::{Rgba, RgbaImage};

use crate::geometry;

/// Rasterizes strokes onto RGBA buffers.
///
/// Strokes are polylines with round caps and joins: a pixel is covered when
/// its center lies within `width / 2` of any segment. Each stroke is blended
/// once per pixel, so overlapping segments of a translucent stroke do not
/// darken where they cross.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<F = fn(Pos2) -> Pos2> {
    map_point: F,
    width_scale: f32,
}

impl Renderer {
    /// A renderer drawing points as-is
    pub fn identity() -> Self {
        Self {
            map_point: std::convert::identity,
            width_scale: 1.0,
        }
    }

    /// Reset every pixel to fully transparent
    pub fn clear(target: &mut RgbaImage) {
        for pixel in target.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }
}

impl<F: Fn(Pos2) -> Pos2> Renderer<F> {
    /// A renderer that maps every point and scales every width first
    pub fn mapped(map_point: F, width_scale: f32) -> Self {
        Self {
            map_point,
            width_scale,
        }
    }

    pub fn draw_stroke(&self, target: &mut RgbaImage, points: &[Pos2], color: Color32, width: f32) {
        let width = width * self.width_scale;
        if points.is_empty() || !width.is_finite() || width <= 0.0 || color.a() == 0 {
            return;
        }

        let points: Vec<Pos2> = points.iter().map(|p| (self.map_point)(*p)).collect();
        let radius = width / 2.0;

        let (target_w, target_h) = target.dimensions();
        let bounds = geometry::stroke_bounds(&points, radius);
        let Some(area) = PixelArea::clip(bounds.min, bounds.max, target_w, target_h) else {
            return;
        };

        let mut mask = vec![false; area.len()];
        if points.len() == 1 {
            area.mark(&mut mask, points[0], points[0], radius);
        } else {
            for segment in points.windows(2) {
                area.mark(&mut mask, segment[0], segment[1], radius);
            }
        }

        let source = color.to_srgba_unmultiplied();
        for (index, covered) in mask.iter().enumerate() {
            if *covered {
                let (x, y) = area.coords(index);
                blend_over(target.get_pixel_mut(x, y), source);
            }
        }
    }
}

/// Pixel rectangle `[x0, x1) x [y0, y1)` inside a target
#[derive(Debug, Clone, Copy)]
struct PixelArea {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl PixelArea {
    fn clip(min: Pos2, max: Pos2, width: u32, height: u32) -> Option<Self> {
        let x0 = min.x.floor().max(0.0);
        let y0 = min.y.floor().max(0.0);
        let x1 = max.x.ceil().min(width as f32);
        let y1 = max.y.ceil().min(height as f32);
        if !(x0 < x1 && y0 < y1) {
            return None;
        }
        Some(Self {
            x0: x0 as u32,
            y0: y0 as u32,
            x1: x1 as u32,
            y1: y1 as u32,
        })
    }

    fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    fn len(&self) -> usize {
        (self.width() * (self.y1 - self.y0)) as usize
    }

    fn coords(&self, index: usize) -> (u32, u32) {
        let index = index as u32;
        (self.x0 + index % self.width(), self.y0 + index / self.width())
    }

    /// Mark pixels whose centers are within `radius` of the segment
    fn mark(&self, mask: &mut [bool], start: Pos2, end: Pos2, radius: f32) {
        let bounds = geometry::stroke_bounds(&[start, end], radius);
        let Some(segment_area) = Self::clip(bounds.min, bounds.max, self.x1, self.y1) else {
            return;
        };

        for y in segment_area.y0.max(self.y0)..segment_area.y1 {
            for x in segment_area.x0.max(self.x0)..segment_area.x1 {
                let center = pos2(x as f32 + 0.5, y as f32 + 0.5);
                if geometry::distance_to_segment(center, start, end) <= radius {
                    let index = ((y - self.y0) * self.width() + (x - self.x0)) as usize;
                    mask[index] = true;
                }
            }
        }
    }
}

/// Source-over blend of a straight-alpha color onto a straight-alpha pixel
fn blend_over(pixel: &mut Rgba<u8>, source: [u8; 4]) {
    let src_a = source[3] as f32 / 255.0;
    let dst_a = pixel[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        *pixel = Rgba([0, 0, 0, 0]);
        return;
    }

    for channel in 0..3 {
        let src = source[channel] as f32 / 255.0;
        let dst = pixel[channel] as f32 / 255.0;
        let out = (src * src_a + dst * dst_a * (1.0 - src_a)) / out_a;
        pixel[channel] = (out * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    pixel[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
