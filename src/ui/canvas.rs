//! Immediate-mode drawing surface and its triangle tessellator.

use crate::core::gfx::{BlendMode, MeshVertex, RenderList, RenderObject};
use crate::ui::font;
use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Solid([f32; 4]),
    /// Colour ramps from `from` at `start` to `to` at `end`, clamped outside.
    LinearGradient {
        start: [f32; 2],
        end: [f32; 2],
        from: [f32; 4],
        to: [f32; 4],
    },
}

impl Paint {
    pub fn color_at(&self, p: [f32; 2]) -> [f32; 4] {
        match *self {
            Self::Solid(c) => c,
            Self::LinearGradient {
                start,
                end,
                from,
                to,
            } => {
                let axis = [end[0] - start[0], end[1] - start[1]];
                let len2 = axis[0].mul_add(axis[0], axis[1] * axis[1]);
                let t = if len2 > 0.0 {
                    ((p[0] - start[0]).mul_add(axis[0], (p[1] - start[1]) * axis[1]) / len2)
                        .clamp(0.0, 1.0)
                } else {
                    0.0
                };
                std::array::from_fn(|i| (to[i] - from[i]).mul_add(t, from[i]))
            }
        }
    }
}

/// Horizontal anchor for `fill_text`; text is always vertically centred on `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

pub trait Canvas {
    /// Surface size in pixels.
    fn size(&self) -> (f32, f32);

    fn set_blend(&mut self, blend: BlendMode);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: Paint);

    fn stroke_line(&mut self, from: [f32; 2], to: [f32; 2], width: f32, paint: Paint);

    /// Filled sector; `start..end` in radians, a full turn draws a disc.
    fn fill_arc(&mut self, center: [f32; 2], radius: f32, start: f32, end: f32, paint: Paint);

    fn stroke_arc(
        &mut self,
        center: [f32; 2],
        radius: f32,
        start: f32,
        end: f32,
        width: f32,
        paint: Paint,
    );

    /// Draws `text` centred vertically on `y`, squeezed horizontally to `max_width`.
    fn fill_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        font_px: f32,
        align: TextAlign,
        max_width: Option<f32>,
        color: [f32; 4],
    );

    fn measure_text(&self, text: &str, font_px: f32) -> f32;
}

#[inline(always)]
fn arc_segments(radius: f32, sweep: f32) -> usize {
    ((sweep.abs() * radius.max(0.0) / 3.0).ceil() as usize).clamp(6, 96)
}

/// Tessellates drawing calls into a `RenderList` for the software rasterizer.
pub struct MeshCanvas {
    width: f32,
    height: f32,
    blend: BlendMode,
    list: RenderList,
}

impl MeshCanvas {
    pub fn new(width: u32, height: u32, clear_color: [f32; 4]) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            blend: BlendMode::Alpha,
            list: RenderList::new(clear_color),
        }
    }

    pub fn finish(self) -> RenderList {
        self.list
    }

    // Consecutive calls with the same blend share one object.
    fn out(&mut self) -> &mut Vec<MeshVertex> {
        let blend = self.blend;
        let needs_new = self.list.objects.last().is_none_or(|o| o.blend != blend);
        if needs_new {
            self.list.objects.push(RenderObject {
                vertices: Vec::new(),
                blend,
            });
        }
        let last = self.list.objects.len() - 1;
        &mut self.list.objects[last].vertices
    }

    fn push_tri(&mut self, a: [f32; 2], b: [f32; 2], c: [f32; 2], paint: Paint) {
        let out = self.out();
        for p in [a, b, c] {
            out.push(MeshVertex {
                pos: p,
                color: paint.color_at(p),
            });
        }
    }

    fn push_quad(&mut self, corners: [[f32; 2]; 4], paint: Paint) {
        let [a, b, c, d] = corners;
        self.push_tri(a, b, c, paint);
        self.push_tri(a, c, d, paint);
    }
}

impl Canvas for MeshCanvas {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn set_blend(&mut self, blend: BlendMode) {
        self.blend = blend;
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: Paint) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let (x1, y1) = (x + w, y + h);
        self.push_quad([[x, y], [x1, y], [x1, y1], [x, y1]], paint);
    }

    fn stroke_line(&mut self, from: [f32; 2], to: [f32; 2], width: f32, paint: Paint) {
        let (dx, dy) = (to[0] - from[0], to[1] - from[1]);
        let len = dx.hypot(dy);
        if len <= 0.0 || width <= 0.0 {
            return;
        }
        let (nx, ny) = (-dy / len * width * 0.5, dx / len * width * 0.5);
        self.push_quad(
            [
                [from[0] + nx, from[1] + ny],
                [to[0] + nx, to[1] + ny],
                [to[0] - nx, to[1] - ny],
                [from[0] - nx, from[1] - ny],
            ],
            paint,
        );
    }

    fn fill_arc(&mut self, center: [f32; 2], radius: f32, start: f32, end: f32, paint: Paint) {
        if radius <= 0.0 {
            return;
        }
        let sweep = (end - start).clamp(-TAU, TAU);
        let n = arc_segments(radius, sweep);
        let point = |i: usize| {
            let a = (i as f32 / n as f32).mul_add(sweep, start);
            [
                a.cos().mul_add(radius, center[0]),
                a.sin().mul_add(radius, center[1]),
            ]
        };
        for i in 0..n {
            self.push_tri(center, point(i), point(i + 1), paint);
        }
    }

    fn stroke_arc(
        &mut self,
        center: [f32; 2],
        radius: f32,
        start: f32,
        end: f32,
        width: f32,
        paint: Paint,
    ) {
        if radius <= 0.0 || width <= 0.0 {
            return;
        }
        let (inner, outer) = ((radius - width * 0.5).max(0.0), radius + width * 0.5);
        let sweep = (end - start).clamp(-TAU, TAU);
        let n = arc_segments(outer, sweep);
        let ring = |i: usize, r: f32| {
            let a = (i as f32 / n as f32).mul_add(sweep, start);
            [a.cos().mul_add(r, center[0]), a.sin().mul_add(r, center[1])]
        };
        for i in 0..n {
            self.push_quad(
                [ring(i, inner), ring(i, outer), ring(i + 1, outer), ring(i + 1, inner)],
                paint,
            );
        }
    }

    fn fill_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        font_px: f32,
        align: TextAlign,
        max_width: Option<f32>,
        color: [f32; 4],
    ) {
        if font_px <= 0.0 || color[3] <= 0.0 {
            return;
        }
        let natural = self.measure_text(text, font_px);
        let squeeze = match max_width {
            Some(m) if m > 0.0 && natural > m => m / natural,
            Some(m) if m <= 0.0 => return,
            _ => 1.0,
        };
        let advance = font_px * squeeze;
        let width = natural * squeeze;
        let left = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - width * 0.5,
        };
        let top = y - font_px * 0.5;
        let cell_w = advance / 8.0;
        let cell_h = font_px / 8.0;
        let paint = Paint::Solid(color);

        for (i, ch) in text.chars().enumerate() {
            let gx = (i as f32).mul_add(advance, left);
            for (row, bits) in font::glyph(ch).into_iter().enumerate() {
                let gy = (row as f32).mul_add(cell_h, top);
                // Merge runs of lit pixels into one quad.
                let mut col = 0;
                while col < 8 {
                    if bits & (1 << col) == 0 {
                        col += 1;
                        continue;
                    }
                    let run_start = col;
                    while col < 8 && bits & (1 << col) != 0 {
                        col += 1;
                    }
                    let rx = (run_start as f32).mul_add(cell_w, gx);
                    let rw = (col - run_start) as f32 * cell_w;
                    self.fill_rect(rx, gy, rw, cell_h, paint);
                }
            }
        }
    }

    fn measure_text(&self, text: &str, font_px: f32) -> f32 {
        font::text_width(text, font_px)
    }
}


#[cfg(test)]
mod tests {
    use super::{Canvas, MeshCanvas, Paint, TextAlign};
    use crate::core::gfx::BlendMode;
    use std::f32::consts::TAU;

    fn bounds(canvas: MeshCanvas) -> ([f32; 2], [f32; 2], usize) {
        let list = canvas.finish();
        let mut lo = [f32::MAX; 2];
        let mut hi = [f32::MIN; 2];
        for v in list.objects.iter().flat_map(|o| &o.vertices) {
            for i in 0..2 {
                lo[i] = lo[i].min(v.pos[i]);
                hi[i] = hi[i].max(v.pos[i]);
            }
        }
        (lo, hi, list.vertex_count())
    }

    #[test]
    fn gradient_is_clamped_along_its_axis() {
        let paint = Paint::LinearGradient {
            start: [0.0, 0.0],
            end: [10.0, 0.0],
            from: [0.0, 0.0, 0.0, 0.0],
            to: [1.0, 1.0, 1.0, 1.0],
        };
        assert_eq!(paint.color_at([5.0, 3.0])[3], 0.5);
        assert_eq!(paint.color_at([-4.0, 0.0])[3], 0.0);
        assert_eq!(paint.color_at([40.0, 0.0])[3], 1.0);
    }

    #[test]
    fn centered_text_is_squeezed_into_max_width() {
        let mut canvas = MeshCanvas::new(200, 100, [0.0; 4]);
        // "HH" at 20px is 40px wide; squeezed to 20px around x = 100
        canvas.fill_text("HH", 100.0, 50.0, 20.0, TextAlign::Center, Some(20.0), [1.0; 4]);
        let (lo, hi, n) = bounds(canvas);
        assert!(n > 0);
        assert!(lo[0] >= 90.0 - 1e-3 && hi[0] <= 110.0 + 1e-3);
        assert!(lo[1] >= 40.0 - 1e-3 && hi[1] <= 60.0 + 1e-3);
    }

    #[test]
    fn blank_text_and_empty_shapes_emit_nothing() {
        let mut canvas = MeshCanvas::new(10, 10, [0.0; 4]);
        canvas.fill_text("   ", 0.0, 5.0, 8.0, TextAlign::Left, None, [1.0; 4]);
        canvas.fill_rect(1.0, 1.0, 0.0, 5.0, Paint::Solid([1.0; 4]));
        canvas.stroke_line([2.0, 2.0], [2.0, 2.0], 1.0, Paint::Solid([1.0; 4]));
        canvas.fill_arc([5.0, 5.0], 0.0, 0.0, TAU, Paint::Solid([1.0; 4]));
        assert_eq!(canvas.finish().vertex_count(), 0);
    }

    #[test]
    fn disc_stays_within_its_radius_and_blend_splits_objects() {
        let mut canvas = MeshCanvas::new(100, 100, [0.0; 4]);
        canvas.fill_rect(0.0, 0.0, 5.0, 5.0, Paint::Solid([1.0; 4]));
        canvas.set_blend(BlendMode::Add);
        canvas.fill_arc([50.0, 50.0], 10.0, 0.0, TAU, Paint::Solid([1.0; 4]));
        canvas.stroke_arc([50.0, 50.0], 12.0, 0.0, TAU, 2.0, Paint::Solid([1.0; 4]));
        let list = canvas.finish();
        assert_eq!(list.objects.len(), 2);
        assert_eq!(list.objects[1].blend, BlendMode::Add);
        for v in &list.objects[1].vertices {
            let d = (v.pos[0] - 50.0).hypot(v.pos[1] - 50.0);
            assert!(d <= 13.0 + 1e-3);
        }
    }
}
