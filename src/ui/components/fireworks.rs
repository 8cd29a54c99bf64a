use crate::core::gfx::BlendMode;
use crate::game::fireworks::{Burst, BurstPhase};
use crate::ui::canvas::{Canvas, Paint};
use crate::ui::color;
use glam::DVec2;
use smallvec::SmallVec;
use std::f32::consts::TAU;

const TRAIL_SEGMENTS: usize = 10;
/// Share of the Bezier parameter the trail covers behind the rocket.
const TRAIL_LENGTH: f64 = 0.25;
const TRAIL_MIN_WIDTH: f32 = 1.5;
const TRAIL_WIDTH_PCT: f32 = 0.003;
const CORE_RADIUS_PCT: f32 = 0.004;

/// (radius multiplier, alpha multiplier, lightness), drawn outermost first.
const GLOW_LAYERS: [(f32, f32, f32); 3] = [(4.0, 0.15, 0.5), (2.0, 0.45, 0.6), (1.0, 1.0, 0.85)];

/// What a burst contributed to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstDraw {
    Trail,
    Particles(u32),
    Hidden,
}

#[inline(always)]
fn to_surface(p: DVec2, w: f32, h: f32) -> [f32; 2] {
    [p.x as f32 * w, (1.0 - p.y as f32) * h]
}

/// Draws every burst in slot order and reports what each one showed.
pub fn draw<'a>(
    canvas: &mut dyn Canvas,
    bursts: impl IntoIterator<Item = &'a Burst>,
    now: f64,
) -> Vec<BurstDraw> {
    let (w, h) = canvas.size();
    if !(w > 0.0 && h > 0.0) {
        return Vec::new();
    }
    let short_side = w.min(h);

    canvas.set_blend(BlendMode::Add);
    let drawn = bursts
        .into_iter()
        .map(|burst| match burst.phase(now) {
            BurstPhase::Fusing { progress } => {
                draw_trail(canvas, burst, progress, w, h, short_side);
                BurstDraw::Trail
            }
            BurstPhase::Live { alpha, .. } => {
                let particles = burst.particle_positions(now);
                for p in &particles {
                    draw_particle(canvas, to_surface(*p, w, h), burst.hue as f32, alpha as f32, short_side);
                }
                BurstDraw::Particles(particles.len() as u32)
            }
            BurstPhase::Expired => BurstDraw::Hidden,
        })
        .collect();
    canvas.set_blend(BlendMode::Alpha);
    drawn
}

fn draw_trail(canvas: &mut dyn Canvas, burst: &Burst, progress: f64, w: f32, h: f32, short_side: f32) {
    let head = progress.clamp(0.0, 1.0);
    let tail = (head - TRAIL_LENGTH).max(0.0);
    if head <= tail {
        return;
    }
    let points: SmallVec<[[f32; 2]; TRAIL_SEGMENTS + 1]> = (0..=TRAIL_SEGMENTS)
        .map(|i| {
            let t = (head - tail).mul_add(i as f64 / TRAIL_SEGMENTS as f64, tail);
            to_surface(burst.point_on_path(t), w, h)
        })
        .collect();

    let width = (TRAIL_WIDTH_PCT * short_side).max(TRAIL_MIN_WIDTH);
    let hue = burst.hue as f32;
    for (i, pair) in points.windows(2).enumerate() {
        let fade_from = i as f32 / TRAIL_SEGMENTS as f32;
        let fade_to = (i + 1) as f32 / TRAIL_SEGMENTS as f32;
        canvas.stroke_line(
            pair[0],
            pair[1],
            width,
            Paint::LinearGradient {
                start: pair[0],
                end: pair[1],
                from: color::hsl_to_rgba(hue, 1.0, 0.6, fade_from),
                to: color::hsl_to_rgba(hue, 1.0, 0.6, fade_to),
            },
        );
    }
}

fn draw_particle(canvas: &mut dyn Canvas, center: [f32; 2], hue: f32, envelope: f32, short_side: f32) {
    let core = CORE_RADIUS_PCT * short_side;
    for (radius, alpha, lightness) in GLOW_LAYERS {
        canvas.fill_arc(
            center,
            core * radius,
            0.0,
            TAU,
            Paint::Solid(color::hsl_to_rgba(hue, 1.0, lightness, envelope * alpha)),
        );
    }
}
