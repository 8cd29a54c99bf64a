use crate::core::gfx::{BlendMode, MeshVertex, RenderList};
use image::RgbaImage;
use log::info;
use std::{
    error::Error,
    num::NonZeroU32,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    thread,
};
use winit::{dpi::PhysicalSize, window::Window};

pub struct State {
    _context: softbuffer::Context<Arc<Window>>,
    surface: softbuffer::Surface<Arc<Window>, Arc<Window>>,
    window_size: PhysicalSize<u32>,
    thread_hint: Option<usize>,
}

pub fn init(window: Arc<Window>, _vsync_enabled: bool) -> Result<State, Box<dyn Error>> {
    info!("Initializing software renderer backend (softbuffer)...");

    let window_size = window.inner_size();
    let context = softbuffer::Context::new(window.clone())?;
    let surface = softbuffer::Surface::new(&context, window)?;

    Ok(State {
        _context: context,
        surface,
        window_size,
        thread_hint: None,
    })
}

pub const fn set_thread_hint(state: &mut State, threads: Option<usize>) {
    state.thread_hint = threads;
}

pub fn draw(state: &mut State, render_list: &RenderList) -> Result<u32, Box<dyn Error>> {
    let PhysicalSize { width, height } = state.window_size;
    let (Some(resize_w), Some(resize_h)) = (NonZeroU32::new(width), NonZeroU32::new(height))
    else {
        return Ok(0);
    };

    state.surface.resize(resize_w, resize_h)?;

    let mut buffer = state.surface.buffer_mut()?;
    let vertices = rasterize(
        render_list,
        width as usize,
        height as usize,
        &mut buffer,
        state.thread_hint,
    );
    buffer.present()?;

    Ok(vertices)
}

pub fn resize(state: &mut State, width: u32, height: u32) {
    if width == 0 || height == 0 {
        return;
    }
    state.window_size = PhysicalSize::new(width, height);
}

pub fn cleanup(_state: &mut State) {
    info!("Software renderer backend cleanup.");
}

/// Rasterizes without a window, for snapshots.
pub fn render_to_image(
    render_list: &RenderList,
    width: u32,
    height: u32,
    thread_hint: Option<usize>,
) -> RgbaImage {
    let (w, h) = (width as usize, height as usize);
    let mut buffer = vec![0u32; w * h];
    rasterize(render_list, w, h, &mut buffer, thread_hint);

    let mut image = RgbaImage::new(width, height);
    for (dst, &src) in image.pixels_mut().zip(buffer.iter()) {
        // Surfaces ignore the alpha byte; snapshots are opaque too.
        dst.0 = [
            ((src >> 16) & 0xFF) as u8,
            ((src >> 8) & 0xFF) as u8,
            (src & 0xFF) as u8,
            0xFF,
        ];
    }
    image
}

/// Clears `buffer` (row-major 0xAARRGGBB) and draws every object in order.
/// Returns the number of vertices submitted.
pub fn rasterize(
    render_list: &RenderList,
    w: usize,
    h: usize,
    buffer: &mut [u32],
    thread_hint: Option<usize>,
) -> u32 {
    if w == 0 || h == 0 || buffer.len() < w * h {
        return 0;
    }
    let buffer = &mut buffer[..w * h];

    let clear = pack_rgba(render_list.clear_color);
    buffer.fill(clear);

    let vertex_counter = AtomicU32::new(0);

    let threads_auto = thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(1)
        .max(1);

    let threads = match thread_hint {
        Some(t) if t >= 1 => t.min(threads_auto),
        _ => threads_auto,
    };

    let use_parallel = threads > 1 && h >= 64 && render_list.objects.len() > 1;

    if use_parallel {
        let rows_per = h.div_ceil(threads);

        thread::scope(|scope| {
            let mut remainder: &mut [u32] = buffer;

            for worker in 0..threads {
                let y_start = worker * rows_per;
                if y_start >= h {
                    break;
                }
                let y_end = ((worker + 1) * rows_per).min(h);
                let len = (y_end - y_start) * w;

                let (stripe, rest) = remainder.split_at_mut(len);
                remainder = rest;

                let objects = &render_list.objects;
                let counter = &vertex_counter;

                scope.spawn(move || {
                    let mut local_vertices: u32 = 0;
                    for obj in objects {
                        local_vertices += rasterize_mesh_triangles(
                            &obj.vertices,
                            obj.blend,
                            w,
                            h,
                            y_start,
                            y_end,
                            stripe,
                        );
                    }
                    // Every stripe walks every triangle; count once.
                    if y_start == 0 {
                        counter.fetch_add(local_vertices, Ordering::Relaxed);
                    }
                });
            }
        });
    } else {
        for obj in &render_list.objects {
            let v = rasterize_mesh_triangles(&obj.vertices, obj.blend, w, h, 0, h, buffer);
            vertex_counter.fetch_add(v, Ordering::Relaxed);
        }
    }

    vertex_counter.load(Ordering::Relaxed)
}

#[inline(always)]
fn pack_rgba(c: [f32; 4]) -> u32 {
    fn clamp01(x: f32) -> f32 {
        if x <= 0.0 {
            0.0
        } else if x >= 1.0 {
            1.0
        } else {
            x
        }
    }

    let r = clamp01(c[0]).mul_add(255.0, 0.5) as u32;
    let g = clamp01(c[1]).mul_add(255.0, 0.5) as u32;
    let b = clamp01(c[2]).mul_add(255.0, 0.5) as u32;
    let a = clamp01(c[3]).mul_add(255.0, 0.5) as u32;

    (a << 24) | (r << 16) | (g << 8) | b
}

#[derive(Clone, Copy)]
struct ScreenVertexColor {
    x: f32,
    y: f32,
    color: [f32; 4],
}

fn rasterize_mesh_triangles(
    vertices: &[MeshVertex],
    blend: BlendMode,
    width: usize,
    height: usize,
    stripe_y_start: usize,
    stripe_y_end: usize,
    buffer: &mut [u32],
) -> u32 {
    if vertices.len() < 3 || width == 0 || height == 0 || stripe_y_start >= stripe_y_end {
        return 0;
    }

    let mut verts_drawn = 0u32;
    'tri: for chunk in vertices.chunks_exact(3) {
        let mut tri = [ScreenVertexColor {
            x: 0.0,
            y: 0.0,
            color: [0.0; 4],
        }; 3];
        for i in 0..3 {
            let [x, y] = chunk[i].pos;
            if !x.is_finite() || !y.is_finite() {
                continue 'tri;
            }
            tri[i] = ScreenVertexColor {
                x,
                y,
                color: chunk[i].color,
            };
        }

        rasterize_triangle_color(
            &tri[0],
            &tri[1],
            &tri[2],
            blend,
            width,
            height,
            stripe_y_start,
            stripe_y_end,
            buffer,
        );
        verts_drawn = verts_drawn.saturating_add(3);
    }

    verts_drawn
}

#[inline(always)]
fn rasterize_triangle_color(
    v0: &ScreenVertexColor,
    v1: &ScreenVertexColor,
    v2: &ScreenVertexColor,
    blend: BlendMode,
    width: usize,
    height: usize,
    stripe_y_start: usize,
    stripe_y_end: usize,
    buffer: &mut [u32],
) {
    let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as i32;
    let max_x = v0.x.max(v1.x).max(v2.x).ceil().min((width - 1) as f32) as i32;
    let mut min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as i32;
    let mut max_y = v0.y.max(v1.y).max(v2.y).ceil().min((height - 1) as f32) as i32;
    if min_x > max_x || min_y > max_y {
        return;
    }

    let stripe_start = stripe_y_start as i32;
    let stripe_end = (stripe_y_end as i32) - 1;
    if stripe_start > stripe_end || max_y < stripe_start || min_y > stripe_end {
        return;
    }
    min_y = min_y.max(stripe_start);
    max_y = max_y.min(stripe_end);

    let denom = edge_function(v0.x, v0.y, v1.x, v1.y, v2.x, v2.y);
    if denom == 0.0 {
        return;
    }
    let inv_denom = 1.0 / denom;

    for y in min_y..=max_y {
        let py = y as f32 + 0.5;
        let row = (y - stripe_start) as usize;
        for x in min_x..=max_x {
            let px = x as f32 + 0.5;

            let w0 = edge_function(v1.x, v1.y, v2.x, v2.y, px, py) * inv_denom;
            let w1 = edge_function(v2.x, v2.y, v0.x, v0.y, px, py) * inv_denom;
            let w2 = 1.0 - w0 - w1;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let mut sr = v0.color[0].mul_add(w0, v1.color[0] * w1) + v2.color[0] * w2;
            let mut sg = v0.color[1].mul_add(w0, v1.color[1] * w1) + v2.color[1] * w2;
            let mut sb = v0.color[2].mul_add(w0, v1.color[2] * w1) + v2.color[2] * w2;
            let mut sa = v0.color[3].mul_add(w0, v1.color[3] * w1) + v2.color[3] * w2;

            sr = sr.clamp(0.0, 1.0);
            sg = sg.clamp(0.0, 1.0);
            sb = sb.clamp(0.0, 1.0);
            sa = sa.clamp(0.0, 1.0);
            if sa <= 0.0 {
                continue;
            }

            let dst_idx = row * width + x as usize;
            let dst = buffer[dst_idx];

            let dr = ((dst >> 16) & 0xFF) as f32 / 255.0;
            let dg = ((dst >> 8) & 0xFF) as f32 / 255.0;
            let db = (dst & 0xFF) as f32 / 255.0;
            let da = ((dst >> 24) & 0xFF) as f32 / 255.0;

            let (out_r, out_g, out_b, out_a) = match blend {
                BlendMode::Add => {
                    let r = sr.mul_add(sa, dr).min(1.0);
                    let g = sg.mul_add(sa, dg).min(1.0);
                    let b = sb.mul_add(sa, db).min(1.0);
                    let a = (da + sa).min(1.0);
                    (r, g, b, a)
                }
                BlendMode::Alpha => {
                    let inv = 1.0 - sa;
                    let r = sr.mul_add(sa, dr * inv);
                    let g = sg.mul_add(sa, dg * inv);
                    let b = sb.mul_add(sa, db * inv);
                    let a = sa + da * inv;
                    (r, g, b, a)
                }
            };

            buffer[dst_idx] = pack_rgba([out_r, out_g, out_b, out_a]);
        }
    }
}

#[inline(always)]
fn edge_function(x0: f32, y0: f32, x1: f32, y1: f32, px: f32, py: f32) -> f32 {
    (px - x0).mul_add(y1 - y0, -((py - y0) * (x1 - x0)))
}
