pub mod backends;

use crate::core::gfx::backends::software;
use std::{error::Error, sync::Arc};
use winit::window::Window;

// --- Public Data Contract ---

/// One frame of coloured triangles in surface pixels, y pointing down.
#[derive(Clone, Debug, Default)]
pub struct RenderList {
    pub clear_color: [f32; 4],
    pub objects: Vec<RenderObject>,
}

#[derive(Clone, Debug)]
pub struct RenderObject {
    /// Triangle list; every three vertices form one triangle.
    pub vertices: Vec<MeshVertex>,
    pub blend: BlendMode,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub pos: [f32; 2],
    pub color: [f32; 4],
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    #[default]
    Alpha,
    Add,
}

impl RenderList {
    pub fn new(clear_color: [f32; 4]) -> Self {
        Self {
            clear_color,
            objects: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.objects.iter().map(|o| o.vertices.len()).sum()
    }
}

// --- Public API Facade ---

/// Opaque wrapper around the window's presentation backend.
pub struct Backend(software::State);

impl Backend {
    pub fn draw(&mut self, render_list: &RenderList) -> Result<u32, Box<dyn Error>> {
        software::draw(&mut self.0, render_list)
    }

    pub fn configure_software_threads(&mut self, threads: Option<usize>) {
        software::set_thread_hint(&mut self.0, threads);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        software::resize(&mut self.0, width, height);
    }

    pub fn cleanup(&mut self) {
        software::cleanup(&mut self.0);
    }
}

/// Creates and initializes the graphics backend for `window`.
pub fn create_backend(window: Arc<Window>, vsync_enabled: bool) -> Result<Backend, Box<dyn Error>> {
    Ok(Backend(software::init(window, vsync_enabled)?))
}
