use crate::config::Config;
use crate::core::gfx::backends::software;
use crate::core::gfx::{Backend, create_backend};
use crate::game::link::ResultsParams;
use crate::game::timing::AnimationClock;
use crate::screens::results::{AnimationSession, FrameState};
use crate::ui::canvas::MeshCanvas;
use crate::ui::color;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use log::{error, info, trace, warn};
use std::{
    error::Error,
    fs,
    path::PathBuf,
    sync::Arc,
    time::Instant,
};

const WINDOW_TITLE: &str = "Scoreboard";

/// Surface settings for the results window, from the config plus CLI overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub width: u32,
    pub height: u32,
    pub windowed: bool,
    pub vsync: bool,
    pub software_threads: Option<usize>,
}

impl DisplayOptions {
    pub const fn from_config(config: &Config) -> Self {
        Self {
            width: config.display_width,
            height: config.display_height,
            windowed: config.windowed,
            vsync: config.vsync,
            software_threads: config.software_thread_hint(),
        }
    }
}

struct App {
    window: Option<Arc<Window>>,
    backend: Option<Backend>,
    display: DisplayOptions,
    session: AnimationSession,
    epoch: Instant,
    clock: AnimationClock,
    last_frame: Option<FrameState>,
    frame_count: u32,
    last_title_update: Instant,
    fatal: Option<Box<dyn Error>>,
}

impl App {
    fn new(session: AnimationSession, display: DisplayOptions) -> Self {
        let now = Instant::now();
        Self {
            window: None,
            backend: None,
            display,
            session,
            epoch: now,
            clock: AnimationClock::new(),
            last_frame: None,
            frame_count: 0,
            last_title_update: now,
            fatal: None,
        }
    }

    #[inline(always)]
    fn update_fps_title(&mut self, window: &Window, now: Instant) {
        self.frame_count += 1;
        let elapsed = now.duration_since(self.last_title_update);
        if elapsed.as_secs_f32() >= 1.0 {
            let fps = self.frame_count as f32 / elapsed.as_secs_f32();
            window.set_title(&format!("{WINDOW_TITLE} | {fps:.2} FPS"));
            self.frame_count = 0;
            self.last_title_update = now;
        }
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn Error>> {
        let mut window_attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_resizable(true)
            .with_transparent(false);

        if self.display.windowed {
            window_attributes = window_attributes
                .with_inner_size(PhysicalSize::new(self.display.width, self.display.height));
        } else {
            let fullscreen = if let Some(mon) = event_loop.primary_monitor() {
                winit::window::Fullscreen::Borderless(Some(mon))
            } else {
                warn!("No primary monitor reported; using BORDERLESS fullscreen.");
                winit::window::Fullscreen::Borderless(None)
            };
            window_attributes = window_attributes.with_fullscreen(Some(fullscreen));
        }

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let mut backend = create_backend(window.clone(), self.display.vsync)?;
        backend.configure_software_threads(self.display.software_threads);

        self.window = Some(window);
        self.backend = Some(backend);
        info!("Starting event loop...");
        Ok(())
    }

    /// Advances the session unless it already finished, in which case the last
    /// frame is shown again.
    fn next_frame(&mut self, window: &Window) -> Option<FrameState> {
        let timestamp = self.epoch.elapsed().as_secs_f64() * 1_000.0;
        let Some(elapsed) = self.clock.tick(timestamp) else {
            // First frame only latches the clock and sizes the surface.
            let size = window.inner_size();
            if let Some(backend) = &mut self.backend {
                backend.resize(size.width, size.height);
            }
            return None;
        };
        if self.session.finished()
            && let Some(last) = self.last_frame
        {
            return Some(last);
        }
        let frame = self.session.advance(elapsed);
        self.last_frame = Some(frame);
        Some(frame)
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, window: &Window) {
        let now = Instant::now();
        let Some(frame) = self.next_frame(window) else {
            window.request_redraw();
            return;
        };

        let size = window.inner_size();
        let mut canvas = MeshCanvas::new(size.width, size.height, color::CLEAR_RGBA);
        self.session.draw(&frame, &mut canvas);
        let render_list = canvas.finish();
        self.update_fps_title(window, now);

        if let Some(backend) = &mut self.backend {
            match backend.draw(&render_list) {
                Ok(vertices) => trace!("Presented {vertices} vertices at {:.0} ms", frame.elapsed),
                Err(e) => {
                    error!("Failed to draw frame: {e}");
                    event_loop.exit();
                }
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none()
            && let Err(e) = self.init_graphics(event_loop)
        {
            error!("Failed to initialize graphics: {e}");
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref().cloned() else {
            return;
        };
        if window_id != window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested. Shutting down.");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if new_size.width > 0 && new_size.height > 0 {
                    if let Some(backend) = &mut self.backend {
                        backend.resize(new_size.width, new_size.height);
                    }
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if key_event.state == ElementState::Pressed
                    && key_event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    info!("Escape pressed. Shutting down.");
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop, &window),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.session.finished() {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(backend) = &mut self.backend {
            backend.cleanup();
        }
    }
}

/// Opens the results window and runs until it is closed.
pub fn run(params: ResultsParams, display: DisplayOptions) -> Result<(), Box<dyn Error>> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(AnimationSession::new(params), display);
    event_loop.run_app(&mut app)?;
    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotOptions {
    /// Defaults to `snapshots/<local timestamp>`.
    pub out_dir: Option<PathBuf>,
    pub frames: u32,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub software_threads: Option<usize>,
}

fn default_snapshot_dir() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    PathBuf::from("snapshots").join(stamp)
}

/// Renders the session headless with a synthetic clock, one PNG per frame, until
/// `frames` are written or the session finishes. Returns the output directory.
pub fn run_snapshots(params: ResultsParams, options: SnapshotOptions) -> Result<PathBuf, Box<dyn Error>> {
    if !(options.fps.is_finite() && options.fps > 0.0) {
        return Err(format!("fps must be a positive number, got {}", options.fps).into());
    }
    if options.width == 0 || options.height == 0 {
        return Err(format!("snapshot size {}x{} is empty", options.width, options.height).into());
    }

    let dir = options.out_dir.unwrap_or_else(default_snapshot_dir);
    fs::create_dir_all(&dir)?;

    let mut session = AnimationSession::new(params);
    info!(
        "Writing up to {} frames at {} fps ({}x{}, max score {:.1}) to {}",
        options.frames,
        options.fps,
        options.width,
        options.height,
        session.metrics().max_score,
        dir.display(),
    );

    let mut written = 0u32;
    for index in 0..options.frames {
        let elapsed = f64::from(index) * 1_000.0 / options.fps;
        let frame = session.advance(elapsed);

        let mut canvas = MeshCanvas::new(options.width, options.height, color::CLEAR_RGBA);
        session.draw(&frame, &mut canvas);
        let render_list = canvas.finish();
        trace!("Frame {index}: {} vertices", render_list.vertex_count());
        let image = software::render_to_image(
            &render_list,
            options.width,
            options.height,
            options.software_threads,
        );
        image.save(dir.join(format!("frame_{index:05}.png")))?;
        written += 1;

        if frame.finished {
            break;
        }
    }

    info!("Wrote {written} snapshot frames to {}", dir.display());
    Ok(dir)
}
