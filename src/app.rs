// app.rs
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::renderer::{Renderer, RendererError};
use crate::scene::{CameraController, Scene};
use crate::settings::RenderSettings;

const STATS_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Renderer(#[from] RendererError),
}

pub struct App {
    settings: RenderSettings,
    scene: Scene,
    controller: CameraController,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    last_frame: Instant,
    stats_timer: StatsTimer,
    error: Option<AppError>,
}

impl App {
    pub fn new(settings: RenderSettings) -> Self {
        let scene = Scene::from_settings(&settings);
        Self {
            settings,
            scene,
            controller: CameraController::new(),
            window: None,
            renderer: None,
            last_frame: Instant::now(),
            stats_timer: StatsTimer::new(),
            error: None,
        }
    }

    /// The fatal error that stopped the event loop, if any.
    pub fn into_result(self) -> Result<(), AppError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: impl Into<AppError>) {
        let err = err.into();
        log::error!("{}", err);
        self.error = Some(err);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let resolution = &self.settings.resolution;
        let attributes = Window::default_attributes()
            .with_title("batched deferred renderer")
            .with_inner_size(PhysicalSize::new(resolution.width, resolution.height));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let renderer = pollster::block_on(Renderer::new(
            window.clone(),
            &self.settings,
            self.scene.lights(),
        ))?;

        window.request_redraw();
        self.window = Some(window);
        self.renderer = Some(renderer);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode, event: &KeyEvent) {
        let pressed = event.state == ElementState::Pressed;
        match code {
            KeyCode::Escape if pressed => event_loop.exit(),
            KeyCode::KeyR if pressed && !event.repeat => {
                if let Some(renderer) = self.renderer.as_mut() {
                    log::info!("Invalidating batch");
                    renderer.invalidate_batch();
                }
            }
            _ => self.controller.set_key(code, pressed),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.controller.update(&mut self.scene.camera, dt);

        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        match renderer.render(&self.scene.camera, self.scene.objects()) {
            Ok(frame) => {
                if let Some(window) = &self.window {
                    window.pre_present_notify();
                }
                frame.present();
                self.stats_timer.frame(renderer);
            }
            Err(RendererError::Surface(
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
            )) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                renderer.reconfigure();
            }
            Err(RendererError::Surface(wgpu::SurfaceError::Timeout)) => {
                log::warn!("Surface timeout, skipping frame");
            }
            Err(err) => {
                self.fail(event_loop, err);
                return;
            }
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(|w| w.id()) != Some(id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    if let Err(err) = renderer.resize(size) {
                        self.fail(event_loop, err);
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.handle_key(event_loop, code, &event);
                }
            }
            WindowEvent::Focused(false) => {
                self.controller = CameraController::new();
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }
}

/// Logs frame rate and batch statistics at a fixed interval.
struct StatsTimer {
    since: Instant,
    frames: u32,
}

impl StatsTimer {
    fn new() -> Self {
        Self {
            since: Instant::now(),
            frames: 0,
        }
    }

    fn frame(&mut self, renderer: &Renderer) {
        self.frames += 1;
        let elapsed = self.since.elapsed();
        if elapsed < STATS_INTERVAL {
            return;
        }

        let stats = renderer.stats();
        log::info!(
            "{:.1} fps | {:?} | {} objects, {} draw commands, {} vertices, {} lights, last frame rebuilt: {}",
            self.frames as f64 / elapsed.as_secs_f64(),
            renderer.batch_mode(),
            stats.objects,
            stats.draw_commands,
            stats.vertices,
            stats.lights,
            stats.rebuilt
        );
        self.since = Instant::now();
        self.frames = 0;
    }
}
