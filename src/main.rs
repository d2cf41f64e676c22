//! CYBERPULSE - audio-reactive particle and spectrum visualizer
//!
//! Listens to the microphone (or a synthetic demo tone) and turns the
//! spectrum into glowing bars, drifting particles and a bass-driven pulse.

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use cli::Args;
use cyberpulse::audio::CpalBackend;
use cyberpulse::driver::{FrameDriver, SourceSelection};
use cyberpulse::params::{ControlParams, RenderConfig};
use cyberpulse::rendering::Presenter;

/// Control step per key press
const STEP: i32 = 5;

/// Main application state
struct App {
    // Window and presentation
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,

    // Sources, render engine and canvas
    driver: FrameDriver,
    params: ControlParams,
    initial_source: SourceSelection,

    render_config: RenderConfig,
    shown_title: String,

    last_frame: Instant,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let config = args
            .driver_config()
            .context("invalid command-line configuration")?;
        let driver = FrameDriver::new(Arc::new(CpalBackend), config)
            .context("failed to build frame driver")?;

        Ok(Self {
            window: None,
            presenter: None,
            driver,
            params: args.control_params(),
            initial_source: args.source.into(),
            render_config: args.render_config(),
            shown_title: String::new(),
            last_frame: Instant::now(),
        })
    }

    fn handle_key(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) {
        let params = self.params;
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyM => self.driver.toggle_microphone(),
            KeyCode::KeyD => self.driver.toggle_demo(),
            KeyCode::KeyR => self.driver.retry_microphone(),
            KeyCode::ArrowUp => self.params = params.adjust_vibe(STEP),
            KeyCode::ArrowDown => self.params = params.adjust_vibe(-STEP),
            KeyCode::ArrowRight => self.params = params.adjust_punch(STEP),
            KeyCode::ArrowLeft => self.params = params.adjust_punch(-STEP),
            KeyCode::BracketRight => self.params = params.adjust_mood(STEP),
            KeyCode::BracketLeft => self.params = params.adjust_mood(-STEP),
            _ => {}
        }
        if self.params != params {
            tracing::debug!(
                punch = self.params.punch,
                vibe = self.params.vibe,
                mood = self.params.mood_raw,
                "controls changed"
            );
        }
    }

    /// Errors are shown in the title bar, outside the canvas
    fn update_title(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let title = match self.driver.error_message() {
            Some(error) => format!("{} - {}", self.render_config.title, error),
            None => format!(
                "{} - {} | punch {} vibe {} mood {:?}",
                self.render_config.title,
                self.driver.microphone_label(),
                self.params.punch,
                self.params.vibe,
                self.params.mood(),
            ),
        };
        if title != self.shown_title {
            window.set_title(&title);
            self.shown_title = title;
        }
    }

    /// Render a single frame
    fn render_frame(&mut self) {
        let now = Instant::now();
        let elapsed = now - self.last_frame;
        self.last_frame = now;

        if self.driver.step(elapsed, &self.params).is_none() {
            return;
        }
        self.update_title();

        let Some(presenter) = self.presenter.as_mut() else {
            return;
        };
        let Some((pixels, width, height)) = self.driver.pixels() else {
            return;
        };

        match presenter.render(pixels, width, height) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => presenter.reconfigure(),
            Err(e) => tracing::error!("Render error: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.render_config.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let presenter = match pollster::block_on(Presenter::new(Arc::clone(&window))) {
            Ok(presenter) => presenter,
            Err(e) => {
                tracing::error!("{}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.driver.resize(size.width, size.height);
        self.driver.select(self.initial_source);
        self.last_frame = Instant::now();

        tracing::info!("M: microphone  D: demo  R: retry mic  arrows: vibe/punch  [ ]: mood  Esc: quit");

        self.window = Some(window);
        self.presenter = Some(presenter);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        ..
                    },
                ..
            } => self.handle_key(code, event_loop),
            WindowEvent::Resized(size) => {
                if let Some(presenter) = self.presenter.as_mut() {
                    presenter.resize(size.width, size.height);
                }
                self.driver.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose)?;

    tracing::info!("CYBERPULSE starting");

    let mut app = App::new(&args)?;
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.run_app(&mut app).context("event loop failed")?;

    Ok(())
}
