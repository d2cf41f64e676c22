//! Per-refresh frame loop: tick the sources, render, rasterize.
//!
//! The window layer calls `step` once per redraw with the wall-clock time
//! since the previous call. Everything here runs on the main thread; the only
//! cross-thread traffic is inside the microphone source.

use std::sync::Arc;
use std::time::Duration;

use crate::audio::{
    CaptureBackend, DemoSource, MicrophoneSource, PermissionStatus, SourceState, SpectrumSource,
};
use crate::params::{AnalyzerConfig, ConfigError, ControlParams, DemoConfig, GainConfig, VisualConfig};
use crate::rendering::{RenderError, SkiaSurface};
use crate::visual::{DrawList, FrameReport, RenderEngine};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Which source feeds the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSelection {
    None,
    Microphone,
    Demo,
}

/// Everything needed to build a driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub analyzer: AnalyzerConfig,
    pub gain: GainConfig,
    pub demo: DemoConfig,
    pub visual: VisualConfig,
    /// Fixed jitter seed; `None` seeds from entropy
    pub seed: Option<u64>,
    pub width: u32,
    pub height: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            gain: GainConfig::default(),
            demo: DemoConfig::default(),
            visual: VisualConfig::default(),
            seed: None,
            width: 1280,
            height: 720,
        }
    }
}

/// Owns the sources, the render engine and the canvas
pub struct FrameDriver {
    microphone: MicrophoneSource,
    demo: DemoSource,
    selection: SourceSelection,
    engine: RenderEngine,
    surface: Option<SkiaSurface>,
    draw_list: DrawList,
    clock_s: f64,
}

impl FrameDriver {
    pub fn new(backend: Arc<dyn CaptureBackend>, config: DriverConfig) -> Result<Self, ConfigError> {
        let microphone = MicrophoneSource::new(backend, config.analyzer.clone(), config.gain)?;
        let demo = DemoSource::new(config.demo, config.analyzer)?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let engine = RenderEngine::with_rng(config.visual, config.width, config.height, rng);

        let surface = match SkiaSurface::new(config.width, config.height) {
            Ok(surface) => Some(surface),
            Err(RenderError::EmptySurface { .. }) => None,
            Err(err) => {
                tracing::warn!("{}", err);
                None
            }
        };

        Ok(Self {
            microphone,
            demo,
            selection: SourceSelection::None,
            engine,
            surface,
            draw_list: DrawList::new(),
            clock_s: 0.0,
        })
    }

    pub fn selection(&self) -> SourceSelection {
        self.selection
    }

    /// Switch sources, stopping the previous one first
    pub fn select(&mut self, selection: SourceSelection) {
        if selection == self.selection {
            return;
        }
        match self.selection {
            SourceSelection::Microphone => self.microphone.stop(),
            SourceSelection::Demo => self.demo.stop(),
            SourceSelection::None => {}
        }
        self.selection = selection;
        match selection {
            SourceSelection::Microphone => self.microphone.start(),
            SourceSelection::Demo => self.demo.start(),
            SourceSelection::None => {}
        }
        tracing::info!(?selection, "source selected");
    }

    pub fn toggle_microphone(&mut self) {
        if self.selection == SourceSelection::Microphone {
            self.select(SourceSelection::None);
        } else {
            self.select(SourceSelection::Microphone);
        }
    }

    pub fn toggle_demo(&mut self) {
        if self.selection == SourceSelection::Demo {
            self.select(SourceSelection::None);
        } else {
            self.select(SourceSelection::Demo);
        }
    }

    /// Forget a microphone denial (explicit user retry)
    pub fn retry_microphone(&mut self) {
        self.microphone.retry_permission();
    }

    /// True only when a source is selected and producing live frames
    pub fn is_active(&self) -> bool {
        match self.selection {
            SourceSelection::None => false,
            SourceSelection::Microphone => self.microphone.is_active(),
            SourceSelection::Demo => self.demo.is_active(),
        }
    }

    pub fn microphone(&self) -> &MicrophoneSource {
        &self.microphone
    }

    pub fn microphone_state(&self) -> SourceState {
        self.microphone.state()
    }

    pub fn permission_status(&self) -> PermissionStatus {
        self.microphone.permission_status()
    }

    pub fn is_listening(&self) -> bool {
        self.microphone.is_listening()
    }

    pub fn error_message(&self) -> Option<String> {
        self.microphone.error_message()
    }

    pub fn microphone_label(&self) -> &'static str {
        self.microphone
            .button_label(self.selection == SourceSelection::Microphone)
    }

    /// Block until a pending microphone request resolves (headless use)
    pub fn wait_for_microphone(&mut self, timeout: Duration) -> bool {
        self.microphone.wait_for_resolution(timeout)
    }

    /// New canvas size. Zero in either dimension leaves the surface unready.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            self.surface = None;
            return;
        }
        let result = match self.surface.take() {
            Some(mut surface) => surface.resize(width, height).map(|()| surface),
            None => SkiaSurface::new(width, height),
        };
        match result {
            Ok(surface) => self.surface = Some(surface),
            Err(err) => {
                tracing::warn!("{}", err);
                return;
            }
        }
        self.engine.resize(width, height);
    }

    /// Canvas pixels with their dimensions, if the surface is ready
    pub fn pixels(&self) -> Option<(&[u8], u32, u32)> {
        self.surface
            .as_ref()
            .map(|s| (s.pixels(), s.width(), s.height()))
    }

    pub fn surface(&self) -> Option<&SkiaSurface> {
        self.surface.as_ref()
    }

    /// Commands of the last rendered frame
    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    /// Advance the sources by `elapsed` and render one frame.
    ///
    /// Returns `None` when the surface is not ready; the caller just tries
    /// again on the next refresh.
    pub fn step(&mut self, elapsed: Duration, params: &ControlParams) -> Option<FrameReport> {
        self.microphone.tick(elapsed);
        self.demo.tick(elapsed);
        self.clock_s += elapsed.as_secs_f64();

        let is_active = self.is_active();
        let surface = self.surface.as_mut()?;

        let frame = match self.selection {
            SourceSelection::Demo => self.demo.current_frame(),
            _ => self.microphone.current_frame(),
        };

        let report = self
            .engine
            .render_frame(frame, params, is_active, self.clock_s, &mut self.draw_list);
        surface.execute(&self.draw_list);
        Some(report)
    }
}
