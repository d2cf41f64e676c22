//! Demo source: a Glicol oscillator analyzed like the microphone.
//!
//! Nothing is played to an output device. Each tick renders as many samples
//! as wall-clock time has advanced and analyzes the newest window.

use glicol::Engine;
use std::time::Duration;

use super::analyzer::SpectrumAnalyzer;
use super::capture::SampleSink;
use super::error::SynthesisError;
use super::frame::SpectrumFrame;
use super::source::SpectrumSource;
use crate::params::{audio_constants::BLOCK_SIZE, AnalyzerConfig, ConfigError, DemoConfig};

/// Synthetic spectrum source (frequency-modulated sine)
pub struct DemoSource {
    config: DemoConfig,
    engine: Option<Engine<BLOCK_SIZE>>,
    analyzer: SpectrumAnalyzer,
    ring: SampleSink,
    frame: SpectrumFrame,
    block: Vec<f32>,
    scratch: Vec<f32>,
    /// Samples owed to wall-clock time, not yet rendered
    owed: f64,
}

impl DemoSource {
    pub fn new(config: DemoConfig, analyzer_config: AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let analyzer = SpectrumAnalyzer::new(analyzer_config)?;
        let ring = SampleSink::new(analyzer.config().fft_size * 4);
        let frame = SpectrumFrame::zeroed(analyzer.config().bin_count());

        Ok(Self {
            config,
            engine: None,
            analyzer,
            ring,
            frame,
            block: Vec::with_capacity(BLOCK_SIZE),
            scratch: Vec::new(),
            owed: 0.0,
        })
    }

    /// Build the oscillator graph; a no-op when already running
    pub fn try_start(&mut self) -> Result<(), SynthesisError> {
        if self.engine.is_some() {
            return Ok(());
        }

        let mut engine = Engine::<BLOCK_SIZE>::new();
        engine.set_sr(self.config.sample_rate_hz);
        engine.update_with_code(&self.config.composition());
        engine
            .update()
            .map_err(|e| SynthesisError::Engine(format!("{:?}", e)))?;

        self.analyzer.reset();
        self.ring.clear();
        self.owed = 0.0;
        self.engine = Some(engine);
        tracing::info!(
            carrier_hz = self.config.carrier_hz,
            sample_rate = self.config.sample_rate_hz,
            "demo oscillator started"
        );
        Ok(())
    }

    fn render(&mut self, dt: Duration) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        let sample_rate = self.config.sample_rate_hz as f64;
        self.owed = (self.owed + dt.as_secs_f64() * sample_rate).min(sample_rate);

        while self.owed >= BLOCK_SIZE as f64 {
            let (buffers, _) = engine.next_block(vec![]);
            self.block.clear();
            self.block.extend((0..BLOCK_SIZE).map(|i| buffers[0][i]));
            self.ring.push(&self.block);
            self.owed -= BLOCK_SIZE as f64;
        }
    }
}

impl SpectrumSource for DemoSource {
    fn start(&mut self) {
        if let Err(err) = self.try_start() {
            tracing::error!("{}", err);
        }
    }

    fn stop(&mut self) {
        if self.engine.take().is_some() {
            self.frame.clear();
            self.ring.clear();
            tracing::info!("demo oscillator stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.engine.is_some()
    }

    fn current_frame(&self) -> &SpectrumFrame {
        &self.frame
    }

    fn tick(&mut self, dt: Duration) {
        if self.engine.is_none() {
            return;
        }
        self.render(dt);
        self.ring.snapshot_into(&mut self.scratch);
        self.analyzer.analyze(&self.scratch, 1.0, &mut self.frame);
    }
}
