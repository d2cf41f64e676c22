//! Byte-scaled spectrum analysis of the most recent sample window.
//!
//! Behaves like a browser `AnalyserNode` reading byte frequency data:
//! Blackman window, per-bin temporal smoothing, then decibels mapped onto
//! the 0-255 range.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use super::frame::SpectrumFrame;
use crate::params::{AnalyzerConfig, ConfigError};

/// FFT analyzer producing `SpectrumFrame`s
pub struct SpectrumAnalyzer {
    config: AnalyzerConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
}

impl SpectrumAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let window = (0..config.fft_size)
            .map(|i| blackman_window(i, config.fft_size))
            .collect();

        Ok(Self {
            fft,
            window,
            buffer: vec![Complex::new(0.0, 0.0); config.fft_size],
            smoothed: vec![0.0; config.bin_count()],
            bytes: vec![0; config.bin_count()],
            config,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Forget the smoothing history (new capture session)
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }

    /// Analyze the newest `fft_size` samples, scaled by `gain`, into `frame`.
    ///
    /// A shorter `samples` slice is treated as preceded by silence.
    pub fn analyze(&mut self, samples: &[f32], gain: f32, frame: &mut SpectrumFrame) {
        let n = self.config.fft_size;
        let recent = &samples[samples.len().saturating_sub(n)..];
        let pad = n - recent.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { recent[i - pad] };
            *slot = Complex::new(sample * gain * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let tau = self.config.smoothing_time_constant;
        let range = self.config.max_decibels - self.config.min_decibels;
        for (k, byte) in self.bytes.iter_mut().enumerate() {
            let magnitude = self.buffer[k].norm() / n as f32;
            let smoothed = tau * self.smoothed[k] + (1.0 - tau) * magnitude;
            self.smoothed[k] = if smoothed.is_finite() { smoothed } else { 0.0 };

            let db = linear_to_decibels(self.smoothed[k]);
            let scaled = 255.0 / range * (db - self.config.min_decibels);
            *byte = scaled.clamp(0.0, 255.0) as u8;
        }

        frame.overwrite(&self.bytes);
    }
}

fn linear_to_decibels(value: f32) -> f32 {
    if value > 0.0 {
        20.0 * value.log10()
    } else {
        f32::NEG_INFINITY
    }
}

/// Blackman window (alpha = 0.16) for FFT analysis
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let alpha = 0.16;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5;
    let a2 = 0.5 * alpha;
    let x = index as f32 / size as f32;
    a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
}
