//! Audio capture, analysis and gain-control configuration.

use std::time::Duration;

use super::{check_range, ConfigError};

/// Spectrum analyzer configuration (mirrors a browser `AnalyserNode`)
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// FFT window size (must be power of 2); the frame has `fft_size / 2` bins
    pub fft_size: usize,

    /// Per-bin temporal smoothing (0.0 = none, 1.0 = frozen)
    pub smoothing_time_constant: f32,

    /// Magnitude mapped to byte 0 (dB)
    pub min_decibels: f32,

    /// Magnitude mapped to byte 255 (dB)
    pub max_decibels: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: audio_constants::FFT_SIZE,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyzerConfig {
    /// Number of frequency bins in each spectrum frame
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 32 {
            return Err(ConfigError::FftSizeNotPowerOfTwo(self.fft_size));
        }
        check_range(
            "smoothing_time_constant",
            self.smoothing_time_constant,
            0.0,
            1.0,
        )?;
        if self.min_decibels >= self.max_decibels {
            return Err(ConfigError::Invalid(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

/// Automatic gain control applied to the microphone before analysis
#[derive(Debug, Clone)]
pub struct GainConfig {
    /// Gain at capture start and the resting point during silence
    pub initial_gain: f32,

    /// Average bin energy the controller steers toward (0-255 scale)
    pub target_average_volume: f32,

    /// Lower gain clamp (multiplier)
    pub min_gain: f32,

    /// Upper gain clamp (multiplier)
    pub max_gain: f32,

    /// Exponential smoothing time constant while signal is present
    pub smoothing_time: Duration,

    /// Multiplier on `smoothing_time` when relaxing toward `initial_gain`
    pub silence_relax_factor: f32,

    /// Average volume at or below which the frame counts as silence
    pub silence_floor: f32,
}

impl Default for GainConfig {
    fn default() -> Self {
        Self {
            initial_gain: 1.5,
            target_average_volume: 80.0,
            min_gain: 0.1,
            max_gain: 7.0,
            smoothing_time: Duration::from_millis(50),
            silence_relax_factor: 5.0,
            silence_floor: 1.0,
        }
    }
}

impl GainConfig {
    /// Time constant used while relaxing during silence
    pub fn relax_time(&self) -> Duration {
        self.smoothing_time.mul_f32(self.silence_relax_factor)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_gain <= 0.0 || self.min_gain >= self.max_gain {
            return Err(ConfigError::Invalid(format!(
                "gain clamp must satisfy 0 < min ({}) < max ({})",
                self.min_gain, self.max_gain
            )));
        }
        check_range("initial_gain", self.initial_gain, self.min_gain, self.max_gain)?;
        check_range(
            "target_average_volume",
            self.target_average_volume,
            1.0,
            255.0,
        )?;
        if self.smoothing_time.is_zero() {
            return Err(ConfigError::Invalid(
                "smoothing_time must be non-zero".to_string(),
            ));
        }
        check_range("silence_relax_factor", self.silence_relax_factor, 1.0, 100.0)
    }
}

/// Synthetic demo source configuration
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Synthesis sample rate (Hz)
    pub sample_rate_hz: usize,

    /// Carrier frequency (Hz)
    pub carrier_hz: f32,

    /// Frequency-modulation LFO rate (Hz)
    pub lfo_hz: f32,

    /// Frequency-modulation depth (± Hz)
    pub lfo_depth_hz: f32,

    /// Output level (linear)
    pub level: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            carrier_hz: 440.0,
            lfo_hz: 0.5,
            lfo_depth_hz: 100.0,
            level: 0.5,
        }
    }
}

impl DemoConfig {
    /// Glicol composition for the modulated sine
    pub fn composition(&self) -> String {
        format!(
            "~lfo: sin {:.3} >> mul {:.3} >> add {:.3}\no: sin ~lfo >> mul {:.3}\n",
            self.lfo_hz, self.lfo_depth_hz, self.carrier_hz, self.level
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::Invalid("sample rate must be > 0".to_string()));
        }
        let nyquist = self.sample_rate_hz as f32 / 2.0;
        check_range(
            "carrier_hz",
            self.carrier_hz + self.lfo_depth_hz,
            0.0,
            nyquist,
        )?;
        check_range("level", self.level, 0.0, 1.0)
    }
}

/// Audio constants (compile-time, match Glicol engine setup)
pub mod audio_constants {
    /// Analyzer FFT size; frames carry `FFT_SIZE / 2` bins
    pub const FFT_SIZE: usize = 256;

    /// Bins per spectrum frame
    pub const BIN_COUNT: usize = FFT_SIZE / 2;

    /// Glicol block size (samples per buffer)
    pub const BLOCK_SIZE: usize = 128;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs_validate() {
        assert!(AnalyzerConfig::default().validate().is_ok());
        assert!(GainConfig::default().validate().is_ok());
        assert!(DemoConfig::default().validate().is_ok());
    }

    #[test]
    fn test_analyzer_bin_count() {
        assert_eq!(AnalyzerConfig::default().bin_count(), 128);
    }

    #[test]
    fn test_analyzer_rejects_odd_fft_size() {
        let config = AnalyzerConfig {
            fft_size: 300,
            ..AnalyzerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::FftSizeNotPowerOfTwo(300))
        );
    }

    #[test]
    fn test_gain_relax_time_is_five_times_smoothing() {
        let config = GainConfig::default();
        assert_eq!(config.relax_time(), Duration::from_millis(250));
    }

    #[test]
    fn test_gain_rejects_inverted_clamp() {
        let config = GainConfig {
            min_gain: 8.0,
            ..GainConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_demo_composition_mentions_carrier() {
        let composition = DemoConfig::default().composition();
        assert!(composition.contains("add 440.000"));
        assert!(composition.starts_with("~lfo: sin 0.500"));
    }
}
