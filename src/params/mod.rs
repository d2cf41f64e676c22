//! Parameter definitions with units and documented semantics.
//!
//! Every tunable number of the pipeline lives here:
//! - Units (seconds, Hz, decibels, pixels) next to each field
//! - Documented ranges and meanings
//! - `validate()` where a bad value would break an invariant

mod audio;
mod controls;
mod render;
mod visual;

use thiserror::Error;

// Re-export all types
pub use audio::{audio_constants, AnalyzerConfig, DemoConfig, GainConfig};
pub use controls::{ControlParams, Mood};
pub use render::RenderConfig;
pub use visual::VisualConfig;

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("FFT size must be a power of 2, got {0}")]
    FftSizeNotPowerOfTwo(usize),

    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("{0}")]
    Invalid(String),
}

pub(crate) fn check_range(
    name: &'static str,
    value: f32,
    min: f32,
    max: f32,
) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}
