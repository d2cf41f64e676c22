//! Command-line argument parsing.

use clap::{Parser, ValueEnum};

use cyberpulse::driver::{DriverConfig, SourceSelection};
use cyberpulse::params::{ConfigError, ControlParams, GainConfig, RenderConfig};

/// Source to start with
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceArg {
    None,
    Mic,
    Demo,
}

impl From<SourceArg> for SourceSelection {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::None => SourceSelection::None,
            SourceArg::Mic => SourceSelection::Microphone,
            SourceArg::Demo => SourceSelection::Demo,
        }
    }
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "cyberpulse")]
#[command(about = "Audio-reactive particle and spectrum visualizer", long_about = None)]
pub struct Args {
    /// Source selected at startup
    #[arg(long, value_enum, default_value = "none")]
    pub source: SourceArg,

    /// Initial punch (frequency emphasis), 0-100
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub punch: u8,

    /// Initial vibe (particle density and bar chaos), 0-100
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub vibe: u8,

    /// Initial mood slider, -50 (cool) to 50 (warm)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true,
          value_parser = clap::value_parser!(i8).range(-50..=50))]
    pub mood: i8,

    /// Fixed seed for visual jitter (reproducible runs)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Window width (pixels)
    #[arg(long, value_name = "PIXELS", default_value_t = 1280)]
    pub width: u32,

    /// Window height (pixels)
    #[arg(long, value_name = "PIXELS", default_value_t = 720)]
    pub height: u32,

    /// Average spectrum energy the microphone gain control aims for (1-255)
    #[arg(long, value_name = "LEVEL", default_value_t = 80.0)]
    pub agc_target: f32,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn control_params(&self) -> ControlParams {
        ControlParams::new(self.punch as i32, self.vibe as i32, self.mood as i32)
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width,
            window_height: self.height,
            ..RenderConfig::default()
        }
    }

    /// Driver configuration, validated
    pub fn driver_config(&self) -> Result<DriverConfig, ConfigError> {
        let gain = GainConfig {
            target_average_volume: self.agc_target,
            ..GainConfig::default()
        };
        gain.validate()?;

        Ok(DriverConfig {
            gain,
            seed: self.seed,
            width: self.width,
            height: self.height,
            ..DriverConfig::default()
        })
    }
}
