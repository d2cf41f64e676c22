//! Automatic gain control for the microphone path.
//!
//! A proportional controller: each tick compares the average energy of the
//! frame just analyzed with the target and glides the gain toward the value
//! that would have hit the target. Near silence it relaxes back to the
//! initial gain with a slower time constant instead of amplifying the noise
//! floor.

use std::time::Duration;

use super::frame::SpectrumFrame;
use crate::params::GainConfig;

/// Which branch the last update took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainAction {
    /// Signal present; gliding toward the proportional target
    Tracking,
    /// Near silence with gain above the initial value; gliding back down
    Relaxing,
    /// Near silence at or below the initial value; gain untouched
    Holding,
}

/// AGC state. Owned by the microphone source; the renderer never reads it.
#[derive(Debug, Clone)]
pub struct GainController {
    config: GainConfig,
    current_gain: f32,
}

impl GainController {
    pub fn new(config: GainConfig) -> Self {
        Self {
            current_gain: config.initial_gain,
            config,
        }
    }

    pub fn current_gain(&self) -> f32 {
        self.current_gain
    }

    pub fn config(&self) -> &GainConfig {
        &self.config
    }

    /// Back to the initial gain (capture restart)
    pub fn reset(&mut self) {
        self.current_gain = self.config.initial_gain;
    }

    /// Adjust gain from the frame observed this tick; applies to the next tick
    pub fn update(&mut self, frame: &SpectrumFrame, dt: Duration) -> GainAction {
        self.update_with_average(frame.average(), dt)
    }

    /// Adjust gain from an already computed average volume (0-255 scale)
    pub fn update_with_average(&mut self, average_volume: f32, dt: Duration) -> GainAction {
        let config = &self.config;

        let action = if average_volume > config.silence_floor {
            let desired = (self.current_gain * (config.target_average_volume / average_volume))
                .clamp(config.min_gain, config.max_gain);
            self.current_gain = approach(self.current_gain, desired, dt, config.smoothing_time);
            GainAction::Tracking
        } else if self.current_gain > config.initial_gain {
            self.current_gain = approach(
                self.current_gain,
                config.initial_gain,
                dt,
                config.relax_time(),
            );
            GainAction::Relaxing
        } else {
            GainAction::Holding
        };

        self.current_gain = self.current_gain.clamp(config.min_gain, config.max_gain);
        action
    }
}

/// One step of exponential smoothing toward `target` with time constant `tau`.
///
/// The result always lies between `current` and `target`.
fn approach(current: f32, target: f32, dt: Duration, tau: Duration) -> f32 {
    let tau = tau.as_secs_f32();
    if tau <= 0.0 {
        return target;
    }
    let alpha = 1.0 - (-dt.as_secs_f32() / tau).exp();
    current + (target - current) * alpha.clamp(0.0, 1.0)
}
