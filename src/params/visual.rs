//! Render-engine tuning: trails, glow, particles and bars.
//!
//! Distances are in canvas pixels unless a field says it is a fraction of
//! the canvas width or height.

/// Visual mapping constants for the render engine
#[derive(Debug, Clone)]
pub struct VisualConfig {
    /// Opacity of the background overlay painted each active frame (trail length)
    pub trail_opacity: f32,

    /// Every bin below this energy means the frame is silent (0-255 scale)
    pub silence_threshold: u8,

    /// Fraction of the lowest bins forming the bass band
    pub bass_fraction: f32,

    /// Bass average at which bass intensity saturates (0-255 scale)
    pub bass_saturation: f32,

    /// Gamma applied to normalized bass before it drives the glow
    pub bass_gamma: f32,

    /// Breathing glow period during silence (seconds)
    pub breathing_period_s: f64,

    /// Glow opacity ceiling
    pub max_glow_opacity: f32,

    /// `vibe` above which particles exist
    pub particle_vibe_threshold: u8,

    /// `vibe` above which particles are linked into a network
    pub link_vibe_threshold: u8,

    /// Link distance at the link threshold (pixels)
    pub link_base_distance: f32,

    /// Extra link distance per vibe point above the threshold (pixels)
    pub link_distance_per_vibe: f32,

    /// Bar width as a multiple of `width / bins` (bars overlap above 1.0)
    pub bar_width_scale: f32,

    /// Bars shorter than this are skipped (pixels)
    pub bar_visibility_floor: f32,

    /// Full-energy bar height as a divisor of the canvas height
    pub bar_height_divisor: f32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            trail_opacity: 0.12,
            silence_threshold: 5,
            bass_fraction: 0.25,
            bass_saturation: 150.0,
            bass_gamma: 2.0,
            breathing_period_s: 1.6,
            max_glow_opacity: 0.7,
            particle_vibe_threshold: 10,
            link_vibe_threshold: 30,
            link_base_distance: 70.0,
            link_distance_per_vibe: 0.8,
            bar_width_scale: 2.5,
            bar_visibility_floor: 0.5,
            bar_height_divisor: 1.2,
        }
    }
}

impl VisualConfig {
    /// Particle link distance for a given vibe (grows with vibe)
    pub fn link_distance(&self, vibe: u8) -> f32 {
        let above = vibe.saturating_sub(self.link_vibe_threshold) as f32;
        self.link_base_distance + above * self.link_distance_per_vibe
    }

    /// Angular speed of the breathing pattern (radians per second)
    pub fn breathing_rate(&self) -> f64 {
        std::f64::consts::TAU / self.breathing_period_s
    }
}
