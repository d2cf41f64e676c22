//! Frame renderer: spectrum + controls in, draw commands out.
//!
//! The canvas is never fully cleared while a source is active. Each frame
//! paints a translucent background over the previous one, so everything
//! leaves a short trail. Random jitter comes from an owned `StdRng` that tests
//! seed for reproducible output.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::draw::{DrawCommand, DrawList};
use super::palette::{Palette, Rgba, BACKGROUND, LINK};
use super::particles::ParticleField;
use crate::audio::SpectrumFrame;
use crate::params::{ControlParams, VisualConfig};

/// Glow color while the analyzer has produced nothing yet
const AMBIENT_GLOW: Rgba = Rgba::rgb(45, 226, 230);

/// Which top-level path a frame took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    /// No source playing: solid background, no particles
    Standby,
    /// Active but the frame has no bins yet
    Warmup,
    Active,
}

/// How the central glow was driven
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlowMode {
    /// Warm-up pulse
    Ambient,
    /// Silence: slow sinusoidal breathing
    Breathing,
    /// Bass and overall volume, amplified by punch
    Reactive,
}

/// Bar style, chosen by vibe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarShape {
    Rect,
    Polygon,
    Spike,
}

impl BarShape {
    pub fn for_vibe(vibe: u8) -> Self {
        match vibe {
            0..=29 => BarShape::Rect,
            30..=69 => BarShape::Polygon,
            _ => BarShape::Spike,
        }
    }
}

/// Structural summary of one rendered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub mode: FrameMode,
    pub glow: Option<GlowMode>,
    pub regenerated: bool,
    pub particles: usize,
    pub links: usize,
    pub bar_shape: Option<BarShape>,
    pub bars_drawn: usize,
    pub bars_skipped: usize,
    pub sparks: usize,
}

impl FrameReport {
    fn new(mode: FrameMode) -> Self {
        Self {
            mode,
            glow: None,
            regenerated: false,
            particles: 0,
            links: 0,
            bar_shape: None,
            bars_drawn: 0,
            bars_skipped: 0,
            sparks: 0,
        }
    }
}

/// Glow geometry for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub mode: GlowMode,
    pub radius: f32,
    pub opacity: f32,
}

/// Compute the central glow for a non-empty frame
pub fn glow_for(
    frame: &SpectrumFrame,
    punch: u8,
    width: f32,
    time_s: f64,
    config: &VisualConfig,
) -> Glow {
    if frame.is_silent(config.silence_threshold) {
        let phase = time_s * config.breathing_rate();
        let radius = width * (0.015 + (phase.sin() as f32) * 0.005);
        let opacity = 0.08 + ((phase * 0.75).sin() as f32) * 0.03;
        return Glow {
            mode: GlowMode::Breathing,
            radius,
            opacity,
        };
    }

    let bass = frame.band_average(config.bass_fraction);
    let intensity = (bass / config.bass_saturation)
        .min(1.0)
        .powf(config.bass_gamma);
    let volume = frame.average() / 255.0;

    let bass_pulse = intensity * width * 0.20 * (1.0 + punch as f32 / 30.0);
    let radius = width * 0.02 + bass_pulse + volume * width * 0.05;
    let opacity = (0.05 + intensity * 0.65 + volume * 0.1).min(config.max_glow_opacity);

    Glow {
        mode: GlowMode::Reactive,
        radius,
        opacity,
    }
}

/// Bin value after the punch focus boost, clamped to 0..=255
pub fn punch_boost(value: u8, index: usize, len: usize, punch: u8, vibe: u8) -> f32 {
    let center = (len as f32 * punch as f32 / 200.0).floor();
    let distance = (index as f32 - center).abs();
    let focus_width = len as f32 * 0.25 * (1.0 - vibe as f32 / 250.0);
    let magnitude = 1.0 + punch as f32 / 30.0;
    let factor = if focus_width > 0.0 {
        (1.0 - distance / focus_width).max(0.0) * magnitude
    } else {
        0.0
    };
    (value as f32 * (1.0 + factor)).min(255.0)
}

/// Owns the particle field and the jitter source; turns frames into draw lists
pub struct RenderEngine {
    config: VisualConfig,
    field: ParticleField,
    rng: StdRng,
    size: Vec2,
}

impl RenderEngine {
    /// Engine with entropy-seeded jitter
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_rng(VisualConfig::default(), width, height, StdRng::from_entropy())
    }

    /// Engine with reproducible jitter
    pub fn with_seed(width: u32, height: u32, seed: u64) -> Self {
        Self::with_rng(
            VisualConfig::default(),
            width,
            height,
            StdRng::seed_from_u64(seed),
        )
    }

    pub fn with_rng(config: VisualConfig, width: u32, height: u32, rng: StdRng) -> Self {
        let size = Vec2::new(width as f32, height as f32);
        Self {
            config,
            field: ParticleField::new(size.x, size.y),
            rng,
            size,
        }
    }

    pub fn config(&self) -> &VisualConfig {
        &self.config
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Canvas resized: particles are laid out again inside the new bounds
    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = Vec2::new(width as f32, height as f32);
        self.field.resize(self.size.x, self.size.y, &mut self.rng);
        tracing::debug!(width, height, "render engine resized");
    }

    /// Render one frame into `out` (cleared first).
    ///
    /// `time_s` drives the breathing glow and hue rotation; any monotonic
    /// clock in seconds works.
    pub fn render_frame(
        &mut self,
        frame: &SpectrumFrame,
        params: &ControlParams,
        is_active: bool,
        time_s: f64,
        out: &mut DrawList,
    ) -> FrameReport {
        out.clear();

        if !is_active {
            out.push(DrawCommand::Fill { color: BACKGROUND });
            self.field.clear();
            return FrameReport::new(FrameMode::Standby);
        }

        out.push(DrawCommand::Fill {
            color: BACKGROUND.with_alpha(self.config.trail_opacity),
        });

        if frame.is_empty() {
            self.draw_ambient_glow(time_s, out);
            let mut report = FrameReport::new(FrameMode::Warmup);
            report.glow = Some(GlowMode::Ambient);
            return report;
        }

        let mut report = FrameReport::new(FrameMode::Active);
        let mood = params.mood();
        let palette = Palette::for_mood(mood);

        report.regenerated = self.field.sync(params.vibe, mood, &mut self.rng);
        if params.vibe > self.config.particle_vibe_threshold && !self.field.is_empty() {
            report.links = self.draw_particles(frame, params, out);
        }
        report.particles = self.field.len();

        let glow = glow_for(frame, params.punch, self.size.x, time_s, &self.config);
        if glow.radius > self.size.x * 0.005 && glow.opacity > 0.01 {
            out.push(DrawCommand::RadialGlow {
                center: self.size / 2.0,
                inner_radius: glow.radius * 0.2,
                outer_radius: glow.radius,
                stops: vec![
                    (0.0, palette.primary.with_alpha(glow.opacity)),
                    (0.7, palette.primary.with_alpha(glow.opacity * 0.3)),
                    (1.0, palette.primary.with_alpha(0.0)),
                ],
            });
            report.glow = Some(glow.mode);
        }

        self.draw_bars(frame, params, &palette, time_s, out, &mut report);

        tracing::trace!(?report, "frame rendered");
        report
    }

    fn draw_ambient_glow(&self, time_s: f64, out: &mut DrawList) {
        let phase = time_s * self.config.breathing_rate();
        let radius = self.size.x * (0.015 + (phase.sin() as f32) * 0.005);
        let opacity = 0.1 + ((phase * 0.75).sin() as f32) * 0.05;

        out.push(DrawCommand::RadialGlow {
            center: self.size / 2.0,
            inner_radius: 0.0,
            outer_radius: radius.max(0.0),
            stops: vec![
                (0.0, AMBIENT_GLOW.with_alpha(opacity)),
                (1.0, AMBIENT_GLOW.with_alpha(0.0)),
            ],
        });
    }

    /// Advance, link and draw the particles. Returns the number of links.
    fn draw_particles(
        &mut self,
        frame: &SpectrumFrame,
        params: &ControlParams,
        out: &mut DrawList,
    ) -> usize {
        self.field.advance(params.vibe);

        let mut links = 0;
        if params.vibe > self.config.link_vibe_threshold {
            let distance = self.config.link_distance(params.vibe);
            let color = LINK.with_alpha(0.02 + 0.1 * params.vibe as f32 / 100.0);
            for (from, to) in self.field.links(distance) {
                out.push(DrawCommand::Line {
                    from,
                    to,
                    width: 1.0,
                    color,
                });
                links += 1;
            }
        }

        let pulse = 1.0 + frame.average() / 255.0 * (params.punch as f32 / 100.0);
        for particle in self.field.particles() {
            out.push(DrawCommand::Circle {
                center: particle.position,
                radius: (particle.radius * pulse).max(0.5),
                color: particle.color,
            });
        }
        links
    }

    fn draw_bars(
        &mut self,
        frame: &SpectrumFrame,
        params: &ControlParams,
        palette: &Palette,
        time_s: f64,
        out: &mut DrawList,
        report: &mut FrameReport,
    ) {
        let len = frame.len();
        let (width, height) = (self.size.x, self.size.y);
        let bar_width = (width / len as f32 * self.config.bar_width_scale).max(1.0);
        let shape = BarShape::for_vibe(params.vibe);
        let ve = params.vibe as f32 / 100.0;
        report.bar_shape = Some(shape);

        let mut x = 0.0;
        for (i, &bin) in frame.bins().iter().enumerate() {
            let value = punch_boost(bin, i, len, params.punch, params.vibe);
            let bar_height = value / 255.0 * (height / self.config.bar_height_divisor);

            if bar_height < self.config.bar_visibility_floor {
                report.bars_skipped += 1;
                x += bar_width + 1.0;
                continue;
            }

            let color = palette.bar_color(i, len, value, time_s);
            match shape {
                BarShape::Rect => out.push(DrawCommand::Rect {
                    origin: Vec2::new(x, height - bar_height),
                    size: Vec2::new(bar_width, bar_height),
                    color,
                }),
                BarShape::Polygon => {
                    let rng = &mut self.rng;
                    let left = height - bar_height * (0.8 + rng.gen::<f32>() * 0.1 * ve);
                    let peak = height - bar_height * (1.0 + (rng.gen::<f32>() - 0.5) * 0.3 * ve);
                    let right = height - bar_height * (0.9 + rng.gen::<f32>() * 0.1 * ve);
                    out.push(DrawCommand::Polygon {
                        points: vec![
                            Vec2::new(x, height),
                            Vec2::new(x, left),
                            Vec2::new(x + bar_width / 2.0, peak),
                            Vec2::new(x + bar_width, right),
                            Vec2::new(x + bar_width, height),
                        ],
                        color,
                    });
                }
                BarShape::Spike => {
                    if self.draw_spike(x, bar_width, bar_height, ve, color, palette, out) {
                        report.sparks += 1;
                    }
                }
            }
            report.bars_drawn += 1;
            x += bar_width + 1.0;
        }
    }

    /// One jittered stroke per bar, sometimes with a spark near the tip.
    /// Returns true when a spark was drawn.
    #[allow(clippy::too_many_arguments)]
    fn draw_spike(
        &mut self,
        x: f32,
        bar_width: f32,
        bar_height: f32,
        ve: f32,
        color: Rgba,
        palette: &Palette,
        out: &mut DrawList,
    ) -> bool {
        let height = self.size.y;
        let rng = &mut self.rng;

        let width = (bar_width / 3.0 + rng.gen::<f32>() * (bar_width / 3.0) * ve).max(1.0);
        let base_y = height - rng.gen::<f32>() * bar_height * 0.2 * ve;
        let tip_y = height - bar_height;
        let mid_x = x + bar_width / 2.0;
        let tip = Vec2::new(
            mid_x + (rng.gen::<f32>() - 0.5) * 15.0 * ve,
            tip_y + (rng.gen::<f32>() - 0.5) * 40.0 * ve,
        );
        out.push(DrawCommand::Line {
            from: Vec2::new(mid_x, base_y),
            to: tip,
            width,
            color,
        });

        if rng.gen::<f32>() < 0.15 * ve && bar_height > height * 0.1 {
            let center = Vec2::new(
                mid_x + (rng.gen::<f32>() - 0.5) * 15.0,
                tip_y + (rng.gen::<f32>() - 0.5) * 30.0,
            );
            out.push(DrawCommand::Circle {
                center,
                radius: rng.gen::<f32>() * 2.5,
                color: palette.secondary,
            });
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Mood;
    use approx::assert_relative_eq;

    const W: u32 = 1280;
    const H: u32 = 720;

    fn params(punch: i32, vibe: i32, mood: i32) -> ControlParams {
        ControlParams::new(punch, vibe, mood)
    }

    fn engine() -> RenderEngine {
        RenderEngine::with_seed(W, H, 42)
    }

    fn rects(list: &DrawList) -> Vec<(Vec2, Vec2)> {
        list.iter()
            .filter_map(|c| match c {
                DrawCommand::Rect { origin, size, .. } => Some((*origin, *size)),
                _ => None,
            })
            .collect()
    }

    fn count<F: Fn(&DrawCommand) -> bool>(list: &DrawList, f: F) -> usize {
        list.iter().filter(|c| f(c)).count()
    }

    #[test]
    fn test_standby_paints_solid_and_clears_particles() {
        let mut engine = engine();
        let mut out = DrawList::new();
        let loud = SpectrumFrame::from_bins(vec![120; 128]);

        engine.render_frame(&loud, &params(50, 80, 0), true, 0.0, &mut out);
        assert_eq!(engine.field().len(), 150);

        let report = engine.render_frame(&loud, &params(50, 80, 0), false, 0.1, &mut out);
        assert_eq!(report.mode, FrameMode::Standby);
        assert_eq!(out.commands(), &[DrawCommand::Fill { color: BACKGROUND }]);
        assert!(engine.field().is_empty());
    }

    #[test]
    fn test_reactivation_regenerates_particles() {
        let mut engine = engine();
        let mut out = DrawList::new();
        let frame = SpectrumFrame::silent();
        let p = params(50, 50, 0);

        assert!(engine.render_frame(&frame, &p, true, 0.0, &mut out).regenerated);
        engine.render_frame(&frame, &p, false, 0.0, &mut out);
        let report = engine.render_frame(&frame, &p, true, 0.0, &mut out);
        assert!(report.regenerated);
        assert_eq!(report.particles, 100);
    }

    #[test]
    fn test_empty_frame_draws_ambient_glow_only() {
        let mut engine = engine();
        let mut out = DrawList::new();
        let report =
            engine.render_frame(&SpectrumFrame::empty(), &params(50, 50, 0), true, 0.0, &mut out);

        assert_eq!(report.mode, FrameMode::Warmup);
        assert_eq!(report.glow, Some(GlowMode::Ambient));
        assert_eq!(out.len(), 2);
        assert!(matches!(out.commands()[0], DrawCommand::Fill { color } if color.a == 0.12));
        match &out.commands()[1] {
            DrawCommand::RadialGlow {
                center,
                inner_radius,
                outer_radius,
                stops,
            } => {
                assert_eq!(*center, Vec2::new(640.0, 360.0));
                assert_eq!(*inner_radius, 0.0);
                assert_relative_eq!(*outer_radius, 1280.0 * 0.015, epsilon = 1e-3);
                assert_relative_eq!(stops[0].1.a, 0.1, epsilon = 1e-6);
            }
            other => panic!("expected glow, got {:?}", other),
        }
    }

    #[test]
    fn test_silence_takes_breathing_path() {
        let config = VisualConfig::default();
        let frame = SpectrumFrame::from_bins(vec![4; 128]);

        for punch in [0, 50, 100] {
            let glow = glow_for(&frame, punch, 1000.0, 0.4, &config);
            assert_eq!(glow.mode, GlowMode::Breathing);
            // Quarter period: sine peak
            assert_relative_eq!(glow.radius, 20.0, epsilon = 1e-3);
        }

        let mut engine = engine();
        let mut out = DrawList::new();
        let report = engine.render_frame(&frame, &params(100, 50, 0), true, 3.0, &mut out);
        assert_eq!(report.glow, Some(GlowMode::Breathing));
    }

    #[test]
    fn test_breathing_stays_in_band() {
        let config = VisualConfig::default();
        let frame = SpectrumFrame::silent();
        for step in 0..200 {
            let glow = glow_for(&frame, 100, 1000.0, step as f64 * 0.037, &config);
            assert!((10.0..=20.0 + 1e-3).contains(&glow.radius));
            assert!((0.05 - 1e-6..=0.11 + 1e-6).contains(&glow.opacity));
        }
    }

    #[test]
    fn test_one_loud_bin_breaks_silence() {
        let config = VisualConfig::default();
        let mut bins = vec![0; 128];
        bins[100] = 5;
        let glow = glow_for(&SpectrumFrame::from_bins(bins), 50, 1000.0, 0.0, &config);
        assert_eq!(glow.mode, GlowMode::Reactive);
    }

    #[test]
    fn test_reactive_glow_grows_with_bass_and_punch() {
        let config = VisualConfig::default();
        let mut bins = vec![10; 128];
        bins[..32].fill(150);
        let frame = SpectrumFrame::from_bins(bins);

        let soft = glow_for(&frame, 0, 1000.0, 0.0, &config);
        let hard = glow_for(&frame, 100, 1000.0, 0.0, &config);
        assert!(hard.radius > soft.radius);
        assert_relative_eq!(soft.opacity, 0.7, epsilon = 1e-6);

        let average = frame.average() / 255.0;
        assert_relative_eq!(
            soft.radius,
            20.0 + 200.0 + average * 50.0,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_bar_spacing_is_uniform_including_skipped() {
        let mut engine = engine();
        let mut out = DrawList::new();
        let mut bins = vec![200; 128];
        bins[3] = 0;
        bins[4] = 0;

        let report = engine.render_frame(
            &SpectrumFrame::from_bins(bins),
            &params(0, 0, 0),
            true,
            0.0,
            &mut out,
        );
        assert_eq!(report.bars_drawn, 126);
        assert_eq!(report.bars_skipped, 2);

        let bar_width = 1280.0 / 128.0 * 2.5;
        let drawn = rects(&out);
        assert_relative_eq!(drawn[3].0.x, 5.0 * (bar_width + 1.0), epsilon = 1e-3);
        for pair in drawn.windows(2).skip(3) {
            assert_relative_eq!(pair[1].0.x - pair[0].0.x, bar_width + 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_punch_boost_clamps_at_full_height() {
        let mut engine = engine();
        let mut out = DrawList::new();
        engine.render_frame(
            &SpectrumFrame::from_bins(vec![200; 128]),
            &params(100, 0, 0),
            true,
            0.0,
            &mut out,
        );

        let drawn = rects(&out);
        // Focus center: floor(128 * 100 / 200)
        assert_relative_eq!(drawn[64].1.y, 720.0 / 1.2, epsilon = 1e-3);
        assert!(drawn[0].1.y < drawn[64].1.y);
        assert!(drawn.iter().all(|(_, size)| size.y <= 600.0 + 1e-3));
    }

    #[test]
    fn test_punch_boost_decays_with_distance() {
        assert_eq!(punch_boost(100, 64, 128, 100, 0), 255.0);
        assert!(punch_boost(100, 70, 128, 100, 0) > punch_boost(100, 80, 128, 100, 0));
        assert_eq!(punch_boost(100, 127, 128, 100, 0), 100.0);
        assert_eq!(punch_boost(0, 64, 128, 100, 0), 0.0);
    }

    #[test]
    fn test_shape_regimes_at_boundaries() {
        assert_eq!(BarShape::for_vibe(29), BarShape::Rect);
        assert_eq!(BarShape::for_vibe(30), BarShape::Polygon);
        assert_eq!(BarShape::for_vibe(69), BarShape::Polygon);
        assert_eq!(BarShape::for_vibe(70), BarShape::Spike);

        let frame = SpectrumFrame::from_bins(vec![180; 128]);
        let mut out = DrawList::new();

        let mut engine = engine();
        engine.render_frame(&frame, &params(0, 29, 0), true, 0.0, &mut out);
        assert_eq!(count(&out, |c| matches!(c, DrawCommand::Rect { .. })), 128);

        let mut engine = RenderEngine::with_seed(W, H, 1);
        engine.render_frame(&frame, &params(0, 30, 0), true, 0.0, &mut out);
        assert_eq!(count(&out, |c| matches!(c, DrawCommand::Polygon { .. })), 128);
        assert_eq!(count(&out, |c| matches!(c, DrawCommand::Rect { .. })), 0);

        let mut engine = RenderEngine::with_seed(W, H, 2);
        let report = engine.render_frame(&frame, &params(0, 70, 0), true, 0.0, &mut out);
        assert_eq!(report.bar_shape, Some(BarShape::Spike));
        let lines = count(&out, |c| matches!(c, DrawCommand::Line { .. }));
        assert_eq!(lines, report.links + 128);
    }

    #[test]
    fn test_sparks_use_secondary_color() {
        let mut engine = engine();
        let mut out = DrawList::new();
        let palette = Palette::for_mood(Mood::Warm);
        let p = params(0, 100, 50);

        let mut sparks = 0;
        for step in 0..20 {
            let report = engine.render_frame(
                &SpectrumFrame::from_bins(vec![255; 128]),
                &p,
                true,
                step as f64,
                &mut out,
            );
            sparks += report.sparks;
            let secondary = count(&out, |c| {
                matches!(c, DrawCommand::Circle { color, .. } if *color == palette.secondary)
            });
            assert_eq!(secondary, report.sparks);
        }
        assert!(sparks > 0);
    }

    #[test]
    fn test_short_bars_never_spark() {
        let mut engine = engine();
        let mut out = DrawList::new();
        let palette = Palette::for_mood(Mood::Warm);
        let p = params(0, 100, 50);
        // Boosted at most to 30, i.e. 70.6 px on a 720 px canvas
        let frame = SpectrumFrame::from_bins(vec![15; 128]);

        for step in 0..200 {
            let report = engine.render_frame(&frame, &p, true, step as f64 * 0.016, &mut out);
            assert_eq!(report.bar_shape, Some(BarShape::Spike));
            assert_eq!(report.bars_drawn, 128);
            assert_eq!(report.sparks, 0, "spark at step {}", step);
            let secondary = count(&out, |c| {
                matches!(c, DrawCommand::Circle { color, .. } if *color == palette.secondary)
            });
            assert_eq!(secondary, 0);
        }
    }

    #[test]
    fn test_low_vibe_has_no_particles_or_links() {
        let mut engine = engine();
        let mut out = DrawList::new();
        let frame = SpectrumFrame::from_bins(vec![90; 128]);

        engine.render_frame(&frame, &params(50, 100, 0), true, 0.0, &mut out);
        let report = engine.render_frame(&frame, &params(50, 10, 0), true, 0.0, &mut out);
        assert!(report.regenerated);
        assert_eq!(report.particles, 0);
        assert_eq!(report.links, 0);
        assert_eq!(count(&out, |c| matches!(c, DrawCommand::Circle { .. })), 0);
    }

    #[test]
    fn test_links_need_vibe_above_thirty() {
        let mut engine = engine();
        let mut out = DrawList::new();
        let frame = SpectrumFrame::from_bins(vec![90; 128]);

        let report = engine.render_frame(&frame, &params(50, 30, 0), true, 0.0, &mut out);
        assert_eq!(report.links, 0);
        assert_eq!(report.particles, 50);
    }

    #[test]
    fn test_particle_pulse_follows_volume() {
        let mut quiet_engine = engine();
        let mut loud_engine = engine();
        let mut quiet = DrawList::new();
        let mut loud = DrawList::new();
        let p = params(100, 20, 0);

        quiet_engine.render_frame(&SpectrumFrame::from_bins(vec![5; 128]), &p, true, 0.0, &mut quiet);
        loud_engine.render_frame(&SpectrumFrame::from_bins(vec![255; 128]), &p, true, 0.0, &mut loud);

        let radii = |list: &DrawList| -> Vec<f32> {
            list.iter()
                .filter_map(|c| match c {
                    DrawCommand::Circle { radius, .. } => Some(*radius),
                    _ => None,
                })
                .collect()
        };
        for (q, l) in radii(&quiet).iter().zip(radii(&loud).iter()) {
            // Full volume at full punch doubles the radius
            assert_relative_eq!(*l, q / (1.0 + 5.0 / 255.0) * 2.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_same_seed_same_output() {
        let frame = SpectrumFrame::from_bins((0..128).map(|i| (i * 2) as u8).collect());
        let p = params(70, 85, -40);

        let mut a = RenderEngine::with_seed(W, H, 9);
        let mut b = RenderEngine::with_seed(W, H, 9);
        let mut out_a = DrawList::new();
        let mut out_b = DrawList::new();
        for step in 0..3 {
            let t = step as f64 * 0.016;
            let ra = a.render_frame(&frame, &p, true, t, &mut out_a);
            let rb = b.render_frame(&frame, &p, true, t, &mut out_b);
            assert_eq!(ra, rb);
            assert_eq!(out_a.commands(), out_b.commands());
        }
    }

    #[test]
    fn test_resize_while_active_relayouts() {
        let mut engine = engine();
        let mut out = DrawList::new();
        engine.render_frame(&SpectrumFrame::silent(), &params(50, 60, 0), true, 0.0, &mut out);

        engine.resize(200, 100);
        assert_eq!(engine.size(), Vec2::new(200.0, 100.0));
        assert_eq!(engine.field().bounds(), engine.size());
        assert_eq!(engine.field().len(), 100);
        for particle in engine.field().particles() {
            assert!((0.0..=200.0).contains(&particle.position.x));
            assert!((0.0..=100.0).contains(&particle.position.y));
        }
    }
}
