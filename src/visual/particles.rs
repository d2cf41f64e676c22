//! Particle field: drifting dots that wrap at the canvas edges.
//!
//! The field is rebuilt as a whole whenever the applied (vibe, mood) pair or
//! the canvas size changes. Particles never die on their own.

use glam::Vec2;
use rand::Rng;

use super::palette::{Palette, Rgba};
use crate::params::Mood;

/// Particle count for a vibe value (0 at or below 10)
pub fn population_for(vibe: u8) -> usize {
    match vibe {
        0..=10 => 0,
        11..=40 => 50,
        41..=70 => 100,
        _ => 150,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub color: Rgba,
}

impl Particle {
    fn spawn<R: Rng + ?Sized>(rng: &mut R, bounds: Vec2, vibe: u8, color: Rgba) -> Self {
        let speed = 1.0 + vibe as f32 / 50.0;
        Self {
            position: Vec2::new(rng.gen::<f32>() * bounds.x, rng.gen::<f32>() * bounds.y),
            velocity: Vec2::new(
                (rng.gen::<f32>() - 0.5) * speed,
                (rng.gen::<f32>() - 0.5) * speed,
            ),
            radius: rng.gen::<f32>() * 2.0 + 1.0,
            color,
        }
    }

    /// Move one step and wrap toroidally, allowing a radius of overhang
    fn advance(&mut self, scale: f32, bounds: Vec2) {
        self.position += self.velocity * scale;
        let r = self.radius;

        if self.position.x > bounds.x + r {
            self.position.x = -r;
        } else if self.position.x < -r {
            self.position.x = bounds.x + r;
        }
        if self.position.y > bounds.y + r {
            self.position.y = -r;
        } else if self.position.y < -r {
            self.position.y = bounds.y + r;
        }
    }
}

/// The particle set owned by the render engine
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    bounds: Vec2,
    /// (vibe, mood) the current set was built for
    applied: Option<(u8, Mood)>,
}

impl ParticleField {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            particles: Vec::new(),
            bounds: Vec2::new(width, height),
            applied: None,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    /// Rebuild if `vibe` or `mood` differs from what the set was built for.
    ///
    /// Returns true when the set was rebuilt.
    pub fn sync<R: Rng + ?Sized>(&mut self, vibe: u8, mood: Mood, rng: &mut R) -> bool {
        if self.applied == Some((vibe, mood)) {
            return false;
        }
        self.regenerate(vibe, mood, rng);
        true
    }

    /// Replace every particle with a fresh set for `vibe` and `mood`
    pub fn regenerate<R: Rng + ?Sized>(&mut self, vibe: u8, mood: Mood, rng: &mut R) {
        let count = population_for(vibe);
        let color = Palette::for_mood(mood).particle;
        let bounds = self.bounds;

        self.particles.clear();
        self.particles
            .extend((0..count).map(|_| Particle::spawn(rng, bounds, vibe, color)));
        self.applied = Some((vibe, mood));
        tracing::debug!(count, vibe, ?mood, "particles regenerated");
    }

    /// New canvas size: lay out the current population again inside it
    pub fn resize<R: Rng + ?Sized>(&mut self, width: f32, height: f32, rng: &mut R) {
        self.bounds = Vec2::new(width, height);
        if let Some((vibe, mood)) = self.applied {
            self.regenerate(vibe, mood, rng);
        }
    }

    /// Drop every particle and forget the applied parameters (standby)
    pub fn clear(&mut self) {
        self.particles.clear();
        self.applied = None;
    }

    /// Move every particle by its velocity scaled by `1 + vibe / 100`
    pub fn advance(&mut self, vibe: u8) {
        let scale = 1.0 + vibe as f32 / 100.0;
        let bounds = self.bounds;
        for particle in &mut self.particles {
            particle.advance(scale, bounds);
        }
    }

    /// Unordered particle pairs closer than `max_distance`
    pub fn links(&self, max_distance: f32) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let max_sq = max_distance * max_distance;
        self.particles.iter().enumerate().flat_map(move |(i, a)| {
            self.particles[i + 1..]
                .iter()
                .filter(move |b| a.position.distance_squared(b.position) < max_sq)
                .map(move |b| (a.position, b.position))
        })
    }
}
