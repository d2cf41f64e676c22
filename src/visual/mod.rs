//! Visual mapping: spectrum and controls to canvas draw commands.

pub mod draw;
pub mod engine;
pub mod palette;
pub mod particles;

pub use draw::{DrawCommand, DrawList};
pub use engine::{glow_for, punch_boost, BarShape, FrameMode, FrameReport, Glow, GlowMode, RenderEngine};
pub use palette::{Palette, Rgba, BACKGROUND};
pub use particles::{population_for, Particle, ParticleField};
