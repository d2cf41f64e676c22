//! Immediate-mode draw commands emitted by the render engine.
//!
//! Coordinates are canvas pixels with the origin at the top left.

use glam::Vec2;

use super::palette::Rgba;

/// One canvas operation
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Cover the whole surface with `color`, blended over what is there
    Fill { color: Rgba },

    /// Concentric radial gradient covering the whole surface.
    ///
    /// Stop offsets run from `inner_radius` (0.0) to `outer_radius` (1.0);
    /// inside the inner radius the first stop color applies, outside the
    /// outer radius the last.
    RadialGlow {
        center: Vec2,
        inner_radius: f32,
        outer_radius: f32,
        stops: Vec<(f32, Rgba)>,
    },

    Circle {
        center: Vec2,
        radius: f32,
        color: Rgba,
    },

    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Rgba,
    },

    Rect {
        origin: Vec2,
        size: Vec2,
        color: Rgba,
    },

    /// Closed filled polygon
    Polygon { points: Vec<Vec2>, color: Rgba },
}

/// Commands for one frame, in paint order
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter()
    }
}
