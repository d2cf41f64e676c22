//! CPU rasterizer: executes a `DrawList` onto a persistent tiny-skia pixmap.
//!
//! The pixmap is painted opaque on creation and every command blends
//! source-over, so it stays opaque and its premultiplied bytes can be
//! uploaded as plain RGBA.

use tiny_skia::{
    Color, FillRule, GradientStop, LineCap, Paint, PathBuilder, Pixmap, Point, RadialGradient,
    Rect, Shader, SpreadMode, Stroke, Transform,
};

use super::RenderError;
use crate::visual::{DrawCommand, DrawList, Rgba, BACKGROUND};

/// Persistent canvas
pub struct SkiaSurface {
    pixmap: Pixmap,
}

impl SkiaSurface {
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RenderError::EmptySurface { width, height })?;
        pixmap.fill(to_color(BACKGROUND));
        Ok(Self { pixmap })
    }

    /// Replace the pixmap with a fresh background-filled one
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        *self = Self::new(width, height)?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// RGBA8 rows, top to bottom
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let p = self.pixmap.pixel(x, y)?.demultiply();
        Some([p.red(), p.green(), p.blue(), p.alpha()])
    }

    pub fn execute(&mut self, list: &DrawList) {
        for command in list.iter() {
            self.draw(command);
        }
    }

    fn full_rect(&self) -> Option<Rect> {
        Rect::from_xywh(0.0, 0.0, self.width() as f32, self.height() as f32)
    }

    fn draw(&mut self, command: &DrawCommand) {
        match command {
            DrawCommand::Fill { color } => {
                let Some(rect) = self.full_rect() else {
                    return;
                };
                let paint = solid(*color);
                self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            }
            DrawCommand::RadialGlow {
                center,
                inner_radius,
                outer_radius,
                stops,
            } => {
                let Some(shader) = glow_shader(center.x, center.y, *inner_radius, *outer_radius, stops)
                else {
                    return;
                };
                let Some(rect) = self.full_rect() else {
                    return;
                };
                let paint = Paint {
                    shader,
                    anti_alias: true,
                    ..Paint::default()
                };
                self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            }
            DrawCommand::Circle {
                center,
                radius,
                color,
            } => {
                let Some(path) = PathBuilder::from_circle(center.x, center.y, *radius) else {
                    return;
                };
                self.pixmap.fill_path(
                    &path,
                    &solid(*color),
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
            DrawCommand::Line {
                from,
                to,
                width,
                color,
            } => {
                let mut pb = PathBuilder::new();
                pb.move_to(from.x, from.y);
                pb.line_to(to.x, to.y);
                let Some(path) = pb.finish() else {
                    return;
                };
                let stroke = Stroke {
                    width: *width,
                    line_cap: LineCap::Butt,
                    ..Stroke::default()
                };
                self.pixmap
                    .stroke_path(&path, &solid(*color), &stroke, Transform::identity(), None);
            }
            DrawCommand::Rect {
                origin,
                size,
                color,
            } => {
                let Some(rect) = Rect::from_xywh(origin.x, origin.y, size.x, size.y) else {
                    return;
                };
                self.pixmap
                    .fill_rect(rect, &solid(*color), Transform::identity(), None);
            }
            DrawCommand::Polygon { points, color } => {
                let Some((first, rest)) = points.split_first() else {
                    return;
                };
                let mut pb = PathBuilder::new();
                pb.move_to(first.x, first.y);
                for point in rest {
                    pb.line_to(point.x, point.y);
                }
                pb.close();
                let Some(path) = pb.finish() else {
                    return;
                };
                self.pixmap.fill_path(
                    &path,
                    &solid(*color),
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
        }
    }
}

fn to_color(color: Rgba) -> Color {
    Color::from_rgba8(
        color.r,
        color.g,
        color.b,
        (color.a.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

fn solid(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_color(color));
    paint.anti_alias = true;
    paint
}

/// Concentric gradient. tiny-skia radial gradients start at radius zero, so
/// stop offsets are remapped into the `inner..outer` ring; padding extends
/// the first stop inward and the last outward.
fn glow_shader(
    cx: f32,
    cy: f32,
    inner: f32,
    outer: f32,
    stops: &[(f32, Rgba)],
) -> Option<Shader<'static>> {
    if outer <= 0.0 || stops.is_empty() {
        return None;
    }
    let start = (inner / outer).clamp(0.0, 1.0);
    let stops = stops
        .iter()
        .map(|(offset, color)| {
            GradientStop::new(start + offset.clamp(0.0, 1.0) * (1.0 - start), to_color(*color))
        })
        .collect();

    RadialGradient::new(
        Point::from_xy(cx, cy),
        Point::from_xy(cx, cy),
        outer,
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn list(commands: Vec<DrawCommand>) -> DrawList {
        let mut list = DrawList::new();
        for command in commands {
            list.push(command);
        }
        list
    }

    #[test]
    fn test_new_surface_is_opaque_background() {
        let surface = SkiaSurface::new(8, 4).unwrap();
        assert_eq!(surface.pixels().len(), 8 * 4 * 4);
        assert_eq!(surface.pixel(3, 2), Some([13, 2, 33, 255]));
    }

    #[test]
    fn test_zero_size_is_rejected() {
        assert!(matches!(
            SkiaSurface::new(0, 10),
            Err(RenderError::EmptySurface { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_rect_and_trail_blend() {
        let mut surface = SkiaSurface::new(10, 10).unwrap();
        surface.execute(&list(vec![DrawCommand::Rect {
            origin: Vec2::new(0.0, 0.0),
            size: Vec2::new(5.0, 10.0),
            color: Rgba::rgb(255, 255, 255),
        }]));
        assert_eq!(surface.pixel(2, 5), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(8, 5), Some([13, 2, 33, 255]));

        surface.execute(&list(vec![DrawCommand::Fill {
            color: BACKGROUND.with_alpha(0.12),
        }]));
        let [r, _, _, a] = surface.pixel(2, 5).unwrap();
        assert!((220..=232).contains(&r), "red was {}", r);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_glow_is_brightest_at_center() {
        let mut surface = SkiaSurface::new(100, 100).unwrap();
        let color = Rgba::rgb(45, 226, 230);
        surface.execute(&list(vec![DrawCommand::RadialGlow {
            center: Vec2::new(50.0, 50.0),
            inner_radius: 8.0,
            outer_radius: 40.0,
            stops: vec![
                (0.0, color.with_alpha(0.7)),
                (0.7, color.with_alpha(0.2)),
                (1.0, color.with_alpha(0.0)),
            ],
        }]));

        let center = surface.pixel(50, 50).unwrap();
        let ring = surface.pixel(50, 80).unwrap();
        let outside = surface.pixel(50, 95).unwrap();
        assert!(center[1] > ring[1]);
        assert!(ring[1] > outside[1]);
        assert_eq!(outside, [13, 2, 33, 255]);
        // Inside the inner radius the first stop applies unchanged
        let near = surface.pixel(53, 50).unwrap();
        for channel in 0..4 {
            assert!((near[channel] as i32 - center[channel] as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_shapes_touch_their_pixels() {
        let mut surface = SkiaSurface::new(40, 40).unwrap();
        let red = Rgba::rgb(255, 0, 0);
        surface.execute(&list(vec![
            DrawCommand::Circle {
                center: Vec2::new(10.0, 10.0),
                radius: 4.0,
                color: red,
            },
            DrawCommand::Line {
                from: Vec2::new(30.5, 0.0),
                to: Vec2::new(30.5, 40.0),
                width: 3.0,
                color: red,
            },
            DrawCommand::Polygon {
                points: vec![
                    Vec2::new(0.0, 40.0),
                    Vec2::new(0.0, 25.0),
                    Vec2::new(10.0, 20.0),
                    Vec2::new(20.0, 25.0),
                    Vec2::new(20.0, 40.0),
                ],
                color: red,
            },
        ]));

        assert_eq!(surface.pixel(10, 10), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(30, 20), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(10, 35), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(25, 10), Some([13, 2, 33, 255]));
    }

    #[test]
    fn test_degenerate_commands_are_skipped() {
        let mut surface = SkiaSurface::new(10, 10).unwrap();
        surface.execute(&list(vec![
            DrawCommand::Circle {
                center: Vec2::new(5.0, 5.0),
                radius: 0.0,
                color: Rgba::rgb(255, 0, 0),
            },
            DrawCommand::Polygon {
                points: vec![],
                color: Rgba::rgb(255, 0, 0),
            },
            DrawCommand::RadialGlow {
                center: Vec2::new(5.0, 5.0),
                inner_radius: 0.0,
                outer_radius: 0.0,
                stops: vec![(0.0, Rgba::rgb(255, 0, 0))],
            },
        ]));
        assert_eq!(surface.pixel(5, 5), Some([13, 2, 33, 255]));
    }

    #[test]
    fn test_resize_repaints_background() {
        let mut surface = SkiaSurface::new(10, 10).unwrap();
        surface.execute(&list(vec![DrawCommand::Fill {
            color: Rgba::rgb(255, 255, 255),
        }]));
        surface.resize(20, 5).unwrap();
        assert_eq!((surface.width(), surface.height()), (20, 5));
        assert_eq!(surface.pixel(19, 4), Some([13, 2, 33, 255]));
    }
}
