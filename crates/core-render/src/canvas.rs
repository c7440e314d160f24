//! Canvas capability set consumed by row painting.
//!
//! The core emits drawing instructions; the host supplies the surface.

use core_theme::{Color, FontStyle};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Minimal drawing surface. Implementations rasterize however they like
/// (GPU canvas, SVG writer, test recorder); the paint order they receive is
/// fixed by [`crate::paint_row`].
pub trait Canvas {
    fn fill_rect(&mut self, rect: Rect, color: Color);
    /// `baseline` is the text baseline, not the glyph top.
    fn draw_text(&mut self, text: &str, baseline: Point, style: FontStyle, color: Color);
    fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f32);
}
