//! SVG drawing surface.
//!
//! Implements the renderer's canvas capability set by accumulating SVG
//! elements in call order, which makes the fixed paint order (background
//! fills, then text, then decoration lines) directly visible in the output
//! document.

use core_render::{Canvas, Point, Rect};
use core_theme::{Color, FontStyle};
use std::fmt::Write;

pub struct SvgCanvas {
    width: f32,
    height: f32,
    font_px: f32,
    body: String,
}

fn css(color: Color) -> String {
    if color.a == 0xFF {
        format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
    } else {
        format!(
            "rgba({},{},{},{:.3})",
            color.r,
            color.g,
            color.b,
            f32::from(color.a) / 255.0
        )
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

impl SvgCanvas {
    pub fn new(width: f32, height: f32, font_px: f32, surface: Color) -> Self {
        let mut canvas = Self {
            width,
            height,
            font_px,
            body: String::new(),
        };
        canvas.fill_rect(Rect::new(0.0, 0.0, width, height), surface);
        canvas
    }

    pub fn finish(self) -> String {
        format!(
            concat!(
                "<svg xmlns=\"http://www.w3.org/2000/svg\" ",
                "width=\"{w:.1}\" height=\"{h:.1}\" ",
                "font-family=\"monospace\" font-size=\"{fs:.1}\">\n{body}</svg>\n"
            ),
            w = self.width,
            h = self.height,
            fs = self.font_px,
            body = self.body,
        )
    }
}

impl Canvas for SvgCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let _ = writeln!(
            self.body,
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"/>",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            css(color)
        );
    }

    fn draw_text(&mut self, text: &str, baseline: Point, style: FontStyle, color: Color) {
        let weight = if style.contains(FontStyle::BOLD) {
            " font-weight=\"bold\""
        } else {
            ""
        };
        let slant = if style.contains(FontStyle::ITALIC) {
            " font-style=\"italic\""
        } else {
            ""
        };
        let _ = writeln!(
            self.body,
            "  <text x=\"{:.1}\" y=\"{:.1}\" xml:space=\"preserve\" fill=\"{}\"{}{}>{}</text>",
            baseline.x,
            baseline.y,
            css(color),
            weight,
            slant,
            escape(text)
        );
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        let _ = writeln!(
            self.body,
            "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"{:.2}\"/>",
            from.x,
            from.y,
            to.x,
            to.y,
            css(color),
            width
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elements_appear_in_call_order() {
        let mut canvas = SvgCanvas::new(100.0, 20.0, 12.0, Color::WHITE);
        canvas.fill_rect(Rect::new(0.0, 0.0, 10.0, 20.0), Color::rgb(255, 224, 0));
        canvas.draw_text("a<b", Point::new(0.0, 14.0), FontStyle::BOLD, Color::BLACK);
        canvas.draw_line(
            Point::new(0.0, 19.0),
            Point::new(10.0, 19.0),
            Color::BLACK,
            1.5,
        );
        let out = canvas.finish();
        let rect_at = out.find("<rect x=\"0.0\" y=\"0.0\" width=\"10.0\"").unwrap();
        let text_at = out.find("<text").unwrap();
        let line_at = out.find("<line").unwrap();
        assert!(rect_at < text_at && text_at < line_at);
        assert!(out.contains("a&lt;b"));
        assert!(out.contains("font-weight=\"bold\""));
    }
}
