//! Styled-run layout and paint-order emission for one visible line.

use crate::{Canvas, Point, Rect, RenderingContext};
use core_text::grapheme;
use core_theme::ResolvedStyle;
use std::ops::Range;

/// A maximal substring of a row sharing one resolved style, positioned and
/// measured in the row's coordinate space.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    pub text: String,
    pub style: ResolvedStyle,
    /// Horizontal offset from the row origin.
    pub x: f32,
    pub width: f32,
}

/// Rendered output for one visible line: ordered styled runs plus layout
/// metrics. Derived per draw; never cached across edits.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub line: usize,
    pub runs: Vec<StyledRun>,
    pub ascent: f32,
    pub descent: f32,
    pub width: f32,
}

impl Row {
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Lay out one line from its resolved style partition (line-local byte
/// ranges tiling `[0, text.len())`). Run extents come from the metrics
/// provider; clusters the variant cannot measure fall back to the
/// replacement glyph's advance, never to a hard failure. The row's
/// ascent/descent are the maxima across its runs' effective typeface
/// variants (an empty line takes the base variant's metrics).
pub fn layout_row(
    line: usize,
    text: &str,
    resolved: &[(Range<usize>, ResolvedStyle)],
    ctx: &RenderingContext,
) -> Row {
    let base_metrics = ctx.fonts.metrics(ctx.base_style().font_style);
    let mut runs = Vec::with_capacity(resolved.len());
    let mut x = 0.0f32;
    let mut ascent = if resolved.is_empty() { base_metrics.ascent } else { 0.0 };
    let mut descent = if resolved.is_empty() { base_metrics.descent } else { 0.0 };

    for (range, style) in resolved {
        let Some(segment) = text.get(range.clone()) else {
            // Misaligned partitions indicate a caller bookkeeping bug; skip
            // the run rather than tearing the whole row.
            tracing::warn!(
                target: "render",
                line,
                start = range.start,
                end = range.end,
                "resolved_run_outside_line"
            );
            continue;
        };
        let mut width = 0.0f32;
        for cluster in grapheme::iter(segment) {
            width += ctx
                .fonts
                .advance(cluster, style.font_style)
                .unwrap_or_else(|| ctx.fonts.replacement_advance(style.font_style));
        }
        let metrics = ctx.fonts.metrics(style.font_style);
        ascent = ascent.max(metrics.ascent);
        descent = descent.max(metrics.descent);
        runs.push(StyledRun {
            text: segment.to_string(),
            style: *style,
            x,
            width,
        });
        x += width;
    }

    Row {
        line,
        runs,
        ascent,
        descent,
        width: x,
    }
}

/// Emit one row's drawing instructions in the fixed paint order:
/// background fills first, then text runs, then underline/strikethrough
/// line primitives. `origin` is the row's top-left corner.
pub fn paint_row(row: &Row, origin: Point, canvas: &mut impl Canvas) {
    let height = row.height();
    let baseline = origin.y + row.ascent;
    let bottom = origin.y + height;
    // Decoration strokes scale with the row box, not the font unit.
    let stroke = height / 12.0;

    for run in &row.runs {
        if let Some(background) = run.style.background {
            canvas.fill_rect(
                Rect::new(origin.x + run.x, origin.y, run.width, height),
                background,
            );
        }
    }
    for run in &row.runs {
        canvas.draw_text(
            &run.text,
            Point::new(origin.x + run.x, baseline),
            run.style.font_style,
            run.style.foreground,
        );
    }
    for run in &row.runs {
        let (start_x, end_x) = (origin.x + run.x, origin.x + run.x + run.width);
        if run.style.underline() {
            canvas.draw_line(
                Point::new(start_x, bottom),
                Point::new(end_x, bottom),
                run.style.foreground,
                stroke,
            );
        }
        if run.style.strikethrough() {
            let mid = origin.y + height / 2.0;
            canvas.draw_line(
                Point::new(start_x, mid),
                Point::new(end_x, mid),
                run.style.foreground,
                stroke,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellMetrics, FontMetrics, FontMetricsProvider};
    use core_theme::{Color, FontStyle, Theme};
    use std::sync::Arc;

    fn ctx() -> RenderingContext {
        RenderingContext::new(Theme::default(), Arc::new(CellMetrics::default()))
    }

    fn style(font_style: FontStyle) -> ResolvedStyle {
        ResolvedStyle {
            font_style,
            foreground: Color::BLACK,
            background: None,
        }
    }

    #[test]
    fn runs_are_positioned_and_measured() {
        let c = ctx();
        let text = "int main";
        let resolved = vec![
            (0..3, style(FontStyle::BOLD)),
            (3..8, style(FontStyle::empty())),
        ];
        let row = layout_row(0, text, &resolved, &c);
        assert_eq!(row.runs.len(), 2);
        assert_eq!(row.runs[0].text, "int");
        assert_eq!(row.runs[0].x, 0.0);
        assert_eq!(row.runs[0].width, 3.0);
        assert_eq!(row.runs[1].x, 3.0);
        assert_eq!(row.runs[1].width, 5.0);
        assert_eq!(row.width, 8.0);
    }

    #[test]
    fn wide_clusters_widen_runs() {
        let c = ctx();
        let row = layout_row(0, "a界b", &[(0..5, style(FontStyle::empty()))], &c);
        assert_eq!(row.width, 4.0);
    }

    #[test]
    fn empty_line_has_no_runs_and_base_metrics() {
        let c = ctx();
        let row = layout_row(3, "", &[], &c);
        assert!(row.runs.is_empty());
        assert_eq!(row.width, 0.0);
        assert_eq!(row.height(), 1.0);
    }

    #[test]
    fn long_line_measures_past_any_viewport() {
        let c = ctx();
        let text = "x".repeat(500);
        let row = layout_row(0, &text, &[(0..500, style(FontStyle::empty()))], &c);
        assert_eq!(row.runs.len(), 1);
        assert_eq!(row.width, 500.0);
    }

    /// Provider with a taller bold variant and no coverage for '§'.
    struct Patchy;

    impl FontMetricsProvider for Patchy {
        fn metrics(&self, style: FontStyle) -> FontMetrics {
            if style.contains(FontStyle::BOLD) {
                FontMetrics { ascent: 12.0, descent: 4.0 }
            } else {
                FontMetrics { ascent: 10.0, descent: 3.0 }
            }
        }
        fn advance(&self, cluster: &str, _style: FontStyle) -> Option<f32> {
            (cluster != "§").then_some(7.0)
        }
        fn replacement_advance(&self, _style: FontStyle) -> f32 {
            5.0
        }
    }

    #[test]
    fn bold_variant_raises_row_metrics() {
        let c = RenderingContext::new(Theme::default(), Arc::new(Patchy));
        let resolved = vec![
            (0..1, style(FontStyle::empty())),
            (1..2, style(FontStyle::BOLD)),
        ];
        let row = layout_row(0, "ab", &resolved, &c);
        assert_eq!(row.ascent, 12.0);
        assert_eq!(row.descent, 4.0);
    }

    #[test]
    fn missing_coverage_falls_back_to_replacement_glyph() {
        let c = RenderingContext::new(Theme::default(), Arc::new(Patchy));
        let row = layout_row(0, "a§b", &[(0..4, style(FontStyle::empty()))], &c);
        assert_eq!(row.width, 7.0 + 5.0 + 7.0);
    }

    #[derive(Debug, PartialEq)]
    enum Op {
        Rect,
        Text(String),
        Line(f32),
    }

    struct Recorder {
        ops: Vec<Op>,
    }

    impl Canvas for Recorder {
        fn fill_rect(&mut self, _rect: Rect, _color: Color) {
            self.ops.push(Op::Rect);
        }
        fn draw_text(&mut self, text: &str, _baseline: Point, _style: FontStyle, _color: Color) {
            self.ops.push(Op::Text(text.to_string()));
        }
        fn draw_line(&mut self, from: Point, _to: Point, _color: Color, _width: f32) {
            self.ops.push(Op::Line(from.y));
        }
    }

    #[test]
    fn paint_order_is_background_text_decorations() {
        let c = ctx();
        let resolved = vec![
            (
                0..2,
                ResolvedStyle {
                    font_style: FontStyle::UNDERLINE,
                    foreground: Color::BLACK,
                    background: Some(Color::rgb(9, 9, 9)),
                },
            ),
            (2..4, style(FontStyle::empty())),
        ];
        let row = layout_row(0, "abcd", &resolved, &c);
        let mut recorder = Recorder { ops: Vec::new() };
        paint_row(&row, Point::new(0.0, 0.0), &mut recorder);
        assert_eq!(
            recorder.ops,
            vec![
                Op::Rect,
                Op::Text("ab".into()),
                Op::Text("cd".into()),
                Op::Line(1.0),
            ]
        );
    }

    #[test]
    fn strikethrough_sits_at_row_center_underline_at_bottom() {
        let c = ctx();
        let resolved = vec![(
            0..2,
            ResolvedStyle {
                font_style: FontStyle::UNDERLINE | FontStyle::STRIKETHROUGH,
                foreground: Color::BLACK,
                background: None,
            },
        )];
        let row = layout_row(0, "ab", &resolved, &c);
        let mut recorder = Recorder { ops: Vec::new() };
        paint_row(&row, Point::new(0.0, 10.0), &mut recorder);
        assert_eq!(
            recorder.ops,
            vec![Op::Text("ab".into()), Op::Line(11.0), Op::Line(10.5)]
        );
    }
}
