//! Row layout and paint-instruction emission.
//!
//! Consumes a visible line's text plus its resolved style partition and
//! produces a [`Row`] of styled, measured runs, then emits drawing
//! instructions against the [`Canvas`] capability set in a fixed paint
//! order: background fills, then text, then underline/strikethrough line
//! primitives. Rasterization itself is the caller's collaborator.
//!
//! No line wrapping: one document line maps to exactly one row; a long line
//! simply measures wider than the viewport (horizontal scroll is the
//! caller's concern).

mod canvas;
mod metrics;
mod row;

pub use canvas::{Canvas, Point, Rect};
pub use metrics::{CellMetrics, FontMetrics, FontMetricsProvider};
pub use row::{Row, StyledRun, layout_row, paint_row};

use core_theme::{Color, FontStyle, ResolvedStyle, Theme};
use std::sync::Arc;

/// Explicit rendering state: the active theme, the typeface metrics seam,
/// and the plain fallback colors. Constructed once at document-open time
/// and passed to every resolver/renderer call; there is no ambient global
/// theme or typeface.
#[derive(Clone)]
pub struct RenderingContext {
    pub theme: Theme,
    pub fonts: Arc<dyn FontMetricsProvider>,
    /// Fallback foreground for text no theme rule styles.
    pub foreground: Color,
    /// Surface clear color; per-run backgrounds composite over it.
    pub background: Color,
}

impl RenderingContext {
    /// Build a context taking plain-text colors from the theme's defaults
    /// (black on white when the theme leaves them unset).
    pub fn new(theme: Theme, fonts: Arc<dyn FontMetricsProvider>) -> Self {
        let foreground = theme.defaults.foreground.unwrap_or(Color::BLACK);
        let background = theme.defaults.background.unwrap_or(Color::WHITE);
        Self::with_defaults(theme, fonts, foreground, background)
    }

    pub fn with_defaults(
        theme: Theme,
        fonts: Arc<dyn FontMetricsProvider>,
        foreground: Color,
        background: Color,
    ) -> Self {
        Self {
            theme,
            fonts,
            foreground,
            background,
        }
    }

    /// The style of text nothing matched: context foreground, no fill,
    /// theme-default font style (bitmask 0 unless the theme says otherwise).
    pub fn base_style(&self) -> ResolvedStyle {
        ResolvedStyle {
            font_style: self.theme.defaults.font_style.unwrap_or(FontStyle::empty()),
            foreground: self.foreground,
            background: None,
        }
    }

    /// Swap the active theme (e.g. after a background theme load lands).
    pub fn set_theme(&mut self, theme: Theme) {
        self.foreground = theme.defaults.foreground.unwrap_or(self.foreground);
        self.background = theme.defaults.background.unwrap_or(self.background);
        self.theme = theme;
    }
}

impl std::fmt::Debug for RenderingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderingContext")
            .field("theme", &self.theme.name)
            .field("foreground", &self.foreground)
            .field("background", &self.background)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_theme::StylePatch;

    #[test]
    fn context_takes_defaults_from_theme() {
        let theme = Theme {
            name: "t".into(),
            defaults: StylePatch::default()
                .with_foreground(Color::rgb(1, 2, 3))
                .with_background(Color::rgb(4, 5, 6)),
            rules: vec![],
        };
        let ctx = RenderingContext::new(theme, Arc::new(CellMetrics::default()));
        assert_eq!(ctx.foreground, Color::rgb(1, 2, 3));
        assert_eq!(ctx.background, Color::rgb(4, 5, 6));
        assert_eq!(ctx.base_style().foreground, Color::rgb(1, 2, 3));
        assert_eq!(ctx.base_style().background, None);
    }

    #[test]
    fn set_theme_refreshes_defaults() {
        let mut ctx = RenderingContext::new(Theme::default(), Arc::new(CellMetrics::default()));
        let dark = Theme {
            name: "dark".into(),
            defaults: StylePatch::default()
                .with_foreground(Color::WHITE)
                .with_background(Color::BLACK),
            rules: vec![],
        };
        ctx.set_theme(dark);
        assert_eq!(ctx.foreground, Color::WHITE);
        assert_eq!(ctx.background, Color::BLACK);
    }
}
