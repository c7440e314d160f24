//! Typeface metrics seam.
//!
//! Row layout measures through this trait so hosts can plug real font
//! shaping in; the default [`CellMetrics`] measures in terminal-cell units
//! via the grapheme width engine. Bold/italic variants may legitimately
//! report different metrics, which is why ascent/descent are queried per
//! font style.

use core_text::cluster_width;
use core_theme::FontStyle;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
}

impl FontMetrics {
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

pub trait FontMetricsProvider: Send + Sync {
    /// Vertical metrics of the typeface variant selected by `style`.
    fn metrics(&self, style: FontStyle) -> FontMetrics;

    /// Advance width of one grapheme cluster, or `None` when the variant
    /// has no coverage for it.
    fn advance(&self, cluster: &str, style: FontStyle) -> Option<f32>;

    /// Advance of the replacement glyph, used whenever `advance` reports a
    /// coverage gap. Layout never hard-fails on unmeasurable text.
    fn replacement_advance(&self, style: FontStyle) -> f32;
}

/// Cell-grid metrics: every cluster advances by its terminal cell count
/// times the cell width. Style variants share one set of metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub cell: f32,
    pub ascent: f32,
    pub descent: f32,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            cell: 1.0,
            ascent: 0.8,
            descent: 0.2,
        }
    }
}

impl CellMetrics {
    /// Scale the unit grid to a concrete size, e.g. pixels for an SVG
    /// surface.
    pub fn scaled(cell: f32) -> Self {
        Self {
            cell,
            ascent: cell * 1.6,
            descent: cell * 0.4,
        }
    }
}

impl FontMetricsProvider for CellMetrics {
    fn metrics(&self, _style: FontStyle) -> FontMetrics {
        FontMetrics {
            ascent: self.ascent,
            descent: self.descent,
        }
    }

    fn advance(&self, cluster: &str, _style: FontStyle) -> Option<f32> {
        Some(f32::from(cluster_width(cluster)) * self.cell)
    }

    fn replacement_advance(&self, _style: FontStyle) -> f32 {
        self.cell
    }
}
