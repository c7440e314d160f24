//! Style value types shared by theme resolution, span compositing, and row
//! rendering.

use crate::ThemeError;
use bitflags::bitflags;

bitflags! {
    /// Font-style attributes. All four bits are orthogonal and independently
    /// combinable; the bit values follow the TextMate font-style byte so
    /// themes using that convention resolve identically.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontStyle: u8 {
        const ITALIC        = 0b0000_0001;
        const BOLD          = 0b0000_0010;
        const UNDERLINE     = 0b0000_0100;
        const STRIKETHROUGH = 0b0000_1000;
    }
}

/// RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(literal: &str) -> Result<Self, ThemeError> {
        let hex = literal.strip_prefix('#').unwrap_or(literal);
        let invalid = || ThemeError::InvalidColor(literal.to_string());
        if hex.len() != 6 && hex.len() != 8 {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: if hex.len() == 8 { byte(6)? } else { 0xFF },
        })
    }
}

/// A partial style: unset fields fall through to the next source in the
/// compositing order (lower-ranked theme rule, lower-priority span, base).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StylePatch {
    pub font_style: Option<FontStyle>,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
}

impl StylePatch {
    pub fn is_empty(&self) -> bool {
        self.font_style.is_none() && self.foreground.is_none() && self.background.is_none()
    }

    pub fn with_font_style(mut self, style: FontStyle) -> Self {
        self.font_style = Some(style);
        self
    }

    pub fn with_foreground(mut self, color: Color) -> Self {
        self.foreground = Some(color);
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Fill this patch's unset fields from `fallback`. Set fields win.
    pub fn or(self, fallback: StylePatch) -> StylePatch {
        StylePatch {
            font_style: self.font_style.or(fallback.font_style),
            foreground: self.foreground.or(fallback.foreground),
            background: self.background.or(fallback.background),
        }
    }
}

/// Fully composited per-run style. Derived, never persisted: recomputed
/// whenever spans or visible text change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedStyle {
    pub font_style: FontStyle,
    pub foreground: Color,
    /// `None` means the surface's own background shows through (no fill).
    pub background: Option<Color>,
}

impl ResolvedStyle {
    pub fn plain(foreground: Color) -> Self {
        Self {
            font_style: FontStyle::empty(),
            foreground,
            background: None,
        }
    }

    pub fn bold(&self) -> bool {
        self.font_style.contains(FontStyle::BOLD)
    }

    pub fn italic(&self) -> bool {
        self.font_style.contains(FontStyle::ITALIC)
    }

    /// Drawn as a separate line primitive, not via glyph selection.
    pub fn underline(&self) -> bool {
        self.font_style.contains(FontStyle::UNDERLINE)
    }

    pub fn strikethrough(&self) -> bool {
        self.font_style.contains(FontStyle::STRIKETHROUGH)
    }

    /// Overlay `patch` onto this style; the patch's set fields win.
    pub fn patched(&self, patch: StylePatch) -> ResolvedStyle {
        ResolvedStyle {
            font_style: patch.font_style.unwrap_or(self.font_style),
            foreground: patch.foreground.unwrap_or(self.foreground),
            background: patch.background.or(self.background),
        }
    }
}
