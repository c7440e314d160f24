//! JSON theme-file parsing.
//!
//! The core theme crate only consumes an already parsed rule list; reading
//! theme sources is this binary's job. Format: a name, optional default
//! colors, and an ordered rule array (order is the cascade order).
//!
//! ```json
//! {
//!   "name": "solarized-light",
//!   "defaults": { "foreground": "#657b83", "background": "#fdf6e3" },
//!   "rules": [
//!     { "scope": "keyword.control", "foreground": "#859900", "fontStyle": "bold" }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use core_theme::{Color, FontStyle, StylePatch, Theme, ThemeRule};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawTheme {
    #[serde(default)]
    name: String,
    #[serde(default)]
    defaults: RawStyle,
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize, Default)]
struct RawStyle {
    foreground: Option<String>,
    background: Option<String>,
    #[serde(rename = "fontStyle")]
    font_style: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    scope: String,
    #[serde(flatten)]
    style: RawStyle,
}

fn parse_font_style(source: &str) -> Result<FontStyle> {
    let mut style = FontStyle::empty();
    for word in source.split_whitespace() {
        style |= match word {
            "italic" => FontStyle::ITALIC,
            "bold" => FontStyle::BOLD,
            "underline" => FontStyle::UNDERLINE,
            "strikethrough" => FontStyle::STRIKETHROUGH,
            other => anyhow::bail!("unknown fontStyle token {other:?}"),
        };
    }
    Ok(style)
}

fn patch_from(style: &RawStyle) -> Result<StylePatch> {
    let mut patch = StylePatch::default();
    if let Some(fg) = &style.foreground {
        patch.foreground = Some(Color::from_hex(fg)?);
    }
    if let Some(bg) = &style.background {
        patch.background = Some(Color::from_hex(bg)?);
    }
    if let Some(fs) = &style.font_style {
        patch.font_style = Some(parse_font_style(fs)?);
    }
    Ok(patch)
}

pub fn parse(source: &str) -> Result<Theme> {
    let raw: RawTheme = serde_json::from_str(source).context("theme JSON structure")?;
    let mut rules = Vec::with_capacity(raw.rules.len());
    for rule in &raw.rules {
        let patch = patch_from(&rule.style)
            .with_context(|| format!("rule for scope {:?}", rule.scope))?;
        rules.push(ThemeRule::parse(&rule.scope, patch)?);
    }
    Ok(Theme {
        name: raw.name,
        defaults: patch_from(&raw.defaults).context("theme defaults")?,
        rules,
    })
}

pub fn load(path: &Path) -> Result<Theme> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading theme file {}", path.display()))?;
    parse(&source).with_context(|| format!("parsing theme file {}", path.display()))
}

/// Built-in fallback theme (solarized-light palette), used when no theme
/// file is configured or the configured one fails to load.
pub fn default_theme() -> Theme {
    let rule = |scope: &str, patch: StylePatch| {
        ThemeRule::parse(scope, patch).expect("built-in selectors are valid")
    };
    let fg = |color: Color| StylePatch::default().with_foreground(color);
    Theme {
        name: "solarized-light".into(),
        defaults: StylePatch {
            foreground: Some(Color::rgb(0x65, 0x7b, 0x83)),
            background: Some(Color::rgb(0xfd, 0xf6, 0xe3)),
            font_style: None,
        },
        rules: vec![
            rule(
                "comment",
                fg(Color::rgb(0x93, 0xa1, 0xa1)).with_font_style(FontStyle::ITALIC),
            ),
            rule("string", fg(Color::rgb(0x2a, 0xa1, 0x98))),
            rule("constant.numeric", fg(Color::rgb(0xd3, 0x36, 0x82))),
            rule(
                "keyword",
                fg(Color::rgb(0x85, 0x99, 0x00)).with_font_style(FontStyle::BOLD),
            ),
            rule(
                "storage.type",
                fg(Color::rgb(0xb5, 0x89, 0x00)).with_font_style(FontStyle::BOLD),
            ),
            rule(
                "invalid",
                fg(Color::rgb(0xdc, 0x32, 0x2f)).with_font_style(FontStyle::UNDERLINE),
            ),
        ],
    }
}
