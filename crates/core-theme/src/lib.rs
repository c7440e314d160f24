//! Scope-to-style theme resolution.
//!
//! A theme is an ordered list of rules (definition order ascending
//! general -> specific, per format convention). Resolution ranks every rule
//! matching a token's scope path and composites the winning style
//! **field by field**: each of font-style / foreground / background is taken
//! from the best-ranked rule that sets it. Whole-rule winner-take-all would
//! change highlighting for many real themes, e.g. a rule specifying only a
//! foreground must not reset font-style bits established by a less specific
//! rule.
//!
//! Ranking follows the conventional TextMate scoring family:
//! 1. depth of the scope-path element the selector is anchored at
//!    (deeper = more specific),
//! 2. total matched name components,
//! 3. rule definition order (later-defined rules override earlier ones).

use thiserror::Error;

mod style;

pub use style::{Color, FontStyle, ResolvedStyle, StylePatch};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThemeError {
    #[error("invalid color literal {0:?}")]
    InvalidColor(String),
    #[error("empty scope selector")]
    EmptySelector,
}

/// Number of dot-separated components of `pattern` if it prefix-matches
/// `scope` component-wise (`keyword.control` matches `keyword.control.c`
/// but not `keyword.controls`).
fn component_match(pattern: &str, scope: &str) -> Option<usize> {
    let mut count = 0;
    let mut scope_parts = scope.split('.');
    for part in pattern.split('.') {
        if scope_parts.next() != Some(part) {
            return None;
        }
        count += 1;
    }
    Some(count)
}

/// Match rank of a selector against a scope path. `Ord` is the specificity
/// order: anchor depth first, then matched component count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchScore {
    pub anchor_depth: usize,
    pub components: usize,
}

/// A scope selector: one or more space-separated scope patterns, most
/// general first. The final pattern anchors on an element of the token's
/// scope path; preceding patterns must match ancestor scopes above the
/// anchor in order (intermediate ancestors may be skipped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSelector {
    patterns: Vec<String>,
}

impl ScopeSelector {
    pub fn parse(source: &str) -> Result<Self, ThemeError> {
        let patterns: Vec<String> = source.split_whitespace().map(str::to_string).collect();
        if patterns.is_empty() {
            return Err(ThemeError::EmptySelector);
        }
        Ok(Self { patterns })
    }

    /// Best match of this selector against `path`, trying the deepest anchor
    /// first. `None` if the selector does not match at all.
    pub fn matches(&self, path: &[impl AsRef<str>]) -> Option<MatchScore> {
        let (last, parents) = self.patterns.split_last()?;
        for anchor in (0..path.len()).rev() {
            let Some(anchored) = component_match(last, path[anchor].as_ref()) else {
                continue;
            };
            let mut components = anchored;
            let mut cursor = anchor;
            let mut matched = true;
            for pattern in parents.iter().rev() {
                match (0..cursor)
                    .rev()
                    .find_map(|i| component_match(pattern, path[i].as_ref()).map(|c| (i, c)))
                {
                    Some((i, c)) => {
                        components += c;
                        cursor = i;
                    }
                    None => {
                        matched = false;
                        break;
                    }
                }
            }
            if matched {
                return Some(MatchScore {
                    anchor_depth: anchor,
                    components,
                });
            }
        }
        None
    }
}

/// One theme rule: selectors (comma-separated in source form) plus the
/// partial style they contribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeRule {
    pub selectors: Vec<ScopeSelector>,
    pub patch: StylePatch,
}

impl ThemeRule {
    /// Parse a comma-separated selector list, e.g. `"keyword, storage.type"`.
    pub fn parse(selectors: &str, patch: StylePatch) -> Result<Self, ThemeError> {
        let selectors = selectors
            .split(',')
            .map(ScopeSelector::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selectors, patch })
    }

    fn best_match(&self, path: &[impl AsRef<str>]) -> Option<MatchScore> {
        self.selectors.iter().filter_map(|s| s.matches(path)).max()
    }
}

/// An ordered rule list plus theme-global defaults. Consumed as an already
/// parsed structure; this crate never reads theme source files.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub name: String,
    /// Theme-wide default style (typically editor foreground/background).
    pub defaults: StylePatch,
    pub rules: Vec<ThemeRule>,
}

impl Theme {
    /// Resolve a scope path to a partial style with field-level fallthrough
    /// across all matching rules. Fields no rule sets stay unset and fall to
    /// the caller's rendering-context defaults; `defaults` here is the data
    /// those contexts are built from, it is not folded per token.
    ///
    /// Pure function of (path, theme): deterministic and call-order
    /// independent.
    pub fn resolve(&self, path: &[impl AsRef<str>]) -> StylePatch {
        let mut ranked: Vec<(MatchScore, usize)> = self
            .rules
            .iter()
            .enumerate()
            .filter_map(|(idx, rule)| rule.best_match(path).map(|score| (score, idx)))
            .collect();
        // Descending (score, definition index): later-defined rules win ties.
        ranked.sort_unstable_by(|a, b| b.cmp(a));

        let mut out = StylePatch::default();
        for (_, idx) in &ranked {
            out = out.or(self.rules[*idx].patch);
            if out.font_style.is_some() && out.foreground.is_some() && out.background.is_some() {
                break;
            }
        }
        tracing::trace!(
            target: "theme",
            candidates = ranked.len(),
            path_depth = path.len(),
            "scope_resolved"
        );
        out
    }
}
