//! Tokenization contract and token plumbing.
//!
//! The grammar-matching engine itself is an external collaborator; this
//! crate defines the contract it must satisfy ([`GrammarTokenizer`]), the
//! structural validation the core relies on (tokens tile their line
//! exactly), the opaque carried state threaded line to line, and the
//! incremental per-line token cache with the edit-invalidation
//! short-circuit.
//!
//! Error isolation: a single line's malformed tokenization degrades that
//! line to one plain token covering it; it never prevents other lines from
//! rendering.

use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

mod cache;
mod registry;

pub use cache::TokenCache;
pub use registry::{GrammarRegistration, GrammarRegistry, LanguageRegistration};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    /// Tokenizer produced a structurally invalid result (gap, overlap,
    /// empty scope path). Isolated per line by the cache.
    #[error("malformed tokenization: {reason}")]
    MalformedInput { reason: String },
    /// No grammar/language registered for the request. Callers degrade to
    /// plain text rather than failing the document.
    #[error("resource unavailable: {resource}")]
    ResourceUnavailable { resource: String },
}

/// A scope-tagged range within one line. Offsets are line-local bytes,
/// half-open `[start, end)`. The scope path is ordered most general first
/// and never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub scopes: Vec<String>,
}

impl Token {
    pub fn new(start: usize, end: usize, scopes: Vec<String>) -> Self {
        Self { start, end, scopes }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Opaque tokenizer state carried from one line into the next. The core
/// never inspects it beyond equality, which drives the incremental
/// short-circuit: an unchanged carried-out state means downstream lines
/// are unaffected.
pub trait CarryOver: Any + Send + Sync + std::fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn eq_state(&self, other: &dyn CarryOver) -> bool;
}

/// Shared handle to a carried tokenizer state ("rule stack").
pub type RuleStack = Arc<dyn CarryOver>;

/// Neutral carried state used for plain (grammar-less or fallback) lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlainCarry;

impl CarryOver for PlainCarry {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_state(&self, other: &dyn CarryOver) -> bool {
        other.as_any().downcast_ref::<PlainCarry>().is_some()
    }
}

/// One line's tokenization output: the tokens plus the state to carry into
/// the next line.
#[derive(Debug, Clone)]
pub struct LineTokens {
    pub tokens: Vec<Token>,
    pub end_state: RuleStack,
}

/// Contract to an external grammar engine. Tokenizing line N requires line
/// N-1's carried-out state (`None` for line 0); implementations must be
/// deterministic: the same line text and carried-in state yield identical
/// tokens and an equal carried-out state.
pub trait GrammarTokenizer: Send + Sync {
    /// Root scope name, e.g. `source.c`; also the fallback scope for lines
    /// that degrade to plain.
    fn scope_name(&self) -> &str;

    fn tokenize_line(
        &self,
        line: &str,
        carry: Option<&RuleStack>,
    ) -> Result<LineTokens, SyntaxError>;
}

/// Trivial engine producing one root-scope token per line. Serves
/// grammar-less documents and tests.
#[derive(Debug, Clone)]
pub struct PlainTokenizer {
    scope: String,
}

impl PlainTokenizer {
    pub fn new(scope: impl Into<String>) -> Self {
        Self { scope: scope.into() }
    }
}

impl GrammarTokenizer for PlainTokenizer {
    fn scope_name(&self) -> &str {
        &self.scope
    }

    fn tokenize_line(
        &self,
        line: &str,
        _carry: Option<&RuleStack>,
    ) -> Result<LineTokens, SyntaxError> {
        Ok(LineTokens {
            tokens: plain_line_tokens(line.len(), &self.scope),
            end_state: Arc::new(PlainCarry),
        })
    }
}

/// The single-token covering fallback for a line: `[0, line_len)` tagged
/// with the grammar's root scope (length 0 for an empty line).
pub fn plain_line_tokens(line_len: usize, scope: &str) -> Vec<Token> {
    vec![Token::new(0, line_len, vec![scope.to_string()])]
}

/// Enforce the structural contract: tokens sorted, contiguous, covering
/// `[0, line_len)` exactly, each with a non-empty scope path. An empty line
/// carries exactly one zero-length token.
pub fn validate_tokens(line_len: usize, tokens: &[Token]) -> Result<(), SyntaxError> {
    let malformed = |reason: String| SyntaxError::MalformedInput { reason };
    if tokens.is_empty() {
        return Err(malformed("no tokens for line".into()));
    }
    let mut cursor = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if token.scopes.is_empty() {
            return Err(malformed(format!("token {i} has an empty scope path")));
        }
        if token.start != cursor {
            return Err(malformed(format!(
                "token {i} starts at {} but previous coverage ends at {cursor}",
                token.start
            )));
        }
        if token.end < token.start {
            return Err(malformed(format!("token {i} is inverted")));
        }
        if token.is_empty() && line_len != 0 {
            return Err(malformed(format!("token {i} is empty on a non-empty line")));
        }
        cursor = token.end;
    }
    if cursor != line_len {
        return Err(malformed(format!(
            "tokens cover [0, {cursor}) but line length is {line_len}"
        )));
    }
    if line_len == 0 && tokens.len() != 1 {
        return Err(malformed("empty line must carry exactly one token".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(start: usize, end: usize) -> Token {
        Token::new(start, end, vec!["source.test".into()])
    }

    #[test]
    fn tiling_accepted() {
        assert!(validate_tokens(5, &[tok(0, 2), tok(2, 5)]).is_ok());
    }

    #[test]
    fn gap_rejected() {
        assert!(matches!(
            validate_tokens(5, &[tok(0, 2), tok(3, 5)]),
            Err(SyntaxError::MalformedInput { .. })
        ));
    }

    #[test]
    fn overlap_rejected() {
        assert!(matches!(
            validate_tokens(5, &[tok(0, 3), tok(2, 5)]),
            Err(SyntaxError::MalformedInput { .. })
        ));
    }

    #[test]
    fn short_coverage_rejected() {
        assert!(matches!(
            validate_tokens(6, &[tok(0, 5)]),
            Err(SyntaxError::MalformedInput { .. })
        ));
    }

    #[test]
    fn empty_scope_path_rejected() {
        let bad = Token::new(0, 5, vec![]);
        assert!(matches!(
            validate_tokens(5, &[bad]),
            Err(SyntaxError::MalformedInput { .. })
        ));
    }

    #[test]
    fn empty_line_is_one_zero_length_token() {
        assert!(validate_tokens(0, &[tok(0, 0)]).is_ok());
        assert!(validate_tokens(0, &[]).is_err());
        assert!(validate_tokens(0, &[tok(0, 0), tok(0, 0)]).is_err());
    }

    #[test]
    fn plain_tokenizer_covers_line() {
        let t = PlainTokenizer::new("text.plain");
        let out = t.tokenize_line("hello", None).unwrap();
        assert_eq!(out.tokens, vec![Token::new(0, 5, vec!["text.plain".into()])]);
        validate_tokens(5, &out.tokens).unwrap();
    }

    #[test]
    fn plain_carry_equality() {
        let a: RuleStack = Arc::new(PlainCarry);
        let b: RuleStack = Arc::new(PlainCarry);
        assert!(a.eq_state(b.as_ref()));
    }
}
