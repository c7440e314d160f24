//! Incremental per-line token cache.
//!
//! Tokenizing line N needs line N-1's carried-out state, so invalidation
//! always runs forward from the edited line. Recomputation stops as soon as
//! a retokenized line's carried-out state equals its previously cached one:
//! downstream lines cannot be affected and their cached tokens stay valid.
//!
//! Invariant: every line below `dirty_from` is cached and valid.

use crate::{GrammarTokenizer, RuleStack, Token, plain_line_tokens, validate_tokens};
use core_text::{LineStore, TextError};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct CachedLine {
    tokens: Arc<[Token]>,
    end_state: RuleStack,
}

#[derive(Debug, Default)]
pub struct TokenCache {
    lines: Vec<Option<CachedLine>>,
    /// First line whose cached entry (if any) may be stale.
    dirty_from: usize,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything, e.g. when a grammar arrives or is replaced.
    pub fn reset(&mut self) {
        self.lines.clear();
        self.dirty_from = 0;
    }

    /// Mark `line` and everything after it stale.
    pub fn invalidate_from(&mut self, line: usize) {
        self.dirty_from = self.dirty_from.min(line);
    }

    /// Mirror an edit reported by the line store: the first changed line is
    /// retokenized in place, lines merged away are dropped, inserted lines
    /// start uncached. Always invalidates forward from the edit line.
    pub fn splice(&mut self, first_line: usize, removed: usize, inserted: usize) {
        let start = (first_line + 1).min(self.lines.len());
        let end = (start + removed).min(self.lines.len());
        self.lines
            .splice(start..end, std::iter::repeat_with(|| None).take(inserted));
        self.invalidate_from(first_line);
    }

    /// Tokens for a line, if cached and valid.
    pub fn tokens(&self, line: usize) -> Option<Arc<[Token]>> {
        if line >= self.dirty_from {
            return None;
        }
        self.lines.get(line)?.as_ref().map(|c| c.tokens.clone())
    }

    /// Carried-out state of a line, if cached and valid.
    pub fn end_state(&self, line: usize) -> Option<RuleStack> {
        if line >= self.dirty_from {
            return None;
        }
        self.lines.get(line)?.as_ref().map(|c| c.end_state.clone())
    }

    /// Tokenize forward until `target` (inclusive) is cached and valid,
    /// threading carried state line by line and short-circuiting on state
    /// convergence. Malformed lines are isolated to a plain fallback token;
    /// only position errors propagate.
    pub fn ensure(
        &mut self,
        store: &LineStore,
        grammar: &dyn GrammarTokenizer,
        target: usize,
    ) -> Result<(), TextError> {
        let count = store.line_count();
        self.lines.resize_with(count, || None);
        self.dirty_from = self.dirty_from.min(count);
        if target >= count {
            return Err(TextError::OutOfRange {
                context: format!("line {target}"),
                len: store.len_bytes(),
                lines: count,
            });
        }

        while self.dirty_from <= target {
            let index = self.dirty_from;
            let carry = if index == 0 {
                None
            } else {
                self.lines[index - 1].as_ref().map(|c| c.end_state.clone())
            };
            let line = store.line(index)?;
            let previous_end = self.lines[index].as_ref().map(|c| c.end_state.clone());
            let fresh = tokenize_one(grammar, index, &line.text, carry.as_ref());
            let converged = matches!(
                &previous_end,
                Some(prev) if prev.eq_state(fresh.end_state.as_ref())
            );
            self.lines[index] = Some(fresh);
            self.dirty_from = index + 1;
            if converged {
                // Downstream cached lines are unaffected; skip to the first gap.
                while self.dirty_from < count && self.lines[self.dirty_from].is_some() {
                    self.dirty_from += 1;
                }
                tracing::trace!(
                    target: "syntax.cache",
                    line = index,
                    resumed_at = self.dirty_from,
                    "retokenization_converged"
                );
            }
        }
        Ok(())
    }
}

fn tokenize_one(
    grammar: &dyn GrammarTokenizer,
    index: usize,
    text: &str,
    carry: Option<&RuleStack>,
) -> CachedLine {
    let outcome = grammar
        .tokenize_line(text, carry)
        .and_then(|lt| validate_tokens(text.len(), &lt.tokens).map(|()| lt));
    match outcome {
        Ok(lt) => CachedLine {
            tokens: lt.tokens.into(),
            end_state: lt.end_state,
        },
        Err(err) => {
            // One bad line never prevents the rest of the document from
            // rendering; it degrades to a single plain token and the
            // carried-in state passes through unchanged.
            tracing::warn!(target: "syntax", line = index, %err, "line_degraded_to_plain");
            CachedLine {
                tokens: plain_line_tokens(text.len(), grammar.scope_name()).into(),
                end_state: carry
                    .cloned()
                    .unwrap_or_else(|| Arc::new(crate::PlainCarry) as RuleStack),
            }
        }
    }
}
