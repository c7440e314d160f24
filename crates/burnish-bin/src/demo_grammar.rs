//! Regex-based demo grammar for C-like files.
//!
//! Plays the external-engine role behind the `GrammarTokenizer` contract:
//! the core crates never see how tokens are produced, only that they tile
//! each line and that the carried state threads block comments across
//! lines.

use core_syntax::{CarryOver, GrammarTokenizer, LineTokens, RuleStack, SyntaxError, Token};
use regex::Regex;
use std::any::Any;
use std::sync::Arc;

const STORAGE_TYPES: &[&str] = &[
    "char", "double", "float", "int", "long", "short", "signed", "struct", "unsigned", "void",
];
const CONTROL_KEYWORDS: &[&str] = &[
    "break", "case", "continue", "do", "else", "for", "if", "return", "switch", "while",
];

/// Carried state: whether the next line starts inside a `/* ... */`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct CommentCarry {
    in_block_comment: bool,
}

impl CarryOver for CommentCarry {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_state(&self, other: &dyn CarryOver) -> bool {
        other.as_any().downcast_ref::<CommentCarry>() == Some(self)
    }
}

pub struct CLikeGrammar {
    scope: String,
    token_re: Regex,
}

impl CLikeGrammar {
    pub fn new() -> Self {
        // Alternation must cover every byte so tokens tile the line; the
        // final arms sweep up whitespace, punctuation runs, and a lone '/'.
        let token_re = Regex::new(
            r#"(?x)
            (?P<line_comment>//.*) |
            (?P<block_open>/\*) |
            (?P<string>"(?:\\.|[^"\\])*"?) |
            (?P<number>\d[\w.]*) |
            (?P<word>[A-Za-z_]\w*) |
            (?P<blank>\s+) |
            (?P<punct>[^\s\w"/]+|/)
            "#,
        )
        .expect("demo grammar alternation is valid");
        Self {
            scope: "source.c".to_string(),
            token_re,
        }
    }

    fn scopes(&self, trailing: &str) -> Vec<String> {
        vec![self.scope.clone(), trailing.to_string()]
    }

    fn word_scopes(&self, word: &str) -> Vec<String> {
        if STORAGE_TYPES.contains(&word) {
            self.scopes("storage.type.c")
        } else if CONTROL_KEYWORDS.contains(&word) {
            self.scopes("keyword.control.c")
        } else {
            vec![self.scope.clone()]
        }
    }
}

impl Default for CLikeGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarTokenizer for CLikeGrammar {
    fn scope_name(&self) -> &str {
        &self.scope
    }

    fn tokenize_line(
        &self,
        line: &str,
        carry: Option<&RuleStack>,
    ) -> Result<LineTokens, SyntaxError> {
        let mut in_block = carry
            .and_then(|c| c.as_any().downcast_ref::<CommentCarry>())
            .is_some_and(|c| c.in_block_comment);
        let mut tokens = Vec::new();
        let mut at = 0usize;

        while at < line.len() {
            if in_block {
                // Consume up to and including the terminator, or the rest
                // of the line if the comment stays open.
                let end = match line[at..].find("*/") {
                    Some(rel) => {
                        in_block = false;
                        at + rel + 2
                    }
                    None => line.len(),
                };
                tokens.push(Token::new(at, end, self.scopes("comment.block.c")));
                at = end;
                continue;
            }
            let Some(caps) = self.token_re.captures(&line[at..]) else {
                // Unreachable with a total alternation; surface rather than
                // loop forever if the pattern ever regresses.
                return Err(SyntaxError::MalformedInput {
                    reason: format!("no token match at byte {at}"),
                });
            };
            let m = caps.get(0).ok_or_else(|| SyntaxError::MalformedInput {
                reason: "empty capture".into(),
            })?;
            let (start, end) = (at + m.start(), at + m.end());
            if m.start() != 0 {
                return Err(SyntaxError::MalformedInput {
                    reason: format!("unanchored match at byte {at}"),
                });
            }
            let scopes = if caps.name("line_comment").is_some() {
                self.scopes("comment.line.double-slash.c")
            } else if caps.name("block_open").is_some() {
                in_block = true;
                // The terminator may sit on this same line; let the
                // in-block branch above consume through it.
                self.scopes("comment.block.c")
            } else if caps.name("string").is_some() {
                self.scopes("string.quoted.double.c")
            } else if caps.name("number").is_some() {
                self.scopes("constant.numeric.c")
            } else if let Some(word) = caps.name("word") {
                self.word_scopes(word.as_str())
            } else {
                vec![self.scope.clone()]
            };
            tokens.push(Token::new(start, end, scopes));
            at = end;
        }

        if tokens.is_empty() {
            tokens.push(Token::new(0, 0, vec![self.scope.clone()]));
        }
        Ok(LineTokens {
            tokens,
            end_state: Arc::new(CommentCarry {
                in_block_comment: in_block,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_syntax::validate_tokens;

    fn tokenize(grammar: &CLikeGrammar, line: &str, carry: Option<&RuleStack>) -> LineTokens {
        let out = grammar.tokenize_line(line, carry).unwrap();
        validate_tokens(line.len(), &out.tokens).unwrap();
        out
    }

    fn scope_of<'a>(out: &'a LineTokens, text: &str, line: &str) -> &'a str {
        let start = line.find(text).unwrap();
        let token = out
            .tokens
            .iter()
            .find(|t| t.start <= start && start < t.end)
            .unwrap();
        token.scopes.last().unwrap()
    }

    #[test]
    fn keywords_types_numbers_strings() {
        let grammar = CLikeGrammar::new();
        let line = r#"int x = 42; return "hi\"s";"#;
        let out = tokenize(&grammar, line, None);
        assert_eq!(scope_of(&out, "int", line), "storage.type.c");
        assert_eq!(scope_of(&out, "42", line), "constant.numeric.c");
        assert_eq!(scope_of(&out, "return", line), "keyword.control.c");
        assert_eq!(scope_of(&out, "\"hi", line), "string.quoted.double.c");
        assert_eq!(scope_of(&out, "x", line), "source.c");
    }

    #[test]
    fn line_comment_runs_to_end() {
        let grammar = CLikeGrammar::new();
        let line = "x = 1; // trailing words";
        let out = tokenize(&grammar, line, None);
        assert_eq!(
            scope_of(&out, "// trailing", line),
            "comment.line.double-slash.c"
        );
    }

    #[test]
    fn block_comment_state_threads_across_lines() {
        let grammar = CLikeGrammar::new();
        let first = tokenize(&grammar, "int a; /* begin", None);
        let second = tokenize(&grammar, "still inside", Some(&first.end_state));
        let third = tokenize(&grammar, "end */ int b;", Some(&second.end_state));

        assert_eq!(scope_of(&first, "/*", "int a; /* begin"), "comment.block.c");
        assert_eq!(second.tokens.len(), 1);
        assert_eq!(
            second.tokens[0].scopes.last().unwrap(),
            "comment.block.c"
        );
        assert_eq!(scope_of(&third, "end */", "end */ int b;"), "comment.block.c");
        assert_eq!(scope_of(&third, "int", "end */ int b;"), "storage.type.c");

        // The closing line's carried-out state is back to neutral.
        let fourth = tokenize(&grammar, "int c;", Some(&third.end_state));
        assert_eq!(scope_of(&fourth, "int", "int c;"), "storage.type.c");
    }

    #[test]
    fn same_line_block_comment_closes() {
        let grammar = CLikeGrammar::new();
        let line = "a /* mid */ b";
        let out = tokenize(&grammar, line, None);
        assert_eq!(scope_of(&out, "/* mid */", line), "comment.block.c");
        assert_eq!(scope_of(&out, "b", line), "source.c");
        let next = tokenize(&grammar, "int d;", Some(&out.end_state));
        assert_eq!(scope_of(&next, "int", "int d;"), "storage.type.c");
    }

    #[test]
    fn empty_line_emits_one_empty_token() {
        let grammar = CLikeGrammar::new();
        let out = tokenize(&grammar, "", None);
        assert_eq!(out.tokens.len(), 1);
        assert!(out.tokens[0].is_empty());
    }

    #[test]
    fn tokenization_is_idempotent() {
        let grammar = CLikeGrammar::new();
        let carry: RuleStack = Arc::new(CommentCarry {
            in_block_comment: true,
        });
        let a = tokenize(&grammar, "text */ int x = 1;", Some(&carry));
        let b = tokenize(&grammar, "text */ int x = 1;", Some(&carry));
        assert_eq!(a.tokens, b.tokens);
        assert!(a.end_state.eq_state(b.end_state.as_ref()));
    }
}
