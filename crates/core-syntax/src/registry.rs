//! Grammar and language registration surface.
//!
//! Keyed lookup tables the host wires up at startup: languages map file
//! extensions to a language id, grammars map a language id to an engine.
//! A missing entry is `ResourceUnavailable`; callers degrade to plain text
//! instead of failing the document load.

use crate::{GrammarTokenizer, SyntaxError};
use ahash::AHashMap;
use std::path::Path;
use std::sync::Arc;

/// A grammar engine registered for a language.
#[derive(Clone)]
pub struct GrammarRegistration {
    pub language: String,
    /// Root scope name the grammar emits, e.g. `source.c`.
    pub scope_name: String,
    pub grammar: Arc<dyn GrammarTokenizer>,
}

/// A language id plus the file extensions (leading dot) that select it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRegistration {
    pub id: String,
    pub extensions: Vec<String>,
}

#[derive(Default)]
pub struct GrammarRegistry {
    grammars: AHashMap<String, GrammarRegistration>,
    extensions: AHashMap<String, String>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the grammar for a language.
    pub fn register_grammar(&mut self, registration: GrammarRegistration) {
        tracing::debug!(
            target: "syntax",
            language = %registration.language,
            scope = %registration.scope_name,
            "grammar_registered"
        );
        self.grammars
            .insert(registration.language.clone(), registration);
    }

    /// Register a language id for a set of file extensions. Later
    /// registrations win on extension conflicts.
    pub fn register_language(&mut self, registration: LanguageRegistration) {
        for ext in &registration.extensions {
            self.extensions.insert(ext.clone(), registration.id.clone());
        }
        tracing::debug!(
            target: "syntax",
            language = %registration.id,
            extensions = registration.extensions.len(),
            "language_registered"
        );
    }

    pub fn grammar_for_language(
        &self,
        language: &str,
    ) -> Result<Arc<dyn GrammarTokenizer>, SyntaxError> {
        self.grammars
            .get(language)
            .map(|r| r.grammar.clone())
            .ok_or_else(|| SyntaxError::ResourceUnavailable {
                resource: format!("grammar for language {language:?}"),
            })
    }

    /// Pick a grammar by file extension.
    pub fn grammar_for_path(&self, path: &Path) -> Result<Arc<dyn GrammarTokenizer>, SyntaxError> {
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .ok_or_else(|| SyntaxError::ResourceUnavailable {
                resource: format!("language for {}", path.display()),
            })?;
        let language =
            self.extensions
                .get(&ext)
                .ok_or_else(|| SyntaxError::ResourceUnavailable {
                    resource: format!("language for extension {ext:?}"),
                })?;
        self.grammar_for_language(language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlainTokenizer;

    fn registry_with_c() -> GrammarRegistry {
        let mut registry = GrammarRegistry::new();
        registry.register_grammar(GrammarRegistration {
            language: "c".into(),
            scope_name: "source.c".into(),
            grammar: Arc::new(PlainTokenizer::new("source.c")),
        });
        registry.register_language(LanguageRegistration {
            id: "c".into(),
            extensions: vec![".c".into(), ".h".into()],
        });
        registry
    }

    #[test]
    fn lookup_by_extension() {
        let registry = registry_with_c();
        let grammar = registry.grammar_for_path(Path::new("src/main.c")).unwrap();
        assert_eq!(grammar.scope_name(), "source.c");
        let grammar = registry.grammar_for_path(Path::new("hdr.h")).unwrap();
        assert_eq!(grammar.scope_name(), "source.c");
    }

    #[test]
    fn unknown_extension_is_resource_unavailable() {
        let registry = registry_with_c();
        assert!(matches!(
            registry.grammar_for_path(Path::new("notes.txt")),
            Err(SyntaxError::ResourceUnavailable { .. })
        ));
        assert!(matches!(
            registry.grammar_for_path(Path::new("Makefile")),
            Err(SyntaxError::ResourceUnavailable { .. })
        ));
    }

    #[test]
    fn language_without_grammar_is_resource_unavailable() {
        let mut registry = GrammarRegistry::new();
        registry.register_language(LanguageRegistration {
            id: "zig".into(),
            extensions: vec![".zig".into()],
        });
        assert!(matches!(
            registry.grammar_for_path(Path::new("a.zig")),
            Err(SyntaxError::ResourceUnavailable { .. })
        ));
    }
}
