//! Document orchestration: the single-threaded pipeline turn.
//!
//! A [`Document`] owns the line store, the token cache, the decoration
//! engine, and the rendering context, and sequences them per draw cycle:
//! pending asset completions are applied first, then tokens are ensured for
//! the visible lines, converted to syntax spans through the theme resolver
//! (whole lines at a time, never partially), composited with overlay spans,
//! and laid out into rows.
//!
//! Concurrency discipline: everything here runs on one thread. Edits take
//! `&mut self`, so no resolve or measure call can observe the store
//! mid-mutation. The only background work is grammar/theme acquisition,
//! whose completions land in an inbox drained at the start of the next
//! cycle; teardown cancels the pool's token so late completions are
//! discarded rather than written into live state.

use core_decor::{DecorationEngine, SpanId, SpanSource};
use core_render::{RenderingContext, Row, layout_row};
use core_syntax::{GrammarRegistration, GrammarRegistry, GrammarTokenizer, TokenCache};
use core_tasks::TaskPool;
use core_text::{EditDelta, LineRef, LineStore, Position, TextError};
use core_theme::{StylePatch, Theme};
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Priority of syntax spans; overlay sources register above it.
pub const SYNTAX_PRIORITY: u8 = 0;

/// A completed background acquisition, delivered through the document's
/// task inbox and applied atomically at the start of a cycle.
pub enum AssetEvent {
    Grammar(GrammarRegistration),
    Theme(Theme),
}

pub struct Document {
    path: PathBuf,
    store: LineStore,
    cache: TokenCache,
    decorations: DecorationEngine,
    ctx: RenderingContext,
    grammar: Option<Arc<dyn GrammarTokenizer>>,
    tasks: TaskPool<AssetEvent>,
}

impl Document {
    /// Load a document from a caller-supplied stream. I/O errors propagate;
    /// a missing grammar for the path's extension degrades to plain text
    /// and never fails the load.
    pub fn open<R: io::Read>(
        reader: R,
        path: impl Into<PathBuf>,
        registry: &GrammarRegistry,
        ctx: RenderingContext,
    ) -> io::Result<Self> {
        let path = path.into();
        let store = LineStore::from_reader(reader)?;
        tracing::info!(
            target: "io",
            file = %path.display(),
            size_bytes = store.len_bytes(),
            line_count = store.line_count(),
            "document_loaded"
        );
        Ok(Self::assemble(path, store, registry, ctx))
    }

    /// In-memory variant of [`Document::open`].
    pub fn from_str(
        content: &str,
        path: impl Into<PathBuf>,
        registry: &GrammarRegistry,
        ctx: RenderingContext,
    ) -> Self {
        Self::assemble(path.into(), LineStore::from_str(content), registry, ctx)
    }

    fn assemble(
        path: PathBuf,
        store: LineStore,
        registry: &GrammarRegistry,
        ctx: RenderingContext,
    ) -> Self {
        let grammar = match registry.grammar_for_path(&path) {
            Ok(grammar) => Some(grammar),
            Err(err) => {
                tracing::warn!(
                    target: "state",
                    file = %path.display(),
                    %err,
                    "highlighting_disabled"
                );
                None
            }
        };
        Self {
            path,
            store,
            cache: TokenCache::new(),
            decorations: DecorationEngine::new(),
            ctx,
            grammar,
            tasks: TaskPool::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &LineStore {
        &self.store
    }

    pub fn context(&self) -> &RenderingContext {
        &self.ctx
    }

    /// Inbox for background grammar/theme loads tied to this document's
    /// lifetime.
    pub fn tasks(&self) -> &TaskPool<AssetEvent> {
        &self.tasks
    }

    /// Replace the grammar and retokenize from scratch on the next cycle.
    pub fn set_grammar(&mut self, grammar: Arc<dyn GrammarTokenizer>) {
        self.grammar = Some(grammar);
        self.cache.reset();
    }

    /// Swap the active theme wholesale.
    pub fn set_theme(&mut self, theme: Theme) {
        tracing::info!(target: "state", theme = %theme.name, "theme_applied");
        self.ctx.set_theme(theme);
    }

    /// Drain and apply completed background acquisitions. Called at the
    /// start of every cycle; applications are whole (a renderer never sees
    /// a grammar or theme mid-initialization). Returns how many landed.
    pub fn pump_assets(&mut self) -> usize {
        let events = self.tasks.drain();
        let applied = events.len();
        for event in events {
            match event {
                AssetEvent::Grammar(registration) => {
                    tracing::info!(
                        target: "state",
                        language = %registration.language,
                        "grammar_applied"
                    );
                    self.set_grammar(registration.grammar);
                }
                AssetEvent::Theme(theme) => self.set_theme(theme),
            }
        }
        applied
    }

    /// Cancel pending background work. Late completions are discarded.
    pub fn teardown(&mut self) {
        self.tasks.cancel();
    }

    /// Insert text at a position. Serialized against resolution by `&mut`;
    /// the token cache and decoration spans are adjusted from the edit
    /// point forward.
    pub fn insert(&mut self, pos: Position, text: &str) -> Result<EditDelta, TextError> {
        let delta = self.store.insert(pos, text)?;
        self.apply_edit(delta);
        Ok(delta)
    }

    /// Remove the absolute byte range `[start, end)`.
    pub fn remove(&mut self, start: usize, end: usize) -> Result<EditDelta, TextError> {
        let delta = self.store.remove(start, end)?;
        self.apply_edit(delta);
        Ok(delta)
    }

    fn apply_edit(&mut self, delta: EditDelta) {
        self.cache
            .splice(delta.first_line, delta.removed_lines, delta.inserted_lines);
        self.decorations.shift(delta.start_offset, delta.byte_delta);
        tracing::debug!(
            target: "state",
            first_line = delta.first_line,
            byte_delta = delta.byte_delta,
            removed_lines = delta.removed_lines,
            inserted_lines = delta.inserted_lines,
            "edit_applied"
        );
    }

    /// Register an overlay span (selection, search, diagnostics). Use a
    /// priority above [`SYNTAX_PRIORITY`] to win contested fields.
    pub fn add_overlay(
        &mut self,
        range: Range<usize>,
        patch: StylePatch,
        priority: u8,
        source: SpanSource,
    ) -> SpanId {
        debug_assert!(
            source != SpanSource::Syntax,
            "syntax spans are owned by the tokenization pipeline"
        );
        self.decorations.add_span(range, patch, priority, source)
    }

    pub fn remove_overlay(&mut self, id: SpanId) -> bool {
        self.decorations.remove_span(id)
    }

    pub fn clear_overlays(&mut self, source: SpanSource) {
        self.decorations.clear_source(source)
    }

    /// Produce styled, measured rows for the visible line range. Runs the
    /// full per-cycle sequence: pump assets, ensure tokens (threading
    /// carried state), apply each line's syntax spans atomically, resolve,
    /// lay out.
    pub fn rows(&mut self, lines: Range<usize>) -> Result<Vec<Row>, TextError> {
        self.pump_assets();
        if let (Some(grammar), Some(last)) = (self.grammar.clone(), lines.end.checked_sub(1)) {
            self.cache.ensure(&self.store, grammar.as_ref(), last)?;
        }
        let base = self.ctx.base_style();
        let mut rows = Vec::with_capacity(lines.len());
        for index in lines {
            let line = self.store.line(index)?;
            self.apply_syntax_spans(&line);
            let content = line.start_offset..line.end_offset();
            let resolved: Vec<_> = self
                .decorations
                .resolve(content.clone(), &base)
                .into_iter()
                .map(|(r, s)| (r.start - content.start..r.end - content.start, s))
                .collect();
            rows.push(layout_row(index, &line.text, &resolved, &self.ctx));
        }
        Ok(rows)
    }

    /// Single-line convenience over [`Document::rows`].
    pub fn row(&mut self, line: usize) -> Result<Row, TextError> {
        let mut rows = self.rows(line..line + 1)?;
        Ok(rows.remove(0))
    }

    /// Replace this line's syntax spans with the current token set, all or
    /// none: a row is drawn either with fully resolved tokens or with none,
    /// never a partial mix.
    fn apply_syntax_spans(&mut self, line: &LineRef) {
        let content = line.start_offset..line.end_offset();
        self.decorations
            .clear_source_in(content.clone(), SpanSource::Syntax);
        let Some(tokens) = self.cache.tokens(line.index) else {
            // Untokenized (plain or not-yet-arrived grammar): base style only.
            return;
        };
        for token in tokens.iter() {
            if token.is_empty() {
                continue;
            }
            let patch = self.ctx.theme.resolve(&token.scopes);
            if patch.is_empty() {
                continue;
            }
            self.decorations.add_span(
                content.start + token.start..content.start + token.end,
                patch,
                SYNTAX_PRIORITY,
                SpanSource::Syntax,
            );
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.path)
            .field("lines", &self.store.line_count())
            .field("has_grammar", &self.grammar.is_some())
            .finish_non_exhaustive()
    }
}
