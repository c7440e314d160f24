//! Decoration span registry and per-character style compositing.
//!
//! Spans from any source (syntax, selection, search, diagnostics) coexist;
//! none is privileged except by explicit priority, with insertion order as
//! the stable tie-break (most recent wins). Compositing is **field by
//! field**, not style by style: background, foreground, and the font-style
//! bitmask are each taken from the highest-ordered span that sets that
//! field, else fall through to the base style. A search-highlight
//! background must not also override syntax foreground or italic bits.
//!
//! Resolved styles are derived, never stored: [`DecorationEngine::resolve`]
//! recomputes the partition on every call.

use ahash::AHashMap;
use core_theme::{ResolvedStyle, StylePatch};
use std::ops::Range;

/// Stable handle to a registered span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanId(u64);

/// Origin of a span, used for bulk removal (e.g. all syntax spans of a line
/// being retokenized).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanSource {
    Syntax,
    Selection,
    Search,
    Diagnostic,
}

#[derive(Debug, Clone)]
struct SpanRecord {
    start: usize,
    end: usize,
    patch: StylePatch,
    priority: u8,
    seq: u64,
    source: SpanSource,
}

impl SpanRecord {
    fn overlaps(&self, range: &Range<usize>) -> bool {
        self.start < range.end && self.end > range.start
    }
}

/// Registry of style spans in document byte coordinates.
#[derive(Debug, Default)]
pub struct DecorationEngine {
    spans: AHashMap<u64, SpanRecord>,
    next_seq: u64,
}

impl DecorationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a span over `[range.start, range.end)`. Higher priority wins
    /// contested fields; equal priorities resolve to the later insertion.
    pub fn add_span(
        &mut self,
        range: Range<usize>,
        patch: StylePatch,
        priority: u8,
        source: SpanSource,
    ) -> SpanId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.spans.insert(
            seq,
            SpanRecord {
                start: range.start,
                end: range.end,
                patch,
                priority,
                seq,
                source,
            },
        );
        SpanId(seq)
    }

    /// Remove one span; `false` if the id was already gone.
    pub fn remove_span(&mut self, id: SpanId) -> bool {
        self.spans.remove(&id.0).is_some()
    }

    /// Bulk-remove every span from one source.
    pub fn clear_source(&mut self, source: SpanSource) {
        self.spans.retain(|_, rec| rec.source != source);
    }

    /// Bulk-remove spans of one source overlapping `range` (a line being
    /// retokenized clears only its own syntax spans).
    pub fn clear_source_in(&mut self, range: Range<usize>, source: SpanSource) {
        self.spans
            .retain(|_, rec| rec.source != source || !rec.overlaps(&range));
    }

    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// Adjust span offsets for an edit at `at` with signed byte `delta`.
    /// Offsets strictly after the edit point shift; removal clamps offsets
    /// inside the removed region to the edit point. Spans collapsed to
    /// nothing are dropped.
    pub fn shift(&mut self, at: usize, delta: isize) {
        for rec in self.spans.values_mut() {
            rec.start = shift_offset(rec.start, at, delta);
            rec.end = shift_offset(rec.end, at, delta);
        }
        self.spans.retain(|_, rec| rec.start < rec.end);
    }

    /// Partition `range` into maximal runs of uniform resolved style.
    /// Uncovered stretches resolve to `base`; covered stretches composite
    /// field-wise over it in (priority desc, insertion desc) order.
    pub fn resolve(
        &self,
        range: Range<usize>,
        base: &ResolvedStyle,
    ) -> Vec<(Range<usize>, ResolvedStyle)> {
        if range.start >= range.end {
            return Vec::new();
        }
        let mut covering: Vec<&SpanRecord> = self
            .spans
            .values()
            .filter(|rec| rec.start < rec.end && rec.overlaps(&range))
            .collect();
        covering.sort_unstable_by(|a, b| {
            b.priority.cmp(&a.priority).then(b.seq.cmp(&a.seq))
        });

        let mut bounds: Vec<usize> = Vec::with_capacity(2 + covering.len() * 2);
        bounds.push(range.start);
        bounds.push(range.end);
        for rec in &covering {
            if rec.start > range.start && rec.start < range.end {
                bounds.push(rec.start);
            }
            if rec.end > range.start && rec.end < range.end {
                bounds.push(rec.end);
            }
        }
        bounds.sort_unstable();
        bounds.dedup();

        let mut runs: Vec<(Range<usize>, ResolvedStyle)> = Vec::new();
        for pair in bounds.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            let mut patch = StylePatch::default();
            for rec in &covering {
                if rec.start <= lo && rec.end >= hi {
                    patch = patch.or(rec.patch);
                    if patch.font_style.is_some()
                        && patch.foreground.is_some()
                        && patch.background.is_some()
                    {
                        break;
                    }
                }
            }
            let style = base.patched(patch);
            match runs.last_mut() {
                Some((prev, prev_style)) if *prev_style == style && prev.end == lo => {
                    prev.end = hi;
                }
                _ => runs.push((lo..hi, style)),
            }
        }
        tracing::trace!(
            target: "decor",
            spans = covering.len(),
            runs = runs.len(),
            "range_resolved"
        );
        runs
    }
}

fn shift_offset(offset: usize, at: usize, delta: isize) -> usize {
    if offset <= at {
        return offset;
    }
    if delta >= 0 {
        offset + delta as usize
    } else {
        offset.saturating_sub(delta.unsigned_abs()).max(at)
    }
}
