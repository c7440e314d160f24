//! Line-indexed text store backed by a `ropey::Rope`.
//!
//! The rope's internal line index plays the role of the precomputed
//! line-start prefix array: `offset_to_position` / `position_to_offset` are
//! O(log n) lookups, and edits update the index locally instead of
//! rebuilding it. All offsets are UTF-8 byte offsets; that unit is shared
//! with tokens and decoration spans.
//!
//! Invariants:
//! * `line_count() >= 1`, even for an empty document.
//! * Lines are contiguous, non-overlapping, and cover the whole document.
//! * A trailing terminator produces a final empty line.
//! * Out-of-range positions are hard errors, never clamped.

use ropey::Rope;
use std::io;
use thiserror::Error;

pub mod grapheme;
pub mod width;

pub use width::cluster_width;

/// Position inside a document: (line index, byte offset within that line).
/// Zero-based. The byte offset may address the line terminator bytes when a
/// position was derived from an absolute offset pointing at them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub byte: usize,
}

impl Position {
    pub fn new(line: usize, byte: usize) -> Self {
        Self { line, byte }
    }

    pub fn origin() -> Self {
        Self { line: 0, byte: 0 }
    }
}

/// Line terminator kind for a stored line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// Document end without a trailing terminator.
    None,
    Lf,
    CrLf,
}

impl Terminator {
    pub fn len(self) -> usize {
        match self {
            Terminator::None => 0,
            Terminator::Lf => 1,
            Terminator::CrLf => 2,
        }
    }
}

/// Snapshot of one stored line: contiguous text between two terminators
/// (terminator excluded from `text`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRef {
    pub index: usize,
    /// Absolute byte offset of the first byte of this line.
    pub start_offset: usize,
    /// Line content, terminator excluded.
    pub text: String,
    pub terminator: Terminator,
}

impl LineRef {
    /// Content length in bytes, terminator excluded.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Absolute byte offset one past the content (start of the terminator).
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.text.len()
    }
}

/// Outcome of a mutation, reported so callers can invalidate token caches
/// and shift decoration spans without rescanning the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDelta {
    /// Absolute byte offset where the edit begins.
    pub start_offset: usize,
    /// First line whose content changed. Lines before it keep identical
    /// indices and offsets.
    pub first_line: usize,
    /// Whole lines merged away by the edit (0 for pure insertions).
    pub removed_lines: usize,
    /// Whole lines introduced by the edit (0 for pure removals).
    pub inserted_lines: usize,
    /// Signed change in document byte length.
    pub byte_delta: isize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    /// Position, index, or offset outside document bounds (including offsets
    /// that do not land on a character boundary). Indicates a caller bug in
    /// position bookkeeping; surfaced, never clamped.
    #[error("out of range: {context} (document: {len} bytes, {lines} lines)")]
    OutOfRange {
        context: String,
        len: usize,
        lines: usize,
    },
}

/// Ordered, line-indexed view over document bytes.
#[derive(Debug, Clone, Default)]
pub struct LineStore {
    rope: Rope,
}

impl LineStore {
    /// Build a store from an in-memory string.
    pub fn from_str(content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
        }
    }

    /// Build a store from a caller-supplied byte stream. Fails only on I/O
    /// errors from the stream, which propagate unchanged.
    pub fn from_reader<R: io::Read>(reader: R) -> io::Result<Self> {
        Ok(Self {
            rope: Rope::from_reader(reader)?,
        })
    }

    /// Total number of lines. Always >= 1.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total document length in bytes.
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    fn out_of_range(&self, context: impl Into<String>) -> TextError {
        TextError::OutOfRange {
            context: context.into(),
            len: self.rope.len_bytes(),
            lines: self.rope.len_lines(),
        }
    }

    /// Error unless `offset` is in-bounds and on a character boundary.
    fn checked_char_index(&self, offset: usize) -> Result<usize, TextError> {
        if offset > self.rope.len_bytes() {
            return Err(self.out_of_range(format!("offset {offset}")));
        }
        let char_idx = self.rope.byte_to_char(offset);
        if self.rope.char_to_byte(char_idx) != offset {
            return Err(self.out_of_range(format!("offset {offset} splits a character")));
        }
        Ok(char_idx)
    }

    /// Fetch one line. `OutOfRange` if `index >= line_count()`.
    pub fn line(&self, index: usize) -> Result<LineRef, TextError> {
        if index >= self.rope.len_lines() {
            return Err(self.out_of_range(format!("line {index}")));
        }
        let mut text = self.rope.line(index).to_string();
        let terminator = if text.ends_with("\r\n") {
            text.truncate(text.len() - 2);
            Terminator::CrLf
        } else if text.ends_with('\n') {
            text.pop();
            Terminator::Lf
        } else {
            Terminator::None
        };
        Ok(LineRef {
            index,
            start_offset: self.rope.line_to_byte(index),
            text,
            terminator,
        })
    }

    /// Translate an absolute byte offset into a (line, column) position.
    /// `offset == len_bytes()` maps to the end of the last line.
    pub fn offset_to_position(&self, offset: usize) -> Result<Position, TextError> {
        self.checked_char_index(offset)?;
        let line = self.rope.byte_to_line(offset);
        let start = self.rope.line_to_byte(line);
        Ok(Position::new(line, offset - start))
    }

    /// Inverse of `offset_to_position`. The column may address the line's
    /// terminator bytes (round-trip exactness); anything past them errors.
    pub fn position_to_offset(&self, pos: Position) -> Result<usize, TextError> {
        if pos.line >= self.rope.len_lines() {
            return Err(self.out_of_range(format!("line {}", pos.line)));
        }
        let start = self.rope.line_to_byte(pos.line);
        // One past the last line is a valid rope index and lands on the
        // document end, so this covers the final line too.
        let raw_len = self.rope.line_to_byte(pos.line + 1) - start;
        if pos.byte > raw_len {
            return Err(self.out_of_range(format!(
                "column {} on line {} (raw length {raw_len})",
                pos.byte, pos.line
            )));
        }
        let offset = start + pos.byte;
        self.checked_char_index(offset)?;
        Ok(offset)
    }

    /// Return the UTF-8 slice in the absolute byte range `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<String, TextError> {
        if start > end {
            return Err(self.out_of_range(format!("inverted range {start}..{end}")));
        }
        let start_char = self.checked_char_index(start)?;
        let end_char = self.checked_char_index(end)?;
        Ok(self.rope.slice(start_char..end_char).to_string())
    }

    /// Insert text at a position within a line's content (column must not
    /// exceed the content length, terminator excluded). Lines at and after
    /// the insertion point shift; earlier lines are untouched.
    pub fn insert(&mut self, pos: Position, text: &str) -> Result<EditDelta, TextError> {
        let line = self.line(pos.line)?;
        if pos.byte > line.len() {
            return Err(self.out_of_range(format!(
                "column {} on line {} (content length {})",
                pos.byte,
                pos.line,
                line.len()
            )));
        }
        let start_offset = line.start_offset + pos.byte;
        let char_idx = self.checked_char_index(start_offset)?;
        self.rope.insert(char_idx, text);
        Ok(EditDelta {
            start_offset,
            first_line: pos.line,
            removed_lines: 0,
            inserted_lines: text.matches('\n').count(),
            byte_delta: text.len() as isize,
        })
    }

    /// Remove the absolute byte range `[start, end)`. Lines spanned by the
    /// range merge into the first; later lines shift.
    pub fn remove(&mut self, start: usize, end: usize) -> Result<EditDelta, TextError> {
        if start > end {
            return Err(self.out_of_range(format!("inverted range {start}..{end}")));
        }
        let start_char = self.checked_char_index(start)?;
        let end_char = self.checked_char_index(end)?;
        let first_line = self.rope.byte_to_line(start);
        let last_line = self.rope.byte_to_line(end);
        self.rope.remove(start_char..end_char);
        Ok(EditDelta {
            start_offset: start,
            first_line,
            removed_lines: last_line - first_line,
            inserted_lines: 0,
            byte_delta: -((end - start) as isize),
        })
    }
}
