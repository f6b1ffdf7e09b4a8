//! Source text, text changes, and line/column positions.

use std::fmt;
use std::sync::Arc;

use line_index::{LineCol, LineIndex};
use once_cell::race::OnceBox;
use text_size::{TextRange, TextSize};

/// Immutable source text with a lazily built line index.
pub struct SourceText {
    text: Arc<str>,
    lines: OnceBox<LineIndex>,
}

impl SourceText {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into(), lines: OnceBox::new() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> TextSize {
        TextSize::of(&*self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_index(&self) -> &LineIndex {
        self.lines.get_or_init(|| Box::new(LineIndex::new(&self.text)))
    }

    /// Zero-based line and byte column of `offset`.
    pub fn line_position(&self, offset: TextSize) -> LinePosition {
        let LineCol { line, col } = self.line_index().line_col(offset.min(self.len()));
        LinePosition { line, column: col }
    }

    /// Offset of the first character of zero-based `line`.
    pub fn line_start(&self, line: u32) -> Option<TextSize> {
        self.line_index().offset(LineCol { line, col: 0 })
    }
}

impl Clone for SourceText {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.text))
    }
}

impl fmt::Debug for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceText").field("len", &self.len()).finish_non_exhaustive()
    }
}

/// A zero-based line and byte column.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LinePosition {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for LinePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// A replacement of `range` in some old text by `new_text`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TextChange {
    pub range: TextRange,
    pub new_text: String,
}

impl TextChange {
    pub fn new(range: TextRange, new_text: impl Into<String>) -> Self {
        Self { range, new_text: new_text.into() }
    }

    pub fn insert(offset: TextSize, text: impl Into<String>) -> Self {
        Self::new(TextRange::empty(offset), text)
    }

    pub fn delete(range: TextRange) -> Self {
        Self::new(range, String::new())
    }

    pub fn change_range(&self) -> TextChangeRange {
        TextChangeRange::new(self.range, TextSize::of(self.new_text.as_str()))
    }
}

/// Applies `changes` to `text`. Changes are in old-text coordinates and must
/// not overlap; they may come in any order.
pub fn apply_changes(text: &str, changes: &[TextChange]) -> String {
    let mut sorted: Vec<&TextChange> = changes.iter().collect();
    sorted.sort_by_key(|change| (change.range.start(), change.range.end()));
    let mut out = String::with_capacity(text.len());
    let mut last = TextSize::new(0);
    for change in sorted {
        debug_assert!(change.range.start() >= last, "overlapping text changes");
        out.push_str(&text[TextRange::new(last, change.range.start())]);
        out.push_str(&change.new_text);
        last = change.range.end();
    }
    out.push_str(&text[usize::from(last)..]);
    out
}

/// The extent of a change: the old span replaced and the length of what
/// replaced it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TextChangeRange {
    pub span: TextRange,
    pub new_len: TextSize,
}

impl TextChangeRange {
    pub fn new(span: TextRange, new_len: TextSize) -> Self {
        Self { span, new_len }
    }

    /// The range in new-text coordinates.
    pub fn new_span(&self) -> TextRange {
        TextRange::at(self.span.start(), self.new_len)
    }

    /// Signed growth of the text, as new minus old length.
    pub fn delta(&self) -> i64 {
        i64::from(u32::from(self.new_len)) - i64::from(u32::from(self.span.len()))
    }

    pub fn is_unchanged(&self) -> bool {
        self.span.is_empty() && self.new_len == TextSize::new(0)
    }

    /// The single change between `old` and `new`, found by trimming their
    /// common prefix and suffix; `None` when the texts are equal.
    pub fn between(old: &str, new: &str) -> Option<Self> {
        if old == new {
            return None;
        }
        let mut prefix =
            old.bytes().zip(new.bytes()).take_while(|(left, right)| left == right).count();
        while !old.is_char_boundary(prefix) || !new.is_char_boundary(prefix) {
            prefix -= 1;
        }
        let max_suffix = old.len().min(new.len()) - prefix;
        let mut suffix = old
            .bytes()
            .rev()
            .zip(new.bytes().rev())
            .take(max_suffix)
            .take_while(|(left, right)| left == right)
            .count();
        while !old.is_char_boundary(old.len() - suffix) || !new.is_char_boundary(new.len() - suffix)
        {
            suffix -= 1;
        }
        let start = TextSize::new(prefix as u32);
        let old_end = TextSize::new((old.len() - suffix) as u32);
        let new_len = TextSize::new((new.len() - suffix - prefix) as u32);
        Some(Self::new(TextRange::new(start, old_end), new_len))
    }

    /// Merges sorted, non-overlapping changes into one covering change.
    pub fn collapse(changes: &[Self]) -> Option<Self> {
        let first = changes.first()?;
        let mut span = first.span;
        let mut delta = 0i64;
        for change in changes {
            span = span.cover(change.span);
            delta += change.delta();
        }
        let new_len = i64::from(u32::from(span.len())) + delta;
        Some(Self::new(span, TextSize::new(u32::try_from(new_len).ok()?)))
    }
}

/// A span resolved to file, line, and column.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FileLinePositionSpan {
    pub path: String,
    pub start: LinePosition,
    pub end: LinePosition,
    /// Whether `path` was set by a `#line` directive.
    pub has_mapped_path: bool,
}

impl fmt::Display for FileLinePositionSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})-({})", self.path, self.start, self.end)
    }
}

/// A span after `#line` remapping.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MappedLineSpan {
    pub span: FileLinePositionSpan,
    /// The span lies in a region after `#line hidden`.
    pub is_hidden: bool,
}
