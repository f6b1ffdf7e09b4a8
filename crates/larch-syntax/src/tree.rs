use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use once_cell::race::OnceBox;
use text_size::{TextRange, TextSize};

use crate::directives::{DirectiveStack, DirectiveTimeline};
use crate::green::GreenNode;
use crate::line_map::LineMap;
use crate::pragma::{PragmaMap, ReportState};
use crate::red::RedData;
use crate::text::{
    FileLinePositionSpan, MappedLineSpan, SourceText, TextChange, TextChangeRange, apply_changes,
};
use crate::{CancellationToken, Cancelled, ParseFileError, ParseOptions, ReparseError, SyntaxNode};

/// What a parser hands back: the shape tree and the preprocessor state at
/// the end of the text.
#[derive(Clone, Debug)]
pub struct ParseResult {
    pub root: GreenNode,
    pub directives: DirectiveStack,
}

/// A grammar plugged into the engine.
pub trait LanguageParser: Send + Sync {
    fn parse(
        &self,
        text: &str,
        options: &ParseOptions,
        cancel: &CancellationToken,
    ) -> Result<ParseResult, Cancelled>;

    /// Parses `new_text`, which is `old`'s text with `change` applied,
    /// reusing as much of `old` as possible.
    fn reparse(
        &self,
        old: &SyntaxTree,
        change: TextChangeRange,
        new_text: &str,
        cancel: &CancellationToken,
    ) -> Result<ParseResult, Cancelled>;
}

/// An immutable parsed file. Cloning is cheap; every edit produces a new tree.
#[derive(Clone)]
pub struct SyntaxTree {
    inner: Arc<TreeInner>,
}

struct TreeInner {
    green: GreenNode,
    root: OnceBox<RedData>,
    text: OnceBox<SourceText>,
    path: Utf8PathBuf,
    options: ParseOptions,
    parser: Option<Arc<dyn LanguageParser>>,
    end_directives: Option<DirectiveStack>,
    directives: OnceBox<DirectiveTimeline>,
    line_map: OnceBox<LineMap>,
    pragmas: OnceBox<PragmaMap>,
}

impl SyntaxTree {
    /// Wraps an already built shape tree. The text is regenerated from it on
    /// first use.
    pub fn new(green: GreenNode, options: ParseOptions) -> Self {
        Self::from_parts(green, None, Utf8PathBuf::new(), options, None, None)
    }

    fn from_parts(
        green: GreenNode,
        text: Option<SourceText>,
        path: Utf8PathBuf,
        options: ParseOptions,
        parser: Option<Arc<dyn LanguageParser>>,
        end_directives: Option<DirectiveStack>,
    ) -> Self {
        let cached_text = OnceBox::new();
        if let Some(text) = text {
            debug_assert_eq!(text.len(), green.full_width(), "text does not match the tree");
            let _ = cached_text.set(Box::new(text));
        }
        Self {
            inner: Arc::new(TreeInner {
                green,
                root: OnceBox::new(),
                text: cached_text,
                path,
                options,
                parser,
                end_directives,
                directives: OnceBox::new(),
                line_map: OnceBox::new(),
                pragmas: OnceBox::new(),
            }),
        }
    }

    pub fn parse(
        text: &str,
        options: ParseOptions,
        parser: Arc<dyn LanguageParser>,
        cancel: &CancellationToken,
    ) -> Result<Self, Cancelled> {
        let result = parser.parse(text, &options, cancel)?;
        tracing::debug!(len = text.len(), "parsed syntax tree");
        Ok(Self::from_parts(
            result.root,
            Some(SourceText::new(text)),
            Utf8PathBuf::new(),
            options,
            Some(parser),
            Some(result.directives),
        ))
    }

    pub fn parse_file(
        path: impl AsRef<Utf8Path>,
        options: ParseOptions,
        parser: Arc<dyn LanguageParser>,
        cancel: &CancellationToken,
    ) -> Result<Self, ParseFileError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ParseFileError::Io { path: path.to_owned(), source })?;
        let tree = Self::parse(&text, options, parser, cancel)?;
        Ok(tree.with_path(path))
    }

    /// The same tree reported under `path`.
    pub fn with_path(&self, path: impl Into<Utf8PathBuf>) -> Self {
        Self::from_parts(
            self.inner.green.clone(),
            self.inner.text.get().cloned(),
            path.into(),
            self.inner.options.clone(),
            self.inner.parser.clone(),
            self.inner.end_directives.clone(),
        )
    }

    /// A tree over `green` that keeps this tree's path, options and parser.
    pub(crate) fn with_green(&self, green: GreenNode) -> Self {
        Self::from_parts(
            green,
            None,
            self.inner.path.clone(),
            self.inner.options.clone(),
            self.inner.parser.clone(),
            None,
        )
    }

    pub fn green(&self) -> &GreenNode {
        &self.inner.green
    }

    pub fn root(&self) -> SyntaxNode {
        let data = self.inner.root.get_or_init(|| {
            Box::new(RedData::new(self.inner.green.clone(), None, 0, TextSize::new(0), None, false))
        });
        SyntaxNode::new(self.clone(), NonNull::from(data))
    }

    pub fn source_text(&self) -> &SourceText {
        self.inner.text.get_or_init(|| Box::new(SourceText::new(self.inner.green.text())))
    }

    pub fn text(&self) -> &str {
        self.source_text().as_str()
    }

    pub fn path(&self) -> &Utf8Path {
        &self.inner.path
    }

    pub fn options(&self) -> &ParseOptions {
        &self.inner.options
    }

    pub fn full_span(&self) -> TextRange {
        TextRange::up_to(self.inner.green.full_width())
    }

    /// Reparses after replacing the whole text with `new_text`. Only the
    /// region that differs is reparsed.
    pub fn with_changed_text(
        &self,
        new_text: &str,
        cancel: &CancellationToken,
    ) -> Result<Self, ReparseError> {
        match TextChangeRange::between(self.text(), new_text) {
            None => Ok(self.clone()),
            Some(change) => self.reparse(change, new_text, cancel),
        }
    }

    /// Reparses after applying `changes`, given in this tree's coordinates.
    pub fn with_text_changes(
        &self,
        changes: &[TextChange],
        cancel: &CancellationToken,
    ) -> Result<Self, ReparseError> {
        let new_text = apply_changes(self.text(), changes);
        let mut ranges: Vec<TextChangeRange> =
            changes.iter().map(TextChange::change_range).collect();
        ranges.sort_by_key(|range| range.span.start());
        match TextChangeRange::collapse(&ranges) {
            Some(change) if !change.is_unchanged() => self.reparse(change, &new_text, cancel),
            _ => Ok(self.clone()),
        }
    }

    fn reparse(
        &self,
        change: TextChangeRange,
        new_text: &str,
        cancel: &CancellationToken,
    ) -> Result<Self, ReparseError> {
        let parser = self.inner.parser.clone().ok_or(ReparseError::NoParser)?;
        let result = if change.span == self.full_span() {
            tracing::debug!("change covers the whole text, parsing from scratch");
            parser.parse(new_text, &self.inner.options, cancel)?
        } else {
            parser.reparse(self, change, new_text, cancel)?
        };
        Ok(Self::from_parts(
            result.root,
            Some(SourceText::new(new_text)),
            self.inner.path.clone(),
            self.inner.options.clone(),
            Some(parser),
            Some(result.directives),
        ))
    }

    /// The minimal text changes that turn `old` into this tree.
    pub fn get_changes(&self, old: &Self) -> Vec<TextChange> {
        crate::diff::text_changes(old, self)
    }

    /// Ranges of this tree that may differ from `old`.
    pub fn get_changed_spans(&self, old: &Self) -> Vec<TextRange> {
        crate::diff::changed_spans(old, self)
    }

    /// Whether both trees have the same shape. With `top_level`, function
    /// bodies are not compared.
    pub fn is_equivalent_to(&self, other: &Self, top_level: bool) -> bool {
        crate::diff::are_equivalent(self.green(), other.green(), top_level)
    }

    pub fn get_line_span(&self, range: TextRange) -> FileLinePositionSpan {
        let text = self.source_text();
        FileLinePositionSpan {
            path: self.inner.path.to_string(),
            start: text.line_position(range.start()),
            end: text.line_position(range.end()),
            has_mapped_path: false,
        }
    }

    /// The span as remapped by `#line` directives.
    pub fn get_mapped_line_span(&self, range: TextRange) -> MappedLineSpan {
        self.line_map().map(self.source_text(), &self.inner.path, range)
    }

    pub fn has_hidden_regions(&self) -> bool {
        self.line_map().has_hidden_regions()
    }

    fn line_map(&self) -> &LineMap {
        self.inner.line_map.get_or_init(|| Box::new(LineMap::build(self)))
    }

    fn timeline(&self) -> &DirectiveTimeline {
        self.inner.directives.get_or_init(|| {
            let initial = DirectiveStack::with_symbols(&self.inner.options.preprocessor_symbols);
            Box::new(DirectiveTimeline::build(&self.inner.green, initial))
        })
    }

    /// Preprocessor state after every directive ending at or before `position`.
    pub fn directive_stack_at(&self, position: TextSize) -> DirectiveStack {
        self.timeline().at(position).clone()
    }

    pub fn directives_at_end(&self) -> DirectiveStack {
        match &self.inner.end_directives {
            Some(stack) => stack.clone(),
            None => self.directive_stack_at(self.inner.green.full_width()),
        }
    }

    pub fn is_preprocessor_symbol_defined(&self, name: &str, position: TextSize) -> bool {
        self.timeline().at(position).is_defined(name)
    }

    /// Whether warning `code` is reported at `position`.
    pub fn pragma_warning_state(&self, code: u16, position: TextSize) -> ReportState {
        self.inner.pragmas.get_or_init(|| Box::new(PragmaMap::build(self))).state(code, position)
    }
}

impl PartialEq for SyntaxTree {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for SyntaxTree {}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("path", &self.inner.path)
            .field("root", &self.inner.green)
            .finish_non_exhaustive()
    }
}
