//! Persistent, lossless syntax trees with incremental reparsing.
//!
//! A tree has two layers. The green layer is an immutable, position-free
//! shape tree whose nodes are shared between tree versions. The red layer
//! wraps it lazily with parents and absolute offsets. Edits never mutate a
//! tree; they produce a new one that shares every untouched green node.

mod builder;
mod cancel;
mod diagnostics;
mod diff;
mod directives;
mod error;
/// Shape-only building blocks shared between trees.
pub mod green;
mod line_map;
mod list_edit;
mod options;
mod pragma;
mod red;
mod replace;
mod syntax;
mod syntax_kind;
mod syntax_set;
mod text;
mod tree;

/// Event-driven construction of green trees.
pub use builder::GreenBuilder;
pub use cancel::{CancellationToken, Cancelled};
pub use diagnostics::Diagnostics;
pub use diff::MAX_SEARCH_LENGTH;
/// Preprocessor state threaded through a file.
pub use directives::{Directive, DirectiveStack, evaluate};
pub use error::{EditError, ParseFileError, ReparseError};
pub use larch_errors::{Diagnostic, ErrorCode, Severity};
pub use options::ParseOptions;
pub use pragma::ReportState;
/// Positioned views over the green layer.
pub use red::{
    SeparatedSyntaxList, SyntaxList, SyntaxListIter, SyntaxNode, SyntaxToken, SyntaxTrivia,
};
pub use syntax::{
    Children, ChildrenWithTokens, ChildrenWithTokensAndLists, NodeOrToken, NodeOrTokenOrList,
    Preorder, PreorderWithTokens, SyntaxElement, TokenAtOffset, WalkEvent, WalkEventWithTokens,
};
/// Token and node kinds of the language.
pub use syntax_kind::{ListShape, SyntaxKind};
pub use syntax_set::SyntaxSet;
pub use text::{
    FileLinePositionSpan, LinePosition, MappedLineSpan, SourceText, TextChange, TextChangeRange,
    apply_changes,
};
pub use text_size::{TextLen, TextRange, TextSize};
pub use tree::{LanguageParser, ParseResult, SyntaxTree};
