//! Parser for larch's reference language, full and incremental.

use std::sync::Arc;

use incremental::Incremental;
use larch_syntax::{
    CancellationToken, Cancelled, DirectiveStack, LanguageParser, ParseOptions, ParseResult,
    SyntaxTree, TextChangeRange,
};

mod grammar;
mod incremental;
mod parser;
#[cfg(test)]
mod tests;

pub fn parse(
    text: &str,
    options: &ParseOptions,
    cancel: &CancellationToken,
) -> Result<ParseResult, Cancelled> {
    let directives = DirectiveStack::with_symbols(&options.preprocessor_symbols);
    let mut parser = parser::Parser::new(text, directives, cancel);
    grammar::items::compilation_unit(&mut parser);
    parser.finish()
}

/// Parses `new_text`, which is `old`'s text with `change` applied, sharing
/// every old node that is bound to parse the same.
pub fn reparse(
    old: &SyntaxTree,
    change: TextChangeRange,
    new_text: &str,
    cancel: &CancellationToken,
) -> Result<ParseResult, Cancelled> {
    let directives = DirectiveStack::with_symbols(&old.options().preprocessor_symbols);
    let mut parser = parser::Parser::new(new_text, directives, cancel)
        .with_incremental(Incremental::new(old, change, new_text));
    grammar::items::compilation_unit(&mut parser);
    parser.finish()
}

/// The reference language plugged into [`SyntaxTree`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LarchParser;

impl LanguageParser for LarchParser {
    fn parse(
        &self,
        text: &str,
        options: &ParseOptions,
        cancel: &CancellationToken,
    ) -> Result<ParseResult, Cancelled> {
        parse(text, options, cancel)
    }

    fn reparse(
        &self,
        old: &SyntaxTree,
        change: TextChangeRange,
        new_text: &str,
        cancel: &CancellationToken,
    ) -> Result<ParseResult, Cancelled> {
        reparse(old, change, new_text, cancel)
    }
}

/// Parses `text` into a tree that reparses itself with [`LarchParser`].
pub fn parse_tree(text: &str, options: ParseOptions) -> SyntaxTree {
    match SyntaxTree::parse(text, options, Arc::new(LarchParser), &CancellationToken::none()) {
        Ok(tree) => tree,
        Err(Cancelled) => unreachable!("parsing without a cancellation token cannot be cancelled"),
    }
}
