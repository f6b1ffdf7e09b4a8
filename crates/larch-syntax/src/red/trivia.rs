use std::fmt;

use text_size::{TextRange, TextSize};

use crate::green::GreenTrivia;
use crate::{SyntaxKind, SyntaxNode, SyntaxToken};

/// A trivia handle: one piece of a token's leading or trailing run.
#[derive(Clone)]
pub struct SyntaxTrivia {
    token: SyntaxToken,
    green: GreenTrivia,
    leading: bool,
    index: u32,
    offset: TextSize,
}

impl SyntaxTrivia {
    pub(crate) fn new(
        token: SyntaxToken,
        green: GreenTrivia,
        leading: bool,
        index: usize,
        offset: TextSize,
    ) -> Self {
        Self { token, green, leading, index: index as u32, offset }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.green.kind()
    }

    pub fn green(&self) -> &GreenTrivia {
        &self.green
    }

    /// The token this trivia is attached to.
    pub fn token(&self) -> &SyntaxToken {
        &self.token
    }

    pub fn is_leading(&self) -> bool {
        self.leading
    }

    /// Position within the leading or trailing run.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn full_span(&self) -> TextRange {
        TextRange::at(self.offset, self.green.full_width())
    }

    pub fn text(&self) -> &str {
        &self.token.raw_parent().tree().source_text().as_str()[self.full_span()]
    }

    pub fn is_directive(&self) -> bool {
        self.kind().is_directive()
    }

    pub fn has_structure(&self) -> bool {
        self.green.structure().is_some()
    }

    /// The located root of the structure held by this trivia. Repeated calls
    /// return the same node.
    pub fn structure(&self) -> Option<SyntaxNode> {
        self.token.raw_parent().structure_root(
            self.token.index(),
            self.leading,
            self.index(),
            self.offset,
        )
    }
}

impl PartialEq for SyntaxTrivia {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token && self.leading == other.leading && self.index == other.index
    }
}

impl Eq for SyntaxTrivia {}

impl std::hash::Hash for SyntaxTrivia {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.token.hash(state);
        self.leading.hash(state);
        self.index.hash(state);
    }
}

impl fmt::Debug for SyntaxTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.full_span())
    }
}

impl fmt::Display for SyntaxTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
