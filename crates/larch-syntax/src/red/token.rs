use std::fmt;

use text_size::{TextRange, TextSize};

use crate::green::GreenToken;
use crate::{NodeOrToken, SyntaxKind, SyntaxNode, SyntaxTrivia};

/// A token handle: the shape token plus its located parent and position.
///
/// Tokens are not cached; two handles are equal when they denote the same
/// slot of the same located parent.
#[derive(Clone)]
pub struct SyntaxToken {
    parent: SyntaxNode,
    green: GreenToken,
    index: u32,
    offset: TextSize,
}

impl SyntaxToken {
    pub(crate) fn new(
        parent: SyntaxNode,
        green: GreenToken,
        index: usize,
        offset: TextSize,
    ) -> Self {
        Self { parent, green, index: index as u32, offset }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.green.kind()
    }

    pub fn green(&self) -> &GreenToken {
        &self.green
    }

    /// The token text without trivia.
    pub fn text(&self) -> &str {
        self.green.text()
    }

    pub fn is_missing(&self) -> bool {
        self.green.is_missing()
    }

    pub fn full_span(&self) -> TextRange {
        TextRange::at(self.offset, self.green.full_width())
    }

    pub fn span(&self) -> TextRange {
        TextRange::at(self.offset + self.green.leading().full_width(), self.green.width())
    }

    pub fn full_text(&self) -> &str {
        &self.parent.tree().source_text().as_str()[self.full_span()]
    }

    /// The immediate parent including list nodes.
    pub(crate) fn raw_parent(&self) -> &SyntaxNode {
        &self.parent
    }

    /// Slot index of this token within its raw parent.
    pub(crate) fn index(&self) -> usize {
        self.index as usize
    }

    /// The parent node, skipping list nodes.
    pub fn parent(&self) -> Option<SyntaxNode> {
        if self.parent.kind().is_list() { self.parent.parent() } else { Some(self.parent.clone()) }
    }

    /// Returns an iterator of parent nodes, starting from the immediate parent.
    pub fn parent_ancestors(&self) -> impl Iterator<Item = SyntaxNode> + Clone {
        std::iter::successors(self.parent(), SyntaxNode::parent)
    }

    pub fn leading_trivia(&self) -> impl ExactSizeIterator<Item = SyntaxTrivia> + '_ {
        self.trivia_list(true)
    }

    pub fn trailing_trivia(&self) -> impl ExactSizeIterator<Item = SyntaxTrivia> + '_ {
        self.trivia_list(false)
    }

    fn trivia_list(&self, leading: bool) -> impl ExactSizeIterator<Item = SyntaxTrivia> + '_ {
        let (list, mut offset) = if leading {
            (self.green.leading(), self.offset)
        } else {
            (self.green.trailing(), self.span().end())
        };
        list.pieces().iter().enumerate().map(move |(index, piece)| {
            let start = offset;
            offset += piece.full_width();
            SyntaxTrivia::new(self.clone(), piece.clone(), leading, index, start)
        })
    }

    /// Trivia piece `index` of the leading or trailing run.
    pub fn trivia(&self, leading: bool, index: usize) -> Option<SyntaxTrivia> {
        let list = if leading { self.green.leading() } else { self.green.trailing() };
        let piece = list.pieces().get(index)?;
        let base = if leading { self.offset } else { self.span().end() };
        let offset = base + list.offset_of(index);
        Some(SyntaxTrivia::new(self.clone(), piece.clone(), leading, index, offset))
    }

    /// The next token in document order, within the same tree or structure.
    pub fn next_token(&self) -> Option<Self> {
        let mut node = self.parent.clone();
        let mut slot = self.index() + 1;
        loop {
            for index in slot..node.slot_count() {
                let found = match node.child(index) {
                    Some(NodeOrToken::Node(child)) => child.first_token(),
                    Some(NodeOrToken::Token(token)) => Some(token),
                    None => None,
                };
                if found.is_some() {
                    return found;
                }
            }
            let parent = node.raw_parent()?;
            slot = node.index() + 1;
            node = parent;
        }
    }

    /// The previous token in document order, within the same tree or structure.
    pub fn prev_token(&self) -> Option<Self> {
        let mut node = self.parent.clone();
        let mut slot = self.index();
        loop {
            for index in (0..slot).rev() {
                let found = match node.child(index) {
                    Some(NodeOrToken::Node(child)) => child.last_token(),
                    Some(NodeOrToken::Token(token)) => Some(token),
                    None => None,
                };
                if found.is_some() {
                    return found;
                }
            }
            let parent = node.raw_parent()?;
            slot = node.index();
            node = parent;
        }
    }
}

impl PartialEq for SyntaxToken {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent && self.index == other.index
    }
}

impl Eq for SyntaxToken {}

impl std::hash::Hash for SyntaxToken {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.parent.hash(state);
        self.index.hash(state);
    }
}

impl fmt::Debug for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?} {:?}", self.kind(), self.span(), self.text())
    }
}

impl fmt::Display for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_text())
    }
}
