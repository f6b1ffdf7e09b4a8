//! Lazy enumeration of the diagnostics stored in a subtree.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use larch_errors::Diagnostic;
use text_size::{TextRange, TextSize};

use crate::green::{GreenDiagnostic, GreenElement, GreenTrivia, NodeFlags};
use crate::{NodeOrToken, SyntaxNode, SyntaxToken, SyntaxTree, SyntaxTrivia};

#[derive(Clone)]
enum Item {
    Element(GreenElement, TextSize),
    Trivia(GreenTrivia, TextSize),
}

impl Item {
    fn offset(&self) -> TextSize {
        match self {
            Self::Element(_, offset) | Self::Trivia(_, offset) => *offset,
        }
    }
}

#[derive(Clone)]
struct Pending {
    diagnostic: Diagnostic,
    seq: u32,
}

impl Pending {
    fn key(&self) -> (TextSize, u32) {
        (self.diagnostic.range().start(), self.seq)
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Diagnostics of a subtree in order of their start position.
///
/// Branches without diagnostics are skipped without descending. Cloning the
/// iterator restarts from the clone's position.
#[derive(Clone)]
pub struct Diagnostics {
    stack: Vec<Item>,
    pending: BinaryHeap<Reverse<Pending>>,
    seq: u32,
}

impl Diagnostics {
    fn new(item: Item) -> Self {
        Self { stack: vec![item], pending: BinaryHeap::new(), seq: 0 }
    }

    fn hold(&mut self, diagnostics: &[GreenDiagnostic], owner: TextRange) {
        for diagnostic in diagnostics {
            let diagnostic = diagnostic.resolve(owner);
            self.pending.push(Reverse(Pending { diagnostic, seq: self.seq }));
            self.seq += 1;
        }
    }

    fn expand(&mut self, item: Item) {
        match item {
            Item::Element(NodeOrToken::Node(node), offset) => {
                if !node.flags().contains(NodeFlags::CONTAINS_DIAGNOSTICS) {
                    return;
                }
                self.hold(node.diagnostics(), TextRange::at(offset, node.full_width()));
                let mut children = Vec::new();
                let mut child_offset = offset;
                for child in node.slots().flatten() {
                    children.push(Item::Element(child.clone(), child_offset));
                    child_offset += child.full_width();
                }
                self.stack.extend(children.into_iter().rev());
            }
            Item::Element(NodeOrToken::Token(token), offset) => {
                if !token.flags().contains(NodeFlags::CONTAINS_DIAGNOSTICS) {
                    return;
                }
                self.hold(token.diagnostics(), TextRange::at(offset, token.full_width()));
                let mut trivia = Vec::new();
                let mut position = offset;
                for piece in token.leading().pieces() {
                    trivia.push(Item::Trivia(piece.clone(), position));
                    position += piece.full_width();
                }
                position += token.width();
                for piece in token.trailing().pieces() {
                    trivia.push(Item::Trivia(piece.clone(), position));
                    position += piece.full_width();
                }
                self.stack.extend(trivia.into_iter().rev());
            }
            Item::Trivia(piece, offset) => {
                if !piece.flags().contains(NodeFlags::CONTAINS_DIAGNOSTICS) {
                    return;
                }
                self.hold(piece.diagnostics(), TextRange::at(offset, piece.full_width()));
                if let Some(structure) = piece.structure() {
                    self.stack.push(Item::Element(NodeOrToken::Node(structure.clone()), offset));
                }
            }
        }
    }
}

impl Iterator for Diagnostics {
    type Item = Diagnostic;

    fn next(&mut self) -> Option<Diagnostic> {
        loop {
            // Everything still on the stack starts at or after its top.
            let frontier = self.stack.last().map(Item::offset);
            if let Some(Reverse(first)) = self.pending.peek()
                && frontier.is_none_or(|frontier| first.diagnostic.range().start() <= frontier)
            {
                return self.pending.pop().map(|Reverse(pending)| pending.diagnostic);
            }
            let item = self.stack.pop()?;
            self.expand(item);
        }
    }
}

impl SyntaxTree {
    /// Every diagnostic in the tree.
    pub fn diagnostics(&self) -> Diagnostics {
        self.root().diagnostics()
    }
}

impl SyntaxNode {
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(Item::Element(NodeOrToken::Node(self.green().clone()), self.offset()))
    }
}

impl SyntaxToken {
    /// Diagnostics of the token and its trivia.
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(Item::Element(
            NodeOrToken::Token(self.green().clone()),
            self.full_span().start(),
        ))
    }
}

impl SyntaxTrivia {
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(Item::Trivia(self.green().clone(), self.full_span().start()))
    }
}

#[cfg(test)]
mod tests {
    use larch_errors::ErrorCode;

    use super::*;
    use crate::green::{GreenNode, GreenToken, GreenTriviaList};
    use crate::{ParseOptions, SyntaxKind};

    fn token(kind: SyntaxKind, text: &str) -> GreenToken {
        GreenToken::new(GreenTriviaList::empty(), kind, text, GreenTriviaList::empty())
    }

    fn rendered(diagnostics: Diagnostics) -> Vec<String> {
        diagnostics.map(|diagnostic| diagnostic.to_string()).collect()
    }

    #[test]
    fn node_diagnostics_are_interleaved_by_position() {
        let name = token(SyntaxKind::NAME, "x");
        let semicolon = GreenToken::missing(SyntaxKind::SEMICOLON).with_diagnostics(vec![
            GreenDiagnostic::whole(ErrorCode::TokenExpected, &[";"], TextSize::new(0)),
        ]);
        // The node reports a problem at its end, after its children's.
        let stmt = GreenNode::new(
            SyntaxKind::EXPR_STMT,
            [
                Some(GreenNode::new(SyntaxKind::NAME_EXPR, [Some(name.into())]).into()),
                Some(semicolon.into()),
            ],
        )
        .with_diagnostics(vec![
            GreenDiagnostic::new(
                ErrorCode::ExpressionExpected,
                &[],
                TextSize::new(1),
                TextSize::new(0),
            ),
            GreenDiagnostic::whole(ErrorCode::UnexpectedToken, &["x"], TextSize::new(1)),
        ]);
        let unexpected = GreenDiagnostic::whole(ErrorCode::UnexpectedCharacter, &["@"], 1.into());
        let leading =
            GreenTrivia::new(SyntaxKind::WHITESPACE, " ").with_diagnostics(vec![unexpected]);
        let eof = GreenToken::new(
            GreenTriviaList::new([leading]),
            SyntaxKind::EOF,
            "",
            GreenTriviaList::empty(),
        );
        let unit = GreenNode::new(
            SyntaxKind::COMPILATION_UNIT,
            [Some(stmt.into()), Some(eof.into())],
        );
        let tree = SyntaxTree::new(unit, ParseOptions::default());

        let starts: Vec<TextSize> =
            tree.diagnostics().map(|diagnostic| diagnostic.range().start()).collect();
        assert!(starts.is_sorted());
        assert_eq!(rendered(tree.diagnostics()).len(), 4);

        let first = tree.diagnostics().next().unwrap();
        assert_eq!(first.code(), ErrorCode::UnexpectedToken);
        assert_eq!(first.range(), TextRange::up_to(TextSize::new(1)));
    }

    #[test]
    fn clean_subtrees_yield_nothing() {
        let unit = GreenNode::new(
            SyntaxKind::COMPILATION_UNIT,
            [None, Some(token(SyntaxKind::EOF, "").into())],
        );
        let tree = SyntaxTree::new(unit, ParseOptions::default());
        assert_eq!(tree.diagnostics().count(), 0);
    }

    #[test]
    fn clones_restart_independently() {
        let eof = token(SyntaxKind::EOF, "").with_diagnostics(vec![
            GreenDiagnostic::whole(ErrorCode::EndifDirectiveExpected, &[], TextSize::new(0)),
        ]);
        let unit = GreenNode::new(SyntaxKind::COMPILATION_UNIT, [None, Some(eof.into())]);
        let tree = SyntaxTree::new(unit, ParseOptions::default());
        let mut diagnostics = tree.diagnostics();
        let restart = diagnostics.clone();
        assert!(diagnostics.next().is_some());
        assert!(diagnostics.next().is_none());
        assert_eq!(restart.count(), 1);
    }
}
