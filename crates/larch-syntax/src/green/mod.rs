//! The shape layer: immutable, position-independent nodes, tokens and trivia.

mod diagnostic;
mod flags;
mod node;
mod token;
mod trivia;

use text_size::TextSize;

pub use self::diagnostic::{GreenDiagnostic, SyntaxAnnotation};
pub use self::flags::NodeFlags;
pub use self::node::{GreenNode, LOTS_OF_CHILDREN_THRESHOLD};
pub use self::token::GreenToken;
pub use self::trivia::{GreenTrivia, GreenTriviaList};
use crate::{NodeOrToken, SyntaxKind};

pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;

impl GreenElement {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    pub fn full_width(&self) -> TextSize {
        match self {
            NodeOrToken::Node(node) => node.full_width(),
            NodeOrToken::Token(token) => token.full_width(),
        }
    }

    pub fn flags(&self) -> NodeFlags {
        match self {
            NodeOrToken::Node(node) => node.flags(),
            NodeOrToken::Token(token) => token.flags(),
        }
    }

    pub fn diagnostics(&self) -> &[GreenDiagnostic] {
        match self {
            NodeOrToken::Node(node) => node.diagnostics(),
            NodeOrToken::Token(token) => token.diagnostics(),
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NodeOrToken::Node(this), NodeOrToken::Node(other)) => this.ptr_eq(other),
            (NodeOrToken::Token(this), NodeOrToken::Token(other)) => this.ptr_eq(other),
            _ => false,
        }
    }

    pub fn write_to(&self, out: &mut String) {
        match self {
            NodeOrToken::Node(node) => node.write_to(out),
            NodeOrToken::Token(token) => token.write_to(out),
        }
    }
}

impl From<GreenNode> for GreenElement {
    fn from(node: GreenNode) -> Self {
        NodeOrToken::Node(node)
    }
}

impl From<GreenToken> for GreenElement {
    fn from(token: GreenToken) -> Self {
        NodeOrToken::Token(token)
    }
}
