//! Preprocessor state: the persistent directive stack, expression evaluation,
//! and the per-tree timeline of directive states.

use std::fmt;
use std::sync::Arc;

use text_size::TextSize;

use crate::green::{GreenElement, GreenNode, NodeFlags};
use crate::{NodeOrToken, SyntaxKind};

/// One directive's effect on preprocessor state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Directive {
    Define(Box<str>),
    Undef(Box<str>),
    /// `is_active` is whether the enclosing region is active; `branch_taken`
    /// whether this branch's body is.
    If { is_active: bool, branch_taken: bool },
    Elif { is_active: bool, branch_taken: bool },
    Else { is_active: bool, branch_taken: bool },
    Endif,
}

impl Directive {
    fn branch(&self) -> Option<(bool, bool)> {
        match *self {
            Self::If { is_active, branch_taken }
            | Self::Elif { is_active, branch_taken }
            | Self::Else { is_active, branch_taken } => Some((is_active, branch_taken)),
            _ => None,
        }
    }
}

struct Link {
    directive: Directive,
    next: Option<Arc<Link>>,
}

/// An immutable stack of directives. Pushing shares the existing tail, so
/// every position in a file can keep its own state cheaply.
#[derive(Clone, Default)]
pub struct DirectiveStack {
    head: Option<Arc<Link>>,
}

impl DirectiveStack {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A stack with `symbols` defined.
    pub fn with_symbols<S: AsRef<str>>(symbols: impl IntoIterator<Item = S>) -> Self {
        symbols.into_iter().fold(Self::empty(), |stack, symbol| {
            stack.push(Directive::Define(symbol.as_ref().into()))
        })
    }

    fn iter(&self) -> impl Iterator<Item = &Directive> {
        std::iter::successors(self.head.as_deref(), |link| link.next.as_deref())
            .map(|link| &link.directive)
    }

    fn cons(&self, directive: Directive) -> Self {
        Self { head: Some(Arc::new(Link { directive, next: self.head.clone() })) }
    }

    /// Adds `directive`. An `#endif` closes the innermost `#if` group,
    /// keeping the definitions made inside it.
    pub fn push(&self, directive: Directive) -> Self {
        match directive {
            Directive::Endif => self.complete_if(),
            directive => self.cons(directive),
        }
    }

    fn complete_if(&self) -> Self {
        let mut kept = Vec::new();
        let mut link = self.head.as_deref();
        while let Some(current) = link {
            match &current.directive {
                Directive::If { .. } => {
                    let base = Self { head: current.next.clone() };
                    return kept
                        .into_iter()
                        .rev()
                        .fold(base, |stack, directive| stack.cons(directive));
                }
                Directive::Define(_) | Directive::Undef(_) => kept.push(current.directive.clone()),
                _ => {}
            }
            link = current.next.as_deref();
        }
        self.clone()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.iter()
            .find_map(|directive| match directive {
                Directive::Define(symbol) if &**symbol == name => Some(true),
                Directive::Undef(symbol) if &**symbol == name => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    fn top_branch(&self) -> Option<&Directive> {
        self.iter().find(|directive| directive.branch().is_some())
    }

    pub fn has_unfinished_if(&self) -> bool {
        self.top_branch().is_some()
    }

    /// The innermost open group is still accepting `#elif` and `#else`.
    pub fn has_previous_if_or_elif(&self) -> bool {
        matches!(self.top_branch(), Some(Directive::If { .. } | Directive::Elif { .. }))
    }

    /// Some branch of the innermost open group has been taken.
    pub fn previous_branch_taken(&self) -> bool {
        for directive in self.iter() {
            match directive {
                Directive::If { branch_taken, .. } => return *branch_taken,
                Directive::Elif { branch_taken: true, .. }
                | Directive::Else { branch_taken: true, .. } => return true,
                _ => {}
            }
        }
        false
    }

    /// Whether text at this point is compiled.
    pub fn is_active(&self) -> bool {
        self.top_branch()
            .and_then(Directive::branch)
            .is_none_or(|(is_active, branch_taken)| is_active && branch_taken)
    }

    /// Whether the region around the innermost open group is compiled.
    fn enclosing_active(&self) -> bool {
        self.top_branch().and_then(Directive::branch).is_none_or(|(is_active, _)| is_active)
    }

    /// Interprets a directive node against this state.
    pub fn apply(&self, node: &GreenNode) -> Self {
        let directive = match node.kind() {
            SyntaxKind::DEFINE_DIRECTIVE | SyntaxKind::UNDEF_DIRECTIVE if self.is_active() => {
                let Some(name) = directive_name(node) else { return self.clone() };
                if node.kind() == SyntaxKind::DEFINE_DIRECTIVE {
                    Directive::Define(name.into())
                } else {
                    Directive::Undef(name.into())
                }
            }
            SyntaxKind::IF_DIRECTIVE => {
                let is_active = self.is_active();
                let branch_taken = is_active && self.evaluate_slot(node, 2);
                Directive::If { is_active, branch_taken }
            }
            SyntaxKind::ELIF_DIRECTIVE if self.has_previous_if_or_elif() => {
                let is_active = self.enclosing_active();
                let branch_taken =
                    is_active && !self.previous_branch_taken() && self.evaluate_slot(node, 2);
                Directive::Elif { is_active, branch_taken }
            }
            SyntaxKind::ELSE_DIRECTIVE if self.has_previous_if_or_elif() => {
                let is_active = self.enclosing_active();
                let branch_taken = is_active && !self.previous_branch_taken();
                Directive::Else { is_active, branch_taken }
            }
            SyntaxKind::ENDIF_DIRECTIVE if self.has_unfinished_if() => Directive::Endif,
            _ => return self.clone(),
        };
        self.push(directive)
    }

    fn evaluate_slot(&self, node: &GreenNode, slot: usize) -> bool {
        match node.slot(slot) {
            Some(NodeOrToken::Node(expr)) => evaluate(expr, self),
            _ => false,
        }
    }
}

fn directive_name(node: &GreenNode) -> Option<&str> {
    match node.slot(2)? {
        NodeOrToken::Token(token) if !token.is_missing() => Some(token.text()),
        _ => None,
    }
}

/// Evaluates a preprocessor condition. Malformed expressions are false.
pub fn evaluate(expr: &GreenNode, stack: &DirectiveStack) -> bool {
    let operand = |slot: usize| match expr.slot(slot) {
        Some(NodeOrToken::Node(node)) => evaluate(node, stack),
        _ => false,
    };
    let token = |slot: usize| match expr.slot(slot) {
        Some(NodeOrToken::Token(token)) if !token.is_missing() => Some(token.kind()),
        _ => None,
    };
    match expr.kind() {
        SyntaxKind::NAME_EXPR => match expr.slot(0) {
            Some(NodeOrToken::Token(name)) if !name.is_missing() => stack.is_defined(name.text()),
            _ => false,
        },
        SyntaxKind::LITERAL => token(0) == Some(SyntaxKind::TRUE_KW),
        SyntaxKind::PAREN_EXPR => operand(1),
        SyntaxKind::PREFIX_EXPR => token(0) == Some(SyntaxKind::BANG) && !operand(1),
        SyntaxKind::BINARY_EXPR => match token(1) {
            Some(SyntaxKind::PIPE2) => operand(0) || operand(2),
            Some(SyntaxKind::AMP2) => operand(0) && operand(2),
            Some(SyntaxKind::EQ2) => operand(0) == operand(2),
            Some(SyntaxKind::BANG_EQ) => operand(0) != operand(2),
            _ => false,
        },
        _ => false,
    }
}

impl PartialEq for DirectiveStack {
    fn eq(&self, other: &Self) -> bool {
        let mut left = self.head.as_ref();
        let mut right = other.head.as_ref();
        loop {
            match (left, right) {
                (None, None) => return true,
                (Some(l), Some(r)) if Arc::ptr_eq(l, r) => return true,
                (Some(l), Some(r)) if l.directive == r.directive => {
                    left = l.next.as_ref();
                    right = r.next.as_ref();
                }
                _ => return false,
            }
        }
    }
}

impl Eq for DirectiveStack {}

impl fmt::Debug for DirectiveStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Every directive trivia below `root`, with the absolute start of its
/// trivia, in document order. Subtrees without directives are skipped.
pub(crate) fn directive_trivia(root: &GreenNode) -> Vec<(TextSize, GreenNode)> {
    let mut found = Vec::new();
    let mut stack: Vec<(GreenElement, TextSize)> =
        vec![(NodeOrToken::Node(root.clone()), TextSize::new(0))];
    while let Some((element, offset)) = stack.pop() {
        if !element.flags().contains(NodeFlags::CONTAINS_DIRECTIVES) {
            continue;
        }
        match element {
            NodeOrToken::Node(node) => {
                let mut children = Vec::with_capacity(node.slot_count());
                let mut child_offset = offset;
                for child in node.slots().flatten() {
                    children.push((child.clone(), child_offset));
                    child_offset += child.full_width();
                }
                stack.extend(children.into_iter().rev());
            }
            NodeOrToken::Token(token) => {
                // Directives start a line, so they only ever lead a token.
                let mut position = offset;
                for piece in token.leading().pieces() {
                    if piece.kind().is_directive()
                        && let Some(structure) = piece.structure()
                    {
                        found.push((position, structure.clone()));
                    }
                    position += piece.full_width();
                }
            }
        }
    }
    found
}

/// Directive states over a whole tree, searchable by position.
pub(crate) struct DirectiveTimeline {
    initial: DirectiveStack,
    /// End offsets of directives, ascending.
    positions: Vec<TextSize>,
    states: Vec<DirectiveStack>,
}

impl DirectiveTimeline {
    pub(crate) fn build(root: &GreenNode, initial: DirectiveStack) -> Self {
        let mut positions = Vec::new();
        let mut states = Vec::new();
        let mut state = initial.clone();
        for (start, node) in directive_trivia(root) {
            state = state.apply(&node);
            positions.push(start + node.full_width());
            states.push(state.clone());
        }
        tracing::trace!(directives = positions.len(), "built directive timeline");
        Self { initial, positions, states }
    }

    /// The state in effect at `position`: after every directive ending at or
    /// before it.
    pub(crate) fn at(&self, position: TextSize) -> &DirectiveStack {
        match self.positions.partition_point(|&end| end <= position) {
            0 => &self.initial,
            index => &self.states[index - 1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_with(directives: impl IntoIterator<Item = Directive>) -> DirectiveStack {
        directives
            .into_iter()
            .fold(DirectiveStack::empty(), |stack, directive| stack.push(directive))
    }

    #[test]
    fn later_definitions_win() {
        let stack = stack_with([Directive::Define("A".into()), Directive::Undef("A".into())]);
        assert!(!stack.is_defined("A"));
        assert!(DirectiveStack::with_symbols(["A"]).is_defined("A"));
    }

    #[test]
    fn endif_keeps_definitions_made_inside_the_group() {
        let stack = stack_with([
            Directive::If { is_active: true, branch_taken: true },
            Directive::Define("X".into()),
            Directive::Endif,
        ]);
        assert!(stack.is_defined("X"));
        assert!(!stack.has_unfinished_if());
        assert!(stack.is_active());
    }

    #[test]
    fn branches_track_activity() {
        let stack = stack_with([Directive::If { is_active: true, branch_taken: false }]);
        assert!(!stack.is_active());
        assert!(!stack.previous_branch_taken());

        let stack = stack.push(Directive::Else { is_active: true, branch_taken: true });
        assert!(stack.is_active());
        assert!(stack.previous_branch_taken());
        assert!(!stack.has_previous_if_or_elif());
    }

    #[test]
    fn equal_contents_compare_equal() {
        let left = DirectiveStack::with_symbols(["A", "B"]);
        let right = DirectiveStack::with_symbols(["A", "B"]);
        assert_eq!(left, right);
        assert_ne!(left, DirectiveStack::with_symbols(["A"]));
    }
}
