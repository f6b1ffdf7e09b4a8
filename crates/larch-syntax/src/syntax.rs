//! Element enums and child/preorder iterators over located nodes.

use std::fmt;

use crate::{SyntaxList, SyntaxListIter, SyntaxNode, SyntaxToken};

/// Node or token element inside the tree.
pub type SyntaxElement = NodeOrToken<SyntaxNode, SyntaxToken>;

impl SyntaxElement {
    pub fn kind(&self) -> crate::SyntaxKind {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    pub fn full_span(&self) -> text_size::TextRange {
        match self {
            NodeOrToken::Node(node) => node.full_span(),
            NodeOrToken::Token(token) => token.full_span(),
        }
    }

    pub fn span(&self) -> text_size::TextRange {
        match self {
            NodeOrToken::Node(node) => node.span(),
            NodeOrToken::Token(token) => token.span(),
        }
    }

    /// The parent, skipping list nodes.
    pub fn parent(&self) -> Option<SyntaxNode> {
        match self {
            NodeOrToken::Node(node) => node.parent(),
            NodeOrToken::Token(token) => token.parent(),
        }
    }
}

/// Child element that may be a node, token, or list.
#[derive(Clone, Debug)]
pub enum NodeOrTokenOrList {
    Node(SyntaxNode),
    Token(SyntaxToken),
    List(SyntaxList),
}

/// Iterator over children including tokens and lists.
///
/// Declared list slots are yielded as lists even when they are empty; other
/// empty slots are skipped.
#[derive(Clone)]
pub struct ChildrenWithTokensAndLists {
    parent: SyntaxNode,
    front: usize,
    back: usize,
}

impl ChildrenWithTokensAndLists {
    pub(crate) fn new(parent: SyntaxNode) -> Self {
        let back = parent.slot_count();
        Self { parent, front: 0, back }
    }

    fn map_child(&self, slot: usize) -> Option<NodeOrTokenOrList> {
        if self.parent.kind().slot_list_shape(slot).is_some() {
            return Some(NodeOrTokenOrList::List(SyntaxList::new(self.parent.clone(), slot)));
        }
        match self.parent.child(slot)? {
            NodeOrToken::Node(node) => Some(NodeOrTokenOrList::Node(node)),
            NodeOrToken::Token(token) => Some(NodeOrTokenOrList::Token(token)),
        }
    }
}

impl Iterator for ChildrenWithTokensAndLists {
    type Item = NodeOrTokenOrList;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        while self.front < self.back {
            let slot = self.front;
            self.front += 1;
            if let Some(child) = self.map_child(slot) {
                return Some(child);
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.back - self.front))
    }
}

impl DoubleEndedIterator for ChildrenWithTokensAndLists {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        while self.front < self.back {
            self.back -= 1;
            if let Some(child) = self.map_child(self.back) {
                return Some(child);
            }
        }
        None
    }
}

/// Iterator over children including tokens, flattening list nodes.
#[derive(Clone)]
pub struct ChildrenWithTokens {
    active_list_iter: Option<SyntaxListIter>,
    children: ChildrenWithTokensAndLists,
}

impl ChildrenWithTokens {
    pub(crate) fn new(parent: SyntaxNode) -> Self {
        Self { active_list_iter: None, children: ChildrenWithTokensAndLists::new(parent) }
    }
}

impl Iterator for ChildrenWithTokens {
    type Item = SyntaxElement;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(list_iter) = &mut self.active_list_iter {
                match list_iter.next() {
                    Some(list_item) => return Some(list_item),
                    None => self.active_list_iter = None,
                }
            }

            match self.children.next()? {
                NodeOrTokenOrList::Node(it) => return Some(SyntaxElement::Node(it)),
                NodeOrTokenOrList::Token(it) => return Some(SyntaxElement::Token(it)),
                NodeOrTokenOrList::List(it) => self.active_list_iter = Some(it.iter()),
            }
        }
    }
}

/// Iterator over child nodes only.
#[derive(Clone)]
pub struct Children {
    inner: ChildrenWithTokens,
}

impl Children {
    pub(crate) fn new(parent: SyntaxNode) -> Self {
        Self { inner: ChildrenWithTokens::new(parent) }
    }
}

impl Iterator for Children {
    type Item = SyntaxNode;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.find_map(NodeOrToken::into_node)
    }
}

/// Preorder traversal over nodes.
#[derive(Clone)]
pub struct Preorder {
    inner: PreorderWithTokens,
}

impl Preorder {
    #[inline]
    pub(crate) fn new(start: SyntaxNode) -> Self {
        Self { inner: PreorderWithTokens::new(start) }
    }

    /// Skips the current subtree during traversal.
    #[inline]
    pub fn skip_subtree(&mut self) {
        self.inner.skip_subtree();
    }
}

impl Iterator for Preorder {
    type Item = WalkEvent;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.find_map(|item| match item {
            WalkEventWithTokens::EnterNode(it) => Some(WalkEvent::Enter(it)),
            WalkEventWithTokens::LeaveNode(it) => Some(WalkEvent::Leave(it)),
            WalkEventWithTokens::Token(_) => None,
        })
    }
}

#[derive(Clone, Debug)]
pub enum WalkEvent {
    Enter(SyntaxNode),
    Leave(SyntaxNode),
}

/// Preorder traversal over nodes and tokens.
#[derive(Clone)]
pub struct PreorderWithTokens {
    stack: Vec<(SyntaxNode, ChildrenWithTokens)>,
    root: Option<SyntaxNode>,
}

impl PreorderWithTokens {
    #[inline]
    pub(crate) fn new(start: SyntaxNode) -> Self {
        Self { stack: Vec::with_capacity(128), root: Some(start) }
    }

    /// Skips the current subtree during traversal.
    #[inline]
    pub fn skip_subtree(&mut self) {
        assert!(self.stack.pop().is_some(), "must have a subtree to skip");
    }
}

impl Iterator for PreorderWithTokens {
    type Item = WalkEventWithTokens;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let Some((_, children)) = self.stack.last_mut() else {
            let root = self.root.take()?;
            self.stack.push((root.clone(), root.children_with_tokens()));
            return Some(WalkEventWithTokens::EnterNode(root));
        };
        let event = match children.next() {
            Some(NodeOrToken::Token(token)) => WalkEventWithTokens::Token(token),
            Some(NodeOrToken::Node(node)) => {
                self.stack.push((node.clone(), node.children_with_tokens()));
                WalkEventWithTokens::EnterNode(node)
            }
            None => match self.stack.pop() {
                Some((node, _)) => WalkEventWithTokens::LeaveNode(node),
                None => unreachable!("the stack was not empty"),
            },
        };
        Some(event)
    }
}

#[derive(Clone, Debug)]
pub enum WalkEventWithTokens {
    EnterNode(SyntaxNode),
    LeaveNode(SyntaxNode),
    Token(SyntaxToken),
}

/// Either a node or a token, for green and located elements alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeOrToken<N, T> {
    Node(N),
    Token(T),
}

impl<N, T> NodeOrToken<N, T> {
    pub fn into_node(self) -> Option<N> {
        if let Self::Node(node) = self { Some(node) } else { None }
    }

    pub fn into_token(self) -> Option<T> {
        if let Self::Token(token) = self { Some(token) } else { None }
    }

    pub fn as_node(&self) -> Option<&N> {
        self.as_ref().into_node()
    }

    pub fn as_token(&self) -> Option<&T> {
        self.as_ref().into_token()
    }

    pub fn as_ref(&self) -> NodeOrToken<&N, &T> {
        match self {
            Self::Node(node) => NodeOrToken::Node(node),
            Self::Token(token) => NodeOrToken::Token(token),
        }
    }
}

impl<N: fmt::Display, T: fmt::Display> fmt::Display for NodeOrToken<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(node) => write!(f, "{node}"),
            Self::Token(token) => write!(f, "{token}"),
        }
    }
}

/// Tokens touching an offset. An offset on the boundary of two tokens
/// touches both.
#[derive(Clone, Debug)]
pub enum TokenAtOffset<T> {
    None,
    Single(T),
    Between(T, T),
}

impl<T> TokenAtOffset<T> {
    /// The token ending at the offset wins a tie.
    pub fn left_biased(mut self) -> Option<T> {
        self.next()
    }

    /// The token starting at the offset wins a tie.
    pub fn right_biased(self) -> Option<T> {
        self.last()
    }
}

impl<T> Iterator for TokenAtOffset<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let (first, rest) = match std::mem::replace(self, Self::None) {
            Self::None => return None,
            Self::Single(token) => (token, Self::None),
            Self::Between(left, right) => (left, Self::Single(right)),
        };
        *self = rest;
        Some(first)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = match self {
            Self::None => 0,
            Self::Single(_) => 1,
            Self::Between(..) => 2,
        };
        (len, Some(len))
    }
}

impl<T> ExactSizeIterator for TokenAtOffset<T> {}
