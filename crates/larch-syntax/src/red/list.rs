use std::fmt;

use text_size::{TextRange, TextSize};

use crate::{NodeOrToken, SyntaxElement, SyntaxNode, SyntaxToken};

/// A view over one list slot of a node.
///
/// The slot may hold nothing, a single element, or a `LIST` node; the view
/// hides the difference.
#[derive(Clone)]
pub struct SyntaxList {
    owner: SyntaxNode,
    slot: usize,
}

impl SyntaxList {
    pub(crate) fn new(owner: SyntaxNode, slot: usize) -> Self {
        Self { owner, slot }
    }

    /// The node whose slot holds this list.
    pub fn owner(&self) -> &SyntaxNode {
        &self.owner
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    fn list_node(&self) -> Option<SyntaxNode> {
        self.owner.child_node(self.slot).filter(|node| node.kind().is_list())
    }

    /// Number of elements, separators included.
    pub fn len(&self) -> usize {
        match self.owner.green().slot(self.slot) {
            None => 0,
            Some(NodeOrToken::Node(node)) if node.is_list() => node.slot_count(),
            Some(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<SyntaxElement> {
        match self.list_node() {
            Some(list) => list.child(index),
            None if index == 0 => self.owner.child(self.slot),
            None => None,
        }
    }

    pub fn full_span(&self) -> TextRange {
        let start = self.owner.offset() + self.owner.green().slot_offset(self.slot);
        let width = self
            .owner
            .green()
            .slot(self.slot)
            .map_or(TextSize::new(0), |element| element.full_width());
        TextRange::at(start, width)
    }

    pub fn iter(&self) -> SyntaxListIter {
        SyntaxListIter { list: self.clone(), front: 0, back: self.len() }
    }

    /// Only the node elements.
    pub fn nodes(&self) -> impl Iterator<Item = SyntaxNode> + '_ {
        self.iter().filter_map(NodeOrToken::into_node)
    }
}

impl fmt::Debug for SyntaxList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over `SyntaxList` elements.
#[derive(Clone)]
pub struct SyntaxListIter {
    list: SyntaxList,
    front: usize,
    back: usize,
}

impl Iterator for SyntaxListIter {
    type Item = SyntaxElement;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.front += 1;
        self.list.get(self.front - 1)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for SyntaxListIter {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        self.list.get(self.back)
    }
}

impl ExactSizeIterator for SyntaxListIter {}

/// A list whose items alternate with separator tokens, `a, b, c`.
#[derive(Clone)]
pub struct SeparatedSyntaxList {
    list: SyntaxList,
}

impl SeparatedSyntaxList {
    pub fn new(list: SyntaxList) -> Self {
        Self { list }
    }

    pub fn list(&self) -> &SyntaxList {
        &self.list
    }

    /// Number of items, separators excluded.
    pub fn len(&self) -> usize {
        self.list.len().div_ceil(2)
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn separator_count(&self) -> usize {
        self.list.len() / 2
    }

    pub fn get(&self, index: usize) -> Option<SyntaxElement> {
        self.list.get(index * 2)
    }

    pub fn separator(&self, index: usize) -> Option<SyntaxToken> {
        self.list.get(index * 2 + 1)?.into_token()
    }

    pub fn iter(&self) -> impl Iterator<Item = SyntaxElement> + '_ {
        (0..self.len()).filter_map(|index| self.get(index))
    }

    pub fn separators(&self) -> impl Iterator<Item = SyntaxToken> + '_ {
        (0..self.separator_count()).filter_map(|index| self.separator(index))
    }
}

impl fmt::Debug for SeparatedSyntaxList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
