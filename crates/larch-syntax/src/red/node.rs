//! Located nodes: lazily materialized, parent-linked wrappers over shape nodes.
//!
//! Every located node is allocated once per tree and cached in a write-once
//! slot of its parent, so two lookups of the same child are the same node.

use std::fmt;
use std::ptr::NonNull;

use once_cell::race::OnceBox;
use text_size::{TextRange, TextSize};

use crate::green::{GreenNode, SyntaxAnnotation};
use crate::syntax::{
    Children, ChildrenWithTokens, ChildrenWithTokensAndLists, PreorderWithTokens,
};
use crate::{
    ListShape, NodeOrToken, Preorder, SyntaxElement, SyntaxKind, SyntaxToken, SyntaxTree,
    SyntaxTrivia, TokenAtOffset, WalkEvent, WalkEventWithTokens,
};

/// Where a structured-trivia root sits inside the tree that owns it.
#[derive(Clone, Copy)]
pub(crate) struct TriviaOrigin {
    /// The located node whose slot holds the token carrying the trivia.
    pub(crate) owner: NonNull<RedData>,
    pub(crate) token_index: u32,
    pub(crate) leading: bool,
    pub(crate) trivia_index: u32,
}

/// Token slot, trailing side, piece index.
type TriviaKey = (u32, bool, u32);

struct StructureTable {
    entries: Box<[(TriviaKey, OnceBox<RedData>)]>,
}

impl StructureTable {
    fn new(green: &GreenNode) -> Self {
        let mut entries = Vec::new();
        for (slot, element) in green.slots().enumerate() {
            let Some(NodeOrToken::Token(token)) = element else { continue };
            // Leading entries sort before trailing ones for the same slot.
            for (trailing, list) in [(false, token.leading()), (true, token.trailing())] {
                for (index, piece) in list.pieces().iter().enumerate() {
                    if piece.structure().is_some() {
                        entries.push(((slot as u32, trailing, index as u32), OnceBox::new()));
                    }
                }
            }
        }
        Self { entries: entries.into_boxed_slice() }
    }

    fn cell(&self, key: TriviaKey) -> Option<&OnceBox<RedData>> {
        let index = self.entries.binary_search_by_key(&key, |(key, _)| *key).ok()?;
        Some(&self.entries[index].1)
    }
}

/// Raw located node stored in the tree.
pub(crate) struct RedData {
    pub(crate) green: GreenNode,
    pub(crate) parent: Option<NonNull<RedData>>,
    /// Slot index within the parent.
    pub(crate) index: u32,
    /// Absolute start of the full span.
    pub(crate) offset: TextSize,
    pub(crate) origin: Option<TriviaOrigin>,
    /// When set, only the even (item) slots of this list are cached.
    separated: bool,
    children: Box<[OnceBox<RedData>]>,
    structures: OnceBox<StructureTable>,
}

// SAFETY: the raw pointers only ever point at other `RedData` of the same tree,
// which are immutable once published and live as long as the tree.
unsafe impl Send for RedData {}
unsafe impl Sync for RedData {}

impl RedData {
    pub(crate) fn new(
        green: GreenNode,
        parent: Option<NonNull<Self>>,
        index: u32,
        offset: TextSize,
        origin: Option<TriviaOrigin>,
        separated: bool,
    ) -> Self {
        let slots = green.slot_count();
        let cached = if separated { slots.div_ceil(2) } else { slots };
        Self {
            green,
            parent,
            index,
            offset,
            origin,
            separated,
            children: (0..cached).map(|_| OnceBox::new()).collect(),
            structures: OnceBox::new(),
        }
    }

    fn cache_index(&self, slot: usize) -> Option<usize> {
        if self.separated { (slot % 2 == 0).then_some(slot / 2) } else { Some(slot) }
    }
}

/// Returns `true` when `list` alternates items with tokens of `separator`.
fn alternates(list: &GreenNode, separator: SyntaxKind) -> bool {
    list.slots().enumerate().all(|(index, slot)| {
        index % 2 == 0
            || matches!(slot, Some(NodeOrToken::Token(token)) if token.kind() == separator)
    })
}

/// A node handle with an absolute position and a parent link.
///
/// Handles keep their tree alive. Equality is identity: two handles are equal
/// when they denote the same located node of the same tree.
#[derive(Clone)]
pub struct SyntaxNode {
    tree: SyntaxTree,
    data: NonNull<RedData>,
}

// SAFETY: `data` is owned by `tree`, which the handle keeps alive.
unsafe impl Send for SyntaxNode {}
unsafe impl Sync for SyntaxNode {}

impl SyntaxNode {
    pub(crate) fn new(tree: SyntaxTree, data: NonNull<RedData>) -> Self {
        Self { tree, data }
    }

    #[inline]
    pub(crate) fn data(&self) -> &RedData {
        // SAFETY: see the `Send` impl.
        unsafe { self.data.as_ref() }
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().green.kind()
    }

    pub fn green(&self) -> &GreenNode {
        &self.data().green
    }

    pub fn offset(&self) -> TextSize {
        self.data().offset
    }

    /// The span including leading and trailing trivia.
    pub fn full_span(&self) -> TextRange {
        TextRange::at(self.offset(), self.green().full_width())
    }

    /// The span without the leading trivia of the first token and the
    /// trailing trivia of the last token.
    pub fn span(&self) -> TextRange {
        let green = self.green();
        let start = self.offset() + green.leading_trivia_width();
        TextRange::at(start, green.width())
    }

    pub fn text(&self) -> &str {
        &self.tree.source_text().as_str()[self.span()]
    }

    pub fn full_text(&self) -> &str {
        &self.tree.source_text().as_str()[self.full_span()]
    }

    /// The immediate parent including list nodes.
    pub(crate) fn raw_parent(&self) -> Option<Self> {
        Some(Self::new(self.tree.clone(), self.data().parent?))
    }

    /// Slot index of this node within its raw parent.
    pub(crate) fn index(&self) -> usize {
        self.data().index as usize
    }

    /// The parent node, skipping list nodes.
    pub fn parent(&self) -> Option<Self> {
        let parent = self.raw_parent()?;
        if parent.kind().is_list() { parent.raw_parent() } else { Some(parent) }
    }

    /// Returns an iterator of ancestors starting from this node.
    pub fn ancestors(&self) -> impl Iterator<Item = Self> + Clone {
        std::iter::successors(Some(self.clone()), Self::parent)
    }

    /// For the root of a structured trivia subtree, the trivia that holds it.
    pub fn structured_trivia_parent(&self) -> Option<SyntaxTrivia> {
        let origin = self.data().origin?;
        let owner = Self::new(self.tree.clone(), origin.owner);
        let token = owner.child_token(origin.token_index as usize)?;
        token.trivia(origin.leading, origin.trivia_index as usize)
    }

    pub fn is_structured_trivia(&self) -> bool {
        self.data().origin.is_some()
    }

    pub fn is_part_of_structured_trivia(&self) -> bool {
        let mut node = self.clone();
        while let Some(parent) = node.raw_parent() {
            node = parent;
        }
        node.is_structured_trivia()
    }

    pub fn slot_count(&self) -> usize {
        self.green().slot_count()
    }

    /// The element in slot `slot`. Lists are returned as `LIST` nodes.
    pub fn child(&self, slot: usize) -> Option<SyntaxElement> {
        match self.green().slot(slot)? {
            NodeOrToken::Node(_) => self.child_node(slot).map(NodeOrToken::Node),
            NodeOrToken::Token(_) => self.child_token(slot).map(NodeOrToken::Token),
        }
    }

    pub fn child_node(&self, slot: usize) -> Option<Self> {
        let data = self.data();
        let NodeOrToken::Node(green) = data.green.slot(slot)? else { return None };
        let cell = &data.children[data.cache_index(slot)?];
        let child = cell.get_or_init(|| {
            let separated = green.is_list()
                && match self.kind().slot_list_shape(slot) {
                    Some(ListShape::Separated(separator)) => alternates(green, separator),
                    _ => false,
                };
            let offset = data.offset + data.green.slot_offset(slot);
            Box::new(RedData::new(
                green.clone(),
                Some(self.data),
                slot as u32,
                offset,
                None,
                separated,
            ))
        });
        Some(Self::new(self.tree.clone(), NonNull::from(child)))
    }

    pub fn child_token(&self, slot: usize) -> Option<SyntaxToken> {
        let data = self.data();
        let NodeOrToken::Token(green) = data.green.slot(slot)? else { return None };
        let offset = data.offset + data.green.slot_offset(slot);
        Some(SyntaxToken::new(self.clone(), green.clone(), slot, offset))
    }

    /// The located root of a structured trivia piece carried by the token in
    /// slot `token_index`.
    pub(crate) fn structure_root(
        &self,
        token_index: usize,
        leading: bool,
        trivia_index: usize,
        offset: TextSize,
    ) -> Option<Self> {
        let data = self.data();
        let NodeOrToken::Token(token) = data.green.slot(token_index)? else { return None };
        let list = if leading { token.leading() } else { token.trailing() };
        let structure = list.pieces().get(trivia_index)?.structure()?;
        let table = data.structures.get_or_init(|| Box::new(StructureTable::new(&data.green)));
        let cell = table.cell((token_index as u32, !leading, trivia_index as u32))?;
        let root = cell.get_or_init(|| {
            let origin = TriviaOrigin {
                owner: self.data,
                token_index: token_index as u32,
                leading,
                trivia_index: trivia_index as u32,
            };
            Box::new(RedData::new(structure.clone(), None, 0, offset, Some(origin), false))
        });
        Some(Self::new(self.tree.clone(), NonNull::from(root)))
    }

    /// Iterates children including tokens and list slots.
    pub fn children_with_tokens_and_lists(&self) -> ChildrenWithTokensAndLists {
        ChildrenWithTokensAndLists::new(self.clone())
    }

    /// Iterates children including tokens, flattening lists.
    pub fn children_with_tokens(&self) -> ChildrenWithTokens {
        ChildrenWithTokens::new(self.clone())
    }

    /// Iterates child nodes, flattening lists and skipping tokens.
    pub fn children(&self) -> Children {
        Children::new(self.clone())
    }

    /// Returns a preorder iterator over nodes.
    pub fn preorder(&self) -> Preorder {
        Preorder::new(self.clone())
    }

    /// Returns a preorder iterator over nodes and tokens.
    pub fn preorder_with_tokens(&self) -> PreorderWithTokens {
        PreorderWithTokens::new(self.clone())
    }

    /// This node and every node below it, in document order.
    pub fn descendants(&self) -> impl Iterator<Item = Self> {
        self.preorder().filter_map(|event| match event {
            WalkEvent::Enter(node) => Some(node),
            WalkEvent::Leave(_) => None,
        })
    }

    pub fn descendant_tokens(&self) -> impl Iterator<Item = SyntaxToken> {
        self.preorder_with_tokens().filter_map(|event| match event {
            WalkEventWithTokens::Token(token) => Some(token),
            _ => None,
        })
    }

    pub fn first_token(&self) -> Option<SyntaxToken> {
        (0..self.slot_count()).find_map(|slot| match self.child(slot)? {
            NodeOrToken::Node(node) => node.first_token(),
            NodeOrToken::Token(token) => Some(token),
        })
    }

    pub fn last_token(&self) -> Option<SyntaxToken> {
        (0..self.slot_count()).rev().find_map(|slot| match self.child(slot)? {
            NodeOrToken::Node(node) => node.last_token(),
            NodeOrToken::Token(token) => Some(token),
        })
    }

    /// The token whose full span contains `offset`. An offset at the very end
    /// of this node yields its last token.
    pub fn find_token(&self, offset: TextSize) -> Option<SyntaxToken> {
        let full_span = self.full_span();
        if offset < full_span.start() || offset > full_span.end() {
            return None;
        }
        let mut node = self.clone();
        loop {
            let Some(slot) = node.green().slot_index_at(offset - node.offset()) else {
                return node.last_token();
            };
            match node.child(slot)? {
                NodeOrToken::Node(child) => node = child,
                NodeOrToken::Token(token) => return Some(token),
            }
        }
    }

    /// Returns the tokens touching `offset`, by full span.
    pub fn token_at_offset(&self, offset: TextSize) -> TokenAtOffset<SyntaxToken> {
        let Some(right) = self.find_token(offset) else { return TokenAtOffset::None };
        if right.full_span().start() == offset
            && let Some(left) = right.prev_token()
            && self.full_span().contains_range(left.full_span())
        {
            return TokenAtOffset::Between(left, right);
        }
        TokenAtOffset::Single(right)
    }

    /// Returns the smallest element whose full span covers `range`.
    pub fn covering_element(&self, range: TextRange) -> Option<SyntaxElement> {
        let token = self.find_token(range.start())?;
        if token.full_span().contains_range(range) {
            return Some(NodeOrToken::Token(token));
        }
        let mut ancestors = std::iter::successors(token.parent(), Self::parent);
        ancestors.find(|ancestor| ancestor.full_span().contains_range(range)).map(NodeOrToken::Node)
    }

    pub fn has_annotation(&self, annotation: &SyntaxAnnotation) -> bool {
        self.green().has_annotation(annotation)
    }

    /// Nodes at or below this one carrying `annotation`, skipping subtrees
    /// without annotations.
    pub fn descendants_with_annotation(&self, annotation: &SyntaxAnnotation) -> Vec<Self> {
        let mut found = Vec::new();
        let mut preorder = self.preorder();
        while let Some(event) = preorder.next() {
            let WalkEvent::Enter(node) = event else { continue };
            if !node.green().contains_annotations() {
                preorder.skip_subtree();
                continue;
            }
            if node.has_annotation(annotation) {
                found.push(node);
            }
        }
        found
    }

    pub fn tokens_with_annotation(&self, annotation: &SyntaxAnnotation) -> Vec<SyntaxToken> {
        if !self.green().contains_annotations() {
            return Vec::new();
        }
        self.descendant_tokens()
            .filter(|token| token.green().annotations().contains(annotation))
            .collect()
    }

    pub fn debug_dump(&self) -> String {
        self.green().debug_dump(self.offset())
    }
}

impl PartialEq for SyntaxNode {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for SyntaxNode {}

impl std::hash::Hash for SyntaxNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.full_span())
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_text())
    }
}
