use std::fmt::{self, Write as _};

use text_size::{TextRange, TextSize};
use triomphe::Arc;

use super::diagnostic::{merge_annotations, strip_annotations};
use super::{GreenDiagnostic, GreenElement, GreenToken, GreenTrivia, NodeFlags, SyntaxAnnotation};
use crate::{NodeOrToken, SyntaxKind};

/// Lists with at least this many children precompute their child offsets.
pub const LOTS_OF_CHILDREN_THRESHOLD: usize = 10;

/// An immutable, position-independent interior node.
///
/// Nodes are shared freely between trees and threads; equality is identity.
#[derive(Clone)]
pub struct GreenNode {
    data: Arc<GreenNodeData>,
}

struct GreenNodeData {
    kind: SyntaxKind,
    full_width: TextSize,
    flags: NodeFlags,
    slots: Slots,
    diagnostics: Option<Box<[GreenDiagnostic]>>,
    annotations: Option<Box<[SyntaxAnnotation]>>,
}

/// Storage for a node's children.
///
/// Ordinary nodes have a fixed number of slots, some of which may be empty.
/// List nodes never have empty slots and pick a representation by size.
enum Slots {
    Fixed(Box<[Option<GreenElement>]>),
    Two([GreenElement; 2]),
    Three([GreenElement; 3]),
    Many { children: Box<[GreenElement]>, offsets: Option<Box<[TextSize]>> },
}

impl Slots {
    fn for_list(children: Vec<GreenElement>) -> Self {
        match children.len() {
            2 => <[GreenElement; 2]>::try_from(children).map_or_else(Self::many, Self::Two),
            3 => <[GreenElement; 3]>::try_from(children).map_or_else(Self::many, Self::Three),
            _ => Self::many(children),
        }
    }

    fn many(children: Vec<GreenElement>) -> Self {
        let offsets = (children.len() >= LOTS_OF_CHILDREN_THRESHOLD).then(|| {
            let mut offset = TextSize::new(0);
            children
                .iter()
                .map(|child| {
                    let start = offset;
                    offset += child.full_width();
                    start
                })
                .collect()
        });
        Self::Many { children: children.into_boxed_slice(), offsets }
    }

    fn len(&self) -> usize {
        match self {
            Self::Fixed(slots) => slots.len(),
            Self::Two(_) => 2,
            Self::Three(_) => 3,
            Self::Many { children, .. } => children.len(),
        }
    }

    fn get(&self, index: usize) -> Option<&GreenElement> {
        match self {
            Self::Fixed(slots) => slots.get(index)?.as_ref(),
            Self::Two(children) => children.get(index),
            Self::Three(children) => children.get(index),
            Self::Many { children, .. } => children.get(index),
        }
    }

    fn offset(&self, index: usize) -> TextSize {
        if let Self::Many { offsets: Some(offsets), .. } = self {
            return offsets[index];
        }
        (0..index).filter_map(|slot| self.get(slot)).map(GreenElement::full_width).sum()
    }
}

impl GreenNode {
    /// Builds a node with a fixed slot layout.
    pub fn new(kind: SyntaxKind, slots: impl IntoIterator<Item = Option<GreenElement>>) -> Self {
        debug_assert!(!kind.is_list(), "use `GreenNode::list` for lists");
        let slots: Box<[_]> = slots.into_iter().collect();
        Self::alloc(kind, Slots::Fixed(slots), None, None)
    }

    /// Builds the slot content for a list of `elements`.
    ///
    /// An empty list is no element at all and a single element stands for
    /// itself; only two or more elements get a `LIST` node.
    pub fn list(elements: impl IntoIterator<Item = GreenElement>) -> Option<GreenElement> {
        let mut elements: Vec<GreenElement> = elements.into_iter().collect();
        match elements.len() {
            0 => None,
            1 => elements.pop(),
            _ => Some(NodeOrToken::Node(Self::list_node(elements))),
        }
    }

    fn list_node(elements: Vec<GreenElement>) -> Self {
        debug_assert!(elements.len() >= 2);
        Self::alloc(SyntaxKind::LIST, Slots::for_list(elements), None, None)
    }

    fn alloc(
        kind: SyntaxKind,
        slots: Slots,
        diagnostics: Option<Box<[GreenDiagnostic]>>,
        annotations: Option<Box<[SyntaxAnnotation]>>,
    ) -> Self {
        let mut full_width = TextSize::new(0);
        let mut flags = NodeFlags::empty();
        for index in 0..slots.len() {
            if let Some(child) = slots.get(index) {
                full_width += child.full_width();
                flags |= child.flags().inherited();
            }
        }
        if diagnostics.is_some() {
            flags |= NodeFlags::CONTAINS_DIAGNOSTICS;
        }
        if annotations.is_some() {
            flags |= NodeFlags::CONTAINS_ANNOTATIONS;
        }
        Self {
            data: Arc::new(GreenNodeData {
                kind,
                full_width,
                flags,
                slots,
                diagnostics,
                annotations,
            }),
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data.kind
    }

    pub fn is_list(&self) -> bool {
        self.data.kind.is_list()
    }

    pub fn full_width(&self) -> TextSize {
        self.data.full_width
    }

    pub fn flags(&self) -> NodeFlags {
        self.data.flags
    }

    pub fn contains_diagnostics(&self) -> bool {
        self.data.flags.contains(NodeFlags::CONTAINS_DIAGNOSTICS)
    }

    pub fn contains_directives(&self) -> bool {
        self.data.flags.contains(NodeFlags::CONTAINS_DIRECTIVES)
    }

    pub fn contains_skipped_text(&self) -> bool {
        self.data.flags.contains(NodeFlags::CONTAINS_SKIPPED_TEXT)
    }

    pub fn contains_structured_trivia(&self) -> bool {
        self.data.flags.contains(NodeFlags::CONTAINS_STRUCTURED_TRIVIA)
    }

    pub fn contains_annotations(&self) -> bool {
        self.data.flags.contains(NodeFlags::CONTAINS_ANNOTATIONS)
    }

    pub fn slot_count(&self) -> usize {
        self.data.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<&GreenElement> {
        self.data.slots.get(index)
    }

    /// Offset of slot `index` from the start of this node's full span.
    pub fn slot_offset(&self, index: usize) -> TextSize {
        self.data.slots.offset(index)
    }

    pub fn slots(&self) -> impl ExactSizeIterator<Item = Option<&GreenElement>> + '_ {
        (0..self.slot_count()).map(|index| self.slot(index))
    }

    /// The slot whose full span contains `offset`, measured from this node's
    /// start; an offset on a boundary belongs to the following slot.
    pub fn slot_index_at(&self, offset: TextSize) -> Option<usize> {
        if let Slots::Many { children, offsets: Some(offsets) } = &self.data.slots {
            let (mut low, mut high) = (0, children.len());
            while low < high {
                let mid = low + (high - low) / 2;
                if offsets[mid] + children[mid].full_width() <= offset {
                    low = mid + 1;
                } else {
                    high = mid;
                }
            }
            return (low < children.len()).then_some(low);
        }
        let mut start = TextSize::new(0);
        for (index, slot) in self.slots().enumerate() {
            let Some(slot) = slot else { continue };
            let end = start + slot.full_width();
            if offset < end {
                return Some(index);
            }
            start = end;
        }
        None
    }

    pub fn diagnostics(&self) -> &[GreenDiagnostic] {
        self.data.diagnostics.as_deref().unwrap_or_default()
    }

    pub fn annotations(&self) -> &[SyntaxAnnotation] {
        self.data.annotations.as_deref().unwrap_or_default()
    }

    pub fn has_annotation(&self, annotation: &SyntaxAnnotation) -> bool {
        self.annotations().contains(annotation)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    fn with_parts(
        &self,
        slots: Slots,
        diagnostics: Option<Box<[GreenDiagnostic]>>,
        annotations: Option<Box<[SyntaxAnnotation]>>,
    ) -> Self {
        Self::alloc(self.data.kind, slots, diagnostics, annotations)
    }

    fn cloned_slots(&self) -> Vec<Option<GreenElement>> {
        self.slots().map(Option::<&GreenElement>::cloned).collect()
    }

    /// A copy of this node with every slot replaced.
    ///
    /// For lists every slot must be occupied and the count must stay at two
    /// or more.
    pub fn with_slots(&self, slots: Vec<Option<GreenElement>>) -> Self {
        let slots = if self.is_list() {
            let children: Vec<GreenElement> = slots.into_iter().flatten().collect();
            debug_assert!(children.len() >= 2);
            Slots::for_list(children)
        } else {
            Slots::Fixed(slots.into_boxed_slice())
        };
        self.with_parts(slots, self.data.diagnostics.clone(), self.data.annotations.clone())
    }

    pub fn with_slot(&self, index: usize, element: Option<GreenElement>) -> Self {
        let mut slots = self.cloned_slots();
        slots[index] = element;
        self.with_slots(slots)
    }

    pub fn with_diagnostics(&self, diagnostics: Vec<GreenDiagnostic>) -> Self {
        let diagnostics = (!diagnostics.is_empty()).then(|| diagnostics.into_boxed_slice());
        let slots = self.rebuilt_slots();
        self.with_parts(slots, diagnostics, self.data.annotations.clone())
    }

    pub fn with_additional_annotations(&self, annotations: &[SyntaxAnnotation]) -> Self {
        let merged = merge_annotations(self.annotations(), annotations);
        let slots = self.rebuilt_slots();
        self.with_parts(slots, self.data.diagnostics.clone(), merged)
    }

    pub fn without_annotations(&self, annotations: &[SyntaxAnnotation]) -> Self {
        let kept = strip_annotations(self.annotations(), annotations);
        let slots = self.rebuilt_slots();
        self.with_parts(slots, self.data.diagnostics.clone(), kept)
    }

    fn rebuilt_slots(&self) -> Slots {
        if self.is_list() {
            Slots::for_list(self.cloned_slots().into_iter().flatten().collect())
        } else {
            Slots::Fixed(self.cloned_slots().into_boxed_slice())
        }
    }

    pub fn first_token(&self) -> Option<&GreenToken> {
        self.slots().flatten().find_map(|slot| match slot {
            NodeOrToken::Node(node) => node.first_token(),
            NodeOrToken::Token(token) => Some(token),
        })
    }

    pub fn last_token(&self) -> Option<&GreenToken> {
        let mut slots = (0..self.slot_count()).rev().filter_map(|index| self.slot(index));
        slots.find_map(|slot| match slot {
            NodeOrToken::Node(node) => node.last_token(),
            NodeOrToken::Token(token) => Some(token),
        })
    }

    pub fn leading_trivia_width(&self) -> TextSize {
        self.first_token().map_or(TextSize::new(0), |token| token.leading().full_width())
    }

    pub fn trailing_trivia_width(&self) -> TextSize {
        self.last_token().map_or(TextSize::new(0), |token| token.trailing().full_width())
    }

    /// The width without the leading trivia of the first token and the
    /// trailing trivia of the last one.
    pub fn width(&self) -> TextSize {
        let trivia = self.leading_trivia_width() + self.trailing_trivia_width();
        self.full_width().checked_sub(trivia).unwrap_or_default()
    }

    pub fn write_to(&self, out: &mut String) {
        for slot in self.slots().flatten() {
            slot.write_to(out);
        }
    }

    /// The full text, including all trivia.
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.full_width().into());
        self.write_to(&mut text);
        text
    }

    /// An indented, one-element-per-line rendering of the subtree starting at
    /// offset `start`.
    pub fn debug_dump(&self, start: TextSize) -> String {
        let mut out = String::new();
        self.dump(&mut out, 0, start);
        out
    }

    fn dump(&self, out: &mut String, depth: usize, start: TextSize) {
        let range = TextRange::at(start, self.full_width());
        let _ = writeln!(out, "{:indent$}{:?}@{range:?}", "", self.kind(), indent = depth * 2);
        for (index, slot) in self.slots().enumerate() {
            let offset = start + self.slot_offset(index);
            match slot {
                None => {}
                Some(NodeOrToken::Node(node)) => node.dump(out, depth + 1, offset),
                Some(NodeOrToken::Token(token)) => dump_token(token, out, depth + 1, offset),
            }
        }
    }
}

fn dump_token(token: &GreenToken, out: &mut String, depth: usize, start: TextSize) {
    let mut offset = start;
    for piece in token.leading().pieces() {
        dump_trivia(piece, out, depth, offset);
        offset += piece.full_width();
    }
    let range = TextRange::at(offset, token.width());
    if token.is_missing() {
        let kind = token.kind();
        let _ = writeln!(out, "{:indent$}{kind:?}@{range:?} missing", "", indent = depth * 2);
    } else {
        let _ = writeln!(
            out,
            "{:indent$}{:?}@{range:?} {:?}",
            "",
            token.kind(),
            token.text(),
            indent = depth * 2
        );
    }
    offset += token.width();
    for piece in token.trailing().pieces() {
        dump_trivia(piece, out, depth, offset);
        offset += piece.full_width();
    }
}

fn dump_trivia(trivia: &GreenTrivia, out: &mut String, depth: usize, start: TextSize) {
    let range = TextRange::at(start, trivia.full_width());
    match (trivia.text(), trivia.structure()) {
        (Some(text), _) => {
            let kind = trivia.kind();
            let _ = writeln!(out, "{:indent$}{kind:?}@{range:?} {text:?}", "", indent = depth * 2);
        }
        (None, Some(node)) => node.dump(out, depth, start),
        (None, None) => {}
    }
}

impl PartialEq for GreenNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for GreenNode {}

impl std::hash::Hash for GreenNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.data).hash(state);
    }
}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.full_width())
    }
}
