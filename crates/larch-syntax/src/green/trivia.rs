use std::fmt;

use text_size::TextSize;
use triomphe::{Arc, ThinArc};

use super::{GreenDiagnostic, GreenNode, NodeFlags};
use crate::SyntaxKind;

/// A single piece of trivia: plain text, or a structure node for directives
/// and skipped tokens.
#[derive(Clone)]
pub struct GreenTrivia {
    data: Arc<GreenTriviaData>,
}

struct GreenTriviaData {
    kind: SyntaxKind,
    content: TriviaContent,
    width: TextSize,
    flags: NodeFlags,
    diagnostics: Option<Box<[GreenDiagnostic]>>,
}

enum TriviaContent {
    Text(Box<str>),
    Structure(GreenNode),
}

impl GreenTrivia {
    pub fn new(kind: SyntaxKind, text: &str) -> Self {
        debug_assert!(kind.is_trivia() && !kind.is_structured_trivia());
        let mut flags = NodeFlags::empty();
        if kind == SyntaxKind::DISABLED_TEXT {
            flags |= NodeFlags::CONTAINS_SKIPPED_TEXT;
        }
        Self {
            data: Arc::new(GreenTriviaData {
                kind,
                width: TextSize::of(text),
                content: TriviaContent::Text(text.into()),
                flags,
                diagnostics: None,
            }),
        }
    }

    /// Wraps a directive or skipped-tokens node as trivia of the same kind.
    pub fn structured(node: GreenNode) -> Self {
        let kind = node.kind();
        debug_assert!(kind.is_structured_trivia());
        let mut flags = node.flags().inherited() | NodeFlags::CONTAINS_STRUCTURED_TRIVIA;
        if kind.is_directive() {
            flags |= NodeFlags::CONTAINS_DIRECTIVES;
        }
        if kind == SyntaxKind::SKIPPED_TOKENS_TRIVIA {
            flags |= NodeFlags::CONTAINS_SKIPPED_TEXT;
        }
        Self {
            data: Arc::new(GreenTriviaData {
                kind,
                width: node.full_width(),
                content: TriviaContent::Structure(node),
                flags,
                diagnostics: None,
            }),
        }
    }

    pub fn with_diagnostics(&self, diagnostics: Vec<GreenDiagnostic>) -> Self {
        let mut flags = self.data.flags;
        let own = match &self.data.content {
            TriviaContent::Text(_) => NodeFlags::empty(),
            TriviaContent::Structure(node) => node.flags().inherited(),
        };
        flags.set(
            NodeFlags::CONTAINS_DIAGNOSTICS,
            !diagnostics.is_empty() || own.contains(NodeFlags::CONTAINS_DIAGNOSTICS),
        );
        let content = match &self.data.content {
            TriviaContent::Text(text) => TriviaContent::Text(text.clone()),
            TriviaContent::Structure(node) => TriviaContent::Structure(node.clone()),
        };
        Self {
            data: Arc::new(GreenTriviaData {
                kind: self.data.kind,
                content,
                width: self.data.width,
                flags,
                diagnostics: (!diagnostics.is_empty()).then(|| diagnostics.into_boxed_slice()),
            }),
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data.kind
    }

    pub fn full_width(&self) -> TextSize {
        self.data.width
    }

    pub fn flags(&self) -> NodeFlags {
        self.data.flags
    }

    /// The text of plain trivia; `None` for structured trivia.
    pub fn text(&self) -> Option<&str> {
        match &self.data.content {
            TriviaContent::Text(text) => Some(text),
            TriviaContent::Structure(_) => None,
        }
    }

    pub fn structure(&self) -> Option<&GreenNode> {
        match &self.data.content {
            TriviaContent::Text(_) => None,
            TriviaContent::Structure(node) => Some(node),
        }
    }

    pub fn diagnostics(&self) -> &[GreenDiagnostic] {
        self.data.diagnostics.as_deref().unwrap_or_default()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub fn write_to(&self, out: &mut String) {
        match &self.data.content {
            TriviaContent::Text(text) => out.push_str(text),
            TriviaContent::Structure(node) => node.write_to(out),
        }
    }
}

impl PartialEq for GreenTrivia {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for GreenTrivia {}

impl std::hash::Hash for GreenTrivia {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.data).hash(state);
    }
}

impl fmt::Debug for GreenTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data.content {
            TriviaContent::Text(text) => write!(f, "{:?} {text:?}", self.kind()),
            TriviaContent::Structure(node) => write!(f, "{:?} {node:?}", self.kind()),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct TriviaListHeader {
    width: TextSize,
    flags: NodeFlags,
}

/// The leading or trailing trivia run of a token.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct GreenTriviaList {
    ptr: Option<ThinArc<TriviaListHeader, GreenTrivia>>,
}

impl fmt::Debug for GreenTriviaList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenTriviaList")
            .field("pieces", &self.pieces())
            .field("width", &self.full_width())
            .finish()
    }
}

impl Default for GreenTriviaList {
    fn default() -> Self {
        Self::empty()
    }
}

impl GreenTriviaList {
    pub fn new(pieces: impl IntoIterator<Item = GreenTrivia>) -> Self {
        let pieces: Vec<GreenTrivia> = pieces.into_iter().collect();
        if pieces.is_empty() {
            return Self::empty();
        }
        let header = TriviaListHeader {
            width: pieces.iter().map(GreenTrivia::full_width).sum(),
            flags: pieces.iter().fold(NodeFlags::empty(), |acc, piece| acc | piece.flags()),
        };
        Self { ptr: Some(ThinArc::from_header_and_iter(header, pieces.into_iter())) }
    }

    pub const fn empty() -> Self {
        Self { ptr: None }
    }

    pub fn full_width(&self) -> TextSize {
        match self.ptr {
            None => TextSize::new(0),
            Some(ref ptr) => ptr.header.header.width,
        }
    }

    pub fn flags(&self) -> NodeFlags {
        match self.ptr {
            None => NodeFlags::empty(),
            Some(ref ptr) => ptr.header.header.flags,
        }
    }

    pub fn pieces(&self) -> &[GreenTrivia] {
        match &self.ptr {
            None => &[],
            Some(ptr) => &ptr.slice,
        }
    }

    pub fn len(&self) -> usize {
        self.pieces().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.ptr, &other.ptr) {
            (None, None) => true,
            (Some(this), Some(other)) => std::ptr::addr_eq(&**this, &**other),
            _ => false,
        }
    }

    /// Offset of piece `index` from the start of the run.
    pub fn offset_of(&self, index: usize) -> TextSize {
        self.pieces()[..index].iter().map(GreenTrivia::full_width).sum()
    }

    pub fn write_to(&self, out: &mut String) {
        for piece in self.pieces() {
            piece.write_to(out);
        }
    }
}
