use std::fmt;

use text_size::TextSize;
use triomphe::Arc;

use super::diagnostic::{merge_annotations, strip_annotations};
use super::{GreenDiagnostic, GreenTriviaList, NodeFlags, SyntaxAnnotation};
use crate::SyntaxKind;

/// An immutable token together with its leading and trailing trivia.
///
/// Tokens are shared between trees; equality is identity.
#[derive(Clone)]
pub struct GreenToken {
    data: Arc<GreenTokenData>,
}

struct GreenTokenData {
    kind: SyntaxKind,
    text: Box<str>,
    leading: GreenTriviaList,
    trailing: GreenTriviaList,
    full_width: TextSize,
    flags: NodeFlags,
    diagnostics: Option<Box<[GreenDiagnostic]>>,
    annotations: Option<Box<[SyntaxAnnotation]>>,
}

impl GreenToken {
    pub fn new(
        leading: GreenTriviaList,
        kind: SyntaxKind,
        text: &str,
        trailing: GreenTriviaList,
    ) -> Self {
        Self::alloc(kind, text.into(), leading, trailing, NodeFlags::empty(), None, None)
    }

    /// A token with no trivia and its kind's fixed spelling.
    pub fn fixed(kind: SyntaxKind) -> Self {
        let text = kind.fixed_text().unwrap_or_default();
        Self::new(GreenTriviaList::empty(), kind, text, GreenTriviaList::empty())
    }

    /// A zero-width token standing in for one the parser expected.
    pub fn missing(kind: SyntaxKind) -> Self {
        Self::alloc(
            kind,
            "".into(),
            GreenTriviaList::empty(),
            GreenTriviaList::empty(),
            NodeFlags::IS_MISSING,
            None,
            None,
        )
    }

    fn alloc(
        kind: SyntaxKind,
        text: Box<str>,
        leading: GreenTriviaList,
        trailing: GreenTriviaList,
        own: NodeFlags,
        diagnostics: Option<Box<[GreenDiagnostic]>>,
        annotations: Option<Box<[SyntaxAnnotation]>>,
    ) -> Self {
        let mut flags = own | leading.flags().inherited() | trailing.flags().inherited();
        if diagnostics.is_some() {
            flags |= NodeFlags::CONTAINS_DIAGNOSTICS;
        }
        if annotations.is_some() {
            flags |= NodeFlags::CONTAINS_ANNOTATIONS;
        }
        let full_width = leading.full_width() + TextSize::of(&*text) + trailing.full_width();
        Self {
            data: Arc::new(GreenTokenData {
                kind,
                text,
                leading,
                trailing,
                full_width,
                flags,
                diagnostics,
                annotations,
            }),
        }
    }

    fn own_flags(&self) -> NodeFlags {
        self.data.flags & NodeFlags::IS_MISSING
    }

    fn rebuild(
        &self,
        leading: GreenTriviaList,
        trailing: GreenTriviaList,
        diagnostics: Option<Box<[GreenDiagnostic]>>,
        annotations: Option<Box<[SyntaxAnnotation]>>,
    ) -> Self {
        Self::alloc(
            self.data.kind,
            self.data.text.clone(),
            leading,
            trailing,
            self.own_flags(),
            diagnostics,
            annotations,
        )
    }

    pub fn with_leading(&self, leading: GreenTriviaList) -> Self {
        self.rebuild(
            leading,
            self.data.trailing.clone(),
            self.data.diagnostics.clone(),
            self.data.annotations.clone(),
        )
    }

    pub fn with_trailing(&self, trailing: GreenTriviaList) -> Self {
        self.rebuild(
            self.data.leading.clone(),
            trailing,
            self.data.diagnostics.clone(),
            self.data.annotations.clone(),
        )
    }

    pub fn with_diagnostics(&self, diagnostics: Vec<GreenDiagnostic>) -> Self {
        self.rebuild(
            self.data.leading.clone(),
            self.data.trailing.clone(),
            (!diagnostics.is_empty()).then(|| diagnostics.into_boxed_slice()),
            self.data.annotations.clone(),
        )
    }

    pub fn with_additional_annotations(&self, annotations: &[SyntaxAnnotation]) -> Self {
        let merged = merge_annotations(self.annotations(), annotations);
        self.rebuild(
            self.data.leading.clone(),
            self.data.trailing.clone(),
            self.data.diagnostics.clone(),
            merged,
        )
    }

    pub fn without_annotations(&self, annotations: &[SyntaxAnnotation]) -> Self {
        let kept = strip_annotations(self.annotations(), annotations);
        self.rebuild(
            self.data.leading.clone(),
            self.data.trailing.clone(),
            self.data.diagnostics.clone(),
            kept,
        )
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data.kind
    }

    /// The token text without trivia.
    pub fn text(&self) -> &str {
        &self.data.text
    }

    pub fn leading(&self) -> &GreenTriviaList {
        &self.data.leading
    }

    pub fn trailing(&self) -> &GreenTriviaList {
        &self.data.trailing
    }

    pub fn width(&self) -> TextSize {
        TextSize::of(&*self.data.text)
    }

    pub fn full_width(&self) -> TextSize {
        self.data.full_width
    }

    pub fn flags(&self) -> NodeFlags {
        self.data.flags
    }

    pub fn is_missing(&self) -> bool {
        self.data.flags.contains(NodeFlags::IS_MISSING)
    }

    pub fn diagnostics(&self) -> &[GreenDiagnostic] {
        self.data.diagnostics.as_deref().unwrap_or_default()
    }

    pub fn annotations(&self) -> &[SyntaxAnnotation] {
        self.data.annotations.as_deref().unwrap_or_default()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub fn write_to(&self, out: &mut String) {
        self.data.leading.write_to(out);
        out.push_str(&self.data.text);
        self.data.trailing.write_to(out);
    }

    /// The full text, including trivia.
    pub fn full_text(&self) -> String {
        let mut text = String::with_capacity(self.full_width().into());
        self.write_to(&mut text);
        text
    }
}

impl PartialEq for GreenToken {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for GreenToken {}

impl std::hash::Hash for GreenToken {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.data).hash(state);
    }
}

impl fmt::Debug for GreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?}", self.kind(), self.text())
    }
}
