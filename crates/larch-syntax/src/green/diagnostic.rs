use std::sync::atomic::{AtomicU64, Ordering};

use larch_errors::{Diagnostic, ErrorCode};
use text_size::{TextRange, TextSize};

/// A diagnostic stored on a shape element, positioned relative to the start
/// of that element's full span.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct GreenDiagnostic {
    code: ErrorCode,
    args: Box<[Box<str>]>,
    offset: TextSize,
    width: TextSize,
}

impl GreenDiagnostic {
    pub fn new(code: ErrorCode, args: &[&str], offset: TextSize, width: TextSize) -> Self {
        Self { code, args: args.iter().map(|&arg| arg.into()).collect(), offset, width }
    }

    /// A diagnostic covering the whole element it is attached to.
    pub fn whole(code: ErrorCode, args: &[&str], width: TextSize) -> Self {
        Self::new(code, args, TextSize::new(0), width)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn args(&self) -> &[Box<str>] {
        &self.args
    }

    pub fn offset(&self) -> TextSize {
        self.offset
    }

    pub fn width(&self) -> TextSize {
        self.width
    }

    /// Resolves against the owner's absolute full span, clamping to it.
    pub(crate) fn resolve(&self, owner: TextRange) -> Diagnostic {
        let start = (owner.start() + self.offset).min(owner.end());
        let end = (start + self.width).min(owner.end());
        Diagnostic::new(self.code, &self.args, TextRange::new(start, end))
    }
}

static NEXT_ANNOTATION_ID: AtomicU64 = AtomicU64::new(1);

/// An opaque marker that survives tree edits on the element carrying it.
///
/// Two annotations are equal only if one was cloned from the other.
#[derive(Clone, Debug)]
pub struct SyntaxAnnotation {
    id: u64,
    kind: Box<str>,
    data: Option<Box<str>>,
}

impl SyntaxAnnotation {
    pub fn new(kind: &str) -> Self {
        Self::with_data(kind, None)
    }

    pub fn with_data(kind: &str, data: Option<&str>) -> Self {
        let id = NEXT_ANNOTATION_ID.fetch_add(1, Ordering::Relaxed);
        Self { id, kind: kind.into(), data: data.map(Into::into) }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

impl PartialEq for SyntaxAnnotation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SyntaxAnnotation {}

impl std::hash::Hash for SyntaxAnnotation {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Appends `extra` to `existing`, skipping annotations already present.
pub(crate) fn merge_annotations(
    existing: &[SyntaxAnnotation],
    extra: &[SyntaxAnnotation],
) -> Option<Box<[SyntaxAnnotation]>> {
    let mut merged = existing.to_vec();
    for annotation in extra {
        if !merged.contains(annotation) {
            merged.push(annotation.clone());
        }
    }
    (!merged.is_empty()).then(|| merged.into_boxed_slice())
}

/// Removes `remove` from `existing`.
pub(crate) fn strip_annotations(
    existing: &[SyntaxAnnotation],
    remove: &[SyntaxAnnotation],
) -> Option<Box<[SyntaxAnnotation]>> {
    let kept: Vec<_> = existing.iter().filter(|it| !remove.contains(it)).cloned().collect();
    (!kept.is_empty()).then(|| kept.into_boxed_slice())
}
