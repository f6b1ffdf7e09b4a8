//! Positioned diagnostics reported against source text.

use std::fmt::{self, Display};

pub use annotate_snippets::Renderer;
use annotate_snippets::{Level, Snippet};
pub use text_size::TextRange;

mod code;

pub use code::ErrorCode;

/// How serious a diagnostic is.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Severity {
    Hidden,
    Info,
    Warning,
    Error,
}

impl Severity {
    fn level(self) -> Level {
        match self {
            Self::Hidden | Self::Info => Level::Info,
            Self::Warning => Level::Warning,
            Self::Error => Level::Error,
        }
    }
}

/// A diagnostic with an absolute range in the text it was reported against.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Diagnostic {
    code: ErrorCode,
    severity: Severity,
    message: String,
    range: TextRange,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, args: &[impl AsRef<str>], range: TextRange) -> Self {
        Self { code, severity: code.severity(), message: code.format(args), range }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn render<'a>(
        &'a self,
        renderer: &'a Renderer,
        path: &'a str,
        text: &'a str,
    ) -> impl Display + 'a {
        let level = self.severity.level();
        let message = level.title(&self.message).id(self.code.id()).snippet(
            Snippet::source(text)
                .origin(path)
                .annotation(level.span(self.range.into()).label("here"))
                .fold(true),
        );
        renderer.render(message)
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Hidden => "hidden",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{:?}: {severity} {}: {}", self.range, self.code.id(), self.message)
    }
}
