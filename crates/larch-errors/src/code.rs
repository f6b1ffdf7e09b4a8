use crate::Severity;

/// Every diagnostic the front end can attach to a syntax tree.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum ErrorCode {
    UnexpectedCharacter,
    TokenExpected,
    IdentifierExpected,
    ExpressionExpected,
    TypeExpected,
    UnexpectedToken,
    UnterminatedComment,
    UnterminatedString,
    EndOfDirectiveExpected,
    EndifDirectiveExpected,
    UnexpectedDirective,
    PreprocessorDirectiveExpected,
    InvalidPreprocessorExpression,
    DefineAfterToken,
    ErrorDirective,
    WarningDirective,
    InvalidLineNumber,
    FileNameExpected,
    IllegalPragma,
    IllegalPragmaWarning,
}

impl ErrorCode {
    pub const ALL: &'static [Self] = &[
        Self::UnexpectedCharacter,
        Self::TokenExpected,
        Self::IdentifierExpected,
        Self::ExpressionExpected,
        Self::TypeExpected,
        Self::UnexpectedToken,
        Self::UnterminatedComment,
        Self::UnterminatedString,
        Self::EndOfDirectiveExpected,
        Self::EndifDirectiveExpected,
        Self::UnexpectedDirective,
        Self::PreprocessorDirectiveExpected,
        Self::InvalidPreprocessorExpression,
        Self::DefineAfterToken,
        Self::ErrorDirective,
        Self::WarningDirective,
        Self::InvalidLineNumber,
        Self::FileNameExpected,
        Self::IllegalPragma,
        Self::IllegalPragmaWarning,
    ];

    /// The stable number used by `#pragma warning` and in rendered output.
    pub const fn number(self) -> u16 {
        match self {
            Self::UnexpectedCharacter => 1001,
            Self::TokenExpected => 1002,
            Self::IdentifierExpected => 1003,
            Self::ExpressionExpected => 1004,
            Self::TypeExpected => 1005,
            Self::UnexpectedToken => 1006,
            Self::UnterminatedComment => 1007,
            Self::UnterminatedString => 1008,
            Self::EndOfDirectiveExpected => 1020,
            Self::EndifDirectiveExpected => 1021,
            Self::UnexpectedDirective => 1022,
            Self::PreprocessorDirectiveExpected => 1023,
            Self::InvalidPreprocessorExpression => 1024,
            Self::DefineAfterToken => 1025,
            Self::ErrorDirective => 1026,
            Self::WarningDirective => 1030,
            Self::InvalidLineNumber => 1031,
            Self::FileNameExpected => 1032,
            Self::IllegalPragma => 1633,
            Self::IllegalPragmaWarning => 1634,
        }
    }

    pub fn from_number(number: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|code| code.number() == number)
    }

    pub const fn id(self) -> &'static str {
        match self {
            Self::UnexpectedCharacter => "LX1001",
            Self::TokenExpected => "LX1002",
            Self::IdentifierExpected => "LX1003",
            Self::ExpressionExpected => "LX1004",
            Self::TypeExpected => "LX1005",
            Self::UnexpectedToken => "LX1006",
            Self::UnterminatedComment => "LX1007",
            Self::UnterminatedString => "LX1008",
            Self::EndOfDirectiveExpected => "LX1020",
            Self::EndifDirectiveExpected => "LX1021",
            Self::UnexpectedDirective => "LX1022",
            Self::PreprocessorDirectiveExpected => "LX1023",
            Self::InvalidPreprocessorExpression => "LX1024",
            Self::DefineAfterToken => "LX1025",
            Self::ErrorDirective => "LX1026",
            Self::WarningDirective => "LX1030",
            Self::InvalidLineNumber => "LX1031",
            Self::FileNameExpected => "LX1032",
            Self::IllegalPragma => "LX1633",
            Self::IllegalPragmaWarning => "LX1634",
        }
    }

    pub const fn severity(self) -> Severity {
        match self {
            Self::WarningDirective | Self::IllegalPragma | Self::IllegalPragmaWarning => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }

    const fn template(self) -> &'static str {
        match self {
            Self::UnexpectedCharacter => "unexpected character `{0}`",
            Self::TokenExpected => "`{0}` expected",
            Self::IdentifierExpected => "identifier expected",
            Self::ExpressionExpected => "expression expected",
            Self::TypeExpected => "type expected",
            Self::UnexpectedToken => "unexpected token `{0}`",
            Self::UnterminatedComment => "end of file found, `*/` expected",
            Self::UnterminatedString => "newline in string literal",
            Self::EndOfDirectiveExpected => "single-line comment or end of line expected",
            Self::EndifDirectiveExpected => "#endif directive expected",
            Self::UnexpectedDirective => "unexpected preprocessor directive",
            Self::PreprocessorDirectiveExpected => "preprocessor directive expected",
            Self::InvalidPreprocessorExpression => "invalid preprocessor expression",
            Self::DefineAfterToken => {
                "cannot define or undefine preprocessor symbols after the first token in the file"
            }
            Self::ErrorDirective => "#error: {0}",
            Self::WarningDirective => "#warning: {0}",
            Self::InvalidLineNumber => "the line number in a #line directive is missing or invalid",
            Self::FileNameExpected => "file name expected",
            Self::IllegalPragma => "unrecognized #pragma directive",
            Self::IllegalPragmaWarning => "expected `disable` or `restore`",
        }
    }

    /// Expands `{N}` placeholders with `args`; missing arguments expand to nothing.
    pub fn format(self, args: &[impl AsRef<str>]) -> String {
        let template = self.template();
        let mut message = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            message.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                message.push_str(&rest[open..]);
                rest = "";
                break;
            };
            match after[..close].parse::<usize>() {
                Ok(index) => {
                    if let Some(arg) = args.get(index) {
                        message.push_str(arg.as_ref());
                    }
                }
                Err(_) => message.push_str(&rest[open..open + close + 2]),
            }
            rest = &after[close + 1..];
        }
        message.push_str(rest);
        message
    }
}
