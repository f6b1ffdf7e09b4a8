#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u16)]
pub enum SyntaxKind {
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACKET,
    RIGHT_BRACKET,
    LEFT_BRACE,
    RIGHT_BRACE,
    SEMICOLON,
    COMMA,
    DOT,
    EQ,
    EQ2,
    BANG,
    BANG_EQ,
    LT,
    LT_EQ,
    GT,
    GT_EQ,
    PLUS,
    MINUS,
    STAR,
    SLASH,
    PERCENT,
    AMP2,
    PIPE2,
    HASH,

    BOOL_KW,
    CLASS_KW,
    ELSE_KW,
    FALSE_KW,
    IF_KW,
    INT_KW,
    RETURN_KW,
    STRING_KW,
    TRUE_KW,
    VOID_KW,
    WHILE_KW,

    DEFAULT_KW,
    DEFINE_KW,
    DISABLE_KW,
    ELIF_KW,
    ENDIF_KW,
    ERROR_KW,
    HIDDEN_KW,
    LINE_KW,
    PRAGMA_KW,
    RESTORE_KW,
    UNDEF_KW,
    WARNING_KW,

    NAME,
    INT_NUMBER,
    STRING,
    PREPROCESSING_MESSAGE,
    END_OF_DIRECTIVE,
    UNKNOWN,
    EOF,

    WHITESPACE,
    NEWLINE,
    LINE_COMMENT,
    BLOCK_COMMENT,
    DISABLED_TEXT,
    SKIPPED_TOKENS_TRIVIA,

    DEFINE_DIRECTIVE,
    UNDEF_DIRECTIVE,
    IF_DIRECTIVE,
    ELIF_DIRECTIVE,
    ELSE_DIRECTIVE,
    ENDIF_DIRECTIVE,
    ERROR_DIRECTIVE,
    WARNING_DIRECTIVE,
    LINE_DIRECTIVE,
    PRAGMA_WARNING_DIRECTIVE,
    BAD_DIRECTIVE,

    COMPILATION_UNIT,
    CLASS_DECL,
    FUNCTION_DECL,
    PARAM_LIST,
    PARAM,
    VARIABLE_DECL,
    PREDEFINED_TYPE,
    NAME_TYPE,
    BLOCK,
    IF_STMT,
    ELSE_CLAUSE,
    WHILE_STMT,
    RETURN_STMT,
    EXPR_STMT,
    NAME_EXPR,
    LITERAL,
    PAREN_EXPR,
    PREFIX_EXPR,
    BINARY_EXPR,
    CALL_EXPR,
    ARG_LIST,

    LIST,
    TOMBSTONE,
}

/// How the elements of a list slot are laid out.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ListShape {
    /// Every element is an item.
    Plain,
    /// Items alternate with separator tokens of the given kind.
    Separated(SyntaxKind),
}

impl SyntaxKind {
    pub const fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::WHITESPACE
                | Self::NEWLINE
                | Self::LINE_COMMENT
                | Self::BLOCK_COMMENT
                | Self::DISABLED_TEXT
                | Self::SKIPPED_TOKENS_TRIVIA
        ) || self.is_directive()
    }

    pub const fn is_directive(self) -> bool {
        (self as u16) >= (Self::DEFINE_DIRECTIVE as u16)
            && (self as u16) <= (Self::BAD_DIRECTIVE as u16)
    }

    /// Trivia whose content is a node rather than plain text.
    pub const fn is_structured_trivia(self) -> bool {
        matches!(self, Self::SKIPPED_TOKENS_TRIVIA) || self.is_directive()
    }

    pub const fn is_keyword(self) -> bool {
        (self as u16) >= (Self::BOOL_KW as u16) && (self as u16) <= (Self::WARNING_KW as u16)
    }

    pub const fn is_punct(self) -> bool {
        (self as u16) <= (Self::HASH as u16)
    }

    pub const fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    pub const fn is_list(self) -> bool {
        matches!(self, Self::LIST)
    }

    /// The declared shape of list slot `slot` in a node of this kind.
    pub const fn slot_list_shape(self, slot: usize) -> Option<ListShape> {
        match (self, slot) {
            (Self::COMPILATION_UNIT, 0)
            | (Self::CLASS_DECL, 3)
            | (Self::BLOCK, 1)
            | (Self::SKIPPED_TOKENS_TRIVIA, 0) => Some(ListShape::Plain),
            (Self::PARAM_LIST | Self::ARG_LIST, 1) | (Self::PRAGMA_WARNING_DIRECTIVE, 4) => {
                Some(ListShape::Separated(Self::COMMA))
            }
            _ => None,
        }
    }

    /// Nodes whose last token closes them, so text after them cannot change
    /// how they parse.
    pub const fn is_self_delimiting(self) -> bool {
        matches!(
            self,
            Self::CLASS_DECL
                | Self::FUNCTION_DECL
                | Self::VARIABLE_DECL
                | Self::BLOCK
                | Self::RETURN_STMT
                | Self::EXPR_STMT
        )
    }

    /// Text of tokens that are always spelled the same way.
    pub const fn fixed_text(self) -> Option<&'static str> {
        let text = match self {
            Self::LEFT_PAREN => "(",
            Self::RIGHT_PAREN => ")",
            Self::LEFT_BRACKET => "[",
            Self::RIGHT_BRACKET => "]",
            Self::LEFT_BRACE => "{",
            Self::RIGHT_BRACE => "}",
            Self::SEMICOLON => ";",
            Self::COMMA => ",",
            Self::DOT => ".",
            Self::EQ => "=",
            Self::EQ2 => "==",
            Self::BANG => "!",
            Self::BANG_EQ => "!=",
            Self::LT => "<",
            Self::LT_EQ => "<=",
            Self::GT => ">",
            Self::GT_EQ => ">=",
            Self::PLUS => "+",
            Self::MINUS => "-",
            Self::STAR => "*",
            Self::SLASH => "/",
            Self::PERCENT => "%",
            Self::AMP2 => "&&",
            Self::PIPE2 => "||",
            Self::HASH => "#",
            Self::BOOL_KW => "bool",
            Self::CLASS_KW => "class",
            Self::ELSE_KW => "else",
            Self::FALSE_KW => "false",
            Self::IF_KW => "if",
            Self::INT_KW => "int",
            Self::RETURN_KW => "return",
            Self::STRING_KW => "string",
            Self::TRUE_KW => "true",
            Self::VOID_KW => "void",
            Self::WHILE_KW => "while",
            Self::DEFAULT_KW => "default",
            Self::DEFINE_KW => "define",
            Self::DISABLE_KW => "disable",
            Self::ELIF_KW => "elif",
            Self::ENDIF_KW => "endif",
            Self::ERROR_KW => "error",
            Self::HIDDEN_KW => "hidden",
            Self::LINE_KW => "line",
            Self::PRAGMA_KW => "pragma",
            Self::RESTORE_KW => "restore",
            Self::UNDEF_KW => "undef",
            Self::WARNING_KW => "warning",
            Self::END_OF_DIRECTIVE | Self::EOF => "",
            _ => return None,
        };
        Some(text)
    }

    /// Keywords of the source language proper.
    pub fn from_keyword(ident: &str) -> Option<Self> {
        let kind = match ident {
            "bool" => Self::BOOL_KW,
            "class" => Self::CLASS_KW,
            "else" => Self::ELSE_KW,
            "false" => Self::FALSE_KW,
            "if" => Self::IF_KW,
            "int" => Self::INT_KW,
            "return" => Self::RETURN_KW,
            "string" => Self::STRING_KW,
            "true" => Self::TRUE_KW,
            "void" => Self::VOID_KW,
            "while" => Self::WHILE_KW,
            _ => return None,
        };
        Some(kind)
    }

    /// Keywords recognized inside a preprocessor directive line.
    pub fn from_directive_keyword(ident: &str) -> Option<Self> {
        let kind = match ident {
            "default" => Self::DEFAULT_KW,
            "define" => Self::DEFINE_KW,
            "disable" => Self::DISABLE_KW,
            "elif" => Self::ELIF_KW,
            "else" => Self::ELSE_KW,
            "endif" => Self::ENDIF_KW,
            "error" => Self::ERROR_KW,
            "false" => Self::FALSE_KW,
            "hidden" => Self::HIDDEN_KW,
            "if" => Self::IF_KW,
            "line" => Self::LINE_KW,
            "pragma" => Self::PRAGMA_KW,
            "restore" => Self::RESTORE_KW,
            "true" => Self::TRUE_KW,
            "undef" => Self::UNDEF_KW,
            "warning" => Self::WARNING_KW,
            _ => return None,
        };
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_do_not_overlap() {
        assert!(SyntaxKind::HASH.is_punct());
        assert!(SyntaxKind::WARNING_KW.is_keyword());
        assert!(!SyntaxKind::NAME.is_keyword());
        assert!(SyntaxKind::EOF.is_token());
        assert!(!SyntaxKind::WHITESPACE.is_token());
        assert!(SyntaxKind::BAD_DIRECTIVE.is_directive());
        assert!(SyntaxKind::DEFINE_DIRECTIVE.is_structured_trivia());
        assert!(SyntaxKind::SKIPPED_TOKENS_TRIVIA.is_trivia());
        assert!(!SyntaxKind::COMPILATION_UNIT.is_trivia());
    }

    #[test]
    fn list_slots() {
        assert_eq!(
            SyntaxKind::ARG_LIST.slot_list_shape(1),
            Some(ListShape::Separated(SyntaxKind::COMMA))
        );
        assert_eq!(SyntaxKind::BLOCK.slot_list_shape(1), Some(ListShape::Plain));
        assert_eq!(SyntaxKind::BLOCK.slot_list_shape(0), None);
    }

    #[test]
    fn keywords_round_trip_through_fixed_text() {
        for word in ["class", "while", "return"] {
            let kind = SyntaxKind::from_keyword(word).unwrap();
            assert_eq!(kind.fixed_text(), Some(word));
        }
        assert_eq!(SyntaxKind::from_keyword("define"), None);
        assert_eq!(SyntaxKind::from_directive_keyword("define"), Some(SyntaxKind::DEFINE_KW));
    }
}
