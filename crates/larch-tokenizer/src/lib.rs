//! Turns source text into green tokens with their trivia attached.
//!
//! Whitespace, comments, preprocessor directives and disabled regions all
//! become trivia. A token owns the trivia on its own line after it up to and
//! including the newline; everything else leads the next token.

mod cursor;
mod directive;
mod trivia;

use cursor::Cursor;
use larch_syntax::SyntaxKind::{self, *};
use larch_syntax::green::{GreenDiagnostic, GreenToken, GreenTrivia, GreenTriviaList};
use larch_syntax::{DirectiveStack, ErrorCode};
use text_size::{TextRange, TextSize};
use trivia::{is_horizontal_space, is_newline};

#[derive(Debug, Clone)]
pub struct Token {
    pub green: GreenToken,
    /// Start of the leading trivia.
    pub offset: TextSize,
    /// Preprocessor state before the leading trivia.
    pub directives: DirectiveStack,
}

impl Token {
    pub fn kind(&self) -> SyntaxKind {
        self.green.kind()
    }

    pub fn full_span(&self) -> TextRange {
        TextRange::at(self.offset, self.green.full_width())
    }

    pub fn span(&self) -> TextRange {
        TextRange::at(self.offset + self.green.leading().full_width(), self.green.width())
    }
}

pub struct Tokenizer<'a> {
    cursor: Cursor<'a>,
    directives: DirectiveStack,
    seen_token: bool,
    current: Token,
    trivia: Vec<GreenTrivia>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str, directives: DirectiveStack) -> Self {
        Self::resume(text, TextSize::new(0), directives)
    }

    /// Starts lexing at `offset`, a token boundary, with `directives` in
    /// effect there.
    pub fn resume(text: &'a str, offset: TextSize, directives: DirectiveStack) -> Self {
        let current =
            Token { green: GreenToken::fixed(EOF), offset, directives: directives.clone() };
        let mut tokenizer = Self {
            cursor: Cursor::new(text, offset),
            directives,
            seen_token: offset > TextSize::new(0),
            current,
            trivia: Vec::with_capacity(4),
        };
        tokenizer.current = tokenizer.lex();
        tokenizer
    }

    pub fn peek(&self) -> &Token {
        &self.current
    }

    pub fn next_token(&mut self) -> Token {
        let next = self.lex();
        std::mem::replace(&mut self.current, next)
    }

    /// Preprocessor state after the peeked token's leading trivia.
    pub fn directives(&self) -> &DirectiveStack {
        &self.directives
    }

    fn lex(&mut self) -> Token {
        let offset = self.cursor.offset();
        let directives = self.directives.clone();

        self.leading_trivia();
        let leading = GreenTriviaList::new(self.trivia.drain(..));
        let leading_width = leading.full_width();

        self.cursor.start_token();
        let (kind, error) = self.syntax_kind();
        let text = self.cursor.token_text();
        let width = TextSize::of(text);
        let trailing =
            if kind == EOF { GreenTriviaList::empty() } else { self.trailing_trivia() };

        let mut diagnostics = Vec::new();
        if let Some(code) = error {
            diagnostics.push(GreenDiagnostic::new(code, &[text], leading_width, width));
        }
        if kind == EOF && self.directives.has_unfinished_if() {
            diagnostics.push(GreenDiagnostic::new(
                ErrorCode::EndifDirectiveExpected,
                &[],
                leading_width,
                TextSize::new(0),
            ));
        }
        let mut green = GreenToken::new(leading, kind, text, trailing);
        if !diagnostics.is_empty() {
            green = green.with_diagnostics(diagnostics);
        }
        if kind != EOF {
            self.seen_token = true;
        }
        Token { green, offset, directives }
    }

    fn leading_trivia(&mut self) {
        if !self.directives.is_active() && at_line_start(self.cursor.text(), self.cursor.offset()) {
            self.disabled_text();
        }
        loop {
            if self.cursor.peek() == '#'
                && at_line_start(self.cursor.text(), self.cursor.offset())
            {
                let node = directive::lex(&mut self.cursor, &self.directives, self.seen_token);
                self.directives = self.directives.apply(&node);
                self.trivia.push(GreenTrivia::structured(node));
                if !self.directives.is_active() {
                    self.disabled_text();
                }
                continue;
            }
            match trivia::piece(&mut self.cursor) {
                Some(piece) => self.trivia.push(piece),
                None => break,
            }
        }
    }

    /// Skips whole lines up to the next branch directive.
    fn disabled_text(&mut self) {
        self.cursor.start_token();
        while !self.cursor.is_eof() {
            let rest = self.cursor.rest();
            let line = &rest[..rest.find(is_newline).unwrap_or(rest.len())];
            if trivia::is_branch_directive(line) {
                break;
            }
            self.cursor.advance_while(|c| !is_newline(c));
            if self.cursor.advance() == '\r' && self.cursor.matches('\n') {
                self.cursor.advance();
            }
        }
        let text = self.cursor.token_text();
        if !text.is_empty() {
            self.trivia.push(GreenTrivia::new(DISABLED_TEXT, text));
        }
    }

    fn trailing_trivia(&mut self) -> GreenTriviaList {
        let checkpoint = self.cursor.offset();
        let mut pieces = Vec::new();
        while let Some(piece) = trivia::piece(&mut self.cursor) {
            if piece.kind() == NEWLINE {
                pieces.push(piece);
                return GreenTriviaList::new(pieces);
            }
            if !trivia::is_same_line(&piece) {
                break;
            }
            pieces.push(piece);
        }
        self.cursor.reset(checkpoint);
        GreenTriviaList::empty()
    }

    fn syntax_kind(&mut self) -> (SyntaxKind, Option<ErrorCode>) {
        if self.cursor.is_eof() {
            return (EOF, None);
        }
        let kind = match self.cursor.advance() {
            '(' => LEFT_PAREN,
            ')' => RIGHT_PAREN,
            '[' => LEFT_BRACKET,
            ']' => RIGHT_BRACKET,
            '{' => LEFT_BRACE,
            '}' => RIGHT_BRACE,
            ';' => SEMICOLON,
            ',' => COMMA,
            '.' => DOT,
            '+' => PLUS,
            '-' => MINUS,
            '*' => STAR,
            '/' => SLASH,
            '%' => PERCENT,
            '#' => HASH,
            '=' => self.followed_by('=', EQ2, EQ),
            '!' => self.followed_by('=', BANG_EQ, BANG),
            '<' => self.followed_by('=', LT_EQ, LT),
            '>' => self.followed_by('=', GT_EQ, GT),
            '&' if self.cursor.matches('&') => {
                self.cursor.advance();
                AMP2
            }
            '|' if self.cursor.matches('|') => {
                self.cursor.advance();
                PIPE2
            }
            '"' => return self.string(),
            first_char @ '0'..='9' => self.number(first_char),
            'A'..='Z' | 'a'..='z' | '_' => {
                self.cursor.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
                SyntaxKind::from_keyword(self.cursor.token_text()).unwrap_or(NAME)
            }
            _ => return (UNKNOWN, Some(ErrorCode::UnexpectedCharacter)),
        };
        (kind, None)
    }

    fn followed_by(&mut self, next: char, long: SyntaxKind, short: SyntaxKind) -> SyntaxKind {
        if self.cursor.matches(next) {
            self.cursor.advance();
            long
        } else {
            short
        }
    }

    fn string(&mut self) -> (SyntaxKind, Option<ErrorCode>) {
        self.cursor.advance_while(|c| c != '"' && !is_newline(c));
        if self.cursor.matches('"') {
            self.cursor.advance();
            (STRING, None)
        } else {
            (STRING, Some(ErrorCode::UnterminatedString))
        }
    }

    fn number(&mut self, first_char: char) -> SyntaxKind {
        if first_char == '0' && (self.cursor.matches('x') || self.cursor.matches('X')) {
            self.cursor.advance();
            self.cursor.advance_while(|c| c.is_ascii_hexdigit() || c == '_');
        } else {
            self.cursor.advance_while(|c| c.is_ascii_digit() || c == '_');
        }
        INT_NUMBER
    }
}

/// Whether only spaces and tabs precede `offset` on its line.
pub fn at_line_start(text: &str, offset: TextSize) -> bool {
    text[..usize::from(offset)]
        .chars()
        .rev()
        .take_while(|&c| !is_newline(c))
        .all(is_horizontal_space)
}

/// Every token of `text`, ending with `EOF`.
pub fn tokenize(text: &str, directives: DirectiveStack) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(text, directives);
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.next_token();
        let done = token.kind() == EOF;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}

#[cfg(test)]
mod tests {
    use larch_syntax::NodeOrToken;

    use super::*;

    fn kinds(text: &str) -> Vec<SyntaxKind> {
        tokenize(text, DirectiveStack::empty()).iter().map(Token::kind).collect()
    }

    fn trivia_kinds(list: &GreenTriviaList) -> Vec<SyntaxKind> {
        list.pieces().iter().map(GreenTrivia::kind).collect()
    }

    #[test]
    fn test_integer_literals() {
        for input in ["123", "0", "0x1f", "0XFF", "123_456"] {
            let tokens = tokenize(input, DirectiveStack::empty());
            assert_eq!(tokens[0].kind(), INT_NUMBER, "Input: '{input}'");
            assert_eq!(tokens[0].green.text(), input);
            assert_eq!(tokens[1].kind(), EOF);
        }
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a == b != c <= d >= e < f > g = !h && i || j"),
            [
                NAME, EQ2, NAME, BANG_EQ, NAME, LT_EQ, NAME, GT_EQ, NAME, LT, NAME, GT, NAME, EQ,
                BANG, NAME, AMP2, NAME, PIPE2, NAME, EOF
            ]
        );
        assert_eq!(kinds("x+y-z*w/v%u"), [
            NAME, PLUS, NAME, MINUS, NAME, STAR, NAME, SLASH, NAME, PERCENT, NAME, EOF
        ]);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(kinds("class int bool string void if else while return true false foo"), [
            CLASS_KW, INT_KW, BOOL_KW, STRING_KW, VOID_KW, IF_KW, ELSE_KW, WHILE_KW, RETURN_KW,
            TRUE_KW, FALSE_KW, NAME, EOF
        ]);
        // Directive words are only keywords inside directives.
        assert_eq!(kinds("define line"), [NAME, NAME, EOF]);
    }

    #[test]
    fn single_ampersand_is_unexpected() {
        let tokens = tokenize("a & b", DirectiveStack::empty());
        assert_eq!(tokens[1].kind(), UNKNOWN);
        let diagnostics = tokens[1].green.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), ErrorCode::UnexpectedCharacter);
        assert_eq!(&*diagnostics[0].args()[0], "&");
    }

    #[test]
    fn unterminated_string_stops_at_newline() {
        let tokens = tokenize("\"abc\nx", DirectiveStack::empty());
        assert_eq!(tokens[0].kind(), STRING);
        assert_eq!(tokens[0].green.text(), "\"abc");
        assert_eq!(tokens[0].green.diagnostics()[0].code(), ErrorCode::UnterminatedString);
        assert_eq!(tokens[1].green.text(), "x");
    }

    #[test]
    fn trailing_trivia_runs_to_the_newline() {
        let tokens = tokenize("a // note\n  b c\n", DirectiveStack::empty());
        let [a, b, c, eof] = &tokens[..] else { panic!("{tokens:?}") };

        assert_eq!(trivia_kinds(a.green.leading()), []);
        assert_eq!(trivia_kinds(a.green.trailing()), [WHITESPACE, LINE_COMMENT, NEWLINE]);
        assert_eq!(trivia_kinds(b.green.leading()), [WHITESPACE]);
        // Not followed by a newline, so the space leads `c`.
        assert_eq!(trivia_kinds(b.green.trailing()), []);
        assert_eq!(trivia_kinds(c.green.leading()), [WHITESPACE]);
        assert_eq!(trivia_kinds(c.green.trailing()), [NEWLINE]);
        assert_eq!(eof.green.full_width(), TextSize::new(0));

        assert_eq!(b.full_span(), TextRange::new(10.into(), 13.into()));
        assert_eq!(b.span(), TextRange::new(12.into(), 13.into()));
    }

    #[test]
    fn multi_line_comment_leads_the_next_token() {
        let tokens = tokenize("a /* x\ny */ b", DirectiveStack::empty());
        assert_eq!(trivia_kinds(tokens[0].green.trailing()), []);
        assert_eq!(
            trivia_kinds(tokens[1].green.leading()),
            [WHITESPACE, BLOCK_COMMENT, WHITESPACE]
        );
    }

    #[test]
    fn directives_become_leading_trivia() {
        let text = "#define A\nx\n#undef A\ny";
        let mut tokenizer = Tokenizer::new(text, DirectiveStack::empty());
        let x = tokenizer.next_token();
        assert_eq!(trivia_kinds(x.green.leading()), [DEFINE_DIRECTIVE]);
        assert!(!x.directives.is_defined("A"));

        let y = tokenizer.next_token();
        assert!(y.directives.is_defined("A"));
        assert_eq!(trivia_kinds(y.green.leading()), [UNDEF_DIRECTIVE]);
        // A `#undef` after the first token is an error, just like `#define`.
        let undef = y.green.leading().pieces()[0].structure().unwrap();
        assert_eq!(undef.diagnostics()[0].code(), ErrorCode::DefineAfterToken);
        assert!(!tokenizer.directives().is_defined("A"));
    }

    #[test]
    fn inactive_regions_are_disabled_text() {
        let text = "#if A\nint x;\n#define B\n#else\ny\n#endif\n";
        let tokens = tokenize(text, DirectiveStack::empty());
        let [y, eof] = &tokens[..] else { panic!("{tokens:?}") };
        assert_eq!(y.green.text(), "y");
        assert_eq!(trivia_kinds(y.green.leading()), [IF_DIRECTIVE, DISABLED_TEXT, ELSE_DIRECTIVE]);
        assert_eq!(y.green.leading().pieces()[1].text(), Some("int x;\n#define B\n"));
        assert_eq!(trivia_kinds(eof.green.leading()), [ENDIF_DIRECTIVE]);
        assert!(eof.green.diagnostics().is_empty());
        assert!(!eof.directives.is_defined("B"));

        let tokens = tokenize(text, DirectiveStack::with_symbols(["A"]));
        let kinds: Vec<_> = tokens.iter().map(Token::kind).collect();
        assert_eq!(kinds, [INT_KW, NAME, SEMICOLON, EOF]);
        assert_eq!(
            trivia_kinds(tokens[3].green.leading()),
            [DEFINE_DIRECTIVE, ELSE_DIRECTIVE, DISABLED_TEXT, ENDIF_DIRECTIVE]
        );
    }

    #[test]
    fn nested_groups_inside_disabled_text() {
        let text = "#if X\n#if Y\na\n#endif\nb\n#endif\nc";
        let tokens = tokenize(text, DirectiveStack::with_symbols(["Y"]));
        let [c, _eof] = &tokens[..] else { panic!("{tokens:?}") };
        assert_eq!(trivia_kinds(c.green.leading()), [
            IF_DIRECTIVE,
            IF_DIRECTIVE,
            DISABLED_TEXT,
            ENDIF_DIRECTIVE,
            DISABLED_TEXT,
            ENDIF_DIRECTIVE
        ]);
    }

    #[test]
    fn missing_endif_is_reported_at_eof() {
        let tokens = tokenize("#if true\nx\n", DirectiveStack::empty());
        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind(), EOF);
        assert_eq!(eof.green.diagnostics()[0].code(), ErrorCode::EndifDirectiveExpected);
    }

    #[test]
    fn hash_after_a_token_is_not_a_directive() {
        let tokens = tokenize("a #define B\n", DirectiveStack::empty());
        let kinds: Vec<_> = tokens.iter().map(Token::kind).collect();
        assert_eq!(kinds, [NAME, HASH, NAME, NAME, EOF]);
    }

    #[test]
    fn resume_continues_with_given_state() {
        let text = "a\nb\n#if !DEBUG\nc\n#endif\n";
        let mut tokenizer =
            Tokenizer::resume(text, 2.into(), DirectiveStack::with_symbols(["DEBUG"]));
        let b = tokenizer.next_token();
        assert_eq!(b.green.text(), "b");
        assert_eq!(b.offset, TextSize::new(2));
        let eof = tokenizer.next_token();
        assert_eq!(eof.kind(), EOF);
        let Some(NodeOrToken::Token(hash)) =
            eof.green.leading().pieces()[0].structure().and_then(|node| node.slot(0))
        else {
            panic!("expected a directive");
        };
        assert_eq!(hash.kind(), HASH);
    }

    #[test]
    fn at_line_start_ignores_indentation() {
        assert!(at_line_start("  #", 2.into()));
        assert!(at_line_start("x\n\t#", 3.into()));
        assert!(!at_line_start("x #", 2.into()));
    }
}
