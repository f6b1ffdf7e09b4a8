//! Preprocessor directive lines, lexed and parsed into structured trivia.

use larch_syntax::green::{
    GreenDiagnostic, GreenElement, GreenNode, GreenToken, GreenTrivia, GreenTriviaList,
};
use larch_syntax::{DirectiveStack, ErrorCode, SyntaxKind};
use text_size::TextSize;

use crate::cursor::Cursor;
use crate::trivia::{self, is_newline};

struct Lexer<'c, 'a> {
    cursor: &'c mut Cursor<'a>,
}

impl Lexer<'_, '_> {
    fn at_line_end(&self) -> bool {
        self.cursor.is_eof()
            || is_newline(self.cursor.peek())
            || (self.cursor.peek() == '/' && self.cursor.second() == '/')
    }

    fn trailing(&mut self) -> GreenTriviaList {
        let mut pieces = Vec::new();
        while !self.at_line_end() {
            let checkpoint = self.cursor.offset();
            match trivia::piece(self.cursor) {
                Some(piece) if trivia::is_same_line(&piece) => pieces.push(piece),
                Some(_) => {
                    self.cursor.reset(checkpoint);
                    break;
                }
                None => break,
            }
        }
        GreenTriviaList::new(pieces)
    }

    fn next(&mut self) -> GreenToken {
        if self.at_line_end() {
            return self.end_of_directive();
        }
        self.cursor.start_token();
        let kind = match self.cursor.advance() {
            '#' => SyntaxKind::HASH,
            '(' => SyntaxKind::LEFT_PAREN,
            ')' => SyntaxKind::RIGHT_PAREN,
            ',' => SyntaxKind::COMMA,
            '!' if self.cursor.matches('=') => {
                self.cursor.advance();
                SyntaxKind::BANG_EQ
            }
            '!' => SyntaxKind::BANG,
            '=' if self.cursor.matches('=') => {
                self.cursor.advance();
                SyntaxKind::EQ2
            }
            '&' if self.cursor.matches('&') => {
                self.cursor.advance();
                SyntaxKind::AMP2
            }
            '|' if self.cursor.matches('|') => {
                self.cursor.advance();
                SyntaxKind::PIPE2
            }
            '"' => {
                self.cursor.advance_while(|c| c != '"' && !is_newline(c));
                if self.cursor.matches('"') {
                    self.cursor.advance();
                }
                SyntaxKind::STRING
            }
            '0'..='9' => {
                self.cursor.advance_while(|c| c.is_ascii_digit());
                SyntaxKind::INT_NUMBER
            }
            'A'..='Z' | 'a'..='z' | '_' => {
                self.cursor.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
                SyntaxKind::from_directive_keyword(self.cursor.token_text())
                    .unwrap_or(SyntaxKind::NAME)
            }
            _ => SyntaxKind::UNKNOWN,
        };
        let text = self.cursor.token_text();
        GreenToken::new(GreenTriviaList::empty(), kind, text, self.trailing())
    }

    /// The rest of the line, verbatim.
    fn message(&mut self) -> GreenToken {
        self.cursor.start_token();
        self.cursor.advance_while(|c| !is_newline(c));
        let text = self.cursor.token_text();
        GreenToken::new(
            GreenTriviaList::empty(),
            SyntaxKind::PREPROCESSING_MESSAGE,
            text,
            GreenTriviaList::empty(),
        )
    }

    fn end_of_directive(&mut self) -> GreenToken {
        let mut leading = Vec::new();
        if self.cursor.peek() == '/' && self.cursor.second() == '/' {
            leading.extend(trivia::piece(self.cursor));
        }
        let mut trailing = Vec::new();
        if !self.cursor.is_eof() && is_newline(self.cursor.peek()) {
            trailing.extend(trivia::piece(self.cursor));
        }
        GreenToken::new(
            GreenTriviaList::new(leading),
            SyntaxKind::END_OF_DIRECTIVE,
            "",
            GreenTriviaList::new(trailing),
        )
    }
}

struct Parser<'c, 'a> {
    lexer: Lexer<'c, 'a>,
    current: Option<GreenToken>,
}

impl Parser<'_, '_> {
    fn current(&mut self) -> &GreenToken {
        self.current.get_or_insert_with(|| self.lexer.next())
    }

    fn peek(&mut self) -> SyntaxKind {
        self.current().kind()
    }

    fn bump(&mut self) -> GreenToken {
        debug_assert_ne!(self.peek(), SyntaxKind::END_OF_DIRECTIVE);
        match self.current.take() {
            Some(token) => token,
            None => self.lexer.next(),
        }
    }

    fn eat(&mut self, kind: SyntaxKind) -> Option<GreenToken> {
        (self.peek() == kind).then(|| self.bump())
    }

    fn expect(&mut self, kind: SyntaxKind, code: ErrorCode, args: &[&str]) -> GreenToken {
        self.eat(kind).unwrap_or_else(|| missing(kind, code, args))
    }

    /// The end of the line. Leftover tokens become skipped trivia in front
    /// of it, reported when `report` is set.
    fn end(&mut self, report: bool) -> GreenToken {
        let mut skipped = Vec::new();
        while self.peek() != SyntaxKind::END_OF_DIRECTIVE {
            skipped.push(GreenElement::from(self.bump()));
        }
        let eod = match self.current.take() {
            Some(token) => token,
            None => self.lexer.end_of_directive(),
        };
        let Some(list) = GreenNode::list(skipped) else { return eod };
        let mut node = GreenNode::new(SyntaxKind::SKIPPED_TOKENS_TRIVIA, [Some(list)]);
        if report {
            node = node.with_diagnostics(vec![GreenDiagnostic::new(
                ErrorCode::EndOfDirectiveExpected,
                &[],
                TextSize::new(0),
                node.width(),
            )]);
        }
        let mut leading = vec![GreenTrivia::structured(node)];
        leading.extend(eod.leading().pieces().iter().cloned());
        eod.with_leading(GreenTriviaList::new(leading))
    }

    fn expr(&mut self) -> GreenNode {
        self.binary(1).unwrap_or_else(missing_expr)
    }

    fn binary(&mut self, min_precedence: u8) -> Option<GreenNode> {
        let mut lhs = self.unary()?;
        loop {
            let precedence = match self.peek() {
                SyntaxKind::PIPE2 => 1,
                SyntaxKind::AMP2 => 2,
                SyntaxKind::EQ2 | SyntaxKind::BANG_EQ => 3,
                _ => break,
            };
            if precedence < min_precedence {
                break;
            }
            let op = self.bump();
            let rhs = self.binary(precedence + 1).unwrap_or_else(missing_expr);
            lhs = GreenNode::new(
                SyntaxKind::BINARY_EXPR,
                [Some(lhs.into()), Some(op.into()), Some(rhs.into())],
            );
        }
        Some(lhs)
    }

    fn unary(&mut self) -> Option<GreenNode> {
        if self.peek() != SyntaxKind::BANG {
            return self.primary();
        }
        let op = self.bump();
        let operand = self.unary().unwrap_or_else(missing_expr);
        Some(GreenNode::new(SyntaxKind::PREFIX_EXPR, [Some(op.into()), Some(operand.into())]))
    }

    fn primary(&mut self) -> Option<GreenNode> {
        let node = match self.peek() {
            SyntaxKind::NAME => GreenNode::new(SyntaxKind::NAME_EXPR, [Some(self.bump().into())]),
            SyntaxKind::TRUE_KW | SyntaxKind::FALSE_KW => {
                GreenNode::new(SyntaxKind::LITERAL, [Some(self.bump().into())])
            }
            SyntaxKind::LEFT_PAREN => {
                let open = self.bump();
                let inner = self.expr();
                let close = self.expect(SyntaxKind::RIGHT_PAREN, ErrorCode::TokenExpected, &[")"]);
                GreenNode::new(
                    SyntaxKind::PAREN_EXPR,
                    [Some(open.into()), Some(inner.into()), Some(close.into())],
                )
            }
            _ => return None,
        };
        Some(node)
    }
}

fn missing(kind: SyntaxKind, code: ErrorCode, args: &[&str]) -> GreenToken {
    let diagnostic = GreenDiagnostic::whole(code, args, TextSize::new(0));
    GreenToken::missing(kind).with_diagnostics(vec![diagnostic])
}

fn missing_expr() -> GreenNode {
    let name = missing(SyntaxKind::NAME, ErrorCode::InvalidPreprocessorExpression, &[]);
    GreenNode::new(SyntaxKind::NAME_EXPR, [Some(name.into())])
}

fn node(kind: SyntaxKind, slots: Vec<Option<GreenElement>>) -> GreenNode {
    GreenNode::new(kind, slots)
}

fn report(node: GreenNode, code: ErrorCode, args: &[&str]) -> GreenNode {
    let mut diagnostics = node.diagnostics().to_vec();
    diagnostics.push(GreenDiagnostic::new(code, args, TextSize::new(0), node.width()));
    node.with_diagnostics(diagnostics)
}

/// Lexes the directive starting at the `#` under the cursor. `state` is the
/// preprocessor state before it; `seen_token` whether any token precedes it.
pub(crate) fn lex(cursor: &mut Cursor<'_>, state: &DirectiveStack, seen_token: bool) -> GreenNode {
    let mut p = Parser { lexer: Lexer { cursor }, current: None };
    let hash = Some(GreenElement::from(p.bump()));
    match p.peek() {
        kind @ (SyntaxKind::DEFINE_KW | SyntaxKind::UNDEF_KW) => {
            let keyword = p.bump();
            let name = p.expect(SyntaxKind::NAME, ErrorCode::IdentifierExpected, &[]);
            let eod = p.end(true);
            let node_kind = if kind == SyntaxKind::DEFINE_KW {
                SyntaxKind::DEFINE_DIRECTIVE
            } else {
                SyntaxKind::UNDEF_DIRECTIVE
            };
            let directive = node(
                node_kind,
                vec![hash, Some(keyword.into()), Some(name.into()), Some(eod.into())],
            );
            if seen_token && state.is_active() {
                report(directive, ErrorCode::DefineAfterToken, &[])
            } else {
                directive
            }
        }
        kind @ (SyntaxKind::IF_KW | SyntaxKind::ELIF_KW) => {
            let keyword = p.bump();
            let condition = p.expr();
            let eod = p.end(true);
            let node_kind = if kind == SyntaxKind::IF_KW {
                SyntaxKind::IF_DIRECTIVE
            } else {
                SyntaxKind::ELIF_DIRECTIVE
            };
            let directive = node(
                node_kind,
                vec![hash, Some(keyword.into()), Some(condition.into()), Some(eod.into())],
            );
            if kind == SyntaxKind::ELIF_KW && !state.has_previous_if_or_elif() {
                report(directive, ErrorCode::UnexpectedDirective, &[])
            } else {
                directive
            }
        }
        kind @ (SyntaxKind::ELSE_KW | SyntaxKind::ENDIF_KW) => {
            let keyword = p.bump();
            let eod = p.end(true);
            let (node_kind, expected) = if kind == SyntaxKind::ELSE_KW {
                (SyntaxKind::ELSE_DIRECTIVE, state.has_previous_if_or_elif())
            } else {
                (SyntaxKind::ENDIF_DIRECTIVE, state.has_unfinished_if())
            };
            let directive = node(node_kind, vec![hash, Some(keyword.into()), Some(eod.into())]);
            if expected {
                directive
            } else {
                report(directive, ErrorCode::UnexpectedDirective, &[])
            }
        }
        kind @ (SyntaxKind::ERROR_KW | SyntaxKind::WARNING_KW) => {
            let keyword = p.bump();
            let message = p.lexer.message();
            let eod = p.end(true);
            let (node_kind, code) = if kind == SyntaxKind::ERROR_KW {
                (SyntaxKind::ERROR_DIRECTIVE, ErrorCode::ErrorDirective)
            } else {
                (SyntaxKind::WARNING_DIRECTIVE, ErrorCode::WarningDirective)
            };
            let text = message.text().trim_end().to_owned();
            let directive = node(
                node_kind,
                vec![hash, Some(keyword.into()), Some(message.into()), Some(eod.into())],
            );
            report(directive, code, &[&text])
        }
        SyntaxKind::LINE_KW => {
            let keyword = p.bump();
            let value = match p.peek() {
                SyntaxKind::INT_NUMBER | SyntaxKind::DEFAULT_KW | SyntaxKind::HIDDEN_KW => p.bump(),
                _ => missing(SyntaxKind::INT_NUMBER, ErrorCode::InvalidLineNumber, &[]),
            };
            let file = match value.kind() {
                SyntaxKind::INT_NUMBER if !value.is_missing() => p.eat(SyntaxKind::STRING),
                _ => None,
            };
            let eod = p.end(true);
            node(
                SyntaxKind::LINE_DIRECTIVE,
                vec![
                    hash,
                    Some(keyword.into()),
                    Some(value.into()),
                    file.map(GreenElement::from),
                    Some(eod.into()),
                ],
            )
        }
        SyntaxKind::PRAGMA_KW => {
            let keyword = p.bump();
            let warning = p.expect(SyntaxKind::WARNING_KW, ErrorCode::IllegalPragma, &[]);
            let action = if warning.is_missing() {
                GreenToken::missing(SyntaxKind::DISABLE_KW)
            } else {
                match p.peek() {
                    SyntaxKind::DISABLE_KW | SyntaxKind::RESTORE_KW => p.bump(),
                    _ => missing(SyntaxKind::DISABLE_KW, ErrorCode::IllegalPragmaWarning, &[]),
                }
            };
            let mut codes = Vec::new();
            if !action.is_missing() {
                while matches!(p.peek(), SyntaxKind::INT_NUMBER | SyntaxKind::NAME) {
                    codes.push(GreenElement::from(p.bump()));
                    match p.eat(SyntaxKind::COMMA) {
                        Some(comma) => codes.push(comma.into()),
                        None => break,
                    }
                }
            }
            let eod = p.end(!warning.is_missing() && !action.is_missing());
            node(
                SyntaxKind::PRAGMA_WARNING_DIRECTIVE,
                vec![
                    hash,
                    Some(keyword.into()),
                    Some(warning.into()),
                    Some(action.into()),
                    GreenNode::list(codes),
                    Some(eod.into()),
                ],
            )
        }
        _ => {
            let eod = p.end(false);
            let directive = node(SyntaxKind::BAD_DIRECTIVE, vec![hash, Some(eod.into())]);
            report(directive, ErrorCode::PreprocessorDirectiveExpected, &[])
        }
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use larch_syntax::{Directive, NodeOrToken, evaluate};

    use super::*;

    fn directive(text: &str, state: &DirectiveStack) -> GreenNode {
        let mut cursor = Cursor::new(text, TextSize::new(0));
        let node = lex(&mut cursor, state, false);
        assert_eq!(node.full_width(), cursor.offset());
        node
    }

    fn codes(node: &GreenNode) -> Vec<ErrorCode> {
        fn collect(node: &GreenNode, out: &mut Vec<ErrorCode>) {
            out.extend(node.diagnostics().iter().map(GreenDiagnostic::code));
            for slot in node.slots().flatten() {
                match slot {
                    NodeOrToken::Node(child) => collect(child, out),
                    NodeOrToken::Token(token) => {
                        out.extend(token.diagnostics().iter().map(GreenDiagnostic::code));
                        for piece in token.leading().pieces() {
                            out.extend(piece.diagnostics().iter().map(GreenDiagnostic::code));
                            if let Some(structure) = piece.structure() {
                                collect(structure, out);
                            }
                        }
                    }
                }
            }
        }
        let mut out = Vec::new();
        collect(node, &mut out);
        out
    }

    #[test]
    fn conditions_parse_with_precedence() {
        let node = directive("#if !A || B && (C == true)\n", &DirectiveStack::empty());
        expect![[r##"
            IF_DIRECTIVE@0..27
              HASH@0..1 "#"
              IF_KW@1..3 "if"
              WHITESPACE@3..4 " "
              BINARY_EXPR@4..26
                PREFIX_EXPR@4..7
                  BANG@4..5 "!"
                  NAME_EXPR@5..7
                    NAME@5..6 "A"
                    WHITESPACE@6..7 " "
                PIPE2@7..9 "||"
                WHITESPACE@9..10 " "
                BINARY_EXPR@10..26
                  NAME_EXPR@10..12
                    NAME@10..11 "B"
                    WHITESPACE@11..12 " "
                  AMP2@12..14 "&&"
                  WHITESPACE@14..15 " "
                  PAREN_EXPR@15..26
                    LEFT_PAREN@15..16 "("
                    BINARY_EXPR@16..25
                      NAME_EXPR@16..18
                        NAME@16..17 "C"
                        WHITESPACE@17..18 " "
                      EQ2@18..20 "=="
                      WHITESPACE@20..21 " "
                      LITERAL@21..25
                        TRUE_KW@21..25 "true"
                    RIGHT_PAREN@25..26 ")"
              END_OF_DIRECTIVE@26..26 ""
              NEWLINE@26..27 "\n"
        "##]]
        .assert_eq(&node.debug_dump(TextSize::new(0)));
        let state = DirectiveStack::with_symbols(["B", "C"]);
        let Some(NodeOrToken::Node(condition)) = node.slot(2) else { panic!() };
        assert!(evaluate(condition, &state));
        assert!(!evaluate(condition, &DirectiveStack::with_symbols(["A"])));
    }

    #[test]
    fn messages_keep_the_rest_of_the_line() {
        let node = directive("#error  it broke // really\r\n", &DirectiveStack::empty());
        assert_eq!(node.kind(), SyntaxKind::ERROR_DIRECTIVE);
        assert_eq!(node.text(), "#error  it broke // really\r\n");
        assert_eq!(codes(&node), [ErrorCode::ErrorDirective]);
    }

    #[test]
    fn leftover_tokens_are_skipped() {
        let open =
            DirectiveStack::empty().push(Directive::If { is_active: true, branch_taken: true });
        let node = directive("#endif extra // note", &open);
        assert_eq!(node.kind(), SyntaxKind::ENDIF_DIRECTIVE);
        assert!(node.contains_skipped_text());
        let Some(NodeOrToken::Token(eod)) = node.slot(2) else { panic!() };
        assert_eq!(eod.leading().pieces()[0].kind(), SyntaxKind::SKIPPED_TOKENS_TRIVIA);
        assert_eq!(eod.leading().pieces()[1].kind(), SyntaxKind::LINE_COMMENT);
    }

    #[test]
    fn unbalanced_and_unknown_directives_are_reported() {
        let empty = DirectiveStack::empty();
        assert_eq!(codes(&directive("#endif\n", &empty)), [ErrorCode::UnexpectedDirective]);
        assert_eq!(codes(&directive("#else\n", &empty)), [ErrorCode::UnexpectedDirective]);
        let bad = directive("#include <x>\n", &empty);
        assert_eq!(bad.kind(), SyntaxKind::BAD_DIRECTIVE);
        assert_eq!(codes(&bad), [ErrorCode::PreprocessorDirectiveExpected]);
    }

    #[test]
    fn line_and_pragma_directives() {
        let empty = DirectiveStack::empty();
        let line = directive("#line 12 \"gen.lr\"\n", &empty);
        assert_eq!(line.slot_count(), 5);
        assert!(line.slot(3).is_some());
        assert_eq!(
            codes(&directive("#line x\n", &empty)),
            [ErrorCode::InvalidLineNumber, ErrorCode::EndOfDirectiveExpected]
        );

        let pragma = directive("#pragma warning disable 1030, LX1031\n", &empty);
        assert_eq!(pragma.kind(), SyntaxKind::PRAGMA_WARNING_DIRECTIVE);
        assert!(codes(&pragma).is_empty());
        let Some(NodeOrToken::Node(list)) = pragma.slot(4) else { panic!() };
        assert_eq!(list.slot_count(), 3);

        assert_eq!(codes(&directive("#pragma once\n", &empty)), [ErrorCode::IllegalPragma]);
    }
}
