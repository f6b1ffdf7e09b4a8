use larch_syntax::green::{GreenDiagnostic, GreenTrivia};
use larch_syntax::{ErrorCode, SyntaxKind};
use text_size::TextSize;

use crate::cursor::Cursor;

pub(crate) fn is_horizontal_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{b}' | '\u{c}')
}

pub(crate) fn is_newline(c: char) -> bool {
    matches!(c, '\n' | '\r')
}

/// Lexes one whitespace, newline or comment piece at the cursor.
pub(crate) fn piece(cursor: &mut Cursor<'_>) -> Option<GreenTrivia> {
    if cursor.is_eof() {
        return None;
    }
    cursor.start_token();
    let kind = match cursor.peek() {
        c if is_horizontal_space(c) => {
            cursor.advance_while(is_horizontal_space);
            SyntaxKind::WHITESPACE
        }
        '\n' => {
            cursor.advance();
            SyntaxKind::NEWLINE
        }
        '\r' => {
            cursor.advance();
            if cursor.matches('\n') {
                cursor.advance();
            }
            SyntaxKind::NEWLINE
        }
        '/' if cursor.second() == '/' => {
            cursor.advance_while(|c| !is_newline(c));
            SyntaxKind::LINE_COMMENT
        }
        '/' if cursor.second() == '*' => {
            cursor.advance();
            cursor.advance();
            loop {
                if cursor.is_eof() {
                    let text = cursor.token_text();
                    let width = TextSize::of(text);
                    return Some(GreenTrivia::new(SyntaxKind::BLOCK_COMMENT, text).with_diagnostics(
                        vec![GreenDiagnostic::whole(ErrorCode::UnterminatedComment, &[], width)],
                    ));
                }
                if cursor.rest().starts_with("*/") {
                    cursor.advance();
                    cursor.advance();
                    break;
                }
                cursor.advance();
            }
            SyntaxKind::BLOCK_COMMENT
        }
        _ => return None,
    };
    Some(GreenTrivia::new(kind, cursor.token_text()))
}

/// Whether `piece` lies on a single line and may end a token's trailing run.
pub(crate) fn is_same_line(piece: &GreenTrivia) -> bool {
    match piece.kind() {
        SyntaxKind::BLOCK_COMMENT => {
            piece.diagnostics().is_empty()
                && !piece.text().is_some_and(|text| text.contains(is_newline))
        }
        kind => kind != SyntaxKind::NEWLINE,
    }
}

/// Whether `line` holds an `#if`, `#elif`, `#else` or `#endif` directive.
pub(crate) fn is_branch_directive(line: &str) -> bool {
    let Some(rest) = line.trim_start_matches(is_horizontal_space).strip_prefix('#') else {
        return false;
    };
    let rest = rest.trim_start_matches(is_horizontal_space);
    let word_len =
        rest.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(rest.len());
    matches!(&rest[..word_len], "if" | "elif" | "else" | "endif")
}
