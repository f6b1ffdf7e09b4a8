use larch_syntax::SyntaxKind::{self, *};
use larch_syntax::{ErrorCode, SyntaxSet};

use super::{delimited, items, types};
use crate::parser::{CompletedMarker, Parser};

pub(crate) const EXPR_FIRST: SyntaxSet =
    SyntaxSet::new([NAME, INT_NUMBER, STRING, TRUE_KW, FALSE_KW, LEFT_PAREN, BANG, MINUS]);

/// Old nodes that may stand in for a statement in a block.
const STATEMENTS: SyntaxSet = SyntaxSet::new([VARIABLE_DECL, BLOCK, RETURN_STMT, EXPR_STMT]);

/// Parses a statement if one can start here.
pub(crate) fn stmt(p: &mut Parser<'_>) -> bool {
    match p.peek_kind() {
        LEFT_BRACE => block(p),
        IF_KW => if_stmt(p),
        WHILE_KW => while_stmt(p),
        RETURN_KW => return_stmt(p),
        _ if types::at_declaration(p) => items::declaration(p, false),
        _ if p.at_set(&EXPR_FIRST) => {
            let m = p.start();
            expr_required(p);
            p.expect(SEMICOLON);
            m.complete(p, EXPR_STMT);
        }
        _ => return false,
    }
    true
}

/// The body of an `if`, `else` or `while`, which cannot be left out.
fn embedded_stmt(p: &mut Parser<'_>) {
    if !stmt(p) {
        let m = p.start();
        missing_expr(p);
        p.missing(SEMICOLON);
        m.complete(p, EXPR_STMT);
    }
}

pub(crate) fn block(p: &mut Parser<'_>) {
    let m = p.start();

    if p.eat(LEFT_BRACE) {
        p.start_list();
        while !p.at(RIGHT_BRACE) && !p.at(EOF) && !p.at(CLASS_KW) {
            if p.try_reuse(&STATEMENTS) {
                continue;
            }
            if !stmt(p) {
                p.skip();
            }
        }
        p.finish_list();
        p.expect(RIGHT_BRACE);
    } else {
        p.expect(LEFT_BRACE);
        p.absent();
        p.missing(RIGHT_BRACE);
    }

    m.complete(p, BLOCK);
}

fn if_stmt(p: &mut Parser<'_>) {
    debug_assert_eq!(p.peek_kind(), IF_KW);

    let m = p.start();
    p.advance();
    condition(p);
    embedded_stmt(p);
    if p.at(ELSE_KW) {
        let else_clause = p.start();
        p.advance();
        embedded_stmt(p);
        else_clause.complete(p, ELSE_CLAUSE);
    } else {
        p.absent();
    }
    m.complete(p, IF_STMT);
}

fn while_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    condition(p);
    embedded_stmt(p);
    m.complete(p, WHILE_STMT);
}

fn condition(p: &mut Parser<'_>) {
    p.expect(LEFT_PAREN);
    expr_required(p);
    p.expect(RIGHT_PAREN);
}

fn return_stmt(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    if p.at_set(&EXPR_FIRST) {
        expr_required(p);
    } else {
        p.absent();
    }
    p.expect(SEMICOLON);
    m.complete(p, RETURN_STMT);
}

pub(crate) fn expr(p: &mut Parser<'_>) -> Option<CompletedMarker> {
    binary_expr(p, 1)
}

pub(crate) fn expr_required(p: &mut Parser<'_>) {
    if expr(p).is_none() {
        missing_expr(p);
    }
}

fn missing_expr(p: &mut Parser<'_>) {
    let m = p.start();
    p.error(ErrorCode::ExpressionExpected, None);
    p.missing(NAME);
    m.complete(p, NAME_EXPR);
}

fn infix_binding_power(kind: SyntaxKind) -> u8 {
    match kind {
        PIPE2 => 1,
        AMP2 => 2,
        EQ2 | BANG_EQ => 3,
        LT | LT_EQ | GT | GT_EQ => 4,
        PLUS | MINUS => 5,
        STAR | SLASH | PERCENT => 6,
        _ => 0,
    }
}

fn binary_expr(p: &mut Parser<'_>, min_power: u8) -> Option<CompletedMarker> {
    let mut lhs = prefix_expr(p)?;

    loop {
        let power = infix_binding_power(p.peek_kind());
        if power < min_power {
            break;
        }
        let m = lhs.precede(p);
        p.advance();
        if binary_expr(p, power + 1).is_none() {
            missing_expr(p);
        }
        lhs = m.complete(p, BINARY_EXPR);
    }

    Some(lhs)
}

fn prefix_expr(p: &mut Parser<'_>) -> Option<CompletedMarker> {
    if !matches!(p.peek_kind(), BANG | MINUS) {
        return postfix_expr(p);
    }
    let m = p.start();
    p.advance();
    if prefix_expr(p).is_none() {
        missing_expr(p);
    }
    Some(m.complete(p, PREFIX_EXPR))
}

fn postfix_expr(p: &mut Parser<'_>) -> Option<CompletedMarker> {
    let mut m = primary_expr(p)?;

    while p.at(LEFT_PAREN) {
        let call = m.precede(p);
        delimited(p, ARG_LIST, &EXPR_FIRST, expr_required);
        m = call.complete(p, CALL_EXPR);
    }

    Some(m)
}

fn primary_expr(p: &mut Parser<'_>) -> Option<CompletedMarker> {
    let kind = match p.peek_kind() {
        NAME => NAME_EXPR,
        INT_NUMBER | STRING | TRUE_KW | FALSE_KW => LITERAL,
        LEFT_PAREN => {
            let m = p.start();
            p.advance();
            expr_required(p);
            p.expect(RIGHT_PAREN);
            return Some(m.complete(p, PAREN_EXPR));
        }
        _ => return None,
    };
    let m = p.start();
    p.advance();
    Some(m.complete(p, kind))
}
