use larch_syntax::SyntaxKind::*;
use larch_syntax::SyntaxSet;

use super::{delimited, exprs, name, types};
use crate::parser::Parser;

/// Old nodes that may stand in for a top-level item.
const ITEMS: SyntaxSet = SyntaxSet::new([
    CLASS_DECL,
    FUNCTION_DECL,
    VARIABLE_DECL,
    BLOCK,
    RETURN_STMT,
    EXPR_STMT,
]);
const MEMBERS: SyntaxSet = SyntaxSet::new([FUNCTION_DECL, VARIABLE_DECL]);

pub(crate) fn compilation_unit(p: &mut Parser<'_>) {
    let m = p.start();
    p.start_list();

    while !p.at(EOF) {
        if p.cancelled() {
            break;
        }
        if p.try_reuse(&ITEMS) {
            continue;
        }
        item(p);
    }

    p.finish_list();
    p.expect(EOF);
    m.complete(p, COMPILATION_UNIT);
}

fn item(p: &mut Parser<'_>) {
    match p.peek_kind() {
        CLASS_KW => class_decl(p),
        _ if types::at_declaration(p) => declaration(p, true),
        _ => {
            if !exprs::stmt(p) {
                p.skip();
            }
        }
    }
}

fn class_decl(p: &mut Parser<'_>) {
    let m = p.start();
    p.advance();
    name(p);

    if p.eat(LEFT_BRACE) {
        p.start_list();
        while !p.at(RIGHT_BRACE) && !p.at(EOF) && !p.at(CLASS_KW) {
            if p.try_reuse(&MEMBERS) {
                continue;
            }
            if types::at_declaration(p) {
                declaration(p, true);
            } else {
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

    m.complete(p, CLASS_DECL);
}

/// A variable declaration, or a function declaration where `functions`
/// allows one.
pub(crate) fn declaration(p: &mut Parser<'_>, functions: bool) {
    let m = p.start();
    types::type_(p);
    name(p);

    if functions && p.at(LEFT_PAREN) {
        delimited(p, PARAM_LIST, &types::TYPE_FIRST, param);
        exprs::block(p);
        m.complete(p, FUNCTION_DECL);
        return;
    }

    if p.eat(EQ) {
        exprs::expr_required(p);
    } else {
        p.absent();
        p.absent();
    }
    p.expect(SEMICOLON);
    m.complete(p, VARIABLE_DECL);
}

fn param(p: &mut Parser<'_>) {
    let m = p.start();
    types::type_(p);
    name(p);
    m.complete(p, PARAM);
}
