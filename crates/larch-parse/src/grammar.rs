use larch_syntax::SyntaxKind::{self, *};
use larch_syntax::SyntaxSet;

use crate::parser::Parser;

pub(crate) mod exprs;
pub(crate) mod items;
mod types;

pub(crate) fn name(p: &mut Parser<'_>) {
    p.expect(NAME);
}

/// A comma-separated list in parentheses, such as `(a, b)`. Every comma is
/// followed by an element, and a missing comma is assumed between two
/// elements.
pub(crate) fn delimited(
    p: &mut Parser<'_>,
    kind: SyntaxKind,
    first_set: &SyntaxSet,
    mut element: impl FnMut(&mut Parser<'_>),
) {
    debug_assert_eq!(p.peek_kind(), LEFT_PAREN);
    let m = p.start();
    p.advance();
    p.start_list();

    if !p.at(RIGHT_PAREN) && !p.at(EOF) {
        loop {
            element(p);
            if p.eat(COMMA) {
                continue;
            }
            if p.at_set(first_set) {
                p.expect(COMMA);
                continue;
            }
            break;
        }
    }

    p.finish_list();
    p.expect(RIGHT_PAREN);
    m.complete(p, kind);
}
