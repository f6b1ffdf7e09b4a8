use larch_syntax::ErrorCode;
use larch_syntax::SyntaxKind::*;
use larch_syntax::SyntaxSet;

use crate::parser::Parser;

const PREDEFINED_TYPES: SyntaxSet = SyntaxSet::new([BOOL_KW, INT_KW, STRING_KW, VOID_KW]);
pub(crate) const TYPE_FIRST: SyntaxSet = PREDEFINED_TYPES.union(&SyntaxSet::new([NAME]));

pub(crate) fn type_(p: &mut Parser<'_>) {
    let m = p.start();
    if p.at_set(&PREDEFINED_TYPES) {
        p.advance();
        m.complete(p, PREDEFINED_TYPE);
    } else if p.eat(NAME) {
        m.complete(p, NAME_TYPE);
    } else {
        p.error(ErrorCode::TypeExpected, None);
        p.missing(NAME);
        m.complete(p, NAME_TYPE);
    }
}

/// A type followed by a name starts a declaration.
pub(crate) fn at_declaration(p: &mut Parser<'_>) -> bool {
    match p.peek_kind() {
        NAME => p.nth(1) == NAME,
        kind => PREDEFINED_TYPES.contains(kind),
    }
}
