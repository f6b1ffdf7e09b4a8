bitflags::bitflags! {
    /// Summary bits cached on every shape element.
    ///
    /// All bits except `IS_MISSING` are the union of the element's own state
    /// and the bits of everything below it.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct NodeFlags: u8 {
        const CONTAINS_DIAGNOSTICS = 1 << 0;
        const CONTAINS_DIRECTIVES = 1 << 1;
        const CONTAINS_SKIPPED_TEXT = 1 << 2;
        const CONTAINS_STRUCTURED_TRIVIA = 1 << 3;
        const CONTAINS_ANNOTATIONS = 1 << 4;
        const IS_MISSING = 1 << 5;
    }
}

impl NodeFlags {
    const INHERITED: Self = Self::CONTAINS_DIAGNOSTICS
        .union(Self::CONTAINS_DIRECTIVES)
        .union(Self::CONTAINS_SKIPPED_TEXT)
        .union(Self::CONTAINS_STRUCTURED_TRIVIA)
        .union(Self::CONTAINS_ANNOTATIONS);

    /// The bits a parent picks up from this child.
    pub(crate) const fn inherited(self) -> Self {
        self.intersection(Self::INHERITED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_is_not_inherited() {
        let flags = NodeFlags::IS_MISSING | NodeFlags::CONTAINS_DIAGNOSTICS;
        assert_eq!(flags.inherited(), NodeFlags::CONTAINS_DIAGNOSTICS);
    }
}
