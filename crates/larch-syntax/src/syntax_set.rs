use crate::SyntaxKind;

// One bit per kind; every kind fits in a single word.
const _: () = assert!((SyntaxKind::TOMBSTONE as u16) < u128::BITS as u16);

/// Constant-time membership set over `SyntaxKind`, usable in `const` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyntaxSet(u128);

impl SyntaxSet {
    pub const EMPTY: Self = Self(0);

    const fn mask(kind: SyntaxKind) -> u128 {
        1 << kind as u16
    }

    pub const fn new<const N: usize>(kinds: [SyntaxKind; N]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < N {
            bits |= Self::mask(kinds[i]);
            i += 1;
        }
        Self(bits)
    }

    pub const fn union(self, other: &Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        self.0 & Self::mask(kind) != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}
